use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct FinalOutput {
	pub raw: RgbImage,
	pub mask: GrayImage,
	pub points: Vec<PointOfInterest>,
}

/// Keeps everything in memory; used by tests and dry runs
///
/// Every saved checkpoint is kept, so the history of an assembly can be inspected.
#[derive(Debug, Default)]
pub struct MemoryStore {
	tiles: Mutex<BTreeMap<(RegionFloor, GridPos), RgbImage>>,
	checkpoints: Mutex<BTreeMap<RegionFloor, Vec<Checkpoint>>>,
	canvases: Mutex<BTreeMap<RegionFloor, RgbImage>>,
	finals: Mutex<BTreeMap<RegionFloor, FinalOutput>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn remove_tile(&self, region: &RegionFloor, pos: GridPos) -> Option<RgbImage> {
		self.tiles.lock().remove(&(region.clone(), pos))
	}

	/// Every checkpoint saved for `region`, oldest first
	pub fn checkpoint_history(&self, region: &RegionFloor) -> Vec<Checkpoint> {
		self.checkpoints.lock().get(region).cloned().unwrap_or_default()
	}

	pub fn final_output(&self, region: &RegionFloor) -> Option<FinalOutput> {
		self.finals.lock().get(region).cloned()
	}
}

impl TileStore for MemoryStore {
	fn get(&self, region: &RegionFloor, pos: GridPos) -> Option<RgbImage> {
		self.tiles.lock().get(&(region.clone(), pos)).cloned()
	}

	fn put(&self, region: &RegionFloor, pos: GridPos, tile: &RgbImage) -> Result<(), Error> {
		self.tiles.lock().insert((region.clone(), pos), tile.clone());
		Ok(())
	}

	fn contains(&self, region: &RegionFloor, pos: GridPos) -> bool {
		self.tiles.lock().contains_key(&(region.clone(), pos))
	}
}

impl CheckpointStore for MemoryStore {
	fn load(&self, region: &RegionFloor) -> Result<Option<Checkpoint>, Error> {
		Ok(self.checkpoints.lock().get(region).and_then(|history| history.last().cloned()))
	}

	fn save(&self, region: &RegionFloor, checkpoint: &Checkpoint) -> Result<(), Error> {
		self.checkpoints.lock().entry(region.clone()).or_default().push(checkpoint.clone());
		Ok(())
	}
}

impl CanvasStore for MemoryStore {
	fn load_canvas(&self, region: &RegionFloor) -> Result<Option<RgbImage>, Error> {
		Ok(self.canvases.lock().get(region).cloned())
	}

	fn save_canvas(&self, region: &RegionFloor, canvas: &RgbImage) -> Result<(), Error> {
		self.canvases.lock().insert(region.clone(), canvas.clone());
		Ok(())
	}
}

impl OutputStore for MemoryStore {
	fn save_final(&self, region: &RegionFloor, raw: &RgbImage, mask: &GrayImage, points: &[PointOfInterest]) -> Result<(), Error> {
		self.finals.lock().insert(
			region.clone(),
			FinalOutput {
				raw: raw.clone(),
				mask: mask.clone(),
				points: points.to_vec(),
			},
		);
		Ok(())
	}
}
