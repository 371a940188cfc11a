use crate::prelude::*;

/// Stores everything as PNG and JSON files under a work directory
///
/// ```text
/// <root>/<region>/part/<region>_part_<floor>_<row>_<col>.png
/// <root>/<region>/floor/<region>_merge_<floor>.png
/// <root>/<region>/merge_checkpoint/<region>_<floor>.json
/// <root>/<region>/final/<region>_<floor>_{raw.png,mask.png,points.json}
/// ```
#[derive(Clone, Debug)]
pub struct FsStore {
	root: PathBuf,
}
impl FsStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	#[inline]
	pub fn root(&self) -> &Path {
		&self.root
	}

	fn region_dir(&self, region: &RegionFloor, kind: &str) -> PathBuf {
		self.root.join(&region.region).join(kind)
	}

	pub fn tile_path(&self, region: &RegionFloor, pos: GridPos) -> PathBuf {
		self.region_dir(region, "part").join(format!(
			"{}_part_{}_{:02}_{:02}.png",
			region.region,
			region.floor_label(),
			pos.row,
			pos.col
		))
	}

	pub fn canvas_path(&self, region: &RegionFloor) -> PathBuf {
		self.region_dir(region, "floor").join(format!("{}_merge_{}.png", region.region, region.floor_label()))
	}

	pub fn checkpoint_path(&self, region: &RegionFloor) -> PathBuf {
		self.region_dir(region, "merge_checkpoint").join(format!("{}_{}.json", region.region, region.floor_label()))
	}

	pub fn final_path(&self, region: &RegionFloor, suffix: &str) -> PathBuf {
		self.region_dir(region, "final").join(format!("{}_{}_{suffix}", region.region, region.floor_label()))
	}
}

fn create_parent(path: &Path) -> Result<(), Error> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	Ok(())
}

/// Replaces `path` through a temp file so it never holds a partial write
fn write_replace(path: &Path, contents: &[u8]) -> Result<(), Error> {
	create_parent(path)?;
	let tmp = path.with_extension("tmp");
	std::fs::write(&tmp, contents)?;
	std::fs::rename(&tmp, path)?;
	Ok(())
}

fn load_rgb(path: &Path) -> Result<Option<RgbImage>, Error> {
	if !path.is_file() {
		return Ok(None);
	}
	Ok(Some(image::open(path)?.to_rgb8()))
}

impl TileStore for FsStore {
	fn get(&self, region: &RegionFloor, pos: GridPos) -> Option<RgbImage> {
		let path = self.tile_path(region, pos);
		match load_rgb(&path) {
			Ok(tile) => tile,
			Err(err) => {
				log::warn!("unreadable tile {}: {err}", path.display());
				None
			}
		}
	}

	fn put(&self, region: &RegionFloor, pos: GridPos, tile: &RgbImage) -> Result<(), Error> {
		let path = self.tile_path(region, pos);
		create_parent(&path)?;
		tile.save(path)?;
		Ok(())
	}
}

impl CheckpointStore for FsStore {
	fn load(&self, region: &RegionFloor) -> Result<Option<Checkpoint>, Error> {
		let path = self.checkpoint_path(region);
		if !path.is_file() {
			return Ok(None);
		}
		let json = std::fs::read_to_string(&path)?;
		Ok(Some(Checkpoint::from_json(&json)?))
	}

	fn save(&self, region: &RegionFloor, checkpoint: &Checkpoint) -> Result<(), Error> {
		write_replace(&self.checkpoint_path(region), checkpoint.to_json()?.as_bytes())
	}
}

impl CanvasStore for FsStore {
	fn load_canvas(&self, region: &RegionFloor) -> Result<Option<RgbImage>, Error> {
		load_rgb(&self.canvas_path(region))
	}

	fn save_canvas(&self, region: &RegionFloor, canvas: &RgbImage) -> Result<(), Error> {
		let path = self.canvas_path(region);
		create_parent(&path)?;
		canvas.save(&path)?;
		log::info!("saved {}x{} canvas to {}", canvas.width(), canvas.height(), path.display());
		Ok(())
	}
}

impl OutputStore for FsStore {
	fn save_final(&self, region: &RegionFloor, raw: &RgbImage, mask: &GrayImage, points: &[PointOfInterest]) -> Result<(), Error> {
		let raw_path = self.final_path(region, "raw.png");
		create_parent(&raw_path)?;
		raw.save(&raw_path)?;
		mask.save(self.final_path(region, "mask.png"))?;
		write_replace(&self.final_path(region, "points.json"), serde_json::to_string_pretty(points)?.as_bytes())?;

		log::info!("saved {region} with {} points of interest to {}", points.len(), raw_path.display());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_layout() {
		let store = FsStore::new("work");
		let region = RegionFloor::new("harbor", -2);

		assert_eq!(
			store.tile_path(&region, GridPos::new(3, 12)),
			Path::new("work/harbor/part/harbor_part_b2_03_12.png")
		);
		assert_eq!(store.canvas_path(&region), Path::new("work/harbor/floor/harbor_merge_b2.png"));
		assert_eq!(store.checkpoint_path(&region), Path::new("work/harbor/merge_checkpoint/harbor_b2.json"));
		assert_eq!(store.final_path(&region, "points.json"), Path::new("work/harbor/final/harbor_b2_points.json"));
	}

	#[test]
	fn test_round_trip_on_disk() {
		let scratch = ScratchDir::new("fs-store").unwrap();
		let store = FsStore::new(scratch.path());
		let region = RegionFloor::new("harbor", 0);
		let pos = GridPos::new(1, 2);

		assert!(!store.contains(&region, pos));
		assert!(store.get(&region, pos).is_none());
		assert!(CheckpointStore::load(&store, &region).unwrap().is_none());
		assert!(store.load_canvas(&region).unwrap().is_none());

		let tile = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
		store.put(&region, pos, &tile).unwrap();
		assert!(store.contains(&region, pos));
		assert_eq!(store.get(&region, pos).unwrap(), tile);

		let checkpoint = Checkpoint {
			canvas_width: 3,
			canvas_height: 2,
			done: [pos].into_iter().collect(),
			placements: vec![(pos, Point::new(0, 0))],
		};
		store.save(&region, &checkpoint).unwrap();
		assert_eq!(CheckpointStore::load(&store, &region).unwrap(), Some(checkpoint));

		let points = [PointOfInterest { template_id: "mm_tp_01".into(), x: 1, y: 1 }];
		store.save_final(&region, &tile, &GrayImage::new(3, 2), &points).unwrap();
		let json = std::fs::read_to_string(store.final_path(&region, "points.json")).unwrap();
		assert_eq!(serde_json::from_str::<Vec<PointOfInterest>>(&json).unwrap(), points);
	}

	#[test]
	fn test_unreadable_tile_is_missing() {
		let scratch = ScratchDir::new("fs-store-corrupt").unwrap();
		let store = FsStore::new(scratch.path());
		let region = RegionFloor::new("harbor", 1);
		let path = store.tile_path(&region, GridPos::new(1, 1));

		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(&path, b"not a png").unwrap();
		assert!(store.get(&region, GridPos::new(1, 1)).is_none());
		assert!(!store.contains(&region, GridPos::new(1, 1)));
	}
}
