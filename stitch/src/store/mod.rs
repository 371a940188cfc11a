use crate::prelude::*;

mod fs;
pub use fs::FsStore;

mod memory;
pub use memory::{FinalOutput, MemoryStore};

/// Captured tiles
///
/// Implementations log and hide read failures: an unreadable tile is a missing tile.
pub trait TileStore {
	fn get(&self, region: &RegionFloor, pos: GridPos) -> Option<RgbImage>;
	fn put(&self, region: &RegionFloor, pos: GridPos, tile: &RgbImage) -> Result<(), Error>;

	fn contains(&self, region: &RegionFloor, pos: GridPos) -> bool {
		self.get(region, pos).is_some()
	}
}

pub trait CheckpointStore {
	fn load(&self, region: &RegionFloor) -> Result<Option<Checkpoint>, Error>;
	fn save(&self, region: &RegionFloor, checkpoint: &Checkpoint) -> Result<(), Error>;
}

pub trait CanvasStore {
	fn load_canvas(&self, region: &RegionFloor) -> Result<Option<RgbImage>, Error>;
	fn save_canvas(&self, region: &RegionFloor, canvas: &RgbImage) -> Result<(), Error>;
}

/// Final map, walkable mask and points of interest of a finished region floor
pub trait OutputStore {
	fn save_final(&self, region: &RegionFloor, raw: &RgbImage, mask: &GrayImage, points: &[PointOfInterest]) -> Result<(), Error>;
}

/// Everything the region operations read and write
pub trait Store: TileStore + CheckpointStore + CanvasStore + OutputStore {}
impl<S: TileStore + CheckpointStore + CanvasStore + OutputStore + ?Sized> Store for S {}
