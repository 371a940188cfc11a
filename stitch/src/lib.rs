pub mod prelude {
	pub use crate::{
		canvas::Canvas,
		checkpoint::Checkpoint,
		error::Error,
		region::{GridPos, RegionFloor},
		store::{CanvasStore, CheckpointStore, OutputStore, Store, TileStore},
	};

	pub use lms_vision::{
		catalogue::TemplateCatalogue,
		colors,
		locate::PointOfInterest,
		register::{CutRange, Direction, RegistrarParams},
	};

	pub use lms_util::*;
}

pub mod error;
pub mod region;
pub mod store;
pub mod checkpoint;
pub mod canvas;
pub mod assemble;
pub mod ops;

pub use error::Error;
pub use ops::{StitchParams, Stitcher};
