use crate::region::RegionFloor;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("image error: {0}")]
	Image(#[from] lms_util::image::ImageError),

	#[error("checkpoint error: {0}")]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Vision(#[from] lms_vision::Error),

	#[error("{0}: no tiles to assemble")]
	NoTiles(RegionFloor),

	#[error("{0}: no assembled canvas")]
	MissingCanvas(RegionFloor),

	#[error("{region}: checkpoint places {pos} which is not marked done")]
	InvalidCheckpoint { region: RegionFloor, pos: crate::region::GridPos },

	#[error("interrupted")]
	Interrupted,
}
