#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("image error: {0}")]
	Image(#[from] lms_util::image::ImageError),

	#[error("template {id}: mask is {mask_w}x{mask_h} but the template is {w}x{h}")]
	MaskSize { id: String, w: u32, h: u32, mask_w: u32, mask_h: u32 },

	#[error("no crop of the {b_w}x{b_h} canvas could be located in the {a_w}x{a_h} canvas")]
	Unrelatable { a_w: u32, a_h: u32, b_w: u32, b_h: u32 },

	#[error("failed to start the worker pool: {0}")]
	ThreadPool(#[from] lms_util::rayon::ThreadPoolBuildError),
}
