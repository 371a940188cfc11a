use crate::prelude::*;

/// The assembled map of one region floor
///
/// Pixels not covered by any tile hold [`colors::SENTINEL`]. The canvas only ever grows.
#[derive(Clone, Debug)]
pub struct Canvas {
	image: RgbImage,
}
impl Canvas {
	pub fn blank(width: u32, height: u32) -> Self {
		Self { image: RgbImage::from_pixel(width, height, colors::SENTINEL) }
	}

	#[inline]
	pub fn from_tile(tile: RgbImage) -> Self {
		Self { image: tile }
	}

	#[inline]
	pub fn image(&self) -> &RgbImage {
		&self.image
	}

	#[inline]
	pub fn into_image(self) -> RgbImage {
		self.image
	}

	#[inline]
	pub fn dimensions(&self) -> (u32, u32) {
		self.image.dimensions()
	}

	/// Draws `tile` with its top left corner at `at`, clipped to the canvas
	pub fn paint(&mut self, tile: &RgbImage, at: Point<i32>) {
		image::imageops::replace(&mut self.image, tile, at.x as i64, at.y as i64);
	}

	/// Grows the canvas to the union of its extent and the tile placed at `at`, then paints the tile
	///
	/// `at` may be negative, in which case existing content moves right/down. Returns that move,
	/// which has to be applied to every earlier placement.
	pub fn merge(&mut self, tile: &RgbImage, at: Point<i32>) -> Point<i32> {
		let shift = Point::new((-at.x).max(0), (-at.y).max(0));
		let at = at + shift;

		let (w, h) = self.dimensions();
		let width = (w as i64 + shift.x as i64).max(at.x as i64 + tile.width() as i64) as u32;
		let height = (h as i64 + shift.y as i64).max(at.y as i64 + tile.height() as i64) as u32;

		if (width, height) != (w, h) {
			let mut grown = RgbImage::from_pixel(width, height, colors::SENTINEL);
			image::imageops::replace(&mut grown, &self.image, shift.x as i64, shift.y as i64);
			self.image = grown;
			log::debug!("canvas grew from {w}x{h} to {width}x{height}, content moved by {shift:?}");
		}

		self.paint(tile, at);
		shift
	}
}
