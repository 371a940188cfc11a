use crate::{colors, consts::*, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandParams {
	/// Radius of the in-game sensor overlay drawn around the player marker
	pub sensor_radius: u32,
	pub margin: u32,
	/// Added to both sides of an axis whose size equals the capture window's
	pub fixed_pad: u32,
	pub screen_map_size: [u32; 2],
	pub sub_screen_map_size: [u32; 2],
}
impl Default for ExpandParams {
	fn default() -> Self {
		Self {
			sensor_radius: EXPAND_SENSOR_RADIUS,
			margin: EXPAND_MARGIN,
			fixed_pad: EXPAND_FIXED_PAD,
			screen_map_size: SCREEN_MAP_SIZE,
			sub_screen_map_size: SUB_SCREEN_MAP_SIZE,
		}
	}
}
impl ExpandParams {
	/// Minimum distance between road and the canvas edge
	#[inline]
	pub fn clearance(&self) -> u32 {
		self.sensor_radius + self.margin
	}

	#[inline]
	pub fn capture_window(&self, sub_region: bool) -> [u32; 2] {
		if sub_region {
			self.sub_screen_map_size
		} else {
			self.screen_map_size
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Padding {
	pub left: u32,
	pub right: u32,
	pub top: u32,
	pub bottom: u32,
}
impl Padding {
	#[inline]
	pub fn is_zero(&self) -> bool {
		*self == Self::default()
	}
}

pub fn expand_padding(canvas: &RgbImage, sub_region: bool, params: &ExpandParams) -> Padding {
	let (w, h) = canvas.dimensions();
	let clearance = params.clearance();

	let mut padding = match colors::road_bounds(canvas) {
		Some(bounds) => Padding {
			left: clearance.saturating_sub(bounds.left),
			right: (bounds.right + clearance + 1).saturating_sub(w),
			top: clearance.saturating_sub(bounds.top),
			bottom: (bounds.bottom + clearance + 1).saturating_sub(h),
		},
		None => Padding::default(),
	};

	let [window_w, window_h] = params.capture_window(sub_region);
	if padding.left == 0 && padding.right == 0 && w == window_w {
		padding.left = params.fixed_pad;
		padding.right = params.fixed_pad;
	}
	if padding.top == 0 && padding.bottom == 0 && h == window_h {
		padding.top = params.fixed_pad;
		padding.bottom = params.fixed_pad;
	}

	padding
}

/// Pads the canvas with sentinel background so road keeps its clearance from every edge
///
/// Returns `None` when the canvas is already fine as it is.
pub fn expand(canvas: &RgbImage, sub_region: bool, params: &ExpandParams) -> Option<RgbImage> {
	let padding = expand_padding(canvas, sub_region, params);
	if padding.is_zero() {
		log::info!("{}x{} canvas needs no expansion", canvas.width(), canvas.height());
		return None;
	}

	let expanded = canvas.padded(padding.left, padding.right, padding.top, padding.bottom, colors::SENTINEL);
	log::info!(
		"expanded {}x{} canvas to {}x{} ({padding:?})",
		canvas.width(),
		canvas.height(),
		expanded.width(),
		expanded.height()
	);
	Some(expanded)
}

#[cfg(test)]
mod tests {
	use super::*;

	const ROAD: Rgb<u8> = Rgb([30, 30, 30]);

	#[test]
	fn test_clearance_restored() {
		let params = ExpandParams::default();
		let mut canvas = RgbImage::from_pixel(300, 300, Rgb([85, 85, 85]));
		canvas.put_pixel(10, 150, ROAD);
		canvas.put_pixel(290, 20, ROAD);

		assert_eq!(
			expand_padding(&canvas, false, &params),
			Padding { left: 95, right: 96, top: 85, bottom: 0 }
		);

		let expanded = expand(&canvas, false, &params).unwrap();
		assert_eq!(expanded.dimensions(), (491, 385));
		assert_eq!(*expanded.get_pixel(0, 0), colors::SENTINEL);

		let bounds = colors::road_bounds(&expanded).unwrap();
		let clearance = params.clearance();
		assert!(bounds.left >= clearance);
		assert!(bounds.top >= clearance);
		assert!(expanded.width() - 1 - bounds.right >= clearance);
		assert!(expanded.height() - 1 - bounds.bottom >= clearance);
	}

	#[test]
	fn test_no_expansion_needed() {
		let params = ExpandParams::default();
		let mut canvas = RgbImage::from_pixel(400, 400, Rgb([85, 85, 85]));
		canvas.put_pixel(200, 200, ROAD);
		assert!(expand(&canvas, false, &params).is_none());
		assert!(expand(&RgbImage::from_pixel(50, 50, colors::SENTINEL), true, &params).is_none());
	}

	#[test]
	fn test_capture_window_sized_canvas() {
		let params = ExpandParams::default();

		let blank = RgbImage::from_pixel(1015, 740, Rgb([85, 85, 85]));
		assert_eq!(expand(&blank, false, &params).unwrap().dimensions(), (1025, 750));
		assert!(expand(&blank, true, &params).is_none());

		let mut canvas = blank.clone();
		canvas.put_pixel(20, 370, ROAD);
		assert_eq!(
			expand_padding(&canvas, false, &params),
			Padding { left: 85, right: 0, top: 5, bottom: 5 }
		);

		let sub = RgbImage::from_pixel(1400, 765, Rgb([85, 85, 85]));
		assert_eq!(
			expand_padding(&sub, true, &params),
			Padding { left: 5, right: 5, top: 5, bottom: 5 }
		);
	}
}
