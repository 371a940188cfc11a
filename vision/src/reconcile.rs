use crate::{colors, consts::*, matching, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileParams {
	/// Border removed from every side of the second canvas before searching for it in the first
	pub cut: CutRange,
	pub threshold: f32,
	pub merge_radius: u32,
}
impl Default for ReconcileParams {
	fn default() -> Self {
		Self {
			cut: CutRange::from_array(RECONCILE_CUT),
			threshold: RECONCILE_THRESHOLD,
			merge_radius: MATCH_MERGE_RADIUS,
		}
	}
}

/// Offset of `b`'s top left corner relative to `a`'s
///
/// Shrinking crops of `b` are searched for in `a` first. When `b` is the larger canvas none of
/// them may fit, so crops of `a` are then searched for in `b`.
pub fn relative_offset(a: &RgbImage, b: &RgbImage, params: &ReconcileParams) -> Result<Point<i32>, Error> {
	if let Some(offset) = find_crop(a, b, params) {
		return Ok(offset);
	}
	if let Some(offset) = find_crop(b, a, params) {
		return Ok(-offset);
	}

	Err(Error::Unrelatable {
		a_w: a.width(),
		a_h: a.height(),
		b_w: b.width(),
		b_h: b.height(),
	})
}

/// Searches `a` for centre crops of `b`, returning `b`'s offset from the first cut that matches
fn find_crop(a: &RgbImage, b: &RgbImage, params: &ReconcileParams) -> Option<Point<i32>> {
	let (aw, ah) = a.dimensions();
	let (bw, bh) = b.dimensions();

	for cut in params.cut.iter() {
		if 2 * cut >= bw.min(bh) {
			break;
		}

		let (tw, th) = (bw - 2 * cut, bh - 2 * cut);
		if tw > aw || th > ah {
			continue;
		}

		let template = b.par_crop(cut, cut, tw, th);
		let results = matching::match_template(a, &template, None, params.threshold, params.merge_radius);
		if let Some(best) = results.max() {
			let offset = Point::new(best.x as i32 - cut as i32, best.y as i32 - cut as i32);
			log::info!(
				"{bw}x{bh} canvas found in {aw}x{ah} at cut {cut} with confidence {:.3}, offset {offset:?}",
				best.confidence
			);
			return Some(offset);
		}
	}

	None
}

/// Pads both canvases into their common bounding rectangle so that shared content lines up
///
/// Returns `Ok(None)` when they are already the same size.
pub fn reconcile(a: &RgbImage, b: &RgbImage, params: &ReconcileParams) -> Result<Option<(RgbImage, RgbImage)>, Error> {
	if a.dimensions() == b.dimensions() {
		return Ok(None);
	}

	let offset = relative_offset(a, b, params)?;

	let a_origin = Point::new((-offset.x).max(0) as u32, (-offset.y).max(0) as u32);
	let b_origin = Point::new(offset.x.max(0) as u32, offset.y.max(0) as u32);

	let width = (a_origin.x + a.width()).max(b_origin.x + b.width());
	let height = (a_origin.y + a.height()).max(b_origin.y + b.height());

	let pad = |image: &RgbImage, origin: Point<u32>| {
		image.padded(
			origin.x,
			width - origin.x - image.width(),
			origin.y,
			height - origin.y - image.height(),
			colors::SENTINEL,
		)
	};

	let padded = (pad(a, a_origin), pad(b, b_origin));
	log::info!(
		"reconciled {}x{} and {}x{} canvases to {width}x{height}",
		a.width(),
		a.height(),
		b.width(),
		b.height()
	);
	Ok(Some(padded))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matching::tests::noise;

	fn params() -> ReconcileParams {
		ReconcileParams { cut: CutRange::new(5, 40, 5), ..Default::default() }
	}

	#[test]
	fn test_same_size_is_unchanged() {
		let a = noise(30, 20, 1);
		let b = noise(30, 20, 2);
		assert!(reconcile(&a, &b, &params()).unwrap().is_none());
	}

	#[test]
	fn test_reconcile_offset_canvases() {
		let world = noise(120, 100, 3);
		let a = world.par_crop(0, 10, 90, 80);
		let b = world.par_crop(20, 0, 100, 70);

		assert_eq!(relative_offset(&a, &b, &params()).unwrap(), Point::new(20, -10));

		let (a2, b2) = reconcile(&a, &b, &params()).unwrap().unwrap();
		assert_eq!(a2.dimensions(), (120, 90));
		assert_eq!(b2.dimensions(), a2.dimensions());

		// shared content lines up
		assert_eq!(a2.get_pixel(40, 30), world.get_pixel(40, 30));
		assert_eq!(b2.get_pixel(40, 30), world.get_pixel(40, 30));
		assert_eq!(*a2.get_pixel(0, 0), colors::SENTINEL);
		assert_eq!(*b2.get_pixel(0, 80), colors::SENTINEL);
	}

	#[test]
	fn test_unrelated_canvases() {
		let a = noise(60, 60, 4);
		let b = noise(50, 40, 5);
		assert!(matches!(reconcile(&a, &b, &params()), Err(Error::Unrelatable { .. })));
	}

	#[test]
	fn test_smaller_canvas_first() {
		let world = noise(100, 80, 6);
		let a = world.par_crop(30, 20, 40, 30);
		let b = world.par_crop(0, 0, 100, 80);

		// no crop of `b` at these cuts fits inside `a`
		let params = ReconcileParams { cut: CutRange::new(5, 20, 5), ..Default::default() };
		assert_eq!(relative_offset(&a, &b, &params).unwrap(), Point::new(-30, -20));

		let (a2, b2) = reconcile(&a, &b, &params).unwrap().unwrap();
		assert_eq!(a2.dimensions(), (100, 80));
		assert_eq!(b2.dimensions(), (100, 80));
		assert_eq!(a2.get_pixel(50, 40), world.get_pixel(50, 40));
		assert_eq!(*a2.get_pixel(10, 10), colors::SENTINEL);
	}
}
