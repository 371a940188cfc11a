use crate::{consts::*, prelude::*};

/// An inclusive range of gray levels
///
/// A pixel is inside the band when every channel is in `[lo, hi]` and the
/// channels differ from each other by at most [`GRAY_SPREAD`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrayBand {
	pub lo: u8,
	pub hi: u8,
}
impl GrayBand {
	#[inline]
	pub const fn new(lo: u8, hi: u8) -> Self {
		Self { lo, hi }
	}

	#[inline]
	pub fn contains(&self, pixel: Rgb<u8>) -> bool {
		let [r, g, b] = pixel.0;
		let min = r.min(g).min(b);
		let max = r.max(g).max(b);
		min >= self.lo && max <= self.hi && max - min <= GRAY_SPREAD
	}
}

pub const BACKGROUND: GrayBand = GrayBand::new(BACKGROUND_BAND[0], BACKGROUND_BAND[1]);

pub const ROAD: [GrayBand; 2] = [
	GrayBand::new(ROAD_BAND_CURRENT_FLOOR[0], ROAD_BAND_CURRENT_FLOOR[1]),
	GrayBand::new(ROAD_BAND_OTHER_FLOOR[0], ROAD_BAND_OTHER_FLOOR[1]),
];

pub const SENTINEL: Rgb<u8> = Rgb(SENTINEL_BACKGROUND);

#[inline]
pub fn is_road(pixel: Rgb<u8>) -> bool {
	ROAD.iter().any(|band| band.contains(pixel))
}

#[inline]
pub fn is_background(pixel: Rgb<u8>) -> bool {
	BACKGROUND.contains(pixel)
}

#[inline]
fn pixels(image: &RgbImage) -> impl IndexedParallelIterator<Item = Rgb<u8>> + '_ {
	image.as_raw().par_chunks_exact(3).map(|px| Rgb([px[0], px[1], px[2]]))
}

fn mask_where(image: &RgbImage, predicate: impl Fn(Rgb<u8>) -> bool + Sync) -> GrayImage {
	let mut mask = GrayImage::new(image.width(), image.height());
	mask.par_iter_mut().zip(pixels(image)).for_each(|(m, px)| {
		*m = if predicate(px) { 255 } else { 0 };
	});
	mask
}

/// 255 where the pixel is road, 0 elsewhere
pub fn road_mask(image: &RgbImage) -> GrayImage {
	mask_where(image, is_road)
}

pub fn background_mask(image: &RgbImage) -> GrayImage {
	mask_where(image, is_background)
}

/// 255 everywhere except the map background. Used to mask templates when registering tiles.
pub fn non_background_mask(image: &RgbImage) -> GrayImage {
	mask_where(image, |px| !is_background(px))
}

pub fn count_road(image: &RgbImage) -> usize {
	pixels(image).filter(|px| is_road(*px)).count()
}

pub fn count_background(image: &RgbImage) -> usize {
	pixels(image).filter(|px| is_background(*px)).count()
}

/// Inclusive bounds of every road pixel, or `None` if the image has no road
pub fn road_bounds(image: &RgbImage) -> Option<Rect<u32>> {
	let stride = image.width() as usize * 3;
	if stride == 0 {
		return None;
	}

	image
		.as_raw()
		.par_chunks_exact(stride)
		.enumerate()
		.filter_map(|(y, row)| {
			let mut xs = row
				.chunks_exact(3)
				.enumerate()
				.filter(|(_, px)| is_road(Rgb([px[0], px[1], px[2]])))
				.map(|(x, _)| x as u32);

			let first = xs.next()?;
			let last = xs.last().unwrap_or(first);

			Some(Rect { left: first, top: y as u32, right: last, bottom: y as u32 })
		})
		.reduce_with(|a, b| Rect {
			left: a.left.min(b.left),
			top: a.top.min(b.top),
			right: a.right.max(b.right),
			bottom: a.bottom.max(b.bottom),
		})
}
