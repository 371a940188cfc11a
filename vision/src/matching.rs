use crate::{
	fft::{self, Fft2d},
	prelude::*,
};
use rustfft::num_complex::Complex64;

/// Image variance below which a window is considered flat and unscorable
const MIN_WINDOW_VARIANCE: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
	pub confidence: f32,
	pub x: u32,
	pub y: u32,
	pub w: u32,
	pub h: u32,
}
impl MatchResult {
	#[inline]
	pub fn top_left(&self) -> Point<u32> {
		Point::new(self.x, self.y)
	}

	#[inline]
	pub fn center(&self) -> Point<u32> {
		Point::new(self.x + self.w / 2, self.y + self.h / 2)
	}
}

/// Hits above the threshold, in row-major discovery order
///
/// A hit landing within `merge_radius` of an existing one is folded into it,
/// keeping whichever has the higher confidence.
#[derive(Clone, Debug, Default)]
pub struct MatchResultList {
	results: Vec<MatchResult>,
	merge_radius: u32,
}
impl MatchResultList {
	pub fn new(merge_radius: u32) -> Self {
		Self { results: Vec::new(), merge_radius }
	}

	pub fn push(&mut self, result: MatchResult) {
		let radius = self.merge_radius as i64;
		let near = self.results.iter_mut().find(|existing| {
			let dx = existing.x as i64 - result.x as i64;
			let dy = existing.y as i64 - result.y as i64;
			dx * dx + dy * dy <= radius * radius
		});

		match near {
			Some(existing) => {
				if result.confidence > existing.confidence {
					*existing = result;
				}
			}
			None => self.results.push(result),
		}
	}

	/// The most confident hit. The earliest wins ties.
	pub fn max(&self) -> Option<&MatchResult> {
		let mut best: Option<&MatchResult> = None;
		for result in &self.results {
			if best.map(|best| result.confidence > best.confidence).unwrap_or(true) {
				best = Some(result);
			}
		}
		best
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.results.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.results.is_empty()
	}

	#[inline]
	pub fn iter(&self) -> std::slice::Iter<'_, MatchResult> {
		self.results.iter()
	}

	#[inline]
	pub fn into_vec(self) -> Vec<MatchResult> {
		self.results
	}
}
impl<'a> IntoIterator for &'a MatchResultList {
	type Item = &'a MatchResult;
	type IntoIter = std::slice::Iter<'a, MatchResult>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Smallest block side used when a small template is matched against a large image
const MIN_BLOCK_SIDE: u32 = 256;

/// Shift applied to image values so that window sums stay small
const CENTRE: f64 = 128.0;

/// Zero-mean template over the pixels its mask selects
struct TemplatePlan {
	width: usize,
	height: usize,
	/// `t'` per channel, zero outside the mask
	t_prime: [Vec<f64>; 3],
	/// 1.0 where the mask selects a pixel, or `None` when every pixel counts
	weight: Option<Vec<f64>>,
	var_t: f64,
	sum_w: f64,
}
impl TemplatePlan {
	fn new(template: &RgbImage, mask: Option<&GrayImage>) -> Option<Self> {
		let weight = mask.map(|mask| mask.pixels().map(|px| if px.0[0] != 0 { 1.0 } else { 0.0 }).collect::<Vec<f64>>());
		let selected = |i: usize| weight.as_ref().map(|weight| weight[i] != 0.0).unwrap_or(true);

		let mut sum_w = 0.0;
		let mut mean = [0.0f64; 3];
		for (i, px) in template.pixels().enumerate() {
			if selected(i) {
				sum_w += 1.0;
				for c in 0..3 {
					mean[c] += px.0[c] as f64;
				}
			}
		}
		if sum_w == 0.0 {
			return None;
		}
		mean.iter_mut().for_each(|m| *m /= sum_w);

		let mut var_t = 0.0;
		let mut t_prime: [Vec<f64>; 3] = Default::default();
		for (i, px) in template.pixels().enumerate() {
			for c in 0..3 {
				let t = if selected(i) { px.0[c] as f64 - mean[c] } else { 0.0 };
				var_t += t * t;
				t_prime[c].push(t);
			}
		}
		if var_t < MIN_WINDOW_VARIANCE {
			return None;
		}

		Some(Self {
			width: template.width() as usize,
			height: template.height() as usize,
			t_prime,
			weight,
			var_t,
			sum_w,
		})
	}

	/// Normalized zero-mean correlation from a window's raw sums
	///
	/// `sum` holds the per channel sums of the centred image under the mask, `sum_sq` the sum of their squares.
	#[inline]
	fn score(&self, dot: f64, sum: [f64; 3], sum_sq: f64) -> f32 {
		let var_i = sum_sq - (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]) / self.sum_w;
		if var_i < MIN_WINDOW_VARIANCE {
			return f32::NAN;
		}
		(dot / (self.var_t * var_i).sqrt()) as f32
	}

	/// Scores every placement of the template inside `image`, row-major
	///
	/// Correlations are computed in the frequency domain, one block of the image at a time.
	/// Blocks overlap by the template size so that every placement falls entirely inside one of them.
	fn scores(&self, image: &RgbImage) -> Vec<f32> {
		let (iw, ih) = (image.width() as usize, image.height() as usize);
		let (rw, rh) = (iw - self.width + 1, ih - self.height + 1);

		// masked sums come out of the block correlation instead
		let window_sums = match self.weight {
			None => box_sums(image, self.width, self.height),
			Some(_) => Vec::new(),
		};

		let block_side = |image: usize, template: usize| fft::fast_len(image.min((2 * template).max(MIN_BLOCK_SIDE as usize)));
		let (bw, bh) = (block_side(iw, self.width), block_side(ih, self.height));
		let fft = Fft2d::new(bw, bh);

		let mut scores = vec![f32::NAN; rw * rh];
		for by in (0..rh).step_by(bh - self.height + 1) {
			for bx in (0..rw).step_by(bw - self.width + 1) {
				let block = self.correlate_block(image, &fft, bx, by);
				let valid_w = (bw - self.width + 1).min(rw - bx);
				let valid_h = (bh - self.height + 1).min(rh - by);

				scores[by * rw..(by + valid_h) * rw]
					.par_chunks_exact_mut(rw)
					.enumerate()
					.for_each(|(ly, row)| {
						for lx in 0..valid_w {
							let local = ly * bw + lx;
							let (sum, sum_sq) = match &block.sums {
								Some((s01, s2q)) => ([s01[local].re, s01[local].im, s2q[local].re], s2q[local].im),
								None => window_sums[(by + ly) * rw + bx + lx],
							};
							row[bx + lx] = self.score(block.dot[local].re, sum, sum_sq);
						}
					});
			}
		}
		scores
	}

	/// Correlates one `fft`-sized block of `image`, whose top left is (`bx`, `by`), with the template
	fn correlate_block(&self, image: &RgbImage, fft: &Fft2d, bx: usize, by: usize) -> BlockCorrelation {
		let (iw, ih) = (image.width() as usize, image.height() as usize);
		let (w, h) = (iw - bx, ih - by);
		let raw = image.as_raw();
		let centred = move |x: usize, y: usize, c: usize| raw[((by + y) * iw + bx + x) * 3 + c] as f64 - CENTRE;

		let weight = self.weight.as_ref().map(|weight| fft.forward(fft.load(self.width, self.height, |x, y| weight[y * self.width + x])));

		let mut dot = fft.zeroed();
		let mut sums = weight.as_ref().map(|_| (fft.zeroed(), fft.zeroed()));

		for c in 0..3 {
			let channel = fft.forward(fft.load(w, h, |x, y| centred(x, y, c)));
			let template = fft.forward(fft.load(self.width, self.height, |x, y| self.t_prime[c][y * self.width + x]));
			dot.par_iter_mut()
				.zip(channel.par_iter().zip(template.par_iter()))
				.for_each(|(acc, (i, t))| *acc += i * t.conj());
			drop(template);

			if let (Some(weight), Some((s01, s2q))) = (&weight, &mut sums) {
				// two real correlations share one inverse transform as its real and imaginary parts
				let (acc, part) = match c {
					0 => (s01, Complex64::new(1.0, 0.0)),
					1 => (s01, Complex64::i()),
					_ => (s2q, Complex64::new(1.0, 0.0)),
				};
				accumulate(acc, &channel, weight, part);
			}
		}

		if let (Some(weight), Some((_, s2q))) = (&weight, &mut sums) {
			let squares = fft.forward(fft.load(w, h, |x, y| (0..3).map(|c| centred(x, y, c).powi(2)).sum()));
			accumulate(s2q, &squares, weight, Complex64::i());
		}

		BlockCorrelation {
			dot: fft.inverse(dot),
			sums: sums.map(|(s01, s2q)| (fft.inverse(s01), fft.inverse(s2q))),
		}
	}
}

struct BlockCorrelation {
	dot: Vec<Complex64>,
	/// Masked window sums packed as (sum0 + i sum1, sum2 + i sum_sq)
	sums: Option<(Vec<Complex64>, Vec<Complex64>)>,
}

/// `acc += part * signal * conj(weight)`
fn accumulate(acc: &mut [Complex64], signal: &[Complex64], weight: &[Complex64], part: Complex64) {
	acc.par_iter_mut()
		.zip(signal.par_iter().zip(weight.par_iter()))
		.for_each(|(acc, (s, w))| *acc += part * s * w.conj());
}

/// Centred channel sums and summed squares of every `tw`x`th` window, row-major
///
/// Sliding sums: exact, since every partial sum is an integer well inside f64's mantissa.
fn box_sums(image: &RgbImage, tw: usize, th: usize) -> Vec<([f64; 3], f64)> {
	let (iw, ih) = (image.width() as usize, image.height() as usize);
	let (rw, rh) = (iw - tw + 1, ih - th + 1);
	let raw = image.as_raw();

	let add_row = |columns: &mut [[f64; 4]], y: usize, sign: f64| {
		for (x, column) in columns.iter_mut().enumerate() {
			let px = &raw[(y * iw + x) * 3..][..3];
			let mut sq = 0.0;
			for c in 0..3 {
				let value = px[c] as f64 - CENTRE;
				column[c] += sign * value;
				sq += value * value;
			}
			column[3] += sign * sq;
		}
	};

	let mut columns = vec![[0.0f64; 4]; iw];
	for y in 0..th {
		add_row(&mut columns, y, 1.0);
	}

	let mut sums = Vec::with_capacity(rw * rh);
	for y in 0..rh {
		if y > 0 {
			add_row(&mut columns, y - 1, -1.0);
			add_row(&mut columns, y + th - 1, 1.0);
		}

		let mut window = [0.0f64; 4];
		for column in &columns[..tw] {
			(0..4).for_each(|i| window[i] += column[i]);
		}
		sums.push(([window[0], window[1], window[2]], window[3]));

		for x in 1..rw {
			(0..4).for_each(|i| window[i] += columns[x + tw - 1][i] - columns[x - 1][i]);
			sums.push(([window[0], window[1], window[2]], window[3]));
		}
	}
	sums
}

/// Slides `template` over every placement inside `image` and collects the placements scoring at least `threshold`
///
/// Scores are the zero-mean normalized cross-correlation summed over the three channels,
/// restricted to the pixels where `mask` is non-zero. Windows that cannot be scored
/// (flat image or flat template) are skipped.
pub fn match_template(image: &RgbImage, template: &RgbImage, mask: Option<&GrayImage>, threshold: f32, merge_radius: u32) -> MatchResultList {
	let mut results = MatchResultList::new(merge_radius);

	let (iw, ih) = image.dimensions();
	let (tw, th) = template.dimensions();
	if tw == 0 || th == 0 || tw > iw || th > ih {
		return results;
	}
	if let Some(mask) = mask {
		debug_assert_eq!(mask.dimensions(), template.dimensions());
	}

	let plan = match TemplatePlan::new(template, mask) {
		Some(plan) => plan,
		None => return results,
	};

	let rw = (iw - tw + 1) as usize;
	for (i, confidence) in plan.scores(image).into_iter().enumerate() {
		if confidence.is_finite() && confidence >= threshold {
			results.push(MatchResult {
				confidence,
				x: (i % rw) as u32,
				y: (i / rw) as u32,
				w: tw,
				h: th,
			});
		}
	}

	results
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	/// Deterministic noise so that every window of the image is distinct
	pub(crate) fn noise(width: u32, height: u32, seed: u32) -> RgbImage {
		let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
		RgbImage::from_fn(width, height, |_, _| {
			let mut next = || {
				state = state.wrapping_mul(1664525).wrapping_add(1013904223);
				(state >> 24) as u8
			};
			Rgb([next(), next(), next()])
		})
	}

	/// Score of one placement, straight from the definition
	fn direct_score(image: &RgbImage, template: &RgbImage, mask: &GrayImage, x: u32, y: u32) -> f32 {
		let selected = |tx: u32, ty: u32| mask.get_pixel(tx, ty).0[0] != 0;
		let n = mask.pixels().filter(|px| px.0[0] != 0).count() as f64;

		let mut t_mean = [0.0f64; 3];
		let mut i_mean = [0.0f64; 3];
		for (tx, ty, px) in template.enumerate_pixels().filter(|(tx, ty, _)| selected(*tx, *ty)) {
			for c in 0..3 {
				t_mean[c] += px.0[c] as f64 / n;
				i_mean[c] += image.get_pixel(x + tx, y + ty).0[c] as f64 / n;
			}
		}

		let (mut dot, mut var_t, mut var_i) = (0.0, 0.0, 0.0);
		for (tx, ty, px) in template.enumerate_pixels().filter(|(tx, ty, _)| selected(*tx, *ty)) {
			for c in 0..3 {
				let t = px.0[c] as f64 - t_mean[c];
				let i = image.get_pixel(x + tx, y + ty).0[c] as f64 - i_mean[c];
				dot += t * i;
				var_t += t * t;
				var_i += i * i;
			}
		}

		if var_i < MIN_WINDOW_VARIANCE {
			f32::NAN
		} else {
			(dot / (var_t * var_i).sqrt()) as f32
		}
	}

	#[test]
	fn test_scores_agree_with_definition() {
		// wide enough to be split into two blocks, with a flat patch of unscorable windows
		let mut image = noise(300, 40, 5);
		for y in 5..30 {
			for x in 240..280 {
				image.put_pixel(x, y, Rgb([85, 85, 85]));
			}
		}
		let template = noise(10, 8, 6);

		let mut partial = GrayImage::from_pixel(10, 8, Luma([255]));
		for y in 0..8 {
			for x in 0..3 {
				partial.put_pixel(x, y, Luma([0]));
			}
		}
		let full = GrayImage::from_pixel(10, 8, Luma([255]));

		for (mask, plan_mask) in [(&partial, Some(&partial)), (&full, None)] {
			let scores = TemplatePlan::new(&template, plan_mask).unwrap().scores(&image);
			assert_eq!(scores.len(), 291 * 33);

			for (i, score) in scores.into_iter().enumerate() {
				let (x, y) = ((i % 291) as u32, (i / 291) as u32);
				let expected = direct_score(&image, &template, mask, x, y);
				if expected.is_nan() {
					assert!(score.is_nan(), "({x}, {y}): expected unscorable, got {score}");
				} else {
					assert!((score - expected).abs() < 1e-4, "({x}, {y}): {score} != {expected}");
				}
			}
		}
	}

	#[test]
	fn test_exact_match() {
		let image = noise(40, 30, 1);
		let template = image.par_crop(11, 7, 9, 6);

		let results = match_template(&image, &template, None, 0.9, 10);
		let best = results.max().unwrap();
		assert_eq!((best.x, best.y, best.w, best.h), (11, 7, 9, 6));
		assert!(best.confidence > 0.999);
		assert_eq!(best.center(), Point::new(15, 10));
	}

	#[test]
	fn test_masked_match_ignores_masked_pixels() {
		let image = noise(40, 30, 2);
		let mut template = image.par_crop(20, 5, 10, 10);
		let mut mask = GrayImage::from_pixel(10, 10, Luma([255]));
		for y in 0..10 {
			for x in 0..4 {
				template.put_pixel(x, y, Rgb([0, 255, 0]));
				mask.put_pixel(x, y, Luma([0]));
			}
		}

		let unmasked = match_template(&image, &template, None, 0.9, 10);
		assert!(unmasked.is_empty());

		let masked = match_template(&image, &template, Some(&mask), 0.9, 10);
		let best = masked.max().unwrap();
		assert_eq!(best.top_left(), Point::new(20, 5));
	}

	#[test]
	fn test_degenerate_inputs() {
		let image = noise(10, 10, 3);
		assert!(match_template(&image, &noise(11, 2, 4), None, 0.5, 10).is_empty());
		assert!(match_template(&image, &RgbImage::new(0, 3), None, 0.5, 10).is_empty());

		let flat = RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]));
		assert!(match_template(&image, &flat, None, 0.0, 10).is_empty());
		assert!(match_template(&flat, &image.par_crop(0, 0, 2, 2), None, -1.0, 10).is_empty());

		let empty_mask = GrayImage::new(3, 3);
		assert!(match_template(&image, &image.par_crop(0, 0, 3, 3), Some(&empty_mask), -1.0, 10).is_empty());
	}

	#[test]
	fn test_merge_keeps_most_confident() {
		let mut list = MatchResultList::new(10);
		list.push(MatchResult { confidence: 0.8, x: 0, y: 0, w: 1, h: 1 });
		list.push(MatchResult { confidence: 0.95, x: 6, y: 8, w: 1, h: 1 });
		list.push(MatchResult { confidence: 0.9, x: 3, y: 3, w: 1, h: 1 });
		list.push(MatchResult { confidence: 0.7, x: 40, y: 0, w: 1, h: 1 });

		assert_eq!(list.len(), 2);
		assert_eq!(list.iter().map(|r| (r.x, r.y)).collect::<Vec<_>>(), vec![(6, 8), (40, 0)]);
		assert_eq!(list.max().unwrap().confidence, 0.95);
	}

	#[test]
	fn test_max_prefers_earliest_on_ties() {
		let mut list = MatchResultList::new(0);
		list.push(MatchResult { confidence: 0.9, x: 5, y: 0, w: 1, h: 1 });
		list.push(MatchResult { confidence: 0.9, x: 1, y: 3, w: 1, h: 1 });
		assert_eq!(list.max().unwrap().x, 5);
	}
}
