use crate::prelude::*;
use rustfft::{num_complex::Complex64, Fft, FftPlanner};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Smallest length at or above `n` whose only prime factors are 2, 3 and 5
pub(crate) fn fast_len(n: usize) -> usize {
	(n.max(1)..)
		.find(|&len| {
			let mut rest = len;
			for p in [2, 3, 5] {
				while rest % p == 0 {
					rest /= p;
				}
			}
			rest == 1
		})
		.unwrap_or(n)
}

/// 2D transform over a row-major `width`x`height` grid
///
/// Spectra stay column-major between `forward` and `inverse`, which saves a transpose
/// each way. Nothing but pointwise products is done on them, so the layout doesn't matter.
pub(crate) struct Fft2d {
	width: usize,
	height: usize,
	row_forward: Arc<dyn Fft<f64>>,
	row_inverse: Arc<dyn Fft<f64>>,
	col_forward: Arc<dyn Fft<f64>>,
	col_inverse: Arc<dyn Fft<f64>>,
}
impl Fft2d {
	pub fn new(width: usize, height: usize) -> Self {
		let mut planner = FftPlanner::new();
		Self {
			width,
			height,
			row_forward: planner.plan_fft_forward(width),
			row_inverse: planner.plan_fft_inverse(width),
			col_forward: planner.plan_fft_forward(height),
			col_inverse: planner.plan_fft_inverse(height),
		}
	}

	#[inline]
	pub fn width(&self) -> usize {
		self.width
	}

	#[inline]
	pub fn zeroed(&self) -> Vec<Complex64> {
		vec![ZERO; self.width * self.height]
	}

	/// A grid holding `value(x, y)` in its top left `width`x`height` corner and zero elsewhere
	pub fn load<F>(&self, width: usize, height: usize, value: F) -> Vec<Complex64>
	where
		F: Fn(usize, usize) -> f64 + Sync,
	{
		let width = width.min(self.width);
		let mut signal = self.zeroed();
		signal
			.par_chunks_exact_mut(self.width)
			.take(height.min(self.height))
			.enumerate()
			.for_each(|(y, row)| {
				for (x, cell) in row[..width].iter_mut().enumerate() {
					*cell = Complex64::new(value(x, y), 0.0);
				}
			});
		signal
	}

	pub fn forward(&self, mut signal: Vec<Complex64>) -> Vec<Complex64> {
		debug_assert_eq!(signal.len(), self.width * self.height);
		process_rows(&self.row_forward, self.width, &mut signal);
		let mut spectrum = transpose(&signal, self.width, self.height);
		drop(signal);
		process_rows(&self.col_forward, self.height, &mut spectrum);
		spectrum
	}

	/// Inverse of `forward`, normalised
	pub fn inverse(&self, mut spectrum: Vec<Complex64>) -> Vec<Complex64> {
		debug_assert_eq!(spectrum.len(), self.width * self.height);
		process_rows(&self.col_inverse, self.height, &mut spectrum);
		let mut signal = transpose(&spectrum, self.height, self.width);
		drop(spectrum);
		process_rows(&self.row_inverse, self.width, &mut signal);

		let scale = 1.0 / signal.len() as f64;
		signal.par_iter_mut().for_each(|value| *value *= scale);
		signal
	}
}

fn process_rows(fft: &Arc<dyn Fft<f64>>, len: usize, buffer: &mut [Complex64]) {
	let scratch_len = fft.get_inplace_scratch_len();
	buffer.par_chunks_exact_mut(len).for_each_init(
		|| vec![ZERO; scratch_len],
		|scratch, row| fft.process_with_scratch(row, scratch),
	);
}

/// `src` is `width` wide; the result is `height` wide
fn transpose(src: &[Complex64], width: usize, height: usize) -> Vec<Complex64> {
	let mut dst = vec![ZERO; src.len()];
	dst.par_chunks_exact_mut(height).enumerate().for_each(|(x, column)| {
		for (y, cell) in column.iter_mut().enumerate() {
			*cell = src[y * width + x];
		}
	});
	dst
}
