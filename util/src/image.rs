use image::{ImageBuffer, Pixel};
use rayon::prelude::*;

pub type OwnedImage<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

pub trait ParallelCrop: Sized {
	/// Copies the `w`x`h` region at (`x`, `y`) into a new image, one row per rayon task
	///
	/// # Panics
	///
	/// Panics if the region is not fully inside the image.
	fn par_crop(&self, x: u32, y: u32, w: u32, h: u32) -> Self;
}
impl<P> ParallelCrop for OwnedImage<P>
where
	P: Pixel + Send + Sync,
	P::Subpixel: Send + Sync
{
	fn par_crop(&self, x: u32, y: u32, w: u32, h: u32) -> Self {
		if x + w > self.width() || y + h > self.height() {
			panic!(
				"crop region ({x}, {y}) {w}x{h} is outside of bounds for {}x{} image",
				self.width(),
				self.height()
			);
		}

		let mut cropped = ImageBuffer::new(w, h);
		if w == 0 || h == 0 {
			return cropped;
		}

		let channels = P::CHANNEL_COUNT as usize;
		let src_stride = self.width() as usize * channels;
		let dst_stride = w as usize * channels;
		let src = self.as_raw();

		cropped.par_chunks_exact_mut(dst_stride).enumerate().for_each(|(row, dst)| {
			let start = (y as usize + row) * src_stride + x as usize * channels;
			dst.copy_from_slice(&src[start..start + dst_stride]);
		});

		cropped
	}
}

pub trait PadImage: Sized {
	type Fill;

	/// Returns a copy surrounded by `fill` on each side
	fn padded(&self, left: u32, right: u32, top: u32, bottom: u32, fill: Self::Fill) -> Self;
}
impl<P: Pixel> PadImage for OwnedImage<P> {
	type Fill = P;

	fn padded(&self, left: u32, right: u32, top: u32, bottom: u32, fill: P) -> Self {
		let mut out = ImageBuffer::from_pixel(self.width() + left + right, self.height() + top + bottom, fill);
		image::imageops::replace(&mut out, self, left as i64, top as i64);
		out
	}
}

#[test]
fn test_par_crop() {
	let image = image::RgbImage::from_fn(7, 5, |x, y| image::Rgb([x as u8, y as u8, (x * y) as u8]));
	let cropped = image.par_crop(2, 1, 4, 3);
	assert_eq!(cropped.dimensions(), (4, 3));
	for (x, y, pixel) in cropped.enumerate_pixels() {
		assert_eq!(*pixel, *image.get_pixel(x + 2, y + 1));
	}

	assert_eq!(image.par_crop(7, 0, 0, 5).dimensions(), (0, 5));
}

#[test]
#[should_panic]
fn test_par_crop_out_of_bounds() {
	let image = image::GrayImage::new(4, 4);
	image.par_crop(1, 1, 4, 2);
}

#[test]
fn test_padded() {
	let image = image::GrayImage::from_pixel(2, 3, image::Luma([9]));
	let padded = image.padded(1, 2, 3, 4, image::Luma([200]));
	assert_eq!(padded.dimensions(), (5, 10));
	assert_eq!(padded.get_pixel(0, 0).0[0], 200);
	assert_eq!(padded.get_pixel(1, 3).0[0], 9);
	assert_eq!(padded.get_pixel(2, 5).0[0], 9);
	assert_eq!(padded.get_pixel(3, 5).0[0], 200);
	assert_eq!(padded.get_pixel(1, 6).0[0], 200);
}
