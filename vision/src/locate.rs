use crate::{
	catalogue::{Template, TemplateCatalogue},
	colors,
	consts::*,
	matching::{self, MatchResult},
	prelude::*,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateParams {
	pub threshold: f32,
	/// How long to wait for each template before giving up on it, in milliseconds
	pub timeout_ms: u64,
	/// Worker threads, or 0 for one per hardware thread
	pub workers: usize,
	pub merge_radius: u32,
}
impl Default for LocateParams {
	fn default() -> Self {
		Self {
			threshold: LOCATE_THRESHOLD,
			timeout_ms: LOCATE_TIMEOUT_MS,
			workers: 0,
			merge_radius: MATCH_MERGE_RADIUS,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointOfInterest {
	pub template_id: String,
	/// Center of the matched template on the canvas
	pub x: u32,
	pub y: u32,
}

pub struct Locator {
	pool: rayon::ThreadPool,
	params: LocateParams,
}
impl Locator {
	pub fn new(params: LocateParams) -> Result<Self, Error> {
		let workers = match params.workers {
			0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
			n => n,
		};

		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(workers)
			.thread_name(|i| format!("locator-{i}"))
			.panic_handler(|panic| {
				let msg = panic
					.downcast_ref::<&str>()
					.map(|s| s.to_string())
					.or_else(|| panic.downcast_ref::<String>().cloned())
					.unwrap_or_default();
				log::error!("locator worker panicked: {msg}");
			})
			.build()?;

		Ok(Self { pool, params })
	}

	/// Searches the canvas for every template of the catalogue, one pool task per template
	///
	/// A template whose task doesn't finish within the timeout is reported as not found.
	pub fn locate(&self, canvas: &Arc<RgbImage>, catalogue: &TemplateCatalogue) -> Vec<PointOfInterest> {
		let timeout = Duration::from_millis(self.params.timeout_ms);
		let LocateParams { threshold, merge_radius, .. } = self.params;

		let pending = catalogue
			.iter()
			.map(|template| {
				let (tx, rx) = crossbeam::bounded::<Vec<MatchResult>>(1);
				let canvas = canvas.clone();
				let task_template = template.clone();

				self.pool.spawn(move || {
					let results = matching::match_template(&canvas, &task_template.image, Some(&task_template.mask), threshold, merge_radius);
					tx.send(results.into_vec()).ok();
				});

				(template, rx)
			})
			.collect::<Vec<_>>();

		pending
			.into_iter()
			.flat_map(|(template, rx)| received_points(template, rx.recv_timeout(timeout), timeout))
			.collect()
	}
}

/// Turns what a search task sent back into points
///
/// A task that timed out or died without answering counts as not finding anything.
fn received_points(template: &Template, received: Result<Vec<MatchResult>, crossbeam::RecvTimeoutError>, timeout: Duration) -> Vec<PointOfInterest> {
	match received {
		Ok(results) if results.is_empty() => {
			log::debug!("{} not found", template.id);
			Vec::new()
		}

		Ok(results) => {
			log::info!("found {} x{}", template.id, results.len());
			results
				.into_iter()
				.map(|result| {
					let center = result.center();
					PointOfInterest {
						template_id: template.id.clone(),
						x: center.x,
						y: center.y,
					}
				})
				.collect()
		}

		Err(crossbeam::RecvTimeoutError::Timeout) => {
			log::warn!("timed out after {timeout:?} looking for {}, treating it as not found", template.id);
			Vec::new()
		}

		Err(crossbeam::RecvTimeoutError::Disconnected) => {
			log::warn!("search for {} ended without a result, treating it as not found", template.id);
			Vec::new()
		}
	}
}

/// Stamps `template`'s mask centred on `center`, clipped to the canvas
fn stamp(mask: &mut GrayImage, template: &Template, center: Point<u32>) {
	let (tw, th) = template.mask.dimensions();
	let x0 = center.x as i64 - (tw / 2) as i64;
	let y0 = center.y as i64 - (th / 2) as i64;

	for (tx, ty, value) in template.mask.enumerate_pixels() {
		if value.0[0] == 0 {
			continue;
		}
		let (x, y) = (x0 + tx as i64, y0 + ty as i64);
		if x >= 0 && y >= 0 && (x as u32) < mask.width() && (y as u32) < mask.height() {
			mask.put_pixel(x as u32, y as u32, Luma([255]));
		}
	}
}

/// Walkable area of the final map: road, plus the dilated outline of every located point of interest
pub fn final_mask(canvas: &RgbImage, points: &[PointOfInterest], catalogue: &TemplateCatalogue, dilate_radius: u8) -> GrayImage {
	let mut stamped = GrayImage::new(canvas.width(), canvas.height());
	for point in points {
		match catalogue.get(&point.template_id) {
			Some(template) => stamp(&mut stamped, template, Point::new(point.x, point.y)),
			None => log::warn!("no template {} for point at ({}, {})", point.template_id, point.x, point.y),
		}
	}

	let stamped = imageproc::morphology::dilate(&stamped, imageproc::distance_transform::Norm::LInf, dilate_radius);

	let mut mask = colors::road_mask(canvas);
	mask.par_iter_mut().zip(stamped.par_iter()).for_each(|(m, s)| *m |= *s);
	mask
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matching::tests::noise;

	fn marker(seed: u32) -> Template {
		let image = noise(8, 6, seed);
		let mut mask = GrayImage::from_pixel(8, 6, Luma([255]));
		mask.put_pixel(0, 0, Luma([0]));
		Template::new(format!("mm_tp_{seed:02}"), image, mask).unwrap()
	}

	#[test]
	fn test_locate_all_occurrences() {
		let a = marker(1);
		let b = marker(2);
		let c = marker(3);

		let mut canvas = RgbImage::from_pixel(80, 60, Rgb([85, 85, 85]));
		for (x, y) in [(5, 5), (50, 40)] {
			image::imageops::replace(&mut canvas, &a.image, x, y);
		}
		image::imageops::replace(&mut canvas, &b.image, 30, 10);

		let mut catalogue = TemplateCatalogue::new();
		catalogue.push(a);
		catalogue.push(b);
		catalogue.push(c);

		let locator = Locator::new(LocateParams { workers: 2, ..Default::default() }).unwrap();
		let mut points = locator.locate(&Arc::new(canvas), &catalogue);
		points.sort_by(|p, q| (p.template_id.as_str(), p.x, p.y).cmp(&(q.template_id.as_str(), q.x, q.y)));

		let found = points.iter().map(|p| (p.template_id.as_str(), p.x, p.y)).collect::<Vec<_>>();
		assert_eq!(found, [("mm_tp_01", 9, 8), ("mm_tp_01", 54, 43), ("mm_tp_02", 34, 13)]);
	}

	#[test]
	fn test_final_mask() {
		let template = marker(4);
		let mut catalogue = TemplateCatalogue::new();
		catalogue.push(template);

		let mut canvas = RgbImage::from_pixel(40, 40, Rgb([85, 85, 85]));
		canvas.put_pixel(39, 39, Rgb([30, 30, 30]));

		let points = [PointOfInterest { template_id: "mm_tp_04".into(), x: 10, y: 10 }];
		let mask = final_mask(&canvas, &points, &catalogue, POINT_MASK_DILATE_RADIUS);

		assert_eq!(mask.get_pixel(39, 39).0[0], 255);
		// template covers x 6..=13, y 7..=12, then grows by 2
		assert_eq!(mask.get_pixel(4, 14).0[0], 255);
		assert_eq!(mask.get_pixel(15, 14).0[0], 255);
		assert_eq!(mask.get_pixel(3, 10).0[0], 0);
		assert_eq!(mask.get_pixel(10, 16).0[0], 0);
		assert_eq!(mask.get_pixel(25, 25).0[0], 0);
	}

	#[test]
	fn test_busy_pool_times_out() {
		let a = marker(5);
		let mut canvas = RgbImage::from_pixel(40, 30, Rgb([85, 85, 85]));
		image::imageops::replace(&mut canvas, &a.image, 10, 10);

		let mut catalogue = TemplateCatalogue::new();
		catalogue.push(a);

		let locator = Locator::new(LocateParams { workers: 1, timeout_ms: 20, ..Default::default() }).unwrap();

		// occupy the only worker until the search has given up
		let (release, blocked) = crossbeam::bounded::<()>(0);
		locator.pool.spawn(move || {
			blocked.recv().ok();
		});

		let points = locator.locate(&Arc::new(canvas.clone()), &catalogue);
		assert!(points.is_empty());
		release.send(()).unwrap();

		let idle = Locator::new(LocateParams { workers: 1, ..Default::default() }).unwrap();
		assert_eq!(idle.locate(&Arc::new(canvas), &catalogue).len(), 1);
	}

	#[test]
	fn test_dead_search_is_not_found() {
		let template = marker(6);
		let (tx, rx) = crossbeam::bounded::<Vec<MatchResult>>(1);
		drop(tx);

		let timeout = Duration::from_millis(10);
		assert!(received_points(&template, rx.recv_timeout(timeout), timeout).is_empty());
	}
}
