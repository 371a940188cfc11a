use crate::{assemble::Assembler, prelude::*};
use lms_vision::{
	consts::POINT_MASK_DILATE_RADIUS,
	expand::{self, ExpandParams},
	locate::{self, LocateParams, Locator},
	reconcile::{self, ReconcileParams},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchParams {
	pub registrar: RegistrarParams,
	pub expander: ExpandParams,
	pub reconciler: ReconcileParams,
	pub locator: LocateParams,
}

/// The operations run on each region floor, from assembly to the final map
pub struct Stitcher<S: Store> {
	store: S,
	params: StitchParams,
	interrupt: Option<Arc<AtomicBool>>,
}
impl<S: Store> Stitcher<S> {
	pub fn new(store: S, params: StitchParams) -> Self {
		Self { store, params, interrupt: None }
	}

	/// Assembly stops with [`Error::Interrupted`] once `flag` is set
	pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
		self.interrupt = Some(flag);
		self
	}

	#[inline]
	pub fn store(&self) -> &S {
		&self.store
	}

	#[inline]
	pub fn params(&self) -> &StitchParams {
		&self.params
	}

	fn canvas(&self, region: &RegionFloor) -> Result<RgbImage, Error> {
		self.store.load_canvas(region)?.ok_or_else(|| Error::MissingCanvas(region.clone()))
	}

	/// Assembles the tiles of a `rows` x `cols` capture grid and saves the canvas
	pub fn assemble(&self, region: &RegionFloor, rows: i32, cols: i32) -> Result<RgbImage, Error> {
		let mut assembler = Assembler::new(&self.store, region, &self.params.registrar, rows, cols);
		if let Some(flag) = &self.interrupt {
			assembler = assembler.with_interrupt(flag);
		}

		let canvas = lms_util::timed!(format!("assembling {region}") => assembler.run())?.into_image();
		self.store.save_canvas(region, &canvas)?;
		Ok(canvas)
	}

	/// Pads the saved canvas so road keeps clear of its edges. Returns whether it changed.
	pub fn expand(&self, region: &RegionFloor) -> Result<bool, Error> {
		let canvas = self.canvas(region)?;
		match expand::expand(&canvas, region.sub_region, &self.params.expander) {
			Some(expanded) => {
				self.store.save_canvas(region, &expanded)?;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Aligns two floors of the same region and pads both to a common size. Returns whether either changed.
	pub fn reconcile(&self, a: &RegionFloor, b: &RegionFloor) -> Result<bool, Error> {
		let canvas_a = self.canvas(a)?;
		let canvas_b = self.canvas(b)?;

		match reconcile::reconcile(&canvas_a, &canvas_b, &self.params.reconciler)? {
			Some((canvas_a, canvas_b)) => {
				log::info!("reconciled {a} and {b}");
				self.store.save_canvas(a, &canvas_a)?;
				self.store.save_canvas(b, &canvas_b)?;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Reconciles every pair of floors until a full pass changes nothing
	pub fn reconcile_all(&self, floors: &[RegionFloor]) -> Result<(), Error> {
		for pass in 1.. {
			let mut changed = false;
			for (i, a) in floors.iter().enumerate() {
				for b in &floors[i + 1..] {
					changed |= self.reconcile(a, b)?;
				}
			}

			if !changed {
				log::info!("{} floors reconciled after {pass} passes", floors.len());
				break;
			}
		}
		Ok(())
	}

	pub fn locate_points(&self, region: &RegionFloor, catalogue: &TemplateCatalogue) -> Result<Vec<PointOfInterest>, Error> {
		let canvas = Arc::new(self.canvas(region)?);
		let locator = Locator::new(self.params.locator)?;
		let points = lms_util::timed!(format!("locating points of interest on {region}") => locator.locate(&canvas, catalogue));
		Ok(points)
	}

	/// Locates the points of interest and saves the final map, its walkable mask and the points
	pub fn save_region(&self, region: &RegionFloor, catalogue: &TemplateCatalogue) -> Result<Vec<PointOfInterest>, Error> {
		let points = self.locate_points(region, catalogue)?;
		let canvas = self.canvas(region)?;
		let mask = locate::final_mask(&canvas, &points, catalogue, POINT_MASK_DILATE_RADIUS);
		self.store.save_final(region, &canvas, &mask, &points)?;
		Ok(points)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		assemble::tests::{grid_store, params, world, ROAD},
		store::MemoryStore,
	};
	use lms_vision::catalogue::Template;

	fn stitcher(store: MemoryStore) -> Stitcher<MemoryStore> {
		Stitcher::new(
			store,
			StitchParams {
				registrar: params(),
				reconciler: ReconcileParams { cut: CutRange::new(5, 60, 5), ..Default::default() },
				locator: LocateParams { workers: 2, ..Default::default() },
				..Default::default()
			},
		)
	}

	#[test]
	fn test_assemble_saves_canvas() {
		let region = RegionFloor::new("grid", 0);
		let world = world(180, 185, 11);
		let stitcher = stitcher(grid_store(&region, &world));

		let canvas = stitcher.assemble(&region, 2, 2).unwrap();
		assert!(canvas == world);
		assert!(stitcher.store().load_canvas(&region).unwrap().unwrap() == world);
	}

	#[test]
	fn test_interrupted_assembly() {
		let region = RegionFloor::new("grid", 0);
		let flag = Arc::new(AtomicBool::new(true));
		let stitcher = stitcher(grid_store(&region, &world(180, 185, 12))).with_interrupt(flag);

		assert!(matches!(stitcher.assemble(&region, 2, 2), Err(Error::Interrupted)));
		assert!(stitcher.store().load_canvas(&region).unwrap().is_none());
	}

	#[test]
	fn test_expand() {
		let region = RegionFloor::new("edge", 0);
		let stitcher = stitcher(MemoryStore::new());
		assert!(matches!(stitcher.expand(&region), Err(Error::MissingCanvas(_))));

		let mut canvas = RgbImage::from_pixel(300, 300, Rgb([85, 85, 85]));
		canvas.put_pixel(5, 150, ROAD);
		stitcher.store().save_canvas(&region, &canvas).unwrap();

		assert!(stitcher.expand(&region).unwrap());
		assert_eq!(stitcher.store().load_canvas(&region).unwrap().unwrap().dimensions(), (400, 300));
		assert!(!stitcher.expand(&region).unwrap());
	}

	#[test]
	fn test_reconcile_all_floors() {
		let world = world(120, 100, 13);
		let floors = [RegionFloor::new("tower", 0), RegionFloor::new("tower", 1), RegionFloor::new("tower", -1)];

		let stitcher = stitcher(MemoryStore::new());
		let store = stitcher.store();
		store.save_canvas(&floors[0], &world).unwrap();
		store.save_canvas(&floors[1], &world.par_crop(10, 10, 100, 80)).unwrap();
		store.save_canvas(&floors[2], &world.par_crop(20, 5, 90, 90)).unwrap();

		stitcher.reconcile_all(&floors).unwrap();

		for floor in &floors {
			let canvas = store.load_canvas(floor).unwrap().unwrap();
			assert_eq!(canvas.dimensions(), (120, 100), "{floor}");
			assert_eq!(canvas.get_pixel(50, 50), world.get_pixel(50, 50), "{floor}");
		}
		assert!(store.load_canvas(&floors[0]).unwrap().unwrap() == world);
		assert!(!stitcher.reconcile(&floors[1], &floors[2]).unwrap());
	}

	#[test]
	fn test_reconcile_unrelated_floors() {
		let floors = [RegionFloor::new("tower", 0), RegionFloor::new("tower", 1)];
		let stitcher = stitcher(MemoryStore::new());
		stitcher.store().save_canvas(&floors[0], &world(120, 100, 14)).unwrap();
		stitcher.store().save_canvas(&floors[1], &world(80, 70, 15).par_crop(0, 50, 80, 20)).unwrap();

		let result = stitcher.reconcile_all(&floors);
		assert!(matches!(result, Err(Error::Vision(lms_vision::Error::Unrelatable { .. }))));
	}

	#[test]
	fn test_save_region() {
		let region = RegionFloor::new("camp", 0);
		let stitcher = stitcher(MemoryStore::new());

		let marker = world(8, 6, 16);
		let mut canvas = RgbImage::from_pixel(60, 60, Rgb([85, 85, 85]));
		image::imageops::replace(&mut canvas, &marker, 20, 30);
		stitcher.store().save_canvas(&region, &canvas).unwrap();

		let mut catalogue = TemplateCatalogue::new();
		catalogue.push(Template::new("mm_sp_01", marker, GrayImage::from_pixel(8, 6, Luma([255]))).unwrap());

		let points = stitcher.save_region(&region, &catalogue).unwrap();
		assert_eq!(points, [PointOfInterest { template_id: "mm_sp_01".into(), x: 24, y: 33 }]);

		let output = stitcher.store().final_output(&region).unwrap();
		assert_eq!(output.points, points);
		assert!(output.raw == canvas);
		assert_eq!(output.mask.get_pixel(24, 33).0[0], 255);
		assert_eq!(output.mask.get_pixel(18, 28).0[0], 255);
		assert_eq!(output.mask.get_pixel(5, 5).0[0], 0);
	}
}
