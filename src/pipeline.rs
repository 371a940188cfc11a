use lms_stitch::{prelude::*, store::Store, Stitcher};
use lms_util::{log, AnyError};
use lms_vision::catalogue::TemplateCatalogue;

use lms_util::anyhow::Context;

/// The floors of one region, as given on the command line
pub struct Floors {
	pub floors: Vec<RegionFloor>,
}
impl Floors {
	pub fn new(region: &str, floors: &[i32], sub_region: bool) -> Self {
		let mut floors = floors.to_vec();
		floors.sort_unstable();
		floors.dedup();

		Self {
			floors: floors.into_iter().map(|floor| RegionFloor::new(region, floor).sub_region(sub_region)).collect(),
		}
	}
}

pub fn assemble<S: Store>(stitcher: &Stitcher<S>, floors: &Floors, rows: i32, cols: i32) -> Result<(), AnyError> {
	for floor in &floors.floors {
		stitcher.assemble(floor, rows, cols).with_context(|| format!("assembling {floor}"))?;
	}
	Ok(())
}

pub fn expand<S: Store>(stitcher: &Stitcher<S>, floors: &Floors) -> Result<(), AnyError> {
	for floor in &floors.floors {
		stitcher.expand(floor).with_context(|| format!("expanding {floor}"))?;
	}
	Ok(())
}

pub fn reconcile<S: Store>(stitcher: &Stitcher<S>, floors: &Floors) -> Result<(), AnyError> {
	if floors.floors.len() < 2 {
		log::info!("nothing to reconcile with a single floor");
		return Ok(());
	}
	stitcher.reconcile_all(&floors.floors).context("reconciling floors")?;
	Ok(())
}

pub fn locate<S: Store>(stitcher: &Stitcher<S>, floors: &Floors, catalogue: &TemplateCatalogue) -> Result<Vec<(RegionFloor, Vec<PointOfInterest>)>, AnyError> {
	floors
		.floors
		.iter()
		.map(|floor| {
			let points = stitcher.locate_points(floor, catalogue).with_context(|| format!("locating points on {floor}"))?;
			Ok::<_, AnyError>((floor.clone(), points))
		})
		.collect()
}

pub fn finalize<S: Store>(stitcher: &Stitcher<S>, floors: &Floors, catalogue: &TemplateCatalogue) -> Result<(), AnyError> {
	for floor in &floors.floors {
		stitcher.save_region(floor, catalogue).with_context(|| format!("finalizing {floor}"))?;
	}
	Ok(())
}

/// Every stage in order: assemble, expand, reconcile, then locate points and save the final maps
pub fn run<S: Store>(stitcher: &Stitcher<S>, floors: &Floors, rows: i32, cols: i32, catalogue: &TemplateCatalogue) -> Result<(), AnyError> {
	assemble(stitcher, floors, rows, cols)?;
	expand(stitcher, floors)?;
	reconcile(stitcher, floors)?;
	finalize(stitcher, floors, catalogue)?;
	log::info!("{} floors done", floors.floors.len());
	Ok(())
}
