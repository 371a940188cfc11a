use crate::{colors, consts::*, matching, prelude::*};
use serde::{Deserialize, Serialize};

/// Where a neighbouring grid cell lies relative to the one already placed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
	Up,
	Down,
	Left,
	Right,
}
impl Direction {
	/// Exploration order of a cell's neighbours
	pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

	/// `(row, col)` step towards the neighbour
	#[inline]
	pub const fn delta(self) -> (i32, i32) {
		match self {
			Direction::Up => (-1, 0),
			Direction::Down => (1, 0),
			Direction::Left => (0, -1),
			Direction::Right => (0, 1),
		}
	}

	#[inline]
	pub const fn is_vertical(self) -> bool {
		matches!(self, Direction::Up | Direction::Down)
	}
}
impl std::fmt::Display for Direction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Direction::Up => "up",
			Direction::Down => "down",
			Direction::Left => "left",
			Direction::Right => "right",
		})
	}
}

/// Half-open `[start, end)` range of crop depths, walked in `step`s
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutRange {
	pub start: u32,
	pub end: u32,
	pub step: u32,
}
impl CutRange {
	#[inline]
	pub const fn new(start: u32, end: u32, step: u32) -> Self {
		Self { start, end, step }
	}

	#[inline]
	pub const fn from_array([start, end, step]: [u32; 3]) -> Self {
		Self::new(start, end, step)
	}

	pub fn iter(&self) -> impl Iterator<Item = u32> {
		(self.start..self.end).step_by(self.step.max(1) as usize)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarParams {
	/// How deep into the far edge of a tile the overlap strip starts
	pub depth: CutRange,
	/// Border trimmed off the strip across the adjacency axis
	pub trim: CutRange,
	pub threshold: f32,
	pub merge_radius: u32,
}
impl Default for RegistrarParams {
	fn default() -> Self {
		Self {
			depth: CutRange::from_array(REGISTER_CUT_DEPTH),
			trim: CutRange::from_array(REGISTER_CUT_TRIM),
			threshold: REGISTER_THRESHOLD,
			merge_radius: MATCH_MERGE_RADIUS,
		}
	}
}

/// Finds where `new` sits relative to `known`, given that it is the `direction` neighbour of `known`
///
/// Returns the offset of `new`'s top left corner from `known`'s top left corner.
/// The first crop that matches above the threshold wins; candidates are not ranked.
pub fn register(known: &RgbImage, new: &RgbImage, direction: Direction, params: &RegistrarParams) -> Option<Point<i32>> {
	match direction {
		Direction::Down => register_vertical(known, new, params),
		Direction::Up => register_vertical(new, known, params).map(|offset| -offset),
		Direction::Right => register_horizontal(known, new, params),
		Direction::Left => register_horizontal(new, known, params).map(|offset| -offset),
	}
}

/// Crops `template_src` and searches for it in `search`, returning the best hit
fn find_strip(search: &RgbImage, template_src: &RgbImage, crop: (u32, u32, u32, u32), params: &RegistrarParams) -> Option<Point<i32>> {
	let (x, y, w, h) = crop;
	if w == 0 || h == 0 || x + w > template_src.width() || y + h > template_src.height() {
		return None;
	}

	let template = template_src.par_crop(x, y, w, h);
	let mask = colors::non_background_mask(&template);

	let results = matching::match_template(search, &template, Some(&mask), params.threshold, params.merge_radius);
	results.max().map(|best| Point::new(best.x as i32, best.y as i32))
}

/// Offset of `lower` relative to `upper`
fn register_vertical(upper: &RgbImage, lower: &RgbImage, params: &RegistrarParams) -> Option<Point<i32>> {
	let (uw, uh) = upper.dimensions();
	let (lw, lh) = lower.dimensions();

	for cut_y in params.depth.iter() {
		for cut_x in params.trim.iter() {
			// bottom of the upper tile, found near the top of the lower tile
			if let Some(hit) = find_strip(
				lower,
				upper,
				(cut_x, cut_y, uw.saturating_sub(2 * cut_x), uh.saturating_sub(cut_y)),
				params,
			) {
				let offset = Point::new(cut_x as i32 - hit.x, cut_y as i32 - hit.y);
				log::debug!("vertical registration: upper strip at depth {cut_y} trim {cut_x} => {offset:?}");
				return Some(offset);
			}

			// top of the lower tile, found near the bottom of the upper tile
			if let Some(hit) = find_strip(
				upper,
				lower,
				(cut_x, 0, lw.saturating_sub(2 * cut_x), lh.saturating_sub(cut_y)),
				params,
			) {
				let offset = Point::new(hit.x - cut_x as i32, hit.y);
				log::debug!("vertical registration: lower strip at depth {cut_y} trim {cut_x} => {offset:?}");
				return Some(offset);
			}
		}
	}

	None
}

/// Offset of `right` relative to `left`
fn register_horizontal(left: &RgbImage, right: &RgbImage, params: &RegistrarParams) -> Option<Point<i32>> {
	let (lw, lh) = left.dimensions();
	let (rw, rh) = right.dimensions();

	for cut_x in params.depth.iter() {
		for cut_y in params.trim.iter() {
			if let Some(hit) = find_strip(
				right,
				left,
				(cut_x, cut_y, lw.saturating_sub(cut_x), lh.saturating_sub(2 * cut_y)),
				params,
			) {
				let offset = Point::new(cut_x as i32 - hit.x, cut_y as i32 - hit.y);
				log::debug!("horizontal registration: left strip at depth {cut_x} trim {cut_y} => {offset:?}");
				return Some(offset);
			}

			if let Some(hit) = find_strip(
				left,
				right,
				(0, cut_y, rw.saturating_sub(cut_x), rh.saturating_sub(2 * cut_y)),
				params,
			) {
				let offset = Point::new(hit.x, hit.y - cut_y as i32);
				log::debug!("horizontal registration: right strip at depth {cut_x} trim {cut_y} => {offset:?}");
				return Some(offset);
			}
		}
	}

	None
}
