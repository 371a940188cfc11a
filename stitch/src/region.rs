use crate::prelude::*;

/// One floor of a map region, each assembled into its own canvas
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionFloor {
	pub region: String,
	pub floor: i32,
	/// Sub-regions are captured through a larger on-screen map window
	pub sub_region: bool,
}
impl RegionFloor {
	pub fn new(region: impl Into<String>, floor: i32) -> Self {
		Self { region: region.into(), floor, sub_region: false }
	}

	#[inline]
	pub fn sub_region(mut self, sub_region: bool) -> Self {
		self.sub_region = sub_region;
		self
	}

	/// `l0`, `l1`, ... above ground, `b1`, `b2`, ... below
	pub fn floor_label(&self) -> String {
		if self.floor >= 0 {
			format!("l{}", self.floor)
		} else {
			format!("b{}", -self.floor)
		}
	}
}
impl std::fmt::Display for RegionFloor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.region, self.floor_label())
	}
}

/// Row and column of a tile in the capture grid, both starting at 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
	pub row: i32,
	pub col: i32,
}
impl GridPos {
	#[inline]
	pub const fn new(row: i32, col: i32) -> Self {
		Self { row, col }
	}

	#[inline]
	pub fn neighbour(self, direction: Direction) -> Self {
		let (row, col) = direction.delta();
		Self::new(self.row + row, self.col + col)
	}

	/// Every position of a `rows` x `cols` grid in row-major order
	pub fn grid(rows: i32, cols: i32) -> impl Iterator<Item = GridPos> {
		(1..=rows).flat_map(move |row| (1..=cols).map(move |col| GridPos::new(row, col)))
	}
}
impl std::fmt::Display for GridPos {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "({}, {})", self.row, self.col)
	}
}
