use crate::prelude::*;
use serde::{Deserialize, Serialize};

/// Everything the assembly engine knows about a region besides the tiles themselves
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Checkpoint {
	pub canvas_width: u32,
	pub canvas_height: u32,
	/// Tiles that were placed or found blank
	pub done: BTreeSet<GridPos>,
	/// Top left corner of each placed tile on the canvas, in the order they were placed
	pub placements: Vec<(GridPos, Point<i32>)>,
}
impl Checkpoint {
	pub fn placement(&self, pos: GridPos) -> Option<Point<i32>> {
		self.placements.iter().find(|(placed, _)| *placed == pos).map(|(_, at)| *at)
	}

	#[inline]
	pub fn is_placed(&self, pos: GridPos) -> bool {
		self.placement(pos).is_some()
	}

	/// Moves every placement by `shift`, after content was added above or left of the canvas
	pub fn shift(&mut self, shift: Point<i32>) {
		for (_, at) in &mut self.placements {
			*at += shift;
		}
	}

	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(&CheckpointDocument::from(self))
	}

	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str::<CheckpointDocument>(json).map(Self::from)
	}
}

/// On-disk shape of a checkpoint: plain integer lists so it stays readable and editable by hand
#[derive(Serialize, Deserialize)]
struct CheckpointDocument {
	canvas_width: u32,
	canvas_height: u32,
	done: Vec<[i32; 2]>,
	placements: Vec<[i32; 4]>,
}
impl From<&Checkpoint> for CheckpointDocument {
	fn from(checkpoint: &Checkpoint) -> Self {
		Self {
			canvas_width: checkpoint.canvas_width,
			canvas_height: checkpoint.canvas_height,
			done: checkpoint.done.iter().map(|pos| [pos.row, pos.col]).collect(),
			placements: checkpoint.placements.iter().map(|(pos, at)| [pos.row, pos.col, at.x, at.y]).collect(),
		}
	}
}
impl From<CheckpointDocument> for Checkpoint {
	fn from(document: CheckpointDocument) -> Self {
		Self {
			canvas_width: document.canvas_width,
			canvas_height: document.canvas_height,
			done: document.done.into_iter().map(|[row, col]| GridPos::new(row, col)).collect(),
			placements: document
				.placements
				.into_iter()
				.map(|[row, col, x, y]| (GridPos::new(row, col), Point::new(x, y)))
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn checkpoint() -> Checkpoint {
		Checkpoint {
			canvas_width: 180,
			canvas_height: 185,
			done: [GridPos::new(2, 1), GridPos::new(1, 2), GridPos::new(1, 1)].into_iter().collect(),
			placements: vec![
				(GridPos::new(2, 1), Point::new(0, 85)),
				(GridPos::new(1, 1), Point::new(0, 0)),
			],
		}
	}

	#[test]
	fn test_document_shape() {
		let json = checkpoint().to_json().unwrap();
		let value = serde_json::from_str::<serde_json::Value>(&json).unwrap();

		assert_eq!(value["canvas_width"], 180);
		assert_eq!(value["done"], serde_json::json!([[1, 1], [1, 2], [2, 1]]));
		assert_eq!(value["placements"], serde_json::json!([[2, 1, 0, 85], [1, 1, 0, 0]]));

		let keys = ["\"canvas_width\"", "\"canvas_height\"", "\"done\"", "\"placements\""].map(|key| json.find(key).unwrap());
		assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));

		assert_eq!(Checkpoint::from_json(&json).unwrap(), checkpoint());
	}

	#[test]
	fn test_shift() {
		let mut checkpoint = checkpoint();
		checkpoint.shift(Point::new(5, 0));
		assert_eq!(checkpoint.placement(GridPos::new(2, 1)), Some(Point::new(5, 85)));
		assert_eq!(checkpoint.placement(GridPos::new(1, 1)), Some(Point::new(5, 0)));
		assert!(!checkpoint.is_placed(GridPos::new(1, 2)));
	}

	#[test]
	fn test_malformed_document() {
		assert!(Checkpoint::from_json("{\"canvas_width\": 1}").is_err());
		assert!(Checkpoint::from_json("{\"canvas_width\": 1, \"canvas_height\": 1, \"done\": [[1]], \"placements\": []}").is_err());
	}
}
