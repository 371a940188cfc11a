use crate::{colors, consts::*, prelude::*};

/// A tile is empty when it shows almost no road and is dominated by map background.
///
/// Captures taken past the edge of the map, or of areas that were never explored,
/// look like this. A zero sized tile is empty.
pub fn is_empty_tile(tile: &RgbImage) -> bool {
	let total = tile.width() as usize * tile.height() as usize;
	if total == 0 {
		return true;
	}

	let road = colors::count_road(tile);
	let background = colors::count_background(tile);

	road < EMPTY_MAX_ROAD_PIXELS as usize && background as f64 > EMPTY_MIN_BACKGROUND_RATIO * total as f64
}
