use super::TileScheme;
use crate::{GeoBBox, MAX_LEVEL, TileCoord, TileSetInfo};
use anyhow::Result;
use itertools::Itertools;

/// Enumerates every tile intersecting the bounds, from the lowest to the highest zoom level.
/// Inside a level the order is row-major: `y` outer, `x` inner.
///
/// The maximum zoom is capped at [`MAX_LEVEL`]. Crossed bounds or an inverted zoom range
/// produce no tiles.
pub struct ScanlineScheme {
	coords: Box<dyn Iterator<Item = TileCoord> + Send>,
}

impl ScanlineScheme {
	pub fn new(info: &TileSetInfo) -> Result<ScanlineScheme> {
		let info = info.apply_defaults(false);
		let bounds = info.bounds.unwrap_or_default();
		let min_level = info.min_level();
		let max_level = info.max_level().min(MAX_LEVEL);

		let mut ranges = Vec::new();
		if bounds.is_valid() {
			for level in min_level..=max_level {
				ranges.push(level_range(level, &bounds)?);
			}
		}

		let coords = ranges.into_iter().flat_map(|(min, max)| {
			(min.y..=max.y).cartesian_product(min.x..=max.x).map(move |(y, x)| TileCoord {
				level: min.level,
				x,
				y,
			})
		});

		Ok(ScanlineScheme {
			coords: Box::new(coords),
		})
	}
}

/// Returns the north-west and south-east tiles covering `bounds` at `level`.
fn level_range(level: u8, bounds: &GeoBBox) -> Result<(TileCoord, TileCoord)> {
	let min = TileCoord::from_geo(bounds.x_min + 1e-10, bounds.y_max - 1e-10, level)?;
	let max = TileCoord::from_geo(bounds.x_max - 1e-10, bounds.y_min + 1e-10, level)?;
	Ok((min, max))
}

impl TileScheme for ScanlineScheme {
	fn next_coord(&mut self) -> Option<TileCoord> {
		self.coords.next()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn drain(info: &TileSetInfo) -> Vec<String> {
		let mut scheme = ScanlineScheme::new(info).unwrap();
		std::iter::from_fn(|| scheme.next_coord()).map(|c| c.as_path()).collect()
	}

	#[test]
	fn whole_world_two_levels() {
		let paths = drain(&TileSetInfo::new().with_zoom(0, 1));
		assert_eq!(paths, ["0/0/0", "1/0/0", "1/1/0", "1/0/1", "1/1/1"]);
	}

	#[test]
	fn bounds_limit_each_level() {
		let info = TileSetInfo::new()
			.with_zoom(2, 3)
			.with_bounds(GeoBBox::new(0.5, 0.5, 89.0, 60.0));
		let paths = drain(&info);
		assert_eq!(paths, ["2/2/1", "3/4/2", "3/5/2", "3/4/3", "3/5/3"]);
	}

	#[test]
	fn inverted_zoom_range_is_empty() {
		assert!(drain(&TileSetInfo::new().with_zoom(5, 4)).is_empty());
	}

	#[test]
	fn crossed_bounds_are_empty() {
		let info = TileSetInfo::new().with_zoom(0, 3).with_bounds(GeoBBox::new(10.0, 10.0, -10.0, -10.0));
		assert!(drain(&info).is_empty());
	}

	#[test]
	fn unbounded_zoom_is_capped() {
		let info = TileSetInfo::new()
			.with_zoom(31, u8::MAX)
			.with_bounds(GeoBBox::new(0.0, -0.00001, 0.00001, 0.0));
		let paths = drain(&info);
		assert!(!paths.is_empty());
		assert!(paths.iter().all(|p| p.starts_with("31/")));
	}
}
