//! Three-dimensional tile coordinates in a Web Mercator pyramid
//!
//! # Examples
//!
//! ```
//! use tilestream_core::TileCoord;
//!
//! let coord = TileCoord::new(5, 6, 7).unwrap();
//! assert_eq!(coord.level, 5);
//! assert_eq!(coord.as_path(), "5/6/7");
//! ```

use anyhow::{Context, Result, ensure};
use std::{
	f64::consts::PI,
	fmt::{self, Debug},
	str::FromStr,
};

/// Highest zoom level a [`TileCoord`] can address.
pub const MAX_LEVEL: u8 = 31;

/// A tile coordinate with zoom level, x and y indices.
///
/// Identity only: two equal coordinates address the same tile of a pyramid.
#[derive(Eq, PartialEq, Clone, Hash, Copy)]
pub struct TileCoord {
	/// The zoom level of the tile.
	pub level: u8,
	/// The x index of the tile.
	pub x: u32,
	/// The y index of the tile.
	pub y: u32,
}

impl TileCoord {
	/// Create a new `TileCoord` at the given zoom `level` and tile indices `x`, `y`.
	///
	/// # Errors
	/// Returns an error if `level` > 31 or if `x`/`y` lie outside the level.
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= MAX_LEVEL, "level ({level}) must be <= {MAX_LEVEL}");
		let max = 2u64.pow(u32::from(level));
		ensure!(u64::from(x) < max, "x ({x}) out of bounds for level {level}");
		ensure!(u64::from(y) < max, "y ({y}) out of bounds for level {level}");
		Ok(TileCoord { level, x, y })
	}

	/// Create a `TileCoord` from a longitude/latitude pair at zoom level `level`.
	///
	/// Values outside the projection are clamped to the outermost tile of the level.
	///
	/// # Examples
	///
	/// ```
	/// use tilestream_core::TileCoord;
	///
	/// let coord = TileCoord::from_geo(13.404954, 52.520008, 10).unwrap();
	/// assert_eq!((coord.x, coord.y), (550, 335));
	/// ```
	pub fn from_geo(lon: f64, lat: f64, level: u8) -> Result<TileCoord> {
		ensure!(level <= MAX_LEVEL, "level ({level}) must be <= {MAX_LEVEL}");
		ensure!(lon.is_finite() && lat.is_finite(), "({lon}, {lat}) is not a finite position");

		let zoom = 2.0f64.powi(i32::from(level));
		let x = zoom * (lon / 360.0 + 0.5);
		let y = zoom * (0.5 - 0.5 * (lat * PI / 360.0 + PI / 4.0).tan().ln() / PI);
		let clamp = |v: f64| -> u32 {
			if v.is_nan() {
				return 0;
			}
			v.min(zoom - 1.0).max(0.0).floor() as u32
		};

		TileCoord::new(level, clamp(x), clamp(y))
	}

	/// Returns the coordinate as a `z/x/y` path segment.
	#[must_use]
	pub fn as_path(&self) -> String {
		format!("{}/{}/{}", self.level, self.x, self.y)
	}
}

/// Parses `z/x/y`.
impl FromStr for TileCoord {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		let parts: Vec<&str> = s.trim().split('/').collect();
		ensure!(parts.len() == 3, "tile coordinate '{s}' must have the form z/x/y");
		let level = parts[0].parse::<u8>().with_context(|| format!("invalid zoom in '{s}'"))?;
		let x = parts[1].parse::<u32>().with_context(|| format!("invalid x in '{s}'"))?;
		let y = parts[2].parse::<u32>().with_context(|| format!("invalid y in '{s}'"))?;
		TileCoord::new(level, x, y)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("TileCoord({}, [{}, {}])", &self.level, &self.x, &self.y))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn new_validates_range() {
		assert!(TileCoord::new(0, 0, 0).is_ok());
		assert!(TileCoord::new(2, 3, 3).is_ok());
		assert!(TileCoord::new(2, 4, 0).is_err());
		assert!(TileCoord::new(2, 0, 4).is_err());
		assert!(TileCoord::new(32, 0, 0).is_err());
		assert!(TileCoord::new(31, u32::MAX >> 1, 0).is_ok());
	}

	#[rstest]
	#[case(-180.0, 85.0511, 3, (0, 0))]
	#[case(180.0, -85.0511, 3, (7, 7))]
	#[case(0.0, 0.0, 1, (1, 1))]
	#[case(-190.0, 89.9, 2, (0, 0))]
	fn from_geo_clamps(#[case] lon: f64, #[case] lat: f64, #[case] level: u8, #[case] xy: (u32, u32)) {
		let coord = TileCoord::from_geo(lon, lat, level).unwrap();
		assert_eq!((coord.x, coord.y), xy);
	}

	#[test]
	fn from_geo_rejects_nan() {
		assert!(TileCoord::from_geo(f64::NAN, 0.0, 3).is_err());
	}

	#[test]
	fn parse_and_print() {
		let coord: TileCoord = "3/1/2".parse().unwrap();
		assert_eq!(coord, TileCoord::new(3, 1, 2).unwrap());
		assert_eq!(coord.as_path(), "3/1/2");
		assert_eq!(format!("{coord:?}"), "TileCoord(3, [1, 2])");
		assert!("3/1".parse::<TileCoord>().is_err());
		assert!("a/1/2".parse::<TileCoord>().is_err());
		assert!("1/2/0".parse::<TileCoord>().is_err());
	}
}
