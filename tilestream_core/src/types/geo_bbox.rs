//! A geographic bounding box in degrees.
//!
//! Unlike a validated extent, a `GeoBBox` may be "crossed" (west > east or south > north):
//! intersecting two disjoint boxes yields such a degenerate box, and enumerating it yields no tiles.

use anyhow::{Result, ensure};
use std::fmt::Debug;

/// Latitude limit of the Web Mercator projection, as advertised by default tile sets.
pub const MERCATOR_LAT_LIMIT: f64 = 85.0511;

/// A rectangular area defined by `[west, south, east, north]` in degrees.
///
/// # Examples
///
/// ```
/// use tilestream_core::GeoBBox;
///
/// let a = GeoBBox::new(-10.0, -5.0, 10.0, 5.0);
/// let b = GeoBBox::new(0.0, -20.0, 20.0, 2.0);
/// assert_eq!(a.intersected(&b).as_array(), [0.0, -5.0, 10.0, 2.0]);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl GeoBBox {
	/// Creates a box from `west, south, east, north` without validating the order.
	#[must_use]
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> GeoBBox {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
		}
	}

	/// The whole-earth extent that stays inside the Web Mercator latitude limits.
	#[must_use]
	pub fn new_world() -> GeoBBox {
		GeoBBox::new(-180.0, -MERCATOR_LAT_LIMIT, 180.0, MERCATOR_LAT_LIMIT)
	}

	/// Returns the coordinate-wise tightest box: the larger west/south and the smaller east/north.
	///
	/// Disjoint inputs produce a crossed box, see [`GeoBBox::is_valid`].
	#[must_use]
	pub fn intersected(&self, other: &GeoBBox) -> GeoBBox {
		GeoBBox {
			x_min: self.x_min.max(other.x_min),
			y_min: self.y_min.max(other.y_min),
			x_max: self.x_max.min(other.x_max),
			y_max: self.y_max.min(other.y_max),
		}
	}

	/// `true` if west <= east and south <= north.
	#[must_use]
	pub fn is_valid(&self) -> bool {
		self.x_min <= self.x_max && self.y_min <= self.y_max
	}

	/// Returns `[west, south, east, north]`.
	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}
}

impl Default for GeoBBox {
	fn default() -> Self {
		GeoBBox::new_world()
	}
}

impl From<[f64; 4]> for GeoBBox {
	fn from(v: [f64; 4]) -> Self {
		GeoBBox::new(v[0], v[1], v[2], v[3])
	}
}

impl TryFrom<Vec<f64>> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(v: Vec<f64>) -> Result<Self> {
		ensure!(v.len() == 4, "bounds must have 4 values, got {}", v.len());
		Ok(GeoBBox::new(v[0], v[1], v[2], v[3]))
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "GeoBBox({}, {}, {}, {})", self.x_min, self.y_min, self.x_max, self.y_max)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case([-10.0, -5.0, 10.0, 5.0], [-12.0, -3.0, 8.0, 6.0], [-10.0, -3.0, 8.0, 5.0])]
	#[case([0.0, 0.0, 1.0, 1.0], [0.0, 0.0, 1.0, 1.0], [0.0, 0.0, 1.0, 1.0])]
	#[case([0.0, 0.0, 1.0, 1.0], [5.0, 5.0, 6.0, 6.0], [5.0, 5.0, 1.0, 1.0])]
	fn intersection(#[case] a: [f64; 4], #[case] b: [f64; 4], #[case] expected: [f64; 4]) {
		let ab = GeoBBox::from(a).intersected(&GeoBBox::from(b));
		let ba = GeoBBox::from(b).intersected(&GeoBBox::from(a));
		assert_eq!(ab.as_array(), expected);
		assert_eq!(ab, ba);
	}

	#[test]
	fn disjoint_intersection_is_invalid() {
		let a = GeoBBox::new(0.0, 0.0, 1.0, 1.0);
		let b = GeoBBox::new(5.0, 5.0, 6.0, 6.0);
		assert!(a.is_valid());
		assert!(!a.intersected(&b).is_valid());
	}

	#[test]
	fn world_default() {
		assert_eq!(GeoBBox::default().as_array(), [-180.0, -85.0511, 180.0, 85.0511]);
	}

	#[test]
	fn from_vec() {
		assert!(GeoBBox::try_from(vec![1.0, 2.0, 3.0]).is_err());
		let bbox = GeoBBox::try_from(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
		assert_eq!(format!("{bbox:?}"), "GeoBBox(1, 2, 3, 4)");
	}
}
