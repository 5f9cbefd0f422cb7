//! Tile set descriptions and their reconciliation.
//!
//! A [`TileSetInfo`] describes either a *request* (which tiles a caller wants) or a
//! *capability* (which tiles a source or sink advertises). Unset fields are filled by
//! [`TileSetInfo::apply_defaults`], and two descriptions are combined by
//! [`TileSetInfo::restrict`], which keeps the tightest zoom range and bounds of both.
//!
//! ```
//! use tilestream_core::{GeoBBox, TileSetInfo};
//!
//! let request = TileSetInfo::new().with_zoom(0, 14);
//! let source = TileSetInfo::new().with_zoom(3, 20).with_bounds(GeoBBox::new(5.0, 47.0, 15.0, 55.0));
//!
//! let restricted = request.restrict(&source);
//! assert_eq!(restricted.minzoom, Some(3));
//! assert_eq!(restricted.maxzoom, Some(14));
//! assert_eq!(restricted.bounds.unwrap().as_array(), [5.0, 47.0, 15.0, 55.0]);
//! ```

use crate::{GeoBBox, SchemeKind};
use std::collections::BTreeMap;

/// Stands for an unbounded maximum zoom ("+infinity").
pub const MAX_ZOOM_UNBOUNDED: u8 = u8::MAX;

/// Zoom range, geographic bounds and enumeration scheme of a tile set, plus free-form attributes
/// such as `name`, `format` or `attribution`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileSetInfo {
	pub minzoom: Option<u8>,
	pub maxzoom: Option<u8>,
	pub bounds: Option<GeoBBox>,
	pub scheme: Option<SchemeKind>,
	pub attributes: BTreeMap<String, String>,
}

impl TileSetInfo {
	/// An empty description; every field is unset.
	#[must_use]
	pub fn new() -> TileSetInfo {
		TileSetInfo::default()
	}

	#[must_use]
	pub fn with_zoom(mut self, minzoom: u8, maxzoom: u8) -> TileSetInfo {
		self.minzoom = Some(minzoom);
		self.maxzoom = Some(maxzoom);
		self
	}

	#[must_use]
	pub fn with_bounds(mut self, bounds: GeoBBox) -> TileSetInfo {
		self.bounds = Some(bounds);
		self
	}

	#[must_use]
	pub fn with_scheme(mut self, scheme: SchemeKind) -> TileSetInfo {
		self.scheme = Some(scheme);
		self
	}

	#[must_use]
	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> TileSetInfo {
		self.attributes.insert(key.into(), value.into());
		self
	}

	/// Fills unset fields: `minzoom` 0, `maxzoom` unbounded and the whole-earth bounds.
	///
	/// With `is_request` set, an unset scheme also becomes [`SchemeKind::Scanline`]. Sources and
	/// sinks describing themselves never need a scheme.
	#[must_use]
	pub fn apply_defaults(&self, is_request: bool) -> TileSetInfo {
		let mut info = self.clone();
		if is_request && info.scheme.is_none() {
			info.scheme = Some(SchemeKind::Scanline);
		}
		info.minzoom.get_or_insert(0);
		info.maxzoom.get_or_insert(MAX_ZOOM_UNBOUNDED);
		info.bounds.get_or_insert_with(GeoBBox::new_world);
		info
	}

	/// Restricts `self` by `by`: defaults are applied to both operands, then the result gets the
	/// larger `minzoom`, the smaller `maxzoom` and the intersection of both bounds.
	///
	/// Scheme and attributes are taken from `self`. An empty intersection is a valid result.
	#[must_use]
	pub fn restrict(&self, by: &TileSetInfo) -> TileSetInfo {
		let mut info = self.apply_defaults(false);
		let by = by.apply_defaults(false);

		info.minzoom = info.minzoom.max(by.minzoom);
		info.maxzoom = info.maxzoom.min(by.maxzoom);
		info.bounds = match (info.bounds, by.bounds) {
			(Some(a), Some(b)) => Some(a.intersected(&b)),
			(a, b) => a.or(b),
		};
		info
	}

	/// Overlays every field `other` sets onto a copy of `self`.
	#[must_use]
	pub fn merged_with(&self, other: &TileSetInfo) -> TileSetInfo {
		let mut info = self.clone();
		if other.minzoom.is_some() {
			info.minzoom = other.minzoom;
		}
		if other.maxzoom.is_some() {
			info.maxzoom = other.maxzoom;
		}
		if other.bounds.is_some() {
			info.bounds = other.bounds;
		}
		if other.scheme.is_some() {
			info.scheme.clone_from(&other.scheme);
		}
		info
			.attributes
			.extend(other.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
		info
	}

	/// The minimum zoom, or its default.
	#[must_use]
	pub fn min_level(&self) -> u8 {
		self.minzoom.unwrap_or(0)
	}

	/// The maximum zoom, or its default.
	#[must_use]
	pub fn max_level(&self) -> u8 {
		self.maxzoom.unwrap_or(MAX_ZOOM_UNBOUNDED)
	}

	/// `true` if the zoom range and the bounds can contain at least one tile.
	#[must_use]
	pub fn is_satisfiable(&self) -> bool {
		self.min_level() <= self.max_level() && self.bounds.is_none_or(|b| b.is_valid())
	}
}
