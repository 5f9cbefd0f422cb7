use super::TileScheme;
use crate::TileCoord;
use anyhow::{Context, Result};
use std::vec;

/// Yields a fixed list of coordinates in the given order, ignoring zoom range and bounds.
pub struct ListScheme {
	coords: vec::IntoIter<TileCoord>,
}

impl ListScheme {
	#[must_use]
	pub fn new(coords: Vec<TileCoord>) -> ListScheme {
		ListScheme {
			coords: coords.into_iter(),
		}
	}

	/// Parses one `z/x/y` coordinate per line.
	pub fn parse_coords(text: &str) -> Result<Vec<TileCoord>> {
		text
			.lines()
			.enumerate()
			.filter(|(_, line)| !line.trim().is_empty())
			.map(|(index, line)| line.parse().with_context(|| format!("in line {}", index + 1)))
			.collect()
	}
}

impl TileScheme for ListScheme {
	fn next_coord(&mut self) -> Option<TileCoord> {
		self.coords.next()
	}
}
