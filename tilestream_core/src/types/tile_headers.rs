//! Header metadata travelling with a tile, e.g. `Content-Type` or `Last-Modified`.

use std::collections::{BTreeMap, btree_map};

/// An ordered string-to-string mapping of tile headers.
///
/// # Examples
///
/// ```
/// use tilestream_core::TileHeaders;
///
/// let mut headers = TileHeaders::new();
/// headers.insert("Content-Type", "image/png");
/// assert_eq!(headers.get("Content-Type"), Some("image/png"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileHeaders(BTreeMap<String, String>);

impl TileHeaders {
	#[must_use]
	pub fn new() -> TileHeaders {
		TileHeaders(BTreeMap::new())
	}

	/// Sets `key` to `value`, replacing an earlier value.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), value.into());
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
		self.0.iter()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TileHeaders {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		TileHeaders(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl<'a> IntoIterator for &'a TileHeaders {
	type Item = (&'a String, &'a String);
	type IntoIter = btree_map::Iter<'a, String, String>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
