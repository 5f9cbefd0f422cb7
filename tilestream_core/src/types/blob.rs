//! This module provides the [`Blob`] struct, a wrapper around [`Vec<u8>`] holding the raw
//! payload of a tile.
//!
//! # Examples
//!
//! ```rust
//! use tilestream_core::Blob;
//!
//! let blob = Blob::from("Xylofön");
//! assert_eq!(blob.as_str(), "Xylofön");
//! assert_eq!(blob.len(), 8);
//! ```

use std::fmt::Debug;

/// A simple wrapper around [`Vec<u8>`] that provides additional methods for working with byte data.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	///
	/// # Examples
	///
	/// ```rust
	/// use tilestream_core::Blob;
	///
	/// let empty_blob = Blob::new_empty();
	/// assert!(empty_blob.is_empty());
	/// ```
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Concatenates several blobs, in order, into a single contiguous `Blob`.
	///
	/// # Examples
	///
	/// ```rust
	/// use tilestream_core::Blob;
	///
	/// let blob = Blob::concat(vec![Blob::from("ab"), Blob::from("cd")]);
	/// assert_eq!(blob.as_str(), "abcd");
	/// ```
	#[must_use]
	pub fn concat(chunks: impl IntoIterator<Item = Blob>) -> Blob {
		let mut iter = chunks.into_iter();
		let mut data = iter.next().map(Blob::into_vec).unwrap_or_default();
		for chunk in iter {
			data.extend_from_slice(chunk.as_slice());
		}
		Blob(data)
	}

	/// Returns a reference to the underlying byte slice.
	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		self.0.as_slice()
	}

	/// Consumes the `Blob` and returns the underlying vector.
	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Interprets the bytes as UTF-8.
	///
	/// # Panics
	///
	/// Panics if the content is not valid UTF-8.
	#[must_use]
	pub fn as_str(&self) -> &str {
		std::str::from_utf8(&self.0).expect("blob is not valid UTF-8")
	}

	/// Returns the number of bytes.
	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	/// Returns `true` if the `Blob` contains no bytes.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(item: &[u8; N]) -> Self {
		Blob(item.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(item: &str) -> Self {
		Blob(item.as_bytes().to_vec())
	}
}

impl From<String> for Blob {
	fn from(item: String) -> Self {
		Blob(item.into_bytes())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		const MAX: usize = 16;
		let head = &self.0[..self.0.len().min(MAX)];
		let suffix = if self.0.len() > MAX { " ..." } else { "" };
		write!(f, "Blob({}): {head:02X?}{suffix}", self.0.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn concat_keeps_write_order() {
		let blob = Blob::concat(vec![Blob::from("A"), Blob::new_empty(), Blob::from("BC")]);
		assert_eq!(blob.as_str(), "ABC");
		assert_eq!(blob.len(), 3);
	}

	#[test]
	fn concat_of_nothing_is_empty() {
		assert!(Blob::concat(Vec::new()).is_empty());
	}

	#[test]
	fn conversions() {
		assert_eq!(Blob::from(vec![1, 2, 3]).as_slice(), &[1, 2, 3]);
		assert_eq!(Blob::from(&[4u8, 5]).into_vec(), vec![4, 5]);
		assert_eq!(Blob::from(String::from("xy")).as_str(), "xy");
	}

	#[test]
	fn debug_is_truncated() {
		let blob = Blob::from(vec![0u8; 20]);
		assert_eq!(
			format!("{blob:?}"),
			"Blob(20): [00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00] ..."
		);
		assert_eq!(format!("{:?}", Blob::from("A")), "Blob(1): [41]");
	}
}
