use crate::TileEvent;
use tilestream_core::{Blob, TileCoord, TileHeaders};

/// A fully materialized tile: coordinate, headers and the complete payload.
///
/// ```
/// use tilestream::TileRecord;
/// use tilestream_core::{Blob, TileCoord, TileHeaders};
///
/// let record = TileRecord::new(TileCoord::new(1, 0, 1).unwrap(), Blob::from("abc"), TileHeaders::new());
/// assert_eq!(record.length(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TileRecord {
	pub coord: TileCoord,
	pub headers: TileHeaders,
	pub data: Blob,
}

impl TileRecord {
	#[must_use]
	pub fn new(coord: TileCoord, data: Blob, headers: TileHeaders) -> TileRecord {
		TileRecord { coord, headers, data }
	}

	/// Byte length of `data`.
	#[must_use]
	pub fn length(&self) -> u64 {
		self.data.len()
	}

	#[must_use]
	pub fn to_event(&self) -> TileEvent {
		TileEvent {
			coord: self.coord,
			headers: self.headers.clone(),
			length: self.length(),
		}
	}
}
