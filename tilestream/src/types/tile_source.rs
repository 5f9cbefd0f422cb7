//! The read side contract: anything that answers tile requests by coordinate.
//!
//! A fetch has three outcomes:
//! - `Ok(TileResponse)` with data and/or headers: the tile is streamed downstream,
//! - `Ok(TileResponse)` with neither: the tile is treated as absent,
//! - `Err(_)`: the tile is skipped. Errors whose message reads "Tile does not exist" or
//!   "Grid does not exist" are the expected absence case (see [`is_absence_error`]); any other
//!   error is logged as a warning. Neither aborts the stream.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::{fmt, sync::LazyLock};
use tilestream_core::{Blob, TileCoord, TileHeaders, TileSetInfo};

/// Result of a successful tile fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileResponse {
	pub data: Option<Blob>,
	pub headers: Option<TileHeaders>,
}

impl TileResponse {
	#[must_use]
	pub fn new(data: Blob) -> TileResponse {
		TileResponse {
			data: Some(data),
			headers: None,
		}
	}

	/// A response carrying neither data nor headers.
	#[must_use]
	pub fn empty() -> TileResponse {
		TileResponse::default()
	}

	#[must_use]
	pub fn with_headers(mut self, headers: TileHeaders) -> TileResponse {
		self.headers = Some(headers);
		self
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_none() && self.headers.is_none()
	}
}

/// Object-safe interface of a tile source.
#[async_trait]
pub trait TileSource: Send + Sync {
	/// Fetches the tile at `coord`.
	async fn get_tile(&self, coord: &TileCoord) -> Result<TileResponse>;

	/// Returns the tile set this source can deliver.
	///
	/// Sources without metadata keep the default, which reports `None`.
	async fn get_info(&self) -> Result<Option<TileSetInfo>> {
		Ok(None)
	}

	/// `true` if the source was already decorated by a
	/// [`StreamingRegistry`](crate::StreamingRegistry).
	fn is_streamable(&self) -> bool {
		false
	}
}

/// Error a source returns for a coordinate it has no tile for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileNotFound(pub TileCoord);

impl fmt::Display for TileNotFound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Tile does not exist: {}", self.0.as_path())
	}
}

impl std::error::Error for TileNotFound {}

static RE_ABSENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new("(Tile|Grid) does not exist").unwrap());

/// `true` if any error in the chain reports a missing tile or grid.
#[must_use]
pub fn is_absence_error(err: &anyhow::Error) -> bool {
	err.chain().any(|cause| RE_ABSENCE.is_match(&cause.to_string()))
}
