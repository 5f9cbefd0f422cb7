//! The write side contract: anything that stores tiles by coordinate.

use anyhow::{Result, bail};
use async_trait::async_trait;
use tilestream_core::{Blob, TileCoord, TileHeaders, TileSetInfo};

/// Calling convention of [`TileSink::put_tile`]. A consumer reads it once, when it wraps the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PutTileMode {
	/// The sink stores headers along with the tile data.
	#[default]
	WithHeaders,
	/// The sink stores data only; `put_tile` always receives `None` for headers.
	WithoutHeaders,
}

/// Object-safe interface of a tile sink.
#[async_trait]
pub trait TileSink: Send {
	fn put_tile_mode(&self) -> PutTileMode {
		PutTileMode::WithHeaders
	}

	/// Stores one tile.
	async fn put_tile(&mut self, coord: &TileCoord, data: Blob, headers: Option<TileHeaders>) -> Result<()>;

	/// `true` if the sink stores tile set metadata via [`TileSink::put_info`].
	fn supports_info(&self) -> bool {
		false
	}

	/// Stores the tile set metadata.
	async fn put_info(&mut self, _info: &TileSetInfo) -> Result<()> {
		bail!("this sink does not store tile set metadata")
	}
}
