//! The writable stage: stores [`TileRecord`]s in a [`TileSink`] and negotiates its metadata.
//!
//! The sink's calling convention ([`PutTileMode`]) is read once, when the consumer is created.
//!
//! Metadata is written at most once, and only to sinks reporting
//! [`supports_info`](TileSink::supports_info):
//! - after the first `Info` event seen on a watched bus, the caller's description overlaid with the
//!   source description and restricted by it is written before the next tile,
//! - if no `Info` event arrived, the caller's description is written by [`TileConsumer::finish`].
//!
//! Errors from the sink are not recovered from; a failed metadata write in particular aborts the
//! whole run.

use crate::{EventBus, ListenerId, PipelineEvent, PutTileMode, TileRecord, TileSink};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use tilestream_core::TileSetInfo;

/// What a finished run wrote to the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyStats {
	pub tiles_written: u64,
	pub bytes_written: u64,
	pub info_written: bool,
}

/// Writes tiles to a sink.
pub struct TileConsumer {
	sink: Box<dyn TileSink>,
	mode: PutTileMode,
	supports_info: bool,
	info: TileSetInfo,
	source_info: Arc<Mutex<Option<TileSetInfo>>>,
	watching: Option<(EventBus, ListenerId)>,
	stats: CopyStats,
}

impl TileConsumer {
	/// Wraps `sink`. `info` is the caller's description of the tile set being written.
	pub fn new(sink: Box<dyn TileSink>, info: TileSetInfo) -> TileConsumer {
		let mode = sink.put_tile_mode();
		let supports_info = sink.supports_info();
		TileConsumer {
			sink,
			mode,
			supports_info,
			info,
			source_info: Arc::new(Mutex::new(None)),
			watching: None,
			stats: CopyStats::default(),
		}
	}

	pub fn mode(&self) -> PutTileMode {
		self.mode
	}

	/// Listens for the first `Info` event on `events`. Replaces an earlier watch.
	pub fn watch(&mut self, events: &EventBus) -> ListenerId {
		self.unwatch();
		let slot = self.source_info.clone();
		let id = events.subscribe(move |event| {
			if let PipelineEvent::Info(info) = event {
				slot.lock().get_or_insert_with(|| info.clone());
			}
		});
		self.watching = Some((events.clone(), id));
		id
	}

	fn unwatch(&mut self) {
		if let Some((bus, id)) = self.watching.take() {
			bus.unsubscribe(id);
		}
	}

	pub fn stats(&self) -> CopyStats {
		self.stats
	}

	/// Writes one tile, after writing pending metadata.
	pub async fn write(&mut self, record: TileRecord) -> Result<()> {
		self.negotiate_info().await?;

		let TileRecord { coord, headers, data } = record;
		let length = data.len();
		let headers = match self.mode {
			PutTileMode::WithHeaders => Some(headers),
			PutTileMode::WithoutHeaders => None,
		};
		self
			.sink
			.put_tile(&coord, data, headers)
			.await
			.with_context(|| format!("failed to write tile {}", coord.as_path()))?;

		self.stats.tiles_written += 1;
		self.stats.bytes_written += length;
		Ok(())
	}

	/// Completes the run: writes the metadata if that has not happened yet.
	pub async fn finish(mut self) -> Result<CopyStats> {
		self.negotiate_info().await?;
		if self.supports_info && !self.stats.info_written {
			log::debug!("no source metadata received, writing the caller's metadata");
			let info = self.info.clone();
			self.put_info(&info).await?;
		}
		self.unwatch();
		Ok(self.stats)
	}

	async fn negotiate_info(&mut self) -> Result<()> {
		if !self.supports_info || self.stats.info_written {
			return Ok(());
		}
		let source_info = self.source_info.lock().clone();
		let Some(source_info) = source_info else {
			return Ok(());
		};
		let info = self.info.merged_with(&source_info).restrict(&source_info);
		self.put_info(&info).await
	}

	async fn put_info(&mut self, info: &TileSetInfo) -> Result<()> {
		self
			.sink
			.put_info(info)
			.await
			.context("failed to write tile set metadata")?;
		self.stats.info_written = true;
		Ok(())
	}
}

impl Drop for TileConsumer {
	fn drop(&mut self) {
		self.unwatch();
	}
}

impl fmt::Debug for TileConsumer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TileConsumer")
			.field("mode", &self.mode)
			.field("supports_info", &self.supports_info)
			.field("stats", &self.stats)
			.finish()
	}
}
