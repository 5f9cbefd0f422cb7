//! Mock tile sink for testing

use crate::{PutTileMode, TileSink};
use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tilestream_core::{Blob, TileCoord, TileHeaders, TileSetInfo};

/// One recorded `put_tile` call.
#[derive(Clone, Debug, PartialEq)]
pub struct MockSinkTile {
	pub coord: TileCoord,
	pub data: Blob,
	pub headers: Option<TileHeaders>,
}

/// A write recorded by [`MockSink::calls`].
#[derive(Clone, Debug, PartialEq)]
pub enum MockSinkCall {
	PutTile(TileCoord),
	PutInfo,
}

#[derive(Default)]
struct Recorded {
	tiles: Vec<MockSinkTile>,
	infos: Vec<TileSetInfo>,
	calls: Vec<MockSinkCall>,
}

/// A sink keeping every write in memory.
///
/// Clones share the recorded writes, so a test can hand one clone to the pipeline and inspect
/// another afterwards.
#[derive(Clone, Default)]
pub struct MockSink {
	recorded: Arc<Mutex<Recorded>>,
	mode: PutTileMode,
	accepts_info: bool,
	info_error: Option<String>,
	tile_error: Option<String>,
}

impl MockSink {
	#[must_use]
	pub fn new() -> MockSink {
		MockSink::default()
	}

	/// Stores data only.
	#[must_use]
	pub fn without_headers(mut self) -> MockSink {
		self.mode = PutTileMode::WithoutHeaders;
		self
	}

	#[must_use]
	pub fn with_info_support(mut self) -> MockSink {
		self.accepts_info = true;
		self
	}

	/// Supports metadata, but every `put_info` fails with `message`.
	#[must_use]
	pub fn with_info_error(mut self, message: &str) -> MockSink {
		self.accepts_info = true;
		self.info_error = Some(message.to_string());
		self
	}

	/// Every `put_tile` fails with `message`.
	#[must_use]
	pub fn with_tile_error(mut self, message: &str) -> MockSink {
		self.tile_error = Some(message.to_string());
		self
	}

	pub fn tiles(&self) -> Vec<MockSinkTile> {
		self.recorded.lock().tiles.clone()
	}

	pub fn infos(&self) -> Vec<TileSetInfo> {
		self.recorded.lock().infos.clone()
	}

	/// Every successful write, in call order.
	pub fn calls(&self) -> Vec<MockSinkCall> {
		self.recorded.lock().calls.clone()
	}
}

#[async_trait]
impl TileSink for MockSink {
	fn put_tile_mode(&self) -> PutTileMode {
		self.mode
	}

	async fn put_tile(&mut self, coord: &TileCoord, data: Blob, headers: Option<TileHeaders>) -> Result<()> {
		if let Some(message) = &self.tile_error {
			bail!("{message}");
		}
		let mut recorded = self.recorded.lock();
		recorded.tiles.push(MockSinkTile {
			coord: *coord,
			data,
			headers,
		});
		recorded.calls.push(MockSinkCall::PutTile(*coord));
		Ok(())
	}

	fn supports_info(&self) -> bool {
		self.accepts_info
	}

	async fn put_info(&mut self, info: &TileSetInfo) -> Result<()> {
		if !self.accepts_info {
			bail!("this sink does not store tile set metadata");
		}
		if let Some(message) = &self.info_error {
			bail!("{message}");
		}
		let mut recorded = self.recorded.lock();
		recorded.infos.push(info.clone());
		recorded.calls.push(MockSinkCall::PutInfo);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn clones_share_records() -> Result<()> {
		let sink = MockSink::new().with_info_support();
		let mut writer = sink.clone();
		let coord = TileCoord::new(1, 1, 0)?;
		writer.put_tile(&coord, Blob::from("x"), None).await?;
		writer.put_info(&TileSetInfo::new()).await?;

		assert_eq!(sink.tiles().len(), 1);
		assert_eq!(sink.tiles()[0].coord, coord);
		assert_eq!(sink.infos(), [TileSetInfo::new()]);
		assert_eq!(sink.calls(), [MockSinkCall::PutTile(coord), MockSinkCall::PutInfo]);
		Ok(())
	}

	#[tokio::test]
	async fn failures() -> Result<()> {
		let coord = TileCoord::new(0, 0, 0)?;
		let mut sink = MockSink::new().with_tile_error("full").with_info_error("read-only");
		assert_eq!(sink.put_tile(&coord, Blob::new_empty(), None).await.unwrap_err().to_string(), "full");
		assert_eq!(sink.put_info(&TileSetInfo::new()).await.unwrap_err().to_string(), "read-only");
		assert!(MockSink::new().put_info(&TileSetInfo::new()).await.is_err());
		Ok(())
	}
}
