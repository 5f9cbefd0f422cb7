//! Mock tile source for testing

use crate::{TileNotFound, TileResponse, TileSource};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
	collections::HashMap,
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};
use tilestream_core::{Blob, TileCoord, TileHeaders, TileSetInfo};

/// A source answering from a fixed table of tiles.
///
/// Unknown coordinates fail with [`TileNotFound`]. The source counts concurrent `get_tile`
/// calls, so tests can check the fetch window of a producer.
#[derive(Default)]
pub struct MockSource {
	tiles: HashMap<TileCoord, Result<TileResponse, String>>,
	info: Option<Result<TileSetInfo, String>>,
	delay: Duration,
	tile_delays: HashMap<TileCoord, Duration>,
	requests: Mutex<Vec<TileCoord>>,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
}

impl MockSource {
	#[must_use]
	pub fn new() -> MockSource {
		MockSource::default()
	}

	/// Adds tiles whose content is their own `z/x/y` path.
	#[must_use]
	pub fn with_tiles(mut self, coords: impl IntoIterator<Item = TileCoord>) -> MockSource {
		for coord in coords {
			let data = Blob::from(coord.as_path());
			self.tiles.insert(coord, Ok(TileResponse::new(data)));
		}
		self
	}

	#[must_use]
	pub fn with_tile_headers(self, coord: TileCoord, data: impl Into<Blob>, headers: TileHeaders) -> MockSource {
		self.with_response(coord, TileResponse::new(data.into()).with_headers(headers))
	}

	#[must_use]
	pub fn with_response(mut self, coord: TileCoord, response: TileResponse) -> MockSource {
		self.tiles.insert(coord, Ok(response));
		self
	}

	/// Makes fetching `coord` fail with `message`.
	#[must_use]
	pub fn with_error(mut self, coord: TileCoord, message: &str) -> MockSource {
		self.tiles.insert(coord, Err(message.to_string()));
		self
	}

	#[must_use]
	pub fn with_info(mut self, info: TileSetInfo) -> MockSource {
		self.info = Some(Ok(info));
		self
	}

	#[must_use]
	pub fn with_info_error(mut self, message: &str) -> MockSource {
		self.info = Some(Err(message.to_string()));
		self
	}

	/// Latency of every fetch.
	#[must_use]
	pub fn with_delay(mut self, delay: Duration) -> MockSource {
		self.delay = delay;
		self
	}

	/// Latency of fetching `coord`, overriding [`MockSource::with_delay`].
	#[must_use]
	pub fn with_tile_delay(mut self, coord: TileCoord, delay: Duration) -> MockSource {
		self.tile_delays.insert(coord, delay);
		self
	}

	/// Every requested coordinate, in request order.
	pub fn requests(&self) -> Vec<TileCoord> {
		self.requests.lock().clone()
	}

	pub fn in_flight(&self) -> usize {
		self.in_flight.load(Ordering::SeqCst)
	}

	/// Highest number of fetches observed running at the same time.
	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
	fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> InFlight<'a> {
		let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
		max.fetch_max(now, Ordering::SeqCst);
		InFlight(counter)
	}
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl TileSource for MockSource {
	async fn get_tile(&self, coord: &TileCoord) -> Result<TileResponse> {
		self.requests.lock().push(*coord);
		let _guard = InFlight::enter(&self.in_flight, &self.max_in_flight);

		let delay = self.tile_delays.get(coord).copied().unwrap_or(self.delay);
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}

		match self.tiles.get(coord) {
			Some(Ok(response)) => Ok(response.clone()),
			Some(Err(message)) => Err(anyhow!("{message}")),
			None => Err(TileNotFound(*coord).into()),
		}
	}

	async fn get_info(&self) -> Result<Option<TileSetInfo>> {
		match &self.info {
			Some(Ok(info)) => Ok(Some(info.clone())),
			Some(Err(message)) => Err(anyhow!("{message}")),
			None => Ok(None),
		}
	}
}
