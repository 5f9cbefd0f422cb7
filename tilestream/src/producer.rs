//! The readable stage: turns a [`TileSource`] into a bounded stream of tiles.
//!
//! A [`TileProducer`] first asks the source for its [`TileSetInfo`] and restricts the request by
//! it. It then walks the request's scheme and keeps at most [`StreamConfig::concurrency`] fetches
//! running. Each fetched tile is emitted as a [`StreamItem::Tile`]; while nothing is ready a
//! [`StreamItem::Heartbeat`] is emitted every [`StreamConfig::heartbeat_interval`].
//!
//! Backpressure comes from polling: a new fetch is only started while the stream is polled, so a
//! consumer that stops reading stops new fetches. Fetches already running are left to finish and
//! their tiles are discarded.
//!
//! The producer spawns its fetches and must be polled inside a Tokio runtime.

use crate::{
	EventBus, ReadRequest, StreamConfig, StreamItem, TileCarrier, TileResponse, TileSource, is_absence_error,
};
use anyhow::Result;
use futures::{Stream, StreamExt, stream::FuturesUnordered};
use std::{
	fmt,
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll, ready},
};
use tilestream_core::{SchemeKind, TileCoord, TileScheme, TileSetInfo};
use tokio::{task::JoinError, time::Sleep};

type FetchOutcome = (TileCoord, Result<Result<TileResponse>, JoinError>);
type Fetch = Pin<Box<dyn Future<Output = FetchOutcome> + Send>>;
type InfoQuery = Pin<Box<dyn Future<Output = Result<Option<TileSetInfo>>> + Send>>;

/// Stream of the tiles a source has for a request.
pub struct TileProducer {
	source: Arc<dyn TileSource>,
	request: TileSetInfo,
	config: StreamConfig,
	events: EventBus,
	info_query: Option<InfoQuery>,
	scheme: Option<Box<dyn TileScheme>>,
	fetches: FuturesUnordered<Fetch>,
	heartbeat: Option<Pin<Box<Sleep>>>,
	exhausted: bool,
	done: bool,
}

impl TileProducer {
	/// Creates a producer. Nothing is fetched before the stream is polled.
	pub fn new(source: Arc<dyn TileSource>, request: ReadRequest) -> TileProducer {
		let query_source = source.clone();
		let info_query: InfoQuery = Box::pin(async move { query_source.get_info().await });

		TileProducer {
			source,
			request: request.info.apply_defaults(true),
			config: request.config,
			events: EventBus::new(),
			info_query: Some(info_query),
			scheme: None,
			fetches: FuturesUnordered::new(),
			heartbeat: None,
			exhausted: false,
			done: false,
		}
	}

	/// Bus carrying the [`Info`](crate::PipelineEvent::Info) event of this producer.
	///
	/// Subscribe before polling; the event is emitted during the first poll that completes the
	/// metadata query.
	pub fn events(&self) -> &EventBus {
		&self.events
	}

	/// The request, restricted by the source metadata once initialized.
	pub fn request(&self) -> &TileSetInfo {
		&self.request
	}

	pub fn config(&self) -> &StreamConfig {
		&self.config
	}

	/// `true` once the metadata query completed and the scheme was built.
	pub fn is_initialized(&self) -> bool {
		self.info_query.is_none()
	}

	/// Number of fetches started but not yet handed out.
	pub fn pending_fetches(&self) -> usize {
		self.fetches.len()
	}

	fn poll_init(&mut self, cx: &mut Context<'_>) -> Poll<()> {
		let Some(query) = self.info_query.as_mut() else {
			return Poll::Ready(());
		};
		let result = ready!(query.as_mut().poll(cx));
		self.info_query = None;

		match result {
			Ok(Some(info)) => {
				self.request = self.request.restrict(&info);
				log::debug!("request restricted by source metadata to {:?}", self.request);
				self.events.info(info.restrict(&self.request));
			}
			Ok(None) => log::debug!("source has no metadata, using the request as is"),
			Err(err) => log::warn!("failed to read source metadata, using defaults: {err:#}"),
		}

		let kind = self.request.scheme.clone().unwrap_or(SchemeKind::Scanline);
		match kind.create(&self.request) {
			Ok(scheme) => self.scheme = Some(scheme),
			Err(err) => {
				log::error!("failed to create scheme '{}': {err:#}", kind.name());
				self.exhausted = true;
			}
		}
		Poll::Ready(())
	}

	/// Starts fetches until the window is full or the scheme is exhausted.
	fn fill(&mut self) {
		let limit = self.config.concurrency_limit();
		while !self.exhausted && self.fetches.len() < limit {
			match self.scheme.as_mut().and_then(|scheme| scheme.next_coord()) {
				Some(coord) => self.start_fetch(coord),
				None => {
					log::trace!("scheme exhausted, {} fetches pending", self.fetches.len());
					self.exhausted = true;
					self.heartbeat = None;
				}
			}
		}
	}

	fn start_fetch(&mut self, coord: TileCoord) {
		let source = self.source.clone();
		let handle = tokio::spawn(async move { source.get_tile(&coord).await });
		self.fetches.push(Box::pin(async move { (coord, handle.await) }));
	}

	/// Wraps a finished fetch into a carrier, or returns `None` if there is no tile.
	fn accept(coord: TileCoord, outcome: Result<Result<TileResponse>, JoinError>) -> Option<TileCarrier> {
		let response = match outcome {
			Ok(Ok(response)) => response,
			Ok(Err(err)) => {
				if is_absence_error(&err) {
					log::debug!("tile {} does not exist", coord.as_path());
				} else {
					log::warn!("failed to fetch tile {}, skipping: {err:#}", coord.as_path());
				}
				return None;
			}
			Err(err) => {
				log::warn!("fetch of tile {} did not complete, skipping: {err}", coord.as_path());
				return None;
			}
		};

		if response.is_empty() {
			log::debug!("tile {} has neither data nor headers, skipping", coord.as_path());
			return None;
		}

		let (writer, carrier) = TileCarrier::channel(coord);
		writer.end_deferred(response.headers, response.data);
		Some(carrier)
	}
}

impl Stream for TileProducer {
	type Item = StreamItem;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamItem>> {
		let this = &mut *self;
		if this.done {
			return Poll::Ready(None);
		}
		ready!(this.poll_init(cx));

		loop {
			this.fill();
			match this.fetches.poll_next_unpin(cx) {
				Poll::Ready(Some((coord, outcome))) => {
					if let Some(carrier) = Self::accept(coord, outcome) {
						log::trace!("emitting tile {}", coord.as_path());
						this.heartbeat = None;
						return Poll::Ready(Some(StreamItem::Tile(carrier)));
					}
				}
				Poll::Ready(None) => {
					// `fill` only leaves the window empty once the scheme is exhausted
					this.done = true;
					return Poll::Ready(None);
				}
				Poll::Pending => break,
			}
		}

		if this.exhausted {
			return Poll::Pending;
		}

		let interval = this.config.heartbeat_interval;
		let timer = this
			.heartbeat
			.get_or_insert_with(|| Box::pin(tokio::time::sleep(interval)));
		if timer.as_mut().poll(cx).is_ready() {
			this.heartbeat = None;
			log::trace!("no tile ready after {interval:?}, emitting heartbeat");
			return Poll::Ready(Some(StreamItem::Heartbeat));
		}
		Poll::Pending
	}
}

impl fmt::Debug for TileProducer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TileProducer")
			.field("request", &self.request)
			.field("config", &self.config)
			.field("pending_fetches", &self.fetches.len())
			.field("exhausted", &self.exhausted)
			.field("done", &self.done)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{HeaderAccumulator, MockSource, PipelineEvent};
	use futures::StreamExt;
	use parking_lot::Mutex;
	use pretty_assertions::assert_eq;
	use std::time::Duration;
	use tilestream_core::{Blob, GeoBBox, TileHeaders};

	fn coord(z: u8, x: u32, y: u32) -> TileCoord {
		TileCoord::new(z, x, y).unwrap()
	}

	fn list_request(coords: &[TileCoord], concurrency: usize) -> ReadRequest {
		ReadRequest::default()
			.with_scheme(SchemeKind::List(coords.to_vec()))
			.with_concurrency(concurrency)
			.unwrap()
	}

	async fn tiles_of(producer: TileProducer) -> Vec<TileCoord> {
		producer
			.filter_map(|item| async move { item.into_carrier().map(|c| c.coord()) })
			.collect()
			.await
	}

	#[tokio::test]
	async fn emits_every_tile_within_the_window() {
		let coords: Vec<TileCoord> = (0..4).flat_map(|x| (0..4).map(move |y| coord(2, x, y))).collect();
		let source = Arc::new(
			MockSource::new()
				.with_tiles(coords.clone())
				.with_delay(Duration::from_millis(5)),
		);

		let producer = TileProducer::new(source.clone(), list_request(&coords, 3));
		let mut emitted = tiles_of(producer).await;
		emitted.sort_by_key(|c| (c.x, c.y));

		assert_eq!(emitted, coords);
		assert_eq!(source.max_in_flight(), 3);
		assert_eq!(source.requests().len(), 16);
	}

	#[tokio::test]
	async fn fetches_in_scheme_order() {
		let coords = [coord(1, 1, 1), coord(0, 0, 0), coord(1, 0, 1)];
		let source = Arc::new(MockSource::new().with_tiles(coords));
		tiles_of(TileProducer::new(source.clone(), list_request(&coords, 1))).await;
		assert_eq!(source.requests(), coords);
	}

	#[tokio::test]
	async fn completion_order_may_differ_from_scheme_order() {
		let coords = [coord(0, 0, 0), coord(1, 0, 0)];
		let source = Arc::new(
			MockSource::new()
				.with_tiles(coords)
				.with_tile_delay(coords[0], Duration::from_millis(40)),
		);
		let emitted = tiles_of(TileProducer::new(source, list_request(&coords, 2))).await;
		assert_eq!(emitted, [coords[1], coords[0]]);
	}

	#[tokio::test]
	async fn absent_and_failing_tiles_are_skipped() {
		let coords = [coord(0, 0, 0), coord(1, 0, 0), coord(1, 1, 0), coord(1, 0, 1)];
		let source = Arc::new(
			MockSource::new()
				.with_tiles([coords[0]])
				.with_error(coords[1], "Grid does not exist")
				.with_error(coords[2], "socket hang up")
				.with_response(coords[3], TileResponse::empty()),
		);
		let emitted = tiles_of(TileProducer::new(source.clone(), list_request(&coords, 1))).await;
		assert_eq!(emitted, [coords[0]]);
		assert_eq!(source.requests().len(), 4);
	}

	#[tokio::test]
	async fn never_ends_with_fetches_pending() {
		let coords = [coord(0, 0, 0), coord(1, 0, 0), coord(1, 1, 1)];
		let source = Arc::new(
			MockSource::new()
				.with_tiles(coords)
				.with_tile_delay(coords[0], Duration::from_millis(30)),
		);
		let mut producer = TileProducer::new(source.clone(), list_request(&coords, 3));

		let mut count = 0;
		while let Some(item) = producer.next().await {
			if item.into_carrier().is_some() {
				count += 1;
			}
		}
		assert_eq!(count, 3);
		assert_eq!(producer.pending_fetches(), 0);
		assert_eq!(source.in_flight(), 0);
		assert!(producer.next().await.is_none());
	}

	#[tokio::test]
	async fn no_new_fetches_while_not_polled() {
		let coords: Vec<TileCoord> = (0..8).flat_map(|x| (0..8).map(move |y| coord(3, x, y))).collect();
		let source = Arc::new(MockSource::new().with_tiles(coords.clone()));
		let mut producer = TileProducer::new(source.clone(), list_request(&coords, 4));

		let first = producer.next().await.unwrap();
		assert!(!first.is_heartbeat());
		tokio::time::sleep(Duration::from_millis(20)).await;
		assert_eq!(source.requests().len(), 4);
		assert_eq!(producer.pending_fetches(), 3);
	}

	#[tokio::test]
	async fn emits_heartbeats_while_waiting() {
		let coords = [coord(0, 0, 0)];
		let source = Arc::new(MockSource::new().with_tiles(coords).with_delay(Duration::from_millis(100)));
		let mut request = list_request(&coords, 1);
		request.config = request.config.with_heartbeat_interval(Duration::from_millis(10));

		let items: Vec<StreamItem> = TileProducer::new(source, request).collect().await;
		let (heartbeats, tiles): (Vec<_>, Vec<_>) = items.into_iter().partition(StreamItem::is_heartbeat);
		assert!(!heartbeats.is_empty());
		assert_eq!(tiles.len(), 1);
	}

	#[tokio::test]
	async fn no_heartbeats_once_the_scheme_is_exhausted() {
		let coords = [coord(0, 0, 0), coord(1, 0, 0)];
		let source = Arc::new(MockSource::new().with_tiles(coords).with_delay(Duration::from_millis(80)));
		let mut request = list_request(&coords, 4);
		request.config = request.config.with_heartbeat_interval(Duration::from_millis(5));

		let items: Vec<StreamItem> = TileProducer::new(source, request).collect().await;
		assert_eq!(items.iter().filter(|item| item.is_heartbeat()).count(), 0);
		assert_eq!(items.len(), 2);
	}

	#[tokio::test]
	async fn carriers_deliver_source_headers() {
		let headers: TileHeaders = [("Content-Type", "image/webp")].into_iter().collect();
		let source = Arc::new(MockSource::new().with_tile_headers(coord(0, 0, 0), "webp", headers.clone()));
		let mut producer = TileProducer::new(source, list_request(&[coord(0, 0, 0)], 1));

		let carrier = producer.next().await.unwrap().into_carrier().unwrap();
		let target = Arc::new(HeaderAccumulator::new());
		carrier.connect(target.clone());
		let chunks: Vec<Blob> = carrier.collect().await;
		assert_eq!(chunks, [Blob::from("webp")]);
		assert_eq!(target.headers(), headers);
	}

	#[tokio::test]
	async fn restricts_request_by_source_info() {
		let info = TileSetInfo::new()
			.with_zoom(0, 1)
			.with_attribute("name", "mock");
		let source = Arc::new(
			MockSource::new()
				.with_info(info)
				.with_tiles([coord(0, 0, 0), coord(1, 0, 0), coord(1, 1, 1)]),
		);
		let request = ReadRequest::new(TileSetInfo::new().with_bounds(GeoBBox::new(-10.0, -10.0, 10.0, 10.0)));
		let producer = TileProducer::new(source.clone(), request);

		let seen = Arc::new(Mutex::new(Vec::new()));
		let s = seen.clone();
		producer.events().subscribe(move |event| s.lock().push(event.clone()));

		let emitted = tiles_of(producer).await;
		assert_eq!(emitted.len(), 3);
		assert_eq!(source.requests().len(), 5);

		let seen = seen.lock();
		let [PipelineEvent::Info(emitted_info)] = seen.as_slice() else {
			panic!("expected exactly one info event, got {seen:?}");
		};
		assert_eq!((emitted_info.minzoom, emitted_info.maxzoom), (Some(0), Some(1)));
		assert_eq!(emitted_info.bounds, Some(GeoBBox::new(-10.0, -10.0, 10.0, 10.0)));
		assert_eq!(emitted_info.attributes.get("name").map(String::as_str), Some("mock"));
	}

	#[tokio::test]
	async fn info_failure_falls_back_to_defaults() {
		let coords = [coord(0, 0, 0)];
		let source = Arc::new(MockSource::new().with_info_error("timeout").with_tiles(coords));
		let mut producer = TileProducer::new(source, list_request(&coords, 1));
		assert!(!producer.is_initialized());

		let item = producer.next().await.unwrap();
		assert!(producer.is_initialized());
		assert_eq!(producer.request().minzoom, Some(0));
		let chunks: Vec<Blob> = item.into_carrier().unwrap().collect().await;
		assert_eq!(chunks, [Blob::from("0/0/0")]);
	}

	#[tokio::test]
	async fn empty_intersection_yields_nothing() {
		let source = Arc::new(MockSource::new().with_info(TileSetInfo::new().with_zoom(5, 6)));
		let request = ReadRequest::new(TileSetInfo::new().with_zoom(0, 2));
		let mut producer = TileProducer::new(source.clone(), request);
		assert!(producer.next().await.is_none());
		assert!(source.requests().is_empty());
	}
}
