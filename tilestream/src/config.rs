//! Runtime parameters shared by the pipeline stages.
//!
//! The configuration is plain data; clone it into every stage that needs it.

use anyhow::{Result, ensure};
use std::time::Duration;
use tilestream_core::{SchemeKind, TileSetInfo};

/// Number of tile fetches a producer keeps in flight by default.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Delay after which a producer waiting for fetches emits a heartbeat item.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Parameters controlling fetch concurrency and keep-alive behaviour.
///
/// ```
/// use tilestream::StreamConfig;
///
/// let config = StreamConfig::default().with_concurrency(2).unwrap();
/// assert_eq!(config.concurrency, 2);
/// assert!(StreamConfig::default().with_concurrency(0).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
	/// Upper bound of outstanding tile fetches. Values below 1 are treated as 1.
	pub concurrency: usize,
	/// How long a producer waits for a fetch before emitting a heartbeat.
	pub heartbeat_interval: Duration,
}

impl StreamConfig {
	pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self> {
		ensure!(concurrency > 0, "concurrency must be a positive integer");
		self.concurrency = concurrency;
		Ok(self)
	}

	#[must_use]
	pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
		self.heartbeat_interval = interval;
		self
	}

	/// The concurrency ceiling actually enforced.
	#[must_use]
	pub fn concurrency_limit(&self) -> usize {
		self.concurrency.max(1)
	}
}

impl Default for StreamConfig {
	fn default() -> Self {
		Self {
			concurrency: DEFAULT_CONCURRENCY,
			heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
		}
	}
}

/// What a [`TileProducer`](crate::TileProducer) should read: the requested tile set plus the
/// stream parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadRequest {
	pub info: TileSetInfo,
	pub config: StreamConfig,
}

impl ReadRequest {
	#[must_use]
	pub fn new(info: TileSetInfo) -> Self {
		Self {
			info,
			config: StreamConfig::default(),
		}
	}

	pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self> {
		self.config = self.config.with_concurrency(concurrency)?;
		Ok(self)
	}

	#[must_use]
	pub fn with_scheme(mut self, scheme: SchemeKind) -> Self {
		self.info.scheme = Some(scheme);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = StreamConfig::default();
		assert_eq!(config.concurrency, 8);
		assert_eq!(config.heartbeat_interval, Duration::from_millis(50));
	}

	#[test]
	fn limit_is_at_least_one() {
		let config = StreamConfig {
			concurrency: 0,
			..StreamConfig::default()
		};
		assert_eq!(config.concurrency_limit(), 1);
	}

	#[test]
	fn request_builder() {
		let request = ReadRequest::new(TileSetInfo::new().with_zoom(1, 2))
			.with_concurrency(3)
			.unwrap()
			.with_scheme(SchemeKind::Scanline);
		assert_eq!(request.config.concurrency, 3);
		assert_eq!(request.info.scheme, Some(SchemeKind::Scanline));
		assert!(ReadRequest::default().with_concurrency(0).is_err());
	}
}
