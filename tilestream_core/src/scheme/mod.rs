//! Coordinate enumeration schemes.
//!
//! A scheme is built from a (restricted) [`TileSetInfo`] and hands out the coordinates a
//! producer should fetch, one at a time, until it reports exhaustion by returning `None`.
//! Within one run a scheme never yields the same coordinate twice.
//!
//! ```
//! use tilestream_core::{SchemeKind, TileSetInfo};
//!
//! let info = TileSetInfo::new().with_zoom(0, 1);
//! let mut scheme = SchemeKind::Scanline.create(&info).unwrap();
//! let mut count = 0;
//! while scheme.next_coord().is_some() {
//! 	count += 1;
//! }
//! assert_eq!(count, 5);
//! ```

mod list;
mod scanline;

pub use list::ListScheme;
pub use scanline::ScanlineScheme;

use crate::{TileCoord, TileSetInfo};
use anyhow::{Result, bail};
use std::{fmt, str::FromStr, sync::Arc};

/// Hands out the coordinates of a tile set in a deterministic order.
pub trait TileScheme: Send {
	/// Returns the next coordinate to fetch, or `None` once the scheme is exhausted.
	fn next_coord(&mut self) -> Option<TileCoord>;
}

/// Builds a caller-defined scheme from a restricted description.
pub type SchemeFactory = Arc<dyn Fn(&TileSetInfo) -> Result<Box<dyn TileScheme>> + Send + Sync>;

/// Identifies the enumeration strategy of a tile set request.
#[derive(Clone)]
pub enum SchemeKind {
	/// Every tile inside the bounds, zoom level by zoom level, row by row.
	Scanline,
	/// Exactly the listed coordinates, in order.
	List(Vec<TileCoord>),
	/// A caller-supplied strategy.
	Custom { name: String, factory: SchemeFactory },
}

impl SchemeKind {
	/// Wraps a scheme factory.
	pub fn custom<F>(name: &str, factory: F) -> SchemeKind
	where
		F: Fn(&TileSetInfo) -> Result<Box<dyn TileScheme>> + Send + Sync + 'static,
	{
		SchemeKind::Custom {
			name: name.to_string(),
			factory: Arc::new(factory),
		}
	}

	/// Parses a coordinate list with one `z/x/y` per line. Blank lines are skipped.
	pub fn parse_list(text: &str) -> Result<SchemeKind> {
		Ok(SchemeKind::List(ListScheme::parse_coords(text)?))
	}

	#[must_use]
	pub fn name(&self) -> &str {
		match self {
			SchemeKind::Scanline => "scanline",
			SchemeKind::List(_) => "list",
			SchemeKind::Custom { name, .. } => name,
		}
	}

	/// Constructs the scheme over `info`.
	pub fn create(&self, info: &TileSetInfo) -> Result<Box<dyn TileScheme>> {
		let scheme: Box<dyn TileScheme> = match self {
			SchemeKind::Scanline => Box::new(ScanlineScheme::new(info)?),
			SchemeKind::List(coords) => Box::new(ListScheme::new(coords.clone())),
			SchemeKind::Custom { factory, .. } => factory(info)?,
		};
		Ok(scheme)
	}
}

/// Parses `scanline` or `list:z/x/y,z/x/y,…`.
impl FromStr for SchemeKind {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		if s == "scanline" {
			return Ok(SchemeKind::Scanline);
		}
		if let Some(list) = s.strip_prefix("list:") {
			return SchemeKind::parse_list(&list.replace(',', "\n"));
		}
		bail!("unknown scheme '{s}', expected 'scanline' or 'list:z/x/y,…'")
	}
}

impl PartialEq for SchemeKind {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(SchemeKind::Scanline, SchemeKind::Scanline) => true,
			(SchemeKind::List(a), SchemeKind::List(b)) => a == b,
			(SchemeKind::Custom { name: a, factory: fa }, SchemeKind::Custom { name: b, factory: fb }) => {
				a == b && Arc::ptr_eq(fa, fb)
			}
			_ => false,
		}
	}
}

impl fmt::Debug for SchemeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SchemeKind::List(coords) => write!(f, "List({} coords)", coords.len()),
			_ => write!(f, "{}", self.name()),
		}
	}
}
