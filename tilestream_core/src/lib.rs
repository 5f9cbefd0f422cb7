//! Contains the value types shared by every tile streaming stage: coordinates, byte blobs,
//! geographic bounds, tile set descriptions and the coordinate enumeration schemes.

pub mod scheme;
pub use scheme::*;

pub mod types;
pub use types::*;
