//! Compact codec: a versioned byte format addressed entirely by canonical-table indices.

mod decode;
/// The [`Encoder`](encode::Encoder) backend.
pub mod encode;
/// Header constants and [`FloatWidth`](format::FloatWidth).
pub mod format;
/// The [`CompactImage`](image::CompactImage) representation.
pub mod image;
mod reader;
mod writer;

pub use encode::{EncodeOpts, Encoder};
pub use format::{FloatWidth, Header};
pub use image::CompactImage;
