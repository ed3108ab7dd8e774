/// Refcounted LRU cache with single-flight loading.
#[allow(clippy::module_inception)]
pub mod cache;
pub(crate) mod lru;
/// Cache keys and their producers.
pub mod source;

pub use cache::{ImageCache, ImageCacheOpts, ImageHandle, LoadResult};
pub use source::{ImageSource, LoadFuture, Source, SourceFormat};
