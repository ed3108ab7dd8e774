use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;

use crate::foundation::error::VgcResult;
use crate::frontend::svg::svg_to_image;
use crate::image::{Representation, ScalableImage};

/// Future produced by an [`ImageSource`].
pub type LoadFuture = BoxFuture<'static, VgcResult<ScalableImage>>;

/// Value-comparable cache key that knows how to produce its image.
///
/// Two keys that compare equal must produce equivalent images; the cache runs `load` at most
/// once per key until the entry is reloaded or evicted.
pub trait ImageSource: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Start producing the image.
    fn load(&self) -> LoadFuture;
}

/// Markup or binary dialect of a source's bytes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Persisted compact bytes.
    #[default]
    Compact,
    /// SVG markup.
    Svg,
}

impl SourceFormat {
    /// Guess from a file extension; `.svg` is markup, everything else compact.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Self::Svg,
            _ => Self::Compact,
        }
    }
}

/// Built-in sources.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// Read a file when loaded; the read runs on a short-lived helper thread.
    File {
        /// File path.
        path: PathBuf,
        /// Dialect of the file.
        format: SourceFormat,
        /// Representation to materialize.
        repr: Representation,
    },
    /// In-memory bytes; the name only helps logging, equality covers the bytes too.
    Bytes {
        /// Display name.
        name: Arc<str>,
        /// Content.
        bytes: Arc<[u8]>,
        /// Dialect of the bytes.
        format: SourceFormat,
        /// Representation to materialize.
        repr: Representation,
    },
}

impl Source {
    /// File source whose dialect is guessed from the extension.
    pub fn file(path: impl Into<PathBuf>, repr: Representation) -> Self {
        let path = path.into();
        let format = SourceFormat::from_path(&path);
        Self::File { path, format, repr }
    }

    /// In-memory source.
    pub fn bytes(
        name: &str,
        bytes: impl Into<Arc<[u8]>>,
        format: SourceFormat,
        repr: Representation,
    ) -> Self {
        Self::Bytes {
            name: Arc::from(name),
            bytes: bytes.into(),
            format,
            repr,
        }
    }
}

impl ImageSource for Source {
    fn load(&self) -> LoadFuture {
        let this = self.clone();
        async move {
            match this {
                Source::File { path, format, repr } => {
                    let data = read_off_thread(path).await?;
                    decode_source(&data, format, repr)
                }
                Source::Bytes {
                    bytes,
                    format,
                    repr,
                    ..
                } => decode_source(&bytes, format, repr),
            }
        }
        .boxed()
    }
}

/// Read a file on a helper thread so the polling executor never blocks on disk IO.
async fn read_off_thread(path: PathBuf) -> VgcResult<Vec<u8>> {
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("vgc-source-read".to_string())
        .spawn(move || {
            let res = std::fs::read(&path)
                .with_context(|| format!("read image source '{}'", path.display()));
            let _ = tx.send(res);
        })
        .context("spawn image source reader")?;
    let data = rx.await.context("image source reader exited without a result")??;
    Ok(data)
}

fn decode_source(data: &[u8], format: SourceFormat, repr: Representation) -> VgcResult<ScalableImage> {
    match format {
        SourceFormat::Compact => ScalableImage::from_bytes(data, repr),
        SourceFormat::Svg => svg_to_image(data, repr),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/source.rs"]
mod tests;
