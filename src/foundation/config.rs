use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;

use crate::cache::cache::ImageCacheOpts;
use crate::compact::encode::EncodeOpts;
use crate::foundation::error::{VgcError, VgcResult};
use crate::graph::builder::GraphBuildOpts;
use crate::viewport::prune::PruneOpts;

/// All tunables of the crate, loadable from one JSON document.
///
/// Missing sections and fields fall back to their defaults, so `{}` is a valid config.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VgcConfig {
    /// Compact encoder settings.
    pub encode: EncodeOpts,
    /// Graph builder settings.
    pub graph: GraphBuildOpts,
    /// Viewport transform settings.
    pub prune: PruneOpts,
    /// Image cache settings.
    pub cache: ImageCacheOpts,
}

impl VgcConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> VgcResult<Self> {
        serde_json::from_reader(r).map_err(|e| VgcError::parse(format!("parse vgc config JSON: {e}")))
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(s: &str) -> VgcResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> VgcResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open vgc config '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
