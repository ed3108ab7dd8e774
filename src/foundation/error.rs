/// Convenience result type used across vgc.
pub type VgcResult<T> = Result<T, VgcError>;

/// Top-level error taxonomy used by codec, builder, transform, and cache APIs.
#[derive(thiserror::Error, Debug)]
pub enum VgcError {
    /// Bad header, version mismatch, truncated stream, or malformed call nesting.
    #[error("format error: {0}")]
    Format(String),

    /// Unresolved or cyclic references, or a missing canonical index.
    #[error("structural error: {0}")]
    Structural(String),

    /// Error reported by a markup front end, carried verbatim.
    #[error("parse error: {0}")]
    Parse(String),

    /// Cache contract violation (double release, unknown key).
    #[error("cache usage error: {0}")]
    CacheUsage(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VgcError {
    /// Build a [`VgcError::Format`] value.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Build a [`VgcError::Structural`] value.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Build a [`VgcError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`VgcError::CacheUsage`] value.
    pub fn cache_usage(msg: impl Into<String>) -> Self {
        Self::CacheUsage(msg.into())
    }

    /// Return `true` for [`VgcError::Format`].
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Return `true` for [`VgcError::Structural`].
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// Return `true` for [`VgcError::CacheUsage`].
    pub fn is_cache_usage(&self) -> bool {
        matches!(self, Self::CacheUsage(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
