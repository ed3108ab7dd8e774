//! Canonicalization tables: structurally equal values share one index.

pub(crate) mod table;
pub(crate) mod tables;
