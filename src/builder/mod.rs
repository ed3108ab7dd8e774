//! Builder protocol: the only coupling point between markup front ends and backends.

/// Owned calls, recording and replay.
pub mod call;
pub(crate) mod check;
/// The [`ImageBuilder`] trait and its init tables.
pub mod protocol;

pub use call::{BuilderCall, Recorder, replay_calls};
pub use protocol::{ImageBuilder, InitTables};
