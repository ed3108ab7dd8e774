/// Index into the image table supplied by `init`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ImageId(pub u32);

/// Index into the string table supplied by `init`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct StringId(pub u32);

/// Index into the float-list table supplied by `init`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct FloatListId(pub u32);

/// Canonical index returned by gradient registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct GradientId(pub u32);

impl GradientId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
