//! Byte layout of the compact format.
//!
//! ```text
//! header   magic "VGCI" | major u16 | minor u16 | flags u8 | ext_len u16 | ext bytes
//! section  len u32 | payload            (TABLES, DOCUMENT, OPS, then any newer sections)
//! ```
//!
//! All integers are little-endian; indices and counts are LEB128 varints. Optional indices are
//! stored as `index + 1` with `0` meaning absent. Readers skip unknown trailing bytes of a
//! section and unknown trailing sections; a different major version is rejected.

use crate::foundation::error::{VgcError, VgcResult};

pub(crate) const MAGIC: [u8; 4] = *b"VGCI";
pub(crate) const MAJOR: u16 = 1;
pub(crate) const MINOR: u16 = 0;

pub(crate) const FLAG_F64: u8 = 0x01;

pub(crate) const GROUP_TRANSFORM: u8 = 0x01;
pub(crate) const GROUP_ALPHA: u8 = 0x02;
pub(crate) const GROUP_EXPORT: u8 = 0x04;

pub(crate) const PAINT_FILL: u8 = 0x01;
pub(crate) const PAINT_STROKE: u8 = 0x02;

pub(crate) const SOURCE_SOLID: u8 = 0;
pub(crate) const SOURCE_GRADIENT: u8 = 1;

/// Width of every float stored in the float-list, transform, and path tables.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FloatWidth {
    /// 32-bit floats (default, smaller files).
    #[default]
    F32,
    /// 64-bit floats for assets needing extended coordinate precision.
    F64,
}

impl FloatWidth {
    /// Round `v` to the precision this width stores.
    pub(crate) fn round(self, v: f64) -> f64 {
        match self {
            Self::F32 => f64::from(v as f32),
            Self::F64 => v,
        }
    }

    pub(crate) fn flags(self) -> u8 {
        match self {
            Self::F32 => 0,
            Self::F64 => FLAG_F64,
        }
    }

    pub(crate) fn from_flags(flags: u8) -> Self {
        if flags & FLAG_F64 != 0 {
            Self::F64
        } else {
            Self::F32
        }
    }
}

/// Parsed fixed header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Major version; must equal the reader's.
    pub major: u16,
    /// Minor version; newer minors only append fields.
    pub minor: u16,
    /// Float width of the tables.
    pub float_width: FloatWidth,
}

impl Header {
    pub(crate) fn current(float_width: FloatWidth) -> Self {
        Self {
            major: MAJOR,
            minor: MINOR,
            float_width,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Opcode {
    BeginGroup = 0x01,
    EndGroup = 0x02,
    Gradient = 0x03,
    ClipPath = 0x04,
    BeginMask = 0x05,
    MaskContent = 0x06,
    EndMask = 0x07,
    Path = 0x10,
    Rect = 0x11,
    Ellipse = 0x12,
    Poly = 0x13,
    Image = 0x14,
    Text = 0x15,
    Use = 0x16,
}

impl Opcode {
    pub(crate) fn from_u8(v: u8) -> VgcResult<Self> {
        Ok(match v {
            0x01 => Self::BeginGroup,
            0x02 => Self::EndGroup,
            0x03 => Self::Gradient,
            0x04 => Self::ClipPath,
            0x05 => Self::BeginMask,
            0x06 => Self::MaskContent,
            0x07 => Self::EndMask,
            0x10 => Self::Path,
            0x11 => Self::Rect,
            0x12 => Self::Ellipse,
            0x13 => Self::Poly,
            0x14 => Self::Image,
            0x15 => Self::Text,
            0x16 => Self::Use,
            _ => return Err(VgcError::format(format!("unknown opcode 0x{v:02x}"))),
        })
    }
}
