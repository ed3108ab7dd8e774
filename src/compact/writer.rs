use crate::compact::format::{FloatWidth, Header, MAGIC};
use crate::foundation::error::{VgcError, VgcResult};

/// Append-only little-endian byte sink.
#[derive(Debug)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
    float_width: FloatWidth,
}

impl ByteWriter {
    pub(crate) fn new(float_width: FloatWidth) -> Self {
        Self {
            buf: Vec::new(),
            float_width,
        }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn varint(&mut self, mut v: u32) {
        while v >= 0x80 {
            self.buf.push((v as u8 & 0x7f) | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    pub(crate) fn opt_index(&mut self, v: Option<u32>) {
        self.varint(v.map_or(0, |i| i + 1));
    }

    pub(crate) fn len_prefix(&mut self, n: usize) -> VgcResult<()> {
        self.varint(fit_u32(n)?);
        Ok(())
    }

    /// Float at the table width.
    pub(crate) fn float(&mut self, v: f64) {
        match self.float_width {
            FloatWidth::F32 => self.buf.extend_from_slice(&(v as f32).to_le_bytes()),
            FloatWidth::F64 => self.f64(v),
        }
    }

    pub(crate) fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    pub(crate) fn header(&mut self, h: Header) {
        self.bytes(&MAGIC);
        self.u16(h.major);
        self.u16(h.minor);
        self.u8(h.float_width.flags());
        self.u16(0);
    }

    /// Write a `u32` length-prefixed section whose payload is produced by `body`.
    pub(crate) fn section(
        &mut self,
        body: impl FnOnce(&mut Self) -> VgcResult<()>,
    ) -> VgcResult<()> {
        let at = self.buf.len();
        self.u32(0);
        body(self)?;
        let len = fit_u32(self.buf.len() - at - 4)?;
        self.buf[at..at + 4].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }
}

fn fit_u32(n: usize) -> VgcResult<u32> {
    u32::try_from(n).map_err(|_| VgcError::format(format!("length {n} exceeds the u32 range")))
}
