use crate::compact::format::{FloatWidth, Header, MAGIC, MAJOR};
use crate::foundation::error::{VgcError, VgcResult};

/// Bounds-checked little-endian cursor. Running past the end is a format error.
#[derive(Clone, Debug)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    float_width: FloatWidth,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8], float_width: FloatWidth) -> Self {
        Self {
            buf,
            pos: 0,
            float_width,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn seek(&mut self, pos: usize) -> VgcResult<()> {
        if pos > self.buf.len() {
            return Err(VgcError::format(format!("seek to {pos} past end")));
        }
        self.pos = pos;
        Ok(())
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, n: usize) -> VgcResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(VgcError::format(format!(
                "truncated stream: need {n} bytes at offset {}, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> VgcResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> VgcResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> VgcResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> VgcResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn varint(&mut self) -> VgcResult<u32> {
        let mut out = 0u32;
        for shift in (0..35).step_by(7) {
            let b = self.u8()?;
            let bits = u32::from(b & 0x7f);
            if shift == 28 && bits > 0x0f {
                return Err(VgcError::format("varint overflows u32"));
            }
            out |= bits << shift;
            if b & 0x80 == 0 {
                return Ok(out);
            }
        }
        Err(VgcError::format("varint longer than 5 bytes"))
    }

    pub(crate) fn opt_index(&mut self) -> VgcResult<Option<u32>> {
        Ok(self.varint()?.checked_sub(1))
    }

    pub(crate) fn count(&mut self) -> VgcResult<usize> {
        let n = self.varint()? as usize;
        if n > self.remaining() {
            return Err(VgcError::format(format!(
                "count {n} exceeds remaining {} bytes",
                self.remaining()
            )));
        }
        Ok(n)
    }

    pub(crate) fn float(&mut self) -> VgcResult<f64> {
        match self.float_width {
            FloatWidth::F32 => Ok(f64::from(f32::from_le_bytes(self.array()?))),
            FloatWidth::F64 => self.f64(),
        }
    }

    pub(crate) fn f64(&mut self) -> VgcResult<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    pub(crate) fn header(&mut self) -> VgcResult<Header> {
        let magic = self.take(4)?;
        if magic != MAGIC {
            return Err(VgcError::format("bad magic"));
        }
        let major = self.u16()?;
        let minor = self.u16()?;
        if major != MAJOR {
            return Err(VgcError::format(format!(
                "unsupported major version {major} (reader is {MAJOR})"
            )));
        }
        let flags = self.u8()?;
        let ext = self.u16()? as usize;
        self.take(ext)?;
        let float_width = FloatWidth::from_flags(flags);
        self.float_width = float_width;
        Ok(Header {
            major,
            minor,
            float_width,
        })
    }

    /// Split off the next `u32` length-prefixed section.
    pub(crate) fn section(&mut self, name: &str) -> VgcResult<ByteReader<'a>> {
        let len = self
            .u32()
            .map_err(|_| VgcError::format(format!("missing {name} section")))?
            as usize;
        let buf = self
            .take(len)
            .map_err(|_| VgcError::format(format!("truncated {name} section")))?;
        Ok(ByteReader::new(buf, self.float_width))
    }

    /// Note bytes left unread by this reader (fields appended by a newer minor version).
    pub(crate) fn skip_rest(&mut self, name: &str) {
        if !self.is_empty() {
            tracing::warn!(
                section = name,
                bytes = self.remaining(),
                "skipping unknown trailing bytes"
            );
            self.pos = self.buf.len();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compact/reader.rs"]
mod tests;
