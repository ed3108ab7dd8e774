use xxhash_rust::xxh3::xxh3_64_with_seed;

const KEY_SEED: u64 = 0x5f1d_2c4b_93a7_e016;

/// Scratch buffer holding the canonical byte key of one value.
///
/// Floats contribute their bit patterns, so `0.0` and `-0.0` are distinct keys while every
/// NaN payload is equal to itself.
#[derive(Debug, Default)]
pub(crate) struct KeyWriter {
    buf: Vec<u8>,
}

impl KeyWriter {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_len(&mut self, n: usize) {
        self.write_u64(n as u64);
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub(crate) fn write_f64s(&mut self, vs: &[f64]) {
        self.write_len(vs.len());
        for &v in vs {
            self.write_f64(v);
        }
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.write_bytes(s.as_bytes());
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn digest(&self) -> u64 {
        xxh3_64_with_seed(&self.buf, KEY_SEED)
    }
}

/// Values that can be canonicalized: structural equality is equality of the written key.
pub(crate) trait StructuralKey {
    fn write_key(&self, w: &mut KeyWriter);
}

impl StructuralKey for str {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_str(self);
    }
}

impl StructuralKey for u64 {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_u64(*self);
    }
}

impl StructuralKey for [f64] {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_f64s(self);
    }
}

impl StructuralKey for kurbo::Affine {
    fn write_key(&self, w: &mut KeyWriter) {
        for c in self.as_coeffs() {
            w.write_f64(c);
        }
    }
}

impl<T: StructuralKey + ?Sized> StructuralKey for std::sync::Arc<T> {
    fn write_key(&self, w: &mut KeyWriter) {
        (**self).write_key(w);
    }
}

impl<T: StructuralKey> StructuralKey for Option<T> {
    fn write_key(&self, w: &mut KeyWriter) {
        match self {
            Some(v) => {
                w.write_u8(1);
                v.write_key(w);
            }
            None => w.write_u8(0),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/hash.rs"]
mod tests;
