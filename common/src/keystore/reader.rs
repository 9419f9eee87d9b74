//! Big-endian cursor over an in-memory key-store body.

use super::error::{KeyStoreError, Result};

pub(super) struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub(super) const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(super) const fn offset(&self) -> usize {
        self.offset
    }

    pub(super) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.bytes.len().saturating_sub(self.offset);
        if len > remaining {
            return Err(KeyStoreError::Truncated {
                offset: self.offset,
                needed: len - remaining,
            });
        }
        let start = self.offset;
        self.offset += len;
        self.bytes
            .get(start..self.offset)
            .ok_or(KeyStoreError::Truncated {
                offset: start,
                needed: len,
            })
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub(super) fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_be_bytes)
    }

    pub(super) fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_be_bytes)
    }

    pub(super) fn u64(&mut self) -> Result<u64> {
        self.array().map(u64::from_be_bytes)
    }

    /// Length-prefixed (`u16`) UTF-8 string, as Java's `writeUTF` emits.
    pub(super) fn utf(&mut self, index: u32) -> Result<String> {
        let len = usize::from(self.u16()?);
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| KeyStoreError::InvalidString { index })
    }

    /// Length-prefixed (`u32`) byte blob.
    pub(super) fn blob(&mut self) -> Result<Vec<u8>> {
        // A length that does not fit in usize cannot be satisfied either.
        let len = usize::try_from(self.u32()?).unwrap_or(usize::MAX);
        self.take(len).map(<[u8]>::to_vec)
    }
}
