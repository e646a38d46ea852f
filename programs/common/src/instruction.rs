//! Instruction data deserialization helpers
//!
//! Cursor-style reader over raw instruction bytes. All reads are bounds
//! checked and fail with `InvalidInstruction`; nothing panics on
//! truncated input.

use crate::error::CascadeError;

pub struct InstructionReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> InstructionReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn read_u8(&mut self) -> Result<u8, CascadeError> {
        let b = *self
            .data
            .get(self.offset)
            .ok_or(CascadeError::InvalidInstruction)?;
        self.offset += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16, CascadeError> {
        Ok(u16::from_le_bytes(self.read_bytes::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CascadeError> {
        Ok(u32::from_le_bytes(self.read_bytes::<4>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CascadeError> {
        Ok(u64::from_le_bytes(self.read_bytes::<8>()?))
    }

    pub fn read_u128(&mut self) -> Result<u128, CascadeError> {
        Ok(u128::from_le_bytes(self.read_bytes::<16>()?))
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], CascadeError> {
        let end = self
            .offset
            .checked_add(N)
            .ok_or(CascadeError::InvalidInstruction)?;
        if end > self.data.len() {
            return Err(CascadeError::InvalidInstruction);
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.offset..end]);
        self.offset = end;
        Ok(out)
    }
}
