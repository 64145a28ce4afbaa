//! Bit-level codec for storage records and message bodies.
//!
//! Values are written MSB first into a byte buffer, the last byte is padded
//! with zero bits. Readers consume the same layout and refuse anything left
//! over except that padding.

use cosmwasm_std::{Binary, CanonicalAddr, StdError, Uint128, Uint256};
use thiserror::Error;

/// `coins` stores its byte length in 4 bits, so 15 bytes is the widest amount.
const COINS_LEN_BITS: u32 = 4;
const COINS_MAX_BYTES: usize = 15;
const ADDRESS_LEN_BITS: u32 = 8;

#[derive(Error, Debug, PartialEq)]
pub enum CellError {
    #[error("cell underflow: needed {needed} bits, {remaining} remaining")]
    Underflow { needed: usize, remaining: usize },

    #[error("unsigned integer field wider than 64 bits: {bits}")]
    FieldTooWide { bits: u32 },

    #[error("value {value} does not fit in {bits} bits")]
    ValueTooLarge { value: u64, bits: u32 },

    #[error("amount {0} does not fit in coins encoding")]
    CoinsOverflow(Uint128),

    #[error("address is empty")]
    EmptyAddress {},

    #[error("address of {len} bytes is too long")]
    AddressTooLong { len: usize },

    #[error("{bits} unread bits after the last field")]
    TrailingData { bits: usize },
}

impl From<CellError> for StdError {
    fn from(err: CellError) -> Self {
        StdError::generic_err(err.to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellBuilder {
    data: Vec<u8>,
    bits: usize,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bits
    }

    pub fn store_bit(&mut self, bit: bool) -> &mut Self {
        if self.bits % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[self.bits / 8] |= 0x80 >> (self.bits % 8);
        }
        self.bits += 1;
        self
    }

    /// Stores `value` in exactly `bits` bits, big-endian.
    pub fn store_uint(&mut self, value: u64, bits: u32) -> Result<&mut Self, CellError> {
        if bits > 64 {
            return Err(CellError::FieldTooWide { bits });
        }
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::ValueTooLarge { value, bits });
        }
        for i in (0..bits).rev() {
            self.store_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        if self.bits % 8 == 0 {
            self.data.extend_from_slice(bytes);
            self.bits += bytes.len() * 8;
        } else {
            for byte in bytes {
                for i in (0..8).rev() {
                    self.store_bit((byte >> i) & 1 == 1);
                }
            }
        }
        self
    }

    pub fn store_uint256(&mut self, value: Uint256) -> &mut Self {
        self.store_bytes(&value.to_be_bytes())
    }

    /// `len:4 ∥ value:(8·len)` with the shortest length that holds `amount`.
    pub fn store_coins(&mut self, amount: Uint128) -> Result<&mut Self, CellError> {
        let bytes = amount.u128().to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        let len = bytes.len() - skip;
        if len > COINS_MAX_BYTES {
            return Err(CellError::CoinsOverflow(amount));
        }
        self.store_uint(len as u64, COINS_LEN_BITS)?;
        Ok(self.store_bytes(&bytes[skip..]))
    }

    /// `len:8 ∥ canonical bytes`.
    pub fn store_address(&mut self, addr: &CanonicalAddr) -> Result<&mut Self, CellError> {
        let bytes = addr.as_slice();
        match bytes.len() {
            0 => Err(CellError::EmptyAddress {}),
            len if len > u8::MAX as usize => Err(CellError::AddressTooLong { len }),
            len => {
                self.store_uint(len as u64, ADDRESS_LEN_BITS)?;
                Ok(self.store_bytes(bytes))
            }
        }
    }

    pub fn build(self) -> Binary {
        Binary::new(self.data)
    }
}

#[derive(Clone, Debug)]
pub struct CellSlice<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        CellSlice { data, pos: 0 }
    }

    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// True once only zero padding of the final byte is left.
    pub fn is_exhausted(&self) -> bool {
        let remaining = self.remaining_bits();
        remaining < 8 && (remaining == 0 || self.peek_padding_is_zero())
    }

    fn peek_padding_is_zero(&self) -> bool {
        let byte = self.data[self.pos / 8];
        let mask = 0xffu8 >> (self.pos % 8);
        byte & mask == 0
    }

    fn ensure(&self, needed: usize) -> Result<(), CellError> {
        let remaining = self.remaining_bits();
        if remaining < needed {
            Err(CellError::Underflow { needed, remaining })
        } else {
            Ok(())
        }
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        self.ensure(1)?;
        let bit = self.data[self.pos / 8] & (0x80 >> (self.pos % 8)) != 0;
        self.pos += 1;
        Ok(bit)
    }

    pub fn load_uint(&mut self, bits: u32) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::FieldTooWide { bits });
        }
        self.ensure(bits as usize)?;
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | self.load_bit()? as u64;
        }
        Ok(value)
    }

    pub fn load_bytes(&mut self, len: usize) -> Result<Vec<u8>, CellError> {
        self.ensure(len * 8)?;
        if self.pos % 8 == 0 {
            let start = self.pos / 8;
            self.pos += len * 8;
            return Ok(self.data[start..start + len].to_vec());
        }
        (0..len).map(|_| self.load_uint(8).map(|b| b as u8)).collect()
    }

    pub fn load_uint256(&mut self) -> Result<Uint256, CellError> {
        let bytes = self.load_bytes(32)?;
        let mut raw = [0u8; 32];
        raw.copy_from_slice(&bytes);
        Ok(Uint256::from_be_bytes(raw))
    }

    pub fn load_coins(&mut self) -> Result<Uint128, CellError> {
        let len = self.load_uint(COINS_LEN_BITS)? as usize;
        let amount = self
            .load_bytes(len)?
            .into_iter()
            .fold(0u128, |acc, b| (acc << 8) | b as u128);
        Ok(Uint128::new(amount))
    }

    pub fn load_address(&mut self) -> Result<CanonicalAddr, CellError> {
        let len = self.load_uint(ADDRESS_LEN_BITS)? as usize;
        if len == 0 {
            return Err(CellError::EmptyAddress {});
        }
        Ok(CanonicalAddr::from(self.load_bytes(len)?))
    }

    /// Consumes the slice, failing if anything but zero padding is left.
    pub fn end_parse(self) -> Result<(), CellError> {
        if self.is_exhausted() {
            Ok(())
        } else {
            Err(CellError::TrailingData {
                bits: self.remaining_bits(),
            })
        }
    }
}
