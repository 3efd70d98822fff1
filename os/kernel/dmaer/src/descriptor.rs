//! # Control Blocks
//!
//! A control block describes one block copy and points at the next one. The
//! engine reads it from memory as eight little-endian words:
//!
//! | Word | Field |
//! |------|-------|
//! | 0 | `TI`, [`TransferInformation`] |
//! | 1 | `SOURCE_AD` |
//! | 2 | `DEST_AD` |
//! | 3 | `TXFR_LEN` |
//! | 4 | `STRIDE` (unused, [`STRIDE_UNUSED`]) |
//! | 5 | `NEXTCONBK`, `0` ends the chain |
//! | 6, 7 | reserved |
//!
//! The caller writes [`ControlBlock`]s holding its own virtual addresses.
//! The engine needs [`BusControlBlock`]s. [`ControlBlock::translate`] is the
//! only way from one to the other, and it consumes the virtual block: once a
//! block has been rewritten in bus form nothing may read its addresses as
//! virtual ones again.

use dmaer_addresses::{BusAddress, VirtualAddress};
use dmaer_info::memory::MAX_TRANSFER_LENGTH;
use dmaer_registers::TransferInformation;

/// Size of one control block in memory.
pub const CONTROL_BLOCK_BYTES: usize = 32;

/// `STRIDE` value for linear (non-2D) transfers.
pub const STRIDE_UNUSED: u32 = 0xffff_ffff;

const WORDS: usize = CONTROL_BLOCK_BYTES / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("source or destination address is null")]
    NullAddress,
    #[error("transfer length {0} is outside 1..=0x3fffffff")]
    InvalidLength(u32),
    #[error("address {0:#x} does not fit in 32 bits")]
    AddressTooWide(u64),
}

/// A control block as the caller lays it out, with virtual addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBlock {
    ti: TransferInformation,
    source: VirtualAddress,
    destination: VirtualAddress,
    length: u32,
    stride: u32,
    next: VirtualAddress,
    reserved: [u32; 2],
}

impl ControlBlock {
    /// A block with the given fields, a null next pointer and no checks.
    ///
    /// Prefer [`copy_linear`](Self::copy_linear) for memory-to-memory copies.
    #[must_use]
    pub const fn new(
        ti: TransferInformation,
        source: VirtualAddress,
        destination: VirtualAddress,
        length: u32,
    ) -> Self {
        Self {
            ti,
            source,
            destination,
            length,
            stride: STRIDE_UNUSED,
            next: VirtualAddress::zero(),
            reserved: [0; 2],
        }
    }

    /// Copy `length` bytes from `source` to `destination`.
    ///
    /// With `src_increment` unset the engine keeps re-reading the first
    /// source unit, which fills the destination instead.
    ///
    /// A range that crosses a page boundary is accepted but logged: the
    /// pages behind it are almost never contiguous on the bus.
    ///
    /// # Errors
    /// - [`DescriptorError::NullAddress`] if either address is null.
    /// - [`DescriptorError::InvalidLength`] unless `1 <= length <= 0x3fffffff`.
    pub fn copy_linear(
        destination: VirtualAddress,
        source: VirtualAddress,
        length: u32,
        src_increment: bool,
    ) -> Result<Self, DescriptorError> {
        if source.is_null() || destination.is_null() {
            return Err(DescriptorError::NullAddress);
        }
        if length == 0 || length > MAX_TRANSFER_LENGTH {
            return Err(DescriptorError::InvalidLength(length));
        }

        if src_increment {
            warn_straddle("source", source, length);
        }
        warn_straddle("destination", destination, length);

        Ok(Self::new(
            TransferInformation::memory_copy(src_increment),
            source,
            destination,
            length,
        ))
    }

    /// The same block, continuing at `next`.
    #[must_use]
    pub const fn with_next(mut self, next: VirtualAddress) -> Self {
        self.next = next;
        self
    }

    #[inline]
    #[must_use]
    pub const fn transfer_information(&self) -> TransferInformation {
        self.ti
    }

    #[inline]
    #[must_use]
    pub const fn source(&self) -> VirtualAddress {
        self.source
    }

    #[inline]
    #[must_use]
    pub const fn destination(&self) -> VirtualAddress {
        self.destination
    }

    #[inline]
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Where the next block lives; null ends the chain.
    #[inline]
    #[must_use]
    pub const fn next(&self) -> VirtualAddress {
        self.next
    }

    /// Decode a block from its in-memory form.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; CONTROL_BLOCK_BYTES]) -> Self {
        let w = decode_words(bytes);
        Self {
            ti: TransferInformation::from_bits(w[0]),
            source: VirtualAddress::new(u64::from(w[1])),
            destination: VirtualAddress::new(u64::from(w[2])),
            length: w[3],
            stride: w[4],
            next: VirtualAddress::new(u64::from(w[5])),
            reserved: [w[6], w[7]],
        }
    }

    /// Encode the block in its in-memory form.
    ///
    /// # Errors
    /// [`DescriptorError::AddressTooWide`] if an address needs more than
    /// 32 bits.
    pub fn to_bytes(&self) -> Result<[u8; CONTROL_BLOCK_BYTES], DescriptorError> {
        Ok(encode_words([
            self.ti.into_bits(),
            narrow(self.source.as_u64())?,
            narrow(self.destination.as_u64())?,
            self.length,
            self.stride,
            narrow(self.next.as_u64())?,
            self.reserved[0],
            self.reserved[1],
        ]))
    }

    /// Rewrite every address into bus form.
    ///
    /// `resolve` maps a virtual address to the bus address the engine must
    /// use for it. The next pointer is resolved as an address in its own
    /// right (the location of the next block), and only when it is set.
    ///
    /// # Errors
    /// [`DescriptorError::NullAddress`] before anything is resolved if the
    /// source or destination is null, otherwise the first error `resolve`
    /// returns.
    pub fn translate<E, F>(self, mut resolve: F) -> Result<BusControlBlock, E>
    where
        E: From<DescriptorError>,
        F: FnMut(VirtualAddress) -> Result<BusAddress, E>,
    {
        if self.source.is_null() || self.destination.is_null() {
            return Err(DescriptorError::NullAddress.into());
        }

        let source = resolve(self.source)?;
        let destination = resolve(self.destination)?;
        let next = if self.next.is_null() {
            BusAddress::zero()
        } else {
            resolve(self.next)?
        };

        Ok(BusControlBlock {
            ti: self.ti,
            source,
            destination,
            length: self.length,
            stride: self.stride,
            next,
            reserved: self.reserved,
        })
    }
}

/// A control block as the engine reads it, with bus addresses.
///
/// There is no way back to a [`ControlBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusControlBlock {
    ti: TransferInformation,
    source: BusAddress,
    destination: BusAddress,
    length: u32,
    stride: u32,
    next: BusAddress,
    reserved: [u32; 2],
}

impl BusControlBlock {
    #[inline]
    #[must_use]
    pub const fn transfer_information(&self) -> TransferInformation {
        self.ti
    }

    #[inline]
    #[must_use]
    pub const fn source(&self) -> BusAddress {
        self.source
    }

    #[inline]
    #[must_use]
    pub const fn destination(&self) -> BusAddress {
        self.destination
    }

    #[inline]
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Bus address of the next block, `None` at the end of the chain.
    #[inline]
    #[must_use]
    pub const fn next(&self) -> Option<BusAddress> {
        if self.next.is_null() {
            None
        } else {
            Some(self.next)
        }
    }

    /// Decode a block the way the engine reads it from bus memory.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; CONTROL_BLOCK_BYTES]) -> Self {
        let w = decode_words(bytes);
        Self {
            ti: TransferInformation::from_bits(w[0]),
            source: BusAddress::from(w[1]),
            destination: BusAddress::from(w[2]),
            length: w[3],
            stride: w[4],
            next: BusAddress::from(w[5]),
            reserved: [w[6], w[7]],
        }
    }

    /// # Errors
    /// [`DescriptorError::AddressTooWide`] if a bus address needs more than
    /// 32 bits.
    pub fn to_bytes(&self) -> Result<[u8; CONTROL_BLOCK_BYTES], DescriptorError> {
        Ok(encode_words([
            self.ti.into_bits(),
            narrow(self.source.as_u64())?,
            narrow(self.destination.as_u64())?,
            self.length,
            self.stride,
            narrow(self.next.as_u64())?,
            self.reserved[0],
            self.reserved[1],
        ]))
    }
}

fn narrow(addr: u64) -> Result<u32, DescriptorError> {
    u32::try_from(addr).map_err(|_| DescriptorError::AddressTooWide(addr))
}

fn decode_words(bytes: &[u8; CONTROL_BLOCK_BYTES]) -> [u32; WORDS] {
    core::array::from_fn(|i| {
        let b = &bytes[i * 4..];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    })
}

fn encode_words(words: [u32; WORDS]) -> [u8; CONTROL_BLOCK_BYTES] {
    let mut bytes = [0; CONTROL_BLOCK_BYTES];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

fn warn_straddle(what: &str, start: VirtualAddress, length: u32) {
    match start.pages_spanned(u64::from(length)) {
        0 | 1 => {}
        2 => log::warn!("{what} {start} +{length:#x} straddles a page boundary"),
        n => log::warn!("{what} {start} +{length:#x} straddles {} page boundaries", n - 1),
    }
}
