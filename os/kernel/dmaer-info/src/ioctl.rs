//! # Command Numbering
//!
//! Commands follow the Linux `_IOW`/`_IO` encoding with the driver's magic
//! byte. The argument of every `_IOW` command is a user pointer, which is four
//! bytes wide on the target.

/// Magic byte identifying this driver's commands.
pub const DMA_MAGIC: u8 = 0xdd;

/// Width of the user pointer argument carried by `_IOW` commands.
pub const USER_POINTER_SIZE: u32 = 4;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_NONE: u32 = 0;
const IOC_WRITE: u32 = 1;

#[allow(clippy::cast_lossless)]
const fn ioc(dir: u32, nr: u8, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT)
        | (size << IOC_SIZESHIFT)
        | ((DMA_MAGIC as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

/// `_IO(DMA_MAGIC, nr)`
#[must_use]
pub const fn io(nr: u8) -> u32 {
    ioc(IOC_NONE, nr, 0)
}

/// `_IOW(DMA_MAGIC, nr, void *)`
#[must_use]
pub const fn iow(nr: u8) -> u32 {
    ioc(IOC_WRITE, nr, USER_POINTER_SIZE)
}

/// Translate the chain starting at the argument.
pub const DMA_PREPARE: u32 = iow(0);

/// Start the engine on an already translated chain.
pub const DMA_KICK: u32 = iow(1);

/// Translate, then start without resetting the translation cache.
pub const DMA_PREPARE_KICK: u32 = iow(2);

/// Reserved; currently completes immediately.
pub const DMA_WAIT_ONE: u32 = iow(3);

/// Reserved; currently completes immediately.
pub const DMA_WAIT_ALL: u32 = io(4);
