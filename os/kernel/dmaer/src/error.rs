use crate::DescriptorError;
use dmaer_addresses::VirtualAddress;
use dmaer_pager::PagerError;

/// Error numbers reported across the command boundary.
pub mod errno {
    pub const EIO: i32 = 5;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EBUSY: i32 = 16;
    pub const EINVAL: i32 = 22;
    pub const ETIMEDOUT: i32 = 110;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DmaError {
    #[error("device is already open")]
    Busy,
    #[error("invalid control block: {0}")]
    InvalidDescriptor(#[from] DescriptorError),
    #[error("address {0} is not mapped")]
    Unmapped(VirtualAddress),
    #[error("user memory fault: {0}")]
    Fault(PagerError),
    #[error("out of memory")]
    OutOfMemory,
    #[error("channel still active after {polls} status reads")]
    Timeout { polls: u32 },
    #[error("unknown command {0:#010x}")]
    UnknownCommand(u32),
    #[error("operation not supported")]
    Io,
}

impl DmaError {
    /// The coarse error number for this error.
    ///
    /// Everything that goes wrong while translating or starting a chain
    /// collapses into `EFAULT`.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Self::Busy => errno::EBUSY,
            Self::InvalidDescriptor(_) | Self::Unmapped(_) | Self::Fault(_) => errno::EFAULT,
            Self::OutOfMemory => errno::ENOMEM,
            Self::Timeout { .. } => errno::ETIMEDOUT,
            Self::UnknownCommand(_) => errno::EINVAL,
            Self::Io => errno::EIO,
        }
    }

    /// A pager error met while translating or starting a chain.
    ///
    /// Unlike the plain conversion, running out of memory here is a
    /// [`DmaError::Fault`], so it reports `EFAULT` like every other
    /// translation failure. `ENOMEM` stays reserved for mapping.
    #[must_use]
    pub const fn in_chain(error: PagerError) -> Self {
        match error {
            PagerError::Unmapped(va) => Self::Unmapped(va),
            other => Self::Fault(other),
        }
    }
}

impl From<PagerError> for DmaError {
    fn from(value: PagerError) -> Self {
        match value {
            PagerError::OutOfMemory => Self::OutOfMemory,
            PagerError::Unmapped(va) => Self::Unmapped(va),
            other => Self::Fault(other),
        }
    }
}
