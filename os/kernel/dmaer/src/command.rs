use crate::DmaError;
use dmaer_info::ioctl::{DMA_KICK, DMA_PREPARE, DMA_PREPARE_KICK, DMA_WAIT_ALL, DMA_WAIT_ONE};

/// Commands accepted on an open device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Translate the chain whose head is at the argument.
    Prepare,
    /// Start the engine on the already translated block at the argument.
    Kick,
    /// [`Prepare`](Self::Prepare), then [`Kick`](Self::Kick) with the
    /// translation cache still warm.
    PrepareThenKick,
    WaitOne,
    WaitAll,
}

impl Command {
    /// The command's number.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::Prepare => DMA_PREPARE,
            Self::Kick => DMA_KICK,
            Self::PrepareThenKick => DMA_PREPARE_KICK,
            Self::WaitOne => DMA_WAIT_ONE,
            Self::WaitAll => DMA_WAIT_ALL,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = DmaError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            DMA_PREPARE => Ok(Self::Prepare),
            DMA_KICK => Ok(Self::Kick),
            DMA_PREPARE_KICK => Ok(Self::PrepareThenKick),
            DMA_WAIT_ONE => Ok(Self::WaitOne),
            DMA_WAIT_ALL => Ok(Self::WaitAll),
            other => Err(DmaError::UnknownCommand(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_decode_to_their_command() {
        for cmd in [
            Command::Prepare,
            Command::Kick,
            Command::PrepareThenKick,
            Command::WaitOne,
            Command::WaitAll,
        ] {
            assert_eq!(Command::try_from(cmd.number()), Ok(cmd));
        }
    }

    #[test]
    fn unknown_numbers_are_rejected() {
        // right number, wrong direction bits
        assert_eq!(
            Command::try_from(0x0000_dd00),
            Err(DmaError::UnknownCommand(0x0000_dd00))
        );
        assert!(Command::try_from(0x4004_dd05).is_err());
    }
}
