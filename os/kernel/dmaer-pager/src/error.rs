use dmaer_addresses::VirtualAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PagerError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("mapping has no session")]
    NoSession,
    #[error("address {0} is not mapped")]
    Unmapped(VirtualAddress),
    #[error("mapping start {0} is not page aligned")]
    Misaligned(VirtualAddress),
    #[error("mapping is empty")]
    EmptyMapping,
    #[error("mapping of {len:#x} bytes at {start} runs past the end of the address space")]
    TooLarge { start: VirtualAddress, len: u64 },
}
