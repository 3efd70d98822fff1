//! # Chain Translation
//!
//! Walks a chain of control blocks that lives in the caller's memory and
//! rewrites each block in place from virtual to bus form.
//!
//! The walk follows the *original* virtual next pointers, so it keeps
//! working after the block it just left has been overwritten with bus
//! addresses. It stops at the first failure and leaves every block before
//! it rewritten; such a chain is good for one kick at most.

use crate::descriptor::CONTROL_BLOCK_BYTES;
use crate::{ControlBlock, DmaError, TranslationCache};
use dmaer_addresses::VirtualAddress;
use dmaer_pager::UserMemory;

/// Rewrite the block at `at` and return where the chain continues.
///
/// The returned address is the block's virtual next pointer as the caller
/// wrote it, null at the end of the chain.
///
/// # Errors
/// - [`DmaError::InvalidDescriptor`] for a null source or destination.
/// - [`DmaError::Unmapped`] if the block or an address in it is not mapped.
/// - [`DmaError::Fault`] for any other failure to reach user memory,
///   running out of pages included.
pub fn translate_block<M>(
    cache: &mut TranslationCache,
    mem: &M,
    at: VirtualAddress,
) -> Result<VirtualAddress, DmaError>
where
    M: UserMemory + ?Sized,
{
    let mut raw = [0; CONTROL_BLOCK_BYTES];
    mem.copy_from_user(at, &mut raw).map_err(DmaError::in_chain)?;
    let block = ControlBlock::from_bytes(&raw);
    let next = block.next();

    let bus = block
        .translate(|va| cache.lookup(va, mem).map_err(DmaError::in_chain))
        .inspect_err(|e| log::error!("control block at {at}: {e}"))?;

    mem.copy_to_user(at, &bus.to_bytes()?).map_err(DmaError::in_chain)?;
    log::trace!("control block at {at} rewritten, next {next}");
    Ok(next)
}

/// Rewrite the whole chain starting at `head`.
///
/// Returns the number of blocks rewritten. A null head rewrites nothing.
/// The chain is not checked for cycles.
///
/// # Errors
/// The first error from [`translate_block`]; blocks before the failing one
/// stay rewritten.
pub fn translate_chain<M>(
    cache: &mut TranslationCache,
    mem: &M,
    head: VirtualAddress,
) -> Result<usize, DmaError>
where
    M: UserMemory + ?Sized,
{
    let mut steps = 0;
    let mut at = head;
    while !at.is_null() {
        at = translate_block(cache, mem, at)?;
        steps += 1;
    }
    Ok(steps)
}
