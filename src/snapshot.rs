//! Snapshot engine (C2): parallel bulk capture of a target's read-write
//! memory into owned buffers.
//!
//! One ephemeral thread pool per capture, joined before returning — the
//! same shape the teacher uses for its debug-session I/O threads
//! (`debugger.rs`) and its signal-handling daemon thread (`signals.rs`):
//! spawn what's needed, join it, no persistent pool to keep alive between
//! captures.

use crate::error::TargetError;
use crate::target::{self, VmaDescriptor};
use nix::unistd::Pid;
use std::thread;

/// Bytes read per `process_vm_readv` call within one region. Chunking is
/// mandatory: a single read spanning a very large region frequently fails
/// atomically even when a prefix of it is readable (spec §4.2 step 4).
const CHUNK_SIZE: usize = 64 * 1024;

/// One captured VMA: base address, nominal length, and the bytes actually
/// read. `data` is `None` when nothing at all could be read (§3: "a region
/// whose capture produced zero bytes ... omitted" — this implementation
/// represents that case as `None` rather than an empty `Vec`).
#[derive(Debug, Clone)]
pub struct SnapshotRegion {
    pub base: u64,
    pub len: usize,
    pub data: Option<Vec<u8>>,
}

impl SnapshotRegion {
    /// Bytes available for scanning/diffing, or an empty slice if this
    /// region has no data.
    pub fn bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// An ordered capture of a target's read-write memory. Region base
/// addresses are unique within a snapshot (procfs can't repeat a base);
/// order is not semantically meaningful to callers.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub regions: Vec<SnapshotRegion>,
}

impl Snapshot {
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

/// Capture a fresh snapshot of `pid`'s read-write memory.
///
/// Algorithm (spec §4.2):
/// 1. enumerate VMAs
/// 2. keep only regions that are both readable and writable (deliberately
///    excluding execute-only pages — this tool finds and mutates data)
/// 3. partition the survivors across `min(online_cpus, region_count)`
///    worker threads (at least one), by contiguous index range, last
///    thread taking the remainder
/// 4. each worker reads its regions in 64 KiB chunks into a
///    zero-initialised buffer the size of the region
pub fn capture(pid: Pid) -> Result<Snapshot, TargetError> {
    let vmas = target::list_vmas(pid)?;
    let writable: Vec<VmaDescriptor> = vmas
        .into_iter()
        .filter(|v| v.is_readable() && v.is_writable())
        .collect();

    if writable.is_empty() {
        return Ok(Snapshot::default());
    }

    let worker_count = num_cpus::get().min(writable.len()).max(1);
    let mut regions: Vec<SnapshotRegion> = writable
        .iter()
        .map(|v| SnapshotRegion {
            base: v.start,
            len: v.len(),
            data: None,
        })
        .collect();

    // Contiguous index-range partition; the last chunk absorbs any
    // remainder so every region is covered exactly once.
    let chunk_len = writable.len().div_ceil(worker_count);

    thread::scope(|scope| {
        let vma_chunks = writable.chunks(chunk_len);
        let region_chunks = regions.chunks_mut(chunk_len);

        for (vma_chunk, region_chunk) in vma_chunks.zip(region_chunks) {
            scope.spawn(move || {
                for (vma, region) in vma_chunk.iter().zip(region_chunk.iter_mut()) {
                    region.data = capture_region(pid, vma);
                }
            });
        }
    });

    Ok(Snapshot { regions })
}

/// Capture one region in 64 KiB chunks, tolerating gaps.
///
/// Per-chunk policy (spec §4.2 step 5): a positive read keeps its bytes in
/// place (the buffer is already zero-initialised and positioned at that
/// offset). A short positive read ends the region's loop — treated as the
/// end of the readable range. A zero-or-error return leaves that chunk
/// zeroed and moves on to the next chunk rather than aborting the region.
fn capture_region(pid: Pid, vma: &VmaDescriptor) -> Option<Vec<u8>> {
    let len = vma.len();
    if len == 0 {
        return None;
    }

    let mut buf = vec![0u8; len];
    let mut offset = 0usize;
    let mut any_read = false;

    while offset < len {
        let want = CHUNK_SIZE.min(len - offset);
        let addr = vma.start + offset as u64;

        match target::probe_read(pid, addr, &mut buf[offset..offset + want]) {
            Ok(got) if got > 0 => {
                any_read = true;
                if got < want {
                    // Short positive read: end of readable range.
                    break;
                }
                offset += got;
            }
            _ => {
                // Nothing read this chunk; leave it zeroed, try the next.
                offset += want;
            }
        }
    }

    any_read.then_some(buf)
}
