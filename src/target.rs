//! Target accessor (C1): VMA enumeration and cross-process read/write
//! primitives against a live PID via `/proc/<pid>/maps` and
//! `process_vm_readv`/`process_vm_writev`.

use crate::error::TargetError;
use nix::sys::signal::kill;
use nix::sys::uio::{process_vm_readv, process_vm_writev, RemoteIoVec};
use nix::unistd::Pid;
use std::fs;
use std::io::{self, IoSlice, IoSliceMut};

/// One line of `/proc/<pid>/maps`, parsed.
///
/// VMAs are transient: owned by the caller only long enough to filter and
/// partition them (C2 §4.2 step 2-3); they carry no buffers of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmaDescriptor {
    /// Inclusive start address.
    pub start: u64,
    /// Exclusive end address.
    pub end: u64,
    /// Four-character permission string, e.g. `"rw-p"`.
    pub perms: String,
    /// Backing path, or a pseudo-name like `[heap]`/`[stack]`, or empty for
    /// an anonymous mapping.
    pub path: String,
}

impl VmaDescriptor {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if the permission string carries `r`.
    pub fn is_readable(&self) -> bool {
        self.perms.contains('r')
    }

    /// `true` if the permission string carries `w`.
    pub fn is_writable(&self) -> bool {
        self.perms.contains('w')
    }
}

/// Enumerate the VMAs of `pid` by reading and parsing `/proc/<pid>/maps`.
///
/// Lines that can't be parsed to at least a start-end range and a
/// permission string are skipped rather than aborting the whole listing
/// (spec §6). Format: `start-end perms offset dev inode path`, path
/// optional and whitespace-separated.
pub fn list_vmas(pid: Pid) -> Result<Vec<VmaDescriptor>, TargetError> {
    let path = format!("/proc/{}/maps", pid);
    let contents = fs::read_to_string(&path).map_err(TargetError::classify)?;

    let mut vmas = Vec::new();
    for line in contents.lines() {
        let mut fields = line.split_whitespace();
        let Some(range) = fields.next() else {
            continue;
        };
        let Some(perms) = fields.next() else { continue };

        let Some((start_hex, end_hex)) = range.split_once('-') else {
            continue;
        };
        let Ok(start) = u64::from_str_radix(start_hex, 16) else {
            continue;
        };
        let Ok(end) = u64::from_str_radix(end_hex, 16) else {
            continue;
        };

        // offset, dev, inode follow and are unused by this tool; whatever
        // remains on the line (if anything) is the backing path.
        let _offset = fields.next();
        let _dev = fields.next();
        let _inode = fields.next();
        let backing_path = fields.collect::<Vec<_>>().join(" ");

        vmas.push(VmaDescriptor {
            start,
            end,
            perms: perms.to_string(),
            path: backing_path,
        });
    }

    Ok(vmas)
}

/// Single cross-process vectored read. Returns the number of bytes
/// actually transferred; a positive count below `buf.len()` is a valid
/// partial result, not an error (spec §4.1).
pub fn probe_read(pid: Pid, addr: u64, buf: &mut [u8]) -> Result<usize, TargetError> {
    let mut local = [IoSliceMut::new(buf)];
    let remote = [RemoteIoVec {
        base: addr as usize,
        len: local[0].len(),
    }];

    process_vm_readv(pid, &mut local, &remote).map_err(TargetError::from)
}

/// Single cross-process vectored write. Succeeds only when the full
/// buffer was transferred; a short write is reported as `TargetError::Other`
/// wrapping `EIO` (spec §4.1: "any short write is reported as `OTHER_IO`").
pub fn poke_write(pid: Pid, addr: u64, buf: &[u8]) -> Result<(), TargetError> {
    let local = [IoSlice::new(buf)];
    let remote = [RemoteIoVec {
        base: addr as usize,
        len: buf.len(),
    }];

    let written = process_vm_writev(pid, &local, &remote).map_err(TargetError::from)?;
    if written != buf.len() {
        return Err(TargetError::Other(io::Error::from_raw_os_error(
            nix::errno::Errno::EIO as i32,
        )));
    }
    Ok(())
}

/// `true` if signalling `pid` with signal 0 succeeds, or fails with
/// `EPERM` (both mean the PID is live; any other error means absent).
pub fn pid_exists(pid: Pid) -> bool {
    match kill(pid, None) {
        Ok(()) => true,
        Err(nix::Error::EPERM) => true,
        Err(_) => false,
    }
}

/// Read the process name from `/proc/<pid>/comm`, trimmed at the first
/// newline.
///
/// Unlike the original C implementation this never leaves a
/// caller-provided buffer half-written on failure (§9, "Open question —
/// `get_proc_name` return"): any read failure is a clean `Err`.
pub fn proc_name(pid: Pid) -> io::Result<String> {
    let path = format!("/proc/{}/comm", pid);
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().next().unwrap_or_default().to_string())
}
