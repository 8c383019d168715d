//! Classified error taxonomy for the target accessor and session state.
//!
//! The target accessor surfaces kernel errno-class failures directly;
//! the session layer turns precondition violations into `NOT_ATTACHED` /
//! `NO_SCAN_DATA`. Both are matchable enums rather than opaque strings so
//! the front-end can render each class distinctly.

use nix::errno::Errno;
use std::io;

/// Errors raised while listing VMAs or reading/writing target memory.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("permission denied (ptrace scope / missing capability)")]
    PermissionDenied,

    #[error("no such process")]
    NoSuchProcess,

    #[error("address not mapped in target")]
    InvalidAddress,

    #[error("partial transfer: {got} of {wanted} bytes")]
    Partial { got: usize, wanted: usize },

    #[error("i/o error: {0}")]
    Other(#[source] io::Error),
}

impl TargetError {
    /// Classify a raw `io::Error` (from a failed `process_vm_readv`/`writev`
    /// or a `/proc` file operation) into the taxonomy of spec §7.
    pub fn classify(err: io::Error) -> Self {
        match err.raw_os_error().map(Errno::from_i32) {
            Some(Errno::EPERM) => TargetError::PermissionDenied,
            Some(Errno::ESRCH) => TargetError::NoSuchProcess,
            Some(Errno::EIO) | Some(Errno::EFAULT) | Some(Errno::ENOMEM) => {
                TargetError::InvalidAddress
            }
            _ => TargetError::Other(err),
        }
    }
}

impl From<nix::Error> for TargetError {
    fn from(err: nix::Error) -> Self {
        match err {
            nix::Error::EPERM => TargetError::PermissionDenied,
            nix::Error::ESRCH => TargetError::NoSuchProcess,
            nix::Error::EIO | nix::Error::EFAULT | nix::Error::ENOMEM => {
                TargetError::InvalidAddress
            }
            other => TargetError::Other(io::Error::from_raw_os_error(other as i32)),
        }
    }
}

/// Precondition failures raised by the session state machine (C6).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not attached to a process")]
    NotAttached,

    #[error("no scan data available yet")]
    NoScanData,

    #[error(transparent)]
    Target(#[from] TargetError),
}
