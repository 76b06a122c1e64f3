//! Native OS facilities used by the flyingsocks client.
//!
//! * [`redir`]: recover the pre-NAT destination of a connection that was
//!   redirected to a local listener by an iptables/nftables `REDIRECT` rule
//!   (Linux only).
//! * [`sysproxy`]: read and write the per-user Internet Settings that control
//!   the system-wide HTTP proxy (Windows registry backend).
//!
//! Every call is synchronous and stateless. Failures are returned as
//! [`Error`] values; nothing here logs above `debug`.

use std::fmt::Display;

use thiserror::Error;

pub mod redir;
pub mod sysproxy;

pub use redir::OriginalDestination;
#[cfg(target_os = "linux")]
pub use redir::original_destination;
pub use sysproxy::{ProxySettingsSnapshot, SystemProxySettings};

/// The step of a registry access that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOp {
    Open,
    Query,
    Write,
}

impl Display for RegistryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryOp::Open => write!(f, "open"),
            RegistryOp::Query => write!(f, "query"),
            RegistryOp::Write => write!(f, "write"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The socket has no kernel-tracked original destination, usually
    /// because it was not transparently redirected.
    #[error("could not get original destination of socket, os error {code}")]
    NoOriginalDestination { code: i32 },
    #[error("could not {op} registry [PATH: {path}\\{value}] ERROR_CODE: {code}")]
    RegistryAccess {
        op: RegistryOp,
        path: &'static str,
        value: &'static str,
        code: u32,
    },
    #[error("invalid port: {0}")]
    InvalidPort(u16),
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
