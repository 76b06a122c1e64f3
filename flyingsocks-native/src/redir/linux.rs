use std::{
    io, mem,
    net::Ipv4Addr,
    os::fd::{AsFd, AsRawFd, BorrowedFd},
};

use tracing::trace;

use super::OriginalDestination;
use crate::{Error, Result};

/// Get the original destination of a connection accepted on a listener that
/// is the target of a `REDIRECT` rule.
///
/// The socket is only borrowed for the duration of the query.
pub fn original_destination<S: AsFd>(socket: &S) -> Result<OriginalDestination> {
    original_destination_fd(socket.as_fd())
}

/// Same as [`original_destination`], for callers that only hold a descriptor.
pub fn original_destination_fd(fd: BorrowedFd<'_>) -> Result<OriginalDestination> {
    let mut addr: libc::sockaddr_in = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;

    // SO_ORIGINAL_DST only exists at the IPv4 level, IPv6 connections are not
    // supported.
    let ret = unsafe {
        libc::getsockopt(
            fd.as_raw_fd(),
            libc::SOL_IP,
            libc::SO_ORIGINAL_DST,
            &mut addr as *mut libc::sockaddr_in as *mut libc::c_void,
            &mut len,
        )
    };

    if ret != 0 {
        let code = io::Error::last_os_error().raw_os_error().unwrap_or(ret);
        return Err(Error::NoOriginalDestination { code });
    }

    let dst = destination_from_raw(&addr)
        .ok_or(Error::NoOriginalDestination {
            code: libc::EAFNOSUPPORT,
        })?;
    trace!("original destination of fd {}: {}", fd.as_raw_fd(), dst);
    Ok(dst)
}

fn destination_from_raw(addr: &libc::sockaddr_in) -> Option<OriginalDestination> {
    if addr.sin_family as libc::c_int != libc::AF_INET {
        return None;
    }
    // both fields are in network byte order
    Some(OriginalDestination {
        host: Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr)),
        port: u16::from_be(addr.sin_port),
    })
}
