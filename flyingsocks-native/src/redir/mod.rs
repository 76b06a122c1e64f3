use std::{
    fmt::Display,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
};

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::{original_destination, original_destination_fd};

/// The address a client tried to reach before a firewall rule redirected
/// the connection to us. The port is always in host byte order.
///
/// Only IPv4 destinations can be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginalDestination {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl OriginalDestination {
    pub fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }
}

impl Display for OriginalDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<OriginalDestination> for SocketAddrV4 {
    fn from(value: OriginalDestination) -> Self {
        SocketAddrV4::new(value.host, value.port)
    }
}

impl From<OriginalDestination> for SocketAddr {
    fn from(value: OriginalDestination) -> Self {
        SocketAddr::V4(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_conversion() {
        let dst = OriginalDestination::new(Ipv4Addr::new(10, 0, 0, 7), 443);
        assert_eq!(dst.to_string(), "10.0.0.7:443");

        let addr: SocketAddr = dst.into();
        assert_eq!(addr, "10.0.0.7:443".parse::<SocketAddr>().unwrap());
    }
}
