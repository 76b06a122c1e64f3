//! System-wide HTTP proxy settings.
//!
//! Windows keeps them as three values under
//! `HKEY_CURRENT_USER\SOFTWARE\Microsoft\Windows\CurrentVersion\Internet Settings`:
//!
//! * `ProxyEnable`: `REG_DWORD`, non-zero when the proxy is on
//! * `ProxyServer`: `REG_SZ`, `host:port`
//! * `ProxyOverride`: `REG_SZ`, `;` separated host patterns that bypass the
//!   proxy
//!
//! Every operation opens the key, does exactly one read or write and closes
//! the key again, so changes made by other programs are seen on the next
//! call and concurrent callers never share a handle.

use tracing::{debug, trace};

use crate::{Error, RegistryOp, Result};

mod store;
#[cfg(windows)]
mod registry;

#[cfg(test)]
mod memory;

pub use store::{ERROR_MORE_DATA, QueryError, SettingsKey, SettingsStore};
#[cfg(windows)]
pub use registry::{RegistryKey, RegistryStore};

pub const INTERNET_SETTINGS_SUBKEY: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\Internet Settings";
pub const INTERNET_SETTINGS_PATH: &str =
    r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\Windows\CurrentVersion\Internet Settings";

pub const PROXY_ENABLE: &str = "ProxyEnable";
pub const PROXY_SERVER: &str = "ProxyServer";
pub const PROXY_OVERRIDE: &str = "ProxyOverride";

/// Size of the first read attempt, 1024 bytes.
const STACK_BUFFER_LEN: usize = 512;
/// Extra room given to the one retry after `ERROR_MORE_DATA`.
const FALLBACK_MARGIN: usize = 8;

const BYPASS_SEPARATOR: &str = ";";

/// Whether this platform has a native system proxy backend.
pub fn is_supported() -> bool {
    cfg!(windows)
}

/// A point-in-time view of the three proxy values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettingsSnapshot {
    pub enabled: bool,
    /// `host:port`, may be empty.
    pub server_address: String,
    /// `;` separated host patterns, may be empty.
    pub bypass_list: String,
}

pub struct SystemProxySettings<S> {
    store: S,
}

#[cfg(windows)]
impl SystemProxySettings<RegistryStore> {
    /// Settings of the current user.
    pub fn system() -> Self {
        Self::new(RegistryStore)
    }
}

impl<S: SettingsStore> SystemProxySettings<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn is_proxy_enabled(&self) -> Result<bool> {
        let key = self.open(PROXY_ENABLE)?;
        let value = key
            .get_dword(PROXY_ENABLE)
            .map_err(|code| access_error(RegistryOp::Query, PROXY_ENABLE, code))?;
        Ok(value != 0)
    }

    pub fn set_proxy_enabled(&self, enable: bool) -> Result<()> {
        let key = self.open(PROXY_ENABLE)?;
        key.set_dword(PROXY_ENABLE, enable as u32)
            .map_err(|code| access_error(RegistryOp::Write, PROXY_ENABLE, code))?;
        debug!("system proxy {}", if enable { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Write `ProxyServer` verbatim. Usually `host:port`.
    pub fn set_proxy_server_address(&self, address: &str) -> Result<()> {
        self.write_string(PROXY_SERVER, address)
    }

    pub fn set_proxy_server(&self, host: &str, port: u16) -> Result<()> {
        if port == 0 {
            return Err(Error::InvalidPort(port));
        }
        self.set_proxy_server_address(&format!("{host}:{port}"))
    }

    pub fn proxy_server_address(&self) -> Result<String> {
        self.read_string(PROXY_SERVER)
    }

    /// Write `ProxyOverride` verbatim.
    pub fn set_bypass_list(&self, hosts: &str) -> Result<()> {
        self.write_string(PROXY_OVERRIDE, hosts)
    }

    pub fn set_bypass_hosts<I, T>(&self, hosts: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let list = hosts
            .into_iter()
            .map(|h| h.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(BYPASS_SEPARATOR);
        self.set_bypass_list(&list)
    }

    pub fn bypass_list(&self) -> Result<String> {
        self.read_string(PROXY_OVERRIDE)
    }

    /// The bypass list split into host patterns, empty entries dropped.
    pub fn bypass_hosts(&self) -> Result<Vec<String>> {
        Ok(split_bypass_list(&self.bypass_list()?))
    }

    /// Reads the three values one after another. Not atomic with respect to
    /// other writers.
    pub fn snapshot(&self) -> Result<ProxySettingsSnapshot> {
        Ok(ProxySettingsSnapshot {
            enabled: self.is_proxy_enabled()?,
            server_address: self.proxy_server_address()?,
            bypass_list: self.bypass_list()?,
        })
    }

    fn open(&self, value: &'static str) -> Result<S::Key> {
        self.store
            .open()
            .map_err(|code| access_error(RegistryOp::Open, value, code))
    }

    fn write_string(&self, value: &'static str, data: &str) -> Result<()> {
        let key = self.open(value)?;
        key.set_string(value, data)
            .map_err(|code| access_error(RegistryOp::Write, value, code))?;
        debug!("{value} set to {data:?}");
        Ok(())
    }

    /// Query into a stack buffer first; if the store asks for more room,
    /// retry exactly once with a heap buffer of the requested size.
    fn read_string(&self, value: &'static str) -> Result<String> {
        let key = self.open(value)?;

        let mut buf = [0u16; STACK_BUFFER_LEN];
        let required = match key.query_string(value, &mut buf) {
            Ok(len) => return Ok(decode(&buf[..len])),
            Err(QueryError::MoreData { required }) => required,
            Err(e) => return Err(access_error(RegistryOp::Query, value, e.code())),
        };

        trace!("{value} needs {required} units, retrying with a heap buffer");
        let mut heap = vec![0u16; required + FALLBACK_MARGIN];
        key.query_string(value, &mut heap)
            .map(|len| decode(&heap[..len]))
            .map_err(|e| access_error(RegistryOp::Query, value, e.code()))
    }
}

fn access_error(op: RegistryOp, value: &'static str, code: u32) -> Error {
    Error::RegistryAccess {
        op,
        path: INTERNET_SETTINGS_PATH,
        value,
        code,
    }
}

/// Decode a UTF-16 registry string, stopping at the first NUL.
fn decode(units: &[u16]) -> String {
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..end])
}

fn split_bypass_list(list: &str) -> Vec<String> {
    list.split(BYPASS_SEPARATOR)
        .filter(|h| !h.is_empty())
        .map(str::to_owned)
        .collect()
}
