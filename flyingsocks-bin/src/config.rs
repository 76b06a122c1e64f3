use std::{
    fmt::Display,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};

#[derive(
    PartialEq, Serialize, Deserialize, Default, Copy, Clone, Debug, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    #[serde(alias = "off")]
    Silent,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Silent => write!(f, "off"),
        }
    }
}

/// Example
/// ```yaml
/// ---
/// log-level: info
///
/// system-proxy:
///   enable: true
///   address: 127.0.0.1
///   port: 8080
///   bypass:
///     - localhost
///     - 127.*
///     - <local>
///
/// transparent:
///   bind-address: 0.0.0.0
///   port: 6870
/// ```
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub log_level: LogLevel,
    pub system_proxy: SystemProxy,
    pub transparent: Transparent,
}

/// What `apply` writes into the system proxy settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct SystemProxy {
    pub enable: bool,
    /// Address of the local HTTP proxy.
    pub address: String,
    pub port: u16,
    pub bypass: Vec<String>,
}

impl Default for SystemProxy {
    fn default() -> Self {
        Self {
            enable: false,
            address: "127.0.0.1".to_owned(),
            port: 8080,
            bypass: ["localhost", "127.*", "10.*", "172.16.*", "192.168.*", "<local>"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Listener that iptables `REDIRECT` rules point at.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Transparent {
    pub bind_address: IpAddr,
    pub port: u16,
}

impl Default for Transparent {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 6870,
        }
    }
}

impl Transparent {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

impl Config {
    fn validate(self) -> anyhow::Result<Self> {
        if self.system_proxy.port == 0 {
            bail!("invalid config: system-proxy.port must not be 0");
        }
        if self.transparent.port == 0 {
            bail!("invalid config: transparent.port must not be 0");
        }
        Ok(self)
    }
}

impl TryFrom<PathBuf> for Config {
    type Error = anyhow::Error;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        let content = std::fs::read_to_string(&value)
            .with_context(|| format!("could not read config {}", value.display()))?;
        content.parse::<Config>()
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = serde_yaml::from_str(s)
            .map_err(|x| anyhow!("could not parse config content: {x}"))?;
        config.validate()
    }
}
