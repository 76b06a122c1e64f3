use std::io::Write;

use flyingsocks_native::{
    Error, RegistryOp,
    sysproxy::{SettingsStore, SystemProxySettings},
};
use tracing::info;

use crate::config::SystemProxy;

const ERROR_FILE_NOT_FOUND: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Status,
    Enable,
    Disable,
    Server(String),
    BypassGet,
    BypassSet(Vec<String>),
    Apply,
}

pub fn execute<S: SettingsStore>(
    settings: &SystemProxySettings<S>,
    action: Action,
    config: &SystemProxy,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        Action::Status => {
            writeln!(out, "enabled: {}", or_unset(settings.is_proxy_enabled())?)?;
            writeln!(out, "server:  {}", or_unset(settings.proxy_server_address())?)?;
            writeln!(out, "bypass:  {}", or_unset(settings.bypass_list())?)?;
        }
        Action::Enable => settings.set_proxy_enabled(true)?,
        Action::Disable => settings.set_proxy_enabled(false)?,
        Action::Server(address) => settings.set_proxy_server_address(&address)?,
        Action::BypassGet => {
            for host in settings.bypass_hosts()? {
                writeln!(out, "{host}")?;
            }
        }
        Action::BypassSet(hosts) => settings.set_bypass_hosts(&hosts)?,
        Action::Apply => apply(settings, config)?,
    }
    Ok(())
}

/// Push the `system-proxy` section of the config into the settings store.
pub fn apply<S: SettingsStore>(
    settings: &SystemProxySettings<S>,
    config: &SystemProxy,
) -> flyingsocks_native::Result<()> {
    if !config.enable {
        settings.set_proxy_enabled(false)?;
        info!("system proxy disabled");
        return Ok(());
    }

    settings.set_proxy_server(&config.address, config.port)?;
    settings.set_bypass_hosts(&config.bypass)?;
    settings.set_proxy_enabled(true)?;
    info!("system proxy set to {}:{}", config.address, config.port);
    Ok(())
}

/// Values that were never written read back as not found.
fn or_unset<T: ToString>(res: flyingsocks_native::Result<T>) -> anyhow::Result<String> {
    match res {
        Ok(v) => Ok(v.to_string()),
        Err(Error::RegistryAccess {
            op: RegistryOp::Query,
            code: ERROR_FILE_NOT_FOUND,
            ..
        }) => Ok("<not set>".to_owned()),
        Err(e) => Err(e.into()),
    }
}
