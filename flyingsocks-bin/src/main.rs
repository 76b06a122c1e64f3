use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, Subcommand};

use crate::{config::Config, sysproxy::Action};

mod config;
mod logging;
mod redir;
#[cfg_attr(not(windows), allow(dead_code))]
mod sysproxy;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long, value_parser, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides `log-level` from the config file
    #[clap(short, long, value_enum)]
    log_level: Option<config::LogLevel>,

    #[clap(long, value_parser, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the system proxy settings
    Status,
    /// Turn the system proxy on
    Enable,
    /// Turn the system proxy off
    Disable,
    /// Set the proxy server, e.g. 127.0.0.1:8080
    Server { address: String },
    /// Read or replace the bypass list
    Bypass {
        #[clap(subcommand)]
        action: BypassAction,
    },
    /// Apply the `system-proxy` section of the config file
    Apply,
    /// Log the original destination of redirected connections
    Redir {
        #[clap(long, value_name = "ADDR")]
        listen: Option<SocketAddr>,
    },
}

#[derive(Subcommand)]
enum BypassAction {
    Get,
    Set { hosts: Vec<String> },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config {
        Some(path) => Config::try_from(path)?,
        None => Config::default(),
    };
    let _guard = logging::setup_logging(
        cli.log_level.unwrap_or(config.log_level),
        cli.log_file.as_deref(),
    )?;

    let action = match cli.command {
        Command::Redir { listen } => {
            return redir::run(listen.unwrap_or(config.transparent.listen_addr()));
        }
        Command::Status => Action::Status,
        Command::Enable => Action::Enable,
        Command::Disable => Action::Disable,
        Command::Server { address } => Action::Server(address),
        Command::Bypass {
            action: BypassAction::Get,
        } => Action::BypassGet,
        Command::Bypass {
            action: BypassAction::Set { hosts },
        } => Action::BypassSet(hosts),
        Command::Apply => Action::Apply,
    };

    #[cfg(windows)]
    {
        let settings = flyingsocks_native::SystemProxySettings::system();
        sysproxy::execute(
            &settings,
            action,
            &config.system_proxy,
            &mut std::io::stdout().lock(),
        )
    }
    #[cfg(not(windows))]
    {
        let _ = action;
        debug_assert!(!flyingsocks_native::sysproxy::is_supported());
        Err(flyingsocks_native::Error::Unsupported("system proxy settings").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bypass_set() {
        let cli = Cli::parse_from(["fsnative", "-l", "debug", "bypass", "set", "a", "b"]);
        assert_eq!(cli.log_level, Some(config::LogLevel::Debug));
        match cli.command {
            Command::Bypass {
                action: BypassAction::Set { hosts },
            } => assert_eq!(hosts, vec!["a", "b"]),
            _ => panic!("unexpected command"),
        }
    }
}
