use std::net::SocketAddr;

#[cfg(target_os = "linux")]
use flyingsocks_native::original_destination;
#[cfg(target_os = "linux")]
use tokio::net::TcpListener;
#[cfg(target_os = "linux")]
use tracing::{info, trace, warn};

/// Accept connections sent to `addr` by a `REDIRECT` rule, log where each
/// one was headed and close it. Runs until Ctrl-C.
#[cfg(target_os = "linux")]
pub fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        let listener = TcpListener::bind(addr).await?;
        info!("redir listener on {}", listener.local_addr()?);

        tokio::select! {
            res = listen_tcp(listener) => res,
            _ = tokio::signal::ctrl_c() => {
                info!("redir listener on {} stopped", addr);
                Ok(())
            }
        }
    })
}

#[cfg(not(target_os = "linux"))]
pub fn run(_addr: SocketAddr) -> anyhow::Result<()> {
    Err(flyingsocks_native::Error::Unsupported("transparent proxy").into())
}

#[cfg(target_os = "linux")]
async fn listen_tcp(listener: TcpListener) -> anyhow::Result<()> {
    loop {
        let (socket, src_addr) = listener.accept().await?;

        match original_destination(&socket) {
            Ok(dst) => info!("redir new tcp conn {} -> {}", src_addr, dst),
            Err(e) => {
                warn!("could not get target address, client address: {src_addr}: {e}")
            }
        }
        trace!("closing {}", src_addr);
    }
}
