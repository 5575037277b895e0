//! Shutdown signal handling for the panel

use tokio::sync::mpsc;
use tracing::info;

/// Signals that end the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
}

/// Listens for OS shutdown signals and hands them to the event loop.
pub struct ShutdownSignal {
    receiver: mpsc::Receiver<ShutdownReason>,
}

impl ShutdownSignal {
    /// Start listening. Must be called from within the tokio runtime.
    pub async fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(4);

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let tx_int = tx.clone();
            let mut sigint = signal(SignalKind::interrupt())?;
            tokio::spawn(async move {
                while sigint.recv().await.is_some() {
                    info!("received SIGINT");
                    let _ = tx_int.send(ShutdownReason::Interrupt).await;
                }
            });

            let mut sigterm = signal(SignalKind::terminate())?;
            tokio::spawn(async move {
                while sigterm.recv().await.is_some() {
                    info!("received SIGTERM");
                    let _ = tx.send(ShutdownReason::Terminate).await;
                }
            });
        }

        #[cfg(not(unix))]
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl-C");
                let _ = tx.send(ShutdownReason::Interrupt).await;
            }
        });

        Ok(Self { receiver: rx })
    }

    /// Wait for the next shutdown signal
    pub async fn recv(&mut self) -> Option<ShutdownReason> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_starts_inside_runtime() {
        assert!(ShutdownSignal::new().await.is_ok());
    }

    #[test]
    fn reasons_are_distinct() {
        assert_ne!(ShutdownReason::Interrupt, ShutdownReason::Terminate);
    }
}
