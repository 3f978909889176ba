//! LifecycleSupervisor: startup sequencing, watcher wiring, and the
//! graceful-shutdown timeout.

use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use tracing::{info, warn};

use crate::coordinator::Coordinator;
use crate::ipc::{self, MainThreadRequest};
use crate::platform::{Platform, RawKeyEvent};

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit code contract: 0 on graceful shutdown, 1 on forced exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Graceful,
    Forced,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Graceful => 0,
            ExitCode::Forced => 1,
        }
    }
}

/// Owns the IPC request channel and the main-loop turn that drains it,
/// dispatches focused-app/screen-change notifications, and waits for a
/// shutdown signal with a forced-exit deadline.
pub struct LifecycleSupervisor {
    ipc_rx: std_mpsc::Receiver<MainThreadRequest>,
    key_rx: std_mpsc::Receiver<RawKeyEvent>,
}

impl LifecycleSupervisor {
    pub fn new(ipc_rx: std_mpsc::Receiver<MainThreadRequest>, key_rx: std_mpsc::Receiver<RawKeyEvent>) -> Self {
        Self { ipc_rx, key_rx }
    }

    /// Drains pending IPC requests. Call once per main-loop turn, same as
    /// `ipc::drain_pending` — this wrapper exists so the supervisor is the
    /// single place that knows the turn cadence.
    pub fn drain_ipc<P: Platform + 'static>(&self, coordinator: &mut Coordinator<P>) {
        ipc::drain_pending(coordinator, &self.ipc_rx);
    }

    /// Drains key events posted by the event tap's callback since the last
    /// turn. Call once per main-loop turn, alongside `drain_ipc`.
    pub fn drain_keys<P: Platform + 'static>(&self, coordinator: &mut Coordinator<P>) {
        while let Ok(event) = self.key_rx.try_recv() {
            coordinator.handle_key(event);
        }
    }

    /// Focused-app-change handling.
    pub fn on_focused_app_changed<P: Platform + 'static>(
        &self,
        coordinator: &mut Coordinator<P>,
        bundle_id: Option<String>,
    ) {
        coordinator.on_focused_app_changed(bundle_id);
    }

    /// Screen-parameter-change handling (coordinator guards re-entrancy
    /// internally).
    pub fn on_screen_changed<P: Platform + 'static>(&self, coordinator: &mut Coordinator<P>) {
        coordinator.on_screen_changed();
    }

    /// Waits for the first shutdown signal, then races a second signal
    /// against a 10-second timeout. Whichever happens first determines the
    /// exit code. If the signal handlers themselves can't be installed,
    /// treat that as an immediate forced exit rather than panicking.
    pub async fn wait_for_shutdown(&self) -> ExitCode {
        if let Err(err) = wait_for_signal().await {
            warn!(target: "LIFECYCLE", %err, "failed to install shutdown signal handlers, forcing exit");
            return ExitCode::Forced;
        }
        info!(target: "LIFECYCLE", "first shutdown signal received, starting graceful stop");

        tokio::select! {
            result = wait_for_signal() => {
                if let Err(err) = result {
                    warn!(target: "LIFECYCLE", %err, "failed to install shutdown signal handlers on second wait, forcing exit");
                } else {
                    warn!(target: "LIFECYCLE", "second shutdown signal received, forcing exit");
                }
                ExitCode::Forced
            }
            _ = tokio::time::sleep(GRACEFUL_SHUTDOWN_TIMEOUT) => {
                warn!(target: "LIFECYCLE", "graceful shutdown timed out, forcing exit");
                ExitCode::Forced
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_exit_contract() {
        assert_eq!(ExitCode::Graceful.code(), 0);
        assert_eq!(ExitCode::Forced.code(), 1);
    }
}
