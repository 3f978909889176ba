use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use mouse_hinter::config;
use mouse_hinter::coordinator::{Coordinator, NullRenderer};
use mouse_hinter::hotkeys::HotkeyManager;
use mouse_hinter::ipc;
use mouse_hinter::lifecycle::LifecycleSupervisor;
use mouse_hinter::logging;
use mouse_hinter::platform::{EventTap, Platform};

#[cfg(target_os = "macos")]
use mouse_hinter::platform::macos::{MacEventTap, MacOsPlatform};

#[cfg(not(target_os = "macos"))]
use mouse_hinter::platform::mock::MockPlatform;

// `Coordinator<P>` is generic over the concrete platform binding rather than
// a trait object, so the binary picks one concrete type per target here
// instead of building a `dyn Platform`.
#[cfg(target_os = "macos")]
type ActivePlatform = MacOsPlatform;
#[cfg(not(target_os = "macos"))]
type ActivePlatform = MockPlatform;

fn build_platform() -> Arc<ActivePlatform> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(MacOsPlatform::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(MockPlatform::new())
    }
}

/// Stand-in tap for non-macOS builds (CI, development machines): reports no
/// key events. The real binding (`platform::macos::MacEventTap`) is the only
/// one exercised on the supported target.
struct NoopEventTap;

impl EventTap for NoopEventTap {
    fn set_handler(&mut self, _handler: mouse_hinter::platform::KeyEventCallback) {}
    fn enable(&mut self) {}
    fn disable(&mut self) {}
    fn is_enabled(&self) -> bool {
        false
    }
}

fn build_event_tap() -> Box<dyn EventTap> {
    #[cfg(target_os = "macos")]
    {
        Box::new(MacEventTap::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(NoopEventTap)
    }
}

fn main() -> Result<()> {
    logging::init();

    let (config, config_path) = config::load();
    info!(target: "CONFIG", path = ?config_path, "configuration loaded");

    let platform = build_platform();
    if !platform.has_accessibility_permission() {
        error!(
            target: "STARTUP",
            "accessibility permission not granted; grant it under System Settings > Privacy & Security > Accessibility and restart"
        );
        anyhow::bail!("accessibility permission not granted");
    }

    let hotkeys = HotkeyManager::new().context("failed to initialise the global hotkey manager")?;
    let event_tap = build_event_tap();

    let (key_tx, key_rx) = mpsc::channel();
    let mut coordinator = Coordinator::new(
        config,
        config_path,
        platform,
        event_tap,
        Box::new(NullRenderer),
        hotkeys,
        key_tx,
    );
    if let Err(err) = coordinator.refresh_hotkeys() {
        warn!(target: "HOTKEY", %err, "initial hotkey registration failed");
    }

    let (ipc_tx, ipc_rx) = mpsc::channel();
    let supervisor = LifecycleSupervisor::new(ipc_rx, key_rx);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the tokio runtime")?;

    let socket_path = std::env::temp_dir().join("mouse-hinter.sock");
    let serve_path = socket_path.clone();
    runtime.spawn(async move {
        if let Err(err) = ipc::serve(&serve_path, ipc_tx).await {
            error!(target: "IPC", %err, "ipc server exited");
        }
    });

    info!(target: "LIFECYCLE", "daemon started");

    // The event tap's callback runs on its own thread and only posts
    // `RawKeyEvent`s into `key_tx`; `coordinator` itself is never touched
    // off this thread. Each turn drains both the IPC and key channels.
    let exit = runtime.block_on(async {
        let mut turn = tokio::time::interval(std::time::Duration::from_millis(10));
        let shutdown = supervisor.wait_for_shutdown();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = turn.tick() => {
                    supervisor.drain_ipc(&mut coordinator);
                    supervisor.drain_keys(&mut coordinator);
                }
                exit = &mut shutdown => {
                    break exit;
                }
            }
        }
    });

    coordinator.set_enabled(false);
    info!(target: "LIFECYCLE", code = exit.code(), "shutting down");
    std::process::exit(exit.code());
}
