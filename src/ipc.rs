//! IpcDispatcher: `{action_name -> handler}` over a local JSON
//! Unix-domain socket. The socket accept loop runs on `tokio` worker
//! tasks; each request is posted to the main thread via `std::sync::mpsc`
//! and answered through a `tokio::sync::oneshot` — the dispatcher itself
//! is not on the key-handling hot path, but still must not touch
//! overlay/event-tap state off the main thread.

use std::sync::mpsc as std_mpsc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::coordinator::Coordinator;
use crate::error::{
    DaemonError, CODE_ACTION_FAILED, CODE_ALREADY_RUNNING, CODE_INVALID_INPUT, CODE_MODE_DISABLED,
    CODE_NOT_RUNNING, CODE_OK, CODE_UNKNOWN_COMMAND,
};
use crate::mode::Mode;
use crate::platform::Platform;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub action: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub req_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    fn ok(code: &str) -> Self {
        Self { success: true, message: None, code: code.to_string(), data: None }
    }

    fn ok_with(code: &str, data: Value) -> Self {
        Self { success: true, message: None, code: code.to_string(), data: Some(data) }
    }

    fn err(code: &str, message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), code: code.to_string(), data: None }
    }
}

const ACTION_NAMES: &[&str] = &["left_click", "right_click", "middle_click", "mouse_down", "mouse_up", "scroll"];

/// One request through the full `{action_name -> handler}` table. This is
/// the testable core of the dispatcher; the socket plumbing below only
/// gets requests to this function and writes back its `Response`.
pub fn dispatch<P: Platform + 'static>(coordinator: &mut Coordinator<P>, request: &Request) -> Response {
    match request.action.as_str() {
        "ping" => Response { success: true, message: Some("pong".to_string()), code: CODE_OK.to_string(), data: None },
        "start" => {
            if coordinator.is_enabled() {
                Response::err(CODE_ALREADY_RUNNING, "already running")
            } else {
                coordinator.set_enabled(true);
                Response::ok(CODE_OK)
            }
        }
        "stop" => {
            if !coordinator.is_enabled() {
                Response::err(CODE_NOT_RUNNING, "not running")
            } else {
                coordinator.set_enabled(false);
                Response::ok(CODE_OK)
            }
        }
        "hints" => activate(coordinator, Mode::Hints),
        "grid" => activate(coordinator, Mode::Grid),
        "idle" => activate(coordinator, Mode::Idle),
        "action" => dispatch_action(coordinator, &request.args),
        "status" => Response::ok_with(
            CODE_OK,
            serde_json::json!({
                "enabled": coordinator.is_enabled(),
                "mode": format!("{:?}", coordinator.current_mode()),
                "config_path": coordinator.config_path().map(|p| p.display().to_string()),
            }),
        ),
        "config" => {
            let value = serde_json::to_value(coordinator.config()).unwrap_or(Value::Null);
            Response::ok_with(CODE_OK, value)
        }
        other => Response::err(CODE_UNKNOWN_COMMAND, format!("unknown action: {other}")),
    }
}

fn activate<P: Platform + 'static>(coordinator: &mut Coordinator<P>, mode: Mode) -> Response {
    match coordinator.activate_mode(mode) {
        Ok(()) => Response::ok(CODE_OK),
        Err(err) => Response::err(err.ipc_code(), err.to_string()),
    }
}

/// Every sub-action name is validated before any of them run; an
/// unknown name short-circuits with `INVALID_INPUT` and performs no click.
fn dispatch_action<P: Platform + 'static>(coordinator: &mut Coordinator<P>, args: &[String]) -> Response {
    if args.is_empty() {
        return Response::err(CODE_INVALID_INPUT, "action requires at least one sub-action name");
    }
    for name in args {
        if name != "scroll" && !ACTION_NAMES.contains(&name.as_str()) {
            return Response::err(CODE_INVALID_INPUT, format!("unknown action: {name}"));
        }
    }
    for name in args {
        if let Err(err) = coordinator.perform_action(name) {
            return Response::err(err.ipc_code(), err.to_string());
        }
    }
    Response::ok(CODE_OK)
}

/// Request bridged from a worker task to the main-thread Coordinator.
pub struct MainThreadRequest {
    pub request: Request,
    pub respond_to: oneshot::Sender<Response>,
}

/// Drains every request queued since the last main-loop turn. Called once
/// per turn by the same loop that owns the Coordinator.
pub fn drain_pending<P: Platform + 'static>(
    coordinator: &mut Coordinator<P>,
    rx: &std_mpsc::Receiver<MainThreadRequest>,
) {
    while let Ok(pending) = rx.try_recv() {
        let response = dispatch(coordinator, &pending.request);
        let _ = pending.respond_to.send(response);
    }
}

/// Accepts connections on `socket_path`, one request per connection, and
/// forwards each to the main thread via `tx`. Never touches Coordinator
/// state directly — a worker task only ever talks to the main thread
/// through the channel.
pub async fn serve(socket_path: &std::path::Path, tx: std_mpsc::Sender<MainThreadRequest>) -> std::io::Result<()> {
    let _ = std::fs::remove_file(socket_path);
    let listener = UnixListener::bind(socket_path)?;
    info!(target: "IPC", path = %socket_path.display(), "listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, tx).await {
                warn!(target: "IPC", %err, "connection handling failed");
            }
        });
    }
}

async fn handle_connection(mut stream: UnixStream, tx: std_mpsc::Sender<MainThreadRequest>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;

    let response = match serde_json::from_slice::<Request>(&buf) {
        Ok(request) => {
            let (respond_to, rx) = oneshot::channel();
            if tx.send(MainThreadRequest { request, respond_to }).is_err() {
                Response::err(CODE_ACTION_FAILED, "daemon shutting down")
            } else {
                rx.await.unwrap_or_else(|_| Response::err(CODE_ACTION_FAILED, "no response from daemon"))
            }
        }
        Err(err) => Response::err(CODE_INVALID_INPUT, format!("malformed request: {err}")),
    };

    let body = serde_json::to_vec(&response).unwrap_or_default();
    stream.write_all(&body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::coordinator::NullRenderer;
    use crate::hotkeys::HotkeyManager;
    use crate::platform::mock::MockPlatform;
    use crate::platform::KeyEventCallback;
    use std::sync::Arc;

    struct NoopTap;
    impl crate::platform::EventTap for NoopTap {
        fn set_handler(&mut self, _handler: KeyEventCallback) {}
        fn enable(&mut self) {}
        fn disable(&mut self) {}
        fn is_enabled(&self) -> bool {
            false
        }
    }

    fn coordinator() -> Coordinator<MockPlatform> {
        Coordinator::new(
            Config::default(),
            None,
            Arc::new(MockPlatform::new()),
            Box::new(NoopTap),
            Box::new(NullRenderer),
            HotkeyManager::new().expect("mock hotkey manager"),
            std::sync::mpsc::channel().0,
        )
    }

    fn req(action: &str, args: &[&str]) -> Request {
        Request {
            action: action.to_string(),
            params: None,
            args: args.iter().map(|s| s.to_string()).collect(),
            req_id: None,
        }
    }

    #[test]
    fn ping_returns_ok_and_pong() {
        let mut c = coordinator();
        let response = dispatch(&mut c, &req("ping", &[]));
        assert!(response.success);
        assert_eq!(response.code, CODE_OK);
        assert_eq!(response.message.as_deref(), Some("pong"));
    }

    #[test]
    fn unknown_action_yields_unknown_command() {
        let mut c = coordinator();
        let response = dispatch(&mut c, &req("frobnicate", &[]));
        assert!(!response.success);
        assert_eq!(response.code, CODE_UNKNOWN_COMMAND);
    }

    #[test]
    fn stop_when_already_stopped_is_not_running() {
        let mut c = coordinator();
        c.set_enabled(false);
        let response = dispatch(&mut c, &req("stop", &[]));
        assert_eq!(response.code, CODE_NOT_RUNNING);
    }

    #[test]
    fn s5_unknown_sub_action_short_circuits_before_any_click() {
        let mut c = coordinator();
        let response = dispatch(&mut c, &req("action", &["left_click", "bogus"]));
        assert!(!response.success);
        assert_eq!(response.code, CODE_INVALID_INPUT);
        assert_eq!(response.message.as_deref(), Some("unknown action: bogus"));
    }

    #[test]
    fn status_reports_enabled_and_mode() {
        let mut c = coordinator();
        let response = dispatch(&mut c, &req("status", &[]));
        assert_eq!(response.code, CODE_OK);
        let data = response.data.unwrap();
        assert_eq!(data["enabled"], serde_json::json!(true));
        assert_eq!(data["config_path"], serde_json::json!(null));
    }

    #[test]
    fn hints_activation_without_elements_is_mode_disabled() {
        let mut c = coordinator();
        let response = dispatch(&mut c, &req("hints", &[]));
        assert_eq!(response.code, CODE_MODE_DISABLED);
    }

    #[test]
    fn response_serializes_without_null_fields() {
        let response = Response::ok(CODE_OK);
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("message").is_none());
        assert!(value.get("data").is_none());
    }

}
