//! [`WindowManager`] implementation backed by the i3 IPC protocol.
//!
//! Talks directly to the IPC socket of i3 (or sway, which speaks the same
//! protocol) without any client crate. Every message is framed as
//!
//! ```text
//! "i3-ipc" | payload length: u32 | message type: u32 | payload
//! ```
//!
//! with both integers in native byte order.

use crate::command::{Direction, OutputInfo};
use crate::traits::WindowManager;
use log::debug;
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

const MAGIC: &[u8; 6] = b"i3-ipc";
const HEADER_LEN: usize = MAGIC.len() + 8;

/// Message types used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageType {
    RunCommand = 0,
    GetOutputs = 3,
}

/// i3-backed window manager.
///
/// Each call opens a short-lived connection to the IPC socket.
#[derive(Debug, Clone, Default)]
pub struct I3Wm {
    socket: Option<PathBuf>,
}

/// Errors that can occur when talking to i3.
#[derive(Debug, thiserror::Error)]
pub enum I3Error {
    #[error("cannot locate i3 IPC socket: {0}")]
    NoSocket(String),
    #[error("i3 IPC io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("i3 IPC protocol error: {0}")]
    Protocol(String),
    #[error("i3 IPC parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i3 rejected {command:?}: {reason}")]
    Rejected { command: String, reason: String },
}

impl I3Wm {
    /// Create a handle that discovers the socket on first use.
    pub fn new() -> Self {
        Self { socket: None }
    }

    /// Create a handle for an explicit socket path.
    pub fn with_socket(path: impl Into<PathBuf>) -> Self {
        Self {
            socket: Some(path.into()),
        }
    }

    fn request(&self, kind: MessageType, payload: &str) -> Result<String, I3Error> {
        let path = match &self.socket {
            Some(p) => p.clone(),
            None => socket_path()?,
        };
        let mut stream = UnixStream::connect(&path)?;
        exchange(&mut stream, kind, payload)
    }

    fn run_command(&self, command: &str) -> Result<(), I3Error> {
        debug!("i3 command: {}", command);
        let reply = self.request(MessageType::RunCommand, command)?;
        let results: Vec<CommandReply> = serde_json::from_str(&reply)?;
        match results.into_iter().find(|r| !r.success) {
            Some(failed) => Err(I3Error::Rejected {
                command: command.to_string(),
                reason: failed.error.unwrap_or_else(|| "unknown error".into()),
            }),
            None => Ok(()),
        }
    }
}

//  Socket discovery

/// Resolve the IPC socket: `$I3SOCK`, then `$SWAYSOCK`, then
/// `i3 --get-socketpath`.
fn socket_path() -> Result<PathBuf, I3Error> {
    for var in ["I3SOCK", "SWAYSOCK"] {
        if let Ok(path) = std::env::var(var) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
    }

    let output = std::process::Command::new("i3")
        .arg("--get-socketpath")
        .output()
        .map_err(|e| I3Error::NoSocket(format!("I3SOCK/SWAYSOCK unset and `i3` failed: {}", e)))?;
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || path.is_empty() {
        return Err(I3Error::NoSocket("`i3 --get-socketpath` returned nothing".into()));
    }
    Ok(PathBuf::from(path))
}

//  Framing

fn encode(kind: MessageType, payload: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&(kind as u32).to_ne_bytes());
    buf.extend_from_slice(payload.as_bytes());
    buf
}

/// Send one message and read the reply payload.
fn exchange<S: Read + Write>(stream: &mut S, kind: MessageType, payload: &str) -> Result<String, I3Error> {
    stream.write_all(&encode(kind, payload))?;

    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header)?;
    if &header[..MAGIC.len()] != MAGIC {
        return Err(I3Error::Protocol("bad magic in reply".into()));
    }
    let len = u32::from_ne_bytes([header[6], header[7], header[8], header[9]]) as usize;
    let reply_type = u32::from_ne_bytes([header[10], header[11], header[12], header[13]]);
    if reply_type != kind as u32 {
        return Err(I3Error::Protocol(format!(
            "expected reply type {}, got {}",
            kind as u32, reply_type
        )));
    }

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body)?;
    String::from_utf8(body).map_err(|e| I3Error::Protocol(format!("utf-8: {}", e)))
}

/// Quote a workspace name for use inside an i3 command.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// One entry of a `RUN_COMMAND` reply.
#[derive(Deserialize)]
struct CommandReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

//  WindowManager implementation

impl WindowManager for I3Wm {
    type Error = I3Error;

    fn outputs(&self) -> Result<Vec<OutputInfo>, Self::Error> {
        let json = self.request(MessageType::GetOutputs, "")?;
        Ok(serde_json::from_str(&json)?)
    }

    fn focus_workspace(&self, workspace: &str) -> Result<(), Self::Error> {
        self.run_command(&format!("workspace {}", quote(workspace)))
    }

    fn move_workspace_to_output(&self, direction: Direction) -> Result<(), Self::Error> {
        self.run_command(&format!("move workspace to output {}", direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::thread;

    #[test]
    fn encode_frames_payload() {
        let msg = encode(MessageType::RunCommand, "nop");
        assert_eq!(&msg[..6], b"i3-ipc");
        assert_eq!(u32::from_ne_bytes([msg[6], msg[7], msg[8], msg[9]]), 3);
        assert_eq!(u32::from_ne_bytes([msg[10], msg[11], msg[12], msg[13]]), 0);
        assert_eq!(&msg[14..], b"nop");
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("1: web"), "\"1: web\"");
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    /// Serve exactly one request on a fresh socket, answering with `reply`.
    /// Returns the socket path and a handle yielding the received request.
    fn fake_i3(
        name: &str,
        reply_type: u32,
        reply: &'static str,
    ) -> (PathBuf, thread::JoinHandle<(u32, String)>) {
        let dir = std::env::temp_dir().join(format!("barblocks-test-{}-{}", std::process::id(), name));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("ipc.sock");
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut header = [0u8; HEADER_LEN];
            stream.read_exact(&mut header).unwrap();
            let len = u32::from_ne_bytes([header[6], header[7], header[8], header[9]]) as usize;
            let kind = u32::from_ne_bytes([header[10], header[11], header[12], header[13]]);
            let mut body = vec![0u8; len];
            stream.read_exact(&mut body).unwrap();

            let mut out = Vec::new();
            out.extend_from_slice(MAGIC);
            out.extend_from_slice(&(reply.len() as u32).to_ne_bytes());
            out.extend_from_slice(&reply_type.to_ne_bytes());
            out.extend_from_slice(reply.as_bytes());
            stream.write_all(&out).unwrap();
            (kind, String::from_utf8(body).unwrap())
        });
        (path, handle)
    }

    #[test]
    fn outputs_over_socket() {
        let (path, server) = fake_i3(
            "outputs",
            3,
            r#"[{"name":"DP-1","active":true,"current_workspace":"2"}]"#,
        );
        let wm = I3Wm::with_socket(&path);
        let outputs = wm.outputs().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].current_workspace.as_deref(), Some("2"));
        assert_eq!(server.join().unwrap(), (3, String::new()));
    }

    #[test]
    fn focus_workspace_sends_quoted_command() {
        let (path, server) = fake_i3("focus", 0, r#"[{"success":true}]"#);
        let wm = I3Wm::with_socket(&path);
        wm.focus_workspace("3: mail").unwrap();
        assert_eq!(server.join().unwrap(), (0, "workspace \"3: mail\"".into()));
    }

    #[test]
    fn rejected_command_is_error() {
        let (path, server) = fake_i3(
            "reject",
            0,
            r#"[{"success":false,"error":"No output matched"}]"#,
        );
        let wm = I3Wm::with_socket(&path);
        let err = wm.move_workspace_to_output(Direction::Right).unwrap_err();
        match err {
            I3Error::Rejected { command, reason } => {
                assert_eq!(command, "move workspace to output right");
                assert_eq!(reason, "No output matched");
            }
            other => panic!("unexpected error: {}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn mismatched_reply_type_is_protocol_error() {
        let (path, server) = fake_i3("mismatch", 1, "[]");
        let wm = I3Wm::with_socket(&path);
        assert!(matches!(wm.outputs(), Err(I3Error::Protocol(_))));
        server.join().unwrap();
    }

    #[test]
    fn missing_socket_is_io_error() {
        let wm = I3Wm::with_socket("/nonexistent/barblocks/ipc.sock");
        assert!(matches!(wm.outputs(), Err(I3Error::Io(_))));
    }
}
