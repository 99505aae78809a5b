//! Wire protocol between the host and a kernel daemon process.
//!
//! The daemon speaks newline-delimited JSON over its stdio: the host writes
//! one [`DaemonRequest`] per line to the daemon's stdin, and the daemon
//! writes one [`DaemonMessage`] per line to its stdout. Replies carry the
//! request id they answer; output and exit events are unsolicited and
//! belong to the kernel the daemon most recently started.
//!
//! Invariants:
//! - every line is exactly one JSON value,
//! - a request receives exactly one reply,
//! - `kernel_exited` is the last event for a started kernel.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request from the host to the daemon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonRequest {
    /// Correlation id echoed back in the reply.
    pub id: u64,

    /// The operation to perform.
    #[serde(flatten)]
    pub op: DaemonOp,
}

/// Operations a daemon performs on behalf of the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DaemonOp {
    /// Start a kernel: `interpreter -m module args...` with `env` applied.
    StartKernel {
        /// Module to execute.
        module: String,
        /// Residual arguments after the module name.
        args: Vec<String>,
        /// Environment overrides for the kernel process.
        #[serde(default)]
        env: HashMap<String, String>,
    },

    /// Interrupt the running kernel.
    InterruptKernel,

    /// Kill the running kernel.
    KillKernel,

    /// Liveness probe, used as the startup handshake.
    Ping,
}

/// A message from the daemon to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonMessage {
    /// Reply to a request. `error` is absent on success.
    Reply {
        /// Id of the request being answered.
        id: u64,
        /// Failure diagnostic, when the operation was rejected.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A line of kernel output.
    Output {
        /// Which stream the line was written to.
        stream: StreamKind,
        /// The line, without its trailing newline.
        data: String,
    },

    /// The kernel process exited.
    KernelExited {
        /// Exit code, when the kernel exited normally.
        #[serde(default)]
        code: Option<i32>,
        /// Terminating signal, when the kernel was killed.
        #[serde(default)]
        signal: Option<i32>,
    },
}

impl DaemonRequest {
    /// Encodes the request as a single JSON line (no trailing newline).
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl DaemonMessage {
    /// Decodes a message from one line of daemon output.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end_matches(['\n', '\r']))
    }
}

/// Output stream a kernel line was written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_kernel_request_encoding() {
        let mut env = HashMap::new();
        env.insert("hello".to_string(), "1".to_string());
        let request = DaemonRequest {
            id: 7,
            op: DaemonOp::StartKernel {
                module: "ipykernel_launcher".to_string(),
                args: vec!["-f".to_string(), "file.json".to_string()],
                env,
            },
        };

        let line = request.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["op"], "start_kernel");
        assert_eq!(value["module"], "ipykernel_launcher");
        assert_eq!(value["args"][1], "file.json");
        assert_eq!(value["env"]["hello"], "1");

        let decoded: DaemonRequest = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_ping_request_is_flat() {
        let request = DaemonRequest {
            id: 1,
            op: DaemonOp::Ping,
        };
        assert_eq!(request.encode().unwrap(), r#"{"id":1,"op":"ping"}"#);
    }

    #[test]
    fn test_reply_decoding() {
        let ok = DaemonMessage::decode(r#"{"type":"reply","id":3}"#).unwrap();
        assert_eq!(ok, DaemonMessage::Reply { id: 3, error: None });

        let failed =
            DaemonMessage::decode(r#"{"type":"reply","id":4,"error":"no such module"}"#).unwrap();
        assert_eq!(
            failed,
            DaemonMessage::Reply {
                id: 4,
                error: Some("no such module".to_string())
            }
        );
    }

    #[test]
    fn test_output_event_decoding() {
        let message =
            DaemonMessage::decode("{\"type\":\"output\",\"stream\":\"stderr\",\"data\":\"boom\"}\n")
                .unwrap();
        assert_eq!(
            message,
            DaemonMessage::Output {
                stream: StreamKind::Stderr,
                data: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_kernel_exited_defaults() {
        let message = DaemonMessage::decode(r#"{"type":"kernel_exited"}"#).unwrap();
        assert_eq!(
            message,
            DaemonMessage::KernelExited {
                code: None,
                signal: None
            }
        );
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        assert!(DaemonMessage::decode("not json").is_err());
    }
}
