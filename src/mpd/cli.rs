//! [`CommandRunner`] implementation that spawns the `mpc` binary.

use crate::command::MpcCommand;
use crate::config::MpcConfig;
use crate::traits::CommandRunner;
use log::debug;
use std::process::{Command, Stdio};

/// Runs `mpc` as a child process, once per command.
///
/// Standard error is discarded; a non-zero exit status is reported as
/// [`MpcError::Failed`].
#[derive(Debug, Clone)]
pub struct MpcCli {
    program: String,
    host: Option<String>,
    port: Option<u16>,
}

/// Errors from invoking `mpc`.
#[derive(Debug, thiserror::Error)]
pub enum MpcError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`mpc {command}` exited with {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },
    #[error("mpc output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Default for MpcCli {
    fn default() -> Self {
        Self::new(&MpcConfig::default())
    }
}

impl MpcCli {
    pub fn new(config: &MpcConfig) -> Self {
        Self {
            program: config.program.clone(),
            host: config.host.clone(),
            port: config.port,
        }
    }

    /// Full argument list for `command`, connection options first.
    fn argv(&self, command: &MpcCommand) -> Vec<String> {
        let mut argv = Vec::new();
        if let Some(host) = &self.host {
            argv.push("--host".to_string());
            argv.push(host.clone());
        }
        if let Some(port) = self.port {
            argv.push("--port".to_string());
            argv.push(port.to_string());
        }
        argv.extend(command.args());
        argv
    }
}

impl CommandRunner for MpcCli {
    type Error = MpcError;

    fn run(&self, command: &MpcCommand) -> Result<String, MpcError> {
        let argv = self.argv(command);
        debug!("{} {}", self.program, argv.join(" "));

        let output = Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| MpcError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(MpcError::Failed {
                command: command.to_string(),
                status: output.status,
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_without_connection_options() {
        let cli = MpcCli::default();
        assert_eq!(cli.argv(&MpcCommand::Volume(20)), vec!["volume", "20"]);
    }

    #[test]
    fn argv_with_host_and_port() {
        let cli = MpcCli::new(&MpcConfig {
            program: "mpc".into(),
            host: Some("media.local".into()),
            port: Some(6601),
        });
        assert_eq!(
            cli.argv(&MpcCommand::Status),
            vec!["--host", "media.local", "--port", "6601", "status"]
        );
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let cli = MpcCli::new(&MpcConfig {
            program: "/nonexistent/barblocks-mpc".into(),
            host: None,
            port: None,
        });
        let err = cli.run(&MpcCommand::Status).unwrap_err();
        assert!(matches!(err, MpcError::Spawn { .. }));
    }

    #[test]
    fn non_zero_exit_is_failure() {
        // `false` ignores its arguments and exits 1.
        let cli = MpcCli::new(&MpcConfig {
            program: "false".into(),
            host: None,
            port: None,
        });
        let err = cli.run(&MpcCommand::Toggle).unwrap_err();
        assert!(matches!(err, MpcError::Failed { .. }));
    }
}
