#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use fusuma_ipc::{decode, encode, Command, Response};

pub type CommandSender = mpsc::Sender<(Command, mpsc::Sender<Response>)>;

/// Control socket of the daemon. Every command is handed to the run loop
/// together with a reply channel; sessions are served concurrently.
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    cmd_tx: CommandSender,
}

impl IpcServer {
    /// Claim `socket_path`. A socket left behind by a dead daemon is replaced,
    /// one that still answers is not.
    pub async fn bind(socket_path: PathBuf, cmd_tx: CommandSender) -> Result<Self> {
        if socket_path.exists() {
            if UnixStream::connect(&socket_path).await.is_ok() {
                bail!("Another fusuma daemon is listening on {:?}", socket_path);
            }
            tracing::debug!("Removing stale socket {:?}", socket_path);
            fs::remove_file(&socket_path)
                .with_context(|| format!("Failed to remove stale socket {:?}", socket_path))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind {:?}", socket_path))?;
        fs::set_permissions(&socket_path, Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict {:?}", socket_path))?;
        tracing::info!("IPC server listening on {:?}", socket_path);

        Ok(Self {
            listener,
            socket_path,
            cmd_tx,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn serve(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let cmd_tx = self.cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_session(stream, cmd_tx).await {
                            tracing::warn!("IPC session ended with error: {:#}", e);
                        }
                    });
                }
                Err(e) => tracing::error!("Accept error: {}", e),
            }
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.socket_path);
    }
}

/// Answer commands until the client hangs up. A session that asked the
/// daemon to quit is closed right after its response.
async fn serve_session(stream: UnixStream, cmd_tx: CommandSender) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (response, last) = match decode::<Command>(&line) {
            Ok(cmd) => {
                let last = cmd == Command::Quit;
                (dispatch(&cmd_tx, cmd).await, last)
            }
            Err(e) => {
                tracing::debug!("Rejected malformed command {:?}: {}", line, e);
                let message = format!("Invalid command: {}", e);
                (Response::Error { message }, false)
            }
        };

        writer.write_all(encode(&response)?.as_bytes()).await?;
        writer.flush().await?;

        if last {
            writer.shutdown().await?;
            break;
        }
    }

    Ok(())
}

async fn dispatch(cmd_tx: &CommandSender, cmd: Command) -> Response {
    tracing::debug!("Received command: {:?}", cmd);
    let (resp_tx, mut resp_rx) = mpsc::channel(1);

    if cmd_tx.send((cmd, resp_tx)).await.is_err() {
        return Response::Error {
            message: "Daemon is shutting down".to_string(),
        };
    }
    resp_rx.recv().await.unwrap_or(Response::Error {
        message: "Daemon dropped the command".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusuma_ipc::BindingInfo;
    use tokio::io::Lines;
    use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

    fn temp_socket(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fusuma-{}-{}.sock", name, std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    /// Stands in for the run loop: answers list-bindings with one binding and
    /// everything else with Ok.
    fn run_loop() -> CommandSender {
        let (tx, mut rx) = mpsc::channel::<(Command, mpsc::Sender<Response>)>(8);
        tokio::spawn(async move {
            while let Some((cmd, resp_tx)) = rx.recv().await {
                let response = match cmd {
                    Command::ListBindings => Response::Bindings {
                        bindings: vec![BindingInfo {
                            key: "cmd+alt+r".to_string(),
                            action: "reflow".to_string(),
                        }],
                    },
                    _ => Response::Ok,
                };
                let _ = resp_tx.send(response).await;
            }
        });
        tx
    }

    async fn start(name: &str) -> PathBuf {
        let path = temp_socket(name);
        let server = IpcServer::bind(path.clone(), run_loop()).await.unwrap();
        tokio::spawn(server.serve());
        path
    }

    async fn connect(path: &Path) -> (Lines<BufReader<OwnedReadHalf>>, OwnedWriteHalf) {
        let (reader, writer) = UnixStream::connect(path).await.unwrap().into_split();
        (BufReader::new(reader).lines(), writer)
    }

    async fn exchange(
        lines: &mut Lines<BufReader<OwnedReadHalf>>,
        writer: &mut OwnedWriteHalf,
        request: &str,
    ) -> Response {
        writer.write_all(request.as_bytes()).await.unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        decode(&line).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_command_keeps_session() {
        let path = start("malformed").await;
        let (mut lines, mut writer) = connect(&path).await;

        match exchange(&mut lines, &mut writer, "{\"type\":\"retile\"}\n").await {
            Response::Error { message } => assert!(message.starts_with("Invalid command")),
            other => panic!("expected an error, got {:?}", other),
        }
        match exchange(&mut lines, &mut writer, "not json\n").await {
            Response::Error { .. } => {}
            other => panic!("expected an error, got {:?}", other),
        }

        // Blank lines are skipped, the session still answers.
        let response = exchange(&mut lines, &mut writer, "\n{\"type\":\"list_bindings\"}\n").await;
        assert!(matches!(response, Response::Bindings { ref bindings } if bindings.len() == 1));
    }

    #[tokio::test]
    async fn test_quit_closes_session() {
        let path = start("quit").await;
        let (mut lines, mut writer) = connect(&path).await;

        let response = exchange(&mut lines, &mut writer, "{\"type\":\"quit\"}\n").await;
        assert_eq!(response, Response::Ok);
        assert!(lines.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bind_refuses_live_socket() {
        let path = start("live").await;
        let result = IpcServer::bind(path.clone(), run_loop()).await;
        assert!(result.is_err());

        // The running daemon is untouched.
        let (mut lines, mut writer) = connect(&path).await;
        let response = exchange(&mut lines, &mut writer, "{\"type\":\"reflow\"}\n").await;
        assert_eq!(response, Response::Ok);
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket() {
        let path = temp_socket("stale");
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let server = IpcServer::bind(path.clone(), run_loop()).await.unwrap();
        let mode = fs::metadata(server.socket_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        drop(server);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_closed_run_loop_reports_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let path = temp_socket("closed");
        let server = IpcServer::bind(path.clone(), tx).await.unwrap();
        tokio::spawn(server.serve());

        let (mut lines, mut writer) = connect(&path).await;
        let response = exchange(&mut lines, &mut writer, "{\"type\":\"reload\"}\n").await;
        assert_eq!(
            response,
            Response::Error {
                message: "Daemon is shutting down".to_string()
            }
        );
    }
}
