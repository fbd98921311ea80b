use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use fusuma_ipc::{decode, encode, socket_path, Command, Response};

/// Upper bound on one round trip; reloads run on the daemon's main thread.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct IpcClient {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
}

impl IpcClient {
    pub fn connect() -> Result<Self> {
        Self::connect_to(&socket_path())
    }

    pub fn connect_to(path: &Path) -> Result<Self> {
        let writer = UnixStream::connect(path).with_context(|| {
            format!(
                "Failed to connect to fusuma daemon at {:?} (is `fusuma start` running?)",
                path
            )
        })?;
        writer.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        writer.set_write_timeout(Some(REQUEST_TIMEOUT))?;
        let reader = BufReader::new(writer.try_clone()?);
        Ok(Self { reader, writer })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        self.writer.write_all(encode(cmd)?.as_bytes())?;
        self.writer.flush()?;

        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .context("No response from fusuma daemon")?;
        if n == 0 {
            bail!("fusuma daemon closed the connection");
        }

        decode(&line).context("Malformed response from fusuma daemon")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;
    use std::thread;

    fn temp_socket(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fusuma-client-{}-{}.sock", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    /// Accept one connection, read one line, answer with `reply` verbatim.
    fn fake_daemon(path: &Path, reply: &'static str) -> thread::JoinHandle<String> {
        let listener = UnixListener::bind(path).unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            reader.read_line(&mut request).unwrap();
            (&stream).write_all(reply.as_bytes()).unwrap();
            request
        })
    }

    #[test]
    fn test_send_round_trip() {
        let path = temp_socket("ok");
        let daemon = fake_daemon(&path, "{\"type\":\"ok\"}\n");

        let mut client = IpcClient::connect_to(&path).unwrap();
        assert_eq!(client.send(&Command::Reflow).unwrap(), Response::Ok);
        assert_eq!(daemon.join().unwrap(), "{\"type\":\"reflow\"}\n");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_send_closed_connection() {
        let path = temp_socket("closed");
        let daemon = fake_daemon(&path, "");

        let mut client = IpcClient::connect_to(&path).unwrap();
        let err = client.send(&Command::Quit).unwrap_err();
        assert!(err.to_string().contains("closed the connection"));
        daemon.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_send_malformed_response() {
        let path = temp_socket("garbage");
        let daemon = fake_daemon(&path, "garbage\n");

        let mut client = IpcClient::connect_to(&path).unwrap();
        let err = client.send(&Command::ListBindings).unwrap_err();
        assert!(err.to_string().contains("Malformed response"));
        daemon.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_connect_without_daemon() {
        let path = temp_socket("missing");
        let err = IpcClient::connect_to(&path).err().unwrap();
        assert!(err.to_string().contains("fusuma start"));
    }
}
