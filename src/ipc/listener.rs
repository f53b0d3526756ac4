//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! "Toggle"
//! "ToggleAll"
//! {"Key":"right"}
//! {"Key":28}
//! {"PointerMotion":{"x":640,"y":360}}
//! {"Click":"left"}
//! {"Open":{"geometry":{"x":100,"y":100,"width":800,"height":600}}}
//! {"Close":3}
//! {"SwitchWorkspace":{"x":1,"y":0}}
//! ```

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// File name of the daemon socket inside `$XDG_RUNTIME_DIR`.
pub const SOCKET_NAME: &str = "scalegrid.sock";

/// Default socket path: `$XDG_RUNTIME_DIR/scalegrid.sock`, falling back to
/// the system temp directory when the runtime dir is unset.
pub fn default_socket_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(SOCKET_NAME)
}

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited JSON
/// commands.  When the connection closes, the listener waits for the
/// next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the receiving end of `sink` is dropped.
    /// Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        remove_socket(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            for line in BufReader::new(stream).lines() {
                let text = match line {
                    Ok(text) => text,
                    Err(e) => {
                        error!("read error: {}", e);
                        break;
                    }
                };
                if text.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Command>(&text) {
                    Ok(cmd) => {
                        debug!("received {:?}", cmd);
                        if sink.send(cmd).is_err() {
                            info!("sink closed, shutting down");
                            remove_socket(&self.path);
                            return Ok(());
                        }
                    }
                    Err(e) => error!("bad command {:?}: {}", text, e),
                }
            }
            debug!("client disconnected");
        }
        Ok(())
    }
}

fn remove_socket(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!("could not remove {}: {}", path.display(), e),
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Key, MouseButton, Rect, WindowId};
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("scalegrid-test-{}-{}.sock", std::process::id(), id))
    }

    fn spawn_listener(path: &Path) -> mpsc::Receiver<Command> {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&path);
            let _ = listener.run(tx);
        });
        // Give the listener a moment to bind.
        std::thread::sleep(Duration::from_millis(150));
        rx
    }

    fn collect(rx: &mpsc::Receiver<Command>, n: usize) -> Vec<Command> {
        (0..n)
            .filter_map(|_| rx.recv_timeout(Duration::from_secs(2)).ok())
            .collect()
    }

    #[test]
    fn commands_arrive_over_socket() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#""Toggle""#).unwrap();
            writeln!(stream, r#"{{"Key":"Right"}}"#).unwrap();
            writeln!(stream).unwrap();
            writeln!(stream, r#"{{"Click":"BTN_MIDDLE"}}"#).unwrap();
            writeln!(
                stream,
                r#"{{"Open":{{"geometry":{{"x":1,"y":2,"width":3,"height":4}},"parent":7}}}}"#
            )
            .unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        let cmds = collect(&rx, 4);
        assert_eq!(
            cmds,
            vec![
                Command::Toggle,
                Command::Key(Key::Right),
                Command::Click(MouseButton::Middle),
                Command::Open {
                    geometry: Rect::new(1.0, 2.0, 3.0, 4.0),
                    parent: Some(WindowId(7)),
                },
            ]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_json_does_not_crash() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "not json at all").unwrap();
            writeln!(stream, r#"{{"Key":"sideways"}}"#).unwrap();
            writeln!(stream, r#""ToggleAll""#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        let cmds = collect(&rx, 1);
        assert_eq!(cmds, vec![Command::ToggleAll]);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn closed_sink_removes_the_socket() {
        let path = tmp_socket_path();
        let (tx, rx) = mpsc::channel();
        let handle = {
            let path = path.clone();
            std::thread::spawn(move || UnixSocketListener::new(&path).run(tx))
        };
        std::thread::sleep(Duration::from_millis(150));
        assert!(path.exists());
        drop(rx);

        let mut stream = UnixStream::connect(&path).expect("connect");
        writeln!(stream, r#""Toggle""#).unwrap();
        drop(stream);

        assert!(handle.join().unwrap().is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn accepts_successive_connections() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        for cmd in [r#""Toggle""#, r#"{"Close":2}"#] {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "{}", cmd).unwrap();
        }

        let cmds = collect(&rx, 2);
        assert_eq!(cmds, vec![Command::Toggle, Command::Close(WindowId(2))]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn default_path_ends_with_socket_name() {
        assert!(default_socket_path().ends_with(SOCKET_NAME));
    }
}
