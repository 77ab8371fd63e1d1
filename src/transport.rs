//! Control socket transport.
//!
//! wpa_supplicant publishes one Unix datagram socket per adapter. A client
//! binds its own datagram socket to a private path, connects it to the
//! adapter's control socket and then exchanges exactly one reply datagram
//! per command datagram. There is no framing and no request id, so a
//! session must never have more than one request in flight.

use anyhow::{Context, Result};
use std::cell::Cell;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::WifiCtlError;

/// Largest reply datagram accepted from the supplicant.
pub const REPLY_SIZE: usize = 64 * 1024;

/// Prefix of the private socket file bound for each adapter.
pub const LOCAL_SOCKET_PREFIX: &str = "wifictl";

/// Tunables applied when a session is opened.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Number of extra receives attempted while waiting for `PONG`.
    pub handshake_retries: u32,
    /// Receive timeout for each handshake attempt.
    pub handshake_timeout: Option<Duration>,
    /// Receive timeout for regular requests. `None` blocks until a reply
    /// arrives.
    pub reply_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            handshake_retries: 3,
            handshake_timeout: Some(Duration::from_secs(1)),
            reply_timeout: None,
        }
    }
}

/// A live session with one adapter's control socket.
///
/// Replies arrive in command order. A request that timed out still gets its
/// reply later; the session counts those and discards them before reading
/// the reply to the next command.
#[derive(Debug)]
pub struct ControlSocket {
    iface: String,
    sock: UnixDatagram,
    local_path: PathBuf,
    ctrl_path: PathBuf,
    /// Replies still owed for requests that timed out.
    late_replies: Cell<usize>,
}

impl ControlSocket {
    /// Binds `<socket_dir>/wifictl_<iface>`, connects it to
    /// `<ctrl_dir>/<iface>` and performs the `PING`/`PONG` handshake.
    pub fn open(
        ctrl_dir: &Path,
        socket_dir: &Path,
        iface: &str,
        options: &SessionOptions,
    ) -> Result<Self> {
        let ctrl_path = ctrl_dir.join(iface);
        let local_path = local_socket_path(socket_dir, iface);

        remove_stale_socket(&local_path)?;

        let sock = UnixDatagram::bind(&local_path)
            .with_context(|| format!("Failed to bind local socket {}", local_path.display()))?;

        // From here on Drop takes care of the socket file.
        let session = Self {
            iface: iface.to_string(),
            sock,
            local_path,
            ctrl_path,
            late_replies: Cell::new(0),
        };

        session
            .sock
            .connect(&session.ctrl_path)
            .with_context(|| {
                format!(
                    "Failed to connect to control socket {}",
                    session.ctrl_path.display()
                )
            })?;

        session.handshake(options)?;

        session
            .sock
            .set_read_timeout(non_zero(options.reply_timeout))
            .context("Failed to set reply timeout")?;

        Ok(session)
    }

    /// Name of the adapter this session talks to.
    pub fn iface(&self) -> &str {
        &self.iface
    }

    /// The supplicant's control socket, `<ctrl_dir>/<iface>`.
    pub fn ctrl_path(&self) -> &Path {
        &self.ctrl_path
    }

    /// The private socket bound for this session. Removed on drop.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Number of timed-out requests whose replies have not been seen yet.
    pub fn late_replies(&self) -> usize {
        self.late_replies.get()
    }

    fn handshake(&self, options: &SessionOptions) -> Result<()> {
        self.sock
            .set_read_timeout(non_zero(options.handshake_timeout))
            .context("Failed to set handshake timeout")?;

        self.sock
            .send(b"PING")
            .with_context(|| format!("Failed to send PING to {}", self.ctrl_path.display()))?;

        // The supplicant may be slow to answer; keep receiving without
        // re-sending PING.
        let mut buf = vec![0u8; REPLY_SIZE];
        for attempt in 0..=options.handshake_retries {
            match self.sock.recv(&mut buf) {
                Ok(0) => {
                    error!(ctrl = %self.ctrl_path.display(), "connection is broken");
                    return Err(WifiCtlError::Handshake {
                        iface: self.iface.clone(),
                        reason: "connection closed by peer".to_string(),
                    }
                    .into());
                }
                Ok(n) if buf[..n].starts_with(b"PONG") => {
                    info!(ctrl = %self.ctrl_path.display(), "connected to control socket");
                    return Ok(());
                }
                Ok(n) => {
                    debug!(
                        attempt,
                        reply = %String::from_utf8_lossy(&buf[..n]),
                        "unexpected handshake reply"
                    );
                }
                Err(e) if is_timeout(&e) => {
                    debug!(attempt, "handshake receive timed out");
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to receive from {}", self.ctrl_path.display())
                    });
                }
            }
        }

        Err(WifiCtlError::Handshake {
            iface: self.iface.clone(),
            reason: format!("no PONG after {} attempts", options.handshake_retries + 1),
        }
        .into())
    }

    /// Sends `cmd` and returns the raw reply text.
    ///
    /// # Returns
    /// - `Ok(String)` with the reply datagram, newline included
    /// - `Err(WifiCtlError::Timeout)` if no reply arrives within the
    ///   session's reply timeout
    pub fn request(&self, cmd: &str) -> Result<String> {
        info!(iface = %self.iface, cmd = redact(cmd), "send command");

        self.sock
            .send(cmd.as_bytes())
            .with_context(|| format!("Failed to send '{}' to {}", redact(cmd), self.iface))?;

        let mut buf = vec![0u8; REPLY_SIZE];
        loop {
            let n = match self.sock.recv(&mut buf) {
                Ok(n) => n,
                Err(e) if is_timeout(&e) => {
                    self.late_replies.set(self.late_replies.get() + 1);
                    return Err(WifiCtlError::Timeout(format!(
                        "no reply to '{}' from {}",
                        redact(cmd),
                        self.iface
                    ))
                    .into());
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to receive reply from {}", self.iface));
                }
            };

            let reply = String::from_utf8_lossy(&buf[..n]).into_owned();
            let late = self.late_replies.get();
            if late > 0 {
                self.late_replies.set(late - 1);
                debug!(iface = %self.iface, reply = %reply.trim_end(), "discarding late reply");
                continue;
            }

            debug!(iface = %self.iface, reply = %reply.trim_end(), "reply");
            return Ok(reply);
        }
    }

    /// Sends a command that is acknowledged with `OK`. Any other reply is
    /// logged and otherwise ignored.
    pub fn send(&self, cmd: &str) -> Result<()> {
        let reply = self.request(cmd)?;
        if reply != "OK\n" {
            error!(
                iface = %self.iface,
                cmd = redact(cmd),
                reply = %reply.trim_end(),
                "unexpected reply"
            );
        }
        Ok(())
    }
}

impl Drop for ControlSocket {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.local_path);
    }
}

/// Private socket path used for `iface` under `socket_dir`.
pub fn local_socket_path(socket_dir: &Path, iface: &str) -> PathBuf {
    socket_dir.join(format!("{}_{}", LOCAL_SOCKET_PREFIX, iface))
}

/// Commands carrying a pre-shared key are never logged verbatim.
pub fn redact(cmd: &str) -> &str {
    if cmd.contains("psk") { "<redacted>" } else { cmd }
}

/// Removes a socket left behind by a previous run. Anything other than a
/// socket at that path is left alone and reported.
fn remove_stale_socket(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect {}", path.display()));
        }
    };

    if !meta.file_type().is_socket() {
        anyhow::bail!("Refusing to replace non-socket file {}", path.display());
    }

    debug!(path = %path.display(), "removing stale socket");
    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

// A zero timeout is rejected by set_read_timeout.
fn non_zero(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|t| !t.is_zero())
}
