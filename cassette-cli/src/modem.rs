//! Spawn the external minimodem process and expose its stdio as the byte
//! channel the protocol core reads from and writes to.

use std::io;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::debug;

use crate::config::Config;

/// A running modem child. Kill the receive side once a frame completes;
/// the transmit side exits on its own when stdin closes.
pub struct Modem {
    child: Child,
}

impl Modem {
    /// `minimodem --tx <baud> --mark <freq>` with piped stdin.
    pub fn spawn_tx(cfg: &Config) -> io::Result<(Self, ChildStdin)> {
        let mut child = Command::new(&cfg.modem_bin)
            .arg("--tx")
            .arg(cfg.baud_rate.to_string())
            .arg("--mark")
            .arg(cfg.mark_freq.to_string())
            .stdin(Stdio::piped())
            .spawn()?;
        debug!("spawned modem tx at {} baud", cfg.baud_rate);
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "modem stdin not piped"))?;
        Ok((Self { child }, stdin))
    }

    /// `minimodem --rx <baud> --mark <freq> --confidence <c>` with piped
    /// stdout.
    pub fn spawn_rx(cfg: &Config) -> io::Result<(Self, ChildStdout)> {
        let mut child = Command::new(&cfg.modem_bin)
            .arg("--rx")
            .arg(cfg.baud_rate.to_string())
            .arg("--mark")
            .arg(cfg.mark_freq.to_string())
            .arg("--confidence")
            .arg(cfg.confidence.to_string())
            .stdout(Stdio::piped())
            .spawn()?;
        debug!("spawned modem rx at {} baud", cfg.baud_rate);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "modem stdout not piped"))?;
        Ok((Self { child }, stdout))
    }

    /// Wait for the child to finish consuming its input.
    pub fn wait(mut self) -> io::Result<()> {
        let status = self.child.wait()?;
        if !status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("modem exited with {status}"),
            ));
        }
        Ok(())
    }

    /// Terminate the child. The receiver is single-shot; once a frame has
    /// been handled there is nothing left to read.
    pub fn kill(mut self) -> io::Result<()> {
        self.child.kill()?;
        self.child.wait()?;
        Ok(())
    }
}
