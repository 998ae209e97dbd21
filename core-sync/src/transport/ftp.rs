//! Device delivery over FTP, typically a file-server app on the phone.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use suppaftp::{FtpError, FtpStream, Status};
use tracing::debug;

use crate::error::SyncError;
use crate::settings::FtpConfig;
use crate::transport::{join_remote, RemoteEntry, Transport};

pub struct FtpTransport {
    stream: FtpStream,
    root: String,
}

impl FtpTransport {
    /// Connects and logs in eagerly; an unreachable or rejecting server
    /// fails the whole pass before any reconciliation starts.
    pub fn connect(config: &FtpConfig, root: impl Into<String>) -> Result<Self, SyncError> {
        let addr = format!("{}:{}", config.host, config.port);
        let mut stream = FtpStream::connect(&addr)
            .map_err(|e| SyncError::Connection(format!("ftp connect to {addr} failed: {e}")))?;
        stream
            .login(&config.user, &config.pass)
            .map_err(|e| SyncError::Connection(format!("ftp login failed: {e}")))?;
        Ok(Self {
            stream,
            root: root.into(),
        })
    }

    fn restore_cwd(&mut self) {
        if let Err(e) = self.stream.cwd("/") {
            debug!(error = %e, "ftp cwd reset failed");
        }
    }
}

impl Transport for FtpTransport {
    fn copy_in(&mut self, local: &Path, remote_rel: &str) -> Result<(), SyncError> {
        let target = join_remote(&self.root, remote_rel);
        let (dir, name) = split_remote(&target);
        let file = File::open(local)?;
        let result = self
            .stream
            .cwd(dir)
            .and_then(|_| self.stream.put_file(name, &mut BufReader::new(file)))
            .map(|_| ())
            .map_err(|e| SyncError::Transport(format!("ftp upload {target} failed: {e}")));
        self.restore_cwd();
        result
    }

    fn remove(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        let target = join_remote(&self.root, remote_rel);
        match self.stream.rm(&target) {
            Ok(()) => Ok(()),
            Err(e) if is_missing(&e) => Ok(()),
            Err(e) => Err(SyncError::Transport(format!("ftp rm {target} failed: {e}"))),
        }
    }

    fn make_dir_all(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        let mut path = self.root.trim_end_matches('/').to_string();
        for part in remote_rel.split('/').filter(|p| !p.is_empty()) {
            path = format!("{path}/{part}");
            // mkdir fails on an existing directory; that is fine here.
            if let Err(e) = self.stream.mkdir(&path) {
                debug!(%path, error = %e, "ftp mkdir skipped");
            }
        }
        Ok(())
    }

    fn list(&mut self, remote_rel: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        let target = join_remote(&self.root, remote_rel);
        if let Err(e) = self.stream.cwd(&target) {
            return if is_missing(&e) {
                Err(SyncError::RemoteNotFound(target))
            } else {
                Err(SyncError::Transport(format!("ftp cwd {target} failed: {e}")))
            };
        }
        let lines = self.stream.list(None);
        self.restore_cwd();
        let lines =
            lines.map_err(|e| SyncError::Transport(format!("ftp list {target} failed: {e}")))?;
        Ok(parse_list_lines(&lines))
    }
}

/// Parses LIST output with suppaftp's structured parser; lines the
/// parser cannot make sense of are skipped rather than failing the pass.
fn parse_list_lines(lines: &[String]) -> Vec<RemoteEntry> {
    lines
        .iter()
        .filter_map(|line| suppaftp::list::File::try_from(line.as_str()).ok())
        .filter(|f| {
            let name = f.name();
            name != "." && name != ".."
        })
        .map(|f| RemoteEntry {
            name: f.name().to_string(),
            is_dir: f.is_directory(),
        })
        .collect()
}

fn is_missing(error: &FtpError) -> bool {
    matches!(
        error,
        FtpError::UnexpectedResponse(resp) if resp.status == Status::FileUnavailable
    )
}

fn split_remote(target: &str) -> (&str, &str) {
    match target.rsplit_once('/') {
        Some((dir, name)) if !dir.is_empty() => (dir, name),
        Some((_, name)) => ("/", name),
        None => ("/", target),
    }
}
