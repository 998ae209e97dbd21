//! Batch delivery over rsync, either to `user@host:dest` over ssh or to
//! a local directory when no host is configured.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::SyncError;
use crate::settings::{RsyncConfig, SyncSettings};
use crate::syncer::SyncLogger;
use crate::transport::{join_remote, RemoteEntry, Transport};

/// Mirrors the selected files onto the destination in one rsync
/// invocation. rsync handles copy and pruning itself, so the pass skips
/// the per-file reconciliation used by the other modes.
pub fn run_batch(
    settings: &SyncSettings,
    rel_paths: &[String],
    logger: &SyncLogger,
) -> Result<(), SyncError> {
    if rel_paths.is_empty() {
        logger.log("No files selected for sync; skipping rsync transfer");
        return Ok(());
    }
    if settings.roots.is_empty() {
        return Err(SyncError::Config("no scan paths configured".into()));
    }

    let mut include_file = NamedTempFile::new()?;
    for line in build_include_list(rel_paths) {
        writeln!(include_file, "{line}")?;
    }
    include_file.flush()?;

    let (program, args) = command_line(settings, include_file.path());
    debug!(%program, ?args, "running rsync");
    let output = Command::new(&program)
        .args(&args)
        .output()
        .map_err(|e| SyncError::Connection(format!("{program} not available: {e}")))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        if !line.trim().is_empty() {
            logger.log(line.trim());
        }
    }
    if output.status.success() {
        Ok(())
    } else {
        Err(SyncError::Transport(format!(
            "rsync exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Expands each selected path into an rsync include list: every ancestor
/// directory with a trailing slash, then the file itself, deduplicated
/// and sorted so parents precede children.
pub fn build_include_list(rel_paths: &[String]) -> Vec<String> {
    let mut lines = BTreeSet::new();
    for rel in rel_paths {
        let rel = rel.trim_matches('/');
        if rel.is_empty() {
            continue;
        }
        let mut prefix = String::new();
        let mut parts = rel.split('/').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                prefix.push_str(part);
                prefix.push('/');
                lines.insert(prefix.clone());
            } else {
                lines.insert(format!("{prefix}{part}"));
            }
        }
    }
    lines.into_iter().collect()
}

fn command_line(settings: &SyncSettings, include_file: &Path) -> (String, Vec<String>) {
    let mut program = "rsync".to_string();
    let mut args = Vec::new();
    if let (Some(password), None) = (&settings.rsync.password, &settings.rsync.key_file) {
        program = "sshpass".to_string();
        args.extend(["-p".to_string(), password.clone(), "rsync".to_string()]);
    }
    args.extend([
        "-avz".to_string(),
        "--delete-excluded".to_string(),
        format!("--include-from={}", include_file.display()),
        "--exclude=*".to_string(),
    ]);
    if settings.rsync.host.is_some() {
        args.extend(["-e".to_string(), ssh_command(&settings.rsync)]);
    }
    // No trailing slash: transfer paths must carry the root's directory
    // name, since the include list is built from root-parent-relative
    // paths ("lib/", "lib/A/", "lib/A/x.mp3").
    for root in &settings.roots {
        args.push(root.trim_end_matches('/').to_string());
    }
    args.push(remote_spec(&settings.rsync, &settings.dest));
    (program, args)
}

fn ssh_command(config: &RsyncConfig) -> String {
    match &config.key_file {
        Some(key) => format!("ssh -p {} -i {}", config.port, key),
        None => format!("ssh -p {}", config.port),
    }
}

fn remote_spec(config: &RsyncConfig, dest: &str) -> String {
    match (&config.host, &config.user) {
        (Some(host), Some(user)) => format!("{user}@{host}:{dest}"),
        (Some(host), None) => format!("{host}:{dest}"),
        (None, _) => dest.to_string(),
    }
}

/// Post-transfer playlist delivery for rsync mode. With no host
/// configured the destination is a plain directory; against a remote
/// host only `copy_in` is meaningful, via a one-file rsync.
pub struct RsyncTransport {
    dest: String,
    config: RsyncConfig,
}

impl RsyncTransport {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            dest: settings.dest.clone(),
            config: settings.rsync.clone(),
        }
    }
}

impl Transport for RsyncTransport {
    fn copy_in(&mut self, local: &Path, remote_rel: &str) -> Result<(), SyncError> {
        if self.config.host.is_none() {
            let target = join_remote(&self.dest, remote_rel);
            if let Some(parent) = Path::new(&target).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(local, &target)?;
            return Ok(());
        }
        let mut program = "rsync".to_string();
        let mut args = Vec::new();
        if let (Some(password), None) = (&self.config.password, &self.config.key_file) {
            program = "sshpass".to_string();
            args.extend(["-p".to_string(), password.clone(), "rsync".to_string()]);
        }
        args.extend([
            "-az".to_string(),
            "-e".to_string(),
            ssh_command(&self.config),
            local.display().to_string(),
            format!(
                "{}/{}",
                remote_spec(&self.config, &self.dest),
                remote_rel.trim_start_matches('/')
            ),
        ]);
        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| SyncError::Connection(format!("{program} not available: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SyncError::Transport(format!(
                "rsync upload of {remote_rel} exited with {}",
                output.status
            )))
        }
    }

    fn remove(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        if self.config.host.is_none() {
            let target = join_remote(&self.dest, remote_rel);
            match std::fs::remove_file(&target) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        } else {
            // The batch transfer already prunes the remote side.
            debug!(remote_rel, "rsync remove skipped against remote host");
            Ok(())
        }
    }

    fn make_dir_all(&mut self, remote_rel: &str) -> Result<(), SyncError> {
        if self.config.host.is_none() {
            std::fs::create_dir_all(join_remote(&self.dest, remote_rel))?;
        }
        Ok(())
    }

    fn list(&mut self, remote_rel: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        if self.config.host.is_some() {
            return Ok(Vec::new());
        }
        let target = join_remote(&self.dest, remote_rel);
        let entries = match std::fs::read_dir(&target) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::RemoteNotFound(target))
            }
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            out.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        Ok(out)
    }
}
