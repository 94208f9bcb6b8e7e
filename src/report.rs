use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const TOOL_NAME: &str = "portreach";

/// Flat-text scan report, one session per file.
///
/// Created fresh (truncating any previous session) before probing
/// starts; creation failure is the caller's cue to abort the session.
/// Probe tasks append concurrently, so a mutex serializes writes and
/// each call emits exactly one line — lines never interleave. Append
/// failures after a successful open are logged and swallowed; a flaky
/// disk should not kill a scan in flight.
pub struct ReportSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl ReportSink {
    pub fn create(path: impl AsRef<Path>, target: Ipv4Addr) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path)
            .with_context(|| format!("failed to open report file {}", path.display()))?;
        let header = format!("*{TOOL_NAME} scan*\nReport for: {target}\n-------------------\n");
        file.write_all(header.as_bytes())
            .with_context(|| format!("failed to write report header to {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one whole line to the report.
    pub fn append_line(&self, line: &str) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(path = %self.path.display(), error = %e, "report append failed");
        }
    }
}

pub fn open_port_line(port: u16, service: Option<&str>) -> String {
    format!(
        "Port {port} is open (Service: {}).",
        service.unwrap_or("Unknown")
    )
}

pub fn filtered_line(port: u16) -> String {
    format!("Port {port} is filtered.")
}

pub fn os_guess_line(label: Option<&str>) -> String {
    match label {
        Some(label) => format!("Operating System might be {label}"),
        None => "Unable to determine the Operating System".to_string(),
    }
}
