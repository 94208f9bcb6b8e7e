pub mod catalog;
pub mod discovery;
pub mod os_fingerprint;
pub mod pool;
pub mod results;
pub mod services;
pub mod tcp;

use anyhow::Result;
use colored::Colorize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::time::Duration;

use crate::report::{self, ReportSink};
use pool::BoundedPool;
pub use results::{OpenPortRecord, PortResult, PortStatus, ScanSummary};
use services::service_name;

/// Default cap on simultaneously outstanding probes.
pub const DEFAULT_CONCURRENCY: usize = 50;
/// Default bound on each probe's connect-completion wait, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Drives one full connect scan: fans probe tasks out over the catalog
/// behind an admission pool, funnels Open/Filtered lines to the report
/// sink as they land, and joins every task before handing the record to
/// anyone.
pub struct Scanner {
    concurrency: usize,
    connect_timeout: Duration,
}

impl Scanner {
    pub fn new(concurrency: usize, timeout_ms: u64) -> Self {
        Self {
            concurrency,
            connect_timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub async fn scan(
        &self,
        target: Ipv4Addr,
        catalog: &[u16],
        sink: Arc<ReportSink>,
    ) -> Result<ScanSummary> {
        let record = Arc::new(OpenPortRecord::sized_for(catalog));
        let pool = BoundedPool::new(self.concurrency);

        let pb = ProgressBar::new(catalog.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.green/black} {pos}/{len} ports ({eta})")?
                .progress_chars("=> "),
        );

        let start_time = chrono::Utc::now();

        let mut spawned = Vec::with_capacity(catalog.len());
        let mut tasks = Vec::with_capacity(catalog.len());
        for &port in catalog {
            let record = record.clone();
            let sink = sink.clone();
            let pb = pb.clone();
            let wait = self.connect_timeout;
            let task = pool
                .spawn(async move { probe_port(target, port, wait, record, sink, pb).await })
                .await;
            spawned.push(port);
            tasks.push(task);
        }

        // Join barrier: every probe resolves, or is recorded as
        // unscanned, before the record is released to readers.
        let mut ports = Vec::with_capacity(spawned.len());
        let mut unscanned = Vec::new();
        for (port, joined) in spawned.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(result) => ports.push(result),
                Err(e) => {
                    tracing::warn!(port, error = %e, "probe task died, port left unscanned");
                    unscanned.push(port);
                }
            }
        }
        pb.finish_and_clear();
        let end_time = chrono::Utc::now();

        let record = match Arc::try_unwrap(record) {
            Ok(record) => record,
            // All tasks are joined, so this clone is cold; copy it out.
            Err(shared) => shared.snapshot(),
        };

        Ok(ScanSummary {
            target,
            start_time,
            end_time,
            ports,
            unscanned,
            record,
        })
    }
}

async fn probe_port(
    target: Ipv4Addr,
    port: u16,
    wait: Duration,
    record: Arc<OpenPortRecord>,
    sink: Arc<ReportSink>,
    pb: ProgressBar,
) -> PortResult {
    let status = tcp::classify(target, port, wait).await;
    let mut service = None;
    match status {
        PortStatus::Open => {
            if !record.mark_open(port) {
                tracing::warn!(port, "open port outside record capacity");
            }
            service = service_name(port);
            let line = report::open_port_line(port, service);
            sink.append_line(&line);
            pb.println(line.as_str().green().to_string());
        }
        PortStatus::Filtered => {
            let line = report::filtered_line(port);
            sink.append_line(&line);
            pb.println(line.as_str().yellow().to_string());
        }
        // Closed and errored ports stay out of the report.
        PortStatus::Closed | PortStatus::Error => {}
    }
    pb.inc(1);
    PortResult {
        port,
        status,
        service,
    }
}
