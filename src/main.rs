use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use portreach::cli::{self, Cli, ScanMode};
use portreach::report::{self, ReportSink};
use portreach::scanner::{catalog, discovery, os_fingerprint, Scanner};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    println!("{}", report::TOOL_NAME.bright_green().bold());
    println!("host discovery and TCP connect scan\n");

    let mode = cli::resolve_mode(cli.mode)?;
    let target = cli::resolve_target(cli.target)?;

    // The report file gates the session: abort before any probing if it
    // cannot be created.
    let sink = Arc::new(ReportSink::create(&cli.report_file, target)?);

    let up = tokio::task::spawn_blocking(move || discovery::is_host_up(target)).await?;

    if mode == ScanMode::Ping {
        if up {
            println!("{}", "Host is up".green());
        } else {
            println!("{}", "Host is down or not reachable".red());
        }
        return Ok(());
    }

    if !up {
        println!("Host {target} is down or not reachable.");
        return Ok(());
    }
    println!("Host is up. Starting port scan...");

    let scanner = Scanner::new(cli.concurrency, cli.timeout);
    let summary = scanner
        .scan(target, catalog::PORT_CATALOG, sink.clone())
        .await?;

    let os_line = report::os_guess_line(os_fingerprint::guess_os(&summary.record));
    sink.append_line(&os_line);
    println!("{}", os_line.as_str().cyan());

    println!(
        "\n{} open, {} filtered, {} unscanned of {} ports in {}ms; report written to {}",
        summary.open_count(),
        summary.filtered_count(),
        summary.unscanned.len(),
        catalog::PORT_CATALOG.len(),
        (summary.end_time - summary.start_time).num_milliseconds(),
        sink.path().display(),
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
