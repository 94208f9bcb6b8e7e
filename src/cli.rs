use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::io::{BufRead, Write};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use crate::scanner::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_MS};

#[derive(Parser, Debug)]
#[command(name = "portreach")]
#[command(version = "0.1.0")]
#[command(about = "Host discovery and TCP connect port scanner", long_about = None)]
pub struct Cli {
    #[arg(value_enum, help = "What to do: ping (liveness only) or scan (full port scan). Prompted for when omitted.")]
    pub mode: Option<ScanMode>,

    #[arg(help = "Target IPv4 address (dotted decimal). Prompted for when omitted.")]
    pub target: Option<Ipv4Addr>,

    #[arg(short = 'f', long, default_value = "scan.txt", help = "Report file path")]
    pub report_file: PathBuf,

    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, help = "Maximum simultaneous port probes")]
    pub concurrency: usize,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS, help = "Per-port connect wait in milliseconds")]
    pub timeout: u64,

    #[arg(long, help = "Also print the scan summary as JSON on stdout")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanMode {
    #[value(name = "ping", help = "Reachability check only")]
    Ping,
    #[value(name = "scan", help = "Reachability check, then full port scan")]
    Scan,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Ping => write!(f, "ping scan"),
            ScanMode::Scan => write!(f, "ports scan"),
        }
    }
}

/// Menu selection as typed at the prompt.
fn parse_menu_choice(input: &str) -> Option<ScanMode> {
    match input.trim() {
        "1" => Some(ScanMode::Ping),
        "2" => Some(ScanMode::Scan),
        _ => None,
    }
}

/// Mode from the command line, or the interactive menu. Invalid menu
/// selections re-prompt until a valid one arrives.
pub fn resolve_mode(arg: Option<ScanMode>) -> Result<ScanMode> {
    if let Some(mode) = arg {
        return Ok(mode);
    }
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    println!("What do you want to do?");
    println!("\t1) ping scan");
    println!("\t2) ports scan");
    prompt("Option number: ")?;
    loop {
        let line = match lines.next() {
            Some(line) => line?,
            None => bail!("no mode selected and stdin closed"),
        };
        if let Some(mode) = parse_menu_choice(&line) {
            return Ok(mode);
        }
        prompt("Not a valid option, try again: ")?;
    }
}

/// Target from the command line, or the interactive prompt. Re-prompts
/// until the input parses as a dotted-decimal IPv4 address.
pub fn resolve_target(arg: Option<Ipv4Addr>) -> Result<Ipv4Addr> {
    if let Some(target) = arg {
        return Ok(target);
    }
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    prompt("Enter target IP address: ")?;
    loop {
        let line = match lines.next() {
            Some(line) => line?,
            None => bail!("no target supplied and stdin closed"),
        };
        match line.trim().parse::<Ipv4Addr>() {
            Ok(target) => return Ok(target),
            Err(_) => prompt("Not a valid IPv4 address, try again: ")?,
        }
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_choice_one_is_ping() {
        assert_eq!(parse_menu_choice("1"), Some(ScanMode::Ping));
        assert_eq!(parse_menu_choice(" 1 "), Some(ScanMode::Ping));
    }

    #[test]
    fn menu_choice_two_is_scan() {
        assert_eq!(parse_menu_choice("2"), Some(ScanMode::Scan));
    }

    #[test]
    fn other_menu_choices_are_invalid() {
        assert_eq!(parse_menu_choice("0"), None);
        assert_eq!(parse_menu_choice("3"), None);
        assert_eq!(parse_menu_choice("ping"), None);
        assert_eq!(parse_menu_choice(""), None);
    }

    #[test]
    fn args_supply_mode_and_target_without_prompting() {
        let cli = Cli::try_parse_from(["portreach", "scan", "192.168.1.1"]).unwrap();
        assert_eq!(cli.mode, Some(ScanMode::Scan));
        assert_eq!(cli.target, Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(cli.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn malformed_target_arg_is_rejected() {
        assert!(Cli::try_parse_from(["portreach", "scan", "not-an-ip"]).is_err());
        assert!(Cli::try_parse_from(["portreach", "scan", "1.2.3.4.5"]).is_err());
    }

    #[test]
    fn mode_display_matches_menu_wording() {
        assert_eq!(ScanMode::Ping.to_string(), "ping scan");
        assert_eq!(ScanMode::Scan.to_string(), "ports scan");
    }
}
