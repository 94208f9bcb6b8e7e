use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Verdict for a single probed port. Exactly one is produced per
/// catalog port per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortStatus {
    Open,
    Closed,
    Filtered,
    Error,
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortStatus::Open => write!(f, "open"),
            PortStatus::Closed => write!(f, "closed"),
            PortStatus::Filtered => write!(f, "filtered"),
            PortStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortResult {
    pub port: u16,
    pub status: PortStatus,
    pub service: Option<&'static str>,
}

/// Which ports a scan found open, indexed by port number.
///
/// Capacity is fixed at construction to the highest port the catalog
/// actually contains, and every access is bounds-checked: marking a port
/// beyond capacity is rejected, reading one answers `false`.
///
/// Each slot is written by at most one probe task — the task that
/// scanned that exact port — so slots never contend. The atomics exist
/// for publication: a Release store by the probing task pairs with
/// Acquire loads by whoever reads the record after the join barrier.
#[derive(Debug)]
pub struct OpenPortRecord {
    slots: Vec<AtomicBool>,
}

impl OpenPortRecord {
    /// Record sized to hold ports `0..=max_port`.
    pub fn with_max_port(max_port: u16) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(max_port as usize + 1, AtomicBool::default);
        Self { slots }
    }

    /// Record sized for a catalog: capacity tracks the highest port in
    /// the list, not the full 16-bit space.
    pub fn sized_for(catalog: &[u16]) -> Self {
        Self::with_max_port(catalog.iter().copied().max().unwrap_or(0))
    }

    /// Number of port slots the record can hold.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Mark `port` open. Returns `false` if the port lies outside the
    /// record's capacity, in which case nothing is recorded.
    pub fn mark_open(&self, port: u16) -> bool {
        match self.slots.get(port as usize) {
            Some(slot) => {
                slot.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self, port: u16) -> bool {
        self.slots
            .get(port as usize)
            .map(|slot| slot.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// All ports marked open, ascending.
    pub fn open_ports(&self) -> Vec<u16> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.load(Ordering::Acquire))
            .map(|(port, _)| port as u16)
            .collect()
    }

    /// Count of ports marked open. Never exceeds `capacity()`.
    pub fn open_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.load(Ordering::Acquire))
            .count()
    }

    /// Independent copy with the same capacity and open set.
    pub fn snapshot(&self) -> Self {
        let copy = Self {
            slots: (0..self.slots.len()).map(|_| AtomicBool::default()).collect(),
        };
        for port in self.open_ports() {
            copy.mark_open(port);
        }
        copy
    }
}

fn serialize_record<S: Serializer>(record: &OpenPortRecord, s: S) -> Result<S::Ok, S::Error> {
    record.open_ports().serialize(s)
}

/// Everything a completed scan produced. The record is only handed out
/// once every probe task has been joined, so readers never observe a
/// partially filled scan.
#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub target: Ipv4Addr,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub ports: Vec<PortResult>,
    /// Ports whose probe task died before producing a verdict. Skipped,
    /// not closed and not filtered.
    pub unscanned: Vec<u16>,
    #[serde(rename = "open_ports", serialize_with = "serialize_record")]
    pub record: OpenPortRecord,
}

impl ScanSummary {
    pub fn open_count(&self) -> usize {
        self.record.open_count()
    }

    pub fn filtered_count(&self) -> usize {
        self.ports
            .iter()
            .filter(|p| p.status == PortStatus::Filtered)
            .count()
    }
}
