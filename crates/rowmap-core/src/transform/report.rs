//! Transform reports
//!
//! A successful transform can still lose information on purpose: transient
//! keys are dropped, duplicate sources are merged, partial column groups may
//! be omitted. The report records each of those decisions so callers can
//! audit them without re-deriving the rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Direction of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ToPersistence,
    FromPersistence,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToPersistence => write!(f, "to_persistence"),
            Direction::FromPersistence => write!(f, "from_persistence"),
        }
    }
}

/// Kind of a reported decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCode {
    /// A transient key was removed
    Dropped,
    /// Two sources produced the same destination with equal values
    Deduplicated,
    /// A structured key was spread over columns or regrouped from them
    Consumed,
    /// A partial column group was left out of the record
    Omitted,
    /// An unmapped key was forwarded under its own name
    Passthrough,
}

impl ReportCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCode::Dropped => "dropped",
            ReportCode::Deduplicated => "deduplicated",
            ReportCode::Consumed => "consumed",
            ReportCode::Omitted => "omitted",
            ReportCode::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    pub code: ReportCode,
    pub key: String,
    pub message: String,

    /// Columns or keys involved besides `key`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

/// Audit of one transform call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformReport {
    pub direction: Direction,
    pub items: Vec<ReportItem>,
    pub input_keys: usize,
    pub output_keys: usize,
    pub started_at: DateTime<Utc>,
    pub duration_us: u64,
}

impl TransformReport {
    /// Items of one kind in the order they were recorded
    pub fn by_code(&self, code: ReportCode) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(move |item| item.code == code)
    }

    pub fn count(&self, code: ReportCode) -> usize {
        self.by_code(code).count()
    }

    /// True when nothing was dropped, omitted or passed through unmapped
    pub fn is_lossless(&self) -> bool {
        self.items
            .iter()
            .all(|item| matches!(item.code, ReportCode::Consumed | ReportCode::Deduplicated))
    }

    /// Item counts keyed by code name
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for item in &self.items {
            *summary.entry(item.code.as_str()).or_insert(0) += 1;
        }
        summary
    }
}

/// Collects report items while a transform runs
#[derive(Debug)]
pub(crate) struct ReportTracker {
    items: Vec<ReportItem>,
    started_at: DateTime<Utc>,
    timer: Instant,
}

impl ReportTracker {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            started_at: Utc::now(),
            timer: Instant::now(),
        }
    }

    fn push(&mut self, code: ReportCode, key: &str, message: String, related: Vec<String>) {
        self.items.push(ReportItem {
            code,
            key: key.to_string(),
            message,
            related,
        });
    }

    pub(crate) fn dropped(&mut self, key: &str) {
        tracing::debug!(key, "Dropped transient key");
        self.push(ReportCode::Dropped, key, format!("Transient key '{key}' dropped"), Vec::new());
    }

    pub(crate) fn dropped_null_flag(&mut self, key: &str) {
        tracing::debug!(key, "Dropped null status flag");
        self.push(
            ReportCode::Dropped,
            key,
            format!("Null status flag '{key}' dropped"),
            Vec::new(),
        );
    }

    pub(crate) fn deduplicated(&mut self, destination: &str, sources: Vec<String>) {
        tracing::debug!(destination, ?sources, "Merged equal values");
        self.push(
            ReportCode::Deduplicated,
            destination,
            format!("'{}' produced by {} with equal values", destination, sources.join(", ")),
            sources,
        );
    }

    pub(crate) fn consumed(&mut self, key: &str, message: String, related: Vec<String>) {
        self.push(ReportCode::Consumed, key, message, related);
    }

    pub(crate) fn omitted(&mut self, key: &str, missing_members: &[String], stray: Vec<String>) {
        tracing::warn!(key, ?missing_members, "Omitted partial compound field");
        self.push(
            ReportCode::Omitted,
            key,
            format!("'{}' omitted, missing {}", key, missing_members.join(", ")),
            stray,
        );
    }

    pub(crate) fn passthrough(&mut self, key: &str) {
        tracing::warn!(key, "Forwarded unmapped key unchanged");
        self.push(
            ReportCode::Passthrough,
            key,
            format!("Unmapped key '{key}' forwarded under its own name"),
            Vec::new(),
        );
    }

    pub(crate) fn finish(
        self,
        direction: Direction,
        input_keys: usize,
        output_keys: usize,
    ) -> TransformReport {
        TransformReport {
            direction,
            items: self.items,
            input_keys,
            output_keys,
            started_at: self.started_at,
            duration_us: u64::try_from(self.timer.elapsed().as_micros()).unwrap_or(u64::MAX),
        }
    }
}
