// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report store.
//!
//! A bounded, newest-first collection of saved reports held in a single
//! [`StorageBackend`] slot. Every mutation reads the whole collection,
//! changes it and writes it back under an async mutex, so operations are
//! atomic within one process. Separate processes sharing a backend are
//! last writer wins.

mod backend;
pub mod sqlite;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use sqlite::SqliteBackend;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::summarize;
use crate::error::{Error, Result};
use crate::finding::{AnalysisResult, Report};

/// Version tag written into export bundles
pub const BUNDLE_FORMAT_VERSION: &str = "1.0";

/// Capacity limits of the persisted collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_reports: usize,
    pub max_bytes: u64,
}

impl StoreLimits {
    /// Number of reports kept; the newest report is always retained
    pub fn capacity(&self) -> usize {
        self.max_reports.max(1)
    }
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_reports: 50,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Input to [`ReportStore::save`]
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub result: AnalysisResult,
}

impl NewReport {
    pub fn new(title: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            title: title.into(),
            result,
        }
    }

    /// Title used when the caller gives none
    pub fn default_title(at: DateTime<Utc>) -> String {
        format!("Accessibility Report - {}", at.format("%Y-%m-%d %H:%M"))
    }
}

/// Outcome of [`ReportStore::import_bundle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Serialized size of the collection against its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub max_bytes: u64,
    pub percent_used: u64,
}

/// How often a rule was hit across all saved reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFrequency {
    pub rule_id: String,
    pub count: usize,
}

/// Aggregate figures over the saved reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatistics {
    pub total_reports: usize,
    pub total_issues: usize,
    pub average_issues_per_report: usize,
    pub most_frequent_rule_ids: Vec<RuleFrequency>,
    pub reports_in_last_n_days: usize,
}

/// Portable export of the whole collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub exported_at_utc: DateTime<Utc>,
    pub format_version: String,
    pub reports: Vec<Report>,
}

/// Start of the `days`-day window ending now; saturates to the earliest
/// representable time when the window is out of range
fn cutoff_for(days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Format a byte count for humans ("0 Bytes", "1.5 KB", "5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Bounded report collection over a storage backend
pub struct ReportStore<B: StorageBackend> {
    backend: B,
    limits: StoreLimits,
    write_lock: Mutex<()>,
}

impl<B: StorageBackend> ReportStore<B> {
    /// Open the backend and wrap it in a store
    pub async fn open(mut backend: B, limits: StoreLimits) -> Result<Self> {
        backend.open().await?;
        debug!(
            max_reports = limits.max_reports,
            max_bytes = limits.max_bytes,
            "Report store opened"
        );
        Ok(Self {
            backend,
            limits,
            write_lock: Mutex::new(()),
        })
    }

    /// Close the underlying backend
    pub async fn close(mut self) -> Result<()> {
        self.backend.close().await
    }

    /// Configured limits
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    async fn load(&self) -> Vec<Report> {
        let payload = match self.backend.read().await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Error loading reports: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&payload) {
            Ok(reports) => reports,
            Err(e) => {
                warn!("Stored report collection is unreadable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, reports: &[Report]) -> Result<()> {
        let payload = serde_json::to_string(reports)?;
        self.write_payload(&payload).await
    }

    async fn write_payload(&self, payload: &str) -> Result<()> {
        self.backend
            .write(payload)
            .await
            .map_err(|e| Error::Storage(format!("Failed to save reports: {}", e)))
    }

    /// Drop oldest reports until the serialized collection fits `max_bytes`
    fn fit_to_size(&self, reports: &mut Vec<Report>) -> Result<String> {
        loop {
            let payload = serde_json::to_string(&*reports)?;
            if payload.len() as u64 <= self.limits.max_bytes {
                return Ok(payload);
            }
            if reports.len() <= 1 {
                return Err(Error::Storage(format!(
                    "Report is larger than the storage limit of {}",
                    format_bytes(self.limits.max_bytes)
                )));
            }
            reports.pop();
        }
    }

    /// Save a new report and return its id
    pub async fn save(&self, new: NewReport) -> Result<String> {
        let _guard = self.write_lock.lock().await;
        let mut reports = self.load().await;

        let severity_counts = summarize(new.result.findings());
        let report = Report {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            created_at_utc: Utc::now(),
            result: new.result,
            severity_counts,
        };
        let id = report.id.clone();

        reports.insert(0, report);
        reports.truncate(self.limits.capacity());
        let payload = self.fit_to_size(&mut reports)?;
        self.write_payload(&payload).await?;

        info!(id = %id, kept = reports.len(), "Saved report");
        Ok(id)
    }

    /// Look up one report
    pub async fn get(&self, id: &str) -> Option<Report> {
        self.load().await.into_iter().find(|r| r.id == id)
    }

    /// All reports, newest first
    pub async fn list(&self) -> Vec<Report> {
        self.load().await
    }

    /// Remove a report; `false` if no report has that id
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut reports = self.load().await;

        let Some(pos) = reports.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        reports.remove(pos);
        self.persist(&reports).await?;

        info!(id = %id, "Deleted report");
        Ok(true)
    }

    /// Remove every report
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.backend
            .remove()
            .await
            .map_err(|e| Error::Storage(format!("Failed to clear reports: {}", e)))?;
        info!("Cleared all reports");
        Ok(())
    }

    /// Reports whose title or analysed markup contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> Vec<Report> {
        let query = query.to_lowercase();
        self.load()
            .await
            .into_iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&query)
                    || r.result.source_markup().to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Reports saved within the last `days` days
    pub async fn filter_by_age(&self, days: i64) -> Vec<Report> {
        let cutoff = cutoff_for(days);
        self.load()
            .await
            .into_iter()
            .filter(|r| r.created_at_utc >= cutoff)
            .collect()
    }

    /// Serialize every report into a bundle
    pub async fn export_all(&self) -> Result<String> {
        let bundle = ExportBundle {
            exported_at_utc: Utc::now(),
            format_version: BUNDLE_FORMAT_VERSION.to_string(),
            reports: self.load().await,
        };
        Ok(serde_json::to_string_pretty(&bundle)?)
    }

    /// Merge the reports of a bundle into the store
    pub async fn import_bundle(&self, data: &str) -> Result<ImportOutcome> {
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| Error::ImportFormat(e.to_string()))?;
        let reports_value = value
            .get("reports")
            .filter(|r| r.is_array())
            .ok_or_else(|| Error::ImportFormat("missing \"reports\" array".to_string()))?;
        let incoming: Vec<Report> = Vec::<Report>::deserialize(reports_value)
            .map_err(|e| Error::ImportFormat(e.to_string()))?;
        let offered = incoming.len();

        let _guard = self.write_lock.lock().await;
        let mut merged = self.load().await;
        let mut seen: HashSet<String> = merged.iter().map(|r| r.id.clone()).collect();

        let mut accepted = HashSet::new();
        for report in incoming {
            if seen.insert(report.id.clone()) {
                accepted.insert(report.id.clone());
                merged.push(report);
            }
        }

        merged.sort_by(|a, b| b.created_at_utc.cmp(&a.created_at_utc));
        merged.truncate(self.limits.capacity());
        self.persist(&merged).await?;

        // Reports pushed out by the capacity limit do not count as imported
        let imported = merged.iter().filter(|r| accepted.contains(&r.id)).count();
        if imported < accepted.len() {
            debug!(dropped = accepted.len() - imported, "Import exceeded capacity");
        }

        let outcome = ImportOutcome {
            imported,
            skipped: offered - accepted.len(),
            total: merged.len(),
        };
        info!(
            imported = outcome.imported,
            skipped = outcome.skipped,
            total = outcome.total,
            "Imported reports"
        );
        Ok(outcome)
    }

    /// Current size of the persisted collection
    pub async fn usage(&self) -> StorageUsage {
        let used_bytes = match self.backend.read().await {
            Ok(payload) => payload.map_or(0, |p| p.len() as u64),
            Err(e) => {
                warn!("Error calculating storage usage: {}", e);
                0
            }
        };
        let max_bytes = self.limits.max_bytes;
        let percent_used = if max_bytes == 0 {
            0
        } else {
            (used_bytes as f64 * 100.0 / max_bytes as f64).round() as u64
        };

        StorageUsage {
            used_bytes,
            max_bytes,
            percent_used,
        }
    }

    /// Totals and most frequent rules over all saved reports
    pub async fn statistics(&self, recent_days: i64) -> StoreStatistics {
        let reports = self.load().await;
        let cutoff = cutoff_for(recent_days);

        let mut total_issues = 0;
        let mut frequencies: Vec<RuleFrequency> = Vec::new();
        for report in &reports {
            let findings = report.result.findings();
            total_issues += summarize(findings).total();

            for finding in findings {
                let count = finding.occurrence_count();
                match frequencies.iter_mut().find(|f| f.rule_id == finding.rule_id) {
                    Some(entry) => entry.count += count,
                    None => frequencies.push(RuleFrequency {
                        rule_id: finding.rule_id.clone(),
                        count,
                    }),
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts
        frequencies.sort_by(|a, b| b.count.cmp(&a.count));
        frequencies.truncate(5);

        let average_issues_per_report = if reports.is_empty() {
            0
        } else {
            (total_issues as f64 / reports.len() as f64).round() as usize
        };

        StoreStatistics {
            total_reports: reports.len(),
            total_issues,
            average_issues_per_report,
            most_frequent_rule_ids: frequencies,
            reports_in_last_n_days: reports.iter().filter(|r| r.created_at_utc >= cutoff).count(),
        }
    }
}
