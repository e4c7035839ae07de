use super::stats::PipelineStats;
use crate::lexical::{LexDiagnostic, LexicalMetrics};
use crate::logging::codes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a finished run reports apart from its items
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Kept diagnostics, oldest first; `stats.diagnostics` has the full count
    pub diagnostics: Vec<LexDiagnostic>,
    pub metrics: LexicalMetrics,
    pub stats: PipelineStats,
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome<T> {
    pub items: Vec<T>,
    pub diagnostics: Vec<LexDiagnostic>,
    pub metrics: LexicalMetrics,
    pub stats: PipelineStats,
}

impl<T> PipelineOutcome<T> {
    pub fn new(items: Vec<T>, report: PipelineReport) -> Self {
        Self {
            items,
            diagnostics: report.diagnostics,
            metrics: report.metrics,
            stats: report.stats,
        }
    }

    pub fn has_data_errors(&self) -> bool {
        self.stats.diagnostics > 0
    }

    pub fn log_success(&self, mode: &str) {
        crate::log_success!(
            codes::success::PIPELINE_COMPLETE,
            "Pipeline run complete",
            "mode" => mode,
            "bytes" => self.stats.bytes,
            "tokens" => self.stats.tokens,
            "windows" => self.stats.windows,
            "diagnostics" => self.stats.diagnostics
        );
        crate::log_performance!(
            codes::success::PIPELINE_COMPLETE,
            "Pipeline throughput",
            duration = self.stats.duration,
            "bytes_per_sec" => format!("{:.0}", self.stats.bytes_per_second()),
            "tokens_per_sec" => format!("{:.0}", self.stats.tokens_per_second())
        );
    }

    pub fn summary(&self, mode: &str) -> RunSummary {
        RunSummary {
            completed_at: Utc::now(),
            mode: mode.to_string(),
            profile: crate::config::build_info::profile().to_string(),
            stats: self.stats,
            metrics: self.metrics.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Machine-readable record of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub completed_at: DateTime<Utc>,
    pub mode: String,
    pub profile: String,
    pub stats: PipelineStats,
    pub metrics: LexicalMetrics,
    pub diagnostics: Vec<LexDiagnostic>,
}

impl RunSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
