//! Resource Path Optimization metrics and endpoint selection.
//!
//! The metric catalogue is a closed set: numeric metrics are minimized (or
//! maximized) over candidate endpoints, string metrics require an exact
//! match against a caller-supplied value. Selection itself is pure - the
//! caller materializes the candidate documents, this module picks one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A supported optimization metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpoMetric {
    CpuUtilization,
    GpuUtilization,
    MemoryUtilization,
    TimeToFirstToken,
    CostPerMillionTokens,
    CostPerHour,
    ResponseTime,
    GpuModel,
    LanguageModel,
}

/// Value kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Numeric,
    String,
}

/// How a metric selects among candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Minimize,
    Maximize,
    ExactMatch,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Minimize => "minimize",
            Strategy::Maximize => "maximize",
            Strategy::ExactMatch => "exact_match",
        }
    }
}

impl RpoMetric {
    /// Every supported metric, in catalogue order.
    pub const ALL: [RpoMetric; 9] = [
        RpoMetric::CpuUtilization,
        RpoMetric::GpuUtilization,
        RpoMetric::MemoryUtilization,
        RpoMetric::TimeToFirstToken,
        RpoMetric::CostPerMillionTokens,
        RpoMetric::CostPerHour,
        RpoMetric::ResponseTime,
        RpoMetric::GpuModel,
        RpoMetric::LanguageModel,
    ];

    /// The endpoint-document attribute holding the metric value.
    pub fn as_str(&self) -> &'static str {
        match self {
            RpoMetric::CpuUtilization => "cpu_utilization",
            RpoMetric::GpuUtilization => "gpu_utilization",
            RpoMetric::MemoryUtilization => "memory_utilization",
            RpoMetric::TimeToFirstToken => "time_to_first_token",
            RpoMetric::CostPerMillionTokens => "cost_per_million_tokens",
            RpoMetric::CostPerHour => "cost_per_hour",
            RpoMetric::ResponseTime => "response_time",
            RpoMetric::GpuModel => "gpu_model",
            RpoMetric::LanguageModel => "language_model",
        }
    }

    pub fn from_str_ci(s: &str) -> Option<Self> {
        RpoMetric::ALL
            .iter()
            .copied()
            .find(|metric| metric.as_str().eq_ignore_ascii_case(s))
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            RpoMetric::GpuModel | RpoMetric::LanguageModel => MetricKind::String,
            _ => MetricKind::Numeric,
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self.kind() {
            MetricKind::String => Strategy::ExactMatch,
            MetricKind::Numeric => Strategy::Minimize,
        }
    }
}

/// Selection failure modes.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("value required for exact match metric: {0}")]
    ValueRequired(&'static str),
    #[error("no endpoints found with valid {0} values")]
    NoValidEndpoints(&'static str),
    #[error("no endpoints found with {metric} = {value}")]
    NoExactMatch { metric: &'static str, value: String },
}

/// The winning candidate plus the evaluation counts callers report.
#[derive(Debug)]
pub struct Selection<'a> {
    pub endpoint: &'a Value,
    pub metric_value: Value,
    pub valid_count: usize,
}

/// Pick one endpoint from `candidates` by `metric`.
///
/// Candidates whose metric is absent (or not a number, for numeric metrics)
/// are dropped before selection. Ties keep candidate order: the first
/// best-scoring candidate wins.
pub fn select_endpoint<'a>(
    candidates: &'a [Value],
    metric: RpoMetric,
    value: Option<&str>,
) -> Result<Selection<'a>, SelectionError> {
    let attr = metric.as_str();

    match metric.strategy() {
        Strategy::ExactMatch => {
            let wanted = value.ok_or(SelectionError::ValueRequired(attr))?;
            let matching: Vec<&Value> = candidates
                .iter()
                .filter(|c| c.get(attr).and_then(Value::as_str) == Some(wanted))
                .collect();
            let endpoint = matching.first().copied().ok_or_else(|| {
                SelectionError::NoExactMatch {
                    metric: attr,
                    value: wanted.to_string(),
                }
            })?;
            Ok(Selection {
                endpoint,
                metric_value: endpoint.get(attr).cloned().unwrap_or(Value::Null),
                valid_count: matching.len(),
            })
        }
        Strategy::Minimize | Strategy::Maximize => {
            let valid: Vec<(&Value, f64)> = candidates
                .iter()
                .filter_map(|c| Some((c, c.get(attr)?.as_f64()?)))
                .collect();
            if valid.is_empty() {
                return Err(SelectionError::NoValidEndpoints(attr));
            }
            let better = |score: f64, best: f64| match metric.strategy() {
                Strategy::Maximize => score > best,
                _ => score < best,
            };
            let mut winner = valid[0];
            for &(candidate, score) in &valid[1..] {
                if better(score, winner.1) {
                    winner = (candidate, score);
                }
            }
            Ok(Selection {
                endpoint: winner.0,
                metric_value: winner.0.get(attr).cloned().unwrap_or(Value::Null),
                valid_count: valid.len(),
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
