//! Parser for the metric query mini-language.
//!
//! ```text
//! avg:processor.time{host:AH-CW-AP-104} by {host,instance}
//! ```
//!
//! Parsing is permissive: the only hard failures are a missing `{` and an
//! empty metric name. Anything else degrades to empty tag or group-by lists.

use serde::{Deserialize, Serialize};

use crate::{Result, SimulatorError};

pub const DEFAULT_AGGREGATION: &str = "avg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub metric: String,
    pub aggregation: String,
    pub tags: Vec<String>,
    pub group_by: Vec<String>,
}

/// Parse a query such as `sum:mem.used{host:a,env:prod} by {host}`.
pub fn parse_query(query: &str) -> Result<ParsedQuery> {
    let (metric_part, rest) = query
        .split_once('{')
        .ok_or(SimulatorError::InvalidQueryFormat)?;

    let (aggregation, metric) = match metric_part.trim().split_once(':') {
        Some((aggregation, metric)) => (aggregation.trim(), metric.trim()),
        None => (DEFAULT_AGGREGATION, metric_part.trim()),
    };

    if metric.is_empty() {
        return Err(SimulatorError::InvalidQueryFormat);
    }

    let tags_part = rest.split('}').next().unwrap_or_default();
    let tags = tags_part
        .split(',')
        .map(str::trim)
        .filter(|tag| tag.contains(':'))
        .map(str::to_string)
        .collect();

    Ok(ParsedQuery {
        metric: metric.to_string(),
        aggregation: aggregation.to_string(),
        tags,
        group_by: parse_group_by(query),
    })
}

// Matches "by" as a raw substring, so a metric or tag containing "by"
// (e.g. `bytes.sent`) can shift the group-by window.
fn parse_group_by(query: &str) -> Vec<String> {
    let Some(after_by) = query.split("by").nth(1) else {
        return Vec::new();
    };

    match after_by.split('{').nth(1) {
        Some(group_part) => group_part
            .split('}')
            .next()
            .unwrap_or_default()
            .split(',')
            .map(|dimension| dimension.trim().to_string())
            .collect(),
        None => Vec::new(),
    }
}
