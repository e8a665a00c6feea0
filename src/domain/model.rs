use serde::{Deserialize, Serialize};
use std::fmt;

/// One data row of a location listing: the place name and its two outage
/// indicator columns, kept as the page renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutageRow {
    pub display_name: String,
    pub indicator_a: String,
    pub indicator_b: String,
}

impl OutageRow {
    pub fn new(
        display_name: impl Into<String>,
        indicator_a: impl Into<String>,
        indicator_b: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            indicator_a: indicator_a.into(),
            indicator_b: indicator_b.into(),
        }
    }

    /// Either indicator differs from the literal `"0"`. The comparison is
    /// textual, matching how the listing reports an untouched location.
    pub fn has_outage(&self) -> bool {
        self.indicator_a != "0" || self.indicator_b != "0"
    }
}

/// URL token for a region's listing page, e.g. `stockholm`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub(crate) fn from_normalized(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final unit of output, one per affected sub-region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageRecord {
    #[serde(rename = "municipality")]
    pub sub_region: String,
    pub start_time: String,
    pub end_time: String,
    pub info_text: String,
    pub last_update: String,
    pub affected_customers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub outages: Vec<OutageRecord>,
}

/// Hierarchy level a page visit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Nation,
    Region,
    SubRegion,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Nation => f.write_str("nation"),
            Stage::Region => f.write_str("region"),
            Stage::SubRegion => f.write_str("sub-region"),
        }
    }
}

/// A branch that was skipped during a cycle and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleAnomaly {
    pub stage: Stage,
    pub identifier: String,
    pub cause: String,
}

/// Working set of a single crawl cycle. A new value is built for every
/// cycle and dropped after the snapshot is written.
#[derive(Debug, Default)]
pub struct CycleState {
    pub regions_with_outage: Vec<RegionId>,
    pub sub_regions_with_outage: Vec<String>,
    pub outages: Vec<OutageRecord>,
    pub anomalies: Vec<CycleAnomaly>,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_anomaly(
        &mut self,
        stage: Stage,
        identifier: impl Into<String>,
        cause: impl fmt::Display,
    ) {
        self.anomalies.push(CycleAnomaly {
            stage,
            identifier: identifier.into(),
            cause: cause.to_string(),
        });
    }
}

/// Browser viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}
