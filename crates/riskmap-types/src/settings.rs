//! Engine settings - aggregation mode, view mode, empty-branch filtering.
//!
//! These are passed explicitly into the aggregation entry point; the engine
//! has no ambient configuration.

use serde::{Deserialize, Serialize};

/// How gross/net values fold upward through the tree.
///
/// Appetite is unaffected by this choice: it always aggregates via minimum,
/// since the tightest threshold governs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationMode {
    /// Weight-normalized average, rounded to one decimal.
    #[default]
    Weighted,
    /// Worst case wins; weights are ignored.
    Max,
}

impl AggregationMode {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "weighted" => Some(Self::Weighted),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Self::Weighted => "weighted",
            Self::Max => "max",
        }
    }
}

/// Which of the four projected metrics is displayed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// Raw exposure before controls.
    #[default]
    Gross,
    /// Residual exposure after controls.
    Net,
    /// Gross minus net - how much the controls buy.
    DeltaGrossNet,
    /// Gross minus the configured appetite threshold.
    DeltaVsAppetite,
}

impl ViewMode {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "gross" => Some(Self::Gross),
            "net" => Some(Self::Net),
            "delta-gross-net" => Some(Self::DeltaGrossNet),
            "delta-vs-appetite" => Some(Self::DeltaVsAppetite),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Self::Gross => "gross",
            Self::Net => "net",
            Self::DeltaGrossNet => "delta-gross-net",
            Self::DeltaVsAppetite => "delta-vs-appetite",
        }
    }

    /// Delta modes scan the aggregated tree for their color-scale bound;
    /// absolute modes use the scale maximum.
    pub fn is_delta(&self) -> bool {
        matches!(self, Self::DeltaGrossNet | Self::DeltaVsAppetite)
    }
}

/// Scalar settings for one aggregation call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineSettings {
    pub aggregation_mode: AggregationMode,
    pub view_mode: ViewMode,
    /// Remove top-level branches with no scored data anywhere in their
    /// subtree, before aggregation.
    pub hide_empty: bool,
}

impl EngineSettings {
    pub fn with_aggregation(mut self, mode: AggregationMode) -> Self {
        self.aggregation_mode = mode;
        self
    }

    pub fn with_view(mut self, view: ViewMode) -> Self {
        self.view_mode = view;
        self
    }

    pub fn with_hide_empty(mut self, hide: bool) -> Self {
        self.hide_empty = hide;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_mode_db_roundtrip() {
        for v in [
            ViewMode::Gross,
            ViewMode::Net,
            ViewMode::DeltaGrossNet,
            ViewMode::DeltaVsAppetite,
        ] {
            assert_eq!(ViewMode::from_db_str(v.to_db_str()), Some(v));
        }
        assert_eq!(ViewMode::from_db_str("heat"), None);
    }

    #[test]
    fn test_delta_detection() {
        assert!(!ViewMode::Gross.is_delta());
        assert!(!ViewMode::Net.is_delta());
        assert!(ViewMode::DeltaGrossNet.is_delta());
        assert!(ViewMode::DeltaVsAppetite.is_delta());
    }

    #[test]
    fn test_kebab_case_serde() {
        let json = serde_json::to_string(&ViewMode::DeltaVsAppetite).unwrap();
        assert_eq!(json, r#""delta-vs-appetite""#);
        let json = serde_json::to_string(&AggregationMode::Weighted).unwrap();
        assert_eq!(json, r#""weighted""#);
    }

    #[test]
    fn test_settings_builder() {
        let s = EngineSettings::default()
            .with_aggregation(AggregationMode::Max)
            .with_view(ViewMode::Net)
            .with_hide_empty(true);
        assert_eq!(s.aggregation_mode, AggregationMode::Max);
        assert_eq!(s.view_mode, ViewMode::Net);
        assert!(s.hide_empty);
    }
}
