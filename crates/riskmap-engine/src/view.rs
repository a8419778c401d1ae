//! View projection - from the three raw aggregates to one display value.
//!
//! "Missing" is relative to the active view: a node with a gross score but
//! no controls is fully populated in the gross view and absent in the net
//! view. The projector owns that judgement and the human-readable reason for
//! every absence.

use crate::score::{finite, round1};
use riskmap_types::ViewMode;

/// Reason shown for a node no row matches at all.
pub const REASON_NO_DATA: &str = "No data for this node";
/// Reason for an absent gross aggregate.
pub const REASON_NO_GROSS: &str = "No gross score assessed";
/// Reason for an absent net aggregate when the rows carry no controls.
pub const REASON_NO_NET: &str = "No net score (no controls assessed)";
/// Reason for an absent net aggregate when controls exist but are unscored.
pub const REASON_CONTROLS_UNSCORED: &str = "No net score (controls not yet scored)";
/// Reason for an absent appetite aggregate.
pub const REASON_NO_APPETITE: &str = "No risk appetite set";

/// The three raw aggregates of one node, as the projector sees them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewInputs {
    pub gross: Option<f64>,
    pub net: Option<f64>,
    pub appetite: Option<f64>,
    /// Net is absent because controls exist but are not scored yet - a
    /// different story than "no controls assessed".
    pub controls_unscored: bool,
}

/// A node's projected display value, or the reason it is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub display: Option<f64>,
    pub missing_reason: Option<String>,
}

impl Projection {
    fn present(value: f64) -> Self {
        Self {
            display: Some(value),
            missing_reason: None,
        }
    }

    fn absent(reason: impl Into<String>) -> Self {
        Self {
            display: None,
            missing_reason: Some(reason.into()),
        }
    }
}

fn net_reason(inputs: &ViewInputs) -> &'static str {
    if inputs.controls_unscored {
        REASON_CONTROLS_UNSCORED
    } else {
        REASON_NO_NET
    }
}

/// Delta between two components, both required.
fn delta(
    minuend: Option<f64>,
    subtrahend: Option<f64>,
    minuend_reason: &str,
    subtrahend_reason: &str,
) -> Projection {
    match (minuend, subtrahend) {
        (Some(a), Some(b)) => match finite(round1(a - b)) {
            Some(value) => Projection::present(value),
            None => Projection::absent(format!("{minuend_reason}; {subtrahend_reason}")),
        },
        (None, Some(_)) => Projection::absent(minuend_reason),
        (Some(_), None) => Projection::absent(subtrahend_reason),
        (None, None) => Projection::absent(format!("{minuend_reason}; {subtrahend_reason}")),
    }
}

/// Derive the display value and missing-data reason for one node.
pub fn project(inputs: &ViewInputs, view: ViewMode) -> Projection {
    // Non-finite aggregates are treated as absent from the start.
    let gross = inputs.gross.and_then(finite);
    let net = inputs.net.and_then(finite);
    let appetite = inputs.appetite.and_then(finite);

    match view {
        ViewMode::Gross => match gross {
            Some(value) => Projection::present(value),
            None => Projection::absent(REASON_NO_GROSS),
        },
        ViewMode::Net => match net {
            Some(value) => Projection::present(value),
            None => Projection::absent(net_reason(inputs)),
        },
        ViewMode::DeltaGrossNet => delta(gross, net, REASON_NO_GROSS, net_reason(inputs)),
        ViewMode::DeltaVsAppetite => delta(gross, appetite, REASON_NO_GROSS, REASON_NO_APPETITE),
    }
}
