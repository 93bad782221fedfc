#![warn(missing_docs)]
//! # scan-guard-ui
//!
//! ## Purpose
//! Maps scan verdicts onto presentation affordances and builds the read-only
//! scan card consumed by the rendering layer.
//!
//! ## Responsibilities
//! - Table-driven verdict policy: color token and confirmation requirement.
//! - Project payload, verdict, and checks into display-safe text.
//!
//! ## Data flow
//! [`scan_guard_core::ScanVerdict`] -> [`present`] -> [`Affordances`] ->
//! [`ScanCard`] -> presentation collaborator.
//!
//! ## Ownership and lifetimes
//! Cards own their strings so the presentation layer can keep them after the
//! scan view is gone.
//!
//! ## Error model
//! Pure and total; nothing here fails.

use scan_guard_core::{Payload, RiskLevel, ScanVerdict};
use serde::Serialize;

/// Result color token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorToken {
    /// Dangerous.
    Red,
    /// Warning.
    Orange,
    /// Safe.
    Green,
    /// Unknown.
    Neutral,
}

impl ColorToken {
    /// Hex color used by the default theme.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Red => "#ff0000",
            Self::Orange => "#ffa500",
            Self::Green => "#44c167",
            Self::Neutral => "#000000",
        }
    }
}

/// UI affordances derived from a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Affordances {
    /// Result color.
    pub color_token: ColorToken,
    /// Whether Open must be confirmed by the user.
    pub requires_confirmation: bool,
}

/// Maps a verdict to its affordances.
pub fn present(verdict: &ScanVerdict) -> Affordances {
    affordances_for(verdict.risk_level)
}

/// Looks up affordances for a risk level.
pub fn affordances_for(level: RiskLevel) -> Affordances {
    let (color_token, requires_confirmation) = match level {
        RiskLevel::Dangerous => (ColorToken::Red, true),
        RiskLevel::Warning => (ColorToken::Orange, false),
        RiskLevel::Safe => (ColorToken::Green, false),
        RiskLevel::Unknown => (ColorToken::Neutral, false),
    };
    Affordances {
        color_token,
        requires_confirmation,
    }
}

/// One line of the checks section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckLine {
    /// Check name.
    pub label: String,
    /// Rendered value (`✔`, `✘`, count, or `N/A`).
    pub value: String,
}

/// Read-only projection of one scanned payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanCard {
    /// Payload text.
    pub payload: String,
    /// Declared type label.
    pub type_label: String,
    /// Result text, e.g. `Result: SAFE`.
    pub result_text: String,
    /// Result color token.
    pub color_token: ColorToken,
    /// Result color hex.
    pub color_hex: String,
    /// Whether Open needs confirmation.
    pub requires_confirmation: bool,
    /// Checks section.
    pub checks: Vec<CheckLine>,
}

impl ScanCard {
    /// Card shown while classification is still pending.
    pub fn pending(payload: &Payload) -> Self {
        Self::build(payload, None)
    }

    /// Card for a completed classification.
    pub fn from_verdict(payload: &Payload, verdict: &ScanVerdict) -> Self {
        Self::build(payload, Some(verdict))
    }

    fn build(payload: &Payload, verdict: Option<&ScanVerdict>) -> Self {
        let level = verdict.map_or(RiskLevel::Unknown, |verdict| verdict.risk_level);
        let affordances = affordances_for(level);

        let mark = |flag: Option<bool>| match flag {
            Some(true) => "✔".to_string(),
            Some(false) => "✘".to_string(),
            None => "N/A".to_string(),
        };

        let checks = vec![
            CheckLine {
                label: "Secure Connection".to_string(),
                value: mark(verdict.map(|verdict| verdict.secure_transport)),
            },
            CheckLine {
                label: "Reputation Check".to_string(),
                value: mark(verdict.map(|verdict| !verdict.blocklist_hit)),
            },
            CheckLine {
                label: "Redirects".to_string(),
                value: verdict.map_or_else(
                    || "N/A".to_string(),
                    |verdict| verdict.redirect_count.to_string(),
                ),
            },
        ];

        Self {
            payload: payload.raw().to_string(),
            type_label: payload.declared_type().label().to_string(),
            result_text: format!("Result: {}", level.label()),
            color_token: affordances.color_token,
            color_hex: affordances.color_token.hex().to_string(),
            requires_confirmation: affordances.requires_confirmation,
            checks,
        }
    }
}
