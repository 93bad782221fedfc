#![warn(missing_docs)]
//! # scan-guard-core
//!
//! ## Purpose
//! Defines the scanned-payload data model and the pure risk classifier used
//! across the `scan-guard` workspace.
//!
//! ## Responsibilities
//! - Represent decoded payloads, probe results, and scan verdicts.
//! - Validate payloads before any network probe is attempted.
//! - Map `(payload, probe)` pairs onto a verdict through a versioned rule table.
//!
//! ## Data flow
//! The decoder produces a [`Payload`]. The probe layer produces a
//! [`ProbeResult`] for it, and [`classify`] folds both into a [`ScanVerdict`]
//! consumed by the presentation policy.
//!
//! ## Ownership and lifetimes
//! Payloads own their text and are immutable after construction. Verdicts are
//! small `Copy` values so they can be handed to UI and sandbox layers freely.
//!
//! ## Error model
//! Validation failures return [`CoreError`]. The classifier itself never
//! fails: malformed input resolves to [`RiskLevel::Unknown`].
//!
//! ## Security and privacy notes
//! Raw payloads may carry credentials (Wi-Fi passwords, tokens in URLs).
//! Log sites use [`Payload::fingerprint`] instead of payload text.
//!
//! ## Example
//! ```rust
//! use scan_guard_core::{classify, DeclaredType, Payload, ProbeResult, RiskLevel};
//!
//! let payload = Payload::new("https://example.com", DeclaredType::Url);
//! let verdict = classify(&payload, &ProbeResult::clean());
//! assert_eq!(verdict.risk_level, RiskLevel::Safe);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Maximum number of redirect hops considered during classification and
/// enforced during sandboxed navigation.
pub const REDIRECT_BOUND: usize = 5;

/// Version tag of the classification rule table.
pub const RULE_TABLE_VERSION: &str = "v1";

/// URL schemes treated as secure transport.
pub const SECURE_SCHEMES: &[&str] = &["https"];

/// Largest payload any QR symbol can carry (version 40, numeric mode).
pub const MAX_PAYLOAD_BYTES: usize = 7_089;

/// Rule id reported for payloads rejected before classification.
pub const MALFORMED_RULE_ID: &str = "malformed-payload";

/// Rule id reported if no rule in the table matched.
pub const UNMATCHED_RULE_ID: &str = "unmatched";

/// Content type declared by the decoder for a scanned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclaredType {
    /// Absolute URL.
    Url,
    /// Free-form text.
    Text,
    /// Contact card (vCard/MeCard).
    Contact,
    /// Network join record (for example `WIFI:` payloads).
    NetworkConfig,
    /// Anything else the decoder recognised.
    Other,
}

impl DeclaredType {
    /// Maps a decoder type label onto a declared type.
    ///
    /// Matching is case-insensitive. Unknown labels map to [`DeclaredType::Other`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "url" | "uri" | "link" => Self::Url,
            "text" | "plain" | "string" => Self::Text,
            "contact" | "vcard" | "mecard" => Self::Contact,
            "wifi" | "network" | "network_config" => Self::NetworkConfig,
            _ => Self::Other,
        }
    }

    /// Short display label used by the presentation layer.
    pub fn label(self) -> &'static str {
        match self {
            Self::Url => "URL",
            Self::Text => "Text",
            Self::Contact => "Contact",
            Self::NetworkConfig => "Network",
            Self::Other => "Other",
        }
    }
}

/// One decoded payload. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload {
    raw: String,
    declared_type: DeclaredType,
}

impl Payload {
    /// Creates a payload as produced by the decoder.
    pub fn new(raw: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            raw: raw.into(),
            declared_type,
        }
    }

    /// Returns the raw decoded text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the decoder-declared content type.
    pub fn declared_type(&self) -> DeclaredType {
        self.declared_type
    }

    /// Returns a short, non-reversible identifier safe for logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.raw.as_bytes());
        hex::encode(&digest[..6])
    }
}

/// Result of external reputation and redirect probes for one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the probe observed a secure transport.
    pub secure_transport: bool,
    /// Whether the reputation service lists the target.
    pub blocklist_hit: bool,
    /// Redirect hops observed, in order.
    #[serde(default)]
    pub redirect_chain: Vec<String>,
    /// Whether the probe ran out of time before producing signals.
    pub probe_timed_out: bool,
}

impl ProbeResult {
    /// Probe result with no negative signals.
    pub fn clean() -> Self {
        Self {
            secure_transport: true,
            ..Self::default()
        }
    }

    /// Probe result standing in for a probe that produced nothing.
    pub fn timed_out() -> Self {
        Self {
            probe_timed_out: true,
            ..Self::default()
        }
    }
}

/// Classifier risk assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// No negative signal.
    Safe,
    /// Redirects observed.
    Warning,
    /// Blocklisted or insecure transport.
    Dangerous,
    /// Classification could not complete.
    Unknown,
}

impl RiskLevel {
    /// Upper-case label shown next to the scan result.
    pub fn label(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning => "WARNING",
            Self::Dangerous => "DANGEROUS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Verdict produced by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanVerdict {
    /// Derived risk level.
    pub risk_level: RiskLevel,
    /// Whether the payload uses a secure scheme (vacuously true for non-URLs).
    pub secure_transport: bool,
    /// Whether the reputation probe reported a blocklist hit.
    pub blocklist_hit: bool,
    /// Redirect hops, capped at [`REDIRECT_BOUND`].
    pub redirect_count: usize,
}

impl ScanVerdict {
    /// Verdict for payloads that could not be classified.
    pub fn unknown() -> Self {
        Self {
            risk_level: RiskLevel::Unknown,
            secure_transport: false,
            blocklist_hit: false,
            redirect_count: 0,
        }
    }

    /// Serializes verdict to compact JSON.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(CoreError::Codec)
    }
}

/// Checks payload shape before any probe runs.
///
/// # Errors
/// - [`CoreError::EmptyPayload`] for empty or whitespace-only text.
/// - [`CoreError::PayloadTooLarge`] above [`MAX_PAYLOAD_BYTES`].
/// - [`CoreError::ControlCharacter`] for NUL and other control characters
///   (tab, CR and LF are allowed).
/// - [`CoreError::InvalidUrl`] when a URL payload does not parse.
pub fn validate_payload(payload: &Payload) -> Result<(), CoreError> {
    let raw = payload.raw();
    if raw.trim().is_empty() {
        return Err(CoreError::EmptyPayload);
    }

    if raw.len() > MAX_PAYLOAD_BYTES {
        return Err(CoreError::PayloadTooLarge {
            limit: MAX_PAYLOAD_BYTES,
            actual: raw.len(),
        });
    }

    if raw
        .chars()
        .any(|ch| ch.is_control() && !matches!(ch, '\t' | '\n' | '\r'))
    {
        return Err(CoreError::ControlCharacter);
    }

    if payload.declared_type() == DeclaredType::Url {
        Url::parse(raw).map_err(|error| CoreError::InvalidUrl(error.to_string()))?;
    }

    Ok(())
}

/// Returns `true` when the payload travels over a secure scheme.
///
/// Only URL payloads carry a transport; all other types are vacuously secure.
pub fn uses_secure_transport(payload: &Payload) -> bool {
    if payload.declared_type() != DeclaredType::Url {
        return true;
    }

    Url::parse(payload.raw())
        .map(|url| SECURE_SCHEMES.contains(&url.scheme()))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy)]
struct Signals {
    secure_transport: bool,
    blocklist_hit: bool,
    redirect_count: usize,
    probe_timed_out: bool,
}

struct Rule {
    id: &'static str,
    level: RiskLevel,
    applies: fn(&Signals) -> bool,
}

// Order is precedence: the first matching rule decides.
const RULES: &[Rule] = &[
    Rule {
        id: "blocklist-or-insecure",
        level: RiskLevel::Dangerous,
        applies: |signals| signals.blocklist_hit || !signals.secure_transport,
    },
    Rule {
        id: "probe-timed-out",
        level: RiskLevel::Unknown,
        applies: |signals| signals.probe_timed_out,
    },
    Rule {
        id: "redirected",
        level: RiskLevel::Warning,
        applies: |signals| signals.redirect_count > 0,
    },
    Rule {
        id: "clean",
        level: RiskLevel::Safe,
        applies: |_| true,
    },
];

/// Returns `(rule id, risk level)` pairs of the active rule table in
/// precedence order.
pub fn rule_table() -> Vec<(&'static str, RiskLevel)> {
    RULES.iter().map(|rule| (rule.id, rule.level)).collect()
}

/// Classifies a payload against probe results.
///
/// Deterministic and side-effect-free.
pub fn classify(payload: &Payload, probe: &ProbeResult) -> ScanVerdict {
    classify_explained(payload, probe).0
}

/// Classifies a payload and reports the id of the deciding rule.
pub fn classify_explained(payload: &Payload, probe: &ProbeResult) -> (ScanVerdict, &'static str) {
    if validate_payload(payload).is_err() {
        return (ScanVerdict::unknown(), MALFORMED_RULE_ID);
    }

    let signals = Signals {
        secure_transport: uses_secure_transport(payload),
        blocklist_hit: probe.blocklist_hit,
        redirect_count: probe.redirect_chain.len().min(REDIRECT_BOUND),
        probe_timed_out: probe.probe_timed_out,
    };

    // The last rule always applies.
    let (level, rule_id) = RULES
        .iter()
        .find(|rule| (rule.applies)(&signals))
        .map(|rule| (rule.level, rule.id))
        .unwrap_or((RiskLevel::Unknown, UNMATCHED_RULE_ID));

    (
        ScanVerdict {
            risk_level: level,
            secure_transport: signals.secure_transport,
            blocklist_hit: signals.blocklist_hit,
            redirect_count: signals.redirect_count,
        },
        rule_id,
    )
}

/// Error type for payload validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payload text is empty or blank.
    #[error("payload is empty")]
    EmptyPayload,
    /// Payload exceeds the largest decodable symbol.
    #[error("payload too large: limit {limit} bytes, got {actual}")]
    PayloadTooLarge {
        /// Byte limit.
        limit: usize,
        /// Actual byte length.
        actual: usize,
    },
    /// Payload contains control characters.
    #[error("payload contains control characters")]
    ControlCharacter,
    /// URL payload failed to parse.
    #[error("invalid url payload: {0}")]
    InvalidUrl(String),
    /// JSON encoding failure.
    #[error("verdict codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
