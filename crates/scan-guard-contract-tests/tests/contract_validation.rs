//! Validates contract fixtures and live serializations against frozen schemas.

use jsonschema::JSONSchema;
use scan_guard_core::{
    DeclaredType, Payload, ProbeResult, REDIRECT_BOUND, RiskLevel, ScanVerdict, classify,
};
use scan_guard_ui::ScanCard;
use serde_json::Value;

const VERDICT_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/scan-verdict.schema.json"
);
const CARD_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/scan-card.schema.json"
);

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn verdict_fixture_matches_schema() {
    let validator = compile_validator(VERDICT_SCHEMA);
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/scan-verdict.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "verdict fixture should validate against schema"
    );
}

#[test]
fn invalid_verdict_fixture_is_rejected() {
    let validator = compile_validator(VERDICT_SCHEMA);
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/scan-verdict.invalid.json"
    ));
    assert!(!validator.is_valid(&fixture));
}

#[test]
fn card_fixture_matches_schema() {
    let validator = compile_validator(CARD_SCHEMA);
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/scan-card.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "card fixture should validate against schema"
    );
}

#[test]
fn classifier_output_matches_verdict_schema() {
    let validator = compile_validator(VERDICT_SCHEMA);
    let probe = ProbeResult {
        secure_transport: true,
        blocklist_hit: false,
        redirect_chain: (0..REDIRECT_BOUND + 3)
            .map(|hop| format!("https://hop{hop}.example"))
            .collect(),
        probe_timed_out: false,
    };
    let verdict = classify(&Payload::new("https://example.com", DeclaredType::Url), &probe);

    let json: Value =
        serde_json::from_str(&verdict.to_json().expect("verdict should serialize")).expect("json");
    assert!(validator.is_valid(&json));
}

#[test]
fn every_card_variant_matches_card_schema() {
    let validator = compile_validator(CARD_SCHEMA);
    let payload = Payload::new("WIFI:S:Cafe;T:WPA;P:letmein;;", DeclaredType::NetworkConfig);

    let mut cards = vec![ScanCard::pending(&payload)];
    for level in [
        RiskLevel::Safe,
        RiskLevel::Warning,
        RiskLevel::Dangerous,
        RiskLevel::Unknown,
    ] {
        let verdict = ScanVerdict {
            risk_level: level,
            secure_transport: level != RiskLevel::Dangerous,
            blocklist_hit: false,
            redirect_count: usize::from(level == RiskLevel::Warning),
        };
        cards.push(ScanCard::from_verdict(&payload, &verdict));
    }

    for card in cards {
        let json = serde_json::to_value(&card).expect("card should serialize");
        assert!(validator.is_valid(&json), "card should validate: {json}");
    }
}
