//! SARIF (Static Analysis Results Interchange Format) output support.
//!
//! Renders collected qualifier violations as a SARIF 2.1.0 log so CI
//! platforms (GitHub, GitLab, Azure DevOps) can ingest them directly.
//! Formatting beyond SARIF (human-readable text, locale) is out of scope
//! for the engine.
//!
//! Specification: https://docs.oasis-open.org/sarif/sarif/v2.1.0/sarif-v2.1.0.html

use serde::{Deserialize, Serialize};

use crate::check::{Violation, ViolationKind};
use crate::engine::UnitReport;

const SCHEMA_URI: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

// =============================================================================
// SARIF Types (v2.1.0)
// =============================================================================

/// The top-level SARIF log object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLog {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

/// A single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

/// Tool information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifTool {
    pub driver: SarifToolComponent,
}

/// Tool component (driver).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifToolComponent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rules: Vec<SarifReportingDescriptor>,
}

/// A rule descriptor: one per violation kind that actually occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifReportingDescriptor {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<SarifMessage>,
}

/// One reported violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

/// A message string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

/// A physical location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: SarifPhysicalLocation,
}

/// Artifact plus region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
    pub region: SarifRegion,
}

/// Artifact (file) reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifArtifactLocation {
    pub uri: String,
}

/// Line/column region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    pub start_line: usize,
    pub start_column: usize,
}

// =============================================================================
// Conversion
// =============================================================================

fn rule_id(violation: &Violation) -> String {
    format!("{}/{}", violation.hierarchy, violation.kind.message_key())
}

fn descriptor_text(kind: ViolationKind) -> &'static str {
    match kind {
        ViolationKind::Assignment => "incompatible qualifier in assignment",
        ViolationKind::CompoundAssignment => "incompatible qualifier in compound assignment",
        ViolationKind::Argument => "incompatible qualifier in argument",
        ViolationKind::Return => "incompatible qualifier in return",
        ViolationKind::OverrideReturn => "override weakens return qualifier",
        ViolationKind::OverrideParam => "override strengthens parameter qualifier",
    }
}

/// Render unit reports as a SARIF log.
#[must_use]
pub fn to_sarif(reports: &[UnitReport]) -> SarifLog {
    let mut rules: Vec<SarifReportingDescriptor> = Vec::new();
    let mut results = Vec::new();

    for report in reports {
        for violation in &report.violations {
            let id = rule_id(violation);
            if !rules.iter().any(|r| r.id == id) {
                rules.push(SarifReportingDescriptor {
                    id: id.clone(),
                    short_description: Some(SarifMessage {
                        text: descriptor_text(violation.kind).to_string(),
                    }),
                });
            }
            results.push(SarifResult {
                rule_id: id,
                level: "error".to_string(),
                message: SarifMessage {
                    text: violation.to_string(),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: violation.location.file.clone(),
                        },
                        region: SarifRegion {
                            start_line: violation.location.line,
                            start_column: violation.location.column,
                        },
                    },
                }],
            });
        }
    }

    SarifLog {
        schema: SCHEMA_URI.to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifToolComponent {
                    name: env!("CARGO_PKG_NAME").to_string(),
                    version: Some(env!("CARGO_PKG_VERSION").to_string()),
                    rules,
                },
            },
            results,
        }],
    }
}

/// Render unit reports as pretty-printed SARIF JSON.
///
/// # Errors
///
/// Propagates `serde_json` serialization failure.
pub fn to_sarif_json(reports: &[UnitReport]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_sarif(reports))
}

// =============================================================================
// Tests
// =============================================================================
