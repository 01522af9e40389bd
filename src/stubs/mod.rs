//! Stub override tables for external library signatures.
//!
//! Stubs retrofit qualifiers onto signatures the analyzed source cannot be
//! annotated with directly (third-party libraries, platform APIs). Parsing
//! of stub resource formats is out of scope; the engine consumes a
//! pre-resolved table mapping a fully qualified signature to its parameter
//! and return qualifier names.
//!
//! Source-level declarations always take precedence: the stub table is only
//! consulted when the compilation unit itself has no signature information.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Stub Signatures
// =============================================================================

/// Qualifiers stubbed onto one external signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubSignature {
    /// Qualifier name per parameter, left to right (`None` = unannotated).
    pub params: Vec<Option<String>>,
    /// Qualifier name of the return type.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ret: Option<String>,
}

impl StubSignature {
    /// Stub requiring the same qualifier on every one of `arity` parameters.
    #[must_use]
    pub fn params_require(qualifier: &str, arity: usize) -> Self {
        Self {
            params: vec![Some(qualifier.to_string()); arity],
            ret: None,
        }
    }

    /// Stub declaring only a return qualifier.
    #[must_use]
    pub fn returns(qualifier: &str) -> Self {
        Self {
            params: Vec::new(),
            ret: Some(qualifier.to_string()),
        }
    }

    /// Attach a return qualifier (consumes and returns self).
    #[must_use]
    pub fn with_return(mut self, qualifier: &str) -> Self {
        self.ret = Some(qualifier.to_string());
        self
    }
}

// =============================================================================
// Stub Table
// =============================================================================

/// Read-only signature-to-qualifiers lookup table, loaded once before any
/// unit is analyzed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StubTable {
    by_signature: FxHashMap<String, StubSignature>,
}

impl StubTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stubbed signature, replacing any previous entry.
    pub fn insert(&mut self, signature: impl Into<String>, stub: StubSignature) {
        self.by_signature.insert(signature.into(), stub);
    }

    /// Look up the stub for a signature.
    pub fn get(&self, signature: &str) -> Option<&StubSignature> {
        self.by_signature.get(signature)
    }

    /// Number of stubbed signatures.
    pub fn len(&self) -> usize {
        self.by_signature.len()
    }

    /// True if no signatures are stubbed.
    pub fn is_empty(&self) -> bool {
        self.by_signature.is_empty()
    }
}

impl FromIterator<(String, StubSignature)> for StubTable {
    fn from_iter<I: IntoIterator<Item = (String, StubSignature)>>(iter: I) -> Self {
        Self {
            by_signature: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
