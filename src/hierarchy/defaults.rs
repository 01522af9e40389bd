//! Default assignment rules for qualifier-less source constructs.
//!
//! Every construct kind maps to exactly one qualifier: the hierarchy-wide
//! default unless a kind-specific override is registered. String literals,
//! for example, default to `NonConfidential` under the confidentiality
//! hierarchy because developer-authored literals are trusted, while
//! everything else defaults to the hierarchy default.
//!
//! Content-sensitive literal rules run before the per-kind table; the SQL
//! quotes system uses one to classify a string literal by the parity of its
//! unescaped quote count.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::expr::LiteralKind;
use crate::hierarchy::QualifierId;

// =============================================================================
// Construct Kinds
// =============================================================================

/// A qualifier-less source construct that needs a default qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    StringLiteral,
    IntLiteral,
    FloatLiteral,
    BoolLiteral,
    CharLiteral,
    NullLiteral,
    /// An enum constructor invocation.
    EnumConstructor,
    /// A variable reference whose declaration carries no qualifier.
    UnannotatedVariable,
    /// A formal parameter declared without a qualifier.
    UnannotatedParameter,
    /// A method return type declared without a qualifier.
    UnannotatedReturn,
    /// The result of a call with no declared or stubbed return qualifier.
    CallResult,
}

impl ConstructKind {
    /// The construct kind of a literal.
    #[must_use]
    pub fn from_literal(kind: LiteralKind) -> Self {
        match kind {
            LiteralKind::String => ConstructKind::StringLiteral,
            LiteralKind::Int => ConstructKind::IntLiteral,
            LiteralKind::Float => ConstructKind::FloatLiteral,
            LiteralKind::Bool => ConstructKind::BoolLiteral,
            LiteralKind::Char => ConstructKind::CharLiteral,
            LiteralKind::Null => ConstructKind::NullLiteral,
        }
    }

    /// All literal construct kinds, for hierarchies that default every
    /// literal the same way.
    pub const LITERALS: [ConstructKind; 6] = [
        ConstructKind::StringLiteral,
        ConstructKind::IntLiteral,
        ConstructKind::FloatLiteral,
        ConstructKind::BoolLiteral,
        ConstructKind::CharLiteral,
        ConstructKind::NullLiteral,
    ];
}

// =============================================================================
// Literal Rules
// =============================================================================

/// A content-sensitive default rule for literals, consulted before the
/// per-kind table.
///
/// Returning `None` passes the literal on to the next rule and finally the
/// per-kind default.
pub trait LiteralRule: Send + Sync {
    /// Short name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Classify a literal by kind and raw text.
    fn classify(&self, kind: LiteralKind, text: Option<&str>) -> Option<QualifierId>;
}

/// Boxed literal rule stored in [`DefaultRules`].
pub type BoxedLiteralRule = Box<dyn LiteralRule>;

// =============================================================================
// Default Rules
// =============================================================================

/// Total mapping from construct kind to default qualifier for one hierarchy.
pub struct DefaultRules {
    fallback: QualifierId,
    by_construct: FxHashMap<ConstructKind, QualifierId>,
    literal_rules: Vec<BoxedLiteralRule>,
}

impl std::fmt::Debug for DefaultRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultRules")
            .field("fallback", &self.fallback)
            .field("by_construct", &self.by_construct)
            .field(
                "literal_rules",
                &self
                    .literal_rules
                    .iter()
                    .map(|r| r.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DefaultRules {
    /// Rules that map every construct to the hierarchy default.
    #[must_use]
    pub fn new(hierarchy_default: QualifierId) -> Self {
        Self {
            fallback: hierarchy_default,
            by_construct: FxHashMap::default(),
            literal_rules: Vec::new(),
        }
    }

    /// Override the default for one construct kind.
    pub fn set(&mut self, kind: ConstructKind, qualifier: QualifierId) -> &mut Self {
        self.by_construct.insert(kind, qualifier);
        self
    }

    /// Override the default for every literal kind at once.
    pub fn set_all_literals(&mut self, qualifier: QualifierId) -> &mut Self {
        for kind in ConstructKind::LITERALS {
            self.by_construct.insert(kind, qualifier);
        }
        self
    }

    /// Append a content-sensitive literal rule (consulted in order).
    pub fn add_literal_rule(&mut self, rule: BoxedLiteralRule) -> &mut Self {
        self.literal_rules.push(rule);
        self
    }

    /// The default qualifier for a construct kind. Total: always returns a
    /// qualifier, never "unspecified".
    pub fn qualifier_for(&self, kind: ConstructKind) -> QualifierId {
        self.by_construct.get(&kind).copied().unwrap_or(self.fallback)
    }

    /// The default qualifier for a literal, consulting the literal rules
    /// first, then the per-kind table.
    pub fn qualifier_for_literal(&self, kind: LiteralKind, text: Option<&str>) -> QualifierId {
        for rule in &self.literal_rules {
            if let Some(q) = rule.classify(kind, text) {
                return q;
            }
        }
        self.qualifier_for(ConstructKind::from_literal(kind))
    }
}

// =============================================================================
// Tests
// =============================================================================
