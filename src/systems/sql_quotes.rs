//! The SQL quote-parity type system.
//!
//! Tracks the parity of the unescaped single-quote count of SQL fragment
//! strings. A fragment with even parity can close every quote it opens; a
//! fragment with odd parity leaves a quote open. Concatenation adds quote
//! counts, so parity composes by XOR, and only even-parity strings should
//! reach query execution.
//!
//! Lattice: `SqlQuotesBottom <= {SqlEvenQuotes, SqlOddQuotes} <=
//! SqlQuotesUnknown`, with `SqlQuotesUnknown` as top and default.
//! String literals are classified by scanning their raw text; enum
//! constructors default to `SqlEvenQuotes` (an enum constant cannot smuggle
//! an unbalanced quote).

use memchr::memchr_iter;

use crate::combine::{CombinatorRegistry, CombineKind, ParityCombinator};
use crate::expr::{BinaryOp, LiteralKind};
use crate::hierarchy::defaults::{ConstructKind, DefaultRules, LiteralRule};
use crate::hierarchy::{Hierarchy, HierarchyError, QualifierId};
use crate::stubs::{StubSignature, StubTable};

use super::TypeSystem;

/// Top and default: quote parity unknown, unsafe to execute.
pub const SQL_QUOTES_UNKNOWN: &str = "SqlQuotesUnknown";

/// Odd count of unescaped quotes: an open quote is pending.
pub const SQL_ODD_QUOTES: &str = "SqlOddQuotes";

/// Even count of unescaped quotes: quoting is balanced.
pub const SQL_EVEN_QUOTES: &str = "SqlEvenQuotes";

/// Bottom: no value observed yet; identity under concatenation.
pub const SQL_QUOTES_BOTTOM: &str = "SqlQuotesBottom";

/// Build the quote-parity hierarchy.
///
/// # Errors
///
/// Never fails in practice; the lattice is statically known-good.
pub fn hierarchy() -> Result<Hierarchy, HierarchyError> {
    Hierarchy::builder("sqlquotes")
        .qualifier(SQL_QUOTES_UNKNOWN)
        .qualifier(SQL_ODD_QUOTES)
        .qualifier(SQL_EVEN_QUOTES)
        .qualifier(SQL_QUOTES_BOTTOM)
        .edge(SQL_QUOTES_BOTTOM, SQL_ODD_QUOTES)
        .edge(SQL_QUOTES_BOTTOM, SQL_EVEN_QUOTES)
        .edge(SQL_ODD_QUOTES, SQL_QUOTES_UNKNOWN)
        .edge(SQL_EVEN_QUOTES, SQL_QUOTES_UNKNOWN)
        .top(SQL_QUOTES_UNKNOWN)
        .bottom(SQL_QUOTES_BOTTOM)
        .default_qualifier(SQL_QUOTES_UNKNOWN)
        .warning_prefix("sqlquotes")
        .build()
}

/// The fully configured quote-parity system.
///
/// # Errors
///
/// Propagates hierarchy validation failure (a bug in this crate).
pub fn system() -> Result<TypeSystem, HierarchyError> {
    let hierarchy = hierarchy()?;
    let resolve = |name: &str| {
        hierarchy
            .id(name)
            .ok_or_else(|| HierarchyError::UnknownQualifier(name.to_string()))
    };
    let even = resolve(SQL_EVEN_QUOTES)?;
    let odd = resolve(SQL_ODD_QUOTES)?;

    let mut defaults = DefaultRules::new(hierarchy.default_qualifier());
    defaults.set(ConstructKind::EnumConstructor, even);
    defaults.add_literal_rule(Box::new(QuoteParityRule { even, odd }));

    let mut combinators = CombinatorRegistry::new();
    combinators.register(
        CombineKind::Binary(BinaryOp::Add),
        Box::new(ParityCombinator::new(even, odd)),
    );
    combinators.register(
        CombineKind::CompoundAssign(BinaryOp::Add),
        Box::new(ParityCombinator::new(even, odd)),
    );

    Ok(TypeSystem::new(
        hierarchy,
        defaults,
        combinators,
        builtin_stubs(),
    ))
}

/// Stub overrides for query execution sinks: only balanced strings may be
/// executed.
pub fn builtin_stubs() -> StubTable {
    let mut table = StubTable::new();
    for sig in [
        "java.sql.Statement.execute(String)",
        "java.sql.Statement.executeQuery(String)",
        "java.sql.Statement.executeUpdate(String)",
        "java.sql.Connection.prepareStatement(String)",
    ] {
        table.insert(sig, StubSignature::params_require(SQL_EVEN_QUOTES, 1));
    }
    table
}

// =============================================================================
// Literal Classification
// =============================================================================

/// Classifies a string literal by the parity of its unescaped quote count.
struct QuoteParityRule {
    even: QualifierId,
    odd: QualifierId,
}

impl LiteralRule for QuoteParityRule {
    fn name(&self) -> &'static str {
        "sql-quote-parity"
    }

    fn classify(&self, kind: LiteralKind, text: Option<&str>) -> Option<QualifierId> {
        if kind != LiteralKind::String {
            return None;
        }
        let text = text?;
        if unescaped_quote_count(text) % 2 == 0 {
            Some(self.even)
        } else {
            Some(self.odd)
        }
    }
}

/// Count single quotes not escaped by a backslash.
///
/// A quote preceded by an odd run of backslashes is escaped. SQL-style
/// doubled quotes (`''`) need no special case: the pair contributes two and
/// leaves parity unchanged.
fn unescaped_quote_count(text: &str) -> usize {
    let bytes = text.as_bytes();
    memchr_iter(b'\'', bytes)
        .filter(|&idx| {
            let mut backslashes = 0;
            while backslashes < idx && bytes[idx - backslashes - 1] == b'\\' {
                backslashes += 1;
            }
            backslashes % 2 == 0
        })
        .count()
}

// =============================================================================
// Tests
// =============================================================================
