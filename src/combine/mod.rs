//! Expression combinator registry.
//!
//! A combinator computes the qualifier of a composite expression from the
//! already-resolved qualifiers of its operands. Combinators are pure
//! functions registered per [`CombineKind`] in a [`CombinatorRegistry`];
//! kinds without a registered combinator fall back to the generic
//! least-upper-bound fold ([`JoinCombinator`]).
//!
//! Operands are always passed in left-to-right source order (compound
//! assignment: target first, then the assigned expression), even where the
//! underlying arithmetic is commutative, so that later non-commutative
//! qualifier dimensions keep working unchanged.
//!
//! The quote-parity combinator ([`ParityCombinator`]) implements the string
//! concatenation rules of the SQL quotes lattice:
//!
//! - either operand top ("unknown") makes the result top;
//! - a bottom operand ("no value observed") is the identity and yields the
//!   other operand;
//! - otherwise the result parity is the XOR of the operand parities
//!   (odd + odd = even, odd + even = odd, even + even = even).

use rustc_hash::FxHashMap;
use std::fmt;

use crate::expr::{BinaryOp, UnaryOp};
use crate::hierarchy::{Hierarchy, QualifierId};

// =============================================================================
// Registry Keys
// =============================================================================

/// Key identifying which combinator applies to an expression node.
///
/// Binary and compound-assignment kinds carry their operator so that e.g.
/// string concatenation (`Add`) can combine differently from comparison
/// operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombineKind {
    Binary(BinaryOp),
    CompoundAssign(BinaryOp),
    Ternary,
    Call,
    Unary(UnaryOp),
}

// =============================================================================
// Combinator Trait
// =============================================================================

/// A pure rule combining operand qualifiers into a result qualifier.
///
/// Implementations must be total: any operand list (including an empty one)
/// must produce a qualifier of the same hierarchy.
pub trait Combinator: Send + Sync {
    /// Short name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Combine `operands` (left-to-right source order) under `hierarchy`.
    fn combine(&self, hierarchy: &Hierarchy, operands: &[QualifierId]) -> QualifierId;
}

/// Boxed combinator stored in the registry.
pub type BoxedCombinator = Box<dyn Combinator>;

// =============================================================================
// Generic Combinators
// =============================================================================

/// The generic lattice-join combinator: folds `join` over the operands.
///
/// An empty operand list yields the hierarchy default rather than the fold
/// identity (bottom): a value with no combinable operands still exists, and
/// claiming "no information observed" for it would under-approximate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinCombinator;

impl Combinator for JoinCombinator {
    fn name(&self) -> &'static str {
        "join"
    }

    fn combine(&self, hierarchy: &Hierarchy, operands: &[QualifierId]) -> QualifierId {
        match operands.split_first() {
            None => hierarchy.default_qualifier(),
            Some((&first, rest)) => rest.iter().fold(first, |acc, &q| hierarchy.join(acc, q)),
        }
    }
}

/// Combinator for conditional expressions: joins the two branch operands
/// and ignores the condition operand.
#[derive(Debug, Clone, Copy, Default)]
pub struct TernaryCombinator;

impl Combinator for TernaryCombinator {
    fn name(&self) -> &'static str {
        "ternary"
    }

    fn combine(&self, hierarchy: &Hierarchy, operands: &[QualifierId]) -> QualifierId {
        match operands {
            [_cond, then_q, else_q] => hierarchy.join(*then_q, *else_q),
            // Malformed ternary from the provider: combine what is there.
            _ => JoinCombinator.combine(hierarchy, operands),
        }
    }
}

// =============================================================================
// Quote-Parity Combinator
// =============================================================================

/// Concatenation combinator over a parity lattice
/// {top, odd, even, bottom}.
///
/// `even` and `odd` are the two middle elements of the hierarchy this
/// combinator is registered for; top and bottom are taken from the
/// hierarchy itself.
#[derive(Debug, Clone, Copy)]
pub struct ParityCombinator {
    even: QualifierId,
    odd: QualifierId,
}

impl ParityCombinator {
    /// Create a parity combinator over the given even/odd qualifiers.
    #[must_use]
    pub fn new(even: QualifierId, odd: QualifierId) -> Self {
        Self { even, odd }
    }
}

impl Combinator for ParityCombinator {
    fn name(&self) -> &'static str {
        "quote-parity"
    }

    fn combine(&self, hierarchy: &Hierarchy, operands: &[QualifierId]) -> QualifierId {
        let top = hierarchy.top();
        let bottom = hierarchy.bottom();

        // Top dominates, and the check precedes the bottom check:
        // combining an unknown with anything, including bottom, is unknown.
        if operands.iter().any(|&q| q == top) {
            return top;
        }

        let mut parity = 0u8;
        let mut informative = 0usize;
        for &q in operands {
            if q == bottom {
                continue;
            }
            informative += 1;
            if q == self.odd {
                parity ^= 1;
            } else if q != self.even {
                // Qualifier outside the parity fragment: no parity claim.
                return top;
            }
        }

        if informative == 0 {
            return bottom;
        }
        if parity == 0 {
            self.even
        } else {
            self.odd
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Kind-to-combinator lookup table with a join fallback.
///
/// `new()` installs the ternary combinator; type systems register their own
/// kind-specific rules on top (e.g. parity for `Add` concatenation).
pub struct CombinatorRegistry {
    by_kind: FxHashMap<CombineKind, BoxedCombinator>,
    fallback: BoxedCombinator,
}

impl fmt::Debug for CombinatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&CombineKind> = self.by_kind.keys().collect();
        kinds.sort_by_key(|k| format!("{k:?}"));
        f.debug_struct("CombinatorRegistry")
            .field("registered", &kinds)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl Default for CombinatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CombinatorRegistry {
    /// Registry with the ternary rule registered and join as the fallback.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            by_kind: FxHashMap::default(),
            fallback: Box::new(JoinCombinator),
        };
        registry.register(CombineKind::Ternary, Box::new(TernaryCombinator));
        registry
    }

    /// Register a combinator for a kind, replacing any previous one.
    pub fn register(&mut self, kind: CombineKind, combinator: BoxedCombinator) {
        self.by_kind.insert(kind, combinator);
    }

    /// True if `kind` has a specifically registered combinator.
    pub fn has(&self, kind: CombineKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Combine operand qualifiers for `kind`, falling back to join.
    pub fn combine(
        &self,
        kind: CombineKind,
        hierarchy: &Hierarchy,
        operands: &[QualifierId],
    ) -> QualifierId {
        self.by_kind
            .get(&kind)
            .unwrap_or(&self.fallback)
            .combine(hierarchy, operands)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parity_hierarchy() -> Hierarchy {
        Hierarchy::builder("sqlquotes")
            .qualifier("Unknown")
            .qualifier("Odd")
            .qualifier("Even")
            .qualifier("Bottom")
            .edge("Bottom", "Odd")
            .edge("Bottom", "Even")
            .edge("Odd", "Unknown")
            .edge("Even", "Unknown")
            .top("Unknown")
            .bottom("Bottom")
            .default_qualifier("Unknown")
            .build()
            .unwrap()
    }

    fn ids(h: &Hierarchy) -> (QualifierId, QualifierId, QualifierId, QualifierId) {
        (
            h.id("Unknown").unwrap(),
            h.id("Odd").unwrap(),
            h.id("Even").unwrap(),
            h.id("Bottom").unwrap(),
        )
    }

    #[test]
    fn test_parity_truth_table() {
        let h = parity_hierarchy();
        let (_, odd, even, _) = ids(&h);
        let c = ParityCombinator::new(even, odd);

        assert_eq!(c.combine(&h, &[even, even]), even);
        assert_eq!(c.combine(&h, &[even, odd]), odd);
        assert_eq!(c.combine(&h, &[odd, even]), odd);
        assert_eq!(c.combine(&h, &[odd, odd]), even);
    }

    #[test]
    fn test_parity_top_dominates() {
        let h = parity_hierarchy();
        let (unknown, odd, even, bottom) = ids(&h);
        let c = ParityCombinator::new(even, odd);

        assert_eq!(c.combine(&h, &[unknown, odd]), unknown);
        assert_eq!(c.combine(&h, &[even, unknown]), unknown);
        assert_eq!(c.combine(&h, &[unknown, unknown]), unknown);
        // Top beats bottom: the unknown check comes first.
        assert_eq!(c.combine(&h, &[unknown, bottom]), unknown);
        assert_eq!(c.combine(&h, &[bottom, unknown]), unknown);
    }

    #[test]
    fn test_parity_bottom_is_identity() {
        let h = parity_hierarchy();
        let (_, odd, even, bottom) = ids(&h);
        let c = ParityCombinator::new(even, odd);

        assert_eq!(c.combine(&h, &[bottom, odd]), odd);
        assert_eq!(c.combine(&h, &[odd, bottom]), odd);
        assert_eq!(c.combine(&h, &[bottom, even]), even);
        assert_eq!(c.combine(&h, &[bottom, bottom]), bottom);
    }

    #[test]
    fn test_parity_many_operands() {
        let h = parity_hierarchy();
        let (_, odd, even, bottom) = ids(&h);
        let c = ParityCombinator::new(even, odd);

        // odd + odd + odd = odd; bottoms do not contribute.
        assert_eq!(c.combine(&h, &[odd, bottom, odd, odd]), odd);
        assert_eq!(c.combine(&h, &[odd, even, odd]), even);
    }

    #[test]
    fn test_join_fold() {
        let h = parity_hierarchy();
        let (unknown, odd, even, bottom) = ids(&h);
        let c = JoinCombinator;

        assert_eq!(c.combine(&h, &[odd]), odd);
        assert_eq!(c.combine(&h, &[odd, even]), unknown);
        assert_eq!(c.combine(&h, &[bottom, even]), even);
        assert_eq!(c.combine(&h, &[unknown, bottom]), unknown);
    }

    #[test]
    fn test_join_of_nothing_is_default() {
        let h = parity_hierarchy();
        assert_eq!(JoinCombinator.combine(&h, &[]), h.default_qualifier());
    }

    #[test]
    fn test_ternary_skips_condition() {
        let h = parity_hierarchy();
        let (unknown, odd, even, _) = ids(&h);
        let c = TernaryCombinator;

        // Condition qualifier must not leak into the result.
        assert_eq!(c.combine(&h, &[unknown, odd, odd]), odd);
        assert_eq!(c.combine(&h, &[odd, even, even]), even);
        assert_eq!(c.combine(&h, &[even, odd, even]), unknown);
    }

    #[test]
    fn test_registry_fallback_and_registration() {
        let h = parity_hierarchy();
        let (unknown, odd, even, _) = ids(&h);
        let mut registry = CombinatorRegistry::new();

        // Unregistered binary kind falls back to join.
        let kind = CombineKind::Binary(BinaryOp::Add);
        assert!(!registry.has(kind));
        assert_eq!(registry.combine(kind, &h, &[odd, odd]), unknown);

        registry.register(kind, Box::new(ParityCombinator::new(even, odd)));
        assert!(registry.has(kind));
        assert_eq!(registry.combine(kind, &h, &[odd, odd]), even);

        // Other operators are untouched by the registration.
        let eq_kind = CombineKind::Binary(BinaryOp::Eq);
        assert_eq!(registry.combine(eq_kind, &h, &[odd, odd]), odd);
    }
}
