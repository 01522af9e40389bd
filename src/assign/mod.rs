//! The type assignment pass.
//!
//! A single post-order traversal of each method body that resolves a
//! qualifier for every sub-expression of one hierarchy and memoizes it in a
//! [`QualifierAssignment`] keyed by node identity. Resolution order per
//! node:
//!
//! 1. an explicit qualifier carried by the node (authoritative);
//! 2. for calls, a declared or stub-overridden return qualifier;
//! 3. for leaves, the default assignment rules (literals through the
//!    content-sensitive literal rules, variable references through the
//!    referenced symbol's declaration);
//! 4. otherwise the combinator registry applied to the children's resolved
//!    qualifiers in left-to-right source order.
//!
//! The map is single-assignment: once a node is resolved its entry never
//! changes, and re-resolving it returns the stored value. Multiple
//! hierarchies are resolved by independent passes with no shared state.

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::combine::{CombinatorRegistry, CombineKind};
use crate::expr::{CompilationUnit, ExprKind, ExprNode, MethodDef, NodeId};
use crate::hierarchy::defaults::{ConstructKind, DefaultRules};
use crate::hierarchy::{Hierarchy, QualifierId};
use crate::stubs::StubTable;

// =============================================================================
// Qualifier Assignment
// =============================================================================

/// Per-(unit, hierarchy) mapping from node identity to resolved qualifier.
///
/// Populated monotonically by the pass and discarded after the subtype
/// checker finishes with the unit.
#[derive(Debug, Clone, Default)]
pub struct QualifierAssignment {
    resolved: FxHashMap<NodeId, QualifierId>,
}

impl QualifierAssignment {
    /// An empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved qualifier of a node, if the pass has reached it.
    #[inline]
    pub fn get(&self, node: NodeId) -> Option<QualifierId> {
        self.resolved.get(&node).copied()
    }

    /// Record a resolution. Single-assignment: the first recorded value
    /// wins and is returned on every later attempt.
    pub fn record(&mut self, node: NodeId, qualifier: QualifierId) -> QualifierId {
        *self.resolved.entry(node).or_insert(qualifier)
    }

    /// Number of resolved nodes.
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// True if nothing is resolved yet.
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

// =============================================================================
// Assignment Pass
// =============================================================================

/// The post-order qualifier resolution pass for one hierarchy.
#[derive(Debug)]
pub struct AssignmentPass<'a> {
    hierarchy: &'a Hierarchy,
    defaults: &'a DefaultRules,
    combinators: &'a CombinatorRegistry,
    stubs: &'a StubTable,
    unit: &'a CompilationUnit,
}

impl<'a> AssignmentPass<'a> {
    /// Create a pass over `unit` for one configured hierarchy.
    #[must_use]
    pub fn new(
        hierarchy: &'a Hierarchy,
        defaults: &'a DefaultRules,
        combinators: &'a CombinatorRegistry,
        stubs: &'a StubTable,
        unit: &'a CompilationUnit,
    ) -> Self {
        Self {
            hierarchy,
            defaults,
            combinators,
            stubs,
            unit,
        }
    }

    /// Resolve every node of every method body in the unit.
    pub fn resolve_unit(&self, out: &mut QualifierAssignment) {
        for method in &self.unit.methods {
            self.resolve_method(method, out);
        }
    }

    /// Resolve every node of one method body.
    pub fn resolve_method(&self, method: &MethodDef, out: &mut QualifierAssignment) {
        for node in &method.body {
            self.resolve(method, node, out);
        }
    }

    /// Resolve one node (children first), memoized by node identity.
    pub fn resolve(
        &self,
        method: &MethodDef,
        node: &ExprNode,
        out: &mut QualifierAssignment,
    ) -> QualifierId {
        if let Some(q) = out.get(node.id) {
            return q;
        }

        let child_quals: Vec<QualifierId> = node
            .children
            .iter()
            .map(|child| self.resolve(method, child, out))
            .collect();

        let q = self.resolve_own(method, node, &child_quals);
        trace!(
            hierarchy = self.hierarchy.name(),
            node = %node.id,
            qualifier = self.hierarchy.name_of(q),
            "resolved"
        );
        out.record(node.id, q)
    }

    fn resolve_own(
        &self,
        method: &MethodDef,
        node: &ExprNode,
        child_quals: &[QualifierId],
    ) -> QualifierId {
        // Explicit source-level qualifiers are authoritative.
        if let Some(q) = self.hierarchy.resolve_first(&node.explicit) {
            return q;
        }

        match &node.kind {
            ExprKind::Literal { literal, text } => self
                .defaults
                .qualifier_for_literal(*literal, text.as_deref()),

            ExprKind::VarRef { name } => method
                .declared_qualifiers(name)
                .and_then(|names| self.hierarchy.resolve_first(names))
                .unwrap_or_else(|| {
                    self.defaults
                        .qualifier_for(ConstructKind::UnannotatedVariable)
                }),

            ExprKind::Call { signature } => {
                if let Some(q) = self.callee_return(signature) {
                    q
                } else if child_quals.is_empty() {
                    self.defaults.qualifier_for(ConstructKind::CallResult)
                } else {
                    self.combinators
                        .combine(CombineKind::Call, self.hierarchy, child_quals)
                }
            }

            ExprKind::EnumCtor { .. } => {
                self.defaults.qualifier_for(ConstructKind::EnumConstructor)
            }

            // An assignment expression evaluates to the assigned value.
            ExprKind::Assign => match child_quals {
                [_target, value] => *value,
                _ => self.malformed(node),
            },

            ExprKind::Return => child_quals
                .first()
                .copied()
                .unwrap_or_else(|| self.hierarchy.bottom()),

            ExprKind::Binary { .. } | ExprKind::CompoundAssign { .. } => {
                if child_quals.len() != 2 {
                    return self.malformed(node);
                }
                self.combine(node, child_quals)
            }

            ExprKind::Ternary => {
                if child_quals.len() != 3 {
                    return self.malformed(node);
                }
                self.combine(node, child_quals)
            }

            // Parenthesized and unary contexts pass their single child
            // through unless a specific combinator is registered.
            ExprKind::Paren | ExprKind::Unary { .. } => {
                if let Some(kind) = node.kind.combine_kind() {
                    if self.combinators.has(kind) {
                        return self.combinators.combine(kind, self.hierarchy, child_quals);
                    }
                }
                match child_quals {
                    [only] => *only,
                    _ => self.malformed(node),
                }
            }
        }
    }

    fn combine(&self, node: &ExprNode, child_quals: &[QualifierId]) -> QualifierId {
        match node.kind.combine_kind() {
            Some(kind) => self.combinators.combine(kind, self.hierarchy, child_quals),
            None => self.malformed(node),
        }
    }

    /// Declared or stubbed return qualifier of a callee, source first.
    fn callee_return(&self, signature: &str) -> Option<QualifierId> {
        if let Some(info) = self.unit.signature_info(signature) {
            if let Some(q) = self.hierarchy.resolve_first(&info.ret) {
                return Some(q);
            }
        }
        self.stubs
            .get(signature)
            .and_then(|stub| stub.ret.as_deref())
            .and_then(|name| self.hierarchy.id(name))
    }

    /// A node whose child layout violates the AST provider contract.
    /// Resolved conservatively so the rest of the unit still gets checked.
    fn malformed(&self, node: &ExprNode) -> QualifierId {
        warn!(
            hierarchy = self.hierarchy.name(),
            node = %node.id,
            location = %node.location,
            "malformed expression node; using hierarchy default"
        );
        self.hierarchy.default_qualifier()
    }
}

// =============================================================================
// Tests
// =============================================================================
