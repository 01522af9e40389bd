//! Subtype checking and violation detection.
//!
//! After the assignment pass has resolved a qualifier for every node, the
//! checker walks all qualifier-sensitive sites in source pre-order and
//! tests `is_subtype(supplied, required)` at each one:
//!
//! - assignment and compound-assignment targets;
//! - each argument of a call whose signature is known from unit
//!   declarations or the stub table;
//! - `return` expressions against the enclosing method's declared return;
//! - override methods against the contract of the method they override
//!   (covariant return, contravariant parameters).
//!
//! Checking is purely diagnostic: it never mutates the tree or the
//! assignment, carries no state across sites, and keeps going past
//! violations so a single run reports everything in the unit.
//!
//! A method whose suppression list contains the hierarchy's warning prefix
//! produces no violations for that hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::assign::QualifierAssignment;
use crate::expr::{CompilationUnit, ExprKind, ExprNode, Location, MethodDef, NodeId};
use crate::hierarchy::defaults::{ConstructKind, DefaultRules};
use crate::hierarchy::{Hierarchy, QualifierId};
use crate::stubs::StubTable;

// =============================================================================
// Violations
// =============================================================================

/// The site category of a qualifier violation.
///
/// The serialized names match the diagnostic message keys of the original
/// checker family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Assignment of an incompatible value to a declared target.
    Assignment,
    /// Compound assignment producing an incompatible value.
    CompoundAssignment,
    /// Incompatible argument at a call site.
    Argument,
    /// Returned expression incompatible with the declared return.
    Return,
    /// Override return type incompatible with the overridden contract.
    OverrideReturn,
    /// Override parameter incompatible with the overridden contract.
    OverrideParam,
}

impl ViolationKind {
    /// Stable message key for this kind.
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            ViolationKind::Assignment => "assignment",
            ViolationKind::CompoundAssignment => "compound-assignment",
            ViolationKind::Argument => "argument",
            ViolationKind::Return => "return",
            ViolationKind::OverrideReturn => "override.return",
            ViolationKind::OverrideParam => "override.param",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message_key())
    }
}

/// Sentinel node id for violations anchored at a method declaration rather
/// than an expression (override contract checks).
pub const METHOD_SITE: NodeId = NodeId(u32::MAX);

/// One detected incompatibility between a supplied and a required
/// qualifier. Immutable; appended to the unit's violation list in source
/// order and never deduplicated beyond site identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Hierarchy that detected the incompatibility.
    pub hierarchy: String,
    /// Site category.
    pub kind: ViolationKind,
    /// Source location of the site.
    pub location: Location,
    /// Node identity of the site.
    pub node: NodeId,
    /// Qualifier the site requires.
    pub required: String,
    /// Qualifier the supplied value resolved to.
    pub supplied: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] incompatible qualifier ({}): required {}, supplied {}",
            self.location, self.hierarchy, self.kind, self.required, self.supplied
        )
    }
}

// =============================================================================
// Subtype Checker
// =============================================================================

/// The stateless per-hierarchy site checker.
#[derive(Debug)]
pub struct SubtypeChecker<'a> {
    hierarchy: &'a Hierarchy,
    defaults: &'a DefaultRules,
    stubs: &'a StubTable,
    unit: &'a CompilationUnit,
    assignment: &'a QualifierAssignment,
}

impl<'a> SubtypeChecker<'a> {
    /// Create a checker over one unit's resolved assignment.
    #[must_use]
    pub fn new(
        hierarchy: &'a Hierarchy,
        defaults: &'a DefaultRules,
        stubs: &'a StubTable,
        unit: &'a CompilationUnit,
        assignment: &'a QualifierAssignment,
    ) -> Self {
        Self {
            hierarchy,
            defaults,
            stubs,
            unit,
            assignment,
        }
    }

    /// Check every method of the unit, appending violations in source order.
    pub fn check_unit(&self, out: &mut Vec<Violation>) {
        for method in &self.unit.methods {
            self.check_method(method, out);
        }
    }

    /// Check one method: its override contract, then its body pre-order.
    pub fn check_method(&self, method: &MethodDef, out: &mut Vec<Violation>) {
        if method
            .suppressions
            .iter()
            .any(|s| s == self.hierarchy.warning_prefix())
        {
            debug!(
                hierarchy = self.hierarchy.name(),
                method = method.name.as_str(),
                "violations suppressed"
            );
            return;
        }

        self.check_override(method, out);
        for node in &method.body {
            self.check_expr(method, node, out);
        }
    }

    fn check_expr(&self, method: &MethodDef, node: &ExprNode, out: &mut Vec<Violation>) {
        match &node.kind {
            ExprKind::Assign => {
                if let [target, value] = node.children.as_slice() {
                    if let Some(required) = self.target_required(method, target) {
                        self.check_site(ViolationKind::Assignment, node, value.id, required, out);
                    }
                }
            }

            ExprKind::CompoundAssign { .. } => {
                if let [target, _value] = node.children.as_slice() {
                    if let Some(required) = self.target_required(method, target) {
                        // The combined result is what lands in the target.
                        self.check_site(
                            ViolationKind::CompoundAssignment,
                            node,
                            node.id,
                            required,
                            out,
                        );
                    }
                }
            }

            ExprKind::Call { signature } => {
                for (index, arg) in node.children.iter().enumerate() {
                    if let Some(required) = self.param_required(signature, index) {
                        self.check_site(ViolationKind::Argument, arg, arg.id, required, out);
                    }
                }
            }

            ExprKind::Return => {
                if let Some(value) = node.children.first() {
                    let required = self
                        .hierarchy
                        .resolve_first(&method.return_qualifiers)
                        .unwrap_or_else(|| {
                            self.defaults.qualifier_for(ConstructKind::UnannotatedReturn)
                        });
                    self.check_site(ViolationKind::Return, node, value.id, required, out);
                }
            }

            _ => {}
        }

        for child in &node.children {
            self.check_expr(method, child, out);
        }
    }

    /// Override contract: return is covariant, parameters are contravariant.
    fn check_override(&self, method: &MethodDef, out: &mut Vec<Violation>) {
        let Some(overridden_sig) = method.overrides.as_deref() else {
            return;
        };
        let Some(contract) = self.lookup_contract(overridden_sig) else {
            return;
        };

        let own = method.signature_info();

        let overridden_ret = self
            .hierarchy
            .resolve_first(&contract.ret)
            .unwrap_or_else(|| self.defaults.qualifier_for(ConstructKind::UnannotatedReturn));
        let own_ret = self
            .hierarchy
            .resolve_first(&own.ret)
            .unwrap_or_else(|| self.defaults.qualifier_for(ConstructKind::UnannotatedReturn));
        if !self.hierarchy.is_subtype(own_ret, overridden_ret) {
            out.push(self.violation(
                ViolationKind::OverrideReturn,
                &method.location,
                METHOD_SITE,
                overridden_ret,
                own_ret,
            ));
        }

        for (index, (own_param, overridden_param)) in
            own.params.iter().zip(contract.params.iter()).enumerate()
        {
            let required = self
                .hierarchy
                .resolve_first(own_param)
                .unwrap_or_else(|| {
                    self.defaults
                        .qualifier_for(ConstructKind::UnannotatedParameter)
                });
            let supplied = self
                .hierarchy
                .resolve_first(overridden_param)
                .unwrap_or_else(|| {
                    self.defaults
                        .qualifier_for(ConstructKind::UnannotatedParameter)
                });
            // Contravariance: the overridden parameter must fit where the
            // overriding parameter is declared.
            if !self.hierarchy.is_subtype(supplied, required) {
                debug!(
                    hierarchy = self.hierarchy.name(),
                    method = method.name.as_str(),
                    param = index,
                    "override parameter contravariance violated"
                );
                out.push(self.violation(
                    ViolationKind::OverrideParam,
                    &method.location,
                    METHOD_SITE,
                    required,
                    supplied,
                ));
            }
        }
    }

    /// The qualifier required by an assignment target, if the target is a
    /// checkable variable reference.
    fn target_required(&self, method: &MethodDef, target: &ExprNode) -> Option<QualifierId> {
        match &target.kind {
            ExprKind::VarRef { name } => Some(
                method
                    .declared_qualifiers(name)
                    .and_then(|names| self.hierarchy.resolve_first(names))
                    .unwrap_or_else(|| {
                        self.defaults
                            .qualifier_for(ConstructKind::UnannotatedVariable)
                    }),
            ),
            _ => None,
        }
    }

    /// The qualifier required for argument `index` of `signature`, if the
    /// signature is known at all (declarations first, then stubs).
    fn param_required(&self, signature: &str, index: usize) -> Option<QualifierId> {
        if let Some(info) = self.unit.signature_info(signature) {
            let names = info.params.get(index)?;
            return Some(self.hierarchy.resolve_first(names).unwrap_or_else(|| {
                self.defaults
                    .qualifier_for(ConstructKind::UnannotatedParameter)
            }));
        }
        let stub = self.stubs.get(signature)?;
        let name = stub.params.get(index)?;
        Some(match name.as_deref().and_then(|n| self.hierarchy.id(n)) {
            Some(q) => q,
            None => self
                .defaults
                .qualifier_for(ConstructKind::UnannotatedParameter),
        })
    }

    /// Override contract of a signature: unit declarations first, then stubs.
    fn lookup_contract(&self, signature: &str) -> Option<crate::expr::SignatureInfo> {
        if let Some(info) = self.unit.signature_info(signature) {
            return Some(info);
        }
        let stub = self.stubs.get(signature)?;
        Some(crate::expr::SignatureInfo {
            params: stub
                .params
                .iter()
                .map(|p| p.iter().cloned().collect())
                .collect(),
            ret: stub.ret.iter().cloned().collect(),
        })
    }

    fn check_site(
        &self,
        kind: ViolationKind,
        site: &ExprNode,
        supplied_node: NodeId,
        required: QualifierId,
        out: &mut Vec<Violation>,
    ) {
        let Some(supplied) = self.assignment.get(supplied_node) else {
            // The pass resolves every node before checking; a miss means the
            // provider handed the checker a different tree.
            debug!(node = %supplied_node, "no resolved qualifier for site; skipping");
            return;
        };
        if !self.hierarchy.is_subtype(supplied, required) {
            out.push(self.violation(kind, &site.location, site.id, required, supplied));
        }
    }

    fn violation(
        &self,
        kind: ViolationKind,
        location: &Location,
        node: NodeId,
        required: QualifierId,
        supplied: QualifierId,
    ) -> Violation {
        Violation {
            hierarchy: self.hierarchy.name().to_string(),
            kind,
            location: location.clone(),
            node,
            required: self.hierarchy.name_of(required).to_string(),
            supplied: self.hierarchy.name_of(supplied).to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
