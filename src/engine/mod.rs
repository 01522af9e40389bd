//! The analysis engine façade.
//!
//! An [`Engine`] owns a set of configured [`TypeSystem`]s and runs the two
//! analysis passes over compilation units: the assignment pass resolves a
//! qualifier for every expression of every system, then the subtype checker
//! walks the qualifier-sensitive sites and collects violations.
//!
//! One unit is always analyzed synchronously to completion; independent
//! units share no mutable state and [`Engine::check_units`] fans them out
//! across the rayon thread pool, collecting one report per unit in input
//! order. Within a unit, violations are sorted into source order so
//! diagnostics are deterministic and reproducible.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assign::{AssignmentPass, QualifierAssignment};
use crate::check::{SubtypeChecker, Violation};
use crate::expr::CompilationUnit;
use crate::hierarchy::HierarchyError;
use crate::systems::{self, TypeSystem};

// =============================================================================
// Reports
// =============================================================================

/// All violations of one compilation unit, in source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// Source path of the unit.
    pub unit: String,
    /// Violations in source (pre-order) position.
    pub violations: Vec<Violation>,
}

impl UnitReport {
    /// True if the unit checked cleanly.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The qualifier checking engine: one instance per analysis run.
#[derive(Debug)]
pub struct Engine {
    systems: Vec<TypeSystem>,
}

impl Engine {
    /// Engine over explicitly supplied systems.
    #[must_use]
    pub fn new(systems: Vec<TypeSystem>) -> Self {
        Self { systems }
    }

    /// Engine over the built-in systems (confidentiality and SQL quotes).
    ///
    /// # Errors
    ///
    /// Propagates hierarchy validation failure; fatal before any unit is
    /// analyzed.
    pub fn with_builtin_systems() -> Result<Self, HierarchyError> {
        Ok(Self::new(systems::builtin_systems()?))
    }

    /// The configured systems.
    pub fn systems(&self) -> &[TypeSystem] {
        &self.systems
    }

    /// Analyze one compilation unit and return its violations in source
    /// order.
    pub fn check_unit(&self, unit: &CompilationUnit) -> Vec<Violation> {
        let mut violations = Vec::new();

        for system in &self.systems {
            let mut assignment = QualifierAssignment::new();
            AssignmentPass::new(
                system.hierarchy(),
                system.defaults(),
                system.combinators(),
                system.stubs(),
                unit,
            )
            .resolve_unit(&mut assignment);

            debug!(
                unit = unit.path.as_str(),
                hierarchy = system.hierarchy().name(),
                resolved = assignment.len(),
                "assignment pass complete"
            );

            SubtypeChecker::new(
                system.hierarchy(),
                system.defaults(),
                system.stubs(),
                unit,
                &assignment,
            )
            .check_unit(&mut violations);
        }

        // Each system reports in source order; interleave the systems into
        // one source-ordered stream. The sort is stable, so same-site
        // violations keep system order.
        violations.sort_by_key(|v| (v.location.line, v.location.column));
        violations
    }

    /// Analyze many units in parallel, one report per unit in input order.
    pub fn check_units(&self, units: &[CompilationUnit]) -> Vec<UnitReport> {
        units
            .par_iter()
            .map(|unit| UnitReport {
                unit: unit.path.clone(),
                violations: self.check_unit(unit),
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
