//! Built-in qualifier type systems.
//!
//! A [`TypeSystem`] bundles everything one qualifier dimension needs: its
//! validated hierarchy, its default assignment rules, its combinator
//! registrations, and the stub overrides for external signatures. Systems
//! are independent; the engine runs one assignment/check pass per system
//! and the systems never interact.
//!
//! Two systems ship with the crate:
//!
//! - [`confidential`]: flags confidential values flowing into user-facing
//!   sinks (loggers, UI widgets, response headers);
//! - [`sql_quotes`]: tracks the parity of unescaped quote counts in SQL
//!   fragments so unbalanced strings never reach query execution.

use crate::combine::CombinatorRegistry;
use crate::hierarchy::defaults::DefaultRules;
use crate::hierarchy::{Hierarchy, HierarchyError};
use crate::stubs::StubTable;

pub mod confidential;
pub mod sql_quotes;

// =============================================================================
// Type System
// =============================================================================

/// One fully configured qualifier dimension.
#[derive(Debug)]
pub struct TypeSystem {
    hierarchy: Hierarchy,
    defaults: DefaultRules,
    combinators: CombinatorRegistry,
    stubs: StubTable,
}

impl TypeSystem {
    /// Assemble a system from its parts.
    #[must_use]
    pub fn new(
        hierarchy: Hierarchy,
        defaults: DefaultRules,
        combinators: CombinatorRegistry,
        stubs: StubTable,
    ) -> Self {
        Self {
            hierarchy,
            defaults,
            combinators,
            stubs,
        }
    }

    /// The system's qualifier hierarchy.
    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// The system's default assignment rules.
    #[inline]
    pub fn defaults(&self) -> &DefaultRules {
        &self.defaults
    }

    /// The system's combinator registry.
    #[inline]
    pub fn combinators(&self) -> &CombinatorRegistry {
        &self.combinators
    }

    /// The system's stub override table.
    #[inline]
    pub fn stubs(&self) -> &StubTable {
        &self.stubs
    }

    /// Replace the stub table (e.g. with project-specific overrides).
    #[must_use]
    pub fn with_stubs(mut self, stubs: StubTable) -> Self {
        self.stubs = stubs;
        self
    }
}

/// All built-in systems.
///
/// # Errors
///
/// Propagates a [`HierarchyError`] if a built-in lattice fails validation,
/// which would be a bug in this crate.
pub fn builtin_systems() -> Result<Vec<TypeSystem>, HierarchyError> {
    Ok(vec![confidential::system()?, sql_quotes::system()?])
}
