//! Qualifier hierarchy definitions and lattice queries.
//!
//! A [`Hierarchy`] is an immutable join-semilattice of qualifier symbols:
//! a set of qualifiers, a subtype partial order with unique top and bottom
//! elements, and a designated default qualifier for unannotated code.
//!
//! Qualifiers are interned at construction time: each symbol gets a small
//! integer [`QualifierId`] and all later comparisons are id comparisons.
//! Subtype queries are answered in O(1) from a reflexive-transitive closure
//! bit matrix, and joins in O(1) from a precomputed least-upper-bound table,
//! both built once by [`HierarchyBuilder::build`].
//!
//! Construction is the only fallible operation: an edge set that is not a
//! lattice (cycles, missing or ambiguous top/bottom, ambiguous joins) is a
//! configuration error reported as [`HierarchyError`] before any analysis
//! runs.
//!
//! # Example
//!
//! ```
//! use qualcheck::hierarchy::Hierarchy;
//!
//! let h = Hierarchy::builder("confidential")
//!     .qualifier("UnknownConfidential")
//!     .qualifier("NonConfidential")
//!     .edge("NonConfidential", "UnknownConfidential")
//!     .top("UnknownConfidential")
//!     .bottom("NonConfidential")
//!     .default_qualifier("UnknownConfidential")
//!     .build()
//!     .unwrap();
//!
//! let non = h.id("NonConfidential").unwrap();
//! assert!(h.is_subtype(non, h.top()));
//! assert_eq!(h.join(non, h.top()), h.top());
//! ```

use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod defaults;

// =============================================================================
// Qualifier Identity
// =============================================================================

/// Interned identity of a qualifier within one hierarchy.
///
/// Ids are only meaningful relative to the hierarchy that produced them;
/// hierarchies never share ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifierId(pub u16);

impl fmt::Display for QualifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors detected while validating a hierarchy definition.
///
/// All of these are fatal configuration errors: a hierarchy that fails to
/// build must abort the run before any compilation unit is analyzed.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// The hierarchy declares no qualifiers at all.
    #[error("hierarchy '{0}' declares no qualifiers")]
    Empty(String),

    /// The same qualifier name was declared twice.
    #[error("duplicate qualifier '{0}'")]
    DuplicateQualifier(String),

    /// An edge, top, bottom, or default references an undeclared qualifier.
    #[error("unknown qualifier '{0}' referenced in hierarchy definition")]
    UnknownQualifier(String),

    /// The subtype relation is not antisymmetric.
    #[error("subtype cycle between '{0}' and '{1}'")]
    Cycle(String, String),

    /// No top element was declared.
    #[error("hierarchy '{0}' declares no top qualifier")]
    MissingTop(String),

    /// No bottom element was declared.
    #[error("hierarchy '{0}' declares no bottom qualifier")]
    MissingBottom(String),

    /// No default qualifier was declared.
    #[error("hierarchy '{0}' declares no default qualifier")]
    MissingDefault(String),

    /// Some qualifier is not a subtype of the declared top.
    #[error("'{other}' is not a subtype of the declared top '{top}'")]
    InvalidTop { top: String, other: String },

    /// The declared bottom is not a subtype of some qualifier.
    #[error("declared bottom '{bottom}' is not a subtype of '{other}'")]
    InvalidBottom { bottom: String, other: String },

    /// A pair of qualifiers has no unique least upper bound.
    #[error("no unique least upper bound for '{a}' and '{b}' (minimal upper bounds: {candidates:?})")]
    AmbiguousJoin {
        a: String,
        b: String,
        candidates: Vec<String>,
    },
}

// =============================================================================
// Hierarchy
// =============================================================================

/// An immutable qualifier lattice with O(1) subtype and join queries.
///
/// Built through [`Hierarchy::builder`]; once built it is `Send + Sync` and
/// never changes, so independent hierarchies can be queried concurrently
/// without synchronization.
pub struct Hierarchy {
    name: String,
    warning_prefix: String,
    names: Vec<String>,
    ids: FxHashMap<String, QualifierId>,
    /// Row `a` has bit `b` set iff `a <= b` (reflexive-transitive closure).
    up: Vec<FixedBitSet>,
    /// Flattened n*n least-upper-bound table, indexed `a * n + b`.
    joins: Vec<QualifierId>,
    top: QualifierId,
    bottom: QualifierId,
    default: QualifierId,
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("name", &self.name)
            .field("qualifiers", &self.names)
            .field("top", &self.names[self.top.0 as usize])
            .field("bottom", &self.names[self.bottom.0 as usize])
            .field("default", &self.names[self.default.0 as usize])
            .finish()
    }
}

impl Hierarchy {
    /// Start building a hierarchy with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> HierarchyBuilder {
        HierarchyBuilder::new(name)
    }

    /// Name of this hierarchy (e.g. "confidential").
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Warning-suppression prefix for this hierarchy.
    ///
    /// Defaults to the hierarchy name when not set explicitly.
    #[inline]
    pub fn warning_prefix(&self) -> &str {
        &self.warning_prefix
    }

    /// Number of qualifiers in this hierarchy.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the hierarchy has no qualifiers (never true for a built one).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up a qualifier id by name.
    pub fn id(&self, name: &str) -> Option<QualifierId> {
        self.ids.get(name).copied()
    }

    /// Name of a qualifier id.
    ///
    /// # Panics
    ///
    /// Panics if `q` did not come from this hierarchy.
    pub fn name_of(&self, q: QualifierId) -> &str {
        &self.names[q.0 as usize]
    }

    /// Resolve the first name in `names` that belongs to this hierarchy.
    ///
    /// Declaration sites may carry qualifier names from several hierarchies
    /// at once; each hierarchy picks out its own and ignores the rest.
    pub fn resolve_first(&self, names: &[String]) -> Option<QualifierId> {
        names.iter().find_map(|n| self.id(n))
    }

    /// The top qualifier (supertype of everything).
    #[inline]
    pub fn top(&self) -> QualifierId {
        self.top
    }

    /// The bottom qualifier (subtype of everything).
    #[inline]
    pub fn bottom(&self) -> QualifierId {
        self.bottom
    }

    /// The default qualifier assigned to unannotated constructs.
    #[inline]
    pub fn default_qualifier(&self) -> QualifierId {
        self.default
    }

    /// Iterate over all qualifier ids in this hierarchy.
    pub fn qualifiers(&self) -> impl Iterator<Item = QualifierId> + '_ {
        (0..self.names.len()).map(|i| QualifierId(i as u16))
    }

    /// True iff `a <= b` in the subtype order.
    #[inline]
    pub fn is_subtype(&self, a: QualifierId, b: QualifierId) -> bool {
        self.up[a.0 as usize].contains(b.0 as usize)
    }

    /// Least upper bound of `a` and `b`.
    #[inline]
    pub fn join(&self, a: QualifierId, b: QualifierId) -> QualifierId {
        self.joins[a.0 as usize * self.names.len() + b.0 as usize]
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Hierarchy`]; validation happens in [`HierarchyBuilder::build`].
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    name: String,
    warning_prefix: Option<String>,
    qualifiers: Vec<String>,
    /// (lower, upper) pairs meaning lower <= upper.
    edges: Vec<(String, String)>,
    top: Option<String>,
    bottom: Option<String>,
    default: Option<String>,
}

impl HierarchyBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare a qualifier symbol.
    #[must_use]
    pub fn qualifier(mut self, name: impl Into<String>) -> Self {
        self.qualifiers.push(name.into());
        self
    }

    /// Declare a direct subtype edge: `lower <= upper`.
    #[must_use]
    pub fn edge(mut self, lower: impl Into<String>, upper: impl Into<String>) -> Self {
        self.edges.push((lower.into(), upper.into()));
        self
    }

    /// Declare the top qualifier.
    #[must_use]
    pub fn top(mut self, name: impl Into<String>) -> Self {
        self.top = Some(name.into());
        self
    }

    /// Declare the bottom qualifier.
    #[must_use]
    pub fn bottom(mut self, name: impl Into<String>) -> Self {
        self.bottom = Some(name.into());
        self
    }

    /// Declare the default qualifier for unannotated constructs.
    #[must_use]
    pub fn default_qualifier(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    /// Set the warning-suppression prefix (defaults to the hierarchy name).
    #[must_use]
    pub fn warning_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.warning_prefix = Some(prefix.into());
        self
    }

    /// Validate the definition and build the immutable hierarchy.
    ///
    /// # Errors
    ///
    /// Returns a [`HierarchyError`] if the definition is not a lattice with
    /// unique top and bottom; see the error variants for the exact checks.
    pub fn build(self) -> Result<Hierarchy, HierarchyError> {
        let n = self.qualifiers.len();
        if n == 0 {
            return Err(HierarchyError::Empty(self.name));
        }

        let mut ids: FxHashMap<String, QualifierId> = FxHashMap::default();
        for (i, name) in self.qualifiers.iter().enumerate() {
            if ids.insert(name.clone(), QualifierId(i as u16)).is_some() {
                return Err(HierarchyError::DuplicateQualifier(name.clone()));
            }
        }

        let resolve = |name: &str| -> Result<QualifierId, HierarchyError> {
            ids.get(name)
                .copied()
                .ok_or_else(|| HierarchyError::UnknownQualifier(name.to_string()))
        };

        // Reflexive base plus direct edges.
        let mut up: Vec<FixedBitSet> = (0..n)
            .map(|i| {
                let mut row = FixedBitSet::with_capacity(n);
                row.insert(i);
                row
            })
            .collect();
        for (lower, upper) in &self.edges {
            let l = resolve(lower)?;
            let u = resolve(upper)?;
            up[l.0 as usize].insert(u.0 as usize);
        }

        // Transitive closure by saturation: repeatedly fold each reachable
        // row into the current row until nothing changes.
        loop {
            let mut changed = false;
            for a in 0..n {
                let reachable: Vec<usize> = up[a].ones().collect();
                for b in reachable {
                    if b != a {
                        let row_b = up[b].clone();
                        let before = up[a].count_ones(..);
                        up[a].union_with(&row_b);
                        if up[a].count_ones(..) != before {
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        // Antisymmetry: mutual reachability between distinct ids is a cycle.
        for a in 0..n {
            for b in (a + 1)..n {
                if up[a].contains(b) && up[b].contains(a) {
                    return Err(HierarchyError::Cycle(
                        self.qualifiers[a].clone(),
                        self.qualifiers[b].clone(),
                    ));
                }
            }
        }

        let top = resolve(
            self.top
                .as_deref()
                .ok_or_else(|| HierarchyError::MissingTop(self.name.clone()))?,
        )?;
        let bottom = resolve(
            self.bottom
                .as_deref()
                .ok_or_else(|| HierarchyError::MissingBottom(self.name.clone()))?,
        )?;
        let default = resolve(
            self.default
                .as_deref()
                .ok_or_else(|| HierarchyError::MissingDefault(self.name.clone()))?,
        )?;

        for q in 0..n {
            if !up[q].contains(top.0 as usize) {
                return Err(HierarchyError::InvalidTop {
                    top: self.qualifiers[top.0 as usize].clone(),
                    other: self.qualifiers[q].clone(),
                });
            }
            if !up[bottom.0 as usize].contains(q) {
                return Err(HierarchyError::InvalidBottom {
                    bottom: self.qualifiers[bottom.0 as usize].clone(),
                    other: self.qualifiers[q].clone(),
                });
            }
        }

        // Precompute joins: the unique minimal element of the common upper
        // bound set. The set is never empty because top bounds everything.
        let mut joins = vec![QualifierId(0); n * n];
        for a in 0..n {
            for b in 0..n {
                let mut common = up[a].clone();
                common.intersect_with(&up[b]);
                let candidates: Vec<usize> = common
                    .ones()
                    .filter(|&u| {
                        // u is minimal if no other common upper bound lies below it
                        !common.ones().any(|v| v != u && up[v].contains(u))
                    })
                    .collect();
                match candidates.as_slice() {
                    [unique] => joins[a * n + b] = QualifierId(*unique as u16),
                    _ => {
                        return Err(HierarchyError::AmbiguousJoin {
                            a: self.qualifiers[a].clone(),
                            b: self.qualifiers[b].clone(),
                            candidates: candidates
                                .iter()
                                .map(|&c| self.qualifiers[c].clone())
                                .collect(),
                        });
                    }
                }
            }
        }

        Ok(Hierarchy {
            warning_prefix: self.warning_prefix.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            names: self.qualifiers,
            ids,
            up,
            joins,
            top,
            bottom,
            default,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
