//! Pluggable qualifier-lattice type checking.
//!
//! `qualcheck` augments a host language's type system with extra,
//! programmer-declared qualifiers (e.g. "confidential", "SQL quote parity")
//! and proves at analysis time that values never flow into contexts their
//! qualifier forbids. The host front end supplies an immutable expression
//! tree plus symbol information; the engine produces an ordered list of
//! violations and nothing else.
//!
//! # Architecture
//!
//! 1. **Hierarchies** ([`hierarchy`]): each qualifier dimension is a
//!    validated join-semilattice with top, bottom, and a default for
//!    unannotated code. Subtype and join queries are O(1) after
//!    construction.
//! 2. **Defaults** ([`hierarchy::defaults`]): total construct-kind to
//!    qualifier rules, with content-sensitive literal classification.
//! 3. **Combinators** ([`combine`]): per-expression-kind rules computing a
//!    composite expression's qualifier from its operands, with a generic
//!    least-upper-bound fallback.
//! 4. **Assignment pass** ([`assign`]): one post-order traversal per
//!    hierarchy resolving a qualifier for every node, memoized by node
//!    identity.
//! 5. **Subtype checker** ([`check`]): walks assignment, argument, return,
//!    and override sites in source order and collects violations.
//! 6. **Engine** ([`engine`]): runs both passes per compilation unit and
//!    fans independent units out across a thread pool.
//!
//! Two built-in systems ([`systems`]) instantiate the engine: the
//! confidentiality lattice with its logging/UI sink stubs, and the SQL
//! quote-parity lattice with its concatenation combinator. Violations can
//! be rendered as SARIF 2.1.0 ([`report`]) for CI ingestion.
//!
//! # Example
//!
//! ```
//! use qualcheck::engine::Engine;
//! use qualcheck::expr::{CompilationUnit, ExprNode, Location, MethodDef, ParamDecl};
//!
//! // void leak(String secret) { LOG.info(secret); }
//! let mut method = MethodDef::new("leak", "App.leak(String)", Location::new("App.java", 1, 1));
//! method.params.push(ParamDecl::new("secret", &[]));
//! method.body.push(ExprNode::call(
//!     1,
//!     "org.slf4j.Logger.info(String)",
//!     vec![ExprNode::var_ref(0, "secret", Location::new("App.java", 2, 5))],
//!     Location::new("App.java", 2, 5),
//! ));
//! let unit = CompilationUnit::new("App.java").with_method(method);
//!
//! let engine = Engine::with_builtin_systems().unwrap();
//! let violations = engine.check_unit(&unit);
//! assert_eq!(violations.len(), 1);
//! assert_eq!(violations[0].required, "NonConfidential");
//! ```

pub mod assign;
pub mod check;
pub mod combine;
pub mod engine;
pub mod expr;
pub mod hierarchy;
pub mod report;
pub mod stubs;
pub mod systems;

pub use assign::QualifierAssignment;
pub use check::{Violation, ViolationKind};
pub use engine::{Engine, UnitReport};
pub use expr::{CompilationUnit, ExprKind, ExprNode, Location, MethodDef, NodeId};
pub use hierarchy::{Hierarchy, HierarchyError, QualifierId};
pub use stubs::{StubSignature, StubTable};
pub use systems::TypeSystem;
