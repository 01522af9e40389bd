//! The consumed expression-tree and compilation-unit model.
//!
//! This module defines the read-only AST the engine analyzes. The tree is
//! owned by the host front end; the engine never mutates it and associates
//! all derived state (resolved qualifiers, violations) with nodes by
//! [`NodeId`] only.
//!
//! Expression kinds are a tagged union ([`ExprKind`]) rather than a visitor
//! class hierarchy; combination rules are looked up by kind in the
//! combinator registry, which keeps the rule set open for extension without
//! subclassing.
//!
//! A [`CompilationUnit`] bundles the methods of one analyzed source file
//! together with the signature declarations visible to it. Signature
//! qualifiers for code outside the unit come from the stub table instead.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combine::CombineKind;

// =============================================================================
// Locations and Identity
// =============================================================================

/// A source code location with file, line, and column information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path (relative or absolute)
    pub file: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Location {
    /// Create a new location.
    #[inline]
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Create an unknown/synthetic location.
    #[inline]
    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".to_string(),
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Unique identifier of an expression node within one compilation unit.
///
/// Assigned by the AST provider; the engine only requires uniqueness per
/// unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// =============================================================================
// Expression Kinds
// =============================================================================

/// Kind of a literal expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    String,
    Int,
    Float,
    Bool,
    Char,
    Null,
}

/// Binary operator of a [`ExprKind::Binary`] or [`ExprKind::CompoundAssign`]
/// node.
///
/// `Add` covers string concatenation: the host front end resolves operator
/// overloading, so an `Add` over string-typed operands is a concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operator of a [`ExprKind::Unary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}

/// The tagged union of expression kinds the engine understands.
///
/// Child layout conventions:
/// - `Binary`: `[left, right]`
/// - `Assign` / `CompoundAssign`: `[target, value]`
/// - `Ternary`: `[condition, then, else]`
/// - `Call` / `EnumCtor`: the arguments, left to right
/// - `Return`: zero or one child
/// - `Paren` / `Unary`: exactly one child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    /// A literal; `text` carries the raw literal content for
    /// content-sensitive default rules (e.g. quote counting).
    Literal {
        literal: LiteralKind,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        text: Option<String>,
    },
    /// Reference to a named local variable or parameter.
    VarRef { name: String },
    /// Binary operation over two children.
    Binary { op: BinaryOp },
    /// Compound assignment (`target op= value`).
    CompoundAssign { op: BinaryOp },
    /// Plain assignment (`target = value`).
    Assign,
    /// Conditional expression (`cond ? then : else`).
    Ternary,
    /// Method invocation; `signature` keys the declaration and stub tables.
    Call { signature: String },
    /// Enum constructor invocation.
    EnumCtor { enum_name: String },
    /// Return statement.
    Return,
    /// Parenthesized sub-expression.
    Paren,
    /// Unary operation over one child.
    Unary { op: UnaryOp },
}

impl ExprKind {
    /// The combinator-registry key for this kind, if the kind combines
    /// child qualifiers at all.
    pub fn combine_kind(&self) -> Option<CombineKind> {
        match self {
            ExprKind::Binary { op } => Some(CombineKind::Binary(*op)),
            ExprKind::CompoundAssign { op } => Some(CombineKind::CompoundAssign(*op)),
            ExprKind::Ternary => Some(CombineKind::Ternary),
            ExprKind::Call { .. } => Some(CombineKind::Call),
            ExprKind::Unary { op } => Some(CombineKind::Unary(*op)),
            _ => None,
        }
    }
}

// =============================================================================
// Expression Nodes
// =============================================================================

/// An immutable node of the consumed expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprNode {
    /// Provider-assigned identity, unique within the unit.
    pub id: NodeId,
    /// Expression kind tag.
    #[serde(flatten)]
    pub kind: ExprKind,
    /// Child expressions (layout depends on `kind`).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<ExprNode>,
    /// Source location of this expression.
    pub location: Location,
    /// Explicit qualifier names from source-level declarations, possibly
    /// spanning several hierarchies; each hierarchy resolves its own.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub explicit: Vec<String>,
}

impl ExprNode {
    /// Create a childless node.
    #[must_use]
    pub fn new(id: u32, kind: ExprKind, location: Location) -> Self {
        Self {
            id: NodeId(id),
            kind,
            children: Vec::new(),
            location,
            explicit: Vec::new(),
        }
    }

    /// Attach children (consumes and returns self for chaining).
    #[must_use]
    pub fn with_children(mut self, children: Vec<ExprNode>) -> Self {
        self.children = children;
        self
    }

    /// Attach an explicit qualifier name.
    #[must_use]
    pub fn with_explicit(mut self, qualifier: impl Into<String>) -> Self {
        self.explicit.push(qualifier.into());
        self
    }

    /// Convenience constructor for a literal node.
    #[must_use]
    pub fn literal(id: u32, literal: LiteralKind, text: Option<&str>, location: Location) -> Self {
        Self::new(
            id,
            ExprKind::Literal {
                literal,
                text: text.map(str::to_string),
            },
            location,
        )
    }

    /// Convenience constructor for a variable reference.
    #[must_use]
    pub fn var_ref(id: u32, name: impl Into<String>, location: Location) -> Self {
        Self::new(id, ExprKind::VarRef { name: name.into() }, location)
    }

    /// Convenience constructor for a call node.
    #[must_use]
    pub fn call(
        id: u32,
        signature: impl Into<String>,
        args: Vec<ExprNode>,
        location: Location,
    ) -> Self {
        Self::new(
            id,
            ExprKind::Call {
                signature: signature.into(),
            },
            location,
        )
        .with_children(args)
    }

    /// Convenience constructor for a string concatenation.
    #[must_use]
    pub fn concat(id: u32, left: ExprNode, right: ExprNode, location: Location) -> Self {
        Self::new(id, ExprKind::Binary { op: BinaryOp::Add }, location)
            .with_children(vec![left, right])
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// A formal parameter declaration with its qualifier names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Parameter name (visible in the method body as a variable).
    pub name: String,
    /// Declared qualifier names (empty means unannotated).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub qualifiers: Vec<String>,
}

impl ParamDecl {
    /// Create a parameter declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, qualifiers: &[&str]) -> Self {
        Self {
            name: name.into(),
            qualifiers: qualifiers.iter().map(|q| q.to_string()).collect(),
        }
    }
}

/// A local variable declaration with its qualifier names.
pub type LocalDecl = ParamDecl;

/// Qualifier signature of a method declared inside the analyzed source
/// (parameters left to right, then the return).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// Declared qualifier names per parameter (inner vec empty = unannotated).
    pub params: Vec<Vec<String>>,
    /// Declared qualifier names of the return type.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ret: Vec<String>,
}

impl SignatureInfo {
    /// Signature with the given per-parameter qualifier names and no return
    /// qualifier.
    #[must_use]
    pub fn with_params(params: Vec<Vec<String>>) -> Self {
        Self {
            params,
            ret: Vec::new(),
        }
    }
}

/// One analyzed method: declarations plus its body expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Simple method name.
    pub name: String,
    /// Fully qualified signature, the key used by call sites.
    pub signature: String,
    /// Declaration site location.
    pub location: Location,
    /// Formal parameters in order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub params: Vec<ParamDecl>,
    /// Local variable declarations visible in the body.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locals: Vec<LocalDecl>,
    /// Declared qualifier names of the return type.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub return_qualifiers: Vec<String>,
    /// Signature of the method this one overrides, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub overrides: Option<String>,
    /// Warning-suppression prefixes in effect for this method.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suppressions: Vec<String>,
    /// Body statements/expressions in source order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub body: Vec<ExprNode>,
}

impl MethodDef {
    /// Create an empty method with a name, signature, and location.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            location,
            ..Self::default()
        }
    }

    /// Declared qualifier names of a parameter or local, looked up by name.
    ///
    /// Parameters shadow locals of the same name, matching host-language
    /// scoping where the engine sees one flat method scope.
    pub fn declared_qualifiers(&self, name: &str) -> Option<&[String]> {
        self.params
            .iter()
            .chain(self.locals.iter())
            .find(|d| d.name == name)
            .map(|d| d.qualifiers.as_slice())
    }

    /// This method's qualifier signature, for override and call checking.
    #[must_use]
    pub fn signature_info(&self) -> SignatureInfo {
        SignatureInfo {
            params: self.params.iter().map(|p| p.qualifiers.clone()).collect(),
            ret: self.return_qualifiers.clone(),
        }
    }
}

// =============================================================================
// Compilation Units
// =============================================================================

/// One compilation unit: the methods of a source file plus the signature
/// declarations visible to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Source path, used for reporting.
    pub path: String,
    /// Methods in source order.
    pub methods: Vec<MethodDef>,
    /// Qualifier signatures of source-visible methods outside this unit.
    #[serde(skip_serializing_if = "FxHashMap::is_empty", default)]
    pub signatures: FxHashMap<String, SignatureInfo>,
}

impl CompilationUnit {
    /// Create an empty unit for a source path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            methods: Vec::new(),
            signatures: FxHashMap::default(),
        }
    }

    /// Add a method (consumes and returns self for chaining).
    #[must_use]
    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare a source-visible signature (consumes and returns self).
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>, info: SignatureInfo) -> Self {
        self.signatures.insert(signature.into(), info);
        self
    }

    /// Source-level qualifier signature for `signature`, if declared in
    /// this unit (own methods first, then the visible-signature table).
    pub fn signature_info(&self, signature: &str) -> Option<SignatureInfo> {
        if let Some(m) = self.methods.iter().find(|m| m.signature == signature) {
            return Some(m.signature_info());
        }
        self.signatures.get(signature).cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================
