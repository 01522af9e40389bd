//! The confidentiality type system.
//!
//! A two-point lattice `NonConfidential <= UnknownConfidential`. Values a
//! developer has not vouched for default to `UnknownConfidential` and may
//! not flow into user-facing sinks; literals authored in source default to
//! `NonConfidential` because the developer wrote them.
//!
//! The bundled stub table retrofits `NonConfidential` parameter
//! requirements onto common logging and UI signatures (Log4j, SLF4J,
//! `java.util.logging`, Apache Commons Logging, Android `Log`/`Toast`/
//! `TextView`/`AlertDialog`, `PrintStream`, servlet responses and cookies),
//! so confidential values reaching any of them are reported without
//! annotating those libraries.

use crate::combine::CombinatorRegistry;
use crate::hierarchy::defaults::DefaultRules;
use crate::hierarchy::{Hierarchy, HierarchyError};
use crate::stubs::{StubSignature, StubTable};

use super::TypeSystem;

/// Top and default: nothing is known about the value's confidentiality.
pub const UNKNOWN_CONFIDENTIAL: &str = "UnknownConfidential";

/// Bottom: safe to expose to end users.
pub const NON_CONFIDENTIAL: &str = "NonConfidential";

/// Build the confidentiality hierarchy.
///
/// # Errors
///
/// Never fails in practice; the lattice is statically known-good.
pub fn hierarchy() -> Result<Hierarchy, HierarchyError> {
    Hierarchy::builder("confidential")
        .qualifier(UNKNOWN_CONFIDENTIAL)
        .qualifier(NON_CONFIDENTIAL)
        .edge(NON_CONFIDENTIAL, UNKNOWN_CONFIDENTIAL)
        .top(UNKNOWN_CONFIDENTIAL)
        .bottom(NON_CONFIDENTIAL)
        .default_qualifier(UNKNOWN_CONFIDENTIAL)
        .warning_prefix("confidential")
        .build()
}

/// The fully configured confidentiality system with its bundled sink stubs.
///
/// # Errors
///
/// Propagates hierarchy validation failure (a bug in this crate).
pub fn system() -> Result<TypeSystem, HierarchyError> {
    let hierarchy = hierarchy()?;
    let non = hierarchy
        .id(NON_CONFIDENTIAL)
        .ok_or_else(|| HierarchyError::UnknownQualifier(NON_CONFIDENTIAL.to_string()))?;

    let mut defaults = DefaultRules::new(hierarchy.default_qualifier());
    defaults.set_all_literals(non);

    // Lattice-join combination is all this system needs: any mix involving
    // an UnknownConfidential operand stays UnknownConfidential.
    let combinators = CombinatorRegistry::new();

    Ok(TypeSystem::new(
        hierarchy,
        defaults,
        combinators,
        builtin_stubs(),
    ))
}

/// Stub overrides for user-facing sinks.
pub fn builtin_stubs() -> StubTable {
    let require = |arity: usize| StubSignature::params_require(NON_CONFIDENTIAL, arity);
    let mut table = StubTable::new();

    // Log4j 2.x
    for method in ["info", "warn", "error", "debug", "trace", "fatal"] {
        table.insert(
            format!("org.apache.logging.log4j.Logger.{method}(String)"),
            require(1),
        );
    }
    // SLF4J
    for method in ["info", "warn", "error", "debug", "trace"] {
        table.insert(format!("org.slf4j.Logger.{method}(String)"), require(1));
    }
    // java.util.logging
    for method in ["info", "warning", "severe", "fine", "config"] {
        table.insert(format!("java.util.logging.Logger.{method}(String)"), require(1));
    }
    table.insert(
        "java.util.logging.Handler.publish(LogRecord)".to_string(),
        require(1),
    );
    // Apache Commons Logging
    for method in ["info", "warn", "error", "debug"] {
        table.insert(
            format!("org.apache.commons.logging.Log.{method}(Object)"),
            require(1),
        );
    }
    // Android logging and UI
    for method in ["d", "e", "i", "v", "w", "wtf"] {
        table.insert(format!("android.util.Log.{method}(String,String)"), require(2));
    }
    table.insert(
        "android.widget.Toast.makeText(Context,CharSequence,int)".to_string(),
        StubSignature {
            params: vec![None, Some(NON_CONFIDENTIAL.to_string()), None],
            ret: None,
        },
    );
    table.insert(
        "android.widget.TextView.setText(CharSequence)".to_string(),
        require(1),
    );
    table.insert(
        "android.app.AlertDialog.Builder.setMessage(CharSequence)".to_string(),
        require(1),
    );
    // Console output
    for method in ["println", "print"] {
        table.insert(format!("java.io.PrintStream.{method}(String)"), require(1));
    }
    table.insert(
        "java.util.Formatter.format(String,Object[])".to_string(),
        StubSignature {
            params: vec![Some(NON_CONFIDENTIAL.to_string()), None],
            ret: None,
        },
    );
    // Servlet responses and cookies are user-visible surfaces.
    for method in ["addHeader", "setHeader"] {
        table.insert(
            format!("javax.servlet.http.HttpServletResponse.{method}(String,String)"),
            require(2),
        );
    }
    table.insert(
        "javax.servlet.http.Cookie.Cookie(String,String)".to_string(),
        require(2),
    );

    table
}
