//! Behavior of the built-in type systems through the public engine API.

use qualcheck::engine::Engine;
use qualcheck::expr::{
    BinaryOp, CompilationUnit, ExprKind, ExprNode, LiteralKind, Location, MethodDef, ParamDecl,
};
use qualcheck::ViolationKind;

fn loc(line: usize) -> Location {
    Location::new("Dao.java", line, 1)
}

fn engine() -> Engine {
    Engine::with_builtin_systems().expect("built-in systems must validate")
}

// =============================================================================
// Confidentiality
// =============================================================================

#[test]
fn test_every_builtin_logger_sink_rejects_secrets() {
    for (i, sig) in [
        "org.apache.logging.log4j.Logger.error(String)",
        "org.slf4j.Logger.debug(String)",
        "java.util.logging.Logger.severe(String)",
        "java.io.PrintStream.print(String)",
        "android.widget.TextView.setText(CharSequence)",
    ]
    .iter()
    .enumerate()
    {
        let mut m = MethodDef::new("leak", "Dao.leak(String)", loc(1));
        m.params.push(ParamDecl::new("secret", &[]));
        m.body.push(ExprNode::call(
            10,
            *sig,
            vec![ExprNode::var_ref(0, "secret", loc(2))],
            loc(2),
        ));
        let unit = CompilationUnit::new(format!("Dao{i}.java")).with_method(m);

        let violations = engine().check_unit(&unit);
        assert_eq!(violations.len(), 1, "sink {sig} should flag the secret");
        assert_eq!(violations[0].hierarchy, "confidential");
    }
}

#[test]
fn test_concatenation_with_literal_stays_tainted() {
    // "user=" + secret is still UnknownConfidential: join, not laundering.
    let mut m = MethodDef::new("leak", "Dao.leak(String)", loc(1));
    m.params.push(ParamDecl::new("secret", &[]));
    m.body.push(ExprNode::call(
        10,
        "org.slf4j.Logger.info(String)",
        vec![ExprNode::concat(
            2,
            ExprNode::literal(0, LiteralKind::String, Some("user="), loc(2)),
            ExprNode::var_ref(1, "secret", loc(2)),
            loc(2),
        )],
        loc(2),
    ));
    let unit = CompilationUnit::new("Dao.java").with_method(m);

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].supplied, "UnknownConfidential");
}

#[test]
fn test_ternary_of_literals_is_trusted() {
    let mut m = MethodDef::new("ok", "Dao.ok(boolean)", loc(1));
    m.params.push(ParamDecl::new("flag", &[]));
    m.body.push(ExprNode::call(
        10,
        "org.slf4j.Logger.info(String)",
        vec![ExprNode::new(4, ExprKind::Ternary, loc(2)).with_children(vec![
            ExprNode::var_ref(1, "flag", loc(2)),
            ExprNode::literal(2, LiteralKind::String, Some("on"), loc(2)),
            ExprNode::literal(3, LiteralKind::String, Some("off"), loc(2)),
        ])],
        loc(2),
    ));
    let unit = CompilationUnit::new("Dao.java").with_method(m);

    assert!(engine().check_unit(&unit).is_empty());
}

// =============================================================================
// SQL Quote Parity
// =============================================================================

#[test]
fn test_compound_concat_tracks_parity() {
    // @SqlOddQuotes String q; q += "x" keeps parity; assigning it back is
    // clean. q += "'" flips parity to even and is flagged.
    let build = |appended: &str| {
        let mut m = MethodDef::new("build", "Dao.build()", loc(1));
        m.locals.push(ParamDecl::new("q", &["SqlOddQuotes"]));
        m.body.push(
            ExprNode::new(2, ExprKind::CompoundAssign { op: BinaryOp::Add }, loc(2))
                .with_children(vec![
                    ExprNode::var_ref(0, "q", loc(2)),
                    ExprNode::literal(1, LiteralKind::String, Some(appended), loc(2)),
                ]),
        );
        CompilationUnit::new("Dao.java").with_method(m)
    };

    assert!(engine().check_unit(&build("x")).is_empty());

    let violations = engine().check_unit(&build("'"));
    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.kind, ViolationKind::CompoundAssignment);
    assert_eq!(v.required, "SqlOddQuotes");
    assert_eq!(v.supplied, "SqlEvenQuotes");
}

#[test]
fn test_enum_constructor_is_balanced() {
    let mut m = MethodDef::new("query", "Dao.query()", loc(1));
    m.body.push(ExprNode::call(
        10,
        "java.sql.Statement.executeQuery(String)",
        vec![ExprNode::new(
            0,
            ExprKind::EnumCtor {
                enum_name: "Table".to_string(),
            },
            loc(2),
        )],
        loc(2),
    ));
    let unit = CompilationUnit::new("Dao.java").with_method(m);

    assert!(engine().check_unit(&unit).is_empty());
}

#[test]
fn test_explicit_qualifier_overrides_literal_parity() {
    // The provider pre-resolved this literal as odd; the engine must not
    // second-guess an explicit qualifier even though the text is balanced.
    let mut m = MethodDef::new("query", "Dao.query()", loc(1));
    m.body.push(ExprNode::call(
        10,
        "java.sql.Statement.executeQuery(String)",
        vec![
            ExprNode::literal(0, LiteralKind::String, Some("balanced"), loc(2))
                .with_explicit("SqlOddQuotes"),
        ],
        loc(2),
    ));
    let unit = CompilationUnit::new("Dao.java").with_method(m);

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].supplied, "SqlOddQuotes");
}

// =============================================================================
// Suppression
// =============================================================================

#[test]
fn test_suppression_is_per_hierarchy() {
    // One method both leaks a secret and executes unknown SQL; suppressing
    // sqlquotes must leave the confidentiality finding intact.
    let mut m = MethodDef::new("worker", "Dao.worker(String)", loc(1));
    m.params.push(ParamDecl::new("input", &[]));
    m.suppressions.push("sqlquotes".to_string());
    m.body.push(ExprNode::call(
        10,
        "org.slf4j.Logger.info(String)",
        vec![ExprNode::var_ref(0, "input", loc(2))],
        loc(2),
    ));
    m.body.push(ExprNode::call(
        11,
        "java.sql.Statement.execute(String)",
        vec![ExprNode::var_ref(1, "input", loc(3))],
        loc(3),
    ));
    let unit = CompilationUnit::new("Dao.java").with_method(m);

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].hierarchy, "confidential");
}
