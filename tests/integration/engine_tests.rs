//! End-to-end engine scenarios over the built-in type systems.

use qualcheck::engine::Engine;
use qualcheck::expr::{
    CompilationUnit, ExprKind, ExprNode, LiteralKind, Location, MethodDef, ParamDecl,
    SignatureInfo,
};
use qualcheck::ViolationKind;

fn loc(line: usize) -> Location {
    Location::new("App.java", line, 1)
}

fn engine() -> Engine {
    Engine::with_builtin_systems().expect("built-in systems must validate")
}

// =============================================================================
// Scenario A: Confidentiality of Call Arguments
// =============================================================================

/// A method requiring a NonConfidential parameter, the analogue of a
/// user-facing sink declared in source.
fn show_signature() -> (String, SignatureInfo) {
    (
        "App.show(String)".to_string(),
        SignatureInfo::with_params(vec![vec!["NonConfidential".to_string()]]),
    )
}

#[test]
fn test_literal_argument_to_nonconfidential_sink_is_clean() {
    let (sig, info) = show_signature();
    let mut m = MethodDef::new("caller", "App.caller()", loc(1));
    m.body.push(ExprNode::call(
        10,
        &sig,
        vec![ExprNode::literal(0, LiteralKind::String, Some("hello"), loc(2))],
        loc(2),
    ));
    let unit = CompilationUnit::new("App.java")
        .with_method(m)
        .with_signature(sig, info);

    assert!(engine().check_unit(&unit).is_empty());
}

#[test]
fn test_unannotated_variable_argument_is_flagged() {
    let (sig, info) = show_signature();
    let mut m = MethodDef::new("caller", "App.caller(String)", loc(1));
    m.params.push(ParamDecl::new("data", &[]));
    m.body.push(ExprNode::call(
        10,
        &sig,
        vec![ExprNode::var_ref(0, "data", loc(2))],
        loc(2),
    ));
    let unit = CompilationUnit::new("App.java")
        .with_method(m)
        .with_signature(sig, info);

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.hierarchy, "confidential");
    assert_eq!(v.kind, ViolationKind::Argument);
    assert_eq!(v.required, "NonConfidential");
    assert_eq!(v.supplied, "UnknownConfidential");
}

#[test]
fn test_declared_nonconfidential_variable_is_clean() {
    let (sig, info) = show_signature();
    let mut m = MethodDef::new("caller", "App.caller(String)", loc(1));
    m.params.push(ParamDecl::new("data", &["NonConfidential"]));
    m.body.push(ExprNode::call(
        10,
        &sig,
        vec![ExprNode::var_ref(0, "data", loc(2))],
        loc(2),
    ));
    let unit = CompilationUnit::new("App.java")
        .with_method(m)
        .with_signature(sig, info);

    assert!(engine().check_unit(&unit).is_empty());
}

// =============================================================================
// Scenario B: Quote Parity of Concatenations
// =============================================================================

/// `"...'" + "...'"`: two odd literals concatenated into an even result.
fn odd_plus_odd(base_id: u32, line: usize) -> ExprNode {
    ExprNode::concat(
        base_id + 2,
        ExprNode::literal(base_id, LiteralKind::String, Some("WHERE name = '"), loc(line)),
        ExprNode::literal(base_id + 1, LiteralKind::String, Some("o''brien'"), loc(line)),
        loc(line),
    )
}

#[test]
fn test_odd_plus_odd_satisfies_even_sink() {
    let mut m = MethodDef::new("query", "App.query()", loc(1));
    m.body.push(ExprNode::call(
        20,
        "java.sql.Statement.executeQuery(String)",
        vec![odd_plus_odd(0, 2)],
        loc(2),
    ));
    let unit = CompilationUnit::new("App.java").with_method(m);

    assert!(engine().check_unit(&unit).is_empty());
}

#[test]
fn test_odd_plus_odd_violates_odd_sink() {
    let sig = "App.fragment(String)";
    let mut m = MethodDef::new("query", "App.query()", loc(1));
    m.body.push(ExprNode::call(20, sig, vec![odd_plus_odd(0, 2)], loc(2)));
    let unit = CompilationUnit::new("App.java").with_method(m).with_signature(
        sig,
        SignatureInfo::with_params(vec![vec!["SqlOddQuotes".to_string()]]),
    );

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.hierarchy, "sqlquotes");
    assert_eq!(v.required, "SqlOddQuotes");
    assert_eq!(v.supplied, "SqlEvenQuotes");
}

// =============================================================================
// Scenario C: Unknown Dominates Concatenation
// =============================================================================

#[test]
fn test_unknown_operand_poisons_concatenation() {
    // user input (unannotated variable) + odd literal -> unknown parity;
    // any sink below top must reject it.
    let mut m = MethodDef::new("query", "App.query(String)", loc(1));
    m.params.push(ParamDecl::new("userInput", &[]));
    m.body.push(ExprNode::call(
        20,
        "java.sql.Statement.executeQuery(String)",
        vec![ExprNode::concat(
            2,
            ExprNode::var_ref(0, "userInput", loc(2)),
            ExprNode::literal(1, LiteralKind::String, Some("'"), loc(2)),
            loc(2),
        )],
        loc(2),
    ));
    let unit = CompilationUnit::new("App.java").with_method(m);

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.hierarchy, "sqlquotes");
    assert_eq!(v.required, "SqlEvenQuotes");
    assert_eq!(v.supplied, "SqlQuotesUnknown");
}

// =============================================================================
// Multi-System and Multi-Unit Behavior
// =============================================================================

#[test]
fn test_both_systems_report_on_one_unit() {
    // Line 2 leaks a secret to a logger; line 3 executes unknown-parity SQL.
    let mut m = MethodDef::new("worker", "App.worker(String,String)", loc(1));
    m.params.push(ParamDecl::new("secret", &[]));
    m.params.push(ParamDecl::new("query", &[]));
    m.body.push(ExprNode::call(
        10,
        "org.slf4j.Logger.info(String)",
        vec![ExprNode::var_ref(0, "secret", loc(2))],
        loc(2),
    ));
    m.body.push(ExprNode::call(
        11,
        "java.sql.Statement.execute(String)",
        vec![ExprNode::var_ref(1, "query", loc(3))],
        loc(3),
    ));
    let unit = CompilationUnit::new("App.java").with_method(m);

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 2);
    // Source order across hierarchies.
    assert_eq!(violations[0].location.line, 2);
    assert_eq!(violations[0].hierarchy, "confidential");
    assert_eq!(violations[1].location.line, 3);
    assert_eq!(violations[1].hierarchy, "sqlquotes");
}

#[test]
fn test_independent_units_in_parallel() {
    let units: Vec<CompilationUnit> = (0..16)
        .map(|i| {
            let mut m = MethodDef::new("leak", "App.leak(String)", loc(1));
            m.params.push(ParamDecl::new("secret", &[]));
            m.body.push(ExprNode::call(
                10,
                "java.io.PrintStream.println(String)",
                vec![ExprNode::var_ref(0, "secret", loc(2))],
                loc(2),
            ));
            CompilationUnit::new(format!("Unit{i}.java")).with_method(m)
        })
        .collect();

    let reports = engine().check_units(&units);
    assert_eq!(reports.len(), 16);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.unit, format!("Unit{i}.java"));
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].hierarchy, "confidential");
    }
}

#[test]
fn test_assignment_and_return_sites() {
    // @NonConfidential String out = input; return input; -- two violations.
    let mut m = MethodDef::new("f", "App.f(String)", loc(1));
    m.params.push(ParamDecl::new("input", &[]));
    m.locals.push(ParamDecl::new("out", &["NonConfidential"]));
    m.return_qualifiers.push("NonConfidential".to_string());
    m.body.push(
        ExprNode::new(2, ExprKind::Assign, loc(2)).with_children(vec![
            ExprNode::var_ref(0, "out", loc(2)),
            ExprNode::var_ref(1, "input", loc(2)),
        ]),
    );
    m.body.push(
        ExprNode::new(4, ExprKind::Return, loc(3))
            .with_children(vec![ExprNode::var_ref(3, "input", loc(3))]),
    );
    let unit = CompilationUnit::new("App.java").with_method(m);

    let violations = engine().check_unit(&unit);
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].kind, ViolationKind::Assignment);
    assert_eq!(violations[1].kind, ViolationKind::Return);
}
