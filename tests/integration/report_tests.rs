//! SARIF rendering of engine reports.

use qualcheck::engine::Engine;
use qualcheck::expr::{CompilationUnit, ExprNode, Location, MethodDef, ParamDecl};
use qualcheck::report::{to_sarif, to_sarif_json};

fn loc(line: usize) -> Location {
    Location::new("Svc.java", line, 1)
}

fn leaky_units() -> Vec<CompilationUnit> {
    (0..2)
        .map(|i| {
            let mut m = MethodDef::new("leak", "Svc.leak(String)", loc(1));
            m.params.push(ParamDecl::new("secret", &[]));
            m.body.push(ExprNode::call(
                10,
                "org.slf4j.Logger.info(String)",
                vec![ExprNode::var_ref(0, "secret", loc(2 + i))],
                loc(2 + i),
            ));
            CompilationUnit::new(format!("Svc{i}.java")).with_method(m)
        })
        .collect()
}

#[test]
fn test_sarif_from_engine_reports() {
    let engine = Engine::with_builtin_systems().unwrap();
    let reports = engine.check_units(&leaky_units());
    let log = to_sarif(&reports);

    assert_eq!(log.version, "2.1.0");
    let run = &log.runs[0];
    assert_eq!(run.results.len(), 2);
    assert_eq!(run.tool.driver.name, "qualcheck");
    // Both results are the same rule; the descriptor is deduplicated.
    assert_eq!(run.tool.driver.rules.len(), 1);
    assert_eq!(run.tool.driver.rules[0].id, "confidential/argument");

    let region = &run.results[0].locations[0].physical_location.region;
    assert_eq!(region.start_line, 2);
}

#[test]
fn test_sarif_json_is_parseable() {
    let engine = Engine::with_builtin_systems().unwrap();
    let reports = engine.check_units(&leaky_units());
    let json = to_sarif_json(&reports).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["version"], "2.1.0");
    assert_eq!(value["runs"][0]["results"].as_array().unwrap().len(), 2);
    assert!(value["runs"][0]["results"][0]["message"]["text"]
        .as_str()
        .unwrap()
        .contains("required NonConfidential"));
}
