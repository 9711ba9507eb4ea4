//! End to end tests of the host API: engines built from configuration, scripts sharing a
//! realm across calls, and shadow realms driven from Rust.

extern crate realmjs;

use pretty_assertions::assert_eq;

use realmjs::runner::api::{JsEngine, ScriptError};
use realmjs::runner::config::EngineConfig;
use realmjs::runner::ds::error::EngineError;
use realmjs::runner::ds::value::JsValue;

fn engine_from_toml(toml: &str) -> JsEngine {
    JsEngine::with_config(EngineConfig::parse(toml).unwrap()).unwrap()
}

fn str_val(s: &str) -> JsValue {
    JsValue::String(s.to_string())
}

#[test]
fn scripts_share_the_main_realm() {
    let mut engine = JsEngine::new().unwrap();
    engine.evaluate_script("var total = 0; let step = 5;").unwrap();
    engine.evaluate_script("total = total + step;").unwrap();
    engine.evaluate_script("total = total + step;").unwrap();
    assert_eq!(engine.get_global("total"), Some(JsValue::Number(10.0)));
    // Lexical globals are not properties of the global object.
    assert_eq!(engine.get_global("step"), None);
    assert_eq!(engine.evaluate_script("step").unwrap(), JsValue::Number(5.0));
}

#[test]
fn uncaught_errors_describe_themselves() {
    let mut engine = JsEngine::new().unwrap();
    let err = engine.evaluate_script("null.x").unwrap_err();
    assert_eq!(err.error_name(), Some("TypeError"));
    assert!(err.to_string().starts_with("Uncaught TypeError: "));

    let err = engine.evaluate_script("throw 'plain'").unwrap_err();
    assert_eq!(err.to_string(), "Uncaught plain");
    assert_eq!(err.error_name(), Some(""));

    let err = engine.evaluate_script("let = = 1").unwrap_err();
    assert!(matches!(err, ScriptError::Syntax(_)));
    assert_eq!(err.error_name(), Some("SyntaxError"));
}

#[test]
fn failed_script_leaves_engine_usable() {
    let mut engine = JsEngine::new().unwrap();
    assert!(engine.evaluate_script("var a = 1; undefined_fn();").is_err());
    assert_eq!(engine.get_global("a"), Some(JsValue::Number(1.0)));
    assert_eq!(engine.evaluate_script("a + 1").unwrap(), JsValue::Number(2.0));
}

#[test]
fn config_from_toml() {
    let engine = engine_from_toml(
        r#"
        max_call_depth = 50
        max_steps = 1000
        strict_scripts = true
        log_level = "debug"

        [modules.sources]
        "lib" = "export var v = 1;"
        "#,
    );
    let config = engine.config();
    assert_eq!(config.max_call_depth, 50);
    assert_eq!(config.max_steps, Some(1000));
    assert!(config.strict_scripts);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.modules.sources.len(), 1);
}

#[test]
fn strict_scripts_setting() {
    let mut sloppy = JsEngine::new().unwrap();
    sloppy.evaluate_script("implicit = 1;").unwrap();
    assert_eq!(sloppy.get_global("implicit"), Some(JsValue::Number(1.0)));

    let mut strict = engine_from_toml("strict_scripts = true");
    let err = strict.evaluate_script("implicit = 1;").unwrap_err();
    assert_eq!(err.error_name(), Some("ReferenceError"));
}

#[test]
fn step_budget_is_per_host_call() {
    let mut engine = engine_from_toml("max_steps = 200");
    // Each call gets a fresh budget, so many small scripts are fine.
    for _ in 0..10 {
        engine
            .evaluate_script("var i = 0; while (i < 10) { i = i + 1; }")
            .unwrap();
    }
    match engine.evaluate_script("while (true) {}") {
        Err(ScriptError::Engine(EngineError::StepBudgetExhausted(200))) => {}
        other => panic!("expected the budget to run out, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn calling_script_functions_from_the_host() {
    let mut engine = JsEngine::new().unwrap();
    engine
        .evaluate_script(
            r#"
            function Point(x, y) { this.x = x; this.y = y; }
            function describe(p) { return "(" + p.x + ", " + p.y + ")"; }
            var origin = new Point(0, 0);
            "#,
        )
        .unwrap();
    let describe = engine.get_global("describe").unwrap();
    let origin = engine.get_global("origin").unwrap();
    assert_eq!(
        engine
            .call_function(&describe, JsValue::Undefined, vec![origin])
            .unwrap(),
        str_val("(0, 0)")
    );
    let err = engine
        .call_function(&JsValue::Number(1.0), JsValue::Undefined, vec![])
        .unwrap_err();
    assert_eq!(err.error_name(), Some("TypeError"));
}

#[test]
fn shadow_realm_driven_from_the_host() {
    let mut engine = engine_from_toml(
        r#"
        [modules.sources]
        "shapes" = "export function area(w, h) { return w * h; } export let name = 'shapes';"
        "#,
    );
    let shadow = engine.create_shadow_realm().unwrap();

    shadow.evaluate(&mut engine, "var hidden = 'inside';").unwrap();
    assert_eq!(
        shadow.evaluate(&mut engine, "typeof hidden").unwrap(),
        str_val("undefined")
    );

    let area = shadow.import_value(&mut engine, "shapes", "area").unwrap();
    assert_eq!(
        engine
            .call_function(
                &area,
                JsValue::Undefined,
                vec![JsValue::Number(3.0), JsValue::Number(4.0)]
            )
            .unwrap(),
        JsValue::Number(12.0)
    );
    assert_eq!(
        shadow.import_value(&mut engine, "shapes", "name").unwrap(),
        str_val("shapes")
    );

    let err = shadow.import_value(&mut engine, "shapes", "missing").unwrap_err();
    assert_eq!(err.error_name(), Some("TypeError"));
}

#[test]
fn shadow_realm_handle_is_usable_from_scripts() {
    let mut engine = JsEngine::new().unwrap();
    let shadow = engine.create_shadow_realm().unwrap();
    engine
        .evaluate_script("function run(r, code) { return r.evaluate(code); }")
        .unwrap();
    let run = engine.get_global("run").unwrap();
    let result = engine
        .call_function(
            &run,
            JsValue::Undefined,
            vec![shadow.as_value(), str_val("'from ' + 'script'")],
        )
        .unwrap();
    assert_eq!(result, str_val("from script"));
}

#[test]
fn engines_are_independent() {
    let mut a = JsEngine::new().unwrap();
    let mut b = JsEngine::new().unwrap();
    a.evaluate_script("var shared = 'a';").unwrap();
    assert_eq!(b.evaluate_script("typeof shared").unwrap(), str_val("undefined"));
    assert!(a.realm().borrow().id != b.realm().borrow().id);
}

#[test]
fn console_is_available() {
    let mut engine = JsEngine::new().unwrap();
    assert_eq!(
        engine.evaluate_script("typeof console.log").unwrap(),
        str_val("function")
    );
    assert_eq!(
        engine.evaluate_script("console.log('hello', 1)").unwrap(),
        JsValue::Undefined
    );
}
