//! Tests for the evaluator.
//!
//! These run small scripts through the engine and check operators, scoping, functions and
//! the errors the evaluator raises.

extern crate realmjs;

use pretty_assertions::assert_eq;

use realmjs::runner::api::{JsEngine, ScriptError};
use realmjs::runner::config::EngineConfig;
use realmjs::runner::ds::error::EngineError;
use realmjs::runner::ds::value::JsValue;

/// Helper to run a script and return its completion value.
fn run_js(code: &str) -> JsValue {
    let mut engine = JsEngine::new().unwrap();
    match engine.evaluate_script(code) {
        Ok(v) => v,
        Err(e) => panic!("script failed: {}", e),
    }
}

/// Helper to run a script that must throw, returning the error's name and message.
fn run_js_err(code: &str) -> (String, String) {
    let mut engine = JsEngine::new().unwrap();
    match engine.evaluate_script(code) {
        Err(ScriptError::Thrown { name, message, .. }) => (name, message),
        Err(e) => panic!("expected a thrown error, got {}", e),
        Ok(v) => panic!("expected a thrown error, got {}", v),
    }
}

fn num(n: f64) -> JsValue {
    JsValue::Number(n)
}

fn str_val(s: &str) -> JsValue {
    JsValue::String(s.to_string())
}

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(run_js("1 + 2 * 3"), num(7.0));
    assert_eq!(run_js("(1 + 2) * 3"), num(9.0));
    assert_eq!(run_js("7 % 4"), num(3.0));
    assert_eq!(run_js("1 / 0"), num(f64::INFINITY));
    assert_eq!(run_js("-\"3\""), num(-3.0));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(run_js("\"a\" + 1"), str_val("a1"));
    assert_eq!(run_js("1 + 2 + \"3\""), str_val("33"));
    assert_eq!(run_js("'x' + null + undefined"), str_val("xnullundefined"));
}

#[test]
fn test_equality() {
    assert_eq!(run_js("1 == \"1\""), JsValue::Boolean(true));
    assert_eq!(run_js("1 === \"1\""), JsValue::Boolean(false));
    assert_eq!(run_js("null == undefined"), JsValue::Boolean(true));
    assert_eq!(run_js("null === undefined"), JsValue::Boolean(false));
    assert_eq!(run_js("NaN === NaN"), JsValue::Boolean(false));
    assert_eq!(run_js("var o = {}; o === o"), JsValue::Boolean(true));
    assert_eq!(run_js("({}) === ({})"), JsValue::Boolean(false));
}

#[test]
fn test_relational_strings_and_numbers() {
    assert_eq!(run_js("\"a\" < \"b\""), JsValue::Boolean(true));
    assert_eq!(run_js("\"10\" < \"9\""), JsValue::Boolean(true));
    assert_eq!(run_js("10 < 9"), JsValue::Boolean(false));
    assert_eq!(run_js("1 < NaN"), JsValue::Boolean(false));
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(run_js("var hit = 0; false && (hit = 1); hit"), num(0.0));
    assert_eq!(run_js("var hit = 0; true || (hit = 1); hit"), num(0.0));
    assert_eq!(run_js("null ?? 5"), num(5.0));
    assert_eq!(run_js("0 ?? 5"), num(0.0));
    assert_eq!(run_js("0 || \"fallback\""), str_val("fallback"));
}

#[test]
fn test_typeof() {
    assert_eq!(run_js("typeof 1"), str_val("number"));
    assert_eq!(run_js("typeof \"s\""), str_val("string"));
    assert_eq!(run_js("typeof undefined"), str_val("undefined"));
    assert_eq!(run_js("typeof null"), str_val("object"));
    assert_eq!(run_js("typeof function () {}"), str_val("function"));
    assert_eq!(run_js("typeof not_declared_anywhere"), str_val("undefined"));
    assert_eq!(run_js("typeof Symbol()"), str_val("symbol"));
}

#[test]
fn test_compound_and_logical_assignment() {
    assert_eq!(run_js("var a = 5; a += 3; a -= 1; a *= 2; a"), num(14.0));
    assert_eq!(run_js("var b = null; b ??= 4; b"), num(4.0));
    assert_eq!(run_js("var c = 1; c &&= 9; c"), num(9.0));
    assert_eq!(run_js("var d = 0; d ||= 2; d"), num(2.0));
}

#[test]
fn test_update_expressions() {
    assert_eq!(run_js("var i = 1; var j = i++; j * 10 + i"), num(12.0));
    assert_eq!(run_js("var i = 1; var j = ++i; j * 10 + i"), num(22.0));
    assert_eq!(run_js("var o = { n: 5 }; o.n--; o.n"), num(4.0));
}

#[test]
fn test_objects_and_members() {
    assert_eq!(run_js("var o = { a: 1, b: { c: 2 } }; o.a + o.b.c"), num(3.0));
    assert_eq!(run_js("var o = {}; o[\"k\"] = 3; o.k"), num(3.0));
    assert_eq!(run_js("var x = 4; var o = { x }; o.x"), num(4.0));
    assert_eq!(run_js("var o = { a: 1 }; delete o.a; o.a"), JsValue::Undefined);
    assert_eq!(run_js("var o = { a: 1 }; \"a\" in o"), JsValue::Boolean(true));
    assert_eq!(run_js("var o = { a: 1 }; o.hasOwnProperty(\"a\")"), JsValue::Boolean(true));
}

#[test]
fn test_methods_get_this() {
    assert_eq!(
        run_js("var o = { v: 6, get() { return this.v; } }; o.get()"),
        num(6.0)
    );
}

#[test]
fn test_closures_capture_environment() {
    let result = run_js(
        r#"
        function counter() {
            var n = 0;
            return function () { n = n + 1; return n; };
        }
        var c = counter();
        c(); c();
        c()
        "#,
    );
    assert_eq!(result, num(3.0));
}

#[test]
fn test_arrow_functions_use_lexical_this() {
    let result = run_js(
        r#"
        var o = {
            v: 10,
            run() { var f = () => this.v; return f(); }
        };
        o.run()
        "#,
    );
    assert_eq!(result, num(10.0));
    assert_eq!(run_js("var sq = x => x * x; sq(7)"), num(49.0));
}

#[test]
fn test_function_name_inference() {
    assert_eq!(run_js("var f = function () {}; f.name"), str_val("f"));
    assert_eq!(run_js("let g = () => 1; g.name"), str_val("g"));
    assert_eq!(run_js("function h(a, b) {} h.length"), num(2.0));
}

#[test]
fn test_constructors_and_instanceof() {
    let result = run_js(
        r#"
        function Point(x, y) { this.x = x; this.y = y; }
        var p = new Point(1, 2);
        (p instanceof Point) && p.x + p.y === 3
        "#,
    );
    assert_eq!(result, JsValue::Boolean(true));
}

#[test]
fn test_hoisting() {
    assert_eq!(run_js("var r = f(); function f() { return 1; } r"), num(1.0));
    assert_eq!(run_js("var r = typeof v; var v = 1; r"), str_val("undefined"));
}

#[test]
fn test_block_scoping() {
    assert_eq!(run_js("let x = 1; { let x = 2; } x"), num(1.0));
    assert_eq!(run_js("var x = 1; { var x = 2; } x"), num(2.0));
}

#[test]
fn test_tdz() {
    let (name, message) = run_js_err("{ x; let x = 1; }");
    assert_eq!(name, "ReferenceError");
    assert_eq!(message, "Cannot access 'x' before initialization");
}

#[test]
fn test_const_assignment_is_type_error() {
    let (name, _) = run_js_err("const c = 1; c = 2;");
    assert_eq!(name, "TypeError");
}

#[test]
fn test_unresolvable_reference() {
    let (name, message) = run_js_err("missing_name + 1");
    assert_eq!(name, "ReferenceError");
    assert_eq!(message, "missing_name is not defined");
}

#[test]
fn test_sloppy_write_creates_global_and_strict_write_throws() {
    assert_eq!(run_js("implicit = 3; globalThis.implicit"), num(3.0));
    let (name, _) = run_js_err("\"use strict\"; implicit_strict = 3;");
    assert_eq!(name, "ReferenceError");
}

#[test]
fn test_calling_non_function() {
    let (name, message) = run_js_err("var o = {}; o.nope()");
    assert_eq!(name, "TypeError");
    assert_eq!(message, "o.nope is not a function");
}

#[test]
fn test_property_of_null() {
    let (name, _) = run_js_err("var n = null; n.x");
    assert_eq!(name, "TypeError");
}

#[test]
fn test_per_iteration_let_bindings() {
    let result = run_js(
        r#"
        var fs = {};
        for (let i = 0; i < 3; i++) { fs[i] = () => i; }
        fs[0]() + fs[1]() * 10 + fs[2]() * 100
        "#,
    );
    assert_eq!(result, num(210.0));

    let result = run_js(
        r#"
        var gs = {};
        for (var k = 0; k < 3; k++) { gs[k] = () => k; }
        gs[0]()
        "#,
    );
    assert_eq!(result, num(3.0));
}

#[test]
fn test_switch() {
    let code = r#"
        function pick(v) {
            var out = "";
            switch (v) {
                case 1: out = out + "one";
                case 2: out = out + "two"; break;
                default: out = out + "other";
            }
            return out;
        }
        pick(1) + "," + pick(2) + "," + pick(3)
    "#;
    assert_eq!(run_js(code), str_val("onetwo,two,other"));
}

#[test]
fn test_try_catch_binding_and_rethrow() {
    assert_eq!(
        run_js("var r; try { throw 5; } catch (e) { r = e * 2; } r"),
        num(10.0)
    );
    assert_eq!(run_js("try { throw 1; } catch { 7; }"), num(7.0));
    let result = run_js(
        r#"
        var caught;
        try { null.x; } catch (e) { caught = e instanceof TypeError && e.name === "TypeError"; }
        caught
        "#,
    );
    assert_eq!(result, JsValue::Boolean(true));
}

#[test]
fn test_with_statement() {
    assert_eq!(run_js("var o = { a: 3 }; with (o) { a * 2 }"), num(6.0));
    assert_eq!(
        run_js("var o = { a: 3, f() { return this.a; } }; with (o) { f() }"),
        num(3.0)
    );
    let (name, _) = run_js_err("with (null) {}");
    assert_eq!(name, "TypeError");
}

#[test]
fn test_error_objects() {
    assert_eq!(
        run_js("var e = new RangeError(\"bad\"); e.name + \": \" + e.message"),
        str_val("RangeError: bad")
    );
    assert_eq!(
        run_js("new TypeError(\"oops\").toString()"),
        str_val("TypeError: oops")
    );
    assert_eq!(
        run_js("TypeError(\"no new\") instanceof TypeError"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        run_js("new SyntaxError(\"s\") instanceof Error"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_object_to_string_tags() {
    assert_eq!(run_js("({}).toString()"), str_val("[object Object]"));
    assert_eq!(
        run_js("({}).toString.call(new Error(\"x\"))"),
        str_val("[object Error]")
    );
    assert_eq!(
        run_js("({}).toString.call(function () {})"),
        str_val("[object Function]")
    );
    assert_eq!(run_js("({}).toString.call(undefined)"), str_val("[object Undefined]"));
}

#[test]
fn test_global_lexical_redeclaration_across_scripts() {
    let mut engine = JsEngine::new().unwrap();
    engine.evaluate_script("let shared = 1;").unwrap();
    match engine.evaluate_script("let shared = 2;") {
        Err(ScriptError::Thrown { name, .. }) => assert_eq!(name, "SyntaxError"),
        other => panic!("expected SyntaxError, got {:?}", other.map(|v| v.to_string())),
    }
    assert_eq!(engine.evaluate_script("shared").unwrap(), num(1.0));
}

#[test]
fn test_syntax_error_at_host() {
    let mut engine = JsEngine::new().unwrap();
    match engine.evaluate_script("1 +;") {
        Err(ScriptError::Syntax(_)) => {}
        other => panic!("expected a syntax error, got {:?}", other.map(|v| v.to_string())),
    }
}

#[test]
fn test_call_depth_is_a_range_error() {
    let config = EngineConfig {
        max_call_depth: 20,
        ..EngineConfig::default()
    };
    let mut engine = JsEngine::with_config(config).unwrap();
    match engine.evaluate_script("function f() { return f(); } f()") {
        Err(ScriptError::Thrown { name, .. }) => assert_eq!(name, "RangeError"),
        other => panic!("expected RangeError, got {:?}", other.map(|v| v.to_string())),
    }
}

#[test]
fn test_default_call_depth_fits_a_small_thread() {
    let result = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let mut engine = JsEngine::new().unwrap();
            let name = engine
                .evaluate_script(
                    "function rec() { return rec(); } try { rec() } catch (e) { e.name }",
                )
                .unwrap();
            let nested = engine
                .evaluate_script(
                    "function deep(n) { return 1 + deep(n + 1); } \
                     try { deep(0) } catch (e) { e.name }",
                )
                .unwrap();
            (name.to_string(), nested.to_string())
        })
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(result, ("RangeError".to_string(), "RangeError".to_string()));
}

#[test]
fn test_top_level_let_shadows_global_object_property() {
    let mut engine = JsEngine::new().unwrap();
    engine.evaluate_script("globalThis.x = 1;").unwrap();
    match engine.evaluate_script("x; let x = 2;") {
        Err(ScriptError::Thrown { name, .. }) => assert_eq!(name, "ReferenceError"),
        other => panic!("expected ReferenceError, got {:?}", other.map(|v| v.to_string())),
    }

    let mut engine = JsEngine::new().unwrap();
    engine.evaluate_script("globalThis.x = 1;").unwrap();
    assert_eq!(engine.evaluate_script("let x = 2; x").unwrap(), num(2.0));
    assert_eq!(engine.evaluate_script("globalThis.x").unwrap(), num(1.0));
    assert_eq!(engine.get_global("x"), Some(num(1.0)));

    assert_eq!(
        run_js("let console = 5; typeof globalThis.console + ' ' + console"),
        str_val("object 5")
    );
}

#[test]
fn test_step_budget_aborts() {
    let config = EngineConfig {
        max_steps: Some(100),
        ..EngineConfig::default()
    };
    let mut engine = JsEngine::with_config(config).unwrap();
    match engine.evaluate_script("while (true) {}") {
        Err(ScriptError::Engine(EngineError::StepBudgetExhausted(100))) => {}
        other => panic!("expected budget exhaustion, got {:?}", other.map(|v| v.to_string())),
    }
    // The budget is per host call.
    assert_eq!(engine.evaluate_script("1 + 1").unwrap(), num(2.0));
}

#[test]
fn test_host_call_function() {
    let mut engine = JsEngine::new().unwrap();
    engine
        .evaluate_script("function add(a, b) { return a + b; }")
        .unwrap();
    let add = engine.get_global("add").unwrap();
    let result = engine
        .call_function(&add, JsValue::Undefined, vec![num(2.0), num(3.0)])
        .unwrap();
    assert_eq!(result, num(5.0));
    assert_eq!(engine.get_global("nothing_here"), None);
}
