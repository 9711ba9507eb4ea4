//! Tests for ShadowRealm: isolation between realms and the marshaling of values across
//! the boundary.

extern crate realmjs;

use std::rc::Rc;

use pretty_assertions::assert_eq;

use realmjs::runner::api::{JsEngine, ScriptError};
use realmjs::runner::ds::value::JsValue;
use realmjs::runner::module::loader::InMemoryModuleLoader;

/// Helper to run a script in a fresh engine and return its completion value.
fn run_js(code: &str) -> JsValue {
    let mut engine = JsEngine::new().unwrap();
    match engine.evaluate_script(code) {
        Ok(v) => v,
        Err(e) => panic!("script failed: {}", e),
    }
}

/// Helper returning the name and message of the error a script throws.
fn thrown(engine: &mut JsEngine, code: &str) -> (String, String) {
    match engine.evaluate_script(code) {
        Err(ScriptError::Thrown { name, message, .. }) => (name, message),
        Err(e) => panic!("expected a thrown error, got {}", e),
        Ok(v) => panic!("expected a thrown error, got {}", v),
    }
}

fn engine_with_modules(modules: &[(&str, &str)]) -> JsEngine {
    let mut loader = InMemoryModuleLoader::new();
    for (specifier, source) in modules {
        loader.insert(*specifier, *source);
    }
    let mut engine = JsEngine::new().unwrap();
    engine.set_module_loader(Rc::new(loader));
    engine
}

fn num(n: f64) -> JsValue {
    JsValue::Number(n)
}

fn str_val(s: &str) -> JsValue {
    JsValue::String(s.to_string())
}

#[test]
fn evaluate_returns_primitives() {
    assert_eq!(run_js("new ShadowRealm().evaluate(\"1 + 2\")"), num(3.0));
    assert_eq!(
        run_js("new ShadowRealm().evaluate(\"'a' + 'b'\")"),
        str_val("ab")
    );
    assert_eq!(
        run_js("new ShadowRealm().evaluate(\"null\")"),
        JsValue::Null
    );
    assert_eq!(
        run_js("new ShadowRealm().evaluate(\"var unused = 1;\")"),
        JsValue::Undefined
    );
}

#[test]
fn evaluate_from_host_handle() {
    let mut engine = JsEngine::new().unwrap();
    let shadow = engine.create_shadow_realm().unwrap();
    assert_eq!(shadow.evaluate(&mut engine, "1 + 2").unwrap(), num(3.0));
}

#[test]
fn evaluate_rejects_non_string_source() {
    let mut engine = JsEngine::new().unwrap();
    let shadow = engine.create_shadow_realm().unwrap();
    match shadow.evaluate(&mut engine, 42.0) {
        Err(ScriptError::Thrown { name, .. }) => assert_eq!(name, "TypeError"),
        other => panic!("expected TypeError, got {:?}", other.map(|v| v.to_string())),
    }
    assert_eq!(
        run_js("try { new ShadowRealm().evaluate(42); } catch (e) { e instanceof TypeError }"),
        JsValue::Boolean(true)
    );
}

#[test]
fn realms_do_not_see_each_others_globals() {
    let result = run_js(
        r#"
        var b1 = new ShadowRealm();
        var b2 = new ShadowRealm();
        b1.evaluate("globalThis.x = 1");
        b2.evaluate("typeof x")
        "#,
    );
    assert_eq!(result, str_val("undefined"));

    let mut engine = JsEngine::new().unwrap();
    let shadow = engine.create_shadow_realm().unwrap();
    shadow.evaluate(&mut engine, "globalThis.leak = 1").unwrap();
    assert_eq!(engine.get_global("leak"), None);
    assert_eq!(shadow.evaluate(&mut engine, "leak").unwrap(), num(1.0));
}

#[test]
fn caller_globals_are_invisible_inside() {
    let result = run_js(
        r#"
        var secret = 1;
        new ShadowRealm().evaluate("typeof secret")
        "#,
    );
    assert_eq!(result, str_val("undefined"));
}

#[test]
fn wrapped_function_runs_in_its_own_realm() {
    let result = run_js(
        r#"
        var y = "caller";
        var r = new ShadowRealm();
        var f = r.evaluate("globalThis.y = 5; () => y");
        f()
        "#,
    );
    assert_eq!(result, num(5.0));
}

#[test]
fn eval_declarations_do_not_persist() {
    let result = run_js(
        r#"
        var r = new ShadowRealm();
        r.evaluate("var v = 1; let l = 2;");
        r.evaluate("typeof v + ',' + typeof l")
        "#,
    );
    assert_eq!(result, str_val("undefined,undefined"));
}

#[test]
fn intrinsics_differ_between_realms() {
    let result = run_js(
        r#"
        var r = new ShadowRealm();
        var check = r.evaluate("(e) => typeof e");
        var inner_error_ctor_is_ours = r.evaluate("() => TypeError === globalThis.TypeError")();
        check(TypeError) + "," + inner_error_ctor_is_ours
        "#,
    );
    assert_eq!(result, str_val("function,true"));
}

#[test]
fn objects_cannot_cross() {
    let mut engine = JsEngine::new().unwrap();
    let (name, _) = thrown(&mut engine, "new ShadowRealm().evaluate(\"({})\")");
    assert_eq!(name, "TypeError");
    let (name, _) = thrown(
        &mut engine,
        "var f = new ShadowRealm().evaluate(\"(x) => 1\"); f({})",
    );
    assert_eq!(name, "TypeError");
}

#[test]
fn wrapped_function_properties() {
    let result = run_js(
        r#"
        var r = new ShadowRealm();
        var f = r.evaluate("function foo(a, b) { return a + b; } foo");
        typeof f + " " + f.name + " " + f.length + " " + f(2, 3)
        "#,
    );
    assert_eq!(result, str_val("function foo 2 5"));
}

#[test]
fn callables_cross_in_both_directions() {
    let result = run_js(
        r#"
        var r = new ShadowRealm();
        var apply = r.evaluate("(g) => g(2) + 1");
        apply((x) => x * 10)
        "#,
    );
    assert_eq!(result, num(21.0));
}

#[test]
fn wrapped_call_has_undefined_this() {
    let result = run_js(
        r#"
        var r = new ShadowRealm();
        var f = r.evaluate("(function () { return typeof this; })");
        var o = { m: f };
        o.m()
        "#,
    );
    assert_eq!(result, str_val("undefined"));
}

#[test]
fn errors_inside_become_type_errors_of_the_caller() {
    let mut engine = JsEngine::new().unwrap();
    let (name, message) = thrown(
        &mut engine,
        "new ShadowRealm().evaluate(\"throw new RangeError('deep')\")",
    );
    assert_eq!(name, "TypeError");
    assert!(message.contains("RangeError: deep"), "message was {}", message);

    let result = engine
        .evaluate_script(
            r#"
            var caught;
            try {
                new ShadowRealm().evaluate("throw new Error('x')");
            } catch (e) {
                caught = e instanceof TypeError;
            }
            caught
            "#,
        )
        .unwrap();
    assert_eq!(result, JsValue::Boolean(true));
}

#[test]
fn syntax_errors_are_syntax_errors_of_the_caller() {
    let result = run_js(
        r#"
        var r = new ShadowRealm();
        var ok;
        try { r.evaluate("1 +;"); } catch (e) { ok = e instanceof SyntaxError; }
        ok
        "#,
    );
    assert_eq!(result, JsValue::Boolean(true));
}

#[test]
fn throws_from_wrapped_functions() {
    let result = run_js(
        r#"
        var r = new ShadowRealm();
        var f = r.evaluate("() => { throw 'boom'; }");
        var got;
        try { f(); } catch (e) { got = e; }
        got
        "#,
    );
    assert_eq!(result, str_val("boom"));

    let result = run_js(
        r#"
        var r = new ShadowRealm();
        var f = r.evaluate("() => { throw new Error('inner'); }");
        var got;
        try { f(); } catch (e) { got = (e instanceof TypeError) + ':' + e.message; }
        got
        "#,
    );
    assert_eq!(result, str_val("true:Error: inner"));
}

#[test]
fn constructor_and_brand_checks() {
    let mut engine = JsEngine::new().unwrap();
    let (name, _) = thrown(&mut engine, "ShadowRealm()");
    assert_eq!(name, "TypeError");
    let (name, message) = thrown(
        &mut engine,
        "new ShadowRealm().evaluate.call({}, \"1\")",
    );
    assert_eq!(name, "TypeError");
    assert_eq!(message, "object must be a ShadowRealm");
    assert_eq!(
        engine
            .evaluate_script("({}).toString.call(new ShadowRealm())")
            .unwrap(),
        str_val("[object ShadowRealm]")
    );
}

#[test]
fn nested_shadow_realms() {
    let result = run_js(
        r#"
        var outer = new ShadowRealm();
        outer.evaluate("var inner = new ShadowRealm(); inner.evaluate('6 * 7')")
        "#,
    );
    assert_eq!(result, num(42.0));
}

#[test]
fn import_value_returns_exports() {
    let mut engine = engine_with_modules(&[(
        "math",
        "export function square(x) { return x * x; } export const answer = 42;",
    )]);
    let shadow = engine.create_shadow_realm().unwrap();
    assert_eq!(
        shadow.import_value(&mut engine, "math", "answer").unwrap(),
        num(42.0)
    );
    let square = shadow.import_value(&mut engine, "math", "square").unwrap();
    assert_eq!(
        engine
            .call_function(&square, JsValue::Undefined, vec![num(9.0)])
            .unwrap(),
        num(81.0)
    );
}

#[test]
fn import_value_from_script() {
    let mut engine = engine_with_modules(&[(
        "greet",
        "export default function (n) { return 'hi ' + n; }",
    )]);
    let result = engine
        .evaluate_script("var g = new ShadowRealm().importValue('greet', 'default'); g('there')")
        .unwrap();
    assert_eq!(result, str_val("hi there"));
}

#[test]
fn import_value_argument_checks() {
    let mut engine = engine_with_modules(&[("m", "export var obj = {}; export var n = 1;")]);
    let (name, _) = thrown(&mut engine, "new ShadowRealm().importValue(1, 'n')");
    assert_eq!(name, "TypeError");
    let (name, _) = thrown(&mut engine, "new ShadowRealm().importValue('m', 1)");
    assert_eq!(name, "TypeError");
    let (name, _) = thrown(&mut engine, "new ShadowRealm().importValue('m', 'obj')");
    assert_eq!(name, "TypeError");
    let (name, message) = thrown(&mut engine, "new ShadowRealm().importValue('m', 'nope')");
    assert_eq!(name, "TypeError");
    assert_eq!(message, "'nope' is not exported by 'm'");
    let (name, _) = thrown(&mut engine, "new ShadowRealm().importValue('missing', 'x')");
    assert_eq!(name, "TypeError");
}

#[test]
fn modules_are_evaluated_once_per_realm() {
    let mut engine = engine_with_modules(&[(
        "counter",
        "globalThis.loads = (globalThis.loads || 0) + 1; \
         export function loads_seen() { return globalThis.loads; }",
    )]);
    let result = engine
        .evaluate_script(
            r#"
            var r = new ShadowRealm();
            r.importValue("counter", "loads_seen");
            var f = r.importValue("counter", "loads_seen");
            var other = new ShadowRealm().importValue("counter", "loads_seen");
            f() + other()
            "#,
        )
        .unwrap();
    assert_eq!(result, num(2.0));
    assert_eq!(engine.get_global("loads"), None);
}
