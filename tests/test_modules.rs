//! Tests for module loading through `ShadowRealm.prototype.importValue` and `load_module`.

extern crate realmjs;

use std::collections::BTreeMap;
use std::fs;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use realmjs::runner::api::{JsEngine, ScriptError};
use realmjs::runner::config::EngineConfig;
use realmjs::runner::ds::realm::initialize_host_defined_realm;
use realmjs::runner::ds::value::JsValue;
use realmjs::runner::eval::context::EvalContext;
use realmjs::runner::module::loader::{DirectoryModuleLoader, InMemoryModuleLoader};
use realmjs::runner::module::record::ModuleStatus;
use realmjs::runner::module::{load_module, ModuleError};

fn engine_with(loader: InMemoryModuleLoader) -> JsEngine {
    let mut engine = JsEngine::new().unwrap();
    engine.set_module_loader(Rc::new(loader));
    engine
}

fn run_in(engine: &mut JsEngine, code: &str) -> JsValue {
    match engine.evaluate_script(code) {
        Ok(v) => v,
        Err(e) => panic!("script failed: {}", e),
    }
}

fn thrown(engine: &mut JsEngine, code: &str) -> (String, String) {
    match engine.evaluate_script(code) {
        Err(ScriptError::Thrown { name, message, .. }) => (name, message),
        Err(e) => panic!("expected a thrown error, got {}", e),
        Ok(v) => panic!("expected a thrown error, got {}", v),
    }
}

#[test]
fn exports_are_read_live() {
    let mut engine = engine_with(InMemoryModuleLoader::new().with_module(
        "counter",
        "export let count = 0; export function inc() { count = count + 1; return count; }",
    ));
    let result = run_in(
        &mut engine,
        r#"
        var r = new ShadowRealm();
        var inc = r.importValue("counter", "inc");
        inc();
        inc();
        r.importValue("counter", "count")
        "#,
    );
    assert_eq!(result, JsValue::Number(2.0));
}

#[test]
fn default_export_of_an_expression() {
    let mut engine = engine_with(
        InMemoryModuleLoader::new().with_module("answer", "export default 6 * 7;"),
    );
    assert_eq!(
        run_in(&mut engine, "new ShadowRealm().importValue('answer', 'default')"),
        JsValue::Number(42.0)
    );
}

#[test]
fn module_scope_is_private_to_the_module() {
    let mut engine = engine_with(InMemoryModuleLoader::new().with_module(
        "m",
        "var hidden = 1; export var shown = hidden + 1;",
    ));
    let result = run_in(
        &mut engine,
        r#"
        var r = new ShadowRealm();
        r.importValue("m", "shown") + "," + r.evaluate("typeof hidden")
        "#,
    );
    assert_eq!(result, JsValue::String("2,undefined".to_string()));
}

#[test]
fn module_code_is_strict() {
    let mut engine = engine_with(
        InMemoryModuleLoader::new().with_module("m", "undeclared = 1; export var x = 1;"),
    );
    let (name, message) = thrown(&mut engine, "new ShadowRealm().importValue('m', 'x')");
    assert_eq!(name, "TypeError");
    assert!(message.contains("ReferenceError"), "message was {}", message);
}

#[test]
fn module_this_is_the_global_object() {
    let mut engine = engine_with(InMemoryModuleLoader::new().with_module(
        "m",
        "export var same = this === globalThis;",
    ));
    assert_eq!(
        run_in(&mut engine, "new ShadowRealm().importValue('m', 'same')"),
        JsValue::Boolean(true)
    );
}

#[test]
fn errored_module_reports_the_same_error_again() {
    let mut engine = engine_with(InMemoryModuleLoader::new().with_module(
        "bad",
        "globalThis.attempts = (globalThis.attempts || 0) + 1; \
         throw new Error('broken'); export var x = 1;",
    ));
    let result = run_in(
        &mut engine,
        r#"
        var r = new ShadowRealm();
        var first, second;
        try { r.importValue("bad", "x"); } catch (e) { first = e.message; }
        try { r.importValue("bad", "x"); } catch (e) { second = e.message; }
        (first === second) + ":" + r.evaluate("attempts")
        "#,
    );
    assert_eq!(result, JsValue::String("true:1".to_string()));
}

#[test]
fn module_syntax_error_is_a_type_error() {
    let mut engine = engine_with(InMemoryModuleLoader::new().with_module("m", "export var = ;"));
    let (name, message) = thrown(&mut engine, "new ShadowRealm().importValue('m', 'x')");
    assert_eq!(name, "TypeError");
    assert!(message.starts_with("Cannot import 'm'"), "message was {}", message);
}

#[test]
fn missing_module() {
    let mut engine = JsEngine::new().unwrap();
    let (name, message) = thrown(&mut engine, "new ShadowRealm().importValue('nowhere', 'x')");
    assert_eq!(name, "TypeError");
    assert_eq!(message, "Cannot import 'nowhere': module 'nowhere' not found");
}

#[test]
fn modules_from_config_sources() {
    let mut sources = BTreeMap::new();
    sources.insert("util".to_string(), "export function twice(x) { return x * 2; }".to_string());
    let mut config = EngineConfig::default();
    config.modules.sources = sources;
    let mut engine = JsEngine::with_config(config).unwrap();
    assert_eq!(
        run_in(&mut engine, "new ShadowRealm().importValue('util', 'twice')(21)"),
        JsValue::Number(42.0)
    );
}

#[test]
fn modules_from_a_directory() {
    let root = std::env::temp_dir().join(format!("realmjs-modules-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::write(root.join("lib/greet.js"), "export function greet(n) { return 'hello ' + n; }")
        .unwrap();

    let mut engine = JsEngine::new().unwrap();
    engine.set_module_loader(Rc::new(DirectoryModuleLoader::new(root.clone())));
    assert_eq!(
        run_in(
            &mut engine,
            "new ShadowRealm().importValue('lib/greet.js', 'greet')('world')"
        ),
        JsValue::String("hello world".to_string())
    );
    let (name, _) = thrown(&mut engine, "new ShadowRealm().importValue('../escape.js', 'x')");
    assert_eq!(name, "TypeError");

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn load_module_caches_records_per_realm() {
    let realm = initialize_host_defined_realm().unwrap();
    let other = initialize_host_defined_realm().unwrap();
    let loader =
        InMemoryModuleLoader::new().with_module("m", "export var v = 1; export default v;");
    let mut ctx =
        EvalContext::new(&realm, Rc::new(EngineConfig::default()), Rc::new(loader)).unwrap();

    let first = load_module(&mut ctx, &realm, "m").unwrap();
    let again = load_module(&mut ctx, &realm, "m").unwrap();
    assert!(Rc::ptr_eq(&first, &again));
    assert_eq!(first.borrow().status, ModuleStatus::Evaluated);
    assert_eq!(first.borrow().export_names(), vec!["v", "default"]);
    assert_eq!(first.borrow().get_export("v").unwrap(), Some(JsValue::Number(1.0)));
    assert_eq!(first.borrow().get_export("nope").unwrap(), None);

    let elsewhere = load_module(&mut ctx, &other, "m").unwrap();
    assert!(!Rc::ptr_eq(&first, &elsewhere));
    assert!(other.borrow().module_map.contains_key("m"));
}

#[test]
fn load_module_errors() {
    let realm = initialize_host_defined_realm().unwrap();
    let loader = InMemoryModuleLoader::new()
        .with_module("throws", "throw 'nope';")
        .with_module("broken", "export export;");
    let mut ctx =
        EvalContext::new(&realm, Rc::new(EngineConfig::default()), Rc::new(loader)).unwrap();

    match load_module(&mut ctx, &realm, "throws") {
        Err(ModuleError::Evaluation(message)) => {
            assert_eq!(message, "evaluation of module 'throws' failed: nope")
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
    assert!(matches!(
        load_module(&mut ctx, &realm, "broken"),
        Err(ModuleError::Syntax { .. })
    ));
    assert!(matches!(
        load_module(&mut ctx, &realm, "absent"),
        Err(ModuleError::NotFound(_))
    ));
}
