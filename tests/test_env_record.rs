//! Tests for environment records and bindings.
//!
//! These drive the records directly, without the evaluator.

extern crate realmjs;

use pretty_assertions::assert_eq;

use realmjs::runner::ds::env_record::{
    new_declarative_environment, new_global_environment, DeclarativeEnvironmentRecord,
    EnvironmentRecord, FunctionEnvironmentRecord, GlobalEnvironmentRecord,
    ObjectEnvironmentRecord,
};
use realmjs::runner::ds::error::JErrorType;
use realmjs::runner::ds::object::JsObjectType;
use realmjs::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use realmjs::runner::ds::operations::lex_env::get_identifier_reference;
use realmjs::runner::ds::operations::object::{
    define_property_or_throw, get, object_create,
};
use realmjs::runner::ds::realm::{get_intrinsic, initialize_host_defined_realm, WellKnownIntrinsics};
use realmjs::runner::ds::value::JsValue;
use realmjs::runner::ds::function_object::create_builtin_function;
use realmjs::runner::eval::context::EvalContext;
use realmjs::runner::eval::types::{Completion, EvalResult, ReferenceBase};

fn num(n: f64) -> JsValue {
    JsValue::Number(n)
}

fn is_reference_error<T>(r: Result<T, JErrorType>) -> bool {
    matches!(r, Err(JErrorType::ReferenceError(_)))
}

fn is_type_error<T>(r: Result<T, JErrorType>) -> bool {
    matches!(r, Err(JErrorType::TypeError(_)))
}

fn is_internal_error<T>(r: Result<T, JErrorType>) -> bool {
    matches!(r, Err(JErrorType::InternalError(_)))
}

fn noop(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    Ok(Completion::normal())
}

#[test]
fn read_before_initialization_is_a_reference_error() {
    let mut env = DeclarativeEnvironmentRecord::new();
    env.create_mutable_binding("x".to_string(), false).unwrap();
    assert!(env.has_binding("x"));
    assert!(is_reference_error(env.get_binding_value("x", false)));
    assert!(is_reference_error(env.set_mutable_binding("x", num(1.0), false)));

    env.initialize_binding("x", num(7.0)).unwrap();
    assert_eq!(env.get_binding_value("x", false).unwrap(), num(7.0));
}

#[test]
fn initializing_twice_is_an_internal_error() {
    let mut env = DeclarativeEnvironmentRecord::new();
    env.create_mutable_binding("x".to_string(), false).unwrap();
    env.initialize_binding("x", num(1.0)).unwrap();
    assert!(is_internal_error(env.initialize_binding("x", num(2.0))));
    assert!(is_internal_error(env.initialize_binding("missing", num(2.0))));
}

#[test]
fn duplicate_binding_creation_is_an_internal_error() {
    let mut env = DeclarativeEnvironmentRecord::new();
    env.create_immutable_binding("x".to_string(), true).unwrap();
    assert!(is_internal_error(env.create_mutable_binding("x".to_string(), false)));

    let mut env = DeclarativeEnvironmentRecord::new();
    env.create_mutable_binding("y".to_string(), false).unwrap();
    assert!(is_internal_error(env.create_immutable_binding("y".to_string(), true)));
}

#[test]
fn writing_an_immutable_binding() {
    let mut env = DeclarativeEnvironmentRecord::new();
    env.create_immutable_binding("strict_const".to_string(), true).unwrap();
    env.initialize_binding("strict_const", num(1.0)).unwrap();
    assert!(is_type_error(env.set_mutable_binding("strict_const", num(2.0), false)));

    // A sloppy immutable binding ignores writes from sloppy code.
    env.create_immutable_binding("sloppy".to_string(), false).unwrap();
    env.initialize_binding("sloppy", num(1.0)).unwrap();
    env.set_mutable_binding("sloppy", num(2.0), false).unwrap();
    assert_eq!(env.get_binding_value("sloppy", false).unwrap(), num(1.0));
    assert!(is_type_error(env.set_mutable_binding("sloppy", num(2.0), true)));
}

#[test]
fn set_of_missing_name() {
    let mut env = DeclarativeEnvironmentRecord::new();
    assert!(is_reference_error(env.set_mutable_binding("nope", num(1.0), true)));

    env.set_mutable_binding("created", num(3.0), false).unwrap();
    assert_eq!(env.get_binding_value("created", true).unwrap(), num(3.0));
    assert!(env.get_binding("created").map(|b| b.deletable).unwrap_or(false));
}

#[test]
fn delete_respects_deletability() {
    let mut env = DeclarativeEnvironmentRecord::new();
    env.create_mutable_binding("fixed".to_string(), false).unwrap();
    env.create_mutable_binding("loose".to_string(), true).unwrap();
    assert_eq!(env.delete_binding("fixed").unwrap(), false);
    assert_eq!(env.delete_binding("loose").unwrap(), true);
    assert!(!env.has_binding("loose"));
    assert_eq!(env.delete_binding("never_existed").unwrap(), true);
}

#[test]
fn object_record_reflects_properties() {
    let o = object_create(None);
    let mut env = ObjectEnvironmentRecord::new(o.clone(), true);
    assert!(!env.has_binding("a"));
    assert_eq!(env.get_binding_value("a", false).unwrap(), JsValue::Undefined);
    assert!(is_reference_error(env.get_binding_value("a", true)));

    env.create_mutable_binding("a".to_string(), true).unwrap();
    env.initialize_binding("a", num(4.0)).unwrap();
    assert_eq!(get(&o, &PropertyKey::from("a")), num(4.0));
    assert!(is_internal_error(env.create_immutable_binding("b".to_string(), true)));
    assert!(env.with_base_object().is_some());
    assert!(!env.has_this_binding());
}

#[test]
fn object_record_strict_write_to_read_only_property() {
    let o = object_create(None);
    define_property_or_throw(
        &o,
        "frozen".into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_frozen(
            num(1.0),
        )),
    )
    .unwrap();
    let mut env = ObjectEnvironmentRecord::new(o, false);
    assert!(is_type_error(env.set_mutable_binding("frozen", num(2.0), true)));
    env.set_mutable_binding("frozen", num(2.0), false).unwrap();
    assert_eq!(env.get_binding_value("frozen", true).unwrap(), num(1.0));
    assert!(env.with_base_object().is_none());
}

#[test]
fn global_record_splits_lexical_and_var_bindings() {
    let global = object_create(None);
    let mut env = GlobalEnvironmentRecord::new(global.clone());

    env.create_global_var_binding("v".to_string(), false).unwrap();
    assert!(env.has_var_declaration("v"));
    assert!(global.borrow().has_own_property(&PropertyKey::from("v")));

    env.create_mutable_binding("l".to_string(), false).unwrap();
    env.initialize_binding("l", num(2.0)).unwrap();
    assert!(env.has_lexical_declaration("l"));
    assert!(!global.borrow().has_own_property(&PropertyKey::from("l")));
    assert_eq!(env.get_binding_value("l", true).unwrap(), num(2.0));

    assert!(env.has_this_binding());
    assert!(std::rc::Rc::ptr_eq(&env.get_this_binding(), &global));
}

#[test]
fn global_record_restricted_properties() {
    let global = object_create(None);
    define_property_or_throw(
        &global,
        "undefined".into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_frozen(
            JsValue::Undefined,
        )),
    )
    .unwrap();
    let env = GlobalEnvironmentRecord::new(global);
    assert!(env.has_restricted_global_property("undefined"));
    assert!(!env.has_restricted_global_property("other"));
    assert!(!env.can_declare_global_function("undefined"));
    assert!(env.can_declare_global_var("anything"));
}

#[test]
fn function_record_this_binding() {
    let realm = initialize_host_defined_realm().unwrap();
    let f = create_builtin_function(&realm, noop, "f", 0, false).unwrap();
    let mut env = FunctionEnvironmentRecord::new(f, None);
    assert!(env.has_this_binding());
    assert!(is_reference_error(env.get_this_binding()));
    env.bind_this_value(num(1.0)).unwrap();
    assert_eq!(env.get_this_binding().unwrap(), num(1.0));
    assert!(is_reference_error(env.bind_this_value(num(2.0))));
    assert!(env.new_target().is_none());
}

#[test]
fn identifier_resolution_walks_outward() {
    let global = object_create(None);
    let global_env = new_global_environment(global);
    let middle = new_declarative_environment(Some(global_env.clone()));
    let inner = new_declarative_environment(Some(middle.clone()));
    {
        let mut m = middle.borrow_mut();
        let record = m.inner.as_env_record_mut();
        record.create_mutable_binding("x".to_string(), false).unwrap();
        record.initialize_binding("x", num(1.0)).unwrap();
    }

    let found = get_identifier_reference(Some(inner.clone()), "x", true);
    match &found.base {
        ReferenceBase::Environment(env) => assert!(std::rc::Rc::ptr_eq(env, &middle)),
        _ => panic!("x should resolve to the middle scope"),
    }
    let missing = get_identifier_reference(Some(inner), "y", true);
    assert!(missing.is_unresolvable());
    assert!(missing.strict);
}

#[test]
fn realms_do_not_share_intrinsics() {
    let a = initialize_host_defined_realm().unwrap();
    let b = initialize_host_defined_realm().unwrap();
    let a_proto = get_intrinsic(&a, WellKnownIntrinsics::ObjectPrototype).unwrap();
    let b_proto = get_intrinsic(&b, WellKnownIntrinsics::ObjectPrototype).unwrap();
    assert!(!std::rc::Rc::ptr_eq(&a_proto, &b_proto));
    assert!(a.borrow().id != b.borrow().id);
}

#[test]
fn global_object_properties_are_not_lexical_declarations() {
    let global = object_create(None);
    define_property_or_throw(
        &global,
        "x".into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_frozen(
            num(1.0),
        )),
    )
    .unwrap();
    let env = new_global_environment(global);
    let mut e = env.borrow_mut();
    assert!(e.inner.as_env_record().has_binding("x"));
    assert!(!e.inner.has_lexical_binding("x"));
    e.inner.as_env_record_mut().create_mutable_binding("x".to_string(), false).unwrap();
    assert!(e.inner.has_lexical_binding("x"));
}
