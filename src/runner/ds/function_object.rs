use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObjectType, ObjectKind, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::realm::{get_intrinsic, JsCodeRealmType, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::types::EvalResult;

/// A built-in implemented in Rust: `(ctx, this, arguments, new_target)`. `new_target` is
/// `Some` only when invoked through [[Construct]].
pub type NativeFn =
    fn(&mut EvalContext, JsValue, Vec<JsValue>, Option<JsObjectType>) -> EvalResult;

/// How `this` is bound on entry to a script function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisMode {
    /// Arrow functions, which see the `this` of their surrounding scope.
    Lexical,
    Strict,
    /// Sloppy functions, where a nullish `this` becomes the global object.
    Global,
}

pub struct ScriptFunction {
    pub code: Rc<FunctionData>,
    /// The environment the function closes over.
    pub environment: JsLexEnvironmentType,
    pub this_mode: ThisMode,
    pub strict: bool,
    pub is_constructor: bool,
    pub home_object: Option<JsObjectType>,
}

pub enum FunctionKind {
    Script(ScriptFunction),
    Native {
        func: NativeFn,
        is_constructor: bool,
    },
    /// A callable that crossed a realm boundary. Calling it calls `target` in its own realm.
    Wrapped { target: JsObjectType },
}

pub struct FunctionObject {
    /// The realm the function was created in.
    pub realm: JsCodeRealmType,
    pub kind: FunctionKind,
}
impl FunctionObject {
    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            FunctionKind::Script(f) => f.is_constructor,
            FunctionKind::Native { is_constructor, .. } => *is_constructor,
            FunctionKind::Wrapped { .. } => false,
        }
    }

    pub fn this_mode(&self) -> ThisMode {
        match &self.kind {
            FunctionKind::Script(f) => f.this_mode,
            _ => ThisMode::Strict,
        }
    }

    pub fn as_script_function(&self) -> Option<&ScriptFunction> {
        match &self.kind {
            FunctionKind::Script(f) => Some(f),
            _ => None,
        }
    }
}

/// GetFunctionRealm.
pub fn get_function_realm(f: &JsObjectType) -> Result<JsCodeRealmType, JErrorType> {
    match (**f).borrow().as_function_object() {
        Some(fo) => Ok(fo.realm.clone()),
        None => Err(JErrorType::TypeError("object is not a function".to_string())),
    }
}

fn define_name_and_length(f: &JsObjectType, name: &str, length: usize) {
    let mut fo = f.borrow_mut();
    fo.define_own_property(
        "length".into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new(
            JsValue::Number(length as f64),
            false,
            false,
            true,
        )),
    );
    fo.define_own_property(
        "name".into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new(
            JsValue::String(name.to_string()),
            false,
            false,
            true,
        )),
    );
}

/// Allocates a function object with `Function.prototype` of `realm` and sets its `length`
/// and `name`.
pub fn function_object_create(
    realm: &JsCodeRealmType,
    kind: FunctionKind,
    name: &str,
    length: usize,
) -> Result<JsObjectType, JErrorType> {
    let proto = get_intrinsic(realm, WellKnownIntrinsics::FunctionPrototype)?;
    let f = ObjectType::new(
        Some(proto),
        ObjectKind::Function(FunctionObject {
            realm: realm.clone(),
            kind,
        }),
    )
    .into_js_object();
    define_name_and_length(&f, name, length);
    Ok(f)
}

/// CreateBuiltinFunction.
pub fn create_builtin_function(
    realm: &JsCodeRealmType,
    func: NativeFn,
    name: &str,
    length: usize,
    is_constructor: bool,
) -> Result<JsObjectType, JErrorType> {
    function_object_create(
        realm,
        FunctionKind::Native {
            func,
            is_constructor,
        },
        name,
        length,
    )
}
