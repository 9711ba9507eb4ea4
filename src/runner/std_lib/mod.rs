//! Built-in objects installed into every realm.
//!
//! Each realm gets its own copies: nothing here is shared between realms, so a built-in
//! reached through one realm's global object never leaks into another.

pub mod console;
pub mod core;
pub mod error;
pub mod shadow_realm;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{create_builtin_function, NativeFn};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::object::{
    define_hidden_property, define_property_or_throw, object_create,
};
use crate::runner::ds::realm::JsCodeRealmType;
use crate::runner::ds::value::JsValue;

/// Declarative description of a built-in: a prototype object with methods and properties
/// and, optionally, a constructor.
pub struct BuiltInObject {
    /// Name of the constructor (e.g. "TypeError", "ShadowRealm").
    pub name: String,
    /// Methods placed on the prototype, with their `length`.
    pub methods: Vec<(String, NativeFn, usize)>,
    /// Data properties placed on the prototype.
    pub properties: Vec<(PropertyKey, JsValue)>,
    pub constructor: Option<(NativeFn, usize)>,
}

impl BuiltInObject {
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            methods: Vec::new(),
            properties: Vec::new(),
            constructor: None,
        }
    }

    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn, length: usize) -> Self {
        self.methods.push((name.into(), func, length));
        self
    }

    pub fn add_property(mut self, name: impl Into<PropertyKey>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn with_constructor(mut self, constructor: NativeFn, length: usize) -> Self {
        self.constructor = Some((constructor, length));
        self
    }

    /// Creates the prototype, inheriting from `parent_proto`, and the constructor if one was
    /// given. Constructor and prototype point at each other through `prototype` and
    /// `constructor`.
    pub fn build(
        self,
        realm: &JsCodeRealmType,
        parent_proto: Option<JsObjectType>,
    ) -> Result<(Option<JsObjectType>, JsObjectType), JErrorType> {
        let proto = object_create(parent_proto);
        for (name, func, length) in &self.methods {
            let f = create_builtin_function(realm, *func, name, *length, false)?;
            define_hidden_property(&proto, name.as_str(), JsValue::Object(f));
        }
        for (key, value) in self.properties {
            define_hidden_property(&proto, key, value);
        }
        let constructor = match self.constructor {
            Some((func, length)) => {
                let ctor = create_builtin_function(realm, func, &self.name, length, true)?;
                define_property_or_throw(
                    &ctor,
                    "prototype".into(),
                    PropertyDescriptorSetter::new_from_property_descriptor(
                        PropertyDescriptor::new_frozen(JsValue::Object(proto.clone())),
                    ),
                )?;
                define_hidden_property(&proto, "constructor", JsValue::Object(ctor.clone()));
                Some(ctor)
            }
            None => None,
        };
        Ok((constructor, proto))
    }
}

/// Defines each `(name, func, length)` as a hidden method of `target`.
pub fn install_methods(
    realm: &JsCodeRealmType,
    target: &JsObjectType,
    methods: &[(&str, NativeFn, usize)],
) -> Result<(), JErrorType> {
    for (name, func, length) in methods {
        let f = create_builtin_function(realm, *func, name, *length, false)?;
        define_hidden_property(target, *name, JsValue::Object(f));
    }
    Ok(())
}

/// The `index`th argument, or undefined.
pub fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}
