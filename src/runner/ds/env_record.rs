use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::ThisMode;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::object::{define_property_or_throw, get, has_property, put};
use crate::runner::ds::value::JsValue;

/// The operations every kind of scope supports. Names are plain strings; symbols never
/// name a binding.
pub trait EnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool;
    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType>;
    fn create_immutable_binding(&mut self, name: String, strict: bool) -> Result<(), JErrorType>;
    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType>;
    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType>;
    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, JErrorType>;
    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType>;
    fn has_this_binding(&self) -> bool;
    fn has_super_binding(&self) -> bool;
    /// The object supplied as `this` to calls resolved through a `with` scope.
    fn with_base_object(&self) -> Option<JsObjectType> {
        None
    }
}

pub enum EnvironmentRecordType {
    Declarative(DeclarativeEnvironmentRecord),
    Object(ObjectEnvironmentRecord),
    Function(FunctionEnvironmentRecord),
    Global(GlobalEnvironmentRecord),
}
impl EnvironmentRecordType {
    pub fn as_env_record(&self) -> &dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
            EnvironmentRecordType::Function(d) => d,
            EnvironmentRecordType::Global(d) => d,
        }
    }

    pub fn as_env_record_mut(&mut self) -> &mut dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
            EnvironmentRecordType::Function(d) => d,
            EnvironmentRecordType::Global(d) => d,
        }
    }

    /// Whether `name` is already declared lexically in this record. For the global record
    /// only the declarative part counts; global object properties do not.
    pub fn has_lexical_binding(&self, name: &str) -> bool {
        match self {
            EnvironmentRecordType::Global(g) => g.has_lexical_declaration(name),
            other => other.as_env_record().has_binding(name),
        }
    }

    pub fn as_function(&self) -> Option<&FunctionEnvironmentRecord> {
        match self {
            EnvironmentRecordType::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionEnvironmentRecord> {
        match self {
            EnvironmentRecordType::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_global(&self) -> Option<&GlobalEnvironmentRecord> {
        match self {
            EnvironmentRecordType::Global(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_global_mut(&mut self) -> Option<&mut GlobalEnvironmentRecord> {
        match self {
            EnvironmentRecordType::Global(g) => Some(g),
            _ => None,
        }
    }
}

/// A named slot. `value` is `None` until the declaration is reached (the TDZ).
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Option<JsValue>,
    pub mutable: bool,
    pub deletable: bool,
    /// Writes to an immutable strict binding throw even from sloppy code.
    pub strict: bool,
}
impl Binding {
    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }
}

fn not_defined(name: &str) -> JErrorType {
    JErrorType::ReferenceError(format!("{} is not defined", name))
}

fn uninitialized(name: &str) -> JErrorType {
    JErrorType::ReferenceError(format!("Cannot access '{}' before initialization", name))
}

#[derive(Default)]
pub struct DeclarativeEnvironmentRecord {
    bindings: HashMap<String, Binding>,
}
impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        DeclarativeEnvironmentRecord {
            bindings: HashMap::new(),
        }
    }

    pub fn get_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    fn create_binding(&mut self, name: String, binding: Binding) -> Result<(), JErrorType> {
        if self.bindings.contains_key(&name) {
            Err(JErrorType::InternalError(format!(
                "Binding '{}' already exists in this scope",
                name
            )))
        } else {
            self.bindings.insert(name, binding);
            Ok(())
        }
    }
}
impl EnvironmentRecord for DeclarativeEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        self.create_binding(
            name,
            Binding {
                value: None,
                mutable: true,
                deletable: can_delete,
                strict: false,
            },
        )
    }

    fn create_immutable_binding(&mut self, name: String, strict: bool) -> Result<(), JErrorType> {
        self.create_binding(
            name,
            Binding {
                value: None,
                mutable: false,
                deletable: false,
                strict,
            },
        )
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            None => Err(JErrorType::InternalError(format!(
                "Binding '{}' does not exist",
                name
            ))),
            Some(b) if b.is_initialized() => Err(JErrorType::InternalError(format!(
                "Binding '{}' is already initialized",
                name
            ))),
            Some(b) => {
                b.value = Some(value);
                Ok(())
            }
        }
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType> {
        if !self.bindings.contains_key(name) {
            if strict {
                return Err(not_defined(name));
            }
            self.create_mutable_binding(name.to_string(), true)?;
            return self.initialize_binding(name, value);
        }
        let binding = match self.bindings.get_mut(name) {
            Some(b) => b,
            None => return Err(not_defined(name)),
        };
        if !binding.is_initialized() {
            Err(uninitialized(name))
        } else if binding.mutable {
            binding.value = Some(value);
            Ok(())
        } else if binding.strict || strict {
            Err(JErrorType::TypeError(format!(
                "Assignment to constant variable '{}'",
                name
            )))
        } else {
            Ok(())
        }
    }

    fn get_binding_value(&self, name: &str, _strict: bool) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            None => Err(not_defined(name)),
            Some(Binding { value: None, .. }) => Err(uninitialized(name)),
            Some(Binding { value: Some(v), .. }) => Ok(v.clone()),
        }
    }

    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType> {
        Ok(match self.bindings.get(name) {
            None => true,
            Some(b) if !b.deletable => false,
            Some(_) => {
                self.bindings.remove(name);
                true
            }
        })
    }

    fn has_this_binding(&self) -> bool {
        false
    }

    fn has_super_binding(&self) -> bool {
        false
    }
}

/// Bindings that are the properties of an object. Backs `with` and the global object.
pub struct ObjectEnvironmentRecord {
    binding_object: JsObjectType,
    is_with_environment: bool,
}
impl ObjectEnvironmentRecord {
    pub fn new(o: JsObjectType, is_with_environment: bool) -> Self {
        ObjectEnvironmentRecord {
            binding_object: o,
            is_with_environment,
        }
    }

    pub fn binding_object(&self) -> &JsObjectType {
        &self.binding_object
    }
}
impl EnvironmentRecord for ObjectEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        has_property(&self.binding_object, &PropertyKey::from(name))
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        define_property_or_throw(
            &self.binding_object,
            PropertyKey::Str(name),
            PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new(
                JsValue::Undefined,
                true,
                true,
                can_delete,
            )),
        )
    }

    fn create_immutable_binding(&mut self, name: String, _strict: bool) -> Result<(), JErrorType> {
        Err(JErrorType::InternalError(format!(
            "Cannot create immutable binding '{}' in an object scope",
            name
        )))
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        self.set_mutable_binding(name, value, false)
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType> {
        let key = PropertyKey::from(name);
        if strict && !has_property(&self.binding_object, &key) {
            return Err(not_defined(name));
        }
        put(&self.binding_object, key, value, strict)
    }

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, JErrorType> {
        let key = PropertyKey::from(name);
        if !has_property(&self.binding_object, &key) {
            if strict {
                Err(not_defined(name))
            } else {
                Ok(JsValue::Undefined)
            }
        } else {
            Ok(get(&self.binding_object, &key))
        }
    }

    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType> {
        Ok(self
            .binding_object
            .borrow_mut()
            .delete(&PropertyKey::from(name)))
    }

    fn has_this_binding(&self) -> bool {
        false
    }

    fn has_super_binding(&self) -> bool {
        false
    }

    fn with_base_object(&self) -> Option<JsObjectType> {
        if self.is_with_environment {
            Some(self.binding_object.clone())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisBindingStatus {
    Lexical,
    Initialized,
    Uninitialized,
}

/// The top scope of a non-arrow function call, which also carries `this` and `new.target`.
pub struct FunctionEnvironmentRecord {
    base_env: DeclarativeEnvironmentRecord,
    this_value: JsValue,
    this_binding_status: ThisBindingStatus,
    function_object: JsObjectType,
    home_object: Option<JsObjectType>,
    new_target: Option<JsObjectType>,
}
impl FunctionEnvironmentRecord {
    pub fn new(f: JsObjectType, new_target: Option<JsObjectType>) -> Self {
        let (this_mode, home_object) = {
            let fo = (*f).borrow();
            match fo.as_function_object() {
                Some(func) => (
                    func.this_mode(),
                    func.as_script_function()
                        .and_then(|s| s.home_object.clone()),
                ),
                None => (ThisMode::Strict, None),
            }
        };
        FunctionEnvironmentRecord {
            base_env: DeclarativeEnvironmentRecord::new(),
            this_value: JsValue::Undefined,
            this_binding_status: if this_mode == ThisMode::Lexical {
                ThisBindingStatus::Lexical
            } else {
                ThisBindingStatus::Uninitialized
            },
            function_object: f,
            home_object,
            new_target,
        }
    }

    pub fn bind_this_value(&mut self, this: JsValue) -> Result<(), JErrorType> {
        match self.this_binding_status {
            ThisBindingStatus::Lexical => Err(JErrorType::InternalError(
                "Arrow functions have no this binding".to_string(),
            )),
            ThisBindingStatus::Initialized => Err(JErrorType::ReferenceError(
                "'this' is already initialized".to_string(),
            )),
            ThisBindingStatus::Uninitialized => {
                self.this_value = this;
                self.this_binding_status = ThisBindingStatus::Initialized;
                Ok(())
            }
        }
    }

    pub fn get_this_binding(&self) -> Result<JsValue, JErrorType> {
        match self.this_binding_status {
            ThisBindingStatus::Lexical => Err(JErrorType::InternalError(
                "Arrow functions have no this binding".to_string(),
            )),
            ThisBindingStatus::Uninitialized => Err(JErrorType::ReferenceError(
                "'this' is not initialized".to_string(),
            )),
            ThisBindingStatus::Initialized => Ok(self.this_value.clone()),
        }
    }

    pub fn get_super_base(&self) -> Option<JsObjectType> {
        self.home_object
            .as_ref()
            .and_then(|ho| (**ho).borrow().get_prototype_of())
    }

    pub fn new_target(&self) -> Option<JsObjectType> {
        self.new_target.clone()
    }

    pub fn function_object(&self) -> &JsObjectType {
        &self.function_object
    }
}
impl EnvironmentRecord for FunctionEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.base_env.has_binding(name)
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        self.base_env.create_mutable_binding(name, can_delete)
    }

    fn create_immutable_binding(&mut self, name: String, strict: bool) -> Result<(), JErrorType> {
        self.base_env.create_immutable_binding(name, strict)
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        self.base_env.initialize_binding(name, value)
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType> {
        self.base_env.set_mutable_binding(name, value, strict)
    }

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, JErrorType> {
        self.base_env.get_binding_value(name, strict)
    }

    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType> {
        self.base_env.delete_binding(name)
    }

    fn has_this_binding(&self) -> bool {
        self.this_binding_status != ThisBindingStatus::Lexical
    }

    fn has_super_binding(&self) -> bool {
        self.this_binding_status != ThisBindingStatus::Lexical && self.home_object.is_some()
    }
}

/// The outermost scope of a realm: the global object's properties plus a declarative
/// part for top level `let` and `const`.
pub struct GlobalEnvironmentRecord {
    object_record: ObjectEnvironmentRecord,
    declarative_record: DeclarativeEnvironmentRecord,
    var_names: Vec<String>,
}
impl GlobalEnvironmentRecord {
    pub fn new(global_object: JsObjectType) -> Self {
        GlobalEnvironmentRecord {
            object_record: ObjectEnvironmentRecord::new(global_object, false),
            declarative_record: DeclarativeEnvironmentRecord::new(),
            var_names: Vec::new(),
        }
    }

    pub fn get_this_binding(&self) -> JsObjectType {
        self.object_record.binding_object.clone()
    }

    fn own_global_property(&self, name: &str) -> Option<PropertyDescriptor> {
        (*self.object_record.binding_object)
            .borrow()
            .get_own_property(&PropertyKey::from(name))
            .cloned()
    }

    fn is_global_object_extensible(&self) -> bool {
        (*self.object_record.binding_object).borrow().is_extensible()
    }

    pub fn has_var_declaration(&self, name: &str) -> bool {
        self.var_names.iter().any(|n| n == name)
    }

    pub fn has_lexical_declaration(&self, name: &str) -> bool {
        self.declarative_record.has_binding(name)
    }

    /// True for non-configurable global object properties such as `undefined`.
    pub fn has_restricted_global_property(&self, name: &str) -> bool {
        match self.own_global_property(name) {
            Some(desc) => !desc.configurable,
            None => false,
        }
    }

    pub fn can_declare_global_var(&self, name: &str) -> bool {
        self.own_global_property(name).is_some() || self.is_global_object_extensible()
    }

    pub fn can_declare_global_function(&self, name: &str) -> bool {
        match self.own_global_property(name) {
            None => self.is_global_object_extensible(),
            Some(desc) => desc.configurable || (desc.writable && desc.enumerable),
        }
    }

    pub fn create_global_var_binding(
        &mut self,
        name: String,
        can_delete: bool,
    ) -> Result<(), JErrorType> {
        if self.own_global_property(&name).is_none() && self.is_global_object_extensible() {
            self.object_record
                .create_mutable_binding(name.to_string(), can_delete)?;
            self.object_record
                .initialize_binding(&name, JsValue::Undefined)?;
        }
        if !self.has_var_declaration(&name) {
            self.var_names.push(name);
        }
        Ok(())
    }

    pub fn create_global_function_binding(
        &mut self,
        name: String,
        f: JsValue,
        can_delete: bool,
    ) -> Result<(), JErrorType> {
        let replace_attributes = match self.own_global_property(&name) {
            None => true,
            Some(desc) => desc.configurable,
        };
        let new_desc = if replace_attributes {
            PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new(
                f, true, true, can_delete,
            ))
        } else {
            PropertyDescriptorSetter::new_value_only(f)
        };
        define_property_or_throw(
            &self.object_record.binding_object,
            PropertyKey::from(name.as_str()),
            new_desc,
        )?;
        if !self.has_var_declaration(&name) {
            self.var_names.push(name);
        }
        Ok(())
    }
}
impl EnvironmentRecord for GlobalEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.declarative_record.has_binding(name) || self.object_record.has_binding(name)
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        self.declarative_record
            .create_mutable_binding(name, can_delete)
    }

    fn create_immutable_binding(&mut self, name: String, strict: bool) -> Result<(), JErrorType> {
        self.declarative_record
            .create_immutable_binding(name, strict)
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if self.declarative_record.has_binding(name) {
            self.declarative_record.initialize_binding(name, value)
        } else {
            self.object_record.initialize_binding(name, value)
        }
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType> {
        if self.declarative_record.has_binding(name) {
            self.declarative_record
                .set_mutable_binding(name, value, strict)
        } else {
            self.object_record.set_mutable_binding(name, value, strict)
        }
    }

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, JErrorType> {
        if self.declarative_record.has_binding(name) {
            self.declarative_record.get_binding_value(name, strict)
        } else {
            self.object_record.get_binding_value(name, strict)
        }
    }

    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType> {
        if self.declarative_record.has_binding(name) {
            return self.declarative_record.delete_binding(name);
        }
        if self.own_global_property(name).is_some() {
            let deleted = self.object_record.delete_binding(name)?;
            if deleted {
                self.var_names.retain(|n| n != name);
            }
            Ok(deleted)
        } else {
            Ok(true)
        }
    }

    fn has_this_binding(&self) -> bool {
        true
    }

    fn has_super_binding(&self) -> bool {
        false
    }
}

fn new_lex_environment(
    record: EnvironmentRecordType,
    outer: Option<JsLexEnvironmentType>,
) -> JsLexEnvironmentType {
    Rc::new(RefCell::new(LexEnvironment {
        inner: Box::new(record),
        outer,
    }))
}

pub fn new_declarative_environment(outer: Option<JsLexEnvironmentType>) -> JsLexEnvironmentType {
    new_lex_environment(
        EnvironmentRecordType::Declarative(DeclarativeEnvironmentRecord::new()),
        outer,
    )
}

pub fn new_object_environment(
    o: JsObjectType,
    is_with_environment: bool,
    outer: Option<JsLexEnvironmentType>,
) -> JsLexEnvironmentType {
    new_lex_environment(
        EnvironmentRecordType::Object(ObjectEnvironmentRecord::new(o, is_with_environment)),
        outer,
    )
}

/// NewFunctionEnvironment. The outer scope is the closure's captured environment.
pub fn new_function_environment(
    f: JsObjectType,
    new_target: Option<JsObjectType>,
) -> Result<JsLexEnvironmentType, JErrorType> {
    let outer = match (*f).borrow().as_function_object() {
        Some(fo) => match fo.as_script_function() {
            Some(sf) => sf.environment.clone(),
            None => {
                return Err(JErrorType::InternalError(
                    "Only script functions get a function environment".to_string(),
                ))
            }
        },
        None => {
            return Err(JErrorType::InternalError(
                "Function environment requested for a non-function".to_string(),
            ))
        }
    };
    Ok(new_lex_environment(
        EnvironmentRecordType::Function(FunctionEnvironmentRecord::new(f, new_target)),
        Some(outer),
    ))
}

pub fn new_global_environment(global_object: JsObjectType) -> JsLexEnvironmentType {
    new_lex_environment(
        EnvironmentRecordType::Global(GlobalEnvironmentRecord::new(global_object)),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::{ObjectKind, ObjectType};

    #[test]
    fn tdz_until_initialized() {
        let mut env = DeclarativeEnvironmentRecord::new();
        env.create_mutable_binding("x".to_string(), false).unwrap();
        assert!(matches!(
            env.get_binding_value("x", true),
            Err(JErrorType::ReferenceError(_))
        ));
        env.initialize_binding("x", JsValue::Number(3.0)).unwrap();
        assert_eq!(env.get_binding_value("x", true).unwrap(), JsValue::Number(3.0));
    }

    #[test]
    fn double_initialization_is_internal_error() {
        let mut env = DeclarativeEnvironmentRecord::new();
        env.create_mutable_binding("x".to_string(), false).unwrap();
        env.initialize_binding("x", JsValue::Null).unwrap();
        assert!(matches!(
            env.initialize_binding("x", JsValue::Null),
            Err(JErrorType::InternalError(_))
        ));
    }

    #[test]
    fn sloppy_write_to_non_strict_immutable_binding_is_ignored() {
        let mut env = DeclarativeEnvironmentRecord::new();
        env.create_immutable_binding("f".to_string(), false).unwrap();
        env.initialize_binding("f", JsValue::Number(1.0)).unwrap();
        env.set_mutable_binding("f", JsValue::Number(2.0), false).unwrap();
        assert_eq!(env.get_binding_value("f", false).unwrap(), JsValue::Number(1.0));
        assert!(matches!(
            env.set_mutable_binding("f", JsValue::Number(2.0), true),
            Err(JErrorType::TypeError(_))
        ));
    }

    #[test]
    fn with_scope_reports_its_base_object() {
        let o = ObjectType::new(None, ObjectKind::Ordinary).into_js_object();
        let with_env = ObjectEnvironmentRecord::new(o.clone(), true);
        assert!(with_env.with_base_object().is_some());
        let plain = ObjectEnvironmentRecord::new(o, false);
        assert!(plain.with_base_object().is_none());
    }

    #[test]
    fn global_var_and_lexical_declarations_are_tracked_apart() {
        let global_object = ObjectType::new(None, ObjectKind::Ordinary).into_js_object();
        let mut global = GlobalEnvironmentRecord::new(global_object.clone());
        global.create_global_var_binding("v".to_string(), false).unwrap();
        global.create_mutable_binding("l".to_string(), false).unwrap();
        assert!(global.has_var_declaration("v"));
        assert!(!global.has_var_declaration("l"));
        assert!(global.has_lexical_declaration("l"));
        assert!((*global_object).borrow().has_own_property(&PropertyKey::from("v")));
        assert!(!(*global_object).borrow().has_own_property(&PropertyKey::from("l")));
        assert!(global.has_restricted_global_property("v"));
    }
}
