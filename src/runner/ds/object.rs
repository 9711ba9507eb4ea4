use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::realm::JsCodeRealmType;
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

/// Internal slots that distinguish exotic and built-in objects from ordinary ones.
pub enum ObjectKind {
    Ordinary,
    /// Has [[ErrorData]].
    Error,
    Function(FunctionObject),
    /// Has [[ShadowRealm]], the realm the object owns.
    ShadowRealm(JsCodeRealmType),
}

pub struct ObjectBase {
    properties: HashMap<PropertyKey, PropertyDescriptor>,
    // Insertion order of `properties`.
    keys: Vec<PropertyKey>,
    is_extensible: bool,
    prototype: Option<JsObjectType>,
}
impl ObjectBase {
    pub fn new(prototype: Option<JsObjectType>) -> Self {
        ObjectBase {
            properties: HashMap::new(),
            keys: Vec::new(),
            is_extensible: true,
            prototype,
        }
    }
}

pub struct ObjectType {
    base: ObjectBase,
    pub kind: ObjectKind,
}
impl ObjectType {
    pub fn new(prototype: Option<JsObjectType>, kind: ObjectKind) -> Self {
        ObjectType {
            base: ObjectBase::new(prototype),
            kind,
        }
    }

    pub fn into_js_object(self) -> JsObjectType {
        Rc::new(RefCell::new(self))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            ObjectKind::Function(f) => f.is_constructor(),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ObjectKind::Error)
    }

    pub fn as_function_object(&self) -> Option<&FunctionObject> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_shadow_realm(&self) -> Option<&JsCodeRealmType> {
        match &self.kind {
            ObjectKind::ShadowRealm(r) => Some(r),
            _ => None,
        }
    }

    pub fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.base.prototype.clone()
    }

    /// Replaces the prototype without the cycle check of `operations::object::set_prototype_of`.
    pub(crate) fn set_prototype(&mut self, prototype: Option<JsObjectType>) {
        self.base.prototype = prototype;
    }

    pub fn is_extensible(&self) -> bool {
        self.base.is_extensible
    }

    pub fn prevent_extensions(&mut self) -> bool {
        self.base.is_extensible = false;
        true
    }

    pub fn get_own_property(&self, property: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.base.properties.get(property)
    }

    pub fn has_own_property(&self, property: &PropertyKey) -> bool {
        self.base.properties.contains_key(property)
    }

    pub fn define_own_property(
        &mut self,
        property: PropertyKey,
        descriptor_setter: PropertyDescriptorSetter,
    ) -> bool {
        ordinary_define_own_property(self, property, descriptor_setter)
    }

    pub fn delete(&mut self, property: &PropertyKey) -> bool {
        match self.base.properties.get(property) {
            None => true,
            Some(pd) => {
                if pd.configurable {
                    self.base.properties.remove(property);
                    self.base.keys.retain(|k| k != property);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// String keys in insertion order, then symbol keys.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut str_keys = vec![];
        let mut sym_keys = vec![];
        for key in &self.base.keys {
            match key {
                PropertyKey::Str(_) => str_keys.push(key.clone()),
                PropertyKey::Sym(_) => sym_keys.push(key.clone()),
            }
        }
        str_keys.append(&mut sym_keys);
        str_keys
    }

    fn lookup_string(&self, key: &str) -> Option<String> {
        match self.get_own_property(&PropertyKey::from(key)) {
            Some(PropertyDescriptor {
                value: JsValue::String(s),
                ..
            }) => Some(s.to_string()),
            Some(_) => None,
            None => match &self.base.prototype {
                Some(p) => p.try_borrow().ok()?.lookup_string(key),
                None => None,
            },
        }
    }

    pub fn to_display_string(&self) -> String {
        match &self.kind {
            ObjectKind::Ordinary => "[object Object]".to_string(),
            ObjectKind::Function(_) => format!(
                "function {}() {{ [native code] }}",
                self.lookup_string("name").unwrap_or_default()
            ),
            ObjectKind::Error => {
                let name = self
                    .lookup_string("name")
                    .unwrap_or_else(|| "Error".to_string());
                match self.lookup_string("message") {
                    Some(m) if !m.is_empty() => format!("{}: {}", name, m),
                    _ => name,
                }
            }
            ObjectKind::ShadowRealm(_) => "[object ShadowRealm]".to_string(),
        }
    }
}

pub fn ordinary_define_own_property(
    o: &mut ObjectType,
    property: PropertyKey,
    descriptor_setter: PropertyDescriptorSetter,
) -> bool {
    let new_descriptor = match o.base.properties.get(&property) {
        None => {
            if !o.is_extensible() {
                return false;
            }
            o.base.keys.push(property.clone());
            descriptor_setter.apply_to(None)
        }
        Some(current) => {
            if descriptor_setter.is_empty() {
                return true;
            }
            let desc = &descriptor_setter.descriptor;
            if !current.configurable {
                if descriptor_setter.honour_configurable && desc.configurable {
                    return false;
                }
                if descriptor_setter.honour_enumerable && desc.enumerable != current.enumerable {
                    return false;
                }
                if !current.writable {
                    if descriptor_setter.honour_writable && desc.writable {
                        return false;
                    }
                    if descriptor_setter.honour_value && !same_value(&current.value, &desc.value)
                    {
                        return false;
                    }
                }
            }
            descriptor_setter.apply_to(Some(current))
        }
    };
    o.base.properties.insert(property, new_descriptor);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen(o: &mut ObjectType, key: &str, v: f64) {
        assert!(o.define_own_property(
            PropertyKey::from(key),
            PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_frozen(
                JsValue::Number(v)
            )),
        ));
    }

    #[test]
    fn non_configurable_property_cannot_change_value() {
        let mut o = ObjectType::new(None, ObjectKind::Ordinary);
        frozen(&mut o, "x", 1.0);
        assert!(!o.define_own_property(
            PropertyKey::from("x"),
            PropertyDescriptorSetter::new_value_only(JsValue::Number(2.0))
        ));
        assert!(o.define_own_property(
            PropertyKey::from("x"),
            PropertyDescriptorSetter::new_value_only(JsValue::Number(1.0))
        ));
        assert!(!o.delete(&PropertyKey::from("x")));
    }

    #[test]
    fn value_only_update_keeps_attributes() {
        let mut o = ObjectType::new(None, ObjectKind::Ordinary);
        o.define_own_property(
            PropertyKey::from("x"),
            PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_hidden(
                JsValue::Null,
            )),
        );
        o.define_own_property(
            PropertyKey::from("x"),
            PropertyDescriptorSetter::new_value_only(JsValue::Boolean(true)),
        );
        let d = o.get_own_property(&PropertyKey::from("x")).unwrap();
        assert_eq!(d.value, JsValue::Boolean(true));
        assert!(d.writable && !d.enumerable && d.configurable);
    }

    #[test]
    fn keys_keep_insertion_order() {
        let mut o = ObjectType::new(None, ObjectKind::Ordinary);
        for k in ["b", "a", "c"] {
            o.define_own_property(
                PropertyKey::from(k),
                PropertyDescriptorSetter::new_from_property_descriptor(
                    PropertyDescriptor::new_default(JsValue::Null),
                ),
            );
        }
        o.delete(&PropertyKey::from("a"));
        assert_eq!(
            o.own_property_keys(),
            vec![PropertyKey::from("b"), PropertyKey::from("c")]
        );
    }

    #[test]
    fn non_extensible_object_rejects_new_properties() {
        let mut o = ObjectType::new(None, ObjectKind::Ordinary);
        o.prevent_extensions();
        assert!(!o.define_own_property(
            PropertyKey::from("x"),
            PropertyDescriptorSetter::new_value_only(JsValue::Null)
        ));
    }
}
