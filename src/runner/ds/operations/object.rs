use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind, ObjectType};
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::function::{call_function_object, construct_function_object};
use crate::runner::eval::types::EvalResult;

/// [[Get]] for data properties: the first own property found along the prototype chain.
pub fn get(o: &JsObjectType, p: &PropertyKey) -> JsValue {
    let mut current = o.clone();
    loop {
        let next = {
            let obj = (*current).borrow();
            if let Some(desc) = obj.get_own_property(p) {
                return desc.value.clone();
            }
            obj.get_prototype_of()
        };
        match next {
            Some(proto) => current = proto,
            None => return JsValue::Undefined,
        }
    }
}

/// GetV: property lookup on any value. Strings expose `length` and their indices; other
/// primitives have no properties.
pub fn get_v(v: &JsValue, p: &PropertyKey) -> Result<JsValue, JErrorType> {
    match v {
        JsValue::Object(o) => Ok(get(o, p)),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            v, p
        ))),
        JsValue::String(s) => Ok(match p {
            PropertyKey::Str(k) if k == "length" => {
                JsValue::Number(s.encode_utf16().count() as f64)
            }
            PropertyKey::Str(k) => match k.parse::<usize>() {
                Ok(idx) if idx.to_string() == *k => s
                    .encode_utf16()
                    .nth(idx)
                    .map(|u| JsValue::String(String::from_utf16_lossy(&[u])))
                    .unwrap_or(JsValue::Undefined),
                _ => JsValue::Undefined,
            },
            _ => JsValue::Undefined,
        }),
        _ => Ok(JsValue::Undefined),
    }
}

pub fn get_method(v: &JsValue, p: &PropertyKey) -> Result<Option<JsValue>, JErrorType> {
    let f = get_v(v, p)?;
    if f.is_nullish() {
        Ok(None)
    } else if f.is_callable() {
        Ok(Some(f))
    } else {
        Err(JErrorType::TypeError(format!("'{}' is not a function", p)))
    }
}

fn find_property(o: &JsObjectType, p: &PropertyKey) -> Option<PropertyDescriptor> {
    let mut current = o.clone();
    loop {
        let next = {
            let obj = (*current).borrow();
            if let Some(desc) = obj.get_own_property(p) {
                return Some(desc.clone());
            }
            obj.get_prototype_of()
        };
        current = next?;
    }
}

/// OrdinarySet for data properties. Returns false when the write is refused.
pub fn set(o: &JsObjectType, p: PropertyKey, value: JsValue, receiver: &JsValue) -> bool {
    if let Some(desc) = find_property(o, &p) {
        if !desc.writable {
            return false;
        }
    }
    let receiver = match receiver {
        JsValue::Object(r) => r,
        _ => return false,
    };
    let existing = (**receiver).borrow().get_own_property(&p).cloned();
    match existing {
        Some(desc) => {
            if !desc.writable {
                return false;
            }
            receiver
                .borrow_mut()
                .define_own_property(p, PropertyDescriptorSetter::new_value_only(value))
        }
        None => create_data_property(receiver, p, value),
    }
}

/// [[Set]] that throws on refusal when `throw` is set, as strict code requires.
pub fn put(
    o: &JsObjectType,
    p: PropertyKey,
    value: JsValue,
    throw: bool,
) -> Result<(), JErrorType> {
    let key = p.to_string();
    if !set(o, p, value, &JsValue::Object(o.clone())) && throw {
        Err(JErrorType::TypeError(format!(
            "Cannot assign to read only property '{}' of object",
            key
        )))
    } else {
        Ok(())
    }
}

pub fn has_property(o: &JsObjectType, p: &PropertyKey) -> bool {
    find_property(o, p).is_some()
}

pub fn create_data_property(o: &JsObjectType, p: PropertyKey, value: JsValue) -> bool {
    o.borrow_mut().define_own_property(
        p,
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_default(
            value,
        )),
    )
}

pub fn define_property_or_throw(
    o: &JsObjectType,
    p: PropertyKey,
    desc: PropertyDescriptorSetter,
) -> Result<(), JErrorType> {
    let key = p.to_string();
    if o.borrow_mut().define_own_property(p, desc) {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!(
            "Cannot redefine property: {}",
            key
        )))
    }
}

/// Defines a non-enumerable method or value, the way built-ins are installed.
pub fn define_hidden_property(o: &JsObjectType, p: impl Into<PropertyKey>, value: JsValue) {
    o.borrow_mut().define_own_property(
        p.into(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_hidden(
            value,
        )),
    );
}

/// [[SetPrototypeOf]]. Refuses prototype cycles and changes to non-extensible objects.
pub fn set_prototype_of(o: &JsObjectType, proto: Option<JsObjectType>) -> bool {
    let current = (**o).borrow().get_prototype_of();
    let unchanged = match (&current, &proto) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    };
    if unchanged {
        return true;
    }
    if !(**o).borrow().is_extensible() {
        return false;
    }
    let mut p = proto.clone();
    while let Some(candidate) = p {
        if Rc::ptr_eq(&candidate, o) {
            return false;
        }
        p = (*candidate).borrow().get_prototype_of();
    }
    o.borrow_mut().set_prototype(proto);
    true
}

pub fn object_create(proto: Option<JsObjectType>) -> JsObjectType {
    ObjectType::new(proto, ObjectKind::Ordinary).into_js_object()
}

/// OrdinaryHasInstance, behind `instanceof`.
pub fn ordinary_has_instance(c: &JsValue, o: &JsValue) -> Result<bool, JErrorType> {
    let c = match c {
        JsValue::Object(c) if (**c).borrow().is_callable() => c,
        _ => return Ok(false),
    };
    let o = match o {
        JsValue::Object(o) => o,
        _ => return Ok(false),
    };
    let proto = match get(c, &PropertyKey::from("prototype")) {
        JsValue::Object(p) => p,
        _ => {
            return Err(JErrorType::TypeError(
                "Function has non-object prototype in instanceof check".to_string(),
            ))
        }
    };
    let mut current = (**o).borrow().get_prototype_of();
    while let Some(p) = current {
        if Rc::ptr_eq(&p, &proto) {
            return Ok(true);
        }
        current = (*p).borrow().get_prototype_of();
    }
    Ok(false)
}

/// Call(F, V, argumentsList).
pub fn call(ctx: &mut EvalContext, f: &JsValue, this: JsValue, args: Vec<JsValue>) -> EvalResult {
    match f {
        JsValue::Object(o) if (**o).borrow().is_callable() => {
            call_function_object(ctx, o, this, args)
        }
        _ => ctx.throw_error(JErrorType::TypeError(format!("{} is not a function", f))),
    }
}

/// Construct(F, argumentsList, newTarget). `new_target` defaults to `f`.
pub fn construct(
    ctx: &mut EvalContext,
    f: &JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> EvalResult {
    match f {
        JsValue::Object(o) if (**o).borrow().is_constructor() => {
            let new_target = new_target.unwrap_or_else(|| o.clone());
            construct_function_object(ctx, o, args, new_target)
        }
        _ => ctx.throw_error(JErrorType::TypeError(format!("{} is not a constructor", f))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_the_prototype_chain() {
        let proto = object_create(None);
        create_data_property(&proto, PropertyKey::from("x"), JsValue::Number(1.0));
        let o = object_create(Some(proto.clone()));
        assert_eq!(get(&o, &PropertyKey::from("x")), JsValue::Number(1.0));
        assert_eq!(get(&o, &PropertyKey::from("y")), JsValue::Undefined);
    }

    #[test]
    fn set_shadows_inherited_property_on_receiver() {
        let proto = object_create(None);
        create_data_property(&proto, PropertyKey::from("x"), JsValue::Number(1.0));
        let o = object_create(Some(proto.clone()));
        assert!(set(&o, PropertyKey::from("x"), JsValue::Number(2.0), &JsValue::Object(o.clone())));
        assert_eq!(get(&proto, &PropertyKey::from("x")), JsValue::Number(1.0));
        assert_eq!(get(&o, &PropertyKey::from("x")), JsValue::Number(2.0));
    }

    #[test]
    fn read_only_inherited_property_blocks_set() {
        let proto = object_create(None);
        define_property_or_throw(
            &proto,
            PropertyKey::from("x"),
            PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_frozen(
                JsValue::Null,
            )),
        )
        .unwrap();
        let o = object_create(Some(proto));
        assert!(put(&o, PropertyKey::from("x"), JsValue::Null, false).is_ok());
        assert!(put(&o, PropertyKey::from("x"), JsValue::Null, true).is_err());
        assert!(!(*o).borrow().has_own_property(&PropertyKey::from("x")));
    }

    #[test]
    fn prototype_cycles_are_refused() {
        let a = object_create(None);
        let b = object_create(Some(a.clone()));
        assert!(!set_prototype_of(&a, Some(b.clone())));
        assert!(set_prototype_of(&b, None));
    }

    #[test]
    fn string_length_and_indices() {
        let s = JsValue::from("héllo");
        assert_eq!(get_v(&s, &PropertyKey::from("length")).unwrap(), JsValue::Number(5.0));
        assert_eq!(get_v(&s, &PropertyKey::from("1")).unwrap(), JsValue::from("é"));
        assert!(get_v(&JsValue::Null, &PropertyKey::from("x")).is_err());
    }
}
