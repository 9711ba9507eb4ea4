use std::fmt;
use std::fmt::{Display, Formatter};

use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::symbol::SymbolData;
use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Str(String),
    Sym(SymbolData),
}
impl Display for PropertyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Str(s) => write!(f, "{}", s),
            PropertyKey::Sym(s) => write!(f, "{}", s),
        }
    }
}
impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::Str(s.to_string())
    }
}
impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::Str(s)
    }
}

/// A data property. Accessor properties are not modelled.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}
impl PropertyDescriptor {
    pub fn new(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor {
            value,
            writable,
            enumerable,
            configurable,
        }
    }

    /// Writable, enumerable and configurable. What plain assignment creates.
    pub fn new_default(value: JsValue) -> Self {
        PropertyDescriptor::new(value, true, true, true)
    }

    /// Writable and configurable but hidden from enumeration, as built-in methods are.
    pub fn new_hidden(value: JsValue) -> Self {
        PropertyDescriptor::new(value, true, false, true)
    }

    /// Neither writable, enumerable nor configurable.
    pub fn new_frozen(value: JsValue) -> Self {
        PropertyDescriptor::new(value, false, false, false)
    }
}
impl PartialEq for PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        same_value(&self.value, &other.value)
            && self.writable == other.writable
            && self.enumerable == other.enumerable
            && self.configurable == other.configurable
    }
}

/// A partial descriptor for [[DefineOwnProperty]]: only the honoured fields are applied.
pub struct PropertyDescriptorSetter {
    pub honour_value: bool,
    pub honour_writable: bool,
    pub honour_enumerable: bool,
    pub honour_configurable: bool,
    pub descriptor: PropertyDescriptor,
}
impl PropertyDescriptorSetter {
    pub fn new_from_property_descriptor(desc: PropertyDescriptor) -> Self {
        PropertyDescriptorSetter {
            honour_value: true,
            honour_writable: true,
            honour_enumerable: true,
            honour_configurable: true,
            descriptor: desc,
        }
    }

    /// Only replaces the value, as [[Set]] does on an existing writable property.
    pub fn new_value_only(value: JsValue) -> Self {
        PropertyDescriptorSetter {
            honour_value: true,
            honour_writable: false,
            honour_enumerable: false,
            honour_configurable: false,
            descriptor: PropertyDescriptor::new(value, false, false, false),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.honour_configurable
            && !self.honour_enumerable
            && !self.honour_value
            && !self.honour_writable
    }

    /// Merges the honoured fields into `current`, or into an all-false default.
    pub(crate) fn apply_to(self, current: Option<&PropertyDescriptor>) -> PropertyDescriptor {
        let base = match current {
            Some(c) => c.clone(),
            None => PropertyDescriptor::new(JsValue::Undefined, false, false, false),
        };
        PropertyDescriptor {
            value: if self.honour_value {
                self.descriptor.value
            } else {
                base.value
            },
            writable: if self.honour_writable {
                self.descriptor.writable
            } else {
                base.writable
            },
            enumerable: if self.honour_enumerable {
                self.descriptor.enumerable
            } else {
                base.enumerable
            },
            configurable: if self.honour_configurable {
                self.descriptor.configurable
            } else {
                base.configurable
            },
        }
    }
}
