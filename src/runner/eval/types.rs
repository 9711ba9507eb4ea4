//! Completion records and references.

use crate::parser::ast::Meta;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionType {
    Normal,
    Return,
    Throw,
    Break,
    Continue,
}

/// The outcome of evaluating a statement or expression.
///
/// `value` is `None` for the *empty* completion value, which is not the same thing as
/// `Some(JsValue::Undefined)`. `target` is the label of a `break` or `continue`.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
    pub target: Option<String>,
    /// Where an abrupt completion originated. Diagnostics only.
    pub location: Option<Meta>,
}

impl Completion {
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
            target: None,
            location: None,
        }
    }

    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
            target: None,
            location: None,
        }
    }

    pub fn make_abrupt(
        completion_type: CompletionType,
        value: Option<JsValue>,
        target: Option<String>,
    ) -> Self {
        Completion {
            completion_type,
            value,
            target,
            location: None,
        }
    }

    pub fn return_value(value: JsValue) -> Self {
        Completion::make_abrupt(CompletionType::Return, Some(value), None)
    }

    pub fn throw(value: JsValue) -> Self {
        Completion::make_abrupt(CompletionType::Throw, Some(value), None)
    }

    pub fn break_completion(target: Option<String>) -> Self {
        Completion::make_abrupt(CompletionType::Break, None, target)
    }

    pub fn continue_completion(target: Option<String>) -> Self {
        Completion::make_abrupt(CompletionType::Continue, None, target)
    }

    pub fn is_normal(&self) -> bool {
        self.completion_type == CompletionType::Normal
    }

    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    pub fn is_throw(&self) -> bool {
        self.completion_type == CompletionType::Throw
    }

    /// The value, with empty read as undefined.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// UpdateEmpty: fills an empty value, keeping the type and target.
    pub fn update_empty(self, value: JsValue) -> Self {
        if self.value.is_none() {
            Completion {
                value: Some(value),
                ..self
            }
        } else {
            self
        }
    }

    /// Records `meta` as the origin unless one is already set.
    pub fn at(self, meta: &Meta) -> Self {
        if self.is_abrupt() && self.location.is_none() {
            Completion {
                location: Some(*meta),
                ..self
            }
        } else {
            self
        }
    }
}

/// What every evaluation step returns. `Err` aborts the whole evaluation.
pub type EvalResult = Result<Completion, EngineError>;

/// An intermediate result that is either a plain Rust value or an abrupt completion to
/// propagate.
pub type ValueResult<T> = Result<Result<T, Completion>, EngineError>;

pub type ReferenceResult = ValueResult<Reference>;

pub enum ReferenceBase {
    /// A property reference on this value.
    Value(JsValue),
    Environment(JsLexEnvironmentType),
    Unresolvable,
}

/// The result of evaluating an identifier or a member expression.
pub struct Reference {
    pub base: ReferenceBase,
    pub referenced_name: PropertyKey,
    pub strict: bool,
    /// Set for `super` references only.
    pub this_value: Option<JsValue>,
}
impl Reference {
    pub fn is_property_reference(&self) -> bool {
        matches!(self.base, ReferenceBase::Value(_))
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }

    /// GetThisValue for property references.
    pub fn get_this_value(&self) -> JsValue {
        match (&self.this_value, &self.base) {
            (Some(v), _) => v.clone(),
            (None, ReferenceBase::Value(v)) => v.clone(),
            _ => JsValue::Undefined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_empty_fills_only_empty_values() {
        let c = Completion::break_completion(Some("outer".to_string()))
            .update_empty(JsValue::Number(1.0));
        assert_eq!(c.completion_type, CompletionType::Break);
        assert_eq!(c.target.as_deref(), Some("outer"));
        assert_eq!(c.value, Some(JsValue::Number(1.0)));

        let c = Completion::return_value(JsValue::Null).update_empty(JsValue::Number(1.0));
        assert_eq!(c.value, Some(JsValue::Null));
    }

    #[test]
    fn empty_is_distinct_from_undefined() {
        assert_eq!(Completion::normal().value, None);
        assert_eq!(
            Completion::normal_with_value(JsValue::Undefined).value,
            Some(JsValue::Undefined)
        );
        assert_eq!(Completion::normal().get_value(), JsValue::Undefined);
    }

    #[test]
    fn location_is_recorded_once_for_abrupt_completions() {
        let first = Meta {
            start_index: 1,
            end_index: 2,
        };
        let second = Meta {
            start_index: 5,
            end_index: 9,
        };
        let c = Completion::throw(JsValue::Null).at(&first).at(&second);
        assert_eq!(c.location, Some(first));
        assert_eq!(Completion::normal().at(&first).location, None);
    }
}
