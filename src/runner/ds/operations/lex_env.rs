use tracing::trace;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::env_record::EnvironmentRecordType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::{Reference, ReferenceBase};

/// GetIdentifierReference: walks the chain innermost first. Running off the end yields an
/// unresolvable reference.
pub fn get_identifier_reference(
    env: Option<JsLexEnvironmentType>,
    name: &str,
    strict: bool,
) -> Reference {
    let mut current = env;
    while let Some(e) = current {
        if (*e).borrow().inner.as_env_record().has_binding(name) {
            return Reference {
                base: ReferenceBase::Environment(e),
                referenced_name: PropertyKey::from(name),
                strict,
                this_value: None,
            };
        }
        current = (*e).borrow().outer.clone();
    }
    trace!(name, "unresolvable reference");
    Reference {
        base: ReferenceBase::Unresolvable,
        referenced_name: PropertyKey::from(name),
        strict,
        this_value: None,
    }
}

/// GetThisEnvironment: the nearest scope that binds `this`.
pub fn get_this_environment(env: &JsLexEnvironmentType) -> JsLexEnvironmentType {
    let mut current = env.clone();
    loop {
        let outer = {
            let e = (*current).borrow();
            if e.inner.as_env_record().has_this_binding() {
                None
            } else {
                e.outer.clone()
            }
        };
        match outer {
            Some(o) => current = o,
            None => return current,
        }
    }
}

/// ResolveThisBinding starting from `env`.
pub fn resolve_this_binding(env: &JsLexEnvironmentType) -> Result<JsValue, JErrorType> {
    let this_env = get_this_environment(env);
    let this_env = (*this_env).borrow();
    let this_value = match this_env.inner.as_ref() {
        EnvironmentRecordType::Function(f) => f.get_this_binding(),
        EnvironmentRecordType::Global(g) => Ok(JsValue::Object(g.get_this_binding())),
        _ => Err(JErrorType::InternalError(
            "Scope chain has no this binding".to_string(),
        )),
    };
    this_value
}
