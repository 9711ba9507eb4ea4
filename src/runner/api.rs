//! Host facing entry points.
//!
//! ```
//! use realmjs::runner::api::{JsEngine, ShadowRealmHandle};
//! use realmjs::runner::ds::value::JsValue;
//!
//! let mut engine = JsEngine::new().unwrap();
//! assert_eq!(engine.evaluate_script("1 + 2").unwrap(), JsValue::Number(3.0));
//!
//! let shadow = engine.create_shadow_realm().unwrap();
//! let v = shadow.evaluate(&mut engine, "globalThis.x = 40; x + 2").unwrap();
//! assert_eq!(v, JsValue::Number(42.0));
//! assert_eq!(engine.get_global("x"), None);
//! ```

use std::rc::Rc;

use thiserror::Error;

use crate::parser::{JsParser, ParseError};
use crate::runner::config::EngineConfig;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{call, construct, get, has_property};
use crate::runner::ds::realm::{
    get_intrinsic, initialize_host_defined_realm, JsCodeRealmType, WellKnownIntrinsics,
};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::script::script_evaluation;
use crate::runner::eval::types::{Completion, EvalResult};
use crate::runner::module::ModuleLoader;
use crate::runner::std_lib::error::describe_thrown_value;

/// Why a host call did not produce a value.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Uncaught SyntaxError: {0}")]
    Syntax(ParseError),
    /// The script threw and nothing caught it.
    #[error("Uncaught {}", describe(.name, .message))]
    Thrown {
        name: String,
        message: String,
        value: JsValue,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn describe(name: &str, message: &str) -> String {
    match (name.is_empty(), message.is_empty()) {
        (true, _) => message.to_string(),
        (false, true) => name.to_string(),
        (false, false) => format!("{}: {}", name, message),
    }
}

impl ScriptError {
    /// Name of the thrown error, if the failure was a throw.
    pub fn error_name(&self) -> Option<&str> {
        match self {
            ScriptError::Thrown { name, .. } => Some(name),
            ScriptError::Syntax(_) => Some("SyntaxError"),
            ScriptError::Engine(_) => None,
        }
    }
}

fn into_value(result: EvalResult) -> Result<JsValue, ScriptError> {
    let completion: Completion = result?;
    if completion.is_throw() {
        let value = completion.get_value();
        let (name, message) = describe_thrown_value(&value);
        return Err(ScriptError::Thrown {
            name,
            message,
            value,
        });
    }
    Ok(completion.get_value())
}

/// An engine with one main realm. Scripts evaluated through it share that realm's globals.
pub struct JsEngine {
    ctx: EvalContext,
    realm: JsCodeRealmType,
}

impl JsEngine {
    pub fn new() -> Result<Self, EngineError> {
        JsEngine::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let realm = initialize_host_defined_realm()?;
        let loader = config.module_loader();
        let ctx = EvalContext::new(&realm, Rc::new(config), loader)?;
        Ok(JsEngine { ctx, realm })
    }

    pub fn set_module_loader(&mut self, loader: Rc<dyn ModuleLoader>) {
        self.ctx.module_loader = loader;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    pub fn realm(&self) -> &JsCodeRealmType {
        &self.realm
    }

    /// Parses and runs `source` as a classic script in the main realm. The result is the
    /// script's completion value.
    pub fn evaluate_script(&mut self, source: &str) -> Result<JsValue, ScriptError> {
        let program = JsParser::parse_script(source).map_err(ScriptError::Syntax)?;
        self.ctx.reset_budget();
        let realm = self.realm.clone();
        into_value(script_evaluation(&mut self.ctx, &program, &realm))
    }

    /// Calls `f` with the given `this` and arguments.
    pub fn call_function(
        &mut self,
        f: &JsValue,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, ScriptError> {
        self.ctx.reset_budget();
        into_value(call(&mut self.ctx, f, this, args))
    }

    /// Own or inherited property `name` of the global object, `None` when absent.
    pub fn get_global(&self, name: &str) -> Option<JsValue> {
        let global = (*self.realm).borrow().get_global_object().ok()?;
        let key = PropertyKey::from(name);
        if has_property(&global, &key) {
            Some(get(&global, &key))
        } else {
            None
        }
    }

    pub fn create_shadow_realm(&mut self) -> Result<ShadowRealmHandle, ScriptError> {
        ShadowRealmHandle::create(self)
    }
}

/// A `ShadowRealm` object of an engine's main realm, driven from Rust. Every call goes
/// through the object's own `evaluate`/`importValue`, so values come back marshaled
/// exactly as a script would see them.
#[derive(Clone)]
pub struct ShadowRealmHandle {
    object: JsObjectType,
}

impl ShadowRealmHandle {
    pub fn create(engine: &mut JsEngine) -> Result<Self, ScriptError> {
        let ctor = get_intrinsic(&engine.realm, WellKnownIntrinsics::ShadowRealm)
            .map_err(EngineError::from)?;
        let value = into_value(construct(
            &mut engine.ctx,
            &JsValue::Object(ctor),
            vec![],
            None,
        ))?;
        match value {
            JsValue::Object(object) => Ok(ShadowRealmHandle { object }),
            _ => Err(EngineError::Internal("ShadowRealm did not construct an object".to_string())
                .into()),
        }
    }

    fn invoke(
        &self,
        engine: &mut JsEngine,
        method: &str,
        args: Vec<JsValue>,
    ) -> Result<JsValue, ScriptError> {
        let f = get(&self.object, &PropertyKey::from(method));
        engine.call_function(&f, self.as_value(), args)
    }

    /// `shadowRealm.evaluate(source)`. Passing anything but a string throws a TypeError,
    /// as it would for a script.
    pub fn evaluate(
        &self,
        engine: &mut JsEngine,
        source: impl Into<JsValue>,
    ) -> Result<JsValue, ScriptError> {
        self.invoke(engine, "evaluate", vec![source.into()])
    }

    /// `shadowRealm.importValue(specifier, exportName)`.
    pub fn import_value(
        &self,
        engine: &mut JsEngine,
        specifier: impl Into<JsValue>,
        export_name: impl Into<JsValue>,
    ) -> Result<JsValue, ScriptError> {
        self.invoke(
            engine,
            "importValue",
            vec![specifier.into(), export_name.into()],
        )
    }

    pub fn as_value(&self) -> JsValue {
        JsValue::Object(self.object.clone())
    }
}
