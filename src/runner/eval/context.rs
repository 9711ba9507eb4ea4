use std::rc::Rc;

use tracing::warn;

use crate::runner::config::EngineConfig;
use crate::runner::ds::error::{EngineError, JErrorType};
use crate::runner::ds::execution_context::{ExecutionContext, ExecutionContextStack};
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::realm::JsCodeRealmType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::{Completion, EvalResult};
use crate::runner::module::ModuleLoader;
use crate::runner::std_lib::error::create_error_object;

/// Evaluation state threaded through every evaluation step.
pub struct EvalContext {
    pub ctx_stack: ExecutionContextStack,
    pub config: Rc<EngineConfig>,
    pub module_loader: Rc<dyn ModuleLoader>,
    steps: u64,
    call_depth: usize,
}

impl EvalContext {
    pub fn new(
        realm: &JsCodeRealmType,
        config: Rc<EngineConfig>,
        module_loader: Rc<dyn ModuleLoader>,
    ) -> Result<Self, JErrorType> {
        let root = ExecutionContext::new_for_realm(realm, config.strict_scripts)?;
        Ok(EvalContext {
            ctx_stack: ExecutionContextStack::new(root),
            config,
            module_loader,
            steps: 0,
            call_depth: 0,
        })
    }

    pub fn running(&self) -> &ExecutionContext {
        self.ctx_stack.get_running_execution_ctx()
    }

    pub fn current_realm(&self) -> JsCodeRealmType {
        self.running().realm.clone()
    }

    pub fn lex_env(&self) -> JsLexEnvironmentType {
        self.running().lex_env.clone()
    }

    pub fn var_env(&self) -> JsLexEnvironmentType {
        self.running().var_env.clone()
    }

    pub fn is_strict(&self) -> bool {
        self.running().strict
    }

    pub fn set_lex_env(&mut self, env: JsLexEnvironmentType) {
        self.ctx_stack.get_running_execution_ctx_mut().lex_env = env;
    }

    pub fn global_object(&self) -> Result<JsObjectType, JErrorType> {
        (*self.running().realm).borrow().get_global_object()
    }

    /// Runs `f` with `ec` as the running execution context. Whatever `f` returns, the stack
    /// is back to its previous depth afterwards.
    pub fn with_execution_context<R>(
        &mut self,
        ec: ExecutionContext,
        f: impl FnOnce(&mut EvalContext) -> R,
    ) -> R {
        let depth = self.ctx_stack.len();
        self.ctx_stack.push_execution_ctx(ec);
        let result = f(self);
        self.ctx_stack.truncate(depth);
        result
    }

    /// Runs `f` with `env` as the running lexical environment, then restores the previous one.
    pub fn with_lex_env<R>(
        &mut self,
        env: JsLexEnvironmentType,
        f: impl FnOnce(&mut EvalContext) -> R,
    ) -> R {
        let saved = self.lex_env();
        self.set_lex_env(env);
        let result = f(self);
        self.set_lex_env(saved);
        result
    }

    /// Counts one statement against the configured budget.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.steps += 1;
        match self.config.max_steps {
            Some(max) if self.steps > max => {
                warn!(max, "step budget exhausted");
                Err(EngineError::StepBudgetExhausted(max))
            }
            _ => Ok(()),
        }
    }

    pub fn reset_budget(&mut self) {
        self.steps = 0;
    }

    /// Runs a function call one level deeper, throwing a RangeError past `max_call_depth`.
    pub fn with_call_depth(
        &mut self,
        f: impl FnOnce(&mut EvalContext) -> EvalResult,
    ) -> EvalResult {
        if self.call_depth >= self.config.max_call_depth {
            return self.throw_error(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.call_depth -= 1;
        result
    }

    /// A throw completion holding a new error object of the current realm. Internal errors
    /// are not catchable and abort evaluation instead.
    pub fn throw_error(&mut self, err: JErrorType) -> EvalResult {
        let realm = self.current_realm();
        self.throw_error_in_realm(&realm, err)
    }

    pub fn throw_error_in_realm(
        &mut self,
        realm: &JsCodeRealmType,
        err: JErrorType,
    ) -> EvalResult {
        if let JErrorType::InternalError(m) = err {
            return Err(EngineError::Internal(m));
        }
        let error_object = create_error_object(realm, &err)?;
        Ok(Completion::throw(JsValue::Object(error_object)))
    }
}

/// Runs `f` with at least a red zone of native stack left, growing the stack onto the heap
/// when recursion has used it up. Call depth is then bounded by `max_call_depth` alone, not
/// by the size of the thread's stack.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    const RED_ZONE: usize = 256 * 1024;
    const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
