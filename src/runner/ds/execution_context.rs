use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::realm::JsCodeRealmType;

#[derive(Clone)]
pub struct ExecutionContext {
    /// The function being evaluated, `None` for scripts, modules and eval code.
    pub function: Option<JsObjectType>,
    pub realm: JsCodeRealmType,
    pub lex_env: JsLexEnvironmentType,
    pub var_env: JsLexEnvironmentType,
    pub strict: bool,
}
impl ExecutionContext {
    /// A context for top level code of `realm`, running in its global scope.
    pub fn new_for_realm(realm: &JsCodeRealmType, strict: bool) -> Result<Self, JErrorType> {
        let global_env = (**realm).borrow().get_global_env()?;
        Ok(ExecutionContext {
            function: None,
            realm: realm.clone(),
            lex_env: global_env.clone(),
            var_env: global_env,
            strict,
        })
    }
}

/// The execution context stack. `root` is the host's context and is never popped.
pub struct ExecutionContextStack {
    root: ExecutionContext,
    stack: Vec<ExecutionContext>,
}
impl ExecutionContextStack {
    pub fn new(root: ExecutionContext) -> Self {
        ExecutionContextStack {
            root,
            stack: Vec::new(),
        }
    }

    pub fn get_running_execution_ctx(&self) -> &ExecutionContext {
        self.stack.last().unwrap_or(&self.root)
    }

    pub fn get_running_execution_ctx_mut(&mut self) -> &mut ExecutionContext {
        match self.stack.last_mut() {
            Some(ctx) => ctx,
            None => &mut self.root,
        }
    }

    pub fn push_execution_ctx(&mut self, ctx: ExecutionContext) {
        self.stack.push(ctx)
    }

    /// Number of contexts pushed above the root.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Pops contexts until `len` remain above the root.
    pub fn truncate(&mut self, len: usize) {
        self.stack.truncate(len)
    }
}
