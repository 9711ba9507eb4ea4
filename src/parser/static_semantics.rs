use std::collections::HashSet;
use std::rc::Rc;

use super::api::ParseError;
use super::ast::*;
use super::util::{DEFAULT_EXPORT_BINDING, STRICT_RESERVED_WORDS};

/// A `let`, `const` or block level function binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalBinding {
    pub name: String,
    pub is_constant: bool,
}

/// A function declaration hoisted into the enclosing var scope.
#[derive(Debug, Clone)]
pub struct HoistedFunction {
    pub binding_name: String,
    pub data: Rc<FunctionData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportEntry {
    pub export_name: String,
    pub local_name: String,
}

/// Names declared with `var` anywhere in `body`, not descending into nested functions.
pub fn var_declared_names(body: &[StatementType]) -> Vec<String> {
    let mut names = vec![];
    for stmt in body {
        collect_var_names(stmt, &mut names);
    }
    names
}

fn collect_var_names(stmt: &StatementType, names: &mut Vec<String>) {
    match stmt {
        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(decl)) => {
            collect_var_declaration(decl, names)
        }
        StatementType::BlockStatement(block) => {
            for s in &block.body {
                collect_var_names(s, names);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names(consequent, names);
            if let Some(alternate) = alternate {
                collect_var_names(alternate, names);
            }
        }
        StatementType::WhileStatement { body, .. }
        | StatementType::DoWhileStatement { body, .. }
        | StatementType::WithStatement { body, .. }
        | StatementType::LabeledStatement { body, .. } => collect_var_names(body, names),
        StatementType::ForStatement { init, body, .. } => {
            if let Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) = init {
                collect_var_declaration(decl, names);
            }
            collect_var_names(body, names);
        }
        StatementType::SwitchStatement { cases, .. } => {
            for case in cases {
                for s in &case.consequent {
                    collect_var_names(s, names);
                }
            }
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            for s in &block.body {
                collect_var_names(s, names);
            }
            if let Some(handler) = handler {
                for s in &handler.body.body {
                    collect_var_names(s, names);
                }
            }
            if let Some(finalizer) = finalizer {
                for s in &finalizer.body {
                    collect_var_names(s, names);
                }
            }
        }
        StatementType::ExportStatement {
            export: ExportKind::Declaration(DeclarationType::VariableDeclaration(decl)),
            ..
        } => collect_var_declaration(decl, names),
        _ => {}
    }
}

fn collect_var_declaration(decl: &VariableDeclarationData, names: &mut Vec<String>) {
    if decl.kind == VariableDeclarationKind::Var {
        for d in &decl.declarations {
            names.push(d.id.name.to_string());
        }
    }
}

/// Function declarations at the top level of a script, module or function body.
pub fn var_scoped_function_declarations(body: &[StatementType]) -> Vec<HoistedFunction> {
    let mut functions = vec![];
    for stmt in body {
        let mut stmt = stmt;
        while let StatementType::LabeledStatement { body, .. } = stmt {
            stmt = body;
        }
        match stmt {
            StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f))
            | StatementType::ExportStatement {
                export: ExportKind::Declaration(DeclarationType::FunctionDeclaration(f)),
                ..
            } => functions.push(HoistedFunction {
                binding_name: f.name().to_string(),
                data: f.clone(),
            }),
            StatementType::ExportStatement {
                export: ExportKind::DefaultFunction(f),
                ..
            } => functions.push(HoistedFunction {
                binding_name: match &f.id {
                    Some(id) => id.name.to_string(),
                    None => DEFAULT_EXPORT_BINDING.to_string(),
                },
                data: f.clone(),
            }),
            _ => {}
        }
    }
    functions
}

/// `let` and `const` bindings of a statement list. Inside blocks, function
/// declarations are lexical too.
pub fn lexically_scoped_declarations(
    body: &[StatementType],
    top_level: bool,
) -> Vec<LexicalBinding> {
    let mut bindings = vec![];
    for stmt in body {
        match stmt {
            StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(decl))
            | StatementType::ExportStatement {
                export: ExportKind::Declaration(DeclarationType::VariableDeclaration(decl)),
                ..
            } => {
                if decl.kind != VariableDeclarationKind::Var {
                    for d in &decl.declarations {
                        bindings.push(LexicalBinding {
                            name: d.id.name.to_string(),
                            is_constant: decl.kind == VariableDeclarationKind::Const,
                        });
                    }
                }
            }
            StatementType::ExportStatement {
                export: ExportKind::DefaultExpression(_),
                ..
            } => bindings.push(LexicalBinding {
                name: DEFAULT_EXPORT_BINDING.to_string(),
                is_constant: true,
            }),
            StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f))
                if !top_level =>
            {
                bindings.push(LexicalBinding {
                    name: f.name().to_string(),
                    is_constant: false,
                })
            }
            _ => {}
        }
    }
    bindings
}

/// Function declarations directly inside a block or case list.
pub fn block_function_declarations(body: &[StatementType]) -> Vec<Rc<FunctionData>> {
    body.iter()
        .filter_map(|stmt| match stmt {
            StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => {
                Some(f.clone())
            }
            _ => None,
        })
        .collect()
}

pub fn export_entries(body: &[StatementType]) -> Vec<ExportEntry> {
    let mut entries = vec![];
    for stmt in body {
        if let StatementType::ExportStatement { export, .. } = stmt {
            match export {
                ExportKind::Declaration(DeclarationType::VariableDeclaration(decl)) => {
                    for d in &decl.declarations {
                        entries.push(ExportEntry {
                            export_name: d.id.name.to_string(),
                            local_name: d.id.name.to_string(),
                        });
                    }
                }
                ExportKind::Declaration(DeclarationType::FunctionDeclaration(f)) => {
                    entries.push(ExportEntry {
                        export_name: f.name().to_string(),
                        local_name: f.name().to_string(),
                    })
                }
                ExportKind::DefaultFunction(f) => entries.push(ExportEntry {
                    export_name: "default".to_string(),
                    local_name: match &f.id {
                        Some(id) => id.name.to_string(),
                        None => DEFAULT_EXPORT_BINDING.to_string(),
                    },
                }),
                ExportKind::DefaultExpression(_) => entries.push(ExportEntry {
                    export_name: "default".to_string(),
                    local_name: DEFAULT_EXPORT_BINDING.to_string(),
                }),
                ExportKind::Named(specifiers) => {
                    for s in specifiers {
                        entries.push(ExportEntry {
                            export_name: s.exported.name.to_string(),
                            local_name: s.local.name.to_string(),
                        });
                    }
                }
            }
        }
    }
    entries
}

/// Runs the early error checks over a freshly built program.
pub(crate) fn check_early_errors(program: &ProgramData, source: &str) -> Result<(), ParseError> {
    let mut checker = EarlyErrorChecker {
        source,
        strict: program.strict,
        in_function: false,
        labels: vec![],
        breakable_depth: 0,
        iteration_depth: 0,
    };
    checker.check_scope(&program.body, true, &[], &program.meta)?;
    if program.source_type == SourceType::Module {
        checker.check_exports(&program.body)?;
    }
    checker.check_statements(&program.body)
}

struct Label {
    name: String,
    is_iteration: bool,
}

struct EarlyErrorChecker<'a> {
    source: &'a str,
    strict: bool,
    in_function: bool,
    labels: Vec<Label>,
    breakable_depth: usize,
    iteration_depth: usize,
}

impl<'a> EarlyErrorChecker<'a> {
    fn error(&self, meta: &Meta, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, meta.start_index, message)
    }

    /// Lexical names of a scope must be unique and must not clash with its var names or
    /// with the parameters of the function the scope belongs to.
    fn check_scope(
        &self,
        body: &[StatementType],
        top_level: bool,
        params: &[IdentifierData],
        meta: &Meta,
    ) -> Result<(), ParseError> {
        let lexical = lexically_scoped_declarations(body, top_level);
        let mut seen = HashSet::new();
        for binding in &lexical {
            if !seen.insert(binding.name.as_str()) {
                return Err(self.error(
                    meta,
                    format!("Identifier '{}' has already been declared", binding.name),
                ));
            }
        }
        let mut var_names = var_declared_names(body);
        if top_level {
            var_names.extend(
                var_scoped_function_declarations(body)
                    .into_iter()
                    .map(|f| f.binding_name),
            );
        }
        for name in var_names.iter().chain(params.iter().map(|p| &p.name)) {
            if seen.contains(name.as_str()) {
                return Err(self.error(
                    meta,
                    format!("Identifier '{}' has already been declared", name),
                ));
            }
        }
        Ok(())
    }

    fn check_exports(&self, body: &[StatementType]) -> Result<(), ParseError> {
        let mut declared: HashSet<String> = var_declared_names(body).into_iter().collect();
        declared.extend(
            var_scoped_function_declarations(body)
                .into_iter()
                .map(|f| f.binding_name),
        );
        declared.extend(
            lexically_scoped_declarations(body, true)
                .into_iter()
                .map(|b| b.name),
        );
        let mut exported = HashSet::new();
        for entry in export_entries(body) {
            if !exported.insert(entry.export_name.to_string()) {
                return Err(ParseError::new(
                    format!("Duplicate export of '{}'", entry.export_name),
                    1,
                    1,
                ));
            }
            if !declared.contains(&entry.local_name) {
                return Err(ParseError::new(
                    format!("Export '{}' is not defined in module", entry.local_name),
                    1,
                    1,
                ));
            }
        }
        Ok(())
    }

    fn check_statements(&mut self, body: &[StatementType]) -> Result<(), ParseError> {
        for stmt in body {
            self.check_statement(stmt)?;
        }
        Ok(())
    }

    fn check_block(&mut self, block: &BlockStatementData) -> Result<(), ParseError> {
        self.check_scope(&block.body, false, &[], &block.meta)?;
        self.check_statements(&block.body)
    }

    fn check_statement(&mut self, stmt: &StatementType) -> Result<(), ParseError> {
        match stmt {
            StatementType::ExpressionStatement { expression, .. } => {
                self.check_expression(expression)
            }
            StatementType::BlockStatement(block) => self.check_block(block),
            StatementType::EmptyStatement { .. } | StatementType::DebuggerStatement { .. } => {
                Ok(())
            }
            StatementType::DeclarationStatement(decl) => self.check_declaration(decl),
            StatementType::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.check_expression(test)?;
                self.check_statement(consequent)?;
                if let Some(alternate) = alternate {
                    self.check_statement(alternate)?;
                }
                Ok(())
            }
            StatementType::WhileStatement { test, body, .. }
            | StatementType::DoWhileStatement { test, body, .. } => {
                self.check_expression(test)?;
                self.check_loop_body(body)
            }
            StatementType::ForStatement {
                meta,
                init,
                test,
                update,
                body,
            } => {
                match init {
                    Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) => {
                        if decl.kind != VariableDeclarationKind::Var {
                            let lexical = var_names_of(decl);
                            for name in var_declared_names(std::slice::from_ref(body.as_ref())) {
                                if lexical.contains(&name) {
                                    return Err(self.error(
                                        meta,
                                        format!("Identifier '{}' has already been declared", name),
                                    ));
                                }
                            }
                        }
                        self.check_variable_declaration(decl)?;
                    }
                    Some(VariableDeclarationOrExpression::Expression(e)) => {
                        self.check_expression(e)?
                    }
                    None => {}
                }
                if let Some(test) = test {
                    self.check_expression(test)?;
                }
                if let Some(update) = update {
                    self.check_expression(update)?;
                }
                self.check_loop_body(body)
            }
            StatementType::SwitchStatement {
                meta,
                discriminant,
                cases,
            } => {
                self.check_expression(discriminant)?;
                let all: Vec<&StatementType> =
                    cases.iter().flat_map(|c| c.consequent.iter()).collect();
                let mut seen = HashSet::new();
                for case in cases {
                    for binding in lexically_scoped_declarations(&case.consequent, false) {
                        if !seen.insert(binding.name.to_string()) {
                            return Err(self.error(
                                meta,
                                format!("Identifier '{}' has already been declared", binding.name),
                            ));
                        }
                    }
                }
                for case in cases {
                    for name in var_declared_names(&case.consequent) {
                        if seen.contains(&name) {
                            return Err(self.error(
                                meta,
                                format!("Identifier '{}' has already been declared", name),
                            ));
                        }
                    }
                }
                self.breakable_depth += 1;
                let mut result = Ok(());
                for case in cases {
                    if let Some(test) = &case.test {
                        result = result.and_then(|_| self.check_expression(test));
                    }
                }
                for stmt in all {
                    if result.is_err() {
                        break;
                    }
                    result = self.check_statement(stmt);
                }
                self.breakable_depth -= 1;
                result
            }
            StatementType::BreakStatement { meta, label } => match label {
                Some(label) => {
                    if self.labels.iter().any(|l| l.name == label.name) {
                        Ok(())
                    } else {
                        Err(self.error(meta, format!("Undefined label '{}'", label.name)))
                    }
                }
                None if self.breakable_depth > 0 => Ok(()),
                None => Err(self.error(meta, "Illegal break statement")),
            },
            StatementType::ContinueStatement { meta, label } => {
                if self.iteration_depth == 0 {
                    return Err(self.error(meta, "Illegal continue statement"));
                }
                match label {
                    Some(label) => match self.labels.iter().rev().find(|l| l.name == label.name) {
                        Some(l) if l.is_iteration => Ok(()),
                        Some(_) => Err(self.error(
                            meta,
                            format!(
                                "Illegal continue statement: '{}' does not denote an iteration \
                                 statement",
                                label.name
                            ),
                        )),
                        None => Err(self.error(meta, format!("Undefined label '{}'", label.name))),
                    },
                    None => Ok(()),
                }
            }
            StatementType::ReturnStatement { meta, argument } => {
                if !self.in_function {
                    return Err(self.error(meta, "Illegal return statement"));
                }
                match argument {
                    Some(argument) => self.check_expression(argument),
                    None => Ok(()),
                }
            }
            StatementType::ThrowStatement { argument, .. } => self.check_expression(argument),
            StatementType::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                self.check_block(block)?;
                if let Some(handler) = handler {
                    if let Some(param) = &handler.param {
                        self.check_binding_identifier(param)?;
                        let clashes = lexically_scoped_declarations(&handler.body.body, false)
                            .iter()
                            .any(|b| b.name == param.name);
                        if clashes {
                            return Err(self.error(
                                &handler.meta,
                                format!("Identifier '{}' has already been declared", param.name),
                            ));
                        }
                    }
                    self.check_block(&handler.body)?;
                }
                if let Some(finalizer) = finalizer {
                    self.check_block(finalizer)?;
                }
                Ok(())
            }
            StatementType::LabeledStatement { meta, label, body } => {
                if self.labels.iter().any(|l| l.name == label.name) {
                    return Err(self.error(
                        meta,
                        format!("Label '{}' has already been declared", label.name),
                    ));
                }
                let mut target = body.as_ref();
                while let StatementType::LabeledStatement { body, .. } = target {
                    target = body;
                }
                let is_iteration = matches!(
                    target,
                    StatementType::WhileStatement { .. }
                        | StatementType::DoWhileStatement { .. }
                        | StatementType::ForStatement { .. }
                );
                self.labels.push(Label {
                    name: label.name.to_string(),
                    is_iteration,
                });
                let result = self.check_statement(body);
                self.labels.pop();
                result
            }
            StatementType::WithStatement { meta, object, body } => {
                if self.strict {
                    return Err(
                        self.error(meta, "Strict mode code may not include a with statement")
                    );
                }
                self.check_expression(object)?;
                self.check_statement(body)
            }
            StatementType::ExportStatement { export, .. } => match export {
                ExportKind::Declaration(decl) => self.check_declaration(decl),
                ExportKind::DefaultFunction(f) => self.check_function(f),
                ExportKind::DefaultExpression(e) => self.check_expression(e),
                ExportKind::Named(_) => Ok(()),
            },
        }
    }

    fn check_loop_body(&mut self, body: &StatementType) -> Result<(), ParseError> {
        self.breakable_depth += 1;
        self.iteration_depth += 1;
        let result = self.check_statement(body);
        self.breakable_depth -= 1;
        self.iteration_depth -= 1;
        result
    }

    fn check_declaration(&mut self, decl: &DeclarationType) -> Result<(), ParseError> {
        match decl {
            DeclarationType::VariableDeclaration(decl) => self.check_variable_declaration(decl),
            DeclarationType::FunctionDeclaration(f) => self.check_function(f),
        }
    }

    fn check_variable_declaration(
        &mut self,
        decl: &VariableDeclarationData,
    ) -> Result<(), ParseError> {
        for d in &decl.declarations {
            self.check_binding_identifier(&d.id)?;
            if decl.kind != VariableDeclarationKind::Var && d.id.name == "let" {
                return Err(self.error(&d.meta, "let is disallowed as a lexically bound name"));
            }
            if let Some(init) = &d.init {
                self.check_expression(init)?;
            }
        }
        Ok(())
    }

    fn check_binding_identifier(&self, id: &IdentifierData) -> Result<(), ParseError> {
        if self.strict && STRICT_RESERVED_WORDS.contains(id.name.as_str()) {
            return Err(self.error(
                &id.meta,
                format!(
                    "Unexpected eval or arguments or reserved word '{}' in strict mode",
                    id.name
                ),
            ));
        }
        Ok(())
    }

    fn check_function(&mut self, f: &FunctionData) -> Result<(), ParseError> {
        let outer_strict = self.strict;
        let strict = outer_strict || f.has_use_strict;
        if let Some(id) = &f.id {
            if strict && STRICT_RESERVED_WORDS.contains(id.name.as_str()) {
                return Err(self.error(
                    &id.meta,
                    format!(
                        "Unexpected eval or arguments or reserved word '{}' in strict mode",
                        id.name
                    ),
                ));
            }
        }
        if strict || f.is_arrow || f.is_method {
            let mut seen = HashSet::new();
            for p in &f.params {
                if !seen.insert(p.name.as_str()) {
                    return Err(self.error(
                        &p.meta,
                        "Duplicate parameter name not allowed in this context",
                    ));
                }
            }
        }
        let saved_labels = std::mem::take(&mut self.labels);
        let saved = (
            self.in_function,
            self.breakable_depth,
            self.iteration_depth,
        );
        self.strict = strict;
        self.in_function = true;
        self.breakable_depth = 0;
        self.iteration_depth = 0;
        let result = self.check_function_body(f);
        self.strict = outer_strict;
        self.labels = saved_labels;
        self.in_function = saved.0;
        self.breakable_depth = saved.1;
        self.iteration_depth = saved.2;
        result
    }

    fn check_function_body(&mut self, f: &FunctionData) -> Result<(), ParseError> {
        for p in &f.params {
            self.check_binding_identifier(p)?;
        }
        self.check_scope(&f.body.body, true, &f.params, &f.body.meta)?;
        self.check_statements(&f.body.body)
    }

    fn check_expression(&mut self, expr: &ExpressionType) -> Result<(), ParseError> {
        match expr {
            ExpressionType::Literal(_)
            | ExpressionType::Identifier(_)
            | ExpressionType::ThisExpression { .. } => Ok(()),
            ExpressionType::ObjectExpression { properties, .. } => {
                for p in properties {
                    if let PropertyNameType::Computed(key) = &p.key {
                        self.check_expression(key)?;
                    }
                    self.check_expression(&p.value)?;
                }
                Ok(())
            }
            ExpressionType::FunctionExpression(f) | ExpressionType::ArrowFunctionExpression(f) => {
                self.check_function(f)
            }
            ExpressionType::UnaryExpression {
                meta,
                operator,
                argument,
            } => {
                if self.strict
                    && *operator == UnaryOperator::Delete
                    && matches!(**argument, ExpressionType::Identifier(_))
                {
                    return Err(self.error(
                        meta,
                        "Delete of an unqualified identifier in strict mode.",
                    ));
                }
                self.check_expression(argument)
            }
            ExpressionType::UpdateExpression { argument, .. } => {
                self.check_assignment_target(argument)?;
                self.check_expression(argument)
            }
            ExpressionType::AssignmentExpression { left, right, .. } => {
                self.check_assignment_target(left)?;
                self.check_expression(left)?;
                self.check_expression(right)
            }
            ExpressionType::BinaryExpression { left, right, .. }
            | ExpressionType::LogicalExpression { left, right, .. } => {
                self.check_expression(left)?;
                self.check_expression(right)
            }
            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.check_expression(test)?;
                self.check_expression(consequent)?;
                self.check_expression(alternate)
            }
            ExpressionType::CallExpression {
                callee, arguments, ..
            }
            | ExpressionType::NewExpression {
                callee, arguments, ..
            } => {
                self.check_expression(callee)?;
                for a in arguments {
                    self.check_expression(a)?;
                }
                Ok(())
            }
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                ..
            }) => self.check_expression(object),
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                object,
                property,
                ..
            }) => {
                self.check_expression(object)?;
                self.check_expression(property)
            }
            ExpressionType::SequenceExpression { expressions, .. } => {
                for e in expressions {
                    self.check_expression(e)?;
                }
                Ok(())
            }
        }
    }

    fn check_assignment_target(&self, target: &ExpressionType) -> Result<(), ParseError> {
        if let ExpressionType::Identifier(id) = target {
            if self.strict && (id.name == "eval" || id.name == "arguments") {
                return Err(self.error(
                    &id.meta,
                    "Unexpected eval or arguments in strict mode",
                ));
            }
        }
        Ok(())
    }
}

fn var_names_of(decl: &VariableDeclarationData) -> Vec<String> {
    decl.declarations
        .iter()
        .map(|d| d.id.name.to_string())
        .collect()
}
