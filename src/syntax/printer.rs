//! Deterministic pretty-printer for the syntax tree.
//!
//! Output follows Allman-style braces. The printer is used for tests, trace
//! logging and by hosts that want a textual rendering of the linked program;
//! exact trivia preservation is a downstream concern.

use std::fmt::Write as _;

use super::annotations::Trivia;
use super::ast::{
    AccessorDecl, Block, Expr, ExprKind, Literal, MemberDecl, MemberKind, Modifiers, Parameter,
    Stmt, StmtKind, TypeDecl, UnaryOp,
};

/// Printing options
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Number of spaces per indentation level (or tab width if using tabs)
    pub tab_size: usize,
    /// Use spaces for indentation (false = use tabs)
    pub insert_spaces: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
        }
    }
}

impl PrintOptions {
    /// Generate indentation string for the given level
    pub fn indent(&self, level: usize) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size * level)
        } else {
            "\t".repeat(level)
        }
    }
}

pub fn print_type(decl: &TypeDecl, options: &PrintOptions) -> String {
    let mut printer = Printer::new(options);
    printer.type_decl(decl);
    printer.out
}

pub fn print_member(decl: &MemberDecl, options: &PrintOptions) -> String {
    let mut printer = Printer::new(options);
    printer.member(decl, 0);
    printer.out
}

pub fn print_block(block: &Block, options: &PrintOptions) -> String {
    let mut printer = Printer::new(options);
    printer.block(block, 0);
    printer.out
}

pub fn print_stmt(stmt: &Stmt, options: &PrintOptions) -> String {
    let mut printer = Printer::new(options);
    printer.stmt(stmt, 0);
    printer.out
}

pub fn print_expr(expr: &Expr) -> String {
    let options = PrintOptions::default();
    let mut printer = Printer::new(&options);
    printer.expr(expr, 0);
    printer.out
}

struct Printer<'a> {
    options: &'a PrintOptions,
    out: String,
}

impl<'a> Printer<'a> {
    fn new(options: &'a PrintOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    fn line(&mut self, level: usize, text: &str) {
        self.out.push_str(&self.options.indent(level));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn trivia(&mut self, trivia: &[Trivia], level: usize) {
        for item in trivia {
            match item {
                Trivia::Comment(text) => self.line(level, &format!("// {}", text)),
                Trivia::Suppression(code) => {
                    self.line(level, &format!("#pragma warning disable {}", code))
                }
            }
        }
    }

    // ========================================================================
    // DECLARATIONS
    // ========================================================================

    fn type_decl(&mut self, decl: &TypeDecl) {
        self.line(0, &format!("class {}", decl.name));
        self.line(0, "{");
        for (i, member) in decl.members.iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            self.member(member, 1);
        }
        self.line(0, "}");
    }

    fn member(&mut self, decl: &MemberDecl, level: usize) {
        self.trivia(&decl.trivia, level);
        let prefix = modifiers(&decl.modifiers);
        let name = match &decl.explicit_interface {
            Some(interface) => format!("{}.{}", interface, decl.name),
            None => decl.name.to_string(),
        };

        match &decl.kind {
            MemberKind::Method(method) => {
                let header = format!(
                    "{}{} {}({})",
                    prefix,
                    method.return_type.name,
                    name,
                    parameters(&method.params)
                );
                self.header_with_body(level, &header, method.body.as_ref());
            }
            MemberKind::Constructor(ctor) => {
                let header = format!("{}{}({})", prefix, name, parameters(&ctor.params));
                self.header_with_body(level, &header, ctor.body.as_ref());
            }
            MemberKind::Field(field) => {
                let mut text = format!("{}{} {}", prefix, field.ty.name, name);
                if let Some(init) = &field.initializer {
                    text.push_str(" = ");
                    text.push_str(&self.expr_text(init));
                }
                text.push(';');
                self.line(level, &text);
            }
            MemberKind::Property(property) => {
                let header = format!("{}{} {}", prefix, property.ty.name, name);
                if property.is_auto() {
                    let mut text = header;
                    text.push_str(" {");
                    for accessor in &property.accessors {
                        text.push(' ');
                        text.push_str(accessor.kind.keyword());
                        text.push(';');
                    }
                    text.push_str(" }");
                    if let Some(init) = &property.initializer {
                        text.push_str(" = ");
                        text.push_str(&self.expr_text(init));
                        text.push(';');
                    }
                    self.line(level, &text);
                } else {
                    self.line(level, &header);
                    self.accessor_list(&property.accessors, level);
                }
            }
            MemberKind::Event(event) => {
                let header = format!("{}event {} {}", prefix, event.ty.name, name);
                if event.is_field_like() {
                    let mut text = header;
                    if let Some(init) = &event.initializer {
                        text.push_str(" = ");
                        text.push_str(&self.expr_text(init));
                    }
                    text.push(';');
                    self.line(level, &text);
                } else {
                    self.line(level, &header);
                    self.accessor_list(&event.accessors, level);
                }
            }
        }
    }

    fn header_with_body(&mut self, level: usize, header: &str, body: Option<&Block>) {
        match body {
            Some(body) => {
                self.line(level, header);
                self.block(body, level);
            }
            None => self.line(level, &format!("{};", header)),
        }
    }

    fn accessor_list(&mut self, accessors: &[AccessorDecl], level: usize) {
        self.line(level, "{");
        for accessor in accessors {
            match &accessor.body {
                Some(body) => {
                    self.line(level + 1, accessor.kind.keyword());
                    self.block(body, level + 1);
                }
                None => self.line(level + 1, &format!("{};", accessor.kind.keyword())),
            }
        }
        self.line(level, "}");
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn block(&mut self, block: &Block, level: usize) {
        self.line(level, "{");
        for stmt in &block.statements {
            self.stmt(stmt, level + 1);
        }
        self.line(level, "}");
    }

    /// Print a statement nested under `if`/`while`: blocks stay at the
    /// parent level, anything else is indented once.
    fn embedded(&mut self, stmt: &Stmt, level: usize) {
        match &stmt.kind {
            StmtKind::Block(block) if stmt.trivia.is_empty() => self.block(block, level),
            _ => self.stmt(stmt, level + 1),
        }
    }

    fn stmt(&mut self, stmt: &Stmt, level: usize) {
        self.trivia(&stmt.trivia, level);
        match &stmt.kind {
            StmtKind::Block(block) => self.block(block, level),
            StmtKind::Expr(expr) => {
                let text = format!("{};", self.expr_text(expr));
                self.line(level, &text);
            }
            StmtKind::LocalDecl { ty, name, init } => {
                let ty = ty.as_ref().map_or("var", |ty| ty.name.as_str());
                let text = match init {
                    Some(init) => format!("{} {} = {};", ty, name, self.expr_text(init)),
                    None => format!("{} {};", ty, name),
                };
                self.line(level, &text);
            }
            StmtKind::Return(value) => {
                let text = match value {
                    Some(value) => format!("return {};", self.expr_text(value)),
                    None => "return;".to_string(),
                };
                self.line(level, &text);
            }
            StmtKind::Throw(value) => {
                let text = match value {
                    Some(value) => format!("throw {};", self.expr_text(value)),
                    None => "throw;".to_string(),
                };
                self.line(level, &text);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let text = format!("if ({})", self.expr_text(cond));
                self.line(level, &text);
                self.embedded(then_branch, level);
                if let Some(else_branch) = else_branch {
                    self.line(level, "else");
                    self.embedded(else_branch, level);
                }
            }
            StmtKind::While { cond, body } => {
                let text = format!("while ({})", self.expr_text(cond));
                self.line(level, &text);
                self.embedded(body, level);
            }
            StmtKind::Labeled { label, stmt } => {
                if stmt.is_empty() {
                    self.line(level, &format!("{}: ;", label));
                } else {
                    self.line(level, &format!("{}:", label));
                    self.stmt(stmt, level);
                }
            }
            StmtKind::Goto(label) => self.line(level, &format!("goto {};", label)),
            StmtKind::LocalFunction {
                name,
                params,
                return_type,
                body,
            } => {
                let header = format!("{} {}({})", return_type.name, name, parameters(params));
                self.line(level, &header);
                self.block(body, level);
            }
            StmtKind::Empty => {
                if stmt.trivia.is_empty() {
                    self.line(level, ";");
                }
            }
        }
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn expr_text(&self, expr: &Expr) -> String {
        let mut printer = Printer::new(self.options);
        printer.expr(expr, 0);
        printer.out
    }

    /// `parent_precedence` is the binding strength required by the context;
    /// binary expressions weaker than that get parenthesized.
    fn expr(&mut self, expr: &Expr, parent_precedence: u8) {
        match &expr.kind {
            ExprKind::Literal(literal) => match literal {
                Literal::Int(value) => {
                    let _ = write!(self.out, "{}", value);
                }
                Literal::Str(value) => {
                    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                    let _ = write!(self.out, "\"{}\"", escaped);
                }
                Literal::Bool(value) => {
                    let _ = write!(self.out, "{}", value);
                }
                Literal::Null => self.out.push_str("null"),
            },
            ExprKind::Default => self.out.push_str("default"),
            ExprKind::Ident(name) | ExprKind::TypeName(name) => self.out.push_str(name),
            ExprKind::This => self.out.push_str("this"),
            ExprKind::Base => self.out.push_str("base"),
            ExprKind::Member { target, name } => {
                self.expr(target, u8::MAX);
                self.out.push('.');
                self.out.push_str(name);
            }
            ExprKind::Invoke { callee, args } => {
                self.expr(callee, u8::MAX);
                self.out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(arg, 0);
                }
                self.out.push(')');
            }
            ExprKind::Assign { op, target, value } => {
                let wrap = parent_precedence > 0;
                if wrap {
                    self.out.push('(');
                }
                self.expr(target, 0);
                let _ = write!(self.out, " {} ", op.token());
                self.expr(value, 0);
                if wrap {
                    self.out.push(')');
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let precedence = op.precedence();
                let wrap = precedence < parent_precedence;
                if wrap {
                    self.out.push('(');
                }
                self.expr(lhs, precedence);
                let _ = write!(self.out, " {} ", op.token());
                self.expr(rhs, precedence + 1);
                if wrap {
                    self.out.push(')');
                }
            }
            ExprKind::Unary { op, operand } => {
                self.out.push(match op {
                    UnaryOp::Not => '!',
                    UnaryOp::Neg => '-',
                });
                self.expr(operand, u8::MAX);
            }
            ExprKind::Cast { ty, expr } => {
                let _ = write!(self.out, "({})", ty.name);
                self.expr(expr, u8::MAX);
            }
            ExprKind::Paren(inner) => {
                self.out.push('(');
                self.expr(inner, 0);
                self.out.push(')');
            }
            ExprKind::Lambda { params, body } => {
                let _ = write!(self.out, "({}) => ", params.join(", "));
                let nested = print_block(body, self.options);
                self.out.push_str(nested.trim_end());
            }
        }
    }
}

fn modifiers(modifiers: &Modifiers) -> String {
    let mut text = String::new();
    if let Some(visibility) = modifiers.visibility {
        text.push_str(visibility.keyword());
        text.push(' ');
    }
    if modifiers.is_static {
        text.push_str("static ");
    }
    if modifiers.is_abstract {
        text.push_str("abstract ");
    }
    if modifiers.is_virtual {
        text.push_str("virtual ");
    }
    if modifiers.is_override {
        text.push_str("override ");
    }
    text
}

fn parameters(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|p| format!("{} {}", p.ty.name, p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{BinaryOp, SyntaxFactory};

    #[test]
    fn test_print_block_with_if() {
        let f = SyntaxFactory::new();
        let block = f.block(vec![
            f.if_stmt(
                f.ident("c"),
                f.block_stmt(f.block(vec![f.ret(Some(f.int(1)))])),
                None,
            ),
            f.ret(Some(f.int(2))),
        ]);

        let expected = "\
{
    if (c)
    {
        return 1;
    }
    return 2;
}
";
        assert_eq!(print_block(&block, &PrintOptions::default()), expected);
    }

    #[test]
    fn test_binary_precedence_parenthesizes_weaker_child() {
        let f = SyntaxFactory::new();
        let sum = f.binary(BinaryOp::Add, f.ident("a"), f.ident("b"));
        let product = f.binary(BinaryOp::Mul, sum, f.int(2));
        assert_eq!(print_expr(&product), "(a + b) * 2");
    }

    #[test]
    fn test_labeled_empty_statement() {
        let f = SyntaxFactory::new();
        let stmt = f.labeled("done", f.empty());
        assert_eq!(print_stmt(&stmt, &PrintOptions::default()), "done: ;\n");
    }

    #[test]
    fn test_tabs_indentation() {
        let options = PrintOptions {
            tab_size: 4,
            insert_spaces: false,
        };
        assert_eq!(options.indent(2), "\t\t");
    }
}
