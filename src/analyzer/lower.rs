use swc_common::{Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::parser::{ConstructId, ConstructKind, LineIndex, SourceSpan, SyntaxTree};

/// Kind plus captured operands of a construct about to be opened
struct Head {
    kind: ConstructKind,
    names: Vec<String>,
    literals: Vec<String>,
}

impl Head {
    fn new(kind: ConstructKind) -> Self {
        Self { kind, names: Vec::new(), literals: Vec::new() }
    }

    fn names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    fn literal(mut self, literal: Option<String>) -> Self {
        self.literals.extend(literal);
        self
    }
}

struct TreeBuilder<'a> {
    source: &'a str,
    lines: &'a LineIndex,
    base: u32,
    tree: SyntaxTree,
    stack: Vec<ConstructId>,
}

impl TreeBuilder<'_> {
    fn span(&self, span: Span) -> Option<SourceSpan> {
        if span.is_dummy() {
            return None;
        }
        let lo = span.lo.0.saturating_sub(self.base) as usize;
        let hi = span.hi.0.saturating_sub(self.base) as usize;
        Some(self.lines.span(self.source, lo, hi))
    }

    /// Record `head`, then lower the node's children beneath it
    fn enter<N: VisitWith<Self>>(&mut self, head: Head, span: Span, node: &N) {
        let span = self.span(span);
        let id = self.tree.push(self.stack.last().copied(), head.kind, head.names, head.literals, span);
        self.stack.push(id);
        node.visit_children_with(self);
        self.stack.pop();
    }
}

fn sym(ident: &Ident) -> String {
    ident.sym.to_string()
}

fn member_names(member: &MemberExpr) -> Vec<String> {
    let prop = match &member.prop {
        MemberProp::Ident(ident) => ident.sym.to_string(),
        _ => return Vec::new(),
    };
    let object = match &*member.obj {
        Expr::Ident(ident) => Some(sym(ident)),
        Expr::This(_) => Some("this".to_string()),
        Expr::Member(inner) => member_names(inner).into_iter().next(),
        _ => None,
    };
    match object {
        Some(object) => vec![prop.clone(), format!("{object} {prop}")],
        None => vec![prop],
    }
}

/// Names a simple expression refers to: `x`, `a.b`, `this`, `f()`
fn expr_names(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Ident(ident) => vec![sym(ident)],
        Expr::Member(member) => member_names(member),
        Expr::This(_) => vec!["this".to_string()],
        Expr::Paren(paren) => expr_names(&paren.expr),
        Expr::Call(call) => callee_names(&call.callee),
        _ => Vec::new(),
    }
}

fn callee_names(callee: &Callee) -> Vec<String> {
    match callee {
        Callee::Expr(expr) => expr_names(expr),
        Callee::Super(_) => vec!["super".to_string()],
        Callee::Import(_) => vec!["import".to_string()],
    }
}

fn pat_names(pat: &Pat) -> Vec<String> {
    match pat {
        Pat::Ident(binding) => vec![sym(&binding.id)],
        Pat::Assign(assign) => pat_names(&assign.left),
        _ => Vec::new(),
    }
}

fn assign_target_names(target: &AssignTarget) -> Vec<String> {
    match target {
        AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => vec![sym(&binding.id)],
        AssignTarget::Simple(SimpleAssignTarget::Member(member)) => member_names(member),
        _ => Vec::new(),
    }
}

fn prop_name(key: &PropName) -> Vec<String> {
    match key {
        PropName::Ident(ident) => vec![ident.sym.to_string()],
        PropName::Str(s) => s.value.as_str().map(|s| vec![s.to_string()]).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Source text of a simple literal operand
fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Num(num)) => Some(
            num.raw
                .as_ref()
                .map(|raw| raw.to_string())
                .unwrap_or_else(|| num.value.to_string()),
        ),
        Expr::Lit(Lit::Str(s)) => s.value.as_str().map(str::to_string),
        Expr::Lit(Lit::Bool(b)) => Some(b.value.to_string()),
        Expr::Lit(Lit::Null(_)) => Some("null".to_string()),
        Expr::Unary(UnaryExpr { op: UnaryOp::Minus, arg, .. }) => {
            literal_text(arg).map(|value| format!("-{value}"))
        }
        Expr::Paren(paren) => literal_text(&paren.expr),
        _ => None,
    }
}

fn is_one(expr: &Expr) -> bool {
    matches!(expr, Expr::Lit(Lit::Num(num)) if num.value == 1.0)
}

fn stmt_head(stmt: &Stmt) -> Option<Head> {
    let head = match stmt {
        Stmt::If(s) => Head::new(ConstructKind::Conditional).names(expr_names(&s.test)),
        Stmt::Switch(s) => Head::new(ConstructKind::Switch).names(expr_names(&s.discriminant)),
        Stmt::Try(_) => Head::new(ConstructKind::Try),
        Stmt::Throw(s) => {
            let names = match &*s.arg {
                Expr::New(new) => expr_names(&new.callee),
                other => expr_names(other),
            };
            Head::new(ConstructKind::Throw).names(names)
        }
        Stmt::Return(s) => {
            let mut head = Head::new(ConstructKind::Return);
            if let Some(arg) = &s.arg {
                if let Expr::Ident(ident) = &**arg {
                    head.names.push(sym(ident));
                }
                head = head.literal(literal_text(arg));
            }
            head
        }
        Stmt::Break(_) => Head::new(ConstructKind::Break),
        Stmt::Continue(_) => Head::new(ConstructKind::Continue),
        Stmt::While(s) => Head::new(ConstructKind::Loop).names(expr_names(&s.test)),
        Stmt::DoWhile(s) => Head::new(ConstructKind::Loop).names(expr_names(&s.test)),
        Stmt::For(_) => Head::new(ConstructKind::Loop),
        Stmt::ForIn(s) => Head::new(ConstructKind::Loop).names(expr_names(&s.right)),
        Stmt::ForOf(s) => Head::new(ConstructKind::Loop).names(expr_names(&s.right)),
        Stmt::Empty(_) => Head::new(ConstructKind::Empty),
        Stmt::Debugger(_) => Head::new(ConstructKind::Unknown),
        // calls, updates and assignments are recorded by `visit_expr`
        Stmt::Expr(s) if expr_head(strip_wrappers(&s.expr)).is_some() => return None,
        Stmt::Expr(_) => Head::new(ConstructKind::Unknown),
        _ => return None,
    };
    Some(head)
}

fn strip_wrappers(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => strip_wrappers(&paren.expr),
        Expr::Await(await_expr) => strip_wrappers(&await_expr.arg),
        _ => expr,
    }
}

fn expr_head(expr: &Expr) -> Option<Head> {
    let head = match expr {
        Expr::Call(call) => Head::new(ConstructKind::Call).names(callee_names(&call.callee)),
        Expr::New(new) => Head::new(ConstructKind::Call).names(expr_names(&new.callee)),
        Expr::Update(update) => {
            let op = match update.op {
                UpdateOp::PlusPlus => crate::parser::UpdateOp::Increment,
                UpdateOp::MinusMinus => crate::parser::UpdateOp::Decrement,
            };
            Head::new(ConstructKind::Update { op }).names(expr_names(&update.arg))
        }
        Expr::Assign(assign) => {
            let names = assign_target_names(&assign.left);
            match assign.op {
                AssignOp::AddAssign if is_one(&assign.right) => {
                    Head::new(ConstructKind::Update { op: crate::parser::UpdateOp::Increment }).names(names)
                }
                AssignOp::SubAssign if is_one(&assign.right) => {
                    Head::new(ConstructKind::Update { op: crate::parser::UpdateOp::Decrement }).names(names)
                }
                _ => Head::new(ConstructKind::Assignment)
                    .names(names)
                    .literal(literal_text(&assign.right)),
            }
        }
        _ => return None,
    };
    Some(head)
}

impl Visit for TreeBuilder<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt_head(stmt) {
            Some(head) => self.enter(head, stmt.span(), stmt),
            None => stmt.visit_children_with(self),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr_head(expr) {
            Some(head) => self.enter(head, expr.span(), expr),
            None => expr.visit_children_with(self),
        }
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        let names = decl.decls.iter().flat_map(|d| pat_names(&d.name)).collect();
        let literal = match decl.decls.as_slice() {
            [single] => single.init.as_deref().and_then(literal_text),
            _ => None,
        };
        let head = Head::new(ConstructKind::Declaration).names(names).literal(literal);
        self.enter(head, decl.span, decl);
    }

    fn visit_fn_decl(&mut self, func: &FnDecl) {
        let head = Head::new(ConstructKind::FunctionDef).names(vec![sym(&func.ident)]);
        self.enter(head, func.function.span, func);
    }

    fn visit_class_decl(&mut self, class: &ClassDecl) {
        let head = Head::new(ConstructKind::ClassDef).names(vec![sym(&class.ident)]);
        self.enter(head, class.class.span, class);
    }

    fn visit_class_method(&mut self, method: &ClassMethod) {
        let head = Head::new(ConstructKind::FunctionDef).names(prop_name(&method.key));
        self.enter(head, method.span, method);
    }

    fn visit_constructor(&mut self, ctor: &Constructor) {
        let head = Head::new(ConstructKind::FunctionDef).names(vec!["constructor".to_string()]);
        self.enter(head, ctor.span, ctor);
    }

    fn visit_ts_interface_decl(&mut self, decl: &TsInterfaceDecl) {
        let head = Head::new(ConstructKind::Declaration).names(vec![sym(&decl.id)]);
        self.enter(head, decl.span, decl);
    }

    fn visit_ts_type_alias_decl(&mut self, decl: &TsTypeAliasDecl) {
        let head = Head::new(ConstructKind::Declaration).names(vec![sym(&decl.id)]);
        self.enter(head, decl.span, decl);
    }

    fn visit_ts_enum_decl(&mut self, decl: &TsEnumDecl) {
        let head = Head::new(ConstructKind::Declaration).names(vec![sym(&decl.id)]);
        self.enter(head, decl.span, decl);
    }
}

/// Lower a parsed program into a construct tree, in source order
pub fn lower_program(program: &Program, source: &str, lines: &LineIndex, base: u32) -> SyntaxTree {
    let mut builder = TreeBuilder {
        source,
        lines,
        base,
        tree: SyntaxTree::new(),
        stack: Vec::new(),
    };
    program.visit_with(&mut builder);
    builder.tree
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse_file, Construct, ConstructKind, UpdateOp};
    use pretty_assertions::assert_eq;

    fn constructs(source: &str) -> Vec<Construct> {
        let file = parse_file(source, "test.ts").unwrap();
        (0..file.tree.len() as u32)
            .filter_map(|i| file.tree.get(crate::parser::ConstructId(i)).cloned())
            .collect()
    }

    fn summary(source: &str) -> Vec<(ConstructKind, Vec<String>, Vec<String>)> {
        constructs(source)
            .into_iter()
            .map(|c| (c.kind, c.names, c.literals))
            .collect()
    }

    fn s(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_declaration_captures_name_and_literal() {
        assert_eq!(
            summary("const limit = 10;"),
            vec![(ConstructKind::Declaration, s(&["limit"]), s(&["10"]))]
        );
        assert_eq!(
            summary("let a = 1, b = 2;"),
            vec![(ConstructKind::Declaration, s(&["a", "b"]), s(&[]))]
        );
    }

    #[test]
    fn test_destructuring_has_no_name() {
        assert_eq!(
            summary("const { a } = obj;"),
            vec![(ConstructKind::Declaration, s(&[]), s(&[]))]
        );
    }

    #[test]
    fn test_member_call_names() {
        assert_eq!(
            summary("console.log(x);"),
            vec![(ConstructKind::Call, s(&["log", "console log"]), s(&[]))]
        );
    }

    #[test]
    fn test_compound_assignment_by_one_is_update() {
        assert_eq!(
            summary("count += 1;\ncount -= 1;\ncount *= 2;"),
            vec![
                (ConstructKind::Update { op: UpdateOp::Increment }, s(&["count"]), s(&[])),
                (ConstructKind::Update { op: UpdateOp::Decrement }, s(&["count"]), s(&[])),
                (ConstructKind::Assignment, s(&["count"]), s(&["2"])),
            ]
        );
    }

    #[test]
    fn test_return_and_throw() {
        assert_eq!(
            summary("function f() {\n  if (!ok) throw new Error('bad');\n  return total;\n}"),
            vec![
                (ConstructKind::FunctionDef, s(&["f"]), s(&[])),
                (ConstructKind::Conditional, s(&[]), s(&[])),
                (ConstructKind::Throw, s(&["Error"]), s(&[])),
                (ConstructKind::Call, s(&["Error"]), s(&[])),
                (ConstructKind::Return, s(&["total"]), s(&[])),
            ]
        );
    }

    #[test]
    fn test_class_members() {
        let kinds: Vec<_> = summary("class Cart {\n  constructor() {}\n  addItem(item) {}\n}")
            .into_iter()
            .map(|(kind, names, _)| (kind, names))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ConstructKind::ClassDef, s(&["Cart"])),
                (ConstructKind::FunctionDef, s(&["constructor"])),
                (ConstructKind::FunctionDef, s(&["addItem"])),
            ]
        );
    }

    #[test]
    fn test_spans_and_parent_links() {
        let all = constructs("for (const item of items) {\n  process(item);\n}");
        assert_eq!(all[0].kind, ConstructKind::Loop);
        assert_eq!(all[0].names, s(&["items"]));
        assert_eq!(all[0].start_line(), Some(1));
        let call = all.iter().find(|c| c.kind == ConstructKind::Call).unwrap();
        assert_eq!(call.start_line(), Some(2));
        assert_eq!(call.span.unwrap().start.column, 2);
        assert_eq!(call.parent, Some(all[0].id));
    }

    #[test]
    fn test_empty_and_unknown_statements() {
        let kinds: Vec<_> = summary(";\na + b;").into_iter().map(|(k, _, _)| k).collect();
        assert_eq!(kinds, vec![ConstructKind::Empty, ConstructKind::Unknown]);
    }
}
