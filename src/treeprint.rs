//! AST pretty-printer behind the `-d` flag. Ambient, never touched by code
//! generation. Grounded in `original_source/src/node_formatter.c`.

use std::io::{self, Write};

use crate::ast::Ast;

/// Dumps `root` as a box-drawing indented tree to `out`.
pub fn dump(out: &mut impl Write, root: &Ast) -> io::Result<()> {
    dump_rec(out, root, 0, 0)
}

fn print_indent(out: &mut impl Write, indent: u32, mask: u64) -> io::Result<()> {
    if indent == 0 {
        return Ok(());
    }
    for i in 0..indent - 1 {
        let bit = (mask >> (indent - 1 - i)) & 1 != 0;
        write!(out, "{} ", if bit { '|' } else { ' ' })?;
    }
    write!(out, "+-")
}

fn dump_rec(out: &mut impl Write, node: &Ast, indent: u32, mask: u64) -> io::Result<()> {
    let mask0 = mask << 1;

    // `Seq` and `Empty` contribute no line of their own; `Seq` fans its
    // children out at the same depth, `Empty` is invisible entirely.
    match node {
        Ast::Seq(children) => {
            dump_children(out, children.iter(), indent, mask)?;
            return Ok(());
        }
        Ast::Empty => return Ok(()),
        _ => {}
    }

    print_indent(out, indent, mask)?;
    match node {
        Ast::Invalid => writeln!(out, "Invalid")?,
        Ast::Group { label, .. } => writeln!(out, "{}", label)?,
        Ast::Expr(_) => writeln!(out, "Expr")?,
        Ast::Unary { op, .. } => writeln!(out, "Unary {:?}", op)?,
        Ast::Binary { op, .. } => writeln!(out, "Binary {:?}", op)?,
        Ast::Assign { .. } => writeln!(out, "Assign")?,
        Ast::Integer(v) => writeln!(out, "Integer {}", v)?,
        Ast::Ident(name) => writeln!(out, "Ident {}", name)?,
        Ast::Variable(_) => writeln!(out, "Variable")?,
        Ast::Array { .. } => writeln!(out, "Array")?,
        Ast::FuncCall { .. } => writeln!(out, "FuncCall")?,
        Ast::FuncCallArg(_) => writeln!(out, "FuncCallArg")?,
        Ast::If { .. } => writeln!(out, "If-Statement")?,
        Ast::While { .. } => writeln!(out, "While-Statement")?,
        Ast::LoopStatement(_) => writeln!(out, "Loop-Statement")?,
        Ast::ForStatement { .. } => writeln!(out, "For-Statement")?,
        Ast::Break => writeln!(out, "Break-Statement")?,
        Ast::Continue => writeln!(out, "Continue-Statement")?,
        Ast::Puti(_) => writeln!(out, "Puti-Statement")?,
        Ast::Putc(_) => writeln!(out, "Putc-Statement")?,
        Ast::Geti(_) => writeln!(out, "Geti-Statement")?,
        Ast::Getc(_) => writeln!(out, "Getc-Statement")?,
        Ast::ArrayDecl { .. } => writeln!(out, "ArrayDecl-Statement")?,
        Ast::Return(_) => writeln!(out, "Return")?,
        Ast::Halt => writeln!(out, "Halt-Statement")?,
        Ast::Func { .. } => writeln!(out, "Func")?,
        Ast::FuncParam(_) => writeln!(out, "FuncParam")?,
        Ast::ConstStatement { .. } => writeln!(out, "Const-Statement")?,
        Ast::Seq(_) | Ast::Empty => unreachable!(),
    }

    dump_children(out, children_of(node).into_iter(), indent + 1, mask0)
}

fn dump_children<'a>(
    out: &mut impl Write,
    children: impl ExactSizeIterator<Item = &'a Ast>,
    indent: u32,
    mask: u64,
) -> io::Result<()> {
    let count = children.len();
    for (i, child) in children.enumerate() {
        let is_last = i == count - 1;
        dump_rec(out, child, indent, mask | (!is_last as u64))?;
    }
    Ok(())
}

/// Returns this node's children in source order, matching the original's
/// homogeneous child list. Leaf nodes (`Integer`, `Ident`, `Break`, ...)
/// have none.
fn children_of(node: &Ast) -> Vec<&Ast> {
    match node {
        Ast::Invalid | Ast::Empty | Ast::Integer(_) | Ast::Ident(_) | Ast::Break | Ast::Continue
        | Ast::Halt => vec![],
        Ast::Group { inner, .. } => vec![inner],
        Ast::Seq(children) => children.iter().collect(),
        Ast::Expr(e) => vec![e],
        Ast::Unary { operand, .. } => vec![operand],
        Ast::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        Ast::Assign { lhs, rhs } => vec![lhs, rhs],
        Ast::Variable(ident) => vec![ident],
        Ast::Array { ident, index } => vec![ident, index],
        Ast::FuncCall { ident, args } => vec![ident, args],
        Ast::FuncCallArg(args) => args.iter().collect(),
        Ast::If { cond, then, els } => {
            let mut v = vec![cond.as_ref(), then.as_ref()];
            if let Some(els) = els {
                v.push(els.as_ref());
            }
            v
        }
        Ast::While { cond, body } => vec![cond, body],
        Ast::LoopStatement(body) => vec![body],
        Ast::ForStatement {
            init,
            cond,
            next,
            body,
        } => vec![init, cond, next, body],
        Ast::Puti(e) | Ast::Putc(e) | Ast::Geti(e) | Ast::Getc(e) | Ast::Return(e) => vec![e],
        Ast::ArrayDecl { ident, .. } => vec![ident],
        Ast::Func {
            ident,
            params,
            body,
        } => vec![ident, params, body],
        Ast::FuncParam(params) => params.iter().collect(),
        Ast::ConstStatement { ident, .. } => vec![ident],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn dumps_a_minimal_function_without_panicking() {
        let out = parse("func main() { return 0; }");
        assert_eq!(out.parser_errors, 0);
        let mut buf = Vec::new();
        dump(&mut buf, &out.ast).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Func"));
        assert!(text.contains("Return"));
        assert!(text.contains("Integer 0"));
    }
}
