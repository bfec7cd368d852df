use snip::{LocalValue, Snippet, SourceLoc, VarKind};

use crate::{
    ast::{Expr, Stmt, StmtKind},
    ParseError,
};

/// Lowers a parsed statement list into a snippet, calling the emission
/// operations in source order.
///
/// Name kinds are validated here, so the snippet's emission contract can
/// assume correctly classified identifiers.
pub fn lower(name: &str, statements: &[Stmt]) -> Result<Snippet, ParseError> {
    let mut snippet = Snippet::new(name);
    for stmt in statements {
        let loc = SourceLoc::new(stmt.line);
        match &stmt.kind {
            StmtKind::Call { function, arg } => {
                if function != "print" {
                    return Err(reject(
                        stmt.line,
                        format!(
                            "unknown function `{function}`; the only \
                             function is print"
                        ),
                    ));
                }
                let value = lower_expr(&mut snippet, arg, stmt.line)?;
                snippet.emit_static_call("print", value, loc);
            }
            StmtKind::MethodCall { object, method } => {
                if VarKind::of(object) != Some(VarKind::Monitor) {
                    return Err(reject(
                        stmt.line,
                        format!(
                            "`{object}` is not a monitor; methods are only \
                             called on m-prefixed names"
                        ),
                    ));
                }
                if method != "lock" && method != "unlock" {
                    return Err(reject(
                        stmt.line,
                        format!(
                            "unknown method `{method}`; monitors support \
                             lock() and unlock()"
                        ),
                    ));
                }
                snippet.emit_method_call(object, method, loc);
            }
            StmtKind::Assign { target, op, value } => {
                check_data_name(target, stmt.line)?;
                let data = lower_expr(&mut snippet, value, stmt.line)?;
                match op {
                    None => snippet.emit_write(target, data, loc),
                    Some(op) => {
                        snippet.emit_op_write(target, data, *op, loc);
                    }
                }
            }
            StmtKind::Incdec { target, op } => {
                check_data_name(target, stmt.line)?;
                snippet.emit_op_write(
                    target,
                    LocalValue::Literal(1),
                    *op,
                    loc,
                );
            }
        }
    }
    Ok(snippet)
}

/// Lowers one expression, emitting its reads and arithmetic in
/// left-to-right source order, and returns the value computed.
fn lower_expr(
    snippet: &mut Snippet,
    expr: &Expr,
    line: u32,
) -> Result<LocalValue, ParseError> {
    match expr {
        Expr::Literal(constant) => Ok(LocalValue::Literal(*constant)),
        Expr::Var(name) => {
            check_data_name(name, line)?;
            Ok(snippet.emit_read(name, SourceLoc::new(line)))
        }
        Expr::Binary { op, lhs, rhs } => {
            let v0 = lower_expr(snippet, lhs, line)?;
            let v1 = lower_expr(snippet, rhs, line)?;
            Ok(snippet.emit_arithmetic(v0, v1, *op, SourceLoc::new(line)))
        }
    }
}

/// Checks that a name read or written as data is a local, shared, or
/// volatile variable.
fn check_data_name(name: &str, line: u32) -> Result<(), ParseError> {
    match VarKind::of(name) {
        Some(VarKind::Local | VarKind::Shared | VarKind::Volatile) => Ok(()),
        Some(VarKind::Monitor) | None => Err(reject(
            line,
            format!(
                "`{name}` is not a variable; variables are l-, s-, or \
                 v-prefixed"
            ),
        )),
    }
}

/// A lowering rejection at a line.
fn reject(line: u32, message: String) -> ParseError {
    ParseError { line, message }
}
