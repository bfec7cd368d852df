use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{multispace0, satisfy, u32 as decimal},
    combinator::{map, recognize},
    error::VerboseError,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use snip::ArithmeticOp;

use crate::{
    ast::{Expr, Stmt, StmtKind},
    ParseError,
};

/// Parses an entire snippet source file into its statement list.
///
/// Statements may be separated by any whitespace, including none beyond the
/// terminating `;`.  Each statement records the line its first token sits
/// on.
pub fn program(source: &str) -> Result<Vec<Stmt>, ParseError> {
    let mut statements = Vec::new();
    let mut rest = source;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return Ok(statements);
        }
        let line = line_at(source, trimmed);
        match statement(rest) {
            Ok((leftover, kind)) => {
                statements.push(Stmt { kind, line });
                rest = leftover;
            }
            Err(_) => {
                return Err(ParseError {
                    line,
                    message: "expected a statement".to_owned(),
                });
            }
        }
    }
}

/// 1-based line number of the position where `rest` begins within `source`.
fn line_at(source: &str, rest: &str) -> u32 {
    let consumed = source.len() - rest.len();
    let newlines = source
        .bytes()
        .take(consumed)
        .filter(|&byte| byte == b'\n')
        .count();
    u32::try_from(newlines).unwrap_or(u32::MAX).saturating_add(1)
}

/// One `;`-terminated statement, in any of the statement forms.
fn statement(input: &str) -> IResult<&str, StmtKind, VerboseError<&str>> {
    terminated(
        alt((
            prefix_incdec_stmt,
            method_call_stmt,
            call_stmt,
            postfix_incdec_stmt,
            assign_stmt,
        )),
        token(";"),
    )(input)
}

/// `function(arg)`
fn call_stmt(input: &str) -> IResult<&str, StmtKind, VerboseError<&str>> {
    map(
        pair(name, delimited(token("("), expression, token(")"))),
        |(function, arg)| StmtKind::Call {
            function: function.to_owned(),
            arg,
        },
    )(input)
}

/// `object.method()`
fn method_call_stmt(
    input: &str,
) -> IResult<&str, StmtKind, VerboseError<&str>> {
    map(
        tuple((name, token("."), name, token("("), token(")"))),
        |(object, _, method, _, _)| StmtKind::MethodCall {
            object: object.to_owned(),
            method: method.to_owned(),
        },
    )(input)
}

/// `++target` / `--target`
fn prefix_incdec_stmt(
    input: &str,
) -> IResult<&str, StmtKind, VerboseError<&str>> {
    map(pair(incdec_op, name), |(op, target)| StmtKind::Incdec {
        target: target.to_owned(),
        op,
    })(input)
}

/// `target++` / `target--`
fn postfix_incdec_stmt(
    input: &str,
) -> IResult<&str, StmtKind, VerboseError<&str>> {
    map(pair(name, incdec_op), |(target, op)| StmtKind::Incdec {
        target: target.to_owned(),
        op,
    })(input)
}

/// `target = expr` and the compound forms `target op= expr`
fn assign_stmt(input: &str) -> IResult<&str, StmtKind, VerboseError<&str>> {
    map(
        tuple((name, assign_op, expression)),
        |(target, op, value)| StmtKind::Assign {
            target: target.to_owned(),
            op,
            value,
        },
    )(input)
}

/// A full expression; the grammar root is the loosest-binding level.
fn expression(input: &str) -> IResult<&str, Expr, VerboseError<&str>> {
    bit_or(input)
}

/// Parses one left-associative precedence level.
fn binary_level<'a>(
    operand: fn(&'a str) -> IResult<&'a str, Expr, VerboseError<&'a str>>,
    operator: fn(&'a str) -> IResult<&'a str, ArithmeticOp, VerboseError<&'a str>>,
    input: &'a str,
) -> IResult<&'a str, Expr, VerboseError<&'a str>> {
    let (rest, first) = operand(input)?;
    let (rest, tail) = many0(pair(operator, operand))(rest)?;
    let expr = tail.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    });
    Ok((rest, expr))
}

/// `a | b`, the loosest-binding operator
fn bit_or(input: &str) -> IResult<&str, Expr, VerboseError<&str>> {
    binary_level(bit_xor, or_op, input)
}

/// `a ^ b`
fn bit_xor(input: &str) -> IResult<&str, Expr, VerboseError<&str>> {
    binary_level(bit_and, xor_op, input)
}

/// `a & b`
fn bit_and(input: &str) -> IResult<&str, Expr, VerboseError<&str>> {
    binary_level(additive, and_op, input)
}

/// `a + b` and `a - b`
fn additive(input: &str) -> IResult<&str, Expr, VerboseError<&str>> {
    binary_level(multiplicative, add_op, input)
}

/// `a * b`, `a / b`, and `a % b`, the tightest-binding operators
fn multiplicative(input: &str) -> IResult<&str, Expr, VerboseError<&str>> {
    binary_level(primary, mul_op, input)
}

/// A constant, a variable, or a parenthesized expression
fn primary(input: &str) -> IResult<&str, Expr, VerboseError<&str>> {
    preceded(
        multispace0,
        alt((
            map(decimal, Expr::Literal),
            map(identifier, |var| Expr::Var(var.to_owned())),
            delimited(token("("), expression, token(")")),
        )),
    )(input)
}

/// `|` as an operator token
fn or_op(input: &str) -> IResult<&str, ArithmeticOp, VerboseError<&str>> {
    preceded(multispace0, map(tag("|"), |_| ArithmeticOp::Or))(input)
}

/// `^` as an operator token
fn xor_op(input: &str) -> IResult<&str, ArithmeticOp, VerboseError<&str>> {
    preceded(multispace0, map(tag("^"), |_| ArithmeticOp::Xor))(input)
}

/// `&` as an operator token
fn and_op(input: &str) -> IResult<&str, ArithmeticOp, VerboseError<&str>> {
    preceded(multispace0, map(tag("&"), |_| ArithmeticOp::And))(input)
}

/// `+` or `-` as an operator token
fn add_op(input: &str) -> IResult<&str, ArithmeticOp, VerboseError<&str>> {
    preceded(
        multispace0,
        alt((
            map(tag("+"), |_| ArithmeticOp::Add),
            map(tag("-"), |_| ArithmeticOp::Sub),
        )),
    )(input)
}

/// `*`, `/`, or `%` as an operator token
fn mul_op(input: &str) -> IResult<&str, ArithmeticOp, VerboseError<&str>> {
    preceded(
        multispace0,
        alt((
            map(tag("*"), |_| ArithmeticOp::Mul),
            map(tag("/"), |_| ArithmeticOp::Div),
            map(tag("%"), |_| ArithmeticOp::Rem),
        )),
    )(input)
}

/// `++` or `--`
fn incdec_op(input: &str) -> IResult<&str, ArithmeticOp, VerboseError<&str>> {
    preceded(
        multispace0,
        alt((
            map(tag("++"), |_| ArithmeticOp::Add),
            map(tag("--"), |_| ArithmeticOp::Sub),
        )),
    )(input)
}

/// `=` and the compound assignment operators; the combining operator is
/// `None` for plain assignment
fn assign_op(
    input: &str,
) -> IResult<&str, Option<ArithmeticOp>, VerboseError<&str>> {
    preceded(
        multispace0,
        alt((
            map(tag("+="), |_| Some(ArithmeticOp::Add)),
            map(tag("-="), |_| Some(ArithmeticOp::Sub)),
            map(tag("*="), |_| Some(ArithmeticOp::Mul)),
            map(tag("/="), |_| Some(ArithmeticOp::Div)),
            map(tag("%="), |_| Some(ArithmeticOp::Rem)),
            map(tag("|="), |_| Some(ArithmeticOp::Or)),
            map(tag("^="), |_| Some(ArithmeticOp::Xor)),
            map(tag("&="), |_| Some(ArithmeticOp::And)),
            map(tag("="), |_| None),
        )),
    )(input)
}

/// An identifier preceded by any amount of whitespace
fn name(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    preceded(multispace0, identifier)(input)
}

/// A bare identifier: a letter or underscore, then letters, digits, and
/// underscores
fn identifier(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    recognize(pair(
        satisfy(|ch| ch.is_ascii_alphabetic() || ch == '_'),
        take_while(|ch: char| ch.is_ascii_alphanumeric() || ch == '_'),
    ))(input)
}

/// A fixed token preceded by any amount of whitespace
fn token<'a>(
    t: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, VerboseError<&'a str>> {
    preceded(multispace0, tag(t))
}
