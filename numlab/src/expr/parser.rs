use winnow::{
    Result as WResult,
    ascii::{digit0, digit1, multispace0},
    combinator::{alt, delimited, fail, opt},
    error::{ContextError, StrContext, StrContextValue},
    prelude::*,
    stream::Stream,
    token::{one_of, take_while},
};

use super::{BinaryOp, Constant, Expr, Func};

/// Deepest nesting of parentheses, calls, signs and exponents a formula may have.
/// Every level is a parser stack frame, and later a frame in `eval` and `Display`.
pub(super) const MAX_DEPTH: usize = 128;

/// A whole formula, allowing surrounding whitespace.
pub(super) fn formula(i: &mut &str) -> WResult<Expr> {
    let e = expr(i, 0)?;
    ignore_ws(i);
    Ok(e)
}

fn expr(i: &mut &str, depth: usize) -> WResult<Expr> {
    let mut acc = term(i, depth)?;
    loop {
        ignore_ws(i);
        let op = match opt(one_of(['+', '-'])).parse_next(i)? {
            Some('+') => BinaryOp::Add,
            Some(_) => BinaryOp::Sub,
            None => return Ok(acc),
        };
        let rhs = term(i, depth)?;
        acc = Expr::binary(op, acc, rhs);
    }
}

fn term(i: &mut &str, depth: usize) -> WResult<Expr> {
    let mut acc = unary(i, depth)?;
    loop {
        ignore_ws(i);
        let op = match opt(one_of(['*', '/'])).parse_next(i)? {
            Some('*') => BinaryOp::Mul,
            Some(_) => BinaryOp::Div,
            None => return Ok(acc),
        };
        let rhs = unary(i, depth)?;
        acc = Expr::binary(op, acc, rhs);
    }
}

fn unary(i: &mut &str, depth: usize) -> WResult<Expr> {
    ignore_ws(i);
    if opt('-').parse_next(i)?.is_some() {
        if depth >= MAX_DEPTH {
            return too_deep(i);
        }
        return unary(i, depth + 1).map(|e| Expr::Neg(Box::new(e)));
    }
    power(i, depth)
}

// The exponent is parsed as `unary`, which makes `^` right-associative and allows `2^-1`.
fn power(i: &mut &str, depth: usize) -> WResult<Expr> {
    let base = atom(i, depth)?;
    let before_caret = i.checkpoint();
    ignore_ws(i);
    if opt('^').parse_next(i)?.is_none() {
        i.reset(&before_caret);
        return Ok(base);
    }
    let exponent = unary(i, depth + 1)?;
    Ok(Expr::binary(BinaryOp::Pow, base, exponent))
}

// Dispatches on the next character rather than trying alternatives, so an error from
// deep inside a parenthesised expression reaches the caller as it was raised.
fn atom(i: &mut &str, depth: usize) -> WResult<Expr> {
    ignore_ws(i);
    if depth > MAX_DEPTH {
        return too_deep(i);
    }
    match i.chars().next() {
        Some('(') => parenthesised(i, depth + 1),
        Some(c) if c.is_ascii_digit() || c == '.' => {
            operand(number.map(Expr::Number)).parse_next(i)
        }
        _ => named(i, depth),
    }
}

fn parenthesised(i: &mut &str, depth: usize) -> WResult<Expr> {
    delimited('(', |i: &mut &str| expr(i, depth), (multispace0, ')')).parse_next(i)
}

/// Labels a failure to find the operand an operator needs.
fn operand<'s, O>(
    parser: impl Parser<&'s str, O, ContextError>,
) -> impl Parser<&'s str, O, ContextError> {
    parser
        .context(StrContext::Label("operand"))
        .context(StrContext::Expected(StrContextValue::Description(
            "a number, a name or '('",
        )))
}

fn too_deep<T>(i: &mut &str) -> WResult<T> {
    fail.context(StrContext::Label("expression"))
        .context(StrContext::Expected(StrContextValue::Description(
            "at most 128 levels of nesting",
        )))
        .parse_next(i)
}

// Literals too large for an f64 are rejected, since `inf` would print as a variable.
fn number(i: &mut &str) -> WResult<f64> {
    let mantissa = alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void()));
    let exponent = (one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1);
    (mantissa, opt(exponent))
        .take()
        .verify_map(|s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        .parse_next(i)
}

fn identifier<'s>(i: &mut &'s str) -> WResult<&'s str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(i)
}

/// A constant, a variable, or a call.
fn named(i: &mut &str, depth: usize) -> WResult<Expr> {
    let name = operand(identifier).parse_next(i)?;
    let after_name = i.checkpoint();
    ignore_ws(i);
    let has_args = opt('(').parse_next(i)?.is_some();
    if !has_args {
        i.reset(&after_name);
    }
    match (name, has_args) {
        ("pow", true) => {
            let base = expr(i, depth + 1)?;
            (multispace0, ',').parse_next(i)?;
            let exponent = expr(i, depth + 1)?;
            (multispace0, ')').parse_next(i)?;
            Ok(Expr::binary(BinaryOp::Pow, base, exponent))
        }
        (_, true) => {
            let Some(func) = Func::from_name(name) else {
                return reject(i, "function name");
            };
            let arg = expr(i, depth + 1)?;
            (multispace0, ')').parse_next(i)?;
            Ok(Expr::Call(func, Box::new(arg)))
        }
        ("pi", false) => Ok(Expr::Constant(Constant::Pi)),
        ("e", false) => Ok(Expr::Constant(Constant::E)),
        ("pow", false) => reject(i, "argument list"),
        (_, false) if Func::from_name(name).is_some() => reject(i, "argument list"),
        (_, false) => Ok(Expr::Variable(name.to_owned())),
    }
}

fn reject<T>(i: &mut &str, what: &'static str) -> WResult<T> {
    fail.context(StrContext::Label(what)).parse_next(i)
}

fn ws(i: &mut &str) -> WResult<()> {
    multispace0.parse_next(i).map(|_| ())
}

fn ignore_ws(i: &mut &str) {
    let _ = ws.parse_next(i);
}
