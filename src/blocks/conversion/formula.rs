//! Restricted ASAM-MCD2 text formula language.
//!
//! Supports the four arithmetic operators, parentheses, unary minus,
//! `pow(a, b)` / `power(a, b)` and the unary functions `exp`, `log`,
//! `sqrt`, `abs`, `sin`, `cos`, `tan` over the free variable `X`.
//! Anything else fails to parse and the caller falls back to raw values.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    multi::many0,
    number::complete::double,
    sequence::{delimited, preceded, separated_pair},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Exp,
    Log,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var,
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    /// Evaluates the expression for one value of `X`. Division by zero
    /// and domain errors follow IEEE semantics (inf/NaN).
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Num(v) => *v,
            Expr::Var => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Add(a, b) => a.eval(x) + b.eval(x),
            Expr::Sub(a, b) => a.eval(x) - b.eval(x),
            Expr::Mul(a, b) => a.eval(x) * b.eval(x),
            Expr::Div(a, b) => a.eval(x) / b.eval(x),
            Expr::Pow(a, b) => a.eval(x).powf(b.eval(x)),
            Expr::Call(func, arg) => {
                let v = arg.eval(x);
                match func {
                    Func::Exp => v.exp(),
                    Func::Log => v.ln(),
                    Func::Sqrt => v.sqrt(),
                    Func::Abs => v.abs(),
                    Func::Sin => v.sin(),
                    Func::Cos => v.cos(),
                    Func::Tan => v.tan(),
                }
            }
        }
    }
}

/// Parses a formula; `None` means the text uses unsupported syntax.
pub fn parse_formula(text: &str) -> Option<Expr> {
    match all_consuming(delimited(multispace0, expr, multispace0)).parse(text) {
        Ok((_, parsed)) => Some(parsed),
        Err(_) => None,
    }
}

fn expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0((add_op, term)).parse(input)?;
    Ok((input, rest.into_iter().fold(first, |acc, (op, rhs)| {
        if op == '+' {
            Expr::Add(Box::new(acc), Box::new(rhs))
        } else {
            Expr::Sub(Box::new(acc), Box::new(rhs))
        }
    })))
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = factor(input)?;
    let (input, rest) = many0((mul_op, factor)).parse(input)?;
    Ok((input, rest.into_iter().fold(first, |acc, (op, rhs)| {
        if op == '*' {
            Expr::Mul(Box::new(acc), Box::new(rhs))
        } else {
            Expr::Div(Box::new(acc), Box::new(rhs))
        }
    })))
}

fn factor(input: &str) -> IResult<&str, Expr> {
    alt((
        map(
            preceded(delimited(multispace0, char('-'), multispace0), factor),
            |inner| Expr::Neg(Box::new(inner)),
        ),
        delimited(multispace0, atom, multispace0),
    ))
    .parse(input)
}

fn atom(input: &str) -> IResult<&str, Expr> {
    alt((
        power_call,
        unary_call,
        map(char('X'), |_| Expr::Var),
        map(double, Expr::Num),
        delimited(char('('), expr, char(')')),
    ))
    .parse(input)
}

fn power_call(input: &str) -> IResult<&str, Expr> {
    let (input, _) = alt((tag("power"), tag("pow"))).parse(input)?;
    let (input, (base, exponent)) = delimited(
        (multispace0, char('('), multispace0),
        separated_pair(expr, (multispace0, char(','), multispace0), expr),
        (multispace0, char(')')),
    )
    .parse(input)?;
    Ok((input, Expr::Pow(Box::new(base), Box::new(exponent))))
}

fn unary_call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = alt((
        tag("exp"),
        tag("log"),
        tag("sqrt"),
        tag("abs"),
        tag("sin"),
        tag("cos"),
        tag("tan"),
    ))
    .parse(input)?;
    let (input, arg) = delimited(
        (multispace0, char('('), multispace0),
        expr,
        (multispace0, char(')')),
    )
    .parse(input)?;
    let func = match name {
        "exp" => Func::Exp,
        "log" => Func::Log,
        "sqrt" => Func::Sqrt,
        "abs" => Func::Abs,
        "sin" => Func::Sin,
        "cos" => Func::Cos,
        _ => Func::Tan,
    };
    Ok((input, Expr::Call(func, Box::new(arg))))
}

fn add_op(input: &str) -> IResult<&str, char> {
    delimited(multispace0, alt((char('+'), char('-'))), multispace0).parse(input)
}

fn mul_op(input: &str) -> IResult<&str, char> {
    delimited(multispace0, alt((char('*'), char('/'))), multispace0).parse(input)
}
