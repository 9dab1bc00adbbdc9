// Expression grammar, lowest precedence first:
//
//   ternary   := or ( '?' ternary ':' ternary )?
//   or        := and ( ('||' | 'or') and )*
//   and       := equality ( ('&&' | 'and') equality )*
//   equality  := relational ( ('==' | '=' | '!=' | '<>') relational )*
//   relational:= additive ( ('<=' | '>=' | '<' | '>') additive )*
//   additive  := term ( ('+' | '-') term )*
//   term      := unary ( ('*' | '/' | '%') unary )*
//   unary     := ('-' | '!' | 'not') unary | primary
//   primary   := number | string | true | false | null | call
//              | '[' name ']' | identifier | '(' ternary ')'
//
// Input that is not a complete expression is read as a text template
// instead, so `Customer-{id}` works unquoted.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_while, take_while1},
    character::complete::{anychar, char, digit1, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, peek, recognize, value},
    error::{VerboseError, context},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use super::Value;

type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

// ── AST ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// A string with `{name}` interpolations.
    Template(Vec<TemplatePart>),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Text(String),
    Variable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

// ── Entry points ─────────────────────────────────────────────────────

/// Parse `input`, falling back to a text template when it is not a
/// complete expression. Never fails.
pub fn parse(input: &str) -> Expr {
    parse_expression(input).unwrap_or_else(|_| parse_template(input))
}

/// Parse `input` strictly as an expression.
pub fn parse_expression(input: &str) -> Result<Expr, String> {
    all_consuming(delimited(multispace0, ternary, multispace0))(input)
        .map(|(_, expr)| expr)
        .map_err(|e| e.to_string())
}

/// Split free text into literal runs and `{name}` references. An
/// unterminated `{` is kept as text.
pub fn parse_template(input: &str) -> Expr {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_template_name(after[..close].trim()) => {
                text.push_str(&rest[..open]);
                if !text.is_empty() {
                    parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                }
                parts.push(TemplatePart::Variable(after[..close].trim().to_owned()));
                rest = &after[close + 1..];
            }
            _ => {
                text.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    text.push_str(rest);
    if !text.is_empty() {
        parts.push(TemplatePart::Text(text));
    }

    match parts.as_slice() {
        [] => Expr::Literal(Value::Str(String::new())),
        [TemplatePart::Text(t)] => Expr::Literal(Value::Str(t.clone())),
        _ => Expr::Template(parts),
    }
}

fn is_template_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_ident_char)
}

// ── Helpers ──────────────────────────────────────────────────────────

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> ParserResult<'a, O>
where
    F: FnMut(&'a str) -> ParserResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A case-insensitive keyword not followed by an identifier character.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> ParserResult<'a, &'a str> {
    terminated(tag_no_case(word), not(peek(satisfy(is_ident_char))))
}

fn fold_binary(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    })
}

// ── Precedence levels ────────────────────────────────────────────────

fn ternary(input: &str) -> ParserResult<Expr> {
    let (input, condition) = or_expr(input)?;
    let (input, branches) = opt(pair(
        preceded(ws(char('?')), ternary),
        preceded(ws(char(':')), ternary),
    ))(input)?;
    Ok(match branches {
        Some((then, otherwise)) => (
            input,
            Expr::Ternary(Box::new(condition), Box::new(then), Box::new(otherwise)),
        ),
        None => (input, condition),
    })
}

fn or_expr(input: &str) -> ParserResult<Expr> {
    let op = value(BinaryOp::Or, ws(alt((tag("||"), keyword("or")))));
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(pair(op, and_expr))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn and_expr(input: &str) -> ParserResult<Expr> {
    let op = value(BinaryOp::And, ws(alt((tag("&&"), keyword("and")))));
    let (input, first) = equality(input)?;
    let (input, rest) = many0(pair(op, equality))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn equality(input: &str) -> ParserResult<Expr> {
    let op = ws(alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Ne, tag("<>")),
        value(BinaryOp::Eq, char('=')),
    )));
    let (input, first) = relational(input)?;
    let (input, rest) = many0(pair(op, relational))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn relational(input: &str) -> ParserResult<Expr> {
    let op = ws(alt((
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, terminated(char('<'), not(one_of("=>")))),
        value(BinaryOp::Gt, terminated(char('>'), not(char('=')))),
    )));
    let (input, first) = additive(input)?;
    let (input, rest) = many0(pair(op, additive))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn additive(input: &str) -> ParserResult<Expr> {
    let op = ws(alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    )));
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(op, term))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn term(input: &str) -> ParserResult<Expr> {
    let op = ws(alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
        value(BinaryOp::Mod, char('%')),
    )));
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(op, unary))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn unary(input: &str) -> ParserResult<Expr> {
    context(
        "unary",
        alt((
            map(preceded(ws(char('-')), unary), |e| {
                Expr::Unary(UnaryOp::Neg, Box::new(e))
            }),
            map(
                preceded(
                    ws(alt((terminated(tag("!"), not(char('='))), keyword("not")))),
                    unary,
                ),
                |e| Expr::Unary(UnaryOp::Not, Box::new(e)),
            ),
            primary,
        )),
    )(input)
}

// ── Primaries ────────────────────────────────────────────────────────

fn primary(input: &str) -> ParserResult<Expr> {
    context(
        "primary",
        ws(alt((
            delimited(char('('), ws(ternary), char(')')),
            number,
            string_literal,
            value(Expr::Literal(Value::Bool(true)), keyword("true")),
            value(Expr::Literal(Value::Bool(false)), keyword("false")),
            value(Expr::Literal(Value::Null), keyword("null")),
            call,
            bracketed_variable,
            map(identifier, |name: &str| Expr::Variable(name.to_owned())),
        ))),
    )(input)
}

fn identifier(input: &str) -> ParserResult<&str> {
    context(
        "identifier",
        recognize(pair(
            satisfy(|c| c.is_alphabetic() || c == '_'),
            take_while(is_ident_char),
        )),
    )(input)
}

fn bracketed_variable(input: &str) -> ParserResult<Expr> {
    context(
        "bracketed variable",
        map(delimited(char('['), is_not("]"), char(']')), |name: &str| {
            Expr::Variable(name.trim().to_owned())
        }),
    )(input)
}

fn call(input: &str) -> ParserResult<Expr> {
    context(
        "function call",
        map(
            pair(
                terminated(identifier, ws(char('('))),
                terminated(separated_list0(ws(char(',')), ternary), ws(char(')'))),
            ),
            |(name, args)| Expr::Call(name.to_owned(), args),
        ),
    )(input)
}

fn number(input: &str) -> ParserResult<Expr> {
    context(
        "number",
        alt((
            map_res(
                recognize(tuple((digit1, char('.'), digit1))),
                |s: &str| s.parse::<f64>().map(|f| Expr::Literal(Value::Float(f))),
            ),
            map_res(
                terminated(digit1, not(peek(satisfy(is_ident_char)))),
                |s: &str| s.parse::<i64>().map(|n| Expr::Literal(Value::Int(n))),
            ),
        )),
    )(input)
}

fn string_literal(input: &str) -> ParserResult<Expr> {
    context(
        "string literal",
        alt((
            map(delimited(char('\''), quoted_body('\''), char('\'')), |s| {
                parse_template(&s)
            }),
            map(delimited(char('"'), quoted_body('"'), char('"')), |s| {
                parse_template(&s)
            }),
        )),
    )(input)
}

/// Body of a quoted string up to (not including) `quote`; a backslash
/// escapes the next character.
fn quoted_body<'a>(quote: char) -> impl FnMut(&'a str) -> ParserResult<'a, String> {
    move |input: &'a str| {
        let plain = take_while1(move |c: char| c != quote && c != '\\');
        let escaped = preceded(char('\\'), anychar);
        let (input, pieces) = many0(alt((
            map(plain, str::to_owned),
            map(escaped, String::from),
        )))(input)?;
        Ok((input, pieces.concat()))
    }
}
