//! Source text to syntax tree.
//!
//! ```text
//! number  : /-?[0-9]+/ | /-?0[xX][0-9a-fA-F]+/
//! charbuf : /"(\\.|[^"])*"/
//! comment : /;[^\r\n]*/
//! symbol  : /[a-zA-Z0-9_+\-*\/\\=<>!&%^~|]+/
//! sexpr   : '(' expr* ')'
//! qexpr   : '{' expr* '}'
//! expr    : number | symbol | charbuf | comment | sexpr | qexpr
//! program : expr*
//! ```
//!
//! Numbers and symbols share one character class; a token is a number only
//! when the whole token has number shape. The tree borrows from the input and
//! keeps charbufs raw, escapes included; see [`crate::reader`] for the
//! conversion to values.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{cut, recognize},
    error::ErrorKind,
    sequence::pair,
};

use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Characters allowed in symbols besides ASCII letters and digits
pub const SYMBOL_SPECIAL_CHARS: &str = "_+-*/\\=<>!&%^~|";

/// Syntax tree node, borrowing from the parsed source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Syntax<'a> {
    Number(&'a str),
    Symbol(&'a str),
    /// Contents between the quotes, escapes not yet applied
    Charbuf(&'a str),
    Comment(&'a str),
    SExpr(Vec<Syntax<'a>>),
    QExpr(Vec<Syntax<'a>>),
}

/// Root of a parsed source: its top-level expressions in order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program<'a> {
    pub exprs: Vec<Syntax<'a>>,
}

pub fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Whether a whole token reads as a number rather than a symbol
fn is_number(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Parse a number or symbol token
fn parse_atom(input: &str) -> IResult<&str, Syntax<'_>> {
    let (remaining, token) = take_while1(is_symbol_char).parse(input)?;

    if is_number(token) {
        Ok((remaining, Syntax::Number(token)))
    } else {
        Ok((remaining, Syntax::Symbol(token)))
    }
}

/// Parse a string literal, keeping its escapes
fn parse_charbuf(input: &str) -> IResult<&str, Syntax<'_>> {
    let (body, _) = char('"').parse(input)?;
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((&body[i + 1..], Syntax::Charbuf(&body[..i]))),
            // The escaped character can never close the literal
            '\\' if chars.next().is_none() => break,
            _ => {}
        }
    }

    // Unterminated; nothing else can match from here
    Err(nom::Err::Failure(nom::error::Error::new(
        &body[body.len()..],
        ErrorKind::Eof,
    )))
}

fn parse_comment(input: &str) -> IResult<&str, Syntax<'_>> {
    let (remaining, comment) =
        recognize(pair(char(';'), take_while(|c: char| c != '\r' && c != '\n'))).parse(input)?;
    Ok((remaining, Syntax::Comment(comment)))
}

/// Parse a delimited list of expressions
fn parse_list(input: &str, depth: usize, (open, close): (char, char)) -> IResult<&str, Vec<Syntax<'_>>> {
    let (mut input, _) = char(open).parse(input)?;

    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }

    let mut items = Vec::new();
    loop {
        let (remaining, _) = multispace0.parse(input)?;
        if let Some(after) = remaining.strip_prefix(close) {
            return Ok((after, items));
        }
        if remaining.is_empty() {
            return Err(nom::Err::Failure(nom::error::Error::new(
                remaining,
                ErrorKind::Eof,
            )));
        }

        // Inside a list a bad element is fatal; no other branch could take it
        let (remaining, item) = cut(|input| parse_expr(input, depth + 1)).parse(remaining)?;
        items.push(item);
        input = remaining;
    }
}

fn parse_sexpr(input: &str, depth: usize) -> IResult<&str, Syntax<'_>> {
    let (remaining, items) = parse_list(input, depth, ('(', ')'))?;
    Ok((remaining, Syntax::SExpr(items)))
}

fn parse_qexpr(input: &str, depth: usize) -> IResult<&str, Syntax<'_>> {
    let (remaining, items) = parse_list(input, depth, ('{', '}'))?;
    Ok((remaining, Syntax::QExpr(items)))
}

fn parse_expr(input: &str, depth: usize) -> IResult<&str, Syntax<'_>> {
    alt((
        parse_comment,
        |input| parse_sexpr(input, depth),
        |input| parse_qexpr(input, depth),
        parse_charbuf,
        parse_atom,
    ))
    .parse(input)
}

/// Convert nom parsing errors to positioned parse errors
fn to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    let e = match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => {
            return ParseError::at_offset(
                ParseErrorKind::Incomplete,
                "unexpected end of input",
                input,
                input.len(),
            );
        }
    };

    let offset = input.len().saturating_sub(e.input.len());
    match e.code {
        ErrorKind::Eof => ParseError::at_offset(
            ParseErrorKind::Incomplete,
            "unexpected end of input",
            input,
            offset,
        ),
        ErrorKind::TooLarge => ParseError::at_offset(
            ParseErrorKind::TooDeeplyNested,
            format!("expression nested deeper than {MAX_PARSE_DEPTH} levels"),
            input,
            offset,
        ),
        _ => {
            let message = match e.input.chars().next() {
                Some(c) => format!("unexpected '{c}'"),
                None => "unexpected end of input".to_owned(),
            };
            ParseError::at_offset(ParseErrorKind::InvalidSyntax, message, input, offset)
        }
    }
}

/// Parse a whole source text into its top-level expressions
pub fn parse_program(input: &str) -> Result<Program<'_>, ParseError> {
    let mut exprs = Vec::new();
    let mut remaining = input;

    loop {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }
        match parse_expr(remaining, 0) {
            Ok((rest, expr)) => {
                exprs.push(expr);
                remaining = rest;
            }
            Err(err) => return Err(to_parse_error(input, err)),
        }
    }

    Ok(Program { exprs })
}
