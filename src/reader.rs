use crate::ast::{NumberType, Value};
use crate::parser::{Program, Syntax, parse_program};
use crate::{Error, ParseError};

/// Convert one syntax node; comments read as nothing
pub fn read(syntax: &Syntax<'_>) -> Option<Value> {
    match syntax {
        Syntax::Number(token) => Some(parse_integer(token).map_or_else(Value::from, Value::Number)),
        Syntax::Symbol(name) => Some(Value::Symbol((*name).to_owned())),
        Syntax::Charbuf(raw) => Some(Value::Text(unescape(raw))),
        Syntax::Comment(_) => None,
        Syntax::SExpr(items) => Some(Value::SExpr(read_all(items))),
        Syntax::QExpr(items) => Some(Value::QExpr(read_all(items))),
    }
}

fn read_all(items: &[Syntax<'_>]) -> Vec<Value> {
    items.iter().filter_map(read).collect()
}

/// The top-level expressions of a program
pub fn read_program(program: &Program<'_>) -> Vec<Value> {
    read_all(&program.exprs)
}

/// Parse and read source text into its top-level expressions
pub fn read_exprs(source: &str) -> Result<Vec<Value>, ParseError> {
    let program = parse_program(source)?;
    Ok(read_program(&program))
}

/// Parse and read source text; the program root is an S-expression
pub fn read_str(source: &str) -> Result<Value, ParseError> {
    read_exprs(source).map(Value::SExpr)
}

/// Integer literal in the style of `strtol` with base 0: `0x` selects
/// hexadecimal, a leading `0` octal, anything else decimal. Reading stops at
/// the first digit the base does not allow (`08` is 0); only overflow fails.
pub fn parse_integer(token: &str) -> Result<NumberType, Error> {
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1
        && let Some(octal) = unsigned.strip_prefix('0')
    {
        (8, octal)
    } else {
        (10, unsigned)
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return Ok(0);
    }

    // Re-attach the sign so the most negative value does not overflow
    let signed = if negative {
        format!("-{digits}")
    } else {
        digits.to_owned()
    };
    NumberType::from_str_radix(&signed, radix).map_err(|_| Error::InvalidNumber)
}

/// Apply C-style escapes; an unknown escape keeps the escaped character
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\x0b'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{err, num, qexpr, sexpr, sym, text};
    use crate::printer::to_string;
    use crate::evaluator::create_global_env;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_integer_data_driven() {
        let test_cases = vec![
            ("0", Ok(0)),
            ("42", Ok(42)),
            ("-42", Ok(-42)),
            ("010", Ok(8)),
            ("-010", Ok(-8)),
            ("0x1F", Ok(31)),
            ("0XfF", Ok(255)),
            ("-0x10", Ok(-16)),
            ("9223372036854775807", Ok(i64::MAX)),
            ("-9223372036854775808", Ok(i64::MIN)),
            ("9223372036854775808", Err(Error::InvalidNumber)),
            ("-9223372036854775809", Err(Error::InvalidNumber)),
            // Digits past the first one invalid for the base are ignored
            ("08", Ok(0)),
            ("09", Ok(0)),
            ("0178", Ok(15)),
            ("-019", Ok(-1)),
            ("0x", Ok(0)),
            ("0x-1", Ok(0)),
            ("", Ok(0)),
        ];

        for (input, expected) in test_cases {
            assert_eq!(parse_integer(input), expected, "parse_integer({input:?})");
        }
    }

    #[test]
    fn test_unescape_data_driven() {
        let test_cases = vec![
            ("plain", "plain"),
            ("a\\nb", "a\nb"),
            ("\\t\\r\\v\\f\\a\\b\\0", "\t\r\x0b\x0c\x07\x08\0"),
            ("\\\"q\\\"", "\"q\""),
            ("\\\\", "\\"),
            ("\\'\\?", "'?"),
            ("\\q", "q"),
        ];

        for (input, expected) in test_cases {
            assert_eq!(unescape(input), expected, "unescape({input:?})");
        }
    }

    #[test]
    fn test_read_str() {
        let test_cases = vec![
            ("", sexpr(vec![])),
            ("1 2", sexpr(vec![num(1), num(2)])),
            (
                "(+ 1 {a \"b\\n\"}) ; trailing comment",
                sexpr(vec![sexpr(vec![
                    sym("+"),
                    num(1),
                    qexpr(vec![sym("a"), text("b\n")]),
                ])]),
            ),
            ("{1 ; inner\n 2}", sexpr(vec![qexpr(vec![num(1), num(2)])])),
            // A bad literal becomes an error value in place
            ("(+ 1 99999999999999999999)", sexpr(vec![sexpr(vec![
                sym("+"),
                num(1),
                err("invalid number"),
            ])])),
        ];

        for (input, expected) in test_cases {
            assert_eq!(read_str(input).unwrap(), expected, "read_str({input:?})");
        }

        assert!(read_str("(unclosed").is_err());
    }

    #[test]
    fn test_print_then_read_charbuf() {
        let env = create_global_env();
        let original = text("tab\there \"quoted\" back\\slash");
        let printed = to_string(&env, &original);
        assert_eq!(read_str(&printed).unwrap(), sexpr(vec![original]));
    }
}
