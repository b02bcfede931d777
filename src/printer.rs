//! Textual form of values.
//!
//! [`to_string`] is the formatting entry point used by the REPL, `print`,
//! `error` and `assert`. Functions print under the name they are bound to in
//! the given environment; the plain `Display` impl on [`Value`] has no
//! environment and prints lambdas anonymously.

use std::fmt::{self, Write};

use crate::ast::{Function, Value};
use crate::environment::Environment;

/// Name printed for a lambda nobody has bound
pub(crate) const ANONYMOUS: &str = "\\";

/// A value paired with the environment used to name its functions
pub struct Rendered<'a, 'e> {
    value: &'a Value,
    env: Option<&'a Environment<'e>>,
}

impl fmt::Display for Rendered<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.value, self.env)
    }
}

/// Render `value` with function names resolved through `env`
pub fn render<'a, 'e>(env: &'a Environment<'e>, value: &'a Value) -> Rendered<'a, 'e> {
    Rendered {
        value,
        env: Some(env),
    }
}

pub fn to_string(env: &Environment<'_>, value: &Value) -> String {
    render(env, value).to_string()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, None)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, env: Option<&Environment<'_>>) -> fmt::Result {
    match value {
        Value::Error(message) => write!(f, "Err: {message}"),
        Value::Number(n) => write!(f, "{n}"),
        Value::Symbol(name) => f.write_str(name),
        Value::Text(content) => {
            f.write_char('"')?;
            write_escaped(f, content)?;
            f.write_char('"')
        }
        Value::SExpr(cells) => write_cells(f, cells, ('(', ')'), env),
        Value::QExpr(cells) => write_cells(f, cells, ('{', '}'), env),
        Value::Function(function) => {
            let bound = env.and_then(|env| env.name_of(function));
            match function {
                Function::Native(op) => {
                    write!(f, "<builtin function '{}'>", bound.unwrap_or(op.name))
                }
                Function::Closure(lambda) => {
                    write!(f, "{} {{", bound.unwrap_or(ANONYMOUS))?;
                    for (i, formal) in lambda.formals.iter().enumerate() {
                        if i > 0 {
                            f.write_char(' ')?;
                        }
                        f.write_str(formal)?;
                    }
                    f.write_str("} ")?;
                    write_cells(f, &lambda.body, ('{', '}'), env)
                }
            }
        }
    }
}

fn write_cells(
    f: &mut fmt::Formatter<'_>,
    cells: &[Value],
    (open, close): (char, char),
    env: Option<&Environment<'_>>,
) -> fmt::Result {
    f.write_char(open)?;
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        write_value(f, cell, env)?;
    }
    f.write_char(close)
}

/// C-style escaping, the inverse of the reader's unescaping
fn write_escaped(f: &mut fmt::Formatter<'_>, content: &str) -> fmt::Result {
    for c in content.chars() {
        match c {
            '\x07' => f.write_str("\\a")?,
            '\x08' => f.write_str("\\b")?,
            '\x0c' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\x0b' => f.write_str("\\v")?,
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\0' => f.write_str("\\0")?,
            other => f.write_char(other)?,
        }
    }
    Ok(())
}
