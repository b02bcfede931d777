//! qlisp - a small Lisp with quoted expressions
//!
//! This crate implements a dynamically typed Lisp dialect built around two list
//! forms: S-expressions, which are evaluated eagerly, and Q-expressions, which are
//! quoted data that only run when handed to `eval`, `if` or a lambda body.
//!
//! ```text
//! (+ 1 2 3)                       ; arithmetic
//! (head {1 2 3})                  ; quoted list operations
//! (def {add} (\ {a b} {+ a b}))   ; lambdas bound globally
//! (def {inc} (add 1))             ; partial application
//! (\ {x & xs} {xs})               ; variadic formals
//! ```
//!
//! ## Errors are values
//!
//! Every failure is represented as a `Value::Error`. Errors are not thrown; they
//! become the result of the expression that produced them and flow onward like
//! any other value. A builtin receiving an error where it expects a number
//! reports its own type error about it, so failures cascade rather than
//! propagate verbatim.
//!
//! ## Modules
//!
//! - `ast`: the `Value` type, structural equality and type names
//! - `environment`: name bindings with a parent chain and the session console
//! - `evaluator`: `eval`, S-expression evaluation and function application
//! - `builtinops`: the native operation catalog
//! - `parser` / `reader`: source text to syntax tree to values
//! - `printer`: the textual form of values
//! - `loader`: evaluating source files
//! - `prelude`: the standard library written in the language itself

use std::fmt;

use thiserror::Error;

/// Maximum nesting depth accepted by the parser.
/// Evaluation depth is not limited; the evaluator grows the stack on demand.
pub const MAX_PARSE_DEPTH: usize = 256;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, unbalanced closing brackets)
    InvalidSyntax,
    /// Input ended before the expression was complete (unterminated string, unclosed list)
    Incomplete,
    /// Expression nesting exceeded `MAX_PARSE_DEPTH`
    TooDeeplyNested,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidSyntax => write!(f, "invalid syntax"),
            ParseErrorKind::Incomplete => write!(f, "incomplete input"),
            ParseErrorKind::TooDeeplyNested => write!(f, "too deeply nested"),
        }
    }
}

/// A structured error describing a parse failure.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("{line}:{column}: {kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// 1-based line of the failure
    pub line: usize,
    /// 1-based column of the failure
    pub column: usize,
    /// Snippet of the input starting near the failure (max 40 chars)
    pub context: Option<String>,
}

impl ParseError {
    /// Create a ParseError positioned at `offset` bytes into `input`
    pub fn at_offset(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 40;

        let offset = offset.min(input.len());
        let consumed = &input[..offset];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |last| last.chars().count())
            + 1;

        let snippet: String = input[offset..].chars().take(MAX_CONTEXT).collect();
        let context = if snippet.is_empty() {
            None
        } else {
            Some(snippet.replace('\n', "\\n").replace('\r', ""))
        };

        ParseError {
            kind,
            message: message.into(),
            line,
            column,
            context,
        }
    }
}

/// The error catalog.
///
/// Every diagnosable failure of the runtime is one of these. The `Display` text
/// is the message carried by the resulting `Value::Error`, and test suites assert
/// on it, so the wording here is part of the language.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Wrong number of arguments for a fixed-arity function
    #[error(
        "Function '{func}' passed {} arguments. Got {received}, expected {expected}",
        quantity(.expected, .received)
    )]
    Arity {
        func: String,
        expected: usize,
        received: usize,
    },
    /// Fewer arguments than a variadic function accepts
    #[error("Function '{func}' passed too few arguments. Expected {min} or more arguments")]
    TooFew { func: String, min: usize },
    /// More arguments than a function can bind
    #[error("Function '{func}' passed too many arguments. Expected no more than {max} arguments")]
    TooMany { func: String, max: usize },
    /// An argument of the wrong variant
    #[error("Function '{func}' passed incorrect type. Got {received}, expected {expected}")]
    Type {
        func: String,
        expected: &'static str,
        received: &'static str,
    },
    /// Arguments that must share a variant but do not
    #[error("Function '{func}' passed multiple types. Expected one type but receive {first} and {second}")]
    MultipleTypes {
        func: String,
        first: &'static str,
        second: &'static str,
    },
    /// Free-form failure attributed to a function
    #[error("Function '{func}' {message}")]
    Function { func: String, message: String },
    #[error("unbound symbol '{0}'")]
    Unbound(String),
    #[error("Division By Zero!")]
    DivisionByZero,
    #[error("Modulo By Zero!")]
    ModuloByZero,
    #[error("Integer overflow in {0}")]
    Overflow(&'static str),
    #[error("invalid number")]
    InvalidNumber,
    /// Message raised from user code (`error`, `assert`, `assert_err`)
    #[error("{0}")]
    User(String),
    #[error("Could not load {0}")]
    Load(String),
}

fn quantity(expected: &usize, received: &usize) -> &'static str {
    if expected < received {
        "too many"
    } else {
        "too few"
    }
}

impl Error {
    /// Arity error for a fixed-arity function given `received` arguments
    pub fn arity(func: impl Into<String>, expected: usize, received: usize) -> Self {
        Error::Arity {
            func: func.into(),
            expected,
            received,
        }
    }

    pub fn too_few(func: impl Into<String>, min: usize) -> Self {
        Error::TooFew {
            func: func.into(),
            min,
        }
    }

    pub fn too_many(func: impl Into<String>, max: usize) -> Self {
        Error::TooMany {
            func: func.into(),
            max,
        }
    }

    pub fn type_mismatch(
        func: impl Into<String>,
        expected: &'static str,
        received: &'static str,
    ) -> Self {
        Error::Type {
            func: func.into(),
            expected,
            received,
        }
    }

    pub fn multiple_types(func: impl Into<String>, first: &'static str, second: &'static str) -> Self {
        Error::MultipleTypes {
            func: func.into(),
            first,
            second,
        }
    }

    pub fn function(func: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Function {
            func: func.into(),
            message: message.into(),
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod environment;
pub mod evaluator;
pub mod loader;
pub mod parser;
pub mod prelude;
pub mod printer;
pub mod reader;

pub use ast::Value;
pub use environment::Environment;
pub use evaluator::{create_global_env, eval};
