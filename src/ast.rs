//! This module defines the core value type of the interpreter. The main enum,
//! [`Value`], covers every datum the evaluator works with: numbers, symbols,
//! text, errors, functions, and the two list forms (S-expressions, evaluated
//! eagerly, and Q-expressions, kept quoted). Values own their children
//! exclusively; `Clone` is a deep copy and no two live values share a subtree.
//!
//! Equality is structural. Builtins compare by operation identity and lambdas
//! compare their formals and body only, never the bindings they carry.
//! Helpers such as [`num`], [`sym`], [`text`], [`qexpr`] and [`sexpr`] keep
//! tree construction terse in code and tests.

use std::fmt;

use crate::Error;
use crate::builtinops::BuiltinOp;
use crate::environment::Bindings;

/// Type alias for number values in the interpreter
pub type NumberType = i64;

/// The variant of a value, with the canonical name used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Error,
    Number,
    Symbol,
    Charbuf,
    Function,
    Builtin,
    SExpr,
    QExpr,
}

impl Type {
    pub const fn name(self) -> &'static str {
        match self {
            Type::Error => "Error",
            Type::Number => "Number",
            Type::Symbol => "Symbol",
            Type::Charbuf => "Charbuf",
            Type::Function => "Function",
            Type::Builtin => "Builtin",
            Type::SExpr => "S-Expression",
            Type::QExpr => "Q-Expression",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user-defined function.
///
/// `formals` holds the names still waiting for an argument; a partially applied
/// lambda has fewer formals than it was built with and the already supplied
/// arguments sit in `env`.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub formals: Vec<String>,
    /// Elements of the quoted body, evaluated as an S-expression when called
    pub body: Vec<Value>,
    /// Bindings owned by this lambda
    pub env: Bindings,
}

impl Lambda {
    pub fn new(formals: Vec<String>, body: Vec<Value>) -> Self {
        Lambda {
            formals,
            body,
            env: Bindings::default(),
        }
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        // Captured bindings do not take part
        self.formals == other.formals && self.body == other.body
    }
}

/// Anything that can sit at the head of an S-expression and be applied.
#[derive(Clone)]
pub enum Function {
    /// Native operation from the builtin catalog
    Native(&'static BuiltinOp),
    /// User-defined lambda
    Closure(Lambda),
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(op) => write!(f, "Native({})", op.name),
            Function::Closure(lambda) => write!(
                f,
                "Closure(formals={:?}, body={:?})",
                lambda.formals, lambda.body
            ),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Same registry entry, not same behavior
            (Function::Native(a), Function::Native(b)) => std::ptr::eq(*a, *b),
            (Function::Closure(a), Function::Closure(b)) => a == b,
            _ => false,
        }
    }
}

/// Core value type of the interpreter
///
/// To build values, use the helper functions:
/// - `num(42)` for numbers, `sym("name")` for symbols, `text("hi")` for strings
/// - `qexpr(vec![...])` and `sexpr(vec![...])` for lists
/// - `val(x)` for anything with a `From` conversion
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A diagnostic; errors are ordinary values
    Error(String),
    Number(NumberType),
    /// Identifier, resolved through the environment when evaluated
    Symbol(String),
    /// String literal, held unescaped
    Text(String),
    Function(Function),
    /// Expression list, evaluated as a call
    SExpr(Vec<Value>),
    /// Quoted list, never evaluated implicitly
    QExpr(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> Type {
        match self {
            Value::Error(_) => Type::Error,
            Value::Number(_) => Type::Number,
            Value::Symbol(_) => Type::Symbol,
            Value::Text(_) => Type::Charbuf,
            Value::Function(Function::Native(_)) => Type::Builtin,
            Value::Function(Function::Closure(_)) => Type::Function,
            Value::SExpr(_) => Type::SExpr,
            Value::QExpr(_) => Type::QExpr,
        }
    }

    /// Canonical display name of this value's variant
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The empty S-expression `()`, returned by side-effecting builtins
    pub fn unit() -> Value {
        Value::SExpr(Vec::new())
    }

    pub fn lambda(formals: Vec<String>, body: Vec<Value>) -> Value {
        Value::Function(Function::Closure(Lambda::new(formals, body)))
    }
}

impl From<Error> for Value {
    fn from(error: Error) -> Self {
        Value::Error(error.to_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Number(NumberType::from(b))
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    /// Arrays become Q-expressions, the data form of a list
    fn from(arr: [T; N]) -> Self {
        Value::QExpr(arr.into_iter().map(Into::into).collect())
    }
}

pub fn num(n: NumberType) -> Value {
    Value::Number(n)
}

pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

pub fn text<S: AsRef<str>>(content: S) -> Value {
    Value::Text(content.as_ref().to_owned())
}

pub fn err<S: AsRef<str>>(message: S) -> Value {
    Value::Error(message.as_ref().to_owned())
}

pub fn sexpr(cells: Vec<Value>) -> Value {
    Value::SExpr(cells)
}

pub fn qexpr(cells: Vec<Value>) -> Value {
    Value::QExpr(cells)
}

/// Convert anything with a `From` impl into a value
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}
