//! Built-in operations registry.
//!
//! Every native operation the language offers is listed once in
//! [`BUILTIN_OPS`] and bound into the root environment by
//! [`crate::evaluator::create_global_env`].
//!
//! ```text
//! (+ 1 2 3)            ; arithmetic, left fold
//! (== {1 2} {1 2})     ; structural equality
//! (head {1 2 3})       ; quoted list access
//! (def {x} 10)         ; global binding
//! ```
//!
//! ## Calling convention
//!
//! A builtin receives the calling environment and its evaluated arguments by
//! value. It validates arity and argument types before computing anything and
//! reports failures as an [`Error`]; the applier turns that into a
//! `Value::Error`, so the argument vector never outlives a failed call.
//!
//! Error messages name the function by a fixed identifier which is not always
//! the bound symbol: the arithmetic operators report as `add`, `sub`, `mul`,
//! `div` and `mod`, everything else reports under its own name.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with the [`BuiltinFn`] signature
//! 2. **Add it to BUILTIN_OPS** under the symbol it is bound to
//! 3. **Add tests** covering the success path and each validation failure

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{NumberType, Type, Value};
use crate::environment::Environment;
use crate::evaluator::eval;
use crate::{loader, printer};

/// Canonical builtin signature
pub type BuiltinFn = fn(&mut Environment<'_>, Vec<Value>) -> Result<Value, Error>;

/// Definition of a built-in operation
pub struct BuiltinOp {
    /// Symbol the operation is bound to in the root environment
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl std::fmt::Debug for BuiltinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuiltinOp({})", self.name)
    }
}

//
// Argument validation helpers
//

/// Destructure exactly `N` arguments or report an arity error
fn exact<const N: usize>(func: &str, args: Vec<Value>) -> Result<[Value; N], Error> {
    let received = args.len();
    args.try_into()
        .map_err(|_: Vec<Value>| Error::arity(func, N, received))
}

fn at_least(func: &str, args: &[Value], min: usize) -> Result<(), Error> {
    if args.len() < min {
        return Err(Error::too_few(func, min));
    }
    Ok(())
}

fn number(func: &str, value: &Value) -> Result<NumberType, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(Error::type_mismatch(
            func,
            Type::Number.name(),
            other.type_name(),
        )),
    }
}

/// Every argument as a number; the first non-number is reported
fn numbers(func: &str, args: &[Value]) -> Result<Vec<NumberType>, Error> {
    args.iter().map(|arg| number(func, arg)).collect()
}

fn quoted(func: &str, value: Value) -> Result<Vec<Value>, Error> {
    match value {
        Value::QExpr(cells) => Ok(cells),
        other => Err(Error::type_mismatch(
            func,
            Type::QExpr.name(),
            other.type_name(),
        )),
    }
}

fn charbuf(func: &str, value: Value) -> Result<String, Error> {
    match value {
        Value::Text(content) => Ok(content),
        other => Err(Error::type_mismatch(
            func,
            Type::Charbuf.name(),
            other.type_name(),
        )),
    }
}

/// A Q-expression made only of symbols, as taken by `def`, `=` and `\`
fn symbol_list(func: &str, value: Value) -> Result<Vec<String>, Error> {
    quoted(func, value)?
        .into_iter()
        .map(|cell| match cell {
            Value::Symbol(name) => Ok(name),
            other => Err(Error::type_mismatch(
                func,
                Type::Symbol.name(),
                other.type_name(),
            )),
        })
        .collect()
}

fn non_empty(func: &str, cells: &[Value]) -> Result<(), Error> {
    if cells.is_empty() {
        return Err(Error::function(func, "passed {}"));
    }
    Ok(())
}

//
// Arithmetic
//

#[derive(Debug, Clone, Copy)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Arith {
    fn func(self) -> &'static str {
        match self {
            Arith::Add => "add",
            Arith::Sub => "sub",
            Arith::Mul => "mul",
            Arith::Div => "div",
            Arith::Mod => "mod",
        }
    }

    fn apply(self, x: NumberType, y: NumberType) -> Result<NumberType, Error> {
        match self {
            Arith::Add => x.checked_add(y).ok_or(Error::Overflow("addition")),
            Arith::Sub => x.checked_sub(y).ok_or(Error::Overflow("subtraction")),
            Arith::Mul => x.checked_mul(y).ok_or(Error::Overflow("multiplication")),
            Arith::Div if y == 0 => Err(Error::DivisionByZero),
            Arith::Div => x.checked_div(y).ok_or(Error::Overflow("division")),
            Arith::Mod if y == 0 => Err(Error::ModuloByZero),
            Arith::Mod => x.checked_rem(y).ok_or(Error::Overflow("modulo")),
        }
    }
}

fn arithmetic(op: Arith, args: &[Value]) -> Result<Value, Error> {
    let func = op.func();
    let operands = numbers(func, args)?;
    let Some((&first, rest)) = operands.split_first() else {
        return Err(Error::too_few(func, 1));
    };

    if rest.is_empty() && matches!(op, Arith::Sub) {
        return first
            .checked_neg()
            .map(Value::Number)
            .ok_or(Error::Overflow("negation"));
    }

    rest.iter()
        .try_fold(first, |acc, &y| op.apply(acc, y))
        .map(Value::Number)
}

macro_rules! arithmetic_op {
    ($name:ident, $op:expr) => {
        fn $name(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
            arithmetic($op, &args)
        }
    };
}

arithmetic_op!(builtin_add, Arith::Add);
arithmetic_op!(builtin_sub, Arith::Sub);
arithmetic_op!(builtin_mul, Arith::Mul);
arithmetic_op!(builtin_div, Arith::Div);
arithmetic_op!(builtin_mod, Arith::Mod);

//
// Comparison
//

macro_rules! numeric_comparison {
    ($name:ident, $op:tt, $id:expr) => {
        fn $name(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
            let [x, y] = exact::<2>($id, args)?;
            let x = number($id, &x)?;
            let y = number($id, &y)?;
            Ok(Value::from(x $op y))
        }
    };
}

numeric_comparison!(builtin_lt, <, "<");
numeric_comparison!(builtin_le, <=, "<=");
numeric_comparison!(builtin_gt, >, ">");
numeric_comparison!(builtin_ge, >=, ">=");

/// Structural equality over adjacent pairs, stopping at the first mismatch.
fn builtin_eq(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    at_least("==", &args, 2)?;

    let mut equal = false;
    for pair in args.windows(2) {
        equal = pair[0] == pair[1];
        if !equal {
            break;
        }
    }
    Ok(Value::from(equal))
}

fn builtin_ne(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [x, y] = exact::<2>("!=", args)?;
    Ok(Value::from(x != y))
}

//
// Logical and bitwise
//

/// Validate numeric operands for a fold operator with an optional unary form
fn fold_operands(func: &str, args: &[Value]) -> Result<(NumberType, Vec<NumberType>), Error> {
    let mut operands = numbers(func, args)?.into_iter();
    let Some(first) = operands.next() else {
        return Err(Error::too_few(func, 1));
    };
    Ok((first, operands.collect()))
}

/// Unary operator: exactly one numeric operand
fn unary_operand(func: &str, args: &[Value]) -> Result<NumberType, Error> {
    let (x, rest) = fold_operands(func, args)?;
    if !rest.is_empty() {
        return Err(Error::arity(func, 1, args.len()));
    }
    Ok(x)
}

macro_rules! fold_op {
    ($name:ident, $id:expr, |$x:ident, $y:ident| $body:expr) => {
        fn $name(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
            let (first, rest) = fold_operands($id, &args)?;
            let result = rest.into_iter().fold(first, |$x, $y| $body);
            Ok(Value::Number(result))
        }
    };
}

fold_op!(builtin_and, "&&", |x, y| NumberType::from(x != 0 && y != 0));
fold_op!(builtin_or, "||", |x, y| NumberType::from(x != 0 || y != 0));
fold_op!(builtin_bit_and, "&", |x, y| x & y);
fold_op!(builtin_bit_or, "|", |x, y| x | y);
fold_op!(builtin_bit_xor, "^", |x, y| x ^ y);
// Shift amounts are taken modulo the word size
fold_op!(builtin_shl, "<<", |x, y| x.wrapping_shl(y as u32));
fold_op!(builtin_shr, ">>", |x, y| x.wrapping_shr(y as u32));

fn builtin_not(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let x = unary_operand("!", &args)?;
    Ok(Value::from(x == 0))
}

fn builtin_bit_not(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let x = unary_operand("~", &args)?;
    Ok(Value::Number(!x))
}

//
// List operations
//

fn builtin_list(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::QExpr(args))
}

fn builtin_head(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [list] = exact::<1>("head", args)?;
    let mut cells = quoted("head", list)?;
    non_empty("head", &cells)?;
    cells.truncate(1);
    Ok(Value::QExpr(cells))
}

fn builtin_tail(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [list] = exact::<1>("tail", args)?;
    let mut cells = quoted("tail", list)?;
    non_empty("tail", &cells)?;
    cells.remove(0);
    Ok(Value::QExpr(cells))
}

fn builtin_eval(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [list] = exact::<1>("eval", args)?;
    let cells = quoted("eval", list)?;
    Ok(eval(env, Value::SExpr(cells)))
}

/// Concatenate Q-expressions or Charbufs; every argument must share the first one's type.
fn builtin_join(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    const EXPECTED: &str = "Q-Expression or Charbuf";

    let Some(first) = args.first().map(Value::kind) else {
        return Err(Error::too_few("join", 1));
    };
    for arg in &args {
        match arg.kind() {
            kind @ (Type::QExpr | Type::Charbuf) if kind != first => {
                return Err(Error::multiple_types("join", first.name(), kind.name()));
            }
            Type::QExpr | Type::Charbuf => {}
            other => return Err(Error::type_mismatch("join", EXPECTED, other.name())),
        }
    }

    if first == Type::Charbuf {
        let joined: String = args
            .into_iter()
            .filter_map(|arg| match arg {
                Value::Text(content) => Some(content),
                _ => None,
            })
            .collect();
        return Ok(Value::Text(joined));
    }

    let joined = args
        .into_iter()
        .flat_map(|arg| match arg {
            Value::QExpr(cells) => cells,
            _ => Vec::new(),
        })
        .collect();
    Ok(Value::QExpr(joined))
}

//
// Binding and functions
//

/// Shared implementation of `def` (root scope) and `=` (current scope)
fn bind(func: &str, env: &mut Environment<'_>, args: Vec<Value>, global: bool) -> Result<Value, Error> {
    let mut args = args.into_iter();
    let Some(names) = args.next() else {
        return Err(Error::too_few(func, 1));
    };
    let names = symbol_list(func, names)?;

    let values: Vec<Value> = args.collect();
    if names.len() != values.len() {
        return Err(Error::function(
            func,
            format!(
                "Number of symbols must match number of values.\n\n\tlen({{{}}}) == ({}) symbol(s) given but {} values given",
                names.join(" "),
                names.len(),
                values.len()
            ),
        ));
    }

    for (name, value) in names.iter().zip(values) {
        if global {
            env.def(name, value);
        } else {
            env.put(name, value);
        }
    }
    Ok(Value::unit())
}

fn builtin_def(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    bind("def", env, args, true)
}

fn builtin_put(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    bind("=", env, args, false)
}

fn builtin_lambda(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [formals, body] = exact::<2>("\\", args)?;
    if !matches!(body, Value::QExpr(_)) {
        return Err(Error::type_mismatch(
            "\\",
            Type::QExpr.name(),
            body.type_name(),
        ));
    }
    let formals = symbol_list("\\", formals)?;
    let body = quoted("\\", body)?;
    Ok(Value::lambda(formals, body))
}

fn builtin_if(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [condition, consequent, alternative] = exact::<3>("if", args)?;
    let condition = number("if", &condition)?;
    let consequent = quoted("if", consequent)?;
    let alternative = quoted("if", alternative)?;

    let branch = if condition != 0 {
        consequent
    } else {
        alternative
    };
    Ok(eval(env, Value::SExpr(branch)))
}

//
// Introspection, diagnostics and I/O
//

fn builtin_type(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [value] = exact::<1>("type", args)?;
    Ok(Value::Text(value.type_name().to_owned()))
}

/// Build an Error value from the arguments, Charbufs contributing their raw content
fn builtin_error(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    at_least("error", &args, 1)?;
    let message: String = args
        .iter()
        .map(|arg| match arg {
            Value::Text(content) => content.clone(),
            other => printer::to_string(env, other),
        })
        .collect();
    Err(Error::User(message))
}

fn builtin_print(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let line = args
        .iter()
        .map(|arg| printer::to_string(env, arg))
        .collect::<Vec<_>>()
        .join(" ");
    env.console().print_line(&line);
    Ok(Value::unit())
}

fn builtin_assert(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [left, right] = exact::<2>("assert", args)?;
    let left = eval(env, left);
    let right = eval(env, right);
    if left == right {
        return Ok(Value::Number(1));
    }
    Err(Error::User(format!(
        "assert failed [{}] != [{}]",
        printer::to_string(env, &left),
        printer::to_string(env, &right)
    )))
}

fn builtin_assert_err(_env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [error, needle] = exact::<2>("assert_err", args)?;
    let message = match error {
        Value::Error(message) => message,
        other => {
            return Err(Error::type_mismatch(
                "assert_err",
                Type::Error.name(),
                other.type_name(),
            ));
        }
    };
    let needle = charbuf("assert_err", needle)?;

    if message.contains(&needle) {
        return Ok(Value::Number(1));
    }
    Err(Error::User(format!(
        "assert failed \"{message}\" does not contain \"{needle}\""
    )))
}

fn builtin_load(env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value, Error> {
    let [path] = exact::<1>("load", args)?;
    let path = charbuf("load", path)?;
    Ok(loader::load(env, Path::new(&path)))
}

/// Global registry of all built-in operations, in binding order.
static BUILTIN_OPS: &[BuiltinOp] = &[
    // List operations
    BuiltinOp { name: "list", func: builtin_list },
    BuiltinOp { name: "head", func: builtin_head },
    BuiltinOp { name: "tail", func: builtin_tail },
    BuiltinOp { name: "eval", func: builtin_eval },
    BuiltinOp { name: "join", func: builtin_join },
    // Arithmetic
    BuiltinOp { name: "+", func: builtin_add },
    BuiltinOp { name: "-", func: builtin_sub },
    BuiltinOp { name: "*", func: builtin_mul },
    BuiltinOp { name: "/", func: builtin_div },
    BuiltinOp { name: "%", func: builtin_mod },
    // Variables and functions
    BuiltinOp { name: "\\", func: builtin_lambda },
    BuiltinOp { name: "def", func: builtin_def },
    BuiltinOp { name: "=", func: builtin_put },
    // Comparison
    BuiltinOp { name: "if", func: builtin_if },
    BuiltinOp { name: "==", func: builtin_eq },
    BuiltinOp { name: "!=", func: builtin_ne },
    BuiltinOp { name: ">", func: builtin_gt },
    BuiltinOp { name: "<", func: builtin_lt },
    BuiltinOp { name: ">=", func: builtin_ge },
    BuiltinOp { name: "<=", func: builtin_le },
    // Logical
    BuiltinOp { name: "&&", func: builtin_and },
    BuiltinOp { name: "||", func: builtin_or },
    BuiltinOp { name: "!", func: builtin_not },
    // Bitwise
    BuiltinOp { name: "~", func: builtin_bit_not },
    BuiltinOp { name: "|", func: builtin_bit_or },
    BuiltinOp { name: "&", func: builtin_bit_and },
    BuiltinOp { name: "^", func: builtin_bit_xor },
    BuiltinOp { name: ">>", func: builtin_shr },
    BuiltinOp { name: "<<", func: builtin_shl },
    // Introspection and I/O
    BuiltinOp { name: "type", func: builtin_type },
    BuiltinOp { name: "error", func: builtin_error },
    BuiltinOp { name: "print", func: builtin_print },
    BuiltinOp { name: "load", func: builtin_load },
    // Testing
    BuiltinOp { name: "assert", func: builtin_assert },
    BuiltinOp { name: "assert_err", func: builtin_assert_err },
];

/// Lazy static map from name to BuiltinOp (private - use find_builtin_op)
static BUILTIN_BY_NAME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.name, op)).collect());

/// All registered operations, in binding order
pub fn builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

/// Find a builtin operation by the symbol it is bound to
pub fn find_builtin_op(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_BY_NAME.get(name).copied()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{err, num, qexpr, sym, text, val};
    use pretty_assertions::assert_eq;

    /// Call a builtin directly with already evaluated arguments
    fn call(name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let op = find_builtin_op(name).unwrap();
        let mut env = Environment::new();
        (op.func)(&mut env, args)
    }

    fn run_cases(cases: Vec<(&str, Vec<Value>, Result<Value, &str>)>) {
        for (i, (name, args, expected)) in cases.into_iter().enumerate() {
            let actual = call(name, args).map_err(|e| e.to_string());
            let expected = expected.map_err(str::to_owned);
            assert_eq!(actual, expected, "case #{} ({name})", i + 1);
        }
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(builtin_ops().len(), BUILTIN_BY_NAME.len());
        for name in ["+", "head", "\\", "def", "=", "==", "&&", "<<", "assert_err"] {
            assert_eq!(find_builtin_op(name).unwrap().name, name);
        }
        assert!(find_builtin_op("unknown").is_none());
        assert!(find_builtin_op("add").is_none());
    }

    #[test]
    fn test_builtins_data_driven() {
        run_cases(vec![
            // Arithmetic
            ("+", vec![num(1), num(2), num(3)], Ok(num(6))),
            ("+", vec![num(7)], Ok(num(7))),
            ("-", vec![num(10), num(3), num(2)], Ok(num(5))),
            ("-", vec![num(5)], Ok(num(-5))),
            ("*", vec![num(2), num(3), num(4)], Ok(num(24))),
            ("/", vec![num(20), num(2), num(5)], Ok(num(2))),
            ("/", vec![num(-7), num(2)], Ok(num(-3))),
            ("%", vec![num(-7), num(2)], Ok(num(-1))),
            ("/", vec![num(1), num(0)], Err("Division By Zero!")),
            ("%", vec![num(1), num(0)], Err("Modulo By Zero!")),
            ("+", vec![num(i64::MAX), num(1)], Err("Integer overflow in addition")),
            ("-", vec![num(i64::MIN)], Err("Integer overflow in negation")),
            ("/", vec![num(i64::MIN), num(-1)], Err("Integer overflow in division")),
            (
                "+",
                vec![num(1), text("2")],
                Err("Function 'add' passed incorrect type. Got Charbuf, expected Number"),
            ),
            (
                "*",
                vec![num(1), err("boom")],
                Err("Function 'mul' passed incorrect type. Got Error, expected Number"),
            ),
            (
                "-",
                vec![],
                Err("Function 'sub' passed too few arguments. Expected 1 or more arguments"),
            ),
            // Comparison
            ("<", vec![num(1), num(2)], Ok(num(1))),
            (">=", vec![num(1), num(2)], Ok(num(0))),
            ("<=", vec![num(2), num(2)], Ok(num(1))),
            (
                ">",
                vec![num(1), num(2), num(3)],
                Err("Function '>' passed too many arguments. Got 3, expected 2"),
            ),
            (
                "<",
                vec![num(1), sym("x")],
                Err("Function '<' passed incorrect type. Got Symbol, expected Number"),
            ),
            ("==", vec![num(1), num(1), num(1)], Ok(num(1))),
            ("==", vec![num(1), num(2), num(2)], Ok(num(0))),
            ("==", vec![qexpr(vec![num(1)]), qexpr(vec![num(1)])], Ok(num(1))),
            ("==", vec![text("a"), sym("a")], Ok(num(0))),
            (
                "==",
                vec![num(1)],
                Err("Function '==' passed too few arguments. Expected 2 or more arguments"),
            ),
            ("!=", vec![num(1), num(2)], Ok(num(1))),
            ("!=", vec![text("a"), text("a")], Ok(num(0))),
            // Logical
            ("&&", vec![num(1), num(5)], Ok(num(1))),
            ("&&", vec![num(1), num(0)], Ok(num(0))),
            ("&&", vec![num(7)], Ok(num(7))),
            ("||", vec![num(0), num(0), num(3)], Ok(num(1))),
            ("!", vec![num(0)], Ok(num(1))),
            ("!", vec![num(9)], Ok(num(0))),
            (
                "!",
                vec![num(1), num(2)],
                Err("Function '!' passed too many arguments. Got 2, expected 1"),
            ),
            // Bitwise
            ("&", vec![num(12), num(10)], Ok(num(8))),
            ("|", vec![num(12), num(10)], Ok(num(14))),
            ("^", vec![num(12), num(10)], Ok(num(6))),
            ("~", vec![num(0)], Ok(num(-1))),
            (
                "~",
                vec![num(1), num(2)],
                Err("Function '~' passed too many arguments. Got 2, expected 1"),
            ),
            ("<<", vec![num(1), num(4)], Ok(num(16))),
            (">>", vec![num(-16), num(2)], Ok(num(-4))),
            ("<<", vec![num(1), num(65)], Ok(num(2))),
            // Lists
            ("list", vec![num(1), sym("a")], Ok(qexpr(vec![num(1), sym("a")]))),
            ("list", vec![], Ok(qexpr(vec![]))),
            ("head", vec![val([1, 2, 3])], Ok(val([1]))),
            ("tail", vec![val([1, 2, 3])], Ok(val([2, 3]))),
            ("tail", vec![val([1])], Ok(qexpr(vec![]))),
            ("head", vec![qexpr(vec![])], Err("Function 'head' passed {}")),
            ("tail", vec![qexpr(vec![])], Err("Function 'tail' passed {}")),
            (
                "head",
                vec![num(1)],
                Err("Function 'head' passed incorrect type. Got Number, expected Q-Expression"),
            ),
            (
                "head",
                vec![val([1]), val([2])],
                Err("Function 'head' passed too many arguments. Got 2, expected 1"),
            ),
            ("join", vec![val([1, 2]), val([3])], Ok(val([1, 2, 3]))),
            ("join", vec![text("ab"), text("cd")], Ok(text("abcd"))),
            ("join", vec![val([1])], Ok(val([1]))),
            (
                "join",
                vec![val([1]), text("a")],
                Err("Function 'join' passed multiple types. Expected one type but receive Q-Expression and Charbuf"),
            ),
            (
                "join",
                vec![num(1)],
                Err("Function 'join' passed incorrect type. Got Number, expected Q-Expression or Charbuf"),
            ),
            // Introspection
            ("type", vec![num(1)], Ok(text("Number"))),
            ("type", vec![val([1])], Ok(text("Q-Expression"))),
            ("type", vec![err("x")], Ok(text("Error"))),
            ("error", vec![text("bad "), num(42)], Err("bad 42")),
            ("error", vec![text("x"), text("y")], Err("xy")),
            ("assert_err", vec![err("Division By Zero!"), text("Zero")], Ok(num(1))),
            (
                "assert_err",
                vec![err("boom"), text("bang")],
                Err("assert failed \"boom\" does not contain \"bang\""),
            ),
            (
                "assert_err",
                vec![num(1), text("x")],
                Err("Function 'assert_err' passed incorrect type. Got Number, expected Error"),
            ),
            (
                "load",
                vec![num(1)],
                Err("Function 'load' passed incorrect type. Got Number, expected Charbuf"),
            ),
        ]);
    }

    #[test]
    fn test_lambda_construction() {
        let lambda = call(
            "\\",
            vec![qexpr(vec![sym("x")]), qexpr(vec![sym("+"), sym("x"), num(1)])],
        )
        .unwrap();
        assert_eq!(
            lambda,
            Value::lambda(vec!["x".into()], vec![sym("+"), sym("x"), num(1)])
        );

        let cases = vec![
            (
                vec![qexpr(vec![num(1)]), qexpr(vec![])],
                "Function '\\' passed incorrect type. Got Number, expected Symbol",
            ),
            (
                vec![qexpr(vec![sym("x")]), num(1)],
                "Function '\\' passed incorrect type. Got Number, expected Q-Expression",
            ),
            (
                vec![qexpr(vec![sym("x")])],
                "Function '\\' passed too few arguments. Got 1, expected 2",
            ),
        ];
        for (args, expected) in cases {
            assert_eq!(call("\\", args).unwrap_err().to_string(), expected);
        }
    }

    #[test]
    fn test_def_validation() {
        let mut env = Environment::new();
        let def = find_builtin_op("def").unwrap();

        let result = (def.func)(&mut env, vec![qexpr(vec![sym("a"), sym("b")]), num(1), num(2)]);
        assert_eq!(result, Ok(Value::unit()));
        assert_eq!(env.get("a"), num(1));
        assert_eq!(env.get("b"), num(2));

        let mismatch = (def.func)(&mut env, vec![qexpr(vec![sym("a"), sym("b")]), num(1)])
            .unwrap_err()
            .to_string();
        assert_eq!(
            mismatch,
            "Function 'def' Number of symbols must match number of values.\n\n\tlen({a b}) == (2) symbol(s) given but 1 values given"
        );

        let not_symbols = (def.func)(&mut env, vec![qexpr(vec![num(1)]), num(1)]).unwrap_err();
        assert_eq!(
            not_symbols.to_string(),
            "Function 'def' passed incorrect type. Got Number, expected Symbol"
        );
    }
}
