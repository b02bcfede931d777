use std::collections::VecDeque;

use crate::Error;
use crate::ast::{Function, Lambda, Type, Value};
use crate::builtinops::builtin_ops;
use crate::environment::{Console, Environment};
use crate::printer::ANONYMOUS;

/// Formal that collects every remaining argument into a Q-expression
const VARIADIC_MARKER: &str = "&";

#[cfg(not(target_arch = "wasm32"))]
mod stack {
    /// Minimum stack space left before recursing further (100KB)
    const RED_ZONE: usize = 100 * 1024;

    /// Size of each newly allocated stack segment (1MB)
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    /// Run `f`, moving to a fresh stack segment first when the current one is
    /// nearly exhausted. Nesting depth is then bounded by memory alone.
    #[inline]
    pub(super) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
    }
}

#[cfg(target_arch = "wasm32")]
mod stack {
    #[inline]
    pub(super) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
        f()
    }
}

use stack::ensure_sufficient_stack;

/// Evaluate a value (public API)
///
/// Symbols resolve through `env`, S-expressions are applied, and every other
/// value evaluates to itself. Failures come back as `Value::Error`.
pub fn eval(env: &mut Environment<'_>, value: Value) -> Value {
    ensure_sufficient_stack(|| match value {
        Value::Symbol(name) => env.get(&name),
        Value::SExpr(cells) => eval_sexpr(env, cells),
        other => other,
    })
}

/// Evaluate every cell, then apply the head to the rest.
///
/// Cells are evaluated left to right even after one of them produced an
/// error; the error is then passed along as an ordinary argument.
pub fn eval_sexpr(env: &mut Environment<'_>, cells: Vec<Value>) -> Value {
    let mut cells: VecDeque<Value> = cells.into_iter().map(|cell| eval(env, cell)).collect();

    if cells.len() <= 1 {
        return cells.pop_front().unwrap_or_else(Value::unit);
    }

    match cells.pop_front() {
        Some(Value::Function(function)) => apply(env, function, cells.into()),
        Some(other) => Error::type_mismatch("eval_sexpr", Type::Function.name(), other.type_name())
            .into(),
        None => Value::unit(),
    }
}

/// Apply a function to already evaluated arguments
pub fn apply(env: &mut Environment<'_>, function: Function, args: Vec<Value>) -> Value {
    match function {
        Function::Native(op) => {
            tracing::trace!(builtin = op.name, args = args.len(), "apply");
            (op.func)(env, args).unwrap_or_else(Value::from)
        }
        Function::Closure(lambda) => call_lambda(env, lambda, args),
    }
}

/// Name of a lambda as seen from `env`, for error messages
fn lambda_name(env: &Environment<'_>, lambda: Lambda) -> String {
    env.name_of(&Function::Closure(lambda))
        .unwrap_or(ANONYMOUS)
        .to_owned()
}

/// Bind arguments to formals; evaluate the body once every formal is bound.
fn call_lambda(env: &mut Environment<'_>, mut lambda: Lambda, args: Vec<Value>) -> Value {
    let declared = lambda.formals.len();
    let mut args = VecDeque::from(args);
    // Formals are consumed by index so the lambda keeps its identity for naming
    let mut bound = 0;

    while let Some(arg) = args.pop_front() {
        let Some(formal) = lambda.formals.get(bound) else {
            return Error::too_many(lambda_name(env, lambda), declared).into();
        };
        bound += 1;

        if formal == VARIADIC_MARKER {
            let following = lambda.formals.len() - bound;
            if following != 1 {
                let name = lambda_name(env, lambda);
                return Error::function(
                    name,
                    format!("& must be followed by one symbol, received {following}"),
                )
                .into();
            }
            args.push_front(arg);
            let rest = lambda.formals[bound].clone();
            bound += 1;
            lambda.env.put(&rest, Value::QExpr(args.drain(..).collect()));
            break;
        }

        lambda.env.put(formal, arg);
    }

    lambda.formals = lambda.formals.split_off(bound);

    if !lambda.formals.is_empty() {
        tracing::trace!(remaining = lambda.formals.len(), "partial application");
        return Value::Function(Function::Closure(lambda));
    }

    tracing::trace!(formals = declared, "call");
    let Lambda { body, env: bindings, .. } = lambda;
    let mut frame = Environment::call_frame(bindings, env);
    eval(&mut frame, Value::SExpr(body))
}

/// Bind every builtin operation into `env`
pub fn register_builtins(env: &mut Environment<'_>) {
    for op in builtin_ops() {
        env.put(op.name, Value::Function(Function::Native(op)));
    }
}

/// Create a global environment with built-in functions
pub fn create_global_env() -> Environment<'static> {
    create_global_env_with_console(Console::stdio())
}

/// Create a global environment writing to the given console
pub fn create_global_env_with_console(console: Console) -> Environment<'static> {
    let mut env = Environment::with_console(console);
    register_builtins(&mut env);
    tracing::debug!(builtins = env.bindings().len(), "global environment created");
    env
}
