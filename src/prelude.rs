//! The standard library, written in the language itself.
//!
//! Defines `nil`, `true`, `false`, `fun`, `unpack`/`curry`, `pack`/`uncurry`,
//! and the list functions `first`, `second`, `len`, `nth`, `last`, `map`,
//! `filter`, `foldl`, `sum`, `product` and `reverse`.

use crate::Error;
use crate::ast::Value;
use crate::environment::Environment;
use crate::evaluator::eval;
use crate::reader::read_exprs;

/// Source of the prelude
pub const PRELUDE_SOURCE: &str = include_str!("prelude.lsp");

/// Evaluate the prelude into `env`, stopping at the first expression that
/// produces an error.
pub fn load_prelude(env: &mut Environment<'_>) -> Result<(), Error> {
    let exprs = read_exprs(PRELUDE_SOURCE).map_err(|err| Error::Load(format!("prelude:{err}")))?;

    for (index, expr) in exprs.into_iter().enumerate() {
        if let Value::Error(message) = eval(env, expr) {
            return Err(Error::Load(format!("prelude:{}: {message}", index + 1)));
        }
    }

    tracing::debug!(bindings = env.bindings().len(), "prelude loaded");
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{num, qexpr, val};
    use crate::evaluator::create_global_env;
    use crate::printer::to_string;
    use crate::reader::read_str;
    use pretty_assertions::assert_eq;

    fn prelude_env() -> Environment<'static> {
        let mut env = create_global_env();
        load_prelude(&mut env).unwrap();
        env
    }

    #[test]
    fn test_prelude_functions_data_driven() {
        let mut env = prelude_env();
        let test_cases = vec![
            ("nil", qexpr(vec![])),
            ("true", num(1)),
            ("false", num(0)),
            ("(first {10 20 30})", num(10)),
            ("(second {10 20 30})", num(20)),
            ("(len {})", num(0)),
            ("(len {1 2 3 4})", num(4)),
            ("(nth 2 {5 6 7 8})", num(7)),
            ("(last {5 6 7})", num(7)),
            ("(map (\\ {x} {* x x}) {1 2 3})", val([1, 4, 9])),
            ("(map (\\ {x} {x}) nil)", qexpr(vec![])),
            ("(filter (\\ {x} {> x 1}) {0 1 2 3})", val([2, 3])),
            ("(foldl (\\ {acc x} {- acc x}) 10 {1 2 3})", num(4)),
            ("(sum {1 2 3 4})", num(10)),
            ("(product {1 2 3 4})", num(24)),
            ("(reverse {1 2 3})", val([3, 2, 1])),
            ("(unpack + {1 2 3})", num(6)),
            ("(curry * {2 3})", num(6)),
            ("(pack head 1 2 3)", val([1])),
            ("(uncurry len 7 8 9)", num(3)),
        ];

        for (input, expected) in test_cases {
            let actual = eval(&mut env, read_str(input).unwrap());
            assert_eq!(actual, expected, "{input}");
        }
    }

    #[test]
    fn test_fun_defines_globally() {
        let mut env = prelude_env();
        let defined = eval(&mut env, read_str("(fun {add3 a b c} {+ a b c})").unwrap());
        assert_eq!(defined, Value::unit());
        assert_eq!(eval(&mut env, read_str("(add3 1 2 3)").unwrap()), num(6));

        let add3 = env.get("add3");
        assert_eq!(to_string(&env, &add3), "add3 {a b c} {+ a b c}");
    }

    #[test]
    fn test_prelude_is_idempotent() {
        let mut env = prelude_env();
        let before = env.bindings().len();
        load_prelude(&mut env).unwrap();
        assert_eq!(env.bindings().len(), before);
    }
}
