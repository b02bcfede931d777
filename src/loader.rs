//! Evaluating source files into a session.

use std::fs;
use std::path::Path;

use crate::Error;
use crate::ast::Value;
use crate::environment::Environment;
use crate::evaluator::eval;
use crate::printer::to_string;
use crate::reader::read_exprs;

/// Load and evaluate a file in `env`.
///
/// Every top-level expression is evaluated in order. An expression that
/// evaluates to an error is reported on the diagnostic sink and loading
/// carries on with the next one. Only an unreadable or unparsable file makes
/// the result itself an error.
#[tracing::instrument(level = "debug", skip(env, path), fields(path = %path.display()))]
pub fn load(env: &mut Environment<'_>, path: &Path) -> Value {
    match fs::read_to_string(path) {
        Ok(source) => load_source(env, &path.display().to_string(), &source),
        Err(err) => {
            tracing::debug!(%err, "read failed");
            Error::Load(format!("{}: {err}", path.display())).into()
        }
    }
}

/// Evaluate already loaded source; `origin` names it in diagnostics
pub fn load_source(env: &mut Environment<'_>, origin: &str, source: &str) -> Value {
    let exprs = match read_exprs(source) {
        Ok(exprs) => exprs,
        Err(err) => return Error::Load(format!("{origin}:{err}")).into(),
    };

    let mut failures = 0usize;
    for (index, expr) in exprs.into_iter().enumerate() {
        let result = eval(env, expr);
        if result.is_error() {
            failures += 1;
            let printed = to_string(env, &result);
            let console = env.console();
            console.report_line("");
            console.report_line(&format!("Load error in {origin}:{}", index + 1));
            console.report_line("");
            console.report_line(&printed);
        }
    }

    tracing::debug!(origin, failures, "loaded");
    Value::unit()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::num;
    use crate::environment::{Console, SharedBuffer};
    use crate::evaluator::create_global_env_with_console;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn session() -> (Environment<'static>, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let env = create_global_env_with_console(Console::new(
            Box::new(out.clone()),
            Box::new(err.clone()),
        ));
        (env, out, err)
    }

    #[test]
    fn test_load_file_defines_into_session() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "; helpers").unwrap();
        writeln!(file, "(def {{double}} (\\ {{x}} {{* 2 x}}))").unwrap();
        writeln!(file, "(def {{answer}} (double 21))").unwrap();
        writeln!(file, "(print \"loaded\" answer)").unwrap();

        let (mut env, out, err) = session();
        let result = load(&mut env, file.path());

        assert_eq!(result, Value::unit());
        assert_eq!(env.get("answer"), num(42));
        assert_eq!(out.contents(), "\"loaded\" 42\n");
        assert_eq!(err.contents(), "");
    }

    #[test]
    fn test_load_reports_failing_expressions_and_continues() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(def {{a}} 1)\n(/ a 0)\n(def {{b}} 2)\n").unwrap();

        let (mut env, _out, err) = session();
        let result = load(&mut env, file.path());

        assert_eq!(result, Value::unit());
        assert_eq!(env.get("b"), num(2));
        let origin = file.path().display().to_string();
        assert_eq!(
            err.contents(),
            format!("\nLoad error in {origin}:2\n\nErr: Division By Zero!\n")
        );
    }

    #[test]
    fn test_load_failures_are_error_values() {
        let (mut env, _out, _err) = session();

        let missing = load(&mut env, Path::new("/definitely/not/here.lsp"));
        match missing {
            Value::Error(message) => assert!(message.starts_with("Could not load /definitely/not/here.lsp")),
            other => panic!("expected error, got {other:?}"),
        }

        let unparsable = load_source(&mut env, "inline", "(+ 1");
        match unparsable {
            Value::Error(message) => {
                assert_eq!(message, "Could not load inline:1:5: incomplete input: unexpected end of input");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_builtin_from_language() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(def {{loaded}} 1)").unwrap();
        let path = file.path().display().to_string().replace('\\', "\\\\");

        let (mut env, _out, _err) = session();
        let source = format!("(load \"{path}\")");
        let result = eval(&mut env, crate::reader::read_str(&source).unwrap());
        assert_eq!(result, Value::unit());
        assert_eq!(env.get("loaded"), num(1));
    }
}
