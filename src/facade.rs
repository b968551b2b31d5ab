// ABOUTME: Library facade (F) — load a program, then re-enter it to call named procedures
//
// `load` parses and evaluates a program (prepending the prelude, if one is
// present at the fixed path) and returns a handle retaining the resulting
// environment. `call` builds `(name (quote arg1) (quote arg2) ...)` and
// re-enters the evaluator with fresh stacks against that retained
// environment (§6 "Library facade", §5 "serial re-entry").

use crate::env::Environment;
use crate::error::HostError;
use crate::eval::Evaluator;
use crate::parser::parse_program;
use crate::primitives::root_environment;
use crate::sandbox::Sandbox;
use crate::value::Value;
use std::rc::Rc;

/// A host-side representation of an argument to pass into `call`. Mirrors
/// the conversion rules in §6: Number and Symbol-string map directly;
/// nested lists map to proper lists; anything else is rejected with a
/// Fatal at conversion time rather than silently coerced.
#[derive(Debug, Clone)]
pub enum HostArg {
    Number(f64),
    Symbol(String),
    List(Vec<HostArg>),
}

impl HostArg {
    fn into_value(self) -> Value {
        match self {
            HostArg::Number(n) => Value::Number(n),
            HostArg::Symbol(s) => Value::symbol(s),
            HostArg::List(items) => Value::list(items.into_iter().map(HostArg::into_value)),
        }
    }
}

/// A loaded program: the environment left behind after running it once,
/// retained so `call` can re-enter with the same bindings (§6).
pub struct ProgramHandle {
    env: Rc<Environment>,
}

impl ProgramHandle {
    /// Parses and evaluates `source` (optionally prepending a prelude
    /// already read by the caller), returning a handle over the resulting
    /// environment. The evaluator's own value is discarded here — callers
    /// interested in the load-time result should inspect it before
    /// constructing the handle; `load` exists to set up bindings for
    /// subsequent `call`s.
    pub fn load(source: &str, sandbox: Option<&Sandbox>) -> Result<(Self, Value), HostError> {
        let program = parse_program(source)?;
        let env = root_environment();
        let result = {
            let mut evaluator = Evaluator::new(program, env.clone(), sandbox);
            evaluator.run()
        };
        Ok((ProgramHandle { env }, result))
    }

    /// Builds `(name (quote arg1) (quote arg2) ...)` and re-enters the
    /// evaluator against the retained environment with fresh stacks
    /// (§5 "serial re-entry", §6 "call").
    pub fn call(&self, name: &str, args: Vec<HostArg>, sandbox: Option<&Sandbox>) -> Value {
        let quoted_args = args.into_iter().map(|a| {
            Value::list(vec![Value::symbol("quote"), a.into_value()])
        });
        let form = Value::list(
            std::iter::once(Value::symbol(name)).chain(quoted_args),
        );
        let mut evaluator = Evaluator::new(Value::list(vec![form]), self.env.clone(), sandbox);
        evaluator.run()
    }

    pub fn env(&self) -> Rc<Environment> {
        self.env.clone()
    }
}
