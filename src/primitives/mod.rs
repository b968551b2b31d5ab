// ABOUTME: Primitive table (C) — name dispatch and root-environment construction

pub mod arithmetic;
pub mod comparison;
pub mod io;
pub mod pairs;
pub mod predicates;
pub mod special_forms;
pub mod strings;

use crate::env::Environment;
use crate::eval::Evaluator;
use crate::value::Value;
use std::rc::Rc;

/// Every primitive name bound in the root environment (§3.3). `eval` is
/// included for root-environment lookup purposes even though its
/// re-dispatch behaviour is implemented in eval.rs, not here (§9).
pub const PRIMITIVE_NAMES: &[&str] = &[
    "quote", "eval", "car", "cdr", "cons", "define", "set!", "lambda", "defmacro", "begin", "if",
    "or", "and", "catch", "throw", "+", "-", "*", "/", "=", "<", ">", "not", "pair?", "number?",
    "symbol?", "len", "symbol->number", "number->symbol", "write", "read", "load",
];

/// Builds a fresh root Environment with every Primitive name bound, plus
/// `T` and `nil` (§3.3).
pub fn root_environment() -> Rc<Environment> {
    let env = Environment::new();
    env.define("T", Value::t());
    env.define("nil", Value::Nil);
    for name in PRIMITIVE_NAMES {
        env.define(*name, Value::Primitive(name));
    }
    env
}

/// Invokes the handler for `name` with its already-staged operands
/// (§4.1.1 step 5, §4.4). `eval`'s operand is simply returned here; the
/// evaluator recognises the primitive name itself and replaces control
/// with the result rather than completing the call normally (§9).
pub fn dispatch(name: &str, operands: &[Value], ev: &mut Evaluator) -> Value {
    match name {
        "quote" => special_forms::quote(operands),
        "eval" => operands.first().cloned().unwrap_or(Value::Nil),
        "car" => pairs::car(operands),
        "cdr" => pairs::cdr(operands),
        "cons" => pairs::cons(operands),
        "define" => special_forms::define(operands, &ev.env()),
        "set!" => special_forms::set_bang(operands, &ev.env()),
        "lambda" => special_forms::lambda(operands, &ev.env()),
        "defmacro" => special_forms::defmacro(operands, &ev.env()),
        "begin" => special_forms::begin(operands),
        "if" => special_forms::if_(operands),
        "or" => special_forms::or(operands),
        "and" => special_forms::and(operands),
        "catch" => special_forms::catch(operands),
        "throw" => special_forms::throw(operands),
        "+" => arithmetic::add(operands),
        "-" => arithmetic::sub(operands),
        "*" => arithmetic::mul(operands),
        "/" => arithmetic::div(operands),
        "=" => comparison::eq(operands),
        "<" => comparison::lt(operands),
        ">" => comparison::gt(operands),
        "not" => predicates::not(operands),
        "pair?" => predicates::is_pair(operands),
        "number?" => predicates::is_number(operands),
        "symbol?" => predicates::is_symbol(operands),
        "len" => strings::len(operands),
        "symbol->number" => strings::symbol_to_number(operands),
        "number->symbol" => strings::number_to_symbol(operands),
        "write" => io::write(operands),
        "read" => io::read(),
        "load" => io::load(operands, ev.sandbox),
        other => Value::fatal("unknown-primitive", Some(Value::symbol(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_environment_binds_every_primitive_name() {
        let env = root_environment();
        for name in PRIMITIVE_NAMES {
            assert!(matches!(env.get(name), Some(Value::Primitive(_))), "{name} not bound");
        }
        assert!(matches!(env.get("T"), Some(Value::Symbol(_))));
        assert!(matches!(env.get("nil"), Some(Value::Nil)));
    }
}
