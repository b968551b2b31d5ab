// ABOUTME: `quote define set! lambda defmacro begin if or and catch throw` — special forms
//
// Operands here have already been staged by the evaluator's mode overlay
// (mode.rs): positions masked off by EXEC/IF/TRY arrive as raw,
// unevaluated sub-expressions or Nil placeholders, never as a value the
// handler must further interpret. `eval`'s tail re-dispatch is handled by
// the evaluator directly (eval.rs dispatch_end_of_list), not here.

use crate::env::Environment;
use crate::value::{Lambda, Macro, MacroParams, Params, Value};
use std::rc::Rc;

pub fn quote(operands: &[Value]) -> Value {
    operands.first().cloned().unwrap_or(Value::Nil)
}

pub fn begin(operands: &[Value]) -> Value {
    operands.last().cloned().unwrap_or(Value::Nil)
}

/// Mode::If already decided which branch was evaluated; this just picks
/// the result by the same test (§4.1.2, §4.4).
pub fn if_(operands: &[Value]) -> Value {
    let test = operands.first().map(Value::truthy).unwrap_or(false);
    if test {
        operands.get(1).cloned().unwrap_or(Value::Nil)
    } else {
        operands.get(2).cloned().unwrap_or(Value::Nil)
    }
}

/// Mode::Or already forced end-of-list past the first truthy operand, so
/// the staged operands are exactly the evaluated prefix; the result is
/// simply the first truthy one, or Nil if none (§4.4).
pub fn or(operands: &[Value]) -> Value {
    operands
        .iter()
        .find(|v| v.truthy())
        .cloned()
        .unwrap_or(Value::Nil)
}

/// Mode::And already forced end-of-list at the first Nil, so the staged
/// operands are exactly the evaluated prefix; Nil if any were Nil, else
/// the last value, or T if there were none (§4.4).
pub fn and(operands: &[Value]) -> Value {
    if operands.is_empty() {
        return Value::t();
    }
    if operands.iter().any(Value::is_nil) {
        Value::Nil
    } else {
        operands.last().cloned().unwrap_or(Value::t())
    }
}

/// On the success path (no Fatal reached `catch`'s protected expression),
/// Mode::Try already skipped every clause position with a Nil placeholder,
/// so the result is simply the protected expression's value. Interception
/// of a Fatal is handled entirely by the evaluator's unwinder (§4.5),
/// never here.
pub fn catch(operands: &[Value]) -> Value {
    operands.first().cloned().unwrap_or(Value::Nil)
}

pub fn throw(operands: &[Value]) -> Value {
    match operands.first().map(Value::unmarked) {
        Some(Value::Symbol(tag)) => Value::fatal(tag.clone(), operands.get(1).cloned()),
        other => Value::fatal("type-mismatch", other.cloned()),
    }
}

pub fn define(operands: &[Value], env: &Rc<Environment>) -> Value {
    let name = operands.first().map(Value::unmarked);
    let value = operands.get(1).cloned().unwrap_or(Value::Nil);
    match name {
        Some(Value::Symbol(name)) => {
            env.define(name.clone(), value.clone());
            value
        }
        other => Value::fatal("type-mismatch", other.cloned()),
    }
}

pub fn set_bang(operands: &[Value], env: &Rc<Environment>) -> Value {
    let name = operands.first().map(Value::unmarked);
    let value = operands.get(1).cloned().unwrap_or(Value::Nil);
    match name {
        Some(Value::Symbol(name)) => {
            if env.set(name, value.clone()) {
                value
            } else {
                Value::fatal("unbound-symbol", Some(Value::Symbol(name.clone())))
            }
        }
        other => Value::fatal("type-mismatch", other.cloned()),
    }
}

pub fn lambda(operands: &[Value], env: &Rc<Environment>) -> Value {
    let Some((params_form, body_forms)) = operands.split_first() else {
        return Value::fatal("arity-mismatch", None);
    };
    match parse_params(params_form) {
        Ok(params) => Value::Closure(Rc::new(Lambda {
            params,
            body: wrap_begin(body_forms),
            env: env.clone(),
        })),
        Err(fatal) => fatal,
    }
}

pub fn defmacro(operands: &[Value], env: &Rc<Environment>) -> Value {
    let Some((name_form, rest)) = operands.split_first() else {
        return Value::fatal("arity-mismatch", None);
    };
    let Some((params_form, body_forms)) = rest.split_first() else {
        return Value::fatal("arity-mismatch", None);
    };
    let name = match name_form.unmarked() {
        Value::Symbol(name) => name.clone(),
        _ => return Value::fatal("type-mismatch", Some(name_form.clone())),
    };
    match parse_macro_params(params_form) {
        Ok(params) => {
            let mac = Value::Macro(Rc::new(Macro {
                params,
                body: wrap_begin(body_forms),
                env: env.clone(),
            }));
            env.define(name, mac.clone());
            mac
        }
        Err(fatal) => fatal,
    }
}

fn wrap_begin(body_forms: &[Value]) -> Value {
    Value::cons(Value::symbol("begin"), Value::list(body_forms.to_vec()))
}

/// Accepts either a proper list of distinct Symbol names (fixed arity) or
/// a single Symbol (variadic rest binding) — §4.4.
fn parse_params(raw: &Value) -> Result<Params, Value> {
    match raw.unmarked() {
        Value::Symbol(name) => Ok(Params::Rest(name.clone())),
        Value::Nil => Ok(Params::Fixed(Vec::new())),
        Value::Pair(..) => {
            let items = raw
                .as_proper_list()
                .ok_or_else(|| Value::fatal("type-mismatch", Some(raw.clone())))?;
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                match item.unmarked() {
                    Value::Symbol(name) => names.push(name.clone()),
                    _ => return Err(Value::fatal("type-mismatch", Some(item))),
                }
            }
            if has_duplicates(&names) {
                return Err(Value::fatal("duplicate-parameter", None));
            }
            Ok(Params::Fixed(names))
        }
        _ => Err(Value::fatal("type-mismatch", Some(raw.clone()))),
    }
}

/// Same shape as `parse_params`, but each fixed entry also records whether
/// it was source-level `,name` (evaluated before substitution) — §3.1, §6.
fn parse_macro_params(raw: &Value) -> Result<MacroParams, Value> {
    match raw.unmarked() {
        Value::Symbol(name) => Ok(MacroParams::Rest(name.clone())),
        Value::Nil => Ok(MacroParams::Fixed(Vec::new())),
        Value::Pair(..) => {
            let items = raw
                .as_proper_list()
                .ok_or_else(|| Value::fatal("type-mismatch", Some(raw.clone())))?;
            let mut entries = Vec::with_capacity(items.len());
            for item in items {
                let evaluated = matches!(item, Value::Marked(_));
                match item.unmarked() {
                    Value::Symbol(name) => entries.push((name.clone(), evaluated)),
                    _ => return Err(Value::fatal("type-mismatch", Some(item))),
                }
            }
            let names: Vec<Rc<str>> = entries.iter().map(|(n, _)| n.clone()).collect();
            if has_duplicates(&names) {
                return Err(Value::fatal("duplicate-parameter", None));
            }
            Ok(MacroParams::Fixed(entries))
        }
        _ => Err(Value::fatal("type-mismatch", Some(raw.clone()))),
    }
}

fn has_duplicates(names: &[Rc<str>]) -> bool {
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            if names[i] == names[j] {
                return true;
            }
        }
    }
    false
}
