// ABOUTME: `cons car cdr` — pair construction and access

use crate::value::Value;

/// `cons(car, cdr)`: a Pair; fails if cdr is not Pair or Nil — the system
/// admits only proper-list cdrs for cons (§4.2).
pub fn cons(operands: &[Value]) -> Value {
    let car = operands.first().cloned().unwrap_or(Value::Nil);
    let cdr = operands.get(1).cloned().unwrap_or(Value::Nil);
    if cdr.is_pair() || cdr.is_nil() {
        Value::cons(car, cdr)
    } else {
        Value::fatal("type-mismatch", Some(cdr))
    }
}

pub fn car(operands: &[Value]) -> Value {
    let v = operands.first().cloned().unwrap_or(Value::Nil);
    v.car().unwrap_or_else(|| Value::fatal("type-mismatch", Some(v)))
}

pub fn cdr(operands: &[Value]) -> Value {
    let v = operands.first().cloned().unwrap_or(Value::Nil);
    v.cdr().unwrap_or_else(|| Value::fatal("type-mismatch", Some(v)))
}
