// ABOUTME: `= < >` — equality and numeric ordering

use crate::value::Value;

/// `=`: structural equality across any number (>=2) of equal?-able
/// operands (§3.4: `(= 4 4 4 4)` is true via exact Number equality).
pub fn eq(operands: &[Value]) -> Value {
    let truthy = operands.windows(2).all(|pair| pair[0].equal(&pair[1]));
    if truthy {
        Value::t()
    } else {
        Value::Nil
    }
}

fn as_numbers(operands: &[Value]) -> Result<Vec<f64>, Value> {
    operands
        .iter()
        .map(|v| match v.unmarked() {
            Value::Number(n) => Ok(*n),
            _ => Err(Value::fatal("type-mismatch", Some(v.clone()))),
        })
        .collect()
}

pub fn lt(operands: &[Value]) -> Value {
    let numbers = match as_numbers(operands) {
        Ok(ns) => ns,
        Err(fatal) => return fatal,
    };
    if numbers.windows(2).all(|pair| pair[0] < pair[1]) {
        Value::t()
    } else {
        Value::Nil
    }
}

pub fn gt(operands: &[Value]) -> Value {
    let numbers = match as_numbers(operands) {
        Ok(ns) => ns,
        Err(fatal) => return fatal,
    };
    if numbers.windows(2).all(|pair| pair[0] > pair[1]) {
        Value::t()
    } else {
        Value::Nil
    }
}
