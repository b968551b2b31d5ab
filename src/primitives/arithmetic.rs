// ABOUTME: `+ - * /` — numeric arithmetic, plus the Symbol overloads of `+`/`-`

use crate::value::Value;

fn as_number(v: &Value) -> Option<f64> {
    match v.unmarked() {
        Value::Number(n) => Some(*n),
        _ => None,
    }
}

fn as_symbol(v: &Value) -> Option<&str> {
    match v.unmarked() {
        Value::Symbol(s) => Some(s),
        _ => None,
    }
}

/// `+`: numeric sum, or Symbol concatenation when given two Symbols (§4.4).
pub fn add(operands: &[Value]) -> Value {
    if let [a, b] = operands {
        if let (Some(a), Some(b)) = (as_symbol(a), as_symbol(b)) {
            return Value::symbol(format!("{a}{b}"));
        }
    }
    let mut total = 0.0;
    for operand in operands {
        match as_number(operand) {
            Some(n) => total += n,
            None => return Value::fatal("type-mismatch", Some(operand.clone())),
        }
    }
    Value::Number(total)
}

/// `-`: numeric subtraction/negation, or a Symbol character-range slice
/// when given a Symbol and two Number indices (§4.4).
pub fn sub(operands: &[Value]) -> Value {
    if let [sym, start, end] = operands {
        if let (Some(s), Some(start), Some(end)) = (as_symbol(sym), as_number(start), as_number(end)) {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = (start as usize, end as usize);
            if start > end || end > chars.len() {
                return Value::fatal("type-mismatch", Some(sym.clone()));
            }
            let slice: String = chars[start..end].iter().collect();
            return Value::symbol(slice);
        }
    }

    let numbers: Vec<f64> = match operands.iter().map(as_number).collect::<Option<Vec<_>>>() {
        Some(ns) => ns,
        None => return Value::fatal("type-mismatch", Some(Value::list(operands.to_vec()))),
    };

    match numbers.as_slice() {
        [] => Value::Number(0.0),
        [only] => Value::Number(-only),
        [first, rest @ ..] => Value::Number(rest.iter().fold(*first, |acc, n| acc - n)),
    }
}

pub fn mul(operands: &[Value]) -> Value {
    let mut total = 1.0;
    for operand in operands {
        match as_number(operand) {
            Some(n) => total *= n,
            None => return Value::fatal("type-mismatch", Some(operand.clone())),
        }
    }
    Value::Number(total)
}

pub fn div(operands: &[Value]) -> Value {
    let numbers: Vec<f64> = match operands.iter().map(as_number).collect::<Option<Vec<_>>>() {
        Some(ns) => ns,
        None => return Value::fatal("type-mismatch", Some(Value::list(operands.to_vec()))),
    };
    match numbers.as_slice() {
        [] => Value::Number(1.0),
        [only] => {
            if *only == 0.0 {
                Value::fatal("division-by-zero", None)
            } else {
                Value::Number(1.0 / only)
            }
        }
        [first, rest @ ..] => {
            let mut acc = *first;
            for n in rest {
                if *n == 0.0 {
                    return Value::fatal("division-by-zero", None);
                }
                acc /= n;
            }
            Value::Number(acc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sums_numbers() {
        let v = add(&[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        assert!(matches!(v, Value::Number(n) if n == 6.0));
    }

    #[test]
    fn add_concatenates_two_symbols() {
        let v = add(&[Value::symbol("foo"), Value::symbol("bar")]);
        assert!(matches!(&v, Value::Symbol(s) if &**s == "foobar"));
    }

    #[test]
    fn sub_slices_symbol_by_index_range() {
        let v = sub(&[Value::symbol("hello"), Value::Number(1.0), Value::Number(3.0)]);
        assert!(matches!(&v, Value::Symbol(s) if &**s == "el"));
    }

    #[test]
    fn div_by_zero_is_fatal() {
        let v = div(&[Value::Number(6.0), Value::Number(0.0)]);
        assert!(v.is_fatal());
    }

    #[test]
    fn div_folds_left_to_right() {
        let v = div(&[Value::Number(100.0), Value::Number(5.0), Value::Number(2.0)]);
        assert!(matches!(v, Value::Number(n) if n == 10.0));
    }
}
