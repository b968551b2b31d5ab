// ABOUTME: `len symbol->number number->symbol` — Symbol-as-string operations

use crate::value::Value;

pub fn len(operands: &[Value]) -> Value {
    match operands.first().map(Value::unmarked) {
        Some(Value::Symbol(s)) => Value::Number(s.chars().count() as f64),
        other => Value::fatal("type-mismatch", other.cloned()),
    }
}

pub fn symbol_to_number(operands: &[Value]) -> Value {
    match operands.first().map(Value::unmarked) {
        Some(Value::Symbol(s)) => match s.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::fatal("malformed-number", Some(Value::symbol(s.clone()))),
        },
        other => Value::fatal("type-mismatch", other.cloned()),
    }
}

pub fn number_to_symbol(operands: &[Value]) -> Value {
    match operands.first().map(Value::unmarked) {
        Some(v @ Value::Number(_)) => Value::symbol(v.to_string()),
        other => Value::fatal("type-mismatch", other.cloned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_counts_characters() {
        let v = len(&[Value::symbol("hello")]);
        assert!(matches!(v, Value::Number(n) if n == 5.0));
    }

    #[test]
    fn len_of_non_symbol_is_fatal() {
        assert!(len(&[Value::Number(1.0)]).is_fatal());
    }

    #[test]
    fn symbol_to_number_parses() {
        let v = symbol_to_number(&[Value::symbol("42.5")]);
        assert!(matches!(v, Value::Number(n) if n == 42.5));
    }

    #[test]
    fn symbol_to_number_malformed_is_fatal() {
        assert!(symbol_to_number(&[Value::symbol("nope")]).is_fatal());
    }

    #[test]
    fn number_to_symbol_round_trips() {
        let v = number_to_symbol(&[Value::Number(42.0)]);
        assert!(matches!(&v, Value::Symbol(s) if &**s == "42"));
    }
}
