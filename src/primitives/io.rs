// ABOUTME: `write read load` — host stream and sandboxed-file I/O

use crate::parser;
use crate::sandbox::Sandbox;
use crate::value::Value;
use std::io::{self, BufRead};

/// Prints the value's display form to stdout, then returns it unchanged.
pub fn write(operands: &[Value]) -> Value {
    let v = operands.first().cloned().unwrap_or(Value::Nil);
    println!("{}", v);
    v
}

/// Reads one full form from stdin, accumulating lines until the buffer
/// parses as a complete element (§4.4). A parse failure on an exhausted
/// stream surfaces as a Fatal rather than looping forever.
pub fn read() -> Value {
    let stdin = io::stdin();
    let mut buffer = String::new();
    loop {
        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).unwrap_or(0);
        let at_eof = read == 0;
        if at_eof && buffer.trim().is_empty() {
            return Value::fatal("read-eof", None);
        }
        buffer.push_str(&line);

        match parser::parse_single_element(&buffer) {
            Ok(v) => return v,
            Err(e) if at_eof => {
                return Value::fatal("parse-error", Some(Value::symbol(e.to_string())));
            }
            Err(_) => continue,
        }
    }
}

/// Parses the named file's contents and returns the resulting form,
/// wrapped in `begin` when it holds more than one top-level expression
/// (§4.4). Does not evaluate it — that is the caller's job.
pub fn load(operands: &[Value], sandbox: Option<&Sandbox>) -> Value {
    let path = match operands.first().map(Value::unmarked) {
        Some(Value::Symbol(path)) => path.clone(),
        other => return Value::fatal("type-mismatch", other.cloned()),
    };
    let Some(sandbox) = sandbox else {
        return Value::fatal("sandbox-unavailable", Some(Value::Symbol(path)));
    };
    let contents = match sandbox.read_file(&path) {
        Ok(contents) => contents,
        Err(e) => return Value::fatal("io-error", Some(Value::symbol(e.to_string()))),
    };
    match parser::parse_program(&contents) {
        Ok(forms) => Value::cons(Value::symbol("begin"), forms),
        Err(e) => Value::fatal("parse-error", Some(Value::symbol(e.to_string()))),
    }
}
