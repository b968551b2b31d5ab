// ABOUTME: The three-stack evaluator state machine (D) and fatal propagation (E)
//
// Registers: `control` (a Pair cursor over the siblings still to process, or
// Nil at end-of-list), `data` (the per-call operand/result stack), `call_stack`
// (saved parent frames), `args_num` (position counter for the live frame,
// head counted as 1), `mode` (the operand-evaluation overlay, §4.1.2) and
// `env` (current lexical environment). One `step()` is one pass of §4.1.1.

use crate::env::Environment;
use crate::mode::{Disposition, LiteralKind, Mode};
use crate::primitives;
use crate::sandbox::Sandbox;
use crate::value::{Lambda, Macro, MacroParams, Params, Value};
use std::rc::Rc;

/// A saved parent call, pushed when a nested Pair operand is opened.
#[derive(Debug, Clone)]
struct Frame {
    control: Value,
    args_num: usize,
    mode: Option<Mode>,
    /// Set only when this frame's call activates a Closure/Macro body: the
    /// environment to restore once the body finishes.
    env: Option<Rc<Environment>>,
    /// One-shot marker: popping this frame should re-dispatch on its
    /// result rather than resume the caller normally (§4.1.3).
    macro_return: bool,
}

enum ClauseAction {
    /// A body-less clause: push this value directly as the call's result.
    Value(Value),
    /// `(begin clause-body...)`, to be evaluated in a fresh child scope.
    Body(Value),
}

pub struct Evaluator<'a> {
    control: Value,
    data: Vec<Value>,
    call_stack: Vec<Frame>,
    args_num: usize,
    mode: Option<Mode>,
    env: Rc<Environment>,
    pub sandbox: Option<&'a Sandbox>,
}

impl<'a> Evaluator<'a> {
    pub fn new(program: Value, env: Rc<Environment>, sandbox: Option<&'a Sandbox>) -> Self {
        let control = Value::cons(Value::symbol("begin"), program);
        Evaluator {
            control,
            data: Vec::new(),
            call_stack: Vec::new(),
            args_num: 0,
            mode: None,
            env,
            sandbox,
        }
    }

    pub fn env(&self) -> Rc<Environment> {
        self.env.clone()
    }

    /// Drives the machine to completion, returning the program's final
    /// Value (possibly an uncaught Fatal; the trace has already been
    /// printed to the error stream in that case).
    pub fn run(&mut self) -> Value {
        loop {
            if let Some(v) = self.step() {
                return v;
            }
        }
    }

    fn step(&mut self) -> Option<Value> {
        // 1. A Fatal at the top of the data stack always takes priority.
        if matches!(self.data.last(), Some(v) if v.is_fatal()) {
            return self.fatal_fall();
        }

        // 2. Head just settled: load this call's mode overlay.
        if self.args_num == 1 {
            let head = self.data.last().cloned().unwrap_or(Value::Nil);
            self.mode = match head.unmarked() {
                Value::Primitive(name) => Mode::for_primitive(name),
                Value::Macro(m) => Some(Mode::for_macro(&m.params)),
                _ => None,
            };
        }

        // 3. Consume the previously-processed sibling.
        if self.args_num > 0 {
            self.control = self.control.cdr().unwrap_or(Value::Nil);
        }

        // 4/5. Either stage the next sub-expression, or dispatch at end-of-list.
        if !self.control.is_nil() {
            let expr = self.control.car().unwrap_or(Value::Nil);
            self.args_num += 1;
            let pos = self.args_num - 1;
            match self.mode.clone() {
                Some(mode) => match mode.disposition(pos) {
                    Disposition::Evaluate => self.stage(expr),
                    Disposition::Literal(LiteralKind::RawForm) => self.data.push(expr),
                    Disposition::Literal(LiteralKind::Nil) => self.data.push(Value::Nil),
                },
                None => self.stage(expr),
            }
            None
        } else {
            self.dispatch_end_of_list()
        }
    }

    /// Stages one operand/head sub-expression by kind (§4.1.1 step 4).
    fn stage(&mut self, expr: Value) {
        match expr.unmarked().clone() {
            Value::Symbol(name) => {
                let value = match self.env.get(&name) {
                    Some(v) => v,
                    None => Value::fatal("unbound-symbol", Some(Value::Symbol(name))),
                };
                self.push_operand_value(value);
            }
            Value::Pair(..) => {
                self.call_stack.push(Frame {
                    control: self.control.clone(),
                    args_num: self.args_num,
                    mode: self.mode.clone(),
                    env: None,
                    macro_return: false,
                });
                self.control = expr;
                self.args_num = 0;
                self.mode = None;
            }
            other => self.push_operand_value(other),
        }
    }

    fn push_operand_value(&mut self, value: Value) {
        self.data.push(value.clone());
        self.after_value_pushed(&value);
    }

    /// OR/AND short-circuit and IF's test capture, once a position's value
    /// is actually known (§4.1.2). Evaluate-disposition is the only path
    /// that reaches here; literal placeholders never need this check.
    fn after_value_pushed(&mut self, value: &Value) {
        let pos = self.args_num.saturating_sub(1);
        match &mut self.mode {
            Some(Mode::Or) if pos >= 1 && value.truthy() => self.control = Value::Nil,
            Some(Mode::And) if pos >= 1 && value.is_nil() => self.control = Value::Nil,
            Some(Mode::If { test }) if pos == 1 => *test = Some(value.truthy()),
            _ => {}
        }
    }

    /// End-of-list dispatch (§4.1.1 step 5): pop this frame's head and
    /// operands, then act on the head's kind.
    fn dispatch_end_of_list(&mut self) -> Option<Value> {
        let n = self.args_num;
        let start = self.data.len().saturating_sub(n);
        let mut items = self.data.split_off(start).into_iter();
        let head = items.next().unwrap_or(Value::Nil);
        let operands: Vec<Value> = items.collect();

        match head.unmarked().clone() {
            Value::Primitive(name) => {
                let result = primitives::dispatch(name, &operands, self);
                if name == "eval" && !result.is_fatal() {
                    self.control = result;
                    self.args_num = 0;
                    self.mode = None;
                    return None;
                }
                self.complete_call(result)
            }
            Value::Closure(lambda) => match bind_closure_params(&lambda, &operands) {
                Ok(child_env) => {
                    self.activate_body(child_env, lambda.body.clone(), false);
                    None
                }
                Err(fatal) => self.complete_call(fatal),
            },
            Value::Macro(mac) => match bind_macro_params(&mac, &operands) {
                Ok(child_env) => {
                    self.activate_body(child_env, mac.body.clone(), true);
                    None
                }
                Err(fatal) => self.complete_call(fatal),
            },
            other => {
                let fatal = Value::fatal("not-callable", Some(other));
                self.complete_call(fatal)
            }
        }
    }

    /// Switches into a Closure/Macro body, marking the caller's
    /// already-pushed frame with the environment to restore (and, for
    /// macros, the re-dispatch marker) on exit.
    fn activate_body(&mut self, child_env: Rc<Environment>, body: Value, macro_return: bool) {
        if let Some(top) = self.call_stack.last_mut() {
            top.env = Some(self.env.clone());
            top.macro_return = macro_return;
        }
        self.env = child_env;
        self.control = body;
        self.args_num = 0;
        self.mode = None;
    }

    /// Returns `value` as this call's result: pops the saved parent frame
    /// and resumes it, or halts if the call stack is empty (§4.1.1, last
    /// paragraph).
    fn complete_call(&mut self, value: Value) -> Option<Value> {
        match self.call_stack.pop() {
            None => {
                if value.is_fatal() {
                    self.data.push(value);
                    None
                } else {
                    Some(value)
                }
            }
            Some(frame) => {
                if frame.macro_return && !value.is_fatal() {
                    return self.finish_macro_return(frame, value);
                }
                self.control = frame.control;
                self.args_num = frame.args_num;
                self.mode = frame.mode;
                if let Some(env) = frame.env {
                    self.env = env;
                }
                self.data.push(value.clone());
                self.after_value_pushed(&value);
                None
            }
        }
    }

    /// Macro re-dispatch (§4.1.3): re-push a fresh copy of the caller's
    /// frame, then evaluate the expansion in the caller's environment.
    fn finish_macro_return(&mut self, frame: Frame, expansion: Value) -> Option<Value> {
        let caller_env = frame.env.clone().unwrap_or_else(|| self.env.clone());
        self.call_stack.push(Frame {
            control: frame.control,
            args_num: frame.args_num,
            mode: frame.mode,
            env: frame.env,
            macro_return: false,
        });
        self.env = caller_env;
        let expansion = expansion.unmarked().clone();
        self.control = if expansion.is_pair() {
            expansion
        } else {
            Value::cons(Value::symbol("begin"), Value::cons(expansion, Value::Nil))
        };
        self.args_num = 0;
        self.mode = None;
        None
    }

    /// The head of the live frame, read back off the data stack (valid
    /// whenever `args_num >= 1`; it is the bottommost of this frame's
    /// `args_num` staged items).
    fn frame_head(&self) -> Option<Value> {
        if self.args_num >= 1 && self.args_num <= self.data.len() {
            Some(self.data[self.data.len() - self.args_num].clone())
        } else {
            None
        }
    }

    /// Fatal propagation (§4.5): unwind frames, accumulating a trace, until
    /// a `catch` intercepts or the call stack empties.
    fn fatal_fall(&mut self) -> Option<Value> {
        let fatal_rc = match self.data.pop() {
            Some(Value::Fatal(rc)) => rc,
            other => unreachable!("fatal_fall entered without a Fatal on top: {:?}", other),
        };
        // The popped Fatal occupied the current frame's next operand slot;
        // decrement args_num to match what's left on the data stack (§9: "the
        // algorithm decrements argsNum at least once even when argsNum == 0",
        // which surfaces here as a None `frame_head`/a Nil trace entry).
        self.args_num = self.args_num.saturating_sub(1);

        loop {
            let head = self.frame_head();
            let is_catch = matches!(head.as_ref().map(Value::unmarked), Some(Value::Primitive("catch")));
            if is_catch {
                if let Some(action) = self.match_catch_clause(&fatal_rc.borrow()) {
                    let tag = fatal_rc.borrow().tag.clone();
                    let discard = self.args_num.min(self.data.len());
                    self.data.truncate(self.data.len() - discard);
                    return self.apply_catch_action(action, tag);
                }
            }

            fatal_rc.borrow_mut().trace.push((head.unwrap_or(Value::Nil), self.args_num));
            let discard = self.args_num.min(self.data.len());
            self.data.truncate(self.data.len() - discard);

            match self.call_stack.pop() {
                None => {
                    render_trace(&fatal_rc.borrow());
                    return Some(Value::Fatal(fatal_rc));
                }
                Some(frame) => {
                    self.control = frame.control;
                    self.args_num = frame.args_num;
                    self.mode = frame.mode;
                    if let Some(env) = frame.env {
                        self.env = env;
                    }
                }
            }
        }
    }

    /// Scans `catch`'s still-unevaluated clause list (the control tail
    /// left behind when the protected expression turned Fatal) for a
    /// tag-prefix or `default` match.
    fn match_catch_clause(&self, fatal: &crate::value::FatalData) -> Option<ClauseAction> {
        let clauses = self.control.cdr().unwrap_or(Value::Nil);
        for clause in clauses.as_proper_list().unwrap_or_default() {
            let parts = clause.as_proper_list().unwrap_or_default();
            let Some(tag_form) = parts.first() else { continue };
            let is_match = match tag_form.unmarked() {
                Value::Symbol(s) if &**s == "default" => true,
                Value::Symbol(s) => fatal.tag.starts_with(&**s as &str),
                _ => false,
            };
            if !is_match {
                continue;
            }
            return Some(if parts.len() <= 1 {
                ClauseAction::Value(fatal.payload.clone().unwrap_or(Value::Nil))
            } else {
                ClauseAction::Body(Value::list(parts[1..].to_vec()))
            });
        }
        None
    }

    fn apply_catch_action(&mut self, action: ClauseAction, tag: Rc<str>) -> Option<Value> {
        self.env = Environment::with_parent(self.env.clone());
        self.env.define("error_description", Value::Symbol(tag));
        match action {
            ClauseAction::Value(v) => self.complete_call(v),
            ClauseAction::Body(body) => {
                self.control = Value::cons(Value::symbol("begin"), body);
                self.args_num = 0;
                self.mode = None;
                None
            }
        }
    }
}

fn bind_closure_params(lambda: &Lambda, operands: &[Value]) -> Result<Rc<Environment>, Value> {
    let child = Environment::with_parent(lambda.env.clone());
    match &lambda.params {
        Params::Rest(name) => {
            child.define(name.clone(), Value::list(operands.to_vec()));
        }
        Params::Fixed(names) => {
            if names.len() != operands.len() {
                return Err(arity_fatal(names.len(), operands.len()));
            }
            for (name, value) in names.iter().zip(operands) {
                child.define(name.clone(), value.clone());
            }
        }
    }
    Ok(child)
}

fn bind_macro_params(mac: &Macro, operands: &[Value]) -> Result<Rc<Environment>, Value> {
    let child = Environment::with_parent(mac.env.clone());
    match &mac.params {
        MacroParams::Rest(name) => {
            child.define(name.clone(), Value::list(operands.to_vec()));
        }
        MacroParams::Fixed(entries) => {
            if entries.len() != operands.len() {
                return Err(arity_fatal(entries.len(), operands.len()));
            }
            for ((name, _evaluated), value) in entries.iter().zip(operands) {
                child.define(name.clone(), value.clone());
            }
        }
    }
    Ok(child)
}

fn arity_fatal(expected: usize, got: usize) -> Value {
    Value::fatal(
        "arity-mismatch",
        Some(Value::list(vec![Value::Number(expected as f64), Value::Number(got as f64)])),
    )
}

/// Renders the accumulated trace to stderr, innermost call first, one line
/// per frame (§4.2 "Fatal trace accumulation", §8 "Trace on uncaught Fatal").
fn render_trace(fatal: &crate::value::FatalData) {
    eprintln!("uncaught fatal: {}", fatal.tag);
    for (head, pos) in &fatal.trace {
        eprintln!("  at {} (position {})", head, pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use crate::value::{MacroParams, Params};

    fn eval_str(src: &str) -> Value {
        let program = parse_program(src).unwrap();
        let env = crate::primitives::root_environment();
        let mut evaluator = Evaluator::new(program, env, None);
        evaluator.run()
    }

    #[test]
    fn factorial_via_recursive_closure() {
        let v = eval_str(
            "(define fact (lambda (n) (if (> n 1) (* n (fact (- n 1))) 1))) (fact 5)",
        );
        assert!(matches!(v, Value::Number(n) if n == 120.0));
    }

    #[test]
    fn computed_head_dispatch() {
        let v = eval_str("((if (> 2 3) + -) 5 4)");
        assert!(matches!(v, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn catch_default_clause() {
        let v = eval_str("(catch (/ 6 0) (default 7))");
        assert!(matches!(v, Value::Number(n) if n == 7.0));
    }

    #[test]
    fn catch_throw_with_payload() {
        let v = eval_str("(catch (throw 'PANIC '|Dont panic|) (PANIC))");
        assert!(matches!(&v, Value::Symbol(s) if &**s == "Dont panic"));
    }

    #[test]
    fn variadic_closure_binds_arg_list() {
        let v = eval_str("(define f (lambda args args)) (f 8 3 4)");
        let items = v.as_proper_list().unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn equal_on_multiple_numbers() {
        assert!(eval_str("(= 2 3 4)").is_nil());
        assert!(eval_str("(= 4 4 4 4)").truthy());
    }

    #[test]
    fn eval_tail_redispatch_defines_in_caller_scope() {
        let v = eval_str("(eval '(+ 2 4 3))");
        assert!(matches!(v, Value::Number(n) if n == 9.0));
    }

    #[test]
    fn or_short_circuits_before_side_effecting_write() {
        // `write` would push to stdout if evaluated; its operand position
        // is past the first truthy value so it must never run.
        let v = eval_str("(or 5 (write 'should-not-print))");
        assert!(matches!(v, Value::Number(n) if n == 5.0));
    }

    #[test]
    fn lexical_scope_survives_shadowing() {
        // `x` inside `g` is the parameter binding captured at `(f 42)`, not
        // the later top-level `x` redefinition, which lands in a sibling
        // (outer) binding that g's captured environment never re-reads.
        let v = eval_str(
            "(define f (lambda (x) (lambda () x))) (define g (f 42)) (define x 999) (g)",
        );
        assert!(matches!(v, Value::Number(n) if n == 42.0));
    }

    #[test]
    fn bind_closure_params_rest_collects_all_args() {
        let env = Environment::new();
        let lambda = Lambda {
            params: Params::Rest("args".into()),
            body: Value::Nil,
            env,
        };
        let child = bind_closure_params(&lambda, &[Value::Number(1.0), Value::Number(2.0)]).unwrap();
        let bound = child.get("args").unwrap();
        assert_eq!(bound.as_proper_list().unwrap().len(), 2);
    }

    #[test]
    fn bind_closure_params_arity_mismatch_is_fatal() {
        let env = Environment::new();
        let lambda = Lambda {
            params: Params::Fixed(vec!["a".into(), "b".into()]),
            body: Value::Nil,
            env,
        };
        let result = bind_closure_params(&lambda, &[Value::Number(1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn bind_macro_params_marks_only_comma_positions_evaluated() {
        let env = Environment::new();
        let mac = Macro {
            params: MacroParams::Fixed(vec![("a".into(), false), ("b".into(), true)]),
            body: Value::Nil,
            env,
        };
        let mode = Mode::for_macro(&mac.params);
        match mode {
            Mode::Exec(mask) => {
                assert!(!mask.contains(&1));
                assert!(mask.contains(&2));
            }
            _ => panic!("expected Exec mode"),
        }
    }
}
