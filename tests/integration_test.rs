// ABOUTME: End-to-end programs exercised through the public eval/facade surface

use lisp_eval_core::eval::Evaluator;
use lisp_eval_core::facade::{HostArg, ProgramHandle};
use lisp_eval_core::parser::parse_program;
use lisp_eval_core::primitives::root_environment;
use lisp_eval_core::value::Value;

fn run(src: &str) -> Value {
    let program = parse_program(src).unwrap();
    let env = root_environment();
    let mut evaluator = Evaluator::new(program, env, None);
    evaluator.run()
}

// §8 scenario 1
#[test]
fn factorial_of_five() {
    let v = run(
        "(define fact (lambda (n) (if (> n 1) (* n (fact (- n 1))) 1))) (fact 5)",
    );
    assert_eq!(format!("{v}"), "120");
}

// §8 scenario 2
#[test]
fn computed_head_selects_subtraction() {
    let v = run("((if (> 2 3) + -) 5 4)");
    assert_eq!(format!("{v}"), "1");
}

// §8 scenario 3
#[test]
fn catch_recovers_from_division_by_zero() {
    let v = run("(catch (/ 6 0) (default 7))");
    assert_eq!(format!("{v}"), "7");
}

// §8 scenario 4
#[test]
fn catch_matches_thrown_tag_over_default() {
    let v = run("(catch (throw 'PANIC '|Dont panic|) (PANIC))");
    assert_eq!(format!("{v}"), "Dont panic");
}

// §8 scenario 5
#[test]
fn variadic_lambda_collects_all_arguments() {
    let v = run("(define f (lambda args args)) (f 8 3 4)");
    assert_eq!(format!("{v}"), "(8 3 4)");
}

// §8 scenario 6 — macro hygiene is not provided: set10 mutates the
// caller's `q` by straight substitution.
#[test]
fn defmacro_expands_by_substitution_in_caller_scope() {
    let v = run(
        "(defmacro set10 (s) (cons 'set! (cons s (cons 10 nil)))) (define q 303) (set10 q) q",
    );
    assert_eq!(format!("{v}"), "10");
}

// §8 scenario 7
#[test]
fn equality_across_many_numbers() {
    assert_eq!(format!("{}", run("(= 2 3 4)")), "nil");
    assert_eq!(format!("{}", run("(= 4 4 4 4)")), "T");
}

// §8 scenario 8
#[test]
fn eval_tail_redispatch_computes_in_place() {
    let v = run("(eval '(+ 2 4 3))");
    assert_eq!(format!("{v}"), "9");
}

#[test]
fn eval_tail_redispatch_of_define_lands_in_caller_scope() {
    let v = run("(eval '(define b 42)) b");
    assert_eq!(format!("{v}"), "42");
}

#[test]
fn lexical_scope_is_immune_to_later_redefinition() {
    let v = run(
        "(define f (lambda (x) (lambda () x))) \
         (define g (f 7)) \
         (define x 999) \
         (g)",
    );
    assert_eq!(format!("{v}"), "7");
}

#[test]
fn catch_binds_error_description_to_the_fatal_tag() {
    let v = run("(catch (throw 'BOOM) (BOOM error_description))");
    assert_eq!(format!("{v}"), "BOOM");
}

#[test]
fn uncaught_fatal_becomes_the_program_result() {
    let v = run("(/ 1 0)");
    assert!(v.is_fatal());
}

#[test]
fn or_and_if_never_evaluate_past_their_decision_point() {
    // `write` would print if evaluated; none of these forms should run it.
    assert_eq!(format!("{}", run("(or 5 (write 'nope))")), "5");
    assert_eq!(format!("{}", run("(and nil (write 'nope))")), "nil");
    assert_eq!(format!("{}", run("(if nil (write 'nope) 3)")), "3");
}

#[test]
fn program_with_unbound_symbol_produces_a_fatal() {
    let v = run("undefined-name");
    assert!(v.is_fatal());
}

#[test]
fn facade_load_then_call_with_host_arguments() {
    let (handle, _) = ProgramHandle::load(
        "(define greet (lambda (name) (cons name (cons 'hello nil))))",
        None,
    )
    .unwrap();
    let result = handle.call("greet", vec![HostArg::Symbol("world".into())], None);
    assert_eq!(format!("{result}"), "(world hello)");
}

#[test]
fn facade_serial_reentry_observes_mutated_state() {
    let (handle, _) = ProgramHandle::load(
        "(define total 0) (define add (lambda (n) (set! total (+ total n)) total))",
        None,
    )
    .unwrap();
    assert_eq!(format!("{}", handle.call("add", vec![HostArg::Number(5.0)], None)), "5");
    assert_eq!(format!("{}", handle.call("add", vec![HostArg::Number(5.0)], None)), "10");
}

#[test]
fn deeply_recursive_closure_does_not_corrupt_state() {
    let v = run(
        "(define count-down (lambda (n) (if (= n 0) 'done (count-down (- n 1))))) \
         (count-down 500)",
    );
    assert_eq!(format!("{v}"), "done");
}
