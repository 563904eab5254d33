/*!

The end-to-end compilation scenarios, each driven through both compilers and the interpreter.

*/

use super::*;
use crate::api::error::Warning;

// `match Foo(x=1, y=2) { Foo(x=x1) => x1 }` yields `1`.
#[test]
fn struct_by_name() {
  let oracle = test_oracle();
  let subject = foo_value(Value::Int(1), Value::Int(2), &oracle);
  let match_arms = arms(vec![(ctor_named("Foo", vec![("x", id("x1"))]), id("x1"))]);

  assert_eq!(run_agreeing(subject, &match_arms, &oracle), Ok(Value::Int(1)));
}

// `match (1, (2, 3)) { (1, (x, :nope) | (2, x)) => x }` yields `3`: only the right branch of the
// disjunction matches, and `x` flows out through the phi temporary.
#[test]
fn disjunction_binding() {
  let oracle = test_oracle();
  let subject = Value::Tuple(vec![Value::Int(1), Value::Tuple(vec![Value::Int(2), Value::Int(3)])]);
  let pattern = tup(vec![
    int(1),
    pat_or(
      tup(vec![id("x"), sym("nope")]),
      tup(vec![int(2), id("x")]),
    ),
  ]);
  let match_arms = arms(vec![(pattern, id("x"))]);

  assert_eq!(run_agreeing(subject, &match_arms, &oracle), Ok(Value::Int(3)));
}

// `match (1, (2, 3)) { (1, a && (2, b)) => (a, b) }` yields `((2, 3), 3)`: the conjunction keeps
// the outer binding while the inner pattern destructures the same value.
#[test]
fn conjunction_keeps_outer_binding() {
  let oracle = test_oracle();
  let subject = Value::Tuple(vec![Value::Int(1), Value::Tuple(vec![Value::Int(2), Value::Int(3)])]);
  let pattern = tup(vec![int(1), pat_and(id("a"), tup(vec![int(2), id("b")]))]);
  let match_arms = arms(vec![(pattern, tup(vec![id("a"), id("b")]))]);

  assert_eq!(
    run_agreeing(subject, &match_arms, &oracle),
    Ok(Value::Tuple(vec![
      Value::Tuple(vec![Value::Int(2), Value::Int(3)]),
      Value::Int(3),
    ]))
  );
}

// `match (1, 2, 3, 4, 5) { (a, b..., c) => (a, b, c) }` yields `(1, (2, 3, 4), 5)`.
#[test]
fn splat_in_middle() {
  let oracle = test_oracle();
  let subject = Value::Tuple((1..=5).map(Value::Int).collect());
  let pattern = tup(vec![id("a"), splat(id("b")), id("c")]);
  let match_arms = arms(vec![(pattern, tup(vec![id("a"), id("b"), id("c")]))]);

  assert_eq!(
    run_agreeing(subject, &match_arms, &oracle),
    Ok(Value::Tuple(vec![
      Value::Int(1),
      Value::Tuple(vec![Value::Int(2), Value::Int(3), Value::Int(4)]),
      Value::Int(5),
    ]))
  );
}

// `match [1, 2] { [x, y where y > x] => (x, y) }` yields `(1, 2)`; on `[2, 1]` the guard fails
// and the whole match fails.
#[test]
fn guard_uses_earlier_binding() {
  let oracle = test_oracle();
  let pattern = seq(vec![id("x"), where_guard(id("y"), greater(id("y"), id("x")))]);
  let match_arms = arms(vec![(pattern, tup(vec![id("x"), id("y")]))]);

  let ascending = Value::Sequence(vec![Value::Int(1), Value::Int(2)]);
  assert_eq!(
    run_agreeing(ascending, &match_arms, &oracle),
    Ok(Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
  );

  let descending = Value::Sequence(vec![Value::Int(2), Value::Int(1)]);
  assert_eq!(
    run_agreeing(descending.clone(), &match_arms, &oracle),
    Err(RuntimeError::MatchFailure(descending))
  );
}

// In `match v { _ => :a; _ => :b }` the second arm is reported unreachable and never executed.
#[test]
fn reachability_warning() {
  let oracle = test_oracle();
  let match_arms = arms(vec![(wildcard(), sym("a")), (wildcard(), sym("b"))]);

  let compiled = compile_match(&id("subject"), &match_arms, &oracle).expect("compilation succeeds");
  assert_eq!(compiled.warnings.len(), 1);
  let Warning::UnreachableArm { arm_number, location } = &compiled.warnings[0];
  assert_eq!(*arm_number, 2);
  assert_eq!(location.line, 2);
  assert_eq!(compiled.warnings[0].to_string(), "test.jl:2: arm 2 is unreachable");

  assert_eq!(
    run_compiled(&compiled, Value::Int(7), &oracle),
    Ok(Value::symbol("a"))
  );
}

// A positional `Foo(x, y, z)` against the 2-field `Foo` is rejected at compile time.
#[test]
fn wrong_arity_is_rejected() {
  let oracle = test_oracle();
  let match_arms = arms(vec![(ctor("Foo", vec![id("x"), id("y"), id("z")]), int(1))]);

  let error = compile_match(&id("subject"), &match_arms, &oracle).unwrap_err();
  assert_eq!(
    error.to_string(),
    "test.jl:1: type Foo has 2 fields but the pattern expects 3 fields"
  );
}

// With `a = 1, b = 2, c = 3` in scope, `match [1, 2, 3, 4] { [$a, $b, $c, out] => out }` yields
// `4`: interpolations compare against the host variables, not fresh bindings.
#[test]
fn interpolation() {
  let oracle = test_oracle();
  let pattern = seq(vec![
    interp(id("a")),
    interp(id("b")),
    interp(id("c")),
    id("out"),
  ]);
  let match_arms = arms(vec![(pattern, id("out"))]);
  let compiled = compile_match(&id("subject"), &match_arms, &oracle).expect("compilation succeeds");

  let mut interpreter = Interpreter::new(&oracle);
  interpreter.set_global("a", Value::Int(1));
  interpreter.set_global("b", Value::Int(2));
  interpreter.set_global("c", Value::Int(3));
  interpreter.set_global("subject", Value::Sequence((1..=4).map(Value::Int).collect()));

  assert_eq!(interpreter.run(&compiled), Ok(Value::Int(4)));
}

// Dispatch over an abstract type's concrete subtypes, with the type tests shared and refined.
#[test]
fn type_dispatch() {
  let oracle = test_oracle();
  let circle = oracle.resolve_type(&id("Circle")).unwrap();
  let square = oracle.resolve_type(&id("Square")).unwrap();

  let match_arms = arms(vec![
    (ctor_named("Circle", vec![("radius", id("r"))]), tup(vec![sym("circle"), id("r")])),
    (ctor_named("Square", vec![("side", id("s"))]), tup(vec![sym("square"), id("s")])),
    (type_assert(None, "Shape"), sym("other")),
    (wildcard(), sym("not-a-shape")),
  ]);

  let round = Value::structure(circle, &[("radius", Value::Int(3))]);
  assert_eq!(
    run_agreeing(round, &match_arms, &oracle),
    Ok(Value::Tuple(vec![Value::symbol("circle"), Value::Int(3)]))
  );

  let boxy = Value::structure(square, &[("side", Value::Int(2))]);
  assert_eq!(
    run_agreeing(boxy, &match_arms, &oracle),
    Ok(Value::Tuple(vec![Value::symbol("square"), Value::Int(2)]))
  );

  assert_eq!(
    run_agreeing(Value::Int(9), &match_arms, &oracle),
    Ok(Value::symbol("not-a-shape"))
  );
}

// `match_fail` falls through to the remaining arms; `match_return` finishes the whole match.
#[test]
fn early_exit_markers() {
  let oracle = test_oracle();

  let bail = ExprAST::block(
    location(),
    vec![ExprAST::match_fail(location()), sym("unreached")],
  );
  let match_arms = arms(vec![(id("x"), bail), (wildcard(), sym("second"))]);
  assert_eq!(
    run_agreeing(Value::Int(1), &match_arms, &oracle),
    Ok(Value::symbol("second"))
  );

  let finish_early = ExprAST::block(
    location(),
    vec![ExprAST::match_return(location(), int(42)), sym("unreached")],
  );
  let match_arms = arms(vec![(wildcard(), finish_early)]);
  assert_eq!(run_agreeing(Value::Int(1), &match_arms, &oracle), Ok(Value::Int(42)));
}

// `match_fail` in the last arm is a match failure.
#[test]
fn match_fail_in_last_arm_fails_the_match() {
  let oracle = test_oracle();
  let bail = ExprAST::block(location(), vec![ExprAST::match_fail(location())]);
  let match_arms = arms(vec![(wildcard(), bail)]);

  assert_eq!(
    run_agreeing(Value::Int(5), &match_arms, &oracle),
    Err(RuntimeError::MatchFailure(Value::Int(5)))
  );
}

// Quoted AST nodes match by structural equality only.
#[test]
fn quoted_ast_literal_equality() {
  let oracle = test_oracle();
  let quoted = |inner: ExprAST| ExprAST::quoted(location(), inner);

  let match_arms = arms(vec![
    (quoted(greater(id("n"), int(0))), sym("positive-guard")),
    (wildcard(), sym("something-else")),
  ]);

  let same = Value::Quoted(Box::new(greater(id("n"), int(0))));
  assert_eq!(
    run_agreeing(same, &match_arms, &oracle),
    Ok(Value::symbol("positive-guard"))
  );

  let different = Value::Quoted(Box::new(greater(id("n"), int(1))));
  assert_eq!(
    run_agreeing(different, &match_arms, &oracle),
    Ok(Value::symbol("something-else"))
  );
}

// The boolean form introduces the pattern's variables into the caller's scope on success only.
#[test]
fn is_match_form() {
  let oracle = test_oracle();
  let pattern = tup(vec![int(1), id("x")]);
  let compiled = compile_is_match(&id("subject"), &pattern, &oracle).expect("compilation succeeds");

  let mut interpreter = Interpreter::new(&oracle);
  interpreter.set_global("subject", Value::Tuple(vec![Value::Int(1), Value::Int(5)]));
  assert_eq!(interpreter.run(&compiled), Ok(Value::Bool(true)));
  assert_eq!(interpreter.global("x"), Some(&Value::Int(5)));

  let mut interpreter = Interpreter::new(&oracle);
  interpreter.set_global("subject", Value::Tuple(vec![Value::Int(2), Value::Int(5)]));
  assert_eq!(interpreter.run(&compiled), Ok(Value::Bool(false)));
  assert_eq!(interpreter.global("x"), None);
}

// The unary form yields the matched value and binds, or raises the match failure.
#[test]
fn assignment_form() {
  let oracle = test_oracle();
  let pattern = tup(vec![id("a"), id("b")]);
  let compiled = compile_assignment(&pattern, &id("subject"), &oracle).expect("compilation succeeds");

  let pair = Value::Tuple(vec![Value::Int(1), Value::Int(2)]);
  let mut interpreter = Interpreter::new(&oracle);
  interpreter.set_global("subject", pair.clone());
  assert_eq!(interpreter.run(&compiled), Ok(pair));
  assert_eq!(interpreter.global("a"), Some(&Value::Int(1)));
  assert_eq!(interpreter.global("b"), Some(&Value::Int(2)));

  let mut interpreter = Interpreter::new(&oracle);
  interpreter.set_global("subject", Value::Int(5));
  assert_eq!(
    interpreter.run(&compiled),
    Err(RuntimeError::MatchFailure(Value::Int(5)))
  );
}
