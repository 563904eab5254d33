/*!

Coverage of the error table: every compile-time kind fires at the pattern site with a
`file:line` prefix, and the runtime kinds surface through the interpreter.

*/

use super::*;
use crate::api::error::CompileError;

fn compile_error(pattern: ExprAST, oracle: &TypeTable) -> CompileError {
  let match_arms = arms(vec![(pattern, int(1))]);
  compile_match(&id("subject"), &match_arms, oracle).unwrap_err()
}

#[test]
fn unresolved_type() {
  let oracle = test_oracle();
  let error = compile_error(type_assert(None, "Nope"), &oracle);
  assert!(matches!(error, CompileError::UnresolvedType { .. }), "got {}", error);
  assert!(error.to_string().starts_with("test.jl:1: "));
}

#[test]
fn non_type() {
  let oracle = test_oracle();
  // `pi` is registered as a plain value in the test oracle.
  let error = compile_error(type_assert(Some(id("x")), "pi"), &oracle);
  assert!(matches!(error, CompileError::NonType { .. }), "got {}", error);
}

#[test]
fn duplicate_named_field() {
  let oracle = test_oracle();
  let error = compile_error(ctor_named("Foo", vec![("x", int(1)), ("x", int(2))]), &oracle);
  assert!(matches!(error, CompileError::DuplicateNamedField { .. }), "got {}", error);
}

#[test]
fn mixed_field_style() {
  let oracle = test_oracle();
  let pattern = ExprAST::call(
    location(),
    id("Foo"),
    vec![
      CallArgAST::Named { name: "x".into(), value: int(1) },
      CallArgAST::Positional(int(2)),
    ],
  );
  let error = compile_error(pattern, &oracle);
  assert!(matches!(error, CompileError::MixedFieldStyle { .. }), "got {}", error);
}

#[test]
fn wrong_field_count() {
  let oracle = test_oracle();
  let error = compile_error(ctor("Foo", vec![id("x")]), &oracle);
  assert_eq!(
    error.to_string(),
    "test.jl:1: type Foo has 2 fields but the pattern expects 1 fields"
  );
}

#[test]
fn unknown_field() {
  let oracle = test_oracle();
  let error = compile_error(ctor_named("Foo", vec![("z", int(1))]), &oracle);
  assert!(matches!(error, CompileError::UnknownField { .. }), "got {}", error);
  assert!(error.to_string().contains("has no field z"));
}

#[test]
fn multiple_splats() {
  let oracle = test_oracle();
  let error = compile_error(tup(vec![splat(id("a")), splat(id("b"))]), &oracle);
  assert!(matches!(error, CompileError::MultipleSplats { .. }), "got {}", error);
}

#[test]
fn unrecognized_pattern() {
  let oracle = test_oracle();
  // Arithmetic is not a pattern form.
  let pattern = ExprAST::arith(location(), crate::api::ast::ArithOp::Add, int(1), int(2));
  let error = compile_error(pattern, &oracle);
  assert!(matches!(error, CompileError::UnrecognizedPattern { .. }), "got {}", error);
}

#[test]
fn unrecognized_block() {
  let oracle = test_oracle();
  let error = compile_match(&id("subject"), &int(1), &oracle).unwrap_err();
  assert!(matches!(error, CompileError::UnrecognizedBlock { .. }), "got {}", error);
}

#[test]
fn unrecognized_case() {
  let oracle = test_oracle();
  let block = ExprAST::block(location(), vec![int(1)]);
  let error = compile_match(&id("subject"), &block, &oracle).unwrap_err();
  assert!(matches!(error, CompileError::UnrecognizedCase { .. }), "got {}", error);
}

// A single `pattern => result` outside a block is accepted as a one-arm match.
#[test]
fn single_case_without_block() {
  let oracle = test_oracle();
  let single = ExprAST::arm(location(), id("x"), id("x"));
  let compiled = compile_match(&id("subject"), &single, &oracle).expect("compilation succeeds");
  assert_eq!(run_compiled(&compiled, Value::Int(3), &oracle), Ok(Value::Int(3)));
}

// An empty arms block compiles to an unconditional match failure.
#[test]
fn empty_block_always_fails() {
  let oracle = test_oracle();
  let block = ExprAST::block(location(), vec![]);
  let compiled = compile_match(&id("subject"), &block, &oracle).expect("compilation succeeds");
  assert_eq!(
    run_compiled(&compiled, Value::Int(3), &oracle),
    Err(RuntimeError::MatchFailure(Value::Int(3)))
  );
}

// The compiled code asserts that type names still resolve to the same types at run time.
#[test]
fn type_binding_changed() {
  let oracle = test_oracle();
  let match_arms = arms(vec![
    (ctor_named("Foo", vec![("x", id("x"))]), id("x")),
    (wildcard(), sym("other")),
  ]);
  let compiled = compile_match(&id("subject"), &match_arms, &oracle).expect("compilation succeeds");

  // The same source names in a module where `Foo` resolves to a different type.
  let mut shifted = TypeTable::new();
  shifted.define_struct("Bar", None, &[]);
  shifted.define_struct("Foo", None, &[("x", TypeHandle::Any), ("y", TypeHandle::Any)]);

  let mut interpreter = Interpreter::new(&shifted);
  interpreter.set_global("subject", Value::Int(1));
  assert_eq!(
    interpreter.run(&compiled),
    Err(RuntimeError::TypeBindingChanged { name: "Foo".into() })
  );
}

// Guards shred through De Morgan: a negated conjunction still evaluates correctly.
#[test]
fn negated_guard_shredding() {
  let oracle = test_oracle();
  let guard = ExprAST::not(
    location(),
    pat_and(greater(id("x"), int(0)), greater(int(10), id("x"))),
  );
  let match_arms = arms(vec![
    (where_guard(id("x"), guard), sym("outside")),
    (wildcard(), sym("inside")),
  ]);

  assert_eq!(run_agreeing(Value::Int(5), &match_arms, &oracle), Ok(Value::symbol("inside")));
  assert_eq!(run_agreeing(Value::Int(12), &match_arms, &oracle), Ok(Value::symbol("outside")));
  assert_eq!(run_agreeing(Value::Int(-3), &match_arms, &oracle), Ok(Value::symbol("outside")));
}
