/*!

End-to-end tests: the compilation scenarios, the universal properties, and the error table.
Component-local behavior is tested next to the components; everything here drives the public
entry points and runs the emitted code on the interpreter.

*/

mod errors;
mod scenarios;

use matchc_abs::IString;

pub(crate) use crate::api::{
  ast::{CallArgAST, ExprAST, Location, RelationalOp},
  compile::{compile_assignment, compile_is_match, compile_match, compile_match_reference},
  error::RuntimeError,
  oracle::{TypeHandle, TypeOracle, TypeTable},
  CompiledMatch, Interpreter, Statement, Value,
};

pub(crate) fn location() -> Location {
  Location::new("test.jl", 1)
}

pub(crate) fn location_at(line: u32) -> Location {
  Location::new("test.jl", line)
}

// region AST shorthands

pub(crate) fn id(name: &str) -> ExprAST {
  ExprAST::identifier(location(), name)
}

pub(crate) fn int(value: i64) -> ExprAST {
  ExprAST::int(location(), value)
}

pub(crate) fn sym(name: &str) -> ExprAST {
  ExprAST::symbol(location(), name)
}

pub(crate) fn wildcard() -> ExprAST {
  ExprAST::wildcard(location())
}

pub(crate) fn tup(items: Vec<ExprAST>) -> ExprAST {
  ExprAST::tuple(location(), items)
}

pub(crate) fn seq(items: Vec<ExprAST>) -> ExprAST {
  ExprAST::sequence(location(), items)
}

pub(crate) fn splat(inner: ExprAST) -> ExprAST {
  ExprAST::splat(location(), inner)
}

pub(crate) fn pat_or(lhs: ExprAST, rhs: ExprAST) -> ExprAST {
  ExprAST::or(location(), lhs, rhs)
}

pub(crate) fn pat_and(lhs: ExprAST, rhs: ExprAST) -> ExprAST {
  ExprAST::and(location(), lhs, rhs)
}

pub(crate) fn where_guard(subject: ExprAST, guard: ExprAST) -> ExprAST {
  ExprAST::where_guard(location(), subject, guard)
}

pub(crate) fn greater(lhs: ExprAST, rhs: ExprAST) -> ExprAST {
  ExprAST::compare(location(), RelationalOp::Greater, lhs, rhs)
}

pub(crate) fn interp(inner: ExprAST) -> ExprAST {
  ExprAST::interpolation(location(), inner)
}

pub(crate) fn type_assert(subject: Option<ExprAST>, ty: &str) -> ExprAST {
  ExprAST::type_assert(location(), subject, id(ty))
}

pub(crate) fn ctor(name: &str, args: Vec<ExprAST>) -> ExprAST {
  ExprAST::call(location(), id(name), args.into_iter().map(CallArgAST::Positional).collect())
}

pub(crate) fn ctor_named(name: &str, fields: Vec<(&str, ExprAST)>) -> ExprAST {
  ExprAST::call(
    location(),
    id(name),
    fields.into_iter()
        .map(|(field, value)| CallArgAST::Named { name: IString::from(field), value })
        .collect(),
  )
}

/// A match block from `(pattern, result)` pairs, one arm per source line.
pub(crate) fn arms(cases: Vec<(ExprAST, ExprAST)>) -> ExprAST {
  let block_items = cases.into_iter()
      .enumerate()
      .map(|(i, (pattern, result))| ExprAST::arm(location_at(i as u32 + 1), pattern, result))
      .collect();
  ExprAST::block(location(), block_items)
}

// endregion AST shorthands

/// An oracle with the types the tests dispatch on.
pub(crate) fn test_oracle() -> TypeTable {
  let mut table = TypeTable::new();
  table.define_struct("Foo", None, &[("x", TypeHandle::Any), ("y", TypeHandle::Any)]);
  let shape = table.define_abstract("Shape", None);
  table.define_struct("Circle", Some(shape), &[("radius", TypeHandle::Any)]);
  table.define_struct("Square", Some(shape), &[("side", TypeHandle::Any)]);
  table.define_value("pi");
  table
}

pub(crate) fn foo_value(x: Value, y: Value, oracle: &TypeTable) -> Value {
  let foo = oracle
      .resolve_type(&id("Foo"))
      .expect("Foo is registered");
  Value::structure(foo, &[("x", x), ("y", y)])
}

/// Compiles with both compilers, checks they agree on `subject`, and returns the shared outcome.
pub(crate) fn run_agreeing(subject: Value, match_arms: &ExprAST, oracle: &TypeTable) -> Result<Value, RuntimeError> {
  let compiled = compile_match(&id("subject"), match_arms, oracle).expect("compilation succeeds");
  let reference = compile_match_reference(&id("subject"), match_arms, oracle).expect("reference compilation succeeds");

  let outcome = run_compiled(&compiled, subject.clone(), oracle);
  let reference_outcome = run_compiled(&reference, subject, oracle);
  assert_eq!(outcome, reference_outcome, "compilers disagree");
  outcome
}

pub(crate) fn run_compiled(compiled: &CompiledMatch, subject: Value, oracle: &TypeTable) -> Result<Value, RuntimeError> {
  let mut interpreter = Interpreter::new(oracle);
  interpreter.set_global("subject", subject);
  interpreter.run(compiled)
}
