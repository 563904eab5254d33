/*!

The compilation entry points.

`compile_match` is the production compiler: arms are bound, the decision automaton is built and
minimized, and the emitter lays it out. `compile_match_reference` compiles the same inputs into a
straight-line `if`/`else` chain per arm, with no deduplication; it exists as the
differential-test oracle. `compile_is_match` and `compile_assignment` are the boolean and unary
forms, built from the same pipeline with synthesized arms.

*/

use matchc_abs::{debug, IString};

use crate::{
  api::{
    ast::{ExprAST, ExprASTKind},
    error::CompileError,
    oracle::TypeOracle,
  },
  core::{
    automaton::{minimize, Automaton},
    binder::Binder,
    binding::{Bindings, PartialArm},
    emit::{emit, CompiledMatch},
    pattern::BoundPattern,
    reference::{compile_reference, MatchCase},
  },
};

/// Compiles `match scrutinee { arms }` into a deduplicated decision automaton laid out as a
/// statement list. The arms block is either a block of `pattern => result` cases or a single
/// case.
pub fn compile_match(
  scrutinee: &ExprAST,
  arms     : &ExprAST,
  oracle   : &dyn TypeOracle,
) -> Result<CompiledMatch, CompileError> {
  let cases = decode_arms(arms)?;
  let mut binder = Binder::new(oracle);
  let input = binder.input_temp().clone();

  let mut partial_arms = Vec::with_capacity(cases.len());
  for (index, case) in cases.iter().enumerate() {
    binder.begin_arm();
    let (pattern, bindings) = binder.bind_pattern(case.pattern, &input, &Bindings::new())?;
    let result = binder.substitute_result(case.result, &bindings)?;
    partial_arms.push(PartialArm::new(
      index,
      pattern,
      bindings,
      result,
      case.location.clone(),
    ));
  }

  finish(binder, scrutinee, partial_arms, Vec::new())
}

/// The brute-force oracle: same inputs, same semantics, one `if`/`else` chain per arm and no
/// sharing between arms.
pub fn compile_match_reference(
  scrutinee: &ExprAST,
  arms     : &ExprAST,
  oracle   : &dyn TypeOracle,
) -> Result<CompiledMatch, CompileError> {
  let cases = decode_arms(arms)?;
  let mut binder = Binder::new(oracle);
  compile_reference(&mut binder, scrutinee, &cases, Vec::new())
}

/// Compiles the boolean form: the result is whether the scrutinee matches `pattern`, and on
/// success the pattern's variables are introduced into the caller's scope.
pub fn compile_is_match(
  scrutinee: &ExprAST,
  pattern  : &ExprAST,
  oracle   : &dyn TypeOracle,
) -> Result<CompiledMatch, CompileError> {
  let location = pattern.location.clone();
  let mut binder = Binder::new(oracle);
  let input = binder.input_temp().clone();

  binder.begin_arm();
  let (bound, bindings) = binder.bind_pattern(pattern, &input, &Bindings::new())?;

  let exports: Vec<IString> = bindings.names().cloned().collect();
  let mut items: Vec<ExprAST> = bindings.iter()
      .map(|(name, temp)| {
        ExprAST::new(
          location.clone(),
          ExprASTKind::Assign {
            target: name.clone(),
            value : Box::new(ExprAST::new(location.clone(), ExprASTKind::Identifier(temp.clone()))),
          },
        )
      })
      .collect();
  items.push(ExprAST::bool(location.clone(), true));

  let matched_arm = PartialArm::new(
    0,
    bound,
    bindings,
    ExprAST::block(location.clone(), items),
    location.clone(),
  );
  let fallback_arm = PartialArm::new(
    1,
    BoundPattern::true_at(location.clone()),
    Bindings::new(),
    ExprAST::bool(location.clone(), false),
    location,
  );

  let mut compiled = finish(binder, scrutinee, vec![matched_arm, fallback_arm], exports)?;
  // The fallback arm is synthetic; its reachability is not the caller's concern.
  compiled.warnings.clear();
  Ok(compiled)
}

/// Compiles the unary form: the whole expression evaluates to `value`, binding the pattern's
/// variables into the caller's scope, or raises a match failure.
pub fn compile_assignment(
  pattern: &ExprAST,
  value  : &ExprAST,
  oracle : &dyn TypeOracle,
) -> Result<CompiledMatch, CompileError> {
  let location = pattern.location.clone();
  let mut binder = Binder::new(oracle);
  let input = binder.input_temp().clone();

  binder.begin_arm();
  let (bound, bindings) = binder.bind_pattern(pattern, &input, &Bindings::new())?;

  let exports: Vec<IString> = bindings.names().cloned().collect();
  let mut items: Vec<ExprAST> = bindings.iter()
      .map(|(name, temp)| {
        ExprAST::new(
          location.clone(),
          ExprASTKind::Assign {
            target: name.clone(),
            value : Box::new(ExprAST::new(location.clone(), ExprASTKind::Identifier(temp.clone()))),
          },
        )
      })
      .collect();
  items.push(ExprAST::new(location.clone(), ExprASTKind::Identifier(input)));

  let arm = PartialArm::new(
    0,
    bound,
    bindings,
    ExprAST::block(location.clone(), items),
    location,
  );

  finish(binder, value, vec![arm], exports)
}

/// The shared back half of every entry point: automaton, minimization, emission.
fn finish(
  mut binder: Binder,
  scrutinee : &ExprAST,
  arms      : Vec<PartialArm>,
  exports   : Vec<IString>,
) -> Result<CompiledMatch, CompileError> {
  let (automaton, warnings) = Automaton::build(arms, binder.oracle());
  debug!(3, "decision automaton:\n{}", automaton.dump());

  let mut minimized = minimize(&automaton);
  debug!(3, "minimized automaton:\n{}", minimized.dump());

  Ok(emit(&mut minimized, &mut binder, scrutinee, exports, warnings))
}

fn decode_arms<'a>(arms: &'a ExprAST) -> Result<Vec<MatchCase<'a>>, CompileError> {
  match &arms.kind {
    ExprASTKind::Block(items) => items.iter().map(decode_case).collect(),
    ExprASTKind::Arm { .. } => Ok(vec![decode_case(arms)?]),
    _ => Err(CompileError::UnrecognizedBlock { location: arms.location.clone() }),
  }
}

fn decode_case(item: &ExprAST) -> Result<MatchCase<'_>, CompileError> {
  match &item.kind {
    ExprASTKind::Arm { pattern, result } => Ok(MatchCase {
      location: item.location.clone(),
      pattern,
      result,
    }),
    _ => Err(CompileError::UnrecognizedCase { location: item.location.clone() }),
  }
}
