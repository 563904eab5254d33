/*!

The reference matcher: each arm compiles to a straight-line `if`/`else` chain with no
deduplication. Semantically equivalent to the automaton path and much easier to believe correct,
which is exactly what makes it the differential-test oracle. Disjunctions backtrack through a
per-branch failure label; everything else threads one failure label, the next arm, through the
pattern.

*/

use matchc_abs::IString;

use crate::{
  api::{ast::ExprAST, error::CompileError},
  core::{
    binder::Binder,
    binding::Bindings,
    emit::{fetch_statement, lower_result, test_condition, CompiledMatch, ResultContext, Statement},
    pattern::{BoundPattern, BoundPatternKind},
  },
};

/// One decoded `pattern => result` case, with the location of the whole arm.
pub(crate) struct MatchCase<'a> {
  pub location: crate::api::ast::Location,
  pub pattern : &'a ExprAST,
  pub result  : &'a ExprAST,
}

/// Compiles arms one after another, each protected by jumps to the next arm's label.
pub(crate) fn compile_reference(
  binder   : &mut Binder,
  scrutinee: &ExprAST,
  cases    : &[MatchCase],
  exports  : Vec<IString>,
) -> Result<CompiledMatch, CompileError> {
  let input_var = binder.input_temp().clone();
  let result_var = binder.gensym("result");
  let completion_label = binder.gensym("done");

  // Bind every arm before emitting anything, so assertions all precede the first statement.
  let mut bound: Vec<(BoundPattern, ExprAST, crate::api::ast::Location)> = Vec::new();
  for case in cases {
    binder.begin_arm();
    let (pattern, bindings) = binder.bind_pattern(case.pattern, &input_var, &Bindings::new())?;
    let result = binder.substitute_result(case.result, &bindings)?;
    bound.push((pattern, result, case.location.clone()));
  }

  let mut statements: Vec<Statement> = Vec::new();
  for record in binder.assertions().to_vec() {
    statements.push(Statement::TypeAssertion {
      expression: record.expression,
      expected  : record.expected,
      location  : record.location,
    });
  }
  statements.push(Statement::Assign {
    target: input_var.clone(),
    value : scrutinee.clone(),
  });

  let context = ResultContext {
    result_var      : &result_var,
    completion_label: &completion_label,
    input_temp      : &input_var,
  };

  let mut next_arm_label: Option<IString> = None;
  for (pattern, result, location) in &bound {
    if let Some(label) = next_arm_label.take() {
      statements.push(Statement::Label(label));
    }
    let fail_label = binder.gensym("arm");

    emit_pattern(binder, &mut statements, pattern, &fail_label);

    statements.push(Statement::SourceNote(location.clone()));
    lower_result(&mut statements, result, Some(&fail_label), &context);

    next_arm_label = Some(fail_label);
  }

  if let Some(label) = next_arm_label {
    statements.push(Statement::Label(label));
  }
  statements.push(Statement::FailMatch { input: input_var.clone() });
  statements.push(Statement::Label(completion_label.clone()));

  Ok(CompiledMatch {
    statements,
    input_var,
    result_var,
    completion_label,
    exports,
    warnings: Vec::new(),
  })
}

/// Emits the checks of one bound pattern; any failed test jumps to `fail`.
fn emit_pattern(binder: &mut Binder, statements: &mut Vec<Statement>, pattern: &BoundPattern, fail: &IString) {
  match &pattern.kind {
    BoundPatternKind::True => {}

    BoundPatternKind::False => {
      statements.push(Statement::Jump(fail.clone()));
    }

    BoundPatternKind::EqualValue { .. }
    | BoundPatternKind::TypeTest { .. }
    | BoundPatternKind::Relational { .. }
    | BoundPatternKind::WhereTest { .. } => {
      statements.push(Statement::JumpUnless {
        condition: test_condition(pattern),
        target   : fail.clone(),
      });
    }

    BoundPatternKind::FetchField { .. }
    | BoundPatternKind::FetchIndex { .. }
    | BoundPatternKind::FetchRange { .. }
    | BoundPatternKind::FetchLength { .. }
    | BoundPatternKind::FetchExpression { .. } => {
      statements.push(fetch_statement(pattern));
    }

    BoundPatternKind::And(subpatterns) => {
      for subpattern in subpatterns {
        emit_pattern(binder, statements, subpattern, fail);
      }
    }

    BoundPatternKind::Or(subpatterns) => {
      let matched = binder.gensym("or");
      for (i, branch) in subpatterns.iter().enumerate() {
        if i + 1 == subpatterns.len() {
          // The last branch fails to the caller's failure label.
          emit_pattern(binder, statements, branch, fail);
        } else {
          let next_branch = binder.gensym("or");
          emit_pattern(binder, statements, branch, &next_branch);
          statements.push(Statement::Jump(matched.clone()));
          statements.push(Statement::Label(next_branch));
        }
      }
      statements.push(Statement::Label(matched));
    }
  }
}
