/*!

Code emission over the minimized automaton.

The automaton is laid out depth-first as a linear statement list. Labels are emitted only where
fall-through is impossible: shared nodes, false successors of tests, and `match_fail`
continuations. A fetch node's successor follows it directly when it can; a test jumps to its
false successor and falls through to its true successor; success nodes assign the arm's
substituted result to the result variable and jump to the completion label.

The arm result is treated as a small statement list, not a single expression, so the early-exit
markers `match_fail` and `match_return` can be lowered to jumps while the surrounding statements
emit normally.

*/

use matchc_abs::IString;

use crate::{
  api::{
    ast::{ExprAST, ExprASTKind, Location, LiteralValue, RelationalOp},
    error::Warning,
    oracle::TypeHandle,
  },
  core::{
    automaton::{Action, MinNodeIndex, MinimizedAutomaton, NodeAttribute},
    binder::Binder,
    format::{impl_display_debug_for_formattable, FormatStyle, Formattable},
    pattern::{BoundPattern, BoundPatternKind},
  },
};

/// One emitted host statement.
#[derive(Clone, PartialEq, Eq)]
pub enum Statement {
  Assign { target: IString, value: ExprAST },
  Label(IString),
  Jump(IString),
  /// `if not condition: goto target`.
  JumpUnless { condition: ExprAST, target: IString },
  /// Marks the source position of the arm whose result follows.
  SourceNote(Location),
  /// Asserts at run time that `expression` still resolves to the type it named at compile time.
  TypeAssertion {
    expression: ExprAST,
    expected  : TypeHandle,
    location  : Location,
  },
  /// Raise the match failure carrying the scrutinee held in `input`.
  FailMatch { input: IString },
  /// Evaluate for effect, discarding the value.
  Eval(ExprAST),
}

impl Formattable for Statement {
  fn repr(&self, out: &mut dyn std::fmt::Write, _style: FormatStyle) -> std::fmt::Result {
    match self {
      Statement::Assign { target, value } => write!(out, "{} := {}", target, value),
      Statement::Label(label)             => write!(out, "{}:", label),
      Statement::Jump(label)              => write!(out, "goto {}", label),
      Statement::JumpUnless { condition, target } => write!(out, "unless {} goto {}", condition, target),
      Statement::SourceNote(location)     => write!(out, "# at {}", location),
      Statement::TypeAssertion { expression, expected, .. } => {
        write!(out, "assert {} still names {:?}", expression, expected)
      }
      Statement::FailMatch { input }      => write!(out, "throw MatchFailure({})", input),
      Statement::Eval(value)              => write!(out, "{}", value),
    }
  }
}

impl_display_debug_for_formattable!(Statement);

/// The compiled artifact: a statement list that leaves the chosen arm's value in `result_var`.
#[derive(Clone, Debug)]
pub struct CompiledMatch {
  pub statements      : Vec<Statement>,
  pub input_var       : IString,
  pub result_var      : IString,
  pub completion_label: IString,
  /// Names the interpreter copies into the caller's scope after a successful run.
  pub exports         : Vec<IString>,
  pub warnings        : Vec<Warning>,
}

impl CompiledMatch {
  /// One statement per line.
  pub fn dump(&self) -> String {
    let mut out = String::new();
    for statement in &self.statements {
      out.push_str(&statement.to_string());
      out.push('\n');
    }
    out
  }
}

/// Everything result lowering needs to know about its surroundings.
pub(crate) struct ResultContext<'a> {
  pub result_var      : &'a IString,
  pub completion_label: &'a IString,
  pub input_temp      : &'a IString,
}

/// Lays out the minimized automaton. `exports` and `warnings` ride through to the artifact.
pub fn emit(
  minimized: &mut MinimizedAutomaton,
  binder   : &mut Binder,
  scrutinee: &ExprAST,
  exports  : Vec<IString>,
  warnings : Vec<Warning>,
) -> CompiledMatch {
  let input_var = binder.input_temp().clone();
  let result_var = binder.gensym("result");
  let completion_label = binder.gensym("done");

  let mut statements: Vec<Statement> = Vec::new();

  // Runtime assertions accumulated by the binder come first.
  for record in binder.assertions().to_vec() {
    statements.push(Statement::TypeAssertion {
      expression: record.expression,
      expected  : record.expected,
      location  : record.location,
    });
  }

  // The scrutinee is evaluated exactly once.
  statements.push(Statement::Assign {
    target: input_var.clone(),
    value : scrutinee.clone(),
  });

  // Assign labels up front to every node that can be a jump target: shared nodes, false
  // successors of tests, and `match_fail` continuations.
  let mut labels: Vec<Option<IString>> = vec![None; minimized.nodes.len()];
  let mut needs_label = vec![false; minimized.nodes.len()];
  for (index, node) in minimized.nodes.iter().enumerate() {
    if node.attributes.contains(NodeAttribute::Labeled) {
      needs_label[index] = true;
    }
    match &node.action {
      Action::Test(_) => needs_label[node.successors[1]] = true,
      Action::Success(_) => {
        if let Some(&continuation) = node.successors.first() {
          needs_label[continuation] = true;
        }
      }
      _ => {}
    }
  }
  for (index, needed) in needs_label.iter().enumerate() {
    if *needed {
      labels[index] = Some(binder.gensym("label"));
    }
  }

  let context = ResultContext {
    result_var      : &result_var,
    completion_label: &completion_label,
    input_temp      : &input_var,
  };

  let mut pending: Vec<MinNodeIndex> = Vec::new();
  let mut current = Some(minimized.root);

  while let Some(index) = current.take() {
    if minimized.nodes[index].attributes.contains(NodeAttribute::Placed) {
      // Fall-through into a node that already exists in the layout.
      let label = labels[index].clone().expect("fall-through into an unlabeled placed node");
      statements.push(Statement::Jump(label));
      current = pop_pending(&mut pending, minimized);
      continue;
    }
    minimized.nodes[index].attributes |= NodeAttribute::Placed;

    if let Some(label) = &labels[index] {
      statements.push(Statement::Label(label.clone()));
    }

    let action = minimized.nodes[index].action.clone();
    let successors = minimized.nodes[index].successors.clone();

    match action {
      Action::Fail => {
        statements.push(Statement::FailMatch { input: input_var.clone() });
        current = pop_pending(&mut pending, minimized);
      }

      Action::Success(arm) => {
        statements.push(Statement::SourceNote(arm.location.clone()));
        let fail_target = successors.first().map(|&s| {
          labels[s].clone().expect("match_fail continuation without a label")
        });
        lower_result(&mut statements, &arm.result, fail_target.as_ref(), &context);
        if let Some(&continuation) = successors.first() {
          pending.push(continuation);
        }
        current = pop_pending(&mut pending, minimized);
      }

      Action::Fetch(fetch) => {
        statements.push(fetch_statement(&fetch));
        current = Some(successors[0]);
      }

      Action::Test(test) => {
        let false_successor = successors[1];
        let target = labels[false_successor].clone().expect("false successor without a label");
        statements.push(Statement::JumpUnless {
          condition: test_condition(&test),
          target,
        });
        pending.push(false_successor);
        current = Some(successors[0]);
      }
    }
  }

  statements.push(Statement::Label(completion_label.clone()));

  CompiledMatch {
    statements,
    input_var,
    result_var,
    completion_label,
    exports,
    warnings,
  }
}

fn pop_pending(pending: &mut Vec<MinNodeIndex>, minimized: &MinimizedAutomaton) -> Option<MinNodeIndex> {
  while let Some(index) = pending.pop() {
    if !minimized.nodes[index].attributes.contains(NodeAttribute::Placed) {
      return Some(index);
    }
  }
  None
}

/// The assignment a fetch action performs.
pub(crate) fn fetch_statement(fetch: &BoundPattern) -> Statement {
  let location = fetch.location.clone();
  let identifier = |name: &IString| {
    ExprAST::new(location.clone(), ExprASTKind::Identifier(name.clone()))
  };

  match &fetch.kind {
    BoundPatternKind::FetchField { input, field, temp, .. } => Statement::Assign {
      target: temp.clone(),
      value : ExprAST::new(
        location.clone(),
        ExprASTKind::Field { base: Box::new(identifier(input)), name: field.clone() },
      ),
    },
    BoundPatternKind::FetchIndex { input, index, temp, .. } => Statement::Assign {
      target: temp.clone(),
      value : ExprAST::new(
        location.clone(),
        ExprASTKind::Index { base: Box::new(identifier(input)), index: *index },
      ),
    },
    BoundPatternKind::FetchRange { input, first, from_end, temp, .. } => Statement::Assign {
      target: temp.clone(),
      value : ExprAST::new(
        location.clone(),
        ExprASTKind::SubSequence {
          base    : Box::new(identifier(input)),
          first   : *first,
          from_end: *from_end,
        },
      ),
    },
    BoundPatternKind::FetchLength { input, temp } => Statement::Assign {
      target: temp.clone(),
      value : ExprAST::new(location.clone(), ExprASTKind::Length(Box::new(identifier(input)))),
    },
    BoundPatternKind::FetchExpression { value, temp, .. } => Statement::Assign {
      target: temp.clone(),
      value : value.as_ref().clone(),
    },
    _ => unreachable!("not a fetch: {}", fetch),
  }
}

/// The boolean expression a test action evaluates.
pub(crate) fn test_condition(test: &BoundPattern) -> ExprAST {
  let location = test.location.clone();
  let identifier = |name: &IString| {
    ExprAST::new(location.clone(), ExprASTKind::Identifier(name.clone()))
  };

  match &test.kind {
    BoundPatternKind::EqualValue { input, value, .. } => ExprAST::new(
      location.clone(),
      ExprASTKind::Compare {
        op : RelationalOp::Equal,
        lhs: Box::new(identifier(input)),
        rhs: value.clone(),
      },
    ),
    BoundPatternKind::TypeTest { input, ty } => ExprAST::new(
      location.clone(),
      ExprASTKind::IsType { subject: Box::new(identifier(input)), ty: *ty },
    ),
    BoundPatternKind::Relational { input, op, constant } => ExprAST::new(
      location.clone(),
      ExprASTKind::Compare {
        op : *op,
        lhs: Box::new(identifier(input)),
        rhs: Box::new(ExprAST::new(
          location.clone(),
          ExprASTKind::Literal(LiteralValue::Int(*constant)),
        )),
      },
    ),
    BoundPatternKind::WhereTest { temp, inverted } => {
      if *inverted {
        ExprAST::new(location.clone(), ExprASTKind::Not(Box::new(identifier(temp))))
      } else {
        identifier(temp)
      }
    }
    _ => unreachable!("not a test: {}", test),
  }
}

/// Lowers an arm result in tail position: the value lands in the result variable and control
/// transfers to the completion label. `fail_target` is where `match_fail` resumes: the
/// continuation that tries the remaining arms.
pub(crate) fn lower_result(
  statements : &mut Vec<Statement>,
  expr       : &ExprAST,
  fail_target: Option<&IString>,
  context    : &ResultContext,
) {
  match &expr.kind {
    ExprASTKind::Block(items) => {
      match items.split_last() {
        Some((last, init)) => {
          for item in init {
            lower_statement(statements, item, fail_target, context);
          }
          lower_result(statements, last, fail_target, context);
        }
        None => {
          statements.push(Statement::Assign {
            target: context.result_var.clone(),
            value : ExprAST::new(expr.location.clone(), ExprASTKind::Literal(LiteralValue::Nothing)),
          });
          statements.push(Statement::Jump(context.completion_label.clone()));
        }
      }
    }

    ExprASTKind::MatchFail => {
      lower_match_fail(statements, fail_target, context);
    }

    ExprASTKind::MatchReturn(value) => {
      statements.push(Statement::Assign {
        target: context.result_var.clone(),
        value : value.as_ref().clone(),
      });
      statements.push(Statement::Jump(context.completion_label.clone()));
    }

    ExprASTKind::Assign { target, value } => {
      statements.push(Statement::Assign {
        target: target.clone(),
        value : value.as_ref().clone(),
      });
      statements.push(Statement::Assign {
        target: context.result_var.clone(),
        value : ExprAST::new(expr.location.clone(), ExprASTKind::Identifier(target.clone())),
      });
      statements.push(Statement::Jump(context.completion_label.clone()));
    }

    _ => {
      statements.push(Statement::Assign {
        target: context.result_var.clone(),
        value : expr.clone(),
      });
      statements.push(Statement::Jump(context.completion_label.clone()));
    }
  }
}

/// Lowers a non-tail statement of an arm result.
fn lower_statement(
  statements : &mut Vec<Statement>,
  expr       : &ExprAST,
  fail_target: Option<&IString>,
  context    : &ResultContext,
) {
  match &expr.kind {
    ExprASTKind::Assign { target, value } => {
      statements.push(Statement::Assign {
        target: target.clone(),
        value : value.as_ref().clone(),
      });
    }

    ExprASTKind::MatchFail => {
      lower_match_fail(statements, fail_target, context);
    }

    ExprASTKind::MatchReturn(value) => {
      statements.push(Statement::Assign {
        target: context.result_var.clone(),
        value : value.as_ref().clone(),
      });
      statements.push(Statement::Jump(context.completion_label.clone()));
    }

    ExprASTKind::Block(items) => {
      for item in items {
        lower_statement(statements, item, fail_target, context);
      }
    }

    _ => {
      statements.push(Statement::Eval(expr.clone()));
    }
  }
}

fn lower_match_fail(statements: &mut Vec<Statement>, fail_target: Option<&IString>, context: &ResultContext) {
  match fail_target {
    Some(label) => statements.push(Statement::Jump(label.clone())),
    // No remaining arms: failing out of the last arm is a match failure.
    None => statements.push(Statement::FailMatch { input: context.input_temp.clone() }),
  }
}
