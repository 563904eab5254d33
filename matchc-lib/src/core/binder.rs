/*!

The binder lowers surface patterns into bound patterns. One `Binder` lives per compilation call
and owns everything the lowering shares: the gensym counter, the fetch→temporary intern cache
(structurally equal fetches allocate the same temporary, which is what lets the automaton share
them across arms), the temporary→type table, the runtime type assertions accumulated while
resolving type names, and the set of pattern variables seen anywhere in the current arm.

Pattern-variable references inside interpolations, guards, and arm results are rewritten to their
temporaries here, so user code cannot inadvertently mutate a pattern variable.

*/

use matchc_abs::{HashMap, HashSet, IString};

use crate::{
  api::{
    ast::{CallArgAST, ExprAST, ExprASTKind, Location, RelationalOp},
    error::CompileError,
    oracle::{TypeHandle, TypeOracle},
  },
  core::{
    binding::Bindings,
    pattern::{BoundPattern, BoundPatternKind, FetchKey},
  },
};

/// A record of "this type expression resolved to this type at compile time"; the emitter turns
/// each into a runtime assertion prepended to the compiled match.
#[derive(Clone, Debug)]
pub struct TypeAssertionRecord {
  pub expression: ExprAST,
  pub expected  : TypeHandle,
  pub location  : Location,
}

pub struct Binder<'o> {
  oracle        : &'o dyn TypeOracle,
  gensym_counter: u32,
  fetch_temps   : HashMap<FetchKey, IString>,
  temp_types    : HashMap<IString, TypeHandle>,
  assertions    : Vec<TypeAssertionRecord>,
  input_temp    : IString,
  /// Every pattern variable seen anywhere in the current arm, including ones later dropped by a
  /// disjunction merge. Referencing a seen-but-unbound variable is a compile error.
  seen_variables: HashSet<IString>,
}

impl<'o> Binder<'o> {
  pub fn new(oracle: &'o dyn TypeOracle) -> Self {
    let mut binder = Binder {
      oracle,
      gensym_counter: 0,
      fetch_temps   : HashMap::new(),
      temp_types    : HashMap::new(),
      assertions    : Vec::new(),
      input_temp    : IString::from(""),
      seen_variables: HashSet::new(),
    };
    binder.input_temp = binder.gensym("input");
    binder
  }

  pub fn oracle(&self) -> &'o dyn TypeOracle {
    self.oracle
  }

  pub fn input_temp(&self) -> &IString {
    &self.input_temp
  }

  pub fn assertions(&self) -> &[TypeAssertionRecord] {
    &self.assertions
  }

  /// Resets per-arm state. Call before binding each arm's pattern.
  pub fn begin_arm(&mut self) {
    self.seen_variables.clear();
  }

  pub fn gensym(&mut self, prefix: &str) -> IString {
    let name = format!("{}#{}", prefix, self.gensym_counter);
    self.gensym_counter += 1;
    IString::from(name.as_str())
  }

  /// The statically known type of a temporary; `Any` when nothing is known.
  pub fn temp_type(&self, temp: &IString) -> TypeHandle {
    self.temp_types.get(temp).copied().unwrap_or(TypeHandle::Any)
  }

  // region Pattern lowering

  /// Lowers one surface pattern against `input`, threading `bindings` through. Returns the bound
  /// pattern together with the bindings in effect after it matches.
  pub fn bind_pattern(
    &mut self,
    ast     : &ExprAST,
    input   : &IString,
    bindings: &Bindings,
  ) -> Result<(BoundPattern, Bindings), CompileError> {
    let location = ast.location.clone();

    match &ast.kind {
      ExprASTKind::Identifier(name) if name.as_ref() == "_" => {
        Ok((BoundPattern::true_at(location), bindings.clone()))
      }

      ExprASTKind::Identifier(name) => {
        match bindings.get(name) {
          // A repeated variable is an equality test against its first occurrence.
          Some(temp) => {
            let captures = Bindings::new().bind(name.clone(), temp.clone());
            let value = ExprAST::new(location.clone(), ExprASTKind::Identifier(temp.clone()));
            let pattern = BoundPattern::new(
              location,
              BoundPatternKind::EqualValue {
                input: input.clone(),
                value: Box::new(value),
                captures,
              },
            );
            Ok((pattern, bindings.clone()))
          }
          None => {
            self.seen_variables.insert(name.clone());
            Ok((
              BoundPattern::true_at(location),
              bindings.bind(name.clone(), input.clone()),
            ))
          }
        }
      }

      ExprASTKind::Literal(_) | ExprASTKind::Quoted(_) => {
        let pattern = BoundPattern::new(
          location,
          BoundPatternKind::EqualValue {
            input   : input.clone(),
            value   : Box::new(ast.clone()),
            captures: Bindings::new(),
          },
        );
        Ok((pattern, bindings.clone()))
      }

      ExprASTKind::Interpolation(inner) => {
        let mut captures = Bindings::new();
        let value = self.substitute_expr(inner, bindings, &mut captures)?;
        let pattern = BoundPattern::new(
          location,
          BoundPatternKind::EqualValue {
            input: input.clone(),
            value: Box::new(value),
            captures,
          },
        );
        Ok((pattern, bindings.clone()))
      }

      ExprASTKind::TypeAssert { subject, ty } => {
        let (type_expr, guard) = split_type_guard(ty);
        let handle = self.resolve_type(type_expr)?;

        let mut parts = vec![self.make_type_test(location.clone(), input, handle)];
        let mut current = bindings.clone();

        if let Some(subject) = subject {
          let (sub_pattern, sub_bindings) = self.bind_pattern(subject, input, &current)?;
          parts.push(sub_pattern);
          current = sub_bindings;
        }
        if let Some(guard) = guard {
          parts.push(self.shred_where(guard, false, input, &current)?);
        }

        Ok((BoundPattern::and(location, parts), current))
      }

      ExprASTKind::Call { head, args } => self.bind_constructor(location, head, args, input, bindings),

      ExprASTKind::Tuple(items) => {
        self.bind_sequence_like(location, TypeHandle::Tuple, items, input, bindings)
      }

      ExprASTKind::Sequence(items) => {
        self.bind_sequence_like(location, TypeHandle::Sequence, items, input, bindings)
      }

      ExprASTKind::And(left, right) => {
        let (left_pattern, left_bindings) = self.bind_pattern(left, input, bindings)?;
        let (right_pattern, right_bindings) = self.bind_pattern(right, input, &left_bindings)?;
        Ok((
          BoundPattern::and(location, vec![left_pattern, right_pattern]),
          right_bindings,
        ))
      }

      ExprASTKind::Or(left, right) => self.bind_disjunction(location, left, right, input, bindings),

      ExprASTKind::Where { subject, guard } => {
        let (pattern, new_bindings) = self.bind_pattern(subject, input, bindings)?;
        let shredded = self.shred_where(guard, false, input, &new_bindings)?;
        Ok((
          BoundPattern::and(location, vec![pattern, shredded]),
          new_bindings,
        ))
      }

      _ => Err(CompileError::UnrecognizedPattern { location }),
    }
  }

  fn bind_constructor(
    &mut self,
    location: Location,
    head    : &ExprAST,
    args    : &[CallArgAST],
    input   : &IString,
    bindings: &Bindings,
  ) -> Result<(BoundPattern, Bindings), CompileError> {
    let handle = self.resolve_type(head)?;
    let type_name = self.oracle.type_name(handle);
    let field_names = self.oracle.field_names(handle);

    let has_positional = args.iter().any(|a| matches!(a, CallArgAST::Positional(_)));
    let has_named = args.iter().any(|a| matches!(a, CallArgAST::Named { .. }));
    if has_positional && has_named {
      return Err(CompileError::MixedFieldStyle { location });
    }

    let mut parts = vec![self.make_type_test(location.clone(), input, handle)];
    let mut current = bindings.clone();

    if has_named {
      let mut seen_fields: HashSet<IString> = HashSet::new();
      for arg in args {
        let CallArgAST::Named { name, value } = arg else { unreachable!() };
        if !field_names.contains(name) {
          return Err(CompileError::UnknownField {
            location: value.location.clone(),
            name    : type_name,
            field   : name.clone(),
          });
        }
        if !seen_fields.insert(name.clone()) {
          return Err(CompileError::DuplicateNamedField {
            location: value.location.clone(),
            name    : name.clone(),
          });
        }
        let (fetch, temp) = self.fetch_field(value.location.clone(), input, name, handle);
        parts.push(fetch);
        let (sub_pattern, sub_bindings) = self.bind_pattern(value, &temp, &current)?;
        parts.push(sub_pattern);
        current = sub_bindings;
      }
    } else {
      if args.len() != field_names.len() {
        return Err(CompileError::WrongFieldCount {
          location,
          name    : type_name,
          expected: field_names.len(),
          found   : args.len(),
        });
      }
      for (field, arg) in field_names.iter().zip(args) {
        let CallArgAST::Positional(value) = arg else { unreachable!() };
        let (fetch, temp) = self.fetch_field(value.location.clone(), input, field, handle);
        parts.push(fetch);
        let (sub_pattern, sub_bindings) = self.bind_pattern(value, &temp, &current)?;
        parts.push(sub_pattern);
        current = sub_bindings;
      }
    }

    Ok((BoundPattern::and(location, parts), current))
  }

  fn bind_sequence_like(
    &mut self,
    location: Location,
    kind_ty : TypeHandle,
    items   : &[ExprAST],
    input   : &IString,
    bindings: &Bindings,
  ) -> Result<(BoundPattern, Bindings), CompileError> {
    let splat_positions: Vec<usize> = items.iter()
        .enumerate()
        .filter(|(_, item)| matches!(item.kind, ExprASTKind::Splat(_)))
        .map(|(i, _)| i)
        .collect();
    if splat_positions.len() > 1 {
      return Err(CompileError::MultipleSplats { location });
    }
    let splat = splat_positions.first().copied();
    let count = items.len();

    let mut parts = vec![self.make_type_test(location.clone(), input, kind_ty)];

    let (length_fetch, length_temp) = self.fetch_length(location.clone(), input);
    parts.push(length_fetch);

    let (op, constant) = match splat {
      Some(_) => (RelationalOp::GreaterEqual, (count - 1) as i64),
      None    => (RelationalOp::Equal, count as i64),
    };
    parts.push(BoundPattern::new(
      location.clone(),
      BoundPatternKind::Relational { input: length_temp, op, constant },
    ));

    let mut current = bindings.clone();
    for (i, item) in items.iter().enumerate() {
      let item_location = item.location.clone();
      let (fetch, temp, sub_ast) = match splat {
        Some(s) if i == s => {
          let ExprASTKind::Splat(inner) = &item.kind else { unreachable!() };
          let (fetch, temp) = self.fetch_range(item_location, input, s, count - s - 1, kind_ty);
          (fetch, temp, inner.as_ref())
        }
        Some(s) if i > s => {
          // Elements after the splat are addressed from the end.
          let index = i as i64 - count as i64;
          let (fetch, temp) = self.fetch_index(item_location, input, index);
          (fetch, temp, item)
        }
        _ => {
          let (fetch, temp) = self.fetch_index(item_location, input, (i + 1) as i64);
          (fetch, temp, item)
        }
      };
      parts.push(fetch);
      let (sub_pattern, sub_bindings) = self.bind_pattern(sub_ast, &temp, &current)?;
      parts.push(sub_pattern);
      current = sub_bindings;
    }

    Ok((BoundPattern::and(location, parts), current))
  }

  fn bind_disjunction(
    &mut self,
    location: Location,
    left    : &ExprAST,
    right   : &ExprAST,
    input   : &IString,
    bindings: &Bindings,
  ) -> Result<(BoundPattern, Bindings), CompileError> {
    let (mut left_pattern, left_bindings) = self.bind_pattern(left, input, bindings)?;
    let (mut right_pattern, right_bindings) = self.bind_pattern(right, input, bindings)?;

    // Only variables bound on both sides survive the disjunction. Where the two sides chose
    // different temporaries, a fresh phi temporary is loaded by each branch. No attempt is made
    // to chain phis: two nested-disjunction phis still merge through a fresh one.
    let mut merged = bindings.clone();
    for name in left_bindings.common_names(&right_bindings) {
      let left_temp = left_bindings.get(&name).unwrap().clone();
      let right_temp = right_bindings.get(&name).unwrap().clone();

      if left_temp == right_temp {
        merged = merged.bind(name, left_temp);
        continue;
      }

      let phi = self.gensym("phi");
      left_pattern = BoundPattern::and(
        location.clone(),
        vec![left_pattern, self.phi_fetch(location.clone(), &name, &left_temp, &phi)],
      );
      right_pattern = BoundPattern::and(
        location.clone(),
        vec![right_pattern, self.phi_fetch(location.clone(), &name, &right_temp, &phi)],
      );
      merged = merged.bind(name, phi);
    }

    Ok((
      BoundPattern::or(location, vec![left_pattern, right_pattern]),
      merged,
    ))
  }

  /// One side of a phi merge: load the branch's temporary into the shared phi temporary. The
  /// explicit key stands in for the structural key in the intern cache, since the two sides
  /// produce the same temporary from different expressions.
  fn phi_fetch(&mut self, location: Location, name: &IString, source: &IString, phi: &IString) -> BoundPattern {
    self.fetch_temps.insert(FetchKey::Keyed(phi.clone()), phi.clone());
    self.temp_types.insert(phi.clone(), TypeHandle::Any);
    BoundPattern::new(
      location.clone(),
      BoundPatternKind::FetchExpression {
        input   : source.clone(),
        value   : Box::new(ExprAST::new(location, ExprASTKind::Identifier(source.clone()))),
        captures: Bindings::new().bind(name.clone(), source.clone()),
        key     : Some(phi.clone()),
        temp    : phi.clone(),
      },
    )
  }

  // endregion Pattern lowering

  // region Where-clause shredding

  /// Decomposes a guard into fetches and `WhereTest`s, pushing negation inward by De Morgan so
  /// the automaton can share subguard evaluations.
  pub fn shred_where(
    &mut self,
    guard   : &ExprAST,
    inverted: bool,
    input   : &IString,
    bindings: &Bindings,
  ) -> Result<BoundPattern, CompileError> {
    let location = guard.location.clone();
    match &guard.kind {
      ExprASTKind::Not(inner) => self.shred_where(inner, !inverted, input, bindings),

      ExprASTKind::And(left, right) => {
        let left = self.shred_where(left, inverted, input, bindings)?;
        let right = self.shred_where(right, inverted, input, bindings)?;
        if inverted {
          Ok(BoundPattern::or(location, vec![left, right]))
        } else {
          Ok(BoundPattern::and(location, vec![left, right]))
        }
      }

      ExprASTKind::Or(left, right) => {
        let left = self.shred_where(left, inverted, input, bindings)?;
        let right = self.shred_where(right, inverted, input, bindings)?;
        if inverted {
          Ok(BoundPattern::and(location, vec![left, right]))
        } else {
          Ok(BoundPattern::or(location, vec![left, right]))
        }
      }

      _ => {
        let mut captures = Bindings::new();
        let value = self.substitute_expr(guard, bindings, &mut captures)?;
        let key = FetchKey::Expression {
          input   : input.clone(),
          value   : Box::new(value.clone()),
          captures: captures.clone(),
        };
        let temp = self.temp_for(key, "where");
        let fetch = BoundPattern::new(
          location.clone(),
          BoundPatternKind::FetchExpression {
            input: input.clone(),
            value: Box::new(value),
            captures,
            key  : None,
            temp : temp.clone(),
          },
        );
        let test = BoundPattern::new(location.clone(), BoundPatternKind::WhereTest { temp, inverted });
        Ok(BoundPattern::and(location, vec![fetch, test]))
      }
    }
  }

  // endregion Where-clause shredding

  // region Substitution

  /// Rewrites pattern-variable references to their temporaries, collecting the captured
  /// bindings. A reference to a variable that was seen in this arm's pattern but is not bound on
  /// every path is a compile error. Quoted subtrees are opaque.
  pub fn substitute_expr(
    &self,
    expr    : &ExprAST,
    bindings: &Bindings,
    captures: &mut Bindings,
  ) -> Result<ExprAST, CompileError> {
    use ExprASTKind::*;

    let kind = match &expr.kind {
      Identifier(name) => {
        if let Some(temp) = bindings.get(name) {
          *captures = captures.bind(name.clone(), temp.clone());
          Identifier(temp.clone())
        } else if self.seen_variables.contains(name) {
          return Err(CompileError::UndefinedPatternVariable {
            location: expr.location.clone(),
            name    : name.clone(),
          });
        } else {
          Identifier(name.clone())
        }
      }

      Literal(_) | Quoted(_) | MatchFail => expr.kind.clone(),

      Interpolation(inner) => Interpolation(Box::new(self.substitute_expr(inner, bindings, captures)?)),
      Splat(inner)         => Splat(Box::new(self.substitute_expr(inner, bindings, captures)?)),
      Not(inner)           => Not(Box::new(self.substitute_expr(inner, bindings, captures)?)),
      Length(inner)        => Length(Box::new(self.substitute_expr(inner, bindings, captures)?)),
      MatchReturn(inner)   => MatchReturn(Box::new(self.substitute_expr(inner, bindings, captures)?)),

      Call { head, args } => {
        let head = Box::new(self.substitute_expr(head, bindings, captures)?);
        let args = args.iter()
            .map(|arg| {
              Ok(match arg {
                CallArgAST::Positional(value) => {
                  CallArgAST::Positional(self.substitute_expr(value, bindings, captures)?)
                }
                CallArgAST::Named { name, value } => CallArgAST::Named {
                  name : name.clone(),
                  value: self.substitute_expr(value, bindings, captures)?,
                },
              })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;
        Call { head, args }
      }

      Tuple(items)    => Tuple(self.substitute_all(items, bindings, captures)?),
      Sequence(items) => Sequence(self.substitute_all(items, bindings, captures)?),
      Block(items)    => Block(self.substitute_all(items, bindings, captures)?),

      And(a, b) => And(
        Box::new(self.substitute_expr(a, bindings, captures)?),
        Box::new(self.substitute_expr(b, bindings, captures)?),
      ),
      Or(a, b) => Or(
        Box::new(self.substitute_expr(a, bindings, captures)?),
        Box::new(self.substitute_expr(b, bindings, captures)?),
      ),

      Compare { op, lhs, rhs } => Compare {
        op : *op,
        lhs: Box::new(self.substitute_expr(lhs, bindings, captures)?),
        rhs: Box::new(self.substitute_expr(rhs, bindings, captures)?),
      },
      Arith { op, lhs, rhs } => Arith {
        op : *op,
        lhs: Box::new(self.substitute_expr(lhs, bindings, captures)?),
        rhs: Box::new(self.substitute_expr(rhs, bindings, captures)?),
      },

      Where { subject, guard } => Where {
        subject: Box::new(self.substitute_expr(subject, bindings, captures)?),
        guard  : Box::new(self.substitute_expr(guard, bindings, captures)?),
      },

      TypeAssert { subject, ty } => TypeAssert {
        subject: match subject {
          Some(s) => Some(Box::new(self.substitute_expr(s, bindings, captures)?)),
          None => None,
        },
        ty: ty.clone(),
      },

      Arm { pattern, result } => Arm {
        pattern: pattern.clone(),
        result : Box::new(self.substitute_expr(result, bindings, captures)?),
      },

      // Assignment targets stay as written; they are match-local names, not references.
      Assign { target, value } => Assign {
        target: target.clone(),
        value : Box::new(self.substitute_expr(value, bindings, captures)?),
      },

      Field { base, name } => Field {
        base: Box::new(self.substitute_expr(base, bindings, captures)?),
        name: name.clone(),
      },
      Index { base, index } => Index {
        base : Box::new(self.substitute_expr(base, bindings, captures)?),
        index: *index,
      },
      SubSequence { base, first, from_end } => SubSequence {
        base    : Box::new(self.substitute_expr(base, bindings, captures)?),
        first   : *first,
        from_end: *from_end,
      },
      IsType { subject, ty } => IsType {
        subject: Box::new(self.substitute_expr(subject, bindings, captures)?),
        ty     : *ty,
      },
    };

    Ok(ExprAST::new(expr.location.clone(), kind))
  }

  fn substitute_all(
    &self,
    items   : &[ExprAST],
    bindings: &Bindings,
    captures: &mut Bindings,
  ) -> Result<Vec<ExprAST>, CompileError> {
    items.iter()
        .map(|item| self.substitute_expr(item, bindings, captures))
        .collect()
  }

  /// Rewrites an arm's result expression, discarding captures.
  pub fn substitute_result(&self, result: &ExprAST, bindings: &Bindings) -> Result<ExprAST, CompileError> {
    let mut captures = Bindings::new();
    self.substitute_expr(result, bindings, &mut captures)
  }

  // endregion Substitution

  // region Fetch and test construction

  fn temp_for(&mut self, key: FetchKey, prefix: &str) -> IString {
    if let Some(temp) = self.fetch_temps.get(&key) {
      return temp.clone();
    }
    let temp = self.gensym(prefix);
    self.fetch_temps.insert(key, temp.clone());
    temp
  }

  /// A type test, unless the input's statically known type already guarantees membership.
  fn make_type_test(&mut self, location: Location, input: &IString, ty: TypeHandle) -> BoundPattern {
    if self.oracle.subtype(self.temp_type(input), ty) {
      return BoundPattern::true_at(location);
    }
    BoundPattern::new(location, BoundPatternKind::TypeTest { input: input.clone(), ty })
  }

  fn fetch_field(&mut self, location: Location, input: &IString, field: &IString, owner: TypeHandle) -> (BoundPattern, IString) {
    let field_ty = self.oracle.field_type(owner, field);
    let key = FetchKey::Field { input: input.clone(), field: field.clone() };
    let temp = self.temp_for(key, "t");
    self.temp_types.entry(temp.clone()).or_insert(field_ty);
    let pattern = BoundPattern::new(
      location,
      BoundPatternKind::FetchField {
        input: input.clone(),
        field: field.clone(),
        temp : temp.clone(),
        ty   : field_ty,
      },
    );
    (pattern, temp)
  }

  fn fetch_index(&mut self, location: Location, input: &IString, index: i64) -> (BoundPattern, IString) {
    let key = FetchKey::Index { input: input.clone(), index };
    let temp = self.temp_for(key, "t");
    self.temp_types.entry(temp.clone()).or_insert(TypeHandle::Any);
    let pattern = BoundPattern::new(
      location,
      BoundPatternKind::FetchIndex {
        input: input.clone(),
        index,
        temp : temp.clone(),
        ty   : TypeHandle::Any,
      },
    );
    (pattern, temp)
  }

  fn fetch_range(&mut self, location: Location, input: &IString, first: usize, from_end: usize, ty: TypeHandle) -> (BoundPattern, IString) {
    let key = FetchKey::Range { input: input.clone(), first, from_end };
    let temp = self.temp_for(key, "t");
    self.temp_types.entry(temp.clone()).or_insert(ty);
    let pattern = BoundPattern::new(
      location,
      BoundPatternKind::FetchRange {
        input: input.clone(),
        first,
        from_end,
        temp : temp.clone(),
        ty,
      },
    );
    (pattern, temp)
  }

  fn fetch_length(&mut self, location: Location, input: &IString) -> (BoundPattern, IString) {
    let key = FetchKey::Length { input: input.clone() };
    let temp = self.temp_for(key, "len");
    let pattern = BoundPattern::new(
      location,
      BoundPatternKind::FetchLength { input: input.clone(), temp: temp.clone() },
    );
    (pattern, temp)
  }

  /// Resolves a type expression through the oracle and records the runtime assertion that the
  /// same expression still names the same type at the match site.
  fn resolve_type(&mut self, expression: &ExprAST) -> Result<TypeHandle, CompileError> {
    let handle = self.oracle.resolve_type(expression)?;
    let already_recorded = self.assertions.iter()
        .any(|record| record.expression == *expression && record.expected == handle);
    if !already_recorded {
      self.assertions.push(TypeAssertionRecord {
        expression: expression.clone(),
        expected  : handle,
        location  : expression.location.clone(),
      });
    }
    Ok(handle)
  }

  // endregion Fetch and test construction
}

/// Splits `T where guard` written in type position into the type expression and the guard.
fn split_type_guard(ty: &ExprAST) -> (&ExprAST, Option<&ExprAST>) {
  match &ty.kind {
    ExprASTKind::Where { subject, guard } => (subject.as_ref(), Some(guard.as_ref())),
    _ => (ty, None),
  }
}
