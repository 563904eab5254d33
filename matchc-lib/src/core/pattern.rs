/*!

The bound-pattern algebra. The binder lowers surface patterns into this tagged tree, which
distinguishes *fetches* (pure projections from an input temporary into a fresh temporary) from
*tests* (boolean predicates with a true and a false continuation). `And`/`Or` combine them;
`True`/`False` are the results of simplification.

Equality and hashing ignore source locations (the `location` field exists for diagnostics only).
Two fetches compare equal when their kind, input temporary, and structural key agree; that
equality is what drives temporary reuse across arms.

*/

use std::hash::{Hash, Hasher};

use matchc_abs::{join_iter, IString};

use crate::{
  api::{
    ast::{ExprAST, Location, RelationalOp},
    oracle::TypeHandle,
  },
  core::{
    binding::Bindings,
    format::{impl_display_debug_for_formattable, FormatStyle, Formattable},
  },
};

#[derive(Clone)]
pub struct BoundPattern {
  pub location: Location,
  pub kind    : BoundPatternKind,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum BoundPatternKind {
  /// Always matches; no runtime work.
  True,
  /// Never matches; a simplification result.
  False,

  // region Tests
  /// The input equals a constant or substituted host expression.
  EqualValue {
    input   : IString,
    value   : Box<ExprAST>,
    captures: Bindings,
  },
  /// The input is a member of a resolved type.
  TypeTest {
    input: IString,
    ty   : TypeHandle,
  },
  /// Numeric comparison of a temporary against an integer constant (length checks).
  Relational {
    input   : IString,
    op      : RelationalOp,
    constant: i64,
  },
  /// Boolean check against a precomputed guard result.
  WhereTest {
    temp    : IString,
    inverted: bool,
  },
  // endregion Tests

  // region Fetches
  /// Project a named field.
  FetchField {
    input: IString,
    field: IString,
    temp : IString,
    ty   : TypeHandle,
  },
  /// Project by 1-based index; negative indices are splat-relative, counting from the end.
  FetchIndex {
    input: IString,
    index: i64,
    temp : IString,
    ty   : TypeHandle,
  },
  /// Project the contiguous sub-sequence from `first` elements in to `from_end` before the end.
  FetchRange {
    input   : IString,
    first   : usize,
    from_end: usize,
    temp    : IString,
    ty      : TypeHandle,
  },
  /// Length of a sequence or tuple.
  FetchLength {
    input: IString,
    temp : IString,
  },
  /// Evaluate a host expression (guards; phi-merging across disjunctions). When `key` is set it
  /// overrides the structural key, so both sides of a disjunction can feed one phi temporary.
  FetchExpression {
    input   : IString,
    value   : Box<ExprAST>,
    captures: Bindings,
    key     : Option<IString>,
    temp    : IString,
  },
  // endregion Fetches

  /// All subpatterns must match, left to right.
  And(Vec<BoundPattern>),
  /// The first matching subpattern wins.
  Or(Vec<BoundPattern>),
}

use BoundPatternKind::*;

impl PartialEq for BoundPattern {
  fn eq(&self, other: &Self) -> bool {
    self.kind == other.kind
  }
}

impl Eq for BoundPattern {}

impl Hash for BoundPattern {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.kind.hash(state);
  }
}

/// The structural identity of a fetch, the key of the binder's temporary-interning cache (and
/// thereby the reason structurally equal fetches in different arms share one temporary).
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum FetchKey {
  Field { input: IString, field: IString },
  Index { input: IString, index: i64 },
  Range { input: IString, first: usize, from_end: usize },
  Length { input: IString },
  Expression { input: IString, value: Box<ExprAST>, captures: Bindings },
  /// An explicitly keyed expression fetch (a phi).
  Keyed(IString),
}

impl BoundPattern {
  pub fn new(location: Location, kind: BoundPatternKind) -> Self {
    BoundPattern { location, kind }
  }

  pub fn true_at(location: Location) -> Self {
    BoundPattern::new(location, True)
  }

  pub fn false_at(location: Location) -> Self {
    BoundPattern::new(location, False)
  }

  /// Conjunction with local boolean simplification: `True` conjuncts are absorbed, a `False`
  /// conjunct collapses the whole pattern, and nested `And`s are flattened.
  pub fn and(location: Location, subpatterns: Vec<BoundPattern>) -> Self {
    let mut flattened = Vec::with_capacity(subpatterns.len());
    for pattern in subpatterns {
      match pattern.kind {
        True => {}
        False => return BoundPattern::false_at(location),
        And(inner) => flattened.extend(inner),
        _ => flattened.push(pattern),
      }
    }

    match flattened.len() {
      0 => BoundPattern::true_at(location),
      1 => flattened.into_iter().next().unwrap(),
      _ => BoundPattern::new(location, And(flattened)),
    }
  }

  /// Disjunction with local boolean simplification: `False` branches are dropped, branches after
  /// an irrefutable one are unreachable and dropped, and nested `Or`s are flattened.
  pub fn or(location: Location, subpatterns: Vec<BoundPattern>) -> Self {
    let mut flattened = Vec::with_capacity(subpatterns.len());
    'outer: for pattern in subpatterns {
      match pattern.kind {
        False => {}
        Or(inner) => {
          for branch in inner {
            let stop = branch.is_irrefutable();
            flattened.push(branch);
            if stop {
              break 'outer;
            }
          }
        }
        _ => {
          let stop = pattern.is_irrefutable();
          flattened.push(pattern);
          if stop {
            break;
          }
        }
      }
    }

    match flattened.len() {
      0 => BoundPattern::false_at(location),
      1 => flattened.into_iter().next().unwrap(),
      _ => BoundPattern::new(location, Or(flattened)),
    }
  }

  /// Can this pattern fail to match? Fetches cannot fail: they are pure projections. A
  /// conjunction is irrefutable when every conjunct is; a disjunction when any branch is.
  pub fn is_irrefutable(&self) -> bool {
    match &self.kind {
      True => true,
      False => false,

      EqualValue { .. } | TypeTest { .. } | Relational { .. } | WhereTest { .. } => false,

      FetchField { .. }
      | FetchIndex { .. }
      | FetchRange { .. }
      | FetchLength { .. }
      | FetchExpression { .. } => true,

      And(subpatterns) => subpatterns.iter().all(BoundPattern::is_irrefutable),
      Or(subpatterns) => subpatterns.iter().any(BoundPattern::is_irrefutable),
    }
  }

  pub fn is_fetch(&self) -> bool {
    matches!(
      self.kind,
      FetchField { .. } | FetchIndex { .. } | FetchRange { .. } | FetchLength { .. } | FetchExpression { .. }
    )
  }

  pub fn is_test(&self) -> bool {
    matches!(
      self.kind,
      EqualValue { .. } | TypeTest { .. } | Relational { .. } | WhereTest { .. }
    )
  }

}

impl Formattable for BoundPattern {
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result {
    match &self.kind {
      True => write!(out, "⊤"),
      False => write!(out, "⊥"),

      EqualValue { input, value, .. } => write!(out, "{} == {}", input, value),
      TypeTest { input, ty } => write!(out, "{} isa {:?}", input, ty),
      Relational { input, op, constant } => write!(out, "{} {} {}", input, op, constant),
      WhereTest { temp, inverted } => {
        if *inverted {
          write!(out, "where !{}", temp)
        } else {
          write!(out, "where {}", temp)
        }
      }

      FetchField { input, field, temp, .. } => write!(out, "{} := {}.{}", temp, input, field),
      FetchIndex { input, index, temp, .. } => write!(out, "{} := {}[{}]", temp, input, index),
      FetchRange { input, first, from_end, temp, .. } => {
        write!(out, "{} := {}[{}+1 .. end-{}]", temp, input, first, from_end)
      }
      FetchLength { input, temp } => write!(out, "{} := length({})", temp, input),
      FetchExpression { value, temp, .. } => write!(out, "{} := {}", temp, value),

      And(subpatterns) => {
        let parts: Result<Vec<String>, _> = subpatterns.iter()
            .map(|p| {
              let mut s = String::new();
              p.repr(&mut s, style).map(|_| s)
            })
            .collect();
        write!(out, "({})", join_iter(parts?, " ∧ "))
      }
      Or(subpatterns) => {
        let parts: Result<Vec<String>, _> = subpatterns.iter()
            .map(|p| {
              let mut s = String::new();
              p.repr(&mut s, style).map(|_| s)
            })
            .collect();
        write!(out, "({})", join_iter(parts?, " ∨ "))
      }
    }
  }
}

impl_display_debug_for_formattable!(BoundPattern);
