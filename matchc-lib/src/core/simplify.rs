/*!

Pattern simplification under an automaton action's outcome.

Given that a fetch has been performed, every structurally equal occurrence of it rewrites to
`True`. Given that a test evaluated to a known sense, equal occurrences rewrite to that sense,
type tests over the same input refine through the oracle's subtype lattice, and where-tests over
the same guard temporary collapse through their inversions. `And`/`Or` reconstruction applies the
local boolean laws, so callers see already-absorbed results.

*/

use crate::{
  api::oracle::TypeOracle,
  core::pattern::{BoundPattern, BoundPatternKind},
};

/// Rewrites `pattern` under the fact that `fetch` has been performed.
pub fn remove_fetch(pattern: &BoundPattern, fetch: &BoundPattern) -> BoundPattern {
  if pattern == fetch {
    return BoundPattern::true_at(pattern.location.clone());
  }

  match &pattern.kind {
    BoundPatternKind::And(subpatterns) => BoundPattern::and(
      pattern.location.clone(),
      subpatterns.iter().map(|sub| remove_fetch(sub, fetch)).collect(),
    ),
    BoundPatternKind::Or(subpatterns) => BoundPattern::or(
      pattern.location.clone(),
      subpatterns.iter().map(|sub| remove_fetch(sub, fetch)).collect(),
    ),
    _ => pattern.clone(),
  }
}

/// Rewrites `pattern` under the fact that `test` evaluated to `sense`.
pub fn apply_test(
  pattern: &BoundPattern,
  test   : &BoundPattern,
  sense  : bool,
  oracle : &dyn TypeOracle,
) -> BoundPattern {
  let location = pattern.location.clone();

  if pattern == test {
    return if sense {
      BoundPattern::true_at(location)
    } else {
      BoundPattern::false_at(location)
    };
  }

  match (&pattern.kind, &test.kind) {
    // Type-test refinement over a shared input.
    (
      BoundPatternKind::TypeTest { input: pattern_input, ty: pattern_ty },
      BoundPatternKind::TypeTest { input: test_input, ty: test_ty },
    ) if pattern_input == test_input => {
      if sense {
        if oracle.subtype(*test_ty, *pattern_ty) {
          // The passed test is at least as narrow; this one is implied.
          BoundPattern::true_at(location)
        } else if oracle.subtype(*pattern_ty, *test_ty) {
          // Strictly narrower than what passed: still informative.
          pattern.clone()
        } else if oracle.intersect(*test_ty, *pattern_ty).is_none() {
          BoundPattern::false_at(location)
        } else {
          pattern.clone()
        }
      } else if oracle.subtype(*pattern_ty, *test_ty) {
        // The wider test failed, so the narrower one cannot pass.
        BoundPattern::false_at(location)
      } else {
        pattern.clone()
      }
    }

    // Two checks of the same guard temporary collapse through their inversions.
    (
      BoundPatternKind::WhereTest { temp: pattern_temp, inverted: pattern_inverted },
      BoundPatternKind::WhereTest { temp: test_temp, inverted: test_inverted },
    ) if pattern_temp == test_temp => {
      if (pattern_inverted == test_inverted) == sense {
        BoundPattern::true_at(location)
      } else {
        BoundPattern::false_at(location)
      }
    }

    (BoundPatternKind::And(subpatterns), _) => BoundPattern::and(
      location,
      subpatterns.iter().map(|sub| apply_test(sub, test, sense, oracle)).collect(),
    ),
    (BoundPatternKind::Or(subpatterns), _) => BoundPattern::or(
      location,
      subpatterns.iter().map(|sub| apply_test(sub, test, sense, oracle)).collect(),
    ),

    _ => pattern.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use matchc_abs::IString;
  use crate::api::{
    ast::Location,
    oracle::{TypeHandle, TypeTable},
  };

  fn location() -> Location {
    Location::new("simplify.jl", 1)
  }

  fn type_test(input: &str, ty: TypeHandle) -> BoundPattern {
    BoundPattern::new(
      location(),
      BoundPatternKind::TypeTest { input: IString::from(input), ty },
    )
  }

  fn where_test(temp: &str, inverted: bool) -> BoundPattern {
    BoundPattern::new(
      location(),
      BoundPatternKind::WhereTest { temp: IString::from(temp), inverted },
    )
  }

  #[test]
  fn equal_test_collapses_to_sense() {
    let oracle = TypeTable::new();
    let test = type_test("t1", TypeHandle::Tuple);

    assert_eq!(apply_test(&test, &test, true, &oracle).kind, BoundPatternKind::True);
    assert_eq!(apply_test(&test, &test, false, &oracle).kind, BoundPatternKind::False);
  }

  #[test]
  fn type_tests_refine_through_the_lattice() {
    let mut oracle = TypeTable::new();
    let shape  = oracle.define_abstract("Shape", None);
    let circle = oracle.define_struct("Circle", Some(shape), &[]);
    let square = oracle.define_struct("Square", Some(shape), &[]);

    // Circle passed, so Shape is implied.
    assert_eq!(
      apply_test(&type_test("t", shape), &type_test("t", circle), true, &oracle).kind,
      BoundPatternKind::True
    );
    // Shape passed; Circle is narrower and still informative.
    assert_eq!(
      apply_test(&type_test("t", circle), &type_test("t", shape), true, &oracle),
      type_test("t", circle)
    );
    // Circle passed; Square cannot also hold.
    assert_eq!(
      apply_test(&type_test("t", square), &type_test("t", circle), true, &oracle).kind,
      BoundPatternKind::False
    );
    // Shape failed; Circle cannot hold either.
    assert_eq!(
      apply_test(&type_test("t", circle), &type_test("t", shape), false, &oracle).kind,
      BoundPatternKind::False
    );
    // Circle failed; Shape remains possible.
    assert_eq!(
      apply_test(&type_test("t", shape), &type_test("t", circle), false, &oracle),
      type_test("t", shape)
    );
    // Different inputs never interact.
    assert_eq!(
      apply_test(&type_test("u", circle), &type_test("t", circle), true, &oracle),
      type_test("u", circle)
    );
  }

  #[test]
  fn where_tests_collapse_through_inversion() {
    let oracle = TypeTable::new();

    assert_eq!(
      apply_test(&where_test("g", true), &where_test("g", false), true, &oracle).kind,
      BoundPatternKind::False
    );
    assert_eq!(
      apply_test(&where_test("g", true), &where_test("g", false), false, &oracle).kind,
      BoundPatternKind::True
    );
    assert_eq!(
      apply_test(&where_test("g", false), &where_test("g", false), true, &oracle).kind,
      BoundPatternKind::True
    );
  }

  #[test]
  fn rewrites_propagate_through_conjunctions() {
    let oracle = TypeTable::new();
    let test = type_test("t1", TypeHandle::Tuple);
    let other = type_test("t2", TypeHandle::Sequence);
    let conjunction = BoundPattern::new(
      location(),
      BoundPatternKind::And(vec![test.clone(), other.clone()]),
    );

    // The satisfied conjunct is absorbed.
    assert_eq!(apply_test(&conjunction, &test, true, &oracle), other);
    // A falsified conjunct collapses the whole conjunction.
    assert_eq!(apply_test(&conjunction, &test, false, &oracle).kind, BoundPatternKind::False);
  }

  #[test]
  fn fetch_removal_is_structural() {
    let fetch = BoundPattern::new(
      location(),
      BoundPatternKind::FetchLength {
        input: IString::from("t0"),
        temp : IString::from("len#1"),
      },
    );
    let test = type_test("t0", TypeHandle::Sequence);
    let conjunction = BoundPattern::new(
      location(),
      BoundPatternKind::And(vec![fetch.clone(), test.clone()]),
    );

    assert_eq!(remove_fetch(&conjunction, &fetch), test);
    assert_eq!(remove_fetch(&test, &fetch), test);
  }
}
