/*!

Worklist construction of the decision automaton.

The entry node holds every arm. For each node without an action: an empty arm list fails; a first
arm whose pattern is exhausted succeeds; otherwise the leftmost leaf of the first arm's pattern
becomes the action, and successors are the current arms simplified under each outcome of that
action. Interning makes repeated arm lists converge, so the worklist terminates when every
reachable node has an action.

*/

use matchc_abs::{warning, IndexSet, NatSet, SmallVec};

use crate::{
  api::{
    error::Warning,
    oracle::TypeOracle,
  },
  core::{
    automaton::{normalize_arms, Action, Automaton, NodeIndex},
    binding::PartialArm,
    pattern::{BoundPattern, BoundPatternKind},
    simplify::{apply_test, remove_fetch},
  },
};

impl Automaton {
  /// Builds the reachable automaton over `arms`, returning it along with any unreachable-arm
  /// warnings in arm order.
  pub fn build(arms: Vec<PartialArm>, oracle: &dyn TypeOracle) -> (Automaton, Vec<Warning>) {
    // Remember every arm for the post-construction reachability report.
    let all_arms: Vec<(usize, crate::api::ast::Location)> =
        arms.iter().map(|arm| (arm.index, arm.location.clone())).collect();

    let mut automaton = Automaton {
      nodes       : Vec::new(),
      root        : 0,
      matched_arms: NatSet::new(),
      interned    : IndexSet::new(),
    };
    automaton.root = automaton.intern(normalize_arms(arms));

    let mut worklist: Vec<NodeIndex> = vec![automaton.root];
    while let Some(index) = worklist.pop() {
      if automaton.nodes[index].action.is_some() {
        continue;
      }
      let (action, successors) = automaton.select_action(index, oracle);
      for &successor in &successors {
        if automaton.nodes[successor].action.is_none() {
          worklist.push(successor);
        }
      }
      let node = &mut automaton.nodes[index];
      node.action = Some(action);
      node.successors = successors;
    }

    let mut warnings = Vec::new();
    for (index, location) in all_arms {
      if !automaton.matched_arms.contains(index) {
        let report = Warning::UnreachableArm { location, arm_number: index + 1 };
        warning!(1, "{}", report);
        warnings.push(report);
      }
    }

    (automaton, warnings)
  }

  fn select_action(&mut self, index: NodeIndex, oracle: &dyn TypeOracle) -> (Action, SmallVec<[NodeIndex; 2]>) {
    let arms = self.nodes[index].arms.clone();

    // No surviving arm: this is the failure node.
    let Some(first) = arms.first() else {
      return (Action::Fail, SmallVec::new());
    };

    // The first arm has nothing left to check: match succeeds. If its result can still bail out
    // with `match_fail`, the remaining arms form the continuation.
    if first.pattern.kind == BoundPatternKind::True {
      self.matched_arms.insert(first.index);
      let successors = if first.result.contains_match_fail() {
        let remaining: Vec<PartialArm> = arms[1..].to_vec();
        SmallVec::from_iter([self.intern(remaining)])
      } else {
        SmallVec::new()
      };
      return (Action::Success(first.clone()), successors);
    }

    let leaf = leftmost_leaf(&first.pattern).clone();

    if leaf.is_fetch() {
      let simplified = normalize_arms(
        arms.iter().map(|arm| arm.with_pattern(remove_fetch(&arm.pattern, &leaf))),
      );
      let successor = self.intern(simplified);
      return (Action::Fetch(leaf), SmallVec::from_iter([successor]));
    }

    debug_assert!(leaf.is_test(), "leftmost leaf is neither fetch nor test: {}", leaf);

    let true_arms = normalize_arms(
      arms.iter().map(|arm| arm.with_pattern(apply_test(&arm.pattern, &leaf, true, oracle))),
    );
    let false_arms = normalize_arms(
      arms.iter().map(|arm| arm.with_pattern(apply_test(&arm.pattern, &leaf, false, oracle))),
    );
    let true_successor = self.intern(true_arms);
    let false_successor = self.intern(false_arms);
    (Action::Test(leaf), SmallVec::from_iter([true_successor, false_successor]))
  }
}

/// The action-selection heuristic: first pattern, leftmost leaf.
fn leftmost_leaf(pattern: &BoundPattern) -> &BoundPattern {
  match &pattern.kind {
    BoundPatternKind::And(subpatterns) | BoundPatternKind::Or(subpatterns) => {
      leftmost_leaf(&subpatterns[0])
    }
    _ => pattern,
  }
}
