/*!

The decision automaton. A node is an ordered list of partially-matched arms (the arms that can
still win, in decreasing priority) plus, once computed, a chosen next action and its successor
nodes. Nodes are arena-allocated and identified by integer index; the arena interns nodes by
their arm lists, so two ways of reaching the same set of partially-matched arms converge on one
node before minimization ever runs.

*/

mod builder;
mod minimizer;

pub use minimizer::{minimize, MinNode, MinNodeIndex, MinimizedAutomaton, NodeAttribute, NodeAttributes};

use std::rc::Rc;

use matchc_abs::{IndexSet, NatSet, SmallVec};

use crate::core::{
  binding::PartialArm,
  format::{impl_display_debug_for_formattable, FormatStyle, Formattable},
  pattern::BoundPattern,
};

pub type NodeIndex = usize;
pub type ArmsList  = Rc<Vec<PartialArm>>;

/// What a node does when control reaches it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Action {
  /// The first surviving arm's pattern is exhausted: the match succeeds here. Carries one
  /// successor (the continuation over the remaining arms) when the arm's result can
  /// `match_fail`, and none otherwise.
  Success(PartialArm),
  /// Perform a fetch; one successor.
  Fetch(BoundPattern),
  /// Evaluate a test; a true successor and a false successor, in that order.
  Test(BoundPattern),
  /// No surviving arms: raise the match failure carrying the scrutinee.
  Fail,
}

impl Formattable for Action {
  fn repr(&self, out: &mut dyn std::fmt::Write, _style: FormatStyle) -> std::fmt::Result {
    match self {
      Action::Success(arm) => write!(out, "succeed with arm {}", arm.number()),
      Action::Fetch(fetch) => write!(out, "fetch {}", fetch),
      Action::Test(test)   => write!(out, "test {}", test),
      Action::Fail         => write!(out, "fail"),
    }
  }
}

impl_display_debug_for_formattable!(Action);

pub struct Node {
  pub arms      : ArmsList,
  pub action    : Option<Action>,
  pub successors: SmallVec<[NodeIndex; 2]>,
}

pub struct Automaton {
  pub nodes       : Vec<Node>,
  pub root        : NodeIndex,
  /// Arm indices that appear as success actions somewhere in the automaton.
  pub matched_arms: NatSet,
  interned        : IndexSet<ArmsList>,
}

impl Automaton {
  /// Interns an arm list, creating its node on first sight. The arm list must already satisfy
  /// the node invariants: sorted by arm index, no `False` patterns, truncated after an
  /// irrefutable arm.
  fn intern(&mut self, arms: Vec<PartialArm>) -> NodeIndex {
    let key: ArmsList = Rc::new(arms);
    let (index, fresh) = self.interned.insert(key.clone());
    if fresh {
      self.nodes.push(Node {
        arms      : key,
        action    : None,
        successors: SmallVec::new(),
      });
    }
    index
  }

  /// A human-readable rendering of every node, for logs and debugging.
  pub fn dump(&self) -> String {
    let mut out = String::new();
    for (index, node) in self.nodes.iter().enumerate() {
      let action = match &node.action {
        Some(action) => action.to_string(),
        None => "<unselected>".to_string(),
      };
      let successors: Vec<String> = node.successors.iter().map(|s| format!("#{}", s)).collect();
      let _ = std::fmt::Write::write_fmt(
        &mut out,
        format_args!(
          "#{} [{} arms] {} {}\n",
          index,
          node.arms.len(),
          action,
          successors.join(" ")
        ),
      );
    }
    out
  }
}

/// Drops arms that can no longer match and truncates behind an arm that cannot fail. An
/// irrefutable arm whose result can still `match_fail` does not truncate: the arms after it
/// remain reachable through the fail continuation. The resulting list is what node identity is
/// computed from.
pub(crate) fn normalize_arms(arms: impl IntoIterator<Item = PartialArm>) -> Vec<PartialArm> {
  let mut normalized = Vec::new();
  for arm in arms {
    if arm.pattern.kind == crate::core::pattern::BoundPatternKind::False {
      continue;
    }
    let truncates = arm.pattern.is_irrefutable() && !arm.result.contains_match_fail();
    normalized.push(arm);
    if truncates {
      break;
    }
  }
  normalized
}
