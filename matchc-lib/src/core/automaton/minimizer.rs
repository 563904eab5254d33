/*!

Bottom-up deduplication of the automaton.

Working post-order, each node's successors are minimized first; the node is then interned by
`(action, minimized successors)`. Discovering a prior equal node retains the prior node and marks
it as needing a label: a node reached by two distinct predecessors cannot be reached purely by
fall-through. The result is a DAG whose shared subgraphs exist exactly once, and re-minimizing it
is a no-op up to node identity.

*/

use enumflags2::{bitflags, BitFlags};

use matchc_abs::{IndexSet, SmallVec};

use crate::core::automaton::{Action, Automaton};

pub type MinNodeIndex = usize;

#[bitflags]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum NodeAttribute {
  /// The node is a jump target and must carry a label when emitted.
  Labeled,
  /// The emitter has already placed this node.
  Placed,
}

pub type NodeAttributes = BitFlags<NodeAttribute>;

pub struct MinNode {
  pub action    : Action,
  pub successors: SmallVec<[MinNodeIndex; 2]>,
  pub attributes: NodeAttributes,
}

pub struct MinimizedAutomaton {
  pub nodes: Vec<MinNode>,
  pub root : MinNodeIndex,
}

impl MinimizedAutomaton {
  /// Runs the minimizer over an already-minimized automaton. Deduplication is idempotent, so
  /// the result is isomorphic to `self`; exposed so that invariant can be checked.
  pub fn reminimize(&self) -> MinimizedAutomaton {
    minimize_graph(self.root, self.nodes.len(), |index| {
      let node = &self.nodes[index];
      (node.action.clone(), node.successors.clone())
    })
  }

  pub fn dump(&self) -> String {
    let mut out = String::new();
    for (index, node) in self.nodes.iter().enumerate() {
      let successors: Vec<String> = node.successors.iter().map(|s| format!("#{}", s)).collect();
      let labeled = if node.attributes.contains(NodeAttribute::Labeled) { " ⚑" } else { "" };
      let _ = std::fmt::Write::write_fmt(
        &mut out,
        format_args!("#{}{} {} {}\n", index, labeled, node.action, successors.join(" ")),
      );
    }
    out
  }
}

/// Minimizes a built automaton. Every node must have an action.
pub fn minimize(automaton: &Automaton) -> MinimizedAutomaton {
  minimize_graph(automaton.root, automaton.nodes.len(), |index| {
    let node = &automaton.nodes[index];
    let action = node.action.clone().expect("minimizing an automaton node without an action");
    (action, node.successors.clone())
  })
}

fn minimize_graph<F>(root: usize, node_count: usize, node_of: F) -> MinimizedAutomaton
    where F: Fn(usize) -> (Action, SmallVec<[usize; 2]>),
{
  struct Minimizer<F> {
    node_of : F,
    memo    : Vec<Option<MinNodeIndex>>,
    nodes   : Vec<MinNode>,
    interned: IndexSet<(Action, SmallVec<[MinNodeIndex; 2]>)>,
  }

  impl<F> Minimizer<F>
      where F: Fn(usize) -> (Action, SmallVec<[usize; 2]>),
  {
    fn walk(&mut self, index: usize) -> MinNodeIndex {
      if let Some(minimized) = self.memo[index] {
        return minimized;
      }

      let (action, raw_successors) = (self.node_of)(index);
      let successors: SmallVec<[MinNodeIndex; 2]> =
          raw_successors.iter().map(|&successor| self.walk(successor)).collect();

      let (min_index, fresh) = self.interned.insert((action.clone(), successors.clone()));
      if fresh {
        self.nodes.push(MinNode {
          action,
          successors,
          attributes: NodeAttributes::empty(),
        });
      } else {
        // Rediscovered: the retained node now has a second distinct predecessor.
        self.nodes[min_index].attributes |= NodeAttribute::Labeled;
      }

      self.memo[index] = Some(min_index);
      min_index
    }
  }

  let mut minimizer = Minimizer {
    node_of,
    memo    : vec![None; node_count],
    nodes   : Vec::new(),
    interned: IndexSet::new(),
  };
  let root = minimizer.walk(root);
  let mut minimized = MinimizedAutomaton { nodes: minimizer.nodes, root };
  mark_shared_nodes(&mut minimized);
  minimized
}

/// Any node with two or more incoming edges needs a label, whether the second edge came from
/// interning or from sharing already present in the built automaton.
fn mark_shared_nodes(minimized: &mut MinimizedAutomaton) {
  let mut predecessor_counts = vec![0usize; minimized.nodes.len()];
  for node in &minimized.nodes {
    for &successor in &node.successors {
      predecessor_counts[successor] += 1;
    }
  }
  for (index, count) in predecessor_counts.into_iter().enumerate() {
    if count >= 2 {
      minimized.nodes[index].attributes |= NodeAttribute::Labeled;
    }
  }
}
