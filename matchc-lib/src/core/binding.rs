/*!

Variable bindings and partially-matched arms.

A `Bindings` is an insertion-ordered immutable mapping from user-visible variable names to
temporary names. Updates return a new value; the backing storage is a small vector, so cloning is
cheap at the sizes patterns produce.

A `PartialArm` is one arm of the match viewed mid-compilation: its original index, the remaining
bound pattern, the variable bindings established so far, and the (already substituted) result
expression. Equality is by index, pattern, and bindings; the hash over those three is computed
once at construction, because automaton-node interning hashes arms constantly.

*/

use std::hash::{Hash, Hasher};

use matchc_abs::{join_iter, IString, SmallVec};

use crate::{
  api::ast::{ExprAST, Location},
  core::pattern::BoundPattern,
};

#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct Bindings {
  pairs: SmallVec<[(IString, IString); 4]>,
}

impl Bindings {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &IString) -> Option<&IString> {
    self.pairs
        .iter()
        .find(|(bound_name, _)| bound_name == name)
        .map(|(_, temp)| temp)
  }

  pub fn contains(&self, name: &IString) -> bool {
    self.get(name).is_some()
  }

  /// Returns a copy with `name ↦ temp`. A rebinding keeps the name's original position.
  pub fn bind(&self, name: IString, temp: IString) -> Bindings {
    let mut pairs = self.pairs.clone();
    match pairs.iter_mut().find(|(bound_name, _)| *bound_name == name) {
      Some(pair) => pair.1 = temp,
      None => pairs.push((name, temp)),
    }
    Bindings { pairs }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&IString, &IString)> {
    self.pairs.iter().map(|(name, temp)| (name, temp))
  }

  pub fn names(&self) -> impl Iterator<Item = &IString> {
    self.pairs.iter().map(|(name, _)| name)
  }

  pub fn len(&self) -> usize {
    self.pairs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pairs.is_empty()
  }

  /// Names bound in both `self` and `other`, in `self`'s insertion order.
  pub fn common_names(&self, other: &Bindings) -> Vec<IString> {
    self.names().filter(|name| other.contains(name)).cloned().collect()
  }
}

impl std::fmt::Display for Bindings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{{{}}}",
      join_iter(self.iter().map(|(name, temp)| format!("{} ↦ {}", name, temp)), ", ")
    )
  }
}

#[derive(Clone, Debug)]
pub struct PartialArm {
  pub index   : usize,
  pub pattern : BoundPattern,
  pub bindings: Bindings,
  pub result  : ExprAST,
  pub location: Location,
  hash        : u64,
}

impl PartialArm {
  pub fn new(index: usize, pattern: BoundPattern, bindings: Bindings, result: ExprAST, location: Location) -> Self {
    let hash = Self::compute_hash(index, &pattern, &bindings);
    PartialArm { index, pattern, bindings, result, location, hash }
  }

  /// The same arm with its pattern rewritten; the cached hash is recomputed.
  pub fn with_pattern(&self, pattern: BoundPattern) -> Self {
    PartialArm::new(
      self.index,
      pattern,
      self.bindings.clone(),
      self.result.clone(),
      self.location.clone(),
    )
  }

  /// One-based arm number, as diagnostics present it.
  pub fn number(&self) -> usize {
    self.index + 1
  }

  fn compute_hash(index: usize, pattern: &BoundPattern, bindings: &Bindings) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    index.hash(&mut hasher);
    pattern.hash(&mut hasher);
    bindings.hash(&mut hasher);
    hasher.finish()
  }
}

impl PartialEq for PartialArm {
  fn eq(&self, other: &Self) -> bool {
    self.hash == other.hash
        && self.index == other.index
        && self.pattern == other.pattern
        && self.bindings == other.bindings
  }
}

impl Eq for PartialArm {}

impl Hash for PartialArm {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bindings_are_insertion_ordered_and_immutable() {
    let empty = Bindings::new();
    let one = empty.bind(IString::from("x"), IString::from("t1"));
    let two = one.bind(IString::from("y"), IString::from("t2"));

    assert!(empty.is_empty());
    assert_eq!(one.len(), 1);
    assert_eq!(two.names().cloned().collect::<Vec<_>>(), vec![IString::from("x"), IString::from("y")]);
    assert_eq!(two.get(&IString::from("y")), Some(&IString::from("t2")));

    // rebinding keeps position
    let rebound = two.bind(IString::from("x"), IString::from("t9"));
    assert_eq!(rebound.names().cloned().collect::<Vec<_>>(), vec![IString::from("x"), IString::from("y")]);
    assert_eq!(rebound.get(&IString::from("x")), Some(&IString::from("t9")));
  }

  #[test]
  fn common_names_keeps_left_order() {
    let left = Bindings::new()
        .bind(IString::from("a"), IString::from("t1"))
        .bind(IString::from("b"), IString::from("t2"));
    let right = Bindings::new()
        .bind(IString::from("b"), IString::from("t3"))
        .bind(IString::from("c"), IString::from("t4"));

    assert_eq!(left.common_names(&right), vec![IString::from("b")]);
  }
}
