/*!

A `NatSet` is a set of (small) natural numbers, a thin wrapper over a bit set. Arm indices and
similar dense, small nonnegative values live in these.

*/

use bit_set::BitSet;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct NatSet {
  inner: BitSet,
}

impl NatSet {
  #[inline(always)]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline(always)]
  pub fn insert(&mut self, value: usize) -> bool {
    self.inner.insert(value)
  }

  #[inline(always)]
  pub fn contains(&self, value: usize) -> bool {
    self.inner.contains(value)
  }

  #[inline(always)]
  pub fn remove(&mut self, value: usize) -> bool {
    self.inner.remove(value)
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.inner.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }

  pub fn union_in_place(&mut self, other: &NatSet) {
    self.inner.union_with(&other.inner);
  }

  pub fn is_superset(&self, other: &NatSet) -> bool {
    self.inner.is_superset(&other.inner)
  }

  /// Iterates members in increasing order.
  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.inner.iter()
  }
}

impl std::fmt::Debug for NatSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

impl FromIterator<usize> for NatSet {
  fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
    let mut set = NatSet::new();
    for value in iter {
      set.insert(value);
    }
    set
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_contains_iterate() {
    let mut set = NatSet::new();
    assert!(set.is_empty());
    assert!(set.insert(3));
    assert!(set.insert(1));
    // duplicate insert
    assert!(!set.insert(3));

    assert!(set.contains(1));
    assert!(set.contains(3));
    assert!(!set.contains(2));

    // in increasing order
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3]);
  }

  #[test]
  fn union_and_superset() {
    let a: NatSet = [0usize, 2, 4].into_iter().collect();
    let b: NatSet = [2usize, 3].into_iter().collect();

    let mut c = a.clone();
    c.union_in_place(&b);
    assert_eq!(c.iter().collect::<Vec<_>>(), vec![0, 2, 3, 4]);
    assert!(c.is_superset(&a));
    assert!(!a.is_superset(&b));
  }
}
