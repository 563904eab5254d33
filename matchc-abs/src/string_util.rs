/*!

Join sequences with a separator.

*/

use std::fmt::Display;

/// Joins the items of an iterator into a `String`, separated by `separator`.
pub fn join_iter<I, T>(iter: I, separator: &str) -> String
    where I: IntoIterator<Item = T>,
          T: Display,
{
  let mut out = String::new();
  for (i, item) in iter.into_iter().enumerate() {
    if i > 0 {
      out.push_str(separator);
    }
    out.push_str(&item.to_string());
  }
  out
}

/// Joins a slice of displayable items, separated by `separator`.
pub fn join_string<T: Display>(items: &[T], separator: &str) -> String {
  join_iter(items.iter(), separator)
}
