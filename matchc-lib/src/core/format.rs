/*!

There are different text representations possible for bound patterns, actions, and emitted
statements depending on the context. This module provides a unified API for formatting objects
across the crate.

The trait that formattable types implement is `Formattable`. It works like the standard library's
`Display`, but takes a style. Both `Debug` and `Display` are implemented for
`dyn Formattable`-implementing types through a convenience macro:

```ignore
impl_display_debug_for_formattable!(MyStruct);
```

*/

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum FormatStyle {
  #[default]
  Default, // Use the default formatting
  Debug,   // Format with extra debugging information
}

pub trait Formattable {
  /// Writes a text representation of `self` according to the given `FormatStyle`.
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result;
}

macro_rules! impl_display_debug_for_formattable {
  ($t:ty) => {
    impl std::fmt::Display for $t {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <$t as $crate::core::format::Formattable>::repr(self, f, $crate::core::format::FormatStyle::Default)
      }
    }

    impl std::fmt::Debug for $t {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <$t as $crate::core::format::Formattable>::repr(self, f, $crate::core::format::FormatStyle::Debug)
      }
    }
  };
}
pub(crate) use impl_display_debug_for_formattable;
