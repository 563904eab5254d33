/*!

Leveled logging macros over `tracing`.

Every message carries its own verbosity as the first macro argument and is emitted only when that
verbosity does not exceed the global threshold. Verbosity 0 messages are always emitted.

```ignore
warning!(1, "arm {} is unreachable", arm_number);
```

The backing implementation is encapsulated here; client code sees only the macros and the
threshold getter/setter.

*/

use std::sync::atomic::{AtomicU8, Ordering};

static GLOBAL_LOGGING_THRESHOLD: AtomicU8 = AtomicU8::new(1);

#[inline(always)]
pub fn set_global_logging_threshold(threshold: u8) {
  GLOBAL_LOGGING_THRESHOLD.store(threshold, Ordering::Relaxed);
}

#[inline(always)]
pub fn get_global_logging_threshold() -> u8 {
  GLOBAL_LOGGING_THRESHOLD.load(Ordering::Relaxed)
}

/// Installs a `tracing` subscriber that prints to stderr. Opt-in, for tests and binaries; a
/// library embedding this crate will usually install its own.
pub fn init_logging() {
  let _ = tracing_subscriber::fmt()
      .with_writer(std::io::stderr)
      .with_target(false)
      .try_init();
}

#[macro_export]
macro_rules! critical {
  ($verbosity:expr, $($arg:tt)+) => {
    if $verbosity <= $crate::log::get_global_logging_threshold() {
      $crate::tracing::error!(target: "matchc", $($arg)+);
    }
  };
}

#[macro_export]
macro_rules! error {
  ($verbosity:expr, $($arg:tt)+) => {
    if $verbosity <= $crate::log::get_global_logging_threshold() {
      $crate::tracing::error!(target: "matchc", $($arg)+);
    }
  };
}

#[macro_export]
macro_rules! warning {
  ($verbosity:expr, $($arg:tt)+) => {
    if $verbosity <= $crate::log::get_global_logging_threshold() {
      $crate::tracing::warn!(target: "matchc", $($arg)+);
    }
  };
}

#[macro_export]
macro_rules! info {
  ($verbosity:expr, $($arg:tt)+) => {
    if $verbosity <= $crate::log::get_global_logging_threshold() {
      $crate::tracing::info!(target: "matchc", $($arg)+);
    }
  };
}

#[macro_export]
macro_rules! debug {
  ($verbosity:expr, $($arg:tt)+) => {
    if $verbosity <= $crate::log::get_global_logging_threshold() {
      $crate::tracing::debug!(target: "matchc", $($arg)+);
    }
  };
}

#[macro_export]
macro_rules! trace {
  ($verbosity:expr, $($arg:tt)+) => {
    if $verbosity <= $crate::log::get_global_logging_threshold() {
      $crate::tracing::trace!(target: "matchc", $($arg)+);
    }
  };
}
