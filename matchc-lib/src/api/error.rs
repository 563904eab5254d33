/*!

Compile-time errors, non-fatal warnings, and runtime failures.

Compile errors abort compilation at the pattern site and render with a `file:line` prefix taken
from the offending AST node. Warnings accumulate during automaton construction and ride along on
the compiled artifact. Runtime failures are produced by the interpreter executing compiled code.

*/

use thiserror::Error;

use matchc_abs::IString;

use crate::{
  api::ast::Location,
  core::interpreter::Value,
};

#[derive(Clone, Debug, Error)]
pub enum CompileError {
  #[error("{location}: cannot resolve {name} as a type")]
  UnresolvedType { location: Location, name: IString },

  #[error("{location}: {name} does not name a type")]
  NonType { location: Location, name: IString },

  #[error("{location}: duplicate named field {name}")]
  DuplicateNamedField { location: Location, name: IString },

  #[error("{location}: pattern mixes named and positional fields")]
  MixedFieldStyle { location: Location },

  #[error("{location}: type {name} has {expected} fields but the pattern expects {found} fields")]
  WrongFieldCount {
    location: Location,
    name    : IString,
    expected: usize,
    found   : usize,
  },

  #[error("{location}: type {name} has no field {field}")]
  UnknownField {
    location: Location,
    name    : IString,
    field   : IString,
  },

  #[error("{location}: at most one splat is allowed in a tuple or sequence pattern")]
  MultipleSplats { location: Location },

  #[error("{location}: unrecognized pattern syntax")]
  UnrecognizedPattern { location: Location },

  #[error("{location}: expected a block of match cases")]
  UnrecognizedBlock { location: Location },

  #[error("{location}: expected pattern => result")]
  UnrecognizedCase { location: Location },

  #[error("{location}: pattern variable {name} is not bound on every path to this use")]
  UndefinedPatternVariable { location: Location, name: IString },
}

impl CompileError {
  pub fn location(&self) -> &Location {
    match self {
      CompileError::UnresolvedType { location, .. }
      | CompileError::NonType { location, .. }
      | CompileError::DuplicateNamedField { location, .. }
      | CompileError::MixedFieldStyle { location }
      | CompileError::WrongFieldCount { location, .. }
      | CompileError::UnknownField { location, .. }
      | CompileError::MultipleSplats { location }
      | CompileError::UnrecognizedPattern { location }
      | CompileError::UnrecognizedBlock { location }
      | CompileError::UnrecognizedCase { location }
      | CompileError::UndefinedPatternVariable { location, .. } => location,
    }
  }
}

/// Non-fatal diagnostics. Compilation continues; the caller decides what to surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
  /// Action selection never chose this arm: no input can reach it.
  UnreachableArm { location: Location, arm_number: usize },
}

impl std::fmt::Display for Warning {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Warning::UnreachableArm { location, arm_number } => {
        write!(f, "{}: arm {} is unreachable", location, arm_number)
      }
    }
  }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RuntimeError {
  /// No arm matched; carries the scrutinee.
  #[error("no pattern matched {0}")]
  MatchFailure(Value),

  #[error("undefined variable {name}")]
  UndefinedVariable { name: IString },

  /// A type name resolved to a different type at run time than at compile time.
  #[error("the name {name} no longer refers to the type it named at compile time")]
  TypeBindingChanged { name: IString },

  #[error("type error at run time: {message}")]
  WrongType { message: String },
}
