/*!

The public API of the library: the surface AST, the type oracle, errors and warnings, the
compilation entry points, and the runtime pieces an embedder touches.

*/

pub mod ast;
pub mod compile;
pub mod error;
pub mod oracle;

pub use compile::{compile_assignment, compile_is_match, compile_match, compile_match_reference};

pub use crate::core::{
  emit::{CompiledMatch, Statement},
  interpreter::{Interpreter, Value},
};
