/*!

The surface AST the compiler consumes. Patterns are not a separate grammar: an arm's left-hand
side is an ordinary expression tree that the binder reinterprets through its dispatch table, the
way the source macro system receives host expressions. The same tree also carries guards, arm
results, and the handful of projection forms the emitter produces (`Index`, `SubSequence`,
`Length`, `IsType`), so one evaluator can run everything.

Structural equality and hashing ignore source locations throughout: two nodes are equal when
their kinds are equal. Locations exist for diagnostics only.

*/

use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;

use matchc_abs::{join_string, IString};

use crate::api::oracle::TypeHandle;

pub type BxExprAST = Box<ExprAST>;

/// A `file:line` source position, carried by every AST node and every bound pattern. Never part
/// of the equality or hashing of the nodes that carry it; two `Location`s themselves compare by
/// position.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Location {
  pub file: IString,
  pub line: u32,
}

impl Location {
  pub fn new(file: &str, line: u32) -> Self {
    Location {
      file: IString::from(file),
      line,
    }
  }
}

impl std::fmt::Display for Location {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}:{}", self.file, self.line)
  }
}

/// A literal constant. Floats are wrapped so that literals are `Eq + Hash`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum LiteralValue {
  Nothing,
  Int(i64),
  Float(OrderedFloat<f64>),
  Bool(bool),
  Str(IString),
  Symbol(IString),
}

impl std::fmt::Display for LiteralValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      LiteralValue::Nothing   => write!(f, "nothing"),
      LiteralValue::Int(i)    => write!(f, "{}", i),
      LiteralValue::Float(x)  => write!(f, "{}", x),
      LiteralValue::Bool(b)   => write!(f, "{}", b),
      LiteralValue::Str(s)    => write!(f, "{:?}", s.as_ref()),
      LiteralValue::Symbol(s) => write!(f, ":{}", s),
    }
  }
}

/// Comparison operators usable in guards; also the operator of a bound relational test.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RelationalOp {
  Equal,
  NotEqual,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
}

impl std::fmt::Display for RelationalOp {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let text = match self {
      RelationalOp::Equal        => "==",
      RelationalOp::NotEqual     => "!=",
      RelationalOp::Less         => "<",
      RelationalOp::LessEqual    => "<=",
      RelationalOp::Greater      => ">",
      RelationalOp::GreaterEqual => ">=",
    };
    write!(f, "{}", text)
  }
}

/// Arithmetic operators usable in guards and arm results.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ArithOp {
  Add,
  Sub,
  Mul,
}

impl std::fmt::Display for ArithOp {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let text = match self {
      ArithOp::Add => "+",
      ArithOp::Sub => "-",
      ArithOp::Mul => "*",
    };
    write!(f, "{}", text)
  }
}

/// An argument at a call site. Constructor patterns must be all positional or all named.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum CallArgAST {
  Positional(ExprAST),
  Named { name: IString, value: ExprAST },
}

#[derive(Clone, Debug)]
pub struct ExprAST {
  pub location: Location,
  pub kind    : ExprASTKind,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ExprASTKind {
  Literal(LiteralValue),
  /// A quoted host AST node. Matches by literal (structural) equality only.
  Quoted(BxExprAST),
  Identifier(IString),
  /// `$e` / `$(e)`: in pattern position, equality against the evaluated expression.
  Interpolation(BxExprAST),
  /// `head(args...)`: a constructor pattern on the left of `=>`, a host call elsewhere.
  Call { head: BxExprAST, args: Vec<CallArgAST> },
  Tuple(Vec<ExprAST>),
  Sequence(Vec<ExprAST>),
  /// `e...`, only valid directly inside a tuple or sequence pattern.
  Splat(BxExprAST),
  And(BxExprAST, BxExprAST),
  Or(BxExprAST, BxExprAST),
  Not(BxExprAST),
  Compare { op: RelationalOp, lhs: BxExprAST, rhs: BxExprAST },
  Arith { op: ArithOp, lhs: BxExprAST, rhs: BxExprAST },
  /// `pattern where guard`.
  Where { subject: BxExprAST, guard: BxExprAST },
  /// `subject::ty`, or a bare `::ty` when `subject` is `None`.
  TypeAssert { subject: Option<BxExprAST>, ty: BxExprAST },
  /// `pattern => result`.
  Arm { pattern: BxExprAST, result: BxExprAST },
  Block(Vec<ExprAST>),
  Assign { target: IString, value: BxExprAST },
  /// Field projection. Produced by the emitter for constructor patterns; usable in guards.
  Field { base: BxExprAST, name: IString },
  /// One-based projection; negative indices count from the end.
  Index { base: BxExprAST, index: i64 },
  /// The contiguous sub-sequence from `first` elements in to `from_end` elements before the end.
  SubSequence { base: BxExprAST, first: usize, from_end: usize },
  Length(BxExprAST),
  /// Runtime membership test against a resolved type. Produced by the emitter.
  IsType { subject: BxExprAST, ty: TypeHandle },
  /// Early-exit marker: behave as if the enclosing arm had not matched.
  MatchFail,
  /// Early-exit marker: finish the whole match with the given value.
  MatchReturn(BxExprAST),
}

impl PartialEq for ExprAST {
  fn eq(&self, other: &Self) -> bool {
    self.kind == other.kind
  }
}

impl Eq for ExprAST {}

impl Hash for ExprAST {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.kind.hash(state);
  }
}

impl ExprAST {
  pub fn new(location: Location, kind: ExprASTKind) -> Self {
    ExprAST { location, kind }
  }

  /// Does any node of this tree carry the `match_fail` marker? Quoted subtrees are opaque.
  pub fn contains_match_fail(&self) -> bool {
    use ExprASTKind::*;
    match &self.kind {
      MatchFail => true,
      Quoted(_) | Literal(_) | Identifier(_) => false,

      Interpolation(e) | Splat(e) | Not(e) | Length(e) | MatchReturn(e) => e.contains_match_fail(),

      Call { head, args } => {
        head.contains_match_fail()
            || args.iter().any(|arg| match arg {
                 CallArgAST::Positional(e) => e.contains_match_fail(),
                 CallArgAST::Named { value, .. } => value.contains_match_fail(),
               })
      }

      Tuple(items) | Sequence(items) | Block(items) => items.iter().any(ExprAST::contains_match_fail),

      And(a, b) | Or(a, b) => a.contains_match_fail() || b.contains_match_fail(),

      Compare { lhs, rhs, .. } | Arith { lhs, rhs, .. } => {
        lhs.contains_match_fail() || rhs.contains_match_fail()
      }

      Where { subject, guard } => subject.contains_match_fail() || guard.contains_match_fail(),

      TypeAssert { subject, ty } => {
        subject.as_ref().map_or(false, |s| s.contains_match_fail()) || ty.contains_match_fail()
      }

      Arm { pattern, result } => pattern.contains_match_fail() || result.contains_match_fail(),

      Assign { value, .. } => value.contains_match_fail(),

      Field { base, .. } | Index { base, .. } | SubSequence { base, .. } => base.contains_match_fail(),

      IsType { subject, .. } => subject.contains_match_fail(),
    }
  }
}

impl std::fmt::Display for ExprAST {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    use ExprASTKind::*;
    match &self.kind {
      Literal(lit)      => write!(f, "{}", lit),
      Quoted(e)         => write!(f, "quote({})", e),
      Identifier(name)  => write!(f, "{}", name),
      Interpolation(e)  => write!(f, "$({})", e),
      Call { head, args } => {
        let rendered: Vec<String> = args.iter()
            .map(|arg| match arg {
              CallArgAST::Positional(e) => e.to_string(),
              CallArgAST::Named { name, value } => format!("{}={}", name, value),
            })
            .collect();
        write!(f, "{}({})", head, rendered.join(", "))
      }
      Tuple(items)      => write!(f, "({})", join_string(items, ", ")),
      Sequence(items)   => write!(f, "[{}]", join_string(items, ", ")),
      Splat(e)          => write!(f, "{}...", e),
      And(a, b)         => write!(f, "{} && {}", a, b),
      Or(a, b)          => write!(f, "{} || {}", a, b),
      Not(e)            => write!(f, "!{}", e),
      Compare { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
      Arith { op, lhs, rhs }   => write!(f, "{} {} {}", lhs, op, rhs),
      Where { subject, guard } => write!(f, "{} where {}", subject, guard),
      TypeAssert { subject, ty } => match subject {
        Some(s) => write!(f, "{}::{}", s, ty),
        None    => write!(f, "::{}", ty),
      },
      Arm { pattern, result } => write!(f, "{} => {}", pattern, result),
      Block(items)      => write!(f, "begin {} end", join_string(items, "; ")),
      Assign { target, value } => write!(f, "{} = {}", target, value),
      Field { base, name }     => write!(f, "{}.{}", base, name),
      Index { base, index }    => write!(f, "{}[{}]", base, index),
      SubSequence { base, first, from_end } => write!(f, "{}[{}+1 .. end-{}]", base, first, from_end),
      Length(e)         => write!(f, "length({})", e),
      IsType { subject, ty }   => write!(f, "{} isa {:?}", subject, ty),
      MatchFail         => write!(f, "match_fail"),
      MatchReturn(e)    => write!(f, "match_return {}", e),
    }
  }
}

// region Construction helpers
//
// The surface parser is the host's problem; hosts (and this crate's tests) build trees through
// these.

impl ExprAST {
  pub fn int(location: Location, value: i64) -> Self {
    ExprAST::new(location, ExprASTKind::Literal(LiteralValue::Int(value)))
  }

  pub fn float(location: Location, value: f64) -> Self {
    ExprAST::new(location, ExprASTKind::Literal(LiteralValue::Float(OrderedFloat(value))))
  }

  pub fn bool(location: Location, value: bool) -> Self {
    ExprAST::new(location, ExprASTKind::Literal(LiteralValue::Bool(value)))
  }

  pub fn string(location: Location, value: &str) -> Self {
    ExprAST::new(location, ExprASTKind::Literal(LiteralValue::Str(IString::from(value))))
  }

  pub fn symbol(location: Location, name: &str) -> Self {
    ExprAST::new(location, ExprASTKind::Literal(LiteralValue::Symbol(IString::from(name))))
  }

  pub fn identifier(location: Location, name: &str) -> Self {
    ExprAST::new(location, ExprASTKind::Identifier(IString::from(name)))
  }

  /// The wildcard pattern is spelled `_`.
  pub fn wildcard(location: Location) -> Self {
    ExprAST::identifier(location, "_")
  }

  pub fn quoted(location: Location, inner: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Quoted(Box::new(inner)))
  }

  pub fn interpolation(location: Location, inner: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Interpolation(Box::new(inner)))
  }

  pub fn call(location: Location, head: ExprAST, args: Vec<CallArgAST>) -> Self {
    ExprAST::new(location, ExprASTKind::Call { head: Box::new(head), args })
  }

  pub fn tuple(location: Location, items: Vec<ExprAST>) -> Self {
    ExprAST::new(location, ExprASTKind::Tuple(items))
  }

  pub fn sequence(location: Location, items: Vec<ExprAST>) -> Self {
    ExprAST::new(location, ExprASTKind::Sequence(items))
  }

  pub fn splat(location: Location, inner: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Splat(Box::new(inner)))
  }

  pub fn and(location: Location, lhs: ExprAST, rhs: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::And(Box::new(lhs), Box::new(rhs)))
  }

  pub fn or(location: Location, lhs: ExprAST, rhs: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Or(Box::new(lhs), Box::new(rhs)))
  }

  pub fn not(location: Location, inner: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Not(Box::new(inner)))
  }

  pub fn compare(location: Location, op: RelationalOp, lhs: ExprAST, rhs: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Compare { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
  }

  pub fn arith(location: Location, op: ArithOp, lhs: ExprAST, rhs: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Arith { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
  }

  pub fn where_guard(location: Location, subject: ExprAST, guard: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Where { subject: Box::new(subject), guard: Box::new(guard) })
  }

  pub fn type_assert(location: Location, subject: Option<ExprAST>, ty: ExprAST) -> Self {
    ExprAST::new(
      location,
      ExprASTKind::TypeAssert { subject: subject.map(Box::new), ty: Box::new(ty) },
    )
  }

  pub fn arm(location: Location, pattern: ExprAST, result: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Arm { pattern: Box::new(pattern), result: Box::new(result) })
  }

  pub fn block(location: Location, items: Vec<ExprAST>) -> Self {
    ExprAST::new(location, ExprASTKind::Block(items))
  }

  pub fn assign(location: Location, target: &str, value: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::Assign { target: IString::from(target), value: Box::new(value) })
  }

  pub fn field(location: Location, base: ExprAST, name: &str) -> Self {
    ExprAST::new(location, ExprASTKind::Field { base: Box::new(base), name: IString::from(name) })
  }

  pub fn match_fail(location: Location) -> Self {
    ExprAST::new(location, ExprASTKind::MatchFail)
  }

  pub fn match_return(location: Location, value: ExprAST) -> Self {
    ExprAST::new(location, ExprASTKind::MatchReturn(Box::new(value)))
  }
}

// endregion Construction helpers

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equality_ignores_location() {
    let a = ExprAST::int(Location::new("a.jl", 1), 42);
    let b = ExprAST::int(Location::new("b.jl", 99), 42);
    assert_eq!(a, b);

    let c = ExprAST::int(Location::new("a.jl", 1), 43);
    assert_ne!(a, c);
  }

  #[test]
  fn match_fail_detection() {
    let location = Location::new("t.jl", 1);
    let plain = ExprAST::int(location.clone(), 1);
    assert!(!plain.contains_match_fail());

    let block = ExprAST::block(
      location.clone(),
      vec![ExprAST::match_fail(location.clone()), ExprAST::int(location.clone(), 2)],
    );
    assert!(block.contains_match_fail());

    // quoted subtrees are opaque
    let quoted = ExprAST::quoted(location.clone(), ExprAST::match_fail(location));
    assert!(!quoted.contains_match_fail());
  }
}
