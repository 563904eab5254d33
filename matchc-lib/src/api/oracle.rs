/*!

The type oracle: the compiler's only window onto user types. Four pure queries (resolution,
field layout, field typing, and the subtype/intersection lattice) are enough for the binder to
lower constructor patterns and for the simplifier to refine type tests.

`TypeTable` is a ready-made in-memory oracle: nominal types with ordered fields and declared
single-inheritance subtype edges. Hosts with a real type system implement [`TypeOracle`]
themselves.

*/

use once_cell::sync::Lazy;

use matchc_abs::{HashMap, HashSet, IString};

use crate::api::{
  ast::{ExprAST, ExprASTKind},
  error::CompileError,
};

static ANY_NAME     : Lazy<IString> = Lazy::new(|| IString::from("Any"));
static TUPLE_NAME   : Lazy<IString> = Lazy::new(|| IString::from("Tuple"));
static SEQUENCE_NAME: Lazy<IString> = Lazy::new(|| IString::from("Sequence"));

/// A resolved type. `User` handles are meaningful only to the oracle that issued them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeHandle {
  /// The top type; every value is a member.
  Any,
  Tuple,
  Sequence,
  User(u32),
}

pub trait TypeOracle {
  /// Maps a type expression to a type handle. Failure is reported at the expression's location.
  fn resolve_type(&self, expression: &ExprAST) -> Result<TypeHandle, CompileError>;

  fn type_name(&self, ty: TypeHandle) -> IString;

  /// Field names in positional-binding order. May return fewer names than the type's raw field
  /// list when the oracle chooses to hide synthetic fields. Empty for types without fields.
  fn field_names(&self, ty: TypeHandle) -> Vec<IString>;

  /// The declared type of a field; `Any` when unknown.
  fn field_type(&self, ty: TypeHandle, field: &IString) -> TypeHandle;

  fn subtype(&self, a: TypeHandle, b: TypeHandle) -> bool;

  /// The intersection of two types; `None` encodes the empty intersection.
  fn intersect(&self, a: TypeHandle, b: TypeHandle) -> Option<TypeHandle>;
}

struct TypeEntry {
  name     : IString,
  supertype: Option<TypeHandle>,
  /// `None` for abstract types, `Some` (possibly empty) for concrete ones.
  fields   : Option<Vec<(IString, TypeHandle)>>,
}

/// An in-memory nominal type oracle.
#[derive(Default)]
pub struct TypeTable {
  entries: Vec<TypeEntry>,
  by_name: HashMap<IString, u32>,
  /// Names that resolve to something other than a type.
  values : HashSet<IString>,
}

impl TypeTable {
  pub fn new() -> Self {
    Self::default()
  }

  fn define(&mut self, name: &str, supertype: Option<TypeHandle>, fields: Option<Vec<(IString, TypeHandle)>>) -> TypeHandle {
    let index = self.entries.len() as u32;
    let name = IString::from(name);
    self.entries.push(TypeEntry { name: name.clone(), supertype, fields });
    self.by_name.insert(name, index);
    TypeHandle::User(index)
  }

  /// Registers a concrete type with ordered fields.
  pub fn define_struct(&mut self, name: &str, supertype: Option<TypeHandle>, fields: &[(&str, TypeHandle)]) -> TypeHandle {
    let fields = fields.iter()
        .map(|(field, ty)| (IString::from(*field), *ty))
        .collect();
    self.define(name, supertype, Some(fields))
  }

  /// Registers an abstract type: resolvable and testable, but without fields.
  pub fn define_abstract(&mut self, name: &str, supertype: Option<TypeHandle>) -> TypeHandle {
    self.define(name, supertype, None)
  }

  /// Registers a name that exists in the module but does not name a type.
  pub fn define_value(&mut self, name: &str) {
    self.values.insert(IString::from(name));
  }

  fn entry(&self, ty: TypeHandle) -> Option<&TypeEntry> {
    match ty {
      TypeHandle::User(index) => self.entries.get(index as usize),
      _ => None,
    }
  }
}

impl TypeOracle for TypeTable {
  fn resolve_type(&self, expression: &ExprAST) -> Result<TypeHandle, CompileError> {
    match &expression.kind {
      ExprASTKind::Identifier(name) => {
        if *name == *ANY_NAME {
          return Ok(TypeHandle::Any);
        }
        if *name == *TUPLE_NAME {
          return Ok(TypeHandle::Tuple);
        }
        if *name == *SEQUENCE_NAME {
          return Ok(TypeHandle::Sequence);
        }
        if let Some(&index) = self.by_name.get(name) {
          return Ok(TypeHandle::User(index));
        }
        if self.values.contains(name) {
          return Err(CompileError::NonType {
            location: expression.location.clone(),
            name    : name.clone(),
          });
        }
        Err(CompileError::UnresolvedType {
          location: expression.location.clone(),
          name    : name.clone(),
        })
      }

      ExprASTKind::Literal(literal) => Err(CompileError::NonType {
        location: expression.location.clone(),
        name    : IString::from(literal.to_string().as_str()),
      }),

      _ => Err(CompileError::UnresolvedType {
        location: expression.location.clone(),
        name    : IString::from(expression.to_string().as_str()),
      }),
    }
  }

  fn type_name(&self, ty: TypeHandle) -> IString {
    match ty {
      TypeHandle::Any      => ANY_NAME.clone(),
      TypeHandle::Tuple    => TUPLE_NAME.clone(),
      TypeHandle::Sequence => SEQUENCE_NAME.clone(),
      TypeHandle::User(_)  => {
        self.entry(ty).map(|e| e.name.clone()).unwrap_or_else(|| IString::from("<unknown>"))
      }
    }
  }

  fn field_names(&self, ty: TypeHandle) -> Vec<IString> {
    self.entry(ty)
        .and_then(|e| e.fields.as_ref())
        .map(|fields| fields.iter().map(|(name, _)| name.clone()).collect())
        .unwrap_or_default()
  }

  fn field_type(&self, ty: TypeHandle, field: &IString) -> TypeHandle {
    self.entry(ty)
        .and_then(|e| e.fields.as_ref())
        .and_then(|fields| fields.iter().find(|(name, _)| name == field))
        .map(|(_, field_ty)| *field_ty)
        .unwrap_or(TypeHandle::Any)
  }

  fn subtype(&self, a: TypeHandle, b: TypeHandle) -> bool {
    if a == b || b == TypeHandle::Any {
      return true;
    }
    // Walk a's supertype chain.
    let mut current = a;
    while let Some(entry) = self.entry(current) {
      match entry.supertype {
        Some(supertype) if supertype == b => return true,
        Some(supertype) => current = supertype,
        None => break,
      }
    }
    false
  }

  fn intersect(&self, a: TypeHandle, b: TypeHandle) -> Option<TypeHandle> {
    if self.subtype(a, b) {
      Some(a)
    } else if self.subtype(b, a) {
      Some(b)
    } else {
      // Supertype chains are single-inheritance, so unrelated types cannot share a member.
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ast::Location;

  fn location() -> Location {
    Location::new("oracle.jl", 1)
  }

  #[test]
  fn resolution() {
    let mut table = TypeTable::new();
    let shape = table.define_abstract("Shape", None);
    let circle = table.define_struct("Circle", Some(shape), &[("radius", TypeHandle::Any)]);
    table.define_value("pi");

    let resolve = |name: &str| table.resolve_type(&ExprAST::identifier(location(), name));

    assert_eq!(resolve("Circle").unwrap(), circle);
    assert_eq!(resolve("Any").unwrap(), TypeHandle::Any);
    assert!(matches!(resolve("pi"), Err(CompileError::NonType { .. })));
    assert!(matches!(resolve("Nope"), Err(CompileError::UnresolvedType { .. })));
  }

  #[test]
  fn lattice() {
    let mut table = TypeTable::new();
    let shape  = table.define_abstract("Shape", None);
    let circle = table.define_struct("Circle", Some(shape), &[]);
    let square = table.define_struct("Square", Some(shape), &[]);

    assert!(table.subtype(circle, shape));
    assert!(table.subtype(circle, TypeHandle::Any));
    assert!(!table.subtype(shape, circle));
    assert!(!table.subtype(circle, square));

    assert_eq!(table.intersect(circle, shape), Some(circle));
    assert_eq!(table.intersect(shape, circle), Some(circle));
    assert_eq!(table.intersect(circle, square), None);
    assert_eq!(table.intersect(TypeHandle::Tuple, TypeHandle::Sequence), None);
    assert_eq!(table.intersect(TypeHandle::Tuple, TypeHandle::Any), Some(TypeHandle::Tuple));
  }

  #[test]
  fn fields() {
    let mut table = TypeTable::new();
    let point = table.define_struct("Point", None, &[("x", TypeHandle::Any), ("y", TypeHandle::Any)]);

    let names = table.field_names(point);
    assert_eq!(names, vec![IString::from("x"), IString::from("y")]);
    assert_eq!(table.field_type(point, &IString::from("x")), TypeHandle::Any);
    assert!(table.field_names(TypeHandle::Tuple).is_empty());
  }
}
