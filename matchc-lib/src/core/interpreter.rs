/*!

A small dynamic runtime that executes compiled matches. The emitted statement list is host code;
this crate is its own host, so the interpreter here is what tests (and embedders without a real
host) run it on.

A run evaluates statements under a fresh frame layered over the interpreter's globals. Every
match-internal temporary, arm-local assignment, and guard result lives in the frame and is
discarded when the run ends; only the names a compiled artifact explicitly exports are copied
back into the globals, and only when the matching path actually assigned them.

*/

use matchc_abs::{HashMap, IString};

use crate::{
  api::{
    ast::{ArithOp, ExprAST, ExprASTKind, LiteralValue, RelationalOp},
    error::RuntimeError,
    oracle::{TypeHandle, TypeOracle},
  },
  core::emit::{CompiledMatch, Statement},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Nothing,
  Int(i64),
  Float(f64),
  Bool(bool),
  Str(IString),
  Symbol(IString),
  Tuple(Vec<Value>),
  Sequence(Vec<Value>),
  Struct {
    ty    : TypeHandle,
    fields: Vec<(IString, Value)>,
  },
  Quoted(Box<ExprAST>),
}

impl Value {
  pub fn string(text: &str) -> Value {
    Value::Str(IString::from(text))
  }

  pub fn symbol(name: &str) -> Value {
    Value::Symbol(IString::from(name))
  }

  /// Convenience constructor for struct values.
  pub fn structure(ty: TypeHandle, fields: &[(&str, Value)]) -> Value {
    Value::Struct {
      ty,
      fields: fields.iter().map(|(name, value)| (IString::from(*name), value.clone())).collect(),
    }
  }

  /// The runtime type used by `IsType`: structs know their type, tuples and sequences are the
  /// builtin kinds, everything else is only a member of `Any`.
  fn type_of(&self) -> TypeHandle {
    match self {
      Value::Struct { ty, .. } => *ty,
      Value::Tuple(_) => TypeHandle::Tuple,
      Value::Sequence(_) => TypeHandle::Sequence,
      _ => TypeHandle::Any,
    }
  }

  fn as_number(&self) -> Option<f64> {
    match self {
      Value::Int(i) => Some(*i as f64),
      Value::Float(x) => Some(*x),
      _ => None,
    }
  }
}

impl std::fmt::Display for Value {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Value::Nothing => write!(f, "nothing"),
      Value::Int(i) => write!(f, "{}", i),
      Value::Float(x) => write!(f, "{}", x),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Str(s) => write!(f, "{:?}", s.as_ref()),
      Value::Symbol(s) => write!(f, ":{}", s),
      Value::Tuple(items) => {
        write!(f, "({})", matchc_abs::join_string(items, ", "))
      }
      Value::Sequence(items) => {
        write!(f, "[{}]", matchc_abs::join_string(items, ", "))
      }
      Value::Struct { ty, fields } => {
        let rendered: Vec<String> =
            fields.iter().map(|(name, value)| format!("{}={}", name, value)).collect();
        write!(f, "{:?}({})", ty, rendered.join(", "))
      }
      Value::Quoted(e) => write!(f, "quote({})", e),
    }
  }
}

/// Equality as the emitted `==` sees it: numerics compare by value across `Int`/`Float`,
/// everything else structurally.
fn values_equal(left: &Value, right: &Value) -> bool {
  if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
    return a == b;
  }
  left == right
}

pub struct Interpreter<'o> {
  oracle : &'o dyn TypeOracle,
  globals: HashMap<IString, Value>,
}

impl<'o> Interpreter<'o> {
  pub fn new(oracle: &'o dyn TypeOracle) -> Self {
    Interpreter {
      oracle,
      globals: HashMap::new(),
    }
  }

  pub fn set_global(&mut self, name: &str, value: Value) {
    self.globals.insert(IString::from(name), value);
  }

  pub fn global(&self, name: &str) -> Option<&Value> {
    self.globals.get(&IString::from(name))
  }

  /// Executes a compiled match to completion and returns its value.
  pub fn run(&mut self, compiled: &CompiledMatch) -> Result<Value, RuntimeError> {
    let mut frame: HashMap<IString, Value> = HashMap::new();

    let mut labels: HashMap<IString, usize> = HashMap::new();
    for (position, statement) in compiled.statements.iter().enumerate() {
      if let Statement::Label(label) = statement {
        labels.insert(label.clone(), position);
      }
    }
    let resolve_label = |label: &IString| -> Result<usize, RuntimeError> {
      labels.get(label).copied().ok_or_else(|| RuntimeError::WrongType {
        message: format!("jump to unknown label {}", label),
      })
    };

    let mut pc = 0usize;
    while pc < compiled.statements.len() {
      match &compiled.statements[pc] {
        Statement::Assign { target, value } => {
          let value = self.eval(value, &mut frame)?;
          frame.insert(target.clone(), value);
        }

        Statement::Label(_) | Statement::SourceNote(_) => {}

        Statement::Jump(label) => {
          pc = resolve_label(label)?;
          continue;
        }

        Statement::JumpUnless { condition, target } => {
          let value = self.eval(condition, &mut frame)?;
          if !truthy(&value)? {
            pc = resolve_label(target)?;
            continue;
          }
        }

        Statement::TypeAssertion { expression, expected, .. } => {
          let resolved = self.oracle.resolve_type(expression).ok();
          if resolved != Some(*expected) {
            return Err(RuntimeError::TypeBindingChanged {
              name: IString::from(expression.to_string().as_str()),
            });
          }
        }

        Statement::FailMatch { input } => {
          let scrutinee = frame.get(input).cloned().unwrap_or(Value::Nothing);
          return Err(RuntimeError::MatchFailure(scrutinee));
        }

        Statement::Eval(expression) => {
          self.eval(expression, &mut frame)?;
        }
      }
      pc += 1;
    }

    // Only successful paths assign the exported names, so presence in the frame is consent.
    for name in &compiled.exports {
      if let Some(value) = frame.get(name) {
        self.globals.insert(name.clone(), value.clone());
      }
    }

    frame.get(&compiled.result_var).cloned().ok_or_else(|| RuntimeError::WrongType {
      message: "compiled match finished without a result".to_string(),
    })
  }

  fn eval(&self, expr: &ExprAST, frame: &mut HashMap<IString, Value>) -> Result<Value, RuntimeError> {
    use ExprASTKind::*;

    match &expr.kind {
      Literal(literal) => Ok(match literal {
        LiteralValue::Nothing => Value::Nothing,
        LiteralValue::Int(i) => Value::Int(*i),
        LiteralValue::Float(x) => Value::Float(x.into_inner()),
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Str(s) => Value::Str(s.clone()),
        LiteralValue::Symbol(s) => Value::Symbol(s.clone()),
      }),

      Quoted(inner) => Ok(Value::Quoted(inner.clone())),

      Identifier(name) => frame
          .get(name)
          .or_else(|| self.globals.get(name))
          .cloned()
          .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() }),

      Interpolation(inner) => self.eval(inner, frame),

      Tuple(items) => Ok(Value::Tuple(self.eval_all(items, frame)?)),
      Sequence(items) => Ok(Value::Sequence(self.eval_all(items, frame)?)),

      Not(inner) => {
        let value = self.eval(inner, frame)?;
        Ok(Value::Bool(!truthy(&value)?))
      }

      And(left, right) => {
        let left = self.eval(left, frame)?;
        if !truthy(&left)? {
          return Ok(Value::Bool(false));
        }
        let right = self.eval(right, frame)?;
        Ok(Value::Bool(truthy(&right)?))
      }

      Or(left, right) => {
        let left = self.eval(left, frame)?;
        if truthy(&left)? {
          return Ok(Value::Bool(true));
        }
        let right = self.eval(right, frame)?;
        Ok(Value::Bool(truthy(&right)?))
      }

      Compare { op, lhs, rhs } => {
        let left = self.eval(lhs, frame)?;
        let right = self.eval(rhs, frame)?;
        compare_values(*op, &left, &right)
      }

      Arith { op, lhs, rhs } => {
        let left = self.eval(lhs, frame)?;
        let right = self.eval(rhs, frame)?;
        arith_values(*op, &left, &right)
      }

      Field { base, name } => {
        let base = self.eval(base, frame)?;
        match base {
          Value::Struct { fields, .. } => fields
              .iter()
              .find(|(field, _)| field == name)
              .map(|(_, value)| value.clone())
              .ok_or_else(|| RuntimeError::WrongType {
                message: format!("value has no field {}", name),
              }),
          other => Err(RuntimeError::WrongType {
            message: format!("cannot project field {} from {}", name, other),
          }),
        }
      }

      Index { base, index } => {
        let base = self.eval(base, frame)?;
        let items = collection_items(&base)?;
        let position = if *index > 0 {
          (*index - 1) as usize
        } else {
          let from_end = items.len() as i64 + *index;
          if from_end < 0 {
            return Err(RuntimeError::WrongType {
              message: format!("index {} out of bounds for length {}", index, items.len()),
            });
          }
          from_end as usize
        };
        items.get(position).cloned().ok_or_else(|| RuntimeError::WrongType {
          message: format!("index {} out of bounds for length {}", index, items.len()),
        })
      }

      SubSequence { base, first, from_end } => {
        let base = self.eval(base, frame)?;
        let items = collection_items(&base)?;
        if items.len() < first + from_end {
          return Err(RuntimeError::WrongType {
            message: format!("cannot slice {} elements from length {}", first + from_end, items.len()),
          });
        }
        let slice = items[*first..items.len() - from_end].to_vec();
        Ok(match base {
          Value::Tuple(_) => Value::Tuple(slice),
          _ => Value::Sequence(slice),
        })
      }

      Length(inner) => {
        let value = self.eval(inner, frame)?;
        let items = collection_items(&value)?;
        Ok(Value::Int(items.len() as i64))
      }

      IsType { subject, ty } => {
        let value = self.eval(subject, frame)?;
        Ok(Value::Bool(self.oracle.subtype(value.type_of(), *ty)))
      }

      Assign { target, value } => {
        let value = self.eval(value, frame)?;
        frame.insert(target.clone(), value.clone());
        Ok(value)
      }

      Block(items) => {
        let mut last = Value::Nothing;
        for item in items {
          last = self.eval(item, frame)?;
        }
        Ok(last)
      }

      Call { head, .. } => Err(RuntimeError::WrongType {
        message: format!("cannot call {} at run time", head),
      }),

      Splat(_) | Where { .. } | TypeAssert { .. } | Arm { .. } | MatchFail | MatchReturn(_) => {
        Err(RuntimeError::WrongType {
          message: format!("{} is not a runtime expression", expr),
        })
      }
    }
  }

  fn eval_all(&self, items: &[ExprAST], frame: &mut HashMap<IString, Value>) -> Result<Vec<Value>, RuntimeError> {
    items.iter().map(|item| self.eval(item, frame)).collect()
  }
}

fn truthy(value: &Value) -> Result<bool, RuntimeError> {
  match value {
    Value::Bool(b) => Ok(*b),
    other => Err(RuntimeError::WrongType {
      message: format!("expected a boolean, found {}", other),
    }),
  }
}

fn collection_items(value: &Value) -> Result<&Vec<Value>, RuntimeError> {
  match value {
    Value::Tuple(items) | Value::Sequence(items) => Ok(items),
    other => Err(RuntimeError::WrongType {
      message: format!("{} is not a tuple or sequence", other),
    }),
  }
}

fn compare_values(op: RelationalOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
  use RelationalOp::*;

  match op {
    Equal => return Ok(Value::Bool(values_equal(left, right))),
    NotEqual => return Ok(Value::Bool(!values_equal(left, right))),
    _ => {}
  }

  let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
    return Err(RuntimeError::WrongType {
      message: format!("cannot order {} and {}", left, right),
    });
  };
  let result = match op {
    Less => a < b,
    LessEqual => a <= b,
    Greater => a > b,
    GreaterEqual => a >= b,
    Equal | NotEqual => unreachable!(),
  };
  Ok(Value::Bool(result))
}

fn arith_values(op: ArithOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
  if let (Value::Int(a), Value::Int(b)) = (left, right) {
    return Ok(Value::Int(match op {
      ArithOp::Add => a + b,
      ArithOp::Sub => a - b,
      ArithOp::Mul => a * b,
    }));
  }

  let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
    return Err(RuntimeError::WrongType {
      message: format!("cannot apply {} to {} and {}", op, left, right),
    });
  };
  Ok(Value::Float(match op {
    ArithOp::Add => a + b,
    ArithOp::Sub => a - b,
    ArithOp::Mul => a * b,
  }))
}
