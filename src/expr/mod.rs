mod error;
mod parse;

pub use error::{ExprError, ExprResult};
pub use parse::parse_predicate;

use crate::record::{Record, RecordResult, Schema, Value};
use std::fmt;

/// Boolean and comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    And,
    Or,
    Eq,
    Lt,
}

impl Operator {
    pub fn arity(&self) -> usize {
        match self {
            Operator::Not => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Not => "!",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Eq => "==",
            Operator::Lt => "<",
        };
        f.write_str(symbol)
    }
}

/// A predicate expression tree.
///
/// Every node uniquely owns its children; evaluation is a pure recursive
/// walk producing a fresh [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value
    Const(Value),
    /// The value of the record attribute with this index
    AttrRef(usize),
    /// An operator applied to its arguments
    Op(Operator, Vec<Expr>),
}

impl Expr {
    pub fn constant(value: Value) -> Self {
        Expr::Const(value)
    }

    pub fn attr(idx: usize) -> Self {
        Expr::AttrRef(idx)
    }

    pub fn not(arg: Expr) -> Self {
        Expr::Op(Operator::Not, vec![arg])
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::And, vec![left, right])
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::Or, vec![left, right])
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::Eq, vec![left, right])
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::Lt, vec![left, right])
    }
}

/// Evaluate an expression against a record.
///
/// Comparison operands must agree on type; boolean operators demand boolean
/// operands. Attribute references decode through the schema, so a bad index
/// surfaces as `RecordError::InvalidAttribute`.
pub fn eval(record: &Record, schema: &Schema, expr: &Expr) -> RecordResult<Value> {
    match expr {
        Expr::Const(value) => Ok(value.clone()),
        Expr::AttrRef(idx) => record.get_attr(schema, *idx),
        Expr::Op(op, args) => match (op, args.as_slice()) {
            (Operator::Not, [arg]) => {
                let value = eval(record, schema, arg)?;
                match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    _ => Err(ExprError::OperandNotBoolean.into()),
                }
            }
            (Operator::And, [left, right]) => {
                let left = eval(record, schema, left)?;
                let right = eval(record, schema, right)?;
                bool_pair(left, right).map(|(a, b)| Value::Bool(a && b))
            }
            (Operator::Or, [left, right]) => {
                let left = eval(record, schema, left)?;
                let right = eval(record, schema, right)?;
                bool_pair(left, right).map(|(a, b)| Value::Bool(a || b))
            }
            (Operator::Eq, [left, right]) => {
                let left = eval(record, schema, left)?;
                let right = eval(record, schema, right)?;
                Ok(Value::Bool(value_equals(&left, &right)?))
            }
            (Operator::Lt, [left, right]) => {
                let left = eval(record, schema, left)?;
                let right = eval(record, schema, right)?;
                Ok(Value::Bool(value_smaller(&left, &right)?))
            }
            (op, args) => Err(ExprError::WrongArity {
                op: *op,
                expected: op.arity(),
                found: args.len(),
            }
            .into()),
        },
    }
}

fn bool_pair(left: Value, right: Value) -> RecordResult<(bool, bool)> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok((a, b)),
        _ => Err(ExprError::OperandNotBoolean.into()),
    }
}

/// Value equality; strings compare bytewise
fn value_equals(left: &Value, right: &Value) -> ExprResult<bool> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Float(a), Value::Float(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::String(a), Value::String(b)) => Ok(a == b),
        _ => Err(ExprError::ComparedDifferentTypes {
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

/// Strict ordering: numeric for Int/Float, false < true for Bool,
/// lexicographic bytewise for strings
fn value_smaller(left: &Value, right: &Value) -> ExprResult<bool> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a < b),
        (Value::Float(a), Value::Float(b)) => Ok(a < b),
        (Value::Bool(a), Value::Bool(b)) => Ok(!a & b),
        (Value::String(a), Value::String(b)) => Ok(a < b),
        _ => Err(ExprError::ComparedDifferentTypes {
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}
