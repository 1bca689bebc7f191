use super::Operator;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("Cannot compare {left} with {right}")]
    ComparedDifferentTypes {
        left: &'static str,
        right: &'static str,
    },

    #[error("Boolean operator applied to a non-boolean operand")]
    OperandNotBoolean,

    #[error("Predicate did not evaluate to a boolean")]
    PredicateNotBoolean,

    #[error("Operator {op} takes {expected} arguments, got {found}")]
    WrongArity {
        op: Operator,
        expected: usize,
        found: usize,
    },
}

pub type ExprResult<T> = Result<T, ExprError>;
