//! Arithmetic semantics shared by the scheduler, the in-process workers and
//! the remote agent.
//!
//! Operations are IEEE-754 64-bit floating point. Division by zero is an
//! error, not infinity. Operation symbols arrive as strings on the wire, so
//! dispatch is string-keyed and unrecognized symbols are reported as errors
//! rather than rejected at decode time.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Op::Add),
            "-" => Some(Op::Sub),
            "*" => Some(Op::Mul),
            "/" => Some(Op::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
        }
    }

    /// Binding strength for the shunting-yard pass. All operators are
    /// left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div => 2,
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub fn apply(op: Op, arg1: f64, arg2: f64) -> Result<f64, ComputeError> {
    match op {
        Op::Add => Ok(arg1 + arg2),
        Op::Sub => Ok(arg1 - arg2),
        Op::Mul => Ok(arg1 * arg2),
        Op::Div => {
            if arg2 == 0.0 {
                Err(ComputeError::DivisionByZero)
            } else {
                Ok(arg1 / arg2)
            }
        }
    }
}

/// Evaluates one task as it appears on the wire: operation symbol plus two
/// operand strings that are expected to be numeric literals.
pub fn evaluate(operation: &str, arg1: &str, arg2: &str) -> Result<f64, ComputeError> {
    let op = Op::from_symbol(operation)
        .ok_or_else(|| ComputeError::UnknownOperation(operation.to_string()))?;

    let a = arg1
        .parse::<f64>()
        .map_err(|_| ComputeError::InvalidArgument(arg1.to_string()))?;
    let b = arg2
        .parse::<f64>()
        .map_err(|_| ComputeError::InvalidArgument(arg2.to_string()))?;

    apply(op, a, b)
}
