use super::tokenizer::Token;
use super::ParseError;
use crate::ops::Op;

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Number {
        lexeme: String,
        value: f64,
    },
    BinOp {
        op: Op,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
}

impl AstNode {
    fn number(lexeme: String) -> Result<Self, ParseError> {
        let value = lexeme
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber(lexeme.clone()))?;
        Ok(AstNode::Number { lexeme, value })
    }

    /// Number of operator nodes in the tree; one task is created per
    /// operator.
    pub fn operator_count(&self) -> usize {
        match self {
            AstNode::Number { .. } => 0,
            AstNode::BinOp { left, right, .. } => 1 + left.operator_count() + right.operator_count(),
        }
    }
}

enum StackOp {
    Operator(Op),
    LParen,
}

/// Shunting-yard over the token stream. All operators are left-associative;
/// `*` and `/` bind tighter than `+` and `-`.
pub fn build_ast(tokens: Vec<Token>) -> Result<AstNode, ParseError> {
    let mut output: Vec<AstNode> = Vec::new();
    let mut operators: Vec<StackOp> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(lexeme) => output.push(AstNode::number(lexeme)?),

            Token::Operator(op) => {
                while let Some(StackOp::Operator(top)) = operators.last() {
                    if top.precedence() >= op.precedence() {
                        let top = *top;
                        operators.pop();
                        combine(&mut output, top)?;
                    } else {
                        break;
                    }
                }
                operators.push(StackOp::Operator(op));
            }

            Token::LParen => operators.push(StackOp::LParen),

            Token::RParen => {
                let mut closed = false;
                while let Some(entry) = operators.pop() {
                    match entry {
                        StackOp::LParen => {
                            closed = true;
                            break;
                        }
                        StackOp::Operator(op) => combine(&mut output, op)?,
                    }
                }
                if !closed {
                    return Err(ParseError::UnbalancedParens);
                }
            }
        }
    }

    while let Some(entry) = operators.pop() {
        match entry {
            StackOp::LParen => return Err(ParseError::UnbalancedParens),
            StackOp::Operator(op) => combine(&mut output, op)?,
        }
    }

    if output.len() != 1 {
        return Err(ParseError::Malformed);
    }

    Ok(output.remove(0))
}

fn combine(output: &mut Vec<AstNode>, op: Op) -> Result<(), ParseError> {
    let right = output.pop().ok_or(ParseError::Malformed)?;
    let left = output.pop().ok_or(ParseError::Malformed)?;
    output.push(AstNode::BinOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    });
    Ok(())
}
