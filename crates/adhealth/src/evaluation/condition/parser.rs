use super::interpreter::Operand;
use super::lexer::{tokenize, CompareOp, Spanned, Token};
use super::ConditionError;

/// Parsed condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Operand),
    Identifier(String),
    /// Element count of a sequence output.
    Count,
    /// True when at least one element of a sequence output satisfies the inner condition.
    Any(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Deepest nesting a condition may reach, counting parentheses, `NOT`,
/// `Any(...)`, comparisons and chained `AND`/`OR` operators.
pub(crate) const MAX_DEPTH: usize = 128;

pub(crate) fn parse(source: &str) -> Result<Expr, ConditionError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ConditionError::Syntax {
            offset: 0,
            message: "empty condition".to_string(),
        });
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let (expr, _) = parser.or()?;

    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(ConditionError::Syntax {
            offset: extra.offset,
            message: format!("unexpected {:?} after complete condition", extra.token),
        });
    }

    Ok(expr)
}

/// Each production returns its subtree with the subtree's height.
type Parsed = (Expr, usize);

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let spanned = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(spanned)
    }

    fn too_deep(&self) -> ConditionError {
        let offset = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map_or(0, |spanned| spanned.offset);
        ConditionError::Syntax {
            offset,
            message: "condition nested too deeply".to_string(),
        }
    }

    fn bounded(&self, height: usize) -> Result<usize, ConditionError> {
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(height)
    }

    fn nested<T>(
        &mut self,
        production: impl FnOnce(&mut Self) -> Result<T, ConditionError>,
    ) -> Result<T, ConditionError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let parsed = production(self);
        self.depth -= 1;
        parsed
    }

    fn expect_close(&mut self) -> Result<(), ConditionError> {
        match self.advance() {
            Some(Spanned {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Some(other) => Err(ConditionError::Syntax {
                offset: other.offset,
                message: format!("expected ')' but found {:?}", other.token),
            }),
            None => Err(ConditionError::UnexpectedEnd),
        }
    }

    fn or(&mut self) -> Result<Parsed, ConditionError> {
        let (mut left, mut height) = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let (right, right_height) = self.and()?;
            height = self.bounded(height.max(right_height) + 1)?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok((left, height))
    }

    fn and(&mut self) -> Result<Parsed, ConditionError> {
        let (mut left, mut height) = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let (right, right_height) = self.unary()?;
            height = self.bounded(height.max(right_height) + 1)?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok((left, height))
    }

    fn unary(&mut self) -> Result<Parsed, ConditionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let (inner, height) = self.nested(Self::unary)?;
            let height = self.bounded(height + 1)?;
            return Ok((Expr::Not(Box::new(inner)), height));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Parsed, ConditionError> {
        let (left, left_height) = self.operand()?;
        if let Some(Token::Compare(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let (right, right_height) = self.operand()?;
            let height = self.bounded(left_height.max(right_height) + 1)?;
            return Ok((
                Expr::Compare {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                height,
            ));
        }
        Ok((left, left_height))
    }

    fn operand(&mut self) -> Result<Parsed, ConditionError> {
        let Some(spanned) = self.advance() else {
            return Err(ConditionError::UnexpectedEnd);
        };
        let offset = spanned.offset;

        let leaf = match spanned.token.clone() {
            Token::Number(value) => Expr::Literal(Operand::Number(value)),
            Token::Str(text) => Expr::Literal(Operand::Text(text)),
            Token::True => Expr::Literal(Operand::Bool(true)),
            Token::False => Expr::Literal(Operand::Bool(false)),
            Token::Null => Expr::Literal(Operand::Null),
            Token::LParen => {
                let parsed = self.nested(Self::or)?;
                self.expect_close()?;
                return Ok(parsed);
            }
            Token::Ident(name)
                if name.eq_ignore_ascii_case("any") && self.peek() == Some(&Token::LParen) =>
            {
                self.pos += 1;
                let (inner, height) = self.nested(Self::or)?;
                self.expect_close()?;
                let height = self.bounded(height + 1)?;
                return Ok((Expr::Any(Box::new(inner)), height));
            }
            Token::Ident(name) if name.eq_ignore_ascii_case("count") => Expr::Count,
            Token::Ident(name) => Expr::Identifier(name),
            other => {
                return Err(ConditionError::Syntax {
                    offset,
                    message: format!("expected a value but found {other:?}"),
                })
            }
        };
        Ok((leaf, 1))
    }
}
