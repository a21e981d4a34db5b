//! Recursive-descent parser for the LaTeX-notation RA dialect
//!
//! One left-associative precedence band for the binary operators (set
//! operations, joins, division) below the prefix unary operators
//! (π, σ, ρ, Γ, T). Each production raises its own `SyntaxErrorKind` at the
//! failure point, so the diagnosed kind is a deterministic function of the
//! failing production rather than a post-hoc classification.

use crate::ast::{
    AggregateFunction, Aggregation, BooleanExpression, ComparisonOp, Literal, Operand,
    RaExpression,
};
use crate::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use crate::lexer::{tokenize, SpannedToken, Token};
use relab_core::{Attribute, Position};

/// Parse RA source text into an expression tree.
///
/// Stops at the first syntax error; there is no recovery or continuation.
pub fn parse(source: &str) -> SyntaxResult<RaExpression> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(source, tokens);
    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    lines: Vec<String>,
    pos: usize,
}

impl Parser {
    fn new(source: &str, tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            lines: source.lines().map(|l| l.trim_end().to_string()).collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_second(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn span_of(tok: &SpannedToken) -> Position {
        Position::new(tok.line, tok.start_col, tok.end_col)
    }

    fn snippet(&self, line: u32) -> String {
        self.lines
            .get(line as usize - 1)
            .cloned()
            .unwrap_or_default()
    }

    fn error_at(&self, kind: SyntaxErrorKind, tok: &SpannedToken) -> SyntaxError {
        SyntaxError::new(kind, tok.line, tok.start_col, self.snippet(tok.line))
    }

    fn error_here(&self, kind: SyntaxErrorKind) -> SyntaxError {
        match self.peek() {
            Some(tok) => self.error_at(kind, &tok.clone()),
            None => {
                let (line, col) = self
                    .tokens
                    .last()
                    .map(|t| (t.line, t.end_col))
                    .unwrap_or((1, 1));
                SyntaxError::new(kind, line, col, self.snippet(line))
            }
        }
    }

    /// Consume one expected token or fail with `kind`
    fn expect(&mut self, expected: &Token, kind: SyntaxErrorKind) -> SyntaxResult<SpannedToken> {
        match self.peek() {
            Some(tok) if &tok.token == expected => Ok(self.advance().expect("token just peeked")),
            _ => Err(self.error_here(kind)),
        }
    }

    fn expect_end(&mut self) -> SyntaxResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(tok) if tok.token == Token::RParen => {
                Err(self.error_here(SyntaxErrorKind::MismatchedParenthesis))
            }
            Some(_) => Err(self.error_here(SyntaxErrorKind::UnexpectedToken)),
        }
    }

    // ---- expressions ------------------------------------------------------

    fn parse_expression(&mut self) -> SyntaxResult<RaExpression> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(tok) = self.peek() else { break };
            match tok.token {
                Token::Cup => left = self.binary(left, |l, r| l.union(r))?,
                Token::Cap => left = self.binary(left, |l, r| l.intersect(r))?,
                Token::Minus => left = self.binary(left, |l, r| l.difference(r))?,
                Token::Times => left = self.binary(left, |l, r| l.cartesian(r))?,
                Token::Div => left = self.binary(left, |l, r| l.divide(r))?,
                Token::Bowtie => left = self.binary(left, |l, r| l.natural_join(r))?,
                Token::Ltimes => left = self.binary(left, |l, r| l.semi_join(r))?,
                Token::AntiJoin => left = self.binary(left, |l, r| l.anti_join(r))?,
                Token::LeftOuterJoin => left = self.binary(left, |l, r| l.left_join(r))?,
                Token::RightOuterJoin => left = self.binary(left, |l, r| l.right_join(r))?,
                Token::FullOuterJoin => left = self.binary(left, |l, r| l.outer_join(r))?,
                Token::Overset => left = self.parse_theta_join(left)?,
                _ => break,
            }
        }
        Ok(left)
    }

    fn binary<F>(&mut self, left: RaExpression, build: F) -> SyntaxResult<RaExpression>
    where
        F: FnOnce(RaExpression, RaExpression) -> RaExpression,
    {
        let op = self.advance().expect("operator token just peeked");
        let right = self.parse_operand()?;
        Ok(build(left, right).with_position(Self::span_of(&op)))
    }

    /// Parse a unary-level operand, diagnosing a missing one
    fn parse_operand(&mut self) -> SyntaxResult<RaExpression> {
        match self.peek() {
            None => Err(self.error_here(SyntaxErrorKind::MissingOperand)),
            Some(tok) if is_binary_operator(&tok.token) => {
                Err(self.error_here(SyntaxErrorKind::MissingOperand))
            }
            _ => self.parse_unary(),
        }
    }

    fn parse_unary(&mut self) -> SyntaxResult<RaExpression> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.error_here(SyntaxErrorKind::UnexpectedEndOfInput));
        };
        match &tok.token {
            Token::Pi => self.parse_projection(),
            Token::Sigma => self.parse_selection(),
            Token::Rho => self.parse_rename(),
            Token::Gamma => self.parse_aggregation(),
            Token::Ident(name) if name == "T" && self.is_subscript_next() => self.parse_top_n(),
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(RaExpression::relation(name).with_position(Self::span_of(&tok)))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, SyntaxErrorKind::MismatchedParenthesis)?;
                Ok(inner)
            }
            Token::RParen => Err(self.error_at(SyntaxErrorKind::MismatchedParenthesis, &tok)),
            t if is_binary_operator(t) => Err(self.error_at(SyntaxErrorKind::MissingOperand, &tok)),
            _ => Err(self.error_at(SyntaxErrorKind::UnexpectedToken, &tok)),
        }
    }

    fn is_subscript_next(&self) -> bool {
        self.peek_second()
            .is_some_and(|t| t.token == Token::Underscore)
    }

    /// `_{` introducing a subscript, with a production-specific error kind
    fn expect_subscript(&mut self, kind: SyntaxErrorKind) -> SyntaxResult<()> {
        self.expect(&Token::Underscore, kind)?;
        self.expect(&Token::LBrace, kind)?;
        Ok(())
    }

    // ---- prefix productions ----------------------------------------------

    fn parse_projection(&mut self) -> SyntaxResult<RaExpression> {
        let op = self.advance().expect("pi token just peeked");
        self.expect_subscript(SyntaxErrorKind::MissingProjectionAttributes)?;

        let mut attributes = Vec::new();
        loop {
            if let Some(tok) = self.peek() {
                if tok.token == Token::RBrace {
                    if attributes.is_empty() {
                        return Err(self.error_here(SyntaxErrorKind::MissingProjectionAttributes));
                    }
                    self.advance();
                    break;
                }
            }
            let (attr, _) =
                self.parse_attribute(SyntaxErrorKind::MissingProjectionAttributes)?;
            attributes.push(attr);
            match self.peek().map(|t| &t.token) {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RBrace) => {}
                _ => return Err(self.error_here(SyntaxErrorKind::MissingComma)),
            }
        }

        let input = self.parse_operand()?;
        Ok(input
            .project(attributes)
            .with_position(Self::span_of(&op)))
    }

    fn parse_selection(&mut self) -> SyntaxResult<RaExpression> {
        let op = self.advance().expect("sigma token just peeked");
        self.expect_subscript(SyntaxErrorKind::MissingSelectionCondition)?;
        let condition = self.parse_condition(
            SyntaxErrorKind::MissingSelectionCondition,
            SyntaxErrorKind::InvalidSelectionCondition,
        )?;
        let input = self.parse_operand()?;
        Ok(input.select(condition).with_position(Self::span_of(&op)))
    }

    fn parse_rename(&mut self) -> SyntaxResult<RaExpression> {
        let op = self.advance().expect("rho token just peeked");
        self.expect_subscript(SyntaxErrorKind::MissingRenameAlias)?;
        let alias = match self.peek().map(|t| t.token.clone()) {
            Some(Token::Ident(name)) => {
                self.advance();
                name
            }
            _ => return Err(self.error_here(SyntaxErrorKind::MissingRenameAlias)),
        };
        self.expect(&Token::RBrace, SyntaxErrorKind::MissingRenameAlias)?;
        let input = self.parse_operand()?;
        Ok(input.rename(alias).with_position(Self::span_of(&op)))
    }

    fn parse_aggregation(&mut self) -> SyntaxResult<RaExpression> {
        let op = self.advance().expect("gamma token just peeked");
        self.expect_subscript(SyntaxErrorKind::MissingGroupingAggregations)?;

        // (group attributes) — possibly empty
        self.expect(&Token::LParen, SyntaxErrorKind::MissingGroupingAggregations)?;
        let mut group_by = Vec::new();
        loop {
            if let Some(tok) = self.peek() {
                if tok.token == Token::RParen {
                    self.advance();
                    break;
                }
            }
            let (attr, _) =
                self.parse_attribute(SyntaxErrorKind::MissingGroupingAggregations)?;
            group_by.push(attr);
            match self.peek().map(|t| &t.token) {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {}
                _ => return Err(self.error_here(SyntaxErrorKind::MissingComma)),
            }
        }

        self.expect(&Token::Comma, SyntaxErrorKind::MissingGroupingAggregations)?;

        // ((input, function, output), ...) — at least one triple
        self.expect(&Token::LParen, SyntaxErrorKind::MissingGroupingAggregations)?;
        if self.peek().is_some_and(|t| t.token == Token::RParen) {
            return Err(self.error_here(SyntaxErrorKind::MissingGroupingAggregations));
        }
        let mut aggregations = Vec::new();
        loop {
            self.expect(&Token::LParen, SyntaxErrorKind::MissingGroupingAggregations)?;
            aggregations.push(self.parse_aggregation_triple()?);
            match self.peek().map(|t| &t.token) {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error_here(SyntaxErrorKind::MissingComma)),
            }
        }

        self.expect(&Token::RBrace, SyntaxErrorKind::MissingComma)?;
        let input = self.parse_operand()?;
        Ok(input
            .aggregate(group_by, aggregations)
            .with_position(Self::span_of(&op)))
    }

    fn parse_aggregation_triple(&mut self) -> SyntaxResult<Aggregation> {
        let (input, _) = self.parse_attribute(SyntaxErrorKind::InvalidAggregationInput)?;
        self.expect(&Token::Comma, SyntaxErrorKind::MissingComma)?;

        let function = match self.peek().map(|t| t.token.clone()) {
            Some(Token::Ident(name)) => match AggregateFunction::parse(&name) {
                Some(f) => {
                    self.advance();
                    f
                }
                None => return Err(self.error_here(SyntaxErrorKind::InvalidAggregationFunction)),
            },
            _ => return Err(self.error_here(SyntaxErrorKind::InvalidAggregationFunction)),
        };
        self.expect(&Token::Comma, SyntaxErrorKind::MissingComma)?;

        let output = match self.peek().map(|t| t.token.clone()) {
            Some(Token::Ident(name)) => {
                self.advance();
                name
            }
            _ => return Err(self.error_here(SyntaxErrorKind::InvalidAggregationOutput)),
        };
        self.expect(&Token::RParen, SyntaxErrorKind::MismatchedParenthesis)?;
        Ok(Aggregation::new(input, function, output))
    }

    fn parse_top_n(&mut self) -> SyntaxResult<RaExpression> {
        let op = self.advance().expect("T token just peeked");
        self.expect_subscript(SyntaxErrorKind::InvalidTopNLimit)?;

        let limit = match self.peek().map(|t| t.token.clone()) {
            Some(Token::Integer(n)) if n >= 0 => {
                self.advance();
                n as u64
            }
            _ => return Err(self.error_here(SyntaxErrorKind::InvalidTopNLimit)),
        };
        self.expect(&Token::Comma, SyntaxErrorKind::MissingComma)?;
        let (attribute, _) = self.parse_attribute(SyntaxErrorKind::InvalidTopNOrderBy)?;
        self.expect(&Token::RBrace, SyntaxErrorKind::InvalidTopNOrderBy)?;

        let input = self.parse_operand()?;
        Ok(input
            .top_n(limit, attribute)
            .with_position(Self::span_of(&op)))
    }

    fn parse_theta_join(&mut self, left: RaExpression) -> SyntaxResult<RaExpression> {
        let op = self.advance().expect("overset token just peeked");
        self.expect(&Token::LBrace, SyntaxErrorKind::MissingThetaJoinCondition)?;
        let condition = self.parse_condition(
            SyntaxErrorKind::MissingThetaJoinCondition,
            SyntaxErrorKind::InvalidThetaJoinCondition,
        )?;
        self.expect(&Token::LBrace, SyntaxErrorKind::InvalidThetaJoinCondition)?;
        self.expect(&Token::Bowtie, SyntaxErrorKind::InvalidOperator)?;
        self.expect(&Token::RBrace, SyntaxErrorKind::InvalidThetaJoinCondition)?;
        let right = self.parse_operand()?;
        Ok(left
            .theta_join(right, condition)
            .with_position(Self::span_of(&op)))
    }

    /// Parse a brace-delimited boolean condition; `missing` diagnoses an
    /// empty condition, `invalid` re-kinds generic failures inside it
    fn parse_condition(
        &mut self,
        missing: SyntaxErrorKind,
        invalid: SyntaxErrorKind,
    ) -> SyntaxResult<BooleanExpression> {
        if self.peek().is_some_and(|t| t.token == Token::RBrace) {
            let err = self.error_here(missing);
            return Err(err);
        }
        let condition = self.parse_or().map_err(|e| match e.kind {
            SyntaxErrorKind::MismatchedParenthesis => e,
            _ => e.with_kind(invalid),
        })?;
        self.expect(&Token::RBrace, invalid)?;
        Ok(condition)
    }

    // ---- boolean expressions ---------------------------------------------

    fn parse_or(&mut self) -> SyntaxResult<BooleanExpression> {
        let mut left = self.parse_and()?;
        while self.peek().is_some_and(|t| t.token == Token::Vee) {
            let op = self.advance().expect("operator token just peeked");
            let right = self.parse_and()?;
            left = left.or(right).with_position(Self::span_of(&op));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> SyntaxResult<BooleanExpression> {
        let mut left = self.parse_not()?;
        while self.peek().is_some_and(|t| t.token == Token::Wedge) {
            let op = self.advance().expect("operator token just peeked");
            let right = self.parse_not()?;
            left = left.and(right).with_position(Self::span_of(&op));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> SyntaxResult<BooleanExpression> {
        if self.peek().is_some_and(|t| t.token == Token::Neg) {
            let op = self.advance().expect("operator token just peeked");
            let operand = self.parse_not()?;
            return Ok(operand.negate().with_position(Self::span_of(&op)));
        }
        self.parse_bool_atom()
    }

    fn parse_bool_atom(&mut self) -> SyntaxResult<BooleanExpression> {
        if self.peek().is_some_and(|t| t.token == Token::LParen) {
            self.advance();
            let inner = self.parse_or()?;
            self.expect(&Token::RParen, SyntaxErrorKind::MismatchedParenthesis)?;
            return Ok(inner);
        }

        let left = self.parse_comparison_operand()?;
        let op_tok = self
            .peek()
            .cloned()
            .ok_or_else(|| self.error_here(SyntaxErrorKind::UnexpectedEndOfInput))?;
        let op = match op_tok.token {
            Token::Eq => ComparisonOp::Eq,
            Token::NotEq => ComparisonOp::NotEq,
            Token::Lt => ComparisonOp::Lt,
            Token::LtEq => ComparisonOp::LtEq,
            Token::Gt => ComparisonOp::Gt,
            Token::GtEq => ComparisonOp::GtEq,
            _ => return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, &op_tok)),
        };
        self.advance();
        let right = self.parse_comparison_operand()?;
        Ok(BooleanExpression::comparison(op, left, right)
            .with_position(Self::span_of(&op_tok)))
    }

    fn parse_comparison_operand(&mut self) -> SyntaxResult<Operand> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.error_here(SyntaxErrorKind::UnexpectedEndOfInput));
        };
        match tok.token {
            Token::Ident(ref name) if name == "true" => {
                self.advance();
                Ok(Operand::Literal(Literal::Boolean(true)))
            }
            Token::Ident(ref name) if name == "false" => {
                self.advance();
                Ok(Operand::Literal(Literal::Boolean(false)))
            }
            Token::Ident(_) => {
                let (attr, _) = self.parse_attribute(SyntaxErrorKind::UnexpectedToken)?;
                Ok(Operand::Attribute(attr))
            }
            Token::Integer(n) => {
                self.advance();
                Ok(Operand::Literal(Literal::Integer(n)))
            }
            Token::Float(x) => {
                self.advance();
                Ok(Operand::Literal(Literal::Float(x)))
            }
            Token::Str(ref s) => {
                let s = s.clone();
                self.advance();
                Ok(Operand::Literal(Literal::String(s)))
            }
            Token::Minus => {
                self.advance();
                match self.peek().map(|t| t.token.clone()) {
                    Some(Token::Integer(n)) => {
                        self.advance();
                        Ok(Operand::Literal(Literal::Integer(-n)))
                    }
                    Some(Token::Float(x)) => {
                        self.advance();
                        Ok(Operand::Literal(Literal::Float(-x)))
                    }
                    _ => Err(self.error_here(SyntaxErrorKind::UnexpectedToken)),
                }
            }
            _ => Err(self.error_at(SyntaxErrorKind::UnexpectedToken, &tok)),
        }
    }

    /// Parse `ident` or `ident.ident`, failing with the caller's kind
    fn parse_attribute(
        &mut self,
        fail_kind: SyntaxErrorKind,
    ) -> SyntaxResult<(Attribute, Position)> {
        let first = match self.peek().cloned() {
            Some(tok @ SpannedToken { token: Token::Ident(_), .. }) => {
                self.advance();
                tok
            }
            _ => return Err(self.error_here(fail_kind)),
        };
        let Token::Ident(first_name) = &first.token else {
            unreachable!("just matched an identifier");
        };

        if self.peek().is_some_and(|t| t.token == Token::Dot) {
            self.advance();
            match self.peek().cloned() {
                Some(tok) => {
                    if let Token::Ident(col) = &tok.token {
                        self.advance();
                        let span = Self::span_of(&first).merge(&Self::span_of(&tok));
                        return Ok((Attribute::qualified(first_name.clone(), col.clone()), span));
                    }
                    Err(self.error_at(fail_kind, &tok))
                }
                None => Err(self.error_here(fail_kind)),
            }
        } else {
            Ok((
                Attribute::new(first_name.clone()),
                Self::span_of(&first),
            ))
        }
    }
}

fn is_binary_operator(token: &Token) -> bool {
    matches!(
        token,
        Token::Cup
            | Token::Cap
            | Token::Minus
            | Token::Times
            | Token::Div
            | Token::Bowtie
            | Token::Ltimes
            | Token::AntiJoin
            | Token::LeftOuterJoin
            | Token::RightOuterJoin
            | Token::FullOuterJoin
            | Token::Overset
    )
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
