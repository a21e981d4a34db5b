//! Tokenizer for the LaTeX-notation RA dialect
//!
//! Accepts both the LaTeX command spelling (`\pi`, `\bowtie`, `\wedge`) and
//! the bare Unicode character (`π`, `⋈`, `∧`) for every operator, plus the
//! ASCII digraphs `<=`, `>=`, `!=` as comparison conveniences.

use crate::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};

/// A lexical token of the RA dialect
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // prefix operators
    Pi,
    Sigma,
    Rho,
    Gamma,
    // binary operators
    Cup,
    Cap,
    Minus,
    Times,
    Div,
    Bowtie,
    Ltimes,
    AntiJoin,
    LeftOuterJoin,
    RightOuterJoin,
    FullOuterJoin,
    Overset,
    // boolean operators
    Wedge,
    Vee,
    Neg,
    // comparison operators
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // structure
    Underscore,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Dot,
    // terminals
    Ident(String),
    Integer(i64),
    Float(f64),
    Str(String),
}

impl Token {
    /// Short description for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{s}'"),
            Token::Integer(n) => format!("integer {n}"),
            Token::Float(x) => format!("number {x}"),
            Token::Str(s) => format!("string '{s}'"),
            other => format!("{other:?}"),
        }
    }
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: u32,
    pub start_col: u32,
    pub end_col: u32,
}

/// Tokenize RA source text
pub fn tokenize(source: &str) -> SyntaxResult<Vec<SpannedToken>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: Vec<char>,
    lines: Vec<&'a str>,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            lines: source.lines().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn snippet(&self, line: u32) -> String {
        self.lines
            .get(line as usize - 1)
            .map(|l| l.trim_end().to_string())
            .unwrap_or_default()
    }

    fn error(&self, kind: SyntaxErrorKind, line: u32, col: u32) -> SyntaxError {
        SyntaxError::new(kind, line, col, self.snippet(line))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn run(mut self) -> SyntaxResult<Vec<SpannedToken>> {
        let mut out = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            let (line, start_col) = (self.line, self.col);
            let token = self.next_token(c, line, start_col)?;
            out.push(SpannedToken {
                token,
                line,
                start_col,
                end_col: if self.line == line { self.col } else { start_col },
            });
        }
        Ok(out)
    }

    fn next_token(&mut self, c: char, line: u32, col: u32) -> SyntaxResult<Token> {
        match c {
            '\\' => self.lex_command(line, col),
            '\'' => self.lex_string(line, col),
            '0'..='9' => Ok(self.lex_number()),
            '{' => {
                self.bump();
                Ok(Token::LBrace)
            }
            '}' => {
                self.bump();
                Ok(Token::RBrace)
            }
            '(' => {
                self.bump();
                Ok(Token::LParen)
            }
            ')' => {
                self.bump();
                Ok(Token::RParen)
            }
            ',' => {
                self.bump();
                Ok(Token::Comma)
            }
            '.' => {
                self.bump();
                Ok(Token::Dot)
            }
            '=' => {
                self.bump();
                Ok(Token::Eq)
            }
            '<' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::LtEq)
                } else {
                    Ok(Token::Lt)
                }
            }
            '>' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::GtEq)
                } else {
                    Ok(Token::Gt)
                }
            }
            '!' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::NotEq)
                } else {
                    Err(self.error(SyntaxErrorKind::UnexpectedToken, line, col))
                }
            }
            '-' | '−' => {
                self.bump();
                Ok(Token::Minus)
            }
            'π' => self.single(Token::Pi),
            'σ' => self.single(Token::Sigma),
            'ρ' => self.single(Token::Rho),
            'Γ' => self.single(Token::Gamma),
            '∪' => self.single(Token::Cup),
            '∩' => self.single(Token::Cap),
            '×' => self.single(Token::Times),
            '÷' => self.single(Token::Div),
            '⋈' => self.single(Token::Bowtie),
            '⋉' => self.single(Token::Ltimes),
            '▷' => self.single(Token::AntiJoin),
            '⟕' => self.single(Token::LeftOuterJoin),
            '⟖' => self.single(Token::RightOuterJoin),
            '⟗' => self.single(Token::FullOuterJoin),
            '∧' => self.single(Token::Wedge),
            '∨' => self.single(Token::Vee),
            '¬' => self.single(Token::Neg),
            '≠' => self.single(Token::NotEq),
            '≤' => self.single(Token::LtEq),
            '≥' => self.single(Token::GtEq),
            // identifiers last, so the Greek operator letters above win
            c if c.is_alphabetic() => self.lex_word(),
            '_' => {
                self.bump();
                Ok(Token::Underscore)
            }
            _ => Err(self.error(SyntaxErrorKind::UnexpectedToken, line, col)),
        }
    }

    fn single(&mut self, token: Token) -> SyntaxResult<Token> {
        self.bump();
        Ok(token)
    }

    fn lex_command(&mut self, line: u32, col: u32) -> SyntaxResult<Token> {
        self.bump(); // backslash
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match name.as_str() {
            "pi" => Ok(Token::Pi),
            "sigma" => Ok(Token::Sigma),
            "rho" => Ok(Token::Rho),
            "Gamma" | "gamma" => Ok(Token::Gamma),
            "cup" => Ok(Token::Cup),
            "cap" => Ok(Token::Cap),
            "setminus" => Ok(Token::Minus),
            "times" => Ok(Token::Times),
            "div" => Ok(Token::Div),
            "bowtie" => Ok(Token::Bowtie),
            "ltimes" => Ok(Token::Ltimes),
            "triangleright" => Ok(Token::AntiJoin),
            "leftouterjoin" => Ok(Token::LeftOuterJoin),
            "rightouterjoin" => Ok(Token::RightOuterJoin),
            "fullouterjoin" => Ok(Token::FullOuterJoin),
            "overset" => Ok(Token::Overset),
            "wedge" | "land" => Ok(Token::Wedge),
            "vee" | "lor" => Ok(Token::Vee),
            "neg" | "lnot" => Ok(Token::Neg),
            "neq" | "ne" => Ok(Token::NotEq),
            "leq" | "le" => Ok(Token::LtEq),
            "geq" | "ge" => Ok(Token::GtEq),
            _ => Err(self.error(SyntaxErrorKind::InvalidOperator, line, col)),
        }
    }

    fn lex_string(&mut self, line: u32, col: u32) -> SyntaxResult<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('\'') => {
                    self.bump();
                    return Ok(Token::Str(value));
                }
                Some('\n') | None => {
                    return Err(self.error(SyntaxErrorKind::UnexpectedEndOfInput, line, col))
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }

    fn lex_number(&mut self) -> Token {
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.')
            && self
                .chars
                .get(self.pos + 1)
                .is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut ahead = self.pos + 1;
            if matches!(self.chars.get(ahead), Some('+') | Some('-')) {
                ahead += 1;
            }
            if self.chars.get(ahead).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                while self.pos < ahead {
                    text.push(self.chars[self.pos]);
                    self.bump();
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Token::Integer(n);
            }
        }
        Token::Float(text.parse::<f64>().unwrap_or(f64::NAN))
    }

    fn lex_word(&mut self) -> SyntaxResult<Token> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(Token::Ident(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_commands_and_unicode_agree() {
        assert_eq!(kinds("\\pi"), kinds("π"));
        assert_eq!(kinds("\\bowtie"), kinds("⋈"));
        assert_eq!(kinds("\\wedge"), kinds("∧"));
        assert_eq!(kinds("\\neq"), kinds("≠"));
        assert_eq!(kinds("\\leftouterjoin"), kinds("⟕"));
    }

    #[test]
    fn test_projection_tokens() {
        assert_eq!(
            kinds("\\pi_{a, b} R"),
            vec![
                Token::Pi,
                Token::Underscore,
                Token::LBrace,
                Token::Ident("a".into()),
                Token::Comma,
                Token::Ident("b".into()),
                Token::RBrace,
                Token::Ident("R".into()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![Token::Integer(42)]);
        assert_eq!(kinds("4.5"), vec![Token::Float(4.5)]);
        assert_eq!(kinds("1e3"), vec![Token::Float(1000.0)]);
        // a dot not followed by a digit is qualification, not a float
        assert_eq!(
            kinds("R.a"),
            vec![
                Token::Ident("R".into()),
                Token::Dot,
                Token::Ident("a".into())
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(kinds("'hi there'"), vec![Token::Str("hi there".into())]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("\\sigma_{a = 'oops} R").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedEndOfInput);
    }

    #[test]
    fn test_unknown_command_is_invalid_operator() {
        let err = tokenize("R \\join S").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::InvalidOperator);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 3);
        assert_eq!(err.snippet, "R \\join S");
    }

    #[test]
    fn test_positions_track_lines() {
        let toks = tokenize("R\n  \\cup S").unwrap();
        assert_eq!(toks[1].line, 2);
        assert_eq!(toks[1].start_col, 3);
    }

    #[test]
    fn test_comparison_digraphs() {
        assert_eq!(kinds("<="), kinds("≤"));
        assert_eq!(kinds(">="), kinds("\\geq"));
        assert_eq!(kinds("!="), kinds("\\ne"));
    }
}
