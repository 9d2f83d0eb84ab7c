//! Recursive-descent arithmetic evaluator.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := postfix (('^' | '**') unary)?
//! postfix := primary '%'*
//! primary := number | ident '(' expr ')' | ident | '(' expr ')'
//! ```
//!
//! `^` binds tighter than unary minus and associates to the right, so `-2^2` is `-4`
//! and `2^3^2` is `512`. A postfix `%` divides by one hundred. Nesting through parentheses,
//! function calls, unary signs and exponents is capped at 256 levels.

use crate::executor::ToolError;

const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Num(n) => n.to_string(),
            Self::Ident(s) => s.clone(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::Caret => "^".into(),
            Self::Percent => "%".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
        }
    }
}

/// Evaluate an arithmetic expression.
///
/// # Errors
///
/// Returns `ToolError::Parse` for malformed input and `ToolError::Evaluation` for division by
/// zero, unknown names, or a non-finite result.
pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ToolError::Parse {
            position: 0,
            message: "empty expression".into(),
        });
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some((pos, tok)) = parser.peek_indexed() {
        return Err(ToolError::Parse {
            position: pos,
            message: format!("unexpected '{}'", tok.describe()),
        });
    }
    finite(value)
}

fn finite(value: f64) -> Result<f64, ToolError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ToolError::Evaluation("result is not a finite number".into()))
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ToolError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let (value, next) = scan_number(&chars, i)?;
                i = next;
                Token::Num(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                Token::Ident(chars[start..i].iter().collect::<String>().to_ascii_lowercase())
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                Token::Caret
            }
            _ => {
                i += 1;
                match c {
                    '+' => Token::Plus,
                    '-' | '\u{2212}' => Token::Minus,
                    '*' | '×' => Token::Star,
                    '/' | '÷' => Token::Slash,
                    '^' => Token::Caret,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => {
                        return Err(ToolError::Parse {
                            position: start,
                            message: format!("unexpected character '{other}'"),
                        });
                    }
                }
            }
        };
        tokens.push((start, token));
    }

    Ok(tokens)
}

fn scan_number(chars: &[char], start: usize) -> Result<(f64, usize), ToolError> {
    let mut i = start;
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        i += 1;
    }
    // Exponent only when followed by digits, so `2e` stays `2` then the constant `e`.
    if i < chars.len() && matches!(chars[i], 'e' | 'E') {
        let mut j = i + 1;
        if j < chars.len() && matches!(chars[j], '+' | '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    let text: String = chars[start..i].iter().collect();
    text.parse::<f64>()
        .map(|v| (v, i))
        .map_err(|_| ToolError::Parse {
            position: start,
            message: format!("invalid number '{text}'"),
        })
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn peek_indexed(&self) -> Option<(usize, &Token)> {
        self.tokens.get(self.pos).map(|(p, t)| (*p, t))
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |(p, _)| *p)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ToolError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ToolError::Parse {
                position: self.position(),
                message: format!("expected '{}'", expected.describe()),
            })
        }
    }

    /// Run `f` one nesting level deeper.
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<f64, ToolError>,
    ) -> Result<f64, ToolError> {
        if self.depth >= MAX_DEPTH {
            return Err(ToolError::Parse {
                position: self.position(),
                message: "expression nested too deeply".into(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(ToolError::Evaluation("division by zero".into()));
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.postfix()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return finite(base.powf(exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<f64, ToolError> {
        let mut value = self.primary()?;
        while self.peek() == Some(&Token::Percent) {
            self.pos += 1;
            value /= 100.0;
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<f64, ToolError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.nested(Self::expr)?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let arg = self.nested(Self::expr)?;
                    self.expect(&Token::RParen)?;
                    apply_function(&name, arg)
                } else {
                    constant(&name)
                }
            }
            Some(other) => Err(ToolError::Parse {
                position,
                message: format!("unexpected '{}'", other.describe()),
            }),
            None => Err(ToolError::Parse {
                position,
                message: "unexpected end of expression".into(),
            }),
        }
    }
}

fn constant(name: &str) -> Result<f64, ToolError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(ToolError::Evaluation(format!("unknown name '{name}'"))),
    }
}

fn apply_function(name: &str, x: f64) -> Result<f64, ToolError> {
    let value = match name {
        "sqrt" => {
            if x < 0.0 {
                return Err(ToolError::Evaluation(
                    "square root of a negative number".into(),
                ));
            }
            x.sqrt()
        }
        "abs" => x.abs(),
        "ln" | "log" => positive_log(x, f64::ln)?,
        "log10" => positive_log(x, f64::log10)?,
        "log2" => positive_log(x, f64::log2)?,
        "exp" => x.exp(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => x.round(),
        _ => return Err(ToolError::Evaluation(format!("unknown function '{name}'"))),
    };
    finite(value)
}

fn positive_log(x: f64, f: fn(f64) -> f64) -> Result<f64, ToolError> {
    if x <= 0.0 {
        return Err(ToolError::Evaluation(
            "logarithm of a non-positive number".into(),
        ));
    }
    Ok(f(x))
}
