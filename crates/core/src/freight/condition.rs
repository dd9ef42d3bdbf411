//! Surcharge applicability conditions.
//!
//! A condition is a short human-readable predicate over the package, for
//! example `length > 96`, `weight > 50 and length_girth > 130`,
//! `residential` or `remote >= 2`. `and` binds tighter than `or`. Conditions
//! are parsed once when a product snapshot loads.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::package::PackageAttributes;
use crate::domain::surcharge::DimensionCategory;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    Weight,
    Length,
    Width,
    Height,
    LengthGirth,
    Remote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    Always,
    Residential(bool),
    Compare { subject: Subject, op: Comparison, threshold: Decimal },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
    #[error("expected a comparison operator after `{0}`")]
    MissingOperator(String),
    #[error("expected a number, found `{0}`")]
    InvalidNumber(String),
    #[error("condition ended unexpectedly")]
    UnexpectedEnd,
}

/// Parsed condition in disjunctive form: any group whose predicates all hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    text: String,
    any_of: Vec<Vec<Predicate>>,
}

impl Condition {
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Ok(Self { text: text.trim().to_string(), any_of: vec![vec![Predicate::Always]] });
        }

        let mut parser = Parser { tokens, position: 0 };
        let any_of = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(ConditionError::UnexpectedToken(token.to_string()));
        }

        Ok(Self { text: text.trim().to_string(), any_of })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn matches(&self, attributes: &PackageAttributes) -> bool {
        self.any_of.iter().any(|group| group.iter().all(|predicate| predicate.holds(attributes)))
    }

    /// Category of the condition's first subject.
    pub fn category(&self) -> DimensionCategory {
        match self.any_of.first().and_then(|group| group.first()) {
            Some(Predicate::Compare { subject, .. }) => subject.category(),
            Some(Predicate::Residential(_)) => DimensionCategory::Residential,
            Some(Predicate::Always) | None => DimensionCategory::None,
        }
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Subject {
    fn category(self) -> DimensionCategory {
        match self {
            Self::Weight => DimensionCategory::Weight,
            Self::Length => DimensionCategory::Length,
            Self::Width => DimensionCategory::Width,
            Self::Height => DimensionCategory::Height,
            Self::LengthGirth => DimensionCategory::LengthGirth,
            Self::Remote => DimensionCategory::Remote,
        }
    }

    fn value(self, attributes: &PackageAttributes) -> Decimal {
        match self {
            Self::Weight => attributes.weight,
            Self::Length => attributes.length,
            Self::Width => attributes.width,
            Self::Height => attributes.height,
            Self::LengthGirth => attributes.length_girth(),
            Self::Remote => Decimal::from(attributes.remote_area_level),
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word {
            "weight" | "actual_weight" => Some(Self::Weight),
            "length" | "longest_side" => Some(Self::Length),
            "width" => Some(Self::Width),
            "height" => Some(Self::Height),
            "length_girth" | "length+girth" | "girth" | "lengthgirth" => Some(Self::LengthGirth),
            "remote" | "remote_level" | "remote_area" => Some(Self::Remote),
            _ => None,
        }
    }
}

impl Comparison {
    fn apply(self, left: Decimal, right: Decimal) -> bool {
        match self {
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Eq => left == right,
            Self::Ne => left != right,
        }
    }
}

impl Predicate {
    fn holds(&self, attributes: &PackageAttributes) -> bool {
        match self {
            Self::Always => true,
            Self::Residential(expected) => attributes.is_residential == *expected,
            Self::Compare { subject, op, threshold } => {
                op.apply(subject.value(attributes), *threshold)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Number(String),
    Op(Comparison),
    And,
    Or,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word(word) | Self::Number(word) => f.write_str(word),
            Self::Op(op) => write!(f, "{op:?}"),
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = text.trim().chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch.is_ascii_digit() || ch == '.' {
            let mut number = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_digit() || next == '.' {
                    number.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Number(number));
        } else if ch.is_alphabetic() || ch == '_' {
            let mut word = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' || next == '+' {
                    word.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            let word = word.to_lowercase();
            tokens.push(match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                _ => Token::Word(word),
            });
        } else {
            chars.next();
            let followed_by_eq = chars.peek() == Some(&'=');
            let token = match (ch, followed_by_eq) {
                ('>', true) => Token::Op(Comparison::Ge),
                ('>', false) => Token::Op(Comparison::Gt),
                ('<', true) => Token::Op(Comparison::Le),
                ('<', false) => Token::Op(Comparison::Lt),
                ('=', _) => Token::Op(Comparison::Eq),
                ('!', true) => Token::Op(Comparison::Ne),
                ('&', _) if chars.peek() == Some(&'&') => Token::And,
                ('|', _) if chars.peek() == Some(&'|') => Token::Or,
                _ => return Err(ConditionError::UnexpectedToken(ch.to_string())),
            };
            if followed_by_eq || matches!(token, Token::And | Token::Or) {
                chars.next();
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn parse_or(&mut self) -> Result<Vec<Vec<Predicate>>, ConditionError> {
        let mut groups = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.next();
            groups.push(self.parse_and()?);
        }
        Ok(groups)
    }

    fn parse_and(&mut self) -> Result<Vec<Predicate>, ConditionError> {
        let mut predicates = vec![self.parse_predicate()?];
        while self.peek() == Some(&Token::And) {
            self.next();
            predicates.push(self.parse_predicate()?);
        }
        Ok(predicates)
    }

    fn parse_predicate(&mut self) -> Result<Predicate, ConditionError> {
        let word = match self.next() {
            Some(Token::Word(word)) => word,
            Some(other) => return Err(ConditionError::UnexpectedToken(other.to_string())),
            None => return Err(ConditionError::UnexpectedEnd),
        };

        match word.as_str() {
            "always" => return Ok(Predicate::Always),
            "residential" => return Ok(Predicate::Residential(true)),
            "commercial" => return Ok(Predicate::Residential(false)),
            "not" => {
                return match self.next() {
                    Some(Token::Word(next)) if next == "residential" => {
                        Ok(Predicate::Residential(false))
                    }
                    Some(other) => Err(ConditionError::UnexpectedToken(other.to_string())),
                    None => Err(ConditionError::UnexpectedEnd),
                };
            }
            _ => {}
        }

        let subject = Subject::parse(&word).ok_or_else(|| ConditionError::UnknownSubject(word.clone()))?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            _ => return Err(ConditionError::MissingOperator(word)),
        };
        let threshold = match self.next() {
            Some(Token::Number(number)) => Decimal::from_str(&number)
                .map_err(|_| ConditionError::InvalidNumber(number.clone()))?,
            Some(other) => return Err(ConditionError::InvalidNumber(other.to_string())),
            None => return Err(ConditionError::UnexpectedEnd),
        };

        Ok(Predicate::Compare { subject, op, threshold })
    }
}
