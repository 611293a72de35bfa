//! Parser für das Textformat, das [`Action::serialize`] erzeugt
//!
//! ```text
//! expr  := item (';' item)*
//! item  := NUMBER | IDENT '(' args? ')' | KEYNAME | None
//! args  := expr (',' expr)*
//! ```
//!
//! Mehr als ein Item ergibt ein [`Macro`]; Zahlen setzen die Wartezeit des vorherigen Steps.

use crate::actions::macros::to_delay;
use crate::actions::{
    repeat, Action, ActionError, ButtonAction, Cycle, Key, Macro, MacroParam, NoAction,
    PauseAction, PressAction, ReleaseAction, TapAction,
};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    LParen,
    RParen,
    Comma,
    Semicolon,
}

/// Token mit seiner Zeichenposition im Eingabetext
#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    token: Token,
    position: usize,
}

fn parse_error(position: usize, message: impl Into<String>) -> ActionError {
    ActionError::Parse {
        position,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, ActionError> {
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
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(parse_error(start, "unterminated string")),
                        Some('\\') => {
                            let escaped = chars
                                .get(i + 1)
                                .ok_or_else(|| parse_error(i, "unterminated escape"))?;
                            text.push(*escaped);
                            i += 2;
                        }
                        Some(&ch) if ch == quote => break,
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                    }
                }
                Token::Str(text)
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| parse_error(start, format!("invalid number '{}'", literal)))?;
                tokens.push(Spanned {
                    token: Token::Number(value),
                    position: start,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Spanned {
                    token: Token::Ident(chars[start..i].iter().collect()),
                    position: start,
                });
                continue;
            }
            other => return Err(parse_error(start, format!("unexpected character '{}'", other))),
        };
        tokens.push(Spanned {
            token,
            position: start,
        });
        i += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.index)
            .map(|s| s.position)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|s| s.token.clone());
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ActionError> {
        let position = self.position();
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(parse_error(
                position,
                format!("expected {:?}, found {:?}", expected, token),
            )),
            None => Err(parse_error(position, format!("expected {:?}", expected))),
        }
    }

    /// `item (';' item)*`
    fn expr(&mut self) -> Result<Box<dyn Action>, ActionError> {
        let position = self.position();
        let mut params = vec![self.item()?];
        while self.peek() == Some(&Token::Semicolon) {
            self.advance();
            params.push(self.item()?);
        }

        if params.len() == 1 {
            return match params.remove(0) {
                MacroParam::Action(action) => Ok(action),
                MacroParam::Key(key) => Ok(Box::new(ButtonAction::new(key))),
                MacroParam::Delay(_) => Err(parse_error(position, "expected action, found number")),
            };
        }
        Ok(Box::new(Macro::new(params)))
    }

    fn item(&mut self) -> Result<MacroParam, ActionError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(value)) => {
                to_delay(value)?;
                Ok(MacroParam::Delay(value))
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let action = self.call(&name, position)?;
                    self.expect(Token::RParen)?;
                    Ok(MacroParam::Action(action))
                } else if name == "None" {
                    Ok(MacroParam::Action(Box::new(NoAction)))
                } else {
                    Ok(MacroParam::Key(name.parse::<Key>()?))
                }
            }
            Some(token) => Err(parse_error(
                position,
                format!("expected action, found {:?}", token),
            )),
            None => Err(parse_error(position, "expected action")),
        }
    }

    fn key(&mut self) -> Result<Key, ActionError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Ident(name)) => name.parse::<Key>(),
            _ => Err(parse_error(position, "expected key name")),
        }
    }

    fn seconds(&mut self) -> Result<Duration, ActionError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(value)) => to_delay(value),
            _ => Err(parse_error(position, "expected number")),
        }
    }

    /// Argumente eines Befehls; die schließende Klammer liest der Aufrufer
    fn call(&mut self, name: &str, position: usize) -> Result<Box<dyn Action>, ActionError> {
        let action: Box<dyn Action> = match name {
            "button" => Box::new(ButtonAction::new(self.key()?)),
            "press" => Box::new(PressAction::new(self.expr()?)),
            "release" => Box::new(ReleaseAction::new(self.expr()?)),
            "tap" => Box::new(TapAction::new(self.expr()?)),
            "repeat" => Box::new(repeat(self.expr()?)),
            "sleep" => Box::new(PauseAction::new(self.seconds()?)),
            "type" => {
                let text = match self.advance() {
                    Some(Token::Str(text)) => text,
                    _ => return Err(parse_error(position, "type() expects a string")),
                };
                Box::new(Macro::typed(&text)?)
            }
            "cycle" => {
                let mut actions = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    actions.push(self.expr()?);
                    while self.peek() == Some(&Token::Comma) {
                        self.advance();
                        actions.push(self.expr()?);
                    }
                }
                Box::new(Cycle::new(actions))
            }
            other => return Err(ActionError::UnknownCommand(other.to_string())),
        };
        Ok(action)
    }
}

/// Liest eine Action aus ihrem Textformat
///
/// # Examples
///
/// ```rust
/// use padmacro::actions::parse;
///
/// let action = parse("button(KEY_A); 0.1; button(KEY_B)").unwrap();
/// assert_eq!(action.serialize(), "button(KEY_A); 0.1; button(KEY_B)");
/// assert_eq!(action.describe(), "A; B");
/// ```
pub fn parse(input: &str) -> Result<Box<dyn Action>, ActionError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        end: input.chars().count(),
    };
    let action = parser.expr()?;
    if parser.peek().is_some() {
        return Err(parse_error(parser.position(), "unexpected trailing input"));
    }
    debug!("Parsed action: {}", action.describe());
    Ok(action)
}
