use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use unicode_properties::{GeneralCategory, GeneralCategoryGroup, UnicodeGeneralCategory};

/// Kinds of tokens produced when lexing a filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// A bare word directly followed (ignoring whitespace) by `=`
    PropertyName,
    /// A quoted string, a number, or a bare word that is not a property name
    PropertyValue,
    ParenthesisOpen,
    ParenthesisClose,
    Comma,
    And,
    Or,
    Equals,
    Null,
    /// End of input, always the last token
    Eof,
    /// Any single character the lexer does not recognize
    Unknown,
}

impl TokenType {
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::PropertyName => "PropertyName",
            TokenType::PropertyValue => "PropertyValue",
            TokenType::ParenthesisOpen => "ParenthesisOpen",
            TokenType::ParenthesisClose => "ParenthesisClose",
            TokenType::Comma => "Comma",
            TokenType::And => "And",
            TokenType::Or => "Or",
            TokenType::Equals => "Equals",
            TokenType::Null => "Null",
            TokenType::Eof => "EOF",
            TokenType::Unknown => "Unknown",
        }
    }

    /// Whether this token belongs to the boolean grammar (operators and grouping)
    pub fn is_boolean_syntax(&self) -> bool {
        matches!(
            self,
            TokenType::And | TokenType::Or | TokenType::ParenthesisOpen | TokenType::ParenthesisClose
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed fragment of a filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    /// The consumed text; quoted values have their quotes and escapes removed
    pub value: String,
    /// Character offset of the token's first character in the source
    pub position: usize,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, position: usize) -> Self {
        Self {
            token_type,
            value: value.into(),
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}')@{}", self.token_type, self.value, self.position)
    }
}

fn is_letter(c: char) -> bool {
    c.general_category_group() == GeneralCategoryGroup::Letter
}

fn is_decimal_digit(c: char) -> bool {
    c.general_category() == GeneralCategory::DecimalNumber
}

fn is_word_char(c: char) -> bool {
    is_letter(c) || is_decimal_digit(c) || c == '_'
}

/// Tokenize a filter expression
///
/// Never fails: unrecognized characters become `Unknown` tokens and an
/// unterminated quoted string yields whatever was read. The returned
/// sequence always ends with exactly one `Eof` token.
pub fn tokenize(text: &str) -> Vec<Token> {
    Lexer::new(text).collect()
}

/// Streaming lexer over a filter expression
///
/// Yields the same tokens as [`tokenize`], stopping after the `Eof` token.
pub struct Lexer<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Number of characters consumed so far
    char_pos: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
            char_pos: 0,
            finished: false,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.char_pos += 1;
        Some(c)
    }

    /// Byte offset of the next unread character
    fn offset(&self) -> usize {
        self.chars
            .clone()
            .next()
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consume while `predicate` holds and return the text from byte `start_byte`
    fn read_while(&mut self, start_byte: usize, predicate: impl Fn(char) -> bool) -> &'a str {
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
        let text = self.text;
        &text[start_byte..self.offset()]
    }

    fn read_quoted(&mut self, quote: char) -> String {
        let mut value = String::new();
        while let Some(c) = self.bump() {
            if c == '\\' {
                match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                }
            } else if c == quote {
                break;
            } else {
                value.push(c);
            }
        }
        value
    }

    fn next_non_whitespace(&self) -> Option<char> {
        self.text[self.offset()..]
            .chars()
            .find(|c| !c.is_whitespace())
    }

    fn lex_word(&mut self, start_byte: usize, start: usize) -> Token {
        let word = self.read_while(start_byte, is_word_char);

        let keyword = if word.eq_ignore_ascii_case("AND") {
            Some(TokenType::And)
        } else if word.eq_ignore_ascii_case("OR") {
            Some(TokenType::Or)
        } else if word.eq_ignore_ascii_case("NULL") {
            Some(TokenType::Null)
        } else {
            None
        };

        if let Some(token_type) = keyword {
            return Token::new(token_type, word, start);
        }

        // A word is only a property name when an '=' follows it
        let token_type = if self.next_non_whitespace() == Some('=') {
            TokenType::PropertyName
        } else {
            TokenType::PropertyValue
        };
        Token::new(token_type, word, start)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        self.skip_whitespace();
        let start = self.char_pos;
        let Some(&(start_byte, ch)) = self.chars.peek() else {
            self.finished = true;
            return Some(Token::new(TokenType::Eof, "", start));
        };

        let punctuation = match ch {
            '(' => Some(TokenType::ParenthesisOpen),
            ')' => Some(TokenType::ParenthesisClose),
            ',' => Some(TokenType::Comma),
            '=' => Some(TokenType::Equals),
            _ => None,
        };
        if let Some(token_type) = punctuation {
            self.bump();
            return Some(Token::new(token_type, ch.to_string(), start));
        }

        let token = if ch == '"' || ch == '\'' {
            self.bump();
            Token::new(TokenType::PropertyValue, self.read_quoted(ch), start)
        } else if is_letter(ch) || ch == '_' {
            self.lex_word(start_byte, start)
        } else if is_decimal_digit(ch) {
            let digits = self.read_while(start_byte, is_decimal_digit);
            Token::new(TokenType::PropertyValue, digits, start)
        } else {
            self.bump();
            Token::new(TokenType::Unknown, ch.to_string(), start)
        };
        Some(token)
    }
}
