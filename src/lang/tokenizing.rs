use crate::{
    lang::source_buffer::{SourceBuffer, SourceLocation},
    runtime::error::{self, ErrorKind, ScriptError},
};
use lazy_static::lazy_static;
use std::{
    collections::HashMap,
    fmt::{self, Debug, Display, Formatter},
};

/// The single character operators of the language.  Each one maps to exactly one instruction in
/// the function builder, except for the two grouping characters which delimit callable units.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Operator {
    /// `(` starts a nested callable unit.
    OpenGroup,

    /// `)` ends the current callable unit.
    CloseGroup,

    /// `,` concatenates two lists or two strings.
    Concat,

    /// `;` wraps a value in a single element list.
    NewList,

    /// `<` appends a value to a list.
    Push,

    /// `>` splits the last value off of a list.
    Pop,

    /// `:` declares a new name in the current frame.
    Bind,

    /// `!` overwrites an existing name in the frame that owns it.
    Rebind,

    /// `.` looks a name up through the scope chain.
    Lookup,

    /// `*` composes two values into a new callable.
    Compose,

    /// `^` maps a callable over a list.
    Map,

    /// `/` builds an accumulator function over a list or generator.
    Reduce,

    /// `|` forces a value.
    Force,

    /// `~` guards a callable with an error handler.
    Catch,

    /// `$` pushes the positional input of the current invocation.
    Input,

    /// `#` loads and runs a module.
    Load,

    /// `@` loads a module without running it.
    Access,

    /// `-` drops the top value.
    Clear,
}

lazy_static! {
    /// Character to operator lookup used by the lexer.
    static ref OPERATOR_TABLE: HashMap<char, Operator> = {
        let mut table = HashMap::new();

        table.insert('(', Operator::OpenGroup);
        table.insert(')', Operator::CloseGroup);
        table.insert(',', Operator::Concat);
        table.insert(';', Operator::NewList);
        table.insert('<', Operator::Push);
        table.insert('>', Operator::Pop);
        table.insert(':', Operator::Bind);
        table.insert('!', Operator::Rebind);
        table.insert('.', Operator::Lookup);
        table.insert('*', Operator::Compose);
        table.insert('^', Operator::Map);
        table.insert('/', Operator::Reduce);
        table.insert('|', Operator::Force);
        table.insert('~', Operator::Catch);
        table.insert('$', Operator::Input);
        table.insert('#', Operator::Load);
        table.insert('@', Operator::Access);
        table.insert('-', Operator::Clear);

        table
    };
}

impl Operator {
    /// Find the operator for a character, if it is one.
    pub fn from_char(character: char) -> Option<Operator> {
        OPERATOR_TABLE.get(&character).copied()
    }
}

/// What a token is, along with its decoded literal value where it has one.
#[derive(Clone, PartialEq, Debug)]
pub enum TokenKind {
    /// An integer literal.
    Int(i64),

    /// A floating point literal.
    Float(f64),

    /// A string literal with its escapes already processed.
    String(String),

    /// `true` or `false`.
    Bool(bool),

    /// The `void` literal, the empty list.
    Void,

    /// An identifier.
    Symbol(String),

    /// One of the operator characters.
    Operator(Operator),

    /// Punctuation the lexer accepts but that has no meaning to the builder.
    Unknown(char),
}

/// A single lexeme of the language.  The token keeps its original text for diagnostics and the
/// location in the original source code where it was found.
#[derive(Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    text: String,
    location: SourceLocation,
}

/// A list of tokens found in the source code.
pub type TokenList = Vec<Token>;

/// Make sure that the tokens are nicely printable for debugging purposes.
impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Include the original location in debug output.
impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {:?} {}", self.location, self.kind, self.text)
    }
}

impl Token {
    pub fn new(kind: TokenKind, text: String, location: SourceLocation) -> Token {
        Token {
            kind,
            text,
            location,
        }
    }

    /// The classification of the token.
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// The exact source text of the token.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the token's location in the original source text.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// The 1 based line the token starts on.
    pub fn line(&self) -> usize {
        self.location.line()
    }

    /// The 1 based column the token starts on.
    pub fn column(&self) -> usize {
        self.location.column()
    }
}

/// Anything the function builder can pull tokens from.  The builder never sees the lexer itself, so
/// a pre-lexed buffer works just as well as lexing on demand.
pub trait TokenSource {
    /// Consume and return the next token, or None at the end of input.
    fn next_token(&mut self) -> error::Result<Option<Token>>;

    /// Look at the next token without consuming it.
    fn peek_token(&mut self) -> error::Result<Option<&Token>>;
}

/// Produces tokens lazily from a source buffer.  The lexer can be rewound with `reset` to lex the
/// same text again.
pub struct Lexer {
    buffer: SourceBuffer,
    peeked: Option<Token>,
}

/// Check if the given character is considered whitespace.
fn is_whitespace(next: &char) -> bool {
    next.is_whitespace()
}

/// Characters that may continue an identifier.
fn is_identifier_char(next: &char) -> bool {
    next.is_ascii_alphanumeric() || *next == '_'
}

impl Lexer {
    /// Create a lexer for the source text.  The path is only used for locations.
    pub fn new(path: &str, source: &str) -> Lexer {
        Lexer {
            buffer: SourceBuffer::new(path, source),
            peeked: None,
        }
    }

    /// Start over from the beginning of the text.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.peeked = None;
    }

    fn lexical_error<T>(location: &SourceLocation, message: String) -> error::Result<T> {
        ScriptError::new_as_result(ErrorKind::Lexical, Some(location.clone()), message)
    }

    /// Skip over whitespace and line comments.  Stopping only at either the end of the buffer or
    /// the next meaningful character.
    fn skip_ignored(&mut self) {
        while let Some(next) = self.buffer.peek_next() {
            if is_whitespace(&next) {
                let _ = self.buffer.next_char();
            } else if next == '/' && self.buffer.peek_second() == Some('/') {
                while let Some(next) = self.buffer.peek_next() {
                    if next == '\n' {
                        break;
                    }

                    let _ = self.buffer.next_char();
                }
            } else {
                break;
            }
        }
    }

    /// Consume a run of ascii digits, returning how many were found.
    fn consume_digits(&mut self) -> usize {
        let mut count = 0;

        while let Some(next) = self.buffer.peek_next()
            && next.is_ascii_digit()
        {
            let _ = self.buffer.next_char();
            count += 1;
        }

        count
    }

    /// Process a number literal.  Anything with a fraction or an exponent is a float, the rest are
    /// integers.  A number running straight into an identifier is rejected rather than split.
    fn process_number(&mut self, location: &SourceLocation) -> error::Result<TokenKind> {
        let start = self.buffer.position();
        let mut is_float = false;

        if self.buffer.peek_next() == Some('-') {
            let _ = self.buffer.next_char();
        }

        self.consume_digits();

        if self.buffer.peek_next() == Some('.')
            && self.buffer.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            let _ = self.buffer.next_char();
            self.consume_digits();
            is_float = true;
        }

        if let Some('e' | 'E') = self.buffer.peek_next() {
            let has_exponent = match self.buffer.peek_second() {
                Some(c) if c.is_ascii_digit() => true,
                Some('-' | '+') => true,
                _ => false,
            };

            if has_exponent {
                let _ = self.buffer.next_char();

                if let Some('-' | '+') = self.buffer.peek_next() {
                    let _ = self.buffer.next_char();
                }

                if self.consume_digits() == 0 {
                    let text = self.buffer.text_since(start);
                    return Lexer::lexical_error(location, format!("Malformed exponent in {}.", text));
                }

                is_float = true;
            }
        }

        let text = self.buffer.text_since(start);

        if let Some(next) = self.buffer.peek_next()
            && (is_identifier_char(&next) || (next == '.' && is_float))
        {
            return Lexer::lexical_error(location, format!("Malformed number starting with {}.", text));
        }

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Ok(TokenKind::Float(value)),
                Err(_) => Lexer::lexical_error(location, format!("Invalid float literal {}.", text)),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(TokenKind::Int(value)),
                Err(_) => Lexer::lexical_error(location, format!("Integer literal {} out of range.", text)),
            }
        }
    }

    /// Process an escape sequence in a string literal.  The backslash has already been consumed.
    fn process_escape(&mut self, location: &SourceLocation) -> error::Result<char> {
        match self.buffer.next_char() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),

            // Exactly four hex digits for a unicode code point.
            Some('u') => {
                let mut digits = String::new();

                for _ in 0..4 {
                    match self.buffer.next_char() {
                        Some(next) if next.is_ascii_hexdigit() => digits.push(next),
                        _ => {
                            return Lexer::lexical_error(
                                location,
                                "Expected four hex digits after \\u.".to_string(),
                            );
                        }
                    }
                }

                let code = u32::from_str_radix(&digits, 16).unwrap_or(0xfffd);

                match char::from_u32(code) {
                    Some(character) => Ok(character),
                    None => Lexer::lexical_error(location, format!("Invalid code point \\u{}.", digits)),
                }
            }

            Some(next) => Lexer::lexical_error(location, format!("Unknown escape sequence \\{}.", next)),

            None => Lexer::lexical_error(location, "Unexpected end of file in string literal.".to_string()),
        }
    }

    /// Process a string literal up to and including the closing quote.
    fn process_string(&mut self, location: &SourceLocation) -> error::Result<TokenKind> {
        if self.buffer.next_char() != Some('"') {
            return Lexer::lexical_error(location, "Expected a string literal.".to_string());
        }

        let mut text = String::new();

        loop {
            match self.buffer.next_char() {
                Some('"') => break,
                Some('\\') => text.push(self.process_escape(location)?),
                Some(next) => text.push(next),
                None => {
                    return Lexer::lexical_error(
                        location,
                        "Unexpected end of file in string literal.".to_string(),
                    );
                }
            }
        }

        Ok(TokenKind::String(text))
    }

    /// Process an identifier, turning the keyword literals into their own kinds.
    fn process_identifier(&mut self) -> TokenKind {
        let start = self.buffer.position();

        while let Some(next) = self.buffer.peek_next()
            && is_identifier_char(&next)
        {
            let _ = self.buffer.next_char();
        }

        match self.buffer.text_since(start).as_str() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "void" => TokenKind::Void,
            symbol => TokenKind::Symbol(symbol.to_string()),
        }
    }

    /// Lex the next token straight from the buffer.
    fn lex_next(&mut self) -> error::Result<Option<Token>> {
        self.skip_ignored();

        let next = match self.buffer.peek_next() {
            Some(next) => next,
            None => return Ok(None),
        };

        let location = self.buffer.location().clone();
        let start = self.buffer.position();

        let starts_number = next.is_ascii_digit()
            || (next == '-' && self.buffer.peek_second().is_some_and(|c| c.is_ascii_digit()));

        let kind = if starts_number {
            self.process_number(&location)?
        } else if next == '"' {
            self.process_string(&location)?
        } else if next.is_ascii_alphabetic() || next == '_' {
            self.process_identifier()
        } else if let Some(operator) = Operator::from_char(next) {
            let _ = self.buffer.next_char();
            TokenKind::Operator(operator)
        } else if next.is_ascii_punctuation() {
            let _ = self.buffer.next_char();
            TokenKind::Unknown(next)
        } else {
            return Lexer::lexical_error(&location, format!("Unexpected character '{}'.", next));
        };

        Ok(Some(Token::new(kind, self.buffer.text_since(start), location)))
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> error::Result<Option<Token>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lex_next(),
        }
    }

    fn peek_token(&mut self) -> error::Result<Option<&Token>> {
        if self.peeked.is_none() {
            self.peeked = self.lex_next()?;
        }

        Ok(self.peeked.as_ref())
    }
}

impl Iterator for Lexer {
    type Item = error::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// A token source over tokens that were lexed up front.
pub struct TokenBuffer {
    tokens: TokenList,
    position: usize,
}

impl TokenBuffer {
    pub fn new(tokens: TokenList) -> TokenBuffer {
        TokenBuffer {
            tokens,
            position: 0,
        }
    }
}

impl TokenSource for TokenBuffer {
    fn next_token(&mut self) -> error::Result<Option<Token>> {
        let token = self.tokens.get(self.position).cloned();

        if token.is_some() {
            self.position += 1;
        }

        Ok(token)
    }

    fn peek_token(&mut self) -> error::Result<Option<&Token>> {
        Ok(self.tokens.get(self.position))
    }
}

/// Tokenize the whole of the source code up front.
pub fn tokenize_from_source(path: &str, source: &str) -> error::Result<TokenList> {
    Lexer::new(path, source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize_from_source("<test>", source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind().clone())
            .collect()
    }

    #[test_case("42", TokenKind::Int(42); "integer")]
    #[test_case("-7", TokenKind::Int(-7); "negative integer")]
    #[test_case("2.5", TokenKind::Float(2.5); "float")]
    #[test_case("-1.5e2", TokenKind::Float(-150.0); "float with exponent")]
    #[test_case("3e2", TokenKind::Float(300.0); "integer with exponent")]
    #[test_case("true", TokenKind::Bool(true); "true literal")]
    #[test_case("false", TokenKind::Bool(false); "false literal")]
    #[test_case("void", TokenKind::Void; "void literal")]
    #[test_case("truth", TokenKind::Symbol("truth".to_string()); "keyword prefix is a symbol")]
    #[test_case("_x1", TokenKind::Symbol("_x1".to_string()); "underscore symbol")]
    #[test_case("\"a\\tb\"", TokenKind::String("a\tb".to_string()); "string escape")]
    #[test_case("\"\\u0041\\/\"", TokenKind::String("A/".to_string()); "unicode escape")]
    #[test_case("|", TokenKind::Operator(Operator::Force); "force operator")]
    #[test_case("-", TokenKind::Operator(Operator::Clear); "lone minus is clear")]
    #[test_case("%", TokenKind::Unknown('%'); "unknown punctuation")]
    fn single_token(source: &str, expected: TokenKind) {
        assert_eq!(kinds(source), vec![expected]);
    }

    #[test]
    fn skips_whitespace_and_comments() {
        let found = kinds("1 // the rest is ignored ( ) \n 2");
        assert_eq!(found, vec![TokenKind::Int(1), TokenKind::Int(2)]);
    }

    #[test]
    fn trailing_dot_is_a_lookup() {
        let found = kinds("x . 1.");
        assert_eq!(
            found,
            vec![
                TokenKind::Symbol("x".to_string()),
                TokenKind::Operator(Operator::Lookup),
                TokenKind::Int(1),
                TokenKind::Operator(Operator::Lookup),
            ]
        );
    }

    #[test]
    fn records_line_and_column() {
        let tokens = tokenize_from_source("<test>", "a\n  (b)").unwrap();

        assert_eq!((tokens[1].line(), tokens[1].column()), (2, 3));
        assert_eq!((tokens[2].line(), tokens[2].column()), (2, 4));
        assert_eq!(tokens[2].text(), "b");
    }

    #[test_case("\"never closed"; "unterminated string")]
    #[test_case("12abc"; "number into identifier")]
    #[test_case("\"\\q\""; "unknown escape")]
    #[test_case("99999999999999999999"; "integer overflow")]
    #[test_case("é"; "no matching rule")]
    fn lexical_errors(source: &str) {
        let error = tokenize_from_source("<test>", source).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Lexical);
        assert!(error.location().is_some());
    }

    #[test]
    fn string_scanning_requires_an_opening_quote() {
        let mut lexer = Lexer::new("<test>", "abc\"");

        let error = lexer
            .process_string(&SourceLocation::default())
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Lexical);
        assert_eq!(error.error(), "Expected a string literal.");
    }

    #[test]
    fn lexer_is_restartable() {
        let mut lexer = Lexer::new("<test>", "a b");

        assert_eq!(lexer.next_token().unwrap().unwrap().text(), "a");
        assert_eq!(lexer.peek_token().unwrap().unwrap().text(), "b");

        lexer.reset();

        let texts: Vec<String> = lexer.map(|token| token.unwrap().text().to_string()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
