use std::{ fmt::{ self,
                  Display,
                  Formatter },
           hash::{ Hash,
                   Hasher },
           rc::Rc };



/// The location in the source code where a token was found.  Tokens, instructions and errors all
/// carry one of these so that a failure deep inside a deferred computation can still be reported
/// against the line that produced it.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, PartialEq, PartialOrd, Eq)]
pub struct SourceLocation
{
    /// Either the path to the file or a description of the source code, for example "\<test\>".
    /// Shared because every token of a file carries the same path.
    path: Rc<str>,

    /// The 1 based line number in the source code where the token was found.
    line: usize,

    /// The 1 based column number in the source code where the token was found.
    column: usize
}


impl Hash for SourceLocation
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.path.hash(state);
        self.line.hash(state);
        self.column.hash(state);
    }
}


/// Used for error reporting to show where in the source code an error originated.
impl Display for SourceLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), fmt::Error>
    {
        write!(formatter, "{} ({}, {})", self.path, self.line, self.column)
    }
}


impl std::fmt::Debug for SourceLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), fmt::Error>
    {
        write!(formatter, "{}", self)
    }
}


impl Default for SourceLocation
{
    fn default() -> Self
    {
        SourceLocation::new_from_path("unspecified")
    }
}


impl SourceLocation
{
    /// Create a new SourceLocation at the start of the given source.
    pub fn new_from_path(path: &str) -> Self
    {
        SourceLocation { path: Rc::from(path), line: 1, column: 1 }
    }

    /// Create a new SourceLocation with all of the needed information.  This is useful in
    /// conjunction with the location_here! macro.
    pub fn new_from_info(path: &str, line: usize, column: usize) -> Self
    {
        SourceLocation { path: Rc::from(path), line, column }
    }

    /// The path to the source code or a meaningful description of the source code.
    pub fn path(&self) -> &str
    {
        &self.path
    }

    /// The 1 based line number in the source code.
    pub fn line(&self) -> usize
    {
        self.line
    }

    /// The 1 based column number in the source code.
    pub fn column(&self) -> usize
    {
        self.column
    }
}



/// Helper macro to get the location of the macro invocation.  Host functions registered from Rust
/// use this so that errors raised inside them point back at their registration.
#[macro_export]
macro_rules! location_here
{
    () =>
    {
        $crate::lang::source_buffer::SourceLocation::new_from_info(file!(),
                                                                   line!() as usize,
                                                                   column!() as usize)
    };
}



/// A cursor over a piece of source code.  The lexer pulls characters from it and asks it where it
/// currently is.  Unlike a plain `Chars` iterator the buffer owns its text, so it can be rewound
/// to the start with `reset` and it can look two characters ahead, which the lexer needs for `//`
/// comments and signed numbers.
pub struct SourceBuffer
{
    /// The full text being processed.
    chars: Vec<char>,

    /// Index of the next character to be consumed.
    position: usize,

    /// The logical location of the cursor in the source code.
    location: SourceLocation
}


impl SourceBuffer
{
    /// Create a new SourceBuffer with the path to, or meaningful tag for the source code and the
    /// source code itself.
    pub fn new(path: &str, source: &str) -> Self
    {
        SourceBuffer
            {
                chars: source.chars().collect(),
                position: 0,
                location: SourceLocation::new_from_path(path)
            }
    }

    /// Rewind to the beginning of the text.
    pub fn reset(&mut self)
    {
        self.position = 0;
        self.location.line = 1;
        self.location.column = 1;
    }

    /// The location the cursor is at in the source code being processed.
    pub fn location(&self) -> &SourceLocation
    {
        &self.location
    }

    /// Take a peek at the next character in the source code without consuming it.
    pub fn peek_next(&self) -> Option<char>
    {
        self.chars.get(self.position).copied()
    }

    /// Peek one character past the next one.
    pub fn peek_second(&self) -> Option<char>
    {
        self.chars.get(self.position + 1).copied()
    }

    /// Index of the next character, used to mark the start of a lexeme.
    pub fn position(&self) -> usize
    {
        self.position
    }

    /// The raw text consumed since the given position.
    pub fn text_since(&self, start: usize) -> String
    {
        self.chars[start..self.position].iter().collect()
    }

    /// Get and consume the next character in the source code.
    pub fn next_char(&mut self) -> Option<char>
    {
        let next = self.peek_next()?;

        self.position += 1;
        self.increment_location(next);

        Some(next)
    }

    /// Advance one column for regular characters.  Reset the column to 1 and increment the line
    /// for new line characters.
    fn increment_location(&mut self, next: char)
    {
        if next == '\n'
        {
            self.location.line += 1;
            self.location.column = 1;
        }
        else
        {
            self.location.column += 1;
        }
    }
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn tracks_lines_and_columns()
    {
        let mut buffer = SourceBuffer::new("<test>", "ab\nc");

        assert_eq!(buffer.next_char(), Some('a'));
        assert_eq!(buffer.location().column(), 2);

        let _ = buffer.next_char();
        let _ = buffer.next_char();

        assert_eq!(buffer.location().line(), 2);
        assert_eq!(buffer.location().column(), 1);
        assert_eq!(buffer.peek_next(), Some('c'));
    }

    #[test]
    fn reset_rewinds_to_start()
    {
        let mut buffer = SourceBuffer::new("<test>", "xy");

        let _ = buffer.next_char();
        let _ = buffer.next_char();
        assert_eq!(buffer.next_char(), None);

        buffer.reset();

        assert_eq!(buffer.peek_next(), Some('x'));
        assert_eq!(buffer.peek_second(), Some('y'));
        assert_eq!(buffer.location().column(), 1);
    }
}
