use pq_common::Position;

/// Character-level source iterator that tracks byte offset, UTF-16 code-unit
/// offset, and line/column together, since the lexer's three downstream
/// consumers each want a different coordinate (§3 "Token" positions).
///
/// Grounded on the teacher's byte-offset `Cursor` (`snow-lexer/src/cursor.rs`),
/// generalized to also carry the grapheme-aware `Position` triple the M
/// parsing core's positions contract requires.
pub struct Cursor<'src> {
    source: &'src str,
    byte_pos: u32,
    code_unit: u32,
    line_code_unit: u32,
    line_number: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            byte_pos: 0,
            code_unit: 0,
            line_code_unit: 0,
            line_number: 0,
            chars: source.chars(),
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    /// Consume the current character, advancing all tracked positions.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.byte_pos += c.len_utf8() as u32;
        let width = c.len_utf16() as u32;
        self.code_unit += width;
        if c == '\n' {
            self.line_number += 1;
            self.line_code_unit = 0;
        } else {
            self.line_code_unit += width;
        }
        Some(c)
    }

    pub fn byte_pos(&self) -> u32 {
        self.byte_pos
    }

    pub fn position(&self) -> Position {
        Position::new(self.code_unit, self.line_code_unit, self.line_number)
    }

    pub fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if predicate(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Extract a slice of the source text by byte offsets.
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_byte_and_code_unit_positions() {
        let mut cursor = Cursor::new("ab");
        cursor.advance();
        assert_eq!(cursor.byte_pos(), 1);
        assert_eq!(cursor.position().code_unit, 1);
    }

    #[test]
    fn advance_resets_line_code_unit_on_newline() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.eat_while(|c| c != '\n');
        assert_eq!(cursor.position().line_number, 0);
        assert_eq!(cursor.position().line_code_unit, 2);
        cursor.advance(); // consume '\n'
        assert_eq!(cursor.position().line_number, 1);
        assert_eq!(cursor.position().line_code_unit, 0);
    }

    #[test]
    fn advance_counts_astral_characters_as_two_utf16_code_units() {
        // U+1F600 (grinning face) is a surrogate pair in UTF-16.
        let mut cursor = Cursor::new("\u{1F600}a");
        cursor.advance();
        assert_eq!(cursor.position().code_unit, 2);
        cursor.advance();
        assert_eq!(cursor.position().code_unit, 3);
    }

    #[test]
    fn slice_extracts_text() {
        let cursor = Cursor::new("hello world");
        assert_eq!(cursor.slice(0, 5), "hello");
        assert_eq!(cursor.slice(6, 11), "world");
    }
}
