use serde::Serialize;

/// A grapheme-aware position in source text.
///
/// `code_unit` is the absolute offset (in UTF-16 code units, matching the
/// host editor's usual text-position encoding); `line_code_unit` is the
/// offset of the same point measured from the start of its line;
/// `line_number` is zero-based. All three are carried together because
/// downstream consumers (error display, autocomplete ranges) each want a
/// different one and recomputing from scratch is wasteful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub code_unit: u32,
    pub line_code_unit: u32,
    pub line_number: u32,
}

impl Position {
    pub fn new(code_unit: u32, line_code_unit: u32, line_number: u32) -> Self {
        Self {
            code_unit,
            line_code_unit,
            line_number,
        }
    }

    pub const ZERO: Position = Position {
        code_unit: 0,
        line_code_unit: 0,
        line_number: 0,
    };
}

/// A half-open `[start, end)` range over source text, expressed in both
/// absolute code units (for byte-like comparisons) and full [`Position`]s
/// (for line/column reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenRange {
    pub start: Position,
    pub end: Position,
}

impl TokenRange {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.code_unit <= end.code_unit,
            "token range start ({}) must be <= end ({})",
            start.code_unit,
            end.code_unit
        );
        Self { start, end }
    }

    /// Whether `position` lies strictly inside `[start, end)`.
    pub fn contains_strict(&self, position: Position) -> bool {
        position.code_unit > self.start.code_unit && position.code_unit < self.end.code_unit
    }

    /// Whether `position` sits exactly at the end boundary.
    pub fn ends_at(&self, position: Position) -> bool {
        position.code_unit == self.end.code_unit
    }

    /// Merge two ranges into the smallest range covering both.
    pub fn merge(self, other: TokenRange) -> TokenRange {
        let start = if self.start.code_unit <= other.start.code_unit {
            self.start
        } else {
            other.start
        };
        let end = if self.end.code_unit >= other.end.code_unit {
            self.end
        } else {
            other.end
        };
        TokenRange::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_strict_excludes_boundaries() {
        let range = TokenRange::new(Position::new(0, 0, 0), Position::new(5, 5, 0));
        assert!(!range.contains_strict(Position::new(0, 0, 0)));
        assert!(range.contains_strict(Position::new(3, 3, 0)));
        assert!(!range.contains_strict(Position::new(5, 5, 0)));
    }

    #[test]
    fn ends_at_matches_end_boundary_only() {
        let range = TokenRange::new(Position::new(0, 0, 0), Position::new(5, 5, 0));
        assert!(range.ends_at(Position::new(5, 5, 0)));
        assert!(!range.ends_at(Position::new(4, 4, 0)));
    }

    #[test]
    fn merge_covers_both_ranges() {
        let a = TokenRange::new(Position::new(2, 2, 0), Position::new(5, 5, 0));
        let b = TokenRange::new(Position::new(0, 0, 0), Position::new(3, 3, 0));
        let merged = a.merge(b);
        assert_eq!(merged.start, Position::new(0, 0, 0));
        assert_eq!(merged.end, Position::new(5, 5, 0));
    }
}
