use ruff_source_file::LineIndex;
use ruff_text_size::TextSize;

use raiseattention_model::Position;

/// Converts byte offsets into 1-indexed (line, column) pairs.
///
/// Thin wrapper over `ruff_source_file::LineIndex`, which already does the
/// line-start bookkeeping a linter needs for diagnostic positions; this
/// just adapts its `LineColumn` into this crate's own [`Position`].
pub struct Locator<'a> {
    source: &'a str,
    index: LineIndex,
}

impl<'a> Locator<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            index: LineIndex::from_source_text(source),
        }
    }

    /// The 1-indexed line and column (in characters, not bytes) of `offset`.
    #[must_use]
    pub fn position(&self, offset: TextSize) -> Position {
        let line_column = self.index.line_column(offset, self.source);
        Position::new(line_column.line.get() as u32, line_column.column.get() as u32)
    }

    /// The 1-indexed line number of `offset`, without computing a column.
    #[must_use]
    pub fn line(&self, offset: TextSize) -> u32 {
        self.index.line_index(offset).get() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        let locator = Locator::new("abc\ndef\n");
        assert_eq!(locator.position(TextSize::from(0)), Position::new(1, 1));
    }

    #[test]
    fn second_line() {
        let locator = Locator::new("abc\ndef\n");
        assert_eq!(locator.position(TextSize::from(4)), Position::new(2, 1));
        assert_eq!(locator.position(TextSize::from(5)), Position::new(2, 2));
    }
}
