//! Character-level insert/delete over a [`BufferContents`], bridging the
//! text model (character-indexed positions) and the line storage (one
//! `Line` per row). Every [`Transformation`](crate::transformation) that
//! touches text funnels through these two functions.

use edge_text::{BufferContents, Line, Position, Range};

fn line_chars(contents: &BufferContents, line: u64) -> Vec<char> {
    contents.at(line as usize).to_string().chars().collect()
}

/// Insert `text` (itself possibly multi-line) at `at`, returning the
/// position immediately after the inserted text.
pub fn insert_text_at(contents: &mut BufferContents, at: Position, text: &str) -> Position {
    if text.is_empty() {
        return at;
    }
    let parts: Vec<&str> = text.split('\n').collect();
    let chars = line_chars(contents, at.line);
    let col = (at.column as usize).min(chars.len());
    let before: String = chars[..col].iter().collect();
    let after: String = chars[col..].iter().collect();

    if parts.len() == 1 {
        let merged = format!("{before}{}{after}", parts[0]);
        contents.set_line(at.line as usize, Line::new(merged));
        return Position::new(at.line, at.column + parts[0].chars().count() as u64);
    }

    contents.set_line(at.line as usize, Line::new(format!("{before}{}", parts[0])));
    for (i, part) in parts[1..parts.len() - 1].iter().enumerate() {
        contents.insert_line(at.line as usize + 1 + i, Line::new(*part));
    }
    let last_part = parts[parts.len() - 1];
    contents.insert_line(
        at.line as usize + parts.len() - 1,
        Line::new(format!("{last_part}{after}")),
    );
    Position::new(
        at.line + (parts.len() - 1) as u64,
        last_part.chars().count() as u64,
    )
}

/// Delete `range` (half-open, possibly spanning several lines) and return
/// the text that was removed, with crossed line boundaries rendered as
/// `\n` so the result round-trips through `insert_text_at`.
pub fn delete_range(contents: &mut BufferContents, range: Range) -> String {
    if range.is_empty() {
        return String::new();
    }
    let begin = range.begin;
    let end = range.end;

    if begin.line == end.line {
        let chars = line_chars(contents, begin.line);
        let end_col = (end.column as usize).min(chars.len());
        let begin_col = (begin.column as usize).min(end_col);
        let removed: String = chars[begin_col..end_col].iter().collect();
        let remaining: String = chars[..begin_col]
            .iter()
            .chain(chars[end_col..].iter())
            .collect();
        contents.set_line(begin.line as usize, Line::new(remaining));
        return removed;
    }

    let first_chars = line_chars(contents, begin.line);
    let begin_col = (begin.column as usize).min(first_chars.len());
    let first_before: String = first_chars[..begin_col].iter().collect();
    let first_removed: String = first_chars[begin_col..].iter().collect();

    let last_chars = line_chars(contents, end.line);
    let end_col = (end.column as usize).min(last_chars.len());
    let last_removed: String = last_chars[..end_col].iter().collect();
    let last_after: String = last_chars[end_col..].iter().collect();

    let mut removed = String::new();
    removed.push_str(&first_removed);
    removed.push('\n');
    for line in (begin.line + 1)..end.line {
        removed.push_str(&contents.at(line as usize).to_string());
        removed.push('\n');
    }
    removed.push_str(&last_removed);

    contents.set_line(begin.line as usize, Line::new(format!("{first_before}{last_after}")));
    contents.erase_lines((begin.line + 1) as usize, (end.line + 1) as usize);
    removed
}

/// The position just past the last character of `line`.
pub fn end_of_line(contents: &BufferContents, line: u64) -> Position {
    Position::new(line, contents.at(line as usize).size() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_within_one_line() {
        let mut c = BufferContents::from_str("hello world");
        let end = insert_text_at(&mut c, Position::new(0, 5), ",");
        assert_eq!(c.at(0).to_string(), "hello, world");
        assert_eq!(end, Position::new(0, 6));
    }

    #[test]
    fn insert_multiline_splits_the_line() {
        let mut c = BufferContents::from_str("ab");
        let end = insert_text_at(&mut c, Position::new(0, 1), "X\nY");
        assert_eq!(c.len(), 2);
        assert_eq!(c.at(0).to_string(), "aX");
        assert_eq!(c.at(1).to_string(), "Yb");
        assert_eq!(end, Position::new(1, 1));
    }

    #[test]
    fn delete_within_one_line() {
        let mut c = BufferContents::from_str("hello world");
        let removed = delete_range(&mut c, Range::new(Position::new(0, 5), Position::new(0, 11)));
        assert_eq!(removed, " world");
        assert_eq!(c.at(0).to_string(), "hello");
    }

    #[test]
    fn delete_spanning_lines_merges_remainder() {
        let mut c = BufferContents::from_str("one\ntwo\nthree");
        let removed = delete_range(&mut c, Range::new(Position::new(0, 1), Position::new(2, 2)));
        assert_eq!(removed, "ne\ntwo\nth");
        assert_eq!(c.len(), 1);
        assert_eq!(c.at(0).to_string(), "oree");
    }

    #[test]
    fn delete_then_insert_round_trips() {
        let mut c = BufferContents::from_str("one\ntwo\nthree");
        let range = Range::new(Position::new(0, 1), Position::new(2, 2));
        let removed = delete_range(&mut c, range);
        insert_text_at(&mut c, range.begin, &removed);
        assert_eq!(c.to_string(), "one\ntwo\nthree");
    }
}
