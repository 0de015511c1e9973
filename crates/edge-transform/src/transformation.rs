//! The editing engine: a closed family of self-undoing operations over an
//! [`OpenBuffer`]. Every `apply` call returns both what happened and a
//! fresh [`Transformation`] that, applied in turn, reverses it — undo and
//! redo are both just "apply the transformation on top of the stack".

use edge_buffer::{Direction, OpenBuffer, Structure};
use edge_text::{Position, Range};

use crate::motion;
use crate::splice;

pub use edge_cursor::DEFAULT_SET;

/// What an `apply` call accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub success: bool,
    pub modified_buffer: bool,
}

impl Applied {
    pub fn ok(modified_buffer: bool) -> Self {
        Self { success: true, modified_buffer }
    }
    pub fn failed() -> Self {
        Self { success: false, modified_buffer: false }
    }
}

/// Side channel for the one effect `apply` has beyond the buffer itself:
/// text removed with `copy_to_paste_buffer` set lands here for the
/// dispatcher to file into a register.
#[derive(Debug, Default)]
pub struct Context {
    pub yanked: Option<String>,
}

/// A reversible edit or cursor motion. `apply` consumes `self` (most
/// variants build their undo out of pieces of their own state) and hands
/// back the transformation that undoes what it just did.
pub trait Transformation: std::fmt::Debug + Send {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>);
}

/// Bridges a [`Transformation`] into [`edge_buffer::undo::UndoableEdit`]:
/// the engine only ever records the *undo* transformation an `apply` call
/// handed back, and undoing it is just applying it, discarding any
/// register side effects (undo never re-yanks).
#[derive(Debug)]
pub struct TransformationEdit(pub Box<dyn Transformation>);

impl edge_buffer::undo::UndoableEdit for TransformationEdit {
    fn undo(self: Box<Self>, buffer: &mut OpenBuffer) -> Box<dyn edge_buffer::undo::UndoableEdit> {
        let mut ctx = Context::default();
        let (_, redo) = self.0.apply(buffer, &mut ctx);
        Box::new(TransformationEdit(redo))
    }

    fn label(&self) -> &'static str {
        "transformation"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Noop;

impl Transformation for Noop {
    fn apply(self: Box<Self>, _buffer: &mut OpenBuffer, _ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        (Applied::ok(false), Box::new(Noop))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GotoPosition(pub Position);

impl Transformation for GotoPosition {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, _ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let previous = buffer.active_cursor();
        buffer.cursors.set_mut(DEFAULT_SET).move_active(self.0);
        (Applied::ok(false), Box::new(GotoPosition(previous)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalPosition {
    Start,
    End,
}

/// Insert `text`, `repetitions` times back to back, moving the cursor to
/// either the position just before or just after everything inserted.
#[derive(Debug, Clone)]
pub struct Insert {
    pub text: String,
    pub repetitions: i32,
    pub final_position: FinalPosition,
}

impl Transformation for Insert {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, _ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        if self.text.is_empty() {
            return (Applied::ok(false), Box::new(Noop));
        }
        let start = buffer.active_cursor();
        let mut pos = start;
        let reps = self.repetitions.max(1);
        for _ in 0..reps {
            pos = splice::insert_text_at(&mut buffer.contents, pos, &self.text);
        }

        let inserted_lines = self.text.matches('\n').count() as u64 * reps as u64;
        if inserted_lines > 0 {
            // Simplification: cursors already sitting on `start.line` past
            // the insertion point are not carried onto the new
            // continuation line; only cursors on later lines shift. See
            // DESIGN.md.
            buffer.cursors.schedule(
                edge_cursor::Transformation::new(Range::new(Position::new(start.line + 1, 0), Position::max()))
                    .with_line_shift(inserted_lines as i64, 0),
            );
        } else {
            let shift = (pos.column - start.column) as i64;
            if shift != 0 {
                buffer.cursors.schedule(
                    edge_cursor::Transformation::new(Range::new(start, Position::new(start.line + 1, 0)))
                        .with_column_shift(shift, start.column),
                );
            }
        }
        buffer.cursors.apply_scheduled();

        let final_pos = match self.final_position {
            FinalPosition::Start => start,
            FinalPosition::End => pos,
        };
        buffer.cursors.set_mut(DEFAULT_SET).move_active(final_pos);
        buffer.mark_modified();

        let undo = DeleteRange {
            range: Range::new(start, pos),
            copy_to_paste_buffer: false,
        };
        (Applied::ok(true), Box::new(undo))
    }
}

/// Delete an explicit, already-resolved range. Every higher-level delete
/// operation (`DeleteCharacters`, `DeleteWord`, `DeleteLines`) resolves
/// its target range relative to the cursor and defers to this.
#[derive(Debug, Clone, Copy)]
pub struct DeleteRange {
    pub range: Range,
    pub copy_to_paste_buffer: bool,
}

impl Transformation for DeleteRange {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        if self.range.is_empty() {
            return (Applied::failed(), Box::new(Noop));
        }
        let removed = splice::delete_range(&mut buffer.contents, self.range);
        if self.copy_to_paste_buffer {
            ctx.yanked = Some(removed.clone());
        }

        let removed_lines = removed.matches('\n').count() as u64;
        if removed_lines > 0 {
            buffer.cursors.schedule(
                edge_cursor::Transformation::new(Range::new(
                    Position::new(self.range.begin.line + 1, 0),
                    Position::max(),
                ))
                .with_line_shift(-(removed_lines as i64), self.range.begin.line),
            );
        } else {
            let shift = self.range.begin.column as i64 - self.range.end.column as i64;
            if shift != 0 {
                buffer.cursors.schedule(
                    edge_cursor::Transformation::new(Range::new(
                        self.range.begin,
                        Position::new(self.range.begin.line + 1, 0),
                    ))
                    .with_column_shift(shift, self.range.begin.column),
                );
            }
        }
        buffer.cursors.apply_scheduled();
        buffer.cursors.set_mut(DEFAULT_SET).move_active(self.range.begin);
        buffer.mark_modified();

        let undo = Insert {
            text: removed,
            repetitions: 1,
            final_position: FinalPosition::Start,
        };
        (Applied::ok(true), Box::new(undo))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteCharacters {
    pub repetitions: i32,
    pub copy_to_paste_buffer: bool,
}

impl Transformation for DeleteCharacters {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let start = buffer.active_cursor();
        let end = motion::advance_chars(&buffer.contents, start, self.repetitions.max(1) as u64);
        Box::new(DeleteRange { range: Range::new(start, end), copy_to_paste_buffer: self.copy_to_paste_buffer })
            .apply(buffer, ctx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordModifier {
    Entire,
    FromStartToCursor,
    FromCursorToEnd,
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteWord {
    pub modifier: WordModifier,
    pub copy_to_paste_buffer: bool,
}

impl Transformation for DeleteWord {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let cursor = buffer.active_cursor();
        let range = match self.modifier {
            WordModifier::FromStartToCursor => {
                Range::new(motion::word_start_backward(&buffer.contents, cursor), cursor)
            }
            WordModifier::FromCursorToEnd | WordModifier::Entire => {
                Range::new(cursor, motion::word_end_forward(&buffer.contents, cursor))
            }
        };
        Box::new(DeleteRange { range, copy_to_paste_buffer: self.copy_to_paste_buffer }).apply(buffer, ctx)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteLines {
    pub repetitions: i32,
    pub copy_to_paste_buffer: bool,
}

impl Transformation for DeleteLines {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let cursor = buffer.active_cursor();
        let reps = self.repetitions.max(1) as u64;
        let total_lines = buffer.contents.len() as u64;
        let end_line = (cursor.line + reps).min(total_lines);
        let range = if end_line < total_lines {
            Range::new(Position::new(cursor.line, 0), Position::new(end_line, 0))
        } else {
            // Deleting through the last line of the buffer: there is no
            // trailing newline to also remove, so this leaves one empty
            // line behind rather than closing the buffer down to zero
            // lines (which `BufferContents` never allows anyway).
            Range::new(Position::new(cursor.line, 0), splice::end_of_line(&buffer.contents, total_lines - 1))
        };
        Box::new(DeleteRange { range, copy_to_paste_buffer: self.copy_to_paste_buffer }).apply(buffer, ctx)
    }
}

/// Dispatches to the structure-specific delete operation. Only
/// `Char`/`Word`/`Line` are implemented in full, per the design's
/// requirement that these three reproduce their exact bounds; the
/// remaining structures report failure rather than silently doing the
/// wrong thing.
#[derive(Debug, Clone, Copy)]
pub struct Delete {
    pub structure: Structure,
    pub modifier: WordModifier,
    pub repetitions: i32,
    pub copy_to_paste_buffer: bool,
}

impl Transformation for Delete {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        match self.structure {
            Structure::Char => Box::new(DeleteCharacters {
                repetitions: self.repetitions,
                copy_to_paste_buffer: self.copy_to_paste_buffer,
            })
            .apply(buffer, ctx),
            Structure::Word => Box::new(DeleteWord {
                modifier: self.modifier,
                copy_to_paste_buffer: self.copy_to_paste_buffer,
            })
            .apply(buffer, ctx),
            Structure::Line => Box::new(DeleteLines {
                repetitions: self.repetitions,
                copy_to_paste_buffer: self.copy_to_paste_buffer,
            })
            .apply(buffer, ctx),
            _ => (Applied::failed(), Box::new(Noop)),
        }
    }
}

/// Moves the cursor; never touches buffer text. `Char`, `Word`, `Line`,
/// and `Buffer` are implemented; other structures are a no-op.
#[derive(Debug, Clone, Copy)]
pub struct Move {
    pub direction: Direction,
    pub structure: Structure,
    pub repetitions: i32,
}

impl Transformation for Move {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, _ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let cursor = buffer.active_cursor();
        let reps = self.repetitions.max(1) as u64;
        let new_pos = match (self.structure, self.direction) {
            (Structure::Char, Direction::Forward) => motion::advance_chars(&buffer.contents, cursor, reps),
            (Structure::Char, Direction::Backward) => motion::retreat_chars(&buffer.contents, cursor, reps),
            (Structure::Word, Direction::Forward) => {
                let mut p = cursor;
                for _ in 0..reps {
                    p = motion::word_end_forward(&buffer.contents, p);
                }
                p
            }
            (Structure::Word, Direction::Backward) => {
                let mut p = cursor;
                for _ in 0..reps {
                    p = motion::word_start_backward_skip_whitespace(&buffer.contents, p);
                }
                p
            }
            (Structure::Line, Direction::Forward) => {
                let target = (cursor.line + reps).min(buffer.contents.len() as u64 - 1);
                motion::clamp_to_line(&buffer.contents, target, cursor.column)
            }
            (Structure::Line, Direction::Backward) => {
                let target = cursor.line.saturating_sub(reps);
                motion::clamp_to_line(&buffer.contents, target, cursor.column)
            }
            (Structure::Buffer, Direction::Forward) => {
                splice::end_of_line(&buffer.contents, buffer.contents.len() as u64 - 1)
            }
            (Structure::Buffer, Direction::Backward) => Position::origin(),
            _ => cursor,
        };
        buffer.cursors.set_mut(DEFAULT_SET).move_active(new_pos);
        (Applied::ok(false), Box::new(GotoPosition(cursor)))
    }
}

/// Trims trailing whitespace from the cursor's current line.
#[derive(Debug, Clone, Copy)]
pub struct DeleteSuffixSuperfluousCharacters;

impl Transformation for DeleteSuffixSuperfluousCharacters {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let cursor = buffer.active_cursor();
        let text = buffer.contents.at(cursor.line as usize).to_string();
        let line_len = text.chars().count() as u64;
        let trimmed_len = text.trim_end().chars().count() as u64;
        if trimmed_len == line_len {
            return (Applied::failed(), Box::new(Noop));
        }
        let range = Range::new(Position::new(cursor.line, trimmed_len), Position::new(cursor.line, line_len));
        Box::new(DeleteRange { range, copy_to_paste_buffer: false }).apply(buffer, ctx)
    }
}

/// Sequential composition: applies every child in order, undone by
/// applying their undos in reverse order.
#[derive(Debug, Default)]
pub struct Stack(pub Vec<Box<dyn Transformation>>);

impl Transformation for Stack {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let mut undos = Vec::with_capacity(self.0.len());
        let mut success = true;
        let mut modified = false;
        for t in self.0 {
            let (applied, undo) = t.apply(buffer, ctx);
            success &= applied.success;
            modified |= applied.modified_buffer;
            undos.push(undo);
        }
        undos.reverse();
        (Applied { success, modified_buffer: modified }, Box::new(Stack(undos)))
    }
}

pub fn compose(a: Box<dyn Transformation>, b: Box<dyn Transformation>) -> Box<dyn Transformation> {
    Box::new(Stack(vec![a, b]))
}

/// `Compose(Goto(p), t)`: moves the cursor to `p` first, then applies `t`.
#[derive(Debug)]
pub struct AtPosition {
    pub position: Position,
    pub inner: Box<dyn Transformation>,
}

impl Transformation for AtPosition {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        Box::new(Stack(vec![Box::new(GotoPosition(self.position)), self.inner])).apply(buffer, ctx)
    }
}

/// Applies a freshly-constructed transformation `count` times in a row,
/// regardless of intermediate failures. A factory closure is required
/// (rather than a single boxed value) because each repetition needs its
/// own instance — `apply` consumes its `Box<Self>`.
pub struct WithRepetitions {
    pub count: i32,
    pub make: Box<dyn Fn() -> Box<dyn Transformation> + Send>,
}

impl std::fmt::Debug for WithRepetitions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithRepetitions").field("count", &self.count).finish()
    }
}

impl Transformation for WithRepetitions {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let mut undos = Vec::new();
        let mut success = true;
        let mut modified = false;
        for _ in 0..self.count.max(1) {
            let (applied, undo) = (self.make)().apply(buffer, ctx);
            success &= applied.success;
            modified |= applied.modified_buffer;
            undos.push(undo);
        }
        undos.reverse();
        (Applied { success, modified_buffer: modified }, Box::new(Stack(undos)))
    }
}

/// Like [`WithRepetitions`] but stops at the first failed application;
/// the composite's own success reflects whether every repetition ran.
pub struct ApplyRepeatedly {
    pub count: i32,
    pub make: Box<dyn Fn() -> Box<dyn Transformation> + Send>,
}

impl std::fmt::Debug for ApplyRepeatedly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyRepeatedly").field("count", &self.count).finish()
    }
}

impl Transformation for ApplyRepeatedly {
    fn apply(self: Box<Self>, buffer: &mut OpenBuffer, ctx: &mut Context) -> (Applied, Box<dyn Transformation>) {
        let target = self.count.max(1);
        let mut undos = Vec::new();
        let mut modified = false;
        let mut ran = 0;
        for _ in 0..target {
            let (applied, undo) = (self.make)().apply(buffer, ctx);
            modified |= applied.modified_buffer;
            undos.push(undo);
            ran += 1;
            if !applied.success {
                break;
            }
        }
        undos.reverse();
        (Applied { success: ran == target, modified_buffer: modified }, Box::new(Stack(undos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_buffer::OpenBuffer;

    fn buffer_with(text: &str) -> OpenBuffer {
        let mut b = OpenBuffer::new("t");
        b.contents = edge_text::BufferContents::from_str(text);
        b
    }

    #[test]
    fn insert_then_undo_round_trips() {
        let mut buffer = buffer_with("hello world");
        let mut ctx = Context::default();
        let (applied, undo) = Box::new(Insert { text: "XYZ".into(), repetitions: 1, final_position: FinalPosition::End })
            .apply(&mut buffer, &mut ctx);
        assert!(applied.success);
        assert_eq!(buffer.contents.at(0).to_string(), "helloXYZ world");
        undo.apply(&mut buffer, &mut ctx);
        assert_eq!(buffer.contents.at(0).to_string(), "hello world");
    }

    #[test]
    fn delete_characters_yanks_into_context() {
        let mut buffer = buffer_with("hello world");
        let mut ctx = Context::default();
        Box::new(DeleteCharacters { repetitions: 5, copy_to_paste_buffer: true }).apply(&mut buffer, &mut ctx);
        assert_eq!(buffer.contents.at(0).to_string(), " world");
        assert_eq!(ctx.yanked.as_deref(), Some("hello"));
    }

    #[test]
    fn delete_word_from_whitespace_consumes_gap_then_word() {
        let mut buffer = buffer_with("foo   bar baz");
        buffer.cursors.set_mut(DEFAULT_SET).move_active(Position::new(0, 3));
        let mut ctx = Context::default();
        Box::new(DeleteWord { modifier: WordModifier::Entire, copy_to_paste_buffer: false })
            .apply(&mut buffer, &mut ctx);
        assert_eq!(buffer.contents.at(0).to_string(), "foo baz");
    }

    #[test]
    fn delete_lines_removes_whole_lines() {
        let mut buffer = buffer_with("a\nb\nc\nd");
        Box::new(DeleteLines { repetitions: 2, copy_to_paste_buffer: false }).apply(&mut buffer, &mut Context::default());
        assert_eq!(buffer.contents.to_string(), "c\nd");
    }

    #[test]
    fn move_word_forward_twice() {
        let mut buffer = buffer_with("alpha beta gamma");
        Box::new(Move { direction: Direction::Forward, structure: Structure::Word, repetitions: 2 })
            .apply(&mut buffer, &mut Context::default());
        assert_eq!(buffer.active_cursor(), Position::new(0, 11));
    }

    #[test]
    fn apply_repeatedly_stops_at_end_of_buffer() {
        let mut buffer = buffer_with("ab");
        let (applied, _) = Box::new(ApplyRepeatedly {
            count: 5,
            make: Box::new(|| Box::new(DeleteCharacters { repetitions: 1, copy_to_paste_buffer: false })),
        })
        .apply(&mut buffer, &mut Context::default());
        assert!(!applied.success);
        assert_eq!(buffer.contents.at(0).to_string(), "");
    }

    #[test]
    fn delete_suffix_whitespace_trims_trailing_spaces() {
        let mut buffer = buffer_with("hello   ");
        let (applied, _) = Box::new(DeleteSuffixSuperfluousCharacters).apply(&mut buffer, &mut Context::default());
        assert!(applied.success);
        assert_eq!(buffer.contents.at(0).to_string(), "hello");
    }

    #[test]
    fn stack_undo_reverses_children_in_opposite_order() {
        let mut buffer = buffer_with("hello");
        let mut ctx = Context::default();
        let stack = Stack(vec![
            Box::new(Insert { text: "A".into(), repetitions: 1, final_position: FinalPosition::End }),
            Box::new(Insert { text: "B".into(), repetitions: 1, final_position: FinalPosition::End }),
        ]);
        let (_, undo) = Box::new(stack).apply(&mut buffer, &mut ctx);
        assert_eq!(buffer.contents.at(0).to_string(), "AB hello".replace(' ', ""));
        undo.apply(&mut buffer, &mut ctx);
        assert_eq!(buffer.contents.at(0).to_string(), "hello");
    }
}
