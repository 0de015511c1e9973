//! The built-in modes: fixed-table command dispatch, digit-accumulating
//! repeat counts, raw text insertion, single-character find, and a
//! line-editing prompt. Each implements [`edge_buffer::Mode`] so the
//! editor's mode stack never needs to know which concrete mode it holds.

use edge_buffer::{Direction, EditorState, Mode, ModeTransition, Status, Structure};
use edge_keymap::{Feed, KeyMap, PendingSequence};

use crate::transformation::{
    Context, Delete, DeleteCharacters, DeleteWord, FinalPosition, Insert, Move, Transformation, TransformationEdit,
    WordModifier,
};

fn apply(editor: &mut EditorState, t: Box<dyn Transformation>) {
    let mut ctx = Context::default();
    let buffer = editor.current_mut();
    let (applied, undo) = t.apply(buffer, &mut ctx);
    if applied.modified_buffer {
        buffer.undo.push(Box::new(TransformationEdit(undo)));
    }
    if let Some(text) = ctx.yanked {
        editor.registers.set(edge_buffer::UNNAMED_REGISTER, text);
    }
}

/// A command bound in [`CommandMode`]'s key table: builds the
/// transformation to apply, given the repetitions/direction/structure
/// modifiers pending at the moment the key was pressed.
type Command = fn(&mut EditorState, i32, Direction, Structure);

fn cmd_delete(editor: &mut EditorState, reps: i32, _dir: Direction, structure: Structure) {
    match structure {
        Structure::Char => apply(
            editor,
            Box::new(DeleteCharacters { repetitions: reps, copy_to_paste_buffer: true }),
        ),
        _ => apply(
            editor,
            Box::new(Delete {
                structure,
                modifier: WordModifier::Entire,
                repetitions: reps,
                copy_to_paste_buffer: true,
            }),
        ),
    }
}

fn cmd_move(editor: &mut EditorState, reps: i32, dir: Direction, structure: Structure) {
    apply(editor, Box::new(Move { direction: dir, structure, repetitions: reps }));
}

fn cmd_undo(editor: &mut EditorState, _reps: i32, _dir: Direction, _structure: Structure) {
    if !editor.current_mut().undo() {
        editor.status = Status::info("nothing to undo");
    }
}

fn cmd_redo(editor: &mut EditorState, _reps: i32, _dir: Direction, _structure: Structure) {
    if !editor.current_mut().redo() {
        editor.status = Status::info("nothing to redo");
    }
}

fn cmd_paste(editor: &mut EditorState, reps: i32, _dir: Direction, _structure: Structure) {
    let Some(text) = editor.registers.get(edge_buffer::UNNAMED_REGISTER).map(str::to_owned) else {
        editor.status = Status::info("register empty");
        return;
    };
    apply(editor, Box::new(Insert { text, repetitions: reps, final_position: FinalPosition::End }));
}

fn cmd_goto_buffer_start(editor: &mut EditorState, reps: i32, _dir: Direction, _structure: Structure) {
    apply(editor, Box::new(Move { direction: Direction::Backward, structure: Structure::Buffer, repetitions: reps }));
}

fn cmd_goto_buffer_end(editor: &mut EditorState, reps: i32, _dir: Direction, _structure: Structure) {
    apply(editor, Box::new(Move { direction: Direction::Forward, structure: Structure::Buffer, repetitions: reps }));
}

fn cmd_delete_word_to_end(editor: &mut EditorState, _reps: i32, _dir: Direction, _structure: Structure) {
    apply(editor, Box::new(DeleteWord { modifier: WordModifier::FromCursorToEnd, copy_to_paste_buffer: true }));
}

fn cmd_delete_word_from_start(editor: &mut EditorState, _reps: i32, _dir: Direction, _structure: Structure) {
    apply(editor, Box::new(DeleteWord { modifier: WordModifier::FromStartToCursor, copy_to_paste_buffer: true }));
}

/// The default, modal dispatch table: single keys (or short sequences)
/// bound to [`Command`]s. Digits are handled specially — they push
/// [`RepeatMode`] rather than living in the table.
pub struct CommandMode {
    map: KeyMap<Command>,
    pending: PendingSequence,
}

impl CommandMode {
    pub fn new() -> Self {
        let mut map: KeyMap<Command> = KeyMap::new();
        map.bind_key('x', cmd_delete);
        map.bind_key('w', cmd_delete);
        map.bind_key('d', cmd_delete);
        map.bind_key('l', cmd_move);
        map.bind_key('h', cmd_move);
        map.bind_key('j', cmd_move);
        map.bind_key('k', cmd_move);
        map.bind_key('u', cmd_undo);
        map.bind_key('U', cmd_redo);
        map.bind_key('p', cmd_paste);
        Self { map, pending: PendingSequence::new() }
    }

    fn default_structure_for(key: char) -> Structure {
        match key {
            'w' => Structure::Word,
            'd' => Structure::Line,
            'j' | 'k' => Structure::Line,
            _ => Structure::Char,
        }
    }

    fn default_direction_for(key: char) -> Direction {
        match key {
            'h' | 'k' => Direction::Backward,
            _ => Direction::Forward,
        }
    }
}

impl Default for CommandMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Mode for CommandMode {
    fn name(&self) -> &'static str {
        "command"
    }

    fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition {
        if self.pending.as_slice().is_empty() && key.is_ascii_digit() {
            editor.accumulate_repetition_digit(key.to_digit(10).unwrap());
            return ModeTransition::Push(Box::new(RepeatMode));
        }
        if key == '?' {
            editor.status = Status::info(
                "x delete  w delete-word  d delete-line  hjkl move  u undo  U redo  p paste  \
                 s<structure> select  r reverse  g goto  D delete-word-part  c close  q quit",
            );
            return ModeTransition::Stay;
        }
        if key == 'i' {
            return ModeTransition::Push(Box::new(InsertMode::new()));
        }
        if key == 'f' || key == 'F' {
            let direction = if key == 'F' { Direction::Backward } else { Direction::Forward };
            return ModeTransition::Push(Box::new(FindMode::new(direction)));
        }
        if key == 'r' {
            editor.direction = Direction::Backward;
            return ModeTransition::Stay;
        }
        if key == 's' {
            return ModeTransition::Push(Box::new(StructureMode));
        }
        if key == 'g' {
            let mut mode = AdvancedMode::new();
            mode.bind('g', cmd_goto_buffer_start);
            mode.bind('e', cmd_goto_buffer_end);
            return ModeTransition::Push(Box::new(mode));
        }
        if key == 'D' {
            let mut mode = SecondaryMode::new();
            mode.bind('w', cmd_delete_word_to_end);
            mode.bind('b', cmd_delete_word_from_start);
            return ModeTransition::Push(Box::new(mode));
        }
        if key == 'q' {
            if editor.any_modified() {
                return ModeTransition::Push(Box::new(LinePromptMode::new(
                    "unsaved changes, type ! to quit anyway: ",
                    |editor: &mut EditorState, text: &str| {
                        if text == "!" {
                            editor.terminate = true;
                        } else {
                            editor.status = Status::info("quit cancelled");
                        }
                    },
                )));
            }
            editor.terminate = true;
            return ModeTransition::Stay;
        }
        if key == 'c' {
            if editor.buffer_names().count() <= 1 {
                editor.status = Status::warning("cannot close the only open buffer");
                return ModeTransition::Stay;
            }
            let name = editor.current_name().to_string();
            if editor.current().modified {
                return ModeTransition::Push(Box::new(LinePromptMode::new(
                    format!("'{name}' has unsaved changes, type ! to close anyway: "),
                    move |editor: &mut EditorState, text: &str| {
                        if text == "!" {
                            editor.close(&name);
                        } else {
                            editor.status = Status::info("close cancelled");
                        }
                    },
                )));
            }
            editor.close(&name);
            return ModeTransition::Stay;
        }

        let structure_override = editor.structure;
        let direction_override = editor.direction;
        match self.pending.feed(key, &self.map) {
            Feed::Matched(command) => {
                let (reps, dir, structure) = editor.take_modifiers();
                let structure = if structure != Structure::default() || structure_override != Structure::default() {
                    structure
                } else {
                    Self::default_structure_for(key)
                };
                let direction = if dir != Direction::default() || direction_override != Direction::default() {
                    dir
                } else {
                    Self::default_direction_for(key)
                };
                command(editor, reps, direction, structure);
                ModeTransition::Stay
            }
            Feed::Pending => ModeTransition::Stay,
            Feed::DeadEnd => {
                editor.status = Status::warning(format!("unknown key '{key}'"));
                ModeTransition::Stay
            }
        }
    }
}

/// Consumes consecutive digits into `editor.repetitions`; the first
/// digit is accumulated by `CommandMode` itself before pushing this mode,
/// since it's what triggers the push in the first place. Any later
/// non-digit pops back to the mode underneath without being consumed.
pub struct RepeatMode;

impl Mode for RepeatMode {
    fn name(&self) -> &'static str {
        "repeat"
    }

    fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition {
        if let Some(digit) = key.to_digit(10) {
            editor.accumulate_repetition_digit(digit);
            ModeTransition::Stay
        } else {
            ModeTransition::Pop
        }
    }
}

/// The next key picks the structure the *following* command operates on
/// (SPEC_FULL §11's one-shot sticky modifier). Unlike `fixed_table_mode!`,
/// this does not call `take_modifiers` itself — doing so here would reset
/// `editor.repetitions` before the command that's actually meant to
/// consume it gets a chance to. It pops with `ModeTransition::Pop`, not
/// `PopHandled`: the structure key doubles as the command it modifies
/// (`sl` both selects `Structure::Line` and redelivers `l` to
/// `CommandMode` as the move that consumes it).
pub struct StructureMode;

impl Mode for StructureMode {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition {
        let structure = match key {
            'c' => Some(Structure::Char),
            'w' => Some(Structure::Word),
            'l' => Some(Structure::Line),
            'p' => Some(Structure::Paragraph),
            'b' => Some(Structure::Buffer),
            _ => None,
        };
        match structure {
            Some(structure) => editor.structure = structure,
            None => editor.status = Status::warning(format!("unknown structure '{key}'")),
        }
        ModeTransition::Pop
    }
}

/// Raw text insertion: every printable key is spliced into the buffer at
/// the cursor; Backspace deletes one character back; Escape pops.
pub struct InsertMode;

impl InsertMode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InsertMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Mode for InsertMode {
    fn name(&self) -> &'static str {
        "insert"
    }

    fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition {
        match key {
            '\u{1b}' => ModeTransition::PopHandled,
            '\u{7f}' | '\u{8}' => {
                let cursor = editor.current().active_cursor();
                if cursor.column > 0 || cursor.line > 0 {
                    apply(
                        editor,
                        Box::new(crate::transformation::GotoPosition(
                            crate::motion::retreat_chars(&editor.current().contents, cursor, 1),
                        )),
                    );
                    apply(editor, Box::new(DeleteCharacters { repetitions: 1, copy_to_paste_buffer: false }));
                }
                ModeTransition::Stay
            }
            _ => {
                apply(
                    editor,
                    Box::new(Insert { text: key.to_string(), repetitions: 1, final_position: FinalPosition::End }),
                );
                ModeTransition::Stay
            }
        }
    }
}

/// The next key is a search target; the cursor advances to (or
/// retreats to, per `direction`) the next occurrence on the current
/// line.
pub struct FindMode {
    direction: Direction,
}

impl FindMode {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }
}

impl Mode for FindMode {
    fn name(&self) -> &'static str {
        "find"
    }

    fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition {
        let (reps, _dir, _structure) = editor.take_modifiers();
        let buffer = editor.current();
        let cursor = buffer.active_cursor();
        let line = buffer.contents.at(cursor.line as usize).to_string();
        let chars: Vec<char> = line.chars().collect();

        let target = match self.direction {
            Direction::Forward => {
                let mut col = cursor.column as usize;
                let mut found = None;
                for _ in 0..reps.max(1) {
                    col += 1;
                    match chars[col.min(chars.len())..].iter().position(|&c| c == key) {
                        Some(offset) => {
                            col += offset;
                            found = Some(col);
                        }
                        None => {
                            found = None;
                            break;
                        }
                    }
                }
                found
            }
            Direction::Backward => {
                let mut col = cursor.column as usize;
                let mut found = None;
                for _ in 0..reps.max(1) {
                    if col == 0 {
                        found = None;
                        break;
                    }
                    match chars[..col].iter().rposition(|&c| c == key) {
                        Some(offset) => {
                            col = offset;
                            found = Some(col);
                        }
                        None => {
                            found = None;
                            break;
                        }
                    }
                }
                found
            }
        };

        match target {
            Some(col) => {
                apply(
                    editor,
                    Box::new(crate::transformation::GotoPosition(edge_text::Position::new(cursor.line, col as u64))),
                );
            }
            None => editor.status = Status::info(format!("'{key}' not found")),
        }
        ModeTransition::PopHandled
    }
}

/// Accumulates characters into a line buffer until Enter (commits,
/// calling `on_submit`) or Escape (cancels with an empty string).
pub struct LinePromptMode {
    prompt: String,
    buffer: String,
    on_submit: Box<dyn FnMut(&mut EditorState, &str) + Send>,
}

impl LinePromptMode {
    pub fn new(prompt: impl Into<String>, on_submit: impl FnMut(&mut EditorState, &str) + Send + 'static) -> Self {
        Self { prompt: prompt.into(), buffer: String::new(), on_submit: Box::new(on_submit) }
    }
}

impl Mode for LinePromptMode {
    fn name(&self) -> &'static str {
        "line_prompt"
    }

    fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition {
        match key {
            '\r' | '\n' => {
                (self.on_submit)(editor, &self.buffer);
                ModeTransition::PopHandled
            }
            '\u{1b}' => {
                (self.on_submit)(editor, "");
                ModeTransition::PopHandled
            }
            '\u{7f}' | '\u{8}' => {
                self.buffer.pop();
                editor.status = Status::info(format!("{}{}", self.prompt, self.buffer));
                ModeTransition::Stay
            }
            _ => {
                self.buffer.push(key);
                editor.status = Status::info(format!("{}{}", self.prompt, self.buffer));
                ModeTransition::Stay
            }
        }
    }
}

macro_rules! fixed_table_mode {
    ($name:ident, $mode_name:literal) => {
        /// A fixed-table single-letter shortcut dispatcher; pops back to
        /// the mode underneath after handling (or failing to handle) one
        /// key, matching the data model's "single-shot overlay" modes.
        /// The key is never redelivered below — it was this mode's whole
        /// reason for existing, bound or not.
        pub struct $name {
            map: KeyMap<Command>,
        }

        impl $name {
            pub fn new() -> Self {
                Self { map: KeyMap::new() }
            }

            pub fn bind(&mut self, key: char, command: Command) {
                self.map.bind_key(key, command);
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Mode for $name {
            fn name(&self) -> &'static str {
                $mode_name
            }

            fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition {
                match self.map.lookup(&[key]) {
                    edge_keymap::Lookup::Match(command) => {
                        let (reps, dir, structure) = editor.take_modifiers();
                        command(editor, reps, dir, structure);
                    }
                    _ => editor.status = Status::warning(format!("unknown key '{key}'")),
                }
                ModeTransition::PopHandled
            }
        }
    };
}

fixed_table_mode!(AdvancedMode, "advanced");
fixed_table_mode!(SecondaryMode, "secondary");

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> EditorState {
        let mut editor = EditorState::new();
        editor.current_mut().contents = edge_text::BufferContents::from_str(text);
        editor
    }

    #[test]
    fn command_mode_delete_char_removes_under_cursor() {
        let mut editor = editor_with("hello");
        let mut mode = CommandMode::new();
        mode.handle_key(&mut editor, 'x');
        assert_eq!(editor.current().contents.at(0).to_string(), "ello");
    }

    #[test]
    fn repeat_mode_accumulates_then_pops_on_non_digit() {
        let mut editor = EditorState::new();
        editor.accumulate_repetition_digit(3);
        let mut mode = RepeatMode;
        assert!(matches!(mode.handle_key(&mut editor, '4'), ModeTransition::Stay));
        assert_eq!(editor.repetitions, 134);
        assert!(matches!(mode.handle_key(&mut editor, 'x'), ModeTransition::Pop));
    }

    #[test]
    fn insert_mode_appends_characters_and_escape_pops() {
        let mut editor = editor_with("ab");
        editor.current_mut().cursors.set_mut(edge_cursor::DEFAULT_SET).move_active(edge_text::Position::new(0, 2));
        let mut mode = InsertMode::new();
        mode.handle_key(&mut editor, 'c');
        assert_eq!(editor.current().contents.at(0).to_string(), "abc");
        assert!(matches!(mode.handle_key(&mut editor, '\u{1b}'), ModeTransition::PopHandled));
    }

    #[test]
    fn find_mode_moves_cursor_to_next_occurrence() {
        let mut editor = editor_with("abcXdef");
        let mut mode = FindMode::new(Direction::Forward);
        mode.handle_key(&mut editor, 'X');
        assert_eq!(editor.current().active_cursor(), edge_text::Position::new(0, 3));
    }

    #[test]
    fn line_prompt_mode_collects_then_submits() {
        let mut editor = EditorState::new();
        let submitted = std::sync::Arc::new(std::sync::Mutex::new(String::new()));
        let captured = submitted.clone();
        let mut mode = LinePromptMode::new(":", move |_editor, text| {
            *captured.lock().unwrap() = text.to_string();
        });
        mode.handle_key(&mut editor, 'a');
        mode.handle_key(&mut editor, 'b');
        assert!(matches!(mode.handle_key(&mut editor, '\r'), ModeTransition::PopHandled));
        assert_eq!(*submitted.lock().unwrap(), "ab");
    }

    #[test]
    fn advanced_mode_dispatches_bound_key_then_pops() {
        let mut editor = editor_with("hello");
        let mut mode = AdvancedMode::new();
        mode.bind('x', cmd_delete);
        assert!(matches!(mode.handle_key(&mut editor, 'x'), ModeTransition::PopHandled));
        assert_eq!(editor.current().contents.at(0).to_string(), "ello");
    }

    #[test]
    fn structure_mode_sets_structure_then_pops_without_consuming_repetitions() {
        let mut editor = EditorState::new();
        editor.repetitions = 5;
        let mut mode = StructureMode;
        assert!(matches!(mode.handle_key(&mut editor, 'l'), ModeTransition::Pop));
        assert_eq!(editor.structure, Structure::Line);
        assert_eq!(editor.repetitions, 5);
    }

    #[test]
    fn structure_mode_warns_on_unknown_key() {
        let mut editor = EditorState::new();
        let mut mode = StructureMode;
        mode.handle_key(&mut editor, 'z');
        assert_eq!(editor.structure, Structure::Char);
    }

    #[test]
    fn command_mode_r_sets_backward_direction_for_next_move() {
        let mut editor = editor_with("hello");
        editor.current_mut().cursors.set_mut(edge_cursor::DEFAULT_SET).move_active(edge_text::Position::new(0, 3));
        let mut mode = CommandMode::new();
        assert!(matches!(mode.handle_key(&mut editor, 'r'), ModeTransition::Stay));
        assert_eq!(editor.direction, Direction::Backward);
        mode.handle_key(&mut editor, 'l');
        assert_eq!(editor.current().active_cursor(), edge_text::Position::new(0, 2));
        assert_eq!(editor.direction, Direction::Forward);
    }

    #[test]
    fn command_mode_g_pushes_advanced_mode_for_buffer_goto() {
        let mut editor = editor_with("a\nb\nc");
        let mut mode = CommandMode::new();
        match mode.handle_key(&mut editor, 'g') {
            ModeTransition::Push(mut advanced) => {
                advanced.handle_key(&mut editor, 'e');
            }
            _ => panic!("expected a push"),
        }
        assert_eq!(editor.current().active_cursor().line, 2);
    }

    #[test]
    fn command_mode_capital_d_pushes_secondary_mode_for_word_delete() {
        let mut editor = editor_with("foo bar");
        editor.current_mut().cursors.set_mut(edge_cursor::DEFAULT_SET).move_active(edge_text::Position::new(0, 4));
        let mut mode = CommandMode::new();
        match mode.handle_key(&mut editor, 'D') {
            ModeTransition::Push(mut secondary) => {
                secondary.handle_key(&mut editor, 'w');
            }
            _ => panic!("expected a push"),
        }
        assert_eq!(editor.current().contents.at(0).to_string(), "foo ");
    }

    #[test]
    fn command_mode_quit_sets_terminate_when_nothing_modified() {
        let mut editor = editor_with("hello");
        let mut mode = CommandMode::new();
        assert!(matches!(mode.handle_key(&mut editor, 'q'), ModeTransition::Stay));
        assert!(editor.terminate);
    }

    #[test]
    fn command_mode_quit_prompts_when_modified_and_requires_bang() {
        let mut editor = editor_with("hello");
        editor.current_mut().mark_modified();
        let mut mode = CommandMode::new();
        let ModeTransition::Push(mut prompt) = mode.handle_key(&mut editor, 'q') else {
            panic!("expected a confirmation prompt push");
        };
        assert!(!editor.terminate);
        prompt.handle_key(&mut editor, 'n');
        assert!(matches!(prompt.handle_key(&mut editor, '\r'), ModeTransition::PopHandled));
        assert!(!editor.terminate, "non-bang input must not quit");
    }

    #[test]
    fn command_mode_quit_confirmed_with_bang_sets_terminate() {
        let mut editor = editor_with("hello");
        editor.current_mut().mark_modified();
        let mut mode = CommandMode::new();
        let ModeTransition::Push(mut prompt) = mode.handle_key(&mut editor, 'q') else {
            panic!("expected a confirmation prompt push");
        };
        prompt.handle_key(&mut editor, '!');
        prompt.handle_key(&mut editor, '\r');
        assert!(editor.terminate);
    }

    #[test]
    fn command_mode_close_refuses_the_only_open_buffer() {
        let mut editor = editor_with("hello");
        let mut mode = CommandMode::new();
        assert!(matches!(mode.handle_key(&mut editor, 'c'), ModeTransition::Stay));
        assert_eq!(editor.buffer_names().count(), 1);
    }

    #[test]
    fn command_mode_close_removes_unmodified_second_buffer() {
        let mut editor = editor_with("hello");
        editor.open(edge_buffer::OpenBuffer::new("other.txt"));
        let mut mode = CommandMode::new();
        assert!(matches!(mode.handle_key(&mut editor, 'c'), ModeTransition::Stay));
        assert_eq!(editor.buffer_names().count(), 1);
    }

    #[test]
    fn command_mode_close_prompts_for_modified_second_buffer() {
        let mut editor = editor_with("hello");
        editor.open(edge_buffer::OpenBuffer::new("other.txt"));
        editor.current_mut().mark_modified();
        let mut mode = CommandMode::new();
        let ModeTransition::Push(mut prompt) = mode.handle_key(&mut editor, 'c') else {
            panic!("expected a confirmation prompt push");
        };
        assert_eq!(editor.buffer_names().count(), 2);
        prompt.handle_key(&mut editor, '!');
        prompt.handle_key(&mut editor, '\r');
        assert_eq!(editor.buffer_names().count(), 1);
    }
}
