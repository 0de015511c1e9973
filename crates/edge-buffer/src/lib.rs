//! Editor state: the open-buffer aggregate and the top-level editor
//! registry that owns every open buffer, the mode stack, and the
//! repetition/direction/structure modifiers pending on the next command.

pub mod undo;

use std::collections::HashMap;
use std::sync::Arc;

use edge_cursor::{CursorsTracker, DEFAULT_SET};
use edge_syntax::{parser_for_extension, BufferSyntaxParser, TreeParser};
use edge_text::{BufferContents, Position};
use undo::UndoEngine;

/// A small typed key/value store for buffer- and editor-local settings
/// (wrap column, tab width, read-only, ...). Mirrors the "TypedBag" in the
/// data model: callers ask for a specific variant and get a default back
/// rather than an error when the key is unset or the wrong type.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    bools: HashMap<String, bool>,
    ints: HashMap<String, i64>,
    strings: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.bools.insert(key.into(), value);
    }
    pub fn bool(&self, key: &str, default: bool) -> bool {
        self.bools.get(key).copied().unwrap_or(default)
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.ints.insert(key.into(), value);
    }
    pub fn int(&self, key: &str, default: i64) -> i64 {
        self.ints.get(key).copied().unwrap_or(default)
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }
    pub fn string(&self, key: &str, default: &str) -> String {
        self.strings.get(key).cloned().unwrap_or_else(|| default.to_string())
    }
}

/// Severity of a status-line message (§7 / SPEC_FULL §11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            message: String::new(),
            severity: Severity::Info,
        }
    }
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Info }
    }
    pub fn warning(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Warning }
    }
    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Error }
    }
}

/// A named-buffer store used by delete/yank/paste commands (the "paste
/// buffer" register and the lettered registers alongside it).
#[derive(Debug, Clone, Default)]
pub struct Registers {
    named: HashMap<char, String>,
}

/// The unnamed, default register that plain delete/yank commands target.
pub const UNNAMED_REGISTER: char = '"';

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: char, text: impl Into<String>) {
        self.named.insert(name, text.into());
    }

    pub fn get(&self, name: char) -> Option<&str> {
        self.named.get(&name).map(String::as_str)
    }
}

/// One open buffer: its text, cursors, syntax tree, per-buffer settings,
/// and undo history.
pub struct OpenBuffer {
    pub name: String,
    pub contents: BufferContents,
    pub cursors: CursorsTracker,
    pub variables: Variables,
    pub syntax_parser: BufferSyntaxParser,
    pub observers: Arc<edge_events::Observers<()>>,
    pub status: Status,
    pub modified: bool,
    pub view_start: Position,
    pub view_size: Option<(u16, u16)>,
    pub undo: UndoEngine,
    path: Option<String>,
}

impl OpenBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: BufferContents::new(),
            cursors: CursorsTracker::new(),
            variables: Variables::new(),
            syntax_parser: BufferSyntaxParser::new(),
            observers: Arc::new(edge_events::Observers::new()),
            status: Status::default(),
            modified: false,
            view_start: Position::origin(),
            view_size: None,
            undo: UndoEngine::new(),
            path: None,
        }
    }

    /// Load `text` as the buffer's contents, splitting on newlines, and
    /// pick a syntax parser from `path`'s extension. Marks the buffer
    /// unmodified (this is a fresh load, not an edit) and kicks off an
    /// initial background parse.
    pub fn load(&mut self, path: impl Into<String>, text: &str) {
        let path = path.into();
        self.contents = BufferContents::from_str(text);
        self.modified = false;
        let parser = parser_for_extension(&path);
        self.path = Some(path);
        self.request_reparse(parser);
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn request_reparse(&mut self, parser: Arc<dyn TreeParser>) {
        self.syntax_parser.request_parse(parser, self.contents.clone());
    }

    /// Re-derive the syntax tree for the buffer's current contents, using
    /// whichever parser the buffer was loaded with (or `NullTreeParser` if
    /// it was never loaded from a path).
    pub fn reparse(&mut self) {
        let parser = self
            .path
            .as_deref()
            .map(parser_for_extension)
            .unwrap_or_else(|| Arc::new(edge_syntax::NullTreeParser));
        self.request_reparse(parser);
    }

    /// Mark the buffer modified and notify observers (§3 `OpenBuffer`:
    /// edits must update `modified` and fire content-change observers).
    pub fn mark_modified(&mut self) {
        self.modified = true;
        self.observers.notify(&());
    }

    pub fn active_cursor(&self) -> Position {
        self.cursors
            .set(DEFAULT_SET)
            .and_then(|set| set.active_position())
            .unwrap_or_else(Position::origin)
    }

    /// Apply an edit's reverse and record the edit it undoes; see
    /// `undo::UndoEngine`. Takes the engine out of `self` for the
    /// duration of the call since `undo` itself needs `&mut OpenBuffer`.
    pub fn undo(&mut self) -> bool {
        let mut engine = std::mem::take(&mut self.undo);
        let applied = engine.undo(self);
        self.undo = engine;
        applied
    }

    pub fn redo(&mut self) -> bool {
        let mut engine = std::mem::take(&mut self.undo);
        let applied = engine.redo(self);
        self.undo = engine;
        applied
    }
}

/// Repetition count, direction, and structure pending on the next command
/// — one-shot modifiers consumed by the next `Transformation` (SPEC_FULL
/// §11) then reset to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Forward
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    Char,
    Word,
    Line,
    Paragraph,
    Page,
    Buffer,
    Search,
    Cursor,
    Mark,
    Tree,
    SymbolRegion,
}

impl Default for Structure {
    fn default() -> Self {
        Structure::Char
    }
}

/// One entry of the mode stack. Implemented by `edge-transform`'s concrete
/// modes (CommandMode, InsertMode, FindMode, ...); kept as a trait object
/// here so this crate never depends on the dispatch engine built on top
/// of it.
pub trait Mode: Send {
    fn name(&self) -> &'static str;

    /// Handle one key press against the current buffer, mutating
    /// `editor` as needed and optionally pushing a new mode or popping
    /// back to the previous one.
    fn handle_key(&mut self, editor: &mut EditorState, key: char) -> ModeTransition;
}

/// What a mode's key handler asks the dispatcher to do next.
#[derive(Default)]
pub enum ModeTransition {
    #[default]
    Stay,
    Push(Box<dyn Mode>),
    /// Pop this mode and redeliver the same key to the mode beneath —
    /// "I decline to act on this key" (e.g. `RepeatMode` handing a
    /// non-digit terminator back down to `CommandMode`).
    Pop,
    /// Pop this mode without redelivering the key — "I fully handled
    /// this key myself", for single-shot overlays (`FindMode`,
    /// `LinePromptMode`, the fixed-table modes) where the key was
    /// already consumed and must not also be interpreted by the mode
    /// beneath.
    PopHandled,
    PopAll,
}

/// The editor-wide registry: every open buffer, which one is current, the
/// mode stack, and the modifiers pending on the next command.
pub struct EditorState {
    buffers: HashMap<String, OpenBuffer>,
    order: Vec<String>,
    current: String,
    pub mode_stack: Vec<Box<dyn Mode>>,
    pub repetitions: i32,
    pub direction: Direction,
    pub structure: Structure,
    pub status: Status,
    pub registers: Registers,
    pub work_queue: Arc<edge_events::WorkQueue>,
    pub terminate: bool,
}

impl EditorState {
    pub fn new() -> Self {
        let mut buffers = HashMap::new();
        let scratch = "*scratch*".to_string();
        buffers.insert(scratch.clone(), OpenBuffer::new(scratch.clone()));
        Self {
            buffers,
            order: vec![scratch.clone()],
            current: scratch,
            mode_stack: Vec::new(),
            repetitions: 1,
            direction: Direction::default(),
            structure: Structure::default(),
            status: Status::default(),
            registers: Registers::new(),
            work_queue: Arc::new(edge_events::WorkQueue::new()),
            terminate: false,
        }
    }

    pub fn open(&mut self, buffer: OpenBuffer) {
        let name = buffer.name.clone();
        if !self.buffers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.buffers.insert(name.clone(), buffer);
        self.current = name;
    }

    pub fn close(&mut self, name: &str) -> Option<OpenBuffer> {
        let removed = self.buffers.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
            if self.current == name {
                self.current = self.order.last().cloned().unwrap_or_default();
            }
        }
        removed
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn set_current(&mut self, name: &str) -> bool {
        if self.buffers.contains_key(name) {
            self.current = name.to_string();
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> &OpenBuffer {
        self.buffers
            .get(&self.current)
            .expect("current buffer always exists")
    }

    pub fn current_mut(&mut self) -> &mut OpenBuffer {
        self.buffers
            .get_mut(&self.current)
            .expect("current buffer always exists")
    }

    pub fn buffer(&self, name: &str) -> Option<&OpenBuffer> {
        self.buffers.get(name)
    }

    pub fn buffer_mut(&mut self, name: &str) -> Option<&mut OpenBuffer> {
        self.buffers.get_mut(name)
    }

    pub fn buffer_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn any_modified(&self) -> bool {
        self.buffers.values().any(|b| b.modified)
    }

    /// Combine the pending repeat count with a digit typed in
    /// `RepeatMode`: `count = count * 10 + digit`, saturating rather than
    /// overflowing on a long digit run.
    pub fn accumulate_repetition_digit(&mut self, digit: u32) {
        self.repetitions = self
            .repetitions
            .saturating_mul(10)
            .saturating_add(digit as i32);
    }

    /// Consume and reset the one-shot modifiers (repetitions, direction,
    /// structure) after a command applies them.
    pub fn take_modifiers(&mut self) -> (i32, Direction, Structure) {
        let reps = std::mem::replace(&mut self.repetitions, 1);
        let dir = std::mem::take(&mut self.direction);
        let structure = std::mem::take(&mut self.structure);
        (reps, dir, structure)
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}
