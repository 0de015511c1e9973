//! Structural and syntax-highlighting trees over buffer contents.
//!
//! A [`ParseTree`] is a read-only, versioned snapshot: a range of the
//! buffer it covers, the display modifiers that range should carry, and a
//! set of nested children. [`TreeParser`] implementations build one from a
//! buffer's current contents; [`BufferSyntaxParser`] runs that build on a
//! background thread and installs the result for the render path to pick
//! up, without ever blocking the editor's main loop on a slow parse.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use edge_events::Notification;
use edge_text::{BufferContents, Modifier, Position, Range};

/// A node in a structural or syntax-highlighting tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    pub range: Range,
    pub modifiers: Modifier,
    pub properties: HashSet<String>,
    pub children: Vec<ParseTree>,
}

impl ParseTree {
    pub fn leaf(range: Range) -> Self {
        Self {
            range,
            modifiers: Modifier::empty(),
            properties: HashSet::new(),
            children: Vec::new(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifier) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.properties.insert(property.into());
        self
    }

    pub fn with_children(mut self, children: Vec<ParseTree>) -> Self {
        self.children = children;
        self
    }

    /// The deepest node whose range contains `position`, falling back to
    /// the root when no child matches. Used by the render path to decide
    /// which modifiers apply at a given column.
    pub fn deepest_at(&self, position: Position) -> &ParseTree {
        for child in &self.children {
            if child.range.contains(position) {
                return child.deepest_at(position);
            }
        }
        self
    }
}

/// Builds a [`ParseTree`] from a buffer's current contents. Implementors
/// must be deterministic and side-effect free: the background parser may
/// discard a half-finished build if the buffer changes again before it
/// completes.
pub trait TreeParser: Send + Sync {
    fn parse(&self, contents: &BufferContents) -> ParseTree;

    fn name(&self) -> &'static str;
}

fn whole_buffer_range(contents: &BufferContents) -> Range {
    let last_line = contents.len().saturating_sub(1) as u64;
    let last_col = contents.at(last_line as usize).size() as u64;
    Range {
        begin: Position { line: 0, column: 0 },
        end: Position {
            line: last_line,
            column: last_col,
        },
    }
}

/// No structure at all: a single leaf spanning the whole buffer. Used for
/// buffers with unrecognized or empty file extensions.
pub struct NullTreeParser;

impl TreeParser for NullTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        ParseTree::leaf(whole_buffer_range(contents))
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// One child per character. Used as the finest movement structure and as
/// the fallback when a richer grammar isn't available.
pub struct CharacterTreeParser;

impl TreeParser for CharacterTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        let mut children = Vec::new();
        for (i, line) in contents.iter().enumerate() {
            let line_no = i as u64;
            let len = line.size() as u64;
            for col in 0..len {
                children.push(ParseTree::leaf(Range {
                    begin: Position { line: line_no, column: col },
                    end: Position { line: line_no, column: col + 1 },
                }));
            }
        }
        ParseTree::leaf(whole_buffer_range(contents)).with_children(children)
    }

    fn name(&self) -> &'static str {
        "character"
    }
}

/// One child per whitespace-delimited word, per line.
pub struct WordTreeParser;

impl TreeParser for WordTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        let mut children = Vec::new();
        for (i, line) in contents.iter().enumerate() {
            let line_no = i as u64;
            let text = line.to_string();
            let mut col = 0u64;
            for word in text.split_whitespace() {
                let start = text[col as usize..]
                    .find(word)
                    .map(|off| col + off as u64)
                    .unwrap_or(col);
                let end = start + word.chars().count() as u64;
                children.push(ParseTree::leaf(Range {
                    begin: Position { line: line_no, column: start },
                    end: Position { line: line_no, column: end },
                }));
                col = end;
            }
        }
        ParseTree::leaf(whole_buffer_range(contents)).with_children(children)
    }

    fn name(&self) -> &'static str {
        "word"
    }
}

/// One child per line. The structure movement commands fall back to this
/// when a richer grammar has no better notion of "line".
pub struct LineTreeParser;

impl TreeParser for LineTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        let mut children = Vec::new();
        for (i, line) in contents.iter().enumerate() {
            let line_no = i as u64;
            let len = line.size() as u64;
            children.push(ParseTree::leaf(Range {
                begin: Position { line: line_no, column: 0 },
                end: Position { line: line_no, column: len },
            }));
        }
        ParseTree::leaf(whole_buffer_range(contents)).with_children(children)
    }

    fn name(&self) -> &'static str {
        "line"
    }
}

/// Rust syntax highlighting, built from a tree-sitter parse. Falls back to
/// [`LineTreeParser`]'s shape (without highlighting) if tree-sitter fails
/// to parse, rather than surfacing an error up to the editor.
pub struct RustTreeParser;

impl TreeParser for RustTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        let mut parser = tree_sitter::Parser::new();
        if parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .is_err()
        {
            return LineTreeParser.parse(contents);
        }
        let text = contents.to_string();
        let Some(tree) = parser.parse(&text, None) else {
            return LineTreeParser.parse(contents);
        };
        convert_ts_node(tree.root_node())
    }

    fn name(&self) -> &'static str {
        "rust"
    }
}

fn convert_ts_node(node: tree_sitter::Node) -> ParseTree {
    let start = node.start_position();
    let end = node.end_position();
    let range = Range {
        begin: Position {
            line: start.row as u64,
            column: start.column as u64,
        },
        end: Position {
            line: end.row as u64,
            column: end.column as u64,
        },
    };
    let modifiers = modifiers_for_node_kind(node.kind());
    let mut children = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        children.push(convert_ts_node(child));
    }
    ParseTree {
        range,
        modifiers,
        properties: [node.kind().to_string()].into_iter().collect(),
        children,
    }
}

fn modifiers_for_node_kind(kind: &str) -> Modifier {
    match kind {
        "line_comment" | "block_comment" => Modifier::DIM,
        "string_literal" | "char_literal" => Modifier::UNDERLINE,
        "identifier" | "type_identifier" => Modifier::empty(),
        _ if kind.ends_with("_keyword") || is_bare_keyword(kind) => Modifier::BOLD,
        _ => Modifier::empty(),
    }
}

fn is_bare_keyword(kind: &str) -> bool {
    matches!(
        kind,
        "fn" | "let" | "mut" | "pub" | "struct" | "enum" | "impl" | "trait" | "use" | "mod"
            | "if" | "else" | "match" | "for" | "while" | "loop" | "return"
    )
}

/// Markdown highlighting, built from `pulldown-cmark`'s event stream
/// rather than a tree-sitter grammar — the event stream already gives a
/// flat, ordered list of spans which maps directly onto sibling children.
pub struct MarkdownTreeParser;

impl TreeParser for MarkdownTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

        let text = contents.to_string();
        let line_starts = line_start_offsets(&text);
        let parser = Parser::new_ext(&text, Options::ENABLE_STRIKETHROUGH);
        let mut children = Vec::new();
        let mut heading_depth = 0u8;

        for (event, span) in parser.into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading_depth = level as u8;
                    continue;
                }
                Event::End(TagEnd::Heading(_)) => {
                    heading_depth = 0;
                    continue;
                }
                Event::Text(_) | Event::Code(_) => {}
                _ => continue,
            }
            let modifiers = if heading_depth > 0 {
                Modifier::BOLD
            } else {
                Modifier::empty()
            };
            let begin = offset_to_position(&line_starts, span.start);
            let end = offset_to_position(&line_starts, span.end);
            children.push(ParseTree::leaf(Range { begin, end }).with_modifiers(modifiers));
        }

        ParseTree::leaf(whole_buffer_range(contents)).with_children(children)
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}

fn line_start_offsets(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn offset_to_position(line_starts: &[usize], offset: usize) -> Position {
    let line = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    };
    let column = offset - line_starts[line];
    Position {
        line: line as u64,
        column: column as u64,
    }
}

/// Unified diff highlighting: classifies each line by its leading marker.
pub struct DiffTreeParser;

impl TreeParser for DiffTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        let mut children = Vec::new();
        for (i, line) in contents.iter().enumerate() {
            let line_no = i as u64;
            let text = line.to_string();
            let len = text.chars().count() as u64;
            let modifiers = match text.chars().next() {
                Some('+') => Modifier::BOLD,
                Some('-') => Modifier::DIM,
                Some('@') => Modifier::ITALIC,
                _ => Modifier::empty(),
            };
            children.push(
                ParseTree::leaf(Range {
                    begin: Position { line: line_no, column: 0 },
                    end: Position { line: line_no, column: len },
                })
                .with_modifiers(modifiers),
            );
        }
        ParseTree::leaf(whole_buffer_range(contents)).with_children(children)
    }

    fn name(&self) -> &'static str {
        "diff"
    }
}

/// CSV highlighting: alternates a modifier per field so columns are easy
/// to visually track; doesn't attempt to parse quoting edge cases.
pub struct CsvTreeParser;

impl TreeParser for CsvTreeParser {
    fn parse(&self, contents: &BufferContents) -> ParseTree {
        let mut children = Vec::new();
        for (i, line) in contents.iter().enumerate() {
            let line_no = i as u64;
            let text = line.to_string();
            let mut col = 0u64;
            for (field_idx, field) in text.split(',').enumerate() {
                let len = field.chars().count() as u64;
                let modifiers = if field_idx % 2 == 0 {
                    Modifier::empty()
                } else {
                    Modifier::DIM
                };
                children.push(
                    ParseTree::leaf(Range {
                        begin: Position { line: line_no, column: col },
                        end: Position { line: line_no, column: col + len },
                    })
                    .with_modifiers(modifiers),
                );
                col += len + 1;
            }
        }
        ParseTree::leaf(whole_buffer_range(contents)).with_children(children)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Picks a [`TreeParser`] from a file name's extension. Unknown or missing
/// extensions fall back to [`NullTreeParser`].
pub fn parser_for_extension(path: &str) -> Arc<dyn TreeParser> {
    let ext = path.rsplit('.').next().unwrap_or("");
    match ext {
        "rs" => Arc::new(RustTreeParser),
        "md" | "markdown" => Arc::new(MarkdownTreeParser),
        "diff" | "patch" => Arc::new(DiffTreeParser),
        "csv" => Arc::new(CsvTreeParser),
        _ => Arc::new(NullTreeParser),
    }
}

struct Data {
    tree: Arc<ParseTree>,
    generation: u64,
    cancel: Option<Notification>,
}

enum Job {
    Parse {
        generation: u64,
        parser: Arc<dyn TreeParser>,
        contents: BufferContents,
        cancel: Notification,
    },
    Shutdown,
}

/// Owns the current syntax tree for one buffer and re-derives it on a
/// single background worker whenever the buffer's contents change.
///
/// Only the most recent parse matters: queuing a new one cancels whatever
/// is in flight (via its [`Notification`]) rather than letting a stale
/// parse of an old version install itself over newer results.
pub struct BufferSyntaxParser {
    data: Arc<Mutex<Data>>,
    tx: mpsc::Sender<Job>,
    worker: Option<JoinHandle<()>>,
    next_generation: u64,
    observers: Arc<edge_events::Observers<()>>,
}

impl BufferSyntaxParser {
    pub fn new() -> Self {
        let data = Arc::new(Mutex::new(Data {
            tree: Arc::new(ParseTree::leaf(Range {
                begin: Position { line: 0, column: 0 },
                end: Position { line: 0, column: 0 },
            })),
            generation: 0,
            cancel: None,
        }));
        let observers = Arc::new(edge_events::Observers::new());
        let (tx, rx) = mpsc::channel::<Job>();
        let worker_data = data.clone();
        let worker_observers = observers.clone();
        let worker = std::thread::Builder::new()
            .name("edge-syntax-worker".into())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    match job {
                        Job::Shutdown => break,
                        Job::Parse {
                            generation,
                            parser,
                            contents,
                            cancel,
                        } => {
                            if cancel.has_been_notified() {
                                continue;
                            }
                            let tree = parser.parse(&contents);
                            if cancel.has_been_notified() {
                                continue;
                            }
                            let mut guard = worker_data.lock().unwrap();
                            if generation >= guard.generation {
                                guard.generation = generation;
                                guard.tree = Arc::new(tree);
                                guard.cancel = None;
                                drop(guard);
                                worker_observers.notify(&());
                            }
                        }
                    }
                }
            })
            .expect("spawn edge-syntax worker thread");

        Self {
            data,
            tx,
            worker: Some(worker),
            next_generation: 1,
            observers,
        }
    }

    /// Queue a re-parse of `contents`, cancelling any build still in
    /// flight for this buffer.
    pub fn request_parse(&mut self, parser: Arc<dyn TreeParser>, contents: BufferContents) {
        let cancel = Notification::new();
        {
            let mut guard = self.data.lock().unwrap();
            if let Some(prev) = guard.cancel.take() {
                prev.notify();
            }
            guard.cancel = Some(cancel.clone());
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        let _ = self.tx.send(Job::Parse {
            generation,
            parser,
            contents,
            cancel,
        });
    }

    /// The most recently installed tree. Always returns immediately,
    /// possibly serving a stale tree while a newer parse is still running.
    pub fn current_tree(&self) -> Arc<ParseTree> {
        self.data.lock().unwrap().tree.clone()
    }

    pub fn subscribe(&self, f: impl Fn(&()) + Send + Sync + 'static) {
        self.observers.subscribe(f);
    }
}

impl Default for BufferSyntaxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BufferSyntaxParser {
    fn drop(&mut self) {
        let _ = self.tx.send(Job::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_text::Line;
    use std::time::{Duration, Instant};

    fn contents_from_lines(lines: &[&str]) -> BufferContents {
        BufferContents::from_lines(lines.iter().map(|l| Line::new(*l)).collect())
    }

    #[test]
    fn null_parser_spans_whole_buffer() {
        let contents = contents_from_lines(&["hello", "world"]);
        let tree = NullTreeParser.parse(&contents);
        assert_eq!(tree.range.begin, Position { line: 0, column: 0 });
        assert!(tree.children.is_empty());
    }

    #[test]
    fn line_parser_has_one_child_per_line() {
        let contents = contents_from_lines(&["a", "bb", "ccc"]);
        let tree = LineTreeParser.parse(&contents);
        assert_eq!(tree.children.len(), 3);
        assert_eq!(tree.children[2].range.end.column, 3);
    }

    #[test]
    fn word_parser_splits_on_whitespace() {
        let contents = contents_from_lines(&["the quick  fox"]);
        let tree = WordTreeParser.parse(&contents);
        assert_eq!(tree.children.len(), 3);
    }

    #[test]
    fn rust_parser_tags_keyword_nodes() {
        let contents = contents_from_lines(&["fn main() {}"]);
        let tree = RustTreeParser.parse(&contents);
        assert_eq!(tree.range.end.column, 12);
        assert!(!tree.children.is_empty());
    }

    #[test]
    fn diff_parser_marks_added_and_removed_lines() {
        let contents = contents_from_lines(&["+added", "-removed", " context"]);
        let tree = DiffTreeParser.parse(&contents);
        assert_eq!(tree.children[0].modifiers, Modifier::BOLD);
        assert_eq!(tree.children[1].modifiers, Modifier::DIM);
        assert_eq!(tree.children[2].modifiers, Modifier::empty());
    }

    #[test]
    fn parser_for_extension_picks_known_grammars() {
        assert_eq!(parser_for_extension("main.rs").name(), "rust");
        assert_eq!(parser_for_extension("README.md").name(), "markdown");
        assert_eq!(parser_for_extension("data.csv").name(), "csv");
        assert_eq!(parser_for_extension("noext").name(), "null");
    }

    #[test]
    fn background_parse_installs_tree_and_notifies() {
        let mut bsp = BufferSyntaxParser::new();
        let notified = Arc::new(Mutex::new(false));
        let flag = notified.clone();
        bsp.subscribe(move |_| *flag.lock().unwrap() = true);

        let contents = contents_from_lines(&["fn main() {}"]);
        bsp.request_parse(Arc::new(RustTreeParser), contents);

        let deadline = Instant::now() + Duration::from_secs(2);
        while !*notified.lock().unwrap() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(*notified.lock().unwrap(), "background parse never installed");
        assert!(!bsp.current_tree().children.is_empty());
    }

    #[test]
    fn superseded_parse_is_cancelled() {
        let mut bsp = BufferSyntaxParser::new();
        let first = contents_from_lines(&["a"]);
        let second = contents_from_lines(&["b", "c"]);
        bsp.request_parse(Arc::new(LineTreeParser), first);
        bsp.request_parse(Arc::new(LineTreeParser), second);

        let deadline = Instant::now() + Duration::from_secs(2);
        while bsp.current_tree().children.len() != 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(bsp.current_tree().children.len(), 2);
    }

    /// A burst of keystrokes into a buffer with no dedicated grammar
    /// (`parser_for_extension` falls back to `NullTreeParser` for `.cpp`,
    /// since this crate ships no C++ grammar) queues one `request_parse`
    /// per keystroke; only the last one should ever install its tree.
    #[test]
    fn rapid_keystrokes_in_an_unparsed_extension_settle_on_the_last_edit() {
        let parser = parser_for_extension("scratch.cpp");
        assert_eq!(parser.name(), "null");

        let mut bsp = BufferSyntaxParser::new();
        let edits = ["x", "x;", "x; y", "x; y;", "x; y; z;"];
        for edit in edits {
            bsp.request_parse(parser.clone(), contents_from_lines(&[edit]));
        }

        let expected_end_column = edits.last().unwrap().len() as u64;
        let deadline = Instant::now() + Duration::from_secs(2);
        while bsp.current_tree().range.end.column != expected_end_column && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(bsp.current_tree().range.end.column, expected_end_column);
    }
}
