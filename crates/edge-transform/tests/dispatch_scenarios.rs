//! Drives real `CommandMode`/`InsertMode` instances through the mode-stack
//! dispatch algorithm (§4.6: pop, handle, re-push-or-redeliver per
//! `ModeTransition`), the same loop `edge-bin`'s binary runs, to exercise
//! end-to-end key sequences rather than individual transformations.

use edge_buffer::{EditorState, Mode, ModeTransition};
use edge_transform::CommandMode;

fn feed(editor: &mut EditorState, stack: &mut Vec<Box<dyn Mode>>, key: char) {
    loop {
        let Some(mut mode) = stack.pop() else {
            return;
        };
        match mode.handle_key(editor, key) {
            ModeTransition::Stay => {
                stack.push(mode);
                return;
            }
            ModeTransition::Push(next) => {
                stack.push(mode);
                stack.push(next);
                return;
            }
            ModeTransition::Pop => continue,
            ModeTransition::PopHandled => return,
            ModeTransition::PopAll => {
                stack.clear();
                return;
            }
        }
    }
}

fn feed_str(editor: &mut EditorState, stack: &mut Vec<Box<dyn Mode>>, keys: &str) {
    for key in keys.chars() {
        feed(editor, stack, key);
    }
}

#[test]
fn scenario_1_two_insert_runs_join_into_one_line() {
    let mut editor = EditorState::new();
    let mut stack: Vec<Box<dyn Mode>> = vec![Box::new(CommandMode::new())];

    feed_str(&mut editor, &mut stack, "ialejo\u{1b}");
    feed_str(&mut editor, &mut stack, "i forero\u{1b}");

    assert_eq!(editor.current().contents.len(), 1);
    assert_eq!(editor.current().contents.at(0).to_string(), "alejo forero");
    assert_eq!(editor.current().active_cursor(), edge_text::Position::new(0, 12));
}

#[test]
fn scenario_quit_requires_confirmation_once_buffer_is_modified() {
    let mut editor = EditorState::new();
    let mut stack: Vec<Box<dyn Mode>> = vec![Box::new(CommandMode::new())];

    feed_str(&mut editor, &mut stack, "ihi\u{1b}");
    assert!(editor.current().modified);

    feed(&mut editor, &mut stack, 'q');
    assert!(!editor.terminate, "quitting a modified buffer must prompt first");

    feed_str(&mut editor, &mut stack, "!\r");
    assert!(editor.terminate);
}

#[test]
fn scenario_close_then_goto_buffer_end_and_delete_word_are_reachable() {
    let mut editor = EditorState::new();
    editor.open(edge_buffer::OpenBuffer::new("scratch2"));
    let mut stack: Vec<Box<dyn Mode>> = vec![Box::new(CommandMode::new())];

    feed_str(&mut editor, &mut stack, "ifoo bar\u{1b}");
    feed_str(&mut editor, &mut stack, "gg");
    assert_eq!(editor.current().active_cursor(), edge_text::Position::new(0, 0));

    feed_str(&mut editor, &mut stack, "Dw");
    assert_eq!(editor.current().contents.at(0).to_string(), " bar");

    feed(&mut editor, &mut stack, 'c');
    assert_eq!(editor.buffer_names().count(), 2, "a modified buffer must prompt before closing");
    feed_str(&mut editor, &mut stack, "!\r");
    assert_eq!(editor.buffer_names().count(), 1);
}
