//! `BufferContentsWindow`: the pure, side-effect-free projection from a
//! buffer's contents, cursors, and viewport into an ordered list of
//! screen lines. This is the only place cursor-to-screen mapping is
//! decided; the terminal writer downstream never re-derives it.

use std::collections::BTreeSet;

use edge_cursor::CursorsSet;
use edge_text::{BufferContents, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapStyle {
    None,
    BreakWords,
}

/// One visible row: the half-open column range of the source line it
/// covers, whether the active cursor falls in it, and the columns of
/// every other cursor that does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLine {
    pub source_line: u64,
    pub start_column: u64,
    pub end_column: u64,
    pub has_active_cursor: bool,
    pub current_cursors: BTreeSet<u64>,
}

impl ScreenLine {
    fn owns_column(&self, column: u64, is_last_wrap_of_line: bool) -> bool {
        if is_last_wrap_of_line {
            column >= self.start_column && column <= self.end_column
        } else {
            column >= self.start_column && column < self.end_column
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WindowParams {
    pub wrap_style: WrapStyle,
    pub lines_shown: u64,
    pub columns_shown: u64,
    pub margin_lines: u64,
}

/// Compute the column breakpoints of one source line under `wrap_style`:
/// each entry is the exclusive end column of one wrapped row. `BreakWords`
/// backs up to the last whitespace boundary at or before `columns_shown`
/// when one exists past the start of the current row; otherwise (a
/// single word longer than the width) it hard-breaks.
fn wrap_breaks(line: &str, columns_shown: u64, wrap_style: WrapStyle) -> Vec<u64> {
    let len = line.chars().count() as u64;
    if columns_shown == 0 || len <= columns_shown {
        return vec![len];
    }
    match wrap_style {
        WrapStyle::None => vec![len],
        WrapStyle::BreakWords => {
            let chars: Vec<char> = line.chars().collect();
            let mut breaks = Vec::new();
            let mut start = 0u64;
            while start + columns_shown < len {
                let limit = start + columns_shown;
                let mut brk = limit;
                let mut found = false;
                let mut i = limit;
                while i > start {
                    if chars[(i - 1) as usize].is_whitespace() {
                        brk = i;
                        found = true;
                        break;
                    }
                    i -= 1;
                }
                if !found {
                    brk = limit;
                }
                breaks.push(brk);
                start = brk;
            }
            breaks.push(len);
            breaks
        }
    }
}

/// Project `contents` into screen lines. `viewport_begin` is adjusted (a
/// copy is returned) to keep `active_position` within `margin_lines` of
/// the top/bottom edge; the caller should persist the returned viewport
/// for the next frame.
pub fn compute_window(
    contents: &BufferContents,
    cursors: &CursorsSet,
    active_position: Option<Position>,
    viewport_begin: Position,
    params: WindowParams,
) -> (Vec<ScreenLine>, Position) {
    let last_line = contents.len() as u64 - 1;
    let active = active_position.map(|mut p| {
        p.line = p.line.min(last_line);
        let line_len = contents.at(p.line as usize).size() as u64;
        p.column = p.column.min(line_len);
        p
    });

    let margin = params.margin_lines.min(params.lines_shown / 2);
    let mut begin_line = viewport_begin.line.min(last_line);
    if let Some(active) = active {
        if active.line < begin_line + margin {
            begin_line = active.line.saturating_sub(margin);
        } else if params.lines_shown > 0 && active.line + margin + 1 > begin_line + params.lines_shown {
            begin_line = (active.line + margin + 1).saturating_sub(params.lines_shown);
        }
    }
    begin_line = begin_line.min(last_line);

    let mut screen_lines = Vec::new();
    let mut line = begin_line;
    while screen_lines.len() < params.lines_shown as usize && line <= last_line {
        let text = contents.at(line as usize).to_string();
        let breaks = wrap_breaks(&text, params.columns_shown, params.wrap_style);
        let mut start = 0u64;
        for &end in &breaks {
            if screen_lines.len() >= params.lines_shown as usize {
                break;
            }
            screen_lines.push(ScreenLine {
                source_line: line,
                start_column: start,
                end_column: end,
                has_active_cursor: false,
                current_cursors: BTreeSet::new(),
            });
            start = end;
        }
        line += 1;
    }

    let active_id = cursors.active_id();
    for (id, pos) in cursors.iter_with_id() {
        for idx in 0..screen_lines.len() {
            if screen_lines[idx].source_line != pos.line {
                continue;
            }
            let is_last_wrap = screen_lines
                .iter()
                .skip(idx + 1)
                .find(|s| s.source_line == pos.line)
                .is_none();
            let screen_line = &mut screen_lines[idx];
            if screen_line.owns_column(pos.column, is_last_wrap) {
                screen_line.current_cursors.insert(pos.column);
                if Some(id) == active_id {
                    screen_line.has_active_cursor = true;
                }
                break;
            }
        }
    }

    (screen_lines, Position::new(begin_line, 0))
}
