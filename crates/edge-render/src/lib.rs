//! Frame assembly: walks an [`edge_view::Widget`] tree, projects each
//! referenced buffer's visible contents through [`window::compute_window`],
//! and queues the resulting text and status lines on a [`writer::Writer`].
//!
//! This crate owns no editor state; it only reads an `EditorState` and
//! produces `Writer` commands. `edge_terminal::TerminalCapabilities`
//! drives the wrap policy: word-wrapping a line changes how many screen
//! rows it occupies, which on a terminal without scroll-region support
//! means every edit below the wrap point repaints the whole screen. On
//! such terminals we truncate long lines instead of reflowing them.

pub mod status;
pub mod window;
pub mod writer;

use edge_buffer::EditorState;
use edge_terminal::TerminalCapabilities;
use edge_text::Position;
use edge_view::{Placement, Widget};

pub use window::{ScreenLine, WindowParams, WrapStyle};
pub use writer::{Command, Writer};

const STATUS_ROWS: u16 = 1;

/// Render one buffer's placement: its content rows via `compute_window`,
/// then a status line on the region's last row. Returns the buffer's
/// recomputed viewport top so the caller can persist it.
fn render_buffer(
    writer: &mut Writer,
    editor: &EditorState,
    name: &str,
    region: edge_view::LayoutRegion,
    capabilities: TerminalCapabilities,
) -> Option<Position> {
    let buffer = editor.buffer(name)?;
    let content_rows = region.height.saturating_sub(STATUS_ROWS);
    let wrap_style = if capabilities.supports_scroll_region {
        WrapStyle::BreakWords
    } else {
        WrapStyle::None
    };
    let params = WindowParams {
        wrap_style,
        lines_shown: content_rows as u64,
        columns_shown: region.width as u64,
        margin_lines: 2,
    };
    let active = if editor.current_name() == name { Some(buffer.active_cursor()) } else { None };
    let (lines, new_top) = window::compute_window(
        &buffer.contents,
        buffer.cursors.default_set(),
        active,
        buffer.view_start,
        params,
    );

    for (row, screen_line) in lines.iter().enumerate() {
        let text = buffer.contents.at(screen_line.source_line as usize).to_string();
        let slice: String = text
            .chars()
            .skip(screen_line.start_column as usize)
            .take((screen_line.end_column - screen_line.start_column) as usize)
            .collect();
        writer.move_to(region.x, region.y + row as u16);
        writer.clear_line();
        writer.print(slice);
    }

    if content_rows < region.height {
        status::render_status_line(writer, buffer, region.x, region.y + content_rows, region.width);
    }

    Some(new_top)
}

fn render_buffers_list(writer: &mut Writer, editor: &EditorState, region: edge_view::LayoutRegion) {
    for (row, name) in editor.buffer_names().take(region.height as usize).enumerate() {
        writer.move_to(region.x, region.y + row as u16);
        writer.clear_line();
        writer.print(name.to_string());
    }
}

/// Lay `widget` out over a `screen_width` x `screen_height` screen, render
/// every leaf, and return the queued (but not flushed) commands plus the
/// new viewport top for each rendered buffer.
pub fn render_frame(
    editor: &EditorState,
    widget: &Widget,
    screen_width: u16,
    screen_height: u16,
    capabilities: TerminalCapabilities,
) -> (Writer, Vec<(String, Position)>) {
    let region = edge_view::LayoutRegion::full_screen(screen_width, screen_height);
    let mut placements = Vec::new();
    edge_view::place(widget, region, &mut placements);

    let mut writer = Writer::new();
    let mut new_viewports = Vec::new();
    for Placement { region, widget } in placements {
        match widget {
            Widget::Buffer(name) => {
                if let Some(top) = render_buffer(&mut writer, editor, name, region, capabilities) {
                    new_viewports.push((name.clone(), top));
                }
            }
            Widget::BuffersList => render_buffers_list(&mut writer, editor, region),
            Widget::Split { .. } => {}
        }
    }
    (writer, new_viewports)
}
