//! Status line rendering: turns an `OpenBuffer`'s `Status` plus buffer
//! name/modified flag into the single text row drawn at the bottom of a
//! buffer's region.

use edge_buffer::{OpenBuffer, Severity};
use edge_text::Modifier;

use crate::writer::Writer;

fn modifier_for(severity: Severity) -> Modifier {
    match severity {
        Severity::Info => Modifier::empty(),
        Severity::Warning => Modifier::BOLD,
        Severity::Error => Modifier::BOLD | Modifier::REVERSE,
    }
}

/// Render `buffer`'s status line into `row`, truncated/padded to `width`
/// columns: `name [modified] — message`.
pub fn render_status_line(writer: &mut Writer, buffer: &OpenBuffer, x: u16, row: u16, width: u16) {
    let modified_marker = if buffer.modified { " [+]" } else { "" };
    let text = if buffer.status.message.is_empty() {
        format!("{}{}", buffer.name, modified_marker)
    } else {
        format!("{}{} — {}", buffer.name, modified_marker, buffer.status.message)
    };
    let truncated: String = text.chars().take(width as usize).collect();
    let padded = format!("{truncated:<width$}", width = width as usize);

    writer.move_to(x, row);
    writer.set_modifier(modifier_for(buffer.status.severity));
    writer.print(padded);
    writer.reset_modifier();
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_buffer::Status;

    #[test]
    fn status_line_includes_modified_marker() {
        let mut buffer = OpenBuffer::new("a.txt");
        buffer.mark_modified();
        let mut writer = Writer::new();
        render_status_line(&mut writer, &buffer, 0, 23, 20);
        assert!(!writer.is_empty());
    }

    #[test]
    fn error_severity_gets_a_visible_modifier() {
        let mut buffer = OpenBuffer::new("a.txt");
        buffer.status = Status::error("boom");
        assert_eq!(modifier_for(buffer.status.severity), Modifier::BOLD | Modifier::REVERSE);
    }
}
