//! A thin batched writer over crossterm: render passes queue move/clear/
//! print/style commands and flush once, rather than issuing a syscall
//! per cell.

use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};
use std::io::{stdout, Write};

use edge_text::Modifier;

#[derive(Debug)]
pub enum Command {
    MoveTo(u16, u16),
    ClearLine,
    SetModifier(Modifier),
    ResetModifier,
    Print(String),
}

#[derive(Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn clear_line(&mut self) {
        self.cmds.push(Command::ClearLine);
    }

    pub fn set_modifier(&mut self, m: Modifier) {
        if !m.is_empty() {
            self.cmds.push(Command::SetModifier(m));
        }
    }

    pub fn reset_modifier(&mut self) {
        self.cmds.push(Command::ResetModifier);
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn flush(self) -> Result<()> {
        let mut out = stdout();
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => {
                    queue!(out, MoveTo(x, y))?;
                }
                Command::ClearLine => {
                    queue!(out, Clear(ClearType::CurrentLine))?;
                }
                Command::SetModifier(m) => {
                    if m.contains(Modifier::REVERSE) {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                    if m.contains(Modifier::BOLD) {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if m.contains(Modifier::DIM) {
                        queue!(out, SetAttribute(Attribute::Dim))?;
                    }
                    if m.contains(Modifier::UNDERLINE) {
                        queue!(out, SetAttribute(Attribute::Underlined))?;
                    }
                    if m.contains(Modifier::ITALIC) {
                        queue!(out, SetAttribute(Attribute::Italic))?;
                    }
                }
                Command::ResetModifier => {
                    queue!(out, SetAttribute(Attribute::Reset))?;
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_not_queued() {
        let mut w = Writer::new();
        w.print("");
        assert!(w.is_empty());
    }

    #[test]
    fn a_noop_modifier_is_not_queued() {
        let mut w = Writer::new();
        w.set_modifier(Modifier::empty());
        assert!(w.is_empty());
    }

    #[test]
    fn commands_accumulate_in_order() {
        let mut w = Writer::new();
        w.move_to(1, 2);
        w.print("hi");
        assert_eq!(w.len(), 2);
    }
}
