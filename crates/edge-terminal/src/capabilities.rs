//! Terminal capability probing: a small set of booleans the renderer
//! consults when deciding whether to attempt scroll-region optimizations
//! or fall back to full line clears. Detection runs once at startup and
//! is cheap by construction; the struct is non-exhaustive so more
//! capabilities can be added without breaking callers.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    pub supports_scroll_region: bool,
}

impl TerminalCapabilities {
    /// Probe via `$TERM`. `TERM=dumb` (CI log capture, `M-x shell` in
    /// Emacs) means line-at-a-time output with no cursor addressing;
    /// every other value crossterm targets is assumed capable.
    pub fn detect() -> Self {
        Self::detect_for_term(std::env::var("TERM").ok().as_deref())
    }

    pub fn detect_for_term(term: Option<&str>) -> Self {
        Self {
            supports_scroll_region: term != Some("dumb"),
        }
    }
}
