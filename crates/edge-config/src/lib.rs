//! Configuration loading: a TOML file read from the path resolved per
//! `$EDGE_PATH` (colon-separated candidate directories), falling back to
//! `$HOME/.edge`, then `/`. Controls the default wrap style, scroll
//! margin, per-extension parser selection, and the keyword/typo/symbol
//! lists fed to `update_parser`.
//!
//! Unknown fields are ignored (TOML deserialization tolerance) so the
//! file format can grow without breaking older configs; a file that
//! fails to parse at all falls back to built-in defaults rather than
//! aborting startup.

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigPlatformTraits {
    pub is_windows: bool,
    pub supports_scroll_region: bool,
}

impl ConfigPlatformTraits {
    pub const fn new(is_windows: bool, supports_scroll_region: bool) -> Self {
        Self { is_windows, supports_scroll_region }
    }
}

/// Viewport shape at the moment a margin needs to be clamped. Kept
/// separate from the render crate's own layout types so this crate
/// never depends on `edge-render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigContext {
    pub viewport_columns: u16,
    pub viewport_rows: u16,
    pub status_rows: u16,
    pub platform: ConfigPlatformTraits,
}

impl ConfigContext {
    pub fn new(viewport_columns: u16, viewport_rows: u16, status_rows: u16, platform: ConfigPlatformTraits) -> Self {
        Self { viewport_columns, viewport_rows, status_rows, platform }
    }

    pub fn text_rows(&self) -> u16 {
        self.viewport_rows.saturating_sub(self.status_rows)
    }

    pub fn from_viewport_height(viewport_rows: u16) -> Self {
        Self { viewport_columns: 0, viewport_rows, status_rows: 0, platform: ConfigPlatformTraits::default() }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WrapStyleName {
    None,
    BreakWords,
}

impl Default for WrapStyleName {
    fn default() -> Self {
        WrapStyleName::BreakWords
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScrollConfig {
    #[serde(default)]
    pub margin_lines: u16,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WrapConfig {
    #[serde(default)]
    pub style: WrapStyleName,
}

/// File-extension → parser-name table (e.g. `"rs" -> "rust"`), consulted
/// instead of the built-in extension table when an extension is present.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ParserConfig {
    #[serde(default)]
    pub by_extension: HashMap<String, String>,
}

/// Keyword/typo/symbol lists fed to `update_parser` for syntax
/// highlighting overrides.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SyntaxConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub typos: Vec<String>,
    #[serde(default)]
    pub symbol_chars: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub wrap: WrapConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub syntax: SyntaxConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,
    pub file: ConfigFile,
    pub effective_margin_lines: u16,
}

/// `$EDGE_PATH` colon-separated directories (first containing
/// `config.toml` wins), else `$HOME/.edge`, else `/`.
pub fn discover() -> PathBuf {
    if let Ok(path_var) = std::env::var("EDGE_PATH") {
        for dir in path_var.split(':').filter(|d| !d.is_empty()) {
            let candidate = PathBuf::from(dir).join("config.toml");
            if candidate.exists() {
                return candidate;
            }
        }
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".edge").join("config.toml");
    }
    PathBuf::from("/config.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config { raw: Some(content), file, effective_margin_lines: 0 }),
            Err(e) => {
                tracing::warn!(target: "config", path = %path.display(), error = %e, "parse_failed_using_defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Apply viewport + platform context to compute the clamped margin:
    /// at most `(text_rows - 2) / 2`, so the margin never swallows the
    /// whole visible area on a short terminal.
    pub fn apply_context(&mut self, ctx: ConfigContext) -> u16 {
        let raw = self.file.scroll.margin_lines;
        let text_rows = ctx.text_rows();
        let (clamped, max) = if text_rows <= 3 {
            (0, 0)
        } else {
            let max = (text_rows.saturating_sub(2)) / 2;
            (raw.min(max), max)
        };

        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max,
                text_rows,
                viewport_rows = ctx.viewport_rows,
                status_rows = ctx.status_rows,
                supports_scroll_region = ctx.platform.supports_scroll_region,
                is_windows = ctx.platform.is_windows,
                "scroll_margin_lines_clamped"
            );
        }
        self.effective_margin_lines = clamped;
        clamped
    }

    pub fn apply_viewport_height(&mut self, viewport_height: u16) -> u16 {
        self.apply_context(ConfigContext::from_viewport_height(viewport_height))
    }

    /// Recompute the effective margin on a viewport or platform change.
    /// Returns `Some(new_margin)` only when it actually changed.
    pub fn recompute_with_context(&mut self, ctx: ConfigContext) -> Option<u16> {
        let prev = self.effective_margin_lines;
        let current = self.apply_context(ctx);
        if current != prev { Some(current) } else { None }
    }

    pub fn recompute_after_resize(&mut self, new_viewport_height: u16) -> Option<u16> {
        self.recompute_with_context(ConfigContext::from_viewport_height(new_viewport_height))
    }

    /// The parser name configured for `extension`, if any override exists.
    pub fn parser_for_extension(&self, extension: &str) -> Option<&str> {
        self.file.parser.by_extension.get(extension).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx_with_text_rows(rows: u16) -> ConfigContext {
        ConfigContext::new(80, rows, 0, ConfigPlatformTraits::default())
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.scroll.margin_lines, 0);
        assert_eq!(cfg.file.wrap.style, WrapStyleName::BreakWords);
    }

    #[test]
    fn parses_margin_and_wrap_style() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[scroll]\nmargin_lines = 3\n[wrap]\nstyle = \"none\"\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.scroll.margin_lines, 3);
        assert_eq!(cfg.file.wrap.style, WrapStyleName::None);
        cfg.apply_context(ctx_with_text_rows(40));
        assert_eq!(cfg.effective_margin_lines, 3);
    }

    #[test]
    fn clamps_margin_exceeding_half_text_rows() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[scroll]\nmargin_lines = 50\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let eff = cfg.apply_context(ctx_with_text_rows(20));
        assert_eq!(eff, 9);
    }

    #[test]
    fn recompute_reports_none_when_unchanged() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[scroll]\nmargin_lines = 10\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        cfg.apply_context(ctx_with_text_rows(50));
        assert_eq!(cfg.effective_margin_lines, 10);
        let changed = cfg.recompute_with_context(ctx_with_text_rows(10));
        assert_eq!(changed, Some(4));
        let changed2 = cfg.recompute_with_context(ctx_with_text_rows(11));
        assert_eq!(changed2, None);
    }

    #[test]
    fn parses_per_extension_parser_overrides() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[parser.by_extension]\nrs = \"rust\"\nmd = \"markdown\"\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.parser_for_extension("rs"), Some("rust"));
        assert_eq!(cfg.parser_for_extension("txt"), None);
    }

    #[test]
    fn parses_syntax_keyword_and_symbol_lists() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[syntax]\nkeywords = [\"fn\", \"let\"]\ntypos = [\"teh\"]\nsymbol_chars = \"_$\"\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.syntax.keywords, vec!["fn", "let"]);
        assert_eq!(cfg.file.syntax.symbol_chars, "_$");
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "not valid [[[ toml").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.scroll.margin_lines, 0);
    }
}
