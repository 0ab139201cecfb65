use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Write as _;

use crate::error::RenderError;

/// Rendered text of one UI target, plus an optional state class such as
/// `on`, `off`, `fresh` or `stale`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub state: Option<String>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state: None,
        }
    }

    pub fn with_state(text: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state: Some(state.into()),
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Some(state) => write!(f, "{} [{}]", self.text, state),
            None => f.write_str(&self.text),
        }
    }
}

pub trait Renderer {
    fn render(&mut self, target: &str, fragment: &Fragment) -> Result<(), RenderError>;
}

/// Keeps the latest fragment per target. With `only` set, any other target
/// is reported missing.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    fragments: BTreeMap<String, Fragment>,
    known: Option<HashSet<String>>,
    renders: usize,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: Some(targets.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn get(&self, target: &str) -> Option<&Fragment> {
        self.fragments.get(target)
    }

    pub fn text(&self, target: &str) -> Option<&str> {
        self.fragments.get(target).map(|f| f.text.as_str())
    }

    pub fn fragments(&self) -> &BTreeMap<String, Fragment> {
        &self.fragments
    }

    /// Number of successful render calls so far.
    pub fn renders(&self) -> usize {
        self.renders
    }
}

impl Renderer for MemoryRenderer {
    fn render(&mut self, target: &str, fragment: &Fragment) -> Result<(), RenderError> {
        if let Some(known) = &self.known {
            if !known.contains(target) {
                return Err(RenderError::MissingTarget(target.to_string()));
            }
        }
        self.fragments.insert(target.to_string(), fragment.clone());
        self.renders += 1;
        Ok(())
    }
}

/// Longer texts (camera frames) are shortened on the console.
const MAX_TEXT: usize = 120;

/// Prints `target: text [state]` for fragments that changed.
pub struct ConsoleRenderer<W = std::io::Stdout> {
    out: W,
    last: BTreeMap<String, Fragment>,
}

impl ConsoleRenderer {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: std::io::Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: BTreeMap::new(),
        }
    }
}

impl<W: std::io::Write> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, target: &str, fragment: &Fragment) -> Result<(), RenderError> {
        if self.last.get(target) == Some(fragment) {
            return Ok(());
        }
        let line = if fragment.text.chars().count() > MAX_TEXT {
            let head: String = fragment.text.chars().take(MAX_TEXT / 2).collect();
            let short = Fragment {
                text: format!("{head}… ({} bytes)", fragment.text.len()),
                state: fragment.state.clone(),
            };
            format!("{target}: {short}")
        } else {
            format!("{target}: {fragment}")
        };
        writeln!(self.out, "{line}").map_err(|e| RenderError::Output(e.to_string()))?;
        self.out
            .flush()
            .map_err(|e| RenderError::Output(e.to_string()))?;
        self.last.insert(target.to_string(), fragment.clone());
        Ok(())
    }
}
