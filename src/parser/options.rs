//! Parsing options and configuration.

/// Options for reading tabular documents.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// How XML trees without an array are handled
    pub locator: LocatorMode,

    /// Trim surrounding whitespace from text cells (CSV, TSV, XLSX)
    pub trim_cells: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the array locator mode.
    pub fn with_locator(mut self, mode: LocatorMode) -> Self {
        self.locator = mode;
        self
    }

    /// Fail instead of falling back to a single-row table.
    pub fn strict(mut self) -> Self {
        self.locator = LocatorMode::Strict;
        self
    }

    /// Enable or disable cell trimming.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim_cells = trim;
        self
    }

    pub(crate) fn cell(&self, s: &str) -> String {
        if self.trim_cells {
            s.trim().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Behaviour when a nested document has no array to treat as rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocatorMode {
    /// Use the first array found depth-first, else one row for the whole document
    #[default]
    FirstArray,
    /// Use the first array found depth-first, else fail with a parse error
    Strict,
}
