use colstore_common::PlotDesignation;

/// Construction-time settings for a [`crate::Column`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConfig {
    /// Display width in pixels; `0` lets the view size the column.
    pub default_width: i32,
    pub default_plot_designation: PlotDesignation,
    /// Seed for `rand()` and `rsample()` in formulas.
    pub random_seed: u64,
    /// Upper bound on the row count a document load may create.
    pub max_loaded_rows: usize,
}

/// Default cap on rows restored from a document.
pub const DEFAULT_MAX_LOADED_ROWS: usize = 1 << 24;

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            default_width: 0,
            default_plot_designation: PlotDesignation::None,
            random_seed: 0,
            max_loaded_rows: DEFAULT_MAX_LOADED_ROWS,
        }
    }
}

impl ColumnConfig {
    pub fn with_width(mut self, width: i32) -> Self {
        self.default_width = width;
        self
    }

    pub fn with_plot_designation(mut self, designation: PlotDesignation) -> Self {
        self.default_plot_designation = designation;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_max_loaded_rows(mut self, rows: usize) -> Self {
        self.max_loaded_rows = rows;
        self
    }
}
