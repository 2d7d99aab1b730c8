//! Application-wide constants and default values
//!
//! This module centralizes the magic numbers and default values used throughout
//! the crate, making them easier to maintain and configure.

/// Upload defaults
pub mod upload {
    /// Default maximum upload size (50MB)
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

    /// Extensions accepted by the upload validator
    pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

    /// Multipart form field carrying the uploaded file
    pub const FILE_FIELD: &str = "file";
}

/// Timing defaults
pub mod timing {
    /// Quiescence window for the search input, in milliseconds
    pub const SEARCH_DEBOUNCE_MS: u64 = 300;

    /// Delay before the first render so a loading indicator can paint, in milliseconds
    pub const FIRST_RENDER_DELAY_MS: u64 = 100;
}

/// Chart styling defaults
pub mod style {
    /// Series palette, cycled per trace
    pub const PALETTE: [(u8, u8, u8); 10] = [
        (99, 102, 241),  // Indigo
        (31, 119, 180),  // Blue
        (255, 127, 14),  // Orange
        (44, 160, 44),   // Green
        (214, 39, 40),   // Red
        (148, 103, 189), // Purple
        (140, 86, 75),   // Brown
        (227, 119, 194), // Pink
        (127, 127, 127), // Gray
        (23, 190, 207),  // Cyan
    ];

    /// Font family used by every generated layout
    pub const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

    /// Background color for plot and paper
    pub const BACKGROUND: &str = "white";

    /// Layout margins (top, right, bottom, left)
    pub const MARGIN: (u32, u32, u32, u32) = (30, 20, 40, 60);

    /// Layout margins applied by the renderer when the config has none
    pub const RENDER_MARGIN: (u32, u32, u32, u32) = (40, 20, 40, 60);

    pub const LINE_WIDTH: u32 = 2;
    pub const LINE_MARKER_SIZE: u32 = 6;
    pub const SCATTER_MARKER_SIZE: u32 = 8;
    pub const SCATTER_OPACITY: f64 = 0.7;
    pub const BAR_OPACITY: f64 = 0.8;
    pub const AREA_FILL_ALPHA: f64 = 0.2;
}

/// Backend API paths
pub mod api {
    pub const UPLOAD: &str = "/viz/upload";
    pub const DATA: &str = "/viz/data";
    pub const SAVE: &str = "/viz/save";
    pub const LIST: &str = "/viz/list";
    pub const VISUALIZATION: &str = "/viz";
    pub const RECENT: &str = "/api/recent";
    pub const SEARCH: &str = "/api/search";

    /// Default backend base URL
    pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
}

/// Configuration file paths
pub mod config {
    /// Configuration file name
    pub const CONFIG_FILE: &str = "plot-composer.json";
}
