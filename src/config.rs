/// Application-level constants
pub const APP_NAME: &str = "MediScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides `OverlayConfig::max_display_width`.
pub const MAX_DISPLAY_WIDTH_ENV: &str = "MEDISCAN_MAX_DISPLAY_WIDTH";

/// Display width above which annotated images are downscaled.
pub const DEFAULT_MAX_DISPLAY_WIDTH: u32 = 1024;

/// Log filter used when `RUST_LOG` is unset or invalid.
pub fn default_log_filter() -> &'static str {
    "info,mediscan_lib=debug"
}

/// Styling and sizing for the annotation overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Downscale threshold in pixels. 0 disables downscaling.
    pub max_display_width: u32,
    /// Outline color (RGBA).
    pub highlight: [u8; 4],
    pub min_stroke: u32,
    pub max_stroke: u32,
    /// Source width per pixel of stroke.
    pub stroke_divisor: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_display_width: DEFAULT_MAX_DISPLAY_WIDTH,
            highlight: [255, 0, 0, 255],
            min_stroke: 3,
            max_stroke: 5,
            stroke_divisor: 200,
        }
    }
}

impl OverlayConfig {
    pub fn with_max_display_width(mut self, width: u32) -> Self {
        self.max_display_width = width;
        self
    }

    /// Defaults, with `MEDISCAN_MAX_DISPLAY_WIDTH` applied when set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(MAX_DISPLAY_WIDTH_ENV) {
            Ok(raw) => config.with_max_display_width_str(&raw),
            Err(_) => config,
        }
    }

    fn with_max_display_width_str(self, raw: &str) -> Self {
        match raw.trim().parse::<u32>() {
            Ok(width) => self.with_max_display_width(width),
            Err(_) => {
                tracing::warn!(
                    var = MAX_DISPLAY_WIDTH_ENV,
                    "Ignoring unparseable display width, using default"
                );
                self
            }
        }
    }
}
