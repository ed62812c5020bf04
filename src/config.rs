use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

const CONFIG_FILE: &str = "config.toml";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Write the default configuration to config.toml
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path(CONFIG_FILE);

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Read config.toml from this directory. A missing file yields defaults.
    pub fn load_config(&self) -> Result<AppConfig> {
        let config_path = self.config_path(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version
    pub version: String,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub persistence: PersistenceConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub page_size: usize,
    pub row_numbers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub error: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub table_header: String,
    pub table_header_bg: String,
    pub row_numbers: String,
    /// Mileage cell before any commit (and after the page changes)
    pub editor_neutral: String,
    /// Mileage cell right after a successful commit
    pub editor_edited: String,
    /// Mileage cell whose last keystroke was rolled back
    pub editor_error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where saved edits are written; defaults to the cache directory
    pub output_path: Option<PathBuf>,
    /// Log saved edits instead of writing a file
    pub log_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Filter directive for the log file when RUST_LOG is unset
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            persistence: PersistenceConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: 15,
            row_numbers: false,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            table_header: "white".to_string(),
            table_header_bg: "indexed(236)".to_string(),
            row_numbers: "dark_gray".to_string(),
            editor_neutral: "#cccccc".to_string(),
            editor_edited: "#66cd00".to_string(),
            editor_error: "red".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load configuration from a specific config directory
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(manager.load_config()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence where it
    /// differs from the defaults)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }
        self.display.merge(other.display);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.persistence.merge(other.persistence);
        self.debug.merge(other.debug);
    }

    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.display.page_size == 0 {
            return Err(eyre!("page_size must be greater than 0"));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        tracing_subscriber::EnvFilter::try_new(&self.debug.log_level)
            .map_err(|e| eyre!("Invalid log_level '{}': {}", self.debug.log_level, e))?;

        let parser = ColorParser::new();
        for (name, value) in self.theme.colors.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }

        Ok(())
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.page_size != default.page_size {
            self.page_size = other.page_size;
        }
        if other.row_numbers != default.row_numbers {
            self.row_numbers = other.row_numbers;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    /// (name, value) for every color, in declaration order
    pub fn entries(&self) -> [(&'static str, &String); 13] {
        [
            ("primary", &self.primary),
            ("error", &self.error),
            ("dimmed", &self.dimmed),
            ("background", &self.background),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("text_secondary", &self.text_secondary),
            ("table_header", &self.table_header),
            ("table_header_bg", &self.table_header_bg),
            ("row_numbers", &self.row_numbers),
            ("editor_neutral", &self.editor_neutral),
            ("editor_edited", &self.editor_edited),
            ("editor_error", &self.editor_error),
        ]
    }

    fn entries_mut(&mut self) -> [&mut String; 13] {
        [
            &mut self.primary,
            &mut self.error,
            &mut self.dimmed,
            &mut self.background,
            &mut self.controls_bg,
            &mut self.text_primary,
            &mut self.text_secondary,
            &mut self.table_header,
            &mut self.table_header_bg,
            &mut self.row_numbers,
            &mut self.editor_neutral,
            &mut self.editor_edited,
            &mut self.editor_error,
        ]
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let defaults = default.entries();
        let theirs = other.entries();
        for (i, slot) in self.entries_mut().into_iter().enumerate() {
            if theirs[i].1 != defaults[i].1 {
                *slot = theirs[i].1.clone();
            }
        }
    }
}

impl PersistenceConfig {
    pub fn merge(&mut self, other: Self) {
        if other.output_path.is_some() {
            self.output_path = other.output_path;
        }
        if other.log_only {
            self.log_only = true;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.log_level != default.log_level {
            self.log_level = other.log_level;
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, `indexed(n)`, or named)
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();

        if trimmed.starts_with('#') {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        if let Some(inner) = lower
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let num = inner.trim().parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.replace(' ', "_").as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),
            "bright_black" | "gray" | "grey" | "dark_gray" | "dark_grey" => {
                Ok(Color::Indexed(8))
            }
            "bright_red" => Ok(Color::Indexed(9)),
            "bright_green" => Ok(Color::Indexed(10)),
            "bright_yellow" => Ok(Color::Indexed(11)),
            "bright_blue" => Ok(Color::Indexed(12)),
            "bright_magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" => Ok(Color::Indexed(14)),
            "bright_white" => Ok(Color::Indexed(15)),
            "light_gray" | "light_grey" => Ok(Color::Indexed(7)),
            "reset" | "default" => Ok(Color::Reset),
            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(n), or hex colors (#66cd00)",
                trimmed
            )),
        }
    }

    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#rrggbb) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let digits = s
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.is_ascii())
        .ok_or_else(|| eyre!("Invalid hex color format: '{}'. Expected format: #rrggbb", s))?;

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| eyre!("Invalid hex digits in color: {}", s))
    };

    Ok((component(0..2)?, component(2..4)?, component(4..6)?))
}

/// Nearest index in the xterm 256-color palette
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // grayscale ramp 232-255
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        return if gray < 8 {
            16
        } else if gray > 247 {
            231
        } else {
            232 + ((gray - 8) * 24 / 240) as u8
        };
    }

    // 6x6x6 cube 16-231
    let scale = |c: u8| (c as u16 * 5 / 255) as u8;
    16 + 36 * scale(r) + 6 * scale(g) + scale(b)
}

/// Nearest of the 8 basic ANSI colors
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Parsed colors ready for rendering
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let colors = config
            .colors
            .entries()
            .into_iter()
            .map(|(name, value)| {
                parser
                    .parse(value)
                    .map(|color| (name.to_string(), color))
                    .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self { colors })
    }

    /// Get a color by name, Reset if unknown
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Self {
            colors: HashMap::new(),
        })
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#66cd00").unwrap(), (0x66, 0xcd, 0x00));
        assert!(parse_hex("#66cd0").is_err());
        assert!(parse_hex("66cd00").is_err());
        assert!(parse_hex("#zzzzzz").is_err());
    }

    #[test]
    fn test_rgb_to_256_gray() {
        assert_eq!(rgb_to_256_color(0, 0, 0), 16);
        assert_eq!(rgb_to_256_color(255, 255, 255), 231);
        let gray = rgb_to_256_color(0xcc, 0xcc, 0xcc);
        assert!((232..=255).contains(&gray));
    }

    #[test]
    fn test_rgb_to_basic_ansi() {
        assert_eq!(rgb_to_basic_ansi(0x66, 0xcd, 0x00), Color::Green);
        assert_eq!(rgb_to_basic_ansi(0xcc, 0xcc, 0xcc), Color::White);
    }

    #[test]
    fn test_color_merge_takes_non_defaults() {
        let mut base = ColorConfig::default();
        let other = ColorConfig {
            editor_edited: "bright_green".to_string(),
            ..ColorConfig::default()
        };
        base.merge(other);
        assert_eq!(base.editor_edited, "bright_green");
        assert_eq!(base.editor_neutral, "#cccccc");
    }
}
