use std::path::{Path, PathBuf};

use crate::io::DEFAULT_IMPORT_EDGE;
use crate::ops::segmentation::SegmentationSettings;

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Draw the background grid on the canvas
    pub show_grid: bool,
    /// Grid spacing in canvas units
    pub grid_step: f32,
    /// Longest edge given to imported photos
    pub import_max_edge: f32,
    /// Multiplier applied to library elements' native size
    pub element_scale: f32,
    /// Colour distance threshold for the subject keyer (0..1)
    pub segmentation_threshold: f32,
    /// Mask feather radius in pixels
    pub segmentation_feather: f32,
    /// Longest edge of the effects-modal preview
    pub preview_max_edge: u32,
    /// Last directory used for exports. Empty = let the dialog decide.
    pub export_dir: String,
    /// off / error / warn / info / debug / trace
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let seg = SegmentationSettings::default();
        Self {
            show_grid: true,
            grid_step: 50.0,
            import_max_edge: DEFAULT_IMPORT_EDGE,
            element_scale: crate::elements::DEFAULT_ELEMENT_SCALE,
            segmentation_threshold: seg.threshold,
            segmentation_feather: seg.edge_feather,
            preview_max_edge: 512,
            export_dir: String::new(),
            log_level: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/visionboard/visionboard_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\VisionBoard\visionboard_settings.cfg
    /// On macOS:   ~/Library/Application Support/VisionBoard/visionboard_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("visionboard");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("visionboard_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            let config_dir = PathBuf::from(appdata).join("VisionBoard");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("visionboard_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("VisionBoard");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("visionboard_settings.cfg"));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("visionboard_settings.cfg")))
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "show_grid={}\n\
             grid_step={}\n\
             import_max_edge={}\n\
             element_scale={}\n\
             segmentation_threshold={}\n\
             segmentation_feather={}\n\
             preview_max_edge={}\n\
             export_dir={}\n\
             log_level={}\n",
            self.show_grid,
            self.grid_step,
            self.import_max_edge,
            self.element_scale,
            self.segmentation_threshold,
            self.segmentation_feather,
            self.preview_max_edge,
            self.export_dir,
            self.log_level,
        )
    }

    /// Parse `key=value` lines. Unknown keys and bad values keep defaults.
    pub fn from_config_str(content: &str) -> Self {
        let d = Self::default();
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "show_grid" => {
                    s.show_grid = match val {
                        "true" => true,
                        "false" => false,
                        _ => d.show_grid,
                    }
                }
                "grid_step" => {
                    s.grid_step = val.parse().ok().filter(|v: &f32| *v >= 4.0).unwrap_or(d.grid_step);
                }
                "import_max_edge" => {
                    s.import_max_edge = val.parse().ok().filter(|v: &f32| *v > 0.0).unwrap_or(d.import_max_edge);
                }
                "element_scale" => {
                    s.element_scale = val.parse().ok().filter(|v: &f32| *v > 0.0).unwrap_or(d.element_scale);
                }
                "segmentation_threshold" => {
                    s.segmentation_threshold = val
                        .parse()
                        .ok()
                        .filter(|v: &f32| (0.0..=1.0).contains(v))
                        .unwrap_or(d.segmentation_threshold);
                }
                "segmentation_feather" => {
                    s.segmentation_feather =
                        val.parse().ok().filter(|v: &f32| *v >= 0.0).unwrap_or(d.segmentation_feather);
                }
                "preview_max_edge" => {
                    s.preview_max_edge = val.parse().ok().filter(|v: &u32| *v >= 32).unwrap_or(d.preview_max_edge);
                }
                "export_dir" => s.export_dir = val.to_string(),
                "log_level" => s.log_level = val.to_lowercase(),
                _ => log::debug!("settings: unknown key '{}'", key),
            }
        }
        s
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_str(&content),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log::warn!("could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_config_string())
    }

    pub fn segmentation(&self) -> SegmentationSettings {
        SegmentationSettings {
            threshold: self.segmentation_threshold,
            edge_feather: self.segmentation_feather,
            ..SegmentationSettings::default()
        }
    }

    /// `log_level` as a filter. Unknown names fall back to `Info`.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn export_dir(&self) -> Option<&Path> {
        if self.export_dir.is_empty() {
            None
        } else {
            Some(Path::new(&self.export_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_values_keep_defaults() {
        let s = AppSettings::from_config_str("grid_step=banana\nsegmentation_threshold=7\nshow_grid=false\n");
        assert_eq!(s.grid_step, 50.0);
        assert_eq!(s.segmentation_threshold, AppSettings::default().segmentation_threshold);
        assert!(!s.show_grid);
    }

    #[test]
    fn show_grid_needs_an_exact_bool() {
        for val in ["maybe", "TRUE", "1", ""] {
            let s = AppSettings::from_config_str(&format!("show_grid={}\n", val));
            assert!(s.show_grid, "show_grid={}", val);
        }
        assert!(AppSettings::from_config_str("show_grid=true\n").show_grid);
    }

    #[test]
    fn element_scale_defaults_to_library_scale() {
        assert_eq!(AppSettings::default().element_scale, crate::elements::DEFAULT_ELEMENT_SCALE);
    }

    #[test]
    fn log_level_parses() {
        let mut s = AppSettings::default();
        s.log_level = "debug".into();
        assert_eq!(s.log_level_filter(), log::LevelFilter::Debug);
        s.log_level = "loud".into();
        assert_eq!(s.log_level_filter(), log::LevelFilter::Info);
    }
}
