use std::path::{Path, PathBuf};

use crate::canvas::{check_size, Anchor};
use crate::colour::Colour;
use crate::error::Result;

const SETTINGS_FILE: &str = "paintgl_settings.cfg";

/// Which adapter class to ask wgpu for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GpuPreference {
    #[default]
    Auto,
    LowPower,
    HighPerformance,
}

impl GpuPreference {
    pub fn name(&self) -> &'static str {
        match self {
            GpuPreference::Auto => "auto",
            GpuPreference::LowPower => "low power",
            GpuPreference::HighPerformance => "high performance",
        }
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "low power" => GpuPreference::LowPower,
            "high performance" => GpuPreference::HighPerformance,
            _ => GpuPreference::Auto,
        }
    }
}

/// Fill used for a new canvas and for area exposed by a resize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Background {
    #[default]
    White,
    Transparent,
}

impl Background {
    pub fn colour(&self) -> Colour {
        match self {
            Background::White => Colour::WHITE,
            Background::Transparent => Colour::TRANSPARENT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Background::White => "white",
            Background::Transparent => "transparent",
        }
    }
}

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Render the on-screen scene through wgpu (falls back to software when
    /// no adapter is available)
    pub gpu_acceleration: bool,
    pub preferred_gpu: GpuPreference,
    /// Size of the canvas created at startup
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: Background,
    /// Anchor preselected in the resize controls
    pub resize_anchor: Anchor,
    /// Initial thickness of the pen, eraser, spline and shape tools
    pub default_thickness: f32,
    /// Zoom change per scroll notch
    pub zoom_step: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            gpu_acceleration: true,
            preferred_gpu: GpuPreference::Auto,
            canvas_width: 800,
            canvas_height: 600,
            background: Background::White,
            resize_anchor: Anchor::TopLeft,
            default_thickness: 4.0,
            zoom_step: 0.1,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/paintgl/paintgl_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PaintGL\paintgl_settings.cfg
    /// On macOS:   ~/Library/Application Support/PaintGL/paintgl_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("paintgl");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            let config_dir = PathBuf::from(appdata).join("PaintGL");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("PaintGL");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE)))
        }
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
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk.  A failed write is logged, never fatal.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log::warn!("could not save settings to {}: {e}", path.display());
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_config_string())?;
        Ok(())
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "gpu_acceleration={}\n\
             preferred_gpu={}\n\
             canvas_width={}\n\
             canvas_height={}\n\
             background={}\n\
             resize_anchor={}\n\
             default_thickness={}\n\
             zoom_step={}\n",
            self.gpu_acceleration,
            self.preferred_gpu.name(),
            self.canvas_width,
            self.canvas_height,
            self.background.name(),
            self.resize_anchor,
            self.default_thickness,
            self.zoom_step,
        )
    }

    /// Unknown keys and unparsable values keep their defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "gpu_acceleration" => {
                    s.gpu_acceleration = val == "true";
                }
                "preferred_gpu" => {
                    s.preferred_gpu = GpuPreference::parse(val);
                }
                "canvas_width" => {
                    s.canvas_width = val.parse().ok().filter(|w| check_size(*w, 1).is_ok()).unwrap_or(800);
                }
                "canvas_height" => {
                    s.canvas_height = val.parse().ok().filter(|h| check_size(1, *h).is_ok()).unwrap_or(600);
                }
                "background" => {
                    s.background = match val {
                        "transparent" => Background::Transparent,
                        _ => Background::White,
                    };
                }
                "resize_anchor" => {
                    s.resize_anchor = val.parse().unwrap_or_default();
                }
                "default_thickness" => {
                    s.default_thickness = val
                        .parse::<f32>()
                        .ok()
                        .filter(|t| t.is_finite() && *t >= 1.0)
                        .unwrap_or(4.0);
                }
                "zoom_step" => {
                    s.zoom_step = val
                        .parse::<f32>()
                        .ok()
                        .filter(|z| z.is_finite() && *z > 0.0)
                        .unwrap_or(0.1);
                }
                _ => {}
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_settings_load_back() {
        let settings = AppSettings {
            gpu_acceleration: false,
            preferred_gpu: GpuPreference::HighPerformance,
            canvas_width: 1024,
            canvas_height: 256,
            background: Background::Transparent,
            resize_anchor: Anchor::BottomRight,
            default_thickness: 9.5,
            zoom_step: 0.25,
        };
        let path = std::env::temp_dir().join(format!("paintgl_settings_{}.cfg", std::process::id()));
        assert!(settings.save_to(&path).is_ok());
        let loaded = AppSettings::load_from(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let s = AppSettings::parse("canvas_width=-3\ncanvas_height=99999\nzoom_step=fast\nresize_anchor=middle\nnonsense\nbackground=white\n");
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = AppSettings::load_from(Path::new("/definitely/not/here/paintgl.cfg"));
        assert_eq!(s, AppSettings::default());
    }
}
