use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::time::ClockStyle;

/// Scale and threshold constants for the timeline engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub pixels_per_hour: f64,
    pub min_block_height: u32,
    pub padding_hours: u32,
    pub min_range_minutes: u32,
    pub min_timeline_height: f64,
    pub half_hour_markers: bool,
    /// Blocks shorter than this render on a single line.
    pub compact_threshold: u32,
    pub marker_style: ClockStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clock_style: ClockStyle,
    pub layout: LayoutConfig,
    pub tag_colors: BTreeMap<String, String>,
    pub default_tag_color: String,
    pub log_level: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pixels_per_hour: 30.0,
            min_block_height: 30,
            padding_hours: 2,
            min_range_minutes: 4 * 60,
            min_timeline_height: 400.0,
            half_hour_markers: true,
            compact_threshold: 45,
            marker_style: ClockStyle::Hour12,
        }
    }
}

fn default_tag_colors() -> BTreeMap<String, String> {
    [
        ("work", "#4A90E2"),
        ("leisure", "#4CAF50"),
        ("grind", "#9E9E9E"),
        ("health", "#FFC107"),
    ]
    .into_iter()
    .map(|(tag, color)| (tag.to_string(), color.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock_style: ClockStyle::Hour12,
            layout: LayoutConfig::default(),
            tag_colors: default_tag_colors(),
            default_tag_color: "#C0C0C0".to_string(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load the per-user config, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let config: Config = serde_yaml::from_str(&contents).context("parsing config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let contents = serde_yaml::to_string(self).context("serializing config")?;
        fs::write(path, contents).with_context(|| format!("writing {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if !(layout.pixels_per_hour.is_finite() && layout.pixels_per_hour > 0.0) {
            bail!("layout.pixels_per_hour must be positive");
        }
        if !(layout.min_timeline_height.is_finite() && layout.min_timeline_height >= 0.0) {
            bail!("layout.min_timeline_height cannot be negative");
        }
        if layout.min_range_minutes > 24 * 60 {
            bail!("layout.min_range_minutes cannot exceed a full day");
        }
        if layout.padding_hours > 24 {
            bail!("layout.padding_hours cannot exceed a full day");
        }
        Ok(())
    }

    /// Color for the first tag that has an entry in the table.
    pub fn color_for_tags(&self, tags: &[String]) -> &str {
        tags.iter()
            .find_map(|tag| self.tag_colors.get(&tag.to_lowercase()))
            .map(String::as_str)
            .unwrap_or(&self.default_tag_color)
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "dayplan").context("locating config directory")?;
        Ok(dirs.config_dir().join("config.yml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.yml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "clock_style: 24h\nlayout:\n  pixels_per_hour: 60\n  half_hour_markers: false\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.clock_style, ClockStyle::Hour24);
        assert_eq!(config.layout.pixels_per_hour, 60.0);
        assert!(!config.layout.half_hour_markers);
        assert_eq!(config.layout.min_block_height, 30);
        assert_eq!(config.tag_colors.get("work").map(String::as_str), Some("#4A90E2"));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "layout:\n  pixels_per_hour: 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn rejects_oversized_padding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "layout:\n  padding_hours: 80000000\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs::write(&path, "layout:\n  padding_hours: 24\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().layout.padding_hours, 24);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.yml");
        let mut config = Config::default();
        config.tag_colors.insert("study".into(), "#AA00FF".into());
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn tag_colors_come_from_the_table() {
        let config = Config::default();
        assert_eq!(config.color_for_tags(&["Leisure".into()]), "#4CAF50");
        assert_eq!(
            config.color_for_tags(&["misc".into(), "work".into()]),
            "#4A90E2"
        );
        assert_eq!(config.color_for_tags(&[]), "#C0C0C0");
    }
}
