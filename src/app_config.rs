//! File configuration for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use videos_downloader_core::ClipStrategy;

/// Flat `key = value` configuration file with downloader defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default URL list file.
    pub urls_file: Option<PathBuf>,
    /// Default download directory.
    pub download_dir: Option<PathBuf>,
    /// Copy streams instead of re-encoding by default.
    pub fast: Option<bool>,
    /// Default clip strategy.
    pub clip_strategy: Option<ClipStrategy>,
    /// Path to the yt-dlp executable.
    pub yt_dlp: Option<PathBuf>,
    /// Path to the ffmpeg executable.
    pub ffmpeg: Option<PathBuf>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Log filter directive for this setting.
    #[must_use]
    pub fn filter(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/videos-downloader/config.toml`
/// 2. `$HOME/.config/videos-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("videos-downloader")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("videos-downloader")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "urls_file" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `urls_file` value on line {line_no}"))?;
                cfg.urls_file = Some(PathBuf::from(parsed));
            }
            "download_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `download_dir` value on line {line_no}"))?;
                cfg.download_dir = Some(PathBuf::from(parsed));
            }
            "fast" => {
                let parsed = parse_boolean(value)
                    .with_context(|| format!("Invalid `fast` value on line {line_no}"))?;
                cfg.fast = Some(parsed);
            }
            "clip_strategy" => {
                let parsed = parse_string_literal(value)
                    .and_then(|s| s.parse::<ClipStrategy>().map_err(anyhow::Error::msg))
                    .with_context(|| format!("Invalid `clip_strategy` value on line {line_no}"))?;
                cfg.clip_strategy = Some(parsed);
            }
            "yt_dlp" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `yt_dlp` value on line {line_no}"))?;
                cfg.yt_dlp = Some(PathBuf::from(parsed));
            }
            "ffmpeg" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `ffmpeg` value on line {line_no}"))?;
                cfg.ffmpeg = Some(PathBuf::from(parsed));
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .and_then(|s| parse_verbosity(&s))
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parsed);
            }
            other => bail!("Unknown config key `{other}` on line {line_no}"),
        }
    }
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_full() {
        let cfg = parse_config_str(
            r#"
urls_file = "lists/today.txt"
download_dir = "D:\videos"
fast = true
clip_strategy = "direct-section"
yt_dlp = "/opt/bin/yt-dlp"
ffmpeg = "/opt/bin/ffmpeg"
verbosity = "verbose"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.urls_file, Some(PathBuf::from("lists/today.txt")));
        assert_eq!(cfg.download_dir, Some(PathBuf::from(r"D:\videos")));
        assert_eq!(cfg.fast, Some(true));
        assert_eq!(cfg.clip_strategy, Some(ClipStrategy::DirectSection));
        assert_eq!(cfg.yt_dlp, Some(PathBuf::from("/opt/bin/yt-dlp")));
        assert_eq!(cfg.ffmpeg, Some(PathBuf::from("/opt/bin/ffmpeg")));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str("fast = false\n").expect("partial config should parse");
        assert_eq!(cfg.fast, Some(false));
        assert!(cfg.download_dir.is_none());
        assert!(cfg.clip_strategy.is_none());
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r##"
download_dir = "clips#1" # hash inside quotes is kept
fast = true # copy streams
"##,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.download_dir, Some(PathBuf::from("clips#1")));
        assert_eq!(cfg.fast, Some(true));
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key expected");
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_bad_strategy() {
        let err = parse_config_str(r#"clip_strategy = "sideways""#).expect_err("bad strategy");
        assert!(format!("{err:#}").contains("clip_strategy"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_path() {
        let err = parse_config_str("download_dir = downloads").expect_err("unquoted path");
        assert!(err.to_string().contains("download_dir"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("fast").expect_err("missing equals");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_verbosity_filters() {
        assert_eq!(VerbositySetting::Default.filter(), "info");
        assert_eq!(VerbositySetting::Verbose.filter(), "debug");
        assert_eq!(VerbositySetting::Quiet.filter(), "error");
        assert_eq!(VerbositySetting::Debug.filter(), "trace");
    }
}
