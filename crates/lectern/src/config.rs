//! Configuration file (lectern.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub site: SiteConfig,
    pub render: RenderConfig,
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub title: String,
    pub document_extension: String,
    /// Stylesheets linked from every page, relative to the output root
    pub styles: Vec<String>,
    pub templates: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Documentation".to_string(),
            document_extension: "md".to_string(),
            styles: Vec::new(),
            templates: None,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub show_title: bool,
    pub toc: bool,
    pub section_numbers: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_title: true,
            toc: true,
            section_numbers: true,
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    pub transactional: bool,
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempfile::tempdir().unwrap();

        let config = load(&temp.path().join("lectern.toml")).unwrap();

        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.site.document_extension, "md");
        assert!(config.render.toc);
        assert!(!config.build.transactional);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("lectern.toml");
        fs::write(
            &path,
            r#"
[site]
title = "Handbook"
styles = ["css/site.css"]

[render]
section_numbers = false
"#,
        )
        .unwrap();

        let config = load(&path).unwrap();

        assert_eq!(config.site.title, "Handbook");
        assert_eq!(config.site.document_extension, "md");
        assert_eq!(config.site.styles, vec!["css/site.css"]);
        assert_eq!(
            config.render,
            RenderConfig {
                show_title: true,
                toc: true,
                section_numbers: false,
            }
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("lectern.toml");
        fs::write(&path, "[site\ntitle = ").unwrap();

        let err = load(&path).unwrap_err();

        assert!(err.to_string().contains("lectern.toml"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("lectern.toml");
        fs::write(&path, "[build]\nminify = true\n").unwrap();

        assert!(load(&path).is_err());
    }
}
