//! Front matter extraction and parsing.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Front matter keys other than the ones lectern interprets itself.
pub type Metadata = BTreeMap<String, serde_yaml::Value>;

/// Parsed front matter block of a document.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Document title
    #[serde(default)]
    pub title: Option<String>,

    /// Short description, exposed to page templates
    #[serde(default)]
    pub description: Option<String>,

    /// Everything else
    #[serde(flatten)]
    pub extra: Metadata,
}

/// Extract front matter from document source.
///
/// The block must start on the first line with `---` and end with a line
/// containing only `---`. Returns the parsed front matter and the remaining
/// content after the block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some(after_dashes) = text.strip_prefix("---") else {
        return Ok((None, source));
    };

    // `----` or `--- text` is content, not an opening fence
    let after_open = match after_dashes
        .strip_prefix("\r\n")
        .or_else(|| after_dashes.strip_prefix('\n'))
    {
        Some(rest) => rest,
        None => return Ok((None, source)),
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &after_open[..offset];
            let remaining = &after_open[offset + line.len()..];

            let frontmatter = if yaml.trim().is_empty() {
                Frontmatter::default()
            } else {
                serde_yaml::from_str(yaml)
                    .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
            };

            return Ok((Some(frontmatter), remaining.trim_start_matches(['\r', '\n'])));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unclosed)
}

/// Errors that can occur when parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed front matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),
}
