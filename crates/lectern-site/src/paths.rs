//! Mapping between source files and their generated counterparts.

use std::path::{Component, Path, PathBuf};

/// File name of the site's top-level index page.
pub const INDEX_FILE: &str = "index.html";

/// Extension given to rendered documents.
pub const PAGE_EXTENSION: &str = "html";

/// Errors from path mapping.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("{} is not inside {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// Lexically normalize a path, removing `.` and resolving `..` segments.
///
/// `..` segments that would climb above the start of a relative path are
/// kept; above a filesystem root they are dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }

    out
}

/// One `../` per directory between `relative_file`'s directory and the root.
pub fn root_prefix(relative_file: &Path) -> String {
    let depth = relative_file
        .parent()
        .map(|dir| {
            dir.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0);

    "../".repeat(depth)
}

/// Join the components of a relative path with `/`.
pub fn to_url(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Maps source paths under an input root to output paths under an output root.
#[derive(Debug, Clone)]
pub struct PathMapper {
    input_root: PathBuf,
    output_root: PathBuf,
    document_extension: String,
}

impl PathMapper {
    /// Create a mapper. `document_extension` may be given with or without a
    /// leading dot.
    pub fn new(
        input_root: impl AsRef<Path>,
        output_root: impl AsRef<Path>,
        document_extension: &str,
    ) -> Self {
        Self {
            input_root: normalize(input_root.as_ref()),
            output_root: normalize(output_root.as_ref()),
            document_extension: document_extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Whether the file is a document (as opposed to an asset).
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == self.document_extension)
    }

    /// Output location for a source file.
    ///
    /// Documents get their final extension replaced by `html`;
    /// assets keep their name.
    pub fn output_path(&self, source: &Path) -> Result<PathBuf, PathError> {
        let source = normalize(source);
        let relative =
            source
                .strip_prefix(&self.input_root)
                .map_err(|_| PathError::OutsideRoot {
                    path: source.clone(),
                    root: self.input_root.clone(),
                })?;

        let mut output = self.output_root.join(relative);
        if self.is_document(&source) {
            output.set_extension(PAGE_EXTENSION);
        }

        Ok(output)
    }

    /// Path of an output file relative to the output root.
    pub fn relative_output(&self, output_file: &Path) -> Result<PathBuf, PathError> {
        let output_file = normalize(output_file);
        output_file
            .strip_prefix(&self.output_root)
            .map(Path::to_path_buf)
            .map_err(|_| PathError::OutsideRoot {
                path: output_file.clone(),
                root: self.output_root.clone(),
            })
    }

    /// Relative prefix leading from the output file's directory to the output root.
    pub fn root_prefix(&self, output_file: &Path) -> Result<String, PathError> {
        Ok(root_prefix(&self.relative_output(output_file)?))
    }

    /// Relative link to the site index, or `None` for the index page itself.
    pub fn index_link(&self, output_file: &Path) -> Result<Option<String>, PathError> {
        let relative = self.relative_output(output_file)?;
        if relative == Path::new(INDEX_FILE) {
            return Ok(None);
        }

        Ok(Some(format!("{}{}", root_prefix(&relative), INDEX_FILE)))
    }

    /// Output-root-relative URL of an output file.
    pub fn relative_url(&self, output_file: &Path) -> Result<String, PathError> {
        Ok(to_url(&self.relative_output(output_file)?))
    }
}
