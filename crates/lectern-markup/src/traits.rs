//! The renderer seam between document sources and the site generator.

use crate::frontmatter::{FrontmatterError, Metadata};

/// Rendering switches fixed for a whole generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit the document title as a heading when the body does not have one
    pub show_title: bool,

    /// Place a table of contents at the top of the body
    pub toc: bool,

    /// Prefix section headings with hierarchical numbers
    pub section_numbers: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_title: true,
            toc: true,
            section_numbers: true,
        }
    }
}

/// Structured header of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentHeader {
    /// Document title, if the document declares one
    pub title: Option<String>,

    /// Short description from front matter
    pub description: Option<String>,

    /// Remaining front matter keys
    pub metadata: Metadata,
}

/// A fully rendered document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub header: DocumentHeader,

    /// HTML body, without any page layout around it
    pub html: String,
}

/// Errors that can occur while rendering a document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Front matter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Converts markup source text into HTML.
pub trait DocumentRenderer: Send + Sync {
    /// Renderer identifier (e.g., "markdown")
    fn name(&self) -> &'static str;

    /// Read only the document header.
    fn read_header(&self, source: &str) -> Result<DocumentHeader, RenderError>;

    /// Render the document body to HTML.
    fn render(&self, source: &str) -> Result<String, RenderError>;

    /// Read the header and render the body in one call.
    ///
    /// Implementations that can do both in a single parse should override this.
    fn render_document(&self, source: &str) -> Result<RenderedDocument, RenderError> {
        Ok(RenderedDocument {
            header: self.read_header(source)?,
            html: self.render(source)?,
        })
    }
}
