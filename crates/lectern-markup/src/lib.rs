//! Document rendering for lectern.
//!
//! This crate turns lightweight-markup source text into an HTML body plus a
//! structured document header. The site generator only talks to the
//! [`DocumentRenderer`] trait; [`MarkdownRenderer`] is the implementation it
//! uses by default.

pub mod frontmatter;
pub mod renderer;
pub mod traits;

pub use frontmatter::{Frontmatter, FrontmatterError, Metadata};
pub use renderer::{slugify, MarkdownRenderer};
pub use traits::{DocumentHeader, DocumentRenderer, RenderError, RenderOptions, RenderedDocument};
