//! Lectern site generator
//!
//! Walks a directory of markup documents, renders each one into an HTML page
//! inside a mirrored output tree, copies every other file unchanged, and
//! writes a browsable index of the whole site.

pub mod generator;
pub mod index;
pub mod nav;
pub mod output;
pub mod paths;
pub mod templates;

pub use generator::{BuildError, BuildResult, CancellationFlag, GeneratorConfig, SiteGenerator};
pub use index::IndexBuilder;
pub use nav::{Entry, NavTree, Node, NodeId};
pub use paths::{PathError, PathMapper};
pub use templates::TemplateEngine;
