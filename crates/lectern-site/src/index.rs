//! Site index generation.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::generator::{io_error, BuildError};
use crate::nav::{NavTree, NodeId};
use crate::output::write_atomic;
use crate::paths::{PathMapper, INDEX_FILE};
use crate::templates::{IndexContext, IndexLink, IndexSection, TemplateEngine, INDEX_TEMPLATE};

/// Writes a browsable table of contents for the whole site.
pub struct IndexBuilder<'a> {
    templates: &'a TemplateEngine,
    site_title: &'a str,
    styles: &'a [String],
}

impl<'a> IndexBuilder<'a> {
    /// File used when a document already produced `index.html`.
    pub const FALLBACK_FILE: &'static str = "contents.html";

    /// Heading of the index page.
    pub const TITLE: &'static str = "Contents";

    pub fn new(templates: &'a TemplateEngine, site_title: &'a str, styles: &'a [String]) -> Self {
        Self {
            templates,
            site_title,
            styles,
        }
    }

    /// Output file name for the index, given the output-relative paths the
    /// run already produced.
    pub fn target(taken: &HashSet<String>) -> Option<&'static str> {
        [INDEX_FILE, Self::FALLBACK_FILE]
            .into_iter()
            .find(|name| !taken.contains(*name))
    }

    /// Nested sections for the site root, one per directory. Directories
    /// without documents appear with their title only.
    pub fn sections(nav: &NavTree) -> Option<IndexSection> {
        let site_root = nav.site_root()?;
        let mut built: HashMap<NodeId, IndexSection> = HashMap::new();

        for id in nav.postorder(site_root) {
            let node = nav.node(id);

            let children: Vec<IndexSection> = node
                .children()
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();

            let entries: Vec<IndexLink> = node
                .entries()
                .iter()
                .map(|entry| IndexLink {
                    title: entry.title().to_string(),
                    href: entry.path().to_string(),
                })
                .collect();

            built.insert(
                id,
                IndexSection {
                    title: node.title().to_string(),
                    entries,
                    children,
                },
            );
        }

        built.remove(&site_root)
    }

    /// Render the index page and write it to `file` under the output root.
    /// Returns where it was written, or `None` if the tree is empty.
    pub fn build(
        &self,
        nav: &NavTree,
        mapper: &PathMapper,
        file: &str,
    ) -> Result<Option<PathBuf>, BuildError> {
        let Some(site) = Self::sections(nav) else {
            return Ok(None);
        };

        let path = mapper.output_root().join(file);

        let context = IndexContext {
            title: Self::TITLE.to_string(),
            site_title: self.site_title.to_string(),
            root: mapper.root_prefix(&path)?,
            index: mapper.index_link(&path)?,
            contents: None,
            styles: self.styles.to_vec(),
            site,
        };

        let html = self
            .templates
            .render_index(&context)
            .map_err(|e| BuildError::TemplateError {
                path: path.clone(),
                template: INDEX_TEMPLATE.to_string(),
                source: e,
            })?;

        write_atomic(&path, html.as_bytes()).map_err(io_error("write", &path, None))?;

        tracing::info!("Wrote site index to {}", path.display());

        Ok(Some(path))
    }
}
