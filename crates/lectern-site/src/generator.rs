//! Static site generator.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use walkdir::WalkDir;

use lectern_markup::{DocumentRenderer, MarkdownRenderer, RenderError, RenderOptions};

use crate::index::IndexBuilder;
use crate::nav::{Entry, NavTree, NodeId};
use crate::output::{copy_atomic, write_atomic, Staging};
use crate::paths::{normalize, PathError, PathMapper, INDEX_FILE};
use crate::templates::{PageContext, TemplateEngine, PAGE_TEMPLATE};

/// Configuration for a generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Source docs directory
    pub input_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Site title
    pub title: String,

    /// Extension of document files, without the dot
    pub document_extension: String,

    /// Stylesheets to link from every page, relative to the output root
    pub styles: Vec<String>,

    /// Directory with templates overriding the built-in ones
    pub templates_dir: Option<PathBuf>,

    /// Options for the document renderer
    pub render: RenderOptions,

    /// Build into a staging directory and swap it in only on success
    pub transactional: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("docs"),
            output_dir: PathBuf::from("dist"),
            title: "Documentation".to_string(),
            document_extension: "md".to_string(),
            styles: vec![],
            templates_dir: None,
            render: RenderOptions::default(),
            transactional: false,
        }
    }
}

/// Result of a generation run.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages rendered
    pub pages: usize,

    /// Number of assets copied
    pub assets: usize,

    /// Location of the generated site index, if one was written
    pub index: Option<PathBuf>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,

    /// Navigation tree of the generated site
    pub nav: NavTree,
}

/// Errors that can occur during generation. Every error aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid input directory {}: {message}", .path.display())]
    InputError { path: PathBuf, message: String },

    #[error("Failed to render {}: {source}", .path.display())]
    RenderError {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("Failed to render template {template} for {}: {source}", .path.display())]
    TemplateError {
        path: PathBuf,
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Failed to {op} {}{}: {source}", .path.display(), describe_target(.target))]
    IoError {
        op: &'static str,
        path: PathBuf,
        target: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    PathError(#[from] PathError),

    #[error("Generation cancelled")]
    Cancelled,
}

fn describe_target(target: &Option<PathBuf>) -> String {
    target
        .as_ref()
        .map(|t| format!(" to {}", t.display()))
        .unwrap_or_default()
}

pub(crate) fn io_error<'a>(
    op: &'static str,
    path: &'a Path,
    target: Option<&'a Path>,
) -> impl FnOnce(io::Error) -> BuildError + 'a {
    move |source| BuildError::IoError {
        op,
        path: path.to_path_buf(),
        target: target.map(Path::to_path_buf),
        source,
    }
}

/// Shared flag for stopping a run between directory visits.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Immediate contents of one directory, each list sorted by file name.
#[derive(Debug, Default)]
struct DirListing {
    dirs: Vec<PathBuf>,
    documents: Vec<PathBuf>,
    assets: Vec<PathBuf>,
}

/// Work item of the traversal.
enum Visit {
    /// Create the directory's node and schedule its subdirectories
    Enter { dir: PathBuf, parent: NodeId },

    /// All subdirectories are done; render documents and copy assets
    Finish {
        node: NodeId,
        documents: Vec<PathBuf>,
        assets: Vec<PathBuf>,
    },
}

/// State accumulated during one run.
struct Run {
    mapper: PathMapper,
    nav: NavTree,
    excluded: Vec<PathBuf>,
    visited: HashSet<PathBuf>,
    written: HashSet<String>,
    /// File name the site index will be written to, chosen before the walk
    index_file: Option<&'static str>,
    pages: usize,
    assets: usize,
}

/// Static site generator.
pub struct SiteGenerator {
    config: GeneratorConfig,
    renderer: Box<dyn DocumentRenderer>,
    templates: TemplateEngine,
    styles: Vec<String>,
    cancel: CancellationFlag,
}

impl SiteGenerator {
    /// Create a generator using the Markdown renderer.
    pub fn new(config: GeneratorConfig) -> Result<Self, BuildError> {
        let renderer = Box::new(MarkdownRenderer::new(config.render));
        Self::with_renderer(config, renderer)
    }

    /// Create a generator with a custom document renderer.
    pub fn with_renderer(
        config: GeneratorConfig,
        renderer: Box<dyn DocumentRenderer>,
    ) -> Result<Self, BuildError> {
        let templates = match &config.templates_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(BuildError::InputError {
                        path: dir.clone(),
                        message: "template directory not found".to_string(),
                    });
                }
                TemplateEngine::with_overrides(dir)
            }
            None => TemplateEngine::new(),
        }
        .map_err(|e| BuildError::TemplateError {
            path: config.templates_dir.clone().unwrap_or_default(),
            template: e.name().unwrap_or("built-in").to_string(),
            source: e,
        })?;

        let styles = config
            .styles
            .iter()
            .map(|s| s.trim_start_matches('/').to_string())
            .collect();

        tracing::debug!("Using {} renderer", renderer.name());

        Ok(Self {
            config,
            renderer,
            templates,
            styles,
            cancel: CancellationFlag::new(),
        })
    }

    /// Stop the run when `flag` is raised.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// Generate the site.
    pub fn generate(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let input_root = self.resolve_input()?;
        let output_root = resolve_output(&self.config.output_dir)?;

        if input_root.starts_with(&output_root) {
            return Err(BuildError::InputError {
                path: input_root,
                message: format!(
                    "the output directory {} must not contain it",
                    output_root.display()
                ),
            });
        }

        let staging = if self.config.transactional {
            Some(
                Staging::new(&output_root)
                    .map_err(io_error("create staging directory for", &output_root, None))?,
            )
        } else {
            None
        };

        let write_root = staging
            .as_ref()
            .map(|s| s.path().to_path_buf())
            .unwrap_or_else(|| output_root.clone());

        fs::create_dir_all(&write_root).map_err(io_error("create directory", &write_root, None))?;

        // Keep the walk out of the output tree when it lives inside the input
        let excluded = [&output_root, &write_root]
            .into_iter()
            .filter_map(|p| fs::canonicalize(p).ok())
            .collect();

        let mut run = Run {
            mapper: PathMapper::new(&input_root, &write_root, &self.config.document_extension),
            nav: NavTree::new(),
            excluded,
            visited: HashSet::new(),
            written: HashSet::new(),
            index_file: None,
            pages: 0,
            assets: 0,
        };

        // Only files directly in the input root can claim a root-level name
        run.index_file = IndexBuilder::target(&root_outputs(&run.mapper)?);
        if run.index_file.is_none() {
            tracing::warn!(
                "Both {} and {} are generated from the input; skipping the site index",
                INDEX_FILE,
                IndexBuilder::FALLBACK_FILE
            );
        }

        self.walk(&mut run)?;

        let index = match run.index_file {
            Some(file) => IndexBuilder::new(&self.templates, &self.config.title, &self.styles)
                .build(&run.nav, &run.mapper, file)?
                .map(|path| match path.strip_prefix(&write_root) {
                    Ok(relative) => output_root.join(relative),
                    Err(_) => path,
                }),
            None => None,
        };

        if let Some(staging) = staging {
            staging
                .commit(&output_root)
                .map_err(io_error("replace", &output_root, None))?;
            tracing::info!("Replaced {} with the new build", output_root.display());
        }

        Ok(BuildResult {
            pages: run.pages,
            assets: run.assets,
            index,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: output_root,
            nav: run.nav,
        })
    }

    fn resolve_input(&self) -> Result<PathBuf, BuildError> {
        let path = &self.config.input_dir;
        let input_error = |message: String| BuildError::InputError {
            path: path.clone(),
            message,
        };

        let metadata = fs::metadata(path).map_err(|e| input_error(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(input_error("not a directory".to_string()));
        }

        fs::read_dir(path).map_err(|e| input_error(e.to_string()))?;
        fs::canonicalize(path).map_err(|e| input_error(e.to_string()))
    }

    /// Depth-first walk with an explicit stack. A directory's subdirectories
    /// are fully generated before its own documents and assets.
    fn walk(&self, run: &mut Run) -> Result<(), BuildError> {
        let mut stack = vec![Visit::Enter {
            dir: run.mapper.input_root().to_path_buf(),
            parent: run.nav.root(),
        }];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter { dir, parent } => {
                    if self.cancel.is_cancelled() {
                        return Err(BuildError::Cancelled);
                    }

                    let real = fs::canonicalize(&dir).map_err(io_error("resolve", &dir, None))?;
                    if run.excluded.contains(&real) {
                        tracing::debug!("Skipping output directory {}", dir.display());
                        continue;
                    }
                    if !run.visited.insert(real) {
                        tracing::warn!(
                            "Skipping {}: directory was already visited through a link",
                            dir.display()
                        );
                        continue;
                    }

                    let listing = list_dir(&dir, &run.mapper)?;
                    let relative = dir
                        .strip_prefix(run.mapper.input_root())
                        .unwrap_or(Path::new(""))
                        .to_path_buf();
                    let node = run.nav.add_directory(parent, dir_title(&dir), relative);

                    tracing::debug!(
                        "Entering {} ({} directories, {} documents, {} assets)",
                        dir.display(),
                        listing.dirs.len(),
                        listing.documents.len(),
                        listing.assets.len()
                    );

                    stack.push(Visit::Finish {
                        node,
                        documents: listing.documents,
                        assets: listing.assets,
                    });
                    for sub in listing.dirs.into_iter().rev() {
                        stack.push(Visit::Enter {
                            dir: sub,
                            parent: node,
                        });
                    }
                }

                Visit::Finish {
                    node,
                    documents,
                    assets,
                } => {
                    for document in &documents {
                        let entry = self.build_page(document, run)?;
                        run.nav.push_entry(node, entry);
                    }
                    for asset in &assets {
                        self.copy_asset(asset, run)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Render one document into its page.
    fn build_page(&self, source_path: &Path, run: &mut Run) -> Result<Entry, BuildError> {
        let source = fs::read_to_string(source_path).map_err(io_error("read", source_path, None))?;

        let doc = self
            .renderer
            .render_document(&source)
            .map_err(|e| BuildError::RenderError {
                path: source_path.to_path_buf(),
                source: e,
            })?;

        let output_path = run.mapper.output_path(source_path)?;
        let title = doc.header.title.unwrap_or_else(|| file_stem(source_path));

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(io_error("create directory", parent, None))?;
        }

        let root = run.mapper.root_prefix(&output_path)?;
        let contents = run
            .index_file
            .filter(|file| *file != INDEX_FILE)
            .map(|file| format!("{}{}", root, file));

        let context = PageContext {
            title: title.clone(),
            site_title: self.config.title.clone(),
            content: doc.html,
            root,
            index: run.mapper.index_link(&output_path)?,
            contents,
            styles: self.styles.clone(),
            description: doc.header.description,
            meta: doc.header.metadata,
        };

        let html = self
            .templates
            .render_page(&context)
            .map_err(|e| BuildError::TemplateError {
                path: source_path.to_path_buf(),
                template: PAGE_TEMPLATE.to_string(),
                source: e,
            })?;

        write_atomic(&output_path, html.as_bytes()).map_err(io_error("write", &output_path, None))?;

        let url = run.mapper.relative_url(&output_path)?;
        if !run.written.insert(url.clone()) {
            tracing::warn!("{} was generated more than once; keeping the last", url);
        }
        run.pages += 1;

        tracing::debug!("Rendered {} -> {}", source_path.display(), url);

        Ok(Entry::new(title, url))
    }

    /// Copy one asset to its mirrored location.
    fn copy_asset(&self, source_path: &Path, run: &mut Run) -> Result<(), BuildError> {
        let target = run.mapper.output_path(source_path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_error("create directory", parent, None))?;
        }

        copy_atomic(source_path, &target)
            .map_err(io_error("copy", source_path, Some(target.as_path())))?;

        let url = run.mapper.relative_url(&target)?;
        if !run.written.insert(url.clone()) {
            tracing::warn!("Asset {} replaces a generated page", url);
        }
        run.assets += 1;

        tracing::debug!("Copied {}", url);

        Ok(())
    }
}

/// List a directory's immediate entries, sorted by file name.
fn list_dir(dir: &Path, mapper: &PathMapper) -> Result<DirListing, BuildError> {
    let mut listing = DirListing::default();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Err(e) if e.loop_ancestor().is_some() => {
                tracing::warn!(
                    "Skipping {}: link points back to an enclosing directory",
                    e.path().unwrap_or(dir).display()
                );
                continue;
            }
            other => other,
        };
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            BuildError::IoError {
                op: "read",
                path,
                target: None,
                source: e.into(),
            }
        })?;

        let file_type = entry.file_type();
        let path = entry.into_path();

        if file_type.is_dir() {
            listing.dirs.push(path);
        } else if !file_type.is_file() {
            tracing::debug!("Skipping {}: not a regular file", path.display());
        } else if mapper.is_document(&path) {
            listing.documents.push(path);
        } else {
            listing.assets.push(path);
        }
    }

    Ok(listing)
}

/// Output-root-relative names of the pages and assets produced from files
/// directly in the input root.
fn root_outputs(mapper: &PathMapper) -> Result<HashSet<String>, BuildError> {
    let listing = list_dir(mapper.input_root(), mapper)?;

    listing
        .documents
        .iter()
        .chain(&listing.assets)
        .map(|file| -> Result<String, BuildError> {
            let output = mapper.output_path(file)?;
            Ok(mapper.relative_url(&output)?)
        })
        .collect()
}

fn resolve_output(path: &Path) -> Result<PathBuf, BuildError> {
    if path.exists() {
        return fs::canonicalize(path).map_err(io_error("resolve", path, None));
    }

    std::path::absolute(path)
        .map(|p| normalize(&p))
        .map_err(io_error("resolve", path, None))
}

fn dir_title(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}
