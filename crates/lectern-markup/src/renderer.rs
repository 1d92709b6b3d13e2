//! Markdown renderer.

use std::collections::HashSet;
use std::fmt::Write;

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::frontmatter::extract_frontmatter;
use crate::traits::{DocumentHeader, DocumentRenderer, RenderError, RenderOptions, RenderedDocument};

/// A heading found while rendering.
#[derive(Debug, Clone, PartialEq)]
struct Section {
    level: u8,
    title: String,
    id: String,
    number: Option<String>,
}

/// Renders Markdown documents with YAML front matter.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a renderer with the given run-wide options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    fn parser_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn read_header(&self, source: &str) -> Result<DocumentHeader, RenderError> {
        let (frontmatter, content) = extract_frontmatter(source)?;
        let frontmatter = frontmatter.unwrap_or_default();

        let title = match frontmatter.title {
            Some(title) => Some(title),
            None => first_title(content),
        };

        Ok(DocumentHeader {
            title,
            description: frontmatter.description,
            metadata: frontmatter.extra,
        })
    }

    fn render(&self, source: &str) -> Result<String, RenderError> {
        self.render_document(source).map(|doc| doc.html)
    }

    fn render_document(&self, source: &str) -> Result<RenderedDocument, RenderError> {
        let (frontmatter, content) = extract_frontmatter(source)?;
        let frontmatter = frontmatter.unwrap_or_default();

        let mut events: Vec<Event<'_>> =
            Parser::new_ext(content, Self::parser_options()).collect();
        let sections = annotate_headings(&mut events, self.options.section_numbers);

        let body_title = sections
            .iter()
            .find(|s| s.level == 1)
            .map(|s| s.title.clone());

        let mut output = String::with_capacity(content.len() * 3 / 2);

        if self.options.show_title && body_title.is_none() {
            if let Some(title) = &frontmatter.title {
                let _ = writeln!(output, "<h1 class=\"title\">{}</h1>", escape_html(title));
            }
        }

        if self.options.toc {
            if let Some(toc) = toc_html(&sections) {
                let leading_title = matches!(
                    events.first(),
                    Some(Event::Start(Tag::Heading {
                        level: HeadingLevel::H1,
                        ..
                    }))
                );
                let title_end = events
                    .iter()
                    .position(|e| matches!(e, Event::End(TagEnd::Heading(HeadingLevel::H1))));

                match title_end {
                    Some(end) if leading_title => events.insert(end + 1, Event::Html(toc.into())),
                    _ => output.push_str(&toc),
                }
            }
        }

        html::push_html(&mut output, events.into_iter());

        Ok(RenderedDocument {
            header: DocumentHeader {
                title: frontmatter.title.or(body_title),
                description: frontmatter.description,
                metadata: frontmatter.extra,
            },
            html: output,
        })
    }
}

/// Text of the first level-1 heading.
fn first_title(content: &str) -> Option<String> {
    let mut title: Option<String> = None;

    for event in Parser::new_ext(content, MarkdownRenderer::parser_options()) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => title = Some(String::new()),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                return title.map(|t| t.trim().to_string());
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(title) = title.as_mut() {
                    title.push_str(&text);
                }
            }
            _ => {}
        }
    }

    None
}

/// Give every heading an id and, if requested, a section number.
fn annotate_headings(events: &mut Vec<Event<'_>>, numbered: bool) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut counters = [0usize; 5];
    let mut used: HashSet<String> = HashSet::new();

    let mut i = 0;
    while i < events.len() {
        let (level, explicit_id) = match &events[i] {
            Event::Start(Tag::Heading { level, id, .. }) => {
                (*level as u8, id.as_ref().map(|id| id.to_string()))
            }
            _ => {
                i += 1;
                continue;
            }
        };

        let mut title = String::new();
        let mut end = i + 1;
        while end < events.len() {
            match &events[end] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(text) | Event::Code(text) => title.push_str(text),
                _ => {}
            }
            end += 1;
        }

        let base = explicit_id.unwrap_or_else(|| slugify(&title));
        let id = unique_id(base, &mut used);

        if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
            *slot = Some(CowStr::from(id.clone()));
        }

        let number = (numbered && level >= 2).then(|| next_number(&mut counters, level));
        if let Some(number) = &number {
            let label = format!("<span class=\"sectnum\">{}</span> ", number);
            events.insert(i + 1, Event::InlineHtml(label.into()));
            end += 1;
        }

        sections.push(Section {
            level,
            title: title.trim().to_string(),
            id,
            number,
        });

        i = end + 1;
    }

    sections
}

/// Advance the counters for a level 2-6 heading and format its number.
fn next_number(counters: &mut [usize; 5], level: u8) -> String {
    let depth = usize::from(level.clamp(2, 6) - 2);
    counters[depth] += 1;
    for counter in &mut counters[depth + 1..] {
        *counter = 0;
    }
    counters[..=depth].iter().map(|n| format!("{}.", n)).collect()
}

/// `base`, or `base-2`, `base-3`, ... if already taken. Explicit ids go
/// through here too, so every id on the page is distinct.
fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };

    if used.insert(base.clone()) {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Table of contents for level 2-6 headings, or `None` if there are none.
fn toc_html(sections: &[Section]) -> Option<String> {
    let entries: Vec<&Section> = sections.iter().filter(|s| s.level >= 2).collect();
    if entries.is_empty() {
        return None;
    }

    let mut out = String::from(
        "<nav id=\"toc\" class=\"toc\">\n<div id=\"toctitle\">Table of Contents</div>\n<ul>\n",
    );

    for section in entries {
        let label = match &section.number {
            Some(number) => format!("{} {}", number, section.title),
            None => section.title.clone(),
        };
        let _ = writeln!(
            out,
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            section.level,
            escape_html(&section.id),
            escape_html(&label)
        );
    }

    out.push_str("</ul>\n</nav>\n");
    Some(out)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrontmatterError;
    use pretty_assertions::assert_eq;

    fn plain() -> MarkdownRenderer {
        MarkdownRenderer::new(RenderOptions {
            show_title: false,
            toc: false,
            section_numbers: false,
        })
    }

    #[test]
    fn title_comes_from_first_heading() {
        let doc = plain()
            .render_document("# Setup\n\nInstall things.")
            .unwrap();

        assert_eq!(doc.header.title.as_deref(), Some("Setup"));
        assert!(doc.html.contains("<h1 id=\"setup\">Setup</h1>"));
        assert!(doc.html.contains("<p>Install things.</p>"));
    }

    #[test]
    fn frontmatter_title_wins() {
        let source = "---\ntitle: Home\nlayout: wide\n---\n# Welcome\n";

        let doc = plain().render_document(source).unwrap();

        assert_eq!(doc.header.title.as_deref(), Some("Home"));
        assert!(doc.header.metadata.contains_key("layout"));
        assert!(doc.html.contains("Welcome"));
    }

    #[test]
    fn shows_frontmatter_title_when_body_has_none() {
        let source = "---\ntitle: Home & Away\n---\nBody text.";
        let renderer = MarkdownRenderer::new(RenderOptions {
            show_title: true,
            toc: false,
            section_numbers: false,
        });

        let doc = renderer.render_document(source).unwrap();

        assert!(doc
            .html
            .starts_with("<h1 class=\"title\">Home &amp; Away</h1>"));

        let hidden = plain().render_document(source).unwrap();
        assert!(!hidden.html.contains("<h1"));
    }

    #[test]
    fn numbers_sections() {
        let renderer = MarkdownRenderer::new(RenderOptions {
            show_title: false,
            toc: false,
            section_numbers: true,
        });
        let source = "# Guide\n\n## Install\n\n### Linux\n\n### macOS\n\n## Usage\n";

        let html = renderer.render(source).unwrap();

        assert!(html.contains("<h1 id=\"guide\">Guide</h1>"));
        assert!(html.contains("<h2 id=\"install\"><span class=\"sectnum\">1.</span> Install</h2>"));
        assert!(html.contains("<span class=\"sectnum\">1.1.</span> Linux"));
        assert!(html.contains("<span class=\"sectnum\">1.2.</span> macOS"));
        assert!(html.contains("<span class=\"sectnum\">2.</span> Usage"));
    }

    #[test]
    fn places_toc_after_leading_title() {
        let renderer = MarkdownRenderer::default();
        let source = "# Guide\n\nIntro.\n\n## Install\n\n## Usage\n";

        let html = renderer.render(source).unwrap();

        let title = html.find("</h1>").unwrap();
        let toc = html.find("<nav id=\"toc\"").unwrap();
        let intro = html.find("<p>Intro.</p>").unwrap();
        assert!(title < toc && toc < intro);
        assert!(html.contains("<a href=\"#install\">1. Install</a>"));
        assert!(html.contains("<a href=\"#usage\">2. Usage</a>"));
    }

    #[test]
    fn omits_empty_toc() {
        let html = MarkdownRenderer::default()
            .render("# Only a title\n\nText.")
            .unwrap();

        assert!(!html.contains("toc"));
    }

    #[test]
    fn deduplicates_heading_ids() {
        let html = plain().render("## Notes\n\n## Notes\n\n## Notes {#custom}\n").unwrap();

        assert!(html.contains("<h2 id=\"notes\">"));
        assert!(html.contains("<h2 id=\"notes-2\">"));
        assert!(html.contains("<h2 id=\"custom\">"));
    }

    #[test]
    fn deduplicates_explicit_heading_ids() {
        let html = plain()
            .render("## One {#same}\n\n## Two {#same}\n\n## Same\n")
            .unwrap();

        assert!(html.contains("<h2 id=\"same\">"));
        assert!(html.contains("<h2 id=\"same-2\">"));
        assert!(html.contains("<h2 id=\"same-3\">"));
    }

    #[test]
    fn header_matches_full_render() {
        let renderer = MarkdownRenderer::default();
        let source = "---\ndescription: About\n---\n# About `lectern`\n";

        let header = renderer.read_header(source).unwrap();
        let doc = renderer.render_document(source).unwrap();

        assert_eq!(header, doc.header);
        assert_eq!(header.title.as_deref(), Some("About lectern"));
        assert_eq!(header.description.as_deref(), Some("About"));
    }

    #[test]
    fn untitled_document_has_no_title() {
        let header = plain().read_header("Just a paragraph.").unwrap();

        assert_eq!(header.title, None);
    }

    #[test]
    fn rejects_malformed_frontmatter() {
        let result = plain().render_document("---\ntitle: Broken\n");

        assert!(matches!(
            result,
            Err(RenderError::Frontmatter(FrontmatterError::Unclosed))
        ));
    }

    #[test]
    fn slugify_works() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API Reference"), "api-reference");
        assert_eq!(slugify("Button (Primary)"), "button-primary");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }
}
