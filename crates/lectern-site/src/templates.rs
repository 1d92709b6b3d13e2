//! Template engine for wrapping rendered documents in page layouts.

use std::path::Path;

use lectern_markup::Metadata;
use minijinja::{AutoEscape, Environment, Error, Output, State, UndefinedBehavior, Value};
use serde::Serialize;

/// Template used for every rendered document.
pub const PAGE_TEMPLATE: &str = "page.html";

/// Template used for the generated site index.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Layout the other templates extend.
pub const BASE_TEMPLATE: &str = "base.html";

/// Values available to the page template.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    /// Document title
    pub title: String,
    /// Site title
    pub site_title: String,
    /// Rendered document HTML
    pub content: String,
    /// Relative prefix from this page to the output root
    pub root: String,
    /// Relative link to the home page, absent on the home page itself
    pub index: Option<String>,
    /// Relative link to the generated contents page when it is not the home page
    pub contents: Option<String>,
    /// Stylesheets, relative to the output root
    pub styles: Vec<String>,
    /// Front matter description
    pub description: Option<String>,
    /// Remaining front matter
    pub meta: Metadata,
}

/// A linked document in the site index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexLink {
    pub title: String,
    /// Output-root-relative path
    pub href: String,
}

/// A directory in the site index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSection {
    pub title: String,
    pub entries: Vec<IndexLink>,
    pub children: Vec<IndexSection>,
}

/// Values available to the index template.
#[derive(Debug, Clone, Serialize)]
pub struct IndexContext {
    pub title: String,
    pub site_title: String,
    pub root: String,
    pub index: Option<String>,
    /// Always `None`; the contents page does not link to itself
    pub contents: Option<String>,
    pub styles: Vec<String>,
    /// Top of the directory tree
    pub site: IndexSection,
}

/// Template engine using minijinja.
///
/// Undefined values are errors, so a template that refers to a value the
/// generator does not provide fails instead of rendering an empty slot.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a template engine with the built-in templates.
    pub fn new() -> Result<Self, minijinja::Error> {
        Self::build(None)
    }

    /// Create a template engine where files in `dir` replace built-in
    /// templates of the same name and may add further templates.
    pub fn with_overrides(dir: &Path) -> Result<Self, minijinja::Error> {
        Self::build(Some(dir))
    }

    fn build(dir: Option<&Path>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_formatter(html_formatter);

        let builtins = [
            (BASE_TEMPLATE, BASE_SOURCE),
            (PAGE_TEMPLATE, PAGE_SOURCE),
            (INDEX_TEMPLATE, INDEX_SOURCE),
        ];

        for (name, source) in builtins {
            let overridden = dir.is_some_and(|dir| dir.join(name).is_file());
            if !overridden {
                env.add_template(name, source)?;
            }
        }

        if let Some(dir) = dir {
            env.set_loader(minijinja::path_loader(dir));
        }

        Ok(Self { env })
    }

    /// Render a named template with a set of named values.
    pub fn render<S: Serialize>(&self, template: &str, values: S) -> Result<String, minijinja::Error> {
        self.env.get_template(template)?.render(values)
    }

    /// Render a document page.
    pub fn render_page(&self, context: &PageContext) -> Result<String, minijinja::Error> {
        self.render(PAGE_TEMPLATE, context)
    }

    /// Render the site index.
    pub fn render_index(&self, context: &IndexContext) -> Result<String, minijinja::Error> {
        self.render(INDEX_TEMPLATE, context)
    }
}

/// Escapes strings like the default HTML formatter but keeps `/`, which
/// every generated link and stylesheet path contains.
fn html_formatter(out: &mut Output, state: &State, value: &Value) -> Result<(), Error> {
    match value.as_str() {
        Some(text) if state.auto_escape() == AutoEscape::Html && !value.is_safe() => {
            out.write_str(&escape_html(text))?;
            Ok(())
        }
        _ => minijinja::escape_formatter(out, state, value),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const BASE_SOURCE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }} - {{ site_title }}</title>
  {% for style in styles %}<link rel="stylesheet" href="{{ root }}{{ style }}">
  {% endfor %}
</head>
<body>
  <header class="site-header">
    {% if index %}<a href="{{ index }}" class="site-title">{{ site_title }}</a>{% else %}<span class="site-title">{{ site_title }}</span>{% endif %}
    {% if contents %}<a href="{{ contents }}" class="site-contents">Contents</a>{% endif %}
  </header>
  <main class="main">
    {% block content %}{% endblock %}
  </main>
</body>
</html>
"##;

const PAGE_SOURCE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="doc">
  {{ content | safe }}
</article>
{% endblock %}"##;

const INDEX_SOURCE: &str = r##"{% extends "base.html" %}

{% block content %}
<nav class="site-index">
  <h1>{{ title }}</h1>
  <ul class="index-tree">
  {% for section in [site] recursive %}
    <li class="index-section">
      <span class="index-section-title">{{ section.title }}</span>
      {% if section.entries %}
      <ul class="index-entries">
      {% for entry in section.entries %}
        <li><a href="{{ root }}{{ entry.href }}">{{ entry.title }}</a></li>
      {% endfor %}
      </ul>
      {% endif %}
      {% if section.children %}
      <ul class="index-children">{{ loop(section.children) }}</ul>
      {% endif %}
    </li>
  {% endfor %}
  </ul>
</nav>
{% endblock %}"##;
