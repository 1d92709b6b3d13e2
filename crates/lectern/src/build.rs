//! Site build.

use anyhow::Result;
use lectern_markup::RenderOptions;
use lectern_site::{CancellationFlag, GeneratorConfig, NavTree, SiteGenerator};

use crate::config::ConfigFile;
use crate::Cli;

/// Merge command-line flags over the config file.
fn generator_config(cli: &Cli, file: ConfigFile) -> GeneratorConfig {
    GeneratorConfig {
        input_dir: cli.input.clone(),
        output_dir: cli.output.clone(),
        title: cli.title.clone().unwrap_or(file.site.title),
        document_extension: cli
            .extension
            .clone()
            .unwrap_or(file.site.document_extension),
        styles: file.site.styles,
        templates_dir: cli.templates.clone().or(file.site.templates),
        render: RenderOptions {
            show_title: file.render.show_title,
            toc: file.render.toc && !cli.no_toc,
            section_numbers: file.render.section_numbers && !cli.no_section_numbers,
        },
        transactional: cli.transactional || file.build.transactional,
    }
}

/// Indented outline of the navigation tree, one line per directory.
fn outline(nav: &NavTree) -> Vec<String> {
    let Some(site) = nav.site_root() else {
        return Vec::new();
    };

    nav.preorder(site)
        .into_iter()
        .map(|(depth, id)| {
            let node = nav.node(id);
            format!(
                "{}{}/ ({} pages)",
                "  ".repeat(depth),
                node.title(),
                node.entries().len()
            )
        })
        .collect()
}

/// Run the build.
pub async fn run(cli: Cli, file_config: ConfigFile) -> Result<()> {
    tracing::info!(
        "Building {} into {}",
        cli.input.display(),
        cli.output.display()
    );

    let config = generator_config(&cli, file_config);
    let cancel = CancellationFlag::new();
    let generator = SiteGenerator::new(config)?.with_cancellation(cancel.clone());

    let mut task = tokio::task::spawn_blocking(move || generator.generate());

    let result = tokio::select! {
        joined = &mut task => joined?,
        Ok(()) = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping generation");
            cancel.cancel();
            task.await?
        }
    }?;

    for line in outline(&result.nav) {
        tracing::debug!("{}", line);
    }

    tracing::info!(
        "Built {} pages and copied {} assets in {}ms",
        result.pages,
        result.assets,
        result.duration_ms
    );

    if let Some(index) = &result.index {
        tracing::info!("Index: {}", index.display());
    }
    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
