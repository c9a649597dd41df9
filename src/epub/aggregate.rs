//! Content aggregation across the whole package

use serde::{Deserialize, Serialize};

use super::opf::{Descriptor, ManifestItem};
use super::{assets, css, map_ordered, parser};
use crate::archive::ArchiveAccessor;
use crate::config::ConvertConfig;
use crate::error::{Outcome, Result, Warning};

/// Flattened book
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedContent {
    /// Body markup of every spine document, in spine order
    pub html: String,
    /// Every manifest stylesheet, scoped, in manifest order
    pub css: String,
}

/// Output of one spine entry
#[derive(Default)]
struct Slot {
    html: String,
    warnings: Vec<Warning>,
}

impl Slot {
    fn skipped(warning: Warning) -> Self {
        tracing::warn!("{}", warning);
        Self {
            html: String::new(),
            warnings: vec![warning],
        }
    }
}

/// Aggregate all stylesheets and spine documents of a loaded package
pub fn aggregate(
    archive: &dyn ArchiveAccessor,
    descriptor: &Descriptor,
    config: &ConvertConfig,
) -> Result<Outcome<AggregatedContent>> {
    let mut warnings = descriptor.warnings.clone();
    let mut content = AggregatedContent::default();

    let stylesheets: Vec<&ManifestItem> = descriptor.manifest.stylesheets().collect();
    let scoped = map_ordered(&stylesheets, config.parallel, |item| {
        scope_stylesheet(archive, item, &config.scope_selector)
    });
    for result in scoped {
        match result {
            Ok(css) => {
                content.css.push_str(&css);
                content.css.push('\n');
            }
            Err(warning) => warnings.push(warning),
        }
    }

    let slots = map_ordered(&descriptor.spine, config.parallel, |idref| {
        render_spine_entry(archive, descriptor, idref, config.parallel)
    });
    for slot in slots {
        let slot = slot?;
        content.html.push_str(&slot.html);
        warnings.extend(slot.warnings);
    }

    tracing::info!(
        stylesheets = stylesheets.len(),
        documents = descriptor.spine.len(),
        warnings = warnings.len(),
        "Aggregated EPUB content"
    );

    let outcome = Outcome::from_parts(content, warnings);
    if config.strict {
        return outcome.into_strict().map(Outcome::Complete);
    }
    Ok(outcome)
}

fn scope_stylesheet(
    archive: &dyn ArchiveAccessor,
    item: &ManifestItem,
    scope_selector: &str,
) -> std::result::Result<String, Warning> {
    match archive.read_text(&item.href) {
        Some(raw) => Ok(css::scope(&raw, scope_selector)),
        None => {
            let warning = Warning::MissingStylesheet {
                href: item.href.clone(),
            };
            tracing::warn!("{}", warning);
            Err(warning)
        }
    }
}

fn render_spine_entry(
    archive: &dyn ArchiveAccessor,
    descriptor: &Descriptor,
    idref: &str,
    parallel: bool,
) -> Result<Slot> {
    let Some(item) = descriptor.manifest.get(idref) else {
        return Ok(Slot::skipped(Warning::UnresolvedSpineRef {
            idref: idref.to_string(),
        }));
    };
    let Some(html) = archive.read_text(&item.href) else {
        return Ok(Slot::skipped(Warning::MissingContentDocument {
            href: item.href.clone(),
        }));
    };

    let refs = assets::collect_asset_refs(&html, &item.href)?;
    let patches = assets::resolve_assets(&item.href, &refs, archive, parallel);
    let mut slot = Slot {
        warnings: patches.warnings.clone(),
        ..Slot::default()
    };

    match parser::clean_document(&html, &item.href, &patches)? {
        Some(body) => slot.html = body,
        None => {
            let warning = Warning::MissingBody {
                href: item.href.clone(),
            };
            tracing::warn!("{}", warning);
            slot.warnings.push(warning);
        }
    }

    tracing::debug!(
        document = %item.href,
        assets = patches.len(),
        bytes = slot.html.len(),
        "Processed content document"
    );
    Ok(slot)
}
