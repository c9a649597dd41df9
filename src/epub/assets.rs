//! Image inlining
//!
//! Replaces `img[src]` and SVG `image` references with `data:` URIs so the
//! output needs no further archive access. Works as a pure transform: the
//! references of a document are collected first, resolved into a patch set,
//! and the patch set is then applied by a rewriting pass.

use std::cell::RefCell;
use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lol_html::errors::AttributeNameError;
use lol_html::html_content::Element;
use lol_html::{element, rewrite_str, RewriteStrSettings};

use super::{map_ordered, path};
use crate::archive::ArchiveAccessor;
use crate::error::{ConvertError, Result, Warning};

const GENERIC_MEDIA_TYPE: &str = "application/octet-stream";

/// Media type for an image path, from its extension
pub fn media_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or(path).to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => GENERIC_MEDIA_TYPE,
    }
}

pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, BASE64.encode(bytes))
}

/// Whether an attribute value points at an archive member
pub fn needs_inlining(value: &str) -> bool {
    !value.is_empty() && !value.starts_with("data:")
}

/// Image-source attribute of an element, if it carries one
///
/// `img` uses `src`; SVG `image` uses `href`, falling back to `xlink:href`.
pub(crate) fn asset_attribute(el: &Element) -> Option<(&'static str, String)> {
    let tag = el.tag_name();
    let names: &[&'static str] = if tag.eq_ignore_ascii_case("img") {
        &["src"]
    } else if tag.eq_ignore_ascii_case("image") {
        &["href", "xlink:href"]
    } else {
        return None;
    };

    names
        .iter()
        .find_map(|name| el.get_attribute(name).map(|value| (*name, value)))
}

/// Replacements for the asset references of one document
///
/// Keyed by the raw attribute text, before character references are decoded.
#[derive(Debug, Clone, Default)]
pub struct AssetPatches {
    replacements: HashMap<String, String>,
    pub warnings: Vec<Warning>,
}

impl AssetPatches {
    /// Data URI for a reference, if it was resolved
    pub fn replacement(&self, reference: &str) -> Option<&str> {
        self.replacements.get(reference).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Rewrite the asset attribute of `el` if a replacement exists
    pub(crate) fn apply(&self, el: &mut Element) -> std::result::Result<(), AttributeNameError> {
        if let Some((name, value)) = asset_attribute(el) {
            if let Some(replacement) = self.replacement(&value) {
                el.set_attribute(name, replacement)?;
            }
        }
        Ok(())
    }
}

/// Distinct asset references of a document, in document order
pub fn collect_asset_refs(html: &str, document_path: &str) -> Result<Vec<String>> {
    let refs = RefCell::new(Vec::<String>::new());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("img[src]", |el| {
                    push_ref(&refs, el);
                    Ok(())
                }),
                element!("image", |el| {
                    push_ref(&refs, el);
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ConvertError::Rewrite {
        path: document_path.to_string(),
        message: e.to_string(),
    })?;

    Ok(refs.into_inner())
}

fn push_ref(refs: &RefCell<Vec<String>>, el: &Element) {
    if let Some((_, value)) = asset_attribute(el) {
        let mut refs = refs.borrow_mut();
        if needs_inlining(&value) && !refs.contains(&value) {
            refs.push(value);
        }
    }
}

/// Resolve and encode every reference; unresolvable ones become warnings
pub fn resolve_assets(
    document_path: &str,
    refs: &[String],
    archive: &dyn ArchiveAccessor,
    parallel: bool,
) -> AssetPatches {
    let resolved = map_ordered(refs, parallel, |reference| {
        resolve_asset(document_path, reference, archive)
    });

    let mut patches = AssetPatches::default();
    for (reference, result) in refs.iter().zip(resolved) {
        match result {
            Ok(uri) => {
                patches.replacements.insert(reference.clone(), uri);
            }
            Err(warning) => patches.warnings.push(warning),
        }
    }
    patches
}

fn resolve_asset(
    document_path: &str,
    reference: &str,
    archive: &dyn ArchiveAccessor,
) -> std::result::Result<String, Warning> {
    // Attribute text is raw markup; `&amp;` and friends name the member literally
    let decoded = html_escape::decode_html_entities(reference);
    let resolved = path::resolve(document_path, &decoded);

    match archive.read_binary(&resolved) {
        Some(bytes) => {
            tracing::debug!(asset = %resolved, bytes = bytes.len(), "Inlining asset");
            Ok(data_uri(media_type_for(&resolved), &bytes))
        }
        None => {
            let warning = Warning::MissingAsset {
                document: document_path.to_string(),
                reference: reference.to_string(),
                resolved,
            };
            tracing::warn!("Could not process asset: {}", warning);
            Err(warning)
        }
    }
}

/// Apply a patch set to a document without any other cleanup
pub fn apply_patches(html: &str, document_path: &str, patches: &AssetPatches) -> Result<String> {
    if patches.is_empty() {
        return Ok(html.to_string());
    }

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("img[src]", |el| {
                    patches.apply(el)?;
                    Ok(())
                }),
                element!("image", |el| {
                    patches.apply(el)?;
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ConvertError::Rewrite {
        path: document_path.to_string(),
        message: e.to_string(),
    })
}

/// Inline every resolvable image of a document
pub fn inline_assets(
    html: &str,
    document_path: &str,
    archive: &dyn ArchiveAccessor,
    parallel: bool,
) -> Result<(String, Vec<Warning>)> {
    let refs = collect_asset_refs(html, document_path)?;
    let patches = resolve_assets(document_path, &refs, archive, parallel);
    let html = apply_patches(html, document_path, &patches)?;
    Ok((html, patches.warnings))
}
