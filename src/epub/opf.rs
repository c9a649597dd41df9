//! Package descriptor loading
//!
//! Follows `META-INF/container.xml` to the OPF package document and reads its
//! manifest and spine.

use std::collections::HashMap;

use roxmltree::{Document, ParsingOptions};

use super::path::parent_dir;
use crate::archive::ArchiveAccessor;
use crate::error::{ConvertError, Result, Warning};

/// Fixed location of the container pointer
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Manifest item from OPF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Archive-root-relative path
    pub href: String,
    pub media_type: String,
}

impl ManifestItem {
    pub fn is_stylesheet(&self) -> bool {
        self.media_type.trim().eq_ignore_ascii_case("text/css")
    }
}

/// Manifest items keyed by id, iterated in declaration order
///
/// Re-declaring an id replaces the earlier item but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    index: HashMap<String, usize>,
}

impl Manifest {
    /// Insert an item, returning the item it replaced
    pub fn insert(&mut self, item: ManifestItem) -> Option<ManifestItem> {
        match self.index.get(&item.id) {
            Some(&slot) => Some(std::mem::replace(&mut self.items[slot], item)),
            None => {
                self.index.insert(item.id.clone(), self.items.len());
                self.items.push(item);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.index.get(id).map(|&slot| &self.items[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn stylesheets(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter().filter(|item| item.is_stylesheet())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parsed package descriptor
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    /// Archive path of the OPF document
    pub package_path: String,
    /// Directory of the OPF document, with trailing `/` when non-empty
    pub base_path: String,
    pub manifest: Manifest,
    /// Reading order as declared, unresolvable idrefs included
    pub spine: Vec<String>,
    /// Recoverable problems found while reading the descriptor
    pub warnings: Vec<Warning>,
}

/// Locate and parse the package descriptor chain
pub fn load_descriptor(archive: &dyn ArchiveAccessor) -> Result<Descriptor> {
    let container = archive
        .read_text(CONTAINER_PATH)
        .ok_or(ConvertError::MissingContainer)?;
    let package_path = find_package_path(&container)?;
    let base_path = parent_dir(&package_path).to_string();

    let opf = archive
        .read_text(&package_path)
        .ok_or_else(|| ConvertError::MissingPackageDocument {
            path: package_path.clone(),
        })?;

    let mut descriptor = parse_package(&opf, &package_path, &base_path)?;
    descriptor.package_path = package_path;
    descriptor.base_path = base_path;

    tracing::debug!(
        package = %descriptor.package_path,
        manifest = descriptor.manifest.len(),
        spine = descriptor.spine.len(),
        "Loaded package descriptor"
    );
    Ok(descriptor)
}

/// `full-path` of the first `<rootfile>` in container.xml
pub fn find_package_path(container_xml: &str) -> Result<String> {
    let doc = parse_xml(container_xml, CONTAINER_PATH)?;

    doc.descendants()
        .find(|node| node.tag_name().name() == "rootfile")
        .and_then(|node| node.attribute("full-path"))
        .map(str::to_string)
        .ok_or(ConvertError::MalformedContainer)
}

/// Read manifest and spine from OPF text; hrefs are prefixed with `base_path`
pub fn parse_package(content: &str, package_path: &str, base_path: &str) -> Result<Descriptor> {
    let doc = parse_xml(content, package_path)?;

    let mut manifest = Manifest::default();
    let mut spine = Vec::new();
    let mut warnings = Vec::new();

    for node in doc.descendants() {
        match node.tag_name().name() {
            "item" => {
                let Some(href) = node.attribute("href") else {
                    continue;
                };
                let item = ManifestItem {
                    id: node.attribute("id").unwrap_or_default().to_string(),
                    href: format!("{}{}", base_path, href),
                    media_type: node.attribute("media-type").unwrap_or_default().to_string(),
                };
                if let Some(previous) = manifest.insert(item) {
                    let warning = Warning::DuplicateManifestId { id: previous.id };
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
            "itemref" => match node.attribute("idref") {
                Some(idref) => spine.push(idref.to_string()),
                None => {
                    tracing::warn!("{}", Warning::SpineEntryWithoutIdref);
                    warnings.push(Warning::SpineEntryWithoutIdref);
                }
            },
            _ => {}
        }
    }

    Ok(Descriptor {
        package_path: package_path.to_string(),
        base_path: base_path.to_string(),
        manifest,
        spine,
        warnings,
    })
}

fn parse_xml<'a>(content: &'a str, path: &str) -> Result<Document<'a>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(content, options).map_err(|e| ConvertError::Xml {
        path: path.to_string(),
        message: e.to_string(),
    })
}
