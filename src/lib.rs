//! EPUB Flattener for Los Libros
//!
//! Converts an EPUB archive into a single self-contained document:
//! - one HTML fragment holding every spine document's body, in reading order
//! - one stylesheet with every rule scoped under the host container
//! - images inlined as `data:` URIs, scripts and stylesheet links removed
//!
//! Plain markup (markdown) input is routed to a caller-supplied renderer.

use serde::{Deserialize, Serialize};

pub mod archive;
pub mod config;
pub mod epub;
pub mod error;
pub mod markup;

#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export common types
pub use archive::{ArchiveAccessor, EpubArchive};
pub use config::{ConvertConfig, DEFAULT_SCOPE_SELECTOR};
pub use epub::{AggregatedContent, Descriptor, Manifest, ManifestItem};
pub use error::{ConvertError, Outcome, Result, Warning};
pub use markup::{MarkupRenderer, NoMarkupRenderer};

/// Input type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Epub,
    Markdown,
}

impl FileKind {
    /// `"epub"` selects the EPUB pipeline; anything else is treated as markdown
    pub fn from_discriminator(value: &str) -> Self {
        if value.eq_ignore_ascii_case("epub") {
            FileKind::Epub
        } else {
            FileKind::Markdown
        }
    }
}

/// Conversion result handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedDocument {
    pub html: String,
    pub css: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

/// Convert an EPUB held in memory
pub fn convert_epub(data: &[u8], config: &ConvertConfig) -> Result<Outcome<ConvertedDocument>> {
    let archive = EpubArchive::from_bytes(data)?;
    convert_archive(&archive, config)
}

/// Convert an already opened archive
pub fn convert_archive(
    archive: &dyn ArchiveAccessor,
    config: &ConvertConfig,
) -> Result<Outcome<ConvertedDocument>> {
    let descriptor = epub::load_descriptor(archive)?;
    let outcome = epub::aggregate(archive, &descriptor, config)?;

    Ok(outcome.map(|content| ConvertedDocument {
        html: content.html,
        css: content.css,
        kind: FileKind::Epub,
    }))
}

/// Convert either input type
pub fn convert(
    data: &[u8],
    kind: FileKind,
    config: &ConvertConfig,
    renderer: &dyn MarkupRenderer,
) -> Result<Outcome<ConvertedDocument>> {
    match kind {
        FileKind::Epub => convert_epub(data, config),
        FileKind::Markdown => {
            let html = markup::render_markup(data, renderer)?;
            Ok(Outcome::Complete(ConvertedDocument {
                html,
                css: String::new(),
                kind: FileKind::Markdown,
            }))
        }
    }
}

/// Reply sent back to the page that requested a conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerMessage {
    Success {
        payload: ConvertedDocument,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<Warning>,
    },
    Error {
        message: String,
    },
}

impl WorkerMessage {
    pub fn from_result(result: Result<Outcome<ConvertedDocument>>) -> Self {
        match result {
            Ok(Outcome::Complete(payload)) => WorkerMessage::Success {
                payload,
                warnings: Vec::new(),
            },
            Ok(Outcome::Partial { value, warnings }) => WorkerMessage::Success {
                payload: value,
                warnings,
            },
            Err(e) => {
                tracing::error!("Worker parsing error: {}", e);
                WorkerMessage::Error {
                    message: format!("Failed to parse file: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::RenderError;
    use crate::test_support::{zip_bytes, CONTAINER_XML};

    fn epub_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut all: Vec<(&str, &[u8])> = vec![("mimetype", b"application/epub+zip".as_slice())];
        all.extend_from_slice(members);
        zip_bytes(&all)
    }

    #[test]
    fn test_file_kind_discriminator() {
        assert_eq!(FileKind::from_discriminator("epub"), FileKind::Epub);
        assert_eq!(FileKind::from_discriminator("EPUB"), FileKind::Epub);
        assert_eq!(FileKind::from_discriminator("md"), FileKind::Markdown);
    }

    #[test]
    fn test_convert_epub_end_to_end() {
        let opf = crate::test_support::package_document(
            r#"<item id="css" href="style.css" media-type="text/css"/>
               <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<itemref idref="c1"/>"#,
        );
        let chapter = crate::test_support::chapter("<p>Hello</p>");
        let data = epub_bytes(&[
            ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
            ("OEBPS/content.opf", opf.as_bytes()),
            ("OEBPS/style.css", b"p { color: red }".as_slice()),
            ("OEBPS/c1.xhtml", chapter.as_bytes()),
        ]);

        let outcome = convert_epub(&data, &ConvertConfig::default()).unwrap();
        assert!(outcome.is_complete());
        let document = outcome.into_value();
        assert_eq!(document.html, "<p>Hello</p>");
        assert_eq!(document.css, "#epub-content p{ color: red }\n");
        assert_eq!(document.kind, FileKind::Epub);
    }

    #[test]
    fn test_missing_container_fails_whole_conversion() {
        let data = epub_bytes(&[("OEBPS/content.opf", b"<package/>".as_slice())]);

        let result = convert(
            &data,
            FileKind::Epub,
            &ConvertConfig::default(),
            &NoMarkupRenderer,
        );
        let err = result.unwrap_err();
        assert!(matches!(err, ConvertError::MissingContainer));
        assert_eq!(err.to_string(), "META-INF/container.xml not found");
    }

    #[test]
    fn test_corrupt_archive() {
        let result = convert_epub(b"PK\x03\x04 truncated", &ConvertConfig::default());
        assert!(matches!(result, Err(ConvertError::Zip(_))));
    }

    #[test]
    fn test_convert_markdown() {
        let renderer = |source: &str| -> std::result::Result<String, RenderError> {
            Ok(format!("<p>{}</p>", source.trim()))
        };
        let outcome = convert(
            b"hello",
            FileKind::Markdown,
            &ConvertConfig::default(),
            &renderer,
        )
        .unwrap();

        let document = outcome.into_value();
        assert_eq!(document.html, "<p>hello</p>");
        assert!(document.css.is_empty());
        assert_eq!(document.kind, FileKind::Markdown);
    }

    #[test]
    fn test_worker_message_serialization() {
        let success = WorkerMessage::from_result(Ok(Outcome::Complete(ConvertedDocument {
            html: "<p>x</p>".to_string(),
            css: String::new(),
            kind: FileKind::Epub,
        })));
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["payload"]["type"], "epub");
        assert_eq!(json["payload"]["html"], "<p>x</p>");
        assert!(json.get("warnings").is_none());

        let error = WorkerMessage::from_result(Err(ConvertError::MalformedContainer));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(
            json["message"],
            "Failed to parse file: Could not find .opf file path in container.xml"
        );
    }

    #[test]
    fn test_partial_result_carries_warnings() {
        let message = WorkerMessage::from_result(Ok(Outcome::Partial {
            value: ConvertedDocument {
                html: String::new(),
                css: String::new(),
                kind: FileKind::Epub,
            },
            warnings: vec![Warning::UnresolvedSpineRef {
                idref: "x".to_string(),
            }],
        }));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["warnings"][0]["kind"], "unresolvedSpineRef");
        assert_eq!(json["warnings"][0]["idref"], "x");
    }
}
