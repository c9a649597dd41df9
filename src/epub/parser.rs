//! HTML/XHTML content document cleanup
//!
//! Strips scripts and stylesheet links, applies the asset patch set and
//! extracts the inner markup of `<body>`, explicit or implied.

use std::cell::Cell;

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};

use super::assets::AssetPatches;
use crate::error::{ConvertError, Result};

const HTML_START: &str = "<!--epub-flattener:html-start-->";
const HEAD_END: &str = "<!--epub-flattener:head-end-->";
const BODY_START: &str = "<!--epub-flattener:body-start-->";
const BODY_END: &str = "<!--epub-flattener:body-end-->";

/// Clean a content document and return the inner markup of its body
///
/// A document without a `<body>` tag gets the implicit body an HTML parser
/// would build: whatever follows the head. Returns `None` only for frameset
/// documents, which have no body at all.
pub fn clean_document(
    html: &str,
    document_path: &str,
    patches: &AssetPatches,
) -> Result<Option<String>> {
    let frameset = Cell::new(false);

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!(r#"link[rel="stylesheet"]"#, |el| {
                    el.remove();
                    Ok(())
                }),
                element!("img[src]", |el| {
                    patches.apply(el)?;
                    Ok(())
                }),
                element!("image", |el| {
                    patches.apply(el)?;
                    Ok(())
                }),
                element!("html", |el| {
                    el.prepend(HTML_START, ContentType::Html);
                    Ok(())
                }),
                element!("head", |el| {
                    el.after(HEAD_END, ContentType::Html);
                    Ok(())
                }),
                element!("body", |el| {
                    el.prepend(BODY_START, ContentType::Html);
                    el.append(BODY_END, ContentType::Html);
                    Ok(())
                }),
                element!("frameset", |_el| {
                    frameset.set(true);
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

    if rewritten.contains(BODY_START) {
        return Ok(extract_body(&rewritten));
    }
    if frameset.get() {
        return Ok(None);
    }
    Ok(Some(implicit_body(&rewritten)))
}

/// Markup between the body markers
///
/// A body whose end tag never appears runs to the end of the document.
fn extract_body(rewritten: &str) -> Option<String> {
    let start = rewritten.find(BODY_START)? + BODY_START.len();
    let rest = &rewritten[start..];

    let inner = match rest.rfind(BODY_END) {
        Some(end) => &rest[..end],
        None => strip_html_close(rest),
    };

    // A second <body> tag leaves its own markers behind
    Some(strip_markers(inner))
}

/// Content of a document that never opens `<body>`
fn implicit_body(rewritten: &str) -> String {
    let rest = if let Some(pos) = rewritten.find(HEAD_END) {
        &rewritten[pos + HEAD_END.len()..]
    } else if let Some(pos) = rewritten.find(HTML_START) {
        &rewritten[pos + HTML_START.len()..]
    } else {
        skip_prologue(rewritten)
    };

    strip_markers(strip_html_close(rest).trim_start())
}

/// Skip an XML declaration, doctype, comments and whitespace at the start of a fragment
fn skip_prologue(mut rest: &str) -> &str {
    loop {
        rest = rest.trim_start();
        let close = if rest.starts_with("<?") {
            "?>"
        } else if rest.starts_with("<!--") {
            "-->"
        } else if rest.starts_with("<!") {
            ">"
        } else {
            return rest;
        };
        match rest.find(close) {
            Some(pos) => rest = &rest[pos + close.len()..],
            None => return "",
        }
    }
}

fn strip_markers(markup: &str) -> String {
    [HTML_START, HEAD_END, BODY_START, BODY_END]
        .iter()
        .fold(markup.to_string(), |acc, marker| acc.replace(marker, ""))
}

fn strip_html_close(rest: &str) -> &str {
    let trimmed = rest.trim_end();
    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with("</html>") {
        &trimmed[..trimmed.len() - "</html>".len()]
    } else {
        rest
    }
}
