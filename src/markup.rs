//! Plain-markup branch
//!
//! Markdown rendering is delegated to a caller-supplied [`MarkupRenderer`];
//! this crate only routes the text to it.

use crate::error::{ConvertError, Result};

pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Renders lightweight markup (markdown) to HTML
pub trait MarkupRenderer {
    fn render(&self, source: &str) -> std::result::Result<String, RenderError>;
}

impl<F> MarkupRenderer for F
where
    F: Fn(&str) -> std::result::Result<String, RenderError>,
{
    fn render(&self, source: &str) -> std::result::Result<String, RenderError> {
        self(source)
    }
}

/// Renderer for callers that only convert EPUBs
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMarkupRenderer;

impl MarkupRenderer for NoMarkupRenderer {
    fn render(&self, _source: &str) -> std::result::Result<String, RenderError> {
        Err("no markup renderer configured".into())
    }
}

/// Decode the markup text and render it
pub fn render_markup(data: &[u8], renderer: &dyn MarkupRenderer) -> Result<String> {
    let source = String::from_utf8(data.to_vec())?;
    renderer
        .render(&source)
        .map_err(|e| ConvertError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading_renderer(source: &str) -> std::result::Result<String, RenderError> {
        Ok(format!("<h1>{}</h1>", source.trim_start_matches("# ").trim()))
    }

    #[test]
    fn test_render_with_fn() {
        let html = render_markup(b"# Hello\n", &heading_renderer).unwrap();
        assert_eq!(html, "<h1>Hello</h1>");
    }

    #[test]
    fn test_no_renderer() {
        let err = render_markup(b"text", &NoMarkupRenderer).unwrap_err();
        assert!(matches!(err, ConvertError::Render(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = render_markup(&[0xff, 0xfe, 0x00], &heading_renderer).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidText(_)));
    }
}
