//! Browser-facing bindings
//!
//! Exposes the converter to a web worker. Replies follow the worker message
//! protocol: `{ type: "success", payload }` or `{ type: "error", message }`.

use wasm_bindgen::prelude::*;

use crate::markup::{MarkupRenderer, RenderError};
use crate::{convert, ConvertConfig, FileKind, WorkerMessage};

/// Initialize the WASM module
/// Call this before using any other functions
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in debug mode
    console_error_panic_hook::set_once();
}

/// Markdown renderer backed by a JS function `(source: string) => string`
struct JsRenderer(js_sys::Function);

impl MarkupRenderer for JsRenderer {
    fn render(&self, source: &str) -> Result<String, RenderError> {
        let value = self
            .0
            .call1(&JsValue::NULL, &JsValue::from_str(source))
            .map_err(|e| format!("{:?}", e))?;
        value
            .as_string()
            .ok_or_else(|| "markup renderer returned a non-string value".into())
    }
}

struct MissingRenderer;

impl MarkupRenderer for MissingRenderer {
    fn render(&self, _source: &str) -> Result<String, RenderError> {
        Err("Parsing libraries not available in worker.".into())
    }
}

/// Convert a file and return the worker reply object
///
/// `kind` is the type discriminator (`"epub"` or anything else for
/// markdown). `config` is an optional plain object matching
/// [`ConvertConfig`]; `render_markdown` is required for markdown input.
#[wasm_bindgen(js_name = "convertFile")]
pub fn convert_file(
    data: &[u8],
    kind: &str,
    config: JsValue,
    render_markdown: Option<js_sys::Function>,
) -> Result<JsValue, JsValue> {
    let config: ConvertConfig = if config.is_undefined() || config.is_null() {
        ConvertConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
    };

    let kind = FileKind::from_discriminator(kind);
    let result = match render_markdown {
        Some(function) => convert(data, kind, &config, &JsRenderer(function)),
        None => convert(data, kind, &config, &MissingRenderer),
    };

    serde_wasm_bindgen::to_value(&WorkerMessage::from_result(result))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
