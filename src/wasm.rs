use std::collections::HashMap;

use wasm_bindgen::prelude::*;

use crate::image_loader::Assets;

/// Render a JSON record with an optional JSON sheet to PDF bytes.
///
/// `images_json` is an optional object mapping image cell values to data
/// URIs. Images that fail to load are skipped and drawn as fallback text.
#[wasm_bindgen]
pub fn render_pdf(
    record_json: &str,
    sheet_json: Option<String>,
    images_json: Option<String>,
) -> Result<Vec<u8>, JsValue> {
    let sources: HashMap<String, String> = match images_json {
        Some(json) => {
            serde_json::from_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
        }
        None => HashMap::new(),
    };
    let assets = Assets::from_sources(sources.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    crate::render_json_with_assets(record_json, sheet_json.as_deref(), &assets)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// The reference sheet as JSON, as a starting point for custom layouts.
#[wasm_bindgen]
pub fn reference_sheet() -> Result<String, JsValue> {
    serde_json::to_string_pretty(&crate::model::Sheet::reference())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
