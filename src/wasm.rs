use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn layout_document_json(json: &str) -> Result<String, JsValue> {
    crate::layout_json(json).map_err(|e| JsValue::from_str(&e.to_string()))
}
