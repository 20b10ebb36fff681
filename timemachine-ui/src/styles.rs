#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-time-machine-ui]";

/// CSS mặc định; mọi màu đều là biến CSS để trang nhúng ghi đè.
pub const DEFAULT_STYLES: &str = r#"
.time-machine {
  --time-machine-column-width: 300px;
  --time-machine-gap: 24px;
  color: var(--time-machine-text-color, black);
  background: var(--time-machine-background-color, white);
  font-family: 'Comfortaa', 'Source Sans Pro', Helvetica, sans-serif;
}

.time-machine-masonry {
  column-width: var(--time-machine-column-width);
  column-gap: var(--time-machine-gap);
}

.time-machine-status {
  padding: 12px 4px;
  color: var(--time-machine-text-color, black);
}

.time-machine-tile {
  break-inside: avoid;
  display: block;
  margin-bottom: var(--time-machine-gap);
}

.time-machine-tile-content {
  position: relative;
  margin: 0;
  padding: 0;
}

.time-machine-tile h1 {
  background-color: var(--time-machine-title-background-color, rgba(255, 255, 255, .7));
  color: var(--time-machine-title-color, rgba(0, 0, 0, 1));
  font-size: var(--time-machine-title-font-size, 16px);
  margin: 0;
  padding: 4px 24px 4px 4px;
}

.time-machine-tile.with-image h1 {
  position: absolute;
  top: 0;
  left: 0;
  right: 0;
}

.time-machine-tile img {
  margin: 0;
  padding: 0;
  display: block;
  width: 100%;
  min-height: 375px;
  object-fit: cover;
  object-position: center;
}

.time-machine-tile p {
  margin: 0;
  padding: 4px;
  background-color: var(--time-machine-text-background-color, rgba(255, 255, 255, .5));
  color: var(--time-machine-text-color, rgba(0, 0, 0, 1));
  font-size: var(--time-machine-text-font-size, 14px);
}

.time-machine-tile.with-image p {
  position: absolute;
  bottom: 0;
  left: 0;
  right: 0;
  max-height: 150px;
  overflow-y: auto;
}

.time-machine-tile hr {
  background-image: linear-gradient(
    90deg,
    rgba(0, 0, 0, 0),
    var(--time-machine-ruler-color, rgba(0, 0, 0, 1)),
    rgba(0, 0, 0, 0)
  );
  border: 0;
  height: 1px;
  margin-top: 32px;
}

.time-machine-tile .category-icon {
  display: block;
  position: absolute;
  top: 0;
  right: 0;
  margin: 4px;
  font-size: 18px;
  line-height: 1;
}

.time-machine-sources {
  color: var(--time-machine-source-color, #42c0d9);
  font-weight: normal;
  font-size: 0.7em;
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document không có thẻ <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-time-machine-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
