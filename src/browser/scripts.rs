//! JavaScript snippets evaluated inside the page.

/// Full document height in CSS pixels.
pub const CONTENT_HEIGHT_SCRIPT: &str = "document.documentElement.scrollHeight";

/// Resolves once the `load` event has fired.
pub(crate) const WAIT_FOR_LOAD_SCRIPT: &str = r#"
new Promise((resolve) => {
  if (document.readyState === 'complete') {
    resolve(true);
  } else {
    window.addEventListener('load', () => resolve(true), { once: true });
  }
})
"#;

/// Resolves once the DOM has been parsed.
pub(crate) const WAIT_FOR_DOM_CONTENT_SCRIPT: &str = r#"
new Promise((resolve) => {
  if (document.readyState !== 'loading') {
    resolve(true);
  } else {
    document.addEventListener('DOMContentLoaded', () => resolve(true), { once: true });
  }
})
"#;

/// Build a call expression `(<function>)(arg0, arg1, ...)` with JSON arguments.
pub fn call_expression(function: &str, args: &[serde_json::Value]) -> String {
    let args = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})({})", function.trim(), args)
}

/// Interpret the scroll height returned by the page.
pub fn parse_content_height(value: &serde_json::Value) -> Option<u32> {
    value
        .as_f64()
        .filter(|h| h.is_finite() && *h >= 0.0)
        .map(|h| h.ceil().min(u32::MAX as f64) as u32)
}
