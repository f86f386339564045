//! Naming conventions shared by the synthesizers and the renderer.
use heck::{ToShoutySnakeCase, ToSnakeCase};

/// `QJS<Class>`, the generated wrapper that owns the installers.
pub fn wrapper_name(class_name: &str) -> String {
    format!("QJS{class_name}")
}

/// File stem of the emitted pair, e.g. `qjs_text_node`.
pub fn file_stem(module_id: &str) -> String {
    format!("qjs_{}", module_id.to_snake_case())
}

pub fn header_guard(prefix: &str, module_id: &str) -> String {
    format!("{prefix}_BINDINGS_QJS_{}_H_", module_id.to_shouty_snake_case())
}

pub fn getter_symbol(property: &str) -> String {
    format!("{property}AttributeGetCallback")
}

pub fn setter_symbol(property: &str) -> String {
    format!("{property}AttributeSetCallback")
}

/// Native setter: `value` → `setValue`. Only the first letter changes so
/// names like `innerHTML` keep their casing.
pub fn native_setter(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventions() {
        assert_eq!(wrapper_name("Blob"), "QJSBlob");
        assert_eq!(file_stem("TextNode"), "qjs_text_node");
        assert_eq!(header_guard("KRAKENBRIDGE", "blob"), "KRAKENBRIDGE_BINDINGS_QJS_BLOB_H_");
        assert_eq!(file_stem("HTMLElement"), "qjs_html_element");
        assert_eq!(native_setter("innerHTML"), "setInnerHTML");
        assert_eq!(getter_symbol("value"), "valueAttributeGetCallback");
    }
}
