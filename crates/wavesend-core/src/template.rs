//! Template Renderer - personalizes campaign message text

/// Render a message template for one recipient.
///
/// Replaces `{{name}}` and `{{phone}}`, plus the single-brace `{name}`
/// and `{phone}` variants. Unknown placeholders are left as-is.
pub fn resolve_template(template: &str, name: &str, phone: &str) -> String {
    template
        .replace("{{name}}", name)
        .replace("{{phone}}", phone)
        .replace("{name}", name)
        .replace("{phone}", phone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_replaces_both_placeholder_styles() {
        assert_eq!(
            resolve_template("Hi {{name}}, confirm {phone}", "Amina", "+31612345678"),
            "Hi Amina, confirm +31612345678"
        );
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(resolve_template("No variables here", "x", "y"), "No variables here");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        assert_eq!(
            resolve_template("Hi {{name}}, ref {{order}}", "Bo", "+123"),
            "Hi Bo, ref {{order}}"
        );
    }
}
