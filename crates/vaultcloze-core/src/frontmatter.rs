//! YAML front matter handling

/// Split a document into its front matter block (without delimiters) and body.
///
/// Returns `None` for the front matter when the document does not open with
/// a `---` line or the block is never closed.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    (None, content)
}

/// The `title` field of the front matter, if present and non-empty
pub fn title(content: &str) -> Option<String> {
    let (yaml, _) = split(content);
    let yaml = yaml?;
    let value: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparseable front matter");
            return None;
        }
    };

    let title = match value.get("title")? {
        serde_yaml::Value::String(s) => s.trim().to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!title.is_empty()).then_some(title)
}
