/// Read page tags from a leading YAML front-matter block.
///
/// Returns the tags plus the line index of the first body line, so the
/// task scan can skip the block (a YAML list entry can look exactly
/// like a checklist line). A document with no front matter, or with an
/// unclosed or unparseable block, yields no tags; the body starts at
/// line 0 unless a well-formed block was found.
pub fn page_tags(text: &str) -> (Vec<String>, usize) {
    let mut lines = text.lines().enumerate();
    match lines.next() {
        Some((_, first)) if first.trim_end() == "---" => {}
        _ => return (Vec::new(), 0),
    }

    let mut yaml = String::new();
    for (i, line) in lines {
        if line.trim() == "---" {
            return (tags_from_yaml(&yaml), i + 1);
        }
        yaml.push_str(line);
        yaml.push('\n');
    }

    // No closing delimiter: the whole document is body
    (Vec::new(), 0)
}

/// Pull the `tags` key out of the front-matter YAML. Accepts a sequence
/// of strings or a single string; anything else (including YAML that
/// does not parse) yields no tags. Tags are normalized to carry a `#`
/// prefix like line tags.
fn tags_from_yaml(yaml: &str) -> Vec<String> {
    let value: serde_yaml_ng::Value = match serde_yaml_ng::from_str(yaml) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    match value.get("tags") {
        Some(serde_yaml_ng::Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str())
            .map(normalize_tag)
            .collect(),
        Some(serde_yaml_ng::Value::String(s)) => vec![normalize_tag(s)],
        _ => Vec::new(),
    }
}

fn normalize_tag(tag: &str) -> String {
    if tag.starts_with('#') {
        tag.to_string()
    } else {
        format!("#{}", tag)
    }
}
