fn is_path_separator(ch: char) -> bool {
    ch == '/' || ch == std::path::MAIN_SEPARATOR
}

/// Non-empty segments of `value`, each paired with the byte offset where it
/// ends, so callers can slice the original string through a segment.
pub fn path_segments(value: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut offset = 0;
    value
        .split(is_path_separator)
        .filter_map(move |segment| {
            let start = offset;
            offset += segment.len() + 1;
            if segment.is_empty() {
                None
            } else {
                Some((start + segment.len(), segment))
            }
        })
}

/// Last real component of `value`, ignoring trailing separators.
pub fn basename(value: &str) -> Option<&str> {
    value
        .trim_end_matches(is_path_separator)
        .rsplit(is_path_separator)
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Purely textual canonical form: no repeated separators, no `.` segments,
/// `..` folded into its parent. Absolute paths never climb above `/`.
pub fn normalize_lexically(value: &str) -> String {
    let absolute = value.starts_with(is_path_separator);
    let mut stack: Vec<&str> = Vec::new();
    for (_, segment) in path_segments(value) {
        match segment {
            "." => {}
            ".." => match stack.last() {
                Some(&last) if last != ".." => {
                    stack.pop();
                }
                _ if absolute => {}
                _ => stack.push(".."),
            },
            other => stack.push(other),
        }
    }

    let joined = stack.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => String::from("."),
        (false, false) => joined,
    }
}

/// Component-aware containment: `/Volumes/x` is under `/Volumes`,
/// `/VolumesX` is not.
pub fn is_under(value: &str, root: &str) -> bool {
    let value = normalize_lexically(value);
    let root = normalize_lexically(root);
    if root == "/" {
        return value.starts_with('/');
    }
    match value.strip_prefix(root.as_str()) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Directory holding `value`, or `None` for the root and bare names.
pub fn parent_dir(value: &str) -> Option<String> {
    let normalized = normalize_lexically(value);
    if normalized == "/" {
        return None;
    }
    match normalized.rfind('/') {
        Some(0) => Some(String::from("/")),
        Some(idx) => Some(normalized[..idx].to_string()),
        None => None,
    }
}
