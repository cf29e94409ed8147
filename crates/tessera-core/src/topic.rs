//! Topic filter matching.
//!
//! Filters follow MQTT rules: levels are separated by `/`, `+` matches exactly
//! one level and `#` matches any number of trailing levels (including none).

/// Whether `topic` is matched by `filter`.
///
/// A filter without wildcards matches only the identical topic.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    if filter == topic {
        return true;
    }
    // `#` and `+` must not match system topics at the first level.
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }

    let mut topic_levels = topic.split('/');
    for level in filter.split('/') {
        match level {
            "#" => return true,
            "+" => {
                if topic_levels.next().is_none() {
                    return false;
                }
            }
            literal => match topic_levels.next() {
                Some(t) if t == literal => {}
                _ => return false,
            },
        }
    }
    topic_levels.next().is_none()
}

/// Whether `filter` is a well-formed subscription filter.
pub fn is_valid_filter(filter: &str) -> bool {
    if filter.is_empty() {
        return false;
    }
    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len() - 1;
    levels.iter().enumerate().all(|(i, level)| match *level {
        "#" => i == last,
        "+" => true,
        other => !other.contains('#') && !other.contains('+'),
    })
}

/// Whether `filter` contains a wildcard level.
pub fn has_wildcards(filter: &str) -> bool {
    filter.split('/').any(|level| level == "+" || level == "#")
}
