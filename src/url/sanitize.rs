/// Characters that cannot appear in a file or directory name on common filesystems
const ILLEGAL_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Maximum length of a sanitized name, in characters
pub const MAX_NAME_CHARS: usize = 100;

/// Turns link text into a safe single path component
///
/// Illegal characters and control characters become spaces, surrounding
/// whitespace is trimmed and the result is capped at [`MAX_NAME_CHARS`]
/// characters. Returns `None` when nothing usable remains, including names
/// made only of dots.
///
/// # Examples
///
/// ```
/// use catalog_harvester::url::sanitize_name;
///
/// assert_eq!(sanitize_name("A/B:C*D"), Some("A B C D".to_string()));
/// assert_eq!(sanitize_name("  ..  "), None);
/// ```
pub fn sanitize_name(raw: &str) -> Option<String> {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();

    let capped: String = replaced.trim().chars().take(MAX_NAME_CHARS).collect();
    let name = capped.trim_end();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        return None;
    }

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_characters_replaced() {
        let name = sanitize_name("A/B:C*D").unwrap();
        assert!(!name.chars().any(|c| ILLEGAL_CHARS.contains(&c)));
        assert_eq!(name, "A B C D");

        let name = sanitize_name(r#"a\b?c"d<e>f|g"#).unwrap();
        assert_eq!(name, "a b c d e f g");
    }

    #[test]
    fn test_truncated_to_max_chars() {
        let long = "电".repeat(250);
        let name = sanitize_name(&long).unwrap();
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_trailing_space_after_truncation_is_trimmed() {
        let raw = format!("{} tail", "x".repeat(MAX_NAME_CHARS - 1));
        let name = sanitize_name(&raw).unwrap();
        assert_eq!(name, "x".repeat(MAX_NAME_CHARS - 1));
    }

    #[test]
    fn test_whitespace_and_controls() {
        assert_eq!(
            sanitize_name("  Movie\tX\n "),
            Some("Movie X".to_string())
        );
    }

    #[test]
    fn test_empty_or_dot_names_rejected() {
        assert_eq!(sanitize_name(""), None);
        assert_eq!(sanitize_name("/:*"), None);
        assert_eq!(sanitize_name("."), None);
        assert_eq!(sanitize_name(".."), None);
        assert_eq!(sanitize_name("...a"), Some("...a".to_string()));
    }
}
