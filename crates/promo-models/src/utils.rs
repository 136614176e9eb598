//! Small shared helpers.

/// Make a product name safe for filesystem and archive entry names.
///
/// Spaces and path separators become underscores; other characters pass
/// through unchanged so non-ASCII product names stay readable.
pub fn sanitize_product_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Parse a newline-separated selling-point field: trim every line and
/// drop blanks.
pub fn parse_selling_points(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_product_name() {
        assert_eq!(sanitize_product_name("Smart Watch V8/Pro"), "Smart_Watch_V8_Pro");
        assert_eq!(sanitize_product_name("  trimmed  name "), "trimmed__name");
    }

    #[test]
    fn test_parse_selling_points() {
        let points = parse_selling_points("30-day battery\n\n  waterproof  \n");
        assert_eq!(points, vec!["30-day battery", "waterproof"]);
    }
}
