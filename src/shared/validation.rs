use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Runs of anything that is not an ASCII letter or digit, used for slugs
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();

    /// File extension as stored in `resources.format`
    /// - Valid: "pdf", "docx", "mp4"
    /// - Invalid: "", ".pdf", "tar.gz", "p df"
    pub static ref FORMAT_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]{1,16}$").unwrap();
}

/// Reject strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Lowercase ASCII slug. Falls back to `"file"` when nothing survives.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "file".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Intro to Algorithms"), "intro-to-algorithms");
        assert_eq!(slugify("  C++ / Rust: 2nd ed. "), "c-rust-2nd-ed");
        assert_eq!(slugify("!!!"), "file");
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("math").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_format_regex() {
        assert!(FORMAT_REGEX.is_match("pdf"));
        assert!(FORMAT_REGEX.is_match("MP4"));
        assert!(!FORMAT_REGEX.is_match(""));
        assert!(!FORMAT_REGEX.is_match(".pdf"));
        assert!(!FORMAT_REGEX.is_match("tar.gz"));
    }
}
