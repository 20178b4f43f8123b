//! Prompt sanitization.
//!
//! Upstream failures sometimes hand back HTML error pages which then leak
//! into downstream prompts. Before any text is sent to the image or audio
//! endpoints it is scrubbed of markup, entities and document boilerplate;
//! degenerate results are replaced with a fixed generic phrase.

use std::sync::OnceLock;

use regex::Regex;

/// Substituted when sanitization leaves nothing usable.
pub const FALLBACK_PROMPT: &str =
    "beautiful landscape, artistic masterpiece, vibrant colors, professional photography";

/// Minimum length a cleaned prompt must have to be considered valid.
const MIN_PROMPT_LEN: usize = 5;

struct Patterns {
    tags: Regex,
    entities: Regex,
    boilerplate: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        tags: Regex::new(r"<[^>]*>").expect("valid regex"),
        entities: Regex::new(r"&[^;\s]+;").expect("valid regex"),
        boilerplate: Regex::new(r"(?i)doctype\s+html|charset[^,\s]*|viewport[^,\s]*|maximum-scale[^,\s]*")
            .expect("valid regex"),
        whitespace: Regex::new(r"\s+").expect("valid regex"),
    })
}

/// Clean a free-text prompt for use against the generative API.
///
/// Removes tag-like markup, collapses HTML entities to spaces, strips
/// doctype/charset/viewport/scale declarations case-insensitively,
/// collapses whitespace runs and trims. Results shorter than 5 characters
/// or still carrying suspicious residue (`meta`, `property`) are replaced
/// with [`FALLBACK_PROMPT`]. Idempotent.
pub fn clean_prompt(prompt: &str) -> String {
    let p = patterns();
    let cleaned = p.tags.replace_all(prompt, "");
    let cleaned = p.entities.replace_all(&cleaned, " ");
    let cleaned = p.boilerplate.replace_all(&cleaned, "");
    let cleaned = p.whitespace.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();

    if cleaned.len() < MIN_PROMPT_LEN || cleaned.contains("meta") || cleaned.contains("property") {
        return FALLBACK_PROMPT.to_string();
    }

    cleaned.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(clean_prompt("sunset over mountains"), "sunset over mountains");
    }

    #[test]
    fn test_strips_markup_and_entities() {
        let cleaned = clean_prompt("a <b>bold</b> scene &amp; more");
        assert_eq!(cleaned, "a bold scene more");
    }

    #[test]
    fn test_strips_boilerplate_tokens() {
        let cleaned = clean_prompt("DOCTYPE html a grand canyon at dawn charset=utf-8");
        assert_eq!(cleaned, "a grand canyon at dawn");
    }

    #[test]
    fn test_markup_only_input_falls_back() {
        let cleaned = clean_prompt("<html><meta charset='utf-8'></html>");
        assert_eq!(cleaned, FALLBACK_PROMPT);
        assert!(!cleaned.is_empty());
    }

    #[test]
    fn test_short_residue_falls_back() {
        assert_eq!(clean_prompt("  ab "), FALLBACK_PROMPT);
        assert_eq!(clean_prompt(""), FALLBACK_PROMPT);
    }

    #[test]
    fn test_suspicious_tokens_fall_back() {
        assert_eq!(clean_prompt("og:property content here"), FALLBACK_PROMPT);
        assert_eq!(clean_prompt("some meta description text"), FALLBACK_PROMPT);
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "sunset over mountains",
            "a <b>bold</b> scene &amp; more",
            "<html><meta charset='utf-8'></html>",
            "   spaced    out   text   ",
            "",
        ] {
            let once = clean_prompt(input);
            let twice = clean_prompt(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_prompt("wide   open\n\tplains"), "wide open plains");
    }
}
