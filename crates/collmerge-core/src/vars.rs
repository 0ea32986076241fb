//! Variable placeholder recognition.
//!
//! Two templating conventions show up in collections:
//! - `{{name}}`: a collection/environment variable chosen by a human
//! - `:name`: a bare path parameter, as emitted by spec converters

use once_cell::sync::Lazy;
use regex::Regex;

static TEMPLATE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{[^}]+\}\}$").expect("valid template segment regex"));

static PATH_PARAM_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:[A-Za-z0-9_-]+$").expect("valid path param regex"));

static TEMPLATE_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[^{}]+\}\}").expect("valid template regex"));

/// The whole segment is a `{{name}}` variable.
pub fn is_template_segment(segment: &str) -> bool {
    TEMPLATE_SEGMENT.is_match(segment)
}

/// The whole segment is a `:name` path parameter.
pub fn is_path_param_segment(segment: &str) -> bool {
    PATH_PARAM_SEGMENT.is_match(segment)
}

/// Either placeholder convention.
pub fn is_placeholder_segment(segment: &str) -> bool {
    is_template_segment(segment) || is_path_param_segment(segment)
}

/// The text contains at least one `{{name}}` occurrence.
pub fn contains_template(text: &str) -> bool {
    TEMPLATE_ANYWHERE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_both_conventions() {
        assert!(is_template_segment("{{tcmTenantId}}"));
        assert!(is_path_param_segment(":siteId"));
        assert!(is_placeholder_segment(":site-id"));
        assert!(!is_placeholder_segment("sites"));
        assert!(!is_template_segment("{{a}}b"));
        assert!(!is_path_param_segment(":"));
    }

    #[test]
    fn template_inside_text() {
        assert!(contains_template("Bearer {{token}}"));
        assert!(!contains_template("{ not a var }"));
        assert!(!contains_template("{{}}"));
    }
}
