//! Attribute-level checks: event handlers, URLs, hrefs and inline styles.

use std::sync::LazyLock;

use regex::Regex;

use super::document::{local_name, Element};
use super::policy::{SanitizationPolicy, DANGEROUS_URL_SCHEMES};
use super::sanitizer::SanitizeReport;

static RASTER_DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^data:image/(png|jpeg|jpg|gif|webp);base64,").expect("valid regex")
});

static STYLE_DANGEROUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)url\s*\([^)]*(javascript|vbscript|data:text|data:application)")
        .expect("valid regex")
});

static STYLE_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)expression\s*\(").expect("valid regex"));

static STYLE_BEHAVIOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)behavior\s*:").expect("valid regex"));

static STYLE_MOZ_BINDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-moz-binding\s*:").expect("valid regex"));

/// Whether `value` starts with a scriptable URL scheme.
///
/// Whitespace and control characters anywhere in the value are ignored, so
/// `java\tscript:` is caught.
pub fn is_dangerous_url(value: &str) -> bool {
    starts_with_scheme(value, DANGEROUS_URL_SCHEMES)
}

fn starts_with_scheme(value: &str, schemes: &[&str]) -> bool {
    let cleaned: String = value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    schemes.iter().any(|scheme| cleaned.starts_with(scheme))
}

/// Whether an `href`/`xlink:href` value may stay on `tag_name`.
pub fn is_allowed_href(value: &str, tag_name: &str) -> bool {
    let value = value.trim();
    if value.starts_with('#') {
        return true;
    }

    let lower = value.to_lowercase();
    let is_web = lower.starts_with("http://") || lower.starts_with("https://");

    match tag_name.to_lowercase().as_str() {
        "a" => is_web || lower.starts_with("mailto:"),
        // External <use> references can pull in remote SVG.
        "use" => false,
        // svg+xml data URIs are nested documents, only raster data is accepted.
        "image" => is_web || RASTER_DATA_URI.is_match(value),
        _ => false,
    }
}

/// Returns the style unchanged when safe, `None` when it must be dropped.
///
/// This is a targeted blacklist, not a CSS parser.
pub fn sanitize_style_attribute(value: &str) -> Option<String> {
    let rejected = STYLE_DANGEROUS_URL.is_match(value)
        || STYLE_EXPRESSION.is_match(value)
        || STYLE_BEHAVIOR.is_match(value)
        || STYLE_MOZ_BINDING.is_match(value);

    if rejected {
        None
    } else {
        Some(value.to_string())
    }
}

/// Strip unsafe attributes from `element`. Removal happens after the scan.
pub fn sanitize_attributes(
    element: &mut Element,
    policy: &SanitizationPolicy,
    report: &mut SanitizeReport,
) {
    let tag = element.local_name();
    let mut remove = vec![false; element.attributes.len()];

    for (index, attr) in element.attributes.iter_mut().enumerate() {
        let name = attr.name.to_lowercase();

        if policy.is_event_attribute(&name) || name.starts_with("on") {
            remove[index] = true;
        } else if starts_with_scheme(&attr.value, policy.dangerous_schemes()) {
            remove[index] = true;
        } else if local_name(&name) == "href" {
            // Any prefix may be bound to the XLink namespace.
            remove[index] = !is_allowed_href(&attr.value, &tag);
        } else if name == "style" {
            match sanitize_style_attribute(&attr.value) {
                Some(cleaned) => attr.value = cleaned,
                None => remove[index] = true,
            }
        }

        if remove[index] {
            tracing::debug!(element = %tag, attribute = %attr.name, "Removing unsafe SVG attribute");
        }
    }

    report.removed_attributes += remove.iter().filter(|flag| **flag).count();

    let mut flags = remove.into_iter();
    element.attributes.retain(|_| !flags.next().unwrap_or(false));
}
