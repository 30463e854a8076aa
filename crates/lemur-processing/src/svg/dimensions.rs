//! Intrinsic size of an SVG for attachment metadata.
//!
//! Units are not converted: `2em` and `50%` count as 2 and 50.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SvgDimensions {
    pub width: u32,
    pub height: u32,
}

pub const FALLBACK_DIMENSIONS: SvgDimensions = SvgDimensions {
    width: 100,
    height: 100,
};

static ROOT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(?:[a-z_][\w.-]*:)?svg\b[^>]*>").expect("valid regex"));

static VIEW_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)viewBox\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});

static WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)width\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});

static HEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)height\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});

/// Dimensions read from raw SVG markup.
///
/// Only the opening `<svg>` tag is inspected when one is found, so nested
/// shapes cannot stand in for the document size.
pub fn get_svg_dimensions(content: &str) -> SvgDimensions {
    let scope = ROOT_TAG
        .find(content)
        .map(|m| m.as_str())
        .unwrap_or(content);

    dimensions_from_attributes(
        capture(&VIEW_BOX, scope),
        capture(&WIDTH, scope),
        capture(&HEIGHT, scope),
    )
}

fn capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// viewBox, then width/height, then the fallback.
pub(crate) fn dimensions_from_attributes(
    view_box: Option<&str>,
    width: Option<&str>,
    height: Option<&str>,
) -> SvgDimensions {
    if let Some(dims) = view_box.and_then(parse_view_box) {
        return dims;
    }

    match (width.and_then(parse_length), height.and_then(parse_length)) {
        (Some(width), Some(height)) => SvgDimensions { width, height },
        _ => FALLBACK_DIMENSIONS,
    }
}

fn parse_view_box(value: &str) -> Option<SvgDimensions> {
    let numbers = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;

    match numbers.as_slice() {
        [_, _, width, height] => Some(SvgDimensions {
            width: round_dimension(*width)?,
            height: round_dimension(*height)?,
        }),
        _ => None,
    }
}

fn parse_length(value: &str) -> Option<u32> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    let number = ["px", "em", "%"]
        .iter()
        .find_map(|unit| lower.strip_suffix(unit))
        .unwrap_or(lower.as_str());

    round_dimension(number.trim_end().parse::<f64>().ok()?)
}

fn round_dimension(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value.round() as u32)
}
