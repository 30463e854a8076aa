//! Element and attribute rules applied by the sanitizer.

use std::collections::HashSet;

use lemur_core::SvgUploadConfig;

/// SVG elements kept by default. Compared against lowercased local names.
pub const DEFAULT_ALLOWED_ELEMENTS: &[&str] = &[
    "a",
    "circle",
    "clipPath",
    "defs",
    "desc",
    "ellipse",
    "feBlend",
    "feColorMatrix",
    "feComponentTransfer",
    "feComposite",
    "feConvolveMatrix",
    "feDiffuseLighting",
    "feDisplacementMap",
    "feDistantLight",
    "feDropShadow",
    "feFlood",
    "feFuncA",
    "feFuncB",
    "feFuncG",
    "feFuncR",
    "feGaussianBlur",
    "feImage",
    "feMerge",
    "feMergeNode",
    "feMorphology",
    "feOffset",
    "fePointLight",
    "feSpecularLighting",
    "feSpotLight",
    "feTile",
    "feTurbulence",
    "filter",
    "g",
    "image",
    "line",
    "linearGradient",
    "marker",
    "mask",
    "metadata",
    "path",
    "pattern",
    "polygon",
    "polyline",
    "radialGradient",
    "rect",
    "stop",
    "style",
    "svg",
    "switch",
    "symbol",
    "text",
    "textPath",
    "title",
    "tspan",
    "use",
    "view",
];

/// Elements that are always dropped, whatever the allow-list says.
pub const DENIED_ELEMENTS: &[&str] = &[
    "script",
    "foreignObject",
    "iframe",
    "frame",
    "frameset",
    "object",
    "embed",
    "applet",
    "base",
    "link",
    "meta",
    "handler",
    "listener",
    "set",
    "animate",
];

pub const EVENT_HANDLER_ATTRIBUTES: &[&str] = &[
    "onabort",
    "onactivate",
    "onbegin",
    "onblur",
    "onchange",
    "onclick",
    "oncontextmenu",
    "ondblclick",
    "ondrag",
    "ondrop",
    "onend",
    "onerror",
    "onfocus",
    "onfocusin",
    "onfocusout",
    "oninput",
    "onkeydown",
    "onkeypress",
    "onkeyup",
    "onload",
    "onmousedown",
    "onmouseenter",
    "onmouseleave",
    "onmousemove",
    "onmouseout",
    "onmouseover",
    "onmouseup",
    "onpointerdown",
    "onpointerup",
    "onrepeat",
    "onresize",
    "onscroll",
    "onselect",
    "onsubmit",
    "ontoggle",
    "onunload",
    "onwheel",
];

pub const DANGEROUS_URL_SCHEMES: &[&str] = &[
    "javascript:",
    "vbscript:",
    "livescript:",
    "mocha:",
    "data:text/html",
    "data:application",
];

/// Sets consulted while walking an SVG tree.
///
/// Only the allow-list can be extended; the deny-list, event handler names
/// and URL schemes are fixed.
#[derive(Debug, Clone)]
pub struct SanitizationPolicy {
    allowed_elements: HashSet<String>,
    denied_elements: HashSet<String>,
    event_attributes: HashSet<String>,
    dangerous_schemes: &'static [&'static str],
}

impl Default for SanitizationPolicy {
    fn default() -> Self {
        Self {
            allowed_elements: lowercase_set(DEFAULT_ALLOWED_ELEMENTS.iter().copied()),
            denied_elements: lowercase_set(DENIED_ELEMENTS.iter().copied()),
            event_attributes: lowercase_set(EVENT_HANDLER_ATTRIBUTES.iter().copied()),
            dangerous_schemes: DANGEROUS_URL_SCHEMES,
        }
    }
}

impl SanitizationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default policy plus the configured extra elements.
    pub fn from_config(config: &SvgUploadConfig) -> Self {
        Self::default().with_allowed_elements(&config.extra_allowed_elements)
    }

    /// Extend the allow-list. Denied elements stay denied.
    pub fn with_allowed_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_elements.extend(
            names
                .into_iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .filter(|name| !name.is_empty()),
        );
        self
    }

    pub fn is_allowed_element(&self, local_name: &str) -> bool {
        self.allowed_elements.contains(&local_name.to_lowercase())
    }

    pub fn is_denied_element(&self, local_name: &str) -> bool {
        self.denied_elements.contains(&local_name.to_lowercase())
    }

    pub fn is_event_attribute(&self, name: &str) -> bool {
        self.event_attributes.contains(&name.to_lowercase())
    }

    pub fn dangerous_schemes(&self) -> &'static [&'static str] {
        self.dangerous_schemes
    }
}

fn lowercase_set<'a>(names: impl Iterator<Item = &'a str>) -> HashSet<String> {
    names.map(str::to_lowercase).collect()
}
