//! Tree sanitization of untrusted SVG markup.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use super::attributes::{sanitize_attributes, sanitize_style_attribute};
use super::document::{Element, Node, SvgDocument};
use super::policy::SanitizationPolicy;
use super::signature::strip_bom;
use super::SvgError;

static PROCESSING_INSTRUCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?.*?\?>").expect("valid regex"));

static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!DOCTYPE(?:[^>\[]|\[.*?\])*>").expect("valid regex")
});

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!ENTITY[^>]*>").expect("valid regex"));

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>").expect("valid regex"));

/// What a sanitization pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    pub removed_elements: usize,
    pub removed_attributes: usize,
    pub removed_nodes: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self.removed_elements == 0 && self.removed_attributes == 0 && self.removed_nodes == 0
    }
}

/// Parse and sanitize raw upload bytes.
pub fn sanitize(raw: &[u8], policy: &SanitizationPolicy) -> Result<SvgDocument, SvgError> {
    sanitize_with_report(raw, policy).map(|(document, _)| document)
}

pub fn sanitize_with_report(
    raw: &[u8],
    policy: &SanitizationPolicy,
) -> Result<(SvgDocument, SanitizeReport), SvgError> {
    let content = std::str::from_utf8(strip_bom(raw)).map_err(|_| SvgError::NotXml)?;
    let cleaned = strip_dangerous_markup(content);

    let mut document = SvgDocument::parse(&cleaned)?;
    let mut report = SanitizeReport::default();

    let root = document.root_mut();
    sanitize_attributes(root, policy, &mut report);
    sanitize_node(root, policy, &mut report);

    Ok((document, report))
}

/// Textual pre-pass: processing instructions other than `<?xml`, DOCTYPE,
/// ENTITY declarations and CDATA sections are cut out before parsing.
pub fn strip_dangerous_markup(content: &str) -> String {
    let without_cdata = CDATA.replace_all(content, "");
    let without_pi = PROCESSING_INSTRUCTION.replace_all(&without_cdata, |caps: &Captures| {
        let pi = &caps[0];
        if pi.starts_with("<?xml") {
            pi.to_string()
        } else {
            String::new()
        }
    });
    let without_doctype = DOCTYPE.replace_all(&without_pi, "");
    ENTITY.replace_all(&without_doctype, "").into_owned()
}

/// Sanitize the children of `element` depth-first.
///
/// Children are moved out before any of them is inspected, so removals
/// never disturb the walk.
pub fn sanitize_node(
    element: &mut Element,
    policy: &SanitizationPolicy,
    report: &mut SanitizeReport,
) {
    let children = std::mem::take(&mut element.children);
    element.children.reserve(children.len());

    for child in children {
        match child {
            Node::Element(mut child) => {
                let name = child.local_name();

                if policy.is_denied_element(&name) {
                    tracing::debug!(element = %child.name, "Removing denied SVG element");
                    report.removed_elements += 1;
                    continue;
                }
                if !policy.is_allowed_element(&name) {
                    tracing::debug!(element = %child.name, "Removing unknown SVG element");
                    report.removed_elements += 1;
                    continue;
                }

                sanitize_attributes(&mut child, policy, report);

                if name == "style" && sanitize_style_attribute(&child.text()).is_none() {
                    tracing::debug!("Removing <style> element with unsafe CSS");
                    report.removed_elements += 1;
                    continue;
                }

                sanitize_node(&mut child, policy, report);
                element.children.push(Node::Element(child));
            }
            Node::Comment(_) | Node::ProcessingInstruction(_) => {
                report.removed_nodes += 1;
            }
            text @ Node::Text(_) => element.children.push(text),
        }
    }
}
