//! Cheap content sniffing before the XML parse.

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

const SVG_SIGNATURES: &[&[u8]] = &[b"<?xml", b"<svg", b"<!--"];

/// Whether `data` starts like an SVG/XML document.
///
/// This rejects binaries renamed to `.svg`; it does not replace parsing.
pub fn is_valid_svg_content(data: &[u8]) -> bool {
    let trimmed = strip_bom(data.trim_ascii_start()).trim_ascii_start();

    SVG_SIGNATURES.iter().any(|signature| {
        trimmed.len() >= signature.len()
            && trimmed[..signature.len()].eq_ignore_ascii_case(signature)
    })
}

pub(crate) fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_prefixes() {
        assert!(is_valid_svg_content(b"<?xml version=\"1.0\"?><svg/>"));
        assert!(is_valid_svg_content(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"));
        assert!(is_valid_svg_content(b"<!-- Generator: Inkscape --><svg/>"));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(is_valid_svg_content(b"  \n\t<SVG/>"));
        assert!(is_valid_svg_content(b"<?XML version=\"1.0\"?>"));
    }

    #[test]
    fn test_bom_is_skipped() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(b"<svg/>");
        assert!(is_valid_svg_content(&data));
    }

    #[test]
    fn test_rejects_other_content() {
        assert!(!is_valid_svg_content(b"\x89PNG\r\n\x1a\n"));
        assert!(!is_valid_svg_content(b"GIF89a"));
        assert!(!is_valid_svg_content(b"<html><svg/></html>"));
        assert!(!is_valid_svg_content(b""));
        assert!(!is_valid_svg_content(b"<sv"));
    }
}
