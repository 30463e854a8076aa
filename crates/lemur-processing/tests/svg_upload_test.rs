use std::io::Read;

use flate2::read::GzDecoder;
use lemur_core::SvgUploadConfig;
use lemur_processing::svg::{compress_gzip, read_bounded, MAX_ELEMENT_DEPTH, XML_DECLARATION};
use lemur_processing::{
    get_svg_dimensions, sanitize, SanitizationPolicy, SvgDimensions, SvgError,
    SvgUploadProcessor, UploadedFile,
};

fn clean(raw: &str) -> String {
    sanitize(raw.as_bytes(), &SanitizationPolicy::default())
        .expect("sanitize")
        .to_xml()
}

#[test]
fn test_nested_payload_reduces_to_empty_root() {
    let raw = r#"<svg><script>alert(1)</script><foreignObject><iframe src="evil"></iframe></foreignObject></svg>"#;
    assert_eq!(clean(raw), format!("{}<svg/>", XML_DECLARATION));
}

#[test]
fn test_non_svg_root_rejected() {
    let result = sanitize(b"<root><svg/></root>", &SanitizationPolicy::default());
    assert!(matches!(result, Err(SvgError::NotSvgRoot)));
}

#[test]
fn test_deny_list_wins_over_extended_allow_list() {
    let policy = SanitizationPolicy::default().with_allowed_elements(["script", "foreignObject"]);
    let out = sanitize(b"<svg><script>x</script><circle r=\"1\"/></svg>", &policy)
        .expect("sanitize")
        .to_xml();
    assert!(!out.contains("script"));
    assert!(out.contains("<circle"));
}

#[test]
fn test_sanitize_is_idempotent() {
    let raw = r##"<?xml version="1.0"?>
<!DOCTYPE svg [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 10 10" onload="x()">
  <style>rect { fill: red; }</style>
  <a href="https://example.org" onmouseover="x()"><text>Hi &amp; welcome</text></a>
  <use xlink:href="#shape"/>
  <image href="javascript:alert(1)"/>
  <rect id="shape" style="fill: blue" width="4" height="4"/>
</svg>"##;
    let first = clean(raw);
    let second = clean(&first);
    assert_eq!(first, second);
    assert!(!first.contains("onload"));
    assert!(!first.contains("onmouseover"));
    assert!(!first.contains("javascript"));
    assert!(!first.contains("ENTITY"));
    assert!(first.contains("Hi &amp; welcome"));
}

#[test]
fn test_on_prefixed_attributes_always_removed() {
    let out = clean(r#"<svg ONFUTUREEVENT="x()"><g onwhatever="x()" opacity="0.5"/></svg>"#);
    let lower = out.to_lowercase();
    assert!(!lower.contains("onfutureevent"));
    assert!(!lower.contains("onwhatever"));
    assert!(out.contains("opacity"));
}

#[test]
fn test_href_rules() {
    let out = clean(
        r##"<svg><a href="javascript:alert(1)"/><a id="keep" href="https://example.org"/><use href="https://example.org"/><use id="frag" href="#section1"/></svg>"##,
    );
    assert!(!out.contains("javascript"));
    assert!(out.contains(r#"<a id="keep" href="https://example.org"/>"#));
    assert!(out.contains(r##"<use id="frag" href="#section1"/>"##));
    assert_eq!(out.matches("https://example.org").count(), 1);
}

#[test]
fn test_prefixed_xlink_href_follows_use_rules() {
    let out = clean(
        r##"<svg xmlns:x="http://www.w3.org/1999/xlink"><use x:href="https://evil.example/x.svg#a"/><use x:href="#local"/></svg>"##,
    );
    assert!(!out.contains("evil.example"));
    assert!(out.contains(r##"<use x:href="#local"/>"##));
}

#[test]
fn test_deeply_nested_upload_is_rejected() {
    let depth = 250_000;
    let mut raw = String::from("<svg>");
    raw.push_str(&"<g>".repeat(depth));
    raw.push_str(&"</g>".repeat(depth));
    raw.push_str("</svg>");

    let config = SvgUploadConfig::default();
    assert!(raw.len() < config.max_upload_bytes);

    let file = UploadedFile::new(raw.into_bytes(), "deep.svg", "image/svg+xml");
    let result = SvgUploadProcessor::from_config(&config).process(file);
    assert!(matches!(result, Err(SvgError::NotXml)));
}

#[test]
fn test_nesting_at_limit_round_trips() {
    let depth = MAX_ELEMENT_DEPTH - 1;
    let raw = format!("<svg>{}{}</svg>", "<g>".repeat(depth), "</g>".repeat(depth));
    let first = clean(&raw);
    assert_eq!(clean(&first), first);
}

#[test]
fn test_view_box_dimensions() {
    assert_eq!(
        get_svg_dimensions(r#"<svg viewBox="0 0 120 45.6"/>"#),
        SvgDimensions {
            width: 120,
            height: 46
        }
    );
}

struct CountingReader<R> {
    inner: R,
    produced: usize,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.produced += n;
        Ok(n)
    }
}

#[test]
fn test_zip_bomb_aborts_without_full_inflate() {
    let bomb = compress_gzip(&vec![b'A'; 32 * 1024 * 1024]).expect("compress");
    let max = 1024 * 1024;

    let mut reader = CountingReader {
        inner: GzDecoder::new(bomb.as_slice()),
        produced: 0,
    };
    let result = read_bounded(&mut reader, max);

    assert!(matches!(result, Err(SvgError::TooLarge { .. })));
    assert!(reader.produced <= max + lemur_processing::svg::GZIP_CHUNK_SIZE);
}

#[test]
fn test_svgz_upload_end_to_end() {
    let processor = SvgUploadProcessor::from_config(&SvgUploadConfig::default());
    let raw = br#"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32"><script>x</script></svg>"#;
    let file = UploadedFile::new(
        compress_gzip(raw).expect("compress"),
        "Club Logo.svgz",
        "image/svg+xml-compressed",
    );

    let processed = processor.process(file).expect("process");
    assert_eq!(processed.safe_filename, "Club_Logo.svgz");
    assert!(processed.metadata.compressed);
    assert_eq!(
        processed.metadata.dimensions,
        SvgDimensions {
            width: 64,
            height: 32
        }
    );

    let mut inflated = String::new();
    GzDecoder::new(processed.data.as_slice())
        .read_to_string(&mut inflated)
        .expect("inflate");
    assert!(!inflated.contains("script"));
}

#[test]
fn test_upload_extension_allow_list() {
    let processor = SvgUploadProcessor::from_config(&SvgUploadConfig::default());
    let svg = b"<svg/>".to_vec();

    for name in ["logo.php", "logo.svg.php", "logo.html"] {
        let file = UploadedFile::new(svg.clone(), name, "image/svg+xml");
        let result = processor.process(file);
        assert!(matches!(result, Err(SvgError::Validation(_))), "{name}");
    }

    let file = UploadedFile::new(svg, "logo.svg", "image/svg+xml; charset=utf-8");
    assert!(processor.process(file).is_ok());
}

#[test]
fn test_upload_too_large() {
    let config = SvgUploadConfig {
        max_upload_bytes: 8,
        ..SvgUploadConfig::default()
    };
    let file = UploadedFile::new(b"<svg></svg>".to_vec(), "a.svg", "image/svg+xml");
    assert!(matches!(
        SvgUploadProcessor::from_config(&config).process(file),
        Err(SvgError::TooLarge { size: 11, max: 8 })
    ));
}
