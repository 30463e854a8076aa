//! SVGZ decompression with a hard ceiling on the decompressed size.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::SvgError;

pub const GZIP_CHUNK_SIZE: usize = 8 * 1024;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(GZIP_MAGIC)
}

/// Drain `reader` in fixed chunks, failing as soon as more than `max_bytes`
/// would be held.
pub fn read_bounded<R: Read>(mut reader: R, max_bytes: usize) -> Result<Vec<u8>, SvgError> {
    let mut output = Vec::new();
    let mut chunk = [0u8; GZIP_CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SvgError::Read(e)),
        };

        let total = output.len() + read;
        if total > max_bytes {
            tracing::debug!(
                read_so_far = total,
                max_bytes,
                "Decompressed SVG exceeds size limit, aborting"
            );
            return Err(SvgError::TooLarge {
                size: total,
                max: max_bytes,
            });
        }
        output.extend_from_slice(&chunk[..read]);
    }

    Ok(output)
}

pub fn decompress_gzip<R: Read>(compressed: R, max_bytes: usize) -> Result<Vec<u8>, SvgError> {
    read_bounded(GzDecoder::new(compressed), max_bytes)
}

pub fn read_gzipped_file(path: &Path, max_bytes: usize) -> Result<Vec<u8>, SvgError> {
    let file = File::open(path)?;
    decompress_gzip(BufReader::new(file), max_bytes)
}

pub fn compress_gzip(data: &[u8]) -> Result<Vec<u8>, SvgError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Counts bytes handed out by the wrapped reader.
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

    fn zip_bomb(decompressed_len: usize) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        let zeros = vec![0u8; 64 * 1024];
        let mut remaining = decompressed_len;
        while remaining > 0 {
            let n = remaining.min(zeros.len());
            encoder.write_all(&zeros[..n]).unwrap();
            remaining -= n;
        }
        encoder.finish().unwrap()
    }

    #[test]
    fn test_round_trip_within_limit() {
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        let compressed = compress_gzip(svg).unwrap();
        assert!(is_gzip(&compressed));
        let out = decompress_gzip(Cursor::new(compressed), 1024).unwrap();
        assert_eq!(out, svg);
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        let data = vec![b'a'; 4096];
        let compressed = compress_gzip(&data).unwrap();
        assert_eq!(
            decompress_gzip(Cursor::new(compressed), 4096).unwrap().len(),
            4096
        );
    }

    #[test]
    fn test_bomb_aborts_while_streaming() {
        let max = 64 * 1024;
        let bomb = zip_bomb(50 * 1024 * 1024);
        assert!(bomb.len() < 1024 * 1024);

        let mut counting = CountingReader {
            inner: GzDecoder::new(Cursor::new(bomb)),
            produced: 0,
        };
        let result = read_bounded(&mut counting, max);

        assert!(matches!(result, Err(SvgError::TooLarge { max: m, .. }) if m == max));
        // Decompression stopped within one chunk of the ceiling.
        assert!(counting.produced <= max + GZIP_CHUNK_SIZE);
    }

    #[test]
    fn test_invalid_gzip_is_read_error() {
        let result = decompress_gzip(Cursor::new(b"\x1f\x8bnot really gzip".to_vec()), 1024);
        assert!(matches!(result, Err(SvgError::Read(_))));
    }

    #[test]
    fn test_read_gzipped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.svgz");
        std::fs::write(&path, compress_gzip(b"<svg/>").unwrap()).unwrap();

        assert_eq!(read_gzipped_file(&path, 1024).unwrap(), b"<svg/>");
        assert!(matches!(
            read_gzipped_file(&path, 3),
            Err(SvgError::TooLarge { .. })
        ));
        assert!(matches!(
            read_gzipped_file(&dir.path().join("missing.svgz"), 1024),
            Err(SvgError::Read(_))
        ));
    }

    #[test]
    fn test_is_gzip() {
        assert!(!is_gzip(b"<svg/>"));
        assert!(!is_gzip(b"\x1f"));
    }
}
