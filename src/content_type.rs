/// Coarse MIME detection used as metadata on cards read back from a
/// storage engine. Magic prefixes win over the text heuristic; first
/// match wins.
const MAGIC_PREFIXES: &[(&[u8], &str)] = &[
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"%PDF", "application/pdf"),
    (b"ID3", "audio/mpeg"),
    (b"\xFF\xFB", "audio/mpeg"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B", "application/gzip"),
];

pub fn detect(bytes: &[u8]) -> &'static str {
    // RIFF and MP4 containers carry their subtype past the first four bytes.
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") {
        match &bytes[8..12] {
            b"WEBP" => return "image/webp",
            b"WAVE" => return "audio/wav",
            _ => {}
        }
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return "video/mp4";
    }
    for (magic, mime) in MAGIC_PREFIXES {
        if bytes.starts_with(magic) {
            return mime;
        }
    }
    if is_printable_text(bytes) {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

fn is_printable_text(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && bytes
            .iter()
            .all(|b| matches!(b, 0x20..=0x7E | b'\t' | b'\n' | b'\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_prefixes_win() {
        assert_eq!(detect(b"\x89PNG\r\n\x1a\n____"), "image/png");
        assert_eq!(detect(b"\xFF\xD8\xFF\xE0rest"), "image/jpeg");
        assert_eq!(detect(b"%PDF-1.7 ..."), "application/pdf");
        assert_eq!(detect(b"GIF89a......"), "image/gif");
        assert_eq!(detect(b"PK\x03\x04zipzip"), "application/zip");
        assert_eq!(detect(b"\x1F\x8B\x08gz"), "application/gzip");
        assert_eq!(detect(b"\x1A\x45\xDF\xA3webm"), "video/webm");
    }

    #[test]
    fn riff_containers_use_their_subtype() {
        assert_eq!(detect(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(detect(b"RIFF\x00\x00\x00\x00WAVEfmt "), "audio/wav");
    }

    #[test]
    fn mp4_ftyp_at_offset_four() {
        assert_eq!(detect(b"\x00\x00\x00\x18ftypisom"), "video/mp4");
    }

    #[test]
    fn printable_ascii_is_text() {
        assert_eq!(detect(b"Hello, World!\nsecond line\r\n"), "text/plain");
        assert_eq!(detect(b"{\"key\": \"value\"}"), "text/plain");
    }

    #[test]
    fn nul_and_high_bytes_are_binary() {
        assert_eq!(detect(b"Hello\x00World"), "application/octet-stream");
        assert_eq!(detect(&[0xDE, 0xAD, 0xBE, 0xEF]), "application/octet-stream");
    }
}
