//! Image URL tokenizer for raw page text.
//!
//! A candidate starts at `http` (any case) and runs until the first byte that
//! cannot belong to a clean URL. Within that run the candidate ends at the
//! last `.jpg`, `.jpeg` or `.png` (any case). Runs without such an ending
//! yield nothing.
//!
//! Rejected bytes come in two groups: the structural characters
//! `\ [ ] { } < > %`, which mean the text is nested or encoded markup rather
//! than a single URL, and plain separators (whitespace and quotes), which
//! cannot occur inside a URL and delimit neighbouring ones.

const SCHEME: &[u8] = b"http";

/// Characters whose presence means the text is not one clean URL
pub const REJECTED: &[u8] = b"\\[]{}<>%";

const EXTENSIONS: [&[u8]; 3] = [b"jpg", b"jpeg", b"png"];

fn is_boundary(byte: u8) -> bool {
    REJECTED.contains(&byte) || byte.is_ascii_whitespace() || byte == b'"' || byte == b'\''
}

/// Collect at most `cap` image URLs from `text`, in document order
pub fn extract_image_urls(text: &str, cap: usize) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut urls = Vec::new();
    let mut cursor = 0;

    while urls.len() < cap {
        let Some(start) = find_scheme(bytes, cursor) else {
            break;
        };

        let run_end = bytes[start..]
            .iter()
            .position(|&b| is_boundary(b))
            .map_or(bytes.len(), |offset| start + offset);

        match last_extension_end(&bytes[start..run_end]) {
            Some(length) => {
                // Both ends sit on ASCII bytes, so the slice is on char boundaries
                urls.push(text[start..start + length].to_string());
                cursor = start + length;
            }
            // A later `http` inside the same run shares its end and fails too
            None => cursor = run_end.max(start + 1),
        }
    }

    urls
}

fn find_scheme(bytes: &[u8], from: usize) -> Option<usize> {
    let last = bytes.len().checked_sub(SCHEME.len())?;
    (from..=last).find(|&i| bytes[i..i + SCHEME.len()].eq_ignore_ascii_case(SCHEME))
}

/// Length of the longest prefix of `run` that ends in an image extension
fn last_extension_end(run: &[u8]) -> Option<usize> {
    (SCHEME.len()..run.len())
        .rev()
        .filter(|&i| run[i] == b'.')
        .find_map(|dot| {
            let tail = &run[dot + 1..];
            EXTENSIONS
                .iter()
                .find(|ext| tail.len() >= ext.len() && tail[..ext.len()].eq_ignore_ascii_case(ext))
                .map(|ext| dot + 1 + ext.len())
        })
}

/// True when `candidate` is exactly one clean image URL
pub fn is_clean_image_url(candidate: &str) -> bool {
    extract_image_urls(candidate, 1)
        .first()
        .is_some_and(|url| url == candidate)
}
