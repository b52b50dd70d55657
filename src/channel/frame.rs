//! Chunked-read / terminator engine
//!
//! Shared by every channel's receive path. Chunks are accumulated until the
//! terminator shows up anywhere in the accumulator, then the frame is cut at
//! the LAST occurrence of the terminator. Terminator-like bytes earlier in
//! the payload are kept; the final terminator marks the frame end.

use bytes::{Bytes, BytesMut};

/// Position of the last occurrence of `needle` in `haystack`
pub fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(haystack.len());
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Whether `needle` occurs anywhere in `haystack`
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Everything before the last terminator, or all of `data` if there is none
pub fn trim_to_terminator<'a>(data: &'a [u8], terminator: &[u8]) -> &'a [u8] {
    match find_last(data, terminator) {
        Some(pos) => &data[..pos],
        None => data,
    }
}

/// Pull chunks until the terminator has been seen, then trim
///
/// `next_chunk` receives the bytes accumulated so far and returns the next
/// chunk, or `None` when the read failed. A failed or empty chunk ends the
/// loop; whatever was accumulated is still trimmed and returned.
pub fn collect<F>(terminator: &[u8], mut next_chunk: F) -> Bytes
where
    F: FnMut(&[u8]) -> Option<Bytes>,
{
    if terminator.is_empty() {
        return next_chunk(&[]).unwrap_or_default();
    }

    let mut acc = BytesMut::new();
    loop {
        let chunk = match next_chunk(&acc[..]) {
            Some(chunk) if !chunk.is_empty() => chunk,
            _ => break,
        };
        // Only the new bytes plus a terminator-sized overlap can complete a match
        let scan_from = acc.len().saturating_sub(terminator.len() - 1);
        acc.extend_from_slice(&chunk);
        if contains(&acc[scan_from..], terminator) {
            break;
        }
    }

    let end = trim_to_terminator(&acc, terminator).len();
    acc.truncate(end);
    acc.freeze()
}
