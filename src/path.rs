// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Recognizers for path-segment special forms: `.`, `..`, and
//! Windows drive letters.

/// A segment is a single-dot segment if it is `.` or any case mix of
/// `%2e` (percent-encoded `.`).
pub fn is_single_dot_path_segment(segment: &[u8]) -> bool {
    matches!(segment, b"." | b"%2e" | b"%2E")
}

/// A segment is a double-dot segment if it is `..` or a mix of literal
/// and percent-encoded dots: `..`, `.%2e`, `%2e.`, `%2e%2e` (any case).
pub fn is_double_dot_path_segment(segment: &[u8]) -> bool {
    matches!(
        segment,
        b".."
            | b".%2e"
            | b".%2E"
            | b"%2e."
            | b"%2E."
            | b"%2e%2e"
            | b"%2E%2e"
            | b"%2e%2E"
            | b"%2E%2E"
    )
}

/// `true` if `segment` starts with a Windows drive letter: an ASCII
/// letter followed by `:` or `|`, e.g. `C:` or `C|`.
pub fn starts_with_windows_drive_letter(segment: &[u8]) -> bool {
    segment.len() >= 2
        && segment[0].is_ascii_alphabetic()
        && matches!(segment[1], b':' | b'|')
        && (segment.len() == 2 || matches!(segment[2], b'/' | b'\\' | b'?' | b'#'))
}

/// `true` if `segment` is *exactly* two bytes, an ASCII letter followed by
/// `:` or `|` (the form used once a path is already split into
/// segments, where there's no following-byte ambiguity to check).
pub fn is_windows_drive_letter(segment: &[u8]) -> bool {
    segment.len() == 2 && segment[0].is_ascii_alphabetic() && matches!(segment[1], b':' | b'|')
}

/// `true` if `segment` is a drive letter already in normalized `X:` form.
pub fn is_normalized_windows_drive_letter(segment: &[u8]) -> bool {
    segment.len() == 2 && segment[0].is_ascii_alphabetic() && segment[1] == b':'
}

/// Normalize a two-byte Windows drive letter segment (`C|` -> `C:`,
/// `C:` unchanged) in place. Panics if `segment` is not a drive letter.
pub fn normalize_windows_drive_letter(segment: &[u8]) -> [u8; 2] {
    debug_assert!(is_windows_drive_letter(segment));
    [segment[0], b':']
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_segments() {
        assert!(is_single_dot_path_segment(b"."));
        assert!(is_single_dot_path_segment(b"%2e"));
        assert!(is_single_dot_path_segment(b"%2E"));
        assert!(!is_single_dot_path_segment(b".."));

        assert!(is_double_dot_path_segment(b".."));
        assert!(is_double_dot_path_segment(b".%2e"));
        assert!(is_double_dot_path_segment(b"%2e."));
        assert!(is_double_dot_path_segment(b"%2E%2e"));
        assert!(!is_double_dot_path_segment(b"."));
    }

    #[test]
    fn drive_letters() {
        assert!(starts_with_windows_drive_letter(b"C:"));
        assert!(starts_with_windows_drive_letter(b"C|"));
        assert!(starts_with_windows_drive_letter(b"C:/x"));
        assert!(!starts_with_windows_drive_letter(b"C:x"));
        assert!(!starts_with_windows_drive_letter(b"1:"));

        assert!(is_windows_drive_letter(b"C|"));
        assert!(!is_normalized_windows_drive_letter(b"C|"));
        assert_eq!(normalize_windows_drive_letter(b"C|"), *b"C:");
    }
}
