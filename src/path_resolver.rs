// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! WHATWG path construction: dot-segment resolution, Windows-drive-letter
//! handling, and merging a relative path against a base URL's path, per
//! spec.md §4.4. Grounded on the dot-segment/drive-letter handling inline
//! in `examples/servo-rust-url/src/parser.rs::parse_path`, restructured
//! around the three-callback `PathVisitor` design spec.md names, which
//! visits resolved components back-to-front (the order in which
//! dot-segments are naturally resolved).

use crate::path::{
    is_double_dot_path_segment, is_single_dot_path_segment, is_windows_drive_letter,
    normalize_windows_drive_letter, starts_with_windows_drive_letter,
};
use crate::scheme::SchemeKind;

/// Receives resolved path components in reverse (rightmost first).
pub trait PathVisitor {
    fn visit_input_component(&mut self, bytes: &str, is_leading_windows_drive_letter: bool);
    fn visit_empty_component(&mut self);
    fn visit_base_component(&mut self, bytes: &str);
}

fn is_separator(b: u8, special: bool) -> bool {
    b == b'/' || (special && b == b'\\')
}

/// Split `path` on `/` (and `\` for special schemes) into components,
/// after stripping exactly one leading separator. Doubled separators
/// produce empty components, matching the scanner's raw path slice.
fn split_components(path: &str, special: bool) -> Vec<&str> {
    let bytes = path.as_bytes();
    let start = if !bytes.is_empty() && is_separator(bytes[0], special) {
        1
    } else {
        0
    };
    if start == path.len() {
        return Vec::new();
    }
    path[start..]
        .split(|c: char| is_separator(c as u8, special) && (c as u32) < 128)
        .collect()
}

/// Resolve `input_path` (the scanner's raw path slice, already stripped
/// of `?`/`#`) against an optional base path, and drive `visitor` with
/// the final components in reverse.
///
/// `base_path`, when given, is assumed already-normalized (it came from a
/// previously-resolved URL), so its own `.`/`..` segments (if any — there
/// shouldn't be) are treated like ordinary components.
pub fn resolve_path(
    input_path: &str,
    scheme_kind: SchemeKind,
    base_path: Option<&str>,
) -> Vec<Resolved> {
    let special = scheme_kind.is_special();
    let is_file = scheme_kind.is_file();

    let mut components = split_components(input_path, special);
    if is_file {
        while let Some(&first) = components.first() {
            if first.is_empty() || is_single_dot_path_segment(first.as_bytes())
                || is_double_dot_path_segment(first.as_bytes())
            {
                components.remove(0);
            } else {
                break;
            }
        }
    }

    if components.is_empty() {
        if let (true, Some(base)) = (is_file, base_path) {
            let base_components = split_components(base, special);
            if let Some(&first) = base_components.first() {
                if starts_with_windows_drive_letter(first.as_bytes()) {
                    let letter = normalize_windows_drive_letter_str(first);
                    return vec![Resolved::Empty, Resolved::Input(letter, true)];
                }
            }
        }
        if special {
            return vec![Resolved::Empty];
        }
        return Vec::new();
    }

    let mut out: Vec<Resolved> = Vec::new();
    let mut pending_empties = 0usize;
    let mut popcount = 0usize;
    let mut stopped_on_drive_letter = false;

    for (i, &component) in components.iter().enumerate().rev() {
        let is_leftmost = i == 0;
        if is_file && is_leftmost && starts_with_windows_drive_letter(component.as_bytes()) {
            flush_empties(&mut out, &mut pending_empties);
            out.push(Resolved::Input(normalize_windows_drive_letter_str(component), true));
            stopped_on_drive_letter = true;
            break;
        }
        if is_double_dot_path_segment(component.as_bytes()) {
            popcount += 1;
            if is_leftmost {
                pending_empties += 1;
            }
            continue;
        }
        if is_single_dot_path_segment(component.as_bytes()) {
            if is_leftmost {
                pending_empties += 1;
            }
            continue;
        }
        if popcount > 0 {
            popcount -= 1;
            continue;
        }
        if component.is_empty() {
            // An empty component from a doubled separator is itself real
            // content (unlike a dot-segment, which contributes nothing), so
            // it's pushed right away rather than deferred through
            // `pending_empties` — deferring it could drop it entirely if no
            // further real component ever flushes the backlog.
            out.push(Resolved::Empty);
            continue;
        }
        flush_empties(&mut out, &mut pending_empties);
        out.push(Resolved::Input(component.to_string(), false));
    }

    if !stopped_on_drive_letter {
        if let Some(base) = base_path {
            // A trailing empty queued because `..`/`.` ran off the start of
            // the input path is superseded by continuing the pop against
            // base components; only a trailing empty produced *during* the
            // base merge itself should survive to the output.
            pending_empties = 0;
            let base_components = split_components(base, special);
            // RFC 3986 §5.3 "merge": drop base's last segment (its
            // basename — the file the relative reference is resolved
            // against) before splicing in the input's resolved segments.
            let base_components = drop_last(base_components);
            let mut base_stopped_on_drive_letter = false;
            for (i, &component) in base_components.iter().enumerate().rev() {
                let is_leftmost = i == 0;
                if is_file && is_leftmost && starts_with_windows_drive_letter(component.as_bytes()) {
                    // Pushed in this order so that, once `out` is reversed
                    // back into forward order, the drive letter precedes
                    // its ensured trailing empty segment.
                    out.push(Resolved::Empty);
                    out.push(Resolved::Base(normalize_windows_drive_letter_str(component)));
                    base_stopped_on_drive_letter = true;
                    break;
                }
                if popcount > 0 {
                    popcount -= 1;
                    continue;
                }
                if component.is_empty() {
                    out.push(Resolved::Empty);
                    continue;
                }
                flush_empties(&mut out, &mut pending_empties);
                out.push(Resolved::Base(component.to_string()));
            }
            let _ = base_stopped_on_drive_letter;
        }
    }

    if out.is_empty() && pending_empties > 0 {
        out.push(Resolved::Empty);
    }

    out
}

fn drop_last(mut components: Vec<&str>) -> Vec<&str> {
    components.pop();
    components
}

fn flush_empties(out: &mut Vec<Resolved>, pending: &mut usize) {
    while *pending > 0 {
        out.push(Resolved::Empty);
        *pending -= 1;
    }
}

fn normalize_windows_drive_letter_str(segment: &str) -> String {
    if is_windows_drive_letter(segment.as_bytes()) {
        let bytes = normalize_windows_drive_letter(segment.as_bytes());
        String::from_utf8(bytes.to_vec()).unwrap()
    } else {
        segment.to_string()
    }
}

/// One component as resolved by `resolve_path`, in reverse (rightmost
/// first); the caller reverses this list before feeding it to a
/// `PathVisitor` or joining it into the final serialized path.
#[derive(Debug, Eq, PartialEq)]
pub enum Resolved {
    Input(String, bool),
    Base(String),
    Empty,
}

impl Resolved {
    fn as_str(&self) -> &str {
        match self {
            Resolved::Input(s, _) => s,
            Resolved::Base(s) => s,
            Resolved::Empty => "",
        }
    }
}

/// Drive a `PathVisitor` with `resolved` (already in reverse order, as
/// produced by `resolve_path`).
pub fn visit_resolved(resolved: &[Resolved], visitor: &mut dyn PathVisitor) {
    for r in resolved {
        match r {
            Resolved::Input(s, is_drive) => visitor.visit_input_component(s, *is_drive),
            Resolved::Base(s) => visitor.visit_base_component(s),
            Resolved::Empty => visitor.visit_empty_component(),
        }
    }
}

/// Join `resolve_path`'s reverse-order output into the forward-order
/// serialized path string (`/seg1/seg2/...`), the form most callers want.
pub fn serialize_resolved(resolved: &[Resolved]) -> String {
    let mut out = String::new();
    for r in resolved.iter().rev() {
        out.push('/');
        out.push_str(r.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(input: &str, scheme: SchemeKind, base: Option<&str>) -> String {
        serialize_resolved(&resolve_path(input, scheme, base))
    }

    #[test]
    fn simple_absolute_path() {
        assert_eq!(serialize("/a/b", SchemeKind::Https, None), "/a/b");
    }

    #[test]
    fn dot_segments_resolve() {
        assert_eq!(serialize("/a/./b/../c", SchemeKind::Https, None), "/a/c");
    }

    #[test]
    fn empty_special_path_is_root() {
        assert_eq!(serialize("", SchemeKind::Https, None), "/");
    }

    #[test]
    fn empty_non_special_path_is_empty() {
        assert_eq!(serialize("", SchemeKind::Other, None), "");
    }

    #[test]
    fn dot_dot_merges_with_base() {
        assert_eq!(
            serialize("../x", SchemeKind::Https, Some("/a/b/")),
            "/a/x"
        );
    }

    #[test]
    fn file_drive_letter_stops_merge() {
        assert_eq!(
            serialize("/C:/windows", SchemeKind::File, Some("/D:/other")),
            "/C:/windows"
        );
    }
}
