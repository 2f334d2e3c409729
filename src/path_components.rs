// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A bidirectional view over a base URL's path as a sequence of segments,
//! per spec.md §4.8. No direct teacher analogue (the teacher's own
//! `Url::path()` returns a read-only `Option<&[String]>`); grounded on the
//! mutation contract of modern `rust-url`'s `PathSegmentsMut` (`push`,
//! `pop`, `extend`, `clear`), rebuilt on top of `Url::set_path_from_segments`
//! instead of a direct `Storage` splice, since every edit here already
//! needs the same drive-letter/sigil bookkeeping a full path rebuild does.
//!
//! The root path `/` is modeled as **zero** segments, not one empty
//! segment: only a path with real content and a trailing slash (`/a/b/`)
//! produces a genuine trailing empty segment. Modeling `/` as `[""]` would
//! make `push` on `file:///` or `http://example/` double the separator.

use crate::ascii::PATH_SEGMENT;
use crate::percent_encoding::{percent_decode_str, percent_encode_to_string};
use crate::url::Url;

/// Encode one path segment the way a full path parse would (spec.md §4.4),
/// additionally forcing `/` and `\` so a segment's own slash survives as
/// content instead of splitting into two segments once rejoined.
pub(crate) fn encode_segment(segment: &str) -> String {
    percent_encode_to_string(segment.as_bytes(), &PATH_SEGMENT)
}

/// A read-only, double-ended iterator over a path's segments.
#[derive(Clone, Debug)]
pub struct PathSegments<'a> {
    segments: Vec<&'a str>,
    front: usize,
    back: usize,
}

impl<'a> PathSegments<'a> {
    pub(crate) fn new(path: &'a str) -> Self {
        let stripped = path.strip_prefix('/').unwrap_or(path);
        let segments: Vec<&str> = if stripped.is_empty() {
            Vec::new()
        } else {
            stripped.split('/').collect()
        };
        let back = segments.len();
        PathSegments { segments, front: 0, back }
    }
}

impl<'a> Iterator for PathSegments<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<&'a str> {
        if self.front < self.back {
            let item = self.segments[self.front];
            self.front += 1;
            Some(item)
        } else {
            None
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a> DoubleEndedIterator for PathSegments<'a> {
    fn next_back(&mut self) -> Option<&'a str> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.segments[self.back])
        } else {
            None
        }
    }
}

impl<'a> ExactSizeIterator for PathSegments<'a> {}

/// A mutable view over a base URL's path segments. Every method rebuilds
/// the full path through [`Url::set_path_from_segments`], so drive-letter
/// normalization and path-sigil insertion always match what a fresh parse
/// would produce.
pub struct PathSegmentsMut<'a> {
    url: &'a mut Url,
}

impl<'a> PathSegmentsMut<'a> {
    pub(crate) fn new(url: &'a mut Url) -> Self {
        PathSegmentsMut { url }
    }

    fn current(&self) -> Vec<String> {
        match self.url.path_segments() {
            Some(segments) => segments.map(percent_decode_str).collect(),
            None => Vec::new(),
        }
    }

    /// Remove every segment, leaving an empty (or, for schemes that
    /// require one, root) path.
    pub fn clear(&mut self) -> &mut Self {
        self.url.set_path_from_segments(Vec::new());
        self
    }

    /// Append one segment.
    pub fn push(&mut self, segment: &str) -> &mut Self {
        let mut segments = self.current();
        segments.push(segment.to_string());
        self.url.set_path_from_segments(segments);
        self
    }

    /// Remove the last segment, if any.
    pub fn pop(&mut self) -> &mut Self {
        let mut segments = self.current();
        segments.pop();
        self.url.set_path_from_segments(segments);
        self
    }

    /// Append every segment `iter` yields, in order.
    pub fn extend<I, S>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = self.current();
        segments.extend(iter.into_iter().map(|s| s.as_ref().to_string()));
        self.url.set_path_from_segments(segments);
        self
    }

    /// Replace every segment in `range` with `replacement`, the general
    /// splice operation `push`/`pop`/`extend`/`clear` are all special
    /// cases of (spec.md §4.8).
    pub fn splice<I, S>(&mut self, range: std::ops::Range<usize>, replacement: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = self.current();
        let start = range.start.min(segments.len());
        let end = range.end.min(segments.len());
        let replacement: Vec<String> = replacement.into_iter().map(|s| s.as_ref().to_string()).collect();
        segments.splice(start..end, replacement);
        self.url.set_path_from_segments(segments);
        self
    }

    /// Insert one segment before the segment currently at `idx`.
    pub fn insert(&mut self, idx: usize, segment: &str) -> &mut Self {
        self.splice(idx..idx, [segment])
    }

    /// Remove the single segment at `idx`, if any.
    pub fn remove_at(&mut self, idx: usize) -> &mut Self {
        self.splice(idx..idx + 1, std::iter::empty::<&str>())
    }

    /// Remove every segment in `range`.
    pub fn remove_subrange(&mut self, range: std::ops::Range<usize>) -> &mut Self {
        self.splice(range, std::iter::empty::<&str>())
    }

    /// Remove the last segment, if any (a no-op on an empty path).
    pub fn remove_last(&mut self) -> &mut Self {
        let len = self.current().len();
        if len > 0 {
            self.remove_at(len - 1);
        }
        self
    }

    /// Replace the single segment at `idx` with `segment`.
    pub fn replace_component_at(&mut self, idx: usize, segment: &str) -> &mut Self {
        self.splice(idx..idx + 1, [segment])
    }

    /// Append a trailing empty segment, unless the path already ends with
    /// one — so `"/a/b".ensure_directory_path() == "/a/b/"` but calling it
    /// again is a no-op (spec.md §4.8 `ensure_directory_path`).
    pub fn ensure_directory_path(&mut self) -> &mut Self {
        let segments = self.current();
        if segments.last().map(String::as_str) != Some("") {
            self.push("");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_has_zero_segments() {
        assert_eq!(PathSegments::new("/").count(), 0);
        assert_eq!(PathSegments::new("").count(), 0);
    }

    #[test]
    fn trailing_slash_yields_trailing_empty_segment() {
        let segments: Vec<&str> = PathSegments::new("/a/b/").collect();
        assert_eq!(segments, vec!["a", "b", ""]);
    }

    #[test]
    fn ordinary_path_splits_on_slash() {
        let segments: Vec<&str> = PathSegments::new("/a/b").collect();
        assert_eq!(segments, vec!["a", "b"]);
    }

    #[test]
    fn append_onto_file_root_does_not_double_slash() {
        let mut url = Url::parse("file:///").unwrap();
        url.path_segments_mut().unwrap().extend(["C|", "Windows"]);
        assert_eq!(url.as_str(), "file:///C:/Windows");
    }

    #[test]
    fn append_onto_http_root_does_not_double_slash() {
        let mut url = Url::parse("http://example/").unwrap();
        url.path_segments_mut().unwrap().extend(["C|", "Windows"]);
        assert_eq!(url.as_str(), "http://example/C|/Windows");
    }

    #[test]
    fn push_and_pop_round_trip() {
        let mut url = Url::parse("http://example.com/a").unwrap();
        url.path_segments_mut().unwrap().push("b");
        assert_eq!(url.path(), "/a/b");
        url.path_segments_mut().unwrap().pop();
        assert_eq!(url.path(), "/a");
    }

    #[test]
    fn insert_splices_one_segment() {
        let mut url = Url::parse("http://example.com/a/c").unwrap();
        url.path_segments_mut().unwrap().insert(1, "b");
        assert_eq!(url.path(), "/a/b/c");
    }

    #[test]
    fn remove_at_drops_single_segment() {
        let mut url = Url::parse("http://example.com/a/b/c").unwrap();
        url.path_segments_mut().unwrap().remove_at(1);
        assert_eq!(url.path(), "/a/c");
    }

    #[test]
    fn remove_last_is_a_noop_on_empty_path() {
        let mut url = Url::parse("http://example.com/").unwrap();
        url.path_segments_mut().unwrap().remove_last();
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn replace_component_at_swaps_one_segment() {
        let mut url = Url::parse("http://example.com/a/b/c").unwrap();
        url.path_segments_mut().unwrap().replace_component_at(1, "x");
        assert_eq!(url.path(), "/a/x/c");
    }

    #[test]
    fn ensure_directory_path_appends_once() {
        let mut url = Url::parse("http://example.com/a/b").unwrap();
        url.path_segments_mut().unwrap().ensure_directory_path();
        assert_eq!(url.path(), "/a/b/");
        url.path_segments_mut().unwrap().ensure_directory_path();
        assert_eq!(url.path(), "/a/b/");
    }
}
