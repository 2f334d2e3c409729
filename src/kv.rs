// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A key-value-pairs view over the query or fragment, parameterized by a
//! [`Schema`], per spec.md §4.9. Grounded on
//! `examples/servo-rust-url/src/form_urlencoded.rs`'s pair/kv-delimiter
//! splitting and `+`-as-space handling, and on modern `rust-url`'s
//! `query_pairs()`/`query_pairs_mut()` contract of writing straight back
//! into the URL's own buffer, generalized to an arbitrary `Schema` and to
//! either URL component.
//!
//! Splitting on the pair delimiter produces a raw piece per pair, but a
//! piece that's entirely empty (a bare pair-delimiter with nothing before
//! or after) is an *empty pair*: spec.md §4.9 makes these transparent to
//! the sequence — they don't get a key, a value, or an index. `len()`,
//! `get`, `iter`, and `replace_subrange`'s `range` all count only the
//! non-empty pieces; the raw piece list underneath still carries the
//! empty ones; splicing maps a logical (non-empty-pair) index range back
//! onto the raw positions that bound it, widening at the edges per
//! spec.md §9's resolved open question (see `DESIGN.md`).

use unicode_normalization::UnicodeNormalization;

use crate::ascii::{AsciiSet, FORM_URLENCODED, FRAGMENT_FORM_URLENCODED};
use crate::percent_encoding::{decode_form_value, percent_encode_plus_as_space, percent_encode_to_string};
use crate::url::{Url, UrlComponent};

/// The delimiters and encode set a key-value-pairs view uses. Built with
/// [`Schema::new`]; [`Schema::form_urlencoded`] is the ready-made preset
/// for `application/x-www-form-urlencoded` query strings.
#[derive(Clone, Copy)]
pub struct Schema {
    pair_delimiter: u8,
    key_value_delimiter: u8,
    encode_set: &'static AsciiSet,
    plus_as_space: bool,
}

impl Schema {
    /// A schema with `pair_delimiter` separating pairs, `key_value_delimiter`
    /// separating a pair's key from its value, both percent-encoded away
    /// from values via `encode_set`. `plus_as_space` opts into
    /// `application/x-www-form-urlencoded`'s `+`/space convention.
    pub const fn new(
        pair_delimiter: u8,
        key_value_delimiter: u8,
        encode_set: &'static AsciiSet,
        plus_as_space: bool,
    ) -> Schema {
        Schema {
            pair_delimiter,
            key_value_delimiter,
            encode_set,
            plus_as_space,
        }
    }

    /// `&`-separated, `=`-separated, `application/x-www-form-urlencoded`
    /// pairs — the schema `Url::query_pairs`/`query_pairs_mut` use.
    pub const fn form_urlencoded() -> Schema {
        Schema::new(b'&', b'=', &FORM_URLENCODED, true)
    }

    /// `&`-separated, `=`-separated pairs over the fragment's own encode
    /// set, for URLs (e.g. OAuth implicit-flow redirects) that carry
    /// query-shaped data after the `#` instead of the `?`.
    pub const fn fragment_params() -> Schema {
        Schema::new(b'&', b'=', &FRAGMENT_FORM_URLENCODED, true)
    }

    /// A schema is only meaningful if its own delimiters are themselves
    /// members of its encode set (otherwise a value containing the
    /// delimiter would round-trip into a different set of pairs).
    pub(crate) fn is_valid(&self) -> bool {
        self.encode_set.contains(self.pair_delimiter) && self.encode_set.contains(self.key_value_delimiter)
    }

    fn encode_pair(&self, key: &str, value: &str) -> String {
        let mut out = String::new();
        if self.plus_as_space {
            percent_encode_plus_as_space(key.as_bytes(), self.encode_set, &mut out);
            out.push(self.key_value_delimiter as char);
            percent_encode_plus_as_space(value.as_bytes(), self.encode_set, &mut out);
        } else {
            out.push_str(&percent_encode_to_string(key.as_bytes(), self.encode_set));
            out.push(self.key_value_delimiter as char);
            out.push_str(&percent_encode_to_string(value.as_bytes(), self.encode_set));
        }
        out
    }

    fn decode_pair(&self, piece: &str) -> (String, String) {
        match piece.as_bytes().iter().position(|&b| b == self.key_value_delimiter) {
            Some(i) => (
                decode_form_value(piece[..i].as_bytes(), self.plus_as_space),
                decode_form_value(piece[i + 1..].as_bytes(), self.plus_as_space),
            ),
            None => (decode_form_value(piece.as_bytes(), self.plus_as_space), String::new()),
        }
    }
}

fn raw_pieces<'a>(raw: &'a str, schema: &Schema) -> Vec<&'a str> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(schema.pair_delimiter as char).collect()
    }
}

/// Indices into `pieces` of the pieces that are *not* empty pairs — the
/// logical sequence the view's positional API is indexed over (spec.md
/// §4.9: "Skip empty key-value pairs ... They are transparent to the
/// sequence").
fn non_empty_indices(pieces: &[&str]) -> Vec<usize> {
    pieces
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_empty())
        .map(|(i, _)| i)
        .collect()
}

fn nfc_eq(a: &str, b: &str) -> bool {
    a.nfc().eq(b.nfc())
}

/// A read-only iterator over a component's decoded `(key, value)` pairs.
/// Bare pair-delimiters (empty pieces) are skipped; they carry no key or
/// value and are transparent to this sequence (spec.md §4.9).
pub struct KeyValuePairs<'a> {
    pieces: std::vec::IntoIter<&'a str>,
    schema: Schema,
}

impl<'a> KeyValuePairs<'a> {
    pub(crate) fn new(raw: &'a str, schema: Schema) -> Self {
        let pieces = raw_pieces(raw, &schema);
        let non_empty: Vec<&str> = pieces.into_iter().filter(|p| !p.is_empty()).collect();
        KeyValuePairs {
            pieces: non_empty.into_iter(),
            schema,
        }
    }
}

impl<'a> Iterator for KeyValuePairs<'a> {
    type Item = (String, String);
    fn next(&mut self) -> Option<(String, String)> {
        self.pieces.next().map(|piece| self.schema.decode_pair(piece))
    }
}

/// A mutable key-value-pairs view that writes straight back into the
/// owning [`Url`]'s buffer.
pub struct KeyValuePairsMut<'a> {
    url: &'a mut Url,
    component: UrlComponent,
    schema: Schema,
}

impl<'a> KeyValuePairsMut<'a> {
    pub(crate) fn new(url: &'a mut Url, component: UrlComponent, schema: Schema) -> Self {
        KeyValuePairsMut { url, component, schema }
    }

    /// A read-only iterator over the current pairs.
    pub fn iter(&self) -> KeyValuePairs<'_> {
        KeyValuePairs::new(self.url.component_raw(self.component), self.schema)
    }

    /// Number of non-empty pairs currently present (an empty component,
    /// or one consisting only of bare pair-delimiters, has zero).
    pub fn len(&self) -> usize {
        let raw = self.url.component_raw(self.component);
        non_empty_indices(&raw_pieces(raw, &self.schema)).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first value whose key is NFC-canonically-equivalent to `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.iter().find(|(k, _)| nfc_eq(k, key)).map(|(_, v)| v)
    }

    /// Every value whose key is NFC-canonically-equivalent to `key`, in
    /// list order (spec.md §4.9 `all_values(for_key:)`).
    pub fn all_values(&self, key: &str) -> Vec<String> {
        self.iter().filter(|(k, _)| nfc_eq(k, key)).map(|(_, v)| v).collect()
    }

    /// Append one pair at the end.
    pub fn append(&mut self, key: &str, value: &str) -> &mut Self {
        let len = self.len();
        self.replace_subrange(len..len, [(key.to_string(), value.to_string())]);
        self
    }

    /// Insert one pair before the pair currently at `idx`, returning the
    /// range (always a single index) it now occupies (spec.md §4.9
    /// `insert(key:value:at:)`).
    pub fn insert(&mut self, idx: usize, key: &str, value: &str) -> std::ops::Range<usize> {
        self.replace_subrange(idx..idx, [(key.to_string(), value.to_string())]);
        idx..idx + 1
    }

    /// Remove the pairs in `range`, returning the index the next pair (if
    /// any) now occupies (spec.md §4.9 `remove_subrange(range)`).
    pub fn remove_subrange(&mut self, range: std::ops::Range<usize>) -> usize {
        let start = range.start;
        self.replace_subrange(range, std::iter::empty());
        start
    }

    /// Remove the single pair at `idx` (spec.md §4.9 `remove(at:)`).
    pub fn remove_at(&mut self, idx: usize) -> usize {
        self.remove_subrange(idx..idx + 1)
    }

    /// Rewrite the key of the pair at `idx`, leaving its value untouched
    /// (spec.md §4.9 `replace_key(at:with:)`).
    pub fn replace_key(&mut self, idx: usize, new_key: &str) -> usize {
        if let Some((_, value)) = self.iter().nth(idx) {
            self.replace_subrange(idx..idx + 1, [(new_key.to_string(), value)]);
        }
        idx
    }

    /// Rewrite the value of the pair at `idx`, leaving its key untouched
    /// (spec.md §4.9 `replace_value(at:with:)`).
    pub fn replace_value(&mut self, idx: usize, new_value: &str) -> usize {
        if let Some((key, _)) = self.iter().nth(idx) {
            self.replace_subrange(idx..idx + 1, [(key, new_value.to_string())]);
        }
        idx
    }

    /// If a pair with a matching key exists, replace the first match's
    /// value with `new_value` and remove every other matching pair;
    /// otherwise append `(key, new_value)`. Returns the index of the
    /// affected pair (spec.md §4.9 `set(key:to:)`). Idempotent: calling
    /// `set` twice with the same arguments leaves the same single pair.
    pub fn set(&mut self, key: &str, value: &str) -> usize {
        let raw = self.url.component_raw(self.component).to_string();
        let pieces = raw_pieces(&raw, &self.schema);

        let mut kept: Vec<String> = Vec::with_capacity(pieces.len());
        let mut pending_empties: Vec<&str> = Vec::new();
        let mut skip_following_empties = false;
        let mut seen_first = false;
        let mut logical_index = 0usize;
        let mut match_index = None;

        for &piece in &pieces {
            if piece.is_empty() {
                if skip_following_empties {
                    continue;
                }
                pending_empties.push(piece);
                continue;
            }
            let (k, _) = self.schema.decode_pair(piece);
            let is_match = nfc_eq(&k, key);
            if is_match && !seen_first {
                kept.extend(pending_empties.drain(..).map(str::to_string));
                kept.push(self.schema.encode_pair(&k, value));
                match_index = Some(logical_index);
                logical_index += 1;
                seen_first = true;
                skip_following_empties = false;
            } else if is_match {
                // A later duplicate: drop it, same empty-stripping
                // behavior `remove_all` uses for a removed pair.
                pending_empties.clear();
                skip_following_empties = true;
            } else {
                kept.extend(pending_empties.drain(..).map(str::to_string));
                kept.push(piece.to_string());
                logical_index += 1;
                skip_following_empties = false;
            }
        }
        kept.extend(pending_empties.drain(..).map(str::to_string));

        match match_index {
            Some(idx) => {
                let delimiter = (self.schema.pair_delimiter as char).to_string();
                let new_raw = kept.join(&delimiter);
                self.url.set_component_raw(self.component, &new_raw);
                idx
            }
            None => {
                let idx = self.len();
                self.append(key, value);
                idx
            }
        }
    }

    /// Remove every pair whose key is NFC-canonically-equivalent to `key`,
    /// over the whole sequence. A thin convenience wrapper around
    /// [`Self::remove_all_where`].
    pub fn remove_all(&mut self, key: &str) -> &mut Self {
        let len = self.len();
        self.remove_all_where(0..len, |k, _| nfc_eq(k, key))
    }

    /// Remove every pair within `range` for which `predicate(key, value)`
    /// returns `true`, visiting pairs in list order (spec.md §4.9
    /// `remove_all(in:where:)`). `predicate` only ever observes pairs
    /// whose logical index falls inside `range`.
    ///
    /// Operates directly on the raw piece list rather than routing through
    /// `replace_subrange`: removed pairs are dropped in place (not
    /// re-encoded), and any run of empty pieces immediately following a
    /// removed pair is stripped too, so repeated removal never leaves
    /// behind a growing trail of bare delimiters ("strips empty pairs
    /// between removed elements"). Empty pieces that precede the first
    /// removed pair, or that trail after the last real piece, are always
    /// preserved.
    pub fn remove_all_where<F>(&mut self, range: std::ops::Range<usize>, mut predicate: F) -> &mut Self
    where
        F: FnMut(&str, &str) -> bool,
    {
        let raw = self.url.component_raw(self.component).to_string();
        let pieces = raw_pieces(&raw, &self.schema);

        let mut kept: Vec<&str> = Vec::with_capacity(pieces.len());
        let mut pending_empties: Vec<&str> = Vec::new();
        let mut skip_following_empties = false;
        let mut logical_index = 0usize;

        for &piece in &pieces {
            if piece.is_empty() {
                if skip_following_empties {
                    continue;
                }
                pending_empties.push(piece);
                continue;
            }
            let (k, v) = self.schema.decode_pair(piece);
            let in_range = logical_index >= range.start && logical_index < range.end;
            let remove = in_range && predicate(&k, &v);
            if !(skip_following_empties && remove) {
                kept.extend(pending_empties.drain(..));
            } else {
                pending_empties.clear();
            }
            if !remove {
                kept.push(piece);
            }
            skip_following_empties = remove;
            logical_index += 1;
        }
        kept.extend(pending_empties.drain(..));

        let delimiter = (self.schema.pair_delimiter as char).to_string();
        let new_raw = kept.join(&delimiter);
        self.url.set_component_raw(self.component, &new_raw);
        self
    }

    /// Remove the whole component (the query/fragment becomes absent,
    /// not merely empty).
    pub fn clear(&mut self) -> &mut Self {
        self.url.clear_component(self.component);
        self
    }

    /// Replace the pairs in `range` — indices count only non-empty pairs,
    /// per spec.md §4.9's "empty pairs are transparent to the sequence" —
    /// with `replacement`, splicing into the raw piece list underneath.
    ///
    /// Two boundary rules from spec.md §4.9's "Positional mutation" widen
    /// the raw splice beyond the literal `range`:
    /// 1. A genuinely empty range (`range.start == range.end`) sitting at
    ///    index 0 also consumes any run of leading empty pairs (spec.md
    ///    §9's resolved open question — a pure insertion at the front
    ///    trims them, so repeated edits there don't accumulate
    ///    delimiters). Removing or replacing a real pair at index 0 does
    ///    *not* trigger this: the leading run stays put, same as
    ///    [`Self::remove_all_where`].
    /// 2. Removing any real pair also consumes the run of empty pairs
    ///    immediately following it, up to the next real pair (or the end
    ///    of the sequence) — the same "strips empty pairs between removed
    ///    elements" rule `remove_all_where` uses — so a splice's raw end
    ///    boundary is the position of the pair at logical index `range.end`,
    ///    not merely the byte past the last removed piece.
    pub fn replace_subrange<I>(&mut self, range: std::ops::Range<usize>, replacement: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw = self.url.component_raw(self.component).to_string();
        let mut pieces: Vec<String> = raw_pieces(&raw, &self.schema).into_iter().map(str::to_string).collect();
        let ne: Vec<usize> = non_empty_indices(&pieces.iter().map(String::as_str).collect::<Vec<_>>());
        let n = ne.len();

        let start = range.start.min(n);
        let end = range.end.min(n);
        let pure_insertion = start == end;

        let raw_start = if start == 0 && pure_insertion {
            0
        } else if start < n {
            ne[start]
        } else if n > 0 {
            ne[n - 1] + 1
        } else {
            0
        };
        let raw_end = if end < n { ne[end] } else { pieces.len() };
        let raw_end = raw_end.max(raw_start);

        let encoded: Vec<String> = replacement
            .into_iter()
            .map(|(k, v)| self.schema.encode_pair(&k, &v))
            .collect();
        pieces.splice(raw_start..raw_end, encoded);

        let delimiter = (self.schema.pair_delimiter as char).to_string();
        let new_raw = pieces.join(&delimiter);
        self.url.set_component_raw(self.component, &new_raw);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_urlencoded_round_trips() {
        let url = Url::parse("http://example.com/?a=1&b=2").unwrap();
        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs, vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]);
    }

    #[test]
    fn plus_decodes_as_space() {
        let url = Url::parse("http://example.com/?a=one+two").unwrap();
        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs, vec![("a".to_string(), "one two".to_string())]);
    }

    #[test]
    fn append_adds_pair_with_separator() {
        let mut url = Url::parse("http://example.com/?a=1").unwrap();
        url.query_pairs_mut().append("b", "2");
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn remove_pair_preserves_surrounding_empties() {
        let mut url = Url::parse("http://example.com/").unwrap();
        url.set_query(Some("&&&a=1&&&b=2&&&"));
        url.query_pairs_mut().remove_all("a");
        assert_eq!(url.query(), Some("&&&b=2&&&"));
    }

    #[test]
    fn remove_at_preserves_leading_empties_when_removing_real_pair() {
        let mut url = Url::parse("http://example.com/").unwrap();
        url.set_query(Some("&&&a=1&&&b=2&&&"));
        url.query_pairs_mut().remove_at(0);
        assert_eq!(url.query(), Some("&&&b=2&&&"));
    }

    #[test]
    fn empty_range_at_zero_trims_leading_empties() {
        let mut url = Url::parse("http://example.com/").unwrap();
        url.set_query(Some("&&&a=1"));
        url.query_pairs_mut().replace_subrange(0..0, []);
        assert_eq!(url.query(), Some("a=1"));
    }

    #[test]
    fn clear_removes_component_entirely() {
        let mut url = Url::parse("http://example.com/?a=1").unwrap();
        url.query_pairs_mut().clear();
        assert_eq!(url.query(), None);
        assert_eq!(url.as_str(), "http://example.com/");
    }

    #[test]
    fn get_matches_nfc_equivalent_keys() {
        let mut url = Url::parse("http://example.com/").unwrap();
        url.set_query(Some("e%CC%81=accent"));
        assert_eq!(url.query_pairs_mut().get("\u{e9}"), Some("accent".to_string()));
    }

    #[test]
    fn all_values_collects_every_duplicate() {
        let mut url = Url::parse("http://example.com/?a=1&b=x&a=2&a=3").unwrap();
        assert_eq!(url.query_pairs_mut().all_values("a"), vec!["1", "2", "3"]);
    }

    #[test]
    fn set_replaces_first_match_and_drops_duplicates() {
        let mut url = Url::parse("http://example.com/?foo=bar&dup=1&dup=2&dup=3").unwrap();
        url.query_pairs_mut().set("dup", "X");
        assert_eq!(url.query(), Some("foo=bar&dup=X"));
    }

    #[test]
    fn set_is_idempotent() {
        let mut url = Url::parse("http://example.com/?a=1&b=2&a=3").unwrap();
        url.query_pairs_mut().set("a", "z");
        let once = url.as_str().to_string();
        url.query_pairs_mut().set("a", "z");
        assert_eq!(url.as_str(), once);
    }

    #[test]
    fn set_appends_when_key_absent() {
        let mut url = Url::parse("http://example.com/?a=1").unwrap();
        let idx = url.query_pairs_mut().set("b", "2");
        assert_eq!(idx, 1);
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn remove_at_drops_single_pair() {
        let mut url = Url::parse("http://example.com/?a=1&b=2&c=3").unwrap();
        url.query_pairs_mut().remove_at(1);
        assert_eq!(url.query(), Some("a=1&c=3"));
    }

    #[test]
    fn insert_splices_one_pair() {
        let mut url = Url::parse("http://example.com/?a=1&c=3").unwrap();
        url.query_pairs_mut().insert(1, "b", "2");
        assert_eq!(url.query(), Some("a=1&b=2&c=3"));
    }

    #[test]
    fn replace_key_keeps_value() {
        let mut url = Url::parse("http://example.com/?a=1&b=2").unwrap();
        url.query_pairs_mut().replace_key(0, "z");
        assert_eq!(url.query(), Some("z=1&b=2"));
    }

    #[test]
    fn replace_value_keeps_key() {
        let mut url = Url::parse("http://example.com/?a=1&b=2").unwrap();
        url.query_pairs_mut().replace_value(1, "9");
        assert_eq!(url.query(), Some("a=1&b=9"));
    }

    #[test]
    fn remove_all_where_only_sees_pairs_in_range() {
        let mut url = Url::parse("http://example.com/?a=1&b=2&a=3&a=4").unwrap();
        // Only the first two pairs are in range, so the trailing `a=4`
        // survives even though its key matches the predicate.
        url.query_pairs_mut().remove_all_where(0..2, |k, _| k == "a");
        assert_eq!(url.query(), Some("b=2&a=3&a=4"));
    }
}
