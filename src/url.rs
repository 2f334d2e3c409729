// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `Url` itself: the glue that ties the scanner, storage, and views
//! together into the public type, per spec.md §1 ("`host.rs` and `url.rs`
//! are the glue"). Grounded on the teacher's `UrlParser`/`UrlUtils` setter
//! contract for the shape of the mutation API, and on `Position`-indexed
//! slicing (now `storage::Position`, the modern replacement for the
//! teacher's stored `_end` fields) for the accessors.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::ascii::{FRAGMENT, QUERY, SPECIAL_QUERY, USERINFO};
use crate::error::{ignore_violations, ParseError, SyntaxViolation};
use crate::host::{self, HostKind};
use crate::kv::{KeyValuePairs, KeyValuePairsMut, Schema};
use crate::parser;
use crate::path_components::{encode_segment, PathSegments, PathSegmentsMut};
use crate::path_resolver;
use crate::percent_encoding::percent_encode_to_string;
use crate::scheme::{self, SchemeKind};
use crate::storage::{component, Header, Position, Storage};

/// Which of a URL's two key-value-pairs-shaped components a [`Schema`]-based
/// view reads and writes. Only the query and fragment are meaningfully
/// delimiter-split; the path has its own segment-shaped view instead
/// ([`PathSegments`]/[`PathSegmentsMut`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UrlComponent {
    Query,
    Fragment,
}

/// A builder for the handful of knobs `Url::parse` can take beyond the
/// input string itself, per spec.md §7 ("parse configuration"). Obtained
/// from [`Url::options`]; matches `rust-url`'s own `ParseOptions`.
pub struct ParseOptions<'a> {
    base_url: Option<&'a Url>,
    violation: Option<&'a dyn Fn(SyntaxViolation)>,
}

impl<'a> Default for ParseOptions<'a> {
    fn default() -> Self {
        ParseOptions {
            base_url: None,
            violation: None,
        }
    }
}

impl<'a> ParseOptions<'a> {
    /// Resolve the input against `base` if it's a relative reference.
    pub fn base_url(mut self, base: Option<&'a Url>) -> Self {
        self.base_url = base;
        self
    }

    /// Receive every [`SyntaxViolation`] encountered while parsing. Parsing
    /// never fails because of one; the default is to ignore them.
    pub fn syntax_violation_callback(mut self, callback: Option<&'a dyn Fn(SyntaxViolation)>) -> Self {
        self.violation = callback;
        self
    }

    pub fn parse(self, input: &str) -> Result<Url, ParseError> {
        let base_storage = self.base_url.map(|url| &url.storage);
        let storage = match self.violation {
            Some(callback) => {
                let mut sink = |v: SyntaxViolation| callback(v);
                parser::parse(input, base_storage, &mut sink)?
            }
            None => parser::parse(input, base_storage, &mut ignore_violations)?,
        };
        Ok(Url { storage })
    }
}

/// A parsed, WHATWG-conformant URL, backed by one copy-on-write-shared
/// string buffer (spec.md §3). Cheap to clone; every mutating method
/// either edits the buffer in place (if uniquely held) or clones it first.
#[derive(Clone)]
pub struct Url {
    storage: Storage,
}

impl Url {
    /// Parse `input` with no base URL.
    pub fn parse(input: &str) -> Result<Url, ParseError> {
        Url::options().parse(input)
    }

    /// Start building a customized parse (a base URL, a violation sink).
    pub fn options<'a>() -> ParseOptions<'a> {
        ParseOptions::default()
    }

    /// Parse `input` against `self` as the base URL, per spec.md §4.2.
    pub fn join(&self, input: &str) -> Result<Url, ParseError> {
        Url::options().base_url(Some(self)).parse(input)
    }

    /// The full serialization.
    pub fn as_str(&self) -> &str {
        self.storage.as_str()
    }

    /// Consume `self`, returning the full serialization.
    pub fn into_string(self) -> String {
        self.storage.as_str().to_string()
    }

    fn header(&self) -> Header {
        *self.storage.header()
    }

    pub fn scheme(&self) -> &str {
        self.storage.slice(Position::SchemeStart, Position::SchemeEnd)
    }

    pub fn scheme_kind(&self) -> SchemeKind {
        self.header().scheme_kind
    }

    /// `true` for URLs like `mailto:a@example.com` or `javascript:...`
    /// that have no authority, no path-segments view, and no meaningful
    /// relative resolution target (spec.md §3/§4.2).
    pub fn cannot_be_a_base(&self) -> bool {
        self.header().cannot_be_a_base_url
    }

    pub fn username(&self) -> &str {
        self.storage.slice(Position::UsernameStart, Position::UsernameEnd)
    }

    pub fn password(&self) -> Option<&str> {
        if self.header().has_password() {
            Some(self.storage.slice(Position::PasswordStart, Position::PasswordEnd))
        } else {
            None
        }
    }

    /// The host, in its decoded-for-display serialized form. Empty string
    /// when the component is nil-but-erased-to-empty (no authority, or an
    /// authority with an empty host), matching spec.md §6's erasure
    /// convention for hostname/username/path.
    pub fn host_str(&self) -> &str {
        self.storage.slice(Position::HostStart, Position::HostEnd)
    }

    /// Re-derives the host's kind from its serialized bytes; the core
    /// storage doesn't keep a separate tag (spec.md §3).
    pub fn host_kind(&self) -> HostKind {
        if !self.header().has_authority() {
            HostKind::Empty
        } else {
            host::host_kind_of(self.host_str(), self.scheme_kind().is_special())
        }
    }

    /// The host, only when it's a domain name (not an IP literal or an
    /// opaque host).
    pub fn domain(&self) -> Option<&str> {
        match self.host_kind() {
            HostKind::Domain => Some(self.host_str()),
            _ => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        if self.header().has_port() {
            self.storage.slice(Position::PortStart, Position::PortEnd).parse().ok()
        } else {
            None
        }
    }

    /// [`Url::port`], falling back to the scheme's default port.
    pub fn port_or_known_default(&self) -> Option<u16> {
        self.port().or_else(|| self.scheme_kind().default_port())
    }

    pub fn path(&self) -> &str {
        self.storage.slice(Position::PathStart, Position::PathEnd)
    }

    pub fn query(&self) -> Option<&str> {
        if self.header().has_query() {
            Some(self.storage.slice(Position::QueryStart, Position::QueryEnd))
        } else {
            None
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        if self.header().has_fragment() {
            Some(self.storage.slice(Position::FragmentStart, Position::FragmentEnd))
        } else {
            None
        }
    }

    /// A bidirectional, read-only view over the path's segments, or `None`
    /// for a cannot-be-a-base URL (spec.md §4.8).
    pub fn path_segments(&self) -> Option<PathSegments<'_>> {
        if self.cannot_be_a_base() {
            None
        } else {
            Some(PathSegments::new(self.path()))
        }
    }

    /// A mutable view over the path's segments, or `None` for a
    /// cannot-be-a-base URL.
    pub fn path_segments_mut(&mut self) -> Option<PathSegmentsMut<'_>> {
        if self.cannot_be_a_base() {
            None
        } else {
            Some(PathSegmentsMut::new(self))
        }
    }

    /// A key-value-pairs view over `component`, using `schema`. Debug-panics
    /// if `schema`'s own delimiters aren't in its encode set (spec.md §4.9).
    pub fn key_value_pairs(&self, component: UrlComponent, schema: Schema) -> KeyValuePairs<'_> {
        debug_assert!(schema.is_valid(), "Schema delimiters must be members of its own encode set");
        KeyValuePairs::new(self.component_raw(component), schema)
    }

    /// A mutable key-value-pairs view over `component`.
    pub fn key_value_pairs_mut(&mut self, component: UrlComponent, schema: Schema) -> KeyValuePairsMut<'_> {
        debug_assert!(schema.is_valid(), "Schema delimiters must be members of its own encode set");
        KeyValuePairsMut::new(self, component, schema)
    }

    /// The query, as `application/x-www-form-urlencoded` pairs.
    pub fn query_pairs(&self) -> KeyValuePairs<'_> {
        KeyValuePairs::new(self.query().unwrap_or(""), Schema::form_urlencoded())
    }

    /// A mutable view over the query's `application/x-www-form-urlencoded`
    /// pairs, writing straight back into this `Url`.
    pub fn query_pairs_mut(&mut self) -> KeyValuePairsMut<'_> {
        KeyValuePairsMut::new(self, UrlComponent::Query, Schema::form_urlencoded())
    }

    /// Re-parse `self.as_str()` and confirm it round-trips byte-for-byte,
    /// the idempotence contract spec.md §6 calls for (`parse(serialize(u))
    /// == u`). For use in tests and `debug_assert!`s, not the hot path.
    pub fn check_invariants(&self) -> Result<(), String> {
        match Url::parse(self.as_str()) {
            Ok(reparsed) if reparsed.as_str() == self.as_str() => Ok(()),
            Ok(reparsed) => Err(format!("reparse mismatch: {:?} vs {:?}", reparsed.as_str(), self.as_str())),
            Err(e) => Err(format!("failed to reparse own serialization: {}", e)),
        }
    }

    /// The raw (undecoded, separator-stripped) bytes of `component`; the
    /// empty string if absent. Used by [`KeyValuePairsMut`], which treats
    /// "absent" and "present but empty" identically for reading.
    pub(crate) fn component_raw(&self, component: UrlComponent) -> &str {
        match component {
            UrlComponent::Query => self.query().unwrap_or(""),
            UrlComponent::Fragment => self.fragment().unwrap_or(""),
        }
    }

    /// Replace `component`'s raw content with `new_raw` (not re-encoded;
    /// the caller, e.g. `KeyValuePairsMut`, has already encoded it), always
    /// leaving the component present afterward (possibly empty).
    pub(crate) fn set_component_raw(&mut self, component: UrlComponent, new_raw: &str) {
        let header = self.header();
        match component {
            UrlComponent::Query => {
                let range = header.index(Position::PathEnd)..header.index(Position::QueryEnd);
                let mut new_header = header;
                new_header.query_len = new_raw.len() as u32 + 1;
                new_header.components_present |= component::QUERY;
                self.storage.replace_subrange(range, &format!("?{}", new_raw), new_header);
            }
            UrlComponent::Fragment => {
                let range = header.index(Position::QueryEnd)..header.index(Position::FragmentEnd);
                let mut new_header = header;
                new_header.fragment_len = new_raw.len() as u32 + 1;
                new_header.components_present |= component::FRAGMENT;
                self.storage.replace_subrange(range, &format!("#{}", new_raw), new_header);
            }
        }
    }

    /// Remove `component` entirely (it becomes absent, not merely empty).
    pub(crate) fn clear_component(&mut self, component: UrlComponent) {
        let header = self.header();
        match component {
            UrlComponent::Query => {
                let range = header.index(Position::PathEnd)..header.index(Position::QueryEnd);
                let mut new_header = header;
                new_header.query_len = 0;
                new_header.components_present &= !component::QUERY;
                self.storage.replace_subrange(range, "", new_header);
            }
            UrlComponent::Fragment => {
                let range = header.index(Position::QueryEnd)..header.index(Position::FragmentEnd);
                let mut new_header = header;
                new_header.fragment_len = 0;
                new_header.components_present &= !component::FRAGMENT;
                self.storage.replace_subrange(range, "", new_header);
            }
        }
    }

    pub fn set_query(&mut self, query: Option<&str>) {
        match query {
            None => self.clear_component(UrlComponent::Query),
            Some(q) => {
                let set = if self.scheme_kind().is_special() { &SPECIAL_QUERY } else { &QUERY };
                let encoded = percent_encode_to_string(q.as_bytes(), set);
                self.set_component_raw(UrlComponent::Query, &encoded);
            }
        }
    }

    pub fn set_fragment(&mut self, fragment: Option<&str>) {
        match fragment {
            None => self.clear_component(UrlComponent::Fragment),
            Some(f) => {
                let encoded = percent_encode_to_string(f.as_bytes(), &FRAGMENT);
                self.set_component_raw(UrlComponent::Fragment, &encoded);
            }
        }
    }

    /// Replace the path with `path`, re-resolving dot-segments and
    /// (for `file:`) Windows drive letters exactly as a fresh parse would,
    /// by driving the same `path_resolver`/`build_path_string` pipeline
    /// `Url::parse` uses (spec.md §4.4).
    pub fn set_path(&mut self, path: &str) {
        let scheme_kind = self.scheme_kind();
        let resolved = path_resolver::resolve_path(path, scheme_kind, None);
        let new_path = parser::build_path_string(&resolved);
        self.install_path(new_path);
    }

    /// Replace the path with the segments the caller already decoded and
    /// edited, per spec.md §4.8. Each segment is encoded, joined back into
    /// a raw path string, and then re-resolved the same way [`Url::set_path`]
    /// does, so `.`/`..` segments a caller pushes are absorbed and a `file:`
    /// drive letter is normalized exactly as a fresh parse would produce.
    pub(crate) fn set_path_from_segments(&mut self, segments: Vec<String>) {
        let scheme_kind = self.scheme_kind();
        let raw_path = if segments.is_empty() {
            String::new()
        } else {
            let joined = segments.iter().map(|s| encode_segment(s)).collect::<Vec<_>>().join("/");
            format!("/{}", joined)
        };
        let resolved = path_resolver::resolve_path(&raw_path, scheme_kind, None);
        let mut new_path = parser::build_path_string(&resolved);
        let has_authority = self.header().has_authority();
        if new_path.is_empty() && (scheme_kind.is_special() || !has_authority) {
            new_path = "/".to_string();
        }
        self.install_path(new_path);
    }

    fn install_path(&mut self, new_path: String) {
        let header = self.header();
        let has_authority = header.has_authority();
        let needs_sigil = parser::path_needs_sigil(has_authority, &new_path);
        let old_sigil_len = if header.has_path_sigil { 2 } else { 0 };
        let old_start = header.index(Position::PathStart) - old_sigil_len;
        let old_end = header.index(Position::PathEnd);

        let mut new_header = header;
        new_header.has_path_sigil = needs_sigil;
        new_header.path_len = new_path.len() as u32;
        if new_path.is_empty() {
            new_header.components_present &= !component::PATH;
        } else {
            new_header.components_present |= component::PATH;
        }

        let mut bytes = String::with_capacity(new_path.len() + 2);
        if needs_sigil {
            bytes.push_str("/.");
        }
        bytes.push_str(&new_path);
        self.storage.replace_subrange(old_start..old_end, &bytes, new_header);
    }

    /// Replace the scheme. Rejected (the URL is left unchanged) if `scheme`
    /// isn't valid scheme syntax, or if it would move the URL between a
    /// special and a non-special scheme, or into or out of `file:` — those
    /// transitions change whether the URL has an authority at all, which a
    /// scheme swap alone can't reconcile (spec.md §7).
    pub fn set_scheme(&mut self, scheme: &str) -> Result<(), ParseError> {
        let with_colon = format!("{}:", scheme);
        let (lower, rest) = scheme::parse_scheme(&with_colon).ok_or(ParseError::InvalidScheme)?;
        if !rest.is_empty() {
            return Err(ParseError::InvalidScheme);
        }
        let new_kind = SchemeKind::from_lowercase_ascii(&lower);
        let old_kind = self.scheme_kind();
        if new_kind.is_special() != old_kind.is_special() || new_kind.is_file() != old_kind.is_file() {
            return Err(ParseError::InvalidScheme);
        }

        let header = self.header();
        let range = 0..header.index(Position::SchemeEnd);
        let mut new_header = header;
        new_header.scheme_len = lower.len() as u32;
        new_header.scheme_kind = new_kind;
        self.storage.replace_subrange(range, &lower, new_header);
        Ok(())
    }

    pub fn set_username(&mut self, username: &str) -> Result<(), ParseError> {
        let header = self.header();
        if self.cannot_be_a_base() {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        if !header.has_authority() || self.host_str().is_empty() {
            return Err(ParseError::EmptyHost);
        }
        let encoded = percent_encode_to_string(username.as_bytes(), &USERINFO);
        let range = header.index(Position::UsernameStart)..header.index(Position::UsernameEnd);
        let mut new_header = header;
        new_header.username_len = encoded.len() as u32;
        self.storage.replace_subrange(range, &encoded, new_header);
        Ok(())
    }

    pub fn set_password(&mut self, password: Option<&str>) -> Result<(), ParseError> {
        let header = self.header();
        if self.cannot_be_a_base() {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        if !header.has_authority() || self.host_str().is_empty() {
            return Err(ParseError::EmptyHost);
        }
        let start = header.index(Position::UsernameEnd);
        let end = header.index(Position::PasswordEnd);
        let mut new_header = header;
        match password {
            None => {
                new_header.password_len = 0;
                self.storage.replace_subrange(start..end, "", new_header);
            }
            Some(p) => {
                let encoded = percent_encode_to_string(p.as_bytes(), &USERINFO);
                new_header.password_len = encoded.len() as u32 + 1;
                self.storage.replace_subrange(start..end, &format!(":{}", encoded), new_header);
            }
        }
        Ok(())
    }

    /// Replace the host. `None` (or `""`) clears it, which is only allowed
    /// for `file:` and non-special schemes (special schemes other than
    /// `file:` require a non-empty host, per spec.md §4.3). Setting a host
    /// on a URL that currently has no authority at all adds one.
    pub fn set_host(&mut self, host: Option<&str>) -> Result<(), ParseError> {
        if self.cannot_be_a_base() {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        let is_special = self.scheme_kind().is_special();
        let new_host = match host {
            None | Some("") => {
                if is_special && !self.scheme_kind().is_file() {
                    return Err(ParseError::EmptyHost);
                }
                String::new()
            }
            Some(h) => host::parse_host(h, is_special)?.0,
        };

        let header = self.header();
        if header.has_authority() {
            let range = header.index(Position::HostStart)..header.index(Position::HostEnd);
            let mut new_header = header;
            new_header.hostname_len = new_host.len() as u32;
            self.storage.replace_subrange(range, &new_host, new_header);
        } else {
            let sigil_len = if header.has_path_sigil { 2 } else { 0 };
            let insert_at = header.index(Position::SchemeEnd) + 1;
            let old_end = insert_at + sigil_len;
            let mut new_header = header;
            new_header.components_present |= component::AUTHORITY;
            new_header.hostname_len = new_host.len() as u32;
            new_header.has_path_sigil = false;
            self.storage.replace_subrange(insert_at..old_end, &format!("//{}", new_host), new_header);
        }
        Ok(())
    }

    pub fn set_port(&mut self, port: Option<u16>) -> Result<(), ParseError> {
        let header = self.header();
        if self.cannot_be_a_base() || !header.has_authority() {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        if self.scheme_kind().is_file() {
            return Err(ParseError::InvalidPort);
        }
        let start = header.index(Position::HostEnd);
        let end = header.index(Position::PortEnd);
        let mut new_header = header;
        match port {
            None => {
                new_header.port_len = 0;
                self.storage.replace_subrange(start..end, "", new_header);
            }
            Some(p) if Some(p) == self.scheme_kind().default_port() => {
                new_header.port_len = 0;
                self.storage.replace_subrange(start..end, "", new_header);
            }
            Some(p) => {
                let digits = p.to_string();
                new_header.port_len = digits.len() as u32 + 1;
                self.storage.replace_subrange(start..end, &format!(":{}", digits), new_header);
            }
        }
        Ok(())
    }
}

impl PartialEq for Url {
    fn eq(&self, other: &Url) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Url {}

impl Hash for Url {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Url {
    type Err = ParseError;
    fn from_str(input: &str) -> Result<Url, ParseError> {
        Url::parse(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_serializes_a_simple_url() {
        let url = Url::parse("https://example.com/a/b?q=1#frag").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), "example.com");
        assert_eq!(url.path(), "/a/b");
        assert_eq!(url.query(), Some("q=1"));
        assert_eq!(url.fragment(), Some("frag"));
        assert_eq!(url.as_str(), "https://example.com/a/b?q=1#frag");
    }

    #[test]
    fn join_resolves_against_base() {
        let base = Url::parse("https://example.com/a/b").unwrap();
        let joined = base.join("../c").unwrap();
        assert_eq!(joined.as_str(), "https://example.com/c");
    }

    #[test]
    fn default_port_is_not_serialized() {
        let mut url = Url::parse("http://example.com/").unwrap();
        assert_eq!(url.port(), None);
        url.set_port(Some(8080)).unwrap();
        assert_eq!(url.as_str(), "http://example.com:8080/");
        url.set_port(Some(80)).unwrap();
        assert_eq!(url.as_str(), "http://example.com/");
    }

    #[test]
    fn set_scheme_rejects_special_to_non_special() {
        let mut url = Url::parse("http://example.com/").unwrap();
        assert!(url.set_scheme("foo").is_err());
        assert_eq!(url.as_str(), "http://example.com/");
    }

    #[test]
    fn set_scheme_allows_compatible_swap() {
        let mut url = Url::parse("http://example.com/").unwrap();
        url.set_scheme("https").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn set_host_on_authority_less_url_adds_authority() {
        let mut url = Url::parse("foo:/a/b").unwrap();
        assert!(!url.cannot_be_a_base());
        url.set_host(Some("example.com")).unwrap();
        assert_eq!(url.as_str(), "foo://example.com/a/b");
    }

    #[test]
    fn cannot_be_a_base_has_no_path_segments_view() {
        let url = Url::parse("mailto:a@example.com").unwrap();
        assert!(url.cannot_be_a_base());
        assert!(url.path_segments().is_none());
    }

    #[test]
    fn round_trip_invariant_holds_after_mutation() {
        let mut url = Url::parse("https://example.com/a").unwrap();
        url.set_query(Some("x=1"));
        url.path_segments_mut().unwrap().push("b");
        url.check_invariants().unwrap();
    }
}
