// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The URL scanner: dispatches on scheme per spec.md §4.3, scans
//! authority/path/query/fragment, resolves the path through
//! `path_resolver`, and drives `writer::StorageWriter` to produce a
//! `storage::Storage`. Grounded on the dispatch shape of the teacher's
//! `examples/servo-rust-url/src/parser.rs` (`parse_url`/
//! `parse_relative_url`/`parse_absolute_url`), restructured around this
//! crate's `Input`/`Storage`/`PathVisitor` types.
//!
//! Simplification relative to spec.md §4.2/§4.3: rather than threading a
//! lazily-filtered `Input` through every sub-scanner, the top-level entry
//! point materializes the fully trimmed-and-filtered string once (via
//! `Input`'s iterator) and scans that owned `String` with ordinary slice
//! operations. `Input` itself still implements the full lazy contract
//! (and is exercised directly by its own tests); this is a call about
//! where in the pipeline to pay for materialization, not a change to
//! what gets filtered.

use crate::ascii::PATH;
use crate::error::{ParseError, SyntaxViolation};
use crate::host::{parse_host, HostKind};
use crate::input::Input;
use crate::path_resolver::{self, PathVisitor, Resolved};
use crate::percent_encoding::percent_encode_to_string;
use crate::scheme::{parse_scheme, SchemeKind};
use crate::storage::{component, Header, Position, Storage};
use crate::writer::{CapacityMetrics, StorageWriter, UrlWriter};

type Violation<'a> = &'a mut dyn FnMut(SyntaxViolation);

/// Parse `input` (optionally against `base`) into a fresh `Storage`.
pub fn parse(input: &str, base: Option<&Storage>, violation: Violation<'_>) -> Result<Storage, ParseError> {
    let trimmed = Input::new(input, violation);
    let filtered: String = trimmed.collect();

    if let Some((scheme, rest)) = parse_scheme(&filtered) {
        return scan_with_scheme(&scheme, rest, base, violation);
    }

    let base = base.ok_or(ParseError::RelativeUrlWithoutBase)?;
    if base.header().cannot_be_a_base_url {
        if let Some(fragment) = filtered.strip_prefix('#') {
            return Ok(copy_with_fragment(base, fragment));
        }
        return Err(ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    let scheme_kind = base.header().scheme_kind;
    scan_relative(scheme_kind, &filtered, base, violation)
}

fn scheme_name_of(scheme_kind: SchemeKind, base: Option<&Storage>) -> String {
    if let Some(base) = base {
        if base.header().scheme_kind == scheme_kind {
            return base.slice(Position::SchemeStart, Position::SchemeEnd).to_string();
        }
    }
    // Only reached for schemes recognized by `SchemeKind`, whose name is
    // recoverable losslessly from the kind itself.
    match scheme_kind {
        SchemeKind::Ftp => "ftp",
        SchemeKind::File => "file",
        SchemeKind::Http => "http",
        SchemeKind::Https => "https",
        SchemeKind::Ws => "ws",
        SchemeKind::Wss => "wss",
        SchemeKind::Other => "",
    }
    .to_string()
}

fn scan_with_scheme(
    scheme: &str,
    rest: &str,
    base: Option<&Storage>,
    violation: Violation<'_>,
) -> Result<Storage, ParseError> {
    let scheme_kind = SchemeKind::from_lowercase_ascii(scheme);

    if scheme_kind.is_file() {
        return scan_authority_and_rest(scheme.to_string(), scheme_kind, strip_slashes(rest, true, violation), violation);
    }

    if !scheme_kind.is_special() {
        if rest.starts_with("//") {
            let after = strip_slashes(rest, false, violation);
            return scan_authority_and_rest(scheme.to_string(), scheme_kind, after, violation);
        }
        if rest.starts_with('/') {
            // A single (not doubled) leading slash: an absolute path with
            // no authority at all, e.g. `a:/b` (as opposed to `a://b`).
            return scan_path_only(scheme.to_string(), scheme_kind, rest, violation);
        }
        return scan_cannot_be_a_base(scheme.to_string(), scheme_kind, rest, violation);
    }

    if let Some(base) = base {
        if base.header().scheme_kind == scheme_kind && !starts_with_slashes(rest) {
            violation(SyntaxViolation::MissingSchemeNonRelativeUrl);
            return scan_relative(scheme_kind, rest, base, violation);
        }
    }
    scan_authority_and_rest(scheme.to_string(), scheme_kind, strip_slashes(rest, true, violation), violation)
}

fn starts_with_slashes(rest: &str) -> bool {
    rest.starts_with("//") || rest.starts_with("\\\\") || rest.starts_with("/\\") || rest.starts_with("\\/")
}

/// Consume the `//` (or, for special schemes, any `/`/`\` pair) that
/// introduces an authority. `is_special` relaxes `/` vs `\`
/// interchangeably, emitting a violation for each `\`.
fn strip_slashes<'a>(rest: &'a str, is_special: bool, violation: Violation<'_>) -> &'a str {
    let mut chars = rest.chars();
    let mut count = 0;
    let mut consumed = 0;
    while count < 2 {
        match chars.clone().next() {
            Some('/') => {}
            Some('\\') if is_special => violation(SyntaxViolation::Backslash),
            _ => break,
        }
        let c = chars.next().unwrap();
        consumed += c.len_utf8();
        count += 1;
    }
    if count < 2 {
        violation(SyntaxViolation::ExpectedTwoSlashes);
        return rest;
    }
    &rest[consumed..]
}

/// Scan `rest` as `[authority] path [query] [fragment]`, with the
/// authority mandatory only for special schemes (an empty authority is
/// legal for non-special schemes: `foo:///x`).
fn scan_authority_and_rest(
    scheme: String,
    scheme_kind: SchemeKind,
    rest: &str,
    violation: Violation<'_>,
) -> Result<Storage, ParseError> {
    let authority_end = rest
        .find(|c: char| c == '/' || c == '?' || c == '#' || (c == '\\' && scheme_kind.is_special()))
        .unwrap_or(rest.len());
    let (authority, remainder) = rest.split_at(authority_end);

    let (username, password, host_kind, host, port) = parse_authority(authority, scheme_kind, violation)?;

    let (path_part, query_part, fragment_part) = split_path_query_fragment(remainder);
    let resolved = path_resolver::resolve_path(path_part, scheme_kind, None);

    build(
        scheme,
        scheme_kind,
        false,
        username,
        password,
        Some((host, host_kind)),
        port,
        resolved,
        query_part,
        fragment_part,
        violation,
    )
}

fn parse_authority(
    authority: &str,
    scheme_kind: SchemeKind,
    violation: Violation<'_>,
) -> Result<(String, String, HostKind, String, Option<u16>), ParseError> {
    let (userinfo, host_port) = match authority.rfind('@') {
        Some(at) => {
            violation(SyntaxViolation::UnexpectedAtSign);
            (Some(&authority[..at]), &authority[at + 1..])
        }
        None => (None, authority),
    };

    let (username, password) = match userinfo {
        None => (String::new(), String::new()),
        Some(userinfo) => match userinfo.find(':') {
            Some(colon) => (
                percent_encode_to_string(userinfo[..colon].as_bytes(), &crate::ascii::USERINFO),
                percent_encode_to_string(userinfo[colon + 1..].as_bytes(), &crate::ascii::USERINFO),
            ),
            None => (
                percent_encode_to_string(userinfo.as_bytes(), &crate::ascii::USERINFO),
                String::new(),
            ),
        },
    };

    let (host_str, port_str) = split_host_port(host_port)?;
    if host_str.is_empty() && scheme_kind.is_special() && !scheme_kind.is_file() {
        return Err(ParseError::EmptyHost);
    }
    let (host, host_kind) = parse_host(host_str, scheme_kind.is_special())?;

    let port = match port_str {
        None => None,
        Some(digits) => {
            if digits.is_empty() {
                None
            } else {
                let value: u32 = digits.parse().map_err(|_| ParseError::InvalidPort)?;
                let value: u16 = u16::try_from(value).map_err(|_| ParseError::InvalidPort)?;
                if Some(value) == scheme_kind.default_port() {
                    None
                } else {
                    Some(value)
                }
            }
        }
    };

    Ok((username, password, host_kind, host, port))
}

/// Split `host_port` into a host slice and an optional port-digits slice,
/// respecting `[...]` IPv6 brackets (a `:` inside brackets is not a port
/// delimiter).
fn split_host_port(host_port: &str) -> Result<(&str, Option<&str>), ParseError> {
    if host_port.starts_with('[') {
        let end = host_port.find(']').ok_or(ParseError::InvalidIpv6Address)?;
        let (host, rest) = host_port.split_at(end + 1);
        if let Some(port) = rest.strip_prefix(':') {
            return Ok((host, Some(port)));
        }
        if rest.is_empty() {
            return Ok((host, None));
        }
        return Err(ParseError::InvalidIpv6Address);
    }
    match host_port.rfind(':') {
        Some(colon) => Ok((&host_port[..colon], Some(&host_port[colon + 1..]))),
        None => Ok((host_port, None)),
    }
}

fn split_path_query_fragment(rest: &str) -> (&str, Option<&str>, Option<&str>) {
    let (before_fragment, fragment) = match rest.find('#') {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    let (path, query) = match before_fragment.find('?') {
        Some(i) => (&before_fragment[..i], Some(&before_fragment[i + 1..])),
        None => (before_fragment, None),
    };
    (path, query, fragment)
}

/// Scan `rest` as `path [query] [fragment]` with no authority at all —
/// the non-special, single-leading-slash case (`a:/b`, as opposed to the
/// doubled-slash `a://b` that does have one). The path still goes through
/// the ordinary dot-segment resolver; only the surrounding authority
/// scan is skipped.
fn scan_path_only(
    scheme: String,
    scheme_kind: SchemeKind,
    rest: &str,
    violation: Violation<'_>,
) -> Result<Storage, ParseError> {
    let (path_part, query_part, fragment_part) = split_path_query_fragment(rest);
    let resolved = path_resolver::resolve_path(path_part, scheme_kind, None);
    build(
        scheme,
        scheme_kind,
        false,
        String::new(),
        String::new(),
        None,
        None,
        resolved,
        query_part,
        fragment_part,
        violation,
    )
}

fn scan_cannot_be_a_base(
    scheme: String,
    scheme_kind: SchemeKind,
    rest: &str,
    violation: Violation<'_>,
) -> Result<Storage, ParseError> {
    let (path_part, query_part, fragment_part) = split_path_query_fragment(rest);
    let encoded_path = percent_encode_to_string(path_part.as_bytes(), &crate::ascii::C0_CONTROLS);
    build(
        scheme,
        scheme_kind,
        true,
        String::new(),
        String::new(),
        None,
        None,
        vec![Resolved::Input(encoded_path, false)],
        query_part,
        fragment_part,
        violation,
    )
}

fn scan_relative(
    scheme_kind: SchemeKind,
    rest: &str,
    base: &Storage,
    violation: Violation<'_>,
) -> Result<Storage, ParseError> {
    let scheme = scheme_name_of(scheme_kind, Some(base));

    if rest.is_empty() {
        return Ok(base.clone());
    }

    let first = rest.as_bytes()[0];

    if first == b'?' {
        let (_, query_part, fragment_part) = split_path_query_fragment(rest);
        return build_from_base_authority(
            &scheme,
            scheme_kind,
            base,
            base_path_resolved(base),
            query_part,
            fragment_part,
            violation,
        );
    }
    if first == b'#' {
        return Ok(copy_with_fragment(base, &rest[1..]));
    }

    if first == b'/' || (scheme_kind.is_special() && first == b'\\') {
        if starts_with_slashes(rest) {
            let after = strip_slashes(rest, scheme_kind.is_special(), violation);
            return scan_authority_and_rest(scheme, scheme_kind, after, violation);
        }
        let (path_part, query_part, fragment_part) = split_path_query_fragment(rest);
        let resolved = path_resolver::resolve_path(path_part, scheme_kind, None);
        return build_from_base_authority(&scheme, scheme_kind, base, resolved, query_part, fragment_part, violation);
    }

    let (path_part, query_part, fragment_part) = split_path_query_fragment(rest);
    let base_path = base.slice(Position::PathStart, Position::PathEnd);
    let resolved = path_resolver::resolve_path(path_part, scheme_kind, Some(base_path));
    build_from_base_authority(&scheme, scheme_kind, base, resolved, query_part, fragment_part, violation)
}

/// The base URL's path, copied verbatim as a single opaque `Base`
/// component (it's already normalized and contains its own internal
/// `/` separators, so `PathBuilder::visit_base_component` reproduces it
/// unchanged without needing to split it back into segments first).
fn base_path_resolved(base: &Storage) -> Vec<Resolved> {
    vec![Resolved::Base(
        base.slice(Position::PathStart, Position::PathEnd)
            .trim_start_matches('/')
            .to_string(),
    )]
}

fn build_from_base_authority(
    scheme: &str,
    scheme_kind: SchemeKind,
    base: &Storage,
    resolved: Vec<Resolved>,
    query_part: Option<&str>,
    fragment_part: Option<&str>,
    violation: Violation<'_>,
) -> Result<Storage, ParseError> {
    let has_authority = base.header().has_authority();
    let username = base.slice(Position::UsernameStart, Position::UsernameEnd).to_string();
    let password = {
        let p = base.slice(Position::PasswordStart, Position::PasswordEnd);
        p.trim_start_matches(':').to_string()
    };
    let host = base.slice(Position::HostStart, Position::HostEnd).to_string();
    let host_kind = if host.is_empty() { HostKind::Empty } else { HostKind::Domain };
    let port_str = base.slice(Position::PortStart, Position::PortEnd);
    let port = if port_str.is_empty() {
        None
    } else {
        port_str.trim_start_matches(':').parse::<u16>().ok()
    };

    build(
        scheme.to_string(),
        scheme_kind,
        false,
        username,
        password,
        if has_authority { Some((host, host_kind)) } else { None },
        port,
        resolved,
        query_part,
        fragment_part,
        violation,
    )
}

fn copy_with_fragment(base: &Storage, fragment: &str) -> Storage {
    let header = base.header();
    let mut new_header = *header;
    let encoded = percent_encode_to_string(fragment.as_bytes(), &crate::ascii::FRAGMENT);
    let mut bytes = base.as_str()[..header.index(Position::QueryEnd)].to_string();
    if !encoded.is_empty() || header.has_fragment() {
        bytes.push('#');
        bytes.push_str(&encoded);
        new_header.fragment_len = encoded.len() as u32 + 1;
        new_header.components_present |= component::FRAGMENT;
    } else {
        new_header.fragment_len = 0;
        new_header.components_present &= !component::FRAGMENT;
    }
    Storage::new(new_header, bytes)
}

struct PathBuilder {
    segments: Vec<String>,
}

impl PathVisitor for PathBuilder {
    fn visit_input_component(&mut self, bytes: &str, is_leading_windows_drive_letter: bool) {
        if is_leading_windows_drive_letter {
            self.segments.push(format!("/{}", bytes));
        } else {
            self.segments
                .push(format!("/{}", percent_encode_to_string(bytes.as_bytes(), &PATH)));
        }
    }

    fn visit_empty_component(&mut self) {
        self.segments.push("/".to_string());
    }

    fn visit_base_component(&mut self, bytes: &str) {
        self.segments.push(format!("/{}", bytes));
    }
}

#[allow(clippy::too_many_arguments)]
fn build(
    scheme: String,
    scheme_kind: SchemeKind,
    cannot_be_a_base_url: bool,
    username: String,
    password: String,
    host: Option<(String, HostKind)>,
    port: Option<u16>,
    resolved_path: Vec<Resolved>,
    query: Option<&str>,
    fragment: Option<&str>,
    violation: Violation<'_>,
) -> Result<Storage, ParseError> {
    if !username.is_empty() || !password.is_empty() {
        if host.is_none() || matches!(host, Some((ref h, _)) if h.is_empty()) {
            return Err(ParseError::EmptyHost);
        }
    }

    let mut builder = PathBuilder { segments: Vec::new() };
    path_resolver::visit_resolved(&resolved_path, &mut builder);
    builder.segments.reverse();
    let path = builder.segments.concat();

    if path.contains('\\') {
        violation(SyntaxViolation::Backslash);
    }

    let query_encode_set = if scheme_kind.is_special() {
        &crate::ascii::SPECIAL_QUERY
    } else {
        &crate::ascii::QUERY
    };
    let query_encoded = query.map(|q| percent_encode_to_string(q.as_bytes(), query_encode_set));
    let fragment_encoded = fragment.map(|f| percent_encode_to_string(f.as_bytes(), &crate::ascii::FRAGMENT));

    let mut metrics = CapacityMetrics::default();
    run_writer(&mut metrics, &scheme, scheme_kind, cannot_be_a_base_url, &username, &password, &host, port, &path, &query_encoded, &fragment_encoded);

    if metrics.required_capacity > u32::MAX as usize {
        return Err(ParseError::Overflow);
    }

    let mut storage = StorageWriter::with_capacity(metrics.required_capacity);
    run_writer(&mut storage, &scheme, scheme_kind, cannot_be_a_base_url, &username, &password, &host, port, &path, &query_encoded, &fragment_encoded);

    let (bytes, mut header) = storage.finish();
    if needs_path_sigil(host.is_some(), &path) {
        // Compute the insertion point before flipping the flag: `index`
        // folds the sigil's own 2 bytes into `path_start` once
        // `has_path_sigil` is set, but those bytes aren't in `bytes` yet.
        let insert_at = header.index(Position::PathStart);
        header.has_path_sigil = true;
        let mut bytes = bytes;
        bytes.insert_str(insert_at, "/.");
        return Ok(Storage::new(header, bytes));
    }
    Ok(Storage::new(header, bytes))
}

fn needs_path_sigil(has_authority: bool, path: &str) -> bool {
    !has_authority && path.starts_with("//")
}

/// Join already-resolved path components (as produced by
/// `path_resolver::resolve_path`) into a forward-order, percent-encoded
/// path string, the same way `build` does internally. Exposed so `Url`'s
/// `set_path` can reuse the exact same path-construction logic a full
/// parse would use.
pub(crate) fn build_path_string(resolved: &[Resolved]) -> String {
    let mut builder = PathBuilder { segments: Vec::new() };
    path_resolver::visit_resolved(resolved, &mut builder);
    builder.segments.reverse();
    builder.segments.concat()
}

/// Whether a freshly-built path string needs the `/.` sigil inserted
/// before it, per spec.md §4.7. Exposed for the same reason as
/// `build_path_string`.
pub(crate) fn path_needs_sigil(has_authority: bool, path: &str) -> bool {
    needs_path_sigil(has_authority, path)
}

#[allow(clippy::too_many_arguments)]
fn run_writer<W: UrlWriter>(
    w: &mut W,
    scheme: &str,
    scheme_kind: SchemeKind,
    cannot_be_a_base_url: bool,
    username: &str,
    password: &str,
    host: &Option<(String, HostKind)>,
    port: Option<u16>,
    path: &str,
    query: &Option<String>,
    fragment: &Option<String>,
) {
    w.write_flags(scheme_kind, cannot_be_a_base_url);
    w.write_scheme_contents(scheme);
    if let Some((host, _)) = host {
        w.write_authority_header();
        if !username.is_empty() || !password.is_empty() {
            w.write_username_contents(username);
            if !password.is_empty() {
                w.write_password_contents(password);
            }
            w.write_credentials_terminator();
        }
        w.write_hostname(host);
        if let Some(port) = port {
            w.write_port(port);
        }
    }
    w.write_path_simple(path);
    if let Some(query) = query {
        w.write_query_contents(query);
    }
    if let Some(fragment) = fragment {
        w.write_fragment_contents(fragment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ignore_violations;

    fn parse_str(input: &str) -> Storage {
        parse(input, None, &mut ignore_violations).unwrap()
    }

    #[test]
    fn parses_simple_http_url() {
        let s = parse_str("http://example.com/a/b?q=1#frag");
        assert_eq!(s.as_str(), "http://example.com/a/b?q=1#frag");
    }

    #[test]
    fn adds_root_path() {
        let s = parse_str("http://example.com");
        assert_eq!(s.as_str(), "http://example.com/");
    }

    #[test]
    fn relative_reference_merges_path() {
        let base = parse_str("http://example.com/a/b/c");
        let s = parse(
            "../d",
            Some(&base),
            &mut ignore_violations,
        )
        .unwrap();
        assert_eq!(s.as_str(), "http://example.com/a/d");
    }

    #[test]
    fn mailto_is_cannot_be_a_base() {
        let s = parse_str("mailto:user@example.com");
        assert!(s.header().cannot_be_a_base_url);
        assert_eq!(s.as_str(), "mailto:user@example.com");
    }

    #[test]
    fn default_port_is_normalized_away() {
        let s = parse_str("http://example.com:80/");
        assert_eq!(s.as_str(), "http://example.com/");
    }

    #[test]
    fn non_default_port_is_kept() {
        let s = parse_str("http://example.com:8080/");
        assert_eq!(s.as_str(), "http://example.com:8080/");
    }

    #[test]
    fn empty_host_on_special_scheme_is_rejected() {
        assert!(parse("http:///path", None, &mut ignore_violations).is_err());
    }
}
