// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types returned by parsing and mutation.

use std::error::Error;
use std::fmt;

/// A reason parsing a URL failed, or a structural edit was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    /// The input had no scheme and no base URL was given.
    RelativeUrlWithoutBase,
    /// The base URL is a cannot-be-a-base URL and the input did not start
    /// with `#`.
    RelativeUrlWithCannotBeABaseBase,
    /// A setter tried to give a host to a cannot-be-a-base URL.
    SetHostOnCannotBeABaseUrl,
    /// A special-scheme URL had no host.
    EmptyHost,
    /// The host contained a byte not allowed in a domain.
    InvalidDomainCharacter,
    /// Forwarded from `idna`: the domain failed IDNA processing.
    IdnaError,
    /// The `[...]`-bracketed host was not a valid IPv6 address.
    InvalidIpv6Address,
    /// A dotted-decimal host segment was not a valid IPv4 address.
    InvalidIpv4Address,
    /// The scheme was empty, did not start with an ASCII letter, or
    /// contained a disallowed byte.
    InvalidScheme,
    /// The port was not a 16-bit decimal number.
    InvalidPort,
    /// A component, or the whole URL, exceeded the representable size.
    Overflow,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            ParseError::RelativeUrlWithoutBase => "relative URL without a base",
            ParseError::RelativeUrlWithCannotBeABaseBase => {
                "relative URL with a cannot-be-a-base base"
            }
            ParseError::SetHostOnCannotBeABaseUrl => "cannot set host on cannot-be-a-base URL",
            ParseError::EmptyHost => "empty host",
            ParseError::InvalidDomainCharacter => "invalid domain character",
            ParseError::IdnaError => "invalid international domain name",
            ParseError::InvalidIpv6Address => "invalid IPv6 address",
            ParseError::InvalidIpv4Address => "invalid IPv4 address",
            ParseError::InvalidScheme => "invalid scheme",
            ParseError::InvalidPort => "invalid port number",
            ParseError::Overflow => "URL exceeds the maximum representable size",
        })
    }
}

impl Error for ParseError {}

/// A non-fatal parse-time observation, reported through the
/// [`violation`](crate::ParseOptions::syntax_violation_callback) sink.
///
/// These never cause parsing to fail on their own; see spec.md §7.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SyntaxViolation {
    /// A code point outside the URL code point set was used unencoded.
    NonUrlCodePoint,
    /// A lone `%` not followed by two hex digits.
    UnescapedPercentSign,
    /// `\` was used where `/` was expected (tolerated for special schemes).
    Backslash,
    /// The scheme was followed by something other than `//` for a
    /// special scheme, or `file:` was not followed by `//`.
    ExpectedTwoSlashes,
    /// An `@` appeared in the host position (ambiguous userinfo parse).
    UnexpectedAtSign,
    /// A `:` appeared outside `[...]` brackets where not a port delimiter.
    UnexpectedColon,
    /// A `file:` URL specified a non-empty, non-"localhost" host.
    UnexpectedHostForFileScheme,
    /// A path under a `file:` URL started with a Windows drive letter in
    /// a position where it would be unexpectedly consumed as a host.
    UnexpectedWindowsDriveLetter,
    /// A path segment between two slashes was empty.
    EmptyPathSegment,
    /// The non-relative reference had no scheme and the relative-scheme
    /// FIXME-class ambiguity the WHATWG errata describes was hit.
    MissingSchemeNonRelativeUrl,
}

impl SyntaxViolation {
    /// A short, stable, human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            SyntaxViolation::NonUrlCodePoint => "non-URL code point",
            SyntaxViolation::UnescapedPercentSign => "expected 2 hex digits after %",
            SyntaxViolation::Backslash => "backslash",
            SyntaxViolation::ExpectedTwoSlashes => "expected //",
            SyntaxViolation::UnexpectedAtSign => "unexpected @ in host",
            SyntaxViolation::UnexpectedColon => "unexpected : outside brackets",
            SyntaxViolation::UnexpectedHostForFileScheme => "unexpected host for file: URL",
            SyntaxViolation::UnexpectedWindowsDriveLetter => "unexpected Windows drive letter",
            SyntaxViolation::EmptyPathSegment => "empty path segment",
            SyntaxViolation::MissingSchemeNonRelativeUrl => "missing scheme: non-relative URL",
        }
    }
}

impl fmt::Display for SyntaxViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// No-op violation sink used when the caller doesn't care.
pub(crate) fn ignore_violations(_: SyntaxViolation) {}
