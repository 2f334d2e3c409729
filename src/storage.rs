// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Packed component-indexed string storage with copy-on-write mutation,
//! per spec.md §3 ("URL structure"/"URL storage") and §4.6.
//!
//! A `Storage` is an `Arc`-shared `(Header, String)` pair: the header
//! carries component *lengths* (never offsets — offsets are always
//! recomputed, mirroring `crate::slicing`'s `Position::index`), and the
//! string is the full canonical serialization. `replace_subrange` is the
//! single primitive through which every structural edit flows; it clones
//! the shared buffer only when more than one `Storage` handle exists.

use std::sync::Arc;

use crate::scheme::SchemeKind;

/// Bits of `Header::components_present`.
pub mod component {
    pub const AUTHORITY: u8 = 1 << 0;
    pub const PATH: u8 = 1 << 1;
    pub const QUERY: u8 = 1 << 2;
    pub const FRAGMENT: u8 = 1 << 3;
}

/// Component lengths and flags for a single URL value. Offsets are
/// never stored; they're derived algorithmically by `Storage::range_of`,
/// the same way the teacher's `Position::index` derives them from
/// `scheme_end`/`username_end`/etc.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    pub scheme_kind: SchemeKind,
    pub scheme_len: u32,
    pub username_len: u32,
    /// Includes the leading `:` when nonzero.
    pub password_len: u32,
    pub hostname_len: u32,
    /// Includes the leading `:` when nonzero.
    pub port_len: u32,
    /// Includes the leading `/` when nonzero.
    pub path_len: u32,
    /// Includes the leading `?` when nonzero.
    pub query_len: u32,
    /// Includes the leading `#` when nonzero.
    pub fragment_len: u32,
    pub components_present: u8,
    pub cannot_be_a_base_url: bool,
    pub has_path_sigil: bool,
    pub query_is_known_form_encoded: bool,
}

impl Header {
    pub fn has_authority(&self) -> bool {
        self.components_present & component::AUTHORITY != 0
    }

    pub fn has_query(&self) -> bool {
        self.components_present & component::QUERY != 0
    }

    pub fn has_fragment(&self) -> bool {
        self.components_present & component::FRAGMENT != 0
    }

    pub fn has_port(&self) -> bool {
        self.port_len > 0
    }

    pub fn has_password(&self) -> bool {
        self.password_len > 0
    }
}

/// A named position within a URL's serialization, analogous to the
/// teacher's `slicing::Position` but computed from `Header` lengths
/// instead of stored `_end` fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    SchemeStart,
    SchemeEnd,
    UsernameStart,
    UsernameEnd,
    PasswordStart,
    PasswordEnd,
    HostStart,
    HostEnd,
    PortStart,
    PortEnd,
    PathStart,
    PathEnd,
    QueryStart,
    QueryEnd,
    FragmentStart,
    FragmentEnd,
}

impl Header {
    /// Byte offset of `position` within the full serialization.
    pub fn index(&self, position: Position) -> usize {
        let scheme_end = self.scheme_len as usize;
        let sigil = if self.has_path_sigil { 2 } else { 0 };
        let authority_start = scheme_end + if self.has_authority() { 3 } else { 1 };
        let username_end = authority_start + self.username_len as usize;
        let password_end = username_end + self.password_len as usize;
        let host_start = password_end + if self.has_authority() && (self.username_len > 0 || self.password_len > 0) { 1 } else { 0 };
        let host_end = host_start + self.hostname_len as usize;
        let port_end = host_end + self.port_len as usize;
        let path_start = port_end + sigil;
        let path_end = path_start + self.path_len as usize;
        let query_end = path_end + self.query_len as usize;
        let fragment_end = query_end + self.fragment_len as usize;

        match position {
            Position::SchemeStart => 0,
            Position::SchemeEnd => scheme_end,
            Position::UsernameStart => authority_start,
            Position::UsernameEnd => username_end,
            Position::PasswordStart => {
                if self.password_len > 0 {
                    username_end + 1
                } else {
                    username_end
                }
            }
            Position::PasswordEnd => password_end,
            Position::HostStart => host_start,
            Position::HostEnd => host_end,
            Position::PortStart => {
                if self.port_len > 0 {
                    host_end + 1
                } else {
                    host_end
                }
            }
            Position::PortEnd => port_end,
            Position::PathStart => path_start,
            Position::PathEnd => path_end,
            Position::QueryStart => {
                if self.query_len > 0 {
                    path_end + 1
                } else {
                    path_end
                }
            }
            Position::QueryEnd => query_end,
            Position::FragmentStart => {
                if self.fragment_len > 0 {
                    query_end + 1
                } else {
                    query_end
                }
            }
            Position::FragmentEnd => fragment_end,
        }
    }

    pub fn range_of(&self, start: Position, end: Position) -> std::ops::Range<usize> {
        self.index(start)..self.index(end)
    }

    pub fn total_len(&self) -> usize {
        self.index(Position::FragmentEnd)
    }
}

struct Inner {
    header: Header,
    bytes: String,
}

/// A reference-counted, copy-on-write `(Header, String)` pair. Cloning a
/// `Storage` is O(1); mutating it through `replace_subrange` clones the
/// underlying buffer only if the `Arc`'s strong count is greater than 1.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Inner>,
}

impl Storage {
    pub fn new(header: Header, bytes: String) -> Storage {
        debug_assert_eq!(bytes.len(), header.total_len());
        Storage {
            inner: Arc::new(Inner { header, bytes }),
        }
    }

    pub fn header(&self) -> &Header {
        &self.inner.header
    }

    pub fn as_str(&self) -> &str {
        &self.inner.bytes
    }

    pub fn slice(&self, start: Position, end: Position) -> &str {
        let range = self.inner.header.range_of(start, end);
        &self.inner.bytes[range]
    }

    /// Atomically replace `byte_range` of the serialization with
    /// `new_bytes`, and install `new_header` as the updated header (the
    /// caller computes it, since only the edit's author knows the new
    /// component lengths). If this `Storage` is uniquely held the edit
    /// happens in place; otherwise the buffer is cloned first.
    pub fn replace_subrange(
        &mut self,
        byte_range: std::ops::Range<usize>,
        new_bytes: &str,
        new_header: Header,
    ) {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => {
                inner.bytes.replace_range(byte_range, new_bytes);
                inner.header = new_header;
            }
            None => {
                let mut bytes = self.inner.bytes.clone();
                bytes.replace_range(byte_range, new_bytes);
                self.inner = Arc::new(Inner {
                    header: new_header,
                    bytes,
                });
            }
        }
        debug_assert_eq!(self.inner.bytes.len(), self.inner.header.total_len());
    }

    /// `true` if `other` shares this `Storage`'s underlying allocation
    /// (per spec.md §7 "View→URL assignment": a view may only be
    /// reassigned across URLs that share storage identity).
    pub fn same_allocation(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Header {
        Header {
            scheme_kind: SchemeKind::Https,
            scheme_len: 5,
            username_len: 0,
            password_len: 0,
            hostname_len: 11,
            port_len: 0,
            path_len: 1,
            query_len: 0,
            fragment_len: 0,
            components_present: component::AUTHORITY | component::PATH,
            cannot_be_a_base_url: false,
            has_path_sigil: false,
            query_is_known_form_encoded: false,
        }
    }

    #[test]
    fn positions_match_serialization() {
        let h = header();
        let s = Storage::new(h, "https://example.com/".to_string());
        assert_eq!(s.slice(Position::SchemeStart, Position::SchemeEnd), "https");
        assert_eq!(s.slice(Position::HostStart, Position::HostEnd), "example.com");
        assert_eq!(s.slice(Position::PathStart, Position::PathEnd), "/");
    }

    #[test]
    fn clone_is_cheap_and_cow_on_write() {
        let h = header();
        let a = Storage::new(h, "https://example.com/".to_string());
        let mut b = a.clone();
        assert!(a.same_allocation(&b));
        let mut new_header = h;
        new_header.path_len = 5;
        b.replace_subrange(19..20, "/path", new_header);
        assert!(!a.same_allocation(&b));
        assert_eq!(a.as_str(), "https://example.com/");
        assert_eq!(b.as_str(), "https://example.com/path");
    }

    #[test]
    fn unique_storage_mutates_in_place() {
        let h = header();
        let mut s = Storage::new(h, "https://example.com/".to_string());
        let mut new_header = h;
        new_header.path_len = 5;
        s.replace_subrange(19..20, "/path", new_header);
        assert_eq!(s.as_str(), "https://example.com/path");
    }
}
