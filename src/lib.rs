// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A WHATWG-conformant URL parsing and mutation library.
//!
//! ```
//! use weburl::Url;
//!
//! let mut url = Url::parse("https://example.com/a/b?q=1")?;
//! assert_eq!(url.host_str(), "example.com");
//! url.path_segments_mut().unwrap().push("c");
//! assert_eq!(url.as_str(), "https://example.com/a/b/c?q=1");
//! # Ok::<(), weburl::ParseError>(())
//! ```
//!
//! A [`Url`] is backed by a single, copy-on-write-shared string buffer
//! (see [`mod@storage`] internals); cloning a `Url` is cheap, and mutating
//! one clone never affects another. Components are accessed and replaced
//! through methods on `Url` itself; the query and fragment additionally
//! have a structured [`KeyValuePairs`]/[`KeyValuePairsMut`] view, and the
//! path has a [`PathSegments`]/[`PathSegmentsMut`] view.

pub mod ascii;
pub mod error;
pub mod host;
pub(crate) mod input;
pub mod kv;
pub(crate) mod parser;
pub mod path;
pub mod path_components;
pub(crate) mod path_resolver;
pub mod percent_encoding;
pub mod scheme;
pub(crate) mod storage;
pub mod url;
pub(crate) mod writer;

#[cfg(feature = "serde")]
mod serde_impl;

pub use crate::error::{ParseError, SyntaxViolation};
pub use crate::host::HostKind;
pub use crate::kv::{KeyValuePairs, KeyValuePairsMut, Schema};
pub use crate::path_components::{PathSegments, PathSegmentsMut};
pub use crate::percent_encoding::{
    percent_decode, percent_decode_str, percent_encode, PercentDecode, PercentEncode,
};
pub use crate::scheme::SchemeKind;
pub use crate::storage::Position;
pub use crate::url::{ParseOptions, Url, UrlComponent};
