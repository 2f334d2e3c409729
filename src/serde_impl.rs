// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `serde` support for [`Url`], gated behind the `serde` feature. Grounded
//! on the teacher's legacy `Serialize`/`Decodable` impls for `Url`; ported
//! to the modern `serde::{Serialize, Deserialize}` traits the same way: a
//! `Url` is just its string form.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::url::Url;

impl Serialize for Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Url, D::Error> {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let url = Url::parse("https://example.com/a?b=1#c").unwrap();
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"https://example.com/a?b=1#c\"");
        let back: Url = serde_json::from_str(&json).unwrap();
        assert_eq!(url, back);
    }

    #[test]
    fn rejects_invalid_url_strings() {
        let err = serde_json::from_str::<Url>("\"not a url\"");
        assert!(err.is_err());
    }
}
