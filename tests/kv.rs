// Copyright 2013-2014 Simon Sapin.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Scenario tests for the key-value-pairs view's splice/lookup/mutation
//! contract: `set`-style idempotence via `replace_subrange`, empty-pair
//! transparency, and the custom-`Schema` fragment preset.

use weburl::kv::Schema;
use weburl::{Url, UrlComponent};

#[test]
fn replacing_a_pair_in_place_is_idempotent() {
    let mut url = Url::parse("https://example.com/?a=1&b=2&c=3").unwrap();
    url.query_pairs_mut().replace_subrange(1..2, [("b".to_string(), "20".to_string())]);
    assert_eq!(url.query(), Some("a=1&b=20&c=3"));

    // Doing it again with the same value is a no-op on the content.
    url.query_pairs_mut().replace_subrange(1..2, [("b".to_string(), "20".to_string())]);
    assert_eq!(url.query(), Some("a=1&b=20&c=3"));
}

#[test]
fn empty_pairs_are_transparent_through_iteration() {
    let url = Url::parse("https://example.com/?&a=1&").unwrap();
    let pairs: Vec<_> = url.query_pairs().collect();
    assert_eq!(
        pairs,
        vec![
            ("".to_string(), "".to_string()),
            ("a".to_string(), "1".to_string()),
            ("".to_string(), "".to_string()),
        ]
    );
}

#[test]
fn len_counts_only_non_empty_pairs() {
    let mut url = Url::parse("https://example.com/?&&a=1").unwrap();
    assert_eq!(url.query_pairs_mut().len(), 1);
}

#[test]
fn appending_to_a_component_with_no_existing_pairs_has_no_leading_delimiter() {
    let mut url = Url::parse("https://example.com/").unwrap();
    url.query_pairs_mut().append("a", "1");
    assert_eq!(url.query(), Some("a=1"));
}

#[test]
fn splice_replaces_a_whole_range_at_once() {
    let mut url = Url::parse("https://example.com/?a=1&b=2&c=3&d=4").unwrap();
    url.query_pairs_mut().replace_subrange(
        1..3,
        [("x".to_string(), "9".to_string())],
    );
    assert_eq!(url.query(), Some("a=1&x=9&d=4"));
}

#[test]
fn fragment_params_schema_reads_and_writes_a_query_shaped_fragment() {
    let mut url = Url::parse("https://example.com/callback#access_token=abc&state=xyz").unwrap();
    {
        let view = url.key_value_pairs(UrlComponent::Fragment, Schema::fragment_params());
        let pairs: Vec<_> = view.collect();
        assert_eq!(
            pairs,
            vec![
                ("access_token".to_string(), "abc".to_string()),
                ("state".to_string(), "xyz".to_string()),
            ]
        );
    }
    url.key_value_pairs_mut(UrlComponent::Fragment, Schema::fragment_params())
        .append("extra", "1");
    assert_eq!(url.fragment(), Some("access_token=abc&state=xyz&extra=1"));
}

#[test]
fn get_on_absent_component_is_none() {
    let mut url = Url::parse("https://example.com/").unwrap();
    assert_eq!(url.query_pairs_mut().get("a"), None);
}

#[test]
fn clearing_a_fragment_makes_it_absent_not_empty() {
    let mut url = Url::parse("https://example.com/#a=1").unwrap();
    url.key_value_pairs_mut(UrlComponent::Fragment, Schema::fragment_params()).clear();
    assert_eq!(url.fragment(), None);
    assert_eq!(url.as_str(), "https://example.com/");
}
