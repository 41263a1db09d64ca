// Canonical text form of a placement's attributes, and the grouping
// signature for placements that predate stable feed ids.

use crate::attrs::AttributeMap;

/// Directive name reconstructed in the admin listing, e.g. `[feed id="3"]`.
pub const DIRECTIVE_NAME: &str = "feed";

/// Canonical attribute order for encoding and signatures. Keys not listed
/// here follow in alphabetical order, so output never depends on the
/// insertion order of the source map.
pub const CANONICAL_KEYS: &[&str] = &[
    "feed", "type", "userid", "num", "layout", "cols", "width", "height", "class",
];

/// Keys excluded from legacy grouping signatures, version 1. The raw `feed`
/// pointer identifies an owner on its own and must never fragment a group.
/// Adding a new volatile placement attribute requires a new version of this
/// list, otherwise existing groups silently split.
pub const SIGNATURE_EXCLUDED_KEYS_V1: &[&str] = &["feed"];

/// Default legacy feed type; the `type` attribute overrides it in listings
/// when present and different.
pub const DEFAULT_FEED_TYPE: &str = "user";

/// Attribute carrying the account identifier used for legacy display-name
/// lookups.
pub const ACCOUNT_ID_KEY: &str = "userid";

/// Attribute carrying the feed type shown in legacy listings.
pub const FEED_TYPE_KEY: &str = "type";

/// Deterministic one-way directive string: `[name key="value" ...]` over
/// the non-empty entries in canonical key order. Double quotes in values
/// are entity-escaped so the result embeds safely in markup.
pub fn encode(name: &str, attrs: &AttributeMap) -> String {
    let mut out = String::from("[");
    out.push_str(name);
    for (key, value) in ordered_entries(attrs) {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(&value.render()));
        out.push('"');
    }
    out.push(']');
    out
}

/// Stable grouping key: non-empty entries in canonical order, minus
/// `excluded` keys, joined as `key=value&key=value`. Two placements with
/// identical non-excluded attributes always produce identical signatures.
pub fn signature(attrs: &AttributeMap, excluded: &[&str]) -> String {
    let parts: Vec<String> = ordered_entries(attrs)
        .into_iter()
        .filter(|(key, _)| !excluded.contains(key))
        .map(|(key, value)| format!("{}={}", key, value.render()))
        .collect();
    parts.join("&")
}

fn ordered_entries<'a>(attrs: &'a AttributeMap) -> Vec<(&'a str, &'a crate::attrs::AttrValue)> {
    let mut entries: Vec<_> = attrs.non_empty_entries().collect();
    entries.sort_by_key(|(key, _)| {
        match CANONICAL_KEYS.iter().position(|c| c == key) {
            Some(pos) => (pos, ""),
            None => (CANONICAL_KEYS.len(), *key),
        }
    });
    entries
}

fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}
