//! Form-style query-string helpers (`application/x-www-form-urlencoded`).

use std::borrow::Cow;

/// Split a raw query string into decoded `(key, value)` pairs, preserving order.
/// A leading `?` is ignored, empty segments are skipped, and a key without `=`
/// yields an empty value.
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.strip_prefix('?')
        .unwrap_or(raw)
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Join pairs into `k=v&k=v`, percent-encoding both sides.
pub fn encode_query<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_component(raw: &str) -> String {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        // Invalid UTF-8 after decoding: keep the raw text rather than dropping the pair.
        Err(_) => spaced.into_owned(),
    }
}
