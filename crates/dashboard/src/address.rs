//! The dashboard's own addressable location (what a shared link reproduces).

use common::filters::FilterParams;
use common::query::{encode_query, parse_query};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAddress {
    /// `scheme://host[:port]`, empty for a relative address.
    origin: String,
    path: String,
    pairs: Vec<(String, String)>,
    fragment: Option<String>,
}

impl PageAddress {
    /// Accepts `http://host/path?query#frag`, `/path?query`, or a bare `?query`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, frag)) => (rest, Some(frag.to_string())),
            None => (raw, None),
        };
        let (location, query) = rest.split_once('?').unwrap_or((rest, ""));

        let (origin, path) = match location.find("://") {
            Some(scheme_end) => {
                let after_scheme = scheme_end + 3;
                match location[after_scheme..].find('/') {
                    Some(slash) => location.split_at(after_scheme + slash),
                    None => (location, ""),
                }
            }
            None => ("", location),
        };

        Self {
            origin: origin.to_string(),
            path: if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            },
            pairs: parse_query(query),
            fragment,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn query_string(&self) -> String {
        encode_query(&self.pairs)
    }

    /// Write all five filter values into the query, replacing the current
    /// address in place. Each key follows `URLSearchParams.set`: the first
    /// occurrence is overwritten where it stands, later duplicates are dropped,
    /// and a missing key is appended. Unrelated keys are left untouched.
    pub fn replace_filter_query(&mut self, filters: &FilterParams) {
        for (key, value) in filters.query_pairs() {
            let mut seen = false;
            self.pairs.retain_mut(|(k, v)| {
                if k.as_str() != key {
                    return true;
                }
                if seen {
                    return false;
                }
                seen = true;
                v.clone_from(&value);
                true
            });
            if !seen {
                self.pairs.push((key.to_string(), value));
            }
        }
    }
}

impl fmt::Display for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.path)?;
        if !self.pairs.is_empty() {
            write!(f, "?{}", self.query_string())?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}
