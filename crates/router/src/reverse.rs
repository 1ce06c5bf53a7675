//! Reverse URL generation: from a route name and arguments back to a path.

use crate::pattern::Segment;
use crate::{ReverseUrlError, Route};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

/// Everything but RFC 3986 unreserved characters is escaped inside a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Appends a parameter value. Named values form one segment; wildcard values keep their `/`.
fn push_value(path: &mut String, segment: &Segment, value: &str) {
    match segment {
        Segment::Wildcard(_) => {
            for (i, part) in value.split('/').enumerate() {
                if i > 0 {
                    path.push('/');
                }
                path.extend(utf8_percent_encode(part, SEGMENT));
            }
        }
        _ => path.extend(utf8_percent_encode(value, SEGMENT)),
    }
}

/// Splits `name#anchor` into the route name and its anchor.
pub(crate) fn split_anchor(name: &str) -> (&str, Option<&str>) {
    match name.split_once('#') {
        Some((name, anchor)) => (name, Some(anchor)),
        None => (name, None),
    }
}

impl Route {
    /// Builds the path of this route, filling parameters from `args` in declaration order.
    ///
    /// Fails when an argument is missing or empty, or when more arguments are given than
    /// the pattern has parameters.
    pub fn reverse_path<I>(&self, args: I) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let mut args = args.into_iter();
        let mut path = String::with_capacity(self.path().len() + 16);

        for segment in self.pattern.segments() {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Named(name) | Segment::Wildcard(name) => {
                    let value = args
                        .next()
                        .ok_or_else(|| ReverseUrlError::missing_argument(&self.name, name))?
                        .to_string();
                    if value.is_empty() {
                        return Err(ReverseUrlError::empty_argument(&self.name, name));
                    }
                    push_value(&mut path, segment, &value);
                }
            }
        }

        let surplus = args.count();
        if surplus > 0 {
            let expected = self.pattern.param_count();
            return Err(ReverseUrlError::TooManyArguments {
                route: self.name.clone(),
                expected,
                given: expected + surplus,
            });
        }

        Ok(path)
    }

    /// Builds the path of this route, filling parameters by name.
    ///
    /// Entries that name no parameter are appended as a query string, sorted by key.
    pub fn reverse_path_with_map<I, K, V>(&self, args: I) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut args: BTreeMap<String, String> = args.into_iter().map(|(k, v)| (k.into(), v.to_string())).collect();
        let mut path = String::with_capacity(self.path().len() + 16);

        for segment in self.pattern.segments() {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Named(name) | Segment::Wildcard(name) => {
                    let value = args.remove(name).ok_or_else(|| ReverseUrlError::missing_argument(&self.name, name))?;
                    if value.is_empty() {
                        return Err(ReverseUrlError::empty_argument(&self.name, name));
                    }
                    push_value(&mut path, segment, &value);
                }
            }
        }

        if !args.is_empty() {
            path.push('?');
            path.push_str(&serde_urlencoded::to_string(&args)?);
        }

        Ok(path)
    }
}
