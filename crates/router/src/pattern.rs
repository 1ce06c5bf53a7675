//! Route path patterns.
//!
//! A pattern is split on `/` into segments of three kinds:
//!
//! - literal: `/baskets` matches exactly `baskets`
//! - named: `/:id` matches exactly one non-empty segment and binds it to `id`
//! - wildcard: `/*content` matches the non-empty remainder of the path, slashes included
//!
//! A trailing `/` is significant and is kept as an empty literal final segment, so
//! `/baskets` and `/baskets/` are two different patterns.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One `/`-delimited unit of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Named(String),
    Wildcard(String),
}

impl Segment {
    /// Returns the parameter name of a named or wildcard segment.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Named(name) | Segment::Wildcard(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(literal) => f.write_str(literal),
            Segment::Named(name) => write!(f, ":{name}"),
            Segment::Wildcard(name) => write!(f, "*{name}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("path must start with '/'")]
    MissingLeadingSlash,

    #[error("empty segment at position {position}")]
    EmptySegment { position: usize },

    #[error("parameter at position {position} has no name")]
    EmptyParamName { position: usize },

    #[error("invalid parameter name '{name}'")]
    InvalidParamName { name: String },

    #[error("wildcard '*{name}' must be the last segment")]
    WildcardNotLast { name: String },

    #[error("parameter '{name}' is declared more than once")]
    DuplicateParam { name: String },
}

/// A parsed route path such as `/doc/:version/*content`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let rest = raw.strip_prefix('/').ok_or(PatternError::MissingLeadingSlash)?;

        let parts: Vec<&str> = rest.split('/').collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());

        for (position, part) in parts.into_iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                Segment::Named(validate_name(name, position)?)
            } else if let Some(name) = part.strip_prefix('*') {
                let name = validate_name(name, position)?;
                if position != last {
                    return Err(PatternError::WildcardNotLast { name });
                }
                Segment::Wildcard(name)
            } else if part.is_empty() && position != last {
                return Err(PatternError::EmptySegment { position });
            } else {
                Segment::Literal(part.to_owned())
            };

            if let Some(name) = segment.param_name() {
                if segments.iter().any(|s: &Segment| s.param_name() == Some(name)) {
                    return Err(PatternError::DuplicateParam { name: name.to_owned() });
                }
            }
            segments.push(segment);
        }

        Ok(Self { raw: raw.to_owned(), segments })
    }

    /// Appends a child pattern to this one, as nested route groups do.
    ///
    /// `/doc/:version` joined with `/*content` gives `/doc/:version/*content`; a parent
    /// ending in `/` does not produce a doubled slash.
    pub fn join(&self, child: &str) -> Result<Self, PatternError> {
        if !child.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }
        let base = self.raw.trim_end_matches('/');
        Self::parse(&format!("{base}{child}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the named and wildcard segments, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    pub fn param_count(&self) -> usize {
        self.param_names().count()
    }

    pub fn has_trailing_slash(&self) -> bool {
        self.raw.len() > 1 && self.raw.ends_with('/')
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn validate_name(name: &str, position: usize) -> Result<String, PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyParamName { position });
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        return Err(PatternError::InvalidParamName { name: name.to_owned() });
    }
    Ok(name.to_owned())
}
