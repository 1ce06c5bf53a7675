/// Path parameters extracted from a request path, in pattern order.
///
/// Named segments contribute one value each; a wildcard contributes the remainder of the
/// path. Values are percent-decoded and owned, so the set can outlive the borrowed request
/// path and be kept in a pooled dispatch context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: Vec<(String, String)>,
}

impl PathParams {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Gets the value of a path parameter by its name
    #[inline]
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.inner.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Removes every pair but keeps the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(n, v)| (n.to_owned(), v.to_owned())).collect() }
    }
}
