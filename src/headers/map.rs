use super::{HeaderName, HeaderValue};

/// HTTP Headers Multimap.
///
/// Lookup is ASCII case-insensitive. Iteration follows the first-insertion
/// order of each distinct name, with the name spelled as first seen.
#[derive(Clone, Default)]
pub struct HeaderMap {
    entries: Vec<Entry>,
    /// total number of values across all entries
    len: usize,
}

#[derive(Clone, Debug)]
struct Entry {
    name: HeaderName,
    values: Vec<HeaderValue>,
}

impl HeaderMap {
    /// Create new empty [`HeaderMap`].
    ///
    /// This function does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self { entries: Vec::new(), len: 0 }
    }

    /// Create new empty [`HeaderMap`] with at least the specified capacity of
    /// distinct names.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Returns the total number of header values.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map has no element.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn entry<K: AsHeaderName>(&self, name: K) -> Option<&Entry> {
        let name = name.as_name_str();
        self.entries.iter().find(|e| e.name.eq_ignore_case(name))
    }

    /// Returns `true` if the map contains a value for the given header name.
    #[inline]
    pub fn contains_key<K: AsHeaderName>(&self, name: K) -> bool {
        self.entry(name).is_some()
    }

    /// Returns a reference to the first header value corresponding to the
    /// given header name.
    #[inline]
    pub fn get<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        self.entry(name).and_then(|e| e.values.first())
    }

    /// Returns an iterator over all header values corresponding to the given
    /// header name, in append order.
    ///
    /// The iterator is empty when the name is absent.
    #[inline]
    pub fn get_all<K: AsHeaderName>(&self, name: K) -> GetAll<'_> {
        GetAll {
            inner: self.entry(name).map(|e| e.values.iter()),
        }
    }

    /// Returns an iterator over headers as name and value pairs.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            entries: self.entries.iter(),
            current: None,
        }
    }

    /// Append a header name and value into the map.
    ///
    /// If the name is already present, the value is appended to its values
    /// and the original spelling of the name is kept.
    pub fn append<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        let name = name.into_header_name();
        self.len += 1;
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.values.push(value),
            None => self.entries.push(Entry { name, values: vec![value] }),
        }
    }

    /// Inserts a header name and value into the map.
    ///
    /// If the map did have this name present, all its values are replaced and
    /// the first previous value is returned.
    pub fn insert<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) -> Option<HeaderValue> {
        let name = name.into_header_name();
        self.len += 1;
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                self.len -= entry.values.len();
                let mut values = std::mem::replace(&mut entry.values, vec![value]);
                Some(values.swap_remove(0))
            }
            None => {
                self.entries.push(Entry { name, values: vec![value] });
                None
            }
        }
    }

    /// Removes a header from the map, returning the first header value if the
    /// name was present.
    ///
    /// Any extra values of the name are dropped.
    pub fn remove<K: AsHeaderName>(&mut self, name: K) -> Option<HeaderValue> {
        let name = name.as_name_str();
        let index = self.entries.iter().position(|e| e.name.eq_ignore_case(name))?;
        let entry = self.entries.remove(index);
        self.len -= entry.values.len();
        entry.values.into_iter().next()
    }

    /// Clear the map, removing all values while keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }
}

impl std::fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ===== Iterators =====

/// Iterator over the values of one header name, see [`HeaderMap::get_all`].
#[derive(Debug)]
pub struct GetAll<'a> {
    inner: Option<std::slice::Iter<'a, HeaderValue>>,
}

impl<'a> Iterator for GetAll<'a> {
    type Item = &'a HeaderValue;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Some(iter) => iter.size_hint(),
            None => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for GetAll<'_> {}

/// Iterator over header name and value pairs, see [`HeaderMap::iter`].
#[derive(Debug)]
pub struct Iter<'a> {
    entries: std::slice::Iter<'a, Entry>,
    current: Option<(&'a HeaderName, std::slice::Iter<'a, HeaderValue>)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a HeaderName, &'a HeaderValue);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((name, values)) = &mut self.current
                && let Some(value) = values.next()
            {
                return Some((name, value));
            }
            let entry = self.entries.next()?;
            self.current = Some((&entry.name, entry.values.iter()));
        }
    }
}

// ===== Ref Traits =====

/// A type that can be used as a [`HeaderMap`] lookup key.
#[allow(private_bounds)]
pub trait AsHeaderName: SealedRef {}

trait SealedRef {
    fn as_name_str(&self) -> &str;
}

impl AsHeaderName for &str {}
impl SealedRef for &str {
    #[inline]
    fn as_name_str(&self) -> &str {
        self
    }
}

impl AsHeaderName for HeaderName {}
impl SealedRef for HeaderName {
    #[inline]
    fn as_name_str(&self) -> &str {
        self.as_str()
    }
}

impl<K: AsHeaderName + SealedRef> AsHeaderName for &K {}
impl<S: SealedRef> SealedRef for &S {
    #[inline]
    fn as_name_str(&self) -> &str {
        S::as_name_str(self)
    }
}

// ===== Owned Traits =====

/// A type that can be used for name consuming [`HeaderMap`] operations.
#[allow(private_bounds)]
pub trait IntoHeaderName: Sealed {}

trait Sealed {
    fn into_header_name(self) -> HeaderName;
}

impl IntoHeaderName for &'static str {}
impl Sealed for &'static str {
    /// # Panics
    ///
    /// Panics if the input is not a valid header name, use the provided
    /// constants or [`HeaderName`] parsing for arbitrary input.
    #[inline]
    fn into_header_name(self) -> HeaderName {
        match HeaderName::from_bytes(self.as_bytes()) {
            Ok(ok) => ok,
            Err(err) => err.panic_const(),
        }
    }
}

impl IntoHeaderName for HeaderName {}
impl Sealed for HeaderName {
    #[inline]
    fn into_header_name(self) -> HeaderName {
        self
    }
}
