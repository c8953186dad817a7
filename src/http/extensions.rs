use std::any::{Any, TypeId};
use std::collections::HashMap;

type AnyMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// HTTP Extensions.
///
/// A typed map carried by a request for out of band data, e.g the connection
/// metadata recorded by the server.
#[derive(Default)]
pub struct Extensions {
    map: Option<Box<AnyMap>>,
}

impl Extensions {
    /// Create new [`Extensions`].
    ///
    /// This function does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self { map: None }
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.map.as_ref().map(|map| map.len()).unwrap_or_default()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the value corresponding to the type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .as_ref()
            .and_then(|map| map.get(&TypeId::of::<T>()))
            .and_then(|ok| ok.downcast_ref())
    }

    /// Returns a mutable reference to the value corresponding to the type.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.map
            .as_mut()
            .and_then(|map| map.get_mut(&TypeId::of::<T>()))
            .and_then(|ok| ok.downcast_mut())
    }

    /// Inserts a value into the map, returning the previous value of the same
    /// type if any.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .get_or_insert_default()
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|ok| ok.downcast().map(|e| *e).ok())
    }

    /// Removes and returns the value at the type if the type was previously in
    /// the map.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.map
            .as_mut()
            .and_then(|map| map.remove(&TypeId::of::<T>()))
            .and_then(|ok| ok.downcast().map(|e| *e).ok())
    }

    /// Clear the map.
    pub fn clear(&mut self) {
        if let Some(map) = &mut self.map {
            map.clear();
        }
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions").field("len", &self.len()).finish()
    }
}
