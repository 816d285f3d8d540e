use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Append-only storage handing out typed indices.
pub struct Arena<T> {
    items: Vec<T>,
}

pub struct Id<T> {
    _marker: PhantomData<T>,
    index: usize,
}

impl<T> Id<T> {
    pub const fn new(index: usize) -> Self {
        Self {
            _marker: PhantomData,
            index,
        }
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}
impl<T> Eq for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { items: vec![] }
    }

    pub fn alloc(&mut self, item: T) -> Id<T> {
        let id = Id::new(self.items.len());
        self.items.push(item);
        id
    }

    pub fn get(&self, id: &Id<T>) -> Option<&T> {
        self.items.get(id.index)
    }

    pub fn get_mut(&mut self, id: &Id<T>) -> Option<&mut T> {
        self.items.get_mut(id.index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Arena<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_index_their_allocation() {
        let mut arena = Arena::new();
        let a = arena.alloc("lead");
        let b = arena.alloc("pedestrian");

        assert_eq!(arena.get(&a), Some(&"lead"));
        assert_eq!(arena.get(&b), Some(&"pedestrian"));
        assert_eq!(arena.len(), 2);
        assert_eq!(b.to_string(), "#1");
    }

    #[test]
    fn foreign_id_is_none() {
        let arena: Arena<u8> = Arena::new();
        assert!(arena.get(&Id::new(3)).is_none());
        assert!(arena.is_empty());
    }
}
