//! Ordered sets over [`RbTree`]: `TreeSet` and `TreeMultiSet`.

use crate::compare::{Compare, Natural};
use crate::error::InvariantViolation;
use crate::rb_tree::{self, NodeHandle, NodeId, RbTree};
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

/// In-order iterator over set keys.
pub struct Iter<'a, K> {
    it: rb_tree::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(k, _)| k)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

pub struct IntoIter<K> {
    it: rb_tree::IntoIter<K, ()>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K> DoubleEndedIterator for IntoIter<K> {
    fn next_back(&mut self) -> Option<K> {
        self.it.next_back().map(|(k, _)| k)
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

/// Sorted set.
pub struct TreeSet<K, C = Natural> {
    tree: RbTree<K, (), C, true>,
}

/// Sorted set that counts repeated keys.
pub struct TreeMultiSet<K, C = Natural> {
    tree: RbTree<K, (), C, false>,
}

// Surface shared by both flavors; only insertion and merge differ.
macro_rules! tree_set_common {
    ($name:ident, $unique:literal) => {
        impl<K> $name<K> {
            pub fn new() -> Self {
                Self { tree: RbTree::new() }
            }
        }

        impl<K, C> $name<K, C> {
            pub fn with_comparator(cmp: C) -> Self {
                Self {
                    tree: RbTree::with_comparator(cmp),
                }
            }

            pub fn len(&self) -> usize {
                self.tree.len()
            }

            pub fn is_empty(&self) -> bool {
                self.tree.is_empty()
            }

            pub fn tree(&self) -> &RbTree<K, (), C, $unique> {
                &self.tree
            }

            pub fn first(&self) -> Option<&K> {
                self.tree.first().and_then(|id| self.key_at(id))
            }

            pub fn last(&self) -> Option<&K> {
                self.tree.last().and_then(|id| self.key_at(id))
            }

            pub fn key_at(&self, id: NodeId) -> Option<&K> {
                self.tree.get(id).map(|(k, _)| k)
            }

            pub fn pop_first(&mut self) -> Option<K> {
                self.tree.pop_first().map(|(k, _)| k)
            }

            pub fn pop_last(&mut self) -> Option<K> {
                self.tree.pop_last().map(|(k, _)| k)
            }

            pub fn remove_at(&mut self, id: NodeId) -> Option<K> {
                self.tree.remove(id).map(|(k, _)| k)
            }

            pub fn extract_at(&mut self, id: NodeId) -> Option<NodeHandle<K, ()>> {
                self.tree.extract(id)
            }

            pub fn clear(&mut self) {
                self.tree.clear();
            }

            pub fn swap(&mut self, other: &mut Self) {
                self.tree.swap(&mut other.tree);
            }

            pub fn iter(&self) -> Iter<'_, K> {
                Iter {
                    it: self.tree.iter(),
                }
            }

            pub fn contains<Q>(&self, q: &Q) -> bool
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.contains(q)
            }

            pub fn count<Q>(&self, q: &Q) -> usize
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.count(q)
            }

            pub fn find<Q>(&self, q: &Q) -> Option<NodeId>
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.find(q)
            }

            /// The (first) stored key equal to `q`.
            pub fn get<Q>(&self, q: &Q) -> Option<&K>
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.find(q).and_then(|id| self.key_at(id))
            }

            pub fn lower_bound<Q>(&self, q: &Q) -> Option<NodeId>
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.lower_bound(q)
            }

            pub fn upper_bound<Q>(&self, q: &Q) -> Option<NodeId>
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.upper_bound(q)
            }

            pub fn range_of<Q>(&self, q: &Q) -> Iter<'_, K>
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                Iter {
                    it: self.tree.equal_range(q),
                }
            }

            /// Removes every key equal to `q`; returns how many.
            pub fn remove<Q>(&mut self, q: &Q) -> usize
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.remove_key(q)
            }

            /// Removes and returns the (first) stored key equal to `q`.
            pub fn take<Q>(&mut self, q: &Q) -> Option<K>
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.extract_key(q).map(|n| n.into_parts().0)
            }

            pub fn extract<Q>(&mut self, q: &Q) -> Option<NodeHandle<K, ()>>
            where
                K: Borrow<Q>,
                Q: ?Sized,
                C: Compare<Q>,
            {
                self.tree.extract_key(q)
            }
        }

        impl<K, C: Compare<K>> $name<K, C> {
            pub fn check_invariants(&self) -> Result<usize, InvariantViolation> {
                self.tree.check_invariants()
            }
        }

        impl<K, C: Default> Default for $name<K, C> {
            fn default() -> Self {
                Self::with_comparator(C::default())
            }
        }

        impl<K: Clone, C: Clone> Clone for $name<K, C> {
            fn clone(&self) -> Self {
                Self {
                    tree: self.tree.clone(),
                }
            }
        }

        impl<K: fmt::Debug, C> fmt::Debug for $name<K, C> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }

        impl<K: PartialEq, C> PartialEq for $name<K, C> {
            fn eq(&self, other: &Self) -> bool {
                self.tree == other.tree
            }
        }

        impl<K: Eq, C> Eq for $name<K, C> {}

        impl<K, C: Compare<K>> Extend<K> for $name<K, C> {
            fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
                self.tree.extend(iter.into_iter().map(|k| (k, ())));
            }
        }

        impl<K, C: Compare<K> + Default> FromIterator<K> for $name<K, C> {
            fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
                let mut set = Self::default();
                set.extend(iter);
                set
            }
        }

        impl<K, C> IntoIterator for $name<K, C> {
            type Item = K;
            type IntoIter = IntoIter<K>;

            fn into_iter(self) -> IntoIter<K> {
                IntoIter {
                    it: self.tree.into_iter(),
                }
            }
        }

        impl<'a, K, C> IntoIterator for &'a $name<K, C> {
            type Item = &'a K;
            type IntoIter = Iter<'a, K>;

            fn into_iter(self) -> Iter<'a, K> {
                self.iter()
            }
        }
    };
}

tree_set_common!(TreeSet, true);
tree_set_common!(TreeMultiSet, false);

impl<K, C: Compare<K>> TreeSet<K, C> {
    /// Returns whether `key` was newly inserted.
    pub fn insert(&mut self, key: K) -> bool {
        self.tree.insert(key, ()).1
    }

    pub fn insert_with_hint(&mut self, hint: Option<NodeId>, key: K) -> (NodeId, bool) {
        self.tree.insert_with_hint(hint, key, ())
    }

    /// Gives the node back in `Err` when an equal key is present.
    pub fn insert_node(&mut self, node: NodeHandle<K, ()>) -> Result<NodeId, NodeHandle<K, ()>> {
        let ret = self.tree.insert_node(node);
        match ret.node {
            Some(rejected) => Err(rejected),
            None => Ok(ret.position),
        }
    }

    pub fn merge<C2>(&mut self, other: &mut TreeSet<K, C2>) {
        self.tree.merge(&mut other.tree);
    }

    pub fn merge_multi<C2>(&mut self, other: &mut TreeMultiSet<K, C2>) {
        self.tree.merge(&mut other.tree);
    }
}

impl<K, C: Compare<K>> TreeMultiSet<K, C> {
    /// Always inserts, after any equal keys.
    pub fn insert(&mut self, key: K) -> NodeId {
        self.tree.insert(key, ()).0
    }

    pub fn insert_with_hint(&mut self, hint: Option<NodeId>, key: K) -> NodeId {
        self.tree.insert_with_hint(hint, key, ()).0
    }

    pub fn insert_node(&mut self, node: NodeHandle<K, ()>) -> NodeId {
        self.tree.insert_node(node).position
    }

    /// Removes one key equal to `q`, if any.
    pub fn remove_one<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.take(q).is_some()
    }

    pub fn merge<C2>(&mut self, other: &mut TreeMultiSet<K, C2>) {
        self.tree.merge(&mut other.tree);
    }

    pub fn merge_unique<C2>(&mut self, other: &mut TreeSet<K, C2>) {
        self.tree.merge(&mut other.tree);
    }
}
