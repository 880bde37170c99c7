//! RbTree: arena-backed red-black tree shared by the ordered containers.
//!
//! Nodes live in a `SlotMap` and link to each other through generational
//! [`NodeId`]s, so parent back-links carry no ownership. A missing link is
//! a black nil leaf. Instead of sentinel nodes the tree caches its leftmost
//! and rightmost ids; `None` plays the role of the end position.
//!
//! `UNIQUE = true` rejects duplicate keys (map/set). With `UNIQUE = false`
//! an equal key is placed after the existing equal keys, and `find` returns
//! the leftmost of them.
//!
//! Node ids stay valid until their node is removed; rebalancing moves
//! links, never entries.

use crate::compare::{Compare, Natural};
use crate::error::InvariantViolation;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Stable handle to a tree node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(DefaultKey);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
    color: Color,
}

type Nodes<K, V> = SlotMap<DefaultKey, Node<K, V>>;

fn min_of<K, V>(nodes: &Nodes<K, V>, mut id: NodeId) -> NodeId {
    while let Some(l) = nodes[id.0].left {
        id = l;
    }
    id
}

fn max_of<K, V>(nodes: &Nodes<K, V>, mut id: NodeId) -> NodeId {
    while let Some(r) = nodes[id.0].right {
        id = r;
    }
    id
}

fn successor<K, V>(nodes: &Nodes<K, V>, id: NodeId) -> Option<NodeId> {
    if let Some(r) = nodes[id.0].right {
        return Some(min_of(nodes, r));
    }
    let mut child = id;
    let mut parent = nodes[id.0].parent;
    while let Some(p) = parent {
        if nodes[p.0].right != Some(child) {
            break;
        }
        child = p;
        parent = nodes[p.0].parent;
    }
    parent
}

fn predecessor<K, V>(nodes: &Nodes<K, V>, id: NodeId) -> Option<NodeId> {
    if let Some(l) = nodes[id.0].left {
        return Some(max_of(nodes, l));
    }
    let mut child = id;
    let mut parent = nodes[id.0].parent;
    while let Some(p) = parent {
        if nodes[p.0].left != Some(child) {
            break;
        }
        child = p;
        parent = nodes[p.0].parent;
    }
    parent
}

/// A node detached from its tree by `extract`. It owns the entry and can
/// be re-inserted into any tree with the same key and value types.
pub struct NodeHandle<K, V> {
    key: K,
    value: V,
}

impl<K, V> NodeHandle<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The key may be changed while the node is outside a tree.
    pub fn key_mut(&mut self) -> &mut K {
        &mut self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeHandle<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

/// Outcome of re-inserting a [`NodeHandle`].
#[derive(Debug)]
pub struct InsertReturn<K, V> {
    /// The inserted node, or the node whose key blocked the insertion.
    pub position: NodeId,
    pub inserted: bool,
    /// The handle, given back when a unique tree rejected it.
    pub node: Option<NodeHandle<K, V>>,
}

/// Red-black tree keyed by `K` under the order `C`.
pub struct RbTree<K, V, C = Natural, const UNIQUE: bool = true> {
    nodes: Nodes<K, V>,
    root: Option<NodeId>,
    leftmost: Option<NodeId>,
    rightmost: Option<NodeId>,
    cmp: C,
}

impl<K, V, C: Default, const UNIQUE: bool> RbTree<K, V, C, UNIQUE> {
    pub fn new() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C: Default, const UNIQUE: bool> Default for RbTree<K, V, C, UNIQUE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, const UNIQUE: bool> RbTree<K, V, C, UNIQUE> {
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            leftmost: None,
            rightmost: None,
            cmp,
        }
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Smallest node (`begin()`).
    #[inline]
    pub fn first(&self) -> Option<NodeId> {
        self.leftmost
    }

    /// Largest node.
    #[inline]
    pub fn last(&self) -> Option<NodeId> {
        self.rightmost
    }

    /// In-order successor. `None` for the last node or a stale id.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        if !self.nodes.contains_key(id.0) {
            return None;
        }
        successor(&self.nodes, id)
    }

    /// In-order predecessor. `None` for the first node or a stale id.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        if !self.nodes.contains_key(id.0) {
            return None;
        }
        predecessor(&self.nodes, id)
    }

    pub fn get(&self, id: NodeId) -> Option<(&K, &V)> {
        self.nodes.get(id.0).map(|n| (&n.key, &n.value))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<(&K, &mut V)> {
        self.nodes.get_mut(id.0).map(|n| (&n.key, &mut n.value))
    }

    pub fn contains_id(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id.0)
    }

    /// # Panics
    /// Panics if `id` is stale.
    pub(crate) fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.nodes[id.0].value
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.leftmost,
            back: self.rightmost,
            remaining: self.len(),
        }
    }

    /// In-order iterator with mutable values. The in-order positions are
    /// collected up front so the arena can be borrowed mutably once.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let mut rank = SecondaryMap::with_capacity(self.len());
        for (i, (id, _)) in self.iter_ids().enumerate() {
            rank.insert(id.0, i);
        }
        let mut slots: Vec<Option<(&K, &mut V)>> = Vec::with_capacity(self.len());
        slots.resize_with(self.len(), || None);
        for (key, node) in self.nodes.iter_mut() {
            if let Some(&i) = rank.get(key) {
                slots[i] = Some((&node.key, &mut node.value));
            }
        }
        IterMut {
            it: slots.into_iter().flatten(),
        }
    }

    fn iter_ids(&self) -> impl Iterator<Item = (NodeId, &K)> + '_ {
        let mut cur = self.leftmost;
        core::iter::from_fn(move || {
            let id = cur?;
            cur = successor(&self.nodes, id);
            Some((id, &self.nodes[id.0].key))
        })
    }

    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        self.cursor(self.leftmost)
    }

    pub fn cursor_back(&self) -> Cursor<'_, K, V> {
        self.cursor(self.rightmost)
    }

    /// Cursor at the end position, one past the last node.
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        self.cursor(None)
    }

    /// `None` if `id` is stale.
    pub fn cursor_at(&self, id: NodeId) -> Option<Cursor<'_, K, V>> {
        self.nodes.contains_key(id.0).then(|| self.cursor(Some(id)))
    }

    fn cursor(&self, current: Option<NodeId>) -> Cursor<'_, K, V> {
        Cursor {
            nodes: &self.nodes,
            leftmost: self.leftmost,
            rightmost: self.rightmost,
            current,
        }
    }

    /// Removes the node `id` and returns its entry.
    pub fn remove(&mut self, id: NodeId) -> Option<(K, V)> {
        self.extract(id).map(NodeHandle::into_parts)
    }

    /// Detaches the node `id` from the tree.
    pub fn extract(&mut self, id: NodeId) -> Option<NodeHandle<K, V>> {
        if !self.nodes.contains_key(id.0) {
            return None;
        }
        let node = self.detach(id)?;
        Some(NodeHandle {
            key: node.key,
            value: node.value,
        })
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.leftmost.and_then(|id| self.remove(id))
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.rightmost.and_then(|id| self.remove(id))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.leftmost = None;
        self.rightmost = None;
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id.0]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id.0]
    }

    #[inline]
    fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    #[inline]
    fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    #[inline]
    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Nil leaves are black.
    #[inline]
    fn is_red(&self, link: Option<NodeId>) -> bool {
        link.map_or(false, |id| self.node(id).color == Color::Red)
    }

    #[inline]
    fn paint(&mut self, link: Option<NodeId>, color: Color) {
        if let Some(id) = link {
            self.node_mut(id).color = color;
        }
    }

    /// Puts `v` where `u` hangs from its parent.
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let up = self.parent(u);
        match up {
            None => self.root = v,
            Some(p) if self.left(p) == Some(u) => self.node_mut(p).left = v,
            Some(p) => self.node_mut(p).right = v,
        }
        if let Some(v) = v {
            self.node_mut(v).parent = up;
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let Some(y) = self.right(x) else {
            return;
        };
        let y_left = self.left(y);
        self.node_mut(x).right = y_left;
        if let Some(yl) = y_left {
            self.node_mut(yl).parent = Some(x);
        }
        self.transplant(x, Some(y));
        self.node_mut(y).left = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    fn rotate_right(&mut self, x: NodeId) {
        let Some(y) = self.left(x) else {
            return;
        };
        let y_right = self.right(y);
        self.node_mut(x).left = y_right;
        if let Some(yr) = y_right {
            self.node_mut(yr).parent = Some(x);
        }
        self.transplant(x, Some(y));
        self.node_mut(y).right = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    /// Links a new red node below `parent` and restores the colors.
    fn attach(&mut self, parent: Option<NodeId>, as_left: bool, key: K, value: V) -> NodeId {
        let id = NodeId(self.nodes.insert(Node {
            key,
            value,
            left: None,
            right: None,
            parent,
            color: Color::Red,
        }));
        match parent {
            None => {
                self.root = Some(id);
                self.leftmost = Some(id);
                self.rightmost = Some(id);
            }
            Some(p) if as_left => {
                self.node_mut(p).left = Some(id);
                if self.leftmost == Some(p) {
                    self.leftmost = Some(id);
                }
            }
            Some(p) => {
                self.node_mut(p).right = Some(id);
                if self.rightmost == Some(p) {
                    self.rightmost = Some(id);
                }
            }
        }
        self.rebalance_for_attach(id);
        id
    }

    fn rebalance_for_attach(&mut self, mut x: NodeId) {
        while let Some(p) = self.parent(x) {
            if !self.is_red(Some(p)) {
                break;
            }
            // a red node is never the root, so the grandparent exists
            let Some(g) = self.parent(p) else {
                break;
            };
            if self.left(g) == Some(p) {
                let uncle = self.right(g);
                if self.is_red(uncle) {
                    self.paint(Some(p), Color::Black);
                    self.paint(uncle, Color::Black);
                    self.paint(Some(g), Color::Red);
                    x = g;
                } else {
                    let p = if self.right(p) == Some(x) {
                        self.rotate_left(p);
                        x
                    } else {
                        p
                    };
                    self.paint(Some(p), Color::Black);
                    self.paint(Some(g), Color::Red);
                    self.rotate_right(g);
                    break;
                }
            } else {
                let uncle = self.left(g);
                if self.is_red(uncle) {
                    self.paint(Some(p), Color::Black);
                    self.paint(uncle, Color::Black);
                    self.paint(Some(g), Color::Red);
                    x = g;
                } else {
                    let p = if self.left(p) == Some(x) {
                        self.rotate_right(p);
                        x
                    } else {
                        p
                    };
                    self.paint(Some(p), Color::Black);
                    self.paint(Some(g), Color::Red);
                    self.rotate_left(g);
                    break;
                }
            }
        }
        let root = self.root;
        self.paint(root, Color::Black);
    }

    /// Unlinks `z`, splicing in its in-order successor when it has two
    /// children, then restores the colors and frees the slot.
    fn detach(&mut self, z: NodeId) -> Option<Node<K, V>> {
        if self.leftmost == Some(z) {
            self.leftmost = successor(&self.nodes, z);
        }
        if self.rightmost == Some(z) {
            self.rightmost = predecessor(&self.nodes, z);
        }

        let (z_left, z_right) = (self.left(z), self.right(z));
        let mut removed_color = self.node(z).color;
        let x;
        let x_parent;
        match (z_left, z_right) {
            (None, _) => {
                x = z_right;
                x_parent = self.parent(z);
                self.transplant(z, z_right);
            }
            (Some(_), None) => {
                x = z_left;
                x_parent = self.parent(z);
                self.transplant(z, z_left);
            }
            (Some(zl), Some(zr)) => {
                let y = min_of(&self.nodes, zr);
                removed_color = self.node(y).color;
                x = self.right(y);
                if self.parent(y) == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.parent(y);
                    self.transplant(y, x);
                    self.node_mut(y).right = Some(zr);
                    self.node_mut(zr).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(zl);
                self.node_mut(zl).parent = Some(y);
                let z_color = self.node(z).color;
                self.node_mut(y).color = z_color;
            }
        }
        if removed_color == Color::Black {
            self.rebalance_for_detach(x, x_parent);
        }
        self.nodes.remove(z.0)
    }

    /// `x` carries an extra black; push it up or absorb it by rotation.
    fn rebalance_for_detach(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else {
                break;
            };
            if self.left(p) == x {
                // the sibling side is at least one black deeper
                let Some(mut w) = self.right(p) else {
                    break;
                };
                if self.is_red(Some(w)) {
                    self.paint(Some(w), Color::Black);
                    self.paint(Some(p), Color::Red);
                    self.rotate_left(p);
                    w = match self.right(p) {
                        Some(w) => w,
                        None => break,
                    };
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.paint(Some(w), Color::Red);
                    x = Some(p);
                    parent = self.parent(p);
                } else {
                    if !self.is_red(self.right(w)) {
                        let near = self.left(w);
                        self.paint(near, Color::Black);
                        self.paint(Some(w), Color::Red);
                        self.rotate_right(w);
                        w = match self.right(p) {
                            Some(w) => w,
                            None => break,
                        };
                    }
                    let parent_color = self.node(p).color;
                    self.paint(Some(w), parent_color);
                    self.paint(Some(p), Color::Black);
                    let far = self.right(w);
                    self.paint(far, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                    break;
                }
            } else {
                let Some(mut w) = self.left(p) else {
                    break;
                };
                if self.is_red(Some(w)) {
                    self.paint(Some(w), Color::Black);
                    self.paint(Some(p), Color::Red);
                    self.rotate_right(p);
                    w = match self.left(p) {
                        Some(w) => w,
                        None => break,
                    };
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.paint(Some(w), Color::Red);
                    x = Some(p);
                    parent = self.parent(p);
                } else {
                    if !self.is_red(self.left(w)) {
                        let near = self.right(w);
                        self.paint(near, Color::Black);
                        self.paint(Some(w), Color::Red);
                        self.rotate_left(w);
                        w = match self.left(p) {
                            Some(w) => w,
                            None => break,
                        };
                    }
                    let parent_color = self.node(p).color;
                    self.paint(Some(w), parent_color);
                    self.paint(Some(p), Color::Black);
                    let far = self.left(w);
                    self.paint(far, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                    break;
                }
            }
        }
        self.paint(x, Color::Black);
    }

    /// Iterator over the nodes from `lo` up to, not including, `hi`.
    fn iter_between(&self, lo: Option<NodeId>, hi: Option<NodeId>) -> Iter<'_, K, V> {
        let mut remaining = 0;
        let mut cur = lo;
        let mut back = None;
        while let Some(id) = cur {
            if Some(id) == hi {
                break;
            }
            remaining += 1;
            back = Some(id);
            cur = successor(&self.nodes, id);
        }
        Iter {
            nodes: &self.nodes,
            front: lo,
            back,
            remaining,
        }
    }

    /// Leftmost node whose key is not less than `q`.
    pub fn lower_bound<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut result = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            if self.cmp.compare(self.node(id).key.borrow(), q) == Ordering::Less {
                cur = self.right(id);
            } else {
                result = Some(id);
                cur = self.left(id);
            }
        }
        result
    }

    /// Leftmost node whose key is greater than `q`.
    pub fn upper_bound<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut result = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            if self.cmp.compare(q, self.node(id).key.borrow()) == Ordering::Less {
                result = Some(id);
                cur = self.left(id);
            } else {
                cur = self.right(id);
            }
        }
        result
    }

    /// A node with key equal to `q`; in multi trees, the leftmost one.
    pub fn find<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut found = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            match self.cmp.compare(q, self.node(id).key.borrow()) {
                Ordering::Less => cur = self.left(id),
                Ordering::Greater => cur = self.right(id),
                Ordering::Equal if UNIQUE => return Some(id),
                Ordering::Equal => {
                    found = Some(id);
                    cur = self.left(id);
                }
            }
        }
        found
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(q).is_some()
    }

    /// All entries with key equal to `q`, in order.
    pub fn equal_range<Q>(&self, q: &Q) -> Iter<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        if UNIQUE {
            let found = self.find(q);
            return Iter {
                nodes: &self.nodes,
                front: found,
                back: found,
                remaining: usize::from(found.is_some()),
            };
        }
        self.iter_between(self.lower_bound(q), self.upper_bound(q))
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.equal_range(q).len()
    }

    /// Removes every node with key equal to `q`; returns how many.
    pub fn remove_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let doomed: Vec<NodeId> = self.equal_range_ids(q);
        for &id in &doomed {
            self.detach(id);
        }
        doomed.len()
    }

    fn equal_range_ids<Q>(&self, q: &Q) -> Vec<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut ids = Vec::new();
        let mut cur = self.find(q);
        while let Some(id) = cur {
            if self.cmp.compare(q, self.node(id).key.borrow()) != Ordering::Equal {
                break;
            }
            ids.push(id);
            cur = if UNIQUE { None } else { successor(&self.nodes, id) };
        }
        ids
    }

    /// Detaches the first node with key equal to `q`.
    pub fn extract_key<Q>(&mut self, q: &Q) -> Option<NodeHandle<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let id = self.find(q)?;
        self.extract(id)
    }
}

impl<K, V, C: Compare<K>, const UNIQUE: bool> RbTree<K, V, C, UNIQUE> {
    /// Where `key` would be linked, or the node holding it in a unique tree.
    fn locate(&self, key: &K) -> Result<(Option<NodeId>, bool), NodeId> {
        let mut parent = None;
        let mut as_left = true;
        let mut cur = self.root;
        while let Some(id) = cur {
            parent = Some(id);
            match self.cmp.compare(key, &self.node(id).key) {
                Ordering::Less => {
                    as_left = true;
                    cur = self.left(id);
                }
                Ordering::Equal if UNIQUE => return Err(id),
                _ => {
                    as_left = false;
                    cur = self.right(id);
                }
            }
        }
        Ok((parent, as_left))
    }

    /// O(1) check that `key` fits between the hint's predecessor and the
    /// hint (`None` is the end position). Returns the attach point.
    fn check_hint(&self, hint: Option<NodeId>, key: &K) -> Option<(Option<NodeId>, bool)> {
        if let Some(h) = hint {
            if !self.nodes.contains_key(h.0) {
                return None;
            }
        }
        let prev = match hint {
            Some(h) => predecessor(&self.nodes, h),
            None => self.rightmost,
        };
        let fits_after_prev = prev.map_or(true, |p| {
            let ord = self.cmp.compare(&self.node(p).key, key);
            ord == Ordering::Less || (!UNIQUE && ord == Ordering::Equal)
        });
        let fits_before_hint = hint.map_or(true, |h| {
            let ord = self.cmp.compare(key, &self.node(h).key);
            ord == Ordering::Less || (!UNIQUE && ord == Ordering::Equal)
        });
        if !(fits_after_prev && fits_before_hint) {
            return None;
        }
        match (hint, prev) {
            (Some(h), _) if self.left(h).is_none() => Some((Some(h), true)),
            // the predecessor of a node with a left subtree has no right child
            (_, Some(p)) => Some((Some(p), false)),
            (None, None) => Some((None, true)),
            (Some(_), None) => None,
        }
    }

    /// Inserts the entry. A unique tree keeps an existing equal key and
    /// drops `value`; the returned flag tells which happened.
    pub fn insert(&mut self, key: K, value: V) -> (NodeId, bool) {
        self.try_insert_with(key, || value)
    }

    /// Like `insert`, but `make` runs only once the slot is found, before
    /// the tree is modified.
    pub fn try_insert_with<F>(&mut self, key: K, make: F) -> (NodeId, bool)
    where
        F: FnOnce() -> V,
    {
        match self.locate(&key) {
            Err(existing) => (existing, false),
            Ok((parent, as_left)) => {
                let value = make();
                (self.attach(parent, as_left, key, value), true)
            }
        }
    }

    /// Inserts using `hint` as the expected successor of the new node.
    /// A wrong hint costs a regular search.
    pub fn insert_with_hint(&mut self, hint: Option<NodeId>, key: K, value: V) -> (NodeId, bool) {
        match self.check_hint(hint, &key) {
            Some((parent, as_left)) => (self.attach(parent, as_left, key, value), true),
            None => self.insert(key, value),
        }
    }

    /// Inserts, or in a unique tree overwrites the value of the equal key.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (NodeId, Option<V>) {
        match self.locate(&key) {
            Err(existing) => {
                let old = mem::replace(&mut self.node_mut(existing).value, value);
                (existing, Some(old))
            }
            Ok((parent, as_left)) => (self.attach(parent, as_left, key, value), None),
        }
    }

    /// Re-inserts a detached node.
    pub fn insert_node(&mut self, node: NodeHandle<K, V>) -> InsertReturn<K, V> {
        match self.locate(&node.key) {
            Err(existing) => InsertReturn {
                position: existing,
                inserted: false,
                node: Some(node),
            },
            Ok((parent, as_left)) => InsertReturn {
                position: self.attach(parent, as_left, node.key, node.value),
                inserted: true,
                node: None,
            },
        }
    }

    pub fn insert_node_with_hint(
        &mut self,
        hint: Option<NodeId>,
        node: NodeHandle<K, V>,
    ) -> InsertReturn<K, V> {
        match self.check_hint(hint, &node.key) {
            Some((parent, as_left)) => InsertReturn {
                position: self.attach(parent, as_left, node.key, node.value),
                inserted: true,
                node: None,
            },
            None => self.insert_node(node),
        }
    }

    /// Moves the nodes of `other` into this tree. A unique tree leaves
    /// nodes with keys it already holds in `other`.
    pub fn merge<C2, const U2: bool>(&mut self, other: &mut RbTree<K, V, C2, U2>) {
        let before = self.len();
        let mut cur = other.first();
        while let Some(id) = cur {
            cur = other.next(id);
            let Ok((parent, as_left)) = self.locate(&other.node(id).key) else {
                continue;
            };
            if let Some(node) = other.detach(id) {
                self.attach(parent, as_left, node.key, node.value);
            }
        }
        log::trace!(
            "tree merge moved {} nodes, {} left in source",
            self.len() - before,
            other.len()
        );
    }

    /// Verifies the red-black and ordering invariants; returns the black
    /// height of the tree (nil leaves not counted).
    pub fn check_invariants(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            if !self.nodes.is_empty() {
                return Err(InvariantViolation::LengthMismatch {
                    reachable: 0,
                    stored: self.nodes.len(),
                });
            }
            if self.leftmost.is_some() || self.rightmost.is_some() {
                return Err(InvariantViolation::StaleBounds);
            }
            return Ok(0);
        };
        if self.is_red(Some(root)) {
            return Err(InvariantViolation::RedRoot);
        }
        if self.parent(root).is_some() {
            return Err(InvariantViolation::BrokenParentLink);
        }
        let mut reachable = 0;
        let height = self.check_subtree(root, &mut reachable)?;
        if reachable != self.nodes.len() {
            return Err(InvariantViolation::LengthMismatch {
                reachable,
                stored: self.nodes.len(),
            });
        }
        if self.leftmost != Some(min_of(&self.nodes, root))
            || self.rightmost != Some(max_of(&self.nodes, root))
        {
            return Err(InvariantViolation::StaleBounds);
        }
        let mut prev: Option<&K> = None;
        for (k, _) in self.iter() {
            if let Some(p) = prev {
                let ord = self.cmp.compare(p, k);
                let ok = ord == Ordering::Less || (!UNIQUE && ord == Ordering::Equal);
                if !ok {
                    return Err(InvariantViolation::OrderViolation);
                }
            }
            prev = Some(k);
        }
        Ok(height)
    }

    fn check_subtree(&self, id: NodeId, reachable: &mut usize) -> Result<usize, InvariantViolation> {
        *reachable += 1;
        let node = self.node(id);
        let mut heights = [0usize; 2];
        for (slot, child) in [node.left, node.right].into_iter().enumerate() {
            if let Some(c) = child {
                if self.parent(c) != Some(id) {
                    return Err(InvariantViolation::BrokenParentLink);
                }
                if node.color == Color::Red && self.is_red(Some(c)) {
                    return Err(InvariantViolation::RedRedEdge);
                }
                heights[slot] = self.check_subtree(c, reachable)?;
            }
        }
        if heights[0] != heights[1] {
            return Err(InvariantViolation::BlackHeightMismatch {
                left: heights[0],
                right: heights[1],
            });
        }
        Ok(heights[0] + usize::from(node.color == Color::Black))
    }
}

impl<K: Clone, V: Clone, C: Clone, const UNIQUE: bool> Clone for RbTree<K, V, C, UNIQUE> {
    /// Node ids of the source are valid in the clone.
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            leftmost: self.leftmost,
            rightmost: self.rightmost,
            cmp: self.cmp.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, const UNIQUE: bool> fmt::Debug for RbTree<K, V, C, UNIQUE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C, const UNIQUE: bool> PartialEq for RbTree<K, V, C, UNIQUE> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C, const UNIQUE: bool> Eq for RbTree<K, V, C, UNIQUE> {}

impl<K, V, C: Compare<K>, const UNIQUE: bool> Extend<(K, V)> for RbTree<K, V, C, UNIQUE> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            // sorted input hits the end hint every time
            self.insert_with_hint(None, k, v);
        }
    }
}

impl<K, V, C: Compare<K> + Default, const UNIQUE: bool> FromIterator<(K, V)>
    for RbTree<K, V, C, UNIQUE>
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

/// In-order iterator.
pub struct Iter<'a, K, V> {
    nodes: &'a Nodes<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = successor(self.nodes, id);
        let n = &self.nodes[id.0];
        Some((&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = predecessor(self.nodes, id);
        let n = &self.nodes[id.0];
        Some((&n.key, &n.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

/// In-order iterator with mutable values.
pub struct IterMut<'a, K, V> {
    it: core::iter::Flatten<std::vec::IntoIter<Option<(&'a K, &'a mut V)>>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back()
    }
}

/// Owning in-order iterator.
pub struct IntoIter<K, V> {
    nodes: Nodes<K, V>,
    order: std::vec::IntoIter<NodeId>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let id = self.order.next()?;
        self.nodes.remove(id.0).map(|n| (n.key, n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let id = self.order.next_back()?;
        self.nodes.remove(id.0).map(|n| (n.key, n.value))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, C, const UNIQUE: bool> IntoIterator for RbTree<K, V, C, UNIQUE> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let order: Vec<NodeId> = self.iter_ids().map(|(id, _)| id).collect();
        IntoIter {
            nodes: self.nodes,
            order: order.into_iter(),
        }
    }
}

impl<'a, K, V, C, const UNIQUE: bool> IntoIterator for &'a RbTree<K, V, C, UNIQUE> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Read-only position in a tree. The end position sits between the last
/// and the first node: moving forward from `last` reaches it, and moving
/// backward from it reaches `last`.
pub struct Cursor<'a, K, V> {
    nodes: &'a Nodes<K, V>,
    leftmost: Option<NodeId>,
    rightmost: Option<NodeId>,
    current: Option<NodeId>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// `None` at the end position.
    pub fn node(&self) -> Option<NodeId> {
        self.current
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        let n = &self.nodes[self.current?.0];
        Some((&n.key, &n.value))
    }

    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    pub fn move_next(&mut self) {
        self.current = match self.current {
            Some(id) => successor(self.nodes, id),
            None => self.leftmost,
        };
    }

    pub fn move_prev(&mut self) {
        self.current = match self.current {
            Some(id) => predecessor(self.nodes, id),
            None => self.rightmost,
        };
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            leftmost: self.leftmost,
            rightmost: self.rightmost,
            current: self.current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Reversed;

    type Multi<K> = RbTree<K, (), Natural, false>;

    fn keys<K: Clone, V, C, const U: bool>(t: &RbTree<K, V, C, U>) -> Vec<K> {
        t.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Invariant: ascending inserts keep the tree balanced and ordered.
    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut t: RbTree<u32, u32> = RbTree::new();
        for i in 0..1000 {
            assert!(t.insert(i, i * 10).1);
        }
        let bh = t.check_invariants().unwrap();
        // height <= 2 * black height; 2 * log2(1001) < 20
        assert!(bh >= 5 && bh <= 10, "black height {bh}");
        assert_eq!(keys(&t), (0..1000).collect::<Vec<_>>());
        assert_eq!(t.get(t.first().unwrap()), Some((&0, &0)));
        assert_eq!(t.get(t.last().unwrap()), Some((&999, &9990)));
    }

    /// Invariant: unique trees reject duplicates and keep the first value.
    #[test]
    fn unique_rejects_duplicate() {
        let mut t: RbTree<&str, i32> = RbTree::new();
        let (a, inserted) = t.insert("a", 1);
        assert!(inserted);
        let (b, inserted) = t.insert("a", 2);
        assert!(!inserted);
        assert_eq!(a, b);
        assert_eq!(t.get(a), Some((&"a", &1)));
        assert_eq!(t.insert_or_assign("a", 3), (a, Some(1)));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: removing every other key in a scrambled order keeps all
    /// red-black properties after each step.
    #[test]
    fn removals_rebalance() {
        let mut t: RbTree<u32, ()> = RbTree::new();
        let mut ids = Vec::new();
        for i in 0..200u32 {
            let k = (i * 37) % 200;
            ids.push((k, t.insert(k, ()).0));
        }
        for &(k, id) in ids.iter().filter(|(k, _)| k % 2 == 0) {
            assert_eq!(t.remove(id), Some((k, ())));
            t.check_invariants().unwrap();
        }
        assert_eq!(t.len(), 100);
        assert!(keys(&t).iter().all(|k| k % 2 == 1));
        // ids stay valid across other removals; stale ids are rejected
        let (_, stale) = ids[0];
        assert_eq!(t.remove(stale), None);
        assert_eq!(t.next(stale), None);
    }

    /// Invariant: multi trees keep equal keys adjacent and in insertion
    /// order; find returns the leftmost.
    #[test]
    fn multi_equal_keys() {
        let mut t: RbTree<u32, char, Natural, false> = RbTree::new();
        let mut fives = Vec::new();
        for (k, tag) in [(5, 'a'), (3, 'x'), (5, 'b'), (1, 'y'), (5, 'c')] {
            let (id, inserted) = t.insert(k, tag);
            assert!(inserted);
            if k == 5 {
                fives.push(id);
            }
        }
        assert_eq!(t.count(&5), 3);
        assert_eq!(t.find(&5), Some(fives[0]));
        let tags: Vec<char> = t.equal_range(&5).map(|(_, v)| *v).collect();
        assert_eq!(tags, vec!['a', 'b', 'c']);
        assert_eq!(t.remove(fives[1]), Some((5, 'b')));
        assert_eq!(t.count(&5), 2);
        t.check_invariants().unwrap();
        assert_eq!(t.remove_key(&5), 2);
        assert_eq!(keys(&t), vec![1, 3]);
    }

    /// Invariant: bounds follow lower/upper semantics at the edges.
    #[test]
    fn lower_and_upper_bound() {
        let t: RbTree<u32, ()> = [10, 20, 30].into_iter().map(|k| (k, ())).collect();
        let key_at = |id: Option<NodeId>| id.and_then(|id| t.get(id)).map(|(k, _)| *k);
        assert_eq!(key_at(t.lower_bound(&20)), Some(20));
        assert_eq!(key_at(t.upper_bound(&20)), Some(30));
        assert_eq!(key_at(t.lower_bound(&5)), Some(10));
        assert_eq!(key_at(t.lower_bound(&31)), None);
        assert_eq!(key_at(t.upper_bound(&30)), None);
        assert_eq!(t.count(&25), 0);
    }

    /// Invariant: a panicking value constructor runs before any node is
    /// attached, so the tree is unchanged; a present key never calls it.
    #[test]
    fn panicking_constructor_leaves_tree_unchanged() {
        let mut t: RbTree<u32, String> = (0..5).map(|i| (i, i.to_string())).collect();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            t.try_insert_with(99, || panic!("constructor failed"));
        }));
        assert!(res.is_err());
        assert_eq!(t.len(), 5);
        assert!(!t.contains(&99));
        t.check_invariants().unwrap();
        let (id, inserted) = t.try_insert_with(2, || panic!("not called"));
        assert!(!inserted);
        assert_eq!(t.get(id), Some((&2, &"2".to_string())));
    }

    /// Invariant: a correct hint links next to the hint; a wrong hint
    /// still yields a valid tree.
    #[test]
    fn hinted_inserts() {
        let mut t: RbTree<u32, ()> = RbTree::new();
        for i in 0..100 {
            t.insert_with_hint(None, i * 2, ());
        }
        t.check_invariants().unwrap();
        let hint = t.find(&50);
        let (id, inserted) = t.insert_with_hint(hint, 49, ());
        assert!(inserted);
        assert_eq!(t.next(id), hint);
        // hint far from the key
        let (id, inserted) = t.insert_with_hint(t.first(), 151, ());
        assert!(inserted);
        assert_eq!(t.get(id).map(|(k, _)| *k), Some(151));
        // duplicate through a hint
        assert!(!t.insert_with_hint(t.find(&52), 50, ()).1);
        t.check_invariants().unwrap();
        assert_eq!(t.len(), 102);
    }

    /// Invariant: extract and insert_node move entries without cloning;
    /// a rejected node comes back to the caller.
    #[test]
    fn extract_and_reinsert() {
        let mut a: RbTree<u32, String> = RbTree::new();
        let mut b: RbTree<u32, String> = RbTree::new();
        let id = a.insert(1, "one".into()).0;
        b.insert(2, "two".into());
        let mut node = a.extract(id).unwrap();
        assert!(a.is_empty());
        a.check_invariants().unwrap();
        *node.key_mut() = 2;
        let ret = b.insert_node(node);
        assert!(!ret.inserted);
        let mut node = ret.node.unwrap();
        *node.key_mut() = 3;
        let ret = b.insert_node(node);
        assert!(ret.inserted);
        assert_eq!(b.get(ret.position), Some((&3, &"one".to_string())));
        assert_eq!(b.extract_key(&9).map(NodeHandle::into_parts), None);
    }

    /// Invariant: merging into a unique tree leaves colliding nodes behind;
    /// merging into a multi tree takes everything.
    #[test]
    fn merge_between_flavors() {
        let mut uniq: RbTree<u32, ()> = [1, 2, 3].into_iter().map(|k| (k, ())).collect();
        let mut multi: Multi<u32> = [2, 3, 3, 4].into_iter().map(|k| (k, ())).collect();
        uniq.merge(&mut multi);
        assert_eq!(keys(&uniq), vec![1, 2, 3, 4]);
        assert_eq!(keys(&multi), vec![2, 3, 3]);
        let mut all: Multi<u32> = Multi::new();
        all.merge(&mut multi);
        all.merge(&mut uniq);
        assert!(multi.is_empty() && uniq.is_empty());
        assert_eq!(keys(&all), vec![1, 2, 2, 3, 3, 3, 4]);
        all.check_invariants().unwrap();
    }

    /// Invariant: cursors walk both ways and wrap through the end position.
    #[test]
    fn cursor_round_trip() {
        let t: RbTree<u32, ()> = (1..=3).map(|k| (k, ())).collect();
        let mut c = t.cursor_end();
        let mut back = Vec::new();
        c.move_prev();
        while let Some(k) = c.key() {
            back.push(*k);
            c.move_prev();
        }
        assert_eq!(back, vec![3, 2, 1]);
        assert!(c.is_end());
        c.move_next();
        assert_eq!(c.key(), Some(&1));
        let at = t.cursor_at(t.find(&2).unwrap()).unwrap();
        assert_eq!(at.key_value(), Some((&2, &())));
    }

    /// Invariant: the comparator decides the order.
    #[test]
    fn reversed_order() {
        let mut t: RbTree<u32, (), Reversed> = RbTree::new();
        t.extend((0..10).map(|k| (k, ())));
        assert_eq!(keys(&t), (0..10).rev().collect::<Vec<_>>());
        t.check_invariants().unwrap();
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        let mut s = RbTree::<&str, (), _, false>::with_comparator(by_len);
        for w in ["ccc", "a", "bb", "d"] {
            s.insert(w, ());
        }
        assert_eq!(keys(&s), vec!["a", "d", "bb", "ccc"]);
    }

    /// Invariant: iter_mut, into_iter and pop visit nodes in order.
    #[test]
    fn owning_and_mutable_iteration() {
        let mut t: RbTree<u32, u32> = [(3, 0), (1, 0), (2, 0)].into_iter().collect();
        for (i, (_, v)) in t.iter_mut().enumerate() {
            *v = i as u32;
        }
        assert_eq!(t.pop_first(), Some((1, 0)));
        assert_eq!(t.pop_last(), Some((3, 2)));
        t.insert(7, 7);
        t.insert(0, 0);
        let back: Vec<(u32, u32)> = t.clone().into_iter().rev().collect();
        assert_eq!(back, vec![(7, 7), (2, 1), (0, 0)]);
        assert_eq!(t.iter().rev().len(), 3);
        t.clear();
        assert_eq!(t.check_invariants(), Ok(0));
    }
}
