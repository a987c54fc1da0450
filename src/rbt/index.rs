// Module ``rbt`` implement an ordered multimap as a classic red-black
// tree over a node arena.
//
// Nodes are reached through `u128` handles issued from a monotonic
// counter, never reused for the lifetime of the tree. Every node keeps a
// parent handle besides its two child handles, so both repair walks,
// after insert and after delete, move bottom-up without recursion.
//
// Duplicate values inserted under one key accumulate in that key's node
// and preserve insertion order, re-balancing happens only when a distinct
// key enters or leaves the tree.
//
// [rbt]: https://en.wikipedia.org/wiki/Red-black_tree

use std::{cmp::Ordering, collections::HashMap};

use crate::{
    rbt::{Depth, Node, Stats},
    Error, Result,
};

/// Ceiling on the depth of any branch, validation fails beyond it.
pub const MAX_TREE_DEPTH: usize = 250;

/// Index type, a self-balancing ordered multimap keyed by `u128`.
///
/// Single threaded and synchronous, mutations take `&mut self`. Lookup
/// failures and domain violations come back as [Error] values, internal
/// inconsistencies surface as the `Invalid*`/`Fatal` variants and mean a
/// bug in this module.
pub struct Index<V> {
    arena: HashMap<u128, Node<V>>,
    root: Option<u128>,
    handle: u128, // next handle to issue
    n_keys: usize,
    n_values: usize,
}

impl<V> Index<V> {
    pub fn new() -> Index<V> {
        Index {
            arena: HashMap::new(),
            root: None,
            handle: 0,
            n_keys: 0,
            n_values: 0,
        }
    }

    /// Return whether the tree holds any key.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_keys == 0
    }

    /// Return number of distinct keys.
    #[inline]
    pub fn key_count(&self) -> usize {
        self.n_keys
    }

    /// Return number of values, counting duplicates under one key.
    #[inline]
    pub fn value_count(&self) -> usize {
        self.n_values
    }

    /// Return the length of `key`'s value run.
    pub fn key_value_count(&self, key: u128) -> Result<usize> {
        match self.find(key) {
            Some(handle) => Ok(self.node(handle)?.values.len()),
            None => err_at!(KeyNotFound, msg: "key {}", key),
        }
    }

    /// Return whether `key` is present.
    #[inline]
    pub fn contains_key(&self, key: u128) -> bool {
        self.find(key).is_some()
    }

    /// Borrow the oldest value inserted under `key`.
    pub fn first_value_at(&self, key: u128) -> Result<&V> {
        match self.find(key) {
            Some(handle) => match self.node(handle)?.values.first() {
                Some(value) => Ok(value),
                None => err_at!(Fatal, msg: "call the programmer"),
            },
            None => err_at!(KeyNotFound, msg: "key {}", key),
        }
    }

    /// Borrow `key`'s value run, in insertion order.
    pub fn values_at(&self, key: u128) -> Result<&[V]> {
        match self.find(key) {
            Some(handle) => Ok(self.node(handle)?.values.as_slice()),
            None => err_at!(KeyNotFound, msg: "key {}", key),
        }
    }

    /// Return the smallest key.
    pub fn min_key(&self) -> Result<u128> {
        let root = match self.root {
            Some(root) => root,
            None => return err_at!(TreeEmpty, msg: "min_key on empty index"),
        };
        Ok(self.node(self.min_from(root)?)?.key)
    }

    /// Return the largest key.
    pub fn max_key(&self) -> Result<u128> {
        let root = match self.root {
            Some(root) => root,
            None => return err_at!(TreeEmpty, msg: "max_key on empty index"),
        };
        let mut cursor = root;
        loop {
            match self.node(cursor)?.right {
                Some(right) => cursor = right,
                None => break Ok(self.node(cursor)?.key),
            }
        }
    }

    /// Return the root key and a borrow of its oldest value.
    pub fn peek(&self) -> Result<(u128, &V)> {
        let root = match self.root {
            Some(root) => root,
            None => return err_at!(TreeEmpty, msg: "peek on empty index"),
        };
        let node = self.node(root)?;
        match node.values.first() {
            Some(value) => Ok((node.key, value)),
            None => err_at!(Fatal, msg: "call the programmer"),
        }
    }

    /// Insert `value` under `key`. An existing key appends to its value
    /// run without touching the tree shape.
    pub fn insert(&mut self, key: u128, value: V) -> Result<()> {
        let mut cursor = match self.root {
            Some(root) => root,
            None => {
                let handle = self.alloc(Node::new(key, value, None, true));
                self.root = Some(handle);
                self.n_keys += 1;
                self.n_values += 1;
                return Ok(());
            }
        };
        loop {
            match key.cmp(&self.node(cursor)?.key) {
                Ordering::Equal => {
                    self.node_mut(cursor)?.values.push(value);
                    self.n_values += 1;
                    return Ok(());
                }
                Ordering::Less => match self.node(cursor)?.left {
                    Some(left) => cursor = left,
                    None => {
                        let handle = self.alloc(Node::new(key, value, Some(cursor), false));
                        self.node_mut(cursor)?.left = Some(handle);
                        self.n_keys += 1;
                        self.n_values += 1;
                        return self.fix_double_red(handle);
                    }
                },
                Ordering::Greater => match self.node(cursor)?.right {
                    Some(right) => cursor = right,
                    None => {
                        let handle = self.alloc(Node::new(key, value, Some(cursor), false));
                        self.node_mut(cursor)?.right = Some(handle);
                        self.n_keys += 1;
                        self.n_values += 1;
                        return self.fix_double_red(handle);
                    }
                },
            }
        }
    }

    /// Remove the oldest occurrence of `value` from `key`'s value run.
    /// The key leaves the tree along with its last value.
    pub fn delete_value(&mut self, key: u128, value: &V) -> Result<()>
    where
        V: PartialEq,
    {
        let handle = match self.find(key) {
            Some(handle) => handle,
            None => return err_at!(KeyNotFound, msg: "key {}", key),
        };
        let pos = match self.node(handle)?.values.iter().position(|v| v == value) {
            Some(pos) => pos,
            None => return err_at!(ValueNotFound, msg: "under key {}", key),
        };
        self.node_mut(handle)?.values.remove(pos);
        self.n_values -= 1;
        if self.node(handle)?.values.is_empty() {
            self.n_keys -= 1;
            self.delete_at(handle)?;
        }
        Ok(())
    }

    /// Remove `key` and its whole value run.
    pub fn delete_key(&mut self, key: u128) -> Result<()> {
        let handle = match self.find(key) {
            Some(handle) => handle,
            None => return err_at!(KeyNotFound, msg: "key {}", key),
        };
        self.n_values -= self.node(handle)?.values.len();
        self.n_keys -= 1;
        self.delete_at(handle)
    }

    /// Return an in-order iterator over `(key, value-run)` pairs.
    pub fn iter(&self) -> Iter<V> {
        let mut paths = vec![];
        self.push_left_spine(self.root, &mut paths);
        Iter { index: self, paths }
    }

    /// Return a reverse iterator, keys strictly decreasing. While `iter`
    /// walks a price book from the best ask up, `reverse` walks it from
    /// the best bid down.
    pub fn reverse(&self) -> Reverse<V> {
        let mut paths = vec![];
        self.push_right_spine(self.root, &mut paths);
        Reverse { index: self, paths }
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }

    /// Validate the tree, on success return statistics:
    ///
    /// * Root node is always black.
    /// * Parent/child handles point back at each other.
    /// * Verify the sort order between a node and its left/right subtree.
    /// * Make sure there are no consecutive reds.
    /// * Make sure number of blacks are same on both arms.
    /// * Every live node holds at least one value.
    /// * Key and value counts agree with the arena.
    pub fn validate(&self) -> Result<Stats> {
        use std::mem::size_of;

        if self.is_red(self.root) {
            return err_at!(Fatal, msg: "root node must be black");
        }
        let mut depths = Depth::default();
        let (blacks, n_keys, n_values) =
            self.validate_tree(self.root, None, false, None, None, 0, &mut depths)?;
        if n_keys != self.n_keys {
            return err_at!(Fatal, msg: "n_keys {} != {}", n_keys, self.n_keys);
        }
        if n_values != self.n_values {
            return err_at!(Fatal, msg: "n_values {} != {}", n_values, self.n_values);
        }
        if self.arena.len() != self.n_keys {
            return err_at!(Fatal, msg: "arena {} != {}", self.arena.len(), self.n_keys);
        }

        Ok(Stats {
            node_size: size_of::<Node<V>>(),
            n_keys,
            n_values,
            blacks: Some(blacks),
            depths: Some(depths),
        })
    }

    fn node(&self, handle: u128) -> Result<&Node<V>> {
        match self.arena.get(&handle) {
            Some(node) => Ok(node),
            None => err_at!(NodeNotFound, msg: "handle {}", handle),
        }
    }

    fn node_mut(&mut self, handle: u128) -> Result<&mut Node<V>> {
        match self.arena.get_mut(&handle) {
            Some(node) => Ok(node),
            None => err_at!(NodeNotFound, msg: "handle {}", handle),
        }
    }

    fn alloc(&mut self, node: Node<V>) -> u128 {
        let handle = self.handle;
        self.handle += 1;
        self.arena.insert(handle, node);
        handle
    }

    fn find(&self, key: u128) -> Option<u128> {
        let mut cursor = self.root;
        while let Some(handle) = cursor {
            let node = self.arena.get(&handle)?;
            cursor = match key.cmp(&node.key) {
                Ordering::Equal => return Some(handle),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    fn min_from(&self, mut handle: u128) -> Result<u128> {
        loop {
            match self.node(handle)?.left {
                Some(left) => handle = left,
                None => break Ok(handle),
            }
        }
    }

    #[inline]
    fn is_red(&self, handle: Option<u128>) -> bool {
        handle
            .and_then(|h| self.arena.get(&h))
            .map_or(false, |node| !node.is_black())
    }

    // Point `parent`'s child edge from `old` to `new`, and `new`'s parent
    // edge back at `parent`. A missing parent re-anchors the root.
    fn replace_child(
        &mut self,
        parent: Option<u128>,
        old: u128,
        new: Option<u128>,
    ) -> Result<()> {
        match parent {
            None => self.root = new,
            Some(p) => {
                let node = self.node_mut(p)?;
                if node.left == Some(old) {
                    node.left = new;
                } else if node.right == Some(old) {
                    node.right = new;
                } else {
                    return err_at!(InvalidEdgeDirection, msg: "{} not a child of {}", old, p);
                }
            }
        }
        if let Some(new) = new {
            self.node_mut(new)?.parent = parent;
        }
        Ok(())
    }

    //              (i)                       (i)
    //               |                         |
    //              node                     right
    //              /  \                      / \
    //             /    \                    /   \
    //            /      \                  /     \
    //          left     right           node     r-r
    //                    / \            /  \
    //                 r-l  r-r       left  r-l
    //
    // Links only, colors are the caller's business.
    fn rotate_left(&mut self, handle: u128) -> Result<u128> {
        let right = match self.node(handle)?.right {
            Some(right) => right,
            None => return err_at!(InvalidRotation, msg: "rotate-left {}", handle),
        };
        let parent = self.node(handle)?.parent;
        let r_l = self.node(right)?.left;

        self.node_mut(handle)?.right = r_l;
        if let Some(r_l) = r_l {
            self.node_mut(r_l)?.parent = Some(handle);
        }
        self.node_mut(right)?.left = Some(handle);
        self.node_mut(handle)?.parent = Some(right);
        self.replace_child(parent, handle, Some(right))?;

        Ok(right)
    }

    //              (i)                       (i)
    //               |                         |
    //              node                      left
    //              /  \                      / \
    //             /    \                    /   \
    //            /      \                  /     \
    //         left     right            l-l      node
    //         / \                                / \
    //      l-l  l-r                            l-r  right
    //
    // Links only, colors are the caller's business.
    fn rotate_right(&mut self, handle: u128) -> Result<u128> {
        let left = match self.node(handle)?.left {
            Some(left) => left,
            None => return err_at!(InvalidRotation, msg: "rotate-right {}", handle),
        };
        let parent = self.node(handle)?.parent;
        let l_r = self.node(left)?.right;

        self.node_mut(handle)?.left = l_r;
        if let Some(l_r) = l_r {
            self.node_mut(l_r)?.parent = Some(handle);
        }
        self.node_mut(left)?.right = Some(handle);
        self.node_mut(handle)?.parent = Some(left);
        self.replace_child(parent, handle, Some(left))?;

        Ok(left)
    }

    // Repair the possible red-red violation above a freshly inserted red
    // leaf. A red uncle recolors and moves the violation two levels up, a
    // black uncle resolves it with one or two rotations. The root is
    // forced black afterward.
    fn fix_double_red(&mut self, mut handle: u128) -> Result<()> {
        loop {
            let parent = match self.node(handle)?.parent {
                Some(parent) => parent,
                None => break,
            };
            if self.node(parent)?.is_black() {
                break;
            }
            // red parent under a black root always has a grandparent.
            let grand = match self.node(parent)?.parent {
                Some(grand) => grand,
                None => {
                    return err_at!(InvalidFixDoubleRed, msg: "red parent {} at root", parent)
                }
            };
            let p_is_left = self.node(grand)?.left == Some(parent);
            let uncle = if p_is_left {
                self.node(grand)?.right
            } else {
                self.node(grand)?.left
            };

            if self.is_red(uncle) {
                self.node_mut(parent)?.set_black();
                if let Some(uncle) = uncle {
                    self.node_mut(uncle)?.set_black();
                }
                self.node_mut(grand)?.set_red();
                handle = grand;
                continue;
            }

            let h_is_left = self.node(parent)?.left == Some(handle);
            let top = match (p_is_left, h_is_left) {
                (true, true) => self.rotate_right(grand)?,
                (true, false) => {
                    self.rotate_left(parent)?;
                    self.rotate_right(grand)?
                }
                (false, true) => {
                    self.rotate_right(parent)?;
                    self.rotate_left(grand)?
                }
                (false, false) => self.rotate_left(grand)?,
            };
            self.node_mut(top)?.set_black();
            self.node_mut(grand)?.set_red();
            break;
        }

        if let Some(root) = self.root {
            self.node_mut(root)?.set_black();
        }
        Ok(())
    }

    // Remove the node at `handle` from the tree and release its arena
    // slot. Counts are the caller's business.
    fn delete_at(&mut self, mut handle: u128) -> Result<()> {
        // a node with two children trades payload with its successor, the
        // minimum of the right subtree, and the successor's slot leaves
        // the tree instead. Colors stay with their structural slot.
        let (left, right) = {
            let node = self.node(handle)?;
            (node.left, node.right)
        };
        if left.is_some() && right.is_some() {
            let right = match right {
                Some(right) => right,
                None => return err_at!(Fatal, msg: "call the programmer"),
            };
            let succ = self.min_from(right)?;
            let succ_key = self.node(succ)?.key;
            let succ_values = std::mem::take(&mut self.node_mut(succ)?.values);
            let key = self.node(handle)?.key;
            let values = {
                let node = self.node_mut(handle)?;
                let values = std::mem::replace(&mut node.values, succ_values);
                node.key = succ_key;
                values
            };
            {
                let node = self.node_mut(succ)?;
                node.key = key;
                node.values = values;
            }
            handle = succ;
        }

        // now at most one child.
        let (child, parent, black) = {
            let node = self.node(handle)?;
            (node.left.or(node.right), node.parent, node.is_black())
        };
        if !black {
            // a red node has no single child in a balanced tree.
            if child.is_some() {
                return err_at!(Fatal, msg: "call the programmer");
            }
            self.replace_child(parent, handle, None)?;
        } else if self.is_red(child) {
            self.replace_child(parent, handle, child)?;
            if let Some(child) = child {
                self.node_mut(child)?.set_black();
            }
        } else {
            // black node without a child, the splice leaves a double
            // black behind. Repair first, the node is still linked.
            if child.is_some() {
                return err_at!(Fatal, msg: "call the programmer");
            }
            self.fix_double_black(handle)?;
            // repairs may have rotated a new parent above the node.
            let parent = self.node(handle)?.parent;
            self.replace_child(parent, handle, None)?;
        }

        self.arena.remove(&handle);
        Ok(())
    }

    // Resolve the extra black sitting on `handle` after a black splice.
    // Walks up the tree, the root absorbs the extra black.
    fn fix_double_black(&mut self, mut handle: u128) -> Result<()> {
        loop {
            let parent = match self.node(handle)?.parent {
                Some(parent) => parent,
                None => break,
            };
            let h_is_left = self.node(parent)?.left == Some(handle);
            let sibling = if h_is_left {
                self.node(parent)?.right
            } else {
                self.node(parent)?.left
            };
            let sibling = match sibling {
                Some(sibling) => sibling,
                None => return err_at!(Fatal, msg: "double black without sibling"),
            };

            if !self.node(sibling)?.is_black() {
                // red sibling, rotate it above the parent and retry with
                // the guaranteed-black new sibling.
                if h_is_left {
                    self.rotate_left(parent)?;
                } else {
                    self.rotate_right(parent)?;
                }
                self.node_mut(parent)?.set_red();
                self.node_mut(sibling)?.set_black();
                continue;
            }

            let (s_left, s_right) = {
                let node = self.node(sibling)?;
                (node.left, node.right)
            };
            let (l_red, r_red) = (self.is_red(s_left), self.is_red(s_right));

            if l_red || r_red {
                let p_black = self.node(parent)?.is_black();
                if h_is_left {
                    // sibling on the right.
                    if r_red {
                        let outer = match s_right {
                            Some(outer) => outer,
                            None => return err_at!(Fatal, msg: "call the programmer"),
                        };
                        self.rotate_left(parent)?;
                        self.node_mut(sibling)?.black = p_black;
                        self.node_mut(outer)?.set_black();
                    } else {
                        let inner = match s_left {
                            Some(inner) => inner,
                            None => return err_at!(Fatal, msg: "call the programmer"),
                        };
                        self.rotate_right(sibling)?;
                        self.rotate_left(parent)?;
                        self.node_mut(inner)?.black = p_black;
                    }
                } else {
                    // sibling on the left.
                    if l_red {
                        let outer = match s_left {
                            Some(outer) => outer,
                            None => return err_at!(Fatal, msg: "call the programmer"),
                        };
                        self.rotate_right(parent)?;
                        self.node_mut(sibling)?.black = p_black;
                        self.node_mut(outer)?.set_black();
                    } else {
                        let inner = match s_right {
                            Some(inner) => inner,
                            None => return err_at!(Fatal, msg: "call the programmer"),
                        };
                        self.rotate_left(sibling)?;
                        self.rotate_right(parent)?;
                        self.node_mut(inner)?.black = p_black;
                    }
                }
                self.node_mut(parent)?.set_black();
                break;
            }

            // black sibling with two black children, push the extra
            // black up.
            self.node_mut(sibling)?.set_red();
            if !self.node(parent)?.is_black() {
                self.node_mut(parent)?.set_black();
                break;
            }
            handle = parent;
        }
        Ok(())
    }

    fn push_left_spine(&self, mut cursor: Option<u128>, paths: &mut Vec<u128>) {
        while let Some(handle) = cursor {
            paths.push(handle);
            cursor = self.arena.get(&handle).and_then(|node| node.left);
        }
    }

    fn push_right_spine(&self, mut cursor: Option<u128>, paths: &mut Vec<u128>) {
        while let Some(handle) = cursor {
            paths.push(handle);
            cursor = self.arena.get(&handle).and_then(|node| node.right);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_tree(
        &self,
        handle: Option<u128>,
        parent: Option<u128>,
        from_red: bool,
        lo: Option<u128>,
        hi: Option<u128>,
        depth: usize,
        depths: &mut Depth,
    ) -> Result<(usize, usize, usize)> {
        let handle = match handle {
            Some(handle) => handle,
            None => {
                depths.sample(depth);
                return Ok((0, 0, 0));
            }
        };
        if depth > MAX_TREE_DEPTH {
            return err_at!(Fatal, msg: "tree exceeds max depth {}", depth);
        }

        let node = self.node(handle)?;
        if node.parent != parent {
            return err_at!(Fatal, msg: "broken parent link at {}", node.key);
        }
        let red = !node.is_black();
        if from_red && red {
            return err_at!(Fatal, msg: "consecutive reds at {}", node.key);
        }
        if node.values.is_empty() {
            return err_at!(Fatal, msg: "empty value run at {}", node.key);
        }
        if let Some(lo) = lo {
            if node.key <= lo {
                return err_at!(Fatal, msg: "sort order {} below {}", node.key, lo);
            }
        }
        if let Some(hi) = hi {
            if node.key >= hi {
                return err_at!(Fatal, msg: "sort order {} above {}", node.key, hi);
            }
        }

        let (lb, lk, lv) = self.validate_tree(
            node.left,
            Some(handle),
            red,
            lo,
            Some(node.key),
            depth + 1,
            depths,
        )?;
        let (rb, rk, rv) = self.validate_tree(
            node.right,
            Some(handle),
            red,
            Some(node.key),
            hi,
            depth + 1,
            depths,
        )?;
        if lb != rb {
            return err_at!(Fatal, msg: "unbalanced blacks l:{} r:{}", lb, rb);
        }

        let blacks = lb + if node.is_black() { 1 } else { 0 };
        Ok((blacks, lk + rk + 1, lv + rv + node.values.len()))
    }
}

/// In-order iterator over an [Index], yields `(key, value-run)` pairs
/// with keys strictly increasing.
pub struct Iter<'a, V> {
    index: &'a Index<V>,
    paths: Vec<u128>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u128, &'a [V]);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.paths.pop()?;
        let node = self.index.arena.get(&handle)?;
        self.index.push_left_spine(node.right, &mut self.paths);
        Some((node.key, node.values.as_slice()))
    }
}

/// Reverse in-order iterator over an [Index], yields `(key, value-run)`
/// pairs with keys strictly decreasing.
pub struct Reverse<'a, V> {
    index: &'a Index<V>,
    paths: Vec<u128>,
}

impl<'a, V> Iterator for Reverse<'a, V> {
    type Item = (u128, &'a [V]);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.paths.pop()?;
        let node = self.index.arena.get(&handle)?;
        self.index.push_right_spine(node.left, &mut self.paths);
        Some((node.key, node.values.as_slice()))
    }
}

#[cfg(any(test, feature = "ordbase-perf"))]
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[cfg(any(test, feature = "ordbase-perf"))]
pub fn load_index(
    seed: u128,
    inserts: usize,
    del_values: usize,
    del_keys: usize,
    key_max: u128,
) -> Index<u64> {
    let mut rng = SmallRng::seed_from_u64(seed as u64);
    let mut index: Index<u64> = Index::new();

    let (mut inss, mut dvs, mut dks) = (inserts, del_values, del_keys);
    while (inss + dvs + dks) > 0 {
        if inss == 0 && index.is_empty() {
            break;
        }
        let key = rng.gen::<u128>() % key_max;
        match rng.gen::<usize>() % (inss + dvs + dks) {
            i if i < inss => {
                index.insert(key, rng.gen::<u64>()).unwrap();
                inss -= 1;
            }
            i if i < (inss + dvs) => match index.first_value_at(key) {
                Ok(value) => {
                    let value = *value;
                    index.delete_value(key, &value).unwrap();
                    dvs -= 1;
                }
                Err(_) => (),
            },
            _ => match index.delete_key(key) {
                Ok(_) => dks -= 1,
                Err(_) => (),
            },
        }
    }

    index
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
