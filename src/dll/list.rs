use std::{
    collections::HashMap,
    hash::Hash,
};

use crate::{dll::chain::Chain, Error, Result};

/// Doubly linked multiset list for cloneable values.
///
/// Alongside the chain of nodes the list maintains a secondary index from
/// value to the handles of live nodes holding that value, in insertion
/// order. Membership checks and deletion by value run in constant time
/// through the index.
pub struct List<V>
where
    V: Clone + Eq + Hash,
{
    chain: Chain<V>,
    index: HashMap<V, Vec<u128>>,
}

impl<V> List<V>
where
    V: Clone + Eq + Hash,
{
    pub fn new() -> List<V> {
        List {
            chain: Chain::new(),
            index: HashMap::new(),
        }
    }

    pub fn singleton(value: V) -> Result<List<V>> {
        let mut list = List::new();
        list.add(value)?;
        Ok(list)
    }

    /// Return number of values in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Return whether the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Append `value` at the tail.
    pub fn add(&mut self, value: V) -> Result<()> {
        let handle = self.chain.push_back(value.clone())?;
        self.index.entry(value).or_insert_with(Vec::new).push(handle);
        Ok(())
    }

    /// Splice `value` in before position `index`. An `index` equal to the
    /// length appends at the tail.
    pub fn insert_at(&mut self, value: V, index: usize) -> Result<()> {
        if index == self.len() {
            return self.add(value);
        }
        let at = self.chain.handle_at(index)?;
        let handle = self.chain.splice_before(value.clone(), at)?;
        self.index.entry(value).or_insert_with(Vec::new).push(handle);
        Ok(())
    }

    /// Remove one occurrence of `value`, the one at the head of the
    /// value's handle list in the secondary index.
    pub fn remove_by_value(&mut self, value: &V) -> Result<V> {
        let handle = match self.index.get(value).and_then(|hs| hs.first()) {
            Some(handle) => *handle,
            None => return err_at!(ValueNotFound, msg: "remove_by_value"),
        };
        self.remove_by_handle(handle)
    }

    /// Remove the value at position `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<V> {
        let handle = self.chain.handle_at(index)?;
        self.remove_by_handle(handle)
    }

    /// Remove the value at the head.
    pub fn remove_first(&mut self) -> Result<V> {
        let handle = self.chain.first()?;
        self.remove_by_handle(handle)
    }

    /// Remove the value at the tail.
    pub fn remove_last(&mut self) -> Result<V> {
        let handle = self.chain.last()?;
        self.remove_by_handle(handle)
    }

    fn remove_by_handle(&mut self, handle: u128) -> Result<V> {
        let node = self.chain.unlink(handle)?;
        let empty = match self.index.get_mut(&node.value) {
            Some(handles) => {
                match handles.iter().position(|h| *h == handle) {
                    Some(i) => {
                        handles.remove(i);
                    }
                    None => return err_at!(Fatal, msg: "index lost handle {}", handle),
                }
                handles.is_empty()
            }
            None => return err_at!(Fatal, msg: "index lost value for {}", handle),
        };
        if empty {
            self.index.remove(&node.value);
        }
        Ok(node.value)
    }

    /// Borrow the value at the head.
    pub fn borrow_first(&self) -> Result<&V> {
        let handle = self.chain.first()?;
        Ok(&self.chain.node(handle)?.value)
    }

    /// Borrow the value at the tail.
    pub fn borrow_last(&self) -> Result<&V> {
        let handle = self.chain.last()?;
        Ok(&self.chain.node(handle)?.value)
    }

    /// Return whether at least one live node holds `value`.
    #[inline]
    pub fn contains(&self, value: &V) -> bool {
        self.index.contains_key(value)
    }

    /// Clone the values out, in head-to-tail order.
    pub fn as_vector(&self) -> Result<Vec<V>> {
        let mut values = Vec::with_capacity(self.len());
        for handle in self.chain.handles()? {
            values.push(self.chain.node(handle)?.value.clone());
        }
        Ok(values)
    }

    /// Return a leading cursor over the list, also usable as a plain
    /// [Iterator] yielding `&V`. Mutating the list while a cursor is
    /// alive is rejected by the borrow checker.
    pub fn iter(&self) -> Result<Iter<V>> {
        let cursor = self.chain.head();
        let more = match cursor {
            Some(handle) => self.chain.node(handle)?.next.is_some(),
            None => false,
        };
        Ok(Iter {
            list: self,
            cursor,
            more,
            completed: cursor.is_none(),
        })
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }

    /// Validate the chain links both ways and the closure between the
    /// secondary index and the live nodes.
    pub fn validate(&self) -> Result<()> {
        self.chain.validate()?;

        let indexed: usize = self.index.values().map(|hs| hs.len()).sum();
        if indexed != self.len() {
            return err_at!(Fatal, msg: "index holds {} of {}", indexed, self.len());
        }
        for (value, handles) in self.index.iter() {
            if handles.is_empty() {
                return err_at!(Fatal, msg: "empty handle list left behind");
            }
            for handle in handles.iter() {
                if &self.chain.node(*handle)?.value != value {
                    return err_at!(Fatal, msg: "index points at foreign node {}", handle);
                }
            }
        }
        for handle in self.chain.handles()? {
            let value = &self.chain.node(handle)?.value;
            match self.index.get(value) {
                Some(handles) if handles.contains(&handle) => (),
                Some(_) | None => {
                    return err_at!(Fatal, msg: "node {} missing from index", handle)
                }
            }
        }
        Ok(())
    }
}

/// Leading cursor over a [List].
///
/// Tracks the current handle, whether a node follows it and whether the
/// walk has consumed the last value. [Iter::get_next] and
/// [Iter::peek_next] fail with [Error::MustHaveNext] once the walk has
/// completed.
pub struct Iter<'a, V>
where
    V: Clone + Eq + Hash,
{
    list: &'a List<V>,
    cursor: Option<u128>,
    more: bool, // a node follows the cursor
    completed: bool,
}

impl<'a, V> Iter<'a, V>
where
    V: Clone + Eq + Hash,
{
    /// Return whether another value can be consumed.
    #[inline]
    pub fn has_next(&self) -> bool {
        !self.completed
    }

    /// Borrow the value the cursor sits on, without advancing.
    pub fn peek_next(&self) -> Result<&'a V> {
        let handle = match self.cursor {
            Some(handle) if !self.completed => handle,
            _ => return err_at!(MustHaveNext, msg: "cursor completed"),
        };
        Ok(&self.list.chain.node(handle)?.value)
    }

    /// Yield the value the cursor sits on and advance past it.
    pub fn get_next(&mut self) -> Result<&'a V> {
        let handle = match self.cursor {
            Some(handle) if !self.completed => handle,
            _ => return err_at!(MustHaveNext, msg: "cursor completed"),
        };
        let node = self.list.chain.node(handle)?;
        self.cursor = node.next;
        self.completed = !self.more;
        self.more = match node.next {
            Some(next) => self.list.chain.node(next)?.next.is_some(),
            None => false,
        };
        Ok(&node.value)
    }

    /// Advance past the current value without yielding it.
    pub fn skip_next(&mut self) -> Result<()> {
        self.get_next().map(|_| ())
    }
}

impl<'a, V> Iterator for Iter<'a, V>
where
    V: Clone + Eq + Hash,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            self.get_next().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "list_test.rs"]
mod list_test;
