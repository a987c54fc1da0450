use crate::{dll::chain::Chain, Error, Result};

/// Doubly linked multiset list for values that cannot be cloned.
///
/// Without the secondary index of [crate::dll::List], membership and
/// deletion by value degrade to linear scans. In exchange the element
/// type needs no capability beyond being storable, and iteration can move
/// values out of the list through [MoveList::drain].
///
/// Tear the list down through [MoveList::close] once it is empty, or
/// drain it first with [MoveList::into_vector].
pub struct MoveList<V> {
    chain: Chain<V>,
}

impl<V> MoveList<V> {
    pub fn new() -> MoveList<V> {
        MoveList {
            chain: Chain::new(),
        }
    }

    pub fn singleton(value: V) -> Result<MoveList<V>> {
        let mut list = MoveList::new();
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
        self.chain.push_back(value)?;
        Ok(())
    }

    /// Splice `value` in before position `index`. An `index` equal to the
    /// length appends at the tail.
    pub fn insert_at(&mut self, value: V, index: usize) -> Result<()> {
        if index == self.len() {
            return self.add(value);
        }
        let at = self.chain.handle_at(index)?;
        self.chain.splice_before(value, at)?;
        Ok(())
    }

    /// Remove the value at position `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<V> {
        let handle = self.chain.handle_at(index)?;
        Ok(self.chain.unlink(handle)?.value)
    }

    /// Remove the value at the head.
    pub fn remove_first(&mut self) -> Result<V> {
        let handle = self.chain.first()?;
        Ok(self.chain.unlink(handle)?.value)
    }

    /// Remove the value at the tail.
    pub fn remove_last(&mut self) -> Result<V> {
        let handle = self.chain.last()?;
        Ok(self.chain.unlink(handle)?.value)
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

    /// Scan for `value`, in list order.
    pub fn contains(&self, value: &V) -> Result<bool>
    where
        V: PartialEq,
    {
        for handle in self.chain.handles()? {
            if &self.chain.node(handle)?.value == value {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Remove the first occurrence of `value`, scanning in list order.
    pub fn remove_by_value(&mut self, value: &V) -> Result<V>
    where
        V: PartialEq,
    {
        for handle in self.chain.handles()? {
            if &self.chain.node(handle)?.value == value {
                return Ok(self.chain.unlink(handle)?.value);
            }
        }
        err_at!(ValueNotFound, msg: "remove_by_value")
    }

    /// Drain the list into a vector, in head-to-tail order.
    pub fn into_vector(mut self) -> Result<Vec<V>> {
        let mut values = Vec::with_capacity(self.len());
        let mut drain = self.drain()?;
        while drain.has_next() {
            values.push(drain.get_next()?);
        }
        Ok(values)
    }

    /// Return a draining cursor, also usable as a plain [Iterator]
    /// yielding values by move. [Drain::get_next] unlinks the node it
    /// yields, [Drain::skip_next] leaves it in place.
    pub fn drain(&mut self) -> Result<Drain<V>> {
        let cursor = self.chain.head();
        let more = match cursor {
            Some(handle) => self.chain.node(handle)?.next.is_some(),
            None => false,
        };
        Ok(Drain {
            completed: cursor.is_none(),
            list: self,
            cursor,
            more,
        })
    }

    /// Checked teardown. A move-only list must be emptied before
    /// disposal.
    pub fn close(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            err_at!(NonEmptyList, msg: "{} values left", self.len())
        }
    }

    /// Validate the chain links both ways.
    pub fn validate(&self) -> Result<()> {
        self.chain.validate()
    }
}

/// Draining cursor over a [MoveList].
///
/// Same leading-cursor shape as [crate::dll::Iter], except that
/// [Drain::get_next] unlinks the current node and yields its value by
/// move.
pub struct Drain<'a, V> {
    list: &'a mut MoveList<V>,
    cursor: Option<u128>,
    more: bool, // a node follows the cursor
    completed: bool,
}

impl<'a, V> Drain<'a, V> {
    /// Return whether another value can be consumed.
    #[inline]
    pub fn has_next(&self) -> bool {
        !self.completed
    }

    /// Borrow the value the cursor sits on, without advancing.
    pub fn peek_next(&self) -> Result<&V> {
        let handle = match self.cursor {
            Some(handle) if !self.completed => handle,
            _ => return err_at!(MustHaveNext, msg: "cursor completed"),
        };
        Ok(&self.list.chain.node(handle)?.value)
    }

    /// Unlink the node the cursor sits on, yield its value by move and
    /// advance past it.
    pub fn get_next(&mut self) -> Result<V> {
        let handle = match self.cursor {
            Some(handle) if !self.completed => handle,
            _ => return err_at!(MustHaveNext, msg: "cursor completed"),
        };
        let node = self.list.chain.unlink(handle)?;
        self.cursor = node.next;
        self.completed = !self.more;
        self.more = match node.next {
            Some(next) => self.list.chain.node(next)?.next.is_some(),
            None => false,
        };
        Ok(node.value)
    }

    /// Advance past the current value, leaving its node in place.
    pub fn skip_next(&mut self) -> Result<()> {
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
        Ok(())
    }
}

impl<'a, V> Iterator for Drain<'a, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            self.get_next().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "move_list_test.rs"]
mod move_list_test;
