// Node corresponds to a single element held by a linked list instance.
#[derive(Clone, Debug)]
pub struct Node<V> {
    pub value: V,
    pub handle: u128,
    pub prev: Option<u128>, // unset for the head node
    pub next: Option<u128>, // unset for the tail node
}

impl<V> Node<V> {
    pub fn new(value: V, handle: u128) -> Node<V> {
        Node {
            value,
            handle,
            prev: None,
            next: None,
        }
    }

    #[inline]
    pub fn is_head(&self) -> bool {
        self.prev.is_none()
    }

    #[inline]
    pub fn is_tail(&self) -> bool {
        self.next.is_none()
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
