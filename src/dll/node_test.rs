use super::*;

#[test]
fn test_node() {
    let node: Node<u64> = Node::new(42, 7);
    assert_eq!(node.value, 42);
    assert_eq!(node.handle, 7);
    assert!(node.is_head());
    assert!(node.is_tail());

    let mut node = node;
    node.prev = Some(3);
    assert!(!node.is_head());
    assert!(node.is_tail());
    node.next = Some(9);
    assert!(!node.is_tail());
}
