use super::*;

#[test]
fn test_rbt_node() {
    let mut node: Node<u64> = Node::new(10, 200, None, false);
    assert_eq!(node.key, 10);
    assert_eq!(node.values, vec![200]);
    assert_eq!(node.is_black(), false);
    assert_eq!(node.parent, None);
    assert_eq!(node.left, None);
    assert_eq!(node.right, None);

    node.set_black();
    assert_eq!(node.is_black(), true);
    node.set_red();
    assert_eq!(node.is_black(), false);

    node.values.push(300);
    assert_eq!(node.values, vec![200, 300]);

    let node: Node<u64> = Node::new(7, 1, Some(3), true);
    assert_eq!(node.parent, Some(3));
    assert_eq!(node.is_black(), true);
}
