use arbitrary::{unstructured::Unstructured, Arbitrary};
use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};

use std::collections::BTreeMap;

use super::*;

// (key, black, parent-key, left-key, right-key) in key order.
type Shape = Vec<(u128, bool, Option<u128>, Option<u128>, Option<u128>)>;

fn shape(index: &Index<u64>) -> Shape {
    let key_of = |h: Option<u128>| h.map(|h| index.arena[&h].key);
    let mut out = vec![];
    for (key, _) in index.iter() {
        let handle = index.find(key).unwrap();
        let node = &index.arena[&handle];
        out.push((
            key,
            node.black,
            key_of(node.parent),
            key_of(node.left),
            key_of(node.right),
        ));
    }
    out
}

#[test]
fn test_insert_sequence() {
    let mut index: Index<u64> = Index::new();
    for (i, key) in [10, 5, 15, 3, 7, 13, 17].iter().enumerate() {
        index.insert(*key, i as u64).unwrap();
        index.validate().unwrap();
    }

    let keys: Vec<u128> = index.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec![3, 5, 7, 10, 13, 15, 17]);
    let rkeys: Vec<u128> = index.reverse().map(|(key, _)| key).collect();
    assert_eq!(rkeys, vec![17, 15, 13, 10, 7, 5, 3]);

    let (root_key, _) = index.peek().unwrap();
    assert_eq!(root_key, 10);
    assert_eq!(index.min_key().unwrap(), 3);
    assert_eq!(index.max_key().unwrap(), 17);

    // the sequence settles into a perfect two-level tree.
    let want: Shape = vec![
        (3, false, Some(5), None, None),
        (5, true, Some(10), Some(3), Some(7)),
        (7, false, Some(5), None, None),
        (10, true, None, Some(5), Some(15)),
        (13, false, Some(15), None, None),
        (15, true, Some(10), Some(13), Some(17)),
        (17, false, Some(15), None, None),
    ];
    assert_eq!(shape(&index), want);

    let stats = index.validate().unwrap();
    assert_eq!(stats.n_keys, 7);
    assert_eq!(stats.n_values, 7);
    assert_eq!(stats.blacks, Some(2));
    let depths = stats.depths.unwrap();
    assert_eq!(depths.to_min(), 3);
    assert_eq!(depths.to_max(), 3);
    assert_eq!(depths.to_samples(), 8);
}

#[test]
fn test_duplicates() {
    let mut index: Index<u64> = Index::new();
    index.insert(100, 1).unwrap();
    index.insert(100, 2).unwrap();
    index.insert(100, 3).unwrap();
    index.validate().unwrap();

    assert_eq!(index.key_count(), 1);
    assert_eq!(index.value_count(), 3);
    assert_eq!(index.key_value_count(100).unwrap(), 3);
    assert_eq!(index.values_at(100).unwrap(), &[1, 2, 3]);
    assert_eq!(*index.first_value_at(100).unwrap(), 1);
    assert_eq!(index.min_key().unwrap(), 100);
    assert_eq!(index.max_key().unwrap(), 100);
    assert_eq!(index.peek().unwrap(), (100, &1));
}

#[test]
fn test_insert_fixes() {
    let mut index: Index<u64> = Index::new();
    for key in [21, 15, 31, 10].iter() {
        index.insert(*key, *key as u64).unwrap();
        index.validate().unwrap();
    }
    // red uncle recolored 15 and 31 black on the way.
    let want: Shape = vec![
        (10, false, Some(15), None, None),
        (15, true, Some(21), Some(10), None),
        (21, true, None, Some(15), Some(31)),
        (31, true, Some(21), None, None),
    ];
    assert_eq!(shape(&index), want);

    // 5 lands under 10, black uncle, left-left rotation around 15.
    index.insert(5, 5).unwrap();
    index.validate().unwrap();
    let want: Shape = vec![
        (5, false, Some(10), None, None),
        (10, true, Some(21), Some(5), Some(15)),
        (15, false, Some(10), None, None),
        (21, true, None, Some(10), Some(31)),
        (31, true, Some(21), None, None),
    ];
    assert_eq!(shape(&index), want);
}

#[test]
fn test_delete_value() {
    let mut index: Index<u64> = Index::new();
    index.insert(50, 1).unwrap();
    index.insert(50, 2).unwrap();
    index.insert(50, 1).unwrap();

    // the oldest occurrence leaves first.
    index.delete_value(50, &1).unwrap();
    assert_eq!(index.values_at(50).unwrap(), &[2, 1]);
    assert_eq!(index.value_count(), 2);

    match index.delete_value(50, &9) {
        Err(Error::ValueNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }

    index.delete_value(50, &2).unwrap();
    index.delete_value(50, &1).unwrap();
    // last value took the key with it.
    assert_eq!(index.key_count(), 0);
    assert!(!index.contains_key(50));
    assert!(index.is_empty());
    index.validate().unwrap();

    match index.delete_value(50, &1) {
        Err(Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_delete_key() {
    let mut index: Index<u64> = Index::new();
    for key in 1..=20_u128 {
        index.insert(key, key as u64).unwrap();
        index.validate().unwrap();
    }
    assert_eq!(index.key_count(), 20);

    for key in (1..=20_u128).filter(|k| k % 2 == 1) {
        index.delete_key(key).unwrap();
        index.validate().unwrap();
    }
    let keys: Vec<u128> = index.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, (1..=20_u128).filter(|k| k % 2 == 0).collect::<Vec<u128>>());

    match index.delete_key(1) {
        Err(Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }

    for key in (1..=20_u128).filter(|k| k % 2 == 0) {
        index.delete_key(key).unwrap();
        index.validate().unwrap();
    }
    assert!(index.is_empty());
    assert_eq!(index.value_count(), 0);
    assert_eq!(index.iter().count(), 0);
}

#[test]
fn test_empty_errors() {
    let index: Index<u64> = Index::new();
    match index.min_key() {
        Err(Error::TreeEmpty(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match index.max_key() {
        Err(Error::TreeEmpty(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match index.peek() {
        Err(Error::TreeEmpty(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match index.first_value_at(1) {
        Err(Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match index.values_at(1) {
        Err(Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match index.key_value_count(1) {
        Err(Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    assert!(!index.contains_key(1));
    assert_eq!(index.iter().count(), 0);
    index.validate().unwrap();
}

#[test]
fn test_rbt_ref() {
    let seed: u128 = random();
    println!("test_rbt_ref seed:{}", seed);

    for key_max in [64_u128, 512, 100_000].iter() {
        test_with_key_max(seed, *key_max);
    }
}

fn test_with_key_max(seed: u128, key_max: u128) {
    let mut rng = SmallRng::seed_from_u64((seed + key_max) as u64);

    let mut index: Index<u64> = Index::new();
    let mut btmap: BTreeMap<u128, Vec<u64>> = BTreeMap::new();
    let mut counts = [0_usize; 13];

    for _i in 0..30_000 {
        let bytes = rng.gen::<[u8; 32]>();
        let mut uns = Unstructured::new(&bytes);

        let op: Op = uns.arbitrary().unwrap();
        match op {
            Op::Insert(key, value) => {
                let (key, value) = (key % key_max, value % 8);
                index.insert(key, value).unwrap();
                btmap.entry(key).or_insert_with(Vec::new).push(value);
                counts[0] += 1;
            }
            Op::DeleteValue(key, value) => {
                let (key, value) = (key % key_max, value % 8);
                match index.delete_value(key, &value) {
                    Ok(()) => {
                        let values = btmap.get_mut(&key).unwrap();
                        let pos = values.iter().position(|v| *v == value).unwrap();
                        values.remove(pos);
                        if values.is_empty() {
                            btmap.remove(&key);
                        }
                    }
                    Err(Error::KeyNotFound(_, _)) => assert!(!btmap.contains_key(&key)),
                    Err(Error::ValueNotFound(_, _)) => {
                        assert!(!btmap.get(&key).unwrap().contains(&value))
                    }
                    res => panic!("unexpected {:?}", res),
                }
                counts[1] += 1;
            }
            Op::DeleteKey(key) => {
                let key = key % key_max;
                match index.delete_key(key) {
                    Ok(()) => assert!(btmap.remove(&key).is_some()),
                    Err(Error::KeyNotFound(_, _)) => assert!(!btmap.contains_key(&key)),
                    res => panic!("unexpected {:?}", res),
                }
                counts[2] += 1;
            }
            Op::FirstValueAt(key) => {
                let key = key % key_max;
                match index.first_value_at(key) {
                    Ok(value) => assert_eq!(value, &btmap.get(&key).unwrap()[0]),
                    Err(Error::KeyNotFound(_, _)) => assert!(!btmap.contains_key(&key)),
                    res => panic!("unexpected {:?}", res),
                }
                counts[3] += 1;
            }
            Op::ValuesAt(key) => {
                let key = key % key_max;
                match index.values_at(key) {
                    Ok(values) => assert_eq!(values, btmap.get(&key).unwrap().as_slice()),
                    Err(Error::KeyNotFound(_, _)) => assert!(!btmap.contains_key(&key)),
                    res => panic!("unexpected {:?}", res),
                }
                counts[4] += 1;
            }
            Op::KeyValueCount(key) => {
                let key = key % key_max;
                match index.key_value_count(key) {
                    Ok(n) => assert_eq!(n, btmap.get(&key).unwrap().len()),
                    Err(Error::KeyNotFound(_, _)) => assert!(!btmap.contains_key(&key)),
                    res => panic!("unexpected {:?}", res),
                }
                counts[5] += 1;
            }
            Op::ContainsKey(key) => {
                let key = key % key_max;
                assert_eq!(index.contains_key(key), btmap.contains_key(&key));
                counts[6] += 1;
            }
            Op::MinKey => {
                match index.min_key() {
                    Ok(key) => assert_eq!(Some(&key), btmap.keys().next()),
                    Err(Error::TreeEmpty(_, _)) => assert!(btmap.is_empty()),
                    res => panic!("unexpected {:?}", res),
                }
                counts[7] += 1;
            }
            Op::MaxKey => {
                match index.max_key() {
                    Ok(key) => assert_eq!(Some(&key), btmap.keys().next_back()),
                    Err(Error::TreeEmpty(_, _)) => assert!(btmap.is_empty()),
                    res => panic!("unexpected {:?}", res),
                }
                counts[8] += 1;
            }
            Op::Peek => {
                match index.peek() {
                    Ok((key, value)) => {
                        assert_eq!(value, &btmap.get(&key).unwrap()[0])
                    }
                    Err(Error::TreeEmpty(_, _)) => assert!(btmap.is_empty()),
                    res => panic!("unexpected {:?}", res),
                }
                counts[9] += 1;
            }
            Op::Iter => {
                let mut prev: Option<u128> = None;
                let mut n = 0;
                for ((key, values), (bkey, bvalues)) in index.iter().zip(btmap.iter()) {
                    assert_eq!(key, *bkey);
                    assert_eq!(values, bvalues.as_slice());
                    if let Some(prev) = prev {
                        assert!(key > prev);
                    }
                    prev = Some(key);
                    n += 1;
                }
                assert_eq!(n, btmap.len());
                counts[10] += 1;
            }
            Op::Reverse => {
                let mut n = 0;
                for ((key, values), (bkey, bvalues)) in
                    index.reverse().zip(btmap.iter().rev())
                {
                    assert_eq!(key, *bkey);
                    assert_eq!(values, bvalues.as_slice());
                    n += 1;
                }
                assert_eq!(n, btmap.len());
                counts[12] += 1;
            }
            Op::Validate => {
                index.validate().unwrap();
                counts[11] += 1;
            }
        }
        assert_eq!(index.key_count(), btmap.len());
    }

    println!(
        "test_rbt_ref key_max:{} n_keys:{} counts:{:?}",
        key_max,
        index.key_count(),
        counts
    );

    let stats = index.validate().unwrap();
    assert_eq!(stats.n_keys, btmap.len());
    let n_values: usize = btmap.values().map(|vs| vs.len()).sum();
    assert_eq!(stats.n_values, n_values);
    assert_eq!(index.value_count(), n_values);

    for ((key, values), (bkey, bvalues)) in index.iter().zip(btmap.iter()) {
        assert_eq!(key, *bkey);
        assert_eq!(values, bvalues.as_slice());
    }
    index.close().unwrap();
}

#[test]
fn test_load_index() {
    let seed: u128 = random();
    println!("test_load_index seed:{}", seed);

    let index = load_index(seed, 10_000, 500, 500, 1000);
    let stats = index.validate().unwrap();
    assert_eq!(stats.n_keys, index.key_count());
    assert_eq!(stats.n_values, index.value_count());
    assert_eq!(index.iter().count(), index.key_count());

    // a black-height balanced tree stays within 2*log2(n+1) levels.
    let n = index.key_count();
    if n > 0 {
        let bound = 2 * (((n + 1) as f64).log2().ceil() as usize) + 1;
        let depths = stats.depths.unwrap();
        assert!(depths.to_max() <= bound, "{} > {}", depths.to_max(), bound);
    }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    Insert(u128, u64),
    DeleteValue(u128, u64),
    DeleteKey(u128),
    FirstValueAt(u128),
    ValuesAt(u128),
    KeyValueCount(u128),
    ContainsKey(u128),
    MinKey,
    MaxKey,
    Peek,
    Iter,
    Reverse,
    Validate,
}
