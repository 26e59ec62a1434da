use super::*;

#[test]
fn test_encode_decode_empty_block() {
    let block = IndexBlock::new();
    let bytes = encode(&block).unwrap();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded.len(), 0);
}

#[test]
fn test_encode_decode_roundtrip_preserves_entries() {
    let mut block = IndexBlock::new();
    block.put(
        b"aa".to_vec(),
        Entry::Leaf {
            key: b"aakey".to_vec(),
            value: Some(7),
        },
    );
    block.put(
        b"bb".to_vec(),
        Entry::Leaf {
            key: b"bbkey".to_vec(),
            value: None,
        },
    );
    block.put(b"cc".to_vec(), Entry::Persisted { offset: 1234 });

    let bytes = encode(&block).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.len(), 3);
    assert_eq!(
        decoded.get(b"aa"),
        Some(&Entry::Leaf {
            key: b"aakey".to_vec(),
            value: Some(7),
        })
    );
    assert_eq!(
        decoded.get(b"bb"),
        Some(&Entry::Leaf {
            key: b"bbkey".to_vec(),
            value: None,
        })
    );
    assert_eq!(decoded.get(b"cc"), Some(&Entry::Persisted { offset: 1234 }));
}

#[test]
fn test_fragments_iterate_in_lexicographic_order() {
    let mut block = IndexBlock::new();
    block.put(b"zz".to_vec(), Entry::Persisted { offset: 1 });
    block.put(b"aa".to_vec(), Entry::Persisted { offset: 2 });
    block.put(b"mm".to_vec(), Entry::Persisted { offset: 3 });

    let frags: Vec<&Vec<u8>> = block.fragments().collect();
    assert_eq!(frags, vec![&b"aa".to_vec(), &b"mm".to_vec(), &b"zz".to_vec()]);
}

#[test]
#[should_panic(expected = "dirty")]
fn test_encode_panics_on_dirty_entry() {
    let mut block = IndexBlock::new();
    block.put(b"aa".to_vec(), Entry::Dirty { arena_idx: 0 });
    let _ = encode(&block);
}
