//! The registry is shared by reference: every holder of the `Arc` observes a
//! write immediately, including writers on other threads.

use rns_registry::{AuthorityRegistry, OwnershipRecord};
use rns_types::{namehash, Address, LabelHash, Node};
use std::sync::Arc;
use std::thread;

#[test]
fn writes_are_visible_through_every_handle() {
    let root = Address::repeat_byte(0xaa);
    let registry = Arc::new(AuthorityRegistry::new(root));
    let registrar_view = Arc::clone(&registry);
    let resolver_view = Arc::clone(&registry);

    let handles: Vec<_> = ["alpha", "beta", "gamma", "delta"]
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            let registry = Arc::clone(&registrar_view);
            thread::spawn(move || {
                registry
                    .set_subnode_owner(
                        &root,
                        &Node::ROOT,
                        &LabelHash::of(label),
                        Address::repeat_byte(i as u8 + 1),
                    )
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for (i, label) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
        assert_eq!(
            resolver_view.owner(&namehash(label)),
            Address::repeat_byte(i as u8 + 1)
        );
    }
    assert_eq!(registry.nodes_owned_by(&root), vec![Node::ROOT]);
}

#[test]
fn ownership_record_serializes_with_hex_addresses() {
    let record = OwnershipRecord {
        owner: Address::repeat_byte(0x01),
        ..Default::default()
    };
    let json = serde_json::to_value(record).unwrap();
    assert_eq!(
        json["owner"],
        "0x0101010101010101010101010101010101010101"
    );
    assert_eq!(json["ttl"], 0);
}
