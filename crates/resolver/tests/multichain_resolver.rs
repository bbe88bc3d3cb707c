use proptest::prelude::*;
use rns_registry::AuthorityRegistry;
use rns_resolver::{LegacyResolver, MultiChainResolver, PublicResolver, ResolverError, ResolverRecord};
use rns_types::{namehash, Address, ChainId, ContentHash, LabelHash, Node};
use std::sync::Arc;

const OWNER: Address = Address::repeat_byte(0x10);
const NOT_OWNER: Address = Address::repeat_byte(0x11);
const RSK_ADDRESS_1: Address = Address::repeat_byte(0x12);
const RSK_ADDRESS_2: Address = Address::repeat_byte(0x14);

const BTC_ADDRESS: &str = "1FfmbHfnpaZjKFvyi1okTjJJusN455paPH";
const LTC_ADDRESS: &str = "3MidrAnQ9w1YK6pBqMv7cw5bGLDvPRznph";

struct Fixture {
    node: Node,
    legacy: Arc<PublicResolver>,
    resolver: MultiChainResolver,
    registry: Arc<AuthorityRegistry>,
}

fn fixture() -> Fixture {
    let registry = Arc::new(AuthorityRegistry::new(OWNER));
    registry
        .set_subnode_owner(&OWNER, &Node::ROOT, &LabelHash::of("tld"), OWNER)
        .unwrap();
    let legacy = Arc::new(PublicResolver::new(registry.clone()));
    let resolver = MultiChainResolver::new(
        registry.clone(),
        Some(legacy.clone() as Arc<dyn LegacyResolver>),
    );
    Fixture {
        node: namehash("tld"),
        legacy,
        resolver,
        registry,
    }
}

fn btc() -> ChainId {
    ChainId::of("BTC")
}

fn ltc() -> ChainId {
    ChainId::of("LTC")
}

fn rbtc() -> ChainId {
    ChainId::of("RBTC")
}

#[test]
fn chain_setter_rejects_non_owner() {
    let f = fixture();
    let err = f
        .resolver
        .set_chain_addr(&NOT_OWNER, &f.node, &btc(), BTC_ADDRESS)
        .unwrap_err();

    assert_eq!(
        err,
        ResolverError::NotAuthorized {
            node: f.node,
            caller: NOT_OWNER
        }
    );
    assert_eq!(f.resolver.chain_addr(&f.node, &btc()), "");
}

#[test]
fn stores_addresses_for_multiple_chains() {
    let f = fixture();
    f.resolver
        .set_chain_addr(&OWNER, &f.node, &btc(), BTC_ADDRESS)
        .unwrap();
    f.resolver
        .set_chain_addr(&OWNER, &f.node, &ltc(), LTC_ADDRESS)
        .unwrap();
    f.resolver
        .set_chain_addr(&OWNER, &f.node, &rbtc(), RSK_ADDRESS_1.to_string())
        .unwrap();

    assert_eq!(f.resolver.chain_addr(&f.node, &btc()), BTC_ADDRESS);
    assert_eq!(f.resolver.chain_addr(&f.node, &ltc()), LTC_ADDRESS);
    assert_eq!(
        f.resolver.chain_addr(&f.node, &rbtc()),
        RSK_ADDRESS_1.to_string()
    );
}

#[test]
fn chain_address_can_be_overwritten() {
    let f = fixture();
    f.resolver
        .set_chain_addr(&OWNER, &f.node, &btc(), BTC_ADDRESS)
        .unwrap();
    f.resolver
        .set_chain_addr(&OWNER, &f.node, &btc(), LTC_ADDRESS)
        .unwrap();

    assert_eq!(f.resolver.chain_addr(&f.node, &btc()), LTC_ADDRESS);
}

#[test]
fn addr_setter_rejects_non_owner() {
    let f = fixture();
    assert!(f
        .resolver
        .set_addr(&NOT_OWNER, &f.node, RSK_ADDRESS_1)
        .is_err());
    assert_eq!(f.resolver.addr(&f.node).unwrap(), Address::ZERO);
}

#[test]
fn sets_address_through_default_interface() {
    let f = fixture();
    f.resolver.set_addr(&OWNER, &f.node, RSK_ADDRESS_1).unwrap();
    assert_eq!(f.resolver.addr(&f.node).unwrap(), RSK_ADDRESS_1);
}

#[test]
fn falls_back_to_legacy_when_no_address_is_mapped() {
    let f = fixture();
    f.legacy.set_addr(&OWNER, &f.node, RSK_ADDRESS_1).unwrap();
    assert_eq!(f.resolver.addr(&f.node).unwrap(), RSK_ADDRESS_1);
}

#[test]
fn zero_address_without_mapping_or_legacy() {
    let f = fixture();
    let resolver = MultiChainResolver::new(f.registry.clone(), None);
    assert_eq!(resolver.addr(&f.node).unwrap(), Address::ZERO);
    assert_eq!(resolver.content(&f.node).unwrap(), ContentHash::ZERO);
}

#[test]
fn mapped_address_shadows_legacy() {
    let f = fixture();
    f.legacy.set_addr(&OWNER, &f.node, RSK_ADDRESS_1).unwrap();
    f.resolver.set_addr(&OWNER, &f.node, RSK_ADDRESS_2).unwrap();
    assert_eq!(f.resolver.addr(&f.node).unwrap(), RSK_ADDRESS_2);

    // Later legacy updates are not observed once a local value exists.
    f.legacy.set_addr(&OWNER, &f.node, NOT_OWNER).unwrap();
    assert_eq!(f.resolver.addr(&f.node).unwrap(), RSK_ADDRESS_2);
}

#[test]
fn default_address_is_not_visible_as_chain_address() {
    let f = fixture();
    f.resolver.set_addr(&OWNER, &f.node, RSK_ADDRESS_1).unwrap();
    assert_eq!(f.resolver.chain_addr(&f.node, &rbtc()), "");
}

#[test]
fn chain_address_is_not_visible_as_default_address() {
    let f = fixture();
    let resolver = MultiChainResolver::new(f.registry.clone(), None);
    resolver
        .set_chain_addr(&OWNER, &f.node, &rbtc(), RSK_ADDRESS_1.to_string())
        .unwrap();
    assert_eq!(resolver.addr(&f.node).unwrap(), Address::ZERO);
}

#[test]
fn setting_default_address_keeps_chain_addresses() {
    let f = fixture();
    f.resolver
        .set_chain_addr(&OWNER, &f.node, &btc(), BTC_ADDRESS)
        .unwrap();
    f.resolver.set_addr(&OWNER, &f.node, RSK_ADDRESS_1).unwrap();

    assert_eq!(f.resolver.chain_addr(&f.node, &btc()), BTC_ADDRESS);
    assert_eq!(f.resolver.chain_addr(&f.node, &ltc()), "");
}

#[test]
fn content_setter_rejects_non_owner() {
    let f = fixture();
    assert!(f
        .resolver
        .set_content(&NOT_OWNER, &f.node, ContentHash::of(b"CONTENT1"))
        .is_err());
    assert_eq!(f.resolver.content(&f.node).unwrap(), ContentHash::ZERO);
}

#[test]
fn sets_content_hash() {
    let f = fixture();
    f.resolver
        .set_content(&OWNER, &f.node, ContentHash::of(b"CONTENT1"))
        .unwrap();
    assert_eq!(
        f.resolver.content(&f.node).unwrap(),
        ContentHash::of(b"CONTENT1")
    );
}

#[test]
fn falls_back_to_legacy_when_no_content_is_mapped() {
    let f = fixture();
    f.legacy
        .set_content(&OWNER, &f.node, ContentHash::of(b"CONTENT1"))
        .unwrap();
    assert_eq!(
        f.resolver.content(&f.node).unwrap(),
        ContentHash::of(b"CONTENT1")
    );
}

#[test]
fn mapped_content_shadows_legacy() {
    let f = fixture();
    f.legacy
        .set_content(&OWNER, &f.node, ContentHash::of(b"CONTENT1"))
        .unwrap();
    f.resolver
        .set_content(&OWNER, &f.node, ContentHash::of(b"CONTENT2"))
        .unwrap();
    assert_eq!(
        f.resolver.content(&f.node).unwrap(),
        ContentHash::of(b"CONTENT2")
    );
}

#[test]
fn ownership_transfer_moves_write_rights() {
    let f = fixture();
    f.registry.set_owner(&OWNER, &f.node, NOT_OWNER).unwrap();

    assert!(f.resolver.set_addr(&OWNER, &f.node, RSK_ADDRESS_1).is_err());
    f.resolver
        .set_addr(&NOT_OWNER, &f.node, RSK_ADDRESS_1)
        .unwrap();
    assert_eq!(f.resolver.addr(&f.node).unwrap(), RSK_ADDRESS_1);
}

#[test]
fn record_round_trips_through_json() {
    let f = fixture();
    f.resolver
        .set_chain_addr(&OWNER, &f.node, &btc(), BTC_ADDRESS)
        .unwrap();
    f.resolver.set_addr(&OWNER, &f.node, RSK_ADDRESS_1).unwrap();

    let record = f.resolver.record(&f.node).unwrap();
    let json = serde_json::to_string(&record).unwrap();
    let decoded: ResolverRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, record);
}

proptest! {
    #[test]
    fn chain_and_default_namespaces_stay_disjoint(
        default_byte in 1u8..=255,
        symbol in "[A-Z]{2,6}",
        value in "[1-9A-Za-z]{20,40}",
    ) {
        let f = fixture();
        let chain = ChainId::of(&symbol);
        let before = f.resolver.chain_addr(&f.node, &chain);
        prop_assert_eq!(before, "");

        f.resolver.set_addr(&OWNER, &f.node, Address::repeat_byte(default_byte)).unwrap();
        prop_assert_eq!(f.resolver.chain_addr(&f.node, &chain), "");

        f.resolver.set_chain_addr(&OWNER, &f.node, &chain, value.clone()).unwrap();
        prop_assert_eq!(f.resolver.chain_addr(&f.node, &chain), value);
        prop_assert_eq!(
            f.resolver.addr(&f.node).unwrap(),
            Address::repeat_byte(default_byte)
        );
    }
}
