//! Scenario replay against an in-memory deployment.
//!
//! A script names the identities of a deployment and a list of steps. Each
//! step is applied in order; failures are recorded in the report and replay
//! continues. Steps marked `expect_error` count as unexpected when they
//! succeed.

use anyhow::{anyhow, Context, Result};
use rns_registrar::{InMemoryTokenLedger, Registrar, RegistrarConfig, TokenLedger};
use rns_registry::AuthorityRegistry;
use rns_resolver::{LegacyResolver, MultiChainResolver, PublicResolver};
use rns_types::{
    namehash, seal_bid, Address, Amount, ChainId, Clock, ContentHash, LabelHash, ManualClock,
    Node, Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

fn default_tld() -> String {
    "rsk".to_string()
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Top-level label sold by the registrar
    #[serde(default = "default_tld")]
    pub tld: String,
    /// Owner of the root node
    pub root_authority: Address,
    /// Registrar account on the ledger and in the registry
    pub registrar: Address,
    #[serde(default)]
    pub start_time: Timestamp,
    /// Wire a `PublicResolver` in as the resolver's fallback
    #[serde(default = "enabled")]
    pub legacy_fallback: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub op: Op,
    #[serde(default)]
    pub expect_error: bool,
}

/// One operation against the deployment. Registrar steps take a single
/// `label` under the tld; resolver steps take a full dotted `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Mint { account: Address, amount: Amount },
    /// Allow the registrar to pull up to `amount` from `owner`
    Approve { owner: Address, amount: Amount },
    AdvanceTime { secs: u64 },
    NewBid { bidder: Address, label: String, value: Amount, salt: String, deposit: Amount },
    UnsealBid { bidder: Address, label: String, value: Amount, salt: String },
    FinalizeBid { bidder: Address, label: String, value: Amount, salt: String },
    CancelBid { bidder: Address, label: String, value: Amount, salt: String },
    Register { caller: Address, label: String, value: Amount },
    Renew { caller: Address, label: String, value: Amount },
    PayRent { caller: Address, label: String, amount: Amount },
    SetAddr { caller: Address, name: String, addr: Address },
    SetChainAddr { caller: Address, name: String, chain: String, addr: String },
    SetContent { caller: Address, name: String, content: ContentHash },
    LegacySetAddr { caller: Address, name: String, addr: Address },
    LegacySetContent { caller: Address, name: String, content: ContentHash },
    Addr { name: String },
    ChainAddr { name: String, chain: String },
    Content { name: String },
    State { label: String },
    /// Ownership record of a full dotted name in the registry
    Owner { name: String },
    Balance { account: Address },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: Op,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    /// Steps whose outcome differed from `expect_error`
    pub unexpected: usize,
    pub registrar_funds: Amount,
}

/// Registry, ledger, registrar and resolvers wired together in memory.
#[derive(Debug)]
pub struct Deployment {
    pub registry: Arc<AuthorityRegistry>,
    pub ledger: Arc<InMemoryTokenLedger>,
    pub clock: Arc<ManualClock>,
    pub registrar: Registrar,
    pub legacy: Arc<PublicResolver>,
    pub resolver: MultiChainResolver,
}

impl Deployment {
    pub fn new(script: &Script, config: RegistrarConfig) -> Result<Self> {
        let registry = Arc::new(AuthorityRegistry::new(script.root_authority));
        registry
            .set_subnode_owner(
                &script.root_authority,
                &Node::ROOT,
                &LabelHash::of(&script.tld),
                script.registrar,
            )
            .context("failed to delegate the tld to the registrar")?;

        let ledger = Arc::new(InMemoryTokenLedger::new());
        let clock = Arc::new(ManualClock::new(script.start_time));
        let registrar = Registrar::new(
            script.registrar,
            namehash(&script.tld),
            registry.clone(),
            ledger.clone() as Arc<dyn TokenLedger>,
            clock.clone() as Arc<dyn Clock>,
            config,
        )
        .context("failed to create registrar")?;

        let legacy = Arc::new(PublicResolver::new(registry.clone()));
        let fallback = script
            .legacy_fallback
            .then(|| legacy.clone() as Arc<dyn LegacyResolver>);
        let resolver = MultiChainResolver::new(registry.clone(), fallback);

        Ok(Self {
            registry,
            ledger,
            clock,
            registrar,
            legacy,
            resolver,
        })
    }

    pub fn apply(&self, op: &Op) -> Result<Value> {
        let output = match op {
            Op::Mint { account, amount } => {
                self.ledger.mint(account, *amount)?;
                json!({ "balance": self.ledger.balance_of(account) })
            }
            Op::Approve { owner, amount } => {
                self.ledger
                    .approve(owner, &self.registrar.address(), *amount)?;
                json!({ "allowance": amount })
            }
            Op::AdvanceTime { secs } => {
                self.clock.advance(*secs);
                json!({ "now": self.clock.now() })
            }
            Op::NewBid {
                bidder,
                label,
                value,
                salt,
                deposit,
            } => {
                let sealed = seal_bid(&LabelHash::of(label), bidder, *value, &parse_salt(salt)?);
                serde_json::to_value(self.registrar.new_bid(sealed, *deposit, bidder)?)?
            }
            Op::UnsealBid {
                bidder,
                label,
                value,
                salt,
            } => serde_json::to_value(self.registrar.unseal_bid(
                &LabelHash::of(label),
                *value,
                &parse_salt(salt)?,
                bidder,
            )?)?,
            Op::FinalizeBid {
                bidder,
                label,
                value,
                salt,
            } => serde_json::to_value(self.registrar.finalize_bid(
                &LabelHash::of(label),
                *value,
                &parse_salt(salt)?,
                bidder,
            )?)?,
            Op::CancelBid {
                bidder,
                label,
                value,
                salt,
            } => {
                let sealed = seal_bid(&LabelHash::of(label), bidder, *value, &parse_salt(salt)?);
                json!({ "refunded": self.registrar.cancel_bid(&sealed, bidder)? })
            }
            Op::Register {
                caller,
                label,
                value,
            } => serde_json::to_value(self.registrar.register(&LabelHash::of(label), *value, caller)?)?,
            Op::Renew {
                caller,
                label,
                value,
            } => serde_json::to_value(self.registrar.renew(&LabelHash::of(label), *value, caller)?)?,
            Op::PayRent {
                caller,
                label,
                amount,
            } => serde_json::to_value(self.registrar.pay_rent(&LabelHash::of(label), *amount, caller)?)?,
            Op::SetAddr { caller, name, addr } => {
                self.resolver.set_addr(caller, &namehash(name), *addr)?;
                Value::Null
            }
            Op::SetChainAddr {
                caller,
                name,
                chain,
                addr,
            } => {
                self.resolver
                    .set_chain_addr(caller, &namehash(name), &ChainId::of(chain), addr.clone())?;
                Value::Null
            }
            Op::SetContent {
                caller,
                name,
                content,
            } => {
                self.resolver.set_content(caller, &namehash(name), *content)?;
                Value::Null
            }
            Op::LegacySetAddr { caller, name, addr } => {
                self.legacy.set_addr(caller, &namehash(name), *addr)?;
                Value::Null
            }
            Op::LegacySetContent {
                caller,
                name,
                content,
            } => {
                self.legacy.set_content(caller, &namehash(name), *content)?;
                Value::Null
            }
            Op::Addr { name } => json!({ "addr": self.resolver.addr(&namehash(name))? }),
            Op::ChainAddr { name, chain } => json!({
                "chain_addr": self.resolver.chain_addr(&namehash(name), &ChainId::of(chain))
            }),
            Op::Content { name } => json!({ "content": self.resolver.content(&namehash(name))? }),
            Op::State { label } => {
                let label_hash = LabelHash::of(label);
                json!({
                    "state": self.registrar.state(&label_hash),
                    "registration": self.registrar.registration(&label_hash),
                })
            }
            Op::Owner { name } => json!({ "record": self.registry.record(&namehash(name)) }),
            Op::Balance { account } => json!({
                "balance": self.ledger.balance_of(account),
                "allowance": self.ledger.allowance(account, &self.registrar.address()),
            }),
        };
        Ok(output)
    }
}

/// Replay every step of `script` and collect the outcomes.
pub fn run(script: &Script, config: RegistrarConfig) -> Result<RunReport> {
    let deployment = Deployment::new(script, config)?;
    let mut steps = Vec::with_capacity(script.steps.len());
    let mut unexpected = 0;

    for (index, step) in script.steps.iter().enumerate() {
        let outcome = deployment.apply(&step.op);
        let ok = outcome.is_ok();
        if ok == step.expect_error {
            unexpected += 1;
            warn!(index, expect_error = step.expect_error, "step outcome differs from expectation");
        }

        let report = match outcome {
            Ok(output) => StepReport {
                index,
                op: step.op.clone(),
                ok,
                output: Some(output),
                error: None,
            },
            Err(err) => StepReport {
                index,
                op: step.op.clone(),
                ok,
                output: None,
                error: Some(format!("{err:#}")),
            },
        };
        steps.push(report);
    }

    let registrar_funds = deployment.registrar.held_funds();
    info!(steps = steps.len(), unexpected, registrar_funds, "script replayed");
    Ok(RunReport {
        steps,
        unexpected,
        registrar_funds,
    })
}

/// Parse a 32-byte salt from hex, with or without `0x`.
pub fn parse_salt(raw: &str) -> Result<[u8; 32]> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(digits).with_context(|| format!("invalid salt hex {raw}"))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("salt must be 32 bytes, got {len}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rns_registrar::NameState;

    const SAMPLE: &str = include_str!("../scripts/auction.json");

    const ALICE: Address = Address::repeat_byte(0x01);
    const BOB: Address = Address::repeat_byte(0x02);

    fn sample() -> Script {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn sample_script_replays_cleanly() {
        let report = run(&sample(), RegistrarConfig::default()).unwrap();

        let failures: Vec<_> = report
            .steps
            .iter()
            .filter(|step| !step.ok)
            .map(|step| step.index)
            .collect();
        assert_eq!(report.unexpected, 0, "failed steps: {failures:?}");
        assert_eq!(report.registrar_funds, 300_000_000);
    }

    #[test]
    fn sample_script_final_state() {
        let script = sample();
        let deployment = Deployment::new(&script, RegistrarConfig::default()).unwrap();
        for step in &script.steps {
            let _ = deployment.apply(&step.op);
        }

        assert_eq!(
            deployment.registrar.state(&LabelHash::of("alice")),
            NameState::Active
        );
        assert_eq!(deployment.registry.owner(&namehash("bob.rsk")), BOB);
        assert_eq!(deployment.resolver.addr(&namehash("alice.rsk")).unwrap(), ALICE);
        assert_eq!(
            deployment
                .resolver
                .chain_addr(&namehash("alice.rsk"), &ChainId::of("BTC")),
            "1FfmbHfnpaZjKFvyi1okTjJJusN455paPH"
        );
        assert_eq!(deployment.ledger.balance_of(&BOB), 850_000_000);
    }

    #[test]
    fn unexpected_outcomes_are_counted() {
        let script: Script = serde_json::from_value(json!({
            "root_authority": Address::repeat_byte(0xaa),
            "registrar": Address::repeat_byte(0xee),
            "steps": [
                { "op": "register", "caller": ALICE, "label": "alice", "value": 100_000_000u64 },
                { "op": "mint", "account": ALICE, "amount": 5u64, "expect_error": true },
                { "op": "chain_addr", "name": "alice.rsk", "chain": "BTC" }
            ]
        }))
        .unwrap();

        let report = run(&script, RegistrarConfig::default()).unwrap();
        assert_eq!(report.unexpected, 2);
        assert!(!report.steps[0].ok);
        assert!(report.steps[0].error.is_some());
        assert_eq!(report.steps[2].output, Some(json!({ "chain_addr": "" })));
    }

    #[test]
    fn fallback_can_be_disabled() {
        let script: Script = serde_json::from_value(json!({
            "root_authority": Address::repeat_byte(0xaa),
            "registrar": Address::repeat_byte(0xee),
            "legacy_fallback": false,
        }))
        .unwrap();
        let deployment = Deployment::new(&script, RegistrarConfig::default()).unwrap();
        assert!(!deployment.resolver.has_legacy());
        assert_eq!(script.tld, "rsk");
    }

    #[test]
    fn salt_parsing() {
        let salt = parse_salt(&format!("0x{}", "ab".repeat(32))).unwrap();
        assert_eq!(salt, [0xab; 32]);
        assert!(parse_salt("0x1234").is_err());
        assert!(parse_salt("zz").is_err());
    }
}
