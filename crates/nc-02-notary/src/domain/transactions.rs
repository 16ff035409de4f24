//! # Transaction Model
//!
//! The closed set of transaction shapes a notary can be asked to sign.
//!
//! ## Component Groups
//!
//! A [`WireTransaction`] stores its contents as eight ordered component
//! groups of bincode-encoded components. Its id commits to all of them:
//!
//! ```text
//! component leaf = H(nonce || H(component bytes))
//! nonce          = H(privacy_salt || group ordinal || component index)
//! group hash     = Merkle root of the group's leaves (ZERO_HASH if empty)
//! id             = Merkle root of the eight group hashes
//! ```
//!
//! A [`FilteredTransaction`] reveals a subset of components, each with its
//! nonce and inclusion proof, plus all eight group hashes. Hidden components
//! cannot be recovered from the nonces of revealed ones.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, sha256_many, Sha256Hasher};
use shared_types::{Hash, Party, PublicKey, StateRef, TimeWindow, ZERO_HASH};
use std::fmt;

use super::merkle::{MerkleTree, ProofNode, MAX_PROOF_DEPTH};
use crate::error::{NotaryError, NotaryResult};

// =============================================================================
// COMPONENT GROUPS
// =============================================================================

/// The component groups of a transaction, in commitment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentGroupKind {
    Inputs,
    Outputs,
    Commands,
    Attachments,
    Notary,
    TimeWindow,
    Signers,
    References,
}

impl ComponentGroupKind {
    pub const COUNT: usize = 8;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Inputs,
        Self::Outputs,
        Self::Commands,
        Self::Attachments,
        Self::Notary,
        Self::TimeWindow,
        Self::Signers,
        Self::References,
    ];

    /// Position of this group's hash in the id commitment.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ComponentGroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inputs => "INPUTS",
            Self::Outputs => "OUTPUTS",
            Self::Commands => "COMMANDS",
            Self::Attachments => "ATTACHMENTS",
            Self::Notary => "NOTARY",
            Self::TimeWindow => "TIMEWINDOW",
            Self::Signers => "SIGNERS",
            Self::References => "REFERENCES",
        };
        write!(f, "{}_GROUP", name)
    }
}

/// One group's encoded components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentGroup {
    pub kind: ComponentGroupKind,
    pub components: Vec<Vec<u8>>,
}

/// Output state as the notary sees it: opaque contract data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    pub contract: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub signers: Vec<PublicKey>,
}

/// Blinding nonce of component `index` in group `kind`.
pub fn component_nonce(privacy_salt: &Hash, kind: ComponentGroupKind, index: usize) -> Hash {
    sha256_many(&[
        privacy_salt.as_slice(),
        &[kind.ordinal() as u8][..],
        &(index as u32).to_le_bytes()[..],
    ])
}

/// Merkle leaf committing to one component.
pub fn component_leaf(nonce: &Hash, data: &[u8]) -> Hash {
    sha256_many(&[nonce.as_slice(), &sha256(data)[..]])
}

fn encode<T: Serialize>(kind: ComponentGroupKind, value: &T) -> NotaryResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| NotaryError::TransactionInvalid {
        reason: format!("cannot encode {} component: {}", kind, e),
    })
}

fn decode<T: DeserializeOwned>(kind: ComponentGroupKind, bytes: &[u8]) -> NotaryResult<T> {
    bincode::deserialize(bytes).map_err(|e| NotaryError::TransactionInvalid {
        reason: format!("malformed {} component: {}", kind, e),
    })
}

fn at_most_one<T>(kind: ComponentGroupKind, mut values: Vec<T>) -> NotaryResult<Option<T>> {
    if values.len() > 1 {
        return Err(NotaryError::TransactionInvalid {
            reason: format!("{} holds {} components, expected at most one", kind, values.len()),
        });
    }
    Ok(values.pop())
}

fn well_formed(window: Option<TimeWindow>) -> NotaryResult<Option<TimeWindow>> {
    match window {
        Some(w) if !w.is_well_formed() => Err(NotaryError::TransactionInvalid {
            reason: format!("malformed time window {}", w),
        }),
        _ => Ok(window),
    }
}

// =============================================================================
// WIRE TRANSACTION
// =============================================================================

/// A complete, unfiltered transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    component_groups: Vec<ComponentGroup>,
    privacy_salt: Hash,
}

impl WireTransaction {
    pub fn builder() -> WireTransactionBuilder {
        WireTransactionBuilder::default()
    }

    pub fn component_groups(&self) -> &[ComponentGroup] {
        &self.component_groups
    }

    fn components(&self, kind: ComponentGroupKind) -> &[Vec<u8>] {
        self.component_groups
            .iter()
            .find(|g| g.kind == kind)
            .map(|g| g.components.as_slice())
            .unwrap_or(&[])
    }

    fn group_tree(&self, kind: ComponentGroupKind) -> MerkleTree {
        let leaves = self
            .components(kind)
            .iter()
            .enumerate()
            .map(|(i, data)| component_leaf(&component_nonce(&self.privacy_salt, kind, i), data))
            .collect();
        MerkleTree::build(leaves)
    }

    /// Merkle root of every group, in [`ComponentGroupKind::ALL`] order.
    pub fn group_hashes(&self) -> Vec<Hash> {
        ComponentGroupKind::ALL
            .iter()
            .map(|kind| self.group_tree(*kind).root())
            .collect()
    }

    pub fn id(&self) -> Hash {
        MerkleTree::build(self.group_hashes()).root()
    }

    fn decode_group<T: DeserializeOwned>(&self, kind: ComponentGroupKind) -> NotaryResult<Vec<T>> {
        self.components(kind)
            .iter()
            .map(|bytes| decode(kind, bytes))
            .collect()
    }

    pub fn inputs(&self) -> NotaryResult<Vec<StateRef>> {
        self.decode_group(ComponentGroupKind::Inputs)
    }

    pub fn outputs(&self) -> NotaryResult<Vec<OutputState>> {
        self.decode_group(ComponentGroupKind::Outputs)
    }

    pub fn notary(&self) -> NotaryResult<Option<Party>> {
        at_most_one(
            ComponentGroupKind::Notary,
            self.decode_group(ComponentGroupKind::Notary)?,
        )
    }

    pub fn time_window(&self) -> NotaryResult<Option<TimeWindow>> {
        well_formed(at_most_one(
            ComponentGroupKind::TimeWindow,
            self.decode_group(ComponentGroupKind::TimeWindow)?,
        )?)
    }

    pub fn references(&self) -> NotaryResult<Vec<StateRef>> {
        self.decode_group(ComponentGroupKind::References)
    }

    /// Reveal the components for which `reveal(kind, index)` holds, with
    /// inclusion proofs against this transaction's id.
    pub fn build_filtered_transaction(
        &self,
        reveal: impl Fn(ComponentGroupKind, usize) -> bool,
    ) -> FilteredTransaction {
        let mut filtered_groups = Vec::new();

        for kind in ComponentGroupKind::ALL {
            let tree = self.group_tree(kind);
            let components: Vec<FilteredComponent> = self
                .components(kind)
                .iter()
                .enumerate()
                .filter(|(index, _)| reveal(kind, *index))
                .filter_map(|(index, data)| {
                    let path = tree.generate_proof(index).ok()?;
                    Some(FilteredComponent {
                        data: data.clone(),
                        nonce: component_nonce(&self.privacy_salt, kind, index),
                        path,
                    })
                })
                .collect();

            if !components.is_empty() {
                filtered_groups.push(FilteredComponentGroup { kind, components });
            }
        }

        FilteredTransaction {
            id: self.id(),
            filtered_groups,
            group_hashes: self.group_hashes(),
        }
    }

    /// Reveal every component of the listed groups and nothing else.
    pub fn reveal_groups(&self, kinds: &[ComponentGroupKind]) -> FilteredTransaction {
        self.build_filtered_transaction(|kind, _| kinds.contains(&kind))
    }
}

/// Assembles a [`WireTransaction`] from typed components.
#[derive(Debug, Clone, Default)]
pub struct WireTransactionBuilder {
    inputs: Vec<StateRef>,
    outputs: Vec<OutputState>,
    commands: Vec<Command>,
    attachments: Vec<Hash>,
    notary: Option<Party>,
    time_window: Option<TimeWindow>,
    references: Vec<StateRef>,
    privacy_salt: Hash,
}

impl WireTransactionBuilder {
    pub fn input(mut self, state: StateRef) -> Self {
        self.inputs.push(state);
        self
    }

    pub fn output(mut self, output: OutputState) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn attachment(mut self, id: Hash) -> Self {
        self.attachments.push(id);
        self
    }

    pub fn notary(mut self, notary: Party) -> Self {
        self.notary = Some(notary);
        self
    }

    pub fn time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn reference(mut self, state: StateRef) -> Self {
        self.references.push(state);
        self
    }

    /// Salt blinding every component nonce. Must be secret and random.
    pub fn privacy_salt(mut self, salt: Hash) -> Self {
        self.privacy_salt = salt;
        self
    }

    pub fn build(self) -> NotaryResult<WireTransaction> {
        fn group<T: Serialize>(kind: ComponentGroupKind, values: &[T]) -> NotaryResult<ComponentGroup> {
            Ok(ComponentGroup {
                kind,
                components: values
                    .iter()
                    .map(|v| encode(kind, v))
                    .collect::<NotaryResult<_>>()?,
            })
        }

        let names: Vec<&str> = self.commands.iter().map(|c| c.name.as_str()).collect();
        let signers: Vec<&Vec<PublicKey>> = self.commands.iter().map(|c| &c.signers).collect();

        let component_groups = vec![
            group(ComponentGroupKind::Inputs, &self.inputs)?,
            group(ComponentGroupKind::Outputs, &self.outputs)?,
            group(ComponentGroupKind::Commands, &names)?,
            group(ComponentGroupKind::Attachments, &self.attachments)?,
            group(ComponentGroupKind::Notary, self.notary.as_slice())?,
            group(ComponentGroupKind::TimeWindow, self.time_window.as_slice())?,
            group(ComponentGroupKind::Signers, &signers)?,
            group(ComponentGroupKind::References, &self.references)?,
        ];

        Ok(WireTransaction {
            component_groups,
            privacy_salt: self.privacy_salt,
        })
    }
}

// =============================================================================
// FILTERED TRANSACTION
// =============================================================================

/// A revealed component with its inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredComponent {
    pub data: Vec<u8>,
    pub nonce: Hash,
    pub path: Vec<ProofNode>,
}

impl FilteredComponent {
    pub fn leaf_hash(&self) -> Hash {
        component_leaf(&self.nonce, &self.data)
    }

    /// Position within its group, as committed to by the proof path.
    pub fn index(&self) -> Option<usize> {
        MerkleTree::leaf_index(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredComponentGroup {
    pub kind: ComponentGroupKind,
    /// Revealed components in ascending index order.
    pub components: Vec<FilteredComponent>,
}

/// A partially revealed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransaction {
    pub id: Hash,
    pub filtered_groups: Vec<FilteredComponentGroup>,
    pub group_hashes: Vec<Hash>,
}

impl FilteredTransaction {
    fn revealed(&self, kind: ComponentGroupKind) -> &[FilteredComponent] {
        self.filtered_groups
            .iter()
            .find(|g| g.kind == kind)
            .map(|g| g.components.as_slice())
            .unwrap_or(&[])
    }

    /// Check every revealed component is committed to by `id`.
    pub fn verify(&self) -> NotaryResult<()> {
        let fail = |reason: String| NotaryError::MerkleVerificationFailure { reason };

        if self.group_hashes.len() != ComponentGroupKind::COUNT {
            return Err(fail(format!(
                "expected {} group hashes, got {}",
                ComponentGroupKind::COUNT,
                self.group_hashes.len()
            )));
        }
        if MerkleTree::build(self.group_hashes.clone()).root() != self.id {
            return Err(fail("group hashes do not commit to transaction id".into()));
        }

        let mut seen = [false; ComponentGroupKind::COUNT];
        for group in &self.filtered_groups {
            let ordinal = group.kind.ordinal();
            if std::mem::replace(&mut seen[ordinal], true) {
                return Err(fail(format!("{} revealed twice", group.kind)));
            }

            let root = self.group_hashes[ordinal];
            let Some(first) = group.components.first() else {
                continue;
            };
            if root == ZERO_HASH {
                return Err(fail(format!("{} is empty but has revealed components", group.kind)));
            }

            let depth = first.path.len();
            if depth == 0 || depth > MAX_PROOF_DEPTH {
                return Err(fail(format!(
                    "proof depth {} in {} outside 1..={}",
                    depth, group.kind, MAX_PROOF_DEPTH
                )));
            }

            let mut previous: Option<usize> = None;
            for (position, component) in group.components.iter().enumerate() {
                if component.path.len() != depth {
                    return Err(fail(format!("inconsistent proof depth in {}", group.kind)));
                }
                if !MerkleTree::verify_proof(&component.leaf_hash(), &component.path, &root) {
                    return Err(fail(format!(
                        "revealed component {} of {} not included under committed root",
                        position, group.kind
                    )));
                }
                let index = component
                    .index()
                    .ok_or_else(|| fail(format!("unaddressable proof in {}", group.kind)))?;
                if previous.is_some_and(|p| index <= p) {
                    return Err(fail(format!("components of {} out of order", group.kind)));
                }
                previous = Some(index);
            }
        }

        Ok(())
    }

    /// Check that every component of `kind` is revealed.
    ///
    /// Rebuilds the group root from the revealed leaves alone; any hidden
    /// component makes it differ from the committed group hash.
    pub fn check_all_components_visible(&self, kind: ComponentGroupKind) -> NotaryResult<()> {
        let hidden = || NotaryError::HiddenComponentFailure { group: kind };

        let root = *self.group_hashes.get(kind.ordinal()).ok_or_else(hidden)?;
        let revealed = self.revealed(kind);

        if revealed.is_empty() {
            return if root == ZERO_HASH { Ok(()) } else { Err(hidden()) };
        }
        if revealed.iter().enumerate().any(|(i, c)| c.index() != Some(i)) {
            return Err(hidden());
        }

        let tree = MerkleTree::build(revealed.iter().map(FilteredComponent::leaf_hash).collect());
        if tree.root() != root || revealed.iter().any(|c| c.path.len() != tree.depth()) {
            return Err(hidden());
        }
        Ok(())
    }

    fn decode_revealed<T: DeserializeOwned>(&self, kind: ComponentGroupKind) -> NotaryResult<Vec<T>> {
        self.revealed(kind)
            .iter()
            .map(|c| decode(kind, &c.data))
            .collect()
    }

    /// Revealed input states.
    pub fn inputs(&self) -> NotaryResult<Vec<StateRef>> {
        self.decode_revealed(ComponentGroupKind::Inputs)
    }

    /// Revealed time window; one without bounds or with `from >= until`
    /// is refused.
    pub fn time_window(&self) -> NotaryResult<Option<TimeWindow>> {
        well_formed(at_most_one(
            ComponentGroupKind::TimeWindow,
            self.decode_revealed(ComponentGroupKind::TimeWindow)?,
        )?)
    }

    /// Revealed notary, `None` if the notary group is hidden.
    pub fn notary(&self) -> NotaryResult<Option<Party>> {
        at_most_one(
            ComponentGroupKind::Notary,
            self.decode_revealed(ComponentGroupKind::Notary)?,
        )
    }
}

// =============================================================================
// NOTARY CHANGE AND CONTRACT UPGRADE
// =============================================================================

fn hash_party(hasher: &mut Sha256Hasher, party: &Party) {
    hasher
        .update(&(party.name.len() as u32).to_le_bytes())
        .update(party.name.as_bytes())
        .update(&party.owning_key);
}

fn hash_states(hasher: &mut Sha256Hasher, states: &[StateRef]) {
    hasher.update(&(states.len() as u32).to_le_bytes());
    for state in states {
        hasher.update(&state.txhash).update(&state.index.to_le_bytes());
    }
}

/// Moves states from one notary to another. Fully revealed by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryChangeWireTransaction {
    pub inputs: Vec<StateRef>,
    pub references: Vec<StateRef>,
    pub notary: Party,
    pub new_notary: Party,
}

impl NotaryChangeWireTransaction {
    pub fn id(&self) -> Hash {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"notary-change");
        hash_states(&mut hasher, &self.inputs);
        hash_states(&mut hasher, &self.references);
        hash_party(&mut hasher, &self.notary);
        hash_party(&mut hasher, &self.new_notary);
        hasher.finalize()
    }
}

/// Replaces a state's contract with an upgraded version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUpgradeWireTransaction {
    pub inputs: Vec<StateRef>,
    pub notary: Party,
    pub legacy_contract_attachment: Hash,
    pub upgraded_contract_class: String,
    pub privacy_salt: Hash,
}

impl ContractUpgradeWireTransaction {
    pub fn id(&self) -> Hash {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"contract-upgrade");
        hash_states(&mut hasher, &self.inputs);
        hash_party(&mut hasher, &self.notary);
        hasher
            .update(&self.legacy_contract_attachment)
            .update(&(self.upgraded_contract_class.len() as u32).to_le_bytes())
            .update(self.upgraded_contract_class.as_bytes())
            .update(&self.privacy_salt);
        hasher.finalize()
    }
}

// =============================================================================
// CORE TRANSACTION
// =============================================================================

/// Every transaction shape a notarisation payload can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreTransaction {
    Filtered(FilteredTransaction),
    NotaryChange(NotaryChangeWireTransaction),
    Wire(WireTransaction),
    ContractUpgrade(ContractUpgradeWireTransaction),
}

impl CoreTransaction {
    pub fn id(&self) -> Hash {
        match self {
            Self::Filtered(tx) => tx.id,
            Self::NotaryChange(tx) => tx.id(),
            Self::Wire(tx) => tx.id(),
            Self::ContractUpgrade(tx) => tx.id(),
        }
    }

    /// Input states as visible in this shape.
    pub fn inputs(&self) -> NotaryResult<Vec<StateRef>> {
        match self {
            Self::Filtered(tx) => tx.inputs(),
            Self::NotaryChange(tx) => Ok(tx.inputs.clone()),
            Self::Wire(tx) => tx.inputs(),
            Self::ContractUpgrade(tx) => Ok(tx.inputs.clone()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Filtered(_) => "FilteredTransaction",
            Self::NotaryChange(_) => "NotaryChangeWireTransaction",
            Self::Wire(_) => "WireTransaction",
            Self::ContractUpgrade(_) => "ContractUpgradeWireTransaction",
        }
    }
}
