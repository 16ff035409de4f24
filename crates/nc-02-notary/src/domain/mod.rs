//! Domain module for the Notary subsystem
//!
//! ## Core Modules
//! - merkle: SHA-256 Merkle trees and inclusion proofs
//! - transactions: Component groups and the closed set of transaction shapes
//! - request: Notarisation requests and their authentication
//! - extractor: Reduction of a transaction to uniqueness facts

pub mod extractor;
pub mod merkle;
pub mod request;
pub mod transactions;

pub use extractor::{extract_parts, TransactionParts};
pub use merkle::{MerkleTree, ProofNode, SiblingPosition};
pub use request::{
    validate_request, NotarisationPayload, NotarisationRequest, NotarisationRequestSignature,
};
pub use transactions::{
    Command, ComponentGroup, ComponentGroupKind, ContractUpgradeWireTransaction, CoreTransaction,
    FilteredComponent, FilteredComponentGroup, FilteredTransaction, NotaryChangeWireTransaction,
    OutputState, WireTransaction, WireTransactionBuilder,
};
