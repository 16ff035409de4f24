//! # nc-02-notary
//!
//! Non-validating notary: prevents double spends by committing the input
//! states of transactions it is shown only in part.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Filtered Transactions**: Merkle-committed component groups with selective reveal
//! - **Request Authentication**: requester signatures over the inputs they want consumed
//! - **Uniqueness Commits**: one atomic check-and-insert per notarisation
//! - **Notarisation Flows**: requester and notary sides of the exchange
//!
//! ## Architecture
//!
//! ```text
//! Requester                             Notary node
//!   NotaryClientFlow ──payload──→ NotaryService::accept_session
//!         ↑                              │
//!         │                     NonValidatingNotaryFlow
//!         │                              │
//!         │                   authenticate → extract_parts
//!         │                              │
//!         │                     UniquenessProvider::commit
//!         │                              │
//!         └──── Signed / Rejected ◄── NotarySigner
//! ```
//!
//! ## Trust Model
//!
//! | Checked | Not checked |
//! |---------|-------------|
//! | request signed by the session counterparty | contract validity |
//! | revealed components committed to by the id | transaction history |
//! | inputs and time window fully revealed | hidden outputs or commands |
//! | notary identity and time window | |
//!
//! ## Example
//!
//! ```rust,ignore
//! use nc_02_notary::{NotaryService, NotaryConfig, InMemoryUniquenessProvider, Ed25519NotarySigner};
//! use nc_02_notary::ports::inbound::NotaryApi;
//!
//! let service = NotaryService::new(
//!     notary_identity,
//!     NotaryConfig::from_env(),
//!     Arc::new(InMemoryUniquenessProvider::new()),
//!     Arc::new(Ed25519NotarySigner::new(notary_key, 4)),
//! );
//!
//! // Serve a session opened by a requester
//! let handle = service.accept_session(&engine, session)?;
//! let signature = handle.result().await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod flows;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{Ed25519NotarySigner, FixedTimeSource, InMemoryUniquenessProvider};
pub use domain::{
    extract_parts, validate_request, ComponentGroupKind, CoreTransaction, FilteredTransaction,
    MerkleTree, NotarisationPayload, NotarisationRequest, NotarisationRequestSignature,
    NotaryChangeWireTransaction, TransactionParts, WireTransaction,
};
pub use error::{NotaryError, NotaryResult, StateConflict, UniquenessError};
pub use flows::{NonValidatingNotaryFlow, NotarisationResponse, NotaryClientFlow, NotaryFlowState};
pub use ports::{
    NotarisationHandle, NotaryApi, NotarySigner, TimeSource, TransactionSignature,
    UniquenessProvider,
};
pub use service::{NotaryConfig, NotaryService};
