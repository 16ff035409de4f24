//! Ports module for the Notary subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{NotarisationHandle, NotaryApi};
pub use outbound::{
    ConsumingTx, NotarySigner, SystemTimeSource, TimeSource, TransactionSignature,
    UniquenessProvider,
};
