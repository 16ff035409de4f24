//! # Notary-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/      # Requester and notary flows over one in-memory network
//! │   └── notarisation_flows.rs
//! │
//! └── mocks/            # Test doubles for ports the notary core never implements
//!     └── attachment_storage.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p nc-tests
//!
//! # By category
//! cargo test -p nc-tests integration::
//! cargo test -p nc-tests mocks::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
pub mod mocks;
