//! # Transaction Facts Extraction
//!
//! Reduces a transaction to the facts the uniqueness check needs. The notary
//! is non-validating: it never resolves the transaction's history or runs
//! contract code, so an invalid transaction with correctly formed facts is
//! still committed. The committed requester identity is the recourse.
//!
//! | Shape | Checks | Time window |
//! |-------|--------|-------------|
//! | Filtered | Merkle inclusion, INPUTS and TIMEWINDOW fully visible | revealed |
//! | NotaryChange | none | always `None` |
//! | Wire, ContractUpgrade | rejected | - |

use serde::{Deserialize, Serialize};
use shared_types::{Hash, Party, StateRef, TimeWindow};

use super::transactions::{ComponentGroupKind, CoreTransaction};
use crate::error::{NotaryError, NotaryResult};

/// The only data the uniqueness check ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParts {
    pub id: Hash,
    pub inputs: Vec<StateRef>,
    pub time_window: Option<TimeWindow>,
    /// `None` when a filtered transaction hides its notary.
    pub notary: Option<Party>,
}

pub fn extract_parts(transaction: &CoreTransaction) -> NotaryResult<TransactionParts> {
    match transaction {
        CoreTransaction::Filtered(tx) => {
            tx.verify()?;
            tx.check_all_components_visible(ComponentGroupKind::Inputs)?;
            tx.check_all_components_visible(ComponentGroupKind::TimeWindow)?;

            Ok(TransactionParts {
                id: tx.id,
                inputs: tx.inputs()?,
                time_window: tx.time_window()?,
                notary: tx.notary()?,
            })
        }
        CoreTransaction::NotaryChange(tx) => Ok(TransactionParts {
            id: tx.id(),
            inputs: tx.inputs.clone(),
            time_window: None,
            notary: Some(tx.notary.clone()),
        }),
        CoreTransaction::Wire(_) | CoreTransaction::ContractUpgrade(_) => {
            Err(NotaryError::UnsupportedTransactionType {
                found: transaction.type_name().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::merkle::{ProofNode, SiblingPosition};
    use crate::domain::transactions::{
        ContractUpgradeWireTransaction, NotaryChangeWireTransaction, WireTransaction,
    };

    fn notary() -> Party {
        Party::new("O=Notary", [7; 32])
    }

    fn wire() -> WireTransaction {
        WireTransaction::builder()
            .input(StateRef::new([1; 32], 0))
            .notary(notary())
            .time_window(TimeWindow::until_only(5_000))
            .privacy_salt([11; 32])
            .build()
            .unwrap()
    }

    #[test]
    fn test_filtered_extracts_revealed_facts() {
        let tx = wire();
        let ftx = tx.reveal_groups(&[
            ComponentGroupKind::Inputs,
            ComponentGroupKind::TimeWindow,
            ComponentGroupKind::Notary,
        ]);

        let parts = extract_parts(&CoreTransaction::Filtered(ftx)).unwrap();
        assert_eq!(parts.id, tx.id());
        assert_eq!(parts.inputs, vec![StateRef::new([1; 32], 0)]);
        assert_eq!(parts.time_window, Some(TimeWindow::until_only(5_000)));
        assert_eq!(parts.notary, Some(notary()));
    }

    #[test]
    fn test_hidden_notary_extracts_as_none() {
        let ftx = wire().reveal_groups(&[ComponentGroupKind::Inputs, ComponentGroupKind::TimeWindow]);
        let parts = extract_parts(&CoreTransaction::Filtered(ftx)).unwrap();
        assert_eq!(parts.notary, None);
    }

    #[test]
    fn test_hidden_inputs_fail() {
        let ftx = wire().reveal_groups(&[ComponentGroupKind::TimeWindow, ComponentGroupKind::Notary]);
        assert_eq!(
            extract_parts(&CoreTransaction::Filtered(ftx)),
            Err(NotaryError::HiddenComponentFailure {
                group: ComponentGroupKind::Inputs
            })
        );
    }

    #[test]
    fn test_hidden_time_window_fails() {
        let ftx = wire().reveal_groups(&[ComponentGroupKind::Inputs, ComponentGroupKind::Notary]);
        assert_eq!(
            extract_parts(&CoreTransaction::Filtered(ftx)),
            Err(NotaryError::HiddenComponentFailure {
                group: ComponentGroupKind::TimeWindow
            })
        );
    }

    #[test]
    fn test_tampered_component_fails_before_visibility() {
        let mut ftx = wire().reveal_groups(&[ComponentGroupKind::TimeWindow]);
        ftx.filtered_groups[0].components[0].data =
            bincode::serialize(&TimeWindow::until_only(9_999_999)).unwrap();

        assert!(matches!(
            extract_parts(&CoreTransaction::Filtered(ftx)),
            Err(NotaryError::MerkleVerificationFailure { .. })
        ));
    }

    #[test]
    fn test_overlong_proof_path_fails_verification() {
        let mut ftx = wire().reveal_groups(&[
            ComponentGroupKind::Inputs,
            ComponentGroupKind::TimeWindow,
            ComponentGroupKind::Notary,
        ]);
        ftx.filtered_groups[0].components[0].path = vec![
            ProofNode {
                hash: [0; 32],
                position: SiblingPosition::Left,
            };
            65
        ];

        assert!(matches!(
            extract_parts(&CoreTransaction::Filtered(ftx)),
            Err(NotaryError::MerkleVerificationFailure { .. })
        ));
    }

    #[test]
    fn test_inverted_time_window_is_invalid() {
        let tx = WireTransaction::builder()
            .input(StateRef::new([1; 32], 0))
            .time_window(TimeWindow {
                from_time: Some(5_000),
                until_time: Some(5_000),
            })
            .privacy_salt([11; 32])
            .build()
            .unwrap();
        let ftx = tx.reveal_groups(&[ComponentGroupKind::Inputs, ComponentGroupKind::TimeWindow]);

        assert!(matches!(
            extract_parts(&CoreTransaction::Filtered(ftx)),
            Err(NotaryError::TransactionInvalid { .. })
        ));
    }

    #[test]
    fn test_notary_change_has_no_time_window() {
        let tx = NotaryChangeWireTransaction {
            inputs: vec![StateRef::new([2; 32], 0)],
            references: vec![],
            notary: notary(),
            new_notary: Party::new("O=New Notary", [8; 32]),
        };

        let parts = extract_parts(&CoreTransaction::NotaryChange(tx.clone())).unwrap();
        assert_eq!(parts.id, tx.id());
        assert_eq!(parts.inputs, vec![StateRef::new([2; 32], 0)]);
        assert_eq!(parts.time_window, None);
        assert_eq!(parts.notary, Some(notary()));
    }

    #[test]
    fn test_wire_and_upgrade_are_unsupported() {
        let err = extract_parts(&CoreTransaction::Wire(wire())).unwrap_err();
        assert_eq!(
            err,
            NotaryError::UnsupportedTransactionType {
                found: "WireTransaction".into()
            }
        );

        let upgrade = ContractUpgradeWireTransaction {
            inputs: vec![StateRef::new([1; 32], 0)],
            notary: notary(),
            legacy_contract_attachment: [3; 32],
            upgraded_contract_class: "CashV2".into(),
            privacy_salt: [4; 32],
        };
        assert!(matches!(
            extract_parts(&CoreTransaction::ContractUpgrade(upgrade)),
            Err(NotaryError::UnsupportedTransactionType { .. })
        ));
    }
}
