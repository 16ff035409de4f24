//! # Notarisation Flow Integration Tests
//!
//! Requester nodes and one notary node, each with its own flow engine,
//! exchanging messages over a shared in-memory network.
//!
//! ## Scenarios Tested:
//!
//! 1. **Commit**: a correctly signed filtered transaction is committed and signed
//! 2. **Double spend**: a second transaction spending a consumed state gets `Conflict`
//! 3. **Races**: of concurrent overlapping requests exactly one commits
//! 4. **Forged requests**: a signature over other inputs never reaches the uniqueness store
//! 5. **Notary change**: inputs are committed without a time window
//! 6. **Cancellation**: closing a pending handle resolves it to `Cancelled`

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use nc_01_flow_engine::{
        FlowContext, FlowEngine, FlowEngineConfig, FlowFailure, FlowLogic, FlowSession,
        FlowStarter, InMemoryCheckpointStorage, InMemoryNetwork,
    };
    use nc_02_notary::flows::client::{REQUESTING, VALIDATING};
    use nc_02_notary::{
        extract_parts, ComponentGroupKind, CoreTransaction, Ed25519NotarySigner,
        FixedTimeSource, InMemoryUniquenessProvider, NotarisationPayload, NotarisationRequest,
        NotarisationResponse, NotaryApi, NotaryChangeWireTransaction, NotaryClientFlow,
        NotaryConfig, NotaryError, NotaryService, StateConflict, TransactionSignature,
        UniquenessProvider, WireTransaction,
    };
    use shared_crypto::{sha256, Ed25519KeyPair};
    use shared_types::{Party, StateRef, TimeWindow};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const NOW: u64 = 1_700_000_000_000;

    type Outcome = Result<TransactionSignature, FlowFailure<NotaryError>>;

    /// A node that requests notarisations.
    struct Requester {
        party: Party,
        key: Arc<Ed25519KeyPair>,
        engine: FlowEngine,
    }

    impl Requester {
        fn new(name: &str) -> Self {
            let key = Arc::new(Ed25519KeyPair::generate());
            let party = Party::new(name, *key.public_key().as_bytes());
            let engine = FlowEngine::new(
                FlowEngineConfig::default(),
                party.clone(),
                Arc::new(InMemoryCheckpointStorage::new()),
            );
            Self { party, key, engine }
        }
    }

    /// The notary node and the network it listens on.
    struct NotaryNode {
        party: Party,
        engine: FlowEngine,
        uniqueness: Arc<InMemoryUniquenessProvider>,
        service: NotaryService<InMemoryUniquenessProvider, Ed25519NotarySigner>,
        network: InMemoryNetwork,
    }

    impl NotaryNode {
        fn new() -> Self {
            let key = Ed25519KeyPair::generate();
            let party = Party::new("O=Notary Service, L=Zurich", *key.public_key().as_bytes());
            let engine = FlowEngine::new(
                FlowEngineConfig::default(),
                party.clone(),
                Arc::new(InMemoryCheckpointStorage::new()),
            );
            let uniqueness = Arc::new(InMemoryUniquenessProvider::new());
            let service = NotaryService::with_time_source(
                party.clone(),
                NotaryConfig::default(),
                uniqueness.clone(),
                Arc::new(Ed25519NotarySigner::new(key, 4)),
                Arc::new(FixedTimeSource::new(NOW)),
            );

            Self {
                party,
                engine,
                uniqueness,
                service,
                network: InMemoryNetwork::new(),
            }
        }

        /// Open a session from `requester`, serve it, and start the client side.
        fn request(
            &self,
            requester: &Requester,
            transaction: CoreTransaction,
        ) -> (
            nc_01_flow_engine::FlowHandle<TransactionSignature, NotaryError>,
            nc_02_notary::NotarisationHandle,
        ) {
            let (to_notary, to_requester) = self.network.connect(&requester.party, &self.party);
            let served = self
                .service
                .accept_session(&self.engine, to_requester)
                .unwrap();
            let client = requester
                .engine
                .start_flow(NotaryClientFlow::new(
                    to_notary,
                    transaction,
                    requester.key.clone(),
                    4,
                ))
                .unwrap();
            (client, served)
        }

        async fn notarise(&self, requester: &Requester, transaction: CoreTransaction) -> Outcome {
            let (client, served) = self.request(requester, transaction);
            let outcome = client.result().await;
            let _ = served.result().await;
            outcome
        }
    }

    fn random_state() -> StateRef {
        StateRef::new(rand::random(), rand::random::<u8>() as u32)
    }

    fn spend(inputs: &[StateRef], notary: &Party) -> WireTransaction {
        let mut builder = WireTransaction::builder()
            .notary(notary.clone())
            .time_window(TimeWindow::with_tolerance(NOW, 60_000))
            .privacy_salt(rand::random());
        for input in inputs {
            builder = builder.input(*input);
        }
        builder.build().unwrap()
    }

    fn for_notary(tx: &WireTransaction) -> CoreTransaction {
        CoreTransaction::Filtered(tx.reveal_groups(&[
            ComponentGroupKind::Inputs,
            ComponentGroupKind::TimeWindow,
            ComponentGroupKind::Notary,
        ]))
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    /// Signs a request for `claimed_inputs` but sends the real transaction.
    struct ForgedRequester {
        session: FlowSession,
        transaction: CoreTransaction,
        claimed_inputs: Vec<StateRef>,
        key: Arc<Ed25519KeyPair>,
    }

    #[async_trait]
    impl FlowLogic for ForgedRequester {
        type Output = NotarisationResponse;
        type Error = NotaryError;

        fn flow_name(&self) -> &'static str {
            "ForgedRequester"
        }

        async fn call(mut self, ctx: FlowContext) -> Result<NotarisationResponse, NotaryError> {
            let request =
                NotarisationRequest::new(self.claimed_inputs.clone(), self.transaction.id());
            let payload = NotarisationPayload {
                request_signature: request.sign(&self.key, 4)?,
                transaction: self.transaction.clone(),
            };
            ctx.send_and_receive::<_, NotarisationResponse>(&mut self.session, &payload)
                .await?
                .validate(Ok)
        }
    }

    // =============================================================================
    // INTEGRATION TESTS: COMMIT AND DOUBLE SPEND
    // =============================================================================

    #[tokio::test]
    async fn test_filtered_transaction_is_notarised_end_to_end() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let state = random_state();
        let tx = spend(&[state], &notary.party);

        let signature = notary.notarise(&alice, for_notary(&tx)).await.unwrap();

        assert_eq!(signature.by, notary.party.owning_key);
        assert!(signature.verify(&tx.id()).is_ok());

        let consumed = notary.uniqueness.consumption_of(&state).await.unwrap();
        assert_eq!(consumed.tx_id, tx.id());
        assert_eq!(consumed.input_index, 0);
        assert_eq!(consumed.requesting_party, alice.party);

        wait_until(|| alice.engine.live_flows().is_empty()).await;
        wait_until(|| notary.engine.live_flows().is_empty()).await;
        assert_eq!(alice.engine.checkpoint_count().await.unwrap(), 0);
        assert_eq!(notary.engine.checkpoint_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_spend_of_state_by_other_requester_conflicts() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let bob = Requester::new("O=Bob, L=Paris");
        let s1 = random_state();

        let t1 = spend(&[s1], &notary.party);
        assert!(notary.notarise(&alice, for_notary(&t1)).await.is_ok());

        let t2 = spend(&[s1], &notary.party);
        let outcome = notary.notarise(&bob, for_notary(&t2)).await;

        assert_eq!(
            outcome,
            Err(FlowFailure::Flow(NotaryError::Conflict {
                tx_id: t2.id(),
                conflicts: vec![StateConflict {
                    state_ref: s1,
                    consuming_tx_hash: sha256(&t1.id()),
                }],
            }))
        );
        let consumed = notary.uniqueness.consumption_of(&s1).await.unwrap();
        assert_eq!(consumed.tx_id, t1.id());
        assert_eq!(consumed.requesting_party, alice.party);
        assert_eq!(notary.uniqueness.committed_by(&t2.id()), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overlapping_requests_commit_exactly_once() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let shared = random_state();

        let transactions: Vec<WireTransaction> = (0..8)
            .map(|_| spend(&[random_state(), shared], &notary.party))
            .collect();
        let handles: Vec<_> = transactions
            .iter()
            .map(|tx| notary.request(&alice, for_notary(tx)))
            .collect();

        let mut outcomes = Vec::new();
        for (client, served) in handles {
            outcomes.push(client.result().await);
            let _ = served.result().await;
        }

        let winners: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| outcome.is_ok())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(winners.len(), 1);
        let winner = &transactions[winners[0]];

        for (tx, outcome) in transactions.iter().zip(&outcomes) {
            if tx.id() == winner.id() {
                continue;
            }
            assert_eq!(
                outcome,
                &Err(FlowFailure::Flow(NotaryError::Conflict {
                    tx_id: tx.id(),
                    conflicts: vec![StateConflict {
                        state_ref: shared,
                        consuming_tx_hash: sha256(&winner.id()),
                    }],
                }))
            );
        }
        assert_eq!(notary.uniqueness.commit_calls(), 8);
        assert_eq!(notary.uniqueness.consumed_count(), 2);
    }

    // =============================================================================
    // INTEGRATION TESTS: REQUEST AUTHENTICATION
    // =============================================================================

    #[tokio::test]
    async fn test_request_for_other_inputs_is_rejected_before_uniqueness() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let tx = spend(&[random_state()], &notary.party);

        let (to_notary, to_alice) = notary.network.connect(&alice.party, &notary.party);
        let served = notary
            .service
            .accept_session(&notary.engine, to_alice)
            .unwrap();
        let forged = alice
            .engine
            .start_flow(ForgedRequester {
                session: to_notary,
                transaction: for_notary(&tx),
                claimed_inputs: vec![random_state()],
                key: alice.key.clone(),
            })
            .unwrap();

        assert!(matches!(
            forged.result().await,
            Ok(NotarisationResponse::Rejected(
                NotaryError::AuthenticationFailure { .. }
            ))
        ));
        assert!(matches!(
            served.result().await,
            Err(FlowFailure::Flow(NotaryError::AuthenticationFailure { .. }))
        ));
        assert_eq!(notary.uniqueness.commit_calls(), 0);
    }

    #[tokio::test]
    async fn test_hidden_inputs_fail_even_with_valid_signature() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let tx = spend(&[random_state()], &notary.party);
        let hidden = CoreTransaction::Filtered(
            tx.reveal_groups(&[ComponentGroupKind::TimeWindow, ComponentGroupKind::Notary]),
        );

        assert_eq!(
            notary.notarise(&alice, hidden).await,
            Err(FlowFailure::Flow(NotaryError::HiddenComponentFailure {
                group: ComponentGroupKind::Inputs
            }))
        );
        assert_eq!(notary.uniqueness.commit_calls(), 0);
    }

    // =============================================================================
    // INTEGRATION TESTS: NOTARY CHANGE
    // =============================================================================

    #[tokio::test]
    async fn test_notary_change_commits_inputs_without_time_window() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let s2 = random_state();
        let change = NotaryChangeWireTransaction {
            inputs: vec![s2],
            references: vec![],
            notary: notary.party.clone(),
            new_notary: Party::new("O=Replacement Notary, L=Oslo", [0x4E; 32]),
        };
        let transaction = CoreTransaction::NotaryChange(change.clone());

        let parts = extract_parts(&transaction).unwrap();
        assert_eq!(parts.inputs, vec![s2]);
        assert_eq!(parts.time_window, None);

        let signature = notary.notarise(&alice, transaction).await.unwrap();
        assert!(signature.verify(&change.id()).is_ok());
        assert_eq!(notary.uniqueness.committed_time_window(&change.id()), None);
        assert_eq!(
            notary.uniqueness.consumption_of(&s2).await.unwrap().tx_id,
            change.id()
        );
    }

    // =============================================================================
    // INTEGRATION TESTS: HANDLES
    // =============================================================================

    #[tokio::test]
    async fn test_closing_pending_request_cancels_it() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let tx = spend(&[random_state()], &notary.party);

        // Nobody serves the notary side of this session.
        let (to_notary, _unserved) = notary.network.connect(&alice.party, &notary.party);
        let mut handle = alice
            .engine
            .start_tracked_flow(NotaryClientFlow::new(
                to_notary,
                for_notary(&tx),
                alice.key.clone(),
                4,
            ))
            .unwrap();
        assert_eq!(
            handle.progress().next_step().await.as_deref(),
            Some(REQUESTING)
        );

        handle.close();
        handle.close();
        assert!(handle.is_cancelled());
        assert_eq!(handle.result().await, Err(FlowFailure::Cancelled));

        wait_until(|| alice.engine.live_flows().is_empty()).await;
        assert_eq!(alice.engine.checkpoint_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tracked_request_reports_client_steps() {
        notary_telemetry::init_test_logging();
        let notary = NotaryNode::new();
        let alice = Requester::new("O=Alice, L=London");
        let tx = spend(&[random_state()], &notary.party);

        let (to_notary, to_alice) = notary.network.connect(&alice.party, &notary.party);
        let served = notary
            .service
            .accept_session(&notary.engine, to_alice)
            .unwrap();
        let mut handle = alice
            .engine
            .start_tracked_flow(NotaryClientFlow::new(
                to_notary,
                for_notary(&tx),
                alice.key.clone(),
                4,
            ))
            .unwrap();

        let mut steps = Vec::new();
        while let Some(step) = handle.progress().next_step().await {
            steps.push(step);
        }
        assert_eq!(steps, vec![REQUESTING, VALIDATING]);
        assert!(handle.result().await.is_ok());
        assert!(served.result().await.is_ok());
    }
}
