//! In-Memory Network Adapter
//!
//! Implements `SessionTransport` over tokio channels. Each `connect` call
//! creates one duplex link; dropping either session disconnects it.

use crate::domain::FlowSession;
use crate::error::TransportError;
use crate::ports::outbound::SessionTransport;
use async_trait::async_trait;
use shared_types::Party;
use std::time::Duration;
use tokio::sync::mpsc;

/// Factory for connected session pairs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNetwork {
    receive_timeout: Option<Duration>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail receives that wait longer than `timeout`.
    pub fn with_receive_timeout(timeout: Duration) -> Self {
        Self {
            receive_timeout: Some(timeout),
        }
    }

    /// Link `initiator` and `responder`.
    ///
    /// Returns `(initiator's session with responder, responder's session with
    /// initiator)`.
    pub fn connect(&self, initiator: &Party, responder: &Party) -> (FlowSession, FlowSession) {
        let (to_responder, from_initiator) = mpsc::unbounded_channel();
        let (to_initiator, from_responder) = mpsc::unbounded_channel();

        let initiator_side = ChannelTransport {
            peer: responder.clone(),
            outbound: to_responder,
            inbound: from_responder,
            receive_timeout: self.receive_timeout,
        };
        let responder_side = ChannelTransport {
            peer: initiator.clone(),
            outbound: to_initiator,
            inbound: from_initiator,
            receive_timeout: self.receive_timeout,
        };

        (
            FlowSession::new(responder.clone(), Box::new(initiator_side)),
            FlowSession::new(initiator.clone(), Box::new(responder_side)),
        )
    }
}

struct ChannelTransport {
    peer: Party,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    receive_timeout: Option<Duration>,
}

impl ChannelTransport {
    fn check_route(&self, peer: &Party) -> Result<(), TransportError> {
        if *peer != self.peer {
            return Err(TransportError::UnknownPeer {
                peer: peer.name.clone(),
            });
        }
        Ok(())
    }

    fn disconnected(&self) -> TransportError {
        TransportError::Disconnected {
            peer: self.peer.name.clone(),
        }
    }
}

#[async_trait]
impl SessionTransport for ChannelTransport {
    async fn send(&mut self, peer: &Party, payload: Vec<u8>) -> Result<(), TransportError> {
        self.check_route(peer)?;
        self.outbound
            .send(payload)
            .map_err(|_| self.disconnected())
    }

    async fn receive(&mut self, peer: &Party) -> Result<Vec<u8>, TransportError> {
        self.check_route(peer)?;

        let received = match self.receive_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.inbound.recv())
                .await
                .map_err(|_| TransportError::Timeout {
                    peer: self.peer.name.clone(),
                    after_ms: timeout.as_millis() as u64,
                })?,
            None => self.inbound.recv().await,
        };

        received.ok_or_else(|| self.disconnected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(name: &str, key: u8) -> Party {
        Party::new(name, [key; 32])
    }

    #[tokio::test]
    async fn test_connected_sessions_exchange_bytes() {
        let alice = party("O=Alice", 1);
        let bob = party("O=Bob", 2);
        let (mut to_bob, mut to_alice) = InMemoryNetwork::new().connect(&alice, &bob);

        to_bob.transport.send(&bob, vec![1, 2, 3]).await.unwrap();
        assert_eq!(to_alice.transport.receive(&alice).await.unwrap(), vec![1, 2, 3]);

        to_alice.transport.send(&alice, vec![9]).await.unwrap();
        assert_eq!(to_bob.transport.receive(&bob).await.unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_wrong_peer_is_rejected() {
        let alice = party("O=Alice", 1);
        let bob = party("O=Bob", 2);
        let carol = party("O=Carol", 3);
        let (mut to_bob, _to_alice) = InMemoryNetwork::new().connect(&alice, &bob);

        let err = to_bob.transport.send(&carol, vec![]).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::UnknownPeer {
                peer: "O=Carol".into()
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_peer_disconnects() {
        let alice = party("O=Alice", 1);
        let bob = party("O=Bob", 2);
        let (mut to_bob, to_alice) = InMemoryNetwork::new().connect(&alice, &bob);
        drop(to_alice);

        assert!(matches!(
            to_bob.transport.receive(&bob).await,
            Err(TransportError::Disconnected { .. })
        ));
        assert!(matches!(
            to_bob.transport.send(&bob, vec![1]).await,
            Err(TransportError::Disconnected { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_timeout() {
        let alice = party("O=Alice", 1);
        let bob = party("O=Bob", 2);
        let network = InMemoryNetwork::with_receive_timeout(Duration::from_millis(250));
        let (mut to_bob, _to_alice) = network.connect(&alice, &bob);

        let err = to_bob.transport.receive(&bob).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Timeout {
                peer: "O=Bob".into(),
                after_ms: 250
            }
        );
    }
}
