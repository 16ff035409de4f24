//! Flow sessions
//!
//! A [`FlowSession`] is one flow's conversation with one counterparty. The
//! session only owns the channel; sending and receiving go through
//! [`FlowContext`](super::context::FlowContext) because they are suspension
//! points.

use shared_types::Party;

use crate::ports::outbound::SessionTransport;

/// A conversation with a single counterparty.
pub struct FlowSession {
    counterparty: Party,
    pub(crate) transport: Box<dyn SessionTransport>,
}

impl FlowSession {
    pub fn new(counterparty: Party, transport: Box<dyn SessionTransport>) -> Self {
        Self {
            counterparty,
            transport,
        }
    }

    /// The party on the other end.
    pub fn counterparty(&self) -> &Party {
        &self.counterparty
    }
}

impl std::fmt::Debug for FlowSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSession")
            .field("counterparty", &self.counterparty.name)
            .finish()
    }
}

/// Data received from a peer that has not been checked yet.
///
/// The only way to get at the value is [`validate`](Self::validate), which
/// forces the receiving flow to state its checks at the point of use.
#[derive(Debug)]
#[must_use = "received data must be validated"]
pub struct UntrustworthyData<T>(T);

impl<T> UntrustworthyData<T> {
    pub(crate) fn new(data: T) -> Self {
        Self(data)
    }

    /// Run `validator` over the received value.
    pub fn validate<R, E>(self, validator: impl FnOnce(T) -> Result<R, E>) -> Result<R, E> {
        validator(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_passes_value_through() {
        let data = UntrustworthyData::new(5u32);
        let result: Result<u32, String> = data.validate(|v| Ok(v * 2));
        assert_eq!(result, Ok(10));
    }

    #[test]
    fn test_validate_propagates_rejection() {
        let data = UntrustworthyData::new(5u32);
        let result: Result<u32, &str> = data.validate(|v| if v > 3 { Err("too big") } else { Ok(v) });
        assert_eq!(result, Err("too big"));
    }
}
