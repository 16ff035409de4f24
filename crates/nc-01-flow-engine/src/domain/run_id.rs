//! Flow run identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one run of a flow state machine.
///
/// A fresh id is allocated per `start_flow`; the engine never hands out an id
/// that is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateMachineRunId(pub Uuid);

impl StateMachineRunId {
    pub fn create_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for StateMachineRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(
            StateMachineRunId::create_random(),
            StateMachineRunId::create_random()
        );
    }

    #[test]
    fn test_run_id_survives_serialization() {
        let id = StateMachineRunId::create_random();
        let bytes = bincode::serialize(&id).unwrap();
        let decoded: StateMachineRunId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(id, decoded);
    }
}
