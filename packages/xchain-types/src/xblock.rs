//! The assembled cross-chain block.

use serde::{Deserialize, Serialize};

use crate::{AggAttestation, ChainId, Height, Validator};

/// Validator set and approved aggregates of the consensus chain at one height.
///
/// Built fresh for every request and owned by the caller. `aggregates` keep the
/// order the remote returned them in, which is ascending by attested block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XBlock {
    /// Consensus chain identifier.
    pub chain_id: ChainId,
    /// Requested height.
    pub height: Height,
    /// Active validator set at `height`.
    pub validators: Vec<Validator>,
    /// Aggregates approved at or after `height`.
    pub aggregates: Vec<AggAttestation>,
}
