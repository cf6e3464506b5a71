//! Quorum-approved cross-chain attestation aggregates.
//!
//! Aggregates are produced and signed upstream. The types here only enforce
//! structural consistency; signatures are carried but never verified.

use std::collections::HashSet;

use alloy_primitives::{Address, FixedBytes, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ChainId, Height};

/// Byte length of a recoverable ECDSA signature: r (32) || s (32) || v (1)
pub const SIGNATURE_BYTE_LENGTH: usize = 65;

/// A recoverable ECDSA signature.
pub type Signature65 = FixedBytes<SIGNATURE_BYTE_LENGTH>;

/// Reference to the attested block on the target chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Chain the attested block belongs to.
    pub source_chain_id: ChainId,
    /// Height of the attested block.
    pub height: Height,
    /// Hash of the attested block.
    pub hash: B256,
}

/// A single validator's contribution to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    /// Voting validator.
    pub validator: Address,
    /// Signature over the attestation root.
    pub signature: Signature65,
    /// Power the validator contributed.
    pub power: u64,
}

/// An approved aggregate attestation of a block on another chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggAttestation {
    /// The attested block.
    pub block_header: BlockHeader,
    /// Validator set the votes were cast in.
    pub validator_set_id: u64,
    /// Root of the attested data.
    pub attestation_root: B256,
    /// Contributing votes, in the order the remote returned them.
    pub votes: Vec<Vote>,
    /// Sum of all vote powers.
    pub aggregate_power: u64,
    /// Quorum threshold the aggregate satisfies.
    pub quorum_power: u64,
}

impl AggAttestation {
    /// Checks vote-to-power accounting.
    ///
    /// # Errors
    /// - the aggregate carries no votes
    /// - a validator votes twice or with zero power
    /// - the vote powers do not sum to `aggregate_power`
    /// - the quorum is zero or not met by `aggregate_power`
    pub fn validate(&self) -> Result<(), AttestationError> {
        if self.votes.is_empty() {
            return Err(AttestationError::NoVotes);
        }

        let mut voters = HashSet::with_capacity(self.votes.len());
        let mut total: u64 = 0;
        for vote in &self.votes {
            if vote.power == 0 {
                return Err(AttestationError::ZeroPowerVote(vote.validator));
            }
            if !voters.insert(vote.validator) {
                return Err(AttestationError::DuplicateVote(vote.validator));
            }
            total = total
                .checked_add(vote.power)
                .ok_or(AttestationError::PowerOverflow)?;
        }

        if total != self.aggregate_power {
            return Err(AttestationError::PowerMismatch {
                votes: total,
                aggregate: self.aggregate_power,
            });
        }
        if self.quorum_power == 0 {
            return Err(AttestationError::ZeroQuorum);
        }
        if self.aggregate_power < self.quorum_power {
            return Err(AttestationError::QuorumNotMet {
                aggregate: self.aggregate_power,
                quorum: self.quorum_power,
            });
        }

        Ok(())
    }
}

/// Structural errors of a decoded aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttestationError {
    /// Block header missing from the raw record.
    #[error("missing block header")]
    MissingBlockHeader,
    /// A fixed-size byte field has the wrong length.
    #[error("invalid {field} length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Name of the field.
        field: &'static str,
        /// Expected length in bytes.
        expected: usize,
        /// Received length in bytes.
        actual: usize,
    },
    /// The aggregate has no votes.
    #[error("aggregate has no votes")]
    NoVotes,
    /// A vote carries no power.
    #[error("vote by {0} has zero power")]
    ZeroPowerVote(Address),
    /// A validator voted more than once.
    #[error("duplicate vote by {0}")]
    DuplicateVote(Address),
    /// Summing vote powers overflowed.
    #[error("vote power overflow")]
    PowerOverflow,
    /// Vote powers do not add up to the aggregate power.
    #[error("vote power {votes} does not match aggregate power {aggregate}")]
    PowerMismatch {
        /// Sum of the vote powers.
        votes: u64,
        /// Claimed aggregate power.
        aggregate: u64,
    },
    /// Quorum threshold of zero.
    #[error("zero quorum power")]
    ZeroQuorum,
    /// Aggregate power below the quorum threshold.
    #[error("aggregate power {aggregate} below quorum {quorum}")]
    QuorumNotMet {
        /// Claimed aggregate power.
        aggregate: u64,
        /// Required quorum.
        quorum: u64,
    },
}
