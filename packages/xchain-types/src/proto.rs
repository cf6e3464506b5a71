//! Wire messages of the consensus chain approved-from query.
//!
//! The messages mirror `halo/halopb/v1/query.proto`. Raw records are converted
//! into the validated domain types with [`TryFrom`]; the reverse conversions are
//! infallible.

use alloy_primitives::{Address, FixedBytes, B256};

use crate::{
    attestation::{Signature65, SIGNATURE_BYTE_LENGTH},
    AggAttestation, AttestationError, BlockHeader, Vote,
};

/// ABCI query path of the approved-from method.
pub const APPROVED_FROM_PATH: &str = "/halo.halopb.v1.HaloService/ApprovedFrom";

/// Request for aggregates approved at or after a height.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ApprovedFromRequest {
    /// Source chain identifier.
    #[prost(uint64, tag = "1")]
    pub chain_id: u64,
    /// First height of interest.
    #[prost(uint64, tag = "2")]
    pub from_height: u64,
}

/// Response carrying approved aggregates.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ApprovedFromResponse {
    /// Aggregates, ascending by attested block.
    #[prost(message, repeated, tag = "1")]
    pub aggregates: Vec<RawAggAttestation>,
}

/// Raw attested block reference.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawBlockHeader {
    /// Chain the block belongs to.
    #[prost(uint64, tag = "1")]
    pub chain_id: u64,
    /// Block height.
    #[prost(uint64, tag = "2")]
    pub height: u64,
    /// 32-byte block hash.
    #[prost(bytes = "vec", tag = "3")]
    pub hash: Vec<u8>,
}

/// Raw validator vote.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawVote {
    /// 20-byte validator address.
    #[prost(bytes = "vec", tag = "1")]
    pub validator_address: Vec<u8>,
    /// 65-byte recoverable signature.
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
    /// Contributed power.
    #[prost(uint64, tag = "3")]
    pub power: u64,
}

/// Raw aggregate attestation.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawAggAttestation {
    /// Attested block.
    #[prost(message, optional, tag = "1")]
    pub block_header: Option<RawBlockHeader>,
    /// Validator set id.
    #[prost(uint64, tag = "2")]
    pub validator_set_id: u64,
    /// 32-byte attestation root.
    #[prost(bytes = "vec", tag = "3")]
    pub attestation_root: Vec<u8>,
    /// Votes.
    #[prost(message, repeated, tag = "4")]
    pub votes: Vec<RawVote>,
    /// Sum of vote powers.
    #[prost(uint64, tag = "5")]
    pub aggregate_power: u64,
    /// Quorum threshold.
    #[prost(uint64, tag = "6")]
    pub quorum_power: u64,
}

fn fixed<const N: usize>(
    field: &'static str,
    bytes: &[u8],
) -> Result<FixedBytes<N>, AttestationError> {
    FixedBytes::<N>::try_from(bytes).map_err(|_| AttestationError::InvalidLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

impl TryFrom<RawBlockHeader> for BlockHeader {
    type Error = AttestationError;

    fn try_from(raw: RawBlockHeader) -> Result<Self, Self::Error> {
        Ok(Self {
            source_chain_id: raw.chain_id,
            height: raw.height,
            hash: fixed::<32>("block hash", &raw.hash)?,
        })
    }
}

impl TryFrom<RawVote> for Vote {
    type Error = AttestationError;

    fn try_from(raw: RawVote) -> Result<Self, Self::Error> {
        let validator = Address::from(fixed::<20>(
            "validator address",
            &raw.validator_address,
        )?);
        let signature: Signature65 =
            fixed::<SIGNATURE_BYTE_LENGTH>("signature", &raw.signature)?;

        Ok(Self {
            validator,
            signature,
            power: raw.power,
        })
    }
}

impl TryFrom<RawAggAttestation> for AggAttestation {
    type Error = AttestationError;

    fn try_from(raw: RawAggAttestation) -> Result<Self, Self::Error> {
        let block_header = BlockHeader::try_from(
            raw.block_header
                .ok_or(AttestationError::MissingBlockHeader)?,
        )?;
        let attestation_root: B256 = fixed::<32>("attestation root", &raw.attestation_root)?;
        let votes = raw
            .votes
            .into_iter()
            .map(Vote::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let agg = Self {
            block_header,
            validator_set_id: raw.validator_set_id,
            attestation_root,
            votes,
            aggregate_power: raw.aggregate_power,
            quorum_power: raw.quorum_power,
        };
        agg.validate()?;

        Ok(agg)
    }
}

impl From<BlockHeader> for RawBlockHeader {
    fn from(header: BlockHeader) -> Self {
        Self {
            chain_id: header.source_chain_id,
            height: header.height,
            hash: header.hash.to_vec(),
        }
    }
}

impl From<Vote> for RawVote {
    fn from(vote: Vote) -> Self {
        Self {
            validator_address: vote.validator.to_vec(),
            signature: vote.signature.to_vec(),
            power: vote.power,
        }
    }
}

impl From<AggAttestation> for RawAggAttestation {
    fn from(agg: AggAttestation) -> Self {
        Self {
            block_header: Some(agg.block_header.into()),
            validator_set_id: agg.validator_set_id,
            attestation_root: agg.attestation_root.to_vec(),
            votes: agg.votes.into_iter().map(Into::into).collect(),
            aggregate_power: agg.aggregate_power,
            quorum_power: agg.quorum_power,
        }
    }
}

/// Converts raw aggregates into domain aggregates, preserving order.
///
/// # Errors
/// Returns the index and cause of the first record that fails conversion.
pub fn aggregates_from_proto(
    raw: Vec<RawAggAttestation>,
) -> Result<Vec<AggAttestation>, AggregateDecodeError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, agg)| {
            AggAttestation::try_from(agg).map_err(|source| AggregateDecodeError { index, source })
        })
        .collect()
}

/// Conversion failure of one record in an approved-from response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("aggregate {index}: {source}")]
pub struct AggregateDecodeError {
    /// Position of the record in the response.
    pub index: usize,
    /// Cause.
    pub source: AttestationError,
}
