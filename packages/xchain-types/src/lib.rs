#![doc = include_str!("../README.md")]
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod attestation;
pub mod proto;
pub mod validator;
pub mod xblock;

pub use attestation::{AggAttestation, AttestationError, BlockHeader, Vote};
pub use validator::{validate_validator_set, Validator, ValidatorError};
pub use xblock::XBlock;

/// Identifier of a source chain.
pub type ChainId = u64;

/// Height of a block on its source chain.
pub type Height = u64;
