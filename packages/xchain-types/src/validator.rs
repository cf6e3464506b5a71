//! Validators of the consensus chain and their voting power.

use std::collections::HashSet;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A member of the consensus chain validator set at some height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Validator {
    /// The validator's identity.
    pub address: Address,
    /// Voting power. Must be strictly positive for an active validator.
    pub power: i64,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new(address: Address, power: i64) -> Self {
        Self { address, power }
    }

    /// Returns the validator with a strictly positive power.
    ///
    /// Negative powers are negated and zero is floored to one. Data sources that
    /// cannot guarantee positive powers should normalize before handing the set on.
    #[must_use]
    pub const fn normalized(self) -> Self {
        let power = match self.power {
            0 => 1,
            p if p < 0 => p.saturating_neg(),
            p => p,
        };
        Self {
            address: self.address,
            power,
        }
    }

    /// Checks that the validator may be part of an active set.
    ///
    /// # Errors
    /// Returns [`ValidatorError::NonPositivePower`] if the power is zero or negative.
    pub const fn validate(&self) -> Result<(), ValidatorError> {
        if self.power <= 0 {
            return Err(ValidatorError::NonPositivePower {
                address: self.address,
                power: self.power,
            });
        }
        Ok(())
    }
}

/// Checks every validator of a set and rejects duplicate addresses.
///
/// # Errors
/// Returns the first [`ValidatorError`] found, in set order.
pub fn validate_validator_set(validators: &[Validator]) -> Result<(), ValidatorError> {
    let mut seen = HashSet::with_capacity(validators.len());
    for validator in validators {
        validator.validate()?;
        if !seen.insert(validator.address) {
            return Err(ValidatorError::DuplicateAddress(validator.address));
        }
    }
    Ok(())
}

/// Validator set integrity violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidatorError {
    /// Zero or negative voting power.
    #[error("validator {address} has non-positive power {power}")]
    NonPositivePower {
        /// Offending validator.
        address: Address,
        /// Reported power.
        power: i64,
    },
    /// The same address appears twice in one set.
    #[error("duplicate validator {0}")]
    DuplicateAddress(Address),
}
