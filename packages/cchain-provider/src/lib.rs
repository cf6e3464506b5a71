#![doc = include_str!("../README.md")]
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod backoff;
/// Provider configuration
pub mod config;
pub mod error;
pub mod fetcher;
pub mod provider;
pub mod sources;

pub use crate::backoff::{Attempt, BackoffPolicy};
pub use crate::config::Config;
pub use crate::error::{Cancelled, DecodeError, FetchError, ProviderError};
pub use crate::fetcher::{AbciFetcher, AttestationFetcher, QueryChannel, QueryResponse};
pub use crate::provider::Provider;
pub use crate::sources::{CachedChainId, ChainIdentitySource, StaticChainId, ValidatorSetSource};

pub use tokio_util::sync::CancellationToken;
pub use xchain_types;
