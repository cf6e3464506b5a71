//! Assembly of [`XBlock`]s from the three consensus chain sources.

use std::{future::Future, sync::Arc};

use tendermint_rpc::HttpClient;
use tokio_util::sync::CancellationToken;
use xchain_types::{validate_validator_set, AggAttestation, ChainId, Height, XBlock};

use crate::{
    backoff::BackoffPolicy,
    config::Config,
    error::{Cancelled, FetchError, ProviderError},
    fetcher::{AbciFetcher, AttestationFetcher},
    sources::{CachedChainId, ChainIdentitySource, ValidatorSetSource},
};

/// Provides [`XBlock`]s of the consensus chain.
///
/// Holds no per-call state, so clones and concurrent calls are independent.
#[derive(Clone)]
pub struct Provider {
    fetcher: Arc<dyn AttestationFetcher>,
    chain_ids: Arc<dyn ChainIdentitySource>,
    valsets: Arc<dyn ValidatorSetSource>,
    backoff: BackoffPolicy,
}

impl Provider {
    /// Creates a provider from its sources, retrying with the default backoff policy.
    #[must_use]
    pub fn new(
        fetcher: impl AttestationFetcher + 'static,
        chain_ids: impl ChainIdentitySource + 'static,
        valsets: impl ValidatorSetSource + 'static,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            chain_ids: Arc::new(chain_ids),
            valsets: Arc::new(valsets),
            backoff: BackoffPolicy::default(),
        }
    }

    /// Replaces the backoff policy of the approved-from retry loop.
    ///
    /// # Errors
    /// Fails if the policy does not pass [`BackoffPolicy::validate`].
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> anyhow::Result<Self> {
        backoff.validate()?;
        self.backoff = backoff;
        Ok(self)
    }

    /// Creates a provider fetching aggregates over ABCI from `client`, with the
    /// fast backoff preset.
    #[must_use]
    pub fn abci(
        client: HttpClient,
        chain_ids: impl ChainIdentitySource + 'static,
        valsets: impl ValidatorSetSource + 'static,
    ) -> Self {
        Self {
            backoff: BackoffPolicy::fast(),
            ..Self::new(AbciFetcher::new(client), chain_ids, valsets)
        }
    }

    /// Creates an ABCI provider from the [`Config`].
    ///
    /// # Errors
    /// Fails if the config is invalid or the RPC client cannot be created.
    pub fn from_config(
        config: &Config,
        chain_ids: impl ChainIdentitySource + 'static,
        valsets: impl ValidatorSetSource + 'static,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let client = HttpClient::new(config.rpc_url.trim()).map_err(|e| {
            anyhow::anyhow!("Failed to create RPC client for '{}': {e}", config.rpc_url)
        })?;

        let chain_ids: Arc<dyn ChainIdentitySource> = if config.cache_chain_id {
            Arc::new(CachedChainId::new(chain_ids))
        } else {
            Arc::new(chain_ids)
        };

        Ok(Self {
            fetcher: Arc::new(AbciFetcher::new(client)),
            chain_ids,
            valsets: Arc::new(valsets),
            backoff: config.backoff,
        })
    }

    /// The backoff policy of the approved-from retry loop.
    #[must_use]
    pub const fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Assembles the [`XBlock`] at `height`.
    ///
    /// Returns `Ok(None)` while the validator set at `height` is not available;
    /// callers should poll again later. Remote and transport failures of the
    /// approved-from query are retried without limit, so a call against an
    /// unreachable node only ends once `cancel` fires.
    ///
    /// # Errors
    /// - [`ProviderError::IdentityResolution`] if the chain id cannot be resolved
    /// - [`ProviderError::ValidatorSet`] if the validator lookup fails
    /// - [`ProviderError::InvalidValidatorSet`] on non-positive powers or duplicates
    /// - [`ProviderError::Decode`] if the remote returns a malformed payload
    /// - [`ProviderError::Cancelled`] if `cancel` fires first
    #[tracing::instrument(skip_all, fields(height = height, chain_id = tracing::field::Empty))]
    pub async fn xblock(
        &self,
        cancel: &CancellationToken,
        height: Height,
    ) -> Result<Option<XBlock>, ProviderError> {
        let chain_id = until_cancelled(cancel, self.chain_ids.chain_id())
            .await?
            .map_err(ProviderError::IdentityResolution)?;
        tracing::Span::current().record("chain_id", chain_id);

        let Some(validators) = until_cancelled(cancel, self.valsets.validators(height))
            .await?
            .map_err(ProviderError::ValidatorSet)?
        else {
            tracing::debug!("Validator set at height {height} not available yet");
            return Ok(None);
        };
        validate_validator_set(&validators)?;

        let aggregates = self.approved_from(cancel, chain_id, height).await?;

        tracing::debug!(
            "Assembled xblock with {} validators and {} aggregates",
            validators.len(),
            aggregates.len()
        );

        Ok(Some(XBlock {
            chain_id,
            height,
            validators,
            aggregates,
        }))
    }

    /// Fetches approved aggregates, backing off on retryable failures.
    async fn approved_from(
        &self,
        cancel: &CancellationToken,
        chain_id: ChainId,
        height: Height,
    ) -> Result<Vec<AggAttestation>, ProviderError> {
        let mut attempt = self.backoff.new_attempt(cancel.clone());

        loop {
            match until_cancelled(cancel, self.fetcher.approved_from(chain_id, height)).await? {
                Ok(aggregates) => return Ok(aggregates),
                Err(FetchError::Decode(err)) => {
                    tracing::error!("Approved-from payload is malformed, not retrying: {err}");
                    return Err(err.into());
                }
                Err(err) => {
                    tracing::warn!(
                        "Fetching approved aggregates failed (attempt {}), backing off: {err}",
                        attempt.failures() + 1
                    );
                    attempt.failure().await?;
                }
            }
        }
    }
}

/// Drives `fut` to completion unless `cancel` fires first.
async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, Cancelled> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Cancelled),
        out = fut => Ok(out),
    }
}
