//! Chain identity and validator set lookups composed by the provider.

use anyhow::Result;
use tokio::sync::OnceCell;
use xchain_types::{ChainId, Height, Validator};

/// Resolves the consensus chain id.
#[async_trait::async_trait]
pub trait ChainIdentitySource: Send + Sync {
    /// Returns the chain id.
    ///
    /// # Errors
    /// Returns an error if the identity cannot currently be determined.
    async fn chain_id(&self) -> Result<ChainId>;
}

/// Resolves the active validator set at a height.
#[async_trait::async_trait]
pub trait ValidatorSetSource: Send + Sync {
    /// Returns the validator set at `height`, or `None` if it is not available yet.
    ///
    /// Sources should hand out strictly positive powers, see
    /// [`Validator::normalized`].
    ///
    /// # Errors
    /// Returns an error if the lookup itself failed.
    async fn validators(&self, height: Height) -> Result<Option<Vec<Validator>>>;
}

/// A chain id known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticChainId(pub ChainId);

#[async_trait::async_trait]
impl ChainIdentitySource for StaticChainId {
    async fn chain_id(&self) -> Result<ChainId> {
        Ok(self.0)
    }
}

/// Resolves the chain id once and serves the cached value afterwards.
///
/// A failed resolution is not cached; the next call tries again.
#[derive(Debug)]
pub struct CachedChainId<S> {
    inner: S,
    cached: OnceCell<ChainId>,
}

impl<S: ChainIdentitySource> CachedChainId<S> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: OnceCell::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: ChainIdentitySource> ChainIdentitySource for CachedChainId<S> {
    async fn chain_id(&self) -> Result<ChainId> {
        self.cached
            .get_or_try_init(|| self.inner.chain_id())
            .await
            .copied()
    }
}
