//! Retrieval of approved attestation aggregates from the consensus chain.

use prost::Message;
use tendermint_rpc::{endpoint::abci_query::AbciQuery, Client, HttpClient};
use xchain_types::{
    proto::{aggregates_from_proto, ApprovedFromRequest, ApprovedFromResponse, APPROVED_FROM_PATH},
    AggAttestation, ChainId, Height,
};

use crate::error::{DecodeError, FetchError};

/// Status and payload of a query answered by the remote node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResponse {
    /// Status code, zero on success.
    pub code: u32,
    /// Remote log output.
    pub log: String,
    /// Additional remote information.
    pub info: String,
    /// Namespace of `code`.
    pub codespace: String,
    /// Encoded response message.
    pub value: Vec<u8>,
}

impl QueryResponse {
    /// Whether the remote reported success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl From<AbciQuery> for QueryResponse {
    fn from(resp: AbciQuery) -> Self {
        Self {
            code: resp.code.value(),
            log: resp.log,
            info: resp.info,
            codespace: resp.codespace,
            value: resp.value,
        }
    }
}

/// Request/response channel to a consensus node, addressed by method path.
///
/// Implementations must be safe for concurrent use; the fetcher only issues
/// queries through it.
#[async_trait::async_trait]
pub trait QueryChannel: Send + Sync {
    /// Sends `data` to the method at `path`.
    ///
    /// # Errors
    /// Returns an error if no response was received.
    async fn query(&self, path: &str, data: Vec<u8>) -> anyhow::Result<QueryResponse>;
}

#[async_trait::async_trait]
impl QueryChannel for HttpClient {
    async fn query(&self, path: &str, data: Vec<u8>) -> anyhow::Result<QueryResponse> {
        let resp = self
            .abci_query(Some(path.to_string()), data, None, false)
            .await
            .map_err(|e| anyhow::anyhow!("ABCI query to '{path}' failed: {e}"))?;
        Ok(resp.into())
    }
}

/// Source of approved attestation aggregates.
#[async_trait::async_trait]
pub trait AttestationFetcher: Send + Sync {
    /// Returns the aggregates of `chain_id` approved at or after `from_height`,
    /// in the order the remote returned them.
    ///
    /// # Errors
    /// See [`FetchError`]; only [`FetchError::Decode`] is final.
    async fn approved_from(
        &self,
        chain_id: ChainId,
        from_height: Height,
    ) -> Result<Vec<AggAttestation>, FetchError>;
}

/// [`AttestationFetcher`] issuing one ABCI query per call.
#[derive(Debug, Clone)]
pub struct AbciFetcher<C> {
    channel: C,
}

impl<C: QueryChannel> AbciFetcher<C> {
    /// Creates a fetcher querying through `channel`.
    #[must_use]
    pub const fn new(channel: C) -> Self {
        Self { channel }
    }
}

#[async_trait::async_trait]
impl<C: QueryChannel> AttestationFetcher for AbciFetcher<C> {
    async fn approved_from(
        &self,
        chain_id: ChainId,
        from_height: Height,
    ) -> Result<Vec<AggAttestation>, FetchError> {
        let req = ApprovedFromRequest {
            chain_id,
            from_height,
        };

        let resp = self
            .channel
            .query(APPROVED_FROM_PATH, req.encode_to_vec())
            .await
            .map_err(FetchError::Transport)?;

        if !resp.is_ok() {
            return Err(FetchError::RemoteQuery {
                code: resp.code,
                log: resp.log,
                info: resp.info,
                codespace: resp.codespace,
            });
        }

        let response =
            ApprovedFromResponse::decode(resp.value.as_slice()).map_err(DecodeError::from)?;

        let aggs = aggregates_from_proto(response.aggregates).map_err(DecodeError::from)?;

        tracing::trace!(
            "Fetched {} approved aggregates for chain {} from height {}",
            aggs.len(),
            chain_id,
            from_height
        );

        Ok(aggs)
    }
}
