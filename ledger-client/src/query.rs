use log::{trace, warn};
use thiserror::Error;

use ledger_wire::entity::{ChecksumError, LedgerId};
use ledger_wire::envelope::{QueryHeader, QueryTag, RequestEnvelope, ResponseEnvelope, ResponseType};
use ledger_wire::WireError;

use crate::network::{Transport, TransportError};

pub mod account_balance;
pub mod proxy_stakers;

/// Indicates the kind of failure on an attempt to execute a query.
/// None of these is recovered locally: the first one encountered aborts
/// the remaining pipeline steps.
#[derive(Error, Debug)]
pub enum QueryError {
    /// An embedded entity id carries a checksum for a different ledger.
    /// Detected before any network I/O.
    #[error("checksum validation failed: {0}")]
    ChecksumMismatch(#[from] ChecksumError),
    /// Opaque failure from the transport, surfaced unchanged.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    /// The response's populated slot does not match the request's tag.
    /// Signals node/client version skew or a codec defect.
    #[error("unexpected `{actual}` response received, expected `{expected}`")]
    ProtocolMismatch { expected: QueryTag, actual: QueryTag },
    /// The slot matched but its fields do not decode into the typed result.
    #[error("malformed `{tag}` response: {source}")]
    MalformedResponse { tag: QueryTag, source: WireError },
}

/// Capabilities a concrete query variant plugs into the execution
/// skeleton: request assembly, response extraction and checksum
/// validation of its own parameters.
pub trait QueryData {
    /// Typed payload the query resolves to.
    type Output;

    /// Assemble the request envelope for this service method, embedding
    /// present parameters and omitting absent ones.
    fn build_request(&self, header: QueryHeader) -> RequestEnvelope;

    /// Extract the typed payload from the response envelope.
    /// Requires the envelope's populated slot to match this query's tag.
    fn unwrap_response(&self, response: ResponseEnvelope) -> Result<Self::Output, QueryError>;

    /// Validate checksums of every entity id held by this query against
    /// the target ledger. Absent parameters are skipped.
    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<(), ChecksumError>;
}

/// Generic execution skeleton shared by all read-only queries.
/// Stateless between `execute` calls; a value can be executed repeatedly.
#[derive(Debug, Clone)]
pub struct Query<TData> {
    pub data: TData,
    response_type: ResponseType,
}

impl<TData: QueryData + Default> Query<TData> {
    pub fn new() -> Self {
        Query {
            data: TData::default(),
            response_type: ResponseType::AnswerOnly,
        }
    }
}

impl<TData: QueryData + Default> Default for Query<TData> {
    fn default() -> Self {
        Self::new()
    }
}

impl<TData: QueryData> Query<TData> {
    /// Set the kind of answer requested from the node.
    pub fn response_type(&mut self, response_type: ResponseType) -> &mut Self {
        self.response_type = response_type;
        self
    }

    /// Validate checksums without dispatching anything.
    pub fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<(), ChecksumError> {
        self.data.validate_checksums(ledger_id)
    }

    /// Run the query against the given transport.
    ///
    /// Steps are strictly ordered: validate checksums against the ledger
    /// the transport is connected to, build the request envelope,
    /// dispatch it, extract the typed payload. A failure at any step
    /// aborts the rest; no partial result is ever produced.
    pub async fn execute<TNetwork>(&self, network: &TNetwork) -> Result<TData::Output, QueryError>
    where
        TNetwork: Transport,
    {
        if let Some(ledger_id) = network.ledger_id() {
            self.data.validate_checksums(ledger_id)?;
        }
        let header = QueryHeader {
            response_type: self.response_type,
            payment: None,
        };
        let request = self.data.build_request(header);
        let tag = request.tag();
        trace!(target: "ledger_client", "Dispatching `{}` query", tag);
        let response = network.send(request).await?;
        let result = self.data.unwrap_response(response);
        if let Err(err) = &result {
            warn!(target: "ledger_client", "`{}` query failed on decode: {}", tag, err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use async_trait::async_trait;

    use ledger_wire::entity::{AccountId, Checksum, LedgerId};
    use ledger_wire::envelope::{
        AccountBalanceResponse, ProxyStakerEntry, ProxyStakersResponse, QueryTag, RequestEnvelope,
        ResponseEnvelope,
    };

    use crate::network::{Transport, TransportError};
    use crate::query::proxy_stakers::ProxyStakersQuery;
    use crate::query::QueryError;

    /// Records every dispatched envelope and answers with a canned response.
    struct SpyTransport {
        ledger_id: Option<LedgerId>,
        response: ResponseEnvelope,
        requests: RefCell<Vec<RequestEnvelope>>,
    }

    impl SpyTransport {
        fn answering(ledger_id: Option<LedgerId>, response: ResponseEnvelope) -> Self {
            SpyTransport {
                ledger_id,
                response,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl Transport for SpyTransport {
        fn ledger_id(&self) -> Option<&LedgerId> {
            self.ledger_id.as_ref()
        }

        async fn send(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
            self.requests.borrow_mut().push(request);
            Ok(self.response.clone())
        }
    }

    struct FailingTransport;

    #[async_trait(?Send)]
    impl Transport for FailingTransport {
        fn ledger_id(&self) -> Option<&LedgerId> {
            None
        }

        async fn send(&self, _request: RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
            Err(TransportError::UnsuccessfulRequest("expected 200 from /query, got 503".into()))
        }
    }

    fn stakers_response(entries: Vec<ProxyStakerEntry>) -> ResponseEnvelope {
        ResponseEnvelope::ProxyStakers(ProxyStakersResponse { stakers: entries })
    }

    #[tokio::test]
    async fn checksum_mismatch_aborts_before_dispatch() {
        let foreign = Checksum::derive(&LedgerId::testnet(), 1001);
        let network = SpyTransport::answering(Some(LedgerId::mainnet()), stakers_response(vec![]));
        let mut query = ProxyStakersQuery::new();
        let result = query
            .account_id(AccountId::with_checksum(1001, foreign))
            .execute(&network)
            .await;
        assert!(matches!(result, Err(QueryError::ChecksumMismatch(_))));
        assert_eq!(network.requests.borrow().len(), 0);
    }

    #[tokio::test]
    async fn absent_account_id_skips_validation() {
        let network = SpyTransport::answering(Some(LedgerId::mainnet()), stakers_response(vec![]));
        let stakers = ProxyStakersQuery::new().execute(&network).await.unwrap();
        assert!(stakers.is_empty());
        let requests = network.requests.borrow();
        assert!(
            matches!(&requests[..], [RequestEnvelope::ProxyStakers(req)] if req.account_num.is_none())
        );
    }

    #[tokio::test]
    async fn protocol_mismatch_on_foreign_slot() {
        let network = SpyTransport::answering(
            Some(LedgerId::mainnet()),
            ResponseEnvelope::AccountBalance(AccountBalanceResponse {
                account_num: Some(1001),
                balance: Some(7),
            }),
        );
        let result = ProxyStakersQuery::new().execute(&network).await;
        match result {
            Err(QueryError::ProtocolMismatch { expected, actual }) => {
                assert_eq!(expected, QueryTag::ProxyStakers);
                assert_eq!(actual, QueryTag::AccountBalance);
            }
            other => panic!("expected protocol mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn malformed_entry_fails_whole_call() {
        let network = SpyTransport::answering(
            Some(LedgerId::mainnet()),
            stakers_response(vec![
                ProxyStakerEntry {
                    account_num: Some(7),
                    amount: Some(10),
                },
                ProxyStakerEntry {
                    account_num: Some(8),
                    amount: None,
                },
            ]),
        );
        let result = ProxyStakersQuery::new().execute(&network).await;
        assert!(
            matches!(result, Err(QueryError::MalformedResponse { tag, .. }) if tag == QueryTag::ProxyStakers)
        );
    }

    #[tokio::test]
    async fn transport_failure_propagates_unchanged() {
        let result = ProxyStakersQuery::new().execute(&FailingTransport).await;
        assert!(matches!(
            result,
            Err(QueryError::Transport(TransportError::UnsuccessfulRequest(_)))
        ));
    }

    #[tokio::test]
    async fn sequential_executions_build_identical_envelopes() {
        let ledger_id = LedgerId::mainnet();
        let checksum = Checksum::derive(&ledger_id, 1001);
        let network = SpyTransport::answering(Some(ledger_id), stakers_response(vec![]));
        let mut query = ProxyStakersQuery::new();
        query.account_id(AccountId::with_checksum(1001, checksum));
        query.execute(&network).await.unwrap();
        query.execute(&network).await.unwrap();
        let requests = network.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }
}
