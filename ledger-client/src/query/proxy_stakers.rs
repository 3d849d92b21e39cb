use ledger_wire::entity::{AccountId, ChecksumError, LedgerId};
use ledger_wire::envelope::{
    ProxyStakerEntry, ProxyStakersRequest, QueryHeader, QueryTag, RequestEnvelope, ResponseEnvelope,
};
use ledger_wire::{TryFromWire, WireError};

use crate::query::{Query, QueryData, QueryError};

/// Get all the accounts that are proxy staking to the target account,
/// with the amount each of them currently stakes.
pub type ProxyStakersQuery = Query<ProxyStakersQueryData>;

#[derive(Debug, Clone, Default)]
pub struct ProxyStakersQueryData {
    /// The account whose stakers should be retrieved.
    pub account_id: Option<AccountId>,
}

/// One account staking to the queried account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyStaker {
    pub account_id: AccountId,
    pub amount: u64,
}

impl TryFromWire<ProxyStakerEntry> for ProxyStaker {
    fn try_from_wire(wire: ProxyStakerEntry) -> Result<Self, WireError> {
        Ok(ProxyStaker {
            account_id: AccountId::new(
                wire.account_num
                    .ok_or_else(|| WireError::missing_field("account_num"))?,
            ),
            amount: wire.amount.ok_or_else(|| WireError::missing_field("amount"))?,
        })
    }
}

impl ProxyStakersQuery {
    /// Set the account whose stakers should be retrieved.
    pub fn account_id(&mut self, account_id: AccountId) -> &mut Self {
        self.data.account_id = Some(account_id);
        self
    }
}

impl QueryData for ProxyStakersQueryData {
    type Output = Vec<ProxyStaker>;

    fn build_request(&self, header: QueryHeader) -> RequestEnvelope {
        RequestEnvelope::ProxyStakers(ProxyStakersRequest {
            header,
            account_num: self.account_id.map(|account_id| account_id.num),
        })
    }

    fn unwrap_response(&self, response: ResponseEnvelope) -> Result<Self::Output, QueryError> {
        match response {
            ResponseEnvelope::ProxyStakers(payload) => payload
                .stakers
                .into_iter()
                .map(ProxyStaker::try_from_wire)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| QueryError::MalformedResponse {
                    tag: QueryTag::ProxyStakers,
                    source,
                }),
            other => Err(QueryError::ProtocolMismatch {
                expected: QueryTag::ProxyStakers,
                actual: other.tag(),
            }),
        }
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<(), ChecksumError> {
        if let Some(account_id) = &self.account_id {
            account_id.validate_checksums(ledger_id)?;
        }
        Ok(())
    }
}
