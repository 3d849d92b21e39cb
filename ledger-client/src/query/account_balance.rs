use ledger_wire::entity::{AccountId, ChecksumError, LedgerId};
use ledger_wire::envelope::{
    AccountBalanceRequest, AccountBalanceResponse, QueryHeader, QueryTag, RequestEnvelope,
    ResponseEnvelope,
};
use ledger_wire::{TryFromWire, WireError};

use crate::query::{Query, QueryData, QueryError};

/// Get the balance of a single account.
pub type AccountBalanceQuery = Query<AccountBalanceQueryData>;

#[derive(Debug, Clone, Default)]
pub struct AccountBalanceQueryData {
    /// The account whose balance should be retrieved.
    pub account_id: Option<AccountId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: u64,
}

impl TryFromWire<AccountBalanceResponse> for AccountBalance {
    fn try_from_wire(wire: AccountBalanceResponse) -> Result<Self, WireError> {
        Ok(AccountBalance {
            account_id: AccountId::new(
                wire.account_num
                    .ok_or_else(|| WireError::missing_field("account_num"))?,
            ),
            balance: wire.balance.ok_or_else(|| WireError::missing_field("balance"))?,
        })
    }
}

impl AccountBalanceQuery {
    /// Set the account whose balance should be retrieved.
    pub fn account_id(&mut self, account_id: AccountId) -> &mut Self {
        self.data.account_id = Some(account_id);
        self
    }
}

impl QueryData for AccountBalanceQueryData {
    type Output = AccountBalance;

    fn build_request(&self, header: QueryHeader) -> RequestEnvelope {
        RequestEnvelope::AccountBalance(AccountBalanceRequest {
            header,
            account_num: self.account_id.map(|account_id| account_id.num),
        })
    }

    fn unwrap_response(&self, response: ResponseEnvelope) -> Result<Self::Output, QueryError> {
        match response {
            ResponseEnvelope::AccountBalance(payload) => AccountBalance::try_from_wire(payload)
                .map_err(|source| QueryError::MalformedResponse {
                    tag: QueryTag::AccountBalance,
                    source,
                }),
            other => Err(QueryError::ProtocolMismatch {
                expected: QueryTag::AccountBalance,
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
