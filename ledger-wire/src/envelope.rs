use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Discriminant naming the remote service method an envelope addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum QueryTag {
    #[display(fmt = "proxyStakers")]
    ProxyStakers,
    #[display(fmt = "accountBalance")]
    AccountBalance,
}

/// How much proof the caller wants attached to the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseType {
    #[default]
    AnswerOnly,
    AnswerStateProof,
}

/// Cross-cutting request metadata. Opaque to the execution core: the
/// payment blob, when present, is a pre-signed transfer produced upstream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryHeader {
    pub response_type: ResponseType,
    pub payment: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStakersRequest {
    pub header: QueryHeader,
    pub account_num: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceRequest {
    pub header: QueryHeader,
    pub account_num: Option<u64>,
}

/// Request container with exactly one populated slot per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEnvelope {
    ProxyStakers(ProxyStakersRequest),
    AccountBalance(AccountBalanceRequest),
}

impl RequestEnvelope {
    pub fn tag(&self) -> QueryTag {
        match self {
            RequestEnvelope::ProxyStakers(_) => QueryTag::ProxyStakers,
            RequestEnvelope::AccountBalance(_) => QueryTag::AccountBalance,
        }
    }
}

/// One staking record as the node reports it. Fields are optional on the
/// wire, schema-compiler style; decoding into a domain value may fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStakerEntry {
    pub account_num: Option<u64>,
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStakersResponse {
    pub stakers: Vec<ProxyStakerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceResponse {
    pub account_num: Option<u64>,
    pub balance: Option<u64>,
}

/// Response container mirroring `RequestEnvelope` slot for slot. The
/// populated slot must match the request's tag; a mismatch is a contract
/// violation on the node's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseEnvelope {
    ProxyStakers(ProxyStakersResponse),
    AccountBalance(AccountBalanceResponse),
}

impl ResponseEnvelope {
    pub fn tag(&self) -> QueryTag {
        match self {
            ResponseEnvelope::ProxyStakers(_) => QueryTag::ProxyStakers,
            ResponseEnvelope::AccountBalance(_) => QueryTag::AccountBalance,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::envelope::{
        AccountBalanceResponse, ProxyStakersRequest, QueryHeader, QueryTag, RequestEnvelope,
        ResponseEnvelope,
    };

    #[test]
    fn tags_follow_populated_slot() {
        let request = RequestEnvelope::ProxyStakers(ProxyStakersRequest {
            header: QueryHeader::default(),
            account_num: Some(1001),
        });
        assert_eq!(request.tag(), QueryTag::ProxyStakers);
        let response = ResponseEnvelope::AccountBalance(AccountBalanceResponse {
            account_num: Some(1001),
            balance: Some(0),
        });
        assert_eq!(response.tag(), QueryTag::AccountBalance);
    }

    #[test]
    fn envelope_json_keeps_single_slot() {
        let request = RequestEnvelope::ProxyStakers(ProxyStakersRequest {
            header: QueryHeader::default(),
            account_num: None,
        });
        let json = serde_json::to_value(&request).unwrap();
        let slots = json.as_object().unwrap();
        assert_eq!(slots.len(), 1);
        assert!(slots.contains_key("ProxyStakers"));
        assert_eq!(slots["ProxyStakers"]["account_num"], serde_json::Value::Null);
    }
}
