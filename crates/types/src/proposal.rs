//! Governance proposals owned by the gravity module.
//!
//! Proposal types are not registered globally. Application bootstrap builds a
//! [`ProposalRegistry`] and calls [`register_gravity_proposals`] on it.

use crate::address::EthAddress;
use crate::coin::Coins;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Routing key of the gravity module.
pub const ROUTER_KEY: &str = "gravity";

pub const PROPOSAL_TYPE_COMMUNITY_POOL_ETHEREUM_SPEND: &str = "CommunityPoolEthereumSpend";

/// Amino-style codec name for the spend proposal.
pub const COMMUNITY_POOL_ETHEREUM_SPEND_CODEC: &str = "gravity/CommunityPoolEthereumSpendProposal";

pub const MAX_TITLE_LENGTH: usize = 140;
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("proposal title cannot be blank")]
    BlankTitle,

    #[error("proposal title is longer than max length of {MAX_TITLE_LENGTH}")]
    TitleTooLong,

    #[error("proposal description cannot be blank")]
    BlankDescription,

    #[error("proposal description is longer than max length of {MAX_DESCRIPTION_LENGTH}")]
    DescriptionTooLong,

    #[error("invalid community pool spend proposal amount")]
    InvalidProposalAmount,

    #[error("invalid community pool spend proposal recipient")]
    InvalidProposalRecipient,

    #[error("proposal type {0} already registered")]
    DuplicateType(String),
}

/// Spend community pool funds to an Ethereum recipient through the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityPoolEthereumSpendProposal {
    pub title: String,
    pub description: String,
    pub recipient: String,
    pub amount: Coins,
}

impl CommunityPoolEthereumSpendProposal {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        recipient: &EthAddress,
        amount: Coins,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            recipient: recipient.to_string(),
            amount,
        }
    }

    pub fn proposal_route(&self) -> &'static str {
        ROUTER_KEY
    }

    pub fn proposal_type(&self) -> &'static str {
        PROPOSAL_TYPE_COMMUNITY_POOL_ETHEREUM_SPEND
    }

    /// Stateless checks: title and description bounds, then amount, then recipient.
    pub fn validate_basic(&self) -> Result<(), ProposalError> {
        if self.title.trim().is_empty() {
            return Err(ProposalError::BlankTitle);
        }
        if self.title.len() > MAX_TITLE_LENGTH {
            return Err(ProposalError::TitleTooLong);
        }
        if self.description.is_empty() {
            return Err(ProposalError::BlankDescription);
        }
        if self.description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(ProposalError::DescriptionTooLong);
        }
        if self.amount.is_empty() || !self.amount.is_valid() {
            return Err(ProposalError::InvalidProposalAmount);
        }
        if !EthAddress::is_hex_address(&self.recipient) {
            return Err(ProposalError::InvalidProposalRecipient);
        }
        Ok(())
    }
}

impl fmt::Display for CommunityPoolEthereumSpendProposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Community Pool Spend Proposal:")?;
        writeln!(f, "  Title:       {}", self.title)?;
        writeln!(f, "  Description: {}", self.description)?;
        writeln!(f, "  Recipient:   {}", self.recipient)?;
        writeln!(f, "  Amount:      {}", self.amount)
    }
}

/// Proposal types known to the governance module, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct ProposalRegistry {
    codecs: BTreeMap<String, String>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a proposal type with its codec name. A type can be registered once.
    pub fn register(&mut self, proposal_type: &str, codec_name: &str) -> Result<(), ProposalError> {
        if self.codecs.contains_key(proposal_type) {
            return Err(ProposalError::DuplicateType(proposal_type.to_string()));
        }
        self.codecs
            .insert(proposal_type.to_string(), codec_name.to_string());
        Ok(())
    }

    pub fn is_registered(&self, proposal_type: &str) -> bool {
        self.codecs.contains_key(proposal_type)
    }

    pub fn codec_name(&self, proposal_type: &str) -> Option<&str> {
        self.codecs.get(proposal_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

/// Register the gravity module's proposal types.
pub fn register_gravity_proposals(registry: &mut ProposalRegistry) -> Result<(), ProposalError> {
    registry.register(
        PROPOSAL_TYPE_COMMUNITY_POOL_ETHEREUM_SPEND,
        COMMUNITY_POOL_ETHEREUM_SPEND_CODEC,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::Coin;

    fn proposal() -> CommunityPoolEthereumSpendProposal {
        CommunityPoolEthereumSpendProposal::new(
            "Fund relayers",
            "Pay relayer gas for a month",
            &EthAddress([0xab; 20]),
            Coins::from(Coin::new("stake", 1000)),
        )
    }

    #[test]
    fn test_valid_proposal() {
        assert_eq!(proposal().validate_basic(), Ok(()));
    }

    #[test]
    fn test_title_bounds() {
        let mut p = proposal();
        p.title = " ".into();
        assert_eq!(p.validate_basic(), Err(ProposalError::BlankTitle));
        p.title = "t".repeat(MAX_TITLE_LENGTH + 1);
        assert_eq!(p.validate_basic(), Err(ProposalError::TitleTooLong));
        p.title = "t".repeat(MAX_TITLE_LENGTH);
        assert_eq!(p.validate_basic(), Ok(()));
    }

    #[test]
    fn test_description_bounds() {
        let mut p = proposal();
        p.description = "d".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert_eq!(p.validate_basic(), Err(ProposalError::DescriptionTooLong));
    }

    #[test]
    fn test_invalid_amount() {
        let mut p = proposal();
        p.amount = Coins::from_raw(vec![Coin::new("stake", 0)]);
        assert_eq!(p.validate_basic(), Err(ProposalError::InvalidProposalAmount));
        p.amount = Coins::new();
        assert_eq!(p.validate_basic(), Err(ProposalError::InvalidProposalAmount));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut p = proposal();
        p.recipient = "cosmos1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqnrql8a".into();
        assert_eq!(
            p.validate_basic(),
            Err(ProposalError::InvalidProposalRecipient)
        );
    }

    #[test]
    fn test_registry_is_explicit() {
        let mut registry = ProposalRegistry::new();
        assert!(!registry.is_registered(PROPOSAL_TYPE_COMMUNITY_POOL_ETHEREUM_SPEND));

        register_gravity_proposals(&mut registry).unwrap();
        assert_eq!(
            registry.codec_name(PROPOSAL_TYPE_COMMUNITY_POOL_ETHEREUM_SPEND),
            Some(COMMUNITY_POOL_ETHEREUM_SPEND_CODEC)
        );
        assert!(matches!(
            register_gravity_proposals(&mut registry),
            Err(ProposalError::DuplicateType(_))
        ));
    }
}
