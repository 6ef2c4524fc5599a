// src/providers/alldomains.rs

//! AllDomains name registry, read on-chain through `eth_call`.

use std::str::FromStr;

use async_trait::async_trait;
use ethers_core::abi::{ParamType, Token};
use ethers_core::types::Address;
use ethers_core::utils::to_checksum;
use tracing::debug;

use crate::blockchain::abi::{
    decode_output, encode_call, next_token, take_address, take_array, take_bool, take_string,
    take_tuple, take_uint,
};
use crate::blockchain::rpc::RpcClient;
use crate::providers::ProviderError;

/// A registered name split into its label and TLD, e.g. `miester` + `.mon`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainName {
    pub domain_name: String,
    pub tld: String,
}

impl DomainName {
    pub fn full(&self) -> String {
        format!("{}{}", self.domain_name, self.tld)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    /// Unix seconds.
    pub created_at: u64,
    /// Unix seconds.
    pub expires_at: u64,
    pub main_domain_address: String,
    pub transferrable: bool,
}

#[async_trait]
pub trait DomainRegistry: Send + Sync {
    async fn all_user_domains(&self, owner: &str) -> Result<Vec<DomainName>, ProviderError>;

    async fn user_domains_by_tld(
        &self,
        owner: &str,
        tld: &str,
    ) -> Result<Vec<DomainName>, ProviderError>;

    /// Owner of `name.tld`. Unregistered names resolve to the zero address.
    async fn owner_of(&self, domain_tld: &str) -> Result<String, ProviderError>;

    async fn name_record(&self, domain_tld: &str) -> Result<NameRecord, ProviderError>;

    /// `None` when the owner never set a main domain.
    async fn main_domain(&self, owner: &str) -> Result<Option<DomainName>, ProviderError>;
}

const ALL_USER_DOMAINS: &str = "getAllUserDomains(address)";
const USER_DOMAINS_FROM_TLD: &str = "getAllUserDomainsFromTld(address,string)";
const OWNER_FROM_DOMAIN_TLD: &str = "getOwnerFromDomainTld(string)";
const NAME_RECORD_FROM_DOMAIN_TLD: &str = "getNameRecordFromDomainTld(string)";
const MAIN_DOMAIN: &str = "getMainDomain(address)";

/// Registry contract client.
pub struct RegistryContract {
    rpc: RpcClient,
    registry: Option<String>,
}

impl RegistryContract {
    pub fn new(rpc: RpcClient, registry: Option<String>) -> Self {
        Self { rpc, registry }
    }

    fn registry(&self) -> Result<Address, ProviderError> {
        let raw = self
            .registry
            .as_deref()
            .ok_or(ProviderError::NotConfigured("ALLDOMAINS_REGISTRY_ADDRESS"))?;
        Address::from_str(raw).map_err(|_| {
            ProviderError::InvalidInput(format!("registry address '{}' is not an address", raw))
        })
    }

    async fn call(
        &self,
        signature: &str,
        args: &[Token],
        output: &[ParamType],
    ) -> Result<std::vec::IntoIter<Token>, ProviderError> {
        let registry = self.registry()?;
        debug!(function = signature, "alldomains eth_call");
        let data = self.rpc.eth_call(registry, encode_call(signature, args)).await?;
        Ok(decode_output(signature, output, &data)?.into_iter())
    }

    async fn domain_list(&self, signature: &str, args: &[Token]) -> Result<Vec<DomainName>, ProviderError> {
        let pair = ParamType::Tuple(vec![ParamType::String, ParamType::String]);
        let mut out = self
            .call(signature, args, &[ParamType::Array(Box::new(pair))])
            .await?;
        take_array(next_token(&mut out)?)?
            .into_iter()
            .map(domain_from_tuple)
            .collect()
    }
}

fn parse_owner(owner: &str) -> Result<Address, ProviderError> {
    Address::from_str(owner)
        .map_err(|_| ProviderError::InvalidInput(format!("'{}' is not an EVM address", owner)))
}

fn domain_from_tuple(token: Token) -> Result<DomainName, ProviderError> {
    let mut fields = take_tuple(token)?.into_iter();
    Ok(DomainName {
        domain_name: take_string(next_token(&mut fields)?)?,
        tld: take_string(next_token(&mut fields)?)?,
    })
}

#[async_trait]
impl DomainRegistry for RegistryContract {
    async fn all_user_domains(&self, owner: &str) -> Result<Vec<DomainName>, ProviderError> {
        let owner = parse_owner(owner)?;
        self.domain_list(ALL_USER_DOMAINS, &[Token::Address(owner)]).await
    }

    async fn user_domains_by_tld(
        &self,
        owner: &str,
        tld: &str,
    ) -> Result<Vec<DomainName>, ProviderError> {
        let owner = parse_owner(owner)?;
        self.domain_list(
            USER_DOMAINS_FROM_TLD,
            &[Token::Address(owner), Token::String(tld.to_string())],
        )
        .await
    }

    async fn owner_of(&self, domain_tld: &str) -> Result<String, ProviderError> {
        let mut out = self
            .call(
                OWNER_FROM_DOMAIN_TLD,
                &[Token::String(domain_tld.to_string())],
                &[ParamType::Address],
            )
            .await?;
        let owner = take_address(next_token(&mut out)?)?;
        Ok(to_checksum(&owner, None))
    }

    async fn name_record(&self, domain_tld: &str) -> Result<NameRecord, ProviderError> {
        let mut out = self
            .call(
                NAME_RECORD_FROM_DOMAIN_TLD,
                &[Token::String(domain_tld.to_string())],
                &[
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                    ParamType::Address,
                    ParamType::Bool,
                ],
            )
            .await?;
        Ok(NameRecord {
            created_at: take_uint(next_token(&mut out)?)?.low_u64(),
            expires_at: take_uint(next_token(&mut out)?)?.low_u64(),
            main_domain_address: to_checksum(&take_address(next_token(&mut out)?)?, None),
            transferrable: take_bool(next_token(&mut out)?)?,
        })
    }

    async fn main_domain(&self, owner: &str) -> Result<Option<DomainName>, ProviderError> {
        let owner = parse_owner(owner)?;
        let mut out = self
            .call(
                MAIN_DOMAIN,
                &[Token::Address(owner)],
                &[ParamType::String, ParamType::String],
            )
            .await?;
        let domain = DomainName {
            domain_name: take_string(next_token(&mut out)?)?,
            tld: take_string(next_token(&mut out)?)?,
        };
        Ok((!domain.domain_name.is_empty()).then_some(domain))
    }
}
