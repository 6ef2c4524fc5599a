// src/tools/alldomains.rs

use std::sync::Arc;

use chrono::{SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::{Field, GatewayError, InputContract, OperationDescriptor, Outcome, Refinement};
use crate::providers::alldomains::{DomainName, DomainRegistry};
use crate::utils::checksum_address;

const PROVIDER: &str = "alldomains";

type Registry = Arc<dyn DomainRegistry>;

#[derive(Deserialize)]
struct OwnerArgs {
    address: String,
}

#[derive(Deserialize)]
struct OwnerTldArgs {
    address: String,
    tld: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainArgs {
    domain_tld: String,
}

fn owner_field() -> Field {
    Field::string("address", "User's EVM address").refine(Refinement::EvmAddress)
}

fn domain_field() -> Field {
    Field::string("domainTld", "Full domain name (e.g., miester.mon)")
        .refine(Refinement::MinLength(1))
}

fn checksummed(address: &str) -> String {
    checksum_address(address).unwrap_or_else(|| address.to_string())
}

fn domain_list(domains: Vec<DomainName>) -> Vec<Value> {
    domains
        .into_iter()
        .map(|d| json!({ "domain": d.full() }))
        .collect()
}

/// Unix seconds as an ISO-8601 UTC timestamp with millisecond precision.
fn iso_timestamp(secs: u64) -> Value {
    i64::try_from(secs)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .map(|t| json!(t.to_rfc3339_opts(SecondsFormat::Millis, true)))
        .unwrap_or(Value::Null)
}

async fn all_user_domains(registry: Registry, args: OwnerArgs) -> Result<Outcome, GatewayError> {
    let address = checksummed(&args.address);
    let domains = registry.all_user_domains(&address).await?;
    Ok(Outcome::list(
        "domains",
        json!({ "address": address }),
        domain_list(domains),
        "No domains found.",
    ))
}

async fn main_domain(registry: Registry, args: OwnerArgs) -> Result<Outcome, GatewayError> {
    let address = checksummed(&args.address);
    let metadata = json!({ "address": address });
    Ok(match registry.main_domain(&address).await? {
        Some(d) => Outcome::success(
            "mainDomain",
            metadata,
            json!({ "domain": d.domain_name, "tld": d.tld, "fullDomain": d.full() }),
        ),
        None => Outcome::empty_record(
            "mainDomain",
            metadata,
            "No main domain configured for this address.",
        ),
    })
}

async fn name_record(registry: Registry, args: DomainArgs) -> Result<Outcome, GatewayError> {
    let record = registry.name_record(&args.domain_tld).await?;
    Ok(Outcome::success(
        "nameRecord",
        json!({ "domainTld": args.domain_tld }),
        json!({
            "createdAt": iso_timestamp(record.created_at),
            "expiresAt": iso_timestamp(record.expires_at),
            "mainDomainAddress": record.main_domain_address,
            "transferrable": record.transferrable,
        }),
    ))
}

async fn owner(registry: Registry, args: DomainArgs) -> Result<Outcome, GatewayError> {
    // Unregistered names resolve to the zero address, which is still an answer.
    let owner = registry.owner_of(&args.domain_tld).await?;
    Ok(Outcome::success(
        "owner",
        json!({ "domainTld": args.domain_tld }),
        json!(owner),
    ))
}

async fn user_domains_by_tld(
    registry: Registry,
    args: OwnerTldArgs,
) -> Result<Outcome, GatewayError> {
    let address = checksummed(&args.address);
    let domains = registry.user_domains_by_tld(&address, &args.tld).await?;
    Ok(Outcome::list(
        "domains",
        json!({ "address": address, "tld": args.tld }),
        domain_list(domains),
        "No domains found for this address and TLD.",
    ))
}

pub fn descriptors(registry: Registry) -> Vec<OperationDescriptor> {
    let r1 = registry.clone();
    let r2 = registry.clone();
    let r3 = registry.clone();
    let r4 = registry.clone();
    let r5 = registry;
    vec![
        OperationDescriptor::new(
            "get_all_user_domains",
            PROVIDER,
            "Fetches all domains registered by a user.",
            InputContract::new().field(owner_field()),
            move |args| all_user_domains(r1.clone(), args),
        ),
        OperationDescriptor::new(
            "get_main_domain",
            PROVIDER,
            "Fetches the main domain configured for a user.",
            InputContract::new().field(owner_field()),
            move |args| main_domain(r2.clone(), args),
        ),
        OperationDescriptor::new(
            "get_name_record_from_domain_tld",
            PROVIDER,
            "Fetches the complete NameRecord of a domain.",
            InputContract::new().field(domain_field()),
            move |args| name_record(r3.clone(), args),
        ),
        OperationDescriptor::new(
            "get_owner_from_domain_tld",
            PROVIDER,
            "Fetches the owner address of a domain.",
            InputContract::new().field(domain_field()),
            move |args| owner(r4.clone(), args),
        ),
        OperationDescriptor::new(
            "get_user_domains_by_tld",
            PROVIDER,
            "Fetches all domains a user holds under one TLD.",
            InputContract::new()
                .field(owner_field())
                .field(Field::string("tld", "Top-level domain, e.g. .mon").refine(Refinement::MinLength(1))),
            move |args| user_domains_by_tld(r5.clone(), args),
        ),
    ]
}
