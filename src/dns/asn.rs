//! Origin ASN lookup through the Team Cymru IP-to-ASN DNS service.
//!
//! Two TXT queries per address:
//! - `<reversed-ip>.origin.asn.cymru.com` (or `origin6` for IPv6) answers
//!   `ASN [ASN...] | prefix | country | registry | date`
//! - `AS<n>.asn.cymru.com` answers `ASN | country | registry | date | owner`

use std::net::IpAddr;

use super::DnsBackend;
use crate::error_handling::LookupError;

/// Origin autonomous system of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnInfo {
    /// ASN as a digit string (the statistics key)
    pub asn: String,
    /// Registered owner, e.g. `CLOUDFLARENET, US`
    pub owner: String,
}

/// Looks up the origin ASN of `ip` and the registered owner of that ASN.
///
/// # Errors
///
/// Returns a `LookupError` if either query fails, times out or yields no
/// parseable answer. Callers drop the target in that case.
pub async fn lookup_asn(dns: &dyn DnsBackend, ip: IpAddr) -> Result<AsnInfo, LookupError> {
    let origin_query = cymru_origin_query_name(ip);
    let origin_records = dns.txt(&origin_query).await?;
    let asn = origin_records
        .iter()
        .find_map(|record| parse_origin_asn(record))
        .ok_or_else(|| LookupError::Malformed {
            name: origin_query.clone(),
            record: "TXT",
            answer: origin_records.join(" / "),
        })?;

    let owner_query = format!("AS{asn}.asn.cymru.com");
    let owner_records = dns.txt(&owner_query).await?;
    let owner = owner_records
        .iter()
        .find_map(|record| parse_asn_owner(record))
        .ok_or_else(|| LookupError::Malformed {
            name: owner_query.clone(),
            record: "TXT",
            answer: owner_records.join(" / "),
        })?;

    Ok(AsnInfo { asn, owner })
}

/// Builds the origin query name for `ip`.
///
/// IPv4 octets are reversed; IPv6 addresses are expanded to 32 nibbles and
/// reversed.
pub fn cymru_origin_query_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.origin.asn.cymru.com")
        }
        IpAddr::V6(v6) => {
            let nibbles = v6
                .octets()
                .iter()
                .flat_map(|byte| [byte >> 4, byte & 0x0f])
                .rev()
                .map(|nibble| format!("{nibble:x}"))
                .collect::<Vec<_>>()
                .join(".");
            format!("{nibbles}.origin6.asn.cymru.com")
        }
    }
}

// First ASN of the first column. Multi-origin prefixes list several.
fn parse_origin_asn(record: &str) -> Option<String> {
    let first_column = record.trim().trim_matches('"').split('|').next()?;
    let token = first_column.split_whitespace().next()?;
    let digits = token
        .strip_prefix("AS")
        .or_else(|| token.strip_prefix("as"))
        .unwrap_or(token);
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then(|| digits.to_string())
}

fn parse_asn_owner(record: &str) -> Option<String> {
    let record = record.trim().trim_matches('"');
    if !record.contains('|') {
        return None;
    }
    let owner = record.rsplit('|').next()?.trim();
    (!owner.is_empty()).then(|| owner.to_string())
}
