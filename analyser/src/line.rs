//! Parse one line of an SNMP trap log.
//!
//! Lines look like `timestamp,address,oid,type,value`. Only `OctetString` rows carry an SPL
//! reading; everything else in the log is ignored.

use crate::{decode::extract_spl, SplRecord};
use nom::{
    bytes::complete::{tag, take_until},
    sequence::{delimited, preceded},
    IResult,
};

/// Header rows written by the trap receiver (English and German installs).
const HEADER_PREFIXES: [&str; 2] = ["timestamp,", "zeitstempel,"];

const OCTET_STRING: &str = "octetstring";

/// Whether this line is a CSV header row.
pub fn is_header(line: &str) -> bool {
    HEADER_PREFIXES.iter().any(|prefix| {
        line.get(..prefix.len())
            .is_some_and(|start| start.eq_ignore_ascii_case(prefix))
    })
}

/// Strip the port from a trap source address.
///
/// IPv6 sources are bracketed (`[::1]:162`), IPv4 ones are not (`10.0.0.1:162`). The address
/// itself is not validated.
pub fn source_ip(address: &str) -> &str {
    let address = address.trim();

    if let Some(rest) = address.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }

    address.split(':').next().unwrap_or(address)
}

/// Everything between the first `[` and the next `]`.
fn bracket_span(i: &str) -> IResult<&str, &str> {
    preceded(take_until("["), delimited(tag("["), take_until("]"), tag("]")))(i)
}

/// Decode a single trap log line.
///
/// Returns `None` for anything that isn't a decodable `OctetString` row. This is the common case:
/// most traps in a log have nothing to do with SPL.
pub fn parse_line(line: &str) -> Option<SplRecord> {
    let line = line.trim_end_matches(['\r', '\n']);

    // The value field may itself contain commas
    let mut fields = line.splitn(5, ',');

    let (Some(timestamp), Some(address), Some(_oid), Some(kind), Some(value)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return None;
    };

    if kind.trim().to_lowercase() != OCTET_STRING {
        return None;
    }

    let ip = source_ip(address);

    let (_rest, span) = bracket_span(value).ok()?;

    let tokens = span.split_whitespace().collect::<Vec<_>>();

    if tokens.len() < 2 {
        return None;
    }

    let spl = extract_spl(&tokens)?;

    Some(SplRecord {
        timestamp: timestamp.trim().to_string(),
        ip: ip.to_string(),
        spl,
    })
}
