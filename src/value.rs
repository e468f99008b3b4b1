//! Normalisation of raw `TYPE: VALUE` response strings.
//!
//! [`extract_type_and_value`] is the only place that pattern-matches a raw
//! response. Everything else here builds on it and degrades to an empty
//! string on failure, logging the offending input at debug level.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{PollError, Result};

static TYPE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^"?([^ ]+:)(.*)"?$"#).expect("type/value pattern is valid")
});

/// Split a raw response into its type tag (with the colon) and its value,
/// with surrounding whitespace and one enclosing pair of quotes removed from
/// the value. Quotes inside the value are kept.
///
/// ```
/// use ipam_snmp_poller::value::extract_type_and_value;
///
/// let (kind, value) = extract_type_and_value(r#"STRING: "255.255.255.0""#).unwrap();
/// assert_eq!(kind, "STRING:");
/// assert_eq!(value, "255.255.255.0");
/// ```
pub fn extract_type_and_value(raw: &str) -> Result<(String, String)> {
    let caps = TYPE_VALUE
        .captures(raw)
        .ok_or_else(|| PollError::parse(raw, "not a TYPE: VALUE response"))?;
    let kind = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let mut value = caps.get(2).map_or("", |m| m.as_str()).trim();
    // The pattern consumed the opening quote of a fully quoted response.
    if raw.starts_with('"') {
        value = value.strip_suffix('"').unwrap_or(value).trim_end();
    }
    Ok((kind, unquote(value).to_string()))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Value half of a response, escaped for direct inclusion in a view.
pub fn parse_value(raw: &str) -> String {
    match extract_type_and_value(raw) {
        Ok((_, value)) => escape_html(&value),
        Err(e) => {
            debug!(raw, error = %e, "unparseable SNMP value");
            String::new()
        }
    }
}

/// Numeric value of an INTEGER/Gauge32-style response, e.g. an ifIndex.
pub fn parse_index(raw: &str) -> Option<u32> {
    match extract_type_and_value(raw) {
        Ok((_, value)) => {
            let parsed = value.parse().ok();
            if parsed.is_none() {
                debug!(raw, "SNMP value is not an index");
            }
            parsed
        }
        Err(e) => {
            debug!(raw, error = %e, "unparseable SNMP value");
            None
        }
    }
}

/// Canonical `AA:BB:CC:DD:EE:FF` form of a MAC response, or an empty string
/// when the value is not a MAC address.
///
/// Accepts a 6-byte binary string, 12 unseparated hex digits, or six groups
/// of 1-2 hex digits separated by `:`, `-` or space.
pub fn format_mac(raw: &str) -> String {
    match try_format_mac(raw) {
        Ok(mac) => mac,
        Err(e) => {
            debug!(raw, error = %e, "unusable MAC value");
            String::new()
        }
    }
}

fn try_format_mac(raw: &str) -> Result<String> {
    let (_, value) = extract_type_and_value(raw)?;

    let octets: Vec<String> = if value.chars().count() == 6 {
        value
            .chars()
            .map(|c| match u8::try_from(u32::from(c)) {
                Ok(byte) => Ok(format!("{:02X}", byte)),
                Err(_) => Err(PollError::parse(raw, "binary MAC byte out of range")),
            })
            .collect::<Result<_>>()?
    } else if value.len() == 12 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        value
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).to_ascii_uppercase())
            .collect()
    } else {
        value
            .split([':', '-', ' '])
            .map(|group| {
                if (1..=2).contains(&group.len()) && group.chars().all(|c| c.is_ascii_hexdigit()) {
                    Ok(format!("{:0>2}", group.to_ascii_uppercase()))
                } else {
                    Err(PollError::parse(raw, format!("bad MAC group '{}'", group)))
                }
            })
            .collect::<Result<_>>()?
    };

    if octets.len() != 6 {
        return Err(PollError::parse(
            raw,
            format!("expected 6 octets, found {}", octets.len()),
        ));
    }
    Ok(octets.join(":"))
}

/// Decode a length-prefixed ASCII index suffix (`4.118.112.110.49` is
/// `vpn1`). Anything that is not such an encoding comes back unchanged.
pub fn decode_vrf_name(suffix: &str) -> String {
    let parts: Vec<&str> = suffix.split('.').collect();
    let Some(len) = parts.first().and_then(|p| p.parse::<usize>().ok()) else {
        return suffix.to_string();
    };
    if len + 1 != parts.len() || len == 0 {
        return suffix.to_string();
    }

    let decoded: Option<String> = parts[1..]
        .iter()
        .map(|p| p.parse::<u8>().ok().filter(u8::is_ascii).map(char::from))
        .collect();
    match decoded {
        Some(name) => name,
        None => {
            debug!(suffix, "index suffix is not an ASCII name");
            suffix.to_string()
        }
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_quoted_string() {
        let (kind, value) = extract_type_and_value(r#"STRING: "255.255.255.0""#).unwrap();
        assert_eq!(kind, "STRING:");
        assert_eq!(value, "255.255.255.0");
    }

    #[test]
    fn extract_whole_response_quoted() {
        let (kind, value) = extract_type_and_value(r#""INTEGER: 42""#).unwrap();
        assert_eq!(kind, "INTEGER:");
        assert_eq!(value, "42");
    }

    #[test]
    fn extract_keeps_inner_quotes() {
        let (_, value) = extract_type_and_value(r#"STRING: "say "hi"""#).unwrap();
        assert_eq!(value, r#"say "hi""#);
        let (_, value) = extract_type_and_value(r#"STRING: """#).unwrap();
        assert_eq!(value, "");
        let (_, value) = extract_type_and_value(r#""STRING: "core""#).unwrap();
        assert_eq!(value, "core");
    }

    #[test]
    fn binary_mac_with_quote_byte() {
        assert_eq!(format_mac("STRING: \"\"ABCDE\""), "22:41:42:43:44:45");
        assert_eq!(format_mac("STRING: \"ABCDE\"\""), "41:42:43:44:45:22");
    }

    #[test]
    fn extract_keeps_multiline_values() {
        let (_, value) = extract_type_and_value("STRING: \"Cisco IOS\nVersion 15\"").unwrap();
        assert_eq!(value, "Cisco IOS\nVersion 15");
    }

    #[test]
    fn extract_rejects_untyped_input() {
        assert!(matches!(
            extract_type_and_value(""),
            Err(PollError::Parse { .. })
        ));
        assert!(extract_type_and_value("just words").is_err());
    }

    #[test]
    fn mac_from_separated_short_groups() {
        assert_eq!(format_mac("STRING: 0:1b:c:55:7:2a"), "00:1B:0C:55:07:2A");
    }

    #[test]
    fn mac_from_hex_string() {
        assert_eq!(format_mac("Hex-STRING: 00 1B 0C 55 07 2A "), "00:1B:0C:55:07:2A");
    }

    #[test]
    fn mac_from_dashes_and_unseparated() {
        assert_eq!(format_mac("STRING: 00-1b-0c-55-07-2a"), "00:1B:0C:55:07:2A");
        assert_eq!(format_mac("STRING: 001b0c55072a"), "00:1B:0C:55:07:2A");
    }

    #[test]
    fn mac_from_binary_bytes() {
        assert_eq!(format_mac("STRING: \"abc;_~\""), "61:62:63:3B:5F:7E");
    }

    #[test]
    fn malformed_mac_is_empty() {
        assert_eq!(format_mac("STRING: zz:zz"), "");
        assert_eq!(format_mac("STRING: 0:1b:c:55:7"), "");
        assert_eq!(format_mac("STRING: 0:1b:c:55:7:2a:9"), "");
        assert_eq!(format_mac("STRING: 000:1b:c:55:7:2a"), "");
        assert_eq!(format_mac("garbage"), "");
    }

    #[test]
    fn parse_value_escapes_markup() {
        assert_eq!(parse_value(r#"STRING: "<uplink> & 'core'""#), "&lt;uplink&gt; &amp; &#039;core&#039;");
        assert_eq!(parse_value("IpAddress: 10.0.0.1"), "10.0.0.1");
        assert_eq!(parse_value("nonsense"), "");
    }

    #[test]
    fn parse_index_reads_integers() {
        assert_eq!(parse_index("INTEGER: 10101"), Some(10101));
        assert_eq!(parse_index("STRING: \"Gi0/1\""), None);
    }

    #[test]
    fn vrf_name_decoding() {
        assert_eq!(decode_vrf_name("4.118.112.110.49"), "vpn1");
        assert_eq!(decode_vrf_name("3.118.112.110.49"), "3.118.112.110.49");
        assert_eq!(decode_vrf_name("17"), "17");
        assert_eq!(decode_vrf_name("2.300.65"), "2.300.65");
    }

    #[test]
    fn vrf_name_decoding_is_idempotent() {
        let once = decode_vrf_name("4.118.112.110.49");
        assert_eq!(decode_vrf_name(&once), once);
    }
}
