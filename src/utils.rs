//! Parsing helpers for vendor proxy list formats.

use crate::error::EndpointParseError;
use crate::proxy::{Protocol, ProxyEndpoint};

/// Parse a single vendor list entry into an endpoint.
///
/// Accepts `host:port:user:pass` (authenticated) and `host:port` (open).
pub(crate) fn parse_proxy_line(
    line: &str,
    protocol: Protocol,
) -> Result<ProxyEndpoint, EndpointParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(EndpointParseError::Empty);
    }

    let parts: Vec<&str> = trimmed.splitn(4, ':').collect();
    match parts.as_slice() {
        [host, port, user, pass] => {
            let port = parse_port(port)?;
            Ok(ProxyEndpoint::new(*host, port, protocol).with_credentials(*user, *pass))
        }
        [host, port] => {
            let port = parse_port(port)?;
            Ok(ProxyEndpoint::new(*host, port, protocol))
        }
        _ => Err(EndpointParseError::Unrecognized {
            value: trimmed.to_string(),
        }),
    }
}

fn parse_port(raw: &str) -> Result<u16, EndpointParseError> {
    raw.parse::<u16>()
        .map_err(|_| EndpointParseError::InvalidPort {
            value: raw.to_string(),
        })
}
