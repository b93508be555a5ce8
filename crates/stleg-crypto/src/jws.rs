use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use stleg_core::RejectionReason;

/// JWS header. `kid` selects the Key Directory entry; `typ` is carried
/// through but not interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default)]
    pub typ: Option<String>,
    #[serde(default)]
    pub kid: Option<String>,
}

/// A token split into its three segments, with the header decoded (so the
/// `alg`/`kid` checks don't need to re-parse it) but the claims segment left
/// encoded until the signature has been checked.
pub struct ParsedToken {
    pub header: Header,
    pub header_b64: String,
    pub claims_b64: String,
    pub signature: Vec<u8>,
}

/// Split and decode a compact JWS. Any shape other than exactly three
/// base64url segments, or a header that doesn't decode to valid JSON, fails
/// with `Malformed`.
pub fn parse(token: &str) -> Result<ParsedToken, RejectionReason> {
    let mut parts = token.split('.');
    let (Some(h64), Some(p64), Some(s64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(RejectionReason::Malformed);
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(h64)
        .map_err(|_| RejectionReason::Malformed)?;
    let header: Header =
        serde_json::from_slice(&header_bytes).map_err(|_| RejectionReason::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(s64)
        .map_err(|_| RejectionReason::Malformed)?;

    Ok(ParsedToken {
        header,
        header_b64: h64.to_owned(),
        claims_b64: p64.to_owned(),
        signature,
    })
}

/// The exact byte sequence that was signed.
#[must_use]
pub fn signing_input(header_b64: &str, claims_b64: &str) -> Vec<u8> {
    format!("{header_b64}.{claims_b64}").into_bytes()
}

/// Decode the claims segment to raw JSON bytes, deferred until after
/// signature verification so an attacker cannot probe claim-schema errors
/// without a valid signature.
pub fn decode_claims(claims_b64: &str) -> Result<Vec<u8>, RejectionReason> {
    URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| RejectionReason::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(parse("a.b"), Err(RejectionReason::Malformed)));
        assert!(matches!(parse("a.b.c.d"), Err(RejectionReason::Malformed)));
    }

    #[test]
    fn rejects_non_json_header() {
        let h = URL_SAFE_NO_PAD.encode(b"not json");
        let token = format!("{h}.e30.e30");
        assert!(matches!(parse(&token), Err(RejectionReason::Malformed)));
    }
}
