use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use hexfog_core::{MapState, RawMapState};

const SHARE_DOMAIN: &str = "hexmap";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded map payload.
pub(crate) const SHARE_HEADER: &str = "hexmap:v1";
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while decoding share codes.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("share code was empty")]
    EmptyPayload,
    /// The code did not contain a version segment.
    #[error("share code is missing the version")]
    MissingVersion,
    /// The code did not include the payload segment.
    #[error("share code is missing the payload")]
    MissingPayload,
    /// The code used an unexpected prefix segment.
    #[error("share code prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    #[error("share code version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode share code payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialized or deserialized.
    #[error("could not parse share code payload")]
    InvalidPayload(#[source] serde_json::Error),
}

/// Encodes the full map state into a single line suitable for pasting.
pub(crate) fn encode(state: &MapState) -> Result<String, TransferError> {
    let json = serde_json::to_vec(state).map_err(TransferError::InvalidPayload)?;
    Ok(format!("{SHARE_HEADER}:{}", STANDARD_NO_PAD.encode(json)))
}

/// Decodes a share code into an unvalidated record.
///
/// Trailing base64 padding is tolerated so codes produced by other encoders
/// still load.
pub(crate) fn decode(value: &str) -> Result<RawMapState, TransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().unwrap_or_default();
    let version = parts.next().ok_or(TransferError::MissingVersion)?;
    let payload = parts.next().ok_or(TransferError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(TransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(TransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(TransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(TransferError::InvalidPayload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use hexfog_core::{HexId, Settings, Token};

    fn sample_state() -> MapState {
        let mut state = MapState::default();
        state.tokens.push(Token::at(Vec2::new(120.0, 80.0), 0));
        let _ = state.revealed_hexes.insert(HexId::new(3, 4));
        state
    }

    #[test]
    fn encoded_state_imports_back() {
        let state = sample_state();
        let code = encode(&state).expect("encode");
        assert!(code.starts_with("hexmap:v1:"));

        let loaded = decode(&code)
            .expect("decode")
            .into_strict(&Settings::default())
            .expect("complete record");
        assert_eq!(loaded.state, state);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn padded_codes_are_accepted() {
        let code = format!("{}==\n", encode(&sample_state()).expect("encode"));
        assert!(decode(&code).is_ok());
    }

    #[test]
    fn foreign_prefixes_are_rejected() {
        assert!(matches!(
            decode("dungeon:v1:abc"),
            Err(TransferError::InvalidPrefix(prefix)) if prefix == "dungeon"
        ));
        assert!(matches!(
            decode("hexmap:v2:abc"),
            Err(TransferError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(decode("hexmap"), Err(TransferError::MissingVersion)));
        assert!(matches!(decode("hexmap:v1"), Err(TransferError::MissingPayload)));
        assert!(matches!(decode("   "), Err(TransferError::EmptyPayload)));
    }

    #[test]
    fn garbage_payloads_are_reported() {
        assert!(matches!(
            decode("hexmap:v1:!!!"),
            Err(TransferError::InvalidEncoding(_))
        ));
        let not_json = format!("hexmap:v1:{}", STANDARD_NO_PAD.encode("[1, 2"));
        assert!(matches!(
            decode(&not_json),
            Err(TransferError::InvalidPayload(_))
        ));
    }
}
