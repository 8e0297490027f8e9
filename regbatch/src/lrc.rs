//! Longitudinal Redundancy Check used by byte oriented serial framing
//!
//! The LRC of a payload is the two's complement of the modulo-256 sum of its bytes, so
//! `sum(payload) + lrc(payload) == 0 (mod 256)`.

use crate::error::FrameError;

pub(crate) mod constants {
    pub(crate) const START: u8 = b':';
    pub(crate) const END: &[u8] = b"\r\n";
}

fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, x| acc.wrapping_add(*x))
}

/// Compute the LRC of a payload (framing delimiters and checksum excluded)
///
/// An empty payload yields 0.
pub fn compute(bytes: &[u8]) -> u8 {
    (256 - sum(bytes) as u16) as u8
}

/// Compute the LRC using the one's complement plus one formulation
///
/// Always equal to [`compute`].
pub fn compute_complement(bytes: &[u8]) -> u8 {
    (!sum(bytes)).wrapping_add(1)
}

/// Check a claimed LRC against a payload
pub fn verify(bytes: &[u8], claimed: u8) -> bool {
    compute(bytes) == claimed
}

/// Parse a payload given as ASCII hex, ignoring surrounding and embedded whitespace
pub fn parse_hex(payload: &str) -> Result<Vec<u8>, FrameError> {
    let digits: String = payload.split_whitespace().collect();
    Ok(hex::decode(digits)?)
}

/// Compute the LRC of a payload given as ASCII hex, e.g. `"00100B00001001"`
pub fn compute_hex(payload: &str) -> Result<u8, FrameError> {
    let bytes = parse_hex(payload)?;
    Ok(compute(&bytes))
}

/// Build an ASCII frame: `':'`, upper-case hex payload, hex LRC, CR LF
pub fn encode_ascii_frame(payload: &[u8]) -> Vec<u8> {
    let body = hex::encode_upper(payload);
    let lrc = hex::encode_upper([compute(payload)]);

    let mut frame = Vec::with_capacity(1 + body.len() + lrc.len() + constants::END.len());
    frame.push(constants::START);
    frame.extend_from_slice(body.as_bytes());
    frame.extend_from_slice(lrc.as_bytes());
    frame.extend_from_slice(constants::END);
    frame
}

/// Parse an ASCII frame built by [`encode_ascii_frame`] and return its payload
///
/// Fails if the delimiters are missing, the body is not hex, or the trailing LRC does
/// not match the payload.
pub fn decode_ascii_frame(frame: &[u8]) -> Result<Vec<u8>, FrameError> {
    let rest = frame
        .strip_prefix(&[constants::START])
        .ok_or(FrameError::MissingStart)?;
    let body = rest
        .strip_suffix(constants::END)
        .ok_or(FrameError::MissingEnd)?;

    let mut bytes = hex::decode(body)?;
    let received = bytes.pop().ok_or(FrameError::TooShort)?;
    let expected = compute(&bytes);

    if received != expected {
        tracing::warn!(
            "LRC mismatch - received: 0x{:02X} expected: 0x{:02X}",
            received,
            expected
        );
        return Err(FrameError::ChecksumMismatch { received, expected });
    }

    Ok(bytes)
}
