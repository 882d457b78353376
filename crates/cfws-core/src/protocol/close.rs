//! Close handshake arguments, validated the way a browser socket does.

use crate::error::{CfwsError, Result};

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Reported when the socket went away without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;
/// Reported when the peer's close frame carried no status.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Upper bound on the UTF-8 length of a close reason.
pub const MAX_CLOSE_REASON_BYTES: usize = 123;

/// Check caller-supplied close arguments.
///
/// Accepts `1000` or an application code in `3000..=4999`, and a reason of
/// at most 123 bytes.
pub fn validate_close(code: Option<u16>, reason: Option<&str>) -> Result<()> {
    if let Some(code) = code {
        if code != CLOSE_NORMAL && !(3000..=4999).contains(&code) {
            return Err(CfwsError::InvalidCloseCode(code));
        }
    }
    if let Some(reason) = reason {
        if reason.len() > MAX_CLOSE_REASON_BYTES {
            return Err(CfwsError::Syntax(format!(
                "close reason is {} bytes, limit is {MAX_CLOSE_REASON_BYTES}",
                reason.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn reserved_codes_are_rejected() {
        let err = validate_close(Some(1001), None).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidAccess));
        assert!(validate_close(Some(4000), Some("bye")).is_ok());
        assert!(validate_close(None, None).is_ok());
    }

    #[test]
    fn reason_limit_counts_bytes() {
        // 62 two-byte characters = 124 bytes
        let reason = "é".repeat(62);
        let err = validate_close(Some(1000), Some(&reason)).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Syntax));
    }
}
