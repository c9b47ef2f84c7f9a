use time::OffsetDateTime;

/// `YYYYMMDDHHMMSS` in UTC.
pub fn stk_timestamp(now: OffsetDateTime) -> String {
    let now = now.to_offset(time::UtcOffset::UTC);
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// `base64(shortcode ‖ passkey ‖ timestamp)`, padded.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    fast32::base64::RFC4648.encode(format!("{shortcode}{passkey}{timestamp}").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_timestamp_is_utc_and_zero_padded() {
        assert_eq!(stk_timestamp(datetime!(2024-03-05 07:08:09 UTC)), "20240305070809");
        assert_eq!(
            stk_timestamp(datetime!(2024-03-05 10:08:09 +03:00)),
            "20240305070809"
        );
    }

    #[test]
    fn test_password_matches_gateway_encoding() {
        // base64("174379" + "pass" + "20240305070809")
        assert_eq!(
            stk_password("174379", "pass", "20240305070809"),
            "MTc0Mzc5cGFzczIwMjQwMzA1MDcwODA5"
        );
        assert_eq!(stk_password("1", "2", "3"), "MTIz");
        assert_eq!(stk_password("1", "2", "34"), "MTIzNA==");
    }
}
