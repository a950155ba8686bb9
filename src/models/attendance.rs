use chrono::{Duration, Utc};

/// Derive the attendance code encoded into a registrant's QR image.
///
/// The backend stores the code as twice the numeric value of the normalized
/// phone string, so that mapping has to be preserved on the wire. Doubling
/// is done digit by digit over the decimal string: the validation pattern
/// admits phone strings of up to 19 digits, which overflow both u64 and the
/// 53-bit float mantissa the original relied on.
pub fn derive_code(phone: &str) -> String {
    debug_assert!(phone.chars().all(|c| c.is_ascii_digit()));

    let mut out = Vec::with_capacity(phone.len() + 1);
    let mut carry = 0u8;
    for c in phone.bytes().rev() {
        let doubled = (c - b'0') * 2 + carry;
        out.push(b'0' + doubled % 10);
        carry = doubled / 10;
    }
    if carry > 0 {
        out.push(b'0' + carry);
    }
    out.reverse();
    String::from_utf8(out).expect("doubling only produces ASCII digits")
}

/// Attendance timestamps are recorded in WIB (UTC+7), formatted the way the
/// backend's log column expects: `YYYY-MM-DD HH:MM:SS`.
pub fn log_timestamp() -> String {
    format_log_timestamp(Utc::now())
}

fn format_log_timestamp(now: chrono::DateTime<Utc>) -> String {
    (now + Duration::hours(7))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
