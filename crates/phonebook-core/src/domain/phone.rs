/// Shown whenever a number fails [`is_valid_phone_number`].
pub const PHONE_FORMAT_HINT: &str = "Invalid format! Use: 09-12345678 or 040-1234567";

const MIN_AREA_DIGITS: usize = 2;
const MAX_AREA_DIGITS: usize = 3;
const MIN_SUBSCRIBER_DIGITS: usize = 6;
const MIN_TOTAL_DIGITS: usize = 8;

/// Removes every whitespace character, keeping the typed separators.
pub fn sanitize_phone_number(raw: &str) -> String {
    raw.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Digits-only form used for equality checks. Never stored or displayed.
pub fn normalize_phone_number(raw: &str) -> String {
    raw.chars()
        .filter(|ch| *ch != '-' && !ch.is_whitespace())
        .collect()
}

/// Accepts `<2-3 digits>-<6+ digits>` once whitespace is stripped, with at
/// least eight digits overall.
pub fn is_valid_phone_number(raw: &str) -> bool {
    let compact = sanitize_phone_number(raw);
    let Some((area, subscriber)) = compact.split_once('-') else {
        return false;
    };

    let area_ok = all_ascii_digits(area)
        && (MIN_AREA_DIGITS..=MAX_AREA_DIGITS).contains(&area.len());
    let subscriber_ok = all_ascii_digits(subscriber) && subscriber.len() >= MIN_SUBSCRIBER_DIGITS;

    area_ok && subscriber_ok && normalize_phone_number(&compact).len() >= MIN_TOTAL_DIGITS
}

fn all_ascii_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
