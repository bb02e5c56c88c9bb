//! Lenient text helpers for values coming from user input.

/// Parse the leading integer of `input`, ignoring surrounding whitespace and
/// any trailing garbage. `"42px"` is `Some(42)`, `"px"` is `None`.
pub fn to_int_or_null(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// Parse the leading decimal number of `input`. `"3.5kg"` is `Some(3.5)`.
pub fn to_float_or_null(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(s.starts_with(['+', '-']));
    let mut seen_digit = false;
    let mut seen_dot = false;

    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }

    // Optional exponent, only taken if it has digits
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}

/// Prepare free text for use inside a Cypher regular expression.
///
/// Leading `*` characters are stripped and the metacharacters
/// `| \ ( ) [ ] { }` are escaped. Empty input gives `None`.
pub fn clear_string_for_regex(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }

    let trimmed = input.trim_start_matches('*');
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if matches!(c, '|' | '\\' | '(' | ')' | '[' | ']' | '{' | '}') {
            out.push('\\');
        }
        out.push(c);
    }
    Some(out)
}
