//! Small text helpers for counts.

/// `""` for exactly one, `"s"` otherwise.
pub fn plural_suffix(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Insert a `,` every three digits from the right, keeping a leading `-`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `"N member"` / `"N members"` with grouped digits.
pub fn count_noun(n: usize, noun: &str) -> String {
    let n = i64::try_from(n).unwrap_or(i64::MAX);
    format!("{} {}{}", group_thousands(n), noun, plural_suffix(n))
}
