/// Group the decimal digits of `n` in thousands: `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whole-dollar USD string, eg `"$1,235"`.
pub fn format_usd(value: f64) -> String {
    let rounded = value.max(0.0).round();
    format!("${}", group_thousands(rounded as u128))
}
