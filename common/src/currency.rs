/// Format a whole-kronor amount for display, grouping thousands the Swedish way.
///
/// `format_sek(9500)` → `"9 500 SEK"`.
pub fn format_sek(amount_sek: u64) -> String {
    let digits = amount_sek.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{grouped} SEK")
}
