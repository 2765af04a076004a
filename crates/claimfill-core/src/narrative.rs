//! Plain-text narrative → markdown.
//!
//! Claimants usually paste their account as loose text with a hand-made
//! breakdown of amounts. Normalising it to markdown makes the breakdown
//! easier for the Describe stage and the claim-value audit to read.

use std::sync::LazyLock;

use regex::Regex;

const MONEY: &str = r"(?:AED|USD|SAR)?\s?[\d,]*\d+\.\d{2}";

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(MONEY).expect("valid regex"));
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(\d+)[.)]?\s+(.*?)\s*({MONEY})?$")).expect("valid regex")
});
static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(?:-\s*)?(?:grand\s+)?total\b.*?{MONEY}")).expect("valid regex")
});

const BULLETS: &[char] = &['○', '-', '•', '*'];

/// Convert a free-text narrative into markdown.
///
/// Line rules, first match wins:
///
/// - blank lines are dropped
/// - `Total` / `Grand Total` lines carrying an amount become bold items
/// - short title-like lines (2 to 5 words, no closing punctuation, no
///   amount, not a list item) become `###` headers
/// - lines starting with a bullet glyph become `-` items
/// - numbered lines become `N.` items, with a trailing amount in bold
/// - any other line has its amounts in bold
pub fn to_markdown(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(convert_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn convert_line(line: &str) -> String {
    let has_money = MONEY_RE.is_match(line);

    if TOTAL_RE.is_match(line) {
        let body = line.trim_start_matches(|c: char| c == '-' || c.is_whitespace());
        return format!("- **{body}**");
    }

    if is_title(line, has_money) {
        return format!("### {line}");
    }

    if line.starts_with(BULLETS) {
        let content = line.trim_start_matches(|c: char| BULLETS.contains(&c) || c == ' ');
        return format!("- {}", content.trim());
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        let idx = &caps[1];
        let item = caps[2].trim();
        return match caps.get(3) {
            Some(amount) => format!("{idx}. {item} **{}**", amount.as_str().trim()),
            None => format!("{idx}. {item}"),
        };
    }

    if has_money {
        return MONEY_RE
            .replace_all(line, |m: &regex::Captures<'_>| format!("**{}**", m[0].trim()))
            .into_owned();
    }

    line.to_string()
}

fn is_title(line: &str, has_money: bool) -> bool {
    let words = line.split_whitespace().count();
    (2..=5).contains(&words)
        && !has_money
        && !line.ends_with(['.', ':'])
        && !line.starts_with(BULLETS)
        && !line.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_title_lines_become_headers() {
        assert_eq!(to_markdown("Unpaid Salary Claim"), "### Unpaid Salary Claim");
        assert_eq!(to_markdown("Background:"), "Background:");
    }

    #[test]
    fn bullet_glyphs_become_dash_items() {
        assert_eq!(to_markdown("• I was dismissed without notice"), "- I was dismissed without notice");
        assert_eq!(to_markdown("○ Notice period was not paid"), "- Notice period was not paid");
    }

    #[test]
    fn numbered_items_bold_their_trailing_amount() {
        assert_eq!(
            to_markdown("1 Unpaid salary for March AED 25,000.00"),
            "1. Unpaid salary for March **AED 25,000.00**"
        );
        assert_eq!(
            to_markdown("2 Repatriation flight to be booked by employer on departure"),
            "2. Repatriation flight to be booked by employer on departure"
        );
    }

    #[test]
    fn total_lines_are_bold_items() {
        assert_eq!(
            to_markdown("Grand Total AED 407,174.85"),
            "- **Grand Total AED 407,174.85**"
        );
    }

    #[test]
    fn amounts_in_sentences_are_bolded() {
        assert_eq!(
            to_markdown("My monthly salary was AED 25,000.00 before deductions."),
            "My monthly salary was **AED 25,000.00** before deductions."
        );
    }

    #[test]
    fn blank_lines_are_dropped() {
        assert_eq!(
            to_markdown("\n\nI worked there for three years.\n\n\nThey did not pay me.\n"),
            "I worked there for three years.\nThey did not pay me."
        );
    }
}
