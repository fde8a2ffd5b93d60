//! Text normalization for matching and price parsing.
//!
//! Everything here is comparison-only: display strings are never rewritten
//! through these helpers.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Added to the Jaccard score when one normalized string contains the other.
pub const CONTAINMENT_BONUS: f64 = 0.15;

static CURRENCY_UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(KWD|KD|د\.?ك|ك\.?د)").expect("valid regex"));
static KWD_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(KWD|KD|د\.?ك|ك\.?د)$").expect("valid regex"));
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// Map Arabic-Indic (`٠`–`٩`) and extended Arabic-Indic (`۰`–`۹`) digits to ASCII.
#[must_use]
pub fn to_ascii_digits(s: &str) -> String {
    s.chars().map(fold_digit).collect()
}

fn fold_digit(c: char) -> char {
    let code = u32::from(c);
    let offset = match code {
        0x0660..=0x0669 => code - 0x0660,
        0x06F0..=0x06F9 => code - 0x06F0,
        _ => return c,
    };
    char::from_digit(offset, 10).unwrap_or(c)
}

/// Lowercased, digit-folded form with punctuation replaced by single spaces.
///
/// ASCII letters and digits, Arabic-block letters, and whitespace survive;
/// everything else becomes a space before whitespace is collapsed.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    let mapped: String = to_ascii_digits(s)
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() || is_arabic_letter(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_arabic_letter(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c) && c.is_alphabetic()
}

/// Distinct tokens of the normalized text.
#[must_use]
pub fn tokenize(s: &str) -> BTreeSet<String> {
    normalize_text(s)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a Kuwaiti dinar amount out of free text such as `"KD 1,250.500"`
/// or `"١٫٢٥٠ د.ك"`.
///
/// Returns the first decimal or integer found after digit folding and
/// separator/unit stripping, or `None` when the text holds no number.
#[must_use]
pub fn parse_currency_amount(s: &str) -> Option<f64> {
    let folded = to_ascii_digits(s)
        .replace('\u{066B}', ".")
        .replace([',', '\u{066C}'], "");
    let stripped = CURRENCY_UNIT_RE.replace_all(&folded, " ");
    let m = AMOUNT_RE.find(&stripped)?;
    m.as_str().parse::<f64>().ok().filter(|p| p.is_finite())
}

/// True when a currency code or unit label denotes Kuwaiti dinars.
#[must_use]
pub fn is_kwd_currency(code: &str) -> bool {
    KWD_CODE_RE.is_match(code.trim())
}

/// Token-set Jaccard similarity between query and candidate name, plus
/// [`CONTAINMENT_BONUS`] when either normalized string contains the other.
#[must_use]
pub fn relevance_score(query: &str, name: &str) -> f64 {
    let a = tokenize(query);
    let b = tokenize(name);
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let jaccard = intersection as f64 / union as f64;

    let nq = normalize_text(query);
    let nn = normalize_text(name);
    let contains = !nq.is_empty() && !nn.is_empty() && (nn.contains(&nq) || nq.contains(&nn));
    if contains {
        jaccard + CONTAINMENT_BONUS
    } else {
        jaccard
    }
}

/// Display form `"<num> KWD"` using the shortest round-tripping float text.
#[must_use]
pub fn format_kwd(price: f64) -> String {
    format!("{price} KWD")
}

/// Accept only finite, strictly positive prices. Zero is a placeholder on
/// most menus and is treated as missing.
#[must_use]
pub fn valid_price(price: f64) -> Option<f64> {
    (price.is_finite() && price > 0.0).then_some(price)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
