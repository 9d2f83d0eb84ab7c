//! Rewrites natural-language arithmetic ("15% of 320", "square root of 16", "320の15%")
//! into an expression the evaluator accepts.

use std::sync::LazyLock;

use regex::Regex;

const NUM: &str = r"(\d+(?:\.\d+)?)";

struct Rewrite {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rewrite {
    Rewrite {
        pattern: Regex::new(&pattern.replace("{N}", NUM)).unwrap(),
        replacement,
    }
}

static REWRITES: LazyLock<Vec<Rewrite>> = LazyLock::new(|| {
    vec![
        rule(r"(\d),(\d{3})\b", "$1$2"),
        rule(r"{N}\s*(?:%|percent)\s+of\s+{N}", "($1/100*$2)"),
        rule(r"{N}\s*の\s*{N}\s*(?:%|パーセント)", "($2/100*$1)"),
        rule(r"(?:the\s+)?square\s+root\s+of\s+{N}", "sqrt($1)"),
        rule(r"{N}\s*の\s*平方根", "sqrt($1)"),
        rule(r"√\s*{N}", "sqrt($1)"),
        rule(r"√\s*\(", "sqrt("),
        rule(r"{N}\s+(?:to\s+the\s+power\s+of|raised\s+to(?:\s+the\s+power\s+of)?)\s+{N}", "$1^$2"),
        rule(r"{N}\s*の\s*{N}\s*乗", "$1^$2"),
        rule(r"{N}\s+squared\b", "$1^2"),
        rule(r"{N}\s+cubed\b", "$1^3"),
        rule(r"\bsum\s+of\s+{N}\s+and\s+{N}", "($1+$2)"),
        rule(r"\bproduct\s+of\s+{N}\s+and\s+{N}", "($1*$2)"),
        rule(r"{N}\s*percent\b", "$1%"),
        rule(r"\bplus\b", "+"),
        rule(r"\bminus\b", "-"),
        rule(r"\bmultiplied\s+by\b|\btimes\b", "*"),
        rule(r"\bdivided\s+by\b", "/"),
        rule(r"×", "*"),
        rule(r"÷", "/"),
    ]
});

static CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\d+(?:\.\d+)?e[+-]?\d+|\b(?:sqrt|abs|ln|log10|log2|log|exp|sin|cos|tan|asin|acos|atan|floor|ceil|round|pi)\b|[\d.+\-*/^%()\s])+",
    )
    .unwrap()
});

static OPERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[+\-*/^%]|\b(?:sqrt|abs|ln|log10|log2|log|exp|sin|cos|tan|asin|acos|atan|floor|ceil|round)\b")
        .unwrap()
});

/// Map full-width ASCII variants (`０`-`９`, `％`, `＋`, ...) and the ideographic space to ASCII.
#[must_use]
pub fn fold_full_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(u32::from(c) - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            other => other,
        })
        .collect()
}

/// Extract an arithmetic expression from a natural-language query.
///
/// Returns `None` when the query has no span that contains both a number and an operation.
#[must_use]
pub fn normalize_query(query: &str) -> Option<String> {
    let mut text = fold_full_width(query).to_lowercase();
    for rewrite in REWRITES.iter() {
        text = rewrite
            .pattern
            .replace_all(&text, rewrite.replacement)
            .into_owned();
    }

    let candidate = CANDIDATE
        .find_iter(&text)
        .map(|m| trim_expression(m.as_str()))
        .filter(|s| s.chars().any(|c| c.is_ascii_digit()) && OPERATION.is_match(s))
        .max_by_key(|s| s.chars().count())?;

    tracing::debug!(query, expression = candidate, "normalized query");
    Some(candidate.to_owned())
}

/// Strip whitespace and dangling binary operators or sentence dots from the ends of a span.
fn trim_expression(span: &str) -> &str {
    let mut s = span.trim_end_matches(|c: char| {
        matches!(c, '+' | '-' | '*' | '/' | '^' | '.') || c.is_whitespace()
    });
    loop {
        let trimmed = s.trim_start_matches(|c: char| matches!(c, '*' | '/' | '^' | '%') || c.is_whitespace());
        // A leading dot is a decimal point only when a digit follows.
        match trimmed.strip_prefix('.') {
            Some(rest) if !rest.starts_with(|c: char| c.is_ascii_digit()) => s = rest,
            _ => return trimmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(q: &str) -> String {
        normalize_query(q).unwrap()
    }

    #[test]
    fn percent_of() {
        assert_eq!(norm("what is 15% of 320?"), "(15/100*320)");
        assert_eq!(norm("What is 15 percent of 320"), "(15/100*320)");
    }

    #[test]
    fn japanese_percent() {
        assert_eq!(norm("320の15%は？"), "(15/100*320)");
        assert_eq!(norm("３２０の１５％は？"), "(15/100*320)");
    }

    #[test]
    fn square_root() {
        assert_eq!(norm("what is the square root of 16?"), "sqrt(16)");
        assert_eq!(norm("√25"), "sqrt(25)");
        assert_eq!(norm("16の平方根"), "sqrt(16)");
        assert_eq!(norm("sqrt(2) * 3"), "sqrt(2) * 3");
    }

    #[test]
    fn powers() {
        assert_eq!(norm("2 to the power of 3"), "2^3");
        assert_eq!(norm("2の3乗"), "2^3");
        assert_eq!(norm("what is 7 squared"), "7^2");
        assert_eq!(norm("3 cubed please"), "3^3");
    }

    #[test]
    fn word_operators() {
        assert_eq!(norm("what is 6 times 7"), "6 * 7");
        assert_eq!(norm("10 divided by 4"), "10 / 4");
        assert_eq!(norm("12 plus 30"), "12 + 30");
        assert_eq!(norm("50 minus 8"), "50 - 8");
        assert_eq!(norm("6 multiplied by 7"), "6 * 7");
        assert_eq!(norm("sum of 2 and 3"), "(2+3)");
        assert_eq!(norm("product of 4 and 5"), "(4*5)");
    }

    #[test]
    fn glyph_operators() {
        assert_eq!(norm("6 × 7"), "6 * 7");
        assert_eq!(norm("84 ÷ 2"), "84 / 2");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(norm("1,200 + 800"), "1200 + 800");
    }

    #[test]
    fn trailing_punctuation_removed() {
        assert_eq!(norm("calculate 2 + 3."), "2 + 3");
        assert_eq!(norm("is it 2+2?"), "2+2");
    }

    #[test]
    fn longest_span_wins() {
        assert_eq!(norm("step 1: compute (3 + 4) * 2"), "(3 + 4) * 2");
    }

    #[test]
    fn no_expression() {
        assert!(normalize_query("calculate the area of a circle with radius 5").is_none());
        assert!(normalize_query("hello there").is_none());
        assert!(normalize_query("").is_none());
    }

    #[test]
    fn fold_full_width_maps_ascii_range() {
        assert_eq!(fold_full_width("１＋２　＝"), "1+2 =");
    }
}
