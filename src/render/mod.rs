pub mod markdown;
pub mod report;

use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::Buy => "Buy",
            Recommendation::Sell => "Sell",
            Recommendation::Hold => "Hold",
        }
    }

    pub fn badge_class(self) -> &'static str {
        match self {
            Recommendation::Buy => "badge-buy",
            Recommendation::Sell => "badge-sell",
            Recommendation::Hold => "badge-hold",
        }
    }
}

const BUY_KEYWORDS: [&str; 3] = ["buy", "strong", "positive"];
const SELL_KEYWORDS: [&str; 3] = ["sell", "negative", "avoid"];

const COMPANY_VOCABULARY: [&str; 9] = [
    "amazon",
    "apple",
    "google",
    "microsoft",
    "tesla",
    "meta",
    "nvidia",
    "netflix",
    "facebook",
];

const TICKER_MAPPING: [(&str, &str); 43] = [
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("tesla", "TSLA"),
    ("meta", "META"),
    ("facebook", "META"),
    ("nvidia", "NVDA"),
    ("netflix", "NFLX"),
    ("amd", "AMD"),
    ("intel", "INTC"),
    ("coinbase", "COIN"),
    ("uber", "UBER"),
    ("airbnb", "ABNB"),
    ("palantir", "PLTR"),
    ("snowflake", "SNOW"),
    ("salesforce", "CRM"),
    ("adobe", "ADBE"),
    ("oracle", "ORCL"),
    ("ibm", "IBM"),
    ("disney", "DIS"),
    ("nike", "NKE"),
    ("starbucks", "SBUX"),
    ("mcdonalds", "MCD"),
    ("cocacola", "KO"),
    ("pepsi", "PEP"),
    ("walmart", "WMT"),
    ("target", "TGT"),
    ("costco", "COST"),
    ("homedepot", "HD"),
    ("lowes", "LOW"),
    ("bank of america", "BAC"),
    ("jpmorgan", "JPM"),
    ("goldman sachs", "GS"),
    ("morgan stanley", "MS"),
    ("wells fargo", "WFC"),
    ("citigroup", "C"),
    ("visa", "V"),
    ("mastercard", "MA"),
    ("paypal", "PYPL"),
    ("block", "SQ"),
    ("square", "SQ"),
];

fn buy_matcher() -> &'static AhoCorasick {
    static MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
    MATCHER.get_or_init(|| {
        AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(BUY_KEYWORDS)
            .expect("static keyword set must build")
    })
}

fn sell_matcher() -> &'static AhoCorasick {
    static MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
    MATCHER.get_or_init(|| {
        AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(SELL_KEYWORDS)
            .expect("static keyword set must build")
    })
}

/// Keyword classification of the summary. The buy set is checked before the
/// sell set, so a summary mentioning both classifies as Buy.
pub fn recommendation(short_summary: &str) -> Recommendation {
    if buy_matcher().is_match(short_summary) {
        Recommendation::Buy
    } else if sell_matcher().is_match(short_summary) {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

/// Best-effort company label from a small fixed vocabulary; first match wins.
pub fn company_name(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    COMPANY_VOCABULARY.iter().find_map(|company| {
        if lowered.contains(company) {
            let mut chars = company.chars();
            let first = chars.next()?;
            Some(first.to_uppercase().chain(chars).collect())
        } else {
            None
        }
    })
}

/// Resolves a ticker symbol from a query: known company names first, then an
/// explicit `$TSLA` form. Used only for chart labeling, never authoritative.
pub fn ticker_for(query: &str) -> Option<String> {
    let lowered = query.to_lowercase();
    for (name, ticker) in TICKER_MAPPING {
        if lowered.contains(name) {
            return Some(ticker.to_string());
        }
    }
    query
        .split_whitespace()
        .find_map(|word| word.strip_prefix('$'))
        .filter(|symbol| !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_set_checked_before_sell_set() {
        assert_eq!(
            recommendation("We recommend a strong buy despite some negative risk"),
            Recommendation::Buy
        );
    }

    #[test]
    fn test_sell_classification() {
        assert_eq!(
            recommendation("Investors should avoid this stock"),
            Recommendation::Sell
        );
    }

    #[test]
    fn test_hold_is_the_fallback() {
        assert_eq!(
            recommendation("The outlook is mixed and uncertain"),
            Recommendation::Hold
        );
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(recommendation("STRONG results"), Recommendation::Buy);
    }

    #[test]
    fn test_company_heuristic_capitalizes_first_match() {
        assert_eq!(
            company_name("is amazon a good investment?"),
            Some("Amazon".to_string())
        );
        assert_eq!(company_name("thoughts on berkshire?"), None);
    }

    #[test]
    fn test_ticker_mapping_and_dollar_form() {
        assert_eq!(ticker_for("Is Amazon a good investment?").as_deref(), Some("AMZN"));
        assert_eq!(ticker_for("what about $tsla this year").as_deref(), Some("TSLA"));
        assert_eq!(ticker_for("tell me about bonds"), None);
    }

    #[test]
    fn test_ticker_mapping_covers_multi_word_names() {
        assert_eq!(ticker_for("outlook for Bank of America").as_deref(), Some("BAC"));
        assert_eq!(ticker_for("goldman sachs earnings").as_deref(), Some("GS"));
        assert_eq!(ticker_for("is snowflake overvalued?").as_deref(), Some("SNOW"));
    }
}
