use std::sync::OnceLock;

use regex::Regex;
use tourbook_core::domain::preferences::Preferences;

/// What the traveller is asking the assistant to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Search,
    Recommend,
    Compare,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageAnalysis {
    pub preferences: Preferences,
    pub intent: Intent,
    /// Vocabulary entries that matched, in match order.
    pub keywords: Vec<String>,
}

/// Keyword → canonical country. Scanned in order; the first keyword contained in
/// the message wins.
const COUNTRY_VOCABULARY: &[(&str, &str)] = &[
    ("switzerland", "Switzerland"),
    ("japan", "Japan"),
    ("kenya", "Kenya"),
    ("maldives", "Maldives"),
    ("norway", "Norway"),
    ("турция", "Turkey"),
    ("turkey", "Turkey"),
    ("египет", "Egypt"),
    ("egypt", "Egypt"),
    ("испания", "Spain"),
    ("spain", "Spain"),
    ("swiss", "Switzerland"),
    ("швейцария", "Switzerland"),
    ("япония", "Japan"),
    ("кения", "Kenya"),
    ("мальдивы", "Maldives"),
    ("норвегия", "Norway"),
    ("iceland", "Iceland"),
    ("исландия", "Iceland"),
    ("peru", "Peru"),
    ("перу", "Peru"),
    ("greece", "Greece"),
    ("греция", "Greece"),
    ("new zealand", "New Zealand"),
    ("новая зеландия", "New Zealand"),
    ("morocco", "Morocco"),
    ("марокко", "Morocco"),
    ("indonesia", "Indonesia"),
    ("bali", "Indonesia"),
    ("бали", "Indonesia"),
];

/// Catalog category label → keywords. First category with any hit wins.
const CATEGORY_VOCABULARY: &[(&str, &[&str])] = &[
    ("Adventure", &["приключение", "adventure", "экстрим", "extreme"]),
    ("Cultural", &["культура", "cultural", "храм", "temple", "традиция"]),
    ("Wildlife", &["сафари", "safari", "животные", "wildlife"]),
    ("Beach & Culture", &["пляж", "beach", "отдых", "relax"]),
    ("Nature & Cruise", &["природа", "nature", "северное сияние", "northern lights", "cruise"]),
];

const COMPARE_MARKERS: &[&str] = &["compare", "сравнить"];
const RECOMMEND_MARKERS: &[&str] = &["recommend", "рекомендация"];

#[derive(Clone, Debug, Default)]
pub struct PreferenceExtractor;

impl PreferenceExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> MessageAnalysis {
        let normalized_text = normalize_text(text);
        let mut keywords = Vec::new();

        let country = COUNTRY_VOCABULARY
            .iter()
            .find(|(keyword, _)| normalized_text.contains(keyword))
            .map(|(keyword, country)| {
                keywords.push((*keyword).to_owned());
                (*country).to_owned()
            });

        let category = CATEGORY_VOCABULARY
            .iter()
            .find(|(_, terms)| terms.iter().any(|term| normalized_text.contains(term)))
            .map(|(label, _)| (*label).to_owned());

        let budget = extract_budget(&normalized_text);

        MessageAnalysis {
            preferences: Preferences { country, category, budget },
            intent: detect_intent(&normalized_text),
            keywords,
        }
    }
}

/// Maps free-form country input (from a tool call, say) onto the vocabulary;
/// unknown values pass through trimmed.
pub fn canonical_country(raw: &str) -> String {
    let normalized = normalize_text(raw);
    COUNTRY_VOCABULARY
        .iter()
        .find(|(keyword, country)| normalized == *keyword || normalized == normalize_text(country))
        .map(|(_, country)| (*country).to_owned())
        .unwrap_or_else(|| raw.trim().to_owned())
}

/// Maps a category name or keyword onto a catalog label; unknown values pass through trimmed.
pub fn canonical_category(raw: &str) -> String {
    let normalized = normalize_text(raw);
    CATEGORY_VOCABULARY
        .iter()
        .find(|(label, terms)| {
            normalize_text(label) == normalized || terms.iter().any(|term| *term == normalized)
        })
        .map(|(label, _)| (*label).to_owned())
        .unwrap_or_else(|| raw.trim().to_owned())
}

fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

fn detect_intent(normalized_text: &str) -> Intent {
    if COMPARE_MARKERS.iter().any(|marker| normalized_text.contains(marker)) {
        Intent::Compare
    } else if RECOMMEND_MARKERS.iter().any(|marker| normalized_text.contains(marker)) {
        Intent::Recommend
    } else {
        Intent::Search
    }
}

fn budget_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)\$\s*(\d[\d,]*)|(\d[\d,]*)\s*(?:тенге|₸|доллар\w*|dollars?|\$|usd)")
                .ok()
        })
        .as_ref()
}

/// Amount attached to a currency marker, either `$3000` or `3000 usd` style.
fn extract_budget(normalized_text: &str) -> Option<i64> {
    let captures = budget_pattern()?.captures(normalized_text)?;
    let digits = captures.get(1).or_else(|| captures.get(2))?.as_str().replace(',', "");
    digits.parse::<i64>().ok().filter(|amount| *amount > 0)
}
