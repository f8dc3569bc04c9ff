//! Pattern and similarity based extraction of booking fields
//!
//! Each utterance (caller speech or generated reply) is scanned
//! independently per field. The extractor never fails: no match simply
//! means no update. Relative dates ("today", "tomorrow") only count when
//! the caller says them; replies can only echo an explicit date.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::catalog::{
    canonical_vehicle, BODY_TYPES, GENERIC_VEHICLE, GOODS_KEYWORDS, VEHICLE_CATALOG,
};
use super::record::{BookingField, BookingRecord, FieldUpdate, UpdateSource};
use super::similarity::{PartialRatio, Ratio, Scorer};

/// "from A to B"
static FREE_FORM_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bfrom\s+([a-z][a-z '-]*?)\s+to\s+([a-z][a-z '-]*?)\s*(?:[,;.!?]|\s+(?:on|for|by|with|and|tomorrow|today|day|next|please|at|via)\b|$)",
    )
    .expect("route pattern")
});

/// "pickup (in) A, drop (in) B"
static CONFIRMED_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bpick\s*-?\s*up\s+(?:(?:in|from|at)\s+)?([a-z][a-z '-]*?)\s*[,;]?\s*\bdrop(?:\s*-?\s*off)?\s+(?:(?:in|to|at)\s+)?([a-z][a-z '-]*?)\s*(?:[,;.!?]|\s+(?:truck|vehicle|body|material|goods|date|on|for|required)\b|$)",
    )
    .expect("confirmed route pattern")
});

/// "truck type X"
static TRUCK_TYPE_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\btruck\s+type\s+(?:is\s+)?([a-z0-9][a-z0-9 '-]*?)\s*(?:[,;.!?]|\s+(?:body|material|goods|date|on|for|required)\b|$)",
    )
    .expect("truck type pattern")
});

/// Words that end a place name captured from free speech
const PLACE_BREAKS: &[&str] = &[
    "i", "we", "you", "he", "she", "they", "it", "my", "our", "me", "us", "need", "needs",
    "want", "wants", "would", "will", "can", "could", "should", "have", "has", "is", "are",
    "am", "was", "be", "in", "a", "an", "the", "this", "that", "on", "for", "by", "with",
    "and", "or", "but", "so", "at", "via", "please", "tomorrow", "today", "day", "next", "now",
    "truck", "trucks", "vehicle", "body", "material", "goods", "date", "required", "around",
    "about", "of", "using", "load", "loads",
];

const MAX_PLACE_WORDS: usize = 3;

/// Lowercase words that belong to the vehicle, body or goods vocabularies
static CATALOG_WORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut words: Vec<&'static str> = VEHICLE_CATALOG
        .iter()
        .chain(GOODS_KEYWORDS)
        .chain(BODY_TYPES)
        .flat_map(|(key, _)| key.split_whitespace())
        .collect();
    words.sort_unstable();
    words.dedup();
    words
});

static FEET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*(?:feet|foot|ft)\b").expect("feet pattern"));

static TRUCK_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btruck\b").expect("truck pattern"));

static GOODS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    GOODS_KEYWORDS
        .iter()
        .map(|(keyword, label)| {
            let pattern = format!(r"\b{}\b", regex::escape(keyword));
            (Regex::new(&pattern).expect("goods pattern"), *label)
        })
        .collect()
});

static DAY_AFTER_TOMORROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:day\s+after\s+tomorrow|overmorrow)\b").expect("date pattern")
});
static TOMORROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btomorrow\b").expect("date pattern"));
static TODAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:today|now)\b").expect("date pattern"));
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("iso date pattern"));

/// Who produced the utterance being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Caller,
    Assistant,
}

/// Per-call values the extractor needs from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionContext {
    /// Calendar date relative words resolve against
    pub today: NaiveDate,
}

impl ExtractionContext {
    /// Context pinned to the local wall clock
    pub fn now() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn on(today: NaiveDate) -> Self {
        Self { today }
    }
}

/// Turns free-form utterances into [`FieldUpdate`]s
pub struct FieldExtractor {
    window_scorer: Box<dyn Scorer>,
    phrase_scorer: Box<dyn Scorer>,
    window_threshold: u8,
    phrase_threshold: u8,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(Box::new(PartialRatio), Box::new(Ratio))
    }
}

impl FieldExtractor {
    pub const WINDOW_THRESHOLD: u8 = 85;
    pub const PHRASE_THRESHOLD: u8 = 65;
    const MAX_SPAN_WORDS: usize = 4;

    pub fn new(window_scorer: Box<dyn Scorer>, phrase_scorer: Box<dyn Scorer>) -> Self {
        Self {
            window_scorer,
            phrase_scorer,
            window_threshold: Self::WINDOW_THRESHOLD,
            phrase_threshold: Self::PHRASE_THRESHOLD,
        }
    }

    /// Proposed updates for a caller utterance, in the order they should be applied
    pub fn extract(
        &self,
        record: &BookingRecord,
        text: &str,
        ctx: &ExtractionContext,
    ) -> Vec<FieldUpdate> {
        self.extract_from(record, text, Speaker::Caller, ctx)
    }

    pub fn extract_from(
        &self,
        record: &BookingRecord,
        text: &str,
        speaker: Speaker,
        ctx: &ExtractionContext,
    ) -> Vec<FieldUpdate> {
        let lower = text.to_lowercase();
        let mut updates = Vec::new();

        self.extract_locations(&lower, &mut updates);
        if !record.is_set(BookingField::VehicleType) {
            updates.extend(self.extract_vehicle(&lower));
        }
        updates.extend(extract_body_type(&lower));
        updates.extend(extract_goods(&lower));
        updates.extend(extract_trip_date(&lower, speaker, ctx));

        updates
    }

    /// Apply everything a caller utterance yields; returns the updates that changed `record`
    pub fn apply(
        &self,
        record: &mut BookingRecord,
        text: &str,
        ctx: &ExtractionContext,
    ) -> Vec<FieldUpdate> {
        self.apply_from(record, text, Speaker::Caller, ctx)
    }

    pub fn apply_from(
        &self,
        record: &mut BookingRecord,
        text: &str,
        speaker: Speaker,
        ctx: &ExtractionContext,
    ) -> Vec<FieldUpdate> {
        self.extract_from(record, text, speaker, ctx)
            .into_iter()
            .filter(|update| record.apply(update))
            .collect()
    }

    fn extract_locations(&self, lower: &str, updates: &mut Vec<FieldUpdate>) {
        if let Some(caps) = FREE_FORM_ROUTE.captures(lower) {
            for (group, field) in [(1, BookingField::PickupLocation), (2, BookingField::DropLocation)] {
                if let Some(place) = caps.get(group).and_then(|m| clean_place(m.as_str())) {
                    updates.push(FieldUpdate::new(field, place, UpdateSource::Refinement));
                }
            }
        }

        if let Some(caps) = CONFIRMED_ROUTE.captures(lower) {
            for (group, field) in [(1, BookingField::PickupLocation), (2, BookingField::DropLocation)] {
                if let Some(place) = caps.get(group).and_then(|m| clean_place(m.as_str())) {
                    updates.push(FieldUpdate::new(field, place, UpdateSource::Confirmation));
                }
            }
        }
    }

    fn extract_vehicle(&self, lower: &str) -> Option<FieldUpdate> {
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if let Some(label) = self.best_window_match(&words) {
            return Some(FieldUpdate::new(BookingField::VehicleType, label, UpdateSource::FirstMention));
        }

        if let Some(phrase) = TRUCK_TYPE_PHRASE
            .captures(lower)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
        {
            if let Some(label) = self.best_phrase_match(&phrase) {
                return Some(FieldUpdate::new(
                    BookingField::VehicleType,
                    label,
                    UpdateSource::FirstMention,
                ));
            }
        }

        if let Some(feet) = FEET.captures(lower).and_then(|caps| caps.get(1)) {
            return Some(FieldUpdate::new(
                BookingField::VehicleType,
                format!("{} Feet", feet.as_str()),
                UpdateSource::FirstMention,
            ));
        }

        if TRUCK_WORD.is_match(lower) {
            return Some(FieldUpdate::new(
                BookingField::VehicleType,
                GENERIC_VEHICLE,
                UpdateSource::FirstMention,
            ));
        }

        None
    }

    /// Slide 1..=4 word spans over the utterance and keep the best catalog hit
    fn best_window_match(&self, words: &[&str]) -> Option<&'static str> {
        let mut best: Option<(u8, usize, &'static str)> = None;

        for start in 0..words.len() {
            for len in 1..=Self::MAX_SPAN_WORDS {
                if start + len > words.len() {
                    break;
                }
                let span = words[start..start + len].join(" ");
                let span_chars = span.chars().count();
                if span_chars < 3 {
                    continue;
                }

                for (key, label) in VEHICLE_CATALOG {
                    if !comparable_length(span_chars, key.chars().count()) {
                        continue;
                    }
                    let score = self.window_scorer.score(key, &span);
                    if score < self.window_threshold {
                        continue;
                    }
                    let candidate = (score, key.len(), *label);
                    if best.map_or(true, |(s, k, _)| (score, key.len()) > (s, k)) {
                        best = Some(candidate);
                    }
                }
            }
        }

        best.map(|(_, _, label)| label)
    }

    /// Whole-phrase comparison for an explicit "truck type ..." echo
    fn best_phrase_match(&self, phrase: &str) -> Option<&'static str> {
        VEHICLE_CATALOG
            .iter()
            .map(|(key, _)| (self.phrase_scorer.score(key, phrase), *key))
            .filter(|(score, _)| *score >= self.phrase_threshold)
            .max_by_key(|(score, key)| (*score, key.len()))
            .and_then(|(_, key)| canonical_vehicle(key))
    }
}

/// Span and key lengths close enough for a partial score to mean anything
fn comparable_length(span: usize, key: usize) -> bool {
    span.abs_diff(key) <= (key / 4).max(2)
}

/// Place name at the start of a captured route segment, at most three words
///
/// Stops at the first pronoun, verb, filler or catalog word, so
/// "bangalore i need an open truck" yields "Bangalore".
fn clean_place(raw: &str) -> Option<String> {
    let words: Vec<&str> = strip_leading_preposition(raw)
        .split_whitespace()
        .take_while(|word| {
            let word = word.trim_matches(|c: char| c == '\'' || c == '-');
            !PLACE_BREAKS.contains(&word) && CATALOG_WORDS.binary_search(&word).is_err()
        })
        .take(MAX_PLACE_WORDS)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(title_case(&words.join(" ")))
    }
}

/// Body types are checked in catalog order, so "open" wins over "container"
fn extract_body_type(lower: &str) -> Option<FieldUpdate> {
    BODY_TYPES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, label)| FieldUpdate::new(BookingField::BodyType, *label, UpdateSource::FirstMention))
}

fn extract_goods(lower: &str) -> Option<FieldUpdate> {
    GOODS
        .iter()
        .find(|(pattern, _)| pattern.is_match(lower))
        .map(|(_, label)| FieldUpdate::new(BookingField::GoodsType, *label, UpdateSource::FirstMention))
}

fn extract_trip_date(lower: &str, speaker: Speaker, ctx: &ExtractionContext) -> Option<FieldUpdate> {
    let offset = if speaker == Speaker::Assistant {
        None
    } else if DAY_AFTER_TOMORROW.is_match(lower) {
        Some(2)
    } else if TOMORROW.is_match(lower) {
        Some(1)
    } else if TODAY.is_match(lower) {
        Some(0)
    } else {
        None
    };

    let date = match offset {
        Some(days) => ctx.today.checked_add_days(Days::new(days)),
        None => ISO_DATE
            .captures(lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()),
    }?;

    Some(FieldUpdate::new(
        BookingField::TripDate,
        date.format("%Y-%m-%d").to_string(),
        UpdateSource::FirstMention,
    ))
}

fn strip_leading_preposition(place: &str) -> &str {
    let place = place.trim();
    for prefix in ["in ", "from ", "at ", "to "] {
        if let Some(rest) = place.strip_prefix(prefix) {
            return rest.trim_start();
        }
    }
    place
}

/// "navi mumbai" -> "Navi Mumbai"
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
