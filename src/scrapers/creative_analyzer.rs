//! Heuristic creative text analyzer.
//!
//! Pure regex/lexicon scoring over one creative's concatenated text.
//! Score budget: base 20, length bonus up to 15 (optimal 100-300
//! chars), hook 15, benefit keywords 15, CTA 15, social proof 10,
//! emotional words 10; clamped to [0, 100]. Empty text scores zero.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::{CreativeTextAnalysis, Sentiment};
use crate::ports::CreativeTextAnalyzerPort;

pub const ANALYZER_VERSION: &str = "v1.0";

const BASE_SCORE: f64 = 20.0;
const LENGTH_BONUS_MAX: f64 = 15.0;
const HOOK_SCORE: f64 = 15.0;
const BENEFIT_SCORE: f64 = 15.0;
const CTA_SCORE: f64 = 15.0;
const SOCIAL_PROOF_SCORE: f64 = 10.0;
const EMOTIONAL_SCORE: f64 = 10.0;

const POSITIVE_LEXICON: &[&str] = &[
    "amazing", "awesome", "best", "beautiful", "great", "love", "perfect", "premium",
    "incredible", "stunning", "exclusive", "win", "happy", "free", "save", "new",
];

const NEGATIVE_LEXICON: &[&str] = &[
    "bad", "worst", "hate", "problem", "broken", "tired", "pain", "struggle", "never",
    "stop", "ugly", "fail",
];

lazy_static! {
    static ref HOOK_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"\?").unwrap(),
        Regex::new(r"(?i)\byou\b").unwrap(),
        Regex::new(r"(?i)\bimagine\b").unwrap(),
        Regex::new(r"(?i)\bdiscover\b").unwrap(),
        Regex::new(r"(?i)\bwhat if\b").unwrap(),
        Regex::new(r"(?i)\bdid you know\b").unwrap(),
    ];
    static ref BENEFIT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bresults?\b").unwrap(),
        Regex::new(r"(?i)\bsave\b").unwrap(),
        Regex::new(r"(?i)\bget\b").unwrap(),
        Regex::new(r"(?i)\bfree\b").unwrap(),
        Regex::new(r"(?i)\bimprove\b").unwrap(),
        Regex::new(r"(?i)\bboost\b").unwrap(),
        Regex::new(r"(?i)\beasy\b").unwrap(),
    ];
    static ref CTA_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bbuy now\b").unwrap(),
        Regex::new(r"(?i)\bshop now\b").unwrap(),
        Regex::new(r"(?i)\border now\b").unwrap(),
        Regex::new(r"(?i)\bget yours\b").unwrap(),
        Regex::new(r"(?i)\bgrab yours\b").unwrap(),
        Regex::new(r"(?i)\bshop_now\b").unwrap(),
        Regex::new(r"(?i)\blearn more\b").unwrap(),
        Regex::new(r"(?i)\bsign up\b").unwrap(),
    ];
    static ref SOCIAL_PROOF_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\breviews?\b").unwrap(),
        Regex::new(r"(?i)\btestimonials?\b").unwrap(),
        Regex::new(r"(?i)\brated\b").unwrap(),
        Regex::new(r"(?i)\bcustomers?\b").unwrap(),
        Regex::new(r"(?i)\btrusted\b").unwrap(),
        Regex::new(r"\b\d{1,3}(?:[.,]\d{3})+\+?\b").unwrap(),
        Regex::new(r"\b\d+k\+\b").unwrap(),
    ];
    static ref EMOTIONAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bamazing\b").unwrap(),
        Regex::new(r"(?i)\bincredible\b").unwrap(),
        Regex::new(r"(?i)\blove\b").unwrap(),
        Regex::new(r"(?i)\bstunning\b").unwrap(),
        Regex::new(r"(?i)\bunbelievable\b").unwrap(),
        Regex::new(r"(?i)\blife.?changing\b").unwrap(),
    ];
    static ref URGENCY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bnow\b").unwrap(),
        Regex::new(r"(?i)\btoday\b").unwrap(),
        Regex::new(r"(?i)\blimited\b").unwrap(),
        Regex::new(r"(?i)\bhurry\b").unwrap(),
        Regex::new(r"(?i)\blast chance\b").unwrap(),
        Regex::new(r"(?i)\bends soon\b").unwrap(),
    ];
    static ref STORY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bstory\b").unwrap(),
        Regex::new(r"(?i)\bjourney\b").unwrap(),
        Regex::new(r"(?i)\bonce\b").unwrap(),
        Regex::new(r"(?i)\bstarted\b").unwrap(),
    ];
    static ref CASUAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bhey\b").unwrap(),
        Regex::new(r"(?i)\bgonna\b").unwrap(),
        Regex::new(r"(?i)\bwanna\b").unwrap(),
        Regex::new(r"(?i)\bbtw\b").unwrap(),
    ];
    static ref PROFESSIONAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bpremium\b").unwrap(),
        Regex::new(r"(?i)\bquality\b").unwrap(),
        Regex::new(r"(?i)\bprofessional\b").unwrap(),
        Regex::new(r"(?i)\bcertified\b").unwrap(),
    ];
    static ref PLAYFUL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bfun\b").unwrap(),
        Regex::new(r"(?i)\bplay\b").unwrap(),
        Regex::new(r"(?i)\boops\b").unwrap(),
    ];
    static ref EMOJI_PATTERN: Regex = Regex::new(
        "[\u{1F300}-\u{1F9FF}\u{1FA00}-\u{1FAFF}\u{2702}-\u{27B0}\u{1F600}-\u{1F64F}]"
    )
    .unwrap();
}

pub struct CreativeTextAnalyzer;

impl CreativeTextAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CreativeTextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CreativeTextAnalyzerPort for CreativeTextAnalyzer {
    fn analyze_text(&self, text: &str) -> CreativeTextAnalysis {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CreativeTextAnalysis {
                creative_score: 0.0,
                style_tags: Vec::new(),
                angle_tags: Vec::new(),
                tone_tags: Vec::new(),
                sentiment: Sentiment::Neutral,
            };
        }

        let has_hook = any_match(&HOOK_PATTERNS, trimmed);
        let has_benefit = any_match(&BENEFIT_PATTERNS, trimmed);
        let has_cta = any_match(&CTA_PATTERNS, trimmed);
        let has_social_proof = any_match(&SOCIAL_PROOF_PATTERNS, trimmed);
        let has_emotional = any_match(&EMOTIONAL_PATTERNS, trimmed);

        let mut score = BASE_SCORE + length_bonus(trimmed.chars().count());
        if has_hook {
            score += HOOK_SCORE;
        }
        if has_benefit {
            score += BENEFIT_SCORE;
        }
        if has_cta {
            score += CTA_SCORE;
        }
        if has_social_proof {
            score += SOCIAL_PROOF_SCORE;
        }
        if has_emotional {
            score += EMOTIONAL_SCORE;
        }

        CreativeTextAnalysis {
            creative_score: score.clamp(0.0, 100.0),
            style_tags: style_tags(trimmed),
            angle_tags: angle_tags(trimmed, has_benefit, has_cta, has_social_proof),
            tone_tags: tone_tags(trimmed, has_emotional),
            sentiment: sentiment(trimmed),
        }
    }

    fn version(&self) -> &str {
        ANALYZER_VERSION
    }
}

/// Monotone ramp to the 100-300 char peak, then a slow decay floored
/// at 5 points for walls of text.
fn length_bonus(chars: usize) -> f64 {
    let len = chars as f64;
    if len < 100.0 {
        LENGTH_BONUS_MAX * len / 100.0
    } else if len <= 300.0 {
        LENGTH_BONUS_MAX
    } else {
        (LENGTH_BONUS_MAX - (len - 300.0) / 30.0).max(5.0)
    }
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

fn style_tags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let chars = text.chars().count();
    if chars < 50 {
        tags.push("minimalist".to_string());
    }
    if text.contains('!') || EMOJI_PATTERN.is_match(text) {
        tags.push("bold".to_string());
    }
    if chars > 200 || any_match(&STORY_PATTERNS, text) {
        tags.push("storytelling".to_string());
    }
    if any_match(&CTA_PATTERNS, text) {
        tags.push("direct".to_string());
    }
    tags
}

fn angle_tags(text: &str, has_benefit: bool, has_cta: bool, has_social_proof: bool) -> Vec<String> {
    let mut tags = Vec::new();
    if any_match(&URGENCY_PATTERNS, text) {
        tags.push("urgency".to_string());
    }
    if has_social_proof {
        tags.push("social-proof".to_string());
    }
    if has_benefit {
        tags.push("benefit-driven".to_string());
    }
    if has_cta {
        tags.push("cta-driven".to_string());
    }
    tags
}

fn tone_tags(text: &str, has_emotional: bool) -> Vec<String> {
    let mut tags = Vec::new();
    if any_match(&CASUAL_PATTERNS, text) {
        tags.push("casual".to_string());
    }
    if any_match(&PROFESSIONAL_PATTERNS, text) {
        tags.push("professional".to_string());
    }
    if has_emotional {
        tags.push("emotional".to_string());
    }
    if any_match(&PLAYFUL_PATTERNS, text) || EMOJI_PATTERN.is_match(text) {
        tags.push("playful".to_string());
    }
    tags
}

/// Sign of positive minus negative lexicon hits; zero is neutral.
fn sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_LEXICON
        .iter()
        .filter(|word| lower.contains(*word))
        .count() as i32;
    let negative = NEGATIVE_LEXICON
        .iter()
        .filter(|word| lower.contains(*word))
        .count() as i32;

    match (positive - negative).signum() {
        1 => Sentiment::Positive,
        -1 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}
