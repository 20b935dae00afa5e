//! Keyword classification and scope screening of edit requests.
//!
//! Classification is a precedence chain over an ordered rule table: the first
//! rule with any matching keyword wins, and requests nothing matches fall back
//! to [`ModificationType::General`]. Keywords are matched as case-insensitive
//! substrings, so "rename" triggers the "name" keyword.

use aesop_core::{ModificationRequest, ModificationType};
use serde::{Deserialize, Serialize};

/// Default character-rule keywords, English and Korean.
const CHARACTER_KEYWORDS: &[&str] = &[
    "character",
    "name",
    "personality",
    "protagonist",
    "hero",
    "캐릭터",
    "인물",
    "이름",
    "성격",
];

const SETTING_KEYWORDS: &[&str] = &[
    "setting",
    "background",
    "location",
    "environment",
    "world",
    "kingdom",
    "scene",
    "배경",
    "장소",
    "환경",
    "설정",
];

const EVENTS_KEYWORDS: &[&str] = &[
    "event",
    "incident",
    "news",
    "stock",
    "plot",
    "이벤트",
    "사건",
    "뉴스",
    "주식",
];

const DIALOGUE_KEYWORDS: &[&str] = &[
    "dialogue",
    "conversation",
    "speech",
    "wording",
    "text",
    "대화",
    "대사",
    "말",
    "텍스트",
];

/// Editing verbs and scope words that mark a request as in scope even when
/// no category rule matches.
const EDIT_KEYWORDS: &[&str] = &[
    "change",
    "modify",
    "edit",
    "rename",
    "rewrite",
    "make",
    "add",
    "remove",
    "improve",
    "easier",
    "harder",
    "story",
    "game",
    "turn",
    "수정",
    "변경",
    "편집",
    "바꿔",
    "만들어",
    "추가",
    "제거",
    "개선",
    "스토리",
    "게임",
    "턴",
];

/// Topics the editor does not handle; any hit rejects the request.
const OFF_SCOPE_KEYWORDS: &[&str] = &[
    "python",
    "code",
    "programming",
    "algorithm",
    "database",
    "weather",
    "travel",
    "shopping",
    "movie",
    "music",
    "sports",
    "new game",
    "from scratch",
    "stock tip",
    "investment advice",
    "real money",
    "파이썬",
    "코드",
    "프로그래밍",
    "날씨",
    "여행",
    "쇼핑",
    "새로운 게임",
    "주식 추천",
    "투자 조언",
    "실제 투자",
];

/// Turn markers that follow the number, as in "3턴".
const POSTFIX_TURN_MARKERS: &[&str] = &["턴", "일"];

/// Turn markers that precede the number, as in "turn 3".
const PREFIX_TURN_MARKERS: &[&str] = &["turn", "day"];

/// One ordered classification rule.
///
/// Keywords must be lowercase; matching folds the request to lowercase first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRule {
    /// Category assigned when any keyword matches
    pub category: ModificationType,
    /// Trigger keywords, matched as substrings
    pub keywords: Vec<String>,
}

impl ClassifierRule {
    /// Create a rule from a keyword slice.
    pub fn new(category: ModificationType, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Why a request was turned away before reaching the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestIssue {
    /// Fewer than three characters after trimming
    TooShort,
    /// Mentions a topic outside story editing
    OutOfScope,
    /// Long request with no recognizable editing keyword
    UnclearIntent,
}

/// Outcome of screening a request against the editing scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAssessment {
    /// Why the request was rejected, if it was
    pub issue: Option<RequestIssue>,
    /// How strongly the request reads as an edit, 0.0 to 1.0
    pub confidence: f32,
    /// Guidance for the user when the request was rejected
    pub guidance: Option<String>,
}

impl RequestAssessment {
    /// Whether the request may proceed to the pipeline.
    pub fn is_acceptable(&self) -> bool {
        self.issue.is_none()
    }
}

/// Ordered-rule keyword classifier for edit requests.
///
/// The default table evaluates character, setting, events, then dialogue;
/// precedence belongs to the earlier rule when a request matches several.
/// Classification is a pure function of the text and the rule table.
///
/// # Examples
///
/// ```
/// use aesop_core::ModificationType;
/// use aesop_narrative::Classifier;
///
/// let classifier = Classifier::default();
/// let request = classifier.classify("rename Bakery to Cafe");
/// assert_eq!(request.classified_type, ModificationType::Character);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    rules: Vec<ClassifierRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            rules: vec![
                ClassifierRule::new(ModificationType::Character, CHARACTER_KEYWORDS),
                ClassifierRule::new(ModificationType::Setting, SETTING_KEYWORDS),
                ClassifierRule::new(ModificationType::Events, EVENTS_KEYWORDS),
                ClassifierRule::new(ModificationType::Dialogue, DIALOGUE_KEYWORDS),
            ],
        }
    }
}

impl Classifier {
    /// Create a classifier from a custom rule table.
    ///
    /// Rules are evaluated in the given order.
    pub fn new(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    /// The rule table, in evaluation order.
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Classify a request and scan it for an explicit turn reference.
    pub fn classify(&self, raw_text: &str) -> ModificationRequest {
        let lowered = raw_text.to_lowercase();

        let classified_type = self
            .rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.category)
            .unwrap_or(ModificationType::General);

        ModificationRequest {
            raw_text: raw_text.to_string(),
            classified_type,
            target_turn: target_turn(&lowered),
        }
    }

    /// Screen a request for length, scope, and recognizable intent.
    ///
    /// Mirrors the category rule table: any category keyword counts toward
    /// the in-scope score, alongside the editing verbs.
    pub fn screen(&self, raw_text: &str) -> RequestAssessment {
        let trimmed = raw_text.trim();
        let lowered = trimmed.to_lowercase();
        let char_count = trimmed.chars().count();

        if char_count < 3 {
            return RequestAssessment {
                issue: Some(RequestIssue::TooShort),
                confidence: 0.0,
                guidance: Some(
                    "Say which part of the story to change and how".to_string(),
                ),
            };
        }

        if let Some(hit) = OFF_SCOPE_KEYWORDS.iter().find(|k| lowered.contains(*k)) {
            return RequestAssessment {
                issue: Some(RequestIssue::OutOfScope),
                confidence: 0.0,
                guidance: Some(format!(
                    "Only story editing requests are supported; \"{hit}\" is outside that scope"
                )),
            };
        }

        let category_hits: usize = self
            .rules
            .iter()
            .flat_map(|rule| rule.keywords.iter())
            .filter(|k| lowered.contains(k.as_str()))
            .count();
        let edit_hits = EDIT_KEYWORDS.iter().filter(|k| lowered.contains(*k)).count();
        let score = category_hits + edit_hits;

        if score == 0 && char_count > 10 {
            return RequestAssessment {
                issue: Some(RequestIssue::UnclearIntent),
                confidence: 0.0,
                guidance: Some(
                    "Describe the edit, for example \"rename the hero\" or \"make turn 3 funnier\""
                        .to_string(),
                ),
            };
        }

        RequestAssessment {
            issue: None,
            confidence: (score as f32 / 3.0).min(1.0),
            guidance: None,
        }
    }
}

/// Scan for an explicit turn reference, checking integers 1 through 10 in
/// order; the lowest referenced turn wins.
fn target_turn(lowered: &str) -> Option<u32> {
    (1..=10).find(|n| references_turn(lowered, *n))
}

fn references_turn(lowered: &str, n: u32) -> bool {
    for marker in POSTFIX_TURN_MARKERS {
        if lowered.contains(&format!("{n}{marker}")) {
            return true;
        }
    }
    for marker in PREFIX_TURN_MARKERS {
        let pattern = format!("{marker} {n}");
        let mut from = 0;
        while let Some(pos) = lowered[from..].find(&pattern) {
            let end = from + pos + pattern.len();
            // "turn 1" inside "turn 10" must not count
            let followed_by_digit = lowered[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit());
            if !followed_by_digit {
                return true;
            }
            from = end;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_takes_precedence_over_setting() {
        let classifier = Classifier::default();
        let request = classifier.classify("change the character and the background");
        assert_eq!(request.classified_type, ModificationType::Character);
    }

    #[test]
    fn unmatched_text_is_general() {
        let classifier = Classifier::default();
        let request = classifier.classify("make it funnier");
        assert_eq!(request.classified_type, ModificationType::General);
        assert!(request.target_turn.is_none());
    }

    #[test]
    fn rename_matches_the_name_keyword() {
        let classifier = Classifier::default();
        let request = classifier.classify("rename Bakery to Cafe");
        assert_eq!(request.classified_type, ModificationType::Character);
    }

    #[test]
    fn korean_postfix_turn_reference() {
        let classifier = Classifier::default();
        let request = classifier.classify("3턴 이벤트를 더 재미있게 만들어줘");
        assert_eq!(request.classified_type, ModificationType::Events);
        assert_eq!(request.target_turn, Some(3));
        assert!(request.is_narrow());
    }

    #[test]
    fn english_prefix_turn_reference() {
        let classifier = Classifier::default();
        let request = classifier.classify("make the news in turn 4 scarier");
        assert_eq!(request.target_turn, Some(4));
    }

    #[test]
    fn turn_ten_is_not_turn_one() {
        let classifier = Classifier::default();
        let request = classifier.classify("rewrite turn 10 completely");
        assert_eq!(request.target_turn, Some(10));
    }

    #[test]
    fn lowest_referenced_turn_wins() {
        let classifier = Classifier::default();
        let request = classifier.classify("apply the change from turn 5 to turn 2");
        assert_eq!(request.target_turn, Some(2));
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = Classifier::default();
        let a = classifier.classify("change the setting of turn 2");
        let b = classifier.classify("change the setting of turn 2");
        assert_eq!(a, b);
    }

    #[test]
    fn custom_rule_table_overrides_defaults() {
        let classifier = Classifier::new(vec![ClassifierRule::new(
            ModificationType::Dialogue,
            &["banter"],
        )]);
        let request = classifier.classify("add more banter");
        assert_eq!(request.classified_type, ModificationType::Dialogue);
    }

    #[test]
    fn screen_rejects_too_short() {
        let classifier = Classifier::default();
        let assessment = classifier.screen("ok");
        assert_eq!(assessment.issue, Some(RequestIssue::TooShort));
        assert!(!assessment.is_acceptable());
    }

    #[test]
    fn screen_rejects_off_scope_topics() {
        let classifier = Classifier::default();
        let assessment = classifier.screen("what is the weather today");
        assert_eq!(assessment.issue, Some(RequestIssue::OutOfScope));
        assert!(assessment.guidance.is_some());
    }

    #[test]
    fn screen_rejects_unclear_long_requests() {
        let classifier = Classifier::default();
        let assessment = classifier.screen("hmm that is quite something indeed");
        assert_eq!(assessment.issue, Some(RequestIssue::UnclearIntent));
    }

    #[test]
    fn screen_accepts_editing_requests() {
        let classifier = Classifier::default();
        let assessment = classifier.screen("rename the hero to Minsu");
        assert!(assessment.is_acceptable());
        assert!(assessment.confidence > 0.0);
    }

    #[test]
    fn screen_accepts_short_but_clear_requests() {
        let classifier = Classifier::default();
        // under the 10-char unclear threshold, so it passes even without keywords
        let assessment = classifier.screen("more fun");
        assert!(assessment.is_acceptable());
    }
}
