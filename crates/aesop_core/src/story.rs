//! The story document model.
//!
//! A story is an ordered sequence of turns; each turn carries narrative text,
//! a news item, and the stock entries the turn affects. Field names follow
//! the on-disk JSON shape the generation model is asked to produce.

use serde::{Deserialize, Serialize};

/// A named in-story entity with a value and risk descriptor.
///
/// # Examples
///
/// ```
/// use aesop_core::Stock;
///
/// let stock = Stock {
///     name: "Bakery".to_string(),
///     risk_level: "low".to_string(),
///     description: "A neighborhood bakery".to_string(),
///     before_value: 100.0,
///     current_value: 105.0,
///     expectation: "stable".to_string(),
/// };
///
/// assert_eq!(stock.name, "Bakery");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// Display name, non-empty
    pub name: String,
    /// Risk descriptor, e.g. "low" / "medium" / "high"
    pub risk_level: String,
    /// Short description of the entity
    #[serde(default)]
    pub description: String,
    /// Value before this turn's events
    #[serde(default)]
    pub before_value: f64,
    /// Value after this turn's events
    pub current_value: f64,
    /// Outlook text for the next turn
    #[serde(default)]
    pub expectation: String,
}

/// One ordered step of a story document.
///
/// Serialized with the field name `turn` for the turn number, matching the
/// shape generation models are prompted to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based position in game order
    #[serde(rename = "turn")]
    pub turn_number: u32,
    /// Narrative text for this turn, non-empty
    pub result: String,
    /// News item associated with this turn
    pub news: String,
    /// Which stocks the news applies to
    #[serde(default)]
    pub news_tag: String,
    /// Stock entries for this turn; non-empty by content policy
    pub stocks: Vec<Stock>,
}

/// Error produced when constructing a [`StoryDocument`] from no turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("A story document must contain at least one turn")]
pub struct EmptyDocument;

/// An ordered, non-empty sequence of [`Turn`]s.
///
/// Sequence order is game order. The non-empty invariant is enforced at
/// construction and on deserialization.
///
/// # Examples
///
/// ```
/// use aesop_core::{Stock, StoryDocument, Turn};
///
/// let turn = Turn {
///     turn_number: 1,
///     result: "A bakery opens".to_string(),
///     news: "Prices rise".to_string(),
///     news_tag: "all".to_string(),
///     stocks: vec![Stock {
///         name: "Bakery".to_string(),
///         risk_level: "low".to_string(),
///         description: String::new(),
///         before_value: 100.0,
///         current_value: 105.0,
///         expectation: "stable".to_string(),
///     }],
/// };
///
/// let document = StoryDocument::try_from(vec![turn]).unwrap();
/// assert_eq!(document.turns().len(), 1);
/// assert!(StoryDocument::try_from(Vec::new()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Turn>")]
pub struct StoryDocument(Vec<Turn>);

impl StoryDocument {
    /// The turns, in game order.
    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    /// Look up a turn by its 1-based turn number.
    pub fn turn(&self, turn_number: u32) -> Option<&Turn> {
        self.0.iter().find(|t| t.turn_number == turn_number)
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for iterator-adjacent call sites.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Consume the document, yielding the turns.
    pub fn into_turns(self) -> Vec<Turn> {
        self.0
    }
}

impl TryFrom<Vec<Turn>> for StoryDocument {
    type Error = EmptyDocument;

    fn try_from(turns: Vec<Turn>) -> Result<Self, Self::Error> {
        if turns.is_empty() {
            Err(EmptyDocument)
        } else {
            Ok(Self(turns))
        }
    }
}

impl Serialize for StoryDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a StoryDocument {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
