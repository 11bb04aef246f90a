//! Event mentions and the per-document mention index.
//!
//! A document hands this crate a finalized, ordered list of [`EventMention`]s.
//! [`MentionIndex::build`] derives one [`MentionRow`] per mention and exposes
//! two views: the full ordered row sequence and the in-scope subset used for
//! candidate pair generation. Epistemic and reported events stay out of scope;
//! they still appear in the final partition as singletons.
//!
//! # Example
//!
//! ```rust
//! use evoref::{EventMention, EventModality, MentionIndex};
//!
//! let mentions = vec![
//!     EventMention::new(10, "attacked", 5, 13, 0),
//!     EventMention::new(11, "said", 20, 24, 1).with_modality(EventModality::Reported),
//!     EventMention::new(12, "assault", 40, 47, 2),
//! ];
//!
//! let index = MentionIndex::build(&mentions).unwrap();
//! assert_eq!(index.len(), 3);
//! assert_eq!(index.count_in_scope(), 2);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unique identifier of an event mention, assigned upstream.
pub type MentionId = u64;

/// Modality of an event mention.
///
/// Only asserted events count as in-scope domain events; epistemic and
/// reported-speech events are excluded from candidate pair generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventModality {
    /// The event is asserted to have happened (default).
    #[default]
    Asserted,
    /// The event is hypothetical, modal, or otherwise uncertain.
    Epistemic,
    /// The event appears inside reported speech.
    Reported,
}

/// A span of text identified as referring to an event occurrence.
///
/// Owned by the document and read-only to this crate. The `order` field is
/// the document order index assigned at mention-detection time; it must be
/// unique per document and strictly increase with document position.
///
/// # Example
///
/// ```rust
/// use evoref::EventMention;
///
/// let mention = EventMention::new(3, "invaded", 7, 14, 0)
///     .with_sentence(0)
///     .with_head_word("invade")
///     .with_event_type("attack");
///
/// assert_eq!(mention.trigger, "invaded");
/// assert!(mention.is_in_scope());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMention {
    /// Unique mention id.
    pub id: MentionId,
    /// The trigger word/phrase (e.g., "invaded", "explosion").
    pub trigger: String,
    /// Start character offset of the trigger.
    pub start: usize,
    /// End character offset of the trigger (exclusive).
    pub end: usize,
    /// Document order index, assigned upstream and never reassigned.
    pub order: u64,
    /// Index of the sentence containing the mention.
    #[serde(default)]
    pub sentence: usize,
    /// Whether the mention sits in the document title.
    #[serde(default)]
    pub in_title: bool,
    /// Modality marker separating asserted events from epistemic/reported ones.
    #[serde(default)]
    pub modality: EventModality,
    /// Syntactic head word of the trigger, when upstream annotation found one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_word: Option<String>,
    /// Lemma of the head word.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_lemma: Option<String>,
    /// Event type label (e.g., "attack", "movement").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl EventMention {
    /// Create a new event mention.
    #[must_use]
    pub fn new(id: MentionId, trigger: impl Into<String>, start: usize, end: usize, order: u64) -> Self {
        Self {
            id,
            trigger: trigger.into(),
            start,
            end,
            order,
            sentence: 0,
            in_title: false,
            modality: EventModality::default(),
            head_word: None,
            head_lemma: None,
            event_type: None,
        }
    }

    /// Set the sentence index.
    #[must_use]
    pub fn with_sentence(mut self, sentence: usize) -> Self {
        self.sentence = sentence;
        self
    }

    /// Mark the mention as sitting in the document title.
    #[must_use]
    pub fn with_in_title(mut self, in_title: bool) -> Self {
        self.in_title = in_title;
        self
    }

    /// Set the modality.
    #[must_use]
    pub fn with_modality(mut self, modality: EventModality) -> Self {
        self.modality = modality;
        self
    }

    /// Set the head word.
    #[must_use]
    pub fn with_head_word(mut self, head_word: impl Into<String>) -> Self {
        self.head_word = Some(head_word.into());
        self
    }

    /// Set the head lemma.
    #[must_use]
    pub fn with_head_lemma(mut self, head_lemma: impl Into<String>) -> Self {
        self.head_lemma = Some(head_lemma.into());
        self
    }

    /// Set the event type label.
    #[must_use]
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Character span of the trigger.
    #[must_use]
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Whether the mention counts as an in-scope domain event.
    #[must_use]
    pub fn is_in_scope(&self) -> bool {
        matches!(self.modality, EventModality::Asserted)
    }
}

impl fmt::Display for EventMention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}] \"{}\"", self.start, self.end, self.trigger)
    }
}

/// Per-mention record derived once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRow {
    /// Position of the mention in the ordered row sequence.
    pub row: usize,
    /// Document order index of the mention.
    pub order: u64,
    /// Sentence index.
    pub sentence: usize,
    /// Whether the mention sits in the document title.
    pub in_title: bool,
    /// Whether the mention counts as an in-scope domain event.
    pub in_scope: bool,
}

/// Ordered, queryable collection of one document's event mentions.
///
/// Built once per document, immutable afterward. Validation is strict:
/// duplicate mention ids, duplicate order indices, and order indices that do
/// not increase with document position all reject the document with
/// [`Error::InvalidInput`].
#[derive(Debug, Clone)]
pub struct MentionIndex {
    mentions: Vec<EventMention>,
    rows: Vec<MentionRow>,
    by_id: HashMap<MentionId, usize>,
    in_scope: Vec<usize>,
}

impl MentionIndex {
    /// Build the index from a document's mention list.
    ///
    /// Mentions must arrive in document order with strictly increasing,
    /// unique order indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for duplicate mention ids, duplicate
    /// order indices, or order indices non-monotonic with document position.
    pub fn build(mentions: &[EventMention]) -> Result<Self> {
        let mut rows = Vec::with_capacity(mentions.len());
        let mut by_id = HashMap::with_capacity(mentions.len());
        let mut in_scope = Vec::new();

        for (row, mention) in mentions.iter().enumerate() {
            if row > 0 {
                let previous = &mentions[row - 1];
                if mention.order == previous.order {
                    return Err(Error::invalid_input(format!(
                        "duplicate document order index {} (mentions {} and {})",
                        mention.order, previous.id, mention.id
                    )));
                }
                if mention.order < previous.order {
                    return Err(Error::invalid_input(format!(
                        "order index {} of mention {} is not monotonic with document order (previous index {})",
                        mention.order, mention.id, previous.order
                    )));
                }
            }
            if by_id.insert(mention.id, row).is_some() {
                return Err(Error::invalid_input(format!(
                    "duplicate mention id {}",
                    mention.id
                )));
            }

            let scoped = mention.is_in_scope();
            if scoped {
                in_scope.push(row);
            }
            rows.push(MentionRow {
                row,
                order: mention.order,
                sentence: mention.sentence,
                in_title: mention.in_title,
                in_scope: scoped,
            });
        }

        Ok(Self {
            mentions: mentions.to_vec(),
            rows,
            by_id,
            in_scope,
        })
    }

    /// Number of mentions in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    /// Whether the document has no mentions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    /// Number of in-scope mentions.
    #[must_use]
    pub fn count_in_scope(&self) -> usize {
        self.in_scope.len()
    }

    /// Row for a mention id, if the mention belongs to this document.
    #[must_use]
    pub fn row_of(&self, id: MentionId) -> Option<&MentionRow> {
        self.by_id.get(&id).map(|&row| &self.rows[row])
    }

    /// Mention for an id, if it belongs to this document.
    #[must_use]
    pub fn mention_of(&self, id: MentionId) -> Option<&EventMention> {
        self.by_id.get(&id).map(|&row| &self.mentions[row])
    }

    /// The full ordered row sequence.
    #[must_use]
    pub fn all_rows(&self) -> &[MentionRow] {
        &self.rows
    }

    /// Rows restricted to in-scope mentions, in document order.
    pub fn in_scope_rows(&self) -> impl Iterator<Item = &MentionRow> {
        self.in_scope.iter().map(|&row| &self.rows[row])
    }

    /// In-scope mentions in document order.
    pub fn in_scope_mentions(&self) -> impl Iterator<Item = &EventMention> {
        self.in_scope.iter().map(|&row| &self.mentions[row])
    }

    /// All mentions in document order.
    #[must_use]
    pub fn mentions(&self) -> &[EventMention] {
        &self.mentions
    }

    /// Mention at a row position.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds; rows must come from this index.
    #[must_use]
    pub fn mention_at(&self, row: usize) -> &EventMention {
        &self.mentions[row]
    }

    /// Row record at a row position.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds; rows must come from this index.
    #[must_use]
    pub fn row_at(&self, row: usize) -> &MentionRow {
        &self.rows[row]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(id: MentionId, order: u64) -> EventMention {
        EventMention::new(id, format!("trigger{id}"), 0, 1, order)
    }

    #[test]
    fn test_build_assigns_rows_in_order() {
        let mentions = vec![mention(5, 0), mention(9, 3), mention(2, 7)];
        let index = MentionIndex::build(&mentions).unwrap();

        assert_eq!(index.len(), 3);
        let rows = index.all_rows();
        assert_eq!(rows[0].row, 0);
        assert_eq!(rows[1].order, 3);
        assert_eq!(rows[2].order, 7);
        assert_eq!(index.row_of(9).unwrap().row, 1);
        assert_eq!(index.mention_of(2).unwrap().order, 7);
    }

    #[test]
    fn test_build_rejects_duplicate_order() {
        let mentions = vec![mention(1, 0), mention(2, 0)];
        let err = MentionIndex::build(&mentions).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("duplicate document order index"));
    }

    #[test]
    fn test_build_rejects_non_monotonic_order() {
        let mentions = vec![mention(1, 4), mention(2, 2)];
        let err = MentionIndex::build(&mentions).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("not monotonic"));
    }

    #[test]
    fn test_build_rejects_duplicate_id() {
        let mentions = vec![mention(1, 0), mention(1, 1)];
        let err = MentionIndex::build(&mentions).unwrap_err();
        assert!(err.to_string().contains("duplicate mention id"));
    }

    #[test]
    fn test_in_scope_excludes_epistemic_and_reported() {
        let mentions = vec![
            mention(1, 0),
            mention(2, 1).with_modality(EventModality::Epistemic),
            mention(3, 2).with_modality(EventModality::Reported),
            mention(4, 3),
        ];
        let index = MentionIndex::build(&mentions).unwrap();

        assert_eq!(index.count_in_scope(), 2);
        let scoped: Vec<MentionId> = index.in_scope_mentions().map(|m| m.id).collect();
        assert_eq!(scoped, vec![1, 4]);
        assert!(!index.row_of(2).unwrap().in_scope);
        assert!(index.row_of(4).unwrap().in_scope);
    }

    #[test]
    fn test_empty_document_builds() {
        let index = MentionIndex::build(&[]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.count_in_scope(), 0);
    }

    #[test]
    fn test_mention_serde_roundtrip() {
        let mention = EventMention::new(7, "collapsed", 10, 19, 2)
            .with_sentence(1)
            .with_in_title(true)
            .with_head_word("collapse")
            .with_event_type("disaster");
        let json = serde_json::to_string(&mention).unwrap();
        let back: EventMention = serde_json::from_str(&json).unwrap();
        assert_eq!(mention, back);
    }

    #[test]
    fn test_mention_display() {
        let mention = EventMention::new(1, "fled", 4, 8, 0);
        assert_eq!(mention.to_string(), "[4..8] \"fled\"");
    }
}
