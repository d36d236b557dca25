//! Runtime-style resolution of a message to its localized text.

use std::collections::HashMap;

use super::model::{
    Catalog,
    Message,
    MessageKey,
    TranslationState,
};
use super::numerus::NumerusRule;
use super::placeholder::fill_count;

/// Which translations are eligible for lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupPolicy {
    /// Serve translations still marked `unfinished`
    pub include_unfinished: bool,
}

impl Default for LookupPolicy {
    fn default() -> Self {
        Self { include_unfinished: true }
    }
}

/// Key and id index over one catalog. The first occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogIndex {
    /// Language for numerus selection
    language: Option<String>,
    /// Eligibility rules
    policy: LookupPolicy,
    /// First message per key
    by_key: HashMap<MessageKey, usize>,
    /// First message per id
    by_id: HashMap<String, usize>,
    /// Live messages in document order
    messages: Vec<Message>,
}

impl CatalogIndex {
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        Self::with_policy(catalog, LookupPolicy::default())
    }

    #[must_use]
    pub fn with_policy(catalog: &Catalog, policy: LookupPolicy) -> Self {
        let mut by_key = HashMap::new();
        let mut by_id = HashMap::new();
        let mut messages = Vec::new();

        for message in &catalog.messages {
            if message.state().is_retired() {
                continue;
            }
            let index = messages.len();
            by_key.entry(message.key.clone()).or_insert(index);
            if let Some(id) = &message.id {
                by_id.entry(id.clone()).or_insert(index);
            }
            messages.push(message.clone());
        }

        let language = catalog
            .header
            .language
            .as_deref()
            .map(str::trim)
            .filter(|language| !language.is_empty())
            .map(ToString::to_string);

        Self { language, policy, by_key, by_id, messages }
    }

    /// Uses `language` for numerus selection instead of the header's.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Language used for numerus selection.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub const fn policy(&self) -> LookupPolicy {
        self.policy
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The retained message for `key`, regardless of its translation.
    #[must_use]
    pub fn message(&self, key: &MessageKey) -> Option<&Message> {
        self.by_key.get(key).and_then(|&index| self.messages.get(index))
    }

    /// Translation for the key; a comment that is not found falls back to
    /// the uncommented message with the same source.
    #[must_use]
    pub fn translate(&self, context: &str, source: &str, comment: &str) -> Option<&str> {
        self.resolve(context, source, comment).and_then(|message| self.form(message, 0))
    }

    /// Translation for the key, or `source` itself.
    #[must_use]
    pub fn translate_or_source<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: &str,
    ) -> &'a str {
        self.translate(context, source, comment).unwrap_or(source)
    }

    /// Picks the numerus form for `n` and substitutes `%n`.
    ///
    /// Falls back to the source text, with `%n` substituted, when nothing
    /// eligible exists.
    #[must_use]
    pub fn translate_plural(&self, context: &str, source: &str, comment: &str, n: u64) -> String {
        let form_index = self
            .language
            .as_deref()
            .and_then(NumerusRule::for_language)
            .map_or(0, |rule| rule.form_index(n));
        let count = i64::try_from(n).unwrap_or(i64::MAX);

        let text = self
            .resolve(context, source, comment)
            .and_then(|message| {
                self.form(message, form_index).or_else(|| self.form(message, 0))
            })
            .unwrap_or(source);
        fill_count(text, count)
    }

    /// Translation of an id-based message.
    #[must_use]
    pub fn translate_id(&self, id: &str) -> Option<&str> {
        self.by_id
            .get(id)
            .and_then(|&index| self.messages.get(index))
            .and_then(|message| self.form(message, 0))
    }

    /// Eligible message for the key, with the uncommented fallback.
    fn resolve(&self, context: &str, source: &str, comment: &str) -> Option<&Message> {
        let exact = MessageKey::new(context, source, comment);
        let eligible = |key: &MessageKey| self.message(key).filter(|m| self.is_eligible(m));

        eligible(&exact).or_else(|| {
            if comment.is_empty() {
                None
            } else {
                eligible(&MessageKey::new(context, source, ""))
            }
        })
    }

    /// Whether `message` may serve a lookup under the policy.
    fn is_eligible(&self, message: &Message) -> bool {
        if message.translation.as_ref().is_none_or(|translation| translation.is_empty()) {
            return false;
        }
        match message.state() {
            TranslationState::Finished => true,
            TranslationState::Unfinished => self.policy.include_unfinished,
            TranslationState::Vanished | TranslationState::Obsolete => false,
        }
    }

    /// Non-empty form `index` of the translation.
    fn form<'a>(&self, message: &'a Message, index: usize) -> Option<&'a str> {
        message
            .translation
            .as_ref()
            .and_then(|translation| translation.forms.get(index))
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }
}
