//! The token types the tokenizer emits, consumed by the tree builder.
//!
//! Grounded in `original_source/src/dhtmlparser3/tokens.py`: that module
//! uses a `Token` base class with `TextToken`/`TagToken`/`ParameterToken`/
//! `CommentToken`/`EntityToken` subclasses distinguished by `isinstance`.
//! `EntityToken` never survives past the tokenizer (see
//! `tokenizer::Tokenizer::next`, which folds it into `Text`), so the token
//! type that reaches the tree builder is a plain tagged `enum` over the
//! four cases that matter downstream.

use crate::parameters::ParameterStore;
use crate::tag::Tag;

/// One attribute as scanned from source, before it's folded into a
/// `ParameterStore`. Order is significant until fold time; case-folding and
/// duplicate handling are the store's job, not the tokenizer's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterToken {
    pub key: String,
    pub value: String,
}

impl ParameterToken {
    /// A bare attribute with no `=value` part, e.g. `disabled`.
    pub fn bare(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    pub name: String,
    pub parameters: Vec<ParameterToken>,
    pub is_non_pair: bool,
    pub is_end_tag: bool,
}

impl TagToken {
    /// Builds the `Tag` node this token describes, folding its parameters
    /// into a store with the given case-sensitivity. Content is always
    /// empty; the tree builder fills it in as children arrive.
    pub fn to_tag(&self, case_sensitive_params: bool) -> Tag {
        let mut params = ParameterStore::new(case_sensitive_params);
        for p in &self.parameters {
            params.insert(p.key.clone(), p.value.clone());
        }
        Tag::new(self.name.clone(), params, self.is_non_pair)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Tag(TagToken),
    Comment(String),
    /// Scanned but not yet folded to `Text`; never observed outside the
    /// tokenizer's own `next()`.
    Entity(String),
}
