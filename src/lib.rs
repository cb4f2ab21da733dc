//! A forgiving HTML/XML parser aimed at web-scraping workloads: malformed
//! markup degrades to literal text or gets reshaped into a sane tree
//! rather than aborting the parse. Start with [`parse`] and walk the
//! result with [`Tag::find`]/[`Tag::wfind`].
//!
//! ```
//! let tree = loose_html::parse("<p>Hello <b>world</b></p>");
//! assert_eq!(tree.find(Some("b"), None).len(), 1);
//! ```

pub mod comment;
pub mod entities;
pub mod errors;
pub mod parameters;
pub mod tag;
pub mod tokenizer;
pub mod tokens;
mod tree_builder;

pub use comment::Comment;
pub use errors::DomError;
pub use parameters::ParameterStore;
pub use tag::{Content, Tag};
pub use tokenizer::Tokenizer;
pub use tokens::{ParameterToken, TagToken, Token};

const BOM: char = '\u{feff}';

/// Knobs for [`parse_with`]. Defaults match [`parse`]: tag names and
/// parameter keys are matched case-insensitively, mirroring how HTML
/// itself treats them.
///
/// Grounded in `nchapman-html2markdown-rs`'s `Options`/`with_*` builder
/// convention rather than a positional-argument constructor.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    case_sensitive: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When true, tag names and parameter keys are matched and stored with
    /// exact casing; when false (the default), comparisons fold case.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// Parses `text` with default options (case-insensitive tag and parameter
/// matching). Never fails: malformed markup is absorbed, not rejected; see
/// the crate docs and [`tokenizer`] for the recovery rules.
pub fn parse(text: &str) -> Tag {
    parse_with(text, &ParseOptions::default())
}

/// Parses `text` with explicit [`ParseOptions`].
///
/// A document with exactly one top-level tag and nothing else of note
/// returns that tag as the root; anything else (multiple top-level nodes,
/// leading/trailing stray text) returns a nameless synthetic root holding
/// all of it as children. Either way the returned tag's descendants already
/// have working `.parent()` back-references.
pub fn parse_with(text: &str, options: &ParseOptions) -> Tag {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    #[cfg(feature = "tracing")]
    tracing::debug!(len = text.len(), "starting parse");

    let tokens = Tokenizer::new(text);
    let mut root = tree_builder::build_tree(tokens, options.case_sensitive);

    let mut result = if root.content().len() == 1 && matches!(root.content()[0], Content::Tag(_)) {
        match root.content_mut().pop().unwrap() {
            Content::Tag(only) => only,
            _ => unreachable!(),
        }
    } else {
        root
    };

    result.double_link();
    result
}
