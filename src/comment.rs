//! `<!-- ... -->` content, kept as its own content-element variant rather
//! than flattened into text. Grounded in
//! `original_source/src/dhtmlparser3/tags/comment.py`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub content: String,
}

impl Comment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<!--{}-->", self.content)
    }
}
