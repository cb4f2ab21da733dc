//! Stack-based tree construction, including the reshape pass that recovers
//! from elements left open by source markup.
//!
//! Grounded in `original_source/src/dhtmlparser3/parser.py`
//! (`Parser.parse_dom`, `_reshape_non_pair_tags`, `_move_content_to_parent`):
//! the original walks a token list maintaining a stack of open tags and,
//! when a closing tag doesn't match the innermost open element, hoists the
//! misnested content of *every* element sitting between the match and the
//! stack top back up to the real ancestor before closing it — regardless
//! of the element's name. The `NONPAIR_TAGS` set that class also defines is
//! provably dead code there (grep finds no reference to it from either
//! `_reshape_non_pair_tags` or `_move_content_to_parent`); reshape doesn't
//! special-case void-tag names, it force-closes and hoists whatever was
//! left open, full stop — confirmed by `tests/test_parser.py::
//! test_nonpair_closing`, where even a non-void `<div>` left open at EOF
//! comes out flattened to an empty, `is_non_pair` sibling alongside its
//! former children. This module reaches the same result with owned values
//! instead of in-place list surgery: open tags are kept on the
//! construction stack *unattached* to their eventual parent until they're
//! closed (by a matching end tag, by running out of input, or by being
//! promoted past as part of someone else's reshape), so "hoisting" a
//! left-open element's stray children is just reordering which `Vec` they
//! land in, not rewriting an already-linked tree in place. The everyday
//! `<div><br><img><hr></div>` void-chain case (spec.md §4.2) falls out of
//! this as a special case, not a separate rule: `br`/`img`/`hr` are simply
//! never explicitly closed, so they're exactly the kind of left-open
//! element this pass always flattens.

use crate::comment::Comment;
use crate::tag::{Content, Tag};
use crate::tokens::Token;

pub struct Builder {
    /// Open tags, outermost (the synthetic root) first. Each entry's
    /// `content` holds only what has already been attached to it — text,
    /// comments, explicitly self-closed tags, and children closed while it
    /// was the innermost open element. A still-open descendant is a
    /// separate stack entry, not yet nested into its parent's `content`.
    stack: Vec<Tag>,
    case_sensitive: bool,
}

impl Builder {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            stack: vec![Tag::root(case_sensitive)],
            case_sensitive,
        }
    }

    pub fn build(tokens: impl Iterator<Item = Token>, case_sensitive: bool) -> Tag {
        let mut builder = Self::new(case_sensitive);
        for token in tokens {
            builder.push_token(token);
        }
        builder.finish()
    }

    fn push_token(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.push_content(Content::Text(text)),
            Token::Comment(text) => self.push_content(Content::Comment(Comment::new(text))),
            Token::Entity(_) => unreachable!("entities are folded to Text before reaching the tree builder"),
            Token::Tag(tag_token) => {
                if tag_token.is_end_tag {
                    self.close(&tag_token.name);
                } else {
                    let child = tag_token.to_tag(self.case_sensitive);
                    if tag_token.is_non_pair {
                        self.push_content(Content::Tag(child));
                    } else {
                        self.stack.push(child);
                    }
                }
            }
        }
    }

    fn push_content(&mut self, item: Content) {
        let top = self.stack.last_mut().expect("root is never popped");
        if let Content::Text(more) = &item {
            if let Some(Content::Text(existing)) = top.content.last_mut() {
                existing.push_str(more);
                return;
            }
        }
        top.content.push(item);
    }

    fn name_matches(&self, name: &str, candidate: &str) -> bool {
        if self.case_sensitive {
            name == candidate
        } else {
            name.eq_ignore_ascii_case(candidate)
        }
    }

    /// Finds the innermost open element named `name` and closes everything
    /// from the top of the stack down through it, reshaping as needed. A
    /// name with no open match is emitted back as literal text — nothing
    /// in this crate's model can represent "closed something that was
    /// never open".
    fn close(&mut self, name: &str) {
        let matched = (1..self.stack.len())
            .rev()
            .find(|&i| self.name_matches(&self.stack[i].name, name));

        match matched {
            Some(index) => self.close_through(index),
            None => self.push_content(Content::Text(format!("</{name}>"))),
        }
    }

    /// Force-closes a left-open tag: it absorbs whatever was carried up
    /// from the element above it, then is itself marked `is_non_pair` and
    /// emptied, with its own (now former) children promoted to ride along
    /// in the carry so they land as its siblings rather than its content.
    fn flatten(mut tag: Tag, mut carry: Vec<Content>) -> Vec<Content> {
        tag.content.append(&mut carry);
        tag.is_non_pair = true;
        let mut promoted = std::mem::take(&mut tag.content);
        let mut next_carry = vec![Content::Tag(tag)];
        next_carry.append(&mut promoted);
        next_carry
    }

    /// Pops the stack down to (but not including) `index`, flattening
    /// every element above it — those were opened but never properly
    /// closed. The element at `index` itself is the real match for the
    /// end tag that triggered this, so it keeps its genuine content and is
    /// attached normally to the new top instead of being flattened.
    fn close_through(&mut self, index: usize) {
        let mut carry: Vec<Content> = Vec::new();

        while self.stack.len() > index + 1 {
            let tag = self.stack.pop().expect("loop guard");
            carry = Self::flatten(tag, carry);
        }

        let mut target = self.stack.pop().expect("index is within range");
        target.content.append(&mut carry);
        self.stack
            .last_mut()
            .expect("root is never popped")
            .content
            .push(Content::Tag(target));
    }

    /// Force-closes every element still open at end of input. Unlike
    /// `close_through`, there is no real match here — every still-open
    /// element gets flattened, including the outermost one, same as the
    /// original's EOF case (`_reshape_non_pair_tags(stack, root)`, where
    /// the root itself stands in as `closed_element` and nothing above it
    /// is exempt).
    fn finish(mut self) -> Tag {
        let mut carry: Vec<Content> = Vec::new();

        while self.stack.len() > 1 {
            let tag = self.stack.pop().expect("loop guard");
            carry = Self::flatten(tag, carry);
        }

        let mut root = self.stack.pop().expect("root survives to the end");
        root.content.append(&mut carry);
        root
    }
}

/// Convenience entry point used by `lib::parse_with`.
pub fn build_tree(tokens: impl Iterator<Item = Token>, case_sensitive: bool) -> Tag {
    Builder::build(tokens, case_sensitive)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn build(input: &str) -> Tag {
        build_tree(Tokenizer::new(input), false)
    }

    #[test]
    fn well_formed_nesting() {
        let root = build("<div><span>x</span></div>");
        let div = match &root.content()[0] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        assert_eq!(div.name(), "div");
        assert_eq!(div.tags().count(), 1);
        let span = div.tags().next().unwrap();
        assert_eq!(span.content_without_tags(), "x");
    }

    #[test]
    fn void_chain_reshapes_to_siblings() {
        let root = build("<div><br><img><hr></div>");
        let div = match &root.content()[0] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        let names: Vec<&str> = div.tags().map(|t| t.name()).collect();
        assert_eq!(names, vec!["br", "img", "hr"]);
        assert!(div.tags().all(|t| t.is_non_pair() && t.content().is_empty()));
    }

    #[test]
    fn distant_mismatched_close_flattens_every_intermediate_open() {
        // span and b are never explicitly closed; the </div> matches div,
        // which sits below both of them, so both get force-closed empty
        // and come out as div's siblings-in-content rather than nested.
        let root = build("<div><span><b>text</div>");
        let div = match &root.content()[0] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        assert_eq!(div.content().len(), 3);
        let span = match &div.content()[0] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        assert_eq!(span.name(), "span");
        assert!(span.is_non_pair());
        assert!(span.content().is_empty());
        let b = match &div.content()[1] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        assert_eq!(b.name(), "b");
        assert!(b.is_non_pair());
        assert!(b.content().is_empty());
        assert!(matches!(&div.content()[2], Content::Text(t) if t == "text"));
    }

    #[test]
    fn explicitly_paired_void_tag_keeps_its_content() {
        let root = build("<div><br>x</br></div>");
        let div = match &root.content()[0] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        let br = div.tags().next().expect("br");
        assert_eq!(br.name(), "br");
        assert_eq!(br.content_without_tags(), "x");
    }

    #[test]
    fn unmatched_end_tag_becomes_text() {
        let root = build("<p>hi</span>");
        let p = match &root.content()[0] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        assert_eq!(p.content_without_tags(), "hi</span>");
    }

    #[test]
    fn unclosed_tags_close_at_end_of_input() {
        // Neither div nor p is ever closed, so EOF flattens both — there is
        // no real match to exempt, unlike the close_through(name) case.
        let root = build("<div><p>trailing");
        assert_eq!(root.content().len(), 3);
        let div = match &root.content()[0] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        assert_eq!(div.name(), "div");
        assert!(div.is_non_pair());
        assert!(div.content().is_empty());
        let p = match &root.content()[1] {
            Content::Tag(t) => t,
            _ => panic!("expected tag"),
        };
        assert_eq!(p.name(), "p");
        assert!(p.is_non_pair());
        assert!(p.content().is_empty());
        assert!(matches!(&root.content()[2], Content::Text(t) if t == "trailing"));
    }
}
