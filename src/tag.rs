//! The `Tag` tree node: parameters, children, traversal, queries, and the
//! mutation surface.
//!
//! Grounded in `original_source/src/dhtmlparser3/tags/tag.py` (593 lines):
//! the `.p`/`.c`/`.tags` shorthands become `params()`/`content()`/`tags()`,
//! `double_link()` keeps its name, `find`/`findb`/`wfind`/`match_paths`
//! mirror their namesakes, and `__eq__`'s "compare name, parameters and
//! pairing, ignore content" rule becomes the `PartialEq` impl below.
//!
//! `parent` is a raw back-reference rather than `Rc`/`Weak`: ownership of
//! the tree is single and top-down (a `Tag` owns its `content` outright),
//! so there is no genuine shared ownership for `Rc` to model. The pointer
//! is only valid relative to the tree's current address, which is why
//! [`Tag::double_link`] exists as a callable "refresh the back-references"
//! step rather than a one-time constructor fixup: any code that
//! reshuffles `content` (this module's own mutation methods included)
//! must call it again on the subtree root before relying on `.parent()`.
//! `parse`/`parse_with` call it once on your behalf, immediately before
//! handing the tree back to you.

use std::collections::VecDeque;
use std::ptr::NonNull;

use crate::comment::Comment;
use crate::errors::DomError;
use crate::parameters::ParameterStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Tag(Tag),
    Text(String),
    Comment(Comment),
}

#[derive(Debug)]
pub struct Tag {
    pub(crate) name: String,
    pub(crate) parameters: ParameterStore,
    pub(crate) is_non_pair: bool,
    pub(crate) content: Vec<Content>,
    case_sensitive: bool,
    parent: Option<NonNull<Tag>>,
}

impl Tag {
    pub fn new(name: impl Into<String>, parameters: ParameterStore, is_non_pair: bool) -> Self {
        let case_sensitive = parameters.is_case_sensitive();
        Self {
            name: name.into(),
            parameters,
            is_non_pair,
            content: Vec::new(),
            case_sensitive,
            parent: None,
        }
    }

    /// The synthetic, nameless container `parse` returns when the document
    /// had more than one top-level node. Its own tag markup never appears
    /// in serialized output; only its content does.
    pub fn root(case_sensitive: bool) -> Self {
        Self::new("", ParameterStore::new(case_sensitive), false)
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_non_pair(&self) -> bool {
        self.is_non_pair
    }

    pub fn params(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.parameters
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Vec<Content> {
        &mut self.content
    }

    pub fn push_content(&mut self, item: Content) {
        self.content.push(item);
    }

    /// Direct child tags only, in document order, skipping text and
    /// comment siblings.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.content.iter().filter_map(|c| match c {
            Content::Tag(t) => Some(t),
            _ => None,
        })
    }

    /// Safety: the pointer is only dereferenced here; it is guaranteed
    /// live as long as no ancestor's `content` has reallocated or shifted
    /// since the last `double_link()`. See the module-level docs.
    pub fn parent(&self) -> Option<&Tag> {
        self.parent.map(|p| unsafe { p.as_ref() })
    }

    fn name_eq(&self, other: &str) -> bool {
        if self.case_sensitive {
            self.name == other
        } else {
            self.name.eq_ignore_ascii_case(other)
        }
    }

    /// Recomputes every descendant's `parent` pointer to point at its
    /// immediate owner. Idempotent; call again after any structural edit
    /// if you plan to walk back up the tree afterward.
    pub fn double_link(&mut self) {
        let self_ptr = NonNull::from(&mut *self);
        for item in self.content.iter_mut() {
            if let Content::Tag(child) = item {
                child.parent = Some(self_ptr);
                child.double_link();
            }
        }
    }

    /// All text, recursively, with tag markup and comments stripped out.
    pub fn content_without_tags(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for item in &self.content {
            match item {
                Content::Text(t) => out.push_str(t),
                Content::Tag(t) => t.collect_text(out),
                Content::Comment(_) => {}
            }
        }
    }

    /// Depth-first walk rooted at `self`, yielding `self` before any of its
    /// descendants (`tag.py`'s `depth_first_iterator` does `yield self`
    /// first for the same reason: it's what lets `find` match the
    /// receiver itself, not just its descendants).
    pub fn depth_first(&self) -> DepthFirstIter<'_> {
        DepthFirstIter { stack: vec![self] }
    }

    /// Breadth-first walk rooted at `self`, yielding `self` first.
    pub fn breadth_first(&self) -> BreadthFirstIter<'_> {
        let mut queue = VecDeque::new();
        queue.push_back(self);
        BreadthFirstIter { queue }
    }

    fn matches(&self, name: Option<&str>, params: Option<&ParameterStore>) -> bool {
        name.map_or(true, |n| self.name_eq(n))
            && params.map_or(true, |p| self.parameters.contains_subset(p))
    }

    /// Depth-first search of `self` and its whole subtree, `self` included.
    pub fn find(&self, name: Option<&str>, params: Option<&ParameterStore>) -> Vec<&Tag> {
        self.depth_first()
            .filter(|t| t.matches(name, params))
            .collect()
    }

    /// Breadth-first search of `self` and its whole subtree, `self` included.
    pub fn findb(&self, name: Option<&str>, params: Option<&ParameterStore>) -> Vec<&Tag> {
        self.breadth_first()
            .filter(|t| t.matches(name, params))
            .collect()
    }

    /// Like `find`, but restricted to direct children.
    pub fn wfind(&self, name: Option<&str>, params: Option<&ParameterStore>) -> Vec<&Tag> {
        self.tags().filter(|t| t.matches(name, params)).collect()
    }

    /// `find` generalized to an arbitrary predicate; `self` included.
    pub fn match_tag<F>(&self, predicate: F) -> Vec<&Tag>
    where
        F: Fn(&Tag) -> bool,
    {
        self.depth_first().filter(|t| predicate(t)).collect()
    }

    /// Chains `wfind` across `steps`, each step narrowing to the direct
    /// children of the previous step's results — an exact-path search, as
    /// opposed to `find`'s unrestricted-depth one.
    pub fn match_paths(&self, steps: &[(Option<&str>, Option<&ParameterStore>)]) -> Vec<&Tag> {
        let mut frontier: Vec<&Tag> = vec![self];
        for &(name, params) in steps {
            frontier = frontier
                .into_iter()
                .flat_map(|t| t.wfind(name, params))
                .collect();
        }
        frontier
    }

    /// Detaches `self` from its parent's content. Returns `false` if this
    /// tag has no parent (it's a parse result root) or the back-reference
    /// was already stale.
    pub fn remove(&mut self) -> bool {
        let Some(parent_ptr) = self.parent else {
            return false;
        };
        let self_ptr: *const Tag = self;
        // Safety: parent_ptr is live per the double_link() contract.
        let parent = unsafe { &mut *parent_ptr.as_ptr() };
        let idx = parent
            .content
            .iter()
            .position(|c| matches!(c, Content::Tag(t) if std::ptr::eq(t, self_ptr)));
        match idx {
            Some(idx) => {
                parent.content.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes the first content item structurally equal to `item` from
    /// this tag's own content list.
    pub fn remove_item(&mut self, item: &Content) -> Result<(), DomError> {
        let idx = self
            .content
            .iter()
            .position(|c| c == item)
            .ok_or(DomError::UnsupportedRemoveItem)?;
        self.content.remove(idx);
        Ok(())
    }

    /// Replaces `self` in its parent's content with `replacement`. When
    /// `keep_content` is true, `self`'s own children are moved onto the
    /// end of `replacement`'s content, which requires `replacement` to be
    /// a tag.
    pub fn replace_with(&mut self, mut replacement: Content, keep_content: bool) -> Result<(), DomError> {
        if keep_content {
            match &mut replacement {
                Content::Tag(t) => t.content.append(&mut self.content),
                _ => return Err(DomError::ReplaceWithTypeMismatch),
            }
        }

        let parent_ptr = self.parent.ok_or(DomError::ReplaceWithTypeMismatch)?;
        let self_ptr: *const Tag = self;
        // Safety: parent_ptr is live per the double_link() contract.
        let parent = unsafe { &mut *parent_ptr.as_ptr() };
        let idx = parent
            .content
            .iter()
            .position(|c| matches!(c, Content::Tag(t) if std::ptr::eq(t, self_ptr)))
            .ok_or(DomError::ReplaceWithTypeMismatch)?;
        parent.content[idx] = replacement;
        Ok(())
    }

    /// Position of the `tag_index`-th Tag-only child within the raw
    /// `content` list, i.e. translating a `.tags()` position into a
    /// `content()` position. Shared by every integer/slice mutation below,
    /// mirroring `self.tags[key]` / `self.content.index(item)` in the
    /// grounded source.
    fn tag_content_index(&self, tag_index: usize) -> Option<usize> {
        self.content
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Content::Tag(_)))
            .nth(tag_index)
            .map(|(i, _)| i)
    }

    /// Replaces the `index`-th tag child outright, as `tag[i] = value` does
    /// in the grounded source (`value` need not itself be a tag).
    pub fn set_tag(&mut self, index: usize, value: Content) -> Result<(), DomError> {
        let content_index = self
            .tag_content_index(index)
            .ok_or(DomError::SliceIndexOutOfRange)?;
        self.content[content_index] = value;
        Ok(())
    }

    /// `tag[-1:] = value` — appends to the end of this tag's content.
    pub fn append_child(&mut self, value: Content) {
        self.content.push(value);
    }

    /// `tag[0:] = value` — inserts at the very front of this tag's content.
    pub fn prepend_child(&mut self, value: Content) {
        self.content.insert(0, value);
    }

    /// `tag[i:] = value` — inserts `value` immediately before the `i`-th
    /// tag child (by position among Tag-only children, not raw content
    /// index). Errors if `index` doesn't address an existing tag child.
    pub fn insert_before_tag(&mut self, index: usize, value: Content) -> Result<(), DomError> {
        let content_index = self
            .tag_content_index(index)
            .ok_or(DomError::SliceIndexOutOfRange)?;
        self.content.insert(content_index, value);
        Ok(())
    }

    /// Deep structural equality: name, parameters, pairing, and the full
    /// content tree recursively. Unlike `PartialEq` (which `find`/
    /// `remove_item` use to mean "the same kind of tag"), this is what a
    /// parse→serialize→reparse round-trip check needs.
    pub fn structurally_equal(&self, other: &Tag) -> bool {
        self == other
            && self.content.len() == other.content.len()
            && self
                .content
                .iter()
                .zip(other.content.iter())
                .all(|(a, b)| match (a, b) {
                    (Content::Tag(a), Content::Tag(b)) => a.structurally_equal(b),
                    (Content::Text(a), Content::Text(b)) => a == b,
                    (Content::Comment(a), Content::Comment(b)) => a == b,
                    _ => false,
                })
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        if self.is_root() {
            self.write_children(out);
            return;
        }

        out.push('<');
        out.push_str(&self.name);
        self.write_parameters(out);

        if self.is_non_pair {
            out.push_str(" />");
            return;
        }

        out.push('>');
        self.write_children(out);
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    fn write_parameters(&self, out: &mut String) {
        for (key, value) in self.parameters.iter() {
            out.push(' ');
            out.push_str(key);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&escape_attribute_value(value));
                out.push('"');
            }
        }
    }

    fn write_children(&self, out: &mut String) {
        let raw = is_raw_text_tag(&self.name);
        for item in &self.content {
            match item {
                Content::Text(t) => {
                    if raw {
                        out.push_str(t);
                    } else {
                        out.push_str(&escape_text(t));
                    }
                }
                Content::Comment(c) => out.push_str(&c.to_string()),
                Content::Tag(t) => t.write_html(out),
            }
        }
    }

    /// Indented, one-node-per-line rendering. Whitespace-only text nodes
    /// are dropped rather than indented as empty lines.
    pub fn to_string_pretty(&self) -> String {
        let mut out = String::new();
        if self.is_root() {
            for item in &self.content {
                Self::write_pretty_item(item, &mut out, 0);
            }
        } else {
            self.write_pretty(&mut out, 0);
        }
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        self.write_parameters(out);

        if self.is_non_pair {
            out.push_str(" />\n");
            return;
        }

        out.push_str(">\n");

        if is_verbatim_pretty_tag(&self.name) {
            self.write_children(out);
            out.push('\n');
        } else {
            for item in &self.content {
                Self::write_pretty_item(item, out, depth + 1);
            }
        }

        out.push_str(&indent);
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }

    fn write_pretty_item(item: &Content, out: &mut String, depth: usize) {
        match item {
            Content::Tag(t) => t.write_pretty(out, depth),
            Content::Text(t) => {
                let trimmed = t.trim();
                if !trimmed.is_empty() {
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(trimmed);
                    out.push('\n');
                }
            }
            Content::Comment(c) => {
                out.push_str(&"  ".repeat(depth));
                out.push_str(&c.to_string());
                out.push('\n');
            }
        }
    }
}

impl Clone for Tag {
    /// The clone is detached: `parent` resets to `None` even for
    /// descendants, since the cloned subtree has a different address than
    /// the original. Call `double_link()` on the clone if you need
    /// working back-references.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            is_non_pair: self.is_non_pair,
            content: self.content.clone(),
            case_sensitive: self.case_sensitive,
            parent: None,
        }
    }
}

impl PartialEq for Tag {
    /// Name, parameters, and pairing only. `content` is deliberately
    /// excluded, matching `tags/tag.py::Tag.__eq__` — two tags with the
    /// same name/parameters/pairing are "the same kind of tag" regardless
    /// of what's nested inside.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.is_non_pair == other.is_non_pair
            && self.parameters == other.parameters
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_html())
    }
}

impl std::ops::Index<&str> for Tag {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        self.parameters.get(key).expect("parameter not found")
    }
}

/// Integer indexing addresses Tag-only children, as `tag[i]` does in the
/// grounded source (`__getitem__` falling through to `self.tags[item]`).
impl std::ops::Index<usize> for Tag {
    type Output = Tag;

    fn index(&self, index: usize) -> &Tag {
        self.tags().nth(index).expect("tag child index out of range")
    }
}

pub struct DepthFirstIter<'a> {
    stack: Vec<&'a Tag>,
}

impl<'a> Iterator for DepthFirstIter<'a> {
    type Item = &'a Tag;

    fn next(&mut self) -> Option<&'a Tag> {
        let tag = self.stack.pop()?;
        let mut children: Vec<&Tag> = tag.tags().collect();
        children.reverse();
        self.stack.extend(children);
        Some(tag)
    }
}

pub struct BreadthFirstIter<'a> {
    queue: VecDeque<&'a Tag>,
}

impl<'a> Iterator for BreadthFirstIter<'a> {
    type Item = &'a Tag;

    fn next(&mut self) -> Option<&'a Tag> {
        let tag = self.queue.pop_front()?;
        self.queue.extend(tag.tags());
        Some(tag)
    }
}

/// Grounded in `original_source/src/dhtmlparser3/quoter.py::escape`, which
/// only ever escapes the quote character the value will be wrapped in —
/// it does not touch `&`. Attribute values aren't entity-decoded on parse
/// either (`consume_quoted_parameter_value` reads them verbatim), so
/// escaping `&` here would turn `href="x&y"` into `href="x&amp;y"` and
/// break the parse/serialize/reparse round trip.
fn escape_attribute_value(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// Escapes a text content node for serialization. `&` first, then `<` —
/// a lone `>` is left alone, since nothing in this tokenizer treats it as
/// special outside of a tag scan, so it re-parses unchanged either way.
fn escape_text(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;")
}

/// `<script>`/`<style>` content is never escaped on serialization and is
/// tokenized as one raw span on parse (see `tokenizer::Tokenizer`) — the
/// pair stays in sync so parse(to_html()) round-trips.
fn is_raw_text_tag(name: &str) -> bool {
    name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")
}

/// `<pre>`/`<script>`/`<style>` content keeps its original formatting
/// verbatim under `to_string_pretty` rather than being reindented or
/// having blank text nodes dropped.
fn is_verbatim_pretty_tag(name: &str) -> bool {
    name.eq_ignore_ascii_case("pre") || is_raw_text_tag(name)
}

#[cfg(test)]
mod test {
    use super::*;

    fn leaf(name: &str) -> Tag {
        Tag::new(name, ParameterStore::new(false), false)
    }

    #[test]
    fn find_searches_whole_subtree() {
        let mut root = leaf("div");
        let mut inner = leaf("span");
        inner.push_content(Content::Tag(leaf("b")));
        root.push_content(Content::Tag(inner));

        assert_eq!(root.find(Some("b"), None).len(), 1);
        assert_eq!(root.wfind(Some("b"), None).len(), 0);
        assert_eq!(root.wfind(Some("span"), None).len(), 1);
    }

    #[test]
    fn match_paths_is_exact_path() {
        let mut root = leaf("html");
        let mut body = leaf("body");
        body.push_content(Content::Tag(leaf("p")));
        root.push_content(Content::Tag(body));

        let found = root.match_paths(&[(Some("body"), None), (Some("p"), None)]);
        assert_eq!(found.len(), 1);

        let not_found = root.match_paths(&[(Some("p"), None)]);
        assert!(not_found.is_empty());
    }

    #[test]
    fn integer_index_addresses_tag_children_only() {
        let mut root = leaf("div");
        root.push_content(Content::Text("leading text".into()));
        root.push_content(Content::Tag(leaf("span")));
        root.push_content(Content::Tag(leaf("b")));

        assert_eq!(root[0].name(), "span");
        assert_eq!(root[1].name(), "b");
    }

    #[test]
    fn slice_assignment_appends_prepends_and_inserts() {
        let mut root = leaf("div");
        root.push_content(Content::Tag(leaf("span")));

        root.append_child(Content::Tag(leaf("b")));
        assert_eq!(root[1].name(), "b");

        root.prepend_child(Content::Tag(leaf("i")));
        assert_eq!(root[0].name(), "i");
        assert_eq!(root[1].name(), "span");
        assert_eq!(root[2].name(), "b");

        root.insert_before_tag(2, Content::Tag(leaf("u"))).unwrap();
        let names: Vec<&str> = root.tags().map(|t| t.name()).collect();
        assert_eq!(names, vec!["i", "span", "u", "b"]);

        assert_eq!(
            root.insert_before_tag(99, Content::Tag(leaf("x"))),
            Err(DomError::SliceIndexOutOfRange)
        );
    }

    #[test]
    fn set_tag_replaces_in_place() {
        let mut root = leaf("div");
        root.push_content(Content::Tag(leaf("span")));
        root.push_content(Content::Tag(leaf("b")));

        root.set_tag(0, Content::Text("replaced".into())).unwrap();
        assert_eq!(root.content()[0], Content::Text("replaced".into()));
        assert_eq!(root.tags().count(), 1);

        assert_eq!(
            root.set_tag(5, Content::Text("x".into())),
            Err(DomError::SliceIndexOutOfRange)
        );
    }

    #[test]
    fn shallow_equality_ignores_content() {
        let mut a = leaf("div");
        a.push_content(Content::Text("x".into()));
        let b = leaf("div");
        assert_eq!(a, b);
        assert!(!a.structurally_equal(&b));

        a.content_mut().clear();
        assert!(a.structurally_equal(&b));
    }

    #[test]
    fn double_link_and_remove() {
        let mut root = leaf("div");
        root.push_content(Content::Tag(leaf("span")));
        root.double_link();

        let span_ptr: *const Tag = match &root.content[0] {
            Content::Tag(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(root.parent(), None);

        // Safety: span_ptr is still valid; nothing has reallocated content.
        let span: &mut Tag = unsafe { &mut *(span_ptr as *mut Tag) };
        assert!(span.parent().is_some());
        assert!(span.remove());
        assert!(root.content.is_empty());
    }

    #[test]
    fn content_without_tags_flattens_text() {
        let mut root = leaf("p");
        root.push_content(Content::Text("hello ".into()));
        let mut b = leaf("b");
        b.push_content(Content::Text("world".into()));
        root.push_content(Content::Tag(b));

        assert_eq!(root.content_without_tags(), "hello world");
    }

    #[test]
    fn serializes_bare_and_valued_parameters() {
        let mut params = ParameterStore::new(false);
        params.insert("disabled", "");
        params.insert("class", "x\"y");
        let tag = Tag::new("input", params, true);

        assert_eq!(tag.to_html(), "<input disabled class=\"x&quot;y\" />");
    }

    #[test]
    fn pretty_print_skips_blank_text() {
        let mut root = leaf("div");
        root.push_content(Content::Text("\n  ".into()));
        root.push_content(Content::Tag(leaf("span")));

        assert_eq!(root.to_string_pretty(), "<div>\n  <span>\n  </span>\n</div>\n");
    }

    #[test]
    fn text_content_is_escaped_outside_script_and_style() {
        let mut root = leaf("p");
        root.push_content(Content::Text("a & b < c".into()));
        assert_eq!(root.to_html(), "<p>a &amp; b &lt; c</p>");
    }

    #[test]
    fn script_content_is_left_raw_on_serialization() {
        let mut root = leaf("script");
        root.push_content(Content::Text("if (1 < 2) { x = \"<b>&y\"; }".into()));
        assert_eq!(
            root.to_html(),
            "<script>if (1 < 2) { x = \"<b>&y\"; }</script>"
        );
    }

    #[test]
    fn pretty_print_preserves_pre_verbatim() {
        let mut root = leaf("pre");
        root.push_content(Content::Text("  line one\n  line two  ".into()));
        assert_eq!(
            root.to_string_pretty(),
            "<pre>\n  line one\n  line two  \n</pre>\n"
        );
    }
}
