// End-to-end parse tests covering the documented recovery scenarios and
// the structural invariants every parse must satisfy.

use loose_html::{parse, Content};

#[test]
fn casing_is_preserved_but_matched_case_insensitively_by_default() {
    let tree = parse("<HTML><Tag PARAM=\"true\"></HTML>");
    assert_eq!(tree.name(), "HTML");
    let tag = tree.find(Some("tag"), None).into_iter().next().unwrap();
    assert_eq!(tag.name(), "Tag");
    assert_eq!(tag.params().get("param"), Some("true"));
}

#[test]
fn void_chain_reshapes_into_siblings() {
    let tree = parse("<div><br><img><hr></div>");
    let children: Vec<&str> = tree.tags().map(|t| t.name()).collect();
    assert_eq!(children, vec!["br", "img", "hr"]);
}

#[test]
fn malformed_attribute_does_not_swallow_following_markup() {
    let tree = parse("<invalid tag=something\">notice this</invalid><ok>tail</ok>");
    assert!(tree.is_root());
    let invalid = tree.wfind(Some("invalid"), None).into_iter().next().unwrap();
    assert_eq!(invalid.params().get("tag"), Some("something"));
    assert_eq!(invalid.content_without_tags(), "notice this");
    let ok = tree.wfind(Some("ok"), None).into_iter().next().unwrap();
    assert_eq!(ok.content_without_tags(), "tail");
}

#[test]
fn unterminated_tag_becomes_text_and_parsing_resumes() {
    // code is never properly closed (the malformed "</code\n" becomes
    // literal text), so at EOF it gets force-closed empty and its
    // would-be content is promoted to be its siblings under a synthetic
    // root, instead of nesting the rest of the document inside it.
    let tree = parse("<code>Bla</code\n<!-- note -->after");
    assert!(tree.is_root());
    assert_eq!(tree.content().len(), 4);
    let code = match &tree.content()[0] {
        Content::Tag(t) => t,
        _ => panic!("expected tag"),
    };
    assert_eq!(code.name(), "code");
    assert!(code.is_non_pair());
    assert!(code.content().is_empty());
    assert!(matches!(&tree.content()[1], Content::Text(t) if t == "Bla</code\n"));
    assert!(matches!(&tree.content()[2], Content::Comment(c) if c.content == " note "));
    assert!(matches!(&tree.content()[3], Content::Text(t) if t == "after"));
}

#[test]
fn overlong_entity_scan_demotes_to_literal_text() {
    let tree = parse("<p>aaaa&a a;</p>");
    assert_eq!(tree.content_without_tags(), "aaaa&a a;");
}

#[test]
fn known_entity_decodes_unknown_entity_stays_literal() {
    let tree = parse("<p>&amp;<b>x</b>&lt;&nope;</p>");
    assert_eq!(tree.content_without_tags(), "&x<&nope;");
}

#[test]
fn embedded_newline_inside_quoted_attribute_value() {
    let tree = parse("<ubertag attribute=\"long attribute\n continues here\">x</ubertag>");
    assert_eq!(
        tree.params().get("attribute"),
        Some("long attribute\n continues here")
    );
}

#[test]
fn parse_always_returns_a_usable_root_even_for_garbage_input() {
    for input in ["", "<", ">", "</>", "<<<<", "&&&&;;;;"] {
        let tree = parse(input);
        for item in tree.content() {
            assert!(matches!(
                item,
                Content::Tag(_) | Content::Text(_) | Content::Comment(_)
            ));
        }
    }
}

#[test]
fn every_non_root_node_has_exactly_one_parent() {
    let tree = parse("<div><p>a</p><p>b<span>c</span></p></div>");
    for node in tree.depth_first().skip(1) {
        assert!(node.parent().is_some());
    }
}

#[test]
fn round_trip_through_serialization_is_structurally_stable() {
    let original = parse("<div class=\"a\" id=\"x\"><p>hi <b>there</b></p></div>");
    let reparsed = parse(&original.to_html());
    assert!(original.structurally_equal(&reparsed));
}

#[test]
fn depth_first_and_breadth_first_visit_every_descendant_exactly_once() {
    let tree = parse("<div><p>a</p><p>b<span>c</span></p></div>");
    let df_count = tree.depth_first().count();
    let bf_count = tree.breadth_first().count();
    assert_eq!(df_count, bf_count);
    assert_eq!(df_count, 4); // div itself, plus the two <p> tags, plus the nested <span>
}

#[test]
fn script_body_survives_parsing_and_serialization_raw() {
    let source = "<div><script>if (a < b) { alert(\"<div>\"); }</script></div>";
    let tree = parse(source);
    let script = tree.wfind(Some("script"), None).into_iter().next().unwrap();
    assert_eq!(
        script.content_without_tags(),
        "if (a < b) { alert(\"<div>\"); }"
    );
    assert_eq!(tree.to_html(), source);
}

#[test]
fn find_filters_by_name_and_parameter_subset() {
    let mut wanted = loose_html::ParameterStore::new(false);
    wanted.insert("class", "a");
    let tree = parse("<div><p class=\"a\">x</p><p class=\"b\">y</p></div>");
    let found = tree.find(Some("p"), Some(&wanted));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content_without_tags(), "x");
}
