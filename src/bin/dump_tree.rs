//! Reads an HTML file given on the command line (or `./demo.html` if none
//! is given) and prints the parsed tree, pretty-printed.
//!
//! Grounded in `wp-html-api/src/main.rs`'s read-file-and-drive-the-parser
//! demo shape.

use std::env;
use std::fs;

fn main() {
    let path = env::args().nth(1).unwrap_or_else(|| "./demo.html".to_string());
    let html = fs::read_to_string(&path).expect("could not read input file");

    let tree = loose_html::parse(&html);
    println!("{}", tree.to_string_pretty());

    // depth_first() yields the receiver first, so a non-root tree's own tag
    // is already included; a synthetic root isn't itself a tag, so subtract
    // it back out in that case.
    let tag_count = tree.depth_first().count() - if tree.is_root() { 1 } else { 0 };
    println!("Found {tag_count} tags!");
}
