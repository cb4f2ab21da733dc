//! Named and numeric character-reference decoding.
//!
//! Grounded in `original_source/src/dhtmlparser3/tokens.py::EntityToken`: a
//! small fixed table of named entities plus `&#NNN;` / `&#xHH;` numeric
//! decoding. The teacher crate's `entities` sub-crate covers the full
//! WHATWG table via codegen (`phf`); this crate only needs the handful of
//! entities the spec names, so a `match` is the idiomatic-sized tool here
//! rather than pulling in a code-generated lookup table for thirteen
//! strings.

/// Looks up `name` (without the leading `&` or trailing `;`) in the named
/// entity table. `name` is expected to already be lowercased by the caller:
/// `EntityToken.__init__` in the grounded source lowercases the whole span
/// before matching, so `&AMP;`/`&COPY;` decode there too.
fn named(name: &str) -> Option<&'static str> {
    Some(match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "nbsp" | "nonbreakingspace" => "\u{a0}",
        "quot" => "\"",
        "apos" => "'",
        "cent" => "¢",
        "pound" => "£",
        "yen" => "¥",
        "euro" => "€",
        "copy" => "©",
        "reg" => "®",
        _ => return None,
    })
}

/// Decodes a syntactically well-formed entity span, e.g. `"&amp;"` or
/// `"&#169;"` or `"&#xA9;"`. Returns `None` only if the span looks like an
/// entity but isn't decodable as one; the tokenizer otherwise guarantees
/// the span is well-formed (`&...;`) before calling this.
pub fn decode(span: &str) -> Option<String> {
    let inner = span.strip_prefix('&')?.strip_suffix(';')?;

    if let Some(hex) = inner.strip_prefix("#x").or_else(|| inner.strip_prefix("#X")) {
        let code = u32::from_str_radix(hex, 16).ok()?;
        return char::from_u32(code).map(|c| c.to_string());
    }

    if let Some(dec) = inner.strip_prefix('#') {
        let code: u32 = dec.parse().ok()?;
        return char::from_u32(code).map(|c| c.to_string());
    }

    named(&inner.to_ascii_lowercase()).map(str::to_string)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn named_entities() {
        assert_eq!(decode("&amp;").as_deref(), Some("&"));
        assert_eq!(decode("&nbsp;").as_deref(), Some("\u{a0}"));
        assert_eq!(decode("&nonbreakingspace;").as_deref(), Some("\u{a0}"));
    }

    #[test]
    fn numeric_entities() {
        assert_eq!(decode("&#169;").as_deref(), Some("©"));
        assert_eq!(decode("&#xA9;").as_deref(), Some("©"));
        assert_eq!(decode("&#x41;").as_deref(), Some("A"));
    }

    #[test]
    fn unknown_entity_round_trips_to_none() {
        assert_eq!(decode("&foo;"), None);
    }

    #[test]
    fn named_entities_fold_case() {
        assert_eq!(decode("&AMP;").as_deref(), Some("&"));
        assert_eq!(decode("&Copy;").as_deref(), Some("©"));
    }
}
