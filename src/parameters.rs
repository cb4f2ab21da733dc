//! An ordered `String` → `String` mapping with an optional case-insensitive
//! lookup mode.
//!
//! Grounded in `original_source/src/dhtmlparser3/specialdict.py`: lookups,
//! containment, and deletion fold the key to lowercase, but the originally
//! inserted casing is what's stored and what's replayed on iteration and
//! serialization. A side index (`case_index`) maps the lowercased key to
//! its position in the ordered backing `Vec`, the same shape as
//! `SpecialDict._case_mapping`. The index uses `rustc_hash::FxHashMap`
//! rather than the SipHash-keyed standard map: keys are short attribute
//! names, not attacker-controlled input, so the faster non-DoS-resistant
//! hash the teacher crate depends on for exactly this tradeoff is the
//! right fit here too.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    entries: Vec<(String, String)>,
    case_index: FxHashMap<String, usize>,
    case_sensitive: bool,
}

impl ParameterStore {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            entries: Vec::new(),
            case_index: FxHashMap::default(),
            case_sensitive,
        }
    }

    fn fold(&self, key: &str) -> String {
        if self.case_sensitive {
            key.to_string()
        } else {
            key.to_lowercase()
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts or replaces `key`. Re-assigning an existing key under
    /// different casing replaces both the value and the remembered casing,
    /// in place, matching `SpecialDict.__setitem__`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let folded = self.fold(&key);

        if let Some(&idx) = self.case_index.get(&folded) {
            self.entries[idx] = (key, value.into());
            return;
        }

        self.case_index.insert(folded, self.entries.len());
        self.entries.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let folded = self.fold(key);
        self.case_index
            .get(&folded)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.case_index.contains_key(&self.fold(key))
    }

    /// Removes `key`, shifting every later entry's recorded index down by
    /// one so the side index stays consistent.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let folded = self.fold(key);
        let idx = self.case_index.remove(&folded)?;
        let (_, value) = self.entries.remove(idx);

        for stored_idx in self.case_index.values_mut() {
            if *stored_idx > idx {
                *stored_idx -= 1;
            }
        }

        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.case_index.clear();
    }

    /// Iterates in insertion order, yielding the originally-inserted casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True iff `self` contains every key in `subset` with an equal value.
    /// `subset`'s own case-sensitivity setting is irrelevant; lookups always
    /// go through `self`'s fold rule.
    pub fn contains_subset(&self, subset: &ParameterStore) -> bool {
        subset
            .iter()
            .all(|(k, v)| self.get(k).is_some_and(|existing| existing == v))
    }
}

impl PartialEq for ParameterStore {
    /// Order-independent: compares the same key/value pairs regardless of
    /// insertion order, matching `SpecialDict.__eq__`.
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }

        self.iter()
            .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}
