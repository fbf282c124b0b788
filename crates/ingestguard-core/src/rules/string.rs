use std::collections::HashSet;

use arrow::array::{BooleanArray, StringArray};
use arrow_string::regexp::regexp_is_match_scalar;

use crate::{
    IngestError,
    utils::hasher::{Xxh3Builder, hash_str},
};

/// Flags strings not matching a regex pattern.
pub struct RegexMatch {
    pattern: String,
}

impl RegexMatch {
    pub fn new(pattern: String) -> Self {
        Self { pattern }
    }

    pub fn validate(&self, array: &StringArray) -> Result<BooleanArray, IngestError> {
        let matches = regexp_is_match_scalar(array, self.pattern.as_str(), None)?;
        // null input gives a null match, which is not a violation
        Ok(matches.iter().map(|m| Some(m == Some(false))).collect())
    }
}

/// Flags strings outside a fixed set of members.
pub struct IsInCheck {
    members: HashSet<u64, Xxh3Builder>,
}

impl IsInCheck {
    pub fn new<S: AsRef<str>>(members: &[S]) -> Self {
        let mut hashset = HashSet::with_hasher(Xxh3Builder);
        members.iter().for_each(|m| {
            let _ = hashset.insert(hash_str(m.as_ref()));
        });
        Self { members: hashset }
    }

    pub fn validate(&self, array: &StringArray) -> BooleanArray {
        array
            .iter()
            .map(|v| Some(v.is_some_and(|s| !self.members.contains(&hash_str(s)))))
            .collect()
    }
}
