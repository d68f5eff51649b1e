// menusync-common/src/model/whitelist.rs
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::ident::validate_launcher_id;

/// Ordered set of launcher identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist(Vec<String>);

impl Whitelist {
    /// Builds a whitelist, validating every identifier and dropping repeats
    /// after their first occurrence.
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in ids {
            let id = id.into();
            validate_launcher_id(&id)?;
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
        Ok(Self(out))
    }

    /// Parses list input: one identifier per line, blank and `#` lines ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::new(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|x| x == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One identifier per line, newline terminated.
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for id in &self.0 {
            out.push_str(id);
            out.push('\n');
        }
        out
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Whitelist {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
