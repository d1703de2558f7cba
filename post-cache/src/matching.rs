use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use stash_syntax::{MatchingTagRequirement, Query};

/// Post-filter for `matching_tags:` comparisons.
///
/// Counts how many of the query's own positive tag terms a post carries and
/// checks the count against every requirement in the query.
#[derive(Debug)]
pub struct MatchingTagsFilter {
    patterns: Vec<Regex>,
    requirements: Vec<MatchingTagRequirement>,
}

impl MatchingTagsFilter {
    /// `None` when the query has no `matching_tags:` filter.
    pub fn from_query(query: &Query) -> Result<Option<Self>> {
        let requirements = query.matching_tag_requirements();
        if requirements.is_empty() {
            return Ok(None);
        }
        let patterns = query
            .positive_tags()
            .into_iter()
            .map(glob_to_regex)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(Self {
            patterns,
            requirements,
        }))
    }

    /// Number of query tags (wildcards allowed) present in `tags`.
    pub fn matching_count(&self, tags: &[String]) -> i64 {
        self.patterns
            .iter()
            .filter(|pattern| tags.iter().any(|tag| pattern.is_match(tag)))
            .count() as i64
    }

    pub fn keeps(&self, tags: &[String]) -> bool {
        let count = self.matching_count(tags);
        self.requirements
            .iter()
            .all(|requirement| requirement.is_satisfied(count))
    }
}

/// Whole-tag, case-insensitive match where `*` stands for any run of characters.
fn glob_to_regex(glob: &str) -> Result<Regex> {
    let body = glob
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Build tag pattern for {glob:?} failed."))
}
