use std::collections::HashSet;

/// Remove duplicate group names, keeping the first occurrence of each.
pub fn dedupe_groups<I, S>(groups: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    groups
        .into_iter()
        .map(Into::into)
        .filter(|group| seen.insert(group.clone()))
        .collect()
}
