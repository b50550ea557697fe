//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;
    use proptest::sample::subsequence;

    use crate::core::job::BuildJob;

    /// Generate a valid project name (lowercase alphanumeric with hyphens)
    pub fn project_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,14}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate a job set with unique names and arbitrary "build after" edges
    ///
    /// Edges may form cycles and may name projects outside the set.
    pub fn dependency_graph(max_jobs: usize) -> impl Strategy<Value = Vec<BuildJob>> {
        proptest::collection::hash_set(project_name(), 0..=max_jobs)
            .prop_flat_map(|names| {
                let mut names: Vec<String> = names.into_iter().collect();
                names.sort();
                let mut candidates = names.clone();
                candidates.push("outside-scope".to_string());
                let len = names.len();
                let edges = proptest::collection::vec(
                    subsequence(candidates.clone(), 0..=candidates.len().min(3)),
                    len,
                );
                (Just(names), edges)
            })
            .prop_map(|(names, edges)| {
                names
                    .into_iter()
                    .zip(edges)
                    .map(|(name, after)| {
                        BuildJob::new(name.clone(), format!("/eco/{name}"), vec!["true".into()])
                            .with_after(after)
                    })
                    .collect()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(crate::config::defaults::MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_project_name_generator(name in project_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_dependency_graph_names_unique(jobs in dependency_graph(8)) {
            let names: HashSet<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
            prop_assert_eq!(names.len(), jobs.len());
            prop_assert!(jobs.len() <= 8);
        }
    }
}
