//! Tag resolution and post-count bookkeeping.
//!
//! Every caller that changes a post's tag set routes the change through
//! here; nothing else may adjust a tag's `post_count`. Counts are applied
//! as per-tag atomic deltas at the store, so concurrent edits to different
//! posts sharing a tag cannot lose an update.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::Tag;
use crate::error::{DomainError, RepoError};
use crate::ports::TagRepository;

#[derive(Clone)]
pub struct TagLedger {
    tags: Arc<dyn TagRepository>,
}

impl TagLedger {
    pub fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self { tags }
    }

    /// Resolve free-text tag names to canonical tags, creating missing ones
    /// lazily with `post_count = 0`.
    ///
    /// Names are trimmed and lower-cased; empties are dropped and duplicates
    /// collapse to their first occurrence.
    pub async fn resolve(&self, names: &[String]) -> Result<Vec<Tag>, DomainError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for raw in names {
            let name = raw.trim().to_lowercase();
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }

            let tag = match self.tags.find_by_name(&name).await? {
                Some(tag) => tag,
                None => match self.tags.insert(Tag::new(name.clone())).await {
                    Ok(tag) => tag,
                    // Lost an insert race: another request created the tag
                    // between our lookup and insert. Re-read it.
                    Err(RepoError::Constraint(_)) => {
                        self.tags.find_by_name(&name).await?.ok_or_else(|| {
                            RepoError::Query(format!("tag '{name}' missing after unique hit"))
                        })?
                    }
                    Err(e) => return Err(e.into()),
                },
            };
            resolved.push(tag);
        }

        Ok(resolved)
    }

    /// Apply the membership delta between a post's old and new tag sets:
    /// -1 for every tag that left, +1 for every tag that entered. Tags in
    /// both sets are untouched.
    pub async fn apply_membership_change(
        &self,
        old: &[Uuid],
        new: &[Uuid],
    ) -> Result<(), DomainError> {
        let old_set: HashSet<Uuid> = old.iter().copied().collect();
        let new_set: HashSet<Uuid> = new.iter().copied().collect();

        for id in old_set.difference(&new_set) {
            self.tags.adjust_post_count(*id, -1).await?;
        }
        for id in new_set.difference(&old_set) {
            self.tags.adjust_post_count(*id, 1).await?;
        }

        Ok(())
    }

    /// Drop a deleted post's contribution to every tag it referenced.
    pub async fn release_all(&self, tags: &[Uuid]) -> Result<(), DomainError> {
        self.apply_membership_change(tags, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::support::MemoryTags;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn resolve_creates_missing_tags_with_zero_count() {
        let tags = Arc::new(MemoryTags::default());
        let ledger = TagLedger::new(tags.clone());

        let resolved = ledger.resolve(&names(&["Rust", "async"])).await.unwrap();

        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|t| t.post_count == 0));
        assert_eq!(tags.count_for("rust"), Some(0));
        assert_eq!(tags.count_for("async"), Some(0));
    }

    #[tokio::test]
    async fn resolve_reuses_existing_tags_and_drops_empties() {
        let tags = Arc::new(MemoryTags::default());
        let ledger = TagLedger::new(tags.clone());

        let first = ledger.resolve(&names(&["rust"])).await.unwrap();
        let second = ledger
            .resolve(&names(&["  rust  ", "", "   "]))
            .await
            .unwrap();

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(tags.tag_total(), 1);
    }

    #[tokio::test]
    async fn membership_change_skips_tags_present_in_both_sets() {
        let tags = Arc::new(MemoryTags::default());
        let ledger = TagLedger::new(tags.clone());
        let resolved = ledger.resolve(&names(&["a", "b", "c"])).await.unwrap();
        let (a, b, c) = (resolved[0].id, resolved[1].id, resolved[2].id);

        ledger.apply_membership_change(&[], &[a, b]).await.unwrap();
        ledger.apply_membership_change(&[a, b], &[b, c]).await.unwrap();

        assert_eq!(tags.count_for("a"), Some(0));
        assert_eq!(tags.count_for("b"), Some(1));
        assert_eq!(tags.count_for("c"), Some(1));
    }

    #[tokio::test]
    async fn release_all_decrements_every_referenced_tag() {
        let tags = Arc::new(MemoryTags::default());
        let ledger = TagLedger::new(tags.clone());
        let resolved = ledger.resolve(&names(&["x", "y"])).await.unwrap();
        let ids: Vec<Uuid> = resolved.iter().map(|t| t.id).collect();

        ledger.apply_membership_change(&[], &ids).await.unwrap();
        ledger.release_all(&ids).await.unwrap();

        assert_eq!(tags.count_for("x"), Some(0));
        assert_eq!(tags.count_for("y"), Some(0));
    }
}
