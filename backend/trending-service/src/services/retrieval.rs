use crate::error::Result;
use crate::models::{Status, StatusId};
use crate::repository::ContentRepository;
use std::collections::HashMap;
use tracing::debug;

/// Fetch statuses for `ids` in one bulk call and return them in `ids` order.
///
/// Ids that no longer resolve are dropped without shifting the rest. An
/// empty input returns immediately without touching the repository.
pub async fn fetch_in_order(
    repository: &dyn ContentRepository,
    ids: &[StatusId],
) -> Result<Vec<Status>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_id: HashMap<StatusId, Status> = repository
        .find_statuses(ids)
        .await?
        .into_iter()
        .map(|status| (status.id, status))
        .collect();

    let ordered: Vec<Status> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

    if ordered.len() < ids.len() {
        debug!(
            requested = ids.len(),
            resolved = ordered.len(),
            "Dropped unresolvable statuses from ordered fetch"
        );
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Visibility};
    use crate::repository::MemoryContentRepository;
    use chrono::Utc;

    fn status(id: StatusId) -> Status {
        Status {
            id,
            account: Account {
                id: 1,
                username: "finn".to_string(),
                discoverable: true,
                silenced: false,
                requested_review_at: None,
            },
            created_at: Utc::now(),
            visibility: Visibility::Public,
            spoiler_text: String::new(),
            sensitive: false,
            in_reply_to_id: None,
            reblogs_count: 0,
            favourites_count: 0,
            trendable: true,
            reblog: None,
        }
    }

    fn repository(ids: &[StatusId]) -> MemoryContentRepository {
        let repo = MemoryContentRepository::new();
        for id in ids {
            repo.insert(status(*id));
        }
        repo
    }

    #[tokio::test]
    async fn test_preserves_input_order() {
        let repo = repository(&[1, 2, 3, 4]);
        let statuses = fetch_in_order(&repo, &[3, 1, 4, 2]).await.unwrap();
        let ids: Vec<StatusId> = statuses.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2]);
        assert_eq!(repo.bulk_fetches(), 1);
    }

    #[tokio::test]
    async fn test_drops_missing_without_shifting() {
        let repo = repository(&[1, 3, 5]);
        let statuses = fetch_in_order(&repo, &[5, 2, 3, 4, 1]).await.unwrap();
        let ids: Vec<StatusId> = statuses.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 3, 1]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_fetch() {
        let repo = repository(&[1]);
        let statuses = fetch_in_order(&repo, &[]).await.unwrap();
        assert!(statuses.is_empty());
        assert_eq!(repo.bulk_fetches(), 0);
    }
}
