//! Transactional operations on ordered sibling sets.
//!
//! Every write takes the parent row lock first, so reorders, appends,
//! deletions and moves under the same parent run one after another and
//! positions stay dense (`1..N`) at every commit.

use lms_core::ordering::{ReorderPlan, compaction_plan, next_position};
use lms_db::repositories::ordering::{self as repo, SiblingSet};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{error::ApiError, metrics};

/// Body of every `PUT .../order` route: the complete sibling set in its new order.
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRequest {
    #[validate(length(min = 1, message = "ordered_ids cannot be empty"))]
    pub ordered_ids: Vec<Uuid>,
}

/// Reorder all children of `parent_id` to match `ordered_ids`.
///
/// Runs both renumbering phases in one transaction: either every sibling
/// ends up at its index in `ordered_ids` (1-based) or nothing changes.
pub async fn reorder<S: SiblingSet>(
    pool: &PgPool,
    parent_id: Uuid,
    ordered_ids: &[Uuid],
) -> Result<(), ApiError> {
    let result = reorder_in_transaction::<S>(pool, parent_id, ordered_ids).await;
    metrics::record_ordering_operation(S::ITEM_LABEL, "reorder", result.is_ok());

    match &result {
        Ok(()) => tracing::info!(
            parent_id = %parent_id,
            items = ordered_ids.len(),
            entity = S::ITEM_LABEL,
            "siblings reordered"
        ),
        Err(err) => tracing::warn!(
            parent_id = %parent_id,
            entity = S::ITEM_LABEL,
            error = %err,
            "reorder rejected"
        ),
    }

    result
}

async fn reorder_in_transaction<S: SiblingSet>(
    pool: &PgPool,
    parent_id: Uuid,
    ordered_ids: &[Uuid],
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    lock_parent::<S>(&mut tx, parent_id).await?;

    let current = repo::list_siblings::<S>(&mut tx, parent_id).await?;
    let plan = ReorderPlan::new(&current, ordered_ids)?;

    repo::assign_positions::<S>(&mut tx, parent_id, &plan.temporary_positions()).await?;
    repo::assign_positions::<S>(&mut tx, parent_id, &plan.final_positions()).await?;

    tx.commit().await?;
    Ok(())
}

/// Lock `parent_id` or fail with a not-found error naming the parent.
pub async fn lock_parent<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
) -> Result<(), ApiError> {
    if repo::lock_parent::<S>(conn, parent_id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found(capitalized(S::PARENT_LABEL).as_str()))
    }
}

/// Lock the parent of `item_id` and return the parent id.
///
/// The parent is read again once locked; if the item moved in between the
/// caller gets a conflict and can retry.
pub async fn lock_parent_of<S: SiblingSet>(
    conn: &mut PgConnection,
    item_id: Uuid,
) -> Result<Uuid, ApiError> {
    let not_found = || ApiError::not_found(capitalized(S::ITEM_LABEL).as_str());

    let parent_id = repo::find_parent::<S>(conn, item_id)
        .await?
        .ok_or_else(not_found)?;

    lock_parent::<S>(conn, parent_id).await?;

    match repo::find_parent::<S>(conn, item_id).await? {
        Some(locked) if locked == parent_id => Ok(parent_id),
        Some(_) => Err(ApiError::Conflict(format!(
            "{} was moved concurrently, retry the request",
            S::ITEM_LABEL
        ))),
        None => Err(not_found()),
    }
}

/// Position for a new last child. The parent must already be locked.
pub async fn append_position<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
) -> Result<i32, ApiError> {
    let max = repo::max_position::<S>(conn, parent_id).await?;
    Ok(next_position(max))
}

/// Close the gap left by a removed child. The parent must already be locked.
///
/// Returns how many siblings were renumbered.
pub async fn compact<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
) -> Result<usize, ApiError> {
    let remaining = repo::list_siblings::<S>(conn, parent_id).await?;
    let writes = compaction_plan(&remaining)?;

    repo::assign_positions_in_order::<S>(conn, parent_id, &writes).await?;

    tracing::debug!(
        parent_id = %parent_id,
        entity = S::ITEM_LABEL,
        renumbered = writes.len(),
        "siblings compacted"
    );
    Ok(writes.len())
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_request_requires_ids() {
        let empty: ReorderRequest =
            serde_json::from_value(serde_json::json!({ "ordered_ids": [] })).unwrap();
        assert!(empty.validate().is_err());

        let one: ReorderRequest =
            serde_json::from_value(serde_json::json!({ "ordered_ids": [Uuid::new_v4()] }))
                .unwrap();
        assert!(one.validate().is_ok());
    }

    #[test]
    fn test_capitalized() {
        assert_eq!(capitalized("module"), "Module");
        assert_eq!(capitalized("series"), "Series");
        assert_eq!(capitalized(""), "");
    }
}
