//! Position bookkeeping shared by every ordered sibling set.
//!
//! Table and column names come from [`SiblingSet`] constants, never from
//! request data, so formatting them into SQL is safe.

use lms_core::ordering::Sibling;
use sqlx::PgConnection;
use uuid::Uuid;

/// A table whose rows carry a dense 1-based position unique per parent.
pub trait SiblingSet {
    /// Table holding the ordered items
    const ITEM_TABLE: &'static str;
    /// Table holding the parents
    const PARENT_TABLE: &'static str;
    /// Column of `ITEM_TABLE` referencing the parent
    const PARENT_COLUMN: &'static str;
    /// Column of `ITEM_TABLE` holding the position
    const POSITION_COLUMN: &'static str;
    /// Human readable item name, used in logs, metrics and errors
    const ITEM_LABEL: &'static str;
    /// Human readable parent name
    const PARENT_LABEL: &'static str;
}

/// Modules within a course
#[derive(Debug, Clone, Copy)]
pub struct CourseModules;

impl SiblingSet for CourseModules {
    const ITEM_TABLE: &'static str = "modules";
    const PARENT_TABLE: &'static str = "courses";
    const PARENT_COLUMN: &'static str = "course_id";
    const POSITION_COLUMN: &'static str = "sort_order";
    const ITEM_LABEL: &'static str = "module";
    const PARENT_LABEL: &'static str = "course";
}

/// Lessons within a module
#[derive(Debug, Clone, Copy)]
pub struct ModuleLessons;

impl SiblingSet for ModuleLessons {
    const ITEM_TABLE: &'static str = "lessons";
    const PARENT_TABLE: &'static str = "modules";
    const PARENT_COLUMN: &'static str = "module_id";
    const POSITION_COLUMN: &'static str = "sort_order";
    const ITEM_LABEL: &'static str = "lesson";
    const PARENT_LABEL: &'static str = "module";
}

/// Courses within a series
#[derive(Debug, Clone, Copy)]
pub struct SeriesCourses;

impl SiblingSet for SeriesCourses {
    const ITEM_TABLE: &'static str = "courses";
    const PARENT_TABLE: &'static str = "course_series";
    const PARENT_COLUMN: &'static str = "series_id";
    const POSITION_COLUMN: &'static str = "series_position";
    const ITEM_LABEL: &'static str = "course";
    const PARENT_LABEL: &'static str = "series";
}

/// Lock the parent row for the rest of the transaction.
///
/// Every write to a sibling set takes this lock first, which serializes
/// concurrent reorders, appends and deletions under the same parent.
/// Returns `false` when the parent does not exist.
pub async fn lock_parent<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "SELECT id FROM {} WHERE id = $1 FOR UPDATE",
        S::PARENT_TABLE
    );

    let locked: Option<Uuid> = sqlx::query_scalar(&sql)
        .bind(parent_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(locked.is_some())
}

/// Parent of an item, if the item exists and has one.
pub async fn find_parent<S: SiblingSet>(
    conn: &mut PgConnection,
    item_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1",
        S::PARENT_COLUMN,
        S::ITEM_TABLE
    );

    let parent: Option<Option<Uuid>> = sqlx::query_scalar(&sql)
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(parent.flatten())
}

/// Current siblings sorted by ascending position.
pub async fn list_siblings<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
) -> Result<Vec<Sibling>, sqlx::Error> {
    let sql = format!(
        "SELECT id, {pos} FROM {table} WHERE {parent} = $1 ORDER BY {pos} ASC",
        pos = S::POSITION_COLUMN,
        table = S::ITEM_TABLE,
        parent = S::PARENT_COLUMN,
    );

    let rows: Vec<(Uuid, i32)> = sqlx::query_as(&sql)
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Sibling::from).collect())
}

pub async fn max_position<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
) -> Result<Option<i32>, sqlx::Error> {
    let sql = format!(
        "SELECT MAX({}) FROM {} WHERE {} = $1",
        S::POSITION_COLUMN,
        S::ITEM_TABLE,
        S::PARENT_COLUMN
    );

    sqlx::query_scalar(&sql)
        .bind(parent_id)
        .fetch_one(&mut *conn)
        .await
}

/// Write a batch of positions in one statement.
///
/// The rows of a single `UPDATE` are written in no particular order, so the
/// batch must be collision free in any order (see `ReorderPlan`).
pub async fn assign_positions<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
    positions: &[(Uuid, i32)],
) -> Result<u64, sqlx::Error> {
    let (ids, values): (Vec<Uuid>, Vec<i32>) = positions.iter().copied().unzip();

    let sql = format!(
        r#"
            UPDATE {table} AS t
            SET {pos} = v.position
            FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, position)
            WHERE t.id = v.id AND t.{parent} = $3
        "#,
        table = S::ITEM_TABLE,
        pos = S::POSITION_COLUMN,
        parent = S::PARENT_COLUMN,
    );

    let result = sqlx::query(&sql)
        .bind(ids)
        .bind(values)
        .bind(parent_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Write positions one row at a time, in the given order.
pub async fn assign_positions_in_order<S: SiblingSet>(
    conn: &mut PgConnection,
    parent_id: Uuid,
    positions: &[(Uuid, i32)],
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET {} = $1 WHERE id = $2 AND {} = $3",
        S::ITEM_TABLE,
        S::POSITION_COLUMN,
        S::PARENT_COLUMN
    );

    for (id, position) in positions {
        sqlx::query(&sql)
            .bind(position)
            .bind(id)
            .bind(parent_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
