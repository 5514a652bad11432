//! Prerequisite edges and typed course relations.

use lms_core::graph::Edge;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{CourseRelation, Prerequisite, RelationType};

pub async fn list_prerequisites<'e, E>(
    executor: E,
    course_id: Uuid,
) -> Result<Vec<Prerequisite>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT cp.course_id, cp.prerequisite_course_id, c.title, c.slug, cp.created_at
            FROM course_prerequisites cp
            JOIN courses c ON c.id = cp.prerequisite_course_id
            WHERE cp.course_id = $1
            ORDER BY cp.created_at ASC, c.title ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// Serialize prerequisite writes for the rest of the transaction.
///
/// Cycle detection reads the graph and then inserts; two concurrent inserts
/// could each pass the check and together close a cycle.
pub async fn lock_prerequisite_graph<'e, E>(executor: E) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            SELECT pg_advisory_xact_lock(hashtext('course_prerequisites'))
        "#,
    )
    .execute(executor)
    .await?;

    Ok(())
}

/// Every prerequisite edge reachable from `start` by following
/// "requires" links (`course_id -> prerequisite_course_id`).
pub async fn reachable_prerequisite_edges<'e, E>(
    executor: E,
    start: Uuid,
) -> Result<Vec<Edge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
        // language=PostgreSQL
        r#"
            WITH RECURSIVE reachable(course_id, prerequisite_course_id) AS (
                SELECT course_id, prerequisite_course_id
                FROM course_prerequisites
                WHERE course_id = $1
                UNION
                SELECT cp.course_id, cp.prerequisite_course_id
                FROM course_prerequisites cp
                JOIN reachable r ON cp.course_id = r.prerequisite_course_id
            )
            SELECT course_id, prerequisite_course_id FROM reachable
        "#,
    )
    .bind(start)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Edge::from).collect())
}

pub async fn insert_prerequisite<'e, E>(
    executor: E,
    course_id: Uuid,
    prerequisite_course_id: Uuid,
) -> Result<Prerequisite, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            WITH inserted AS (
                INSERT INTO course_prerequisites (course_id, prerequisite_course_id)
                VALUES ($1, $2)
                RETURNING course_id, prerequisite_course_id, created_at
            )
            SELECT i.course_id, i.prerequisite_course_id, c.title, c.slug, i.created_at
            FROM inserted i
            JOIN courses c ON c.id = i.prerequisite_course_id
        "#,
    )
    .bind(course_id)
    .bind(prerequisite_course_id)
    .fetch_one(executor)
    .await
}

pub async fn delete_prerequisite<'e, E>(
    executor: E,
    course_id: Uuid,
    prerequisite_course_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM course_prerequisites
            WHERE course_id = $1 AND prerequisite_course_id = $2
        "#,
    )
    .bind(course_id)
    .bind(prerequisite_course_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_relations<'e, E>(
    executor: E,
    course_id: Uuid,
) -> Result<Vec<CourseRelation>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT r.id, r.source_course_id, r.target_course_id, r.relation_type,
                   c.title AS target_title, r.created_at
            FROM course_relations r
            JOIN courses c ON c.id = r.target_course_id
            WHERE r.source_course_id = $1
            ORDER BY r.created_at ASC, r.id
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_relation<'e, E>(
    executor: E,
    source_course_id: Uuid,
    target_course_id: Uuid,
    relation_type: RelationType,
) -> Result<CourseRelation, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            WITH inserted AS (
                INSERT INTO course_relations (source_course_id, target_course_id, relation_type)
                VALUES ($1, $2, $3)
                RETURNING id, source_course_id, target_course_id, relation_type, created_at
            )
            SELECT i.id, i.source_course_id, i.target_course_id, i.relation_type,
                   c.title AS target_title, i.created_at
            FROM inserted i
            JOIN courses c ON c.id = i.target_course_id
        "#,
    )
    .bind(source_course_id)
    .bind(target_course_id)
    .bind(relation_type)
    .fetch_one(executor)
    .await
}

pub async fn delete_relation<'e, E>(executor: E, relation_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM course_relations WHERE id = $1
        "#,
    )
    .bind(relation_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
