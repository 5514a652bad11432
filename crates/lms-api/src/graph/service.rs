//! Guarded creation of prerequisite and relation edges.

use lms_core::graph::{Edge, GraphError, check_acyclic, check_new_edge, check_self_reference};
use lms_db::{
    models::{CourseRelation, Prerequisite, RelationType},
    repositories::{course as course_repo, graph as graph_repo},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::ApiError, metrics};

/// Count and log a refused edge, then turn it into the client error.
fn rejected(kind: &'static str, err: GraphError) -> ApiError {
    let reason = match err {
        GraphError::SelfReference => "self_reference",
        GraphError::Duplicate => "duplicate",
        GraphError::Cycle { .. } => "cycle",
    };

    metrics::record_graph_rejection(kind, reason);
    tracing::info!(kind, reason, error = %err, "edge rejected");
    err.into()
}

/// Make `prerequisite_course_id` a prerequisite of `course_id`.
///
/// Refuses self-references, existing edges and any edge that would let a
/// course (transitively) require itself. The graph is read and written
/// under one advisory lock so concurrent inserts cannot close a cycle
/// between them.
pub async fn add_prerequisite(
    pool: &PgPool,
    course_id: Uuid,
    prerequisite_course_id: Uuid,
) -> Result<Prerequisite, ApiError> {
    let candidate = Edge::new(course_id, prerequisite_course_id);
    check_self_reference(candidate.source, candidate.target)
        .map_err(|err| rejected("prerequisite", err))?;

    let mut tx = pool.begin().await?;
    graph_repo::lock_prerequisite_graph(&mut *tx).await?;

    if !course_repo::exists(&mut *tx, course_id).await? {
        return Err(ApiError::not_found("Course"));
    }
    if !course_repo::exists(&mut *tx, prerequisite_course_id).await? {
        return Err(ApiError::not_found("Prerequisite course"));
    }

    let direct: Vec<Edge> = graph_repo::list_prerequisites(&mut *tx, course_id)
        .await?
        .into_iter()
        .map(|p| Edge::new(p.course_id, p.prerequisite_course_id))
        .collect();
    check_new_edge(&direct, candidate).map_err(|err| rejected("prerequisite", err))?;

    let reachable =
        graph_repo::reachable_prerequisite_edges(&mut *tx, prerequisite_course_id).await?;
    check_acyclic(&reachable, candidate).map_err(|err| rejected("prerequisite", err))?;

    let prerequisite =
        graph_repo::insert_prerequisite(&mut *tx, course_id, prerequisite_course_id).await?;
    tx.commit().await?;

    tracing::info!(
        course_id = %course_id,
        prerequisite_course_id = %prerequisite_course_id,
        "prerequisite added"
    );
    Ok(prerequisite)
}

/// Add a typed navigational link. Relations may form cycles.
pub async fn add_relation(
    pool: &PgPool,
    source_course_id: Uuid,
    target_course_id: Uuid,
    relation_type: RelationType,
) -> Result<CourseRelation, ApiError> {
    let candidate = Edge::new(source_course_id, target_course_id);
    check_self_reference(candidate.source, candidate.target)
        .map_err(|err| rejected("relation", err))?;

    if !course_repo::exists(pool, source_course_id).await? {
        return Err(ApiError::not_found("Course"));
    }
    if !course_repo::exists(pool, target_course_id).await? {
        return Err(ApiError::not_found("Target course"));
    }

    let same_type: Vec<Edge> = graph_repo::list_relations(pool, source_course_id)
        .await?
        .into_iter()
        .filter(|r| r.relation_type == relation_type)
        .map(|r| Edge::new(r.source_course_id, r.target_course_id))
        .collect();
    check_new_edge(&same_type, candidate).map_err(|err| rejected("relation", err))?;

    let relation =
        graph_repo::insert_relation(pool, source_course_id, target_course_id, relation_type)
            .await?;

    tracing::info!(
        relation_id = %relation.id,
        source_course_id = %source_course_id,
        target_course_id = %target_course_id,
        "relation added"
    );
    Ok(relation)
}
