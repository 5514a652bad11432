use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use lms_db::{
    models::{Badge, Challenge},
    repositories::{
        badge as badge_repo,
        challenge::{self as challenge_repo, NewChallenge},
    },
};
use uuid::Uuid;

use super::{
    model::{
        CreateBadgeRequest, CreateChallengeRequest, Leaderboard, LeaderboardQuery, ProgressView,
        leaderboard_limit,
    },
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    response::{ApiResponse, ApiResult},
    validation::{ValidatedJson, ValidatedPath, ValidatedQuery, require_text},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/me/progress", get(my_progress))
        .route("/badges", get(list_badges).post(create_badge))
        .route("/challenges", get(list_challenges).post(create_challenge))
        .route("/challenges/{challenge_id}/join", post(join_challenge))
        .route("/leaderboard", get(leaderboard))
}

async fn my_progress(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> ApiResult<ProgressView> {
    let view = service::progress_view(&state.pool, auth_user.user_id, Utc::now()).await?;
    Ok(ApiResponse::ok(view))
}

async fn list_badges(State(state): State<ApiState>) -> ApiResult<Vec<Badge>> {
    let badges = badge_repo::list(&state.pool).await?;
    Ok(ApiResponse::ok(badges))
}

async fn create_badge(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(req): ValidatedJson<CreateBadgeRequest>,
) -> ApiResult<Badge> {
    auth_user.require_instructor()?;
    require_text("code", &req.code)?;
    require_text("name", &req.name)?;

    let badge = badge_repo::create(
        &state.pool,
        req.code.trim(),
        req.name.trim(),
        req.description.as_deref(),
        req.criterion,
        req.threshold,
        req.xp_bonus.unwrap_or(0),
    )
    .await?;

    tracing::info!(badge_id = %badge.id, code = %badge.code, "badge created");
    Ok(ApiResponse::created(badge))
}

/// Challenges that have not ended yet
async fn list_challenges(State(state): State<ApiState>) -> ApiResult<Vec<Challenge>> {
    let challenges = challenge_repo::list_open(&state.pool, Utc::now()).await?;
    Ok(ApiResponse::ok(challenges))
}

async fn create_challenge(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(req): ValidatedJson<CreateChallengeRequest>,
) -> ApiResult<Challenge> {
    auth_user.require_instructor()?;
    require_text("title", &req.title)?;
    req.check_window()?;

    let challenge = challenge_repo::create(
        &state.pool,
        &NewChallenge {
            title: req.title.trim(),
            description: req.description.as_deref(),
            metric: req.metric,
            target: req.target,
            xp_reward: req.xp_reward.unwrap_or(0),
            starts_at: req.starts_at,
            ends_at: req.ends_at,
        },
    )
    .await?;

    tracing::info!(challenge_id = %challenge.id, metric = %challenge.metric, "challenge created");
    Ok(ApiResponse::created(challenge))
}

async fn join_challenge(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(challenge_id): ValidatedPath<Uuid>,
) -> ApiResult<()> {
    service::join_challenge(&state.pool, auth_user.user_id, challenge_id, Utc::now()).await?;
    Ok(ApiResponse::created(()))
}

async fn leaderboard(
    State(state): State<ApiState>,
    ValidatedQuery(query): ValidatedQuery<LeaderboardQuery>,
) -> ApiResult<Leaderboard> {
    let limit = leaderboard_limit(query.limit, state.leaderboard_max_limit)?;
    let entries = service::leaderboard(&state.pool, query.period, limit, Utc::now()).await?;

    Ok(ApiResponse::ok(Leaderboard {
        period: query.period,
        entries,
    }))
}
