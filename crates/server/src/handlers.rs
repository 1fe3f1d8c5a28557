use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    extract::{JsonBody, PathParam, QueryParams},
    models::*,
    ranking,
};

pub const VOTER_HEADER: &str = "X-Voter-Id";

// ===== Identity =====

/// The voter id header, if any. A present but blank header is rejected.
fn optional_voter(headers: &HeaderMap) -> Result<Option<VoterId>, AppError> {
    let Some(raw) = headers.get(VOTER_HEADER) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|_| AppError::InvalidInput(format!("{VOTER_HEADER} is not valid text")))?;
    VoterId::parse(raw)
        .map(Some)
        .ok_or_else(|| AppError::InvalidInput(format!("{VOTER_HEADER} is blank")))
}

fn required_voter(headers: &HeaderMap) -> Result<VoterId, AppError> {
    optional_voter(headers)?.ok_or_else(|| AppError::InvalidInput(format!("missing {VOTER_HEADER}")))
}

async fn concert_by_name(state: &AppState, band_name: &str) -> Result<Concert, AppError> {
    state
        .bounded(state.store.find_concert(band_name))
        .await?
        .ok_or_else(|| AppError::NotFound("no such concert".into()))
}

/// Photos and well-formed votes of one event, read fresh from the store.
async fn event_snapshot(state: &AppState, concert: &Concert) -> Result<(Vec<Photo>, Vec<Vote>), AppError> {
    let photos = state.bounded(state.store.list_photos(concert.id, None)).await?;
    let rows = state.bounded(state.store.list_votes_for_concert(concert.id)).await?;
    Ok((photos, ranking::well_formed(rows)))
}

// ===== Handlers =====

pub async fn root() -> &'static str {
    "FrontRow photo voting backend - Use /health to check status"
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.store.backend_tag();
    match state.bounded(state.store.ping()).await {
        Ok(()) => Json(serde_json::json!({
            "status": "ok",
            "store": "connected",
            "backend": backend,
        })),
        Err(err) => {
            tracing::warn!("Health check failed: {err}");
            Json(serde_json::json!({
                "status": "error",
                "store": "disconnected",
                "backend": backend,
            }))
        }
    }
}

pub async fn list_concerts(State(state): State<AppState>) -> Result<Json<Vec<Concert>>, AppError> {
    Ok(Json(state.bounded(state.store.list_concerts()).await?))
}

pub async fn create_concert(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NewConcert>,
) -> Result<(StatusCode, Json<Concert>), AppError> {
    let band_name = req.band_name.trim();
    if band_name.is_empty() {
        return Err(AppError::InvalidInput("band_name must not be empty".into()));
    }

    let concert = state
        .bounded(state.store.create_concert(band_name, req.concert_date))
        .await?;
    tracing::info!(concert_id = concert.id, band_name, "concert created");
    Ok((StatusCode::CREATED, Json(concert)))
}

pub async fn get_concert(
    State(state): State<AppState>,
    PathParam(band_name): PathParam<String>,
) -> Result<Json<Concert>, AppError> {
    Ok(Json(concert_by_name(&state, &band_name).await?))
}

pub async fn list_photos(
    State(state): State<AppState>,
    PathParam(band_name): PathParam<String>,
    QueryParams(query): QueryParams<PhotosQuery>,
) -> Result<Json<Vec<Photo>>, AppError> {
    if query.limit.is_some_and(|limit| limit < 0) {
        return Err(AppError::InvalidInput("limit must not be negative".into()));
    }
    let concert = concert_by_name(&state, &band_name).await?;
    let photos = state
        .bounded(state.store.list_photos(concert.id, query.limit))
        .await?;
    Ok(Json(photos))
}

/// Records a finished upload. The image itself lives wherever `photo_url` points.
pub async fn add_photo(
    State(state): State<AppState>,
    PathParam(band_name): PathParam<String>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<NewPhoto>,
) -> Result<(StatusCode, Json<Photo>), AppError> {
    let uploader = optional_voter(&headers)?;
    let photo_url = req.photo_url.trim();
    if photo_url.is_empty() {
        return Err(AppError::InvalidInput("photo_url must not be empty".into()));
    }

    let concert = concert_by_name(&state, &band_name).await?;
    let photo = state
        .bounded(state.store.insert_photo(concert.id, photo_url, uploader.as_ref()))
        .await?;
    tracing::info!(photo_id = photo.id, concert_id = concert.id, "photo added");
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn list_votes(
    State(state): State<AppState>,
    PathParam(band_name): PathParam<String>,
) -> Result<Json<Vec<EventVote>>, AppError> {
    let concert = concert_by_name(&state, &band_name).await?;
    let rows = state
        .bounded(state.store.list_votes_for_concert(concert.id))
        .await?;
    let votes = ranking::well_formed(rows).into_iter().map(EventVote::from).collect();
    Ok(Json(votes))
}

pub async fn gallery(
    State(state): State<AppState>,
    PathParam(band_name): PathParam<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<GalleryEntry>>, AppError> {
    let viewer = optional_voter(&headers)?;
    let concert = concert_by_name(&state, &band_name).await?;
    let (photos, votes) = event_snapshot(&state, &concert).await?;
    Ok(Json(ranking::gallery(&photos, &votes, viewer.as_ref())))
}

pub async fn cast_vote(
    State(state): State<AppState>,
    PathParam(photo_id): PathParam<PhotoId>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    let voter = required_voter(&headers)?;

    let vote = state
        .bounded(state.store.cast_vote(photo_id, &voter, req.vote_type))
        .await?;
    tracing::debug!(photo_id, voter = %voter, ?vote, "vote cast");

    Ok(Json(VoteResponse { photo_id, vote }))
}
