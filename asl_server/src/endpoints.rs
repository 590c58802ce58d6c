//! Endpoints of HTTP server.
//!
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use axum::{
    response::Html,
    routing::{get, post},
    Extension, Json, Router,
};
use common::protocol::{
    PredictFrameReq, PredictFrameResp, RecognizedTextResp, UpdateTextReq, UpdateTextResp,
};

use crate::{
    debounce::{EditCommand, Session},
    error::ApiError,
    pipeline::FramePipeline,
    stats::STATS,
};

/// State shared by all requests.
pub struct AppState {
    pipeline: FramePipeline,
    session: Mutex<Session>,
}

impl AppState {
    pub fn new(pipeline: FramePipeline, session: Session) -> Self {
        Self {
            pipeline,
            session: Mutex::new(session),
        }
    }

    /// Lock the session. A panic while holding the lock leaves the session usable.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the HTTP router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthcheck", get(healthcheck))
        .route("/predict_frame", post(predict_frame))
        .route("/update_text", post(update_text))
        .route("/recognized_text", get(recognized_text))
        .layer(Extension(state))
}

/// Web page capturing the webcam.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Health check endpoint.
pub async fn healthcheck() -> &'static str {
    "healthy"
}

/// Recognize the letter on a frame and feed it to the session.
pub async fn predict_frame(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<PredictFrameReq>,
) -> Result<Json<PredictFrameResp>, ApiError> {
    let image = req.image.ok_or(ApiError::MissingImage)?;
    STATS.tick_received();

    // Inference is CPU-bound, keep it off the async workers
    let state_ = Arc::clone(&state);
    let prediction = tokio::task::spawn_blocking(move || state_.pipeline.run(&image)).await??;

    let letter = prediction.map(|prediction| prediction.letter);
    state.session().observe(letter, Instant::now());

    Ok(Json(PredictFrameResp {
        letter: letter.map(String::from).unwrap_or_default(),
    }))
}

/// Apply an edit command to the recognized text. Unknown keys are ignored.
pub async fn update_text(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<UpdateTextReq>,
) -> Json<UpdateTextResp> {
    let mut session = state.session();
    match req.key.as_deref().and_then(EditCommand::from_key) {
        Some(command) => {
            log::debug!("Applying {:?}", command);
            session.apply(command);
        }
        None => log::debug!("Ignoring edit key {:?}", req.key),
    }

    Json(UpdateTextResp::success(session.recognized_text().to_owned()))
}

pub async fn recognized_text(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<RecognizedTextResp> {
    Json(RecognizedTextResp {
        text: state.session().recognized_text().to_owned(),
    })
}
