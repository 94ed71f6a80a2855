use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use releves_core::models::validation::parse_integer;
use releves_core::sync::wire::{ListEnvelope, ProbeEnvelope, SaveEnvelope, ServerEntry};
use releves_core::util::{local_epoch_seconds, parse_timestamp, unix_timestamp_now};
use releves_core::{validate, Field, FieldError};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::{Reading, ReadingStore};
use crate::error::AppError;

const SECONDS_PER_DAY: i64 = 86_400;
const MAX_WINDOW_DAYS: u32 = 3_660;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: Arc<Mutex<ReadingStore>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: ReadingStore) -> Self {
        Self {
            config,
            store: Arc::new(Mutex::new(store)),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/getTS", get(get_ts))
        .route("/api/get30DaysReleves", get(list_releves))
        .route("/api/saveReleve", post(save_releve))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

async fn get_ts() -> Json<ProbeEnvelope> {
    Json(ProbeEnvelope {
        content: "OK".to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    /// Window end in epoch seconds; anything unparsable means now
    dt: Option<String>,
    days: Option<u32>,
}

async fn list_releves(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListEnvelope>, AppError> {
    let days = query.days.unwrap_or(state.config.list_window_days);
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AppError::bad_request(format!(
            "days must be in [1, {MAX_WINDOW_DAYS}]"
        )));
    }

    let until = match query.dt.as_deref().map(str::trim) {
        None | Some("") => unix_timestamp_now(),
        Some(raw) => raw.parse::<i64>().unwrap_or_else(|_| {
            tracing::warn!(dt = raw, "Invalid window end, using now");
            unix_timestamp_now()
        }),
    };
    let after = until.saturating_sub(i64::from(days) * SECONDS_PER_DAY);

    let readings = state.store.lock().await.list_window(after, until)?;
    tracing::debug!(after, until, count = readings.len(), "Listed readings");

    Ok(Json(ListEnvelope {
        entries: readings
            .into_iter()
            .map(Reading::into_server_entry)
            .collect(),
    }))
}

async fn save_releve(
    State(state): State<AppState>,
    Form(form): Form<ServerEntry>,
) -> Result<Json<SaveEnvelope>, AppError> {
    let previous_id = form.id.max(0);
    let entry = form.into_entry();
    let mut errors = validate(&entry);

    let ts = parse_timestamp(&entry.timestamp).and_then(|taken_at| local_epoch_seconds(&taken_at));
    let mut store = state.store.lock().await;

    match ts {
        Some(ts) => {
            if let Some(index) = parse_integer(&entry.meter_index) {
                if let Some(previous) = store.previous_meter_index(ts, previous_id)? {
                    if index < previous {
                        errors.push(FieldError::new(
                            Field::MeterIndex,
                            format!("Meter index is lower than the previous one ({previous})."),
                        ));
                    }
                }
            }
        }
        None if errors.is_empty() => errors.push(FieldError::new(
            Field::Date,
            "Date does not exist in the local time zone.",
        )),
        None => {}
    }

    let Some(ts) = ts.filter(|_| errors.is_empty()) else {
        for error in &errors {
            tracing::debug!(field = %error.field, "Rejected reading: {}", error.message);
        }
        return Ok(Json(SaveEnvelope::rejected(&errors)));
    };

    let id = store.save(previous_id, &Reading::from_entry(ts, &entry))?;
    tracing::info!(id, previous_id, "Saved reading");
    Ok(Json(SaveEnvelope::accepted(id)))
}
