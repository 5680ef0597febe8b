use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info};

use mealplan_core::models::{Category, Day, Ingredient, Language, Meal, MealDetail, NewMeal};
use mealplan_core::session::Session;
use mealplan_core::store::CatalogStore;
use mealplan_core::{CatalogError, PlannedDay, Planner};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB
const SESSION_HEADER: &str = "x-session-id";
const DEFAULT_SESSION: &str = "default";
const MAX_SESSION_ID_LEN: usize = 64;
const MAX_SESSIONS: usize = 1000;

#[derive(Clone)]
struct AppState {
    planner: Arc<Mutex<Planner>>,
    sessions: Arc<Mutex<Sessions>>,
}

/// Live sessions. The default session always exists; any other id must have
/// been issued by `POST /api/sessions`. Past `limit` issued sessions the
/// oldest is dropped.
struct Sessions {
    map: HashMap<String, Session>,
    issued: VecDeque<String>,
    limit: usize,
}

impl Sessions {
    fn new(limit: usize) -> Self {
        let mut map = HashMap::new();
        map.insert(DEFAULT_SESSION.to_string(), Session::default());
        Self {
            map,
            issued: VecDeque::new(),
            limit,
        }
    }

    fn create(&mut self) -> String {
        while self.issued.len() >= self.limit {
            let Some(oldest) = self.issued.pop_front() else {
                break;
            };
            self.map.remove(&oldest);
            debug!(session = %oldest, "evicted session");
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.map.insert(id.clone(), Session::default());
        self.issued.push_back(id.clone());
        id
    }

    fn get(&self, id: &str) -> Result<&Session, ApiError> {
        self.map.get(id).ok_or_else(|| unknown_session(id))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Session, ApiError> {
        self.map.get_mut(id).ok_or_else(|| unknown_session(id))
    }
}

fn unknown_session(id: &str) -> ApiError {
    ApiError::NotFound(format!(
        "Session '{id}' not found. Create one with POST /api/sessions"
    ))
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct CreateMealRequest {
    name: String,
    category: String,
    #[serde(default)]
    recipe: String,
    #[serde(default)]
    ingredients: Vec<String>,
}

#[derive(Deserialize)]
struct UpdateRecipeRequest {
    recipe: String,
}

#[derive(Deserialize)]
struct AddIngredientRequest {
    name: String,
}

#[derive(Deserialize)]
struct SetLanguageRequest {
    lang: String,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Serialize)]
struct PlanResponse {
    language: Language,
    days: Vec<PlannedDay>,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: String,
    language: Language,
    plan: Option<Vec<PlannedDay>>,
    open_meal: Option<MealDetail>,
}

#[derive(Serialize)]
struct CategoryLabel {
    value: Category,
    label: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => Self::BadRequest(msg),
            e @ CatalogError::NotFound { .. } => Self::NotFound(e.to_string()),
            other => Self::Internal(other.into()),
        }
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Session helpers ---

fn session_id(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(value) = headers.get(SESSION_HEADER) else {
        return Ok(DEFAULT_SESSION.to_string());
    };
    let id = value
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("{SESSION_HEADER} must be ASCII")))?
        .trim();
    if id.is_empty() {
        return Ok(DEFAULT_SESSION.to_string());
    }
    if id.len() > MAX_SESSION_ID_LEN {
        return Err(ApiError::BadRequest(format!(
            "{SESSION_HEADER} must be at most {MAX_SESSION_ID_LEN} characters"
        )));
    }
    Ok(id.to_string())
}

/// Run `f` with the catalog and the caller's session. The planner lock is
/// always taken before the session lock.
fn with_session<T>(
    state: &AppState,
    headers: &HeaderMap,
    f: impl FnOnce(&mut Planner, &mut Session) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let id = session_id(headers)?;
    let mut planner = state.planner.lock().unwrap_or_else(PoisonError::into_inner);
    let mut sessions = state.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    let session = sessions.get_mut(&id)?;
    f(&mut planner, session)
}

fn session_language(state: &AppState, headers: &HeaderMap) -> Result<Language, ApiError> {
    let id = session_id(headers)?;
    let sessions = state.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(sessions.get(&id)?.language())
}

// --- Session handlers ---

async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .create();
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = session_id(&headers)?;
    with_session(&state, &headers, |planner, session| {
        let open_meal = planner.open_meal_detail(session)?;
        Ok(Json(SessionResponse {
            session_id,
            language: session.language(),
            plan: planner.current_plan(session)?,
            open_meal,
        }))
    })
}

async fn set_language(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetLanguageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let language = Language::parse(&req.lang)?;
    with_session(&state, &headers, |_, session| {
        session.set_language(language);
        Ok(Json(serde_json::json!({ "language": language })))
    })
}

async fn toggle_language(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    with_session(&state, &headers, |_, session| {
        let language = session.toggle_language();
        Ok(Json(serde_json::json!({ "language": language })))
    })
}

async fn close_meal(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    with_session(&state, &headers, |_, session| {
        session.close_meal();
        Ok(StatusCode::NO_CONTENT)
    })
}

async fn list_categories(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CategoryLabel>>, ApiError> {
    let language = session_language(&state, &headers)?;
    let labels = Category::ALL
        .into_iter()
        .map(|value| CategoryLabel {
            value,
            label: value.label(language),
        })
        .collect();
    Ok(Json(labels))
}

// --- Catalog handlers ---

async fn list_meals(State(state): State<AppState>) -> Result<Json<Vec<Meal>>, ApiError> {
    let planner = state.planner.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(Json(planner.list_meals()?))
}

async fn create_meal(
    State(state): State<AppState>,
    Json(req): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<MealDetail>), ApiError> {
    let category = Category::parse(&req.category)?;
    let meal = NewMeal::new(req.name, category)
        .with_recipe(req.recipe)
        .with_ingredients(req.ingredients);

    let mut planner = state.planner.lock().unwrap_or_else(PoisonError::into_inner);
    let detail = planner.add_meal(&meal)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Fetching a meal also opens it in the caller's session.
async fn get_meal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<MealDetail>, ApiError> {
    with_session(&state, &headers, |planner, session| {
        let detail = planner
            .get_meal(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Meal {id} not found")))?;
        session.select_meal(id);
        Ok(Json(detail))
    })
}

async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut planner = state.planner.lock().unwrap_or_else(PoisonError::into_inner);
    planner.delete_meal(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRecipeRequest>,
) -> Result<Json<MealDetail>, ApiError> {
    let mut planner = state.planner.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(Json(planner.update_recipe(id, &req.recipe)?))
}

async fn add_ingredient(
    State(state): State<AppState>,
    Path(meal_id): Path<i64>,
    Json(req): Json<AddIngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>), ApiError> {
    let mut planner = state.planner.lock().unwrap_or_else(PoisonError::into_inner);
    let ingredient = planner.add_ingredient(meal_id, &req.name)?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut planner = state.planner.lock().unwrap_or_else(PoisonError::into_inner);
    planner.delete_ingredient(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Plan handlers ---

async fn get_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlanResponse>, ApiError> {
    with_session(&state, &headers, |planner, session| {
        let days = planner.plan(session)?;
        Ok(Json(PlanResponse {
            language: session.language(),
            days,
        }))
    })
}

async fn reroll_week(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlanResponse>, ApiError> {
    with_session(&state, &headers, |planner, session| {
        let days = planner.reroll_week(session)?;
        Ok(Json(PlanResponse {
            language: session.language(),
            days,
        }))
    })
}

async fn reroll_day(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(day): Path<String>,
) -> Result<Json<PlanResponse>, ApiError> {
    let day = Day::parse(&day)?;
    with_session(&state, &headers, |planner, session| {
        let days = planner.reroll_day(session, day)?;
        Ok(Json(PlanResponse {
            language: session.language(),
            days,
        }))
    })
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/session", get(get_session))
        .route("/api/session/language", put(set_language))
        .route("/api/session/language/toggle", post(toggle_language))
        .route("/api/session/open-meal", delete(close_meal))
        .route("/api/categories", get(list_categories))
        .route("/api/meals", get(list_meals).post(create_meal))
        .route("/api/meals/{id}", get(get_meal).delete(delete_meal))
        .route("/api/meals/{id}/recipe", put(update_recipe))
        .route("/api/meals/{id}/ingredients", post(add_ingredient))
        .route("/api/ingredients/{id}", delete(delete_ingredient))
        .route("/api/plan", get(get_plan))
        .route("/api/plan/reroll", post(reroll_week))
        .route("/api/plan/{day}/reroll", post(reroll_day))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(planner: Planner, port: u16, bind: &str) -> anyhow::Result<()> {
    let meals = planner.store().meal_count()?;
    let state = AppState {
        planner: Arc::new(Mutex::new(planner)),
        sessions: Arc::new(Mutex::new(Sessions::new(MAX_SESSIONS))),
    };

    let app = build_router(state);

    if bind != "127.0.0.1" && bind != "localhost" {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can edit the catalog."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!(meals, "catalog loaded");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
