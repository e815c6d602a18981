use crate::error::{AppError, AppResult};
use crate::store::InstanceSummary;
use crate::web::guard::{admission, error_verbosity};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue},
    middleware,
    response::Json,
    routing::{get, patch},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use zeroize::Zeroize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Body of `POST /api/bots`.
///
/// Holds the plaintext token, so it is never logged and is wiped on drop.
#[derive(Deserialize)]
pub struct CreateBotRequest {
    #[serde(default, alias = "credential")]
    pub token: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

impl Drop for CreateBotRequest {
    fn drop(&mut self) {
        if let Some(ref mut token) = self.token {
            token.zeroize();
        }
    }
}

/// Body of `PATCH /api/bots/{id}`
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum BotAction {
    Start,
    Stop,
    UpdatePrefix {
        #[serde(default)]
        prefix: String,
    },
}

#[derive(Serialize)]
pub struct BotResponse {
    pub success: bool,
    pub bot: InstanceSummary,
}

impl From<InstanceSummary> for BotResponse {
    fn from(bot: InstanceSummary) -> Self {
        Self { success: true, bot }
    }
}

#[derive(Serialize)]
pub struct BotListResponse {
    pub success: bool,
    pub bots: Vec<InstanceSummary>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// List every bot with masked credentials
pub async fn list_bots(State(state): State<AppState>) -> Json<BotListResponse> {
    Json(BotListResponse {
        success: true,
        bots: state.registry.list().await,
    })
}

/// Register a new bot
pub async fn create_bot(
    State(state): State<AppState>,
    body: Result<Json<CreateBotRequest>, JsonRejection>,
) -> AppResult<Json<BotResponse>> {
    let Json(request) = body.map_err(reject_body)?;

    if let Some(action) = request.action.as_deref() {
        if action != "add" {
            return Err(AppError::validation("invalid action"));
        }
    }

    let token = request
        .token
        .as_deref()
        .ok_or_else(|| AppError::validation("invalid token"))?;

    let bot = state
        .registry
        .add(token, request.prefix.as_deref())
        .await?;
    Ok(Json(bot.into()))
}

/// Start, stop or re-prefix a bot
pub async fn update_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<BotAction>, JsonRejection>,
) -> AppResult<Json<BotResponse>> {
    let Json(action) = body.map_err(reject_body)?;

    let bot = match action {
        BotAction::Start => state.registry.start(&id).await?,
        BotAction::Stop => state.registry.stop(&id).await?,
        BotAction::UpdatePrefix { prefix } => state.registry.set_prefix(&id, &prefix).await?,
    };
    Ok(Json(bot.into()))
}

/// Delete a bot
pub async fn delete_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.registry.delete(&id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Bot deleted".to_string(),
    }))
}

fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::validation(rejection.body_text())
}

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/bots", get(list_bots).post(create_bot))
        .route("/bots/{id}", patch(update_bot).delete(delete_bot))
        .layer(middleware::from_fn_with_state(state.clone(), admission));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), error_verbosity))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_action_parsing() {
        let start: BotAction = serde_json::from_str(r#"{"action":"start"}"#).unwrap();
        assert!(matches!(start, BotAction::Start));

        let update: BotAction =
            serde_json::from_str(r#"{"action":"update-prefix","prefix":"!"}"#).unwrap();
        assert!(matches!(update, BotAction::UpdatePrefix { prefix } if prefix == "!"));

        let missing: BotAction = serde_json::from_str(r#"{"action":"update-prefix"}"#).unwrap();
        assert!(matches!(missing, BotAction::UpdatePrefix { prefix } if prefix.is_empty()));

        assert!(serde_json::from_str::<BotAction>(r#"{"action":"explode"}"#).is_err());
    }

    #[test]
    fn test_create_request_accepts_credential_alias() {
        let request: CreateBotRequest =
            serde_json::from_str(r#"{"credential":"abc","prefix":"!"}"#).unwrap();
        assert_eq!(request.token.as_deref(), Some("abc"));
        assert_eq!(request.prefix.as_deref(), Some("!"));
        assert!(request.action.is_none());
    }
}
