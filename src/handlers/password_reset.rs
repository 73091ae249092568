use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Session;
use crate::state::AppState;

// === リセットリクエスト ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestRequest {
    pub user_or_email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetRequestResponse {
    pub success: bool,
    pub token: String,
}

/// POST /api/password/reset-request
///
/// バリデーションはサービス側で行う（空の識別子も固定メッセージで返す）。
///
/// # Security
/// - トークンはログに出力しない
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequestRequest>,
) -> Result<Json<ResetRequestResponse>, AppError> {
    let requested = state
        .password_reset_service
        .request_reset(&request.user_or_email)
        .await?;

    // メール通知。失敗してもリセット自体は成功として扱う
    if let Err(e) = state
        .email_service
        .send_password_reset_email(&requested.user.email, &requested.token)
        .await
    {
        tracing::error!(error = %e, user_id = requested.user.id, "リセットメールの送信に失敗");
    }

    Ok(Json(ResetRequestResponse {
        success: true,
        token: requested.token,
    }))
}

// === パスワード変更 ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
}

/// POST /api/password/reset
///
/// セッションはクッキーの存在のみで判定する（発行・検証は範囲外）。
///
/// # Security
/// - token, password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    let session = session_from_headers(&headers, &state.config.session_cookie_name);

    state
        .password_reset_service
        .change_password(&request.token, &request.password, session.as_ref())
        .await?;

    tracing::info!("パスワードリセット完了");

    Ok(Json(ResetPasswordResponse { success: true }))
}

/// Cookie ヘッダーから設定名のセッションを取り出す
fn session_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<Session> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name == cookie_name && !value.is_empty() {
            Some(Session {
                id: value.to_string(),
            })
        } else {
            None
        }
    })
}
