use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// アプリケーションエラー
///
/// ドメインエラー（固定メッセージで呼び出し元へ返すもの）と、
/// コラボレーター由来のインフラエラーをひとつの型で扱う。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please provide username or email")]
    MissingIdentifier,

    #[error("User does not exist")]
    UserNotFound,

    /// トークンが構造として壊れている（不正なBase64・不正なJSON）
    #[error("Malformed token")]
    MalformedToken,

    /// 不一致と期限切れは区別しない（状態の漏洩防止）
    #[error("Invalid Token")]
    InvalidToken,

    #[error("Password does not meet criteria")]
    WeakPassword,

    #[error("Session does not exist")]
    NoSession,

    /// チャット側がパスワード更新を拒否（ローカルは未変更のまま）
    #[error("Mattermost did not set password")]
    ChatSync,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("Mattermost API エラー")]
    Mattermost(#[from] reqwest::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

/// 予期しないエラーを記録するシンク
///
/// ドメインエラーには使わず、ストア障害などの想定外の失敗のみを通す。
/// 記録しても伝播は変更しない。
pub trait ErrorSink: Send + Sync {
    /// エラーを記録する
    fn capture(&self, error: &AppError);
}

/// tracing に出力する標準のエラーシンク
#[derive(Debug, Clone, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn capture(&self, error: &AppError) {
        tracing::error!(error = %error, "予期しないエラー");
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // ドメインエラーは固定メッセージをそのまま返す
            Self::MissingIdentifier
            | Self::MalformedToken
            | Self::InvalidToken
            | Self::WeakPassword => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::NoSession => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::ChatSync => (StatusCode::BAD_GATEWAY, self.to_string()),
            Self::Mattermost(e) => {
                tracing::error!(error = ?e, "Mattermost通信エラー");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to reach chat service".to_string(),
                )
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
