use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// ユーザーレコード
///
/// 資格情報（password_hash）とペンディング中のリセット状態
/// （forgot_token / token_expiration）を同じレコードで保持する。
/// 本サービスが書き換えるのはこの3カラムのみ。
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// ペンディング中のリセットトークン（エンコード済み文字列そのもの）
    #[serde(skip)]
    pub forgot_token: Option<String>,
    /// forgot_token の有効期限（この時刻以降は照合に失敗する）
    pub token_expiration: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
