use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::models::User;

/// ユーザー資格情報ストアのインターフェース
///
/// username / email の一意性はストア側の不変条件（ここでは再検証しない）。
/// テストではインメモリのフェイクに差し替える。
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// ユーザー名でユーザーを検索
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// メールアドレスでユーザーを検索
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// ユーザーIDでユーザーを検索
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// ペンディング中のリセット状態を保存（既存があれば上書き）
    async fn save_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<User, AppError>;

    /// パスワードハッシュを更新し、同じ更新でリセット状態をクリア
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, AppError>;
}

/// PostgreSQL 実装
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    /// # Note
    /// DB セットアップ後は `query_as!` マクロに変更してコンパイル時SQL検証を有効にすること
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, forgot_token, token_expiration, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, forgot_token, token_expiration, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, forgot_token, token_expiration, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET forgot_token = $2, token_expiration = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, forgot_token, token_expiration, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// # Note
    /// password_hash はログに出力しないこと
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, AppError> {
        // ハッシュの保存とリセット状態の無効化は単一のUPDATEで行う
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2, forgot_token = NULL, token_expiration = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, forgot_token, token_expiration, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
