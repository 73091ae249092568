use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 外部チャットへのパスワード同期インターフェース
///
/// 失敗（明示的な拒否・通信エラーのいずれも）は呼び出し側で
/// ひとつの同期失敗として扱われる。リトライはしない。
#[async_trait]
pub trait ChatPasswordSync: Send + Sync {
    /// 対象ユーザーの新しいパスワードをチャット側に設定
    async fn set_password(&self, email: &str, new_password: &str) -> Result<(), AppError>;
}

/// Mattermost ユーザー情報（必要なフィールドのみ）
#[derive(Debug, Deserialize)]
struct MattermostUser {
    id: String,
}

/// パスワード更新リクエスト（oxpass → Mattermost）
#[derive(Debug, Serialize)]
struct UpdatePasswordRequest {
    new_password: String,
}

/// Mattermost Admin API クライアント
#[derive(Clone)]
pub struct MattermostClient {
    client: reqwest::Client,
    base_url: String,
    /// システム管理者トークン（ログ出力禁止）
    admin_token: Arc<String>,
}

impl MattermostClient {
    /// 新しい MattermostClient を作成
    pub fn new(base_url: String, admin_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            admin_token: Arc::new(admin_token),
        }
    }

    /// メールアドレスで Mattermost ユーザーを取得
    async fn find_user_by_email(&self, email: &str) -> Result<MattermostUser, AppError> {
        let url = format!("{}/api/v4/users/email/{}", self.base_url, email);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.admin_token.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, "Mattermost ユーザー取得失敗");
            return Err(AppError::Internal(anyhow::anyhow!(
                "Mattermost user lookup returned status: {}",
                status
            )));
        }

        let user: MattermostUser = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Mattermost レスポンスのパースエラー");
            AppError::Internal(anyhow::anyhow!("Failed to parse Mattermost response"))
        })?;

        tracing::debug!(chat_user_id = %user.id, "Mattermost ユーザー取得成功");

        Ok(user)
    }
}

#[async_trait]
impl ChatPasswordSync for MattermostClient {
    /// # Security
    /// new_password はログに出力しない
    async fn set_password(&self, email: &str, new_password: &str) -> Result<(), AppError> {
        let user = self.find_user_by_email(email).await?;

        let url = format!("{}/api/v4/users/{}/password", self.base_url, user.id);

        let body = UpdatePasswordRequest {
            new_password: new_password.to_string(),
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(self.admin_token.as_str())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, "Mattermost パスワード設定失敗");
            return Err(AppError::Internal(anyhow::anyhow!(
                "Mattermost password update returned status: {}",
                status
            )));
        }

        tracing::info!(chat_user_id = %user.id, "Mattermost パスワード設定成功");

        Ok(())
    }
}
