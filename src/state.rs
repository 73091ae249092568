use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::error::TracingErrorSink;
use crate::repositories::UserRepository;
use crate::services::mattermost::MattermostClient;
use crate::services::{EmailService, PasswordResetService};
use crate::token::RandomSecretGenerator;

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// パスワードリセットサービス
    pub password_reset_service: PasswordResetService,
    /// メールサービス
    pub email_service: EmailService,
}

impl AppState {
    /// 新しい AppState を作成
    ///
    /// 本番用の実装（PostgreSQL ストア + Mattermost クライアント +
    /// CSPRNG 生成器 + tracing シンク）でサービスを配線する。
    pub fn new(db_pool: PgPool, mattermost_client: MattermostClient, config: Config) -> Self {
        let config = Arc::new(config);
        let user_repo = UserRepository::new(db_pool);

        let password_reset_service = PasswordResetService::new(
            Arc::new(user_repo),
            Arc::new(mattermost_client),
            Arc::new(RandomSecretGenerator),
            Arc::new(TracingErrorSink),
            config.clone(),
        );

        let email_service = EmailService::new(config.clone());

        Self {
            config,
            password_reset_service,
            email_service,
        }
    }
}
