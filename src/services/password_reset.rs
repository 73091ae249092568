use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::config::Config;
use crate::error::{AppError, ErrorSink};
use crate::models::{Session, User};
use crate::repositories::CredentialStore;
use crate::services::auth::hash_password;
use crate::services::mattermost::ChatPasswordSync;
use crate::token::{self, ResetToken, SecretGenerator};

/// リセット要求の結果
///
/// 未加工トークンの配送（メール送信など）は呼び出し側の責務。
#[derive(Debug)]
pub struct RequestedReset {
    pub user: User,
    pub token: String,
}

/// パスワードリセットサービス
#[derive(Clone)]
pub struct PasswordResetService {
    users: Arc<dyn CredentialStore>,
    chat: Arc<dyn ChatPasswordSync>,
    secrets: Arc<dyn SecretGenerator>,
    error_sink: Arc<dyn ErrorSink>,
    config: Arc<Config>,
}

impl PasswordResetService {
    /// 新しい PasswordResetService を作成
    pub fn new(
        users: Arc<dyn CredentialStore>,
        chat: Arc<dyn ChatPasswordSync>,
        secrets: Arc<dyn SecretGenerator>,
        error_sink: Arc<dyn ErrorSink>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            users,
            chat,
            secrets,
            error_sink,
            config,
        }
    }

    /// パスワードリセットをリクエスト
    ///
    /// username または email でユーザーを特定し、リセットトークンを
    /// 発行してレコードに保存する。既にペンディング中のトークンが
    /// あれば新しいもので上書きする（有効なのは常に最新の1つ）。
    ///
    /// # Security
    /// - トークン（平文）はログに出力しない
    pub async fn request_reset(&self, user_or_email: &str) -> Result<RequestedReset, AppError> {
        if user_or_email.is_empty() {
            return Err(AppError::MissingIdentifier);
        }

        tracing::info!(identifier = %user_or_email, "パスワードリセットリクエスト");

        // ユーザー検索（@ を含むならメールアドレスとして扱う）
        let user = if user_or_email.contains('@') {
            self.users.find_by_email(user_or_email).await
        } else {
            self.users.find_by_username(user_or_email).await
        }
        .map_err(|e| self.unexpected(e))?;

        let user = user.ok_or(AppError::UserNotFound)?;

        // トークン生成
        let secret = self.secrets.generate();
        let token = token::encode(&ResetToken {
            user_id: user.id,
            secret,
        })?;

        // 有効期限を設定してペンディング状態を保存
        let expires_at = OffsetDateTime::now_utc()
            + Duration::seconds(self.config.password_reset_token_ttl_secs);

        let user = self
            .users
            .save_reset_token(user.id, &token, expires_at)
            .await
            .map_err(|e| self.unexpected(e))?;

        tracing::info!(user_id = user.id, "リセットトークンを発行");

        Ok(RequestedReset { user, token })
    }

    /// パスワードを変更
    ///
    /// 検査順序: セッション → トークンのデコード → ユーザー検索 →
    /// パスワードポリシー → トークン照合 → チャット同期 → ローカル更新。
    /// トークン不一致と期限切れは区別せずどちらも `InvalidToken`。
    ///
    /// # Security
    /// - トークン・新パスワードはログに出力しない
    /// - ローカル更新はチャット同期の成功後にのみ行う
    pub async fn change_password(
        &self,
        raw_token: &str,
        new_password: &str,
        session: Option<&Session>,
    ) -> Result<User, AppError> {
        // セッションの存在確認（トークンを扱う前のゲート）
        session.ok_or(AppError::NoSession)?;

        // トークンをデコードして対象ユーザーIDを取り出す
        let payload = token::decode(raw_token)?;

        let user = self
            .users
            .find_by_id(payload.user_id)
            .await
            .map_err(|e| self.unexpected(e))?
            .ok_or(AppError::UserNotFound)?;

        // パスワードポリシー（トークン照合より先に検査する）
        self.validate_password(new_password)?;

        // トークン照合: 保存済みトークンとの完全一致かつ期限内
        let now = OffsetDateTime::now_utc();
        let token_matches = user.forgot_token.as_deref() == Some(raw_token);
        let not_expired = user.token_expiration.is_some_and(|exp| exp > now);

        if !token_matches || !not_expired {
            tracing::warn!(user_id = user.id, "無効または期限切れのリセットトークン");
            return Err(AppError::InvalidToken);
        }

        let password_hash = hash_password(new_password)?;

        // チャット側を先に更新する。失敗した場合はローカルを変更しない。
        if let Err(e) = self.chat.set_password(&user.email, new_password).await {
            tracing::error!(error = %e, user_id = user.id, "Mattermost へのパスワード同期に失敗");
            return Err(AppError::ChatSync);
        }

        // ローカル更新（ハッシュの保存とリセット状態のクリアは単一更新）
        let user = self
            .users
            .update_password(user.id, &password_hash)
            .await
            .map_err(|e| self.unexpected(e))?;

        tracing::info!(user_id = user.id, "パスワード変更完了");

        Ok(user)
    }

    /// パスワードポリシーの検査
    ///
    /// 判定は長さの範囲と空白文字の禁止のみ。閾値は設定で調整できる。
    fn validate_password(&self, password: &str) -> Result<(), AppError> {
        let length = password.chars().count();
        if length < self.config.password_min_length || length > self.config.password_max_length {
            return Err(AppError::WeakPassword);
        }

        if password.chars().any(char::is_whitespace) {
            return Err(AppError::WeakPassword);
        }

        Ok(())
    }

    /// 予期しない失敗をシンクへ記録してそのまま返す
    fn unexpected(&self, error: AppError) -> AppError {
        self.error_sink.capture(&error);
        error
    }
}
