use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;

/// メール送信サービス
///
/// email フィーチャー有効時は lettre で SMTP 送信する。
/// 無効時（開発環境）はログ出力のみ。
#[derive(Clone)]
pub struct EmailService {
    config: Arc<Config>,
}

impl EmailService {
    /// 新しい EmailService を作成
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// パスワードリセットメールを送信
    ///
    /// リセット操作自体はメール送信の成否に依存しない。
    /// 呼び出し側は失敗をログに残すだけでよい。
    pub async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError> {
        let reset_url = build_reset_url(self.config.password_reset_url_base.as_deref(), token);
        self.deliver(to, &reset_url).await
    }

    #[cfg(feature = "email")]
    async fn deliver(&self, to: &str, reset_url: &str) -> Result<(), AppError> {
        use lettre::message::Mailbox;
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
        use secrecy::ExposeSecret;

        let (host, username, password, from) = match (
            &self.config.smtp_host,
            &self.config.smtp_username,
            &self.config.smtp_password,
            &self.config.smtp_from_address,
        ) {
            (Some(host), Some(username), Some(password), Some(from)) => {
                (host, username, password, from)
            }
            _ => {
                tracing::warn!("SMTP 未設定のためリセットメールを送信できません");
                return Err(AppError::Internal(anyhow::anyhow!("smtp is not configured")));
            }
        };

        let from: Mailbox = from.parse().map_err(|e| {
            tracing::error!(error = ?e, "送信元アドレスのパースエラー");
            AppError::Internal(anyhow::anyhow!("invalid smtp_from_address"))
        })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e| {
            tracing::error!(error = ?e, "宛先アドレスのパースエラー");
            AppError::Internal(anyhow::anyhow!("invalid recipient address"))
        })?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject("Password reset")
            .body(format!("Reset your password: {}", reset_url))
            .map_err(|e| {
                tracing::error!(error = ?e, "メールメッセージの構築エラー");
                AppError::Internal(anyhow::anyhow!("failed to build email message"))
            })?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| {
                tracing::error!(error = ?e, "SMTPトランスポートの構築エラー");
                AppError::Internal(anyhow::anyhow!("failed to build smtp transport"))
            })?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                username.expose_secret().clone(),
                password.expose_secret().clone(),
            ))
            .build();

        mailer.send(message).await.map_err(|e| {
            tracing::error!(error = ?e, "リセットメールの送信エラー");
            AppError::Internal(anyhow::anyhow!("failed to send reset email"))
        })?;

        tracing::info!(to = %to, "パスワードリセットメール送信完了");

        Ok(())
    }

    #[cfg(not(feature = "email"))]
    async fn deliver(&self, to: &str, reset_url: &str) -> Result<(), AppError> {
        // 開発モード: メール送信せずログ出力のみ
        tracing::info!(to = %to, "パスワードリセットメール送信（開発モード）");
        tracing::info!("リセットURL: {}", reset_url);

        Ok(())
    }
}

/// リセットURLを構築
fn build_reset_url(base: Option<&str>, token: &str) -> String {
    match base {
        Some(base) => format!("{}?token={}", base, token),
        None => format!("http://localhost:3000/password-reset?token={}", token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_reset_url_with_base() {
        let url = build_reset_url(Some("https://example.com/password-reset"), "tok123");
        assert_eq!(url, "https://example.com/password-reset?token=tok123");
    }

    #[test]
    fn test_build_reset_url_default() {
        let url = build_reset_url(None, "tok123");
        assert_eq!(url, "http://localhost:3000/password-reset?token=tok123");
    }
}
