use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// リセットトークンのペイロード
///
/// エンコード済み文字列の形でユーザーレコードに保存され、
/// 照合は保存済み文字列との完全一致で行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetToken {
    pub user_id: i64,
    pub secret: String,
}

/// ペイロードを不透明なトークン文字列にエンコード
///
/// JSONシリアライズ + URL-safe Base64（パディングなし）。
/// 同じ入力には常に同じ出力を返す。
///
/// # Security
/// 署名なしの可逆エンコードであり、それ自体に偽造耐性はない。
/// 有効性の判定は必ず保存済みトークンとの完全一致で行うこと。
pub fn encode(token: &ResetToken) -> Result<String, AppError> {
    let json = serde_json::to_vec(token).map_err(|e| {
        tracing::error!(error = ?e, "トークンのシリアライズに失敗");
        AppError::Internal(anyhow::anyhow!("token serialization error"))
    })?;

    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// トークン文字列をペイロードに復元
///
/// Base64・JSONいずれの不正も区別せず `MalformedToken` を返す。
pub fn decode(raw: &str) -> Result<ResetToken, AppError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|_| AppError::MalformedToken)?;

    serde_json::from_slice(&bytes).map_err(|_| AppError::MalformedToken)
}

/// リセットシークレットの生成器
///
/// テストで固定値に差し替えられるよう trait に切り出している。
pub trait SecretGenerator: Send + Sync {
    /// 新しいシークレットを生成
    fn generate(&self) -> String;
}

/// CSPRNG による標準実装
#[derive(Debug, Clone, Default)]
pub struct RandomSecretGenerator;

impl SecretGenerator for RandomSecretGenerator {
    /// 32バイトのランダムシークレットを生成（Base64エンコード済み）
    fn generate(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let token = ResetToken {
            user_id: 42,
            secret: "s3cr3t".to_string(),
        };

        let encoded = encode(&token).unwrap();
        // URLやフォームにそのまま載せられる文字のみ
        assert!(is_url_safe(&encoded));

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let token = ResetToken {
            user_id: 1,
            secret: "abc".to_string(),
        };

        assert_eq!(encode(&token).unwrap(), encode(&token).unwrap());
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let result = decode("%%%not-base64%%%");
        assert!(matches!(result, Err(AppError::MalformedToken)));
    }

    #[test]
    fn test_decode_rejects_non_json_payload() {
        let raw = URL_SAFE_NO_PAD.encode(b"plain text");
        assert!(matches!(decode(&raw), Err(AppError::MalformedToken)));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        // secret フィールド欠落
        let raw = URL_SAFE_NO_PAD.encode(br#"{"userId":3}"#);
        assert!(matches!(decode(&raw), Err(AppError::MalformedToken)));
    }

    #[test]
    fn test_generated_secret_shape() {
        let secret = RandomSecretGenerator.generate();
        // 32バイト → パディングなしBase64で43文字
        assert_eq!(secret.len(), 43);
        assert!(is_url_safe(&secret));
    }

    #[test]
    fn test_generated_secrets_differ_per_call() {
        let generator = RandomSecretGenerator;
        assert_ne!(generator.generate(), generator.generate());
    }
}
