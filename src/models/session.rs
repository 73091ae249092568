/// アクティブセッションのコンテキスト
///
/// パスワード変更の前提条件として存在のみを検査する。
/// セッションの発行・保存・検証はこのサービスの範囲外。
#[derive(Debug, Clone)]
pub struct Session {
    /// トランスポート層から渡される不透明なセッションID
    pub id: String,
}
