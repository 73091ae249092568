//! oxpass - パスワードリセットサービス
//!
//! 時限リセットトークンの発行と検証、資格情報レコードの更新、
//! Mattermost へのパスワード同期を行う。

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod token;
