pub mod auth;
pub mod email;
pub mod mattermost;
pub mod password_reset;

pub use email::EmailService;
pub use mattermost::MattermostClient;
pub use password_reset::PasswordResetService;
