//! Common library for the task list services
//!
//! This crate provides the pieces shared by the login and task services: the
//! secret and table store abstractions with their backends, session tokens,
//! settings and error handling.
//!
//! ```rust,no_run
//! use common::settings::{Settings, connect_secret_store};
//! use common::token::TokenService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(3000)?;
//!     let secrets = connect_secret_store(&settings).await?;
//!     let tokens = TokenService::new(secrets);
//!     let issued = tokens.issue("alice").await?;
//!     println!("token expires in {} seconds", issued.expires_in);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod keyvault;
pub mod redis_pool;
pub mod secrets;
pub mod settings;
pub mod shutdown;
pub mod table;
pub mod timeout;
pub mod token;
