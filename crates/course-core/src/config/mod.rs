//! Configuration loading and validation
//!
//! Configuration comes from a single YAML file, `config.yml` in the
//! platform config directory, with `COURSEWORK_TOKEN`,
//! `COURSEWORK_BASE_URL` and `COURSEWORK_ROOT_DIR` overriding the file.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use course_core::config::{ConfigResolver, validate};
//! use course_remote::ReqwestHttpClient;
//!
//! let config = ConfigResolver::new().resolve()?;
//! let validated = validate(&config, Arc::new(ReqwestHttpClient::new()?))?;
//! ```

mod resolver;
mod settings;
mod validate;

pub use resolver::{APP_DIR, CONFIG_FILE, CONFIG_TEMPLATE, ConfigResolver, init_config};
pub use settings::{BASE_URL_ENV, Config, DEFAULT_WORKERS, ROOT_DIR_ENV, TOKEN_ENV, expand_home};
pub use validate::{ValidatedConfig, validate};
