// File: src/lib.rs
// Purpose: Main entry point for rusty-field-validator

//! # rusty-field-validator
//!
//! Reactive validation for a single input field. Bind input and blur events,
//! supply a rule for each (regex or predicate, sync or async) and get told
//! when the field's validity changes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rusty_field_validator::{presets, FieldValidator, Rule, ValidatorConfig};
//!
//! # async fn run() {
//! let validator = FieldValidator::new(
//!     ValidatorConfig::new(|validity| println!("username is {}", validity))
//!         .input_rule(presets::min_length(3))
//!         .blur_rule(Rule::from_async(|name: String| async move {
//!             // e.g. ask the server whether the name is taken
//!             Ok::<_, anyhow::Error>(name != "admin")
//!         })),
//! );
//!
//! // Wire these to the UI's events
//! validator.handle_input("ad");
//! validator.handle_blur("admin");
//!
//! // Before submitting, wait for a full check
//! if let Some(pending) = validator.check_now("admin") {
//!     let validity = pending.await;
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod presets;
pub mod rule;
pub mod validator;
pub mod validity;

// Re-export main types
pub use config::{InputOrdering, ValidatorConfig, ValidatorSettings};
pub use error::{Result, ValidatorError};
pub use rule::{Rule, RuleFuture};
pub use validator::{FieldValidator, PendingResult, RuleUpdate};
pub use validity::Validity;
