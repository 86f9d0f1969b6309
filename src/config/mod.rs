// src/config/mod.rs
pub mod rules;
pub mod settings;

pub use rules::{FileRuleSource, RuleSet, RuleSource};
pub use settings::{Credentials, Settings, StartupError};
