pub mod classify;
pub mod config;
pub mod engine;
pub mod errors;
pub mod matchers;
pub mod model;
pub mod providers;
pub mod registry;
pub mod report;
pub mod table;
pub mod validate;
