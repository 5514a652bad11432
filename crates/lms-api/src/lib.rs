pub mod auth;
pub mod config;
pub mod course;
pub mod course_module;
pub mod error;
pub mod gamification;
pub mod graph;
pub mod learning;
pub mod lesson;
pub mod metrics;
pub mod middleware;
pub mod ordering;
pub mod response;
pub mod router;
pub mod series;
pub mod state;
pub mod storage;
pub mod tracing;
pub mod validation;

pub use config::ApiConfig;
pub use state::{ApiState, AuthConfig};
