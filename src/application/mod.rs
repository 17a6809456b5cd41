pub mod analytics_service;
pub mod stats;

pub use analytics_service::{AnalyticsError, AnalyticsService};
