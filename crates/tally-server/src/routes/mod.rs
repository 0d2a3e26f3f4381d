pub mod analytics;
pub mod dashboard;
pub mod health;
pub mod ingest;
pub mod pixels;
pub mod track;
