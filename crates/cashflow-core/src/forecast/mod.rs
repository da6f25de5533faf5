pub mod insights;
pub mod policy;
pub mod projector;
pub mod summary;
pub mod trend;
