pub mod aggregate;
pub mod forecast;
pub mod scoring;
pub mod suggest;
