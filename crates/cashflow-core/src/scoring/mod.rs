pub mod calculations;
pub mod capabilities;
pub mod composite;
pub mod thresholds;
