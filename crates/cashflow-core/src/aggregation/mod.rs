pub mod buckets;
pub mod records;
