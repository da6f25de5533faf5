pub mod suggestions;
