mod response_cache;

pub use response_cache::{similarity_ratio, ResponseCache};
