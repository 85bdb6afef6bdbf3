mod engine;

pub use engine::SupportEngine;
