pub mod core;
pub mod export;
pub mod metrics;
pub mod narrative;
pub mod record;
pub mod theme;
