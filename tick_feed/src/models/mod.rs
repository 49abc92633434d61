pub mod symbol;
pub mod tick;
pub mod timeframe;
