pub mod alpha_mask;
pub mod alpha_rule;
pub mod engine;
pub mod feather;
pub mod mode;
