pub mod math;
pub mod normalizer;
