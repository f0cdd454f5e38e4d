pub mod backtrack;
pub mod emission;
pub mod segments;
pub mod spans;
pub mod tokenization;
pub mod trellis;
