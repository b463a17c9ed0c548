// Indicator math and the scoring stack
pub mod composite;
pub mod indicators;
pub mod scorers;
pub mod similarity;
