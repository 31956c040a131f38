//! Satisfactory Production Calculator
//!
//! Resolves the full production chain for a target item at a target rate,
//! choosing among the unlocked recipes by an optimization objective.

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod export;
pub mod extract;
pub mod models;
pub mod report;
pub mod sample;
pub mod scorer;
pub mod validation;
