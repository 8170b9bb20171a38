// lib.rs
pub mod reinforcement_learning;
pub mod vision;
