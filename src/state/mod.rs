/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The generation state machine and its single in-flight request (generation.rs)

pub mod data;
pub mod generation;
