/// User interface widgets
///
/// - Before/after comparison slider drawn on a canvas (comparison.rs)
/// - Aspect-preserving image placement shared by its layers (fit.rs)

pub mod comparison;
pub mod fit;
