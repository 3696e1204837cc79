/*!
 * Validation module for translation quality assurance.
 *
 * - `tokens`: Checks that protected tokens survived translation intact and in order
 */

pub mod tokens;

// Re-export main types
pub use tokens::{TokenValidator, ValidationOutcome};
