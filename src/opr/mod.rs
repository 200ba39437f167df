//! Offensive Power Rating
//!
//! Per event, an alliance's score is modelled as the sum of its members'
//! contributions. The participation matrix encodes who played on which
//! alliance and the solver finds the contributions that best explain the
//! observed scores, independently for every score component.

pub mod matrix;
pub mod solver;

// Re-export commonly used types
pub use matrix::{score_vector, ParticipationMatrix, ALLIANCE_SIZE};
pub use solver::{least_squares, solve_event, EventOpr};
