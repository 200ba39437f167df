//! Least-squares OPR solver
//!
//! Each alliance row is the equation "sum of the participants' ratings equals
//! the alliance score". The system is usually over-determined and, with small
//! pools or few matches, rank deficient, so the solve uses the SVD
//! pseudo-inverse and returns the minimum-norm least-squares solution.

use crate::config::OprHistoryPolicy;
use crate::error::{RatingError, Result};
use crate::opr::matrix::{score_vector, ParticipationMatrix};
use crate::registry::TeamRegistry;
use crate::scores::MatchComponents;
use crate::types::{ComponentScores, ScoreComponent, TeamNumber};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Solve `min ||a * x - b||²` returning the minimum-norm `x`.
///
/// Singular values below `eps * max(rows, cols) * sigma_max` are treated as
/// zero, the same cutoff numpy's `lstsq` uses.
pub fn least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() != b.len() {
        return Err(RatingError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        }
        .into());
    }
    if a.nrows() == 0 || a.ncols() == 0 {
        return Ok(DVector::zeros(a.ncols()));
    }

    let svd = a.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    let cutoff = f64::EPSILON * a.nrows().max(a.ncols()) as f64 * sigma_max;

    svd.solve(b, cutoff).map_err(|reason| {
        RatingError::SolverFailed {
            reason: reason.to_string(),
        }
        .into()
    })
}

/// OPR of every rostered team at one event
#[derive(Debug, Clone, PartialEq)]
pub struct EventOpr {
    pub event_code: String,
    pub team_list: Vec<TeamNumber>,
    pub values: Vec<ComponentScores>,
}

impl EventOpr {
    /// OPR of one team, `None` if the team was not rostered
    pub fn team(&self, team_number: TeamNumber) -> Option<ComponentScores> {
        self.team_list
            .iter()
            .position(|team| *team == team_number)
            .map(|column| self.values[column])
    }

    /// Write the event's OPR into the registry.
    ///
    /// Teams missing from the registry are skipped with a warning; the
    /// orchestrator registers every rostered team before solving.
    pub fn apply(&self, registry: &mut TeamRegistry, policy: OprHistoryPolicy) {
        for (team_number, values) in self.team_list.iter().zip(&self.values) {
            match registry.get_mut(*team_number) {
                Some(team) => team.record_opr(&self.event_code, *values, policy),
                None => warn!(
                    "Team {} has OPR at {} but is not registered",
                    team_number, self.event_code
                ),
            }
        }
    }
}

/// Solve all four score components for one event
pub fn solve_event(
    event_code: &str,
    matrix: &ParticipationMatrix,
    matches: &[MatchComponents],
) -> Result<EventOpr> {
    let expected = matches.len() * 2;
    if matrix.rows() != expected {
        return Err(RatingError::DimensionMismatch {
            expected: matrix.rows(),
            actual: expected,
        }
        .into());
    }

    let mut values = vec![ComponentScores::default(); matrix.columns()];

    for component in ScoreComponent::ALL {
        let scores = score_vector(matches, component);
        let solution = least_squares(matrix.as_matrix(), &scores)?;

        for (column, value) in solution.iter().enumerate() {
            let entry = &mut values[column];
            match component {
                ScoreComponent::Total => entry.total = *value,
                ScoreComponent::Auto => entry.auto = *value,
                ScoreComponent::Tele => entry.tele = *value,
                ScoreComponent::End => entry.end = *value,
            }
        }
    }

    debug!(
        "Solved OPR for {} teams over {} matches at {}",
        matrix.columns(),
        matches.len(),
        event_code
    );

    Ok(EventOpr {
        event_code: event_code.to_string(),
        team_list: matrix.team_list().to_vec(),
        values,
    })
}
