//! Participation (game) matrix for one event
//!
//! Row `2i` is the red alliance of match `i`, row `2i + 1` its blue alliance;
//! column `j` is team `team_list[j]`. Entries are 1 when the team played on
//! that alliance, 0 otherwise.

use crate::error::{RatingError, Result};
use crate::scores::MatchComponents;
use crate::types::{Alliance, ScoreComponent, TeamNumber};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;

/// Teams per alliance
pub const ALLIANCE_SIZE: usize = 2;

/// Alliance-to-team membership matrix of one event
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationMatrix {
    team_list: Vec<TeamNumber>,
    matrix: DMatrix<f64>,
}

impl ParticipationMatrix {
    /// Build the matrix for an event's qualification matches
    pub fn build(
        event_code: &str,
        team_list: &[TeamNumber],
        matches: &[MatchComponents],
    ) -> Result<Self> {
        let columns: HashMap<TeamNumber, usize> = team_list
            .iter()
            .enumerate()
            .map(|(column, team)| (*team, column))
            .collect();

        let mut matrix = DMatrix::zeros(matches.len() * 2, team_list.len());

        for (i, components) in matches.iter().enumerate() {
            if let Some(team) = components.repeated_team() {
                return Err(RatingError::MalformedMatch {
                    match_name: components.match_name.clone(),
                    reason: format!("team {} is listed more than once", team),
                }
                .into());
            }

            for (offset, alliance) in [Alliance::Red, Alliance::Blue].into_iter().enumerate() {
                let teams = components.teams(alliance);
                if teams.len() != ALLIANCE_SIZE {
                    return Err(RatingError::MalformedMatch {
                        match_name: components.match_name.clone(),
                        reason: format!(
                            "{} alliance has {} teams, expected {}",
                            alliance,
                            teams.len(),
                            ALLIANCE_SIZE
                        ),
                    }
                    .into());
                }

                for team in teams {
                    let column = columns.get(team).ok_or_else(|| RatingError::UnknownTeam {
                        event_code: event_code.to_string(),
                        team_number: *team,
                    })?;
                    matrix[(2 * i + offset, *column)] = 1.0;
                }
            }
        }

        Ok(Self {
            team_list: team_list.to_vec(),
            matrix,
        })
    }

    /// True when the event had no qualification matches
    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn columns(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn team_list(&self) -> &[TeamNumber] {
        &self.team_list
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Entry at (row, column) as 0 or 1
    pub fn entry(&self, row: usize, column: usize) -> u8 {
        self.matrix[(row, column)] as u8
    }

    /// Teams marked on a row, in column order
    pub fn alliance_teams(&self, row: usize) -> Vec<TeamNumber> {
        self.matrix
            .row(row)
            .iter()
            .zip(&self.team_list)
            .filter(|(entry, _)| **entry != 0.0)
            .map(|(_, team)| *team)
            .collect()
    }
}

/// Score vector aligned with the matrix rows for one component
pub fn score_vector(matches: &[MatchComponents], component: ScoreComponent) -> DVector<f64> {
    DVector::from_iterator(
        matches.len() * 2,
        matches
            .iter()
            .flat_map(|components| [components.red.get(component), components.blue.get(component)]),
    )
}
