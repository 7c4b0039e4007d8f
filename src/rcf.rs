//! Gridded random consensus filter for noisy point clouds
//!
//! Points are partitioned into a horizontal grid and each cell votes on the
//! elevation window that holds the most of its points. Points inside the
//! winning window are kept; everything else in the cell is an outlier.
//! Cells never influence their neighbors.

use bon::Builder;
use ndarray::ArrayView1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ConfigError, FilterError};

/// How to resolve a tie between windows holding equally many points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Use the lowest winning window.
    Lowest,
    /// Use the middle winning window.
    Middle,
    /// Use the highest winning window.
    #[default]
    Highest,
}

fn default_min_jury() -> usize {
    3
}

/// Parameters for the gridded consensus filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Builder)]
pub struct RcfConfig {
    /// Horizontal cell size, in the points' coordinate units.
    pub cell_size: f64,
    /// Vertical search window width.
    pub win_width: f64,
    /// Minimum number of winning points needed for a cell to keep any.
    #[builder(default = 3)]
    #[serde(default = "default_min_jury")]
    pub min_jury: usize,
    #[builder(default)]
    #[serde(default)]
    pub tie: TieBreak,
}

/// Find the winning elevation window of a jury of values.
///
/// Slides a window of the given width over the sorted values and returns
/// the lower bound of the window holding the most of them, `None` for an
/// empty jury. Ties are resolved per `tie`.
pub fn rcf_jury(values: &[f64], width: f64, tie: TieBreak) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut jury = values.to_vec();
    jury.sort_by(f64::total_cmp);

    let mut best_vote = 0;
    let mut best_starts = vec![0];

    let (mut i, mut j) = (0, 0);
    while i < jury.len() {
        let lower = jury[i];
        let upper = lower + width;
        while j < jury.len() && jury[j] < upper {
            j += 1;
        }
        let vote = j - i;
        if vote > best_vote {
            best_vote = vote;
            best_starts = vec![i];
        } else if vote == best_vote {
            best_starts.push(i);
        }
        // Equal values start identical windows; evaluate each lower bound
        // once.
        i += 1;
        while i < jury.len() && jury[i] == lower {
            i += 1;
        }
    }

    let idx = match tie {
        TieBreak::Lowest => best_starts[0],
        TieBreak::Middle => best_starts[best_starts.len() / 2],
        TieBreak::Highest => best_starts[best_starts.len() - 1],
    };
    Some(jury[idx])
}

/// The gridded consensus filter, validated at construction.
#[derive(Debug, Clone)]
pub struct RcfFilter {
    config: RcfConfig,
}

impl RcfFilter {
    /// Validate the configuration. Non-positive cell or window sizes and a
    /// zero jury threshold are rejected before any points are processed.
    pub fn new(config: RcfConfig) -> Result<Self, ConfigError> {
        if !(config.cell_size > 0.0) {
            return Err(ConfigError::NonPositiveCellSize(config.cell_size));
        }
        if !(config.win_width > 0.0) {
            return Err(ConfigError::NonPositiveWinWidth(config.win_width));
        }
        if config.min_jury == 0 {
            return Err(ConfigError::ZeroMinJury);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &RcfConfig {
        &self.config
    }

    /// Label each point as consensus (`true`) or outlier (`false`).
    ///
    /// Labels are positional, preserving the input order. The result is
    /// deterministic for a fixed input and configuration: cell membership
    /// is exact, elevations sort under a total order, and cells vote
    /// independently, so parallel and serial runs agree.
    pub fn filter(
        &self,
        x: ArrayView1<'_, f64>,
        y: ArrayView1<'_, f64>,
        z: ArrayView1<'_, f64>,
    ) -> Result<Vec<bool>, FilterError> {
        self.filter_with(x, y, z, None)
    }

    /// Cancellable form of [`filter`]: the flag is checked between cells
    /// and a raised flag aborts with [`FilterError::Cancelled`].
    ///
    /// [`filter`]: RcfFilter::filter
    pub fn filter_with(
        &self,
        x: ArrayView1<'_, f64>,
        y: ArrayView1<'_, f64>,
        z: ArrayView1<'_, f64>,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<bool>, FilterError> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(FilterError::LengthMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        let mut keep = vec![false; x.len()];
        if x.is_empty() {
            return Ok(keep);
        }

        let cells = self.partition(&x, &y);
        let cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));

        let winners: Vec<Vec<usize>> = cells
            .par_iter()
            .map(|(_, members)| {
                if cancelled() {
                    return Vec::new();
                }
                self.cell_winners(&z, members)
            })
            .collect();
        if cancelled() {
            return Err(FilterError::Cancelled);
        }

        for cell in winners {
            for index in cell {
                keep[index] = true;
            }
        }
        Ok(keep)
    }

    /// Assign each point to the cell its coordinates floor into. The grid
    /// origin is the cell-size multiple at or below the minimum coordinate.
    fn partition(
        &self,
        x: &ArrayView1<'_, f64>,
        y: &ArrayView1<'_, f64>,
    ) -> BTreeMap<(i64, i64), Vec<usize>> {
        let cell = self.config.cell_size;
        let min_x = x.iter().copied().fold(f64::INFINITY, f64::min);
        let min_y = y.iter().copied().fold(f64::INFINITY, f64::min);
        let bottom_x = (min_x / cell).floor() * cell;
        let bottom_y = (min_y / cell).floor() * cell;

        let mut cells: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
        for index in 0..x.len() {
            let xi = ((x[index] - bottom_x) / cell).floor() as i64;
            let yi = ((y[index] - bottom_y) / cell).floor() as i64;
            cells.entry((xi, yi)).or_default().push(index);
        }
        cells
    }

    /// Indices of a cell's points that fall inside its winning window, or
    /// nothing when the winners are fewer than the jury threshold.
    fn cell_winners(&self, z: &ArrayView1<'_, f64>, members: &[usize]) -> Vec<usize> {
        let elevations: Vec<f64> = members.iter().map(|&i| z[i]).collect();
        let Some(low) = rcf_jury(&elevations, self.config.win_width, self.config.tie) else {
            return Vec::new();
        };
        let high = low + self.config.win_width;
        let winners: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| z[i] >= low && z[i] < high)
            .collect();
        if winners.len() >= self.config.min_jury {
            winners
        } else {
            Vec::new()
        }
    }
}
