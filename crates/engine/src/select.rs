//! Case selection
//!
//! `only` cases run exclusively. Otherwise skipped cases are dropped, unless
//! that would leave nothing to run, in which case every case runs.

use crate::case::Case;

pub fn select(cases: &[Case]) -> Vec<&Case> {
    let only: Vec<&Case> = cases.iter().filter(|c| c.only).collect();
    if !only.is_empty() {
        return only;
    }

    let kept: Vec<&Case> = cases.iter().filter(|c| !c.skip).collect();
    if !kept.is_empty() {
        return kept;
    }

    cases.iter().collect()
}
