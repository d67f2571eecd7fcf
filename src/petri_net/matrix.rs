//! The derived input/output/incidence matrix view.
//!
//! Rebuilt from scratch on every structural change (node add, arc add,
//! sub-net embed) — acceptable because construction is expected to
//! dominate over structural churn once a net is firing. The enabling check
//! reads `input`/`output` directly; `incidence` is exposed only for callers
//! that want the change vector a transition would apply.

use crate::petri_net::arc_table::ArcTable;
use crate::uri::Uri;
use ahash::AHashMap;

/// Dense `I`, `O`, `C = O - I` matrices indexed by (sorted places × sorted
/// transitions).
#[derive(Debug, Default, Clone)]
pub struct Matrices {
    places: Vec<Uri>,
    transitions: Vec<Uri>,
    place_index: AHashMap<Uri, usize>,
    transition_index: AHashMap<Uri, usize>,
    /// `input[p][t]` = weight of the arc `p -> t`.
    input: Vec<Vec<u32>>,
    /// `output[p][t]` = weight of the arc `t -> p`.
    output: Vec<Vec<u32>>,
    /// `incidence[p][t]` = `output[p][t] as i64 - input[p][t] as i64`.
    incidence: Vec<Vec<i64>>,
}

impl Matrices {
    pub fn rebuild(place_uris: &[Uri], transition_uris: &[Uri], arcs: &ArcTable) -> Self {
        let mut places: Vec<Uri> = place_uris.to_vec();
        places.sort();
        let mut transitions: Vec<Uri> = transition_uris.to_vec();
        transitions.sort();

        let place_index: AHashMap<Uri, usize> = places
            .iter()
            .enumerate()
            .map(|(i, u)| (u.clone(), i))
            .collect();
        let transition_index: AHashMap<Uri, usize> = transitions
            .iter()
            .enumerate()
            .map(|(i, u)| (u.clone(), i))
            .collect();

        let mut input = vec![vec![0u32; transitions.len()]; places.len()];
        let mut output = vec![vec![0u32; transitions.len()]; places.len()];

        for (p_idx, p_uri) in places.iter().enumerate() {
            for (t_idx, t_uri) in transitions.iter().enumerate() {
                input[p_idx][t_idx] = arcs.weight(p_uri, t_uri);
                output[p_idx][t_idx] = arcs.weight(t_uri, p_uri);
            }
        }

        let incidence = input
            .iter()
            .zip(output.iter())
            .map(|(i_row, o_row)| {
                i_row
                    .iter()
                    .zip(o_row.iter())
                    .map(|(&i, &o)| o as i64 - i as i64)
                    .collect()
            })
            .collect();

        Matrices {
            places,
            transitions,
            place_index,
            transition_index,
            input,
            output,
            incidence,
        }
    }

    pub fn places(&self) -> &[Uri] {
        &self.places
    }

    pub fn transitions(&self) -> &[Uri] {
        &self.transitions
    }

    pub fn input(&self) -> &[Vec<u32>] {
        &self.input
    }

    pub fn output(&self) -> &[Vec<u32>] {
        &self.output
    }

    pub fn incidence(&self) -> &[Vec<i64>] {
        &self.incidence
    }

    fn transition_idx(&self, t: &Uri) -> Option<usize> {
        self.transition_index.get(t).copied()
    }

    fn place_idx(&self, p: &Uri) -> Option<usize> {
        self.place_index.get(p).copied()
    }

    /// `I[p, t]`, the tokens `t` requires from `p` to fire.
    pub fn input_weight(&self, p: &Uri, t: &Uri) -> u32 {
        match (self.place_idx(p), self.transition_idx(t)) {
            (Some(pi), Some(ti)) => self.input[pi][ti],
            _ => 0,
        }
    }

    /// `O[t, p]`, the tokens `t` deposits into `p` when it fires.
    pub fn output_weight(&self, t: &Uri, p: &Uri) -> u32 {
        match (self.place_idx(p), self.transition_idx(t)) {
            (Some(pi), Some(ti)) => self.output[pi][ti],
            _ => 0,
        }
    }

    /// Sum of `I[:, t]` — zero means `t` has no input arcs.
    pub fn input_column_sum(&self, t: &Uri) -> u32 {
        match self.transition_idx(t) {
            Some(ti) => self.input.iter().map(|row| row[ti]).sum(),
            None => 0,
        }
    }

    /// Sum of `O[:, t]` — zero means `t` has no output arcs.
    pub fn output_column_sum(&self, t: &Uri) -> u32 {
        match self.transition_idx(t) {
            Some(ti) => self.output.iter().map(|row| row[ti]).sum(),
            None => 0,
        }
    }

    /// The places with a nonzero output weight from `t` — the places `t`
    /// would produce into if fired.
    pub fn output_places_of(&self, t: &Uri) -> Vec<&Uri> {
        match self.transition_idx(t) {
            Some(ti) => self
                .places
                .iter()
                .enumerate()
                .filter(|(pi, _)| self.output[*pi][ti] > 0)
                .map(|(_, uri)| uri)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incidence_is_output_minus_input() {
        let mut arcs = ArcTable::new();
        let p = Uri::new("P0");
        let t = Uri::new("T0");
        arcs.insert(p.clone(), t.clone(), 2);
        arcs.insert(t.clone(), p.clone(), 5);
        let matrices = Matrices::rebuild(&[p.clone()], &[t.clone()], &arcs);
        assert_eq!(matrices.input_weight(&p, &t), 2);
        assert_eq!(matrices.output_weight(&t, &p), 5);
        assert_eq!(matrices.incidence()[0][0], 3);
    }

    #[test]
    fn column_sums_are_zero_for_unconnected_transitions() {
        let arcs = ArcTable::new();
        let t = Uri::new("T0");
        let matrices = Matrices::rebuild(&[Uri::new("P0")], &[t.clone()], &arcs);
        assert_eq!(matrices.input_column_sum(&t), 0);
        assert_eq!(matrices.output_column_sum(&t), 0);
    }
}
