use std::collections::BTreeSet;

use crate::data::filter::{filtered_indices, Selection};
use crate::data::model::{Incident, IncidentDataset};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Which record set an aggregation should run against.  The source dashboard
/// computes some charts on the filtered view and others on the full enriched
/// set; this is a per-query choice, never a global one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Filtered,
    Full,
}

/// One analytics session: the immutable enriched dataset, the current
/// selection, and the cached filtered view.
pub struct SessionState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<IncidentDataset>,

    /// Current filter selection.
    pub selection: Selection,

    /// Indices of incidents passing the current selection (cached).
    pub visible_indices: Vec<usize>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            dataset: None,
            selection: Selection {
                year_range: (0, -1),
                country: None,
                attack_types: BTreeSet::new(),
            },
            visible_indices: Vec::new(),
        }
    }
}

impl SessionState {
    /// Ingest a newly loaded dataset and reset the selection to identity.
    pub fn set_dataset(&mut self, dataset: IncidentDataset) {
        self.selection = Selection::all_of(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.dataset = Some(dataset);
    }

    /// Recompute `visible_indices` after a selection change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.selection);
        }
    }

    /// Set the inclusive year range.
    pub fn set_year_range(&mut self, year_range: (i32, i32)) {
        self.selection.year_range = year_range;
        self.refilter();
    }

    /// Restrict to one country, or `None` for all countries.
    pub fn set_country(&mut self, country: Option<String>) {
        self.selection.country = country;
        self.refilter();
    }

    /// Replace the attack-type restriction (empty set means no restriction).
    pub fn set_attack_types(&mut self, attack_types: BTreeSet<String>) {
        self.selection.attack_types = attack_types;
        self.refilter();
    }

    /// The record set for one aggregation query.
    pub fn records(&self, scope: Scope) -> Vec<&Incident> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        match scope {
            Scope::Full => ds.incidents.iter().collect(),
            Scope::Filtered => self
                .visible_indices
                .iter()
                .map(|&i| &ds.incidents[i])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::enrich::enrich;
    use crate::data::model::RawIncident;

    fn raw(country: &str, year: i32, attack: &str) -> RawIncident {
        RawIncident {
            country: country.to_string(),
            year,
            attack_type: attack.to_string(),
            vulnerability_type: "Zero-day".to_string(),
            defense_mechanism: "Firewall".to_string(),
            attack_source: "Hacker Group".to_string(),
            target_industry: "Banking".to_string(),
            financial_loss_musd: 10.0,
            affected_users: 500,
            resolution_hours: 8.0,
        }
    }

    fn dataset() -> IncidentDataset {
        IncidentDataset::from_incidents(enrich(vec![
            raw("US", 2019, "Phishing"),
            raw("US", 2021, "Malware"),
            raw("UK", 2020, "Phishing"),
        ]))
    }

    #[test]
    fn set_dataset_resets_to_identity_selection() {
        let mut state = SessionState::default();
        state.set_dataset(dataset());
        assert_eq!(state.selection.year_range, (2019, 2021));
        assert_eq!(state.selection.country, None);
        assert!(state.selection.attack_types.is_empty());
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn selection_mutators_refilter() {
        let mut state = SessionState::default();
        state.set_dataset(dataset());

        state.set_country(Some("US".to_string()));
        assert_eq!(state.visible_indices, vec![0, 1]);

        state.set_year_range((2021, 2021));
        assert_eq!(state.visible_indices, vec![1]);

        state.set_country(None);
        state.set_year_range((2019, 2021));
        state.set_attack_types(["Phishing".to_string()].into());
        assert_eq!(state.visible_indices, vec![0, 2]);
        state.set_attack_types(BTreeSet::new());
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn scope_selects_filtered_or_full_records() {
        let mut state = SessionState::default();
        state.set_dataset(dataset());
        state.set_country(Some("UK".to_string()));

        assert_eq!(state.records(Scope::Filtered).len(), 1);
        assert_eq!(state.records(Scope::Full).len(), 3);
    }

    #[test]
    fn empty_session_yields_no_records() {
        let state = SessionState::default();
        assert!(state.records(Scope::Filtered).is_empty());
        assert!(state.records(Scope::Full).is_empty());
    }
}
