use std::collections::BTreeSet;

use super::model::{Incident, IncidentDataset};

// ---------------------------------------------------------------------------
// Selection: the three-part filter supplied per view refresh
// ---------------------------------------------------------------------------

/// The user's current filter selection.
///
/// * The year range always applies (inclusive on both ends).
/// * `country` of `None` means "All" – no country restriction.
/// * An empty `attack_types` set means "no attack-type restriction",
///   not "match nothing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub year_range: (i32, i32),
    pub country: Option<String>,
    pub attack_types: BTreeSet<String>,
}

impl Selection {
    /// The identity selection for a dataset: its full year span, all
    /// countries, no attack-type restriction.
    pub fn all_of(dataset: &IncidentDataset) -> Self {
        Selection {
            // The empty inclusive range matches nothing, which is the right
            // answer for a dataset with no rows.
            year_range: dataset.year_span.unwrap_or((0, -1)),
            country: None,
            attack_types: BTreeSet::new(),
        }
    }

    /// Whether one incident passes all three predicates.
    pub fn matches(&self, incident: &Incident) -> bool {
        let (lo, hi) = self.year_range;
        if incident.year < lo || incident.year > hi {
            return false;
        }
        if let Some(country) = &self.country {
            if incident.country != *country {
                return false;
            }
        }
        if !self.attack_types.is_empty() && !self.attack_types.contains(&incident.attack_type) {
            return false;
        }
        true
    }
}

/// Return indices of incidents that pass the current selection.
pub fn filtered_indices(dataset: &IncidentDataset, selection: &Selection) -> Vec<usize> {
    dataset
        .incidents
        .iter()
        .enumerate()
        .filter(|(_, inc)| selection.matches(inc))
        .map(|(i, _)| i)
        .collect()
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
            vulnerability_type: "Weak Passwords".to_string(),
            defense_mechanism: "VPN".to_string(),
            attack_source: "Insider".to_string(),
            target_industry: "Retail".to_string(),
            financial_loss_musd: 5.0,
            affected_users: 100,
            resolution_hours: 6.0,
        }
    }

    fn dataset() -> IncidentDataset {
        IncidentDataset::from_incidents(enrich(vec![
            raw("US", 2019, "Phishing"),
            raw("US", 2021, "Malware"),
            raw("UK", 2020, "Phishing"),
            raw("Japan", 2022, "DDoS"),
        ]))
    }

    #[test]
    fn identity_selection_keeps_every_record() {
        let ds = dataset();
        let sel = Selection::all_of(&ds);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2, 3]);
    }

    #[test]
    fn predicates_are_independent_and_conjunctive() {
        let ds = dataset();
        let mut sel = Selection::all_of(&ds);

        sel.year_range = (2020, 2021);
        assert_eq!(filtered_indices(&ds, &sel), vec![1, 2]);

        sel.country = Some("US".to_string());
        assert_eq!(filtered_indices(&ds, &sel), vec![1]);

        sel.attack_types.insert("Phishing".to_string());
        assert_eq!(filtered_indices(&ds, &sel), Vec::<usize>::new());
    }

    #[test]
    fn empty_attack_type_set_means_no_restriction() {
        let ds = dataset();
        let mut sel = Selection::all_of(&ds);
        assert!(sel.attack_types.is_empty());
        assert_eq!(filtered_indices(&ds, &sel).len(), 4);

        sel.attack_types.insert("Phishing".to_string());
        sel.attack_types.insert("DDoS".to_string());
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 2, 3]);
    }

    #[test]
    fn year_range_is_inclusive_on_both_ends() {
        let ds = dataset();
        let mut sel = Selection::all_of(&ds);
        sel.year_range = (2019, 2019);
        assert_eq!(filtered_indices(&ds, &sel), vec![0]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = dataset();
        let mut sel = Selection::all_of(&ds);
        sel.country = Some("US".to_string());

        let once: Vec<Incident> = filtered_indices(&ds, &sel)
            .into_iter()
            .map(|i| ds.incidents[i].clone())
            .collect();
        let narrowed = IncidentDataset::from_incidents(once.clone());
        let twice = filtered_indices(&narrowed, &sel);
        assert_eq!(twice.len(), once.len());
    }

    #[test]
    fn empty_dataset_selection_matches_nothing() {
        let ds = IncidentDataset::from_incidents(Vec::new());
        let sel = Selection::all_of(&ds);
        assert!(filtered_indices(&ds, &sel).is_empty());
    }
}
