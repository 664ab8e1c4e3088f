use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Derived classification values
// ---------------------------------------------------------------------------

/// Incident severity, derived from financial loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

/// Attack complexity, derived from the exploited vulnerability type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "Low",
            Complexity::Medium => "Medium",
            Complexity::High => "High",
        }
    }
}

/// Whether the incident was resolved fast enough to call the defense effective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Effectiveness {
    Effective,
    Ineffective,
}

impl Effectiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effectiveness::Effective => "Effective",
            Effectiveness::Ineffective => "Ineffective",
        }
    }
}

/// Entry vector of the attack: exploited people or exploited systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum VectorType {
    Human,
    System,
}

impl VectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorType::Human => "Human",
            VectorType::System => "System",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Severity, Complexity, Effectiveness, VectorType);

// ---------------------------------------------------------------------------
// RawIncident – one row of the source table, as loaded
// ---------------------------------------------------------------------------

/// A single incident record before enrichment.
///
/// Categorical fields that were null in the source are stored as empty
/// strings; classification lookups route them to their default branch.
/// Numeric fields are never null here – the loader rejects such rows.
#[derive(Debug, Clone)]
pub struct RawIncident {
    pub country: String,
    pub year: i32,
    pub attack_type: String,
    pub vulnerability_type: String,
    pub defense_mechanism: String,
    pub attack_source: String,
    pub target_industry: String,
    pub financial_loss_musd: f64,
    pub affected_users: u64,
    pub resolution_hours: f64,
}

// ---------------------------------------------------------------------------
// Incident – a raw record plus its derived classification fields
// ---------------------------------------------------------------------------

/// An enriched incident.  The derived fields are computed exactly once from
/// this record's own raw fields and are read-only afterwards.
#[derive(Debug, Clone)]
pub struct Incident {
    pub country: String,
    pub year: i32,
    pub attack_type: String,
    pub vulnerability_type: String,
    pub defense_mechanism: String,
    pub attack_source: String,
    pub target_industry: String,
    pub financial_loss_musd: f64,
    pub affected_users: u64,
    pub resolution_hours: f64,

    pub severity: Severity,
    pub critical: bool,
    pub attack_complexity: Complexity,
    pub defense_effectiveness: Effectiveness,
    pub attack_vector_type: VectorType,
}

// ---------------------------------------------------------------------------
// IncidentDataset – the complete enriched dataset
// ---------------------------------------------------------------------------

/// The full enriched dataset with pre-computed selector indices.
#[derive(Debug, Clone)]
pub struct IncidentDataset {
    /// All enriched incidents (rows).
    pub incidents: Vec<Incident>,
    /// Sorted unique non-empty country names.
    pub countries: Vec<String>,
    /// Sorted unique non-empty attack type names.
    pub attack_types: Vec<String>,
    /// Inclusive `(min, max)` year span, `None` for an empty dataset.
    pub year_span: Option<(i32, i32)>,
}

impl IncidentDataset {
    /// Build selector indices from the enriched incidents.
    pub fn from_incidents(incidents: Vec<Incident>) -> Self {
        let mut countries: BTreeSet<&str> = BTreeSet::new();
        let mut attack_types: BTreeSet<&str> = BTreeSet::new();
        let mut year_span: Option<(i32, i32)> = None;

        for inc in &incidents {
            if !inc.country.is_empty() {
                countries.insert(&inc.country);
            }
            if !inc.attack_type.is_empty() {
                attack_types.insert(&inc.attack_type);
            }
            year_span = Some(match year_span {
                None => (inc.year, inc.year),
                Some((lo, hi)) => (lo.min(inc.year), hi.max(inc.year)),
            });
        }

        let countries = countries.into_iter().map(str::to_owned).collect();
        let attack_types = attack_types.into_iter().map(str::to_owned).collect();
        IncidentDataset {
            incidents,
            countries,
            attack_types,
            year_span,
        }
    }

    /// Number of incidents.
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::enrich::enrich;

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
            affected_users: 1_000,
            resolution_hours: 12.0,
        }
    }

    #[test]
    fn selector_indices_are_sorted_and_deduplicated() {
        let ds = IncidentDataset::from_incidents(enrich(vec![
            raw("UK", 2021, "Phishing"),
            raw("Brazil", 2019, "Malware"),
            raw("UK", 2023, "Phishing"),
        ]));
        assert_eq!(ds.countries, vec!["Brazil", "UK"]);
        assert_eq!(ds.attack_types, vec!["Malware", "Phishing"]);
        assert_eq!(ds.year_span, Some((2019, 2023)));
    }

    #[test]
    fn empty_categoricals_are_left_out_of_indices() {
        let ds = IncidentDataset::from_incidents(enrich(vec![raw("", 2020, "")]));
        assert!(ds.countries.is_empty());
        assert!(ds.attack_types.is_empty());
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn empty_dataset_has_no_year_span() {
        let ds = IncidentDataset::from_incidents(Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.year_span, None);
    }
}
