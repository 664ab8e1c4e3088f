use super::model::{Complexity, Effectiveness, Incident, RawIncident, Severity, VectorType};

// ---------------------------------------------------------------------------
// Classification rules
// ---------------------------------------------------------------------------

/// Vulnerability types whose root cause is people rather than software.
/// Extend this list to pull more categories into the `Human` vector.
pub const HUMAN_VECTORS: &[&str] = &["Social Engineering", "Weak Passwords"];

/// Severity from financial loss in million $.  Boundary values fall into the
/// lower tier: exactly 70 is `Medium`, exactly 40 is `Low`.
pub fn severity_for(loss_musd: f64) -> Severity {
    if loss_musd > 70.0 {
        Severity::High
    } else if loss_musd > 40.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// An incident is critical only when both thresholds are strictly exceeded:
/// more than 500 000 affected users and more than 48 hours to resolve.
pub fn is_critical(affected_users: u64, resolution_hours: f64) -> bool {
    affected_users > 500_000 && resolution_hours > 48.0
}

/// Complexity from the exploited vulnerability type.  A closed lookup table:
/// anything outside the two explicit buckets is `Low`, including unknown or
/// missing vulnerability types.
pub fn complexity_for(vulnerability_type: &str) -> Complexity {
    match vulnerability_type {
        "Zero-day" | "Unpatched Software" => Complexity::High,
        "Weak Passwords" => Complexity::Medium,
        _ => Complexity::Low,
    }
}

/// A defense counts as effective when the incident was resolved within a day.
/// Exactly 24 hours is still `Effective`.
pub fn effectiveness_for(resolution_hours: f64) -> Effectiveness {
    if resolution_hours <= 24.0 {
        Effectiveness::Effective
    } else {
        Effectiveness::Ineffective
    }
}

/// Classify the entry vector against an explicit human-vector allow-list.
pub fn classify_vector(vulnerability_type: &str, human_vectors: &[&str]) -> VectorType {
    if human_vectors.contains(&vulnerability_type) {
        VectorType::Human
    } else {
        VectorType::System
    }
}

/// Entry vector using the default [`HUMAN_VECTORS`] allow-list.
pub fn vector_type_for(vulnerability_type: &str) -> VectorType {
    classify_vector(vulnerability_type, HUMAN_VECTORS)
}

// ---------------------------------------------------------------------------
// Batch enrichment
// ---------------------------------------------------------------------------

impl Incident {
    /// Attach the five derived fields to one raw record.  Each derived field
    /// is a pure function of this record alone, so enrichment is
    /// order-independent and idempotent.
    pub fn from_raw(raw: RawIncident) -> Self {
        let severity = severity_for(raw.financial_loss_musd);
        let critical = is_critical(raw.affected_users, raw.resolution_hours);
        let attack_complexity = complexity_for(&raw.vulnerability_type);
        let defense_effectiveness = effectiveness_for(raw.resolution_hours);
        let attack_vector_type = vector_type_for(&raw.vulnerability_type);

        Incident {
            country: raw.country,
            year: raw.year,
            attack_type: raw.attack_type,
            vulnerability_type: raw.vulnerability_type,
            defense_mechanism: raw.defense_mechanism,
            attack_source: raw.attack_source,
            target_industry: raw.target_industry,
            financial_loss_musd: raw.financial_loss_musd,
            affected_users: raw.affected_users,
            resolution_hours: raw.resolution_hours,
            severity,
            critical,
            attack_complexity,
            defense_effectiveness,
            attack_vector_type,
        }
    }
}

/// Enrich the whole raw record set in one batch map.
pub fn enrich(raw: Vec<RawIncident>) -> Vec<Incident> {
    raw.into_iter().map(Incident::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_thresholds_are_exclusive_lower_bounds() {
        assert_eq!(severity_for(40.0), Severity::Low);
        assert_eq!(severity_for(40.0001), Severity::Medium);
        assert_eq!(severity_for(70.0), Severity::Medium);
        assert_eq!(severity_for(70.0001), Severity::High);
        assert_eq!(severity_for(0.0), Severity::Low);
    }

    #[test]
    fn critical_requires_both_strict_thresholds() {
        assert!(is_critical(500_001, 48.0001));
        assert!(!is_critical(500_000, 100.0));
        assert!(!is_critical(600_000, 48.0));
        assert!(!is_critical(100, 10.0));
    }

    #[test]
    fn complexity_lookup_covers_unknowns() {
        assert_eq!(complexity_for("Zero-day"), Complexity::High);
        assert_eq!(complexity_for("Unpatched Software"), Complexity::High);
        assert_eq!(complexity_for("Weak Passwords"), Complexity::Medium);
        assert_eq!(complexity_for("Phishing"), Complexity::Low);
        assert_eq!(complexity_for(""), Complexity::Low);
    }

    #[test]
    fn effectiveness_boundary_is_effective() {
        assert_eq!(effectiveness_for(24.0), Effectiveness::Effective);
        assert_eq!(effectiveness_for(24.0001), Effectiveness::Ineffective);
        assert_eq!(effectiveness_for(0.0), Effectiveness::Effective);
    }

    #[test]
    fn vector_type_uses_the_allow_list() {
        assert_eq!(vector_type_for("Social Engineering"), VectorType::Human);
        assert_eq!(vector_type_for("Weak Passwords"), VectorType::Human);
        assert_eq!(vector_type_for("Zero-day"), VectorType::System);
        assert_eq!(vector_type_for(""), VectorType::System);

        let extended = ["Social Engineering", "Weak Passwords", "Phishing Kit"];
        assert_eq!(classify_vector("Phishing Kit", &extended), VectorType::Human);
    }

    #[test]
    fn enrichment_is_a_pure_per_record_map() {
        let raw = RawIncident {
            country: "US".to_string(),
            year: 2020,
            attack_type: "Phishing".to_string(),
            vulnerability_type: "Zero-day".to_string(),
            defense_mechanism: "Firewall".to_string(),
            attack_source: "Hacker Group".to_string(),
            target_industry: "Banking".to_string(),
            financial_loss_musd: 80.0,
            affected_users: 600_000,
            resolution_hours: 60.0,
        };

        let enriched = enrich(vec![raw.clone(), raw]);
        assert_eq!(enriched.len(), 2);
        for inc in &enriched {
            assert_eq!(inc.severity, Severity::High);
            assert!(inc.critical);
            assert_eq!(inc.attack_complexity, Complexity::High);
            assert_eq!(inc.defense_effectiveness, Effectiveness::Ineffective);
            assert_eq!(inc.attack_vector_type, VectorType::System);
        }
    }
}
