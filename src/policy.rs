//! Decision policy — pure mapping from (score, risk) to allow/quarantine.
//!
//! The risk score comes from the training simulators: 0 = very resilient,
//! 100 = very vulnerable. The more vulnerable the subject, the lower the
//! quarantine threshold.

/// Outcome of the decision policy for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Quarantine,
}

/// Map a subject risk score to a quarantine threshold.
///
/// - risk ≤ 20 → 70 (only very suspicious messages)
/// - risk 21–60 → 50 (medium sensitivity)
/// - risk > 60 → 30 (even mildly suspicious messages)
pub fn threshold(risk: u8) -> u8 {
    if risk <= 20 {
        70
    } else if risk <= 60 {
        50
    } else {
        30
    }
}

/// Quarantine iff the phishing score reaches the threshold (boundary-inclusive).
pub fn decide(score: u8, threshold: u8) -> Decision {
    if score >= threshold {
        Decision::Quarantine
    } else {
        Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_low_risk_band() {
        assert_eq!(threshold(0), 70);
        assert_eq!(threshold(20), 70);
    }

    #[test]
    fn threshold_medium_risk_band() {
        assert_eq!(threshold(21), 50);
        assert_eq!(threshold(60), 50);
    }

    #[test]
    fn threshold_high_risk_band() {
        assert_eq!(threshold(61), 30);
        assert_eq!(threshold(100), 30);
    }

    #[test]
    fn threshold_decreases_as_risk_increases() {
        let mut prev = threshold(0);
        for risk in 1..=100 {
            let t = threshold(risk);
            assert!(t <= prev, "threshold must not increase with risk");
            prev = t;
        }
    }

    #[test]
    fn decide_boundary_inclusive() {
        assert_eq!(decide(70, 70), Decision::Quarantine);
        assert_eq!(decide(69, 70), Decision::Allow);
    }

    #[test]
    fn decide_extremes() {
        assert_eq!(decide(100, 30), Decision::Quarantine);
        assert_eq!(decide(0, 30), Decision::Allow);
    }
}
