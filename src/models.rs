//! Data models for rxrefill.

use crate::utils::{self, Expiry};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime};

/// The dispensed form of a medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationType {
    Tablet,
    Capsule,
    Liquid,
    Inhaler,
    Injection,
}

impl fmt::Display for MedicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MedicationType::Tablet => "Tablet",
            MedicationType::Capsule => "Capsule",
            MedicationType::Liquid => "Liquid",
            MedicationType::Inhaler => "Inhaler",
            MedicationType::Injection => "Injection",
        };
        f.write_str(label)
    }
}

/// Represents one dispensable medication order.
///
/// Dates are kept as the `YYYY-MM-DD` strings the data source provides;
/// parsing happens at comparison time through [`utils::date_for_comparison`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    /// Opaque identifier, unique within a result set.
    pub id: String,
    /// Medication name.
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub date_issued: String,
    pub expiry_date: String,
    pub medication_type: MedicationType,
    /// Refills left on this prescription.
    pub remaining_refills: u32,
    pub instructions: String,
    pub prescribed_by: String,
    pub pharmacy: String,
}

/// Why a prescription can or cannot be refilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NoRefillsRemaining,
    Expired,
    UnknownExpiry,
}

impl Eligibility {
    /// Short label for the detail view.
    pub fn label(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "Eligible for refill",
            Eligibility::NoRefillsRemaining => "No refills remaining",
            Eligibility::Expired => "Prescription expired",
            Eligibility::UnknownExpiry => "Expiry date unreadable",
        }
    }
}

impl Prescription {
    /// Case-insensitive substring match on name, prescriber and pharmacy.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.prescribed_by.to_lowercase().contains(needle)
            || self.pharmacy.to_lowercase().contains(needle)
    }

    /// Classifies `expiry_date` against `today`.
    pub fn expiry(&self, today: Date) -> Expiry {
        utils::expiry_status(&self.expiry_date, today)
    }

    /// True only for a readable date strictly before `today`.
    pub fn is_expired(&self, today: Date) -> bool {
        self.expiry(today) == Expiry::Expired
    }

    /// First blocking reason, checked in the same order the refill rules use.
    pub fn eligibility(&self, today: Date) -> Eligibility {
        if self.remaining_refills == 0 {
            return Eligibility::NoRefillsRemaining;
        }
        match self.expiry(today) {
            Expiry::Valid => Eligibility::Eligible,
            Expiry::Expired => Eligibility::Expired,
            Expiry::Unknown => Eligibility::UnknownExpiry,
        }
    }

    pub fn can_refill(&self, today: Date) -> bool {
        self.eligibility(today) == Eligibility::Eligible
    }
}

/// Outcome of one refill attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefillResponse {
    pub success: bool,
    pub message: String,
}

impl RefillResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Audit entry kept by the mock backend for each accepted refill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefillRecord {
    pub prescription_id: String,
    pub timestamp: OffsetDateTime,
}


#[cfg(test)]
mod tests {
    use super::test_support::prescription;
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2025 - 06 - 15);

    #[test]
    fn deserializes_camel_case_wire_format() {
        let json = r#"{
            "id": "rx9",
            "name": "Salbutamol",
            "dosage": "100mcg",
            "frequency": "As needed",
            "dateIssued": "2025-01-10",
            "expiryDate": "2026-01-10",
            "medicationType": "inhaler",
            "remainingRefills": 4,
            "instructions": "Two puffs when required",
            "prescribedBy": "Dr. Okafor",
            "pharmacy": "Riverside Pharmacy"
        }"#;

        let rx: Prescription = serde_json::from_str(json).unwrap();
        assert_eq!(rx.medication_type, MedicationType::Inhaler);
        assert_eq!(rx.remaining_refills, 4);
        assert_eq!(rx.prescribed_by, "Dr. Okafor");
    }

    #[test]
    fn rejects_negative_refill_counts() {
        let json = r#"{
            "id": "rx9", "name": "X", "dosage": "", "frequency": "",
            "dateIssued": "2025-01-10", "expiryDate": "2026-01-10",
            "medicationType": "tablet", "remainingRefills": -1,
            "instructions": "", "prescribedBy": "", "pharmacy": ""
        }"#;
        assert!(serde_json::from_str::<Prescription>(json).is_err());
    }

    #[test]
    fn zero_refills_is_reported_before_expiry() {
        let rx = prescription("rx1", 0, "2020-01-01");
        assert_eq!(rx.eligibility(TODAY), Eligibility::NoRefillsRemaining);
        assert!(!rx.can_refill(TODAY));
    }

    #[test]
    fn eligibility_follows_expiry() {
        assert_eq!(
            prescription("a", 2, "2099-01-01").eligibility(TODAY),
            Eligibility::Eligible
        );
        assert_eq!(
            prescription("b", 2, "2020-01-01").eligibility(TODAY),
            Eligibility::Expired
        );
        assert_eq!(
            prescription("c", 2, "not a date").eligibility(TODAY),
            Eligibility::UnknownExpiry
        );
    }

    #[test]
    fn matches_name_prescriber_or_pharmacy() {
        let rx = prescription("rx1", 1, "2099-01-01");
        assert!(rx.matches("medication"));
        assert!(rx.matches("dr. t"));
        assert!(rx.matches("pharmacy"));
        assert!(!rx.matches("10mg"));
    }
}
