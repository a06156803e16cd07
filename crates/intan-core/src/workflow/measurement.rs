//! Measurement values and the categorical answers collected with them.

use serde::{Deserialize, Serialize};

use super::FlowError;

/// Daily eating pattern reported for the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EatingPattern {
    Kurang,
    Cukup,
    Berlebih,
}

impl EatingPattern {
    pub const ALL: [EatingPattern; 3] = [Self::Kurang, Self::Cukup, Self::Berlebih];

    /// Menu text and value sent to the cloud.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kurang => "Kurang",
            Self::Cukup => "Cukup",
            Self::Berlebih => "Berlebih",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Kurang => "Sehari Makan Dibawah Kategori Cukup",
            Self::Cukup => "Sehari Makan 3x + Snack 2x",
            Self::Berlebih => "Sehari Makan Lebih dari Kategori Cukup",
        }
    }

    /// Case-insensitive parse of the value stored remotely.
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(text))
    }
}

/// How responsive the child was during the visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildResponse {
    Pasif,
    Sedang,
    Aktif,
}

impl ChildResponse {
    pub const ALL: [ChildResponse; 3] = [Self::Pasif, Self::Sedang, Self::Aktif];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pasif => "Pasif",
            Self::Sedang => "Sedang",
            Self::Aktif => "Aktif",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Pasif => "Anak Tidak Aktif Bergerak Cenderung Cuek dengan Sekitar",
            Self::Sedang => "Anak Biasa Saja Tidak Terlalu Aktif",
            Self::Aktif => "Anak Aktif Secara Fisik dan Cepat Tanggap",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(text))
    }
}

/// Coarse BMI category shown on the kiosk and stored with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutritionStatus {
    #[serde(rename = "sehat")]
    Sehat,
    #[serde(rename = "tidak sehat")]
    TidakSehat,
    #[serde(rename = "obesitas")]
    Obesitas,
}

impl NutritionStatus {
    pub fn classify(bmi: f32) -> Self {
        if bmi >= 30.0 {
            Self::Obesitas
        } else if bmi < 18.5 || bmi >= 25.0 {
            Self::TidakSehat
        } else {
            Self::Sehat
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sehat => "sehat",
            Self::TidakSehat => "tidak sehat",
            Self::Obesitas => "obesitas",
        }
    }
}

/// Values gathered during one weighing session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub weight_kg: f32,
    pub height_cm: f32,
    pub eating_pattern: Option<EatingPattern>,
    pub child_response: Option<ChildResponse>,
}

impl Measurement {
    /// Body mass index (kg/m²), `None` until a height is known.
    pub fn bmi(&self) -> Option<f32> {
        if self.height_cm <= 0.0 {
            return None;
        }
        let meters = self.height_cm / 100.0;
        Some(self.weight_kg / (meters * meters))
    }

    pub fn nutrition_status(&self) -> Option<NutritionStatus> {
        self.bmi().map(NutritionStatus::classify)
    }

    /// Check the values are worth sending.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.weight_kg.is_nan() || self.weight_kg <= 0.0 {
            return Err(FlowError::InvalidMeasurement {
                reason: "weight must be positive",
            });
        }
        if self.height_cm.is_nan() || self.height_cm <= 0.0 {
            return Err(FlowError::InvalidMeasurement {
                reason: "height must be positive",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_from_weight_and_height() {
        let m = Measurement {
            weight_kg: 20.0,
            height_cm: 100.0,
            ..Default::default()
        };
        assert_eq!(m.bmi(), Some(20.0));
        assert_eq!(m.nutrition_status(), Some(NutritionStatus::Sehat));

        assert_eq!(Measurement::default().bmi(), None);
    }

    #[test]
    fn classification_bands() {
        assert_eq!(NutritionStatus::classify(17.0), NutritionStatus::TidakSehat);
        assert_eq!(NutritionStatus::classify(18.5), NutritionStatus::Sehat);
        assert_eq!(NutritionStatus::classify(24.9), NutritionStatus::Sehat);
        assert_eq!(NutritionStatus::classify(25.0), NutritionStatus::TidakSehat);
        assert_eq!(NutritionStatus::classify(29.9), NutritionStatus::TidakSehat);
        assert_eq!(NutritionStatus::classify(30.0), NutritionStatus::Obesitas);
        assert_eq!(NutritionStatus::Obesitas.as_str(), "obesitas");
        assert_eq!(NutritionStatus::TidakSehat.as_str(), "tidak sehat");
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(EatingPattern::from_label("cukup"), Some(EatingPattern::Cukup));
        assert_eq!(ChildResponse::from_label("AKTIF"), Some(ChildResponse::Aktif));
        assert_eq!(ChildResponse::from_label(""), None);
    }

    #[test]
    fn validation_rejects_missing_values() {
        let mut m = Measurement::default();
        assert!(m.validate().is_err());
        m.weight_kg = 12.5;
        assert!(m.validate().is_err());
        m.height_cm = 88.0;
        assert!(m.validate().is_ok());
    }
}
