use serde::{Deserialize, Serialize};

/// Identifier wrapper for institutions in the reference data store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolId(pub String);

impl std::fmt::Display for SchoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive 25th to 75th percentile band for a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub p25: u16,
    pub p75: u16,
}

impl ScoreRange {
    pub fn midpoint(&self) -> f64 {
        (f64::from(self.p25) + f64::from(self.p75)) / 2.0
    }

    pub fn half_width(&self) -> f64 {
        (f64::from(self.p75) - f64::from(self.p25)).abs() / 2.0
    }
}

/// Admission plans offered by the school.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionPlans {
    #[serde(default)]
    pub early_decision: bool,
    #[serde(default)]
    pub early_action: bool,
    #[serde(default)]
    pub restrictive_early_action: bool,
}

impl AdmissionPlans {
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.early_decision {
            labels.push("Early Decision");
        }
        if self.early_action {
            labels.push("Early Action");
        }
        if self.restrictive_early_action {
            labels.push("Restrictive Early Action");
        }
        labels
    }
}

/// Statistics the scorers need for a target institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolData {
    pub id: SchoolId,
    pub name: String,
    /// Fraction of applicants admitted, `0.0..=1.0`.
    #[serde(default)]
    pub acceptance_rate: Option<f64>,
    #[serde(default)]
    pub sat_range: Option<ScoreRange>,
    #[serde(default)]
    pub act_range: Option<ScoreRange>,
    #[serde(default)]
    pub average_gpa: Option<f64>,
    #[serde(default)]
    pub undergraduate_enrollment: Option<u32>,
    #[serde(default)]
    pub admission_plans: AdmissionPlans,
    /// Free-text note on what the school values; passed verbatim to the holistic prompt.
    #[serde(default)]
    pub what_school_values: Option<String>,
}

impl SchoolData {
    pub fn selectivity(&self) -> SelectivityTier {
        SelectivityTier::from_acceptance_rate(self.acceptance_rate)
    }

    /// Acceptance rate when it is a usable fraction; anything else counts as unknown.
    pub fn known_acceptance_rate(&self) -> Option<f64> {
        self.acceptance_rate
            .filter(|rate| rate.is_finite() && (0.0..=1.0).contains(rate))
    }

    pub fn has_test_ranges(&self) -> bool {
        self.sat_range.is_some() || self.act_range.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionType {
    Public,
    Private,
}

impl InstitutionType {
    pub const fn label(self) -> &'static str {
        match self {
            InstitutionType::Public => "public",
            InstitutionType::Private => "private",
        }
    }
}

/// Reference record returned by the school store; adds descriptive context to [`SchoolData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedSchoolData {
    #[serde(flatten)]
    pub stats: SchoolData,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub institution_type: Option<InstitutionType>,
    #[serde(default)]
    pub deadlines: Option<String>,
    #[serde(default)]
    pub notable_programs: Vec<String>,
}

impl ExtendedSchoolData {
    pub fn location(&self) -> Option<String> {
        match (&self.city, &self.state) {
            (Some(city), Some(state)) => Some(format!("{city}, {state}")),
            (Some(city), None) => Some(city.clone()),
            (None, Some(state)) => Some(state.clone()),
            (None, None) => None,
        }
    }
}

/// Coarse selectivity classification used when a school lacks its own reference stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectivityTier {
    MostSelective,
    HighlySelective,
    Selective,
    Moderate,
    Accessible,
}

/// Target and tolerance for a metric at a given selectivity tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Benchmark {
    pub target: f64,
    pub tolerance: f64,
}

impl SelectivityTier {
    /// Unknown rates are treated as `Moderate`.
    pub fn from_acceptance_rate(rate: Option<f64>) -> Self {
        match rate {
            Some(rate) if rate < 0.10 => Self::MostSelective,
            Some(rate) if rate < 0.25 => Self::HighlySelective,
            Some(rate) if rate < 0.50 => Self::Selective,
            Some(rate) if rate < 0.75 => Self::Moderate,
            Some(_) => Self::Accessible,
            None => Self::Moderate,
        }
    }

    pub fn gpa_benchmark(self) -> Benchmark {
        let (target, tolerance) = match self {
            Self::MostSelective => (3.95, 0.05),
            Self::HighlySelective => (3.85, 0.10),
            Self::Selective => (3.60, 0.20),
            Self::Moderate => (3.30, 0.25),
            Self::Accessible => (3.00, 0.30),
        };
        Benchmark { target, tolerance }
    }

    pub fn sat_benchmark(self) -> Benchmark {
        let (target, tolerance) = match self {
            Self::MostSelective => (1500.0, 50.0),
            Self::HighlySelective => (1420.0, 60.0),
            Self::Selective => (1300.0, 70.0),
            Self::Moderate => (1180.0, 80.0),
            Self::Accessible => (1060.0, 90.0),
        };
        Benchmark { target, tolerance }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MostSelective => "most selective",
            Self::HighlySelective => "highly selective",
            Self::Selective => "selective",
            Self::Moderate => "moderately selective",
            Self::Accessible => "accessible",
        }
    }
}
