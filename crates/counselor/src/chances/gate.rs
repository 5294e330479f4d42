use serde::{Deserialize, Serialize};

/// Subscription level as reported by the usage ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Standard,
    Premium,
}

impl SubscriptionTier {
    /// Unknown strings fall back to `Free`. The older two-tier `paid` value maps to `Standard`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "premium" => Self::Premium,
            "standard" | "paid" => Self::Standard,
            _ => Self::Free,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Standard => "standard",
            SubscriptionTier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{tier} plan allows {limit} assessments per period; {used} already used")]
pub struct UsageLimitExceeded {
    pub tier: SubscriptionTier,
    pub limit: u32,
    pub used: u32,
}

/// Assessments allowed per period for each tier. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLimits {
    pub free: Option<u32>,
    pub standard: Option<u32>,
    pub premium: Option<u32>,
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            free: Some(3),
            standard: Some(30),
            premium: None,
        }
    }
}

impl UsageLimits {
    pub fn limit_for(&self, tier: SubscriptionTier) -> Option<u32> {
        match tier {
            SubscriptionTier::Free => self.free,
            SubscriptionTier::Standard => self.standard,
            SubscriptionTier::Premium => self.premium,
        }
    }

    pub fn check(&self, tier: SubscriptionTier, used: u32) -> Result<(), UsageLimitExceeded> {
        match self.limit_for(tier) {
            Some(limit) if used >= limit => Err(UsageLimitExceeded { tier, limit, used }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_tier_vocabularies() {
        assert_eq!(SubscriptionTier::parse("premium"), SubscriptionTier::Premium);
        assert_eq!(SubscriptionTier::parse(" Standard "), SubscriptionTier::Standard);
        assert_eq!(SubscriptionTier::parse("paid"), SubscriptionTier::Standard);
        assert_eq!(SubscriptionTier::parse("free"), SubscriptionTier::Free);
        assert_eq!(SubscriptionTier::parse("trial"), SubscriptionTier::Free);
    }

    #[test]
    fn default_limits_block_at_threshold() {
        let limits = UsageLimits::default();
        assert!(limits.check(SubscriptionTier::Free, 2).is_ok());
        let err = limits
            .check(SubscriptionTier::Free, 3)
            .expect_err("free plan exhausted");
        assert_eq!(err.limit, 3);
        assert_eq!(
            err.to_string(),
            "free plan allows 3 assessments per period; 3 already used"
        );
        assert!(limits.check(SubscriptionTier::Standard, 29).is_ok());
        assert!(limits.check(SubscriptionTier::Standard, 30).is_err());
        assert!(limits.check(SubscriptionTier::Premium, 10_000).is_ok());
    }
}
