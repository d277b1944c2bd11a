//! Shop tier vocabulary - single source of truth.
//!
//! Every place that maps a score to a tier or a tier to a score range
//! must go through this module; the ranking repository translates tier
//! filters with `tier_to_score_range` instead of re-deriving the bands.
//!
//! Bands are lower-inclusive, upper-exclusive, except XXL whose upper
//! bound is inclusive at 100.

use super::errors::{DomainError, DomainResult};

/// Tiers ordered from highest to lowest.
pub const TIERS_ORDERED: [&str; 6] = ["XXL", "XL", "L", "M", "S", "XS"];

/// Convert a numeric score to its tier. The score is clamped to
/// [0, 100] before mapping.
pub fn score_to_tier(score: f64) -> &'static str {
    let clamped = score.clamp(0.0, 100.0);
    if clamped >= 85.0 {
        "XXL"
    } else if clamped >= 70.0 {
        "XL"
    } else if clamped >= 55.0 {
        "L"
    } else if clamped >= 40.0 {
        "M"
    } else if clamped >= 25.0 {
        "S"
    } else {
        "XS"
    }
}

/// Score range (min inclusive, max exclusive except XXL) for a tier.
/// Lookup is case-insensitive.
pub fn tier_to_score_range(tier: &str) -> DomainResult<(f64, f64)> {
    match tier.to_uppercase().as_str() {
        "XXL" => Ok((85.0, 100.0)),
        "XL" => Ok((70.0, 85.0)),
        "L" => Ok((55.0, 70.0)),
        "M" => Ok((40.0, 55.0)),
        "S" => Ok((25.0, 40.0)),
        "XS" => Ok((0.0, 25.0)),
        _ => Err(DomainError::InvalidTier(tier.to_string())),
    }
}

pub fn is_valid_tier(tier: &str) -> bool {
    TIERS_ORDERED.contains(&tier.to_uppercase().as_str())
}

/// Rank of a tier for ordering comparisons: XS = 0 .. XXL = 5.
/// Case-insensitive; unknown tiers return None.
pub fn tier_order(tier: &str) -> Option<u8> {
    match tier.to_uppercase().as_str() {
        "XS" => Some(0),
        "S" => Some(1),
        "M" => Some(2),
        "L" => Some(3),
        "XL" => Some(4),
        "XXL" => Some(5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_points_map_exactly() {
        assert_eq!(score_to_tier(0.0), "XS");
        assert_eq!(score_to_tier(25.0), "S");
        assert_eq!(score_to_tier(40.0), "M");
        assert_eq!(score_to_tier(55.0), "L");
        assert_eq!(score_to_tier(70.0), "XL");
        assert_eq!(score_to_tier(85.0), "XXL");
        assert_eq!(score_to_tier(100.0), "XXL");
    }

    #[test]
    fn just_below_boundary_stays_in_lower_band() {
        assert_eq!(score_to_tier(69.999), "L");
        assert_eq!(score_to_tier(84.999), "XL");
        assert_eq!(score_to_tier(24.999), "XS");
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        assert_eq!(score_to_tier(-5.0), "XS");
        assert_eq!(score_to_tier(150.0), "XXL");
    }

    #[test]
    fn tier_matches_clamped_tier_everywhere() {
        for score in [-20.0, 0.0, 12.5, 39.99, 55.0, 84.9, 100.0, 240.0] {
            assert_eq!(score_to_tier(score), score_to_tier(score.clamp(0.0, 100.0)));
        }
    }

    #[test]
    fn range_lookup_is_case_insensitive() {
        assert_eq!(tier_to_score_range("XL").unwrap(), (70.0, 85.0));
        assert_eq!(tier_to_score_range("xs").unwrap(), (0.0, 25.0));
        assert!(tier_to_score_range("XXXL").is_err());
    }

    #[test]
    fn ordering_follows_band_order() {
        assert!(tier_order("XXL") > tier_order("XL"));
        assert!(tier_order("xl") > tier_order("m"));
        assert_eq!(tier_order("nope"), None);
    }
}
