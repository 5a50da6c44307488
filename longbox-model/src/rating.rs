use serde::{Deserialize, Serialize};
use std::fmt;

/// Age rating totally ordered least -> most restrictive (§4.8).
///
/// The ordering is the derive order of the enum variants, so `PartialOrd`/`Ord`
/// fall out for free; callers must not reorder these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum AgeRating {
    EarlyChildhood,
    Everyone,
    G,
    KidsToAdults,
    Everyone10Plus,
    Pg,
    Teen,
    RatingPending,
    M,
    Ma15Plus,
    Mature17Plus,
    AdultsOnly18Plus,
    R18Plus,
    X18Plus,
}

impl AgeRating {
    pub const ALL: [AgeRating; 14] = [
        AgeRating::EarlyChildhood,
        AgeRating::Everyone,
        AgeRating::G,
        AgeRating::KidsToAdults,
        AgeRating::Everyone10Plus,
        AgeRating::Pg,
        AgeRating::Teen,
        AgeRating::RatingPending,
        AgeRating::M,
        AgeRating::Ma15Plus,
        AgeRating::Mature17Plus,
        AgeRating::AdultsOnly18Plus,
        AgeRating::R18Plus,
        AgeRating::X18Plus,
    ];

    /// Parse the free-text rating string found in embedded metadata.
    /// Unrecognised or blank input is deliberately not handled here — that's
    /// the "unknown" case the Access Policy treats specially.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Some(match normalized.as_str() {
            "early childhood" => AgeRating::EarlyChildhood,
            "everyone" => AgeRating::Everyone,
            "g" => AgeRating::G,
            "kids to adults" => AgeRating::KidsToAdults,
            "everyone 10+" => AgeRating::Everyone10Plus,
            "pg" => AgeRating::Pg,
            "teen" => AgeRating::Teen,
            "rating pending" => AgeRating::RatingPending,
            "m" => AgeRating::M,
            "ma15+" => AgeRating::Ma15Plus,
            "mature 17+" => AgeRating::Mature17Plus,
            "adults only 18+" => AgeRating::AdultsOnly18Plus,
            "r18+" => AgeRating::R18Plus,
            "x18+" => AgeRating::X18Plus,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRating::EarlyChildhood => "Early Childhood",
            AgeRating::Everyone => "Everyone",
            AgeRating::G => "G",
            AgeRating::KidsToAdults => "Kids to Adults",
            AgeRating::Everyone10Plus => "Everyone 10+",
            AgeRating::Pg => "PG",
            AgeRating::Teen => "Teen",
            AgeRating::RatingPending => "Rating Pending",
            AgeRating::M => "M",
            AgeRating::Ma15Plus => "MA15+",
            AgeRating::Mature17Plus => "Mature 17+",
            AgeRating::AdultsOnly18Plus => "Adults Only 18+",
            AgeRating::R18Plus => "R18+",
            AgeRating::X18Plus => "X18+",
        }
    }
}

impl fmt::Display for AgeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_least_to_most_restrictive() {
        assert!(AgeRating::Everyone < AgeRating::Teen);
        assert!(AgeRating::Teen < AgeRating::Mature17Plus);
        assert!(AgeRating::Mature17Plus < AgeRating::X18Plus);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(AgeRating::parse("teen"), Some(AgeRating::Teen));
        assert_eq!(AgeRating::parse("  Mature 17+ "), Some(AgeRating::Mature17Plus));
        assert_eq!(AgeRating::parse("not-a-rating"), None);
    }
}
