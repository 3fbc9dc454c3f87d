//! Value objects for the Nondh Engine

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Type aliases for clarity
pub type NondhId = String;
pub type DetailId = String;
pub type OwnerId = String;
pub type EntryId = String;
pub type LandRecordId = String;

/// Square meters in one guntha. Applied uniformly; the truncated 101.17 is not used.
pub const SQM_PER_GUNTHA: f64 = 101.1714;

/// Gunthas in one acre.
pub const GUNTHAS_PER_ACRE: f64 = 40.0;

/// Square meters in one acre.
pub const SQM_PER_ACRE: f64 = SQM_PER_GUNTHA * GUNTHAS_PER_ACRE;

/// Slack for area comparisons, in square meters.
pub const AREA_TOLERANCE_SQM: f64 = 0.01;

/// Area in square meters, the canonical internal unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Area(f64);

impl Area {
    pub const ZERO: Area = Area(0.0);

    pub fn from_sqm(sqm: f64) -> Self {
        Self(sqm)
    }

    pub fn sqm(self) -> f64 {
        self.0
    }

    /// Difference clamped at zero.
    pub fn saturating_sub(self, other: Area) -> Area {
        Area((self.0 - other.0).max(0.0))
    }

    /// `self` exceeds `limit` by more than `tolerance` square meters.
    pub fn exceeds(self, limit: Area, tolerance: f64) -> bool {
        self.0 > limit.0 + tolerance
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    pub fn approx_eq(self, other: Area, tolerance: f64) -> bool {
        (self.0 - other.0).abs() <= tolerance
    }
}

impl Add for Area {
    type Output = Area;

    fn add(self, rhs: Area) -> Area {
        Area(self.0 + rhs.0)
    }
}

impl Sub for Area {
    type Output = Area;

    fn sub(self, rhs: Area) -> Area {
        Area(self.0 - rhs.0)
    }
}

impl Sum for Area {
    fn sum<I: Iterator<Item = Area>>(iter: I) -> Area {
        iter.fold(Area::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Area> for Area {
    fn sum<I: Iterator<Item = &'a Area>>(iter: I) -> Area {
        iter.copied().sum()
    }
}

/// Presentation unit for area input and display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    Acre,
    Guntha,
}

/// Exact acre-guntha view of an area. `gunthas` is fractional and below 40.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcreGuntha {
    pub acres: u64,
    pub gunthas: f64,
}

/// Rounded acre-guntha view for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcreGunthaDisplay {
    pub acres: u64,
    pub gunthas: u32,
}

/// Parcel identification scheme.
///
/// Declaration order is canonical priority: survey before block before re-survey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyRefKind {
    Survey,
    Block,
    Resurvey,
}

impl SurveyRefKind {
    /// Sort rank; lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            SurveyRefKind::Survey => 0,
            SurveyRefKind::Block => 1,
            SurveyRefKind::Resurvey => 2,
        }
    }
}

/// A parcel reference: number plus the scheme it belongs to
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurveyRef {
    pub number: String,
    pub kind: SurveyRefKind,
}

impl SurveyRef {
    pub fn new(number: impl Into<String>, kind: SurveyRefKind) -> Self {
        Self {
            number: number.into(),
            kind,
        }
    }

    pub fn survey(number: impl Into<String>) -> Self {
        Self::new(number, SurveyRefKind::Survey)
    }

    pub fn block(number: impl Into<String>) -> Self {
        Self::new(number, SurveyRefKind::Block)
    }

    pub fn resurvey(number: impl Into<String>) -> Self {
        Self::new(number, SurveyRefKind::Resurvey)
    }
}

/// Legal status of an amendment (Pramanik / Radd / Na Manjoor)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NondhStatus {
    Valid,
    Invalid,
    Nullified,
}

/// Kind of legal amendment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmendmentKind {
    Possessor,
    Consolidation,
    Inheritance,
    LifeRightTransfer,
    GiftTransfer,
    SaleTransfer,
    Correction,
    Promulgation,
    Adjudication,
    DistributionRight,
    Encumbrance,
    Other,
}

impl AmendmentKind {
    /// Kinds that move area from one old owner to one or more new owners.
    pub fn is_transfer(self) -> bool {
        matches!(
            self,
            AmendmentKind::Inheritance
                | AmendmentKind::LifeRightTransfer
                | AmendmentKind::GiftTransfer
                | AmendmentKind::SaleTransfer
                | AmendmentKind::DistributionRight
        )
    }

    /// Kinds whose owner relations record who holds the land.
    pub fn is_ownership_bearing(self) -> bool {
        !matches!(self, AmendmentKind::Encumbrance | AmendmentKind::Other)
    }
}

/// Ganot sub-classification of an adjudication
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightClass {
    /// Transfers among existing owners
    First,
    /// Direct grant of a new right without consuming the prior holder
    Second,
}

/// Progress of a transfer-kind detail's owner-relation set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    Unpopulated,
    OldOwnerSelected,
    /// Some area assigned, residue still with the old owner
    Partial,
    /// New-owner areas sum to the old owner's area
    Balanced,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_kind_priority_matches_ord() {
        assert!(SurveyRefKind::Survey < SurveyRefKind::Block);
        assert!(SurveyRefKind::Block < SurveyRefKind::Resurvey);
        assert_eq!(SurveyRefKind::Survey.priority(), 0);
        assert_eq!(SurveyRefKind::Resurvey.priority(), 2);
    }

    #[test]
    fn test_area_arithmetic() {
        let a = Area::from_sqm(600.0);
        let b = Area::from_sqm(400.0);

        assert_eq!((a + b).sqm(), 1000.0);
        assert_eq!((a - b).sqm(), 200.0);
        assert_eq!(b.saturating_sub(a), Area::ZERO);
        assert_eq!([a, b].iter().sum::<Area>().sqm(), 1000.0);
    }

    #[test]
    fn test_area_tolerance() {
        let limit = Area::from_sqm(400.0);
        assert!(!Area::from_sqm(400.005).exceeds(limit, 0.01));
        assert!(Area::from_sqm(400.5).exceeds(limit, 0.01));
        assert!(Area::from_sqm(400.005).approx_eq(limit, 0.01));
    }

    #[test]
    fn test_transfer_kinds() {
        assert!(AmendmentKind::SaleTransfer.is_transfer());
        assert!(AmendmentKind::DistributionRight.is_transfer());
        assert!(!AmendmentKind::Adjudication.is_transfer());
        assert!(!AmendmentKind::Possessor.is_transfer());
    }

    #[test]
    fn test_ownership_bearing_kinds() {
        assert!(AmendmentKind::Possessor.is_ownership_bearing());
        assert!(AmendmentKind::Adjudication.is_ownership_bearing());
        assert!(!AmendmentKind::Encumbrance.is_ownership_bearing());
        assert!(!AmendmentKind::Other.is_ownership_bearing());
    }

    #[test]
    fn test_area_serializes_as_plain_number() {
        let json = serde_json::to_string(&Area::from_sqm(12.5)).unwrap();
        assert_eq!(json, "12.5");
    }
}
