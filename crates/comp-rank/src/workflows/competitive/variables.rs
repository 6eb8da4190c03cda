use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every variable the ranking model knows about, in catalog order.
///
/// The declaration order is load-bearing: `BTreeMap<VariableKey, _>` iterates in
/// this order, which fixes the summation order of weighted scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKey {
    BuildingAge,
    ClearHeightFt,
    OfficePct,
    ParkingRatio,
    DistanceKm,
    NetRent,
    Tmi,
    BuildingClass,
    AreaDifference,
    BayDepthFt,
    ColumnSpacingFt,
    LotSizeAcres,
    PowerAmps,
    TruckLevelDoors,
    DriveInDoors,
    RailAccess,
    Crane,
    SecureShipping,
    ExcessLand,
    TrailerParking,
    FencedYard,
    HvacCoverage,
    SprinklerSystem,
    OccupancyStatus,
    BuildingCondition,
}

impl VariableKey {
    pub const CORE: [VariableKey; 9] = [
        VariableKey::BuildingAge,
        VariableKey::ClearHeightFt,
        VariableKey::OfficePct,
        VariableKey::ParkingRatio,
        VariableKey::DistanceKm,
        VariableKey::NetRent,
        VariableKey::Tmi,
        VariableKey::BuildingClass,
        VariableKey::AreaDifference,
    ];

    pub const OPTIONAL: [VariableKey; 16] = [
        VariableKey::BayDepthFt,
        VariableKey::ColumnSpacingFt,
        VariableKey::LotSizeAcres,
        VariableKey::PowerAmps,
        VariableKey::TruckLevelDoors,
        VariableKey::DriveInDoors,
        VariableKey::RailAccess,
        VariableKey::Crane,
        VariableKey::SecureShipping,
        VariableKey::ExcessLand,
        VariableKey::TrailerParking,
        VariableKey::FencedYard,
        VariableKey::HvacCoverage,
        VariableKey::SprinklerSystem,
        VariableKey::OccupancyStatus,
        VariableKey::BuildingCondition,
    ];

    /// Price terms the sensitivity solver is allowed to move.
    pub const PRICE: [VariableKey; 2] = [VariableKey::NetRent, VariableKey::Tmi];

    pub fn all() -> impl Iterator<Item = VariableKey> {
        Self::CORE.into_iter().chain(Self::OPTIONAL)
    }

    pub const fn spec(self) -> VariableSpec {
        use Direction::{Ascending, Descending};
        use PresenceRule::{Explicit, ZeroMeansAbsent};
        use VariableKind::{Boolean, Numeric, Ordinal};
        use WeightBucket::{Core, Optional};

        let (bucket, kind, presence) = match self {
            VariableKey::BuildingAge => (Core, Numeric(Ascending), Explicit),
            VariableKey::ClearHeightFt => (Core, Numeric(Descending), Explicit),
            VariableKey::OfficePct => (Core, Numeric(Ascending), Explicit),
            VariableKey::ParkingRatio => (Core, Numeric(Descending), Explicit),
            VariableKey::DistanceKm => (Core, Numeric(Ascending), Explicit),
            VariableKey::NetRent => (Core, Numeric(Ascending), Explicit),
            VariableKey::Tmi => (Core, Numeric(Ascending), Explicit),
            VariableKey::BuildingClass => (Core, Ordinal, Explicit),
            VariableKey::AreaDifference => (Core, Numeric(Ascending), Explicit),
            VariableKey::BayDepthFt => (Optional, Numeric(Descending), ZeroMeansAbsent),
            VariableKey::ColumnSpacingFt => (Optional, Numeric(Descending), ZeroMeansAbsent),
            VariableKey::LotSizeAcres => (Optional, Numeric(Descending), ZeroMeansAbsent),
            VariableKey::PowerAmps => (Optional, Numeric(Descending), ZeroMeansAbsent),
            VariableKey::TruckLevelDoors => (Optional, Numeric(Descending), Explicit),
            VariableKey::DriveInDoors => (Optional, Numeric(Descending), Explicit),
            VariableKey::RailAccess
            | VariableKey::Crane
            | VariableKey::SecureShipping
            | VariableKey::ExcessLand
            | VariableKey::TrailerParking
            | VariableKey::FencedYard => (Optional, Boolean, Explicit),
            VariableKey::HvacCoverage
            | VariableKey::SprinklerSystem
            | VariableKey::OccupancyStatus
            | VariableKey::BuildingCondition => (Optional, Ordinal, Explicit),
        };

        VariableSpec {
            bucket,
            kind,
            presence,
        }
    }

    pub const fn kind(self) -> VariableKind {
        self.spec().kind
    }

    pub const fn is_core(self) -> bool {
        matches!(self.spec().bucket, WeightBucket::Core)
    }

    pub const fn is_price(self) -> bool {
        matches!(self, VariableKey::NetRent | VariableKey::Tmi)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            VariableKey::BuildingAge => "building_age",
            VariableKey::ClearHeightFt => "clear_height_ft",
            VariableKey::OfficePct => "office_pct",
            VariableKey::ParkingRatio => "parking_ratio",
            VariableKey::DistanceKm => "distance_km",
            VariableKey::NetRent => "net_rent",
            VariableKey::Tmi => "tmi",
            VariableKey::BuildingClass => "building_class",
            VariableKey::AreaDifference => "area_difference",
            VariableKey::BayDepthFt => "bay_depth_ft",
            VariableKey::ColumnSpacingFt => "column_spacing_ft",
            VariableKey::LotSizeAcres => "lot_size_acres",
            VariableKey::PowerAmps => "power_amps",
            VariableKey::TruckLevelDoors => "truck_level_doors",
            VariableKey::DriveInDoors => "drive_in_doors",
            VariableKey::RailAccess => "rail_access",
            VariableKey::Crane => "crane",
            VariableKey::SecureShipping => "secure_shipping",
            VariableKey::ExcessLand => "excess_land",
            VariableKey::TrailerParking => "trailer_parking",
            VariableKey::FencedYard => "fenced_yard",
            VariableKey::HvacCoverage => "hvac_coverage",
            VariableKey::SprinklerSystem => "sprinkler_system",
            VariableKey::OccupancyStatus => "occupancy_status",
            VariableKey::BuildingCondition => "building_condition",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        Self::all().find(|key| key.as_str() == value)
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of how a variable is weighted, read and ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpec {
    pub bucket: WeightBucket,
    pub kind: VariableKind,
    pub presence: PresenceRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightBucket {
    Core,
    Optional,
}

/// Ascending: lower raw value ranks better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceRule {
    /// Only an omitted value is absent.
    Explicit,
    /// A supplied zero is a placeholder and counts as absent.
    ZeroMeansAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Numeric(Direction),
    Boolean,
    /// Pre-encoded through the variable's lookup table, best = 1.
    Ordinal,
}

impl VariableKind {
    /// Projects a raw value onto a key where smaller always ranks better.
    pub fn rank_key(self, value: RawValue) -> Option<f64> {
        match (self, value) {
            (VariableKind::Numeric(Direction::Ascending), RawValue::Number(number)) => Some(number),
            (VariableKind::Numeric(Direction::Descending), RawValue::Number(number)) => {
                Some(-number)
            }
            (VariableKind::Boolean, RawValue::Flag(flag)) => Some(if flag { 0.0 } else { 1.0 }),
            (VariableKind::Ordinal, RawValue::Code(code)) => Some(f64::from(code)),
            _ => None,
        }
    }

    /// Orders two values best-first. Mismatched value shapes sort last.
    pub fn compare(self, left: RawValue, right: RawValue) -> Ordering {
        match (self.rank_key(left), self.rank_key(right)) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    pub const fn direction(self) -> Direction {
        match self {
            VariableKind::Numeric(direction) => direction,
            VariableKind::Boolean | VariableKind::Ordinal => Direction::Ascending,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            VariableKind::Numeric(_) => "numeric",
            VariableKind::Boolean => "boolean",
            VariableKind::Ordinal => "ordinal",
        }
    }
}

/// A single observation of a variable on one property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Flag(bool),
    Code(u8),
}

impl RawValue {
    /// Numeric view used by threshold filters; ordinals compare on their code.
    pub fn as_number(self) -> Option<f64> {
        match self {
            RawValue::Number(number) => Some(number),
            RawValue::Code(code) => Some(f64::from(code)),
            RawValue::Flag(_) => None,
        }
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            RawValue::Flag(flag) => Some(flag),
            _ => None,
        }
    }
}
