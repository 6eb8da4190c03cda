use serde::{Deserialize, Serialize};

use super::variables::{RawValue, VariableKey};

/// One comparable, or the subject, as supplied by the caller.
///
/// Every attribute is optional at the type level. Core attributes are expected
/// by contract; a missing one degrades that property's rank instead of
/// rejecting the run. `area_difference` is never accepted here because it is
/// derived against the subject when the dataset is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub address: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub is_subject: bool,
    #[serde(default)]
    pub area_sqft: Option<f64>,
    #[serde(default)]
    pub building_age: Option<i32>,
    #[serde(default)]
    pub clear_height_ft: Option<f64>,
    /// Office finish as a fraction of total area (0.0 - 1.0).
    #[serde(default)]
    pub office_pct: Option<f64>,
    /// Parking stalls per 1,000 sq ft.
    #[serde(default)]
    pub parking_ratio: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    /// Net asking rent per sq ft.
    #[serde(default)]
    pub net_rent: Option<f64>,
    /// Taxes, maintenance and insurance pass-through per sq ft.
    #[serde(default)]
    pub tmi: Option<f64>,
    #[serde(default)]
    pub building_class: Option<BuildingClass>,
    #[serde(default, flatten)]
    pub features: OptionalFeatures,
}

impl Property {
    pub fn label(&self) -> String {
        if self.unit.trim().is_empty() {
            self.address.clone()
        } else {
            format!("{} ({})", self.address, self.unit)
        }
    }

    /// Returns the caller-supplied value for `key`, before presence rules apply.
    ///
    /// `AreaDifference` always yields `None`; it lives on the loaded candidate.
    pub fn raw_value(&self, key: VariableKey) -> Option<RawValue> {
        let features = &self.features;
        match key {
            VariableKey::BuildingAge => self.building_age.map(|age| RawValue::Number(f64::from(age))),
            VariableKey::ClearHeightFt => self.clear_height_ft.map(RawValue::Number),
            VariableKey::OfficePct => self.office_pct.map(RawValue::Number),
            VariableKey::ParkingRatio => self.parking_ratio.map(RawValue::Number),
            VariableKey::DistanceKm => self.distance_km.map(RawValue::Number),
            VariableKey::NetRent => self.net_rent.map(RawValue::Number),
            VariableKey::Tmi => self.tmi.map(RawValue::Number),
            VariableKey::BuildingClass => self.building_class.map(|class| RawValue::Code(class.code())),
            VariableKey::AreaDifference => None,
            VariableKey::BayDepthFt => features.bay_depth_ft.map(RawValue::Number),
            VariableKey::ColumnSpacingFt => features.column_spacing_ft.map(RawValue::Number),
            VariableKey::LotSizeAcres => features.lot_size_acres.map(RawValue::Number),
            VariableKey::PowerAmps => features.power_amps.map(RawValue::Number),
            VariableKey::TruckLevelDoors => features
                .truck_level_doors
                .map(|doors| RawValue::Number(f64::from(doors))),
            VariableKey::DriveInDoors => features
                .drive_in_doors
                .map(|doors| RawValue::Number(f64::from(doors))),
            VariableKey::RailAccess => features.rail_access.map(RawValue::Flag),
            VariableKey::Crane => features.crane.map(RawValue::Flag),
            VariableKey::SecureShipping => features.secure_shipping.map(RawValue::Flag),
            VariableKey::ExcessLand => features.excess_land.map(RawValue::Flag),
            VariableKey::TrailerParking => features.trailer_parking.map(RawValue::Flag),
            VariableKey::FencedYard => features.fenced_yard.map(RawValue::Flag),
            VariableKey::HvacCoverage => features.hvac_coverage.map(|hvac| RawValue::Code(hvac.code())),
            VariableKey::SprinklerSystem => features
                .sprinkler_system
                .map(|sprinkler| RawValue::Code(sprinkler.code())),
            VariableKey::OccupancyStatus => features
                .occupancy_status
                .map(|status| RawValue::Code(status.code())),
            VariableKey::BuildingCondition => features
                .building_condition
                .map(|condition| RawValue::Code(condition.code())),
        }
    }

    /// Overwrites a numeric price term, used when replaying a recommended adjustment.
    pub fn set_price(&mut self, key: VariableKey, value: f64) -> bool {
        match key {
            VariableKey::NetRent => self.net_rent = Some(value),
            VariableKey::Tmi => self.tmi = Some(value),
            _ => return false,
        }
        true
    }
}

/// The sixteen optional attributes. `None` is always absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionalFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bay_depth_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_spacing_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_size_acres: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_amps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck_level_doors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_in_doors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rail_access: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crane: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_shipping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_land: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_parking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fenced_yard: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_coverage: Option<HvacCoverage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprinkler_system: Option<SprinklerSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy_status: Option<OccupancyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_condition: Option<BuildingCondition>,
}

/// Building class. Encoded A=1, B=2, C=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingClass {
    A,
    B,
    C,
}

impl BuildingClass {
    pub const fn code(self) -> u8 {
        match self {
            BuildingClass::A => 1,
            BuildingClass::B => 2,
            BuildingClass::C => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label
            .trim_start_matches("class")
            .trim_matches(|c: char| c == '_' || c.is_whitespace())
        {
            "a" => Some(BuildingClass::A),
            "b" => Some(BuildingClass::B),
            "c" => Some(BuildingClass::C),
            _ => None,
        }
    }
}

/// HVAC coverage. Encoded full=1, partial=2, office_only=3, none=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacCoverage {
    Full,
    Partial,
    OfficeOnly,
    #[serde(rename = "none")]
    NoCoverage,
}

impl HvacCoverage {
    pub const fn code(self) -> u8 {
        match self {
            HvacCoverage::Full => 1,
            HvacCoverage::Partial => 2,
            HvacCoverage::OfficeOnly => 3,
            HvacCoverage::NoCoverage => 4,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "full" | "100%" => Some(HvacCoverage::Full),
            "partial" => Some(HvacCoverage::Partial),
            "office_only" | "office" => Some(HvacCoverage::OfficeOnly),
            "none" | "no" => Some(HvacCoverage::NoCoverage),
            _ => None,
        }
    }
}

/// Sprinkler system. Encoded esfr=1, wet=2, dry=3, none=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprinklerSystem {
    Esfr,
    Wet,
    Dry,
    #[serde(rename = "none")]
    Unsprinklered,
}

impl SprinklerSystem {
    pub const fn code(self) -> u8 {
        match self {
            SprinklerSystem::Esfr => 1,
            SprinklerSystem::Wet => 2,
            SprinklerSystem::Dry => 3,
            SprinklerSystem::Unsprinklered => 4,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "esfr" => Some(SprinklerSystem::Esfr),
            "wet" | "wet_pipe" => Some(SprinklerSystem::Wet),
            "dry" | "dry_pipe" => Some(SprinklerSystem::Dry),
            "none" | "no" => Some(SprinklerSystem::Unsprinklered),
            _ => None,
        }
    }
}

/// Occupancy status. Encoded vacant=1, notice_given=2, occupied=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    Vacant,
    NoticeGiven,
    Occupied,
}

impl OccupancyStatus {
    pub const fn code(self) -> u8 {
        match self {
            OccupancyStatus::Vacant => 1,
            OccupancyStatus::NoticeGiven => 2,
            OccupancyStatus::Occupied => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "vacant" => Some(OccupancyStatus::Vacant),
            "notice_given" | "notice" => Some(OccupancyStatus::NoticeGiven),
            "occupied" | "tenanted" => Some(OccupancyStatus::Occupied),
            _ => None,
        }
    }
}

/// Physical condition. Encoded excellent=1, good=2, fair=3, poor=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl BuildingCondition {
    pub const fn code(self) -> u8 {
        match self {
            BuildingCondition::Excellent => 1,
            BuildingCondition::Good => 2,
            BuildingCondition::Fair => 3,
            BuildingCondition::Poor => 4,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "excellent" => Some(BuildingCondition::Excellent),
            "good" => Some(BuildingCondition::Good),
            "fair" => Some(BuildingCondition::Fair),
            "poor" => Some(BuildingCondition::Poor),
            _ => None,
        }
    }
}
