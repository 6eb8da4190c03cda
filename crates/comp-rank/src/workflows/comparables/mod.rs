//! CSV import of subject and comparable property records.

mod normalizer;
mod parser;

use chrono::{Datelike, NaiveDate};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::workflows::competitive::domain::{
    BuildingClass, BuildingCondition, HvacCoverage, OccupancyStatus, OptionalFeatures, Property,
    SprinklerSystem,
};
use normalizer::{normalize_label, parse_bool, parse_fraction, parse_number};
use parser::ComparableRow;

#[derive(Debug)]
pub enum ComparablesImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
    },
}

impl std::fmt::Display for ComparablesImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparablesImportError::Io(err) => write!(f, "failed to read comparables export: {}", err),
            ComparablesImportError::Csv(err) => write!(f, "invalid comparables CSV data: {}", err),
            ComparablesImportError::InvalidField {
                line,
                column,
                value,
            } => write!(f, "line {line}: cannot read '{value}' as {column}"),
        }
    }
}

impl std::error::Error for ComparablesImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComparablesImportError::Io(err) => Some(err),
            ComparablesImportError::Csv(err) => Some(err),
            ComparablesImportError::InvalidField { .. } => None,
        }
    }
}

impl From<std::io::Error> for ComparablesImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ComparablesImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Records read from one export. Extra rows flagged as subject stay in
/// `comparables` so dataset validation can report them.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedProperties {
    pub subject: Option<Property>,
    pub comparables: Vec<Property>,
}

pub struct ComparablesImporter;

impl ComparablesImporter {
    /// `as_of` converts a `year_built` column into a building age.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        as_of: NaiveDate,
    ) -> Result<ImportedProperties, ComparablesImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, as_of)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        as_of: NaiveDate,
    ) -> Result<ImportedProperties, ComparablesImportError> {
        let mut subject = None;
        let mut comparables = Vec::new();

        for row in parser::parse_rows(reader)? {
            let property = RowReader::new(&row).property(as_of)?;
            if property.is_subject && subject.is_none() {
                subject = Some(property);
            } else {
                comparables.push(property);
            }
        }

        debug!(
            subject = subject.is_some(),
            comparables = comparables.len(),
            "comparables export imported"
        );

        Ok(ImportedProperties {
            subject,
            comparables,
        })
    }
}

struct RowReader<'a> {
    row: &'a ComparableRow,
}

impl<'a> RowReader<'a> {
    fn new(row: &'a ComparableRow) -> Self {
        Self { row }
    }

    fn invalid(&self, column: &'static str, value: &str) -> ComparablesImportError {
        ComparablesImportError::InvalidField {
            line: self.row.line,
            column,
            value: value.to_string(),
        }
    }

    fn parse<T>(
        &self,
        cell: &Option<String>,
        column: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>, ComparablesImportError> {
        match cell.as_deref() {
            None => Ok(None),
            Some(value) => parse(value)
                .map(Some)
                .ok_or_else(|| self.invalid(column, value)),
        }
    }

    fn number(&self, cell: &Option<String>, column: &'static str) -> Result<Option<f64>, ComparablesImportError> {
        self.parse(cell, column, parse_number)
    }

    fn count(&self, cell: &Option<String>, column: &'static str) -> Result<Option<u32>, ComparablesImportError> {
        self.parse(cell, column, |value| {
            parse_number(value)
                .filter(|number| {
                    *number >= 0.0 && *number <= f64::from(u32::MAX) && number.fract() == 0.0
                })
                .map(|number| number as u32)
        })
    }

    fn flag(&self, cell: &Option<String>, column: &'static str) -> Result<Option<bool>, ComparablesImportError> {
        self.parse(cell, column, parse_bool)
    }

    fn label<T>(
        &self,
        cell: &Option<String>,
        column: &'static str,
        lookup: fn(&str) -> Option<T>,
    ) -> Result<Option<T>, ComparablesImportError> {
        self.parse(cell, column, |value| lookup(&normalize_label(value)))
    }

    fn building_age(&self, as_of: NaiveDate) -> Result<Option<i32>, ComparablesImportError> {
        let row = self.row;
        let age = self.parse(&row.building_age, "building_age", |value| {
            parse_number(value)
                .map(f64::round)
                .filter(|age| age.abs() <= f64::from(i32::MAX))
                .map(|age| age as i32)
        })?;
        if age.is_some() {
            return Ok(age);
        }

        // Negative ages are pre-construction listings.
        self.parse(&row.year_built, "year_built", |value| {
            value
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(|year| as_of.year().checked_sub(year))
        })
    }

    fn property(&self, as_of: NaiveDate) -> Result<Property, ComparablesImportError> {
        let row = self.row;
        let address = row
            .address
            .clone()
            .ok_or_else(|| self.invalid("address", ""))?;

        let features = OptionalFeatures {
            bay_depth_ft: self.number(&row.bay_depth_ft, "bay_depth_ft")?,
            column_spacing_ft: self.number(&row.column_spacing_ft, "column_spacing_ft")?,
            lot_size_acres: self.number(&row.lot_size_acres, "lot_size_acres")?,
            power_amps: self.number(&row.power_amps, "power_amps")?,
            truck_level_doors: self.count(&row.truck_level_doors, "truck_level_doors")?,
            drive_in_doors: self.count(&row.drive_in_doors, "drive_in_doors")?,
            rail_access: self.flag(&row.rail_access, "rail_access")?,
            crane: self.flag(&row.crane, "crane")?,
            secure_shipping: self.flag(&row.secure_shipping, "secure_shipping")?,
            excess_land: self.flag(&row.excess_land, "excess_land")?,
            trailer_parking: self.flag(&row.trailer_parking, "trailer_parking")?,
            fenced_yard: self.flag(&row.fenced_yard, "fenced_yard")?,
            hvac_coverage: self.label(&row.hvac_coverage, "hvac_coverage", HvacCoverage::from_label)?,
            sprinkler_system: self.label(
                &row.sprinkler_system,
                "sprinkler_system",
                SprinklerSystem::from_label,
            )?,
            occupancy_status: self.label(
                &row.occupancy_status,
                "occupancy_status",
                OccupancyStatus::from_label,
            )?,
            building_condition: self.label(
                &row.building_condition,
                "building_condition",
                BuildingCondition::from_label,
            )?,
        };

        Ok(Property {
            address,
            unit: row.unit.clone().unwrap_or_default(),
            is_subject: self.flag(&row.is_subject, "is_subject")?.unwrap_or(false),
            area_sqft: self.number(&row.area_sqft, "area_sqft")?,
            building_age: self.building_age(as_of)?,
            clear_height_ft: self.number(&row.clear_height_ft, "clear_height_ft")?,
            office_pct: self.parse(&row.office_pct, "office_pct", parse_fraction)?,
            parking_ratio: self.number(&row.parking_ratio, "parking_ratio")?,
            distance_km: self.number(&row.distance_km, "distance_km")?,
            net_rent: self.number(&row.net_rent, "net_rent")?,
            tmi: self.number(&row.tmi, "tmi")?,
            building_class: self.label(&row.building_class, "building_class", BuildingClass::from_label)?,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date")
    }

    const EXPORT: &str = "\
address,unit,is_subject,area_sqft,year_built,clear_height_ft,office_pct,parking_ratio,distance_km,net_rent,tmi,building_class,power_amps,rail_access,hvac_coverage,sprinkler_system
100 Subject Way,B,yes,\"50,000\",2005,32,8%,1.2,0,$12.00,3.10,Class A,,no,Office Only,ESFR
1 Harbour Rd,,no,51000,1999,28,0.12,1.0,1.4,9.50,3.00,B,800,y,partial,wet
2 Harbour Rd,,,52500,2018,36,,0.8,3.2,10.25,2.85,a,0,,,
";

    #[test]
    fn imports_subject_and_comparables() {
        let imported = ComparablesImporter::from_reader(Cursor::new(EXPORT), as_of())
            .expect("import succeeds");

        let subject = imported.subject.expect("subject row");
        assert_eq!(subject.label(), "100 Subject Way (B)");
        assert_eq!(subject.area_sqft, Some(50_000.0));
        assert_eq!(subject.building_age, Some(20));
        assert_eq!(subject.office_pct, Some(0.08));
        assert_eq!(subject.net_rent, Some(12.0));
        assert_eq!(subject.building_class, Some(BuildingClass::A));
        assert_eq!(subject.features.rail_access, Some(false));
        assert_eq!(subject.features.hvac_coverage, Some(HvacCoverage::OfficeOnly));
        assert_eq!(subject.features.sprinkler_system, Some(SprinklerSystem::Esfr));
        assert_eq!(subject.features.power_amps, None);

        assert_eq!(imported.comparables.len(), 2);
        let first = &imported.comparables[0];
        assert!(!first.is_subject);
        assert_eq!(first.features.power_amps, Some(800.0));
        assert_eq!(first.features.rail_access, Some(true));
        let second = &imported.comparables[1];
        assert_eq!(second.building_age, Some(7));
        assert_eq!(second.office_pct, None);
        assert_eq!(second.building_class, Some(BuildingClass::A));
    }

    #[test]
    fn reports_the_offending_cell() {
        let csv = "address,net_rent\n1 Dock Rd,9.00\n2 Dock Rd,call\n";

        let error = ComparablesImporter::from_reader(Cursor::new(csv), as_of())
            .expect_err("expected invalid field");

        match error {
            ComparablesImportError::InvalidField {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, "net_rent");
                assert_eq!(value, "call");
            }
            other => panic!("expected invalid field, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_ordinal_labels() {
        let csv = "address,sprinkler_system\n1 Dock Rd,foam\n";

        assert!(matches!(
            ComparablesImporter::from_reader(Cursor::new(csv), as_of()),
            Err(ComparablesImportError::InvalidField {
                column: "sprinkler_system",
                ..
            })
        ));
    }

    #[test]
    fn future_construction_year_gives_negative_age() {
        let csv = "address,is_subject,year_built\nSubject,yes,2027\n";

        let imported = ComparablesImporter::from_reader(Cursor::new(csv), as_of())
            .expect("pre-construction row imports");

        let subject = imported.subject.expect("subject row");
        assert_eq!(subject.building_age, Some(-2));
    }

    #[test]
    fn rejects_non_finite_and_oversized_numbers() {
        for (column, value) in [
            ("building_age", "NaN"),
            ("net_rent", "inf"),
            ("clear_height_ft", "-infinity"),
            ("truck_level_doors", "4294967296"),
            ("building_age", "1e12"),
        ] {
            let csv = format!("address,{column}\n1 Dock Rd,{value}\n");

            match ComparablesImporter::from_reader(Cursor::new(csv), as_of()) {
                Err(ComparablesImportError::InvalidField {
                    column: failed,
                    value: cell,
                    ..
                }) => {
                    assert_eq!(failed, column);
                    assert_eq!(cell, value);
                }
                other => panic!("expected invalid {column}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = ComparablesImporter::from_path("./does-not-exist.csv", as_of())
            .expect_err("expected io error");

        match error {
            ComparablesImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
