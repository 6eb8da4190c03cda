use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One CSV row with blank cells already dropped. Values are parsed later so
/// a bad cell can be reported with its line and column.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ComparableRow {
    #[serde(skip)]
    pub(crate) line: u64,
    #[serde(alias = "Address", default, deserialize_with = "empty_string_as_none")]
    pub(crate) address: Option<String>,
    #[serde(alias = "Unit", default, deserialize_with = "empty_string_as_none")]
    pub(crate) unit: Option<String>,
    #[serde(alias = "Subject", default, deserialize_with = "empty_string_as_none")]
    pub(crate) is_subject: Option<String>,
    #[serde(alias = "Area", alias = "Area (sf)", default, deserialize_with = "empty_string_as_none")]
    pub(crate) area_sqft: Option<String>,
    #[serde(alias = "Year Built", default, deserialize_with = "empty_string_as_none")]
    pub(crate) year_built: Option<String>,
    #[serde(alias = "Building Age", default, deserialize_with = "empty_string_as_none")]
    pub(crate) building_age: Option<String>,
    #[serde(alias = "Clear Height", default, deserialize_with = "empty_string_as_none")]
    pub(crate) clear_height_ft: Option<String>,
    #[serde(alias = "Office %", default, deserialize_with = "empty_string_as_none")]
    pub(crate) office_pct: Option<String>,
    #[serde(alias = "Parking Ratio", default, deserialize_with = "empty_string_as_none")]
    pub(crate) parking_ratio: Option<String>,
    #[serde(alias = "Distance (km)", default, deserialize_with = "empty_string_as_none")]
    pub(crate) distance_km: Option<String>,
    #[serde(alias = "Net Rent", default, deserialize_with = "empty_string_as_none")]
    pub(crate) net_rent: Option<String>,
    #[serde(alias = "TMI", default, deserialize_with = "empty_string_as_none")]
    pub(crate) tmi: Option<String>,
    #[serde(alias = "Class", default, deserialize_with = "empty_string_as_none")]
    pub(crate) building_class: Option<String>,
    #[serde(alias = "Bay Depth", default, deserialize_with = "empty_string_as_none")]
    pub(crate) bay_depth_ft: Option<String>,
    #[serde(alias = "Column Spacing", default, deserialize_with = "empty_string_as_none")]
    pub(crate) column_spacing_ft: Option<String>,
    #[serde(alias = "Lot Size (acres)", default, deserialize_with = "empty_string_as_none")]
    pub(crate) lot_size_acres: Option<String>,
    #[serde(alias = "Power (amps)", default, deserialize_with = "empty_string_as_none")]
    pub(crate) power_amps: Option<String>,
    #[serde(alias = "Truck Level Doors", default, deserialize_with = "empty_string_as_none")]
    pub(crate) truck_level_doors: Option<String>,
    #[serde(alias = "Drive In Doors", default, deserialize_with = "empty_string_as_none")]
    pub(crate) drive_in_doors: Option<String>,
    #[serde(alias = "Rail", default, deserialize_with = "empty_string_as_none")]
    pub(crate) rail_access: Option<String>,
    #[serde(alias = "Crane", default, deserialize_with = "empty_string_as_none")]
    pub(crate) crane: Option<String>,
    #[serde(alias = "Secure Shipping", default, deserialize_with = "empty_string_as_none")]
    pub(crate) secure_shipping: Option<String>,
    #[serde(alias = "Excess Land", default, deserialize_with = "empty_string_as_none")]
    pub(crate) excess_land: Option<String>,
    #[serde(alias = "Trailer Parking", default, deserialize_with = "empty_string_as_none")]
    pub(crate) trailer_parking: Option<String>,
    #[serde(alias = "Fenced Yard", default, deserialize_with = "empty_string_as_none")]
    pub(crate) fenced_yard: Option<String>,
    #[serde(alias = "HVAC", default, deserialize_with = "empty_string_as_none")]
    pub(crate) hvac_coverage: Option<String>,
    #[serde(alias = "Sprinklers", default, deserialize_with = "empty_string_as_none")]
    pub(crate) sprinkler_system: Option<String>,
    #[serde(alias = "Occupancy", default, deserialize_with = "empty_string_as_none")]
    pub(crate) occupancy_status: Option<String>,
    #[serde(alias = "Condition", default, deserialize_with = "empty_string_as_none")]
    pub(crate) building_condition: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ComparableRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<ComparableRow>() {
        let mut row = record?;
        row.line = rows.len() as u64 + 2;
        rows.push(row);
    }

    Ok(rows)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_snake_case_and_display_headers() {
        let rows = parse_rows(Cursor::new(
            "Address,Net Rent,tmi,Rail\n1 Dock Rd, 9.25 ,,yes\n",
        ))
        .expect("parse");

        let row = &rows[0];
        assert_eq!(row.line, 2);
        assert_eq!(row.address.as_deref(), Some("1 Dock Rd"));
        assert_eq!(row.net_rent.as_deref(), Some("9.25"));
        assert_eq!(row.tmi, None);
        assert_eq!(row.rail_access.as_deref(), Some("yes"));
    }
}
