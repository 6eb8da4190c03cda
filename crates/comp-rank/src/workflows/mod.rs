pub mod comparables;
pub mod competitive;
