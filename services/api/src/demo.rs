use crate::infra::build_engine;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Args};
use comp_rank::config::AppConfig;
use comp_rank::error::AppError;
use comp_rank::telemetry;
use comp_rank::workflows::comparables::ComparablesImporter;
use comp_rank::workflows::competitive::{
    AnalysisEngine, AnalysisError, AnalysisReport, AnalysisRequest, AnalysisStatus, BuildingClass,
    DataError, OptionalFeatures, PriceAdjustment, Property, SensitivityStatus, SplitScenario,
    VariableSolution, WeightSelection,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["input", "comparables_csv"])
))]
pub(crate) struct AnalyzeArgs {
    /// JSON analysis request (subject_property, comparables, weights, ...)
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Market CSV export with one row flagged as the subject
    #[arg(long)]
    pub(crate) comparables_csv: Option<PathBuf>,
    /// Reference date for building ages derived from year_built (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Persona to weight the ranking with, replacing any weights in the input
    #[arg(long)]
    pub(crate) persona: Option<String>,
    /// Rank the subject should reach; enables price sensitivity output
    #[arg(long)]
    pub(crate) target_rank: Option<u32>,
    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Persona to weight the sample market with (defaults to the configured persona)
    #[arg(long)]
    pub(crate) persona: Option<String>,
    /// Rank the sample subject should reach
    #[arg(long, default_value_t = 3)]
    pub(crate) target_rank: u32,
    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analysis_report(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        input,
        comparables_csv,
        as_of,
        persona,
        target_rank,
        json,
    } = args;

    let engine = load_engine()?;
    let mut request = match (input, comparables_csv) {
        (Some(path), _) => {
            let reader = BufReader::new(File::open(path)?);
            serde_json::from_reader::<_, AnalysisRequest>(reader)?
        }
        (None, Some(path)) => {
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            request_from_csv(path, as_of)?
        }
        (None, None) => {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "either --input or --comparables-csv is required",
            )))
        }
    };

    if let Some(persona) = persona {
        request.weights = Some(WeightSelection::Persona(persona));
    }
    if target_rank.is_some() {
        request.target_rank = target_rank;
    }

    let report = engine.analyze(&request)?;
    print_report(&report, json)
}

pub(crate) fn run_persona_listing() -> Result<(), AppError> {
    let engine = load_engine()?;
    let default = &engine.config().default_persona;

    println!("Weight personas");
    for profile in engine.personas().profiles() {
        let marker = if &profile.name == default {
            " (default)"
        } else {
            ""
        };
        println!(
            "- {}{}: core {:.0}% / optional {:.0}%",
            profile.name,
            marker,
            profile.core_mass() * 100.0,
            profile.optional_mass() * 100.0
        );
        if !profile.description.is_empty() {
            println!("  {}", profile.description);
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        persona,
        target_rank,
        json,
    } = args;

    let engine = load_engine()?;
    let mut request = sample_market();
    request.weights = persona.map(WeightSelection::Persona);
    request.target_rank = Some(target_rank);

    if !json {
        println!("Comparable ranking demo: sample GTA industrial market");
    }
    let report = engine.analyze(&request)?;
    print_report(&report, json)
}

fn load_engine() -> Result<AnalysisEngine, AppError> {
    let config = AppConfig::load()?;
    command_engine(&config)
}

/// Installs logging for one-shot commands and builds their engine. Logs go
/// to stderr, leaving stdout to the report.
fn command_engine(config: &AppConfig) -> Result<AnalysisEngine, AppError> {
    telemetry::init(&config.telemetry)?;
    build_engine(config)
}

fn request_from_csv(path: PathBuf, as_of: NaiveDate) -> Result<AnalysisRequest, AppError> {
    let imported = ComparablesImporter::from_path(path, as_of)?;
    let subject_property = imported
        .subject
        .ok_or(AnalysisError::Data(DataError::MissingSubject))?;

    Ok(AnalysisRequest {
        subject_property,
        comparables: imported.comparables,
        weights: None,
        must_have_filters: Vec::new(),
        target_rank: None,
    })
}

fn print_report(report: &AnalysisReport, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        render_report(report);
    }
    Ok(())
}

fn render_report(report: &AnalysisReport) {
    println!("\nPersona: {}", report.persona);
    let weights: Vec<String> = report
        .weights
        .iter()
        .map(|(key, weight)| format!("{} {:.1}%", key, weight * 100.0))
        .collect();
    println!("Weights: {}", weights.join(", "));
    if report.availability_degenerate {
        println!("Note: no optional variable is populated widely enough to rank on");
    }

    for excluded in &report.excluded {
        let failed: Vec<String> = excluded.failed.iter().map(ToString::to_string).collect();
        println!("Excluded {}: fails {}", excluded.address, failed.join(", "));
    }

    if report.status == AnalysisStatus::NoCompetitiveComparables {
        println!("No comparable passes the must-have filters; the subject is unranked.");
        return;
    }

    println!("\nRanking");
    for result in &report.properties {
        let rank = result
            .final_rank
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if result.is_subject() { " <- subject" } else { "" };
        println!(
            "{:>4}. {:<32} score {:>6.3}{}",
            rank,
            result.property.label(),
            result.weighted_score,
            marker
        );
    }

    let subject = &report.subject;
    if let (Some(rank), Some(tier)) = (subject.final_rank, subject.tier) {
        println!(
            "\nSubject {} ranks {} of {} ({})",
            subject.address,
            rank,
            report.properties.len(),
            tier.label()
        );
    }
    if !subject.tied_with.is_empty() {
        println!("Tied with: {}", subject.tied_with.join(", "));
    }
    for filter in &subject.filter_failures {
        println!("Warning: subject fails must-have filter {}", filter);
    }

    if let Some(sensitivity) = &report.sensitivity {
        println!("\nPrice sensitivity (target rank {})", sensitivity.target_rank);
        match &sensitivity.status {
            SensitivityStatus::AlreadyMeetsTarget => {
                println!("- Subject already meets the target; no price change needed");
            }
            SensitivityStatus::TargetOutOfRange { comparables } => {
                println!("- Target must be between 1 and {}", comparables + 1);
            }
            SensitivityStatus::AdjustmentRequired => {
                if let Some(gap) = sensitivity.gap {
                    println!("- Score gap to close: {:.3}", gap);
                }
                for solution in &sensitivity.adjustments {
                    match solution {
                        VariableSolution::Feasible(adjustment) => print_adjustment(adjustment),
                        VariableSolution::Infeasible { variable, reason } => {
                            println!("- {}: {}", variable, reason);
                        }
                    }
                }
                match &sensitivity.split {
                    Some(SplitScenario::Feasible {
                        rank_reduction,
                        adjustments,
                    }) => {
                        println!("- Combined move ({:.2} ranks on each):", rank_reduction);
                        for adjustment in adjustments {
                            print!("  ");
                            print_adjustment(adjustment);
                        }
                    }
                    Some(SplitScenario::Infeasible { message }) => {
                        println!("- Combined move: {}", message);
                    }
                    None => {}
                }
            }
        }
    }
}

fn print_adjustment(adjustment: &PriceAdjustment) {
    println!(
        "- {}: {:.2} -> {:.2} (reduce {:.2}, rank {} -> {})",
        adjustment.variable,
        adjustment.current_value,
        adjustment.required_value,
        adjustment.adjustment,
        adjustment.current_rank,
        adjustment.required_rank
    );
}

#[allow(clippy::too_many_arguments)]
fn listing(
    address: &str,
    area_sqft: f64,
    building_age: i32,
    clear_height_ft: f64,
    distance_km: f64,
    net_rent: f64,
    tmi: f64,
    building_class: BuildingClass,
) -> Property {
    Property {
        address: address.to_string(),
        area_sqft: Some(area_sqft),
        building_age: Some(building_age),
        clear_height_ft: Some(clear_height_ft),
        office_pct: Some(0.08),
        parking_ratio: Some(1.0),
        distance_km: Some(distance_km),
        net_rent: Some(net_rent),
        tmi: Some(tmi),
        building_class: Some(building_class),
        ..Property::default()
    }
}

fn with_doors(mut property: Property, truck_level_doors: u32, rail_access: bool) -> Property {
    property.features = OptionalFeatures {
        truck_level_doors: Some(truck_level_doors),
        rail_access: Some(rail_access),
        ..property.features
    };
    property
}

pub(crate) fn sample_market() -> AnalysisRequest {
    let mut subject = with_doors(
        listing("6500 Kennedy Rd", 82_000.0, 18, 30.0, 0.0, 13.25, 3.60, BuildingClass::B),
        8,
        false,
    );
    subject.is_subject = true;

    let comparables = vec![
        with_doors(
            listing("7420 Airport Rd", 78_500.0, 6, 36.0, 4.2, 14.75, 3.85, BuildingClass::A),
            12,
            false,
        ),
        with_doors(
            listing("1 Bramkay St", 90_000.0, 31, 24.0, 6.8, 11.50, 3.10, BuildingClass::C),
            6,
            true,
        ),
        with_doors(
            listing("2600 Steeles Ave W", 80_250.0, 14, 32.0, 9.5, 12.95, 3.45, BuildingClass::B),
            10,
            false,
        ),
        with_doors(
            listing("45 Export Blvd", 84_000.0, 22, 28.0, 2.1, 12.40, 3.30, BuildingClass::B),
            7,
            true,
        ),
        with_doors(
            listing("110 Ironside Cres", 76_000.0, 9, 32.0, 3.7, 13.90, 3.75, BuildingClass::A),
            9,
            false,
        ),
        with_doors(
            listing("3100 Mainway", 95_500.0, 27, 26.0, 12.4, 10.85, 2.95, BuildingClass::C),
            5,
            false,
        ),
        with_doors(
            listing("8 Melanie Dr", 81_000.0, 16, 30.0, 5.0, 13.10, 3.55, BuildingClass::B),
            8,
            false,
        ),
    ];

    AnalysisRequest {
        subject_property: subject,
        comparables,
        weights: None,
        must_have_filters: Vec::new(),
        target_rank: None,
    }
}
