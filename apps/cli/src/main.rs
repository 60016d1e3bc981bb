//! cedra - CCD generation from the command line.
//!
//! Reads normalized organization and patient records (JSON), assembles a
//! Continuity of Care Document and writes the XML artifact to a file or
//! stdout. The `demo` subcommand ships a built-in sample dataset for
//! trying the pipeline without preparing record files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use cedra_assembly::assemble;
use cedra_format::generate;
use cedra_models::{
    EncounterRecord, OrganizationRecord, PatientRecord, PerformerRecord, PostalAddress,
};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "cedra",
    about = "Command line interface for the cedra CCD generator",
    version,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a CCD from organization and patient record files.
    Generate {
        /// Path to the organization record JSON file.
        #[arg(short = 'g', long)]
        organization: PathBuf,
        /// Path to the patient record JSON file.
        #[arg(short, long)]
        patient: PathBuf,
        /// Output file path (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Assemble a CCD from the built-in sample records.
    Demo {
        /// Output file path.
        #[arg(short, long, default_value = "exampleDoc.xml")]
        output: PathBuf,
    },

    /// Print CLI version.
    Version,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Generate {
            organization,
            patient,
            output,
        } => {
            run_generate(&organization, &patient, output.as_deref())?;
        }
        Commands::Demo { output } => {
            run_generate_records(&sample_organization(), &sample_patient(), Some(&output))?;
        }
    }

    Ok(())
}

fn run_generate(organization: &Path, patient: &Path, output: Option<&Path>) -> Result<()> {
    let organization: OrganizationRecord = load_record(organization)?;
    let patient: PatientRecord = load_record(patient)?;
    run_generate_records(&organization, &patient, output)
}

fn run_generate_records(
    organization: &OrganizationRecord,
    patient: &PatientRecord,
    output: Option<&Path>,
) -> Result<()> {
    let created_at = Utc::now();
    let document = assemble(organization, patient, created_at)
        .with_context(|| format!("Failed to assemble document for patient '{}'", patient.id))?;

    tracing::info!(
        patient_id = %patient.id,
        encounters = patient.encounters.len(),
        sections = document.sections.len(),
        "Document assembled"
    );

    let text = generate(&document).context("Failed to serialize document")?;
    write_output(&text, output)
}

fn load_record<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Record file is not valid JSON: {}", path.display()))
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    if let Some(output_path) = output {
        fs::write(output_path, text)
            .with_context(|| format!("Failed to write to {:?}", output_path))?;
        eprintln!("✓ Wrote document to {:?}", output_path);
    } else {
        println!("{}", text);
    }
    Ok(())
}

fn sample_organization() -> OrganizationRecord {
    OrganizationRecord {
        name: "myFakeCompany".to_string(),
        address: PostalAddress {
            city: "Long Island".to_string(),
            state: "WA".to_string(),
            postal_code: "12345".to_string(),
            // At least one street line is required for organizations.
            street_lines: vec!["11 Bowery St".to_string()],
        },
        email: Some("fakeTesting@testing.fake".to_string()),
        telephone: Some("1-234-567-8910".to_string()),
        provider_taxonomy_code: "FakeCodeFromValueset".to_string(),
    }
}

fn sample_patient() -> PatientRecord {
    PatientRecord {
        id: "Patient0".to_string(),
        given_name: "Federico".to_string(),
        family_name: "Aufderhar".to_string(),
        date_of_birth: "19531029".to_string(),
        gender: "M".to_string(),
        address: PostalAddress {
            city: "Boston".to_string(),
            state: "CA".to_string(),
            postal_code: "16545".to_string(),
            street_lines: vec!["123 Main St".to_string(), "4D".to_string()],
        },
        email: Some("testpatient1@test.com".to_string()),
        telephone: Some("1 234-567-8910".to_string()),
        encounters: sample_encounters(),
    }
}

fn sample_encounters() -> Vec<EncounterRecord> {
    let performer = PerformerRecord {
        given_name: "Helga".to_string(),
        family_name: "Medico".to_string(),
        npi: Some("1234567".to_string()),
        provider_taxonomy_code: "101YP2500X".to_string(),
        address: PostalAddress {
            city: "Wilmington".to_string(),
            state: "AZ".to_string(),
            postal_code: "09675".to_string(),
            street_lines: vec!["38 Smith St".to_string(), "Unit 6".to_string()],
        },
    };

    vec![
        EncounterRecord {
            id: Uuid::new_v4().to_string(),
            effective_time: Utc.with_ymd_and_hms(2020, 1, 10, 9, 30, 0).unwrap(),
            encounter_type_code: "99204".to_string(),
            stage: "new".to_string(),
            performer: performer.clone(),
        },
        EncounterRecord {
            id: Uuid::new_v4().to_string(),
            effective_time: Utc.with_ymd_and_hms(2020, 11, 27, 14, 0, 0).unwrap(),
            encounter_type_code: "98966".to_string(),
            stage: "pre-op".to_string(),
            performer: performer.clone(),
        },
        EncounterRecord {
            id: Uuid::new_v4().to_string(),
            effective_time: Utc.with_ymd_and_hms(2021, 4, 1, 11, 15, 0).unwrap(),
            encounter_type_code: "99205".to_string(),
            stage: "post-op".to_string(),
            performer,
        },
    ]
}
