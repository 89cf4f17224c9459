use anyhow::Context;
use clap::{Parser, Subcommand};
use docplus_core::config::{currency_from_env_value, offered_slots_from_env_value};
use docplus_core::constants::DEFAULT_DATA_DIR;
use docplus_core::validation::{email, optional_text, record_id, required_text};
use docplus_core::{
    audit_slots, Address, Appointment, AppointmentQueries, CoreConfig, DoctorProfile,
    DoctorService, DocumentStore, Fees,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "docplus")]
#[command(about = "DocPlus booking data operator CLI")]
struct Cli {
    /// Booking data directory
    #[arg(long, env = "DOCPLUS_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List doctors, optionally filtered by speciality
    ListDoctors {
        #[arg(long)]
        speciality: Option<String>,
    },
    /// Add a doctor
    AddDoctor {
        name: String,
        email: String,
        /// Initial login password
        password: String,
        #[arg(long)]
        speciality: String,
        #[arg(long)]
        degree: String,
        #[arg(long)]
        experience: String,
        #[arg(long)]
        about: String,
        /// Consultation fee in major currency units
        #[arg(long)]
        fees: u64,
        #[arg(long, default_value = "")]
        line1: String,
        #[arg(long, default_value = "")]
        line2: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Flip a doctor's availability
    ToggleAvailability { doctor_id: String },
    /// List appointments, newest first
    ListAppointments {
        /// Only this doctor's appointments
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Check booked slots against appointments; exits non-zero on any finding
    AuditSlots,
}

fn open_store(data_dir: PathBuf) -> anyhow::Result<DocumentStore> {
    let currency = currency_from_env_value(std::env::var("DOCPLUS_CURRENCY").ok());
    let offered = offered_slots_from_env_value(std::env::var("DOCPLUS_SLOT_TIMES").ok())
        .context("DOCPLUS_SLOT_TIMES is invalid")?;
    let cfg = CoreConfig::new(data_dir, currency, offered)?;
    let store = DocumentStore::open(Arc::new(cfg))
        .context("cannot open booking data directory")?;
    Ok(store)
}

fn print_appointment(appointment: &Appointment) {
    println!(
        "{}  {} {}  {} -> {}  {}  {}",
        appointment.id,
        appointment.slot_date,
        appointment.slot_time,
        appointment.patient_name,
        appointment.doctor_name,
        appointment.amount,
        appointment.status()
    );
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'docplus --help' for commands");
        return Ok(());
    };

    let store = open_store(cli.data_dir)?;

    match command {
        Commands::ListDoctors { speciality } => {
            let doctors = DoctorService::new(store).list(speciality.as_deref());
            if doctors.is_empty() {
                println!("No doctors found.");
            }
            for doctor in doctors {
                println!(
                    "{}  {}  {}  fees {}  {}",
                    doctor.id,
                    doctor.name,
                    doctor.speciality,
                    doctor.fees.amount(),
                    if doctor.available { "available" } else { "unavailable" }
                );
            }
        }
        Commands::AddDoctor {
            name,
            email: email_arg,
            password,
            speciality,
            degree,
            experience,
            about,
            fees,
            line1,
            line2,
            image,
        } => {
            let profile = DoctorProfile {
                name: required_text("name", &name)?,
                speciality: required_text("speciality", &speciality)?,
                degree: required_text("degree", &degree)?,
                experience: required_text("experience", &experience)?,
                about: required_text("about", &about)?,
                fees: Fees::new(fees)?,
                address: Address { line1, line2 },
                image: optional_text(image),
            };
            let doctor =
                DoctorService::new(store).add(profile, email("email", &email_arg)?, &password)?;
            println!("Added doctor {} with ID: {}", doctor.name, doctor.id);
        }
        Commands::ToggleAvailability { doctor_id } => {
            let id = record_id("doctor id", &doctor_id)?;
            let doctor = DoctorService::new(store).change_availability(&id)?;
            println!("{} is now available: {}", doctor.name, doctor.available);
        }
        Commands::ListAppointments { doctor } => {
            let queries = AppointmentQueries::new(store);
            let appointments = match doctor {
                Some(id) => queries.for_doctor(&record_id("doctor id", &id)?),
                None => queries.all(),
            };
            if appointments.is_empty() {
                println!("No appointments found.");
            }
            appointments.iter().for_each(print_appointment);
        }
        Commands::AuditSlots => {
            let report = audit_slots(&store);
            println!(
                "Checked {} doctors and {} appointments",
                report.doctors_checked, report.appointments_checked
            );
            for finding in &report.findings {
                println!(
                    "{}  {} {}  {}",
                    finding.doctor_id, finding.slot_date, finding.slot_time, finding.issue
                );
            }
            if !report.is_consistent() {
                anyhow::bail!("{} slot inconsistencies found", report.findings.len());
            }
            println!("Booked slots are consistent.");
        }
    }

    Ok(())
}
