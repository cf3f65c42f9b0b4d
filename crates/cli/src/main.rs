use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use feedback_core::access::preselected_departments;
use feedback_core::config::{load_admin_roster, DashboardConfig};
use feedback_core::dashboard::Dashboard;
use feedback_core::db::{self, StoreError};
use feedback_core::distribution::{available_constituencies, available_districts};
use feedback_core::export::filter_by_district;
use feedback_core::intake::Submission;
use feedback_core::schema::{AdminIdentity, AiAnalysis, Departments, PriorityLevel, Role};
use report_export::DigestInput;
use rusqlite::Connection;
use schemars::schema_for;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "feedback")]
#[command(about = "Citizen feedback intelligence CLI", long_about = None)]
struct Cli {
    /// Dashboard config file (TOML)
    #[arg(long, global = true, default_value = "dashboard.toml")]
    config: PathBuf,

    /// SQLite database path, overrides the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export JSON Schemas for the core types
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Submit and classify citizen reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Manage administrator identities
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Show the dashboard visible to an administrator
    Dashboard {
        #[arg(long)]
        user: String,
        /// Print the dashboard as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Also write a markdown digest to this path
        #[arg(long)]
        digest: Option<PathBuf>,
    },
    /// Department distribution, optionally per district and constituency
    Distribution {
        #[arg(long)]
        user: String,
        #[arg(long)]
        district: Option<String>,
        #[arg(long, requires = "district")]
        constituency: Option<String>,
    },
    /// Download analyzed reports as CSV
    Export {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "report.csv")]
        out: PathBuf,
        #[arg(long)]
        district: Option<String>,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Record a new citizen submission
    Submit(SubmitArgs),
    /// Attach classifier output to a report
    Classify {
        #[arg(long)]
        id: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        priority: String,
        #[arg(long)]
        main_issue: String,
        #[arg(long, default_value = "")]
        summary: String,
    },
}

#[derive(Args)]
struct SubmitArgs {
    #[arg(long)]
    district: String,
    #[arg(long)]
    constituency: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<u8>,
    #[arg(long)]
    mobile: String,
    #[arg(long)]
    email: Option<String>,
    /// Type of feedback, e.g. "Complaint"
    #[arg(long, default_value = "General feedback")]
    kind: String,
    #[arg(long)]
    rating: Option<u8>,
    #[arg(long)]
    text: String,
    #[arg(long)]
    solution: Option<String>,
    #[arg(long, default_value_t = false)]
    wants_updates: bool,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create an administrator
    Create {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "admin")]
        role: String,
        #[arg(long)]
        email: Option<String>,
        /// Assigned district (repeatable)
        #[arg(long = "district")]
        districts: Vec<String>,
        /// Assigned department (repeatable)
        #[arg(long = "department")]
        departments: Vec<String>,
    },
    /// Replace an administrator's districts and departments
    Update {
        #[arg(long)]
        username: String,
        #[arg(long = "district")]
        districts: Vec<String>,
        /// Leave empty to keep the current departments
        #[arg(long = "department")]
        departments: Vec<String>,
    },
    Delete {
        #[arg(long)]
        username: String,
    },
    List,
    /// Create administrators from a YAML roster, skipping existing ones
    Seed {
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::load(&cli.config)?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.database.path.clone());

    match cli.command {
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        Commands::Report { command } => {
            let conn = open_db(&db_path)?;
            match command {
                ReportCommands::Submit(args) => report_submit(&conn, args),
                ReportCommands::Classify {
                    id,
                    category,
                    priority,
                    main_issue,
                    summary,
                } => report_classify(&conn, &id, category, &priority, main_issue, summary),
            }
        }
        Commands::Admin { command } => {
            let conn = open_db(&db_path)?;
            admin_command(&conn, &config, command)
        }
        Commands::Dashboard { user, json, digest } => {
            let conn = open_db(&db_path)?;
            dashboard(&conn, &config, &user, json, digest)
        }
        Commands::Distribution {
            user,
            district,
            constituency,
        } => {
            let conn = open_db(&db_path)?;
            distribution(&conn, &user, district.as_deref(), constituency.as_deref())
        }
        Commands::Export {
            user,
            out,
            district,
        } => {
            let conn = open_db(&db_path)?;
            export(&conn, &user, out, district.as_deref())
        }
    }
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn open_db(path: &Path) -> Result<Connection> {
    let path = path
        .to_str()
        .with_context(|| format!("database path is not valid UTF-8: {}", path.display()))?;
    db::open(path)
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let schemas = [
        ("Report", schema_for!(feedback_core::schema::Report)),
        ("AdminIdentity", schema_for!(feedback_core::schema::AdminIdentity)),
        ("GroupedIssue", schema_for!(feedback_core::aggregate::GroupedIssue)),
        ("DistributionRow", schema_for!(feedback_core::distribution::DistributionRow)),
        ("ExportRecord", schema_for!(feedback_core::export::ExportRecord)),
    ];
    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

fn report_submit(conn: &Connection, args: SubmitArgs) -> Result<()> {
    let accepted = Submission {
        district: args.district,
        constituency: args.constituency,
        name: args.name,
        age: args.age,
        mobile_no: args.mobile,
        email: args.email,
        kind: Some(args.kind),
        rating: args.rating,
        text: args.text,
        solution: args.solution,
        wants_updates: args.wants_updates,
    }
    .accept()?;

    let id = uuid::Uuid::new_v4().to_string();
    let created_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
    db::insert_report(conn, &id, &created_at, &accepted)?;
    println!("{id}");
    Ok(())
}

fn report_classify(
    conn: &Connection,
    id: &str,
    category: String,
    priority: &str,
    main_issue: String,
    summary: String,
) -> Result<()> {
    let level = PriorityLevel::parse(priority);
    if level.is_none() {
        warn!(priority, "unrecognised priority, storing without one");
    }
    let analysis = AiAnalysis {
        category: Some(category),
        priority: level,
        main_issue: Some(main_issue),
        summary: Some(summary).filter(|s| !s.is_empty()),
    };
    db::classify(conn, id, &analysis)?;
    println!("Classified {id}");
    Ok(())
}

fn admin_command(conn: &Connection, config: &DashboardConfig, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Create {
            username,
            role,
            email,
            districts,
            departments,
        } => {
            let identity = new_identity(username, &role, email, districts, departments)?;
            db::create_admin(conn, &identity)?;
            println!("Created {} ({})", identity.username, identity.role);
        }
        AdminCommands::Update {
            username,
            districts,
            departments,
        } => {
            let known: BTreeSet<String> = db::known_districts(conn)?.into_iter().collect();
            let access: BTreeSet<String> = districts.into_iter().collect();
            for unknown in access.difference(&known) {
                warn!(district = %unknown, "district has no reports yet");
            }
            let departments: Departments = departments.into_iter().collect();
            let updated = db::update_admin_access(conn, &username, &access, Some(&departments))?;
            println!(
                "Updated {}: districts [{}], departments [{}]",
                updated.username,
                join(updated.access.iter()),
                join(updated.departments.iter())
            );
        }
        AdminCommands::Delete { username } => {
            db::delete_admin(conn, &username)?;
            println!("Deleted {username}");
        }
        AdminCommands::List => {
            for admin in db::list_admins(conn, None)? {
                let preset = preselected_departments(&admin, &config.departments.predefined);
                println!(
                    "{}\t{}\tdistricts: [{}]\tdepartments: [{}]\tpreset: [{}]",
                    admin.username,
                    admin.role,
                    join(admin.access.iter()),
                    join(admin.departments.iter()),
                    preset.join(", ")
                );
            }
        }
        AdminCommands::Seed { file } => {
            for identity in load_admin_roster(&file)? {
                match db::create_admin(conn, &identity) {
                    Ok(()) => println!("Created {}", identity.username),
                    Err(err) if matches!(err.downcast_ref::<StoreError>(), Some(StoreError::AdminExists(_))) => {
                        info!(username = %identity.username, "already present, skipping");
                    }
                    Err(err) => return Err(err),
                }
            }
        }
    }
    Ok(())
}

/// Super admins see every district and department, so assignments given
/// for one are a mistake rather than something to drop silently.
fn new_identity(
    username: String,
    role: &str,
    email: Option<String>,
    districts: Vec<String>,
    departments: Vec<String>,
) -> Result<AdminIdentity> {
    let role = Role::parse(role).with_context(|| format!("unknown role: {role}"))?;
    let mut identity = match role {
        Role::SuperAdmin => {
            if !districts.is_empty() || !departments.is_empty() {
                bail!("super_admin {username} sees everything; drop --district and --department");
            }
            AdminIdentity::super_admin(username)
        }
        Role::Admin => AdminIdentity::admin(username, districts, departments),
    };
    identity.email = email;
    Ok(identity)
}

fn load_identity(conn: &Connection, username: &str) -> Result<AdminIdentity> {
    db::get_admin(conn, username)?.ok_or_else(|| StoreError::AdminNotFound(username.to_string()).into())
}

fn dashboard(
    conn: &Connection,
    config: &DashboardConfig,
    username: &str,
    json: bool,
    digest: Option<PathBuf>,
) -> Result<()> {
    let identity = load_identity(conn, username)?;
    let view = Dashboard::build(conn, &identity)?;
    let limit = config.display.list_limit;

    if let Some(path) = digest {
        report_export::write_issue_digest(
            &DigestInput {
                username: &view.username,
                counts: &view.counts,
                issues: &view.issues,
                distribution: &view.distribution,
                list_limit: limit,
            },
            &path,
        )?;
        info!(path = %path.display(), "wrote digest");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "Total reports: {}  Processed: {}  Pending: {}",
        view.counts.total, view.counts.analyzed, view.counts.pending
    );
    println!();
    if view.issues.is_empty() {
        println!("No issues reported yet.");
    }
    for issue in &view.issues {
        println!(
            "[{}] {} ({}) x{}",
            issue.priority, issue.main_issue, issue.category, issue.total_reports
        );
        println!("    locations: {}", issue.districts_display(limit));
        println!("    reported by: {}", issue.reporters_display(limit));
    }
    Ok(())
}

fn distribution(
    conn: &Connection,
    username: &str,
    district: Option<&str>,
    constituency: Option<&str>,
) -> Result<()> {
    let identity = load_identity(conn, username)?;
    let view = Dashboard::build(conn, &identity)?;

    if let Some(district) = district {
        let districts = available_districts(&view.visible);
        if !districts.iter().any(|d| d == district) {
            bail!("no analyzed feedback for district {district}; available: [{}]", districts.join(", "));
        }
        let constituencies = available_constituencies(&view.visible, district);
        info!(district, constituencies = %constituencies.join(", "), "constituencies available");
    }

    let rows = view.distribution_for(district, constituency);
    if rows.is_empty() {
        println!("No feedback data available for this selection.");
    }
    for row in rows {
        println!("{}\t{}", row.department, row.count);
    }
    Ok(())
}

fn export(conn: &Connection, username: &str, out: PathBuf, district: Option<&str>) -> Result<()> {
    let identity = load_identity(conn, username)?;
    let view = Dashboard::build(conn, &identity)?;
    let records = filter_by_district(view.export, district);
    report_export::write_csv_file(&records, &out)?;
    println!("Wrote {} rows to {}", records.len(), out.display());
    Ok(())
}

fn join<'a>(values: impl Iterator<Item = &'a String>) -> String {
    values.map(String::as_str).collect::<Vec<_>>().join(", ")
}
