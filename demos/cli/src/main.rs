use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use vitals_core::{DashboardConfig, Selection, SelectionWindow};
use vitals_patient::{parse_patients_str, patient_list, summarize_patients_str, PatientDashboard};

#[derive(Parser, Debug)]
#[command(
    name = "vitals-cli",
    about = "Hiển thị bảng điều khiển huyết áp từ file JSON danh sách bệnh nhân."
)]
struct Args {
    /// Đường dẫn tới file JSON danh sách bệnh nhân.
    #[arg(short, long)]
    input: PathBuf,

    /// Tên bệnh nhân cần hiển thị.
    #[arg(short, long)]
    patient: Option<String>,

    /// Khoảng thời gian: last-year, last-15-months, last-2-years.
    #[arg(short, long)]
    window: Option<SelectionWindow>,

    /// File JSON cấu hình, mọi trường đều tuỳ chọn.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// In kết quả dạng JSON.
    #[arg(long)]
    json: bool,

    /// Chỉ liệt kê bệnh nhân.
    #[arg(long)]
    list: bool,
}

#[derive(Deserialize)]
struct FileConfig {
    #[serde(default)]
    default_window: Option<SelectionWindow>,
    #[serde(default)]
    featured_patient: Option<String>,
}

impl From<FileConfig> for DashboardConfig {
    fn from(cfg: FileConfig) -> Self {
        let mut base = DashboardConfig::default();
        if let Some(window) = cfg.default_window {
            base.default_window = window;
        }
        if let Some(name) = cfg.featured_patient {
            base.featured_patient = Some(name);
        }
        base
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DashboardConfig::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DashboardConfig::default(),
    };

    if args.list {
        let patients = parse_patients_str(&data)?;
        for summary in patient_list(&patients) {
            println!(
                "{} ({}, {})",
                summary.name,
                summary.gender.as_deref().unwrap_or("-"),
                summary
                    .age
                    .map(|age| age.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        return Ok(());
    }

    let dashboard = summarize_patients_str(&data, &config, args.patient.as_deref(), args.window)?;
    tracing::debug!(
        patient = %dashboard.profile.name,
        window = %dashboard.window,
        "built dashboard"
    );

    if args.json {
        let output =
            serde_json::to_string_pretty(&dashboard).context("Không serialize bảng điều khiển")?;
        println!("{output}");
    } else {
        let mut text = String::new();
        render_dashboard(&mut text, &dashboard).context("Không hiển thị được bảng điều khiển")?;
        print!("{text}");
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<DashboardConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Không đọc được file cấu hình {path:?}"))?;
    let cfg: FileConfig = serde_json::from_str(&raw)
        .with_context(|| format!("File cấu hình không hợp lệ {path:?}"))?;
    let config = DashboardConfig::from(cfg);
    tracing::debug!(
        path = %path.display(),
        window = %config.default_window,
        featured = ?config.featured_patient,
        "loaded dashboard config"
    );
    Ok(config)
}

fn render_dashboard(out: &mut impl fmt::Write, dashboard: &PatientDashboard) -> fmt::Result {
    let profile = &dashboard.profile;

    writeln!(out, "Patient: {}", profile.name)?;
    writeln!(
        out,
        "Gender: {} | Age: {} | Date of Birth: {}",
        or_dash(profile.gender.as_deref()),
        profile
            .age
            .map(|age| age.to_string())
            .unwrap_or_else(|| "-".to_string()),
        or_dash(profile.date_of_birth.as_deref()),
    )?;
    writeln!(
        out,
        "Contact: {} | Emergency: {} | Insurance: {}",
        or_dash(profile.phone_number.as_deref()),
        or_dash(profile.emergency_contact.as_deref()),
        or_dash(profile.insurance_type.as_deref()),
    )?;

    writeln!(out, "\nVital signs:")?;
    let vitals = &dashboard.vital_signs;
    for vital in [&vitals.respiratory_rate, &vitals.temperature, &vitals.heart_rate]
        .into_iter()
        .flatten()
    {
        let value = vital
            .value
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "  {}: {} {} {} {}",
            vital.name,
            value,
            vital.unit,
            vital.indicator().symbol(),
            vital.category
        )?;
    }

    writeln!(
        out,
        "\nBlood Pressure ({}):",
        dashboard.window.display_label()
    )?;
    match &dashboard.blood_pressure {
        Selection::Empty => {
            writeln!(out, "  No blood pressure data available")?;
        }
        Selection::Series(series) => {
            for ((label, systolic), diastolic) in series
                .labels
                .iter()
                .zip(&series.systolic_series)
                .zip(&series.diastolic_series)
            {
                writeln!(out, "  {label}: {systolic}/{diastolic}")?;
            }
            let latest = &series.latest_reading;
            writeln!(
                out,
                "  Systolic {} {} {}",
                latest.systolic.value,
                latest.systolic.indicator().symbol(),
                latest.systolic.category
            )?;
            writeln!(
                out,
                "  Diastolic {} {} {}",
                latest.diastolic.value,
                latest.diastolic.indicator().symbol(),
                latest.diastolic.category
            )?;
        }
    }

    writeln!(out, "\nDiagnostic list:")?;
    for diagnosis in &dashboard.diagnostic_list {
        writeln!(
            out,
            "  {} | {} | {}",
            diagnosis.name,
            or_dash(diagnosis.description.as_deref()),
            or_dash(diagnosis.status.as_deref())
        )?;
    }

    writeln!(out, "\nLab results:")?;
    for lab in &dashboard.lab_results {
        writeln!(out, "  {lab}")?;
    }

    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
