//! Patient-list JSON to `PatientDashboard` converter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitals_core::{
    finite_number, is_elevated, parse_number_text, select, DashboardConfig, DatedReading,
    Indicator, Measurement, Selection, SelectionWindow, VitalsError,
};

/// One patient as delivered by the remote API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientRecord {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub profile_picture: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub insurance_type: Option<String>,
    pub diagnosis_history: Vec<HistoryEntry>,
    pub diagnostic_list: Vec<Diagnosis>,
    pub lab_results: Vec<String>,
}

/// A monthly diagnosis-history entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntry {
    pub reading: DatedReading,
    pub heart_rate: Option<Measurement>,
    pub respiratory_rate: Option<Measurement>,
    pub temperature: Option<Measurement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Sidebar entry of the patient list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    /// Long form, e.g. "August 23, 1996".
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub insurance_type: Option<String>,
    pub profile_picture: Option<String>,
}

/// A vital sign card (respiratory rate, temperature, heart rate).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalSign {
    pub name: String,
    pub value: Option<f64>,
    pub unit: String,
    pub category: String,
}

impl VitalSign {
    fn from_measurement(name: &str, unit: &str, measurement: &Measurement) -> Self {
        Self {
            name: name.to_string(),
            value: measurement.value,
            unit: unit.to_string(),
            category: measurement.category.clone(),
        }
    }

    pub fn is_elevated(&self) -> bool {
        is_elevated(&self.category)
    }

    pub fn indicator(&self) -> Indicator {
        Indicator::for_category(&self.category)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalSigns {
    pub respiratory_rate: Option<VitalSign>,
    pub temperature: Option<VitalSign>,
    pub heart_rate: Option<VitalSign>,
}

/// Everything the dashboard renders for the selected patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDashboard {
    pub generated_at: DateTime<Utc>,
    pub window: SelectionWindow,
    pub profile: PatientProfile,
    pub vital_signs: VitalSigns,
    pub blood_pressure: Selection,
    pub diagnostic_list: Vec<Diagnosis>,
    pub lab_results: Vec<String>,
}

impl PatientRecord {
    /// Blood-pressure readings of the diagnosis history, in payload order.
    pub fn readings(&self) -> Vec<DatedReading> {
        self.diagnosis_history
            .iter()
            .map(|entry| entry.reading.clone())
            .collect()
    }

    /// Vital signs of the first history entry, the one the API lists as most recent.
    pub fn vital_signs(&self) -> VitalSigns {
        let Some(entry) = self.diagnosis_history.first() else {
            return VitalSigns::default();
        };

        VitalSigns {
            respiratory_rate: entry
                .respiratory_rate
                .as_ref()
                .map(|m| VitalSign::from_measurement("Respiratory Rate", "bpm", m)),
            temperature: entry
                .temperature
                .as_ref()
                .map(|m| VitalSign::from_measurement("Temperature", "°F", m)),
            heart_rate: entry
                .heart_rate
                .as_ref()
                .map(|m| VitalSign::from_measurement("Heart Rate", "bpm", m)),
        }
    }

    pub fn profile(&self) -> PatientProfile {
        PatientProfile {
            name: self.name.clone(),
            gender: self.gender.clone(),
            age: self.age,
            date_of_birth: self.date_of_birth.as_deref().and_then(format_date_of_birth),
            phone_number: self.phone_number.clone(),
            emergency_contact: self.emergency_contact.clone(),
            insurance_type: self.insurance_type.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }

    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            name: self.name.clone(),
            gender: self.gender.clone(),
            age: self.age,
            profile_picture: self.profile_picture.clone(),
        }
    }
}

/// Parse the patient list from a JSON string.
pub fn parse_patients_str(json: &str) -> Result<Vec<PatientRecord>, VitalsError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| VitalsError::Parse(err.to_string()))?;
    parse_patients_value(&value)
}

/// Parse the patient list from a `serde_json::Value`.
///
/// Field-level problems never fail the parse: wrong-typed fields are treated
/// as absent and entries without a name are skipped.
pub fn parse_patients_value(payload: &Value) -> Result<Vec<PatientRecord>, VitalsError> {
    let entries = payload.as_array().ok_or_else(|| {
        VitalsError::Parse(format!(
            "Expected an array of patients, received {}",
            json_kind(payload)
        ))
    })?;

    let mut patients = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        match parse_patient(entry) {
            Some(patient) => patients.push(patient),
            None => tracing::warn!(position, "skipping patient entry without a name"),
        }
    }

    tracing::debug!(count = patients.len(), "parsed patient list");
    Ok(patients)
}

/// Exact-name lookup.
pub fn find_patient<'a>(patients: &'a [PatientRecord], name: &str) -> Option<&'a PatientRecord> {
    patients.iter().find(|patient| patient.name == name)
}

pub fn patient_list(patients: &[PatientRecord]) -> Vec<PatientSummary> {
    patients.iter().map(PatientRecord::summary).collect()
}

/// Format `MM/DD/YYYY` (or ISO `YYYY-MM-DD`) as "August 23, 1996".
pub fn format_date_of_birth(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()?;
    Some(date.format("%B %-d, %Y").to_string())
}

/// Build the dashboard view of one patient.
pub fn build_dashboard(patient: &PatientRecord, window: SelectionWindow) -> PatientDashboard {
    let readings = patient.readings();
    let blood_pressure = select(&readings, window);

    if blood_pressure.is_empty() {
        tracing::debug!(patient = %patient.name, "no blood pressure data available");
    }

    PatientDashboard {
        generated_at: Utc::now(),
        window,
        profile: patient.profile(),
        vital_signs: patient.vital_signs(),
        blood_pressure,
        diagnostic_list: patient.diagnostic_list.clone(),
        lab_results: patient.lab_results.clone(),
    }
}

/// Parse a patient list and build the dashboard of the chosen patient.
///
/// Without an explicit name the configured featured patient is used, then the
/// first patient of the list.
pub fn summarize_patients_str(
    json: &str,
    config: &DashboardConfig,
    patient: Option<&str>,
    window: Option<SelectionWindow>,
) -> Result<PatientDashboard, VitalsError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| VitalsError::Parse(err.to_string()))?;
    summarize_patients_value(&value, config, patient, window)
}

pub fn summarize_patients_value(
    payload: &Value,
    config: &DashboardConfig,
    patient: Option<&str>,
    window: Option<SelectionWindow>,
) -> Result<PatientDashboard, VitalsError> {
    let patients = parse_patients_value(payload)?;
    let chosen = choose_patient(&patients, config, patient)?;
    Ok(build_dashboard(chosen, window.unwrap_or(config.default_window)))
}

fn choose_patient<'a>(
    patients: &'a [PatientRecord],
    config: &DashboardConfig,
    requested: Option<&str>,
) -> Result<&'a PatientRecord, VitalsError> {
    if let Some(name) = requested {
        return find_patient(patients, name)
            .ok_or_else(|| VitalsError::PatientNotFound(name.to_string()));
    }

    if let Some(featured) = config.featured_patient.as_deref() {
        if let Some(found) = find_patient(patients, featured) {
            return Ok(found);
        }
        tracing::debug!(featured, "featured patient not in list, using first entry");
    }

    patients.first().ok_or(VitalsError::MissingData)
}

fn parse_patient(entry: &Value) -> Option<PatientRecord> {
    let name = extract_string(entry, "name")?;

    let diagnosis_history: Vec<HistoryEntry> = entry
        .get("diagnosis_history")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(parse_history_entry).collect())
        .unwrap_or_default();

    let diagnostic_list: Vec<Diagnosis> = entry
        .get("diagnostic_list")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_diagnosis).collect())
        .unwrap_or_default();

    let lab_results: Vec<String> = entry
        .get("lab_results")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(PatientRecord {
        name,
        gender: extract_string(entry, "gender"),
        age: entry
            .get("age")
            .and_then(extract_integer)
            .and_then(|age| u32::try_from(age).ok()),
        profile_picture: extract_string(entry, "profile_picture"),
        date_of_birth: extract_string(entry, "date_of_birth"),
        phone_number: extract_string(entry, "phone_number"),
        emergency_contact: extract_string(entry, "emergency_contact"),
        insurance_type: extract_string(entry, "insurance_type"),
        diagnosis_history,
        diagnostic_list,
        lab_results,
    })
}

fn parse_history_entry(entry: &Value) -> HistoryEntry {
    let blood_pressure = entry.get("blood_pressure");

    let reading = DatedReading {
        month: extract_string(entry, "month"),
        year: entry
            .get("year")
            .and_then(extract_integer)
            .and_then(|year| i32::try_from(year).ok()),
        systolic: blood_pressure.and_then(|bp| bp.get("systolic")).and_then(parse_measurement),
        diastolic: blood_pressure.and_then(|bp| bp.get("diastolic")).and_then(parse_measurement),
    };

    HistoryEntry {
        reading,
        heart_rate: entry.get("heart_rate").and_then(parse_measurement),
        respiratory_rate: entry.get("respiratory_rate").and_then(parse_measurement),
        temperature: entry.get("temperature").and_then(parse_measurement),
    }
}

fn parse_measurement(value: &Value) -> Option<Measurement> {
    if !value.is_object() {
        return None;
    }

    let category = value
        .get("levels")
        .or_else(|| value.get("category"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(Measurement {
        value: value.get("value").and_then(extract_number),
        category,
    })
}

fn parse_diagnosis(value: &Value) -> Option<Diagnosis> {
    Some(Diagnosis {
        name: extract_string(value, "name")?,
        description: extract_string(value, "description"),
        status: extract_string(value, "status"),
    })
}

fn extract_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn extract_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().and_then(finite_number),
        Value::String(text) => parse_number_text(text),
        _ => None,
    }
}

fn extract_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
