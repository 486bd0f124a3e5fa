//! Bridge WASM <-> JavaScript cho bộ chọn huyết áp và bảng điều khiển bệnh nhân.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use vitals_core::{DashboardConfig, SelectionWindow, VitalsError};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsDashboardConfig {
    #[serde(default)]
    default_window: Option<String>,
    #[serde(default)]
    featured_patient: Option<String>,
}

impl TryFrom<JsDashboardConfig> for DashboardConfig {
    type Error = VitalsError;

    fn try_from(cfg: JsDashboardConfig) -> Result<Self, Self::Error> {
        let mut base = DashboardConfig::default();
        if let Some(window) = cfg.default_window {
            base.default_window = window.parse()?;
        }
        if let Some(name) = cfg.featured_patient {
            base.featured_patient = Some(name);
        }
        Ok(base)
    }
}

/// Chọn chuỗi huyết áp từ mảng `diagnosis_history` theo định dạng API.
#[wasm_bindgen]
pub fn select_blood_pressure(
    history: JsValue,
    window: Option<String>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let history_value = from_value::<serde_json::Value>(history)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được lịch sử chẩn đoán: {err}")))?;

    let window = parse_window(window.as_deref()).map_err(to_js_error)?;
    let selection = select_from_history(&history_value, window).map_err(to_js_error)?;

    to_value(&selection)
        .map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

/// Dựng bảng điều khiển cho một bệnh nhân từ danh sách API.
#[wasm_bindgen]
pub fn build_dashboard(
    patients: JsValue,
    patient: Option<String>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let patients_value = from_value::<serde_json::Value>(patients)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách bệnh nhân: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsDashboardConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            DashboardConfig::try_from(cfg).map_err(to_js_error)?
        }
        None => DashboardConfig::default(),
    };

    let dashboard =
        vitals_patient::summarize_patients_value(&patients_value, &cfg, patient.as_deref(), None)
            .map_err(to_js_error)?;

    to_value(&dashboard)
        .map_err(|err| JsValue::from_str(&format!("Không serialize bảng điều khiển: {err}")))
}

fn parse_window(window: Option<&str>) -> Result<SelectionWindow, VitalsError> {
    window.map_or(Ok(SelectionWindow::default()), |token| token.parse())
}

/// Bọc mảng lịch sử thành một bệnh nhân tạm để dùng chung bộ phân tích.
fn select_from_history(
    history: &serde_json::Value,
    window: SelectionWindow,
) -> Result<vitals_core::Selection, VitalsError> {
    if !history.is_array() {
        return Err(VitalsError::Parse("diagnosis_history phải là một mảng".to_string()));
    }

    let wrapped = serde_json::json!([{ "name": "_", "diagnosis_history": history }]);
    let patients = vitals_patient::parse_patients_value(&wrapped)?;
    let patient = patients.first().ok_or(VitalsError::MissingData)?;

    Ok(vitals_core::select(&patient.readings(), window))
}

fn to_js_error(err: VitalsError) -> JsValue {
    JsValue::from_str(&format_vitals_error(err))
}

fn format_vitals_error(err: VitalsError) -> String {
    format!("Vitals error: {err}")
}
