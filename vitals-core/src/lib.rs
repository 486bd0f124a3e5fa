//! Logic lõi chọn, sắp xếp và cắt cửa sổ chuỗi huyết áp cho biểu đồ.

use std::fmt;
use std::str::FromStr;

use chrono::Month;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Mười hai tên tháng tiếng Anh theo thứ tự lịch.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const ELEVATED_MARKER: &str = "Higher";

/// Cấu hình mặc định cho bảng điều khiển.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Cửa sổ hiển thị khi người dùng chưa chọn.
    pub default_window: SelectionWindow,
    /// Bệnh nhân được mở sẵn khi tải danh sách.
    pub featured_patient: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_window: SelectionWindow::default(),
            featured_patient: Some("Jessica Taylor".to_string()),
        }
    }
}

impl DashboardConfig {
    /// Bộ lọc log khi `RUST_LOG` không được đặt.
    pub fn default_log_filter() -> &'static str {
        "warn"
    }
}

/// Khoảng nhìn lại, tính theo số bản ghi hợp lệ gần nhất.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SelectionWindow {
    #[default]
    #[serde(rename = "last-year")]
    LastYear,
    #[serde(rename = "last-15-months")]
    Last15Months,
    #[serde(rename = "last-2-years")]
    Last2Years,
}

impl SelectionWindow {
    pub const ALL: [SelectionWindow; 3] = [
        SelectionWindow::LastYear,
        SelectionWindow::Last15Months,
        SelectionWindow::Last2Years,
    ];

    /// Số bản ghi tối đa giữ lại.
    pub fn size(self) -> usize {
        match self {
            SelectionWindow::LastYear => 12,
            SelectionWindow::Last15Months => 15,
            SelectionWindow::Last2Years => 24,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SelectionWindow::LastYear => "last-year",
            SelectionWindow::Last15Months => "last-15-months",
            SelectionWindow::Last2Years => "last-2-years",
        }
    }

    /// Nhãn hiển thị trong ô chọn.
    pub fn display_label(self) -> &'static str {
        match self {
            SelectionWindow::LastYear => "Last 1 Year",
            SelectionWindow::Last15Months => "Last 15 Months",
            SelectionWindow::Last2Years => "Last 2 Years",
        }
    }
}

impl fmt::Display for SelectionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionWindow {
    type Err = VitalsError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        // "1", "15", "2" là giá trị của ô chọn trên giao diện web.
        match input.trim() {
            "last-year" | "1" => Ok(SelectionWindow::LastYear),
            "last-15-months" | "15" => Ok(SelectionWindow::Last15Months),
            "last-2-years" | "2" => Ok(SelectionWindow::Last2Years),
            other => Err(VitalsError::UnknownWindow(other.to_string())),
        }
    }
}

/// Một giá trị đo kèm phân loại dạng văn bản tự do.
///
/// `value` chấp nhận số hoặc chuỗi số như `"138"`; giá trị không hữu hạn
/// hoặc không đọc được được coi là thiếu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    #[serde(default, deserialize_with = "lenient_number")]
    pub value: Option<f64>,
    #[serde(default, alias = "levels")]
    pub category: String,
}

impl Measurement {
    pub fn new(value: f64, category: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            category: category.into(),
        }
    }

    /// Giá trị thiếu, phân loại rỗng.
    pub fn missing() -> Self {
        Self {
            value: None,
            category: String::new(),
        }
    }
}

/// Một lần đo huyết áp gắn với tháng/năm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatedReading {
    pub month: Option<String>,
    pub year: Option<i32>,
    pub systolic: Option<Measurement>,
    pub diastolic: Option<Measurement>,
}

impl DatedReading {
    pub fn new(
        month: impl Into<String>,
        year: i32,
        systolic: Measurement,
        diastolic: Measurement,
    ) -> Self {
        Self {
            month: Some(month.into()),
            year: Some(year),
            systolic: Some(systolic),
            diastolic: Some(diastolic),
        }
    }

    /// Bản ghi có đủ tháng, năm và cả hai giá trị huyết áp.
    pub fn is_valid(&self) -> bool {
        ValidReading::try_from(self).is_ok()
    }
}

/// Số hữu hạn từ giá trị đã đọc; NaN và vô cực bị loại.
pub fn finite_number(value: f64) -> Option<f64> {
    Some(value).filter(|value| value.is_finite())
}

/// Đọc chuỗi số (`"138"`, `" 98.6 "`) thành số hữu hạn.
pub fn parse_number_text(text: &str) -> Option<f64> {
    text.trim().parse().ok().and_then(finite_number)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Number(value)) => finite_number(value),
        Some(RawNumber::Text(text)) => parse_number_text(&text),
        Some(RawNumber::Other(_)) | None => None,
    })
}

/// Vị trí (0-11) của tên tháng trong lịch, so khớp chính xác.
pub fn month_index(name: &str) -> Option<usize> {
    MONTH_NAMES.iter().position(|month| *month == name)
}

/// Phân loại có chứa "Higher" (phân biệt hoa thường) được coi là tăng cao.
pub fn is_elevated(category: &str) -> bool {
    category.contains(ELEVATED_MARKER)
}

/// Mũi tên hiển thị cạnh giá trị.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Up,
    Down,
}

impl Indicator {
    pub fn for_category(category: &str) -> Self {
        if is_elevated(category) {
            Indicator::Up
        } else {
            Indicator::Down
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Indicator::Up => "▲",
            Indicator::Down => "▼",
        }
    }
}

/// Giá trị đã được xác thực của bản ghi mới nhất.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingValue {
    pub value: f64,
    pub category: String,
}

impl ReadingValue {
    pub fn is_elevated(&self) -> bool {
        is_elevated(&self.category)
    }

    pub fn indicator(&self) -> Indicator {
        Indicator::for_category(&self.category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestReading {
    pub systolic: ReadingValue,
    pub diastolic: ReadingValue,
}

/// Dữ liệu sẵn sàng cho biểu đồ: nhãn và hai chuỗi số cùng chỉ số.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub systolic_series: Vec<f64>,
    pub diastolic_series: Vec<f64>,
    pub latest_reading: LatestReading,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Luôn `false` với chuỗi được tạo bởi [`select`].
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Kết quả chọn: chuỗi biểu đồ hoặc trạng thái "không có dữ liệu".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Series(ChartSeries),
    Empty,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }

    pub fn series(&self) -> Option<&ChartSeries> {
        match self {
            Selection::Series(series) => Some(series),
            Selection::Empty => None,
        }
    }

    pub fn into_series(self) -> Option<ChartSeries> {
        match self {
            Selection::Series(series) => Some(series),
            Selection::Empty => None,
        }
    }
}

/// Lý do một bản ghi bị loại.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingMonth,
    UnknownMonth,
    MissingYear,
    MissingSystolic,
    MissingDiastolic,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::MissingMonth => "missing month",
            Rejection::UnknownMonth => "unrecognised month name",
            Rejection::MissingYear => "missing year",
            Rejection::MissingSystolic => "missing systolic value",
            Rejection::MissingDiastolic => "missing diastolic value",
        };
        f.write_str(reason)
    }
}

struct ValidReading<'a> {
    month_name: &'a str,
    month: Month,
    year: i32,
    systolic: ReadingValue,
    diastolic: ReadingValue,
}

impl ValidReading<'_> {
    fn sort_key(&self) -> (i32, u32) {
        (self.year, self.month.number_from_month())
    }

    fn label(&self) -> String {
        let abbreviation: String = self.month_name.chars().take(3).collect();
        format!("{abbreviation}, {}", self.year)
    }
}

impl<'a> TryFrom<&'a DatedReading> for ValidReading<'a> {
    type Error = Rejection;

    fn try_from(reading: &'a DatedReading) -> Result<Self, Self::Error> {
        let month_name = reading
            .month
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(Rejection::MissingMonth)?;
        let year = reading.year.ok_or(Rejection::MissingYear)?;
        let systolic =
            validated_value(reading.systolic.as_ref()).ok_or(Rejection::MissingSystolic)?;
        let diastolic =
            validated_value(reading.diastolic.as_ref()).ok_or(Rejection::MissingDiastolic)?;
        let month = month_index(month_name)
            .and_then(|index| u8::try_from(index + 1).ok())
            .and_then(|number| Month::try_from(number).ok())
            .ok_or(Rejection::UnknownMonth)?;

        Ok(Self {
            month_name,
            month,
            year,
            systolic,
            diastolic,
        })
    }
}

fn validated_value(measurement: Option<&Measurement>) -> Option<ReadingValue> {
    let measurement = measurement?;
    Some(ReadingValue {
        value: measurement.value.and_then(finite_number)?,
        category: measurement.category.clone(),
    })
}

/// Chọn các bản ghi hợp lệ, sắp xếp theo (năm, tháng) và giữ N bản ghi cuối.
///
/// Bản ghi thiếu dữ liệu bị bỏ qua, không phải lỗi. Khi không còn bản ghi
/// hợp lệ nào, trả về [`Selection::Empty`]. Sắp xếp ổn định: các bản ghi
/// cùng tháng giữ thứ tự đầu vào.
pub fn select(readings: &[DatedReading], window: SelectionWindow) -> Selection {
    let mut valid: Vec<ValidReading<'_>> = readings
        .iter()
        .enumerate()
        .filter_map(|(position, reading)| match ValidReading::try_from(reading) {
            Ok(valid) => Some(valid),
            Err(reason) => {
                tracing::debug!(position, %reason, "dropping blood pressure reading");
                None
            }
        })
        .collect();

    if valid.is_empty() {
        tracing::debug!(total = readings.len(), "no valid blood pressure readings");
        return Selection::Empty;
    }

    valid.sort_by_key(ValidReading::sort_key);

    let start = valid.len().saturating_sub(window.size());
    let kept = &valid[start..];

    let Some(last) = kept.last() else {
        return Selection::Empty;
    };

    tracing::debug!(
        total = readings.len(),
        valid = valid.len(),
        kept = kept.len(),
        %window,
        "selected blood pressure window"
    );

    Selection::Series(ChartSeries {
        labels: kept.iter().map(ValidReading::label).collect(),
        systolic_series: kept.iter().map(|reading| reading.systolic.value).collect(),
        diastolic_series: kept.iter().map(|reading| reading.diastolic.value).collect(),
        latest_reading: LatestReading {
            systolic: last.systolic.clone(),
            diastolic: last.diastolic.clone(),
        },
    })
}

/// Lỗi chung của các lớp bao quanh bộ chọn.
#[derive(Debug, thiserror::Error)]
pub enum VitalsError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Khoảng thời gian không hợp lệ: {0}")]
    UnknownWindow(String),
    #[error("Không tìm thấy bệnh nhân: {0}")]
    PatientNotFound(String),
    #[error("Lỗi khác: {0}")]
    Other(String),
}
