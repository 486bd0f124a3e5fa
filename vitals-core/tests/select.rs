use vitals_core::{
    is_elevated, month_index, select, DatedReading, Indicator, Measurement, Selection,
    SelectionWindow, VitalsError, MONTH_NAMES,
};

fn reading(month: &str, year: i32, systolic: f64, diastolic: f64) -> DatedReading {
    DatedReading::new(
        month,
        year,
        Measurement::new(systolic, "Normal"),
        Measurement::new(diastolic, "Normal"),
    )
}

/// 30 bản ghi theo tháng liên tiếp, bắt đầu từ Jan 2021, đảo thứ tự đầu vào.
fn monthly_history(count: usize) -> Vec<DatedReading> {
    let mut history: Vec<DatedReading> = (0..count)
        .map(|offset| {
            let year = 2021 + (offset / 12) as i32;
            let month = MONTH_NAMES[offset % 12];
            reading(month, year, 100.0 + offset as f64, 60.0 + offset as f64)
        })
        .collect();
    history.reverse();
    history
}

fn label_key(label: &str) -> (i32, usize) {
    let (abbreviation, year) = label.split_once(", ").expect("Nhãn sai định dạng");
    let index = MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(abbreviation))
        .expect("Tháng không hợp lệ");
    (year.parse().expect("Năm không hợp lệ"), index)
}

fn expect_series(selection: Selection) -> vitals_core::ChartSeries {
    selection.into_series().expect("Cần có chuỗi biểu đồ")
}

#[test]
fn later_raw_record_sorts_before_current_reading() {
    let readings = vec![
        DatedReading::new(
            "January",
            2023,
            Measurement::new(120.0, "Normal"),
            Measurement::new(80.0, "Normal"),
        ),
        DatedReading::new(
            "December",
            2022,
            Measurement::new(130.0, "Higher than Normal"),
            Measurement::new(85.0, "Higher than Normal"),
        ),
    ];

    let series = expect_series(select(&readings, SelectionWindow::LastYear));

    assert_eq!(series.labels, vec!["Dec, 2022", "Jan, 2023"]);
    assert_eq!(series.systolic_series, vec![130.0, 120.0]);
    assert_eq!(series.diastolic_series, vec![85.0, 80.0]);
    assert_eq!(series.latest_reading.systolic.value, 120.0);
    assert_eq!(series.latest_reading.systolic.category, "Normal");
    assert_eq!(series.latest_reading.systolic.indicator(), Indicator::Down);
}

#[test]
fn malformed_record_is_dropped_from_every_series() {
    let mut malformed = reading("February", 2023, 999.0, 0.0);
    malformed.diastolic = None;

    let readings = vec![
        reading("January", 2023, 110.0, 70.0),
        malformed,
        reading("March", 2023, 115.0, 72.0),
        reading("April", 2023, 118.0, 75.0),
    ];

    let series = expect_series(select(&readings, SelectionWindow::LastYear));

    assert_eq!(series.len(), 3);
    assert_eq!(series.labels, vec!["Jan, 2023", "Mar, 2023", "Apr, 2023"]);
    assert!(!series.systolic_series.contains(&999.0));
    assert_eq!(series.diastolic_series.len(), 3);
}

#[test]
fn output_length_is_window_bounded_count_of_valid_records() {
    let mut readings = monthly_history(20);
    readings.push(DatedReading {
        year: None,
        ..reading("May", 2020, 1.0, 1.0)
    });
    readings.push(DatedReading {
        systolic: Some(Measurement::missing()),
        ..reading("June", 2020, 2.0, 2.0)
    });
    readings.push(DatedReading {
        month: None,
        ..reading("July", 2020, 3.0, 3.0)
    });

    for window in SelectionWindow::ALL {
        let series = expect_series(select(&readings, window));
        assert_eq!(series.len(), window.size().min(20), "window {window}");
        assert_eq!(series.systolic_series.len(), series.len());
        assert_eq!(series.diastolic_series.len(), series.len());
        assert!(series
            .systolic_series
            .iter()
            .all(|value| (100.0..120.0).contains(value)));
    }
}

#[test]
fn labels_are_chronologically_non_decreasing() {
    let readings = vec![
        reading("October", 2024, 1.0, 1.0),
        reading("March", 2023, 2.0, 2.0),
        reading("December", 2023, 3.0, 3.0),
        reading("January", 2024, 4.0, 4.0),
        reading("March", 2023, 5.0, 5.0),
        reading("July", 2022, 6.0, 6.0),
    ];

    let series = expect_series(select(&readings, SelectionWindow::Last2Years));
    let keys: Vec<_> = series.labels.iter().map(|label| label_key(label)).collect();

    assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn equal_dates_keep_input_order() {
    let readings = vec![
        reading("March", 2023, 140.0, 90.0),
        reading("February", 2023, 100.0, 60.0),
        reading("March", 2023, 150.0, 95.0),
    ];

    let series = expect_series(select(&readings, SelectionWindow::LastYear));

    assert_eq!(series.labels, vec!["Feb, 2023", "Mar, 2023", "Mar, 2023"]);
    assert_eq!(series.systolic_series, vec![100.0, 140.0, 150.0]);
    assert_eq!(series.latest_reading.systolic.value, 150.0);
}

#[test]
fn windows_keep_most_recent_entries() {
    let readings = monthly_history(30);

    let last_year = expect_series(select(&readings, SelectionWindow::LastYear));
    assert_eq!(last_year.len(), 12);
    assert_eq!(last_year.labels.first().map(String::as_str), Some("Jul, 2022"));
    assert_eq!(last_year.labels.last().map(String::as_str), Some("Jun, 2023"));

    let fifteen = expect_series(select(&readings, SelectionWindow::Last15Months));
    assert_eq!(fifteen.len(), 15);
    assert_eq!(fifteen.labels.first().map(String::as_str), Some("Apr, 2022"));

    let two_years = expect_series(select(&readings, SelectionWindow::Last2Years));
    assert_eq!(two_years.len(), 24);
    assert_eq!(two_years.labels.first().map(String::as_str), Some("Jul, 2021"));
    assert_eq!(two_years.systolic_series.last(), Some(&129.0));
}

#[test]
fn short_history_is_not_padded() {
    let readings = monthly_history(5);

    let series = expect_series(select(&readings, SelectionWindow::Last2Years));

    assert_eq!(series.len(), 5);
    assert_eq!(series.labels.first().map(String::as_str), Some("Jan, 2021"));
}

#[test]
fn no_valid_records_yields_empty() {
    let readings: Vec<DatedReading> = monthly_history(4)
        .into_iter()
        .map(|reading| DatedReading {
            year: None,
            ..reading
        })
        .collect();

    assert_eq!(select(&readings, SelectionWindow::LastYear), Selection::Empty);
    assert!(select(&[], SelectionWindow::Last2Years).is_empty());
}

#[test]
fn latest_reading_comes_from_trimmed_window_not_raw_tail() {
    let readings = monthly_history(30);
    // Phần tử cuối của đầu vào thô là Jan 2021.
    assert_eq!(readings.last().and_then(|r| r.month.as_deref()), Some("January"));

    let series = expect_series(select(&readings, SelectionWindow::LastYear));

    assert_eq!(series.latest_reading.systolic.value, 129.0);
    assert_eq!(series.latest_reading.diastolic.value, 89.0);
}

#[test]
fn zero_values_are_valid_and_unknown_months_are_not() {
    let readings = vec![
        reading("Sept", 2023, 120.0, 80.0),
        reading("march", 2023, 120.0, 80.0),
        reading("", 2023, 120.0, 80.0),
        reading("May", 2023, 0.0, 0.0),
    ];

    let series = expect_series(select(&readings, SelectionWindow::LastYear));

    assert_eq!(series.labels, vec!["May, 2023"]);
    assert_eq!(series.systolic_series, vec![0.0]);
    assert!(readings[3].is_valid());
    assert!(!readings[0].is_valid());
}

#[test]
fn selection_is_repeatable_and_leaves_input_untouched() {
    let readings = monthly_history(18);
    let before = readings.clone();

    let first = select(&readings, SelectionWindow::Last15Months);
    let second = select(&readings, SelectionWindow::Last15Months);

    assert_eq!(first, second);
    assert_eq!(readings, before);
}

#[test]
fn elevation_is_a_case_sensitive_substring_check() {
    assert!(is_elevated("Higher than Average"));
    assert!(is_elevated("Much Higher"));
    assert!(!is_elevated("higher than average"));
    assert!(!is_elevated("Lower than Average"));
    assert!(!is_elevated("Normal"));
    assert!(!is_elevated(""));

    assert_eq!(Indicator::for_category("Higher than Average"), Indicator::Up);
    assert_eq!(Indicator::Up.symbol(), "▲");
    assert_eq!(Indicator::for_category("Normal").symbol(), "▼");
}

#[test]
fn month_index_matches_calendar_order() {
    assert_eq!(month_index("January"), Some(0));
    assert_eq!(month_index("December"), Some(11));
    assert_eq!(month_index("Jan"), None);
}

#[test]
fn window_tokens_round_trip_through_text() {
    for window in SelectionWindow::ALL {
        assert_eq!(window.to_string().parse::<SelectionWindow>().ok(), Some(window));
    }

    assert_eq!("1".parse::<SelectionWindow>().ok(), Some(SelectionWindow::LastYear));
    assert_eq!("15".parse::<SelectionWindow>().ok(), Some(SelectionWindow::Last15Months));
    assert_eq!("2".parse::<SelectionWindow>().ok(), Some(SelectionWindow::Last2Years));
    assert!(matches!(
        "last-decade".parse::<SelectionWindow>(),
        Err(VitalsError::UnknownWindow(token)) if token == "last-decade"
    ));
}

#[test]
fn readings_deserialize_from_levels_wire_name() {
    let json = r#"{
        "month": "March",
        "year": 2024,
        "systolic": { "value": 160, "levels": "Higher than Average" },
        "diastolic": { "value": 78 }
    }"#;

    let parsed: DatedReading = serde_json::from_str(json).expect("JSON hợp lệ");

    assert!(parsed.is_valid());
    let systolic = parsed.systolic.expect("Có systolic");
    assert_eq!(systolic.category, "Higher than Average");
    assert_eq!(parsed.diastolic.map(|m| m.category), Some(String::new()));
}

#[test]
fn selection_serializes_with_kind_tag() {
    let empty = serde_json::to_value(Selection::Empty).expect("Serialize được");
    assert_eq!(empty, serde_json::json!({ "kind": "empty" }));

    let series = select(&monthly_history(1), SelectionWindow::LastYear);
    let value = serde_json::to_value(&series).expect("Serialize được");
    assert_eq!(value["kind"], "series");
    assert_eq!(value["labels"], serde_json::json!(["Jan, 2021"]));
    assert_eq!(
        serde_json::to_value(SelectionWindow::Last15Months).expect("Serialize được"),
        "last-15-months"
    );
}

#[test]
fn measurement_values_accept_numeric_text_and_reject_non_finite() {
    let parse = |json: &str| -> Measurement { serde_json::from_str(json).expect("JSON hợp lệ") };

    assert_eq!(parse(r#"{ "value": "138", "levels": "Normal" }"#).value, Some(138.0));
    assert_eq!(parse(r#"{ "value": " 98.6 " }"#).value, Some(98.6));
    assert_eq!(parse(r#"{ "value": 0 }"#).value, Some(0.0));
    assert_eq!(parse(r#"{ "value": "NaN" }"#).value, None);
    assert_eq!(parse(r#"{ "value": "inf" }"#).value, None);
    assert_eq!(parse(r#"{ "value": "high" }"#).value, None);
    assert_eq!(parse(r#"{ "value": null }"#).value, None);
    assert_eq!(parse(r#"{ "value": true }"#).value, None);
    assert_eq!(parse(r#"{ "levels": "Normal" }"#).value, None);
}

#[test]
fn non_finite_values_constructed_in_code_are_dropped() {
    let readings = vec![
        reading("January", 2024, f64::NAN, 80.0),
        reading("February", 2024, 120.0, f64::INFINITY),
        reading("March", 2024, 118.0, 76.0),
    ];

    let series = expect_series(select(&readings, SelectionWindow::LastYear));

    assert_eq!(series.labels, vec!["Mar, 2024"]);
    assert!(!readings[0].is_valid());
}
