use colstore_common::{ColumnMode, Interval, PlotDesignation};
use chrono::NaiveDate;
use colstore_eval::{Column, ColumnConfig, FormulaBinding};
use colstore_workbook::{
    LoadError, Spreadsheet, WorkbookConfig, WorkbookError, column_to_xml, load_column,
};

fn sample() -> Spreadsheet {
    let mut sheet = Spreadsheet::new("data");
    let x = sheet.add_column("x", ColumnMode::Double).unwrap();
    x.replace_values(0, &[1.5, 2.5, 3.5, 4.5]);
    x.set_invalid_row(2, true);
    x.set_masked(Interval::new(0, 1), true);
    x.set_formula(Interval::new(1, 3), "i*1.5");
    x.set_plot_designation(PlotDesignation::X);

    let n = sheet.add_column("n", ColumnMode::BigInt).unwrap();
    n.replace_big_ints(0, &[i64::MAX, -1, 0, 7]);

    let y = sheet.add_column("y", ColumnMode::Double).unwrap();
    y.set_column_formula(
        FormulaBinding::new("x*2")
            .variable("x", &x)
            .auto_update(true),
    );
    y.update_formula();
    sheet
}

#[test]
fn test_file_round_trip_preserves_rows_and_maps() {
    let sheet = sample();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.xml");
    sheet.save_xml(&path).unwrap();

    let (back, warnings) = Spreadsheet::load_xml(&path, WorkbookConfig::default()).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(back.name(), "data");
    assert_eq!(back.column_count(), 3);
    assert_eq!(back.row_count(), 4);

    let x = back.column("x").unwrap();
    assert_eq!(x.value_at(3), 4.5);
    assert_eq!(x.invalid_intervals(), vec![Interval::row(2)]);
    assert_eq!(x.masked_intervals(), vec![Interval::new(0, 1)]);
    assert_eq!(x.formula_intervals(), vec![(Interval::new(1, 3), "i*1.5".to_string())]);
    assert_eq!(x.plot_designation(), PlotDesignation::X);
    assert_eq!(x.path(), "data/x");

    let n = back.column("n").unwrap();
    assert_eq!(n.column_mode(), ColumnMode::BigInt);
    assert_eq!(n.big_int_at(0), i64::MAX);
    assert_eq!(n.big_int_at(2), 0);
}

#[test]
fn test_formula_rebinds_after_load() {
    let xml = sample().to_xml().unwrap();
    let (back, _) = Spreadsheet::from_xml(&xml, WorkbookConfig::default()).unwrap();
    let x = back.column("x").unwrap();
    let y = back.column("y").unwrap();
    assert!(y.dangling_formula_paths().is_empty());
    assert_eq!(y.value_at(0), 3.0);

    x.set_value_at(0, 10.0);
    assert_eq!(y.value_at(0), 20.0);
}

#[test]
fn test_forward_reference_binds_at_finalize() {
    // y is stored before the column it reads
    let xml = r#"<spreadsheet name="s">
        <column name="y" mode="double" plot_designation="none" width="0" rows="1">
            <formula autoUpdate="1" autoResize="1">
                <text>x+1</text>
                <variableNames><name>x</name></variableNames>
                <columnPathes><path>s/x</path></columnPathes>
            </formula>
        </column>
        <column name="x" mode="double" plot_designation="none" width="0" rows="2">
            <row index="0" invalid="no">1</row>
            <row index="1" invalid="no">2</row>
        </column>
    </spreadsheet>"#;
    let (sheet, warnings) = Spreadsheet::from_xml(xml, WorkbookConfig::default()).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    let y = sheet.column("y").unwrap();
    assert!(y.dangling_formula_paths().is_empty());
    sheet.column("x").unwrap().set_value_at(1, 5.0);
    assert_eq!(y.row_count(), 2);
    assert_eq!(y.value_at(1), 6.0);
}

#[test]
fn test_missing_argument_is_reported() {
    let xml = r#"<spreadsheet name="s">
        <column name="y" mode="double" plot_designation="none" width="0">
            <formula autoUpdate="0" autoResize="0">
                <text>z</text>
                <variableNames><name>z</name></variableNames>
                <columnPathes><path>other/z</path></columnPathes>
            </formula>
        </column>
        <chart/>
    </spreadsheet>"#;
    let (_, warnings) = Spreadsheet::from_xml(xml, WorkbookConfig::default()).unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().any(|w| w.message.contains("chart")));
    assert!(warnings.iter().any(|w| w.message.contains("other/z")));
}

#[test]
fn test_malformed_column_aborts_load() {
    let xml = r#"<spreadsheet name="s"><column name="x" mode="double"/></spreadsheet>"#;
    let err = Spreadsheet::from_xml(xml, WorkbookConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        WorkbookError::Load(LoadError::MissingAttribute { attribute: "width", .. })
    ));

    let err = Spreadsheet::from_xml("<table/>", WorkbookConfig::default()).unwrap_err();
    assert!(matches!(err, WorkbookError::Load(LoadError::UnexpectedElement { .. })));

    let err = Spreadsheet::from_xml(r#"<spreadsheet name="s">"#, WorkbookConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        WorkbookError::Load(LoadError::UnexpectedEof | LoadError::Xml(_))
    ));
}

#[test]
fn test_loaded_columns_share_the_undo_stack() {
    let xml = sample().to_xml().unwrap();
    let (back, _) = Spreadsheet::from_xml(&xml, WorkbookConfig::default()).unwrap();
    assert!(!back.undo_stack().can_undo());
    back.remove_rows(0, 2);
    assert_eq!(back.row_count(), 2);
    assert!(back.undo());
    assert_eq!(back.column("x").unwrap().value_at(0), 1.5);
    assert!(back.column("x").unwrap().is_masked(1));
}

#[test]
fn test_row_index_outside_range_fails_load() {
    let xml = r#"<spreadsheet name="s">
        <column name="x" mode="double" plot_designation="x" width="0">
            <row index="18446744073709551615">1</row>
        </column>
    </spreadsheet>"#;
    let err = Spreadsheet::from_xml(xml, WorkbookConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        WorkbookError::Load(LoadError::RowOutOfRange { index: usize::MAX, .. })
    ));

    let xml = r#"<spreadsheet name="s">
        <column name="x" mode="double" plot_designation="x" width="0" rows="2">
            <row index="5">1</row>
        </column>
    </spreadsheet>"#;
    let err = Spreadsheet::from_xml(xml, WorkbookConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        WorkbookError::Load(LoadError::RowOutOfRange { index: 5, rows: 2, .. })
    ));
}

#[test]
fn test_row_count_above_configured_cap_fails_load() {
    let config = WorkbookConfig {
        column: ColumnConfig::default().with_max_loaded_rows(10),
        ..WorkbookConfig::default()
    };
    let xml = r#"<spreadsheet name="s">
        <column name="x" mode="double" plot_designation="x" width="0" rows="11"/>
    </spreadsheet>"#;
    let err = Spreadsheet::from_xml(xml, config.clone()).unwrap_err();
    assert!(matches!(
        err,
        WorkbookError::Load(LoadError::InvalidAttribute { attribute: "rows", .. })
    ));

    let xml = r#"<spreadsheet name="s">
        <column name="x" mode="double" plot_designation="x" width="0">
            <row index="10">1</row>
        </column>
    </spreadsheet>"#;
    let err = Spreadsheet::from_xml(xml, config).unwrap_err();
    assert!(matches!(
        err,
        WorkbookError::Load(LoadError::RowOutOfRange { index: 10, rows: 10, .. })
    ));
}

#[test]
fn test_intervals_past_last_row_are_clamped() {
    let xml = r#"<spreadsheet name="s">
        <column name="x" mode="double" plot_designation="x" width="0" rows="4">
            <mask start_row="2" end_row="9"/>
            <mask start_row="6" end_row="7"/>
            <formula start_row="3" end_row="100">i</formula>
        </column>
    </spreadsheet>"#;
    let (sheet, warnings) = Spreadsheet::from_xml(xml, WorkbookConfig::default()).unwrap();
    let x = sheet.column("x").unwrap();
    assert_eq!(x.row_count(), 4);
    assert_eq!(x.masked_intervals(), vec![Interval::new(2, 3)]);
    assert_eq!(x.formula_intervals(), vec![(Interval::row(3), "i".to_string())]);
    assert_eq!(warnings.len(), 3, "{warnings:?}");
    assert!(warnings.iter().any(|w| w.message.starts_with("dropping mask")));
}

#[test]
fn test_date_times_are_saved_to_the_millisecond() {
    let fine = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_nano_opt(13, 5, 7, 123_456_789)
        .unwrap();
    let source = Column::from_date_times("t", vec![Some(fine), None]);
    let xml = column_to_xml(&source).unwrap();
    assert!(xml.contains("2024-02-29 13:05:07.123<"), "{xml}");

    let target = Column::new("t", ColumnMode::DateTime);
    load_column(&xml, &target).unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_milli_opt(13, 5, 7, 123)
        .unwrap();
    assert_eq!(target.date_time_at(0), Some(expected));
    assert_eq!(target.date_time_at(1), None);
}
