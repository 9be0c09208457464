use aq_linker::config::LinkerConfig;
use aq_linker::linkage::CountryResolution;
use aq_linker::models::JoinedRecord;
use aq_linker::processors::LinkagePipeline;
use aq_linker::writers::ParquetWriter;
use aq_linker::{ProcessingError, Result};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MEASUREMENT_HEADER: &str = "country_name,city_name,aqi_value,aqi_category,co_aqi_value,ozone_aqi_value,no2_aqi_value,pm2.5_aqi_value";
const GAZETTEER_HEADER: &str = "geonameid,name,asciiname,country_code,latitude,longitude,population";

fn write_csv(dir: &TempDir, name: &str, header: &str, rows: &[&str]) -> Result<PathBuf> {
    let path = dir.path().join(name);
    let mut content = format!("{}\n", header);
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content)?;
    Ok(path)
}

fn sample_inputs(dir: &TempDir) -> Result<(PathBuf, PathBuf)> {
    let measurements = write_csv(
        dir,
        "air_quality.csv",
        MEASUREMENT_HEADER,
        &[
            "France,Parris,50,Good,1,5,10,20",
            "Germany,Berlin,40,Good,1,8,20,15",
            "United States of America,New York,70,Moderate,2,30,25,70",
            "France,Zzzqqq,60,Moderate,1,6,11,21",
            "Germany,Hamburg,30,Good,1,4,9,12",
        ],
    )?;
    let gazetteer = write_csv(
        dir,
        "cities.csv",
        GAZETTEER_HEADER,
        &[
            "2988507,Paris,Paris,FR,48.85,2.35,2138551",
            "2950159,Berlin,Berlin,DE,52.52,13.41,3426354",
            "5128581,New York,New York,US,40.71,-74.01,8175133",
            "5101798,Newark,Newark,US,40.74,-74.17,281944",
            "2911298,Hamburg,Hamburg,DE,,,1739117",
        ],
    )?;
    Ok((measurements, gazetteer))
}

async fn run_default(measurements: &Path, gazetteer: &Path) -> Result<aq_linker::processors::LinkageOutcome> {
    let mut pipeline = LinkagePipeline::new(LinkerConfig::default());
    pipeline.run(measurements, gazetteer, None).await
}

#[tokio::test]
async fn test_end_to_end_linkage() -> Result<()> {
    let dir = TempDir::new()?;
    let (measurements, gazetteer) = sample_inputs(&dir)?;

    let outcome = run_default(&measurements, &gazetteer).await?;

    assert_eq!(
        outcome.table.records(),
        &[
            JoinedRecord::new("FR", "paris", 50.0, 20.0, 10.0, 5.0, 48.85, 2.35),
            JoinedRecord::new("DE", "berlin", 40.0, 15.0, 20.0, 8.0, 52.52, 13.41),
            JoinedRecord::new("US", "newyork", 70.0, 70.0, 25.0, 30.0, 40.71, -74.01),
        ]
    );

    let report = &outcome.report;
    assert_eq!(report.measurement_rows, 5);
    assert_eq!(report.gazetteer_rows, 5);
    assert_eq!(report.joined_rows, 3);
    assert_eq!(report.rejected_cities, 1);
    assert_eq!(report.missing_coordinates, 1);
    assert_eq!(report.unmatched_key, 1);
    assert_eq!(outcome.mapping.get("parris"), Some("paris"));
    assert_eq!(outcome.mapping.get("newyork"), Some("newyork"));

    Ok(())
}

#[tokio::test]
async fn test_repeated_runs_are_identical() -> Result<()> {
    let dir = TempDir::new()?;
    let (measurements, gazetteer) = sample_inputs(&dir)?;

    let first = run_default(&measurements, &gazetteer).await?;
    let second = run_default(&measurements, &gazetteer).await?;

    assert_eq!(first.table, second.table);
    assert_eq!(first.report, second.report);

    Ok(())
}

#[tokio::test]
async fn test_cache_serves_unchanged_files() -> Result<()> {
    let dir = TempDir::new()?;
    let (measurements, gazetteer) = sample_inputs(&dir)?;
    let mut pipeline = LinkagePipeline::new(LinkerConfig::default());

    let first = pipeline.run(&measurements, &gazetteer, None).await?;
    assert!(!first.report.measurements_cached);
    assert!(!first.report.gazetteer_cached);

    let second = pipeline.run(&measurements, &gazetteer, None).await?;
    assert!(second.report.measurements_cached);
    assert!(second.report.gazetteer_cached);
    assert_eq!(first.table, second.table);

    // New content for the measurement file invalidates only that entry
    write_csv(
        &dir,
        "air_quality.csv",
        MEASUREMENT_HEADER,
        &["France,Paris,55,Moderate,1,5,10,20"],
    )?;
    let third = pipeline.run(&measurements, &gazetteer, None).await?;
    assert!(!third.report.measurements_cached);
    assert!(third.report.gazetteer_cached);
    assert_eq!(third.table.len(), 1);
    assert_eq!(third.table.records()[0].aqi, Some(55.0));

    let stats = pipeline.cache().stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 3);

    Ok(())
}

#[tokio::test]
async fn test_strict_countries_with_named_gazetteer() -> Result<()> {
    let dir = TempDir::new()?;
    let measurements = write_csv(
        &dir,
        "air_quality.csv",
        MEASUREMENT_HEADER,
        &[
            "Russian Federation,Moscow,80,Moderate,1,10,30,80",
            "Narnia,Cair Paravel,10,Good,0,1,1,1",
        ],
    )?;
    let gazetteer = write_csv(
        &dir,
        "cities.csv",
        GAZETTEER_HEADER,
        &["524901,Moscow,Moscow,Russia,55.75,37.62,10381222"],
    )?;

    let mut config = LinkerConfig::default();
    config.country_resolution = CountryResolution::Strict;
    let mut pipeline = LinkagePipeline::new(config);
    let outcome = pipeline.run(&measurements, &gazetteer, None).await?;

    assert_eq!(outcome.table.len(), 1);
    assert_eq!(outcome.table.records()[0].country, "RU");
    assert_eq!(outcome.report.unresolved_measurement_countries, 1);
    assert_eq!(outcome.report.unresolved_gazetteer_countries, 0);

    Ok(())
}

#[tokio::test]
async fn test_missing_column_fails_fast() -> Result<()> {
    let dir = TempDir::new()?;
    let measurements = write_csv(
        &dir,
        "broken.csv",
        "country_name,city_name,aqi_value",
        &["France,Paris,50"],
    )?;
    let (_, gazetteer) = sample_inputs(&dir)?;

    let result = run_default(&measurements, &gazetteer).await;
    match result {
        Err(ProcessingError::MissingColumn { table, column }) => {
            assert_eq!(table, "measurement");
            assert_eq!(column, "pm2.5_aqi_value");
        }
        other => panic!("expected missing column, got {:?}", other.map(|o| o.report)),
    }

    Ok(())
}

#[tokio::test]
async fn test_latin1_gazetteer_and_custom_columns() -> Result<()> {
    let dir = TempDir::new()?;
    let measurements = write_csv(
        &dir,
        "air_quality.csv",
        MEASUREMENT_HEADER,
        &["Switzerland,Zurich,35,Good,1,20,8,35"],
    )?;

    // "Zürich" encoded as Windows-1252
    let gazetteer = dir.path().join("cities.csv");
    fs::write(&gazetteer, b"city,cc,lat,lon\nZ\xFCrich,CH,47.37,8.55\n")?;

    let mut config = LinkerConfig::default();
    config.gazetteer_columns.city = "city".to_string();
    config.gazetteer_columns.country = "cc".to_string();
    config.gazetteer_columns.latitude = "lat".to_string();
    config.gazetteer_columns.longitude = "lon".to_string();
    config.use_mmap = true;

    let mut pipeline = LinkagePipeline::new(config);
    let outcome = pipeline.run(&measurements, &gazetteer, None).await?;

    // "zrich" scores 90.9 against "zurich"
    assert_eq!(outcome.table.len(), 1);
    assert_eq!(outcome.table.records()[0].city, "zrich");
    assert_eq!(outcome.table.records()[0].latitude, 47.37);

    Ok(())
}

#[tokio::test]
async fn test_parquet_export_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let (measurements, gazetteer) = sample_inputs(&dir)?;
    let outcome = run_default(&measurements, &gazetteer).await?;

    let output_path = dir.path().join("output").join("linked.parquet");
    fs::create_dir_all(output_path.parent().unwrap())?;

    let writer = ParquetWriter::new().with_compression("zstd")?;
    writer.write_table(&outcome.table, &output_path)?;

    let file_info = writer.get_file_info(&output_path)?;
    assert_eq!(file_info.total_rows, 3);

    let restored = writer.read_table(&output_path)?;
    assert_eq!(&restored, outcome.table.as_ref());

    Ok(())
}

#[tokio::test]
async fn test_blank_reading_survives_linkage_and_export() -> Result<()> {
    let dir = TempDir::new()?;
    let measurements = write_csv(
        &dir,
        "air_quality.csv",
        MEASUREMENT_HEADER,
        &["France,Paris,50,Good,1,,10,20", "Germany,Berlin,40,Good,1,8,20,15"],
    )?;
    let gazetteer = write_csv(
        &dir,
        "cities.csv",
        GAZETTEER_HEADER,
        &[
            "2988507,Paris,Paris,FR,48.85,2.35,2138551",
            "2950159,Berlin,Berlin,DE,52.52,13.41,3426354",
        ],
    )?;

    let outcome = run_default(&measurements, &gazetteer).await?;
    assert_eq!(outcome.table.len(), 2);

    let paris = &outcome.table.records()[0];
    assert_eq!(paris.city, "paris");
    assert_eq!(paris.ozone, None);
    assert_eq!(paris.no2, Some(10.0));

    let output_path = dir.path().join("linked.parquet");
    ParquetWriter::new().write_table(&outcome.table, &output_path)?;
    let restored = ParquetWriter::new().read_table(&output_path)?;
    assert_eq!(&restored, outcome.table.as_ref());

    Ok(())
}
