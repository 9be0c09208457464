use crate::analyzers::AirQualityAnalyzer;
use crate::cli::args::{Cli, Commands, LinkArgs};
use crate::config::LinkerConfig;
use crate::error::{ProcessingError, Result};
use crate::linkage::{normalize, resolve_country};
use crate::models::JoinedRecord;
use crate::processors::{LinkageOutcome, LinkagePipeline};
use crate::utils::filename::generate_default_parquet_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::ParquetWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config_path = cli.config;

    match cli.command {
        Commands::Link {
            inputs,
            output_file,
            export,
            compression,
            chunk_size,
            sample,
            json,
        } => {
            if !json {
                println!("Linking air-quality measurements...");
                println!("Measurements: {}", inputs.measurements.display());
                println!("Gazetteer: {}", inputs.gazetteer.display());
            }

            let progress = ProgressReporter::new_spinner("Linking...", json);
            let outcome = link(config_path.as_deref(), &inputs, &progress).await?;
            let table = &outcome.table;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.report)?);
            } else {
                println!("\n{}", outcome.report.summary());

                if !table.is_empty() {
                    let stats = AirQualityAnalyzer::new().analyze_table(table)?;
                    println!("{}", stats.detailed_summary());
                }

                if sample > 0 && !table.is_empty() {
                    println!("Sample Records (showing {} records):", sample.min(table.len()));
                    for (i, record) in table.iter().take(sample).enumerate() {
                        println!("{}. {}", i + 1, describe(record));
                    }
                }
            }

            let output_file = output_file.or_else(|| export.then(generate_default_parquet_filename));
            if let Some(output_file) = output_file {
                let writer = ParquetWriter::new().with_compression(&compression)?;

                if let Some(parent) = output_file.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                writer.write_records_batched(table.records(), &output_file, chunk_size)?;

                if !json {
                    println!("\nWrote {} records to {}", table.len(), output_file.display());
                    println!("{}", writer.get_file_info(&output_file)?.summary());
                }
            }
        }

        Commands::Match { inputs, rejected } => {
            let progress = ProgressReporter::new_spinner("Matching cities...", false);
            let outcome = link(config_path.as_deref(), &inputs, &progress).await?;
            let mapping = &outcome.mapping;

            println!(
                "\nCity Mapping ({} scorer, threshold {}):",
                outcome.report.scorer, outcome.report.threshold
            );
            for (city, found) in mapping.iter() {
                let marker = if city == found.target { "=" } else { "->" };
                println!("  {} {} {} ({:.1})", city, marker, found.target, found.score);
            }
            println!(
                "{} matched, {} rewritten, {} rejected",
                mapping.len(),
                mapping.rewritten_count(),
                mapping.rejected().len()
            );

            if rejected && !mapping.rejected().is_empty() {
                println!("\nRejected Cities:");
                for city in mapping.rejected() {
                    match &city.best {
                        Some(best) => println!(
                            "  {} (best: {} at {:.1})",
                            city.city, best.target, best.score
                        ),
                        None => println!("  {} (no candidate within reach)", city.city),
                    }
                }
            }
        }

        Commands::Overview {
            inputs,
            country,
            city,
        } => {
            let progress = ProgressReporter::new_spinner("Linking...", false);
            let outcome = link(config_path.as_deref(), &inputs, &progress).await?;
            let table = &outcome.table;
            let country = country.map(|c| resolve_country(&c));

            match (country, city) {
                (country, Some(city)) => {
                    let city = normalize(&city);
                    let rows: Vec<&JoinedRecord> = table
                        .city_records(&city)
                        .into_iter()
                        .filter(|r| country.as_ref().map_or(true, |c| &r.country == c))
                        .collect();

                    if rows.is_empty() {
                        println!("No linked records for city '{}'", city);
                    } else {
                        println!("\nRecords for {}:", city);
                        for record in rows {
                            println!("  {}", describe(record));
                        }
                    }
                }
                (Some(country), None) => match table.country_overview(&country) {
                    Some(overview) => {
                        println!("\n{}", overview.summary());
                        println!("\nCities: {}", overview.cities.join(", "));
                    }
                    None => println!("No linked records for country '{}'", country),
                },
                (None, None) => {
                    println!("\nCountries ({}):", table.countries().len());
                    for country in table.countries() {
                        println!(
                            "  {} ({} cities, {} records)",
                            country,
                            table.cities_in_country(country).len(),
                            table.country_records(country).len()
                        );
                    }
                }
            }
        }

        Commands::Info {
            file,
            sample,
            analysis_limit,
        } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;

            if file_info.total_rows > 0 {
                let stats = AirQualityAnalyzer::new().analyze_parquet_with_limit(&file, analysis_limit)?;
                println!("\n{}", stats.detailed_summary());
            }

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing {} records):", sample);
                match writer.read_sample_records(&file, sample) {
                    Ok(records) => {
                        for (i, record) in records.iter().enumerate() {
                            println!("{}. {}", i + 1, describe(record));
                        }
                    }
                    Err(e) => println!("Error reading sample data: {}", e),
                }
            }
        }
    }

    Ok(())
}

async fn link(
    config_path: Option<&Path>,
    inputs: &LinkArgs,
    progress: &ProgressReporter,
) -> Result<LinkageOutcome> {
    let mut config = LinkerConfig::load(config_path)?;
    inputs.apply_to(&mut config);

    let mut pipeline = LinkagePipeline::new(config);
    pipeline
        .run(&inputs.measurements, &inputs.gazetteer, Some(progress))
        .await
}

fn describe(record: &JoinedRecord) -> String {
    let reading =
        |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{:.0}", v));
    format!(
        "{}, {}: AQI={}, PM2.5={}, NO2={}, Ozone={} at ({:.4}, {:.4})",
        record.city,
        record.country,
        reading(record.aqi),
        reading(record.pm25),
        reading(record.no2),
        reading(record.ozone),
        record.latitude,
        record.longitude
    )
}

/// Set up the global subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "aq_linker=debug" } else { "aq_linker=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| ProcessingError::Config(format!("Failed to initialise logging: {}", e)))
}
