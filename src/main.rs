//! Command line tool for inspecting and patching FIT files.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use chainring::{
    batch,
    geo::Position,
    profile::{BasicProfile, Profile},
    sans::{codec::OutOfBounds, data::{device_time, format_date_time}},
    scan::{
        scan,
        activity::ActivityScanner,
        coordinates::CoordinatesScanner,
        print::{PrintOptions, PrintScanner},
        product::ProductScanner,
        replace::{self, CoordinateReplacementScanner, ReplaceMode, Track},
        session::SessionScanner,
        timestamp::{self, TimestampScanner},
    },
    sport,
    store::{self, ByteStore, RawValue},
};
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "chainring")]
#[command(author, version, about = "Inspect and patch FIT activity files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print information from files
    #[command(subcommand)]
    Show(Show),
    /// Replace values in a file
    #[command(subcommand)]
    Replace(Replace),
    /// Set values in a file
    #[command(subcommand)]
    Set(Set),
}

#[derive(Subcommand)]
enum Show {
    /// Print data records as tables
    Message {
        file: PathBuf,
        /// Messages to print, by number or name
        #[arg(short, long, value_delimiter = ',')]
        message: Vec<String>,
        /// Fields to print, when a single message is selected
        #[arg(short, long, value_delimiter = ',')]
        field: Vec<u8>,
        /// Print the offset of every value
        #[arg(long)]
        offset: bool,
        /// Print stored values without conversion
        #[arg(long)]
        raw: bool,
        /// Print coordinates in degrees
        #[arg(long)]
        degrees: bool,
    },
    /// List product ids
    Product { file: PathBuf },
    /// List date-time fields
    Timestamp { file: PathBuf },
    /// Summarise the activities in files or directories
    Activities {
        paths: Vec<PathBuf>,
        /// Summarise the sessions of each activity
        #[arg(long)]
        summary: bool,
    },
    /// Measure the recorded route of activities
    Distance {
        paths: Vec<PathBuf>,
        /// Only measure activities of this sport, by number or name
        #[arg(short, long)]
        sport: Option<String>,
    },
}

#[derive(Args)]
struct Output {
    /// File to write the patched document to
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Replace {
    /// Replace product ids
    Product {
        file: PathBuf,
        /// Product id to replace, or all when omitted
        #[arg(long)]
        from: Option<u16>,
        /// New product id
        #[arg(long)]
        to: u16,
        #[command(flatten)]
        output: Output,
    },
    /// Replace the route with a track of `lat,lon` degrees in CSV
    Coordinates {
        file: PathBuf,
        #[arg(short, long)]
        track: PathBuf,
        #[arg(long, value_enum, default_value_t = Mode::Simple)]
        mode: Mode,
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Subcommand)]
enum Set {
    /// Move all timestamps so the earliest is the given local time
    Timestamp {
        file: PathBuf,
        /// Local time as YYYY-MM-DD-HH:MM:SS
        time: String,
        #[command(flatten)]
        output: Output,
    },
    /// Write a value at an offset
    Raw {
        file: PathBuf,
        #[arg(long)]
        offset: usize,
        #[arg(long = "type", value_enum)]
        kind: RawKind,
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Simple,
    Advanced,
    Session,
}

impl From<Mode> for ReplaceMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Simple => Self::Simple,
            Mode::Advanced => Self::Advanced,
            Mode::Session => Self::SessionOnly,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RawKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    String,
}

#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Store(#[from] store::Error),
    #[error(transparent)]
    Replace(#[from] replace::Error),
    #[error("Failed to read track: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Usage(String),
}

impl From<OutOfBounds> for Error {
    fn from(e: OutOfBounds) -> Self {
        Self::Store(e.into())
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Store(e.into())
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let profile = BasicProfile;

    match cli.command {
        Command::Show(show) => run_show(show, &profile),
        Command::Replace(replace) => run_replace(replace, &profile),
        Command::Set(set) => run_set(set, &profile),
    }
}

fn run_show(show: Show, profile: &dyn Profile) -> Result<(), Error> {
    let mut out = io::stdout().lock();

    match show {
        Show::Message {
            file,
            message,
            field,
            offset,
            raw,
            degrees,
        } => {
            let messages = message
                .iter()
                .map(|m| message_number(profile, m))
                .collect::<Result<Vec<_>, _>>()?;

            let options = PrintOptions { offset, raw, degrees };
            let mut scanner = PrintScanner::new(profile, &mut out, options)
                .with_messages(messages)
                .with_fields(field);

            scan(&mut ByteStore::load(file)?, &mut scanner)?;
        }
        Show::Product { file } => {
            let mut store = ByteStore::load(file)?;
            let mut scanner = ProductScanner::new();
            scan(&mut store, &mut scanner)?;

            for product in scanner.products() {
                let name = profile.message_name(product.global).unwrap_or("?");
                writeln!(
                    out,
                    "{name} product {} at offset {}",
                    product.read(&store)?,
                    product.location.offset
                )?;
            }
        }
        Show::Timestamp { file } => {
            let mut store = ByteStore::load(file)?;
            let mut scanner = TimestampScanner::new(profile);
            scan(&mut store, &mut scanner)?;

            for field in scanner.fields() {
                writeln!(
                    out,
                    "{} {} ({}) at offset {}: {}",
                    profile.message_name(field.global).unwrap_or("?"),
                    field.field,
                    field.name.unwrap_or("?"),
                    field.location.offset,
                    format_date_time(field.read(&store)?),
                )?;
            }
        }
        Show::Activities { paths, summary } => {
            let files = expand_paths(&paths)?;

            let report = if summary {
                show_summaries(&mut out, &files)?
            } else {
                show_activities(&mut out, &files)?
            };

            writeln!(out, "Found {} activities.", report.handled.len())?;
            report_failures(&report);
        }
        Show::Distance { paths, sport } => {
            let sport = match sport {
                Some(s) => sport_number(&s)?,
                None => sport::ALL,
            };

            let files = expand_paths(&paths)?;
            let mut total = 0.0;

            let report = batch::run(&files, |path, store| {
                let mut scanner = CoordinatesScanner::new(sport);
                let outcome = scan(store, &mut scanner)?;

                if !outcome.is_filtered_out() {
                    let distance = Track::from_points(scanner.positions()).total_distance();
                    total += distance;
                    writeln!(out, "{}: {:.2} km", path.display(), distance / 1000.0)?;
                }

                Ok(outcome)
            });

            writeln!(
                out,
                "Total: {:.2} km in {} files ({} filtered out)",
                total / 1000.0,
                report.handled.len(),
                report.filtered.len()
            )?;

            report_failures(&report);
        }
    }

    Ok(())
}

fn show_activities(out: &mut impl Write, files: &[PathBuf]) -> Result<batch::Report, Error> {
    let mut rows = Vec::new();

    let report = batch::run(files, |path, store| {
        let mut scanner = ActivityScanner::new();
        let outcome = scan(store, &mut scanner)?;

        if let Some(sport) = scanner.into_sport() {
            rows.push((file_name(path), sport));
        }

        Ok(outcome)
    });

    for (file, sport) in &rows {
        writeln!(
            out,
            "{} | {} | {}",
            file.display(),
            sport.name.as_deref().unwrap_or("?"),
            sport.sport_name(),
        )?;
    }

    Ok(report)
}

fn show_summaries(out: &mut impl Write, files: &[PathBuf]) -> Result<batch::Report, Error> {
    let mut rows = Vec::new();

    let report = batch::run(files, |path, store| {
        let mut scanner = SessionScanner::new(file_name(path));
        let outcome = scan(store, &mut scanner)?;

        let summary = scanner.summary();
        if summary.has_data() {
            rows.push(summary);
        }

        Ok(outcome)
    });

    for activity in &rows {
        let merged = activity.merged();
        let file = activity.file_name.as_deref().unwrap_or(Path::new("?"));

        writeln!(
            out,
            "{} | {} | {} | {} | {} | {} | {}",
            file.display(),
            activity.name.as_deref().unwrap_or("?"),
            activity.sport_name(),
            merged.formatted_duration(),
            merged.formatted_distance(),
            merged.formatted_speed(),
            merged.formatted_heart_rate(),
        )?;

        if activity.is_multisport() || activity.sessions.len() > 1 {
            for session in &activity.sessions {
                writeln!(
                    out,
                    "    {} | {} | {} | {} | {}",
                    session.sport_name(),
                    session.formatted_duration(),
                    session.formatted_distance(),
                    session.formatted_speed(),
                    session.formatted_heart_rate(),
                )?;
            }
        }
    }

    Ok(report)
}

fn run_replace(replace: Replace, profile: &dyn Profile) -> Result<(), Error> {
    match replace {
        Replace::Product {
            file,
            from,
            to,
            output,
        } => {
            let mut store = ByteStore::load(file)?;
            let mut scanner = from.map_or_else(ProductScanner::new, ProductScanner::matching);
            scan(&mut store, &mut scanner)?;

            let count = scanner.replace(&mut store, to)?;
            save(&mut store, &output)?;
            println!("Replaced {count} product ids.");
        }
        Replace::Coordinates {
            file,
            track,
            mode,
            output,
        } => {
            let track = read_track(&track)?;
            let mut store = ByteStore::load(file)?;
            let mut scanner = CoordinateReplacementScanner::new();
            scan(&mut store, &mut scanner)?;

            let count = replace::replace(&mut store, &scanner, &track, mode.into(), profile)?;
            save(&mut store, &output)?;
            println!("Moved {count} records.");
        }
    }

    Ok(())
}

fn run_set(set: Set, profile: &dyn Profile) -> Result<(), Error> {
    match set {
        Set::Timestamp { file, time, output } => {
            let earliest = parse_local_time(&time)?;
            let mut store = ByteStore::load(file)?;
            let mut scanner = TimestampScanner::new(profile);
            scan(&mut store, &mut scanner)?;

            let count = timestamp::shift(&mut store, scanner.fields(), earliest)?;
            save(&mut store, &output)?;
            println!("Shifted {count} timestamps.");
        }
        Set::Raw {
            file,
            offset,
            kind,
            value,
            output,
        } => {
            let value = parse_raw(kind, &value)?;
            let mut store = ByteStore::load(file)?;

            let arch = store.set_raw(offset, &value)?;
            save(&mut store, &output)?;
            println!("Wrote {value:?} at offset {offset} ({arch:?}).");
        }
    }

    Ok(())
}

fn save(store: &mut ByteStore, output: &Output) -> Result<(), Error> {
    let crc = store.write_crc()?;
    store.save(&output.output)?;
    info!("Saved {} with checksum {crc:#06x}.", output.output.display());
    Ok(())
}

fn message_number(profile: &dyn Profile, value: &str) -> Result<u16, Error> {
    value
        .parse()
        .ok()
        .or_else(|| profile.message_number(value))
        .ok_or_else(|| Error::Usage(format!("Unknown message: {value}")))
}

fn sport_number(value: &str) -> Result<u8, Error> {
    value
        .parse()
        .ok()
        .or_else(|| sport::SPORTS.number(value))
        .ok_or_else(|| Error::Usage(format!("Unknown sport: {value}")))
}

fn parse_local_time(value: &str) -> Result<u32, Error> {
    let invalid = || Error::Usage(format!("Invalid time, expected YYYY-MM-DD-HH:MM:SS: {value}"));

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d-%H:%M:%S").map_err(|_| invalid())?;
    let local = Local.from_local_datetime(&naive).earliest().ok_or_else(invalid)?;

    device_time(local.with_timezone(&Utc)).ok_or_else(invalid)
}

fn parse_raw(kind: RawKind, value: &str) -> Result<RawValue, Error> {
    let invalid = |_| Error::Usage(format!("Invalid value: {value}"));

    Ok(match kind {
        RawKind::U8 => RawValue::U8(value.parse().map_err(invalid)?),
        RawKind::I8 => RawValue::I8(value.parse().map_err(invalid)?),
        RawKind::U16 => RawValue::U16(value.parse().map_err(invalid)?),
        RawKind::I16 => RawValue::I16(value.parse().map_err(invalid)?),
        RawKind::U32 => RawValue::U32(value.parse().map_err(invalid)?),
        RawKind::I32 => RawValue::I32(value.parse().map_err(invalid)?),
        RawKind::String => RawValue::Str(value.to_owned()),
    })
}

/// Read a track from CSV rows of latitude and longitude in degrees. A
/// header row, if any, is skipped.
fn read_track(path: &Path) -> Result<Track, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut points = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let coordinate = |n: usize| row.get(n).and_then(|v| v.parse::<f64>().ok());

        match (coordinate(0), coordinate(1)) {
            (Some(lat), Some(lon)) => points.push(Position::new(lat, lon)),
            _ if i == 0 => continue,
            _ => Err(Error::Usage(format!("Invalid track point on line {}", i + 1)))?,
        }
    }

    Ok(Track::from_points(points))
}

/// Files named directly, and the `.fit` files of named directories.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;

        entries.retain(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case("fit"))
        });
        entries.sort();
        files.extend(entries);
    }

    Ok(files)
}

fn file_name(path: &Path) -> PathBuf {
    path.file_name().map_or_else(|| path.to_owned(), PathBuf::from)
}

fn report_failures(report: &batch::Report) {
    for (path, e) in &report.failed {
        eprintln!("{}: {e}", path.display());
    }
}

