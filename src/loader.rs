//! Input and output files around the engine: the friendship CSV, the preference JSON and
//! vaccine candidate lists.
//!
//! Friendship files have a header row followed by one `id1,id2` pair per row. Preference
//! files map each id to its genre flags, either as a string of digits (`"0101"`) or as an array
//! of `0`/`1`, in catalog order.
//!
//! The friendship file defines the population: ids run densely up to the largest id found in
//! it. Preference records of ids outside the population are dropped.
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, info};
use serde::Deserialize;

use crate::epidemic::EpidemicInputs;
use crate::error::VaxError;
use crate::parameters::ParametersValues;
use crate::people::{PersonId, Preferences};
use crate::HashMap;

/// Ids must stay below this bound, so the population of a run can always be allocated.
pub const MAX_POPULATION: usize = 10_000_000;

/// Reads friendship pairs. Every row after the header must have exactly two integer ids below
/// `MAX_POPULATION`.
///
/// # Errors
///
/// Returns `VaxError::MalformedRecord` naming the first bad row, or the underlying I/O or CSV
/// error.
pub fn read_friendships(path: &Path) -> Result<Vec<(usize, usize)>, VaxError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut friendships = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let malformed = || {
            VaxError::MalformedRecord(format!(
                "{} row {}: expected two integer ids below {MAX_POPULATION}, got {:?}",
                path.display(),
                row + 1,
                record.iter().collect::<Vec<_>>()
            ))
        };
        if record.len() != 2 {
            return Err(malformed());
        }
        let id = |field: &str| match field.parse::<usize>() {
            Ok(id) if id < MAX_POPULATION => Ok(id),
            _ => Err(malformed()),
        };
        friendships.push((id(&record[0])?, id(&record[1])?));
    }
    debug!("read {} friendships from {}", friendships.len(), path.display());
    Ok(friendships)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PreferenceRecord {
    Digits(String),
    Flags(Vec<u8>),
}

impl PreferenceRecord {
    fn into_preferences(self) -> Result<Preferences, VaxError> {
        match self {
            PreferenceRecord::Digits(digits) => digits.parse(),
            PreferenceRecord::Flags(flags) => flags
                .into_iter()
                .map(|flag| match flag {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(VaxError::MalformedRecord(format!(
                        "preference flag must be 0 or 1, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Preferences::new),
        }
    }
}

/// Reads preference vectors, sorted by id. Each must have `genres` flags.
///
/// # Errors
///
/// Returns `VaxError::MalformedRecord` for a non integer id, a bad flag or a vector of the
/// wrong width, or the underlying I/O or JSON error.
pub fn read_preferences(
    path: &Path,
    genres: usize,
) -> Result<Vec<(usize, Preferences)>, VaxError> {
    let file = BufReader::new(File::open(path)?);
    let records: HashMap<String, PreferenceRecord> = serde_json::from_reader(file)?;

    let mut preferences = Vec::with_capacity(records.len());
    for (id, record) in records {
        let person: usize = id.trim().parse().map_err(|_| {
            VaxError::MalformedRecord(format!("preference id {id:?} is not an integer"))
        })?;
        let flags = record.into_preferences()?;
        if flags.len() != genres {
            return Err(VaxError::MalformedRecord(format!(
                "preferences of {person} have {} flags, expected {genres}",
                flags.len()
            )));
        }
        preferences.push((person, flags));
    }
    preferences.sort_by_key(|(person, _)| *person);
    debug!(
        "read {} preference vectors from {}",
        preferences.len(),
        path.display()
    );
    Ok(preferences)
}

/// Builds the trial inputs described by `parameters`. The population size is
/// `population_size` if set, otherwise one past the largest id of the friendship file. People
/// without a preference record like nothing; records past the population are dropped.
///
/// # Errors
///
/// Returns `VaxError::InvalidParameter` if `population_size` exceeds `MAX_POPULATION`, and
/// propagates catalog, read and parse errors.
pub fn load_inputs(parameters: &ParametersValues) -> Result<EpidemicInputs, VaxError> {
    let catalog = parameters.event_catalog()?;
    let friendships = match &parameters.friends_file {
        Some(path) => read_friendships(path)?,
        None => Vec::new(),
    };
    let records = match &parameters.preferences_file {
        Some(path) => read_preferences(path, catalog.len())?,
        None => Vec::new(),
    };

    let population = match parameters.population_size {
        Some(size) if size > MAX_POPULATION => {
            return Err(VaxError::InvalidParameter(format!(
                "population_size {size} exceeds {MAX_POPULATION}"
            )));
        }
        Some(size) => size,
        // Ids are below MAX_POPULATION, so this cannot overflow.
        None => friendships
            .iter()
            .map(|&(a, b)| a.max(b) + 1)
            .max()
            .unwrap_or(0),
    };

    let mut preferences = vec![Preferences::none(catalog.len()); population];
    for (person, flags) in records {
        match preferences.get_mut(person) {
            Some(slot) => *slot = flags,
            None => debug!("dropping preferences of {person}: outside the population"),
        }
    }

    info!(
        "loaded {population} people, {} friendship records, {} genres",
        friendships.len(),
        catalog.len()
    );
    Ok(EpidemicInputs {
        catalog,
        preferences,
        friendships: friendships
            .into_iter()
            .map(|(a, b)| (PersonId(a), PersonId(b)))
            .collect(),
    })
}

/// Writes one candidate id per line.
///
/// # Errors
///
/// Returns `VaxError::IoError` if the file cannot be written.
pub fn write_candidates(path: &Path, candidates: &[PersonId]) -> Result<(), VaxError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for candidate in candidates {
        writeln!(writer, "{candidate}")?;
    }
    writer.flush()?;
    info!(
        "wrote {} vaccine candidates to {}",
        candidates.len(),
        path.display()
    );
    Ok(())
}

/// Reads a candidate list written by `write_candidates`. Blank lines are skipped.
///
/// # Errors
///
/// Returns `VaxError::MalformedRecord` for a line that is not an id, or the I/O error.
pub fn read_candidates(path: &Path) -> Result<Vec<PersonId>, VaxError> {
    let reader = BufReader::new(File::open(path)?);
    let mut candidates = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let id = line.parse().map_err(|_| {
            VaxError::MalformedRecord(format!(
                "{} line {}: {line:?} is not a person id",
                path.display(),
                number + 1
            ))
        })?;
        candidates.push(PersonId(id));
    }
    Ok(candidates)
}
