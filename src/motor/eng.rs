//! Import and export of the legacy RASP-style `.eng` motor description file.
//!
//! The format is line oriented: `;` starts a comment that runs to the end of
//! the line, the first remaining non-blank line is the motor description
//! (whitespace-separated fields) and every following line is a
//! `<time> <thrust>` sample pair. The implicit `(0, 0)` ignition point is not
//! stored in the file.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::info;

use super::FormatError;

pub const ENG_EXTENSION: &str = "eng";

/// Parsed content of an `.eng` file.
#[derive(Debug, Clone)]
pub struct EngFile {
    pub comments: Vec<String>,
    pub description: EngDescription,
    /// Thrust samples with the implicit `(0, 0)` point prepended.
    pub points: Vec<(f64, f64)>,
}

/// The whitespace-separated fields of the description line, e.g.
/// `F32 24 124 5-10-15 .0377 .0695 RV`. Mass fields are addressed from the
/// end of the line so that manufacturers with extra leading fields still
/// parse.
#[derive(Debug, Clone)]
pub struct EngDescription {
    fields: Vec<String>,
}

impl EngDescription {
    fn field_f64(&self, index: usize, name: &'static str) -> Result<f64, FormatError> {
        let value = self
            .fields
            .get(index)
            .ok_or(FormatError::TooFewDescriptionFields {
                expected: index + 1,
                found: self.fields.len(),
            })?;
        value
            .parse()
            .map_err(|_| FormatError::BadDescriptionField {
                field: name,
                value: value.clone(),
            })
    }

    fn field_from_end(&self, back: usize, name: &'static str) -> Result<f64, FormatError> {
        if self.fields.len() < back + 1 {
            return Err(FormatError::TooFewDescriptionFields {
                expected: back + 1,
                found: self.fields.len(),
            });
        }
        self.field_f64(self.fields.len() - back, name)
    }

    pub fn name(&self) -> &str {
        &self.fields[0]
    }

    pub fn diameter_mm(&self) -> Result<f64, FormatError> {
        self.field_f64(1, "diameter")
    }

    pub fn length_mm(&self) -> Result<f64, FormatError> {
        self.field_f64(2, "length")
    }

    pub fn propellant_mass(&self) -> Result<f64, FormatError> {
        self.field_from_end(3, "propellant mass")
    }

    pub fn total_mass(&self) -> Result<f64, FormatError> {
        self.field_from_end(2, "total mass")
    }

    pub fn manufacturer(&self) -> Option<&str> {
        (self.fields.len() > 1).then(|| self.fields[self.fields.len() - 1].as_str())
    }
}

pub fn has_eng_extension(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ENG_EXTENSION))
}

/// Reads and parses an `.eng` file.
pub fn import(path: &Path) -> Result<EngFile, FormatError> {
    if !has_eng_extension(path) {
        return Err(FormatError::UnsupportedExtension(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut comments = Vec::new();
    let mut description: Option<EngDescription> = None;
    let mut points = vec![(0.0, 0.0)];

    for line in content.lines() {
        let line = match line.find(';') {
            Some(pos) => {
                comments.push(line[pos..].to_string());
                &line[..pos]
            }
            None => line,
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if description.is_none() {
            description = Some(EngDescription {
                fields: line.split_whitespace().map(str::to_string).collect(),
            });
        } else {
            let mut values = line.split_whitespace().map(str::parse::<f64>);
            match (values.next(), values.next()) {
                (Some(Ok(time)), Some(Ok(thrust))) => points.push((time, thrust)),
                _ => {
                    return Err(FormatError::MalformedSample {
                        line: line.to_string(),
                    })
                }
            }
        }
    }

    let description = description.ok_or_else(|| FormatError::MissingDescription(path.to_path_buf()))?;

    info!(
        "Imported motor '{}' from '{}': {} thrust samples",
        description.name(),
        path.display(),
        points.len()
    );

    Ok(EngFile {
        comments,
        description,
        points,
    })
}

/// Data needed to write an `.eng` file.
#[derive(Debug, Clone)]
pub struct EngExport<'a> {
    pub name: &'a str,
    pub manufacturer: &'a str,
    pub diameter_mm: f64,
    pub length_mm: f64,
    pub delay_s: f64,
    pub propellant_mass: f64,
    pub total_mass: f64,
    /// Thrust samples including the implicit leading `(0, 0)` point, which is
    /// not written out.
    pub samples: (&'a [f64], &'a [f64]),
}

pub fn export(path: &Path, data: &EngExport<'_>) -> Result<(), FormatError> {
    let io_err = |source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(path).map_err(io_err)?;

    writeln!(
        file,
        "{} {:.1} {:.1} {} {:.4} {:.4} {}",
        data.name,
        data.diameter_mm,
        data.length_mm,
        data.delay_s,
        data.propellant_mass,
        data.total_mass,
        data.manufacturer
    )
    .map_err(io_err)?;

    let (x, y) = data.samples;
    let n = x.len();
    for i in 1..n.saturating_sub(1) {
        writeln!(file, "{:.4} {:.3}", x[i], y[i]).map_err(io_err)?;
    }
    if n > 1 {
        writeln!(file, "{:.4} {:.3}", x[n - 1], 0.0).map_err(io_err)?;
    }

    Ok(())
}
