//! Handwriting-sample screening: validates an uploaded image, pairs it
//! with a child registration, and hands the classified result to a
//! pluggable sink. Classification comes from an external model verdict;
//! this module owns the validation rules and the result payload.

use std::error::Error;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accepted handwriting-sample image extensions.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Samples above this size are rejected before any processing.
pub const MAX_SAMPLE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug)]
pub enum ScreeningError {
    MissingSample,
    UnsupportedFormat(PathBuf),
    SampleTooLarge(u64),
    MissingField(&'static str),
    Server(String),
    Network,
    Timeout,
}

impl fmt::Display for ScreeningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSample => write!(f, "Please select an image file"),
            Self::UnsupportedFormat(path) => write!(
                f,
                "Please select a valid image file (PNG, JPEG, JPG, or GIF): {}",
                path.display()
            ),
            Self::SampleTooLarge(bytes) => {
                write!(f, "Image is too large ({bytes} bytes, limit 10 MB)")
            }
            Self::MissingField(field) => write!(f, "Please fill in the {field} field"),
            Self::Server(msg) => write!(f, "Server error: {msg}"),
            Self::Network => write!(f, "Network error: Unable to connect to the server"),
            Self::Timeout => write!(f, "The request timed out. Please try again"),
        }
    }
}

impl Error for ScreeningError {}

/// Check a sample path against the format and size rules.
pub fn validate_sample(path: &Path) -> Result<(), ScreeningError> {
    if !path.exists() {
        return Err(ScreeningError::MissingSample);
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return Err(ScreeningError::UnsupportedFormat(path.to_path_buf())),
    }
    let bytes = std::fs::metadata(path)
        .map_err(|_| ScreeningError::MissingSample)?
        .len();
    if bytes > MAX_SAMPLE_BYTES {
        return Err(ScreeningError::SampleTooLarge(bytes));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChildRegistration {
    pub child_id: String,
    pub name: String,
    pub age: u8,
}

impl ChildRegistration {
    /// Register a child. The id is derived from the wall clock, so two
    /// registrations in the same millisecond would collide; acceptable
    /// for a single-operator tool.
    pub fn new(name: &str, age: Option<u8>) -> Result<Self, ScreeningError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ScreeningError::MissingField("name"));
        }
        let age = age.ok_or(ScreeningError::MissingField("age"))?;

        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Ok(Self {
            child_id: format!("C{:06}", epoch_ms % 1_000_000),
            name: name.to_string(),
            age,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum PredictionLabel {
    #[serde(rename = "Dysgraphic")]
    Dysgraphic,
    #[serde(rename = "Non-Dysgraphic")]
    #[strum(serialize = "Non-Dysgraphic")]
    NonDysgraphic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: PredictionLabel,
    /// Classifier confidence, 0.0..=1.0.
    pub confidence: f64,
}

impl Prediction {
    pub fn interpretation(&self) -> &'static str {
        match self.label {
            PredictionLabel::Dysgraphic => {
                if self.confidence > 0.8 {
                    "Strong indicators of dysgraphia detected. Professional evaluation recommended."
                } else if self.confidence > 0.6 {
                    "Moderate indicators of dysgraphia detected. Consider professional consultation."
                } else {
                    "Mild indicators present. Monitor progress and consider retesting."
                }
            }
            PredictionLabel::NonDysgraphic => {
                if self.confidence > 0.8 {
                    "Handwriting appears typical for age. No significant concerns detected."
                } else if self.confidence > 0.6 {
                    "Handwriting is mostly typical. Minor variations are within normal range."
                } else {
                    "Results are inconclusive. Consider retesting with a clearer sample."
                }
            }
        }
    }
}

/// The stored outcome of one screening. Field names follow the shape
/// expected by downstream consumers of the exported JSON.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub child_id: String,
    pub child_name: String,
    pub prediction: PredictionLabel,
    pub confidence: f64,
    pub test_date: String,
    pub is_retest: bool,
}

impl TestResult {
    pub fn new(child: &ChildRegistration, prediction: Prediction, is_retest: bool) -> Self {
        Self::at(child, prediction, is_retest, Utc::now())
    }

    fn at(
        child: &ChildRegistration,
        prediction: Prediction,
        is_retest: bool,
        when: DateTime<Utc>,
    ) -> Self {
        Self {
            child_id: child.child_id.clone(),
            child_name: child.name.clone(),
            prediction: prediction.label,
            confidence: prediction.confidence,
            test_date: when.to_rfc3339(),
            is_retest,
        }
    }
}

/// Destination for screening results. Keeps the transport out of the
/// validation path; tests swap in a recording sink.
pub trait ResultSink {
    fn submit(&mut self, result: &TestResult) -> Result<(), Box<dyn Error>>;
}

/// Appends each result as one JSON line. Parent directories are
/// created on first submit.
pub struct FileResultSink {
    path: PathBuf,
}

impl FileResultSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ResultSink for FileResultSink {
    fn submit(&mut self, result: &TestResult) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(result)?)?;
        Ok(())
    }
}

/// Validate the sample, build the result, and hand it to the sink.
/// Nothing reaches the sink when validation fails.
pub fn run_screening(
    sample: &Path,
    child: &ChildRegistration,
    prediction: Prediction,
    is_retest: bool,
    sink: &mut dyn ResultSink,
) -> Result<TestResult, Box<dyn Error>> {
    validate_sample(sample)?;
    let result = TestResult::new(child, prediction, is_retest);
    sink.submit(&result)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[derive(Default)]
    struct RecordingSink {
        submitted: Vec<TestResult>,
    }

    impl ResultSink for RecordingSink {
        fn submit(&mut self, result: &TestResult) -> Result<(), Box<dyn Error>> {
            self.submitted.push(result.clone());
            Ok(())
        }
    }

    fn sample_file(dir: &tempfile::TempDir, name: &str, bytes: usize) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![0u8; bytes]).unwrap();
        path
    }

    fn child() -> ChildRegistration {
        ChildRegistration::new("Maya", Some(8)).unwrap()
    }

    #[test]
    fn test_validate_accepts_all_allowed_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for ext in ALLOWED_EXTENSIONS {
            let path = sample_file(&dir, &format!("sample.{ext}"), 64);
            assert!(validate_sample(&path).is_ok());
        }
    }

    #[test]
    fn test_validate_accepts_uppercase_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_file(&dir, "sample.PNG", 64);
        assert!(validate_sample(&path).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.png");
        assert_matches!(validate_sample(&path), Err(ScreeningError::MissingSample));
    }

    #[test]
    fn test_validate_rejects_wrong_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_file(&dir, "sample.pdf", 64);
        assert_matches!(
            validate_sample(&path),
            Err(ScreeningError::UnsupportedFormat(_))
        );
    }

    #[test]
    fn test_validate_rejects_oversized_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_file(&dir, "big.png", (MAX_SAMPLE_BYTES + 1) as usize);
        assert_matches!(
            validate_sample(&path),
            Err(ScreeningError::SampleTooLarge(_))
        );
    }

    #[test]
    fn test_registration_requires_name_and_age() {
        assert_matches!(
            ChildRegistration::new("  ", Some(8)),
            Err(ScreeningError::MissingField("name"))
        );
        assert_matches!(
            ChildRegistration::new("Maya", None),
            Err(ScreeningError::MissingField("age"))
        );
    }

    #[test]
    fn test_registration_id_shape() {
        let child = child();
        assert!(child.child_id.starts_with('C'));
        assert_eq!(child.child_id.len(), 7);
    }

    #[test]
    fn test_interpretation_thresholds() {
        let strong = Prediction {
            label: PredictionLabel::Dysgraphic,
            confidence: 0.9,
        };
        assert!(strong.interpretation().contains("Strong indicators"));

        let moderate = Prediction {
            label: PredictionLabel::Dysgraphic,
            confidence: 0.7,
        };
        assert!(moderate.interpretation().contains("Moderate indicators"));

        let typical = Prediction {
            label: PredictionLabel::NonDysgraphic,
            confidence: 0.95,
        };
        assert!(typical.interpretation().contains("appears typical"));

        let inconclusive = Prediction {
            label: PredictionLabel::NonDysgraphic,
            confidence: 0.5,
        };
        assert!(inconclusive.interpretation().contains("inconclusive"));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = TestResult::at(
            &child(),
            Prediction {
                label: PredictionLabel::NonDysgraphic,
                confidence: 0.91,
            },
            false,
            Utc::now(),
        );
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"childId\""));
        assert!(json.contains("\"childName\":\"Maya\""));
        assert!(json.contains("\"prediction\":\"Non-Dysgraphic\""));
        assert!(json.contains("\"isRetest\":false"));
    }

    #[test]
    fn test_prediction_parses_from_verdict_json() {
        let prediction: Prediction =
            serde_json::from_str(r#"{"label":"Non-Dysgraphic","confidence":0.72}"#).unwrap();
        assert_eq!(prediction.label, PredictionLabel::NonDysgraphic);
        assert!((prediction.confidence - 0.72).abs() < 1e-9);
        assert_eq!(prediction.label.to_string(), "Non-Dysgraphic");
    }

    #[test]
    fn test_file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("screenings.jsonl");
        let mut sink = FileResultSink::new(path.clone());

        let first = TestResult::at(
            &child(),
            Prediction {
                label: PredictionLabel::Dysgraphic,
                confidence: 0.84,
            },
            false,
            Utc::now(),
        );
        sink.submit(&first).unwrap();
        sink.submit(&first).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["childName"], "Maya");
        assert_eq!(parsed["prediction"], "Dysgraphic");
    }

    #[test]
    fn test_run_screening_submits_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_file(&dir, "sample.jpg", 128);
        let mut sink = RecordingSink::default();

        let result = run_screening(
            &path,
            &child(),
            Prediction {
                label: PredictionLabel::Dysgraphic,
                confidence: 0.84,
            },
            false,
            &mut sink,
        )
        .unwrap();

        assert_eq!(sink.submitted.len(), 1);
        assert_eq!(sink.submitted[0], result);
    }

    #[test]
    fn test_invalid_sample_never_reaches_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_file(&dir, "sample.txt", 64);
        let mut sink = RecordingSink::default();

        let outcome = run_screening(
            &path,
            &child(),
            Prediction {
                label: PredictionLabel::Dysgraphic,
                confidence: 0.9,
            },
            false,
            &mut sink,
        );

        assert!(outcome.is_err());
        assert!(sink.submitted.is_empty());
    }
}
