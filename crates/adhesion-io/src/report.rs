use crate::error::LoadError;
use adhesion_core::Prediction;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

pub const CSV_HEADER: &str = "id,prediction,probability_adhesion";

/// Tabulate predictions as three string columns.
///
/// The probability is formatted with four decimals here so that the CSV
/// carries exactly that precision.
pub fn predictions_frame(predictions: &[Prediction]) -> PolarsResult<DataFrame> {
    let ids: Vec<&str> = predictions.iter().map(|p| p.id.as_str()).collect();
    let labels: Vec<String> = predictions.iter().map(|p| p.label.to_string()).collect();
    let probabilities: Vec<String> = predictions
        .iter()
        .map(|p| format!("{:.4}", p.probability_adhesion))
        .collect();
    df!(
        "id" => ids,
        "prediction" => labels,
        "probability_adhesion" => probabilities,
    )
}

/// Write the prediction report. The header is written even when `predictions` is empty.
pub fn write_predictions_csv<P: AsRef<Path>>(
    path: P,
    predictions: &[Prediction],
) -> Result<(), LoadError> {
    let path = path.as_ref();
    let mut frame = predictions_frame(predictions)?;
    let mut file = File::create(path).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhesion_core::Label;

    fn prediction(id: &str, label: Label, p: f32) -> Prediction {
        Prediction {
            id: id.to_string(),
            label,
            probability_adhesion: p,
        }
    }

    #[test]
    fn test_csv_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.adhesion_predict.csv");
        let preds = vec![
            prediction("seq1", Label::Adhesion, 0.91234),
            prediction("seq2", Label::NonAdhesion, 0.1),
        ];
        write_predictions_csv(&path, &preds).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                CSV_HEADER,
                "seq1,Adhesion,0.9123",
                "seq2,Non-adhesion,0.1000"
            ]
        );
    }

    #[test]
    fn test_empty_report_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_predictions_csv(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), CSV_HEADER);
    }

    #[test]
    fn test_frame_shape() {
        let frame = predictions_frame(&[prediction("a", Label::Adhesion, 0.5)]).unwrap();
        assert_eq!(frame.shape(), (1, 3));
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(matches!(
            write_predictions_csv(&path, &[]),
            Err(LoadError::Write { .. })
        ));
    }
}
