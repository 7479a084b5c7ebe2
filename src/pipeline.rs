//! Upload to snapshot: load, normalize, infer boolean columns, classify.

use crate::matrix::classify;
use crate::matrix::ClassifierOptions;
use crate::matrix::Snapshot;
use crate::table::column::infer_boolean_columns;
use crate::table::column::InferenceOptions;
use crate::table::loader::load;
use crate::table::loader::LoadError;
use crate::table::loader::LoadOptions;
use crate::table::normalize::normalize_columns;

/// Options of every pipeline stage
#[derive(Clone, Debug, Default)]
pub struct PipelineOptions {
    pub load: LoadOptions,
    pub inference: InferenceOptions,
    pub classifier: ClassifierOptions,
}

/// Runs the whole pipeline over one upload.
///
/// # Arguments
/// * `bytes` - Raw upload content
/// * `file_name` - Name of the uploaded file, if known
/// * `options` - Stage options
///
/// # Returns
/// The classified snapshot, or the `LoadError` that stopped the upload
pub fn build_snapshot(bytes: &[u8], file_name: Option<&str>, options: &PipelineOptions) -> Result<Snapshot, LoadError> {
    let raw = load(bytes, file_name, &options.load)?;
    let source = raw.source.clone();
    let table = normalize_columns(raw);
    let boolean_columns = infer_boolean_columns(&table, &options.inference);
    log::info!("Boolean columns: {:?}", boolean_columns);

    let snapshot = classify(table, boolean_columns, file_name.unwrap_or_default(), &options.classifier);
    Ok(Snapshot { source, ..snapshot })
}
