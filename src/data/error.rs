use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a dataset from loading.
///
/// Per-value problems (a bad amount, an unreadable date) never show up here:
/// the normalizer turns those into nulls and the load still succeeds.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file extension does not map to any loader.
    #[error("Extensión de archivo no soportada: .{0}")]
    UnsupportedExtension(String),

    /// The file could not be opened or read.
    #[error("No se pudo leer el archivo {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file has no header row.
    #[error("No se encontró la fila de cabecera")]
    MissingHeader,

    /// The workbook contains no worksheets.
    #[error("El libro no tiene hojas")]
    NoSheets,

    #[error("Texto delimitado mal formado: {0}")]
    Csv(#[from] csv::Error),

    #[error("Planilla mal formada: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Archivo parquet mal formado: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Datos arrow mal formados: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("No se pudo interpretar el JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON document parsed but is not an array of objects.
    #[error("Estructura JSON inesperada: {0}")]
    JsonLayout(String),
}

/// Convenience alias used throughout the data layer.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = LoadError::FileRead {
            path: PathBuf::from("/data/proyectos.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("No se pudo leer el archivo"));
        assert!(msg.contains("/data/proyectos.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_unsupported_extension() {
        let err = LoadError::UnsupportedExtension("pdf".to_string());
        assert_eq!(err.to_string(), "Extensión de archivo no soportada: .pdf");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: LoadError = json_err.into();
        assert!(err.to_string().contains("No se pudo interpretar el JSON"));
    }
}
