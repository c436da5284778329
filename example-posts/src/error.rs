use stowage::DataError;

#[derive(Debug)]
pub enum AppError {
    NotFound(i64),
    Data(DataError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(id) => write!(f, "post {id} not found"),
            AppError::Data(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::Data(err)
    }
}
