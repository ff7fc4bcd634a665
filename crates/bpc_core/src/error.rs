use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    InvalidInput(String),
    InvalidData(String),
    Storage(String),
    Launch(String),
    NotFound(String),
    Terminate(String),
    ProcessTable(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn storage<M: Into<String>>(message: M) -> Self {
        Self::Storage(message.into())
    }

    pub fn launch<M: Into<String>>(message: M) -> Self {
        Self::Launch(message.into())
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(message.into())
    }

    pub fn terminate<M: Into<String>>(message: M) -> Self {
        Self::Terminate(message.into())
    }

    pub fn process_table<M: Into<String>>(message: M) -> Self {
        Self::ProcessTable(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Storage(_) => "storage_error",
            Self::Launch(_) => "launch_error",
            Self::NotFound(_) => "not_found",
            Self::Terminate(_) => "terminate_error",
            Self::ProcessTable(_) => "process_table_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Storage(message)
            | Self::Launch(message)
            | Self::NotFound(message)
            | Self::Terminate(message)
            | Self::ProcessTable(message) => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}
