/// Controls the decoding of batch traffic at the application and transport layers
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodeLevel {
    /// Controls how batches and their items are logged
    pub app: AppDecodeLevel,
    /// Controls the logging of the underlying HTTP exchange
    pub http: HttpDecodeLevel,
}

/// Controls how batch requests and results are decoded at the INFO log level
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AppDecodeLevel {
    /// Decode nothing
    Nothing,
    /// Decode the item count of requests and the success/failure counts of results
    Summary,
    /// Decode the summary and one header line per item
    ItemHeaders,
    /// Decode the summary, the item headers and the decoded values or item errors
    ItemValues,
}

/// Controls how the HTTP exchange with the gateway is logged
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HttpDecodeLevel {
    /// Log nothing
    Nothing,
    /// Log the URL and the response status
    Status,
    /// Log the URL, the status and the JSON bodies
    Body,
}

impl DecodeLevel {
    /// construct a `DecodeLevel` with nothing enabled
    pub fn nothing() -> Self {
        Self::default()
    }

    /// construct a `DecodeLevel` from its fields
    pub fn new(app: AppDecodeLevel, http: HttpDecodeLevel) -> Self {
        DecodeLevel { app, http }
    }
}

impl Default for DecodeLevel {
    fn default() -> Self {
        Self {
            app: AppDecodeLevel::Nothing,
            http: HttpDecodeLevel::Nothing,
        }
    }
}

impl From<AppDecodeLevel> for DecodeLevel {
    fn from(app: AppDecodeLevel) -> Self {
        Self {
            app,
            http: HttpDecodeLevel::Nothing,
        }
    }
}

impl AppDecodeLevel {
    pub(crate) fn enabled(&self) -> bool {
        self.summary()
    }

    pub(crate) fn summary(&self) -> bool {
        match self {
            AppDecodeLevel::Nothing => false,
            AppDecodeLevel::Summary => true,
            AppDecodeLevel::ItemHeaders => true,
            AppDecodeLevel::ItemValues => true,
        }
    }

    pub(crate) fn item_headers(&self) -> bool {
        match self {
            AppDecodeLevel::Nothing => false,
            AppDecodeLevel::Summary => false,
            AppDecodeLevel::ItemHeaders => true,
            AppDecodeLevel::ItemValues => true,
        }
    }

    pub(crate) fn item_values(&self) -> bool {
        match self {
            AppDecodeLevel::Nothing => false,
            AppDecodeLevel::Summary => false,
            AppDecodeLevel::ItemHeaders => false,
            AppDecodeLevel::ItemValues => true,
        }
    }
}

impl HttpDecodeLevel {
    pub(crate) fn enabled(&self) -> bool {
        self.status_enabled()
    }

    pub(crate) fn status_enabled(&self) -> bool {
        match self {
            HttpDecodeLevel::Nothing => false,
            HttpDecodeLevel::Status => true,
            HttpDecodeLevel::Body => true,
        }
    }

    pub(crate) fn body_enabled(&self) -> bool {
        match self {
            HttpDecodeLevel::Nothing => false,
            HttpDecodeLevel::Status => false,
            HttpDecodeLevel::Body => true,
        }
    }
}
