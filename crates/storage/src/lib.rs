pub mod auth;
pub mod sheets;
pub mod sink;
pub mod source;

pub use auth::{Authenticator, AuthError, CredentialStrategy, Credentials};
pub use sheets::{SheetTarget, SheetsClient, SheetsError, SpreadsheetApi, UpdateSummary, DEFAULT_SHEET_NAME};
pub use sink::{ConsoleSink, JsonFileStorage, ResultSink, SheetSink};
pub use source::SheetColumnSource;
