pub mod controller;
pub mod domain;
pub mod error;
pub mod ports;
pub mod progress;

pub use controller::{ControllerOptions, SessionController, SessionSnapshot};
pub use domain::{
    Credential, Document, Flashcard, NewDocument, NewFlashcard, PendingOperation,
    PendingOperations, ReviewOutcome, ReviewState, SearchReply, SessionPhase, UploadFile,
};
pub use error::{ControllerError, ControllerResult, ValidationError};
pub use ports::{
    BackendService, NullObserver, PortError, PortResult, SessionEvent, SessionObserver,
};
