//! Generation controller
//!
//! Owns the selected photo and the processing state machine. Every change
//! goes through [`Controller::apply`], which either accepts an [`Event`] and
//! returns the [`Effect`] the application must run, or rejects it with a
//! [`TransitionError`] and leaves the state untouched.

use thiserror::Error;

use super::data::{GenerationResult, SourceImage};
use crate::media::export::{self, Export, ExportError};

/// Message shown to the user whenever the service call fails
pub const GENERATION_FAILED: &str = "Failed to generate depth effect. Please try again.";

/// Identifies one service request and the selection it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    request: u64,
    selection: u64,
}

/// A service call the application has to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub ticket: Ticket,
    pub payload: String,
    pub media_type: String,
}

/// Processing status of the current photo
#[derive(Debug, Clone, Default)]
pub enum ProcessingState {
    #[default]
    Idle,
    /// Waiting for the service to settle the request with this ticket
    Processing { ticket: Ticket },
    Complete { result: GenerationResult },
    Error { message: String },
}

impl ProcessingState {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingState::Idle => "idle",
            ProcessingState::Processing { .. } => "processing",
            ProcessingState::Complete { .. } => "complete",
            ProcessingState::Error { .. } => "error",
        }
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone)]
pub enum Event {
    /// A new photo passed ingestion
    ImageSelected(SourceImage),
    /// Generate (from Idle/Error) or regenerate (from Complete)
    GenerateRequested,
    /// The service returned a decoded image
    Resolved { ticket: Ticket, result: GenerationResult },
    /// The service call failed
    Rejected { ticket: Ticket, reason: String },
    ResetRequested,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Request(GenerationRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no image selected")]
    NoSourceImage,
    #[error("a generation request is already in flight")]
    AlreadyProcessing,
    #[error("no generation request is in flight")]
    NotProcessing,
    #[error("result belongs to a superseded request")]
    StaleResult,
}

/// The generation controller
#[derive(Debug, Default)]
pub struct Controller {
    state: ProcessingState,
    source: Option<SourceImage>,
    /// Bumped on every selection and reset
    selection: u64,
    next_request: u64,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single transition function of the state machine
    pub fn apply(&mut self, event: Event) -> Result<Effect, TransitionError> {
        match event {
            Event::ImageSelected(source) => {
                if matches!(self.state, ProcessingState::Processing { .. }) {
                    return Err(TransitionError::AlreadyProcessing);
                }
                tracing::info!(
                    "🖼️  Selected {} image ({}x{}, {} bytes)",
                    source.media_type,
                    source.display.width,
                    source.display.height,
                    source.bytes.len()
                );
                self.selection += 1;
                self.source = Some(source);
                self.state = ProcessingState::Idle;
                Ok(Effect::None)
            }
            Event::GenerateRequested => {
                if matches!(self.state, ProcessingState::Processing { .. }) {
                    return Err(TransitionError::AlreadyProcessing);
                }
                let source = self.source.as_ref().ok_or(TransitionError::NoSourceImage)?;

                self.next_request += 1;
                let ticket = Ticket {
                    request: self.next_request,
                    selection: self.selection,
                };
                let request = GenerationRequest {
                    ticket,
                    payload: source.encoded.clone(),
                    media_type: source.media_type.clone(),
                };

                tracing::info!("✨ Requesting depth effect (request #{})", ticket.request);
                self.state = ProcessingState::Processing { ticket };
                Ok(Effect::Request(request))
            }
            Event::Resolved { ticket, result } => {
                self.settle(ticket)?;
                tracing::info!(
                    "✅ Depth effect ready (request #{}, {}x{}, {} bytes encoded)",
                    ticket.request,
                    result.display.width,
                    result.display.height,
                    result.encoded.len()
                );
                self.state = ProcessingState::Complete { result };
                Ok(Effect::None)
            }
            Event::Rejected { ticket, reason } => {
                self.settle(ticket)?;
                tracing::error!("❌ Depth effect failed (request #{}): {}", ticket.request, reason);
                self.state = ProcessingState::Error {
                    message: GENERATION_FAILED.to_string(),
                };
                Ok(Effect::None)
            }
            Event::ResetRequested => {
                if let ProcessingState::Processing { ticket } = self.state {
                    tracing::info!("🧹 Reset while request #{} is pending, its result will be ignored", ticket.request);
                }
                self.selection += 1;
                self.source = None;
                self.state = ProcessingState::Idle;
                Ok(Effect::None)
            }
        }
    }

    /// Check that a settled request is the one currently awaited
    fn settle(&self, ticket: Ticket) -> Result<(), TransitionError> {
        match self.state {
            ProcessingState::Processing { ticket: pending }
                if pending == ticket && ticket.selection == self.selection =>
            {
                Ok(())
            }
            // Issued earlier but superseded by a reset, a new selection or a newer request
            _ if ticket.request <= self.next_request => Err(TransitionError::StaleResult),
            _ => Err(TransitionError::NotProcessing),
        }
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match &self.state {
            ProcessingState::Complete { result } => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ProcessingState::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, ProcessingState::Processing { .. })
    }

    /// Whether generate/regenerate would currently be accepted
    pub fn can_generate(&self) -> bool {
        self.source.is_some() && !self.is_processing()
    }

    /// Prepare the current result for download
    ///
    /// The result is saved with the media type of the source photo,
    /// falling back to PNG.
    pub fn export(&self, timestamp_ms: i64) -> Result<Export, ExportError> {
        let result = self.result().ok_or(ExportError::NoResult)?;
        let media_type = self
            .source
            .as_ref()
            .map(|source| source.media_type.as_str())
            .unwrap_or("image/png");
        Ok(export::prepare(media_type, &result.encoded, timestamp_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::tests::{result_with, source_png};

    fn issued(effect: Effect) -> GenerationRequest {
        match effect {
            Effect::Request(request) => request,
            Effect::None => panic!("expected a generation request"),
        }
    }

    fn selected() -> Controller {
        let mut controller = Controller::new();
        controller.apply(Event::ImageSelected(source_png())).unwrap();
        controller
    }

    #[test]
    fn test_starts_idle_and_empty() {
        let controller = Controller::new();
        assert!(matches!(controller.state(), ProcessingState::Idle));
        assert!(controller.source().is_none());
        assert!(controller.result().is_none());
        assert!(controller.error_message().is_none());
        assert!(!controller.can_generate());
    }

    #[test]
    fn test_generate_requires_source() {
        let mut controller = Controller::new();
        assert_eq!(
            controller.apply(Event::GenerateRequested),
            Err(TransitionError::NoSourceImage)
        );
        assert!(matches!(controller.state(), ProcessingState::Idle));
    }

    #[test]
    fn test_generate_issues_exact_request() {
        let mut controller = selected();
        let source = controller.source().unwrap().clone();

        let request = issued(controller.apply(Event::GenerateRequested).unwrap());

        assert_eq!(request.payload, source.encoded);
        assert_eq!(request.media_type, "image/png");
        assert!(controller.is_processing());
        assert!(!controller.can_generate());
    }

    #[test]
    fn test_no_second_request_while_processing() {
        let mut controller = selected();
        controller.apply(Event::GenerateRequested).unwrap();

        assert_eq!(
            controller.apply(Event::GenerateRequested),
            Err(TransitionError::AlreadyProcessing)
        );
        assert_eq!(
            controller.apply(Event::ImageSelected(source_png())).unwrap_err(),
            TransitionError::AlreadyProcessing
        );
    }

    #[test]
    fn test_resolve_completes() {
        let mut controller = selected();
        let request = issued(controller.apply(Event::GenerateRequested).unwrap());

        controller
            .apply(Event::Resolved {
                ticket: request.ticket,
                result: result_with("ABC123"),
            })
            .unwrap();

        assert!(matches!(controller.state(), ProcessingState::Complete { .. }));
        assert_eq!(controller.result().unwrap().encoded, "ABC123");
        assert!(controller.error_message().is_none());
    }

    #[test]
    fn test_reject_sets_fixed_message() {
        let mut controller = selected();
        let request = issued(controller.apply(Event::GenerateRequested).unwrap());

        controller
            .apply(Event::Rejected {
                ticket: request.ticket,
                reason: "network down".to_string(),
            })
            .unwrap();

        assert_eq!(controller.error_message(), Some(GENERATION_FAILED));
        assert!(controller.result().is_none());
        assert!(controller.can_generate());
    }

    #[test]
    fn test_retry_from_error_clears_message() {
        let mut controller = selected();
        let first = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller
            .apply(Event::Rejected {
                ticket: first.ticket,
                reason: "boom".to_string(),
            })
            .unwrap();

        let second = issued(controller.apply(Event::GenerateRequested).unwrap());
        assert_ne!(first.ticket, second.ticket);
        assert!(controller.error_message().is_none());
        assert!(controller.is_processing());
    }

    #[test]
    fn test_regenerate_clears_result_and_reuses_source() {
        let mut controller = selected();
        let first = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller
            .apply(Event::Resolved {
                ticket: first.ticket,
                result: result_with("ABC123"),
            })
            .unwrap();

        let second = issued(controller.apply(Event::GenerateRequested).unwrap());

        assert_eq!(second.payload, first.payload);
        assert_eq!(second.media_type, first.media_type);
        assert!(controller.result().is_none());
    }

    #[test]
    fn test_reset_from_every_state() {
        // Idle with a source
        let mut controller = selected();
        controller.apply(Event::ResetRequested).unwrap();
        assert!(controller.source().is_none());

        // Processing
        let mut controller = selected();
        controller.apply(Event::GenerateRequested).unwrap();
        controller.apply(Event::ResetRequested).unwrap();
        assert!(matches!(controller.state(), ProcessingState::Idle));
        assert!(controller.source().is_none());

        // Complete
        let mut controller = selected();
        let request = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller
            .apply(Event::Resolved {
                ticket: request.ticket,
                result: result_with("ABC123"),
            })
            .unwrap();
        controller.apply(Event::ResetRequested).unwrap();
        assert!(controller.result().is_none());
        assert!(controller.source().is_none());

        // Error
        let mut controller = selected();
        let request = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller
            .apply(Event::Rejected {
                ticket: request.ticket,
                reason: "boom".to_string(),
            })
            .unwrap();
        controller.apply(Event::ResetRequested).unwrap();
        assert!(controller.error_message().is_none());
        assert!(matches!(controller.state(), ProcessingState::Idle));
    }

    #[test]
    fn test_result_after_reset_is_discarded() {
        let mut controller = selected();
        let first = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller
            .apply(Event::Resolved {
                ticket: first.ticket,
                result: result_with("ABC123"),
            })
            .unwrap();

        let pending = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller.apply(Event::ResetRequested).unwrap();

        assert_eq!(
            controller.apply(Event::Resolved {
                ticket: pending.ticket,
                result: result_with("LATE"),
            }),
            Err(TransitionError::StaleResult)
        );
        assert!(matches!(controller.state(), ProcessingState::Idle));
        assert!(controller.result().is_none());
    }

    #[test]
    fn test_result_for_previous_selection_is_discarded() {
        let mut controller = selected();
        let stale = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller.apply(Event::ResetRequested).unwrap();
        controller.apply(Event::ImageSelected(source_png())).unwrap();
        let current = issued(controller.apply(Event::GenerateRequested).unwrap());

        assert_eq!(
            controller.apply(Event::Rejected {
                ticket: stale.ticket,
                reason: "late failure".to_string(),
            }),
            Err(TransitionError::StaleResult)
        );
        assert!(controller.is_processing());

        controller
            .apply(Event::Resolved {
                ticket: current.ticket,
                result: result_with("FRESH"),
            })
            .unwrap();
        assert_eq!(controller.result().unwrap().encoded, "FRESH");
    }

    #[test]
    fn test_new_selection_clears_previous_outcome() {
        let mut controller = selected();
        let request = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller
            .apply(Event::Rejected {
                ticket: request.ticket,
                reason: "boom".to_string(),
            })
            .unwrap();

        controller.apply(Event::ImageSelected(source_png())).unwrap();
        assert!(matches!(controller.state(), ProcessingState::Idle));
        assert!(controller.error_message().is_none());
        assert!(controller.source().is_some());
    }

    #[test]
    fn test_export_requires_result() {
        let controller = selected();
        assert_eq!(controller.export(1).unwrap_err(), ExportError::NoResult);
    }

    #[test]
    fn test_export_uses_source_media_type() {
        let mut controller = selected();
        let request = issued(controller.apply(Event::GenerateRequested).unwrap());
        controller
            .apply(Event::Resolved {
                ticket: request.ticket,
                result: result_with("ABC123"),
            })
            .unwrap();

        let export = controller.export(1_700_000_000_000).unwrap();
        assert_eq!(export.locator, "data:image/png;base64,ABC123");
        assert_eq!(export.file_name, "focus-ai-depth-effect-1700000000000.png");
    }
}
