use iced::widget::{button, canvas, column, container, image, row, stack, text, Space};
use iced::{event, window, Alignment, Color, ContentFit, Element, Length, Subscription, Task, Theme};
use rfd::{AsyncMessageDialog, FileDialog, MessageLevel};
use chrono::{Datelike, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod media;
mod service;
mod state;
mod ui;

use media::export::ExportError;
use media::ingest::{self, IngestError};
use service::DepthEffectService;
use state::data::{GenerationResult, SourceImage};
use state::generation::{Controller, Effect, Event, ProcessingState, Ticket, TransitionError};
use ui::comparison::Comparison;

/// Height of the preview / comparison area
const STAGE_HEIGHT: f32 = 480.0;

const ACCENT: Color = Color::from_rgb(0.51, 0.55, 0.97);
const MUTED: Color = Color::from_rgb(0.58, 0.64, 0.72);
const FAINT: Color = Color::from_rgb(0.39, 0.45, 0.55);
const DANGER: Color = Color::from_rgb(0.97, 0.44, 0.44);

/// Main application state
struct FocusAi {
    /// Photo selection and the generation state machine
    controller: Controller,
    /// Service applying the depth effect
    service: Arc<dyn DepthEffectService>,
    /// Status message to display to the user
    status: String,
    /// Serial of the most recently started ingestion
    load_serial: u64,
    /// Serial of the ingestion still awaited, if any
    pending_load: Option<u64>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Upload an image"
    PickImage,
    /// A file was dropped on the window
    FileDropped(PathBuf),
    /// Background ingestion with this serial finished
    ImageLoaded(u64, Result<SourceImage, IngestError>),
    /// Generate or regenerate the depth effect
    Generate,
    /// The service settled the request with this ticket
    GenerationFinished(Ticket, Result<GenerationResult, String>),
    /// User clicked "New Image"
    Reset,
    /// User clicked "Download HD"
    Download,
    /// Save dialog closed (`None` when cancelled)
    DownloadFinished(Result<Option<PathBuf>, ExportError>),
    /// Blocking alert was dismissed
    AlertClosed,
}

impl FocusAi {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = config::Settings::load();
        if settings.api_key.is_none() {
            tracing::warn!("⚠️  No API key configured, set GEMINI_API_KEY to enable generation");
        }
        tracing::info!("🎨 FocusAI initialized (model: {})", settings.model);

        let service = Arc::new(service::GeminiClient::new(&settings));
        (Self::with_service(service), Task::none())
    }

    fn with_service(service: Arc<dyn DepthEffectService>) -> Self {
        FocusAi {
            controller: Controller::new(),
            service,
            status: String::new(),
            load_serial: 0,
            pending_load: None,
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                // Show the native file picker dialog
                let file = FileDialog::new()
                    .set_title("Select a Photo")
                    .add_filter("Images", &ingest::PICKER_EXTENSIONS)
                    .pick_file();

                match file {
                    Some(path) => self.load(path),
                    None => Task::none(),
                }
            }
            Message::FileDropped(path) => {
                if self.controller.is_processing() {
                    tracing::warn!("⏳ Ignoring {} while a generation is pending", path.display());
                    return Task::none();
                }
                self.load(path)
            }
            Message::ImageLoaded(serial, outcome) => {
                if self.pending_load != Some(serial) {
                    tracing::warn!("🗑️  Discarding superseded image load #{}", serial);
                    return Task::none();
                }
                self.pending_load = None;
                self.status.clear();

                match outcome {
                    Ok(source) => self.apply(Event::ImageSelected(source)),
                    Err(e) => {
                        tracing::error!("⚠️  Error processing file: {}", e);
                        alert(e.user_message())
                    }
                }
            }
            Message::Generate => {
                if self.pending_load.is_some() {
                    tracing::warn!("⏳ Ignoring generate while an image is loading");
                    return Task::none();
                }
                self.apply(Event::GenerateRequested)
            }
            Message::GenerationFinished(ticket, Ok(result)) => {
                self.apply(Event::Resolved { ticket, result })
            }
            Message::GenerationFinished(ticket, Err(reason)) => {
                self.apply(Event::Rejected { ticket, reason })
            }
            Message::Reset => {
                self.status.clear();
                self.pending_load = None;
                self.apply(Event::ResetRequested)
            }
            Message::Download => match self.controller.export(Utc::now().timestamp_millis()) {
                Ok(export) => Task::perform(media::export::save_as(export), Message::DownloadFinished),
                Err(e) => {
                    tracing::warn!("⚠️  Download unavailable: {}", e);
                    Task::none()
                }
            },
            Message::DownloadFinished(Ok(Some(path))) => {
                self.status = format!("✅ Saved to {}", path.display());
                Task::none()
            }
            Message::DownloadFinished(Ok(None)) => Task::none(),
            Message::DownloadFinished(Err(e)) => {
                tracing::error!("⚠️  Download failed: {}", e);
                alert("Failed to save image.")
            }
            Message::AlertClosed => Task::none(),
        }
    }

    /// Read a photo from disk in the background
    ///
    /// Only the latest load is applied; starting another one supersedes it.
    fn load(&mut self, path: PathBuf) -> Task<Message> {
        self.status = format!("Loading {}...", path.display());
        self.load_serial += 1;
        let serial = self.load_serial;
        self.pending_load = Some(serial);
        Task::perform(ingest::load_source_image(path), move |outcome| {
            Message::ImageLoaded(serial, outcome)
        })
    }

    /// Whether the generate and regenerate actions are available
    fn can_generate(&self) -> bool {
        self.pending_load.is_none() && self.controller.can_generate()
    }

    /// Feed an event to the controller and run the effect it asks for
    fn apply(&mut self, event: Event) -> Task<Message> {
        match self.controller.apply(event) {
            Ok(Effect::Request(request)) => Task::perform(
                service::dispatch(self.service.clone(), request),
                |(ticket, outcome)| Message::GenerationFinished(ticket, outcome),
            ),
            Ok(Effect::None) => Task::none(),
            Err(TransitionError::StaleResult) => {
                tracing::warn!("🗑️  Discarding the result of a superseded request");
                Task::none()
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️  Ignored action in {} state: {}",
                    self.controller.state().name(),
                    e
                );
                Task::none()
            }
        }
    }

    /// Listen for files dropped on the window
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            iced::Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let body = match self.controller.source() {
            None => self.view_upload(),
            Some(source) => self.view_workspace(source),
        };

        let mut content = column![view_header(), body].spacing(32);
        if !self.status.is_empty() {
            content = content.push(text(&self.status).size(14).color(MUTED));
        }
        content = content.push(view_footer());

        container(content.padding(40).max_width(1024))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Hero section and upload area, shown until a photo is selected
    fn view_upload(&self) -> Element<'_, Message> {
        let upload = column![
            button("Upload an image")
                .on_press(Message::PickImage)
                .padding(12),
            text("Drag & drop or click to browse").size(14).color(MUTED),
            text("Supports JPEG, PNG, WEBP up to 10MB").size(12).color(FAINT),
        ]
        .spacing(12)
        .align_x(Alignment::Center);

        column![
            text("Add Cinematic Depth").size(44),
            text("to Any Photo").size(44).color(ACCENT),
            text(
                "Upload a photo and let our AI instantly identify the subject and apply \
                 a realistic, high-quality bokeh effect to the background."
            )
            .size(18)
            .color(MUTED),
            container(upload)
                .padding(48)
                .width(Length::Fill)
                .center_x(Length::Fill)
                .style(container::rounded_box),
        ]
        .spacing(16)
        .align_x(Alignment::Center)
        .into()
    }

    /// Preview or comparison plus the control bar
    fn view_workspace<'a>(&'a self, source: &'a SourceImage) -> Element<'a, Message> {
        let stage: Element<Message> = match self.controller.result() {
            Some(result) => canvas(Comparison::new(source.display.clone(), result.display.clone()))
                .width(Length::Fill)
                .height(STAGE_HEIGHT)
                .into(),
            None => self.view_preview(source),
        };

        column![
            container(stage).padding(16).style(container::rounded_box),
            self.view_controls(),
        ]
        .spacing(24)
        .into()
    }

    fn view_preview<'a>(&'a self, source: &'a SourceImage) -> Element<'a, Message> {
        let processing = self.controller.is_processing();

        let preview = image(source.display.handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(STAGE_HEIGHT)
            .opacity(if processing { 0.5 } else { 1.0 });

        if !processing {
            return preview.into();
        }

        let overlay = container(text("Analyzing Depth Map...").size(20))
            .width(Length::Fill)
            .height(STAGE_HEIGHT)
            .center_x(Length::Fill)
            .center_y(STAGE_HEIGHT);

        stack![preview, overlay].into()
    }

    fn view_controls(&self) -> Element<'_, Message> {
        // Reset stays available while processing so a pending request can be abandoned
        let mut status = row![button("New Image")
            .on_press(Message::Reset)
            .padding(10)
            .style(button::secondary)]
        .spacing(16)
        .align_y(Alignment::Center);

        if let Some(message) = self.controller.error_message() {
            status = status.push(text(format!("⚠ {}", message)).size(14).color(DANGER));
        }

        let actions: Element<Message> = match self.controller.state() {
            ProcessingState::Idle | ProcessingState::Error { .. } => button("Generate Depth Effect")
                .on_press_maybe(self.can_generate().then_some(Message::Generate))
                .padding(12)
                .into(),
            ProcessingState::Complete { .. } => row![
                button("Regenerate")
                    .on_press_maybe(self.can_generate().then_some(Message::Generate))
                    .padding(12)
                    .style(button::secondary),
                button("Download HD")
                    .on_press(Message::Download)
                    .padding(12)
                    .style(button::success),
            ]
            .spacing(12)
            .into(),
            ProcessingState::Processing { .. } => Space::with_width(0).into(),
        };

        container(
            row![status, Space::with_width(Length::Fill), actions].align_y(Alignment::Center),
        )
        .padding(16)
        .style(container::rounded_box)
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn view_header<'a>() -> Element<'a, Message> {
    row![
        text("FocusAI").size(28),
        text("Cinematic depth for any photo").size(14).color(MUTED),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}

fn view_footer<'a>() -> Element<'a, Message> {
    text(format!(
        "© {} FocusAI. Built with Gemini 2.5 Flash Image.",
        Utc::now().year()
    ))
    .size(12)
    .color(FAINT)
    .into()
}

/// Show a blocking warning dialog
fn alert(description: &str) -> Task<Message> {
    let dialog = AsyncMessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("FocusAI")
        .set_description(description)
        .show();

    Task::perform(dialog, |_| Message::AlertClosed)
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    iced::application("FocusAI", FocusAi::update, FocusAi::view)
        .subscription(FocusAi::subscription)
        .theme(FocusAi::theme)
        .centered()
        .run_with(FocusAi::new)
}
