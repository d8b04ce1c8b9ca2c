use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;

use super::clipboard;
use super::config::AppConfig;
use super::encode::{self, EncodedImage};
use super::error::AppError;
use super::gemini::GeminiClient;
use super::state::{
    CopyFeedbackEvent, DragHighlightEvent, ErrorEvent, GenerationState, StateEvent,
};

pub const COPY_FEEDBACK_TTL: Duration = Duration::from_secs(2);

const FAILURE_MESSAGE: &str = "Failed to generate alt text. Please try another image.";
const COPY_STATUS: &str = "Alt text copied to clipboard.";

/// The user's current image. Replaced wholesale on each selection; dropped
/// on reset, which releases the preview data URL.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub preview: Option<String>,
    pub mime_type: String,
    pub path: Option<PathBuf>,
}

enum GenerationInput {
    Path(PathBuf),
    Encoded(EncodedImage),
}

#[derive(Default)]
struct RuntimeInner {
    state: GenerationState,
    image: Option<SelectedImage>,
    request_seq: u64,
    generation_task: Option<tokio::task::JoinHandle<()>>,
    copy_reset_task: Option<tokio::task::JoinHandle<()>>,
    copied: bool,
}

impl RuntimeInner {
    /// A new selection always preempts: the prior in-flight task is aborted
    /// and its sequence number invalidated before the new request starts.
    fn begin_selection(&mut self, image: SelectedImage) -> u64 {
        if let Some(task) = self.generation_task.take() {
            task.abort();
        }
        self.request_seq += 1;
        self.image = Some(image);
        self.copied = false;
        self.state = GenerationState::Loading;
        self.request_seq
    }

    /// Applies a settled generation result. Returns `None` when the result
    /// belongs to a superseded request and must be discarded.
    fn settle(&mut self, seq: u64, result: Result<String, AppError>) -> Option<GenerationState> {
        if seq != self.request_seq {
            return None;
        }

        self.generation_task = None;
        self.state = match result {
            Ok(text) => GenerationState::Succeeded { alt_text: text },
            Err(_) => GenerationState::Failed {
                message: FAILURE_MESSAGE.to_string(),
            },
        };
        Some(self.state.clone())
    }

    fn reset(&mut self) {
        if let Some(task) = self.generation_task.take() {
            task.abort();
        }
        if let Some(task) = self.copy_reset_task.take() {
            task.abort();
        }
        self.request_seq += 1;
        self.image = None;
        self.copied = false;
        self.state = GenerationState::Idle;
    }

    fn state_event(&self) -> StateEvent {
        StateEvent {
            state: self.state.clone(),
            preview: self.image.as_ref().and_then(|i| i.preview.clone()),
            has_image: self.image.is_some(),
        }
    }
}

pub struct AppRuntime {
    inner: Arc<Mutex<RuntimeInner>>,
    config: Arc<Mutex<AppConfig>>,
    client: Arc<GeminiClient>,
}

impl AppRuntime {
    pub fn new(config: AppConfig, api_key: String) -> Self {
        let client = Arc::new(GeminiClient::new(&config, api_key));
        Self {
            inner: Arc::new(Mutex::new(RuntimeInner::default())),
            config: Arc::new(Mutex::new(config)),
            client,
        }
    }

    pub async fn get_config(&self) -> AppConfig {
        self.config.lock().await.clone()
    }

    pub async fn state(&self) -> StateEvent {
        self.inner.lock().await.state_event()
    }

    /// Select an image by filesystem path (picker or native drag-drop). The
    /// preview becomes available once the encode step has read the file.
    pub async fn select_image_path(&self, app: AppHandle, path: PathBuf) {
        let image = SelectedImage {
            preview: None,
            mime_type: encode::mime_for_path(&path).to_string(),
            path: Some(path.clone()),
        };

        tracing::info!("selected {}", path.display());
        self.start_request(app, image, GenerationInput::Path(path))
            .await;
    }

    /// Select an image already read by the webview as a data URL. The
    /// preview is available immediately; a malformed payload settles the
    /// same request as a failure.
    pub async fn select_image_data(
        &self,
        app: AppHandle,
        data_url: String,
        mime_type: Option<String>,
    ) {
        let fallback = mime_type.unwrap_or_else(|| "image/png".to_string());

        match encode::from_data_url(&data_url, &fallback) {
            Ok(encoded) => {
                let image = SelectedImage {
                    preview: Some(encoded.data_url()),
                    mime_type: encoded.mime_type.clone(),
                    path: None,
                };
                tracing::info!("selected inline {} image", encoded.mime_type);
                self.start_request(app, image, GenerationInput::Encoded(encoded))
                    .await;
            }
            Err(err) => {
                tracing::warn!("inline selection failed: {}", err.details());
                let image = SelectedImage {
                    preview: None,
                    mime_type: fallback,
                    path: None,
                };
                let mut inner = self.inner.lock().await;
                let seq = inner.begin_selection(image);
                inner.settle(seq, Err(err));
                let event = inner.state_event();
                drop(inner);
                emit_state(&app, event);
            }
        }
    }

    /// Reset clears everything, from any state. Aborting the task cancels
    /// the in-flight network call; the sequence bump catches a result that
    /// already settled past the abort point.
    pub async fn reset(&self, app: &AppHandle) {
        let mut inner = self.inner.lock().await;
        inner.reset();
        let event = inner.state_event();
        drop(inner);

        emit_state(app, event);
        emit_copy_feedback(
            app,
            CopyFeedbackEvent {
                copied: false,
                status: String::new(),
            },
        );
        tracing::info!("reset to idle");
    }

    /// Copies the generated text and shows a confirmation that expires on
    /// its own; re-triggering replaces the pending expiry instead of
    /// stacking timers. No-op outside the succeeded state.
    pub async fn copy_alt_text(&self, app: AppHandle) -> Result<(), AppError> {
        let text = {
            let inner = self.inner.lock().await;
            match &inner.state {
                GenerationState::Succeeded { alt_text } => alt_text.clone(),
                _ => return Ok(()),
            }
        };

        if let Err(err) = clipboard::copy_text(&text) {
            tracing::warn!("copy failed: {}", err.details());
            emit_error(&app, &err);
            return Err(err);
        }

        let mut inner = self.inner.lock().await;
        inner.copied = true;
        emit_copy_feedback(
            &app,
            CopyFeedbackEvent {
                copied: true,
                status: COPY_STATUS.to_string(),
            },
        );

        let on_clear = {
            let app = app.clone();
            move || {
                emit_copy_feedback(
                    &app,
                    CopyFeedbackEvent {
                        copied: false,
                        status: String::new(),
                    },
                );
            }
        };
        let timer = schedule_copy_reset(self.inner.clone(), COPY_FEEDBACK_TTL, on_clear);
        if let Some(prior) = inner.copy_reset_task.replace(timer) {
            prior.abort();
        }

        Ok(())
    }

    /// Abort, bump, spawn and store under one guard: two racing selections
    /// must never leave a second live task behind, and `generation_task`
    /// must always hold the handle belonging to the current sequence. The
    /// spawned task cannot deadlock here; its first lock acquisition parks
    /// until the guard drops.
    async fn start_request(&self, app: AppHandle, image: SelectedImage, input: GenerationInput) {
        let event = {
            let mut inner = self.inner.lock().await;
            let seq = inner.begin_selection(image);
            let task = self.spawn_generation(app.clone(), seq, input);
            inner.generation_task = Some(task);
            inner.state_event()
        };
        emit_state(&app, event);
    }

    fn spawn_generation(
        &self,
        app: AppHandle,
        seq: u64,
        input: GenerationInput,
    ) -> tokio::task::JoinHandle<()> {
        let inner = self.inner.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let encoded = match input {
                GenerationInput::Encoded(image) => image,
                GenerationInput::Path(path) => match encode::encode_file(&path).await {
                    Ok(image) => {
                        // Encode result lands before the generate step runs.
                        let mut guard = inner.lock().await;
                        if seq != guard.request_seq {
                            return;
                        }
                        if let Some(selected) = guard.image.as_mut() {
                            selected.preview = Some(image.data_url());
                            selected.mime_type = image.mime_type.clone();
                        }
                        let event = guard.state_event();
                        drop(guard);
                        emit_state(&app, event);
                        image
                    }
                    Err(err) => {
                        tracing::warn!("encoding failed: {}", err.details());
                        let mut guard = inner.lock().await;
                        if guard.settle(seq, Err(err)).is_some() {
                            let event = guard.state_event();
                            drop(guard);
                            emit_state(&app, event);
                        }
                        return;
                    }
                },
            };

            let result = client.generate_alt_text(&encoded).await;
            if let Err(err) = &result {
                tracing::warn!("generation failed: {}", err.details());
            }

            let mut guard = inner.lock().await;
            match guard.settle(seq, result) {
                Some(_) => {
                    let event = guard.state_event();
                    drop(guard);
                    emit_state(&app, event);
                }
                None => tracing::debug!("discarding stale generation result seq={seq}"),
            }
        })
    }

}

/// Timer-scheduled reset of the transient copy confirmation. The caller
/// replaces any pending timer, so at most one expiry is ever scheduled.
/// The cleared event goes out while the lock is still held; a re-trigger
/// that is waiting on the lock cannot have its `copied: true` overtaken by
/// this timer's clear.
fn schedule_copy_reset(
    inner: Arc<Mutex<RuntimeInner>>,
    ttl: Duration,
    on_clear: impl Fn() + Send + 'static,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        let mut guard = inner.lock().await;
        guard.copied = false;
        guard.copy_reset_task = None;
        on_clear();
    })
}

fn emit_state(app: &AppHandle, event: StateEvent) {
    let _ = app.emit("alttext://state", event);
}

fn emit_error(app: &AppHandle, err: &AppError) {
    let _ = app.emit(
        "alttext://error",
        ErrorEvent {
            user_message: err.user_message(),
            details: err.details(),
        },
    );
}

fn emit_copy_feedback(app: &AppHandle, event: CopyFeedbackEvent) {
    let _ = app.emit("alttext://copy-feedback", event);
}

pub fn emit_drag_highlight(app: &AppHandle, active: bool) {
    let _ = app.emit("alttext://drag", DragHighlightEvent { active });
}
