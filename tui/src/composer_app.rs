//! The interactive composer session: terminal events in, `on_send` calls out.
//!
//! All composer state lives on this loop. Image resizes and uploads run as spawned tasks that
//! only report back through [`AppEvent`]s, and they stop as soon as the composer is dropped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use composer_protocol::MessageContent;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::attachment_upload::AttachmentUploader;
use crate::attachment_upload::attachment_display_name;
use crate::bottom_pane::ChatComposer;
use crate::bottom_pane::ComposerParams;
use crate::bottom_pane::InputResult;
use crate::bottom_pane::SendRequest;
use crate::exit::AppExitInfo;
use crate::exit::ExitReason;
use crate::image_attach::ImageBounds;
use crate::image_attach::resize_image;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::render::renderable::Renderable;
use crate::tui;

/// How often the loop wakes up to expire transient hints.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Clears the draft; pressed again while the hint is visible, quits.
const QUIT_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('c'));
/// Quits immediately, but only with an empty draft.
const QUIT_DRAFT_EMPTY_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('d'));

/// What the loop should do after a key press.
#[derive(Debug, PartialEq)]
enum KeyOutcome {
    Continue { redraw: bool },
    Send(SendRequest),
    Exit,
}

/// Owns the composer and the wiring between it, its background work, and the caller.
pub struct ComposerApp {
    composer: ChatComposer,
    app_event_tx: AppEventSender,
    app_event_rx: UnboundedReceiver<AppEvent>,
    uploader: Arc<dyn AttachmentUploader>,
    messages_sent: usize,
}

impl ComposerApp {
    pub fn new(params: ComposerParams, uploader: Arc<dyn AttachmentUploader>) -> Self {
        let (app_event_tx_raw, app_event_rx) = unbounded_channel::<AppEvent>();
        let app_event_tx = AppEventSender::new(app_event_tx_raw);
        Self {
            composer: ChatComposer::new(params, app_event_tx.clone()),
            app_event_tx,
            app_event_rx,
            uploader,
            messages_sent: 0,
        }
    }

    /// Run the composer in the current terminal until the user quits.
    ///
    /// `on_send` is invoked once per accepted send with the composed content and the
    /// conversation id. Sent messages are echoed into the terminal scrollback above the
    /// composer.
    pub async fn run<F>(mut self, mut on_send: F) -> anyhow::Result<AppExitInfo>
    where
        F: FnMut(MessageContent, Option<String>),
    {
        let mut terminal = tui::init()?;
        let _restore_guard = tui::RestoreGuard;
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        let mut quit_hint_visible = false;

        self.draw(&mut terminal)?;
        let exit_reason = loop {
            tokio::select! {
                maybe_event = events.next() => {
                    let event = match maybe_event {
                        Some(Ok(event)) => event,
                        Some(Err(err)) => {
                            tracing::error!("failed to read terminal event: {err}");
                            break ExitReason::InputClosed;
                        }
                        None => break ExitReason::InputClosed,
                    };
                    let redraw = match event {
                        Event::Key(key_event) => match self.handle_key_event(key_event) {
                            KeyOutcome::Continue { redraw } => redraw,
                            KeyOutcome::Send(request) => {
                                let lines = sent_message_lines(&request.content);
                                self.dispatch(request, &mut on_send);
                                insert_history_lines(&mut terminal, lines)?;
                                true
                            }
                            KeyOutcome::Exit => break ExitReason::UserRequested,
                        },
                        Event::Paste(pasted) => self.composer.handle_paste(pasted),
                        Event::Resize(_, _) => true,
                        _ => false,
                    };
                    if redraw {
                        self.draw(&mut terminal)?;
                    }
                }
                Some(app_event) = self.app_event_rx.recv() => {
                    self.handle_app_event(app_event);
                    self.draw(&mut terminal)?;
                }
                _ = tick.tick() => {
                    let visible = self.composer.quit_shortcut_hint_visible();
                    if visible != quit_hint_visible {
                        quit_hint_visible = visible;
                        self.draw(&mut terminal)?;
                    }
                }
            }
        };

        terminal.clear()?;
        Ok(AppExitInfo {
            messages_sent: self.messages_sent,
            exit_reason,
        })
    }

    fn draw(&self, terminal: &mut tui::Terminal) -> anyhow::Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            let height = self.composer.desired_height(area.width).min(area.height);
            let composer_area = Rect { height, ..area };
            self.composer.render(composer_area, frame.buffer_mut());
            if let Some((x, y)) = self.composer.cursor_pos(composer_area) {
                frame.set_cursor_position((x, y));
            }
        })?;
        Ok(())
    }

    fn dispatch<F>(&mut self, request: SendRequest, on_send: &mut F)
    where
        F: FnMut(MessageContent, Option<String>),
    {
        self.messages_sent += 1;
        let SendRequest {
            content,
            conversation_id,
        } = request;
        on_send(content, conversation_id);
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) -> KeyOutcome {
        if key_event.kind == KeyEventKind::Release {
            return KeyOutcome::Continue { redraw: false };
        }

        if QUIT_DRAFT_EMPTY_KEY.is_press(key_event) && self.composer.is_empty() {
            return KeyOutcome::Exit;
        }
        if QUIT_KEY.is_press(key_event) {
            if self.composer.quit_shortcut_hint_visible() {
                return KeyOutcome::Exit;
            }
            if let Some(discarded) = self.composer.clear_for_ctrl_c() {
                tracing::debug!("discarded draft of {} bytes", discarded.len());
            }
            self.composer.show_quit_shortcut_hint(QUIT_KEY);
            return KeyOutcome::Continue { redraw: true };
        }

        match self.composer.handle_key_event(key_event) {
            (InputResult::Submitted(request), _) => KeyOutcome::Send(request),
            (InputResult::None, redraw) => KeyOutcome::Continue { redraw },
        }
    }

    fn handle_app_event(&mut self, app_event: AppEvent) {
        match app_event {
            AppEvent::StartImageResize {
                generation,
                path,
                bounds,
            } => self.spawn_image_resize(generation, path, bounds),
            AppEvent::ImageAttached { generation, image } => {
                self.composer.on_image_attached(generation, image);
            }
            AppEvent::StartUpload(path) => self.spawn_upload(path),
            AppEvent::UploadFailed { file_name, error } => {
                self.composer.on_upload_failed(&file_name, &error);
            }
        }
    }

    fn spawn_image_resize(&self, generation: u64, path: PathBuf, bounds: ImageBounds) {
        let tx = self.app_event_tx.clone();
        let cancel = self.composer.cancellation_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("image resize cancelled: {}", path.display());
                }
                result = resize_image(path.clone(), bounds) => match result {
                    Ok(image) => tx.send(AppEvent::ImageAttached { generation, image }),
                    Err(err) => tracing::warn!("failed to attach image {}: {err}", path.display()),
                },
            }
        });
    }

    fn spawn_upload(&self, path: PathBuf) {
        let tx = self.app_event_tx.clone();
        let cancel = self.composer.cancellation_token();
        let uploader = Arc::clone(&self.uploader);
        tokio::spawn(async move {
            let file_name = attachment_display_name(&path);
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("upload cancelled: {file_name}");
                }
                result = uploader.upload(&path) => match result {
                    Ok(metadata) => tracing::info!(
                        server_file_name = metadata.file_name(),
                        url = metadata.url(),
                        "uploaded {file_name}"
                    ),
                    Err(error) => tx.send(AppEvent::UploadFailed { file_name, error }),
                },
            }
        });
    }
}

/// Scrollback echo of a sent message.
fn sent_message_lines(content: &MessageContent) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = content
        .text()
        .split('\n')
        .enumerate()
        .map(|(idx, line)| {
            let prefix = if idx == 0 { "› " } else { "  " };
            Line::from(vec![prefix.dim(), line.to_string().into()])
        })
        .collect();
    if content.image_url().is_some() {
        lines.push(Line::from("  [image]".cyan()));
    }
    lines.push(Line::from(""));
    lines
}

fn insert_history_lines(
    terminal: &mut tui::Terminal,
    lines: Vec<Line<'static>>,
) -> anyhow::Result<()> {
    let width = usize::from(terminal.size()?.width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    let height = u16::try_from(rows).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    terminal.insert_before(height, |buf| paragraph.render(buf.area, buf))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment_upload::UploadError;
    use async_trait::async_trait;
    use composer_protocol::UploadMetadata;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingUploader {
        fail: bool,
        uploaded: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl AttachmentUploader for RecordingUploader {
        async fn upload(&self, path: &Path) -> Result<UploadMetadata, UploadError> {
            self.uploaded
                .lock()
                .expect("lock")
                .push(path.to_path_buf());
            if self.fail {
                Err(UploadError::Io(std::io::Error::other("boom")))
            } else {
                Ok(UploadMetadata(serde_json::json!({"filename": "ok"})))
            }
        }
    }

    fn app_with(uploader: Arc<RecordingUploader>) -> ComposerApp {
        ComposerApp::new(ComposerParams::default(), uploader)
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    async fn pump_next_event(app: &mut ComposerApp) {
        let event = tokio::time::timeout(Duration::from_secs(5), app.app_event_rx.recv())
            .await
            .expect("timed out waiting for app event")
            .expect("channel open");
        app.handle_app_event(event);
    }

    #[tokio::test]
    async fn failed_upload_surfaces_alert() {
        let uploader = Arc::new(RecordingUploader {
            fail: true,
            ..RecordingUploader::default()
        });
        let mut app = app_with(Arc::clone(&uploader));

        app.composer.attach_file(PathBuf::from("/tmp/notes.txt"));
        pump_next_event(&mut app).await; // StartUpload
        pump_next_event(&mut app).await; // UploadFailed

        assert_eq!(
            app.composer.alert_message(),
            Some(crate::bottom_pane::UPLOAD_FAILED_MESSAGE)
        );
        assert_eq!(
            *uploader.uploaded.lock().expect("lock"),
            vec![PathBuf::from("/tmp/notes.txt")]
        );
    }

    #[tokio::test]
    async fn successful_upload_keeps_file_name_without_alert() {
        let uploader = Arc::new(RecordingUploader::default());
        let mut app = app_with(Arc::clone(&uploader));

        app.composer.attach_file(PathBuf::from("/tmp/notes.txt"));
        pump_next_event(&mut app).await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while uploader.uploaded.lock().expect("lock").is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("upload should run");

        assert_eq!(app.composer.alert_message(), None);
        assert_eq!(app.composer.attached_file_name(), Some("notes.txt"));
    }

    #[tokio::test]
    async fn image_resize_result_reaches_composer() {
        use image::ImageBuffer;
        use image::Rgb;

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("wide.png");
        ImageBuffer::from_pixel(1600, 400, Rgb([10u8, 20, 30]))
            .save(&path)
            .expect("write png");

        let mut app = app_with(Arc::new(RecordingUploader::default()));
        app.composer.request_image_attach(path);
        pump_next_event(&mut app).await; // StartImageResize
        pump_next_event(&mut app).await; // ImageAttached

        let image = app.composer.attached_image().expect("image attached");
        assert_eq!((image.width, image.height), (800, 200));
        assert!(image.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn undecodable_image_leaves_state_unchanged() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"definitely not a png").expect("write");

        let mut app = app_with(Arc::new(RecordingUploader::default()));
        app.composer.request_image_attach(path);
        pump_next_event(&mut app).await; // StartImageResize

        let next = tokio::time::timeout(Duration::from_millis(500), app.app_event_rx.recv()).await;
        assert!(next.is_err(), "no event expected after a failed resize");
        assert_eq!(app.composer.attached_image(), None);
        assert_eq!(app.composer.alert_message(), None);
    }

    #[tokio::test]
    async fn enter_dispatches_to_callback_once() {
        let mut app = app_with(Arc::new(RecordingUploader::default()));
        for ch in "Hello".chars() {
            app.handle_key_event(key(KeyCode::Char(ch), KeyModifiers::NONE));
        }

        let outcome = app.handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE));
        let KeyOutcome::Send(request) = outcome else {
            panic!("expected send, got {outcome:?}");
        };

        let mut calls = Vec::new();
        app.dispatch(request, &mut |content, conversation_id| {
            calls.push((content, conversation_id));
        });
        assert_eq!(calls, vec![(MessageContent::Text("Hello".to_string()), None)]);
        assert_eq!(app.messages_sent, 1);
    }

    #[tokio::test]
    async fn ctrl_c_clears_then_quits() {
        let mut app = app_with(Arc::new(RecordingUploader::default()));
        app.handle_key_event(key(KeyCode::Char('x'), KeyModifiers::NONE));

        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Continue { redraw: true }
        );
        assert!(app.composer.is_empty());
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Exit
        );
    }

    #[tokio::test]
    async fn ctrl_d_quits_only_when_empty() {
        let mut app = app_with(Arc::new(RecordingUploader::default()));
        app.handle_key_event(key(KeyCode::Char('x'), KeyModifiers::NONE));
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            KeyOutcome::Continue { redraw: false }
        );
        app.handle_key_event(key(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            KeyOutcome::Exit
        );
    }

    #[test]
    fn sent_message_lines_prefix_each_line() {
        let content = MessageContent::compose("one\ntwo".to_string(), Some("X".to_string()));
        let rendered: Vec<String> = sent_message_lines(&content)
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect();
        assert_eq!(rendered, vec!["› one", "  two", "  [image]", ""]);
    }
}
