//! The chat composer is the bottom-pane message input state machine.
//!
//! It is responsible for:
//!
//! - Editing the input buffer (a [`TextArea`]).
//! - Handling send vs newline on Enter.
//! - Holding the attachment state: at most one resized image (embedded in the next message)
//!   and the display name of the last uploaded file.
//! - Routing keys to the active popup (attachment path prompt or blocking alert).
//!
//! # Send gating
//!
//! A send happens only when the composer is not `disabled` and the text has at least one
//! non-whitespace character. An attached image alone never sends. After a send the image is
//! always cleared; the text is cleared only when `clear_on_send` is set.
//!
//! # Attachments
//!
//! Images and files are two independent side channels. Both are started here but run elsewhere:
//! the composer emits [`AppEvent::StartImageResize`] / [`AppEvent::StartUpload`] and the owning
//! app reports results back through [`ChatComposer::on_image_attached`] and
//! [`ChatComposer::on_upload_failed`]. Upload results are never joined into the sent message.
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use composer_protocol::MessageContent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use tokio_util::sync::CancellationToken;

use super::alert_popup::AlertPopup;
use super::footer::FooterMode;
use super::footer::FooterProps;
use super::footer::footer_height;
use super::footer::render_footer;
use super::path_prompt::AttachKind;
use super::path_prompt::PathPrompt;
use super::path_prompt::PathPromptResult;
use super::textarea::TextArea;
use super::textarea::TextAreaState;
use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::attachment_upload::UploadError;
use crate::attachment_upload::attachment_display_name;
use crate::image_attach::AttachedImage;
use crate::image_attach::ImageBounds;
use crate::image_attach::normalize_pasted_path;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::render::Insets;
use crate::render::RectExt;
use crate::render::renderable::Renderable;
use crate::ui_consts::LIVE_PREFIX_COLS;

pub const DEFAULT_PLACEHOLDER: &str = "Type your message...";
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload the file. Please try again.";

/// How long the "press again to quit" hint stays visible.
pub const QUIT_SHORTCUT_TIMEOUT: Duration = Duration::from_secs(1);

/// Options supplied by whoever embeds the composer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerParams {
    /// Suppresses send regardless of the text.
    pub disabled: bool,
    pub placeholder: Option<String>,
    /// Clear the text after a successful send.
    pub clear_on_send: bool,
    /// Passed through verbatim with every send.
    pub conversation_id: Option<String>,
    /// Bounding box attached images are shrunk to.
    pub image_bounds: ImageBounds,
}

/// A composed message ready for the `on_send` callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub content: MessageContent,
    pub conversation_id: Option<String>,
}

/// Result returned when the user interacts with the composer.
#[derive(Debug, PartialEq)]
pub enum InputResult {
    Submitted(SendRequest),
    None,
}

/// Popup state – at most one can be visible at any time.
enum ActivePopup {
    None,
    PathPrompt(PathPrompt),
    /// `resume` is the prompt the alert interrupted; it comes back once the alert is dismissed.
    Alert {
        alert: AlertPopup,
        resume: Option<PathPrompt>,
    },
}

pub struct ChatComposer {
    textarea: TextArea,
    textarea_state: RefCell<TextAreaState>,
    active_popup: ActivePopup,
    app_event_tx: AppEventSender,
    disabled: bool,
    placeholder_text: String,
    clear_on_send: bool,
    conversation_id: Option<String>,
    attached_image: Option<AttachedImage>,
    /// Bumped for every image request so only the most recent one lands.
    image_generation: u64,
    image_bounds: ImageBounds,
    attached_file_name: Option<String>,
    /// Cancelled when the composer is dropped; in-flight attachment work watches it.
    cancel_token: CancellationToken,
    quit_shortcut_expires_at: Option<Instant>,
    quit_shortcut_key: KeyBinding,
}

impl ChatComposer {
    pub(crate) fn new(params: ComposerParams, app_event_tx: AppEventSender) -> Self {
        let ComposerParams {
            disabled,
            placeholder,
            clear_on_send,
            conversation_id,
            image_bounds,
        } = params;
        Self {
            textarea: TextArea::new(),
            textarea_state: RefCell::new(TextAreaState::default()),
            active_popup: ActivePopup::None,
            app_event_tx,
            disabled,
            placeholder_text: placeholder.unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
            clear_on_send,
            conversation_id,
            attached_image: None,
            image_generation: 0,
            image_bounds,
            attached_file_name: None,
            cancel_token: CancellationToken::new(),
            quit_shortcut_expires_at: None,
            quit_shortcut_key: key_hint::ctrl(KeyCode::Char('c')),
        }
    }

    /// Returns true if the composer currently contains no typed text.
    pub fn is_empty(&self) -> bool {
        self.textarea.is_empty()
    }

    pub fn current_text(&self) -> String {
        self.textarea.text().to_string()
    }

    /// Replace the entire composer content with `text` and move the cursor to the end.
    pub fn set_text_content(&mut self, text: String) {
        self.textarea.set_text(&text);
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn attached_image(&self) -> Option<&AttachedImage> {
        self.attached_image.as_ref()
    }

    pub fn attached_file_name(&self) -> Option<&str> {
        self.attached_file_name.as_deref()
    }

    pub fn alert_message(&self) -> Option<&str> {
        match &self.active_popup {
            ActivePopup::Alert { alert, .. } => Some(alert.message()),
            _ => None,
        }
    }

    /// Whether a send would go through right now.
    pub fn can_send(&self) -> bool {
        !self.disabled && !self.textarea.text().trim().is_empty()
    }

    /// Compose and hand out the outgoing message, applying the post-send resets.
    ///
    /// Returns `None` (and leaves all state untouched) when sending is not allowed.
    pub fn submit(&mut self) -> Option<SendRequest> {
        if !self.can_send() {
            return None;
        }

        let text = self.textarea.text().to_string();
        let image_url = self.attached_image.take().map(|image| image.data_url);
        let content = MessageContent::compose(text, image_url);
        if self.clear_on_send {
            self.textarea.set_text("");
        }
        tracing::debug!(
            with_image = content.image_url().is_some(),
            "composer submitted message"
        );

        Some(SendRequest {
            content,
            conversation_id: self.conversation_id.clone(),
        })
    }

    /// Clear the draft for Ctrl+C. Returns the text that was discarded, if any.
    pub fn clear_for_ctrl_c(&mut self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let text = self.current_text();
        self.textarea.set_text("");
        Some(text)
    }

    /// Token that is cancelled once this composer is torn down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub(crate) fn show_quit_shortcut_hint(&mut self, key: KeyBinding) {
        self.quit_shortcut_expires_at = Some(Instant::now() + QUIT_SHORTCUT_TIMEOUT);
        self.quit_shortcut_key = key;
    }

    pub fn clear_quit_shortcut_hint(&mut self) {
        self.quit_shortcut_expires_at = None;
    }

    pub fn quit_shortcut_hint_visible(&self) -> bool {
        self.quit_shortcut_expires_at
            .is_some_and(|expires_at| Instant::now() < expires_at)
    }

    /// Start the image pipeline for `path`. The preview appears once the resize finishes.
    pub fn request_image_attach(&mut self, path: PathBuf) {
        self.image_generation += 1;
        tracing::info!("attaching image {}", path.display());
        self.app_event_tx.send(AppEvent::StartImageResize {
            generation: self.image_generation,
            path,
            bounds: self.image_bounds,
        });
    }

    /// Show the file name right away and start uploading `path`.
    pub fn attach_file(&mut self, path: PathBuf) {
        self.attached_file_name = Some(attachment_display_name(&path));
        self.app_event_tx.send(AppEvent::StartUpload(path));
    }

    pub fn on_image_attached(&mut self, generation: u64, image: AttachedImage) {
        if generation != self.image_generation {
            tracing::debug!("ignoring stale image attachment (generation {generation})");
            return;
        }
        tracing::debug!(
            "attached image {}x{} as {}",
            image.width,
            image.height,
            image.format.label()
        );
        self.attached_image = Some(image);
    }

    pub fn on_upload_failed(&mut self, file_name: &str, error: &UploadError) {
        tracing::error!("error uploading {file_name}: {error}");
        let resume = match std::mem::replace(&mut self.active_popup, ActivePopup::None) {
            ActivePopup::None => None,
            ActivePopup::PathPrompt(prompt) => Some(prompt),
            ActivePopup::Alert { resume, .. } => resume,
        };
        self.active_popup = ActivePopup::Alert {
            alert: AlertPopup::new(UPLOAD_FAILED_MESSAGE),
            resume,
        };
    }

    /// Integrate pasted text into the composer.
    ///
    /// A paste that is a single path to a decodable image attaches that image instead of
    /// inserting text. Everything else is inserted verbatim at the cursor.
    pub fn handle_paste(&mut self, pasted: String) -> bool {
        let pasted = pasted.replace("\r\n", "\n").replace('\r', "\n");
        match &mut self.active_popup {
            ActivePopup::PathPrompt(prompt) => prompt.handle_paste(&pasted),
            ActivePopup::Alert { .. } => return false,
            ActivePopup::None => {
                if pasted.chars().count() > 1 && self.handle_paste_image_path(&pasted) {
                    return true;
                }
                self.textarea.insert_str(&pasted);
            }
        }
        true
    }

    fn handle_paste_image_path(&mut self, pasted: &str) -> bool {
        let Some(path) = normalize_pasted_path(pasted) else {
            return false;
        };

        match image::image_dimensions(&path) {
            Ok((width, height)) => {
                tracing::debug!("pasted image path dimensions={width}x{height}");
                self.request_image_attach(path);
                true
            }
            Err(err) => {
                tracing::trace!("pasted text is not an image path: {err}");
                false
            }
        }
    }

    /// Handle a key event coming from the main UI.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> (InputResult, bool) {
        if key_event.kind == KeyEventKind::Release {
            return (InputResult::None, false);
        }

        match &mut self.active_popup {
            ActivePopup::Alert { alert, resume } => {
                if alert.handle_key_event(key_event) {
                    self.active_popup = match resume.take() {
                        Some(prompt) => ActivePopup::PathPrompt(prompt),
                        None => ActivePopup::None,
                    };
                }
                (InputResult::None, true)
            }
            ActivePopup::PathPrompt(prompt) => {
                match prompt.handle_key_event(key_event) {
                    PathPromptResult::Pending => {}
                    PathPromptResult::Cancelled => self.active_popup = ActivePopup::None,
                    PathPromptResult::Confirmed(kind, path) => {
                        self.active_popup = ActivePopup::None;
                        match kind {
                            AttachKind::Image => self.request_image_attach(path),
                            AttachKind::File => self.attach_file(path),
                        }
                    }
                }
                (InputResult::None, true)
            }
            ActivePopup::None => self.handle_key_event_without_popup(key_event),
        }
    }

    fn handle_key_event_without_popup(&mut self, key_event: KeyEvent) -> (InputResult, bool) {
        self.clear_quit_shortcut_hint();
        match key_event {
            KeyEvent {
                code: KeyCode::Char('o'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.active_popup = ActivePopup::PathPrompt(PathPrompt::new(AttachKind::Image));
                (InputResult::None, true)
            }
            KeyEvent {
                code: KeyCode::Char('f'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.active_popup = ActivePopup::PathPrompt(PathPrompt::new(AttachKind::File));
                (InputResult::None, true)
            }
            // Terminals without enhanced key reporting deliver Ctrl+J for a raw line feed.
            KeyEvent {
                code: KeyCode::Char('j'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.textarea.insert_str("\n");
                (InputResult::None, true)
            }
            KeyEvent {
                code: KeyCode::Enter,
                modifiers,
                ..
            } if modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                self.textarea.insert_str("\n");
                (InputResult::None, true)
            }
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => match self.submit() {
                Some(request) => (InputResult::Submitted(request), true),
                None => (InputResult::None, true),
            },
            input => {
                let changed = self.textarea.input(input);
                (InputResult::None, changed)
            }
        }
    }

    fn footer_props(&self) -> FooterProps {
        FooterProps {
            mode: self.footer_mode(),
            send_enabled: self.can_send(),
            quit_shortcut_key: self.quit_shortcut_key,
        }
    }

    fn footer_mode(&self) -> FooterMode {
        match &self.active_popup {
            ActivePopup::Alert { .. } => FooterMode::Alert,
            ActivePopup::PathPrompt(_) => FooterMode::PathPrompt,
            ActivePopup::None if self.quit_shortcut_hint_visible() => {
                FooterMode::QuitShortcutReminder
            }
            ActivePopup::None => FooterMode::ShortcutSummary,
        }
    }

    fn attachment_line(&self) -> Option<Line<'static>> {
        let mut spans: Vec<Span<'static>> = Vec::new();
        if let Some(image) = &self.attached_image {
            spans.push(format!("[image {}×{} attached]", image.width, image.height).cyan());
        }
        if let Some(name) = &self.attached_file_name {
            if !spans.is_empty() {
                spans.push("  ".into());
            }
            spans.push(format!("Attached: {name}").dim());
        }
        if spans.is_empty() {
            return None;
        }
        spans.insert(0, " ".repeat(usize::from(LIVE_PREFIX_COLS) + 2).into());
        Some(Line::from(spans))
    }

    fn popup_height(&self, width: u16) -> u16 {
        match &self.active_popup {
            ActivePopup::None => 0,
            ActivePopup::PathPrompt(prompt) => prompt.desired_height(width),
            ActivePopup::Alert { alert, .. } => alert.desired_height(width),
        }
    }

    /// Splits `area` into attachment row, bordered composer, popup, and footer.
    fn layout_areas(&self, area: Rect) -> [Rect; 5] {
        let attachment_height = u16::from(self.attachment_line().is_some());
        let [attachment_rect, composer_rect, popup_rect, footer_rect] = Layout::vertical([
            Constraint::Length(attachment_height),
            Constraint::Min(3),
            Constraint::Length(self.popup_height(area.width)),
            Constraint::Length(footer_height(self.footer_props())),
        ])
        .areas(area);
        let textarea_rect = composer_rect.inset(Insets::tlbr(1, 2 + LIVE_PREFIX_COLS, 1, 1));
        [
            attachment_rect,
            composer_rect,
            textarea_rect,
            popup_rect,
            footer_rect,
        ]
    }
}

impl Drop for ChatComposer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Renderable for ChatComposer {
    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let [_, _, textarea_rect, popup_rect, _] = self.layout_areas(area);
        match &self.active_popup {
            ActivePopup::Alert { .. } => None,
            ActivePopup::PathPrompt(prompt) => prompt.cursor_pos(popup_rect),
            ActivePopup::None => {
                let state = *self.textarea_state.borrow();
                self.textarea.cursor_pos_with_state(textarea_rect, state)
            }
        }
    }

    fn desired_height(&self, width: u16) -> u16 {
        const COLS_WITH_BORDER: u16 = LIVE_PREFIX_COLS + 3;
        u16::from(self.attachment_line().is_some())
            + self
                .textarea
                .desired_height(width.saturating_sub(COLS_WITH_BORDER))
            + 2
            + self.popup_height(width)
            + footer_height(self.footer_props())
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        let [attachment_rect, composer_rect, textarea_rect, popup_rect, footer_rect] =
            self.layout_areas(area);

        if let Some(line) = self.attachment_line() {
            line.render_ref(attachment_rect, buf);
        }

        let border_style = if self.disabled {
            Style::default().dim()
        } else {
            Style::default()
        };
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .render(composer_rect, buf);

        if !textarea_rect.is_empty() {
            let prompt = if self.disabled {
                "›".dim()
            } else {
                "›".bold()
            };
            buf.set_span(
                textarea_rect.x - LIVE_PREFIX_COLS,
                textarea_rect.y,
                &prompt,
                LIVE_PREFIX_COLS,
            );
        }

        let mut state = self.textarea_state.borrow_mut();
        self.textarea
            .render_with_state(textarea_rect, buf, &mut state, Style::default());
        if self.textarea.is_empty() {
            Line::from(self.placeholder_text.as_str().dim()).render_ref(textarea_rect, buf);
        }

        match &self.active_popup {
            ActivePopup::None => {}
            ActivePopup::PathPrompt(prompt) => prompt.render(popup_rect, buf),
            ActivePopup::Alert { alert, .. } => alert.render(popup_rect, buf),
        }
        render_footer(footer_rect, buf, self.footer_props());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_attach::EncodedImageFormat;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn composer_with(params: ComposerParams) -> (ChatComposer, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel::<AppEvent>();
        (ChatComposer::new(params, AppEventSender::new(tx)), rx)
    }

    fn default_composer() -> (ChatComposer, UnboundedReceiver<AppEvent>) {
        composer_with(ComposerParams::default())
    }

    fn type_chars(composer: &mut ChatComposer, text: &str) {
        for ch in text.chars() {
            let _ = composer.handle_key_event(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    fn press(composer: &mut ChatComposer, code: KeyCode, modifiers: KeyModifiers) -> InputResult {
        composer.handle_key_event(KeyEvent::new(code, modifiers)).0
    }

    fn sample_image(url: &str) -> AttachedImage {
        AttachedImage {
            data_url: url.to_string(),
            width: 640,
            height: 480,
            format: EncodedImageFormat::Jpeg,
        }
    }

    fn attach_sample_image(composer: &mut ChatComposer, url: &str) {
        composer.request_image_attach(PathBuf::from("/tmp/cat.png"));
        let generation = composer.image_generation;
        composer.on_image_attached(generation, sample_image(url));
    }

    fn render_rows(composer: &ChatComposer, width: u16) -> Vec<String> {
        let height = composer.desired_height(width);
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        composer.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn enter_sends_text_and_clears_when_configured() {
        let (mut composer, _rx) = composer_with(ComposerParams {
            clear_on_send: true,
            ..ComposerParams::default()
        });
        type_chars(&mut composer, "Hello");

        let result = press(&mut composer, KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(
            result,
            InputResult::Submitted(SendRequest {
                content: MessageContent::Text("Hello".to_string()),
                conversation_id: None,
            })
        );
        assert_eq!(composer.current_text(), "");
    }

    #[test]
    fn text_is_retained_without_clear_on_send() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "keep me");

        let result = press(&mut composer, KeyCode::Enter, KeyModifiers::NONE);

        assert!(matches!(result, InputResult::Submitted(_)));
        assert_eq!(composer.current_text(), "keep me");
    }

    #[test]
    fn whitespace_only_text_never_sends() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "  ");

        assert_eq!(composer.submit(), None);
        assert_eq!(
            press(&mut composer, KeyCode::Enter, KeyModifiers::NONE),
            InputResult::None
        );
        assert_eq!(composer.current_text(), "  ");
    }

    #[test]
    fn empty_text_with_image_does_not_send_or_clear_image() {
        let (mut composer, _rx) = default_composer();
        attach_sample_image(&mut composer, "data:image/jpeg;base64,AAA");

        assert_eq!(composer.submit(), None);
        assert!(composer.attached_image().is_some());
    }

    #[test]
    fn disabled_composer_never_sends() {
        let (mut composer, _rx) = composer_with(ComposerParams {
            disabled: true,
            clear_on_send: true,
            ..ComposerParams::default()
        });
        type_chars(&mut composer, "Hello");

        assert_eq!(
            press(&mut composer, KeyCode::Enter, KeyModifiers::NONE),
            InputResult::None
        );
        assert_eq!(composer.current_text(), "Hello");

        composer.set_disabled(false);
        assert!(composer.submit().is_some());
    }

    #[test]
    fn untrimmed_text_and_conversation_id_are_passed_through() {
        let (mut composer, _rx) = composer_with(ComposerParams {
            conversation_id: Some("conv-42".to_string()),
            ..ComposerParams::default()
        });
        type_chars(&mut composer, " hi ");

        let request = composer.submit().expect("should send");
        assert_eq!(request.content, MessageContent::Text(" hi ".to_string()));
        assert_eq!(request.conversation_id.as_deref(), Some("conv-42"));
    }

    #[test]
    fn image_is_sent_as_parts_and_cleared() {
        let (mut composer, _rx) = default_composer();
        attach_sample_image(&mut composer, "X");
        type_chars(&mut composer, "caption");

        let request = composer.submit().expect("should send");

        assert_eq!(
            serde_json::to_value(&request.content).expect("serialize"),
            serde_json::json!([
                {"type": "text", "text": "caption"},
                {"type": "image_url", "image_url": {"url": "X"}},
            ])
        );
        assert_eq!(composer.attached_image(), None);

        let request = composer.submit().expect("text retained, sends again");
        assert_eq!(request.content, MessageContent::Text("caption".to_string()));
    }

    #[test]
    fn shift_enter_inserts_newline_at_cursor() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "ab");
        press(&mut composer, KeyCode::Left, KeyModifiers::NONE);

        let result = press(&mut composer, KeyCode::Enter, KeyModifiers::SHIFT);

        assert_eq!(result, InputResult::None);
        assert_eq!(composer.current_text(), "a\nb");
    }

    #[test]
    fn ctrl_j_inserts_newline() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "a");
        press(&mut composer, KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert_eq!(composer.current_text(), "a\n");
    }

    #[test]
    fn alt_enter_inserts_newline() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "a");

        let result = press(&mut composer, KeyCode::Enter, KeyModifiers::ALT);

        assert_eq!(result, InputResult::None);
        assert_eq!(composer.current_text(), "a\n");
    }

    #[test]
    fn multiline_text_is_sent_verbatim() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "line one");
        press(&mut composer, KeyCode::Enter, KeyModifiers::SHIFT);
        type_chars(&mut composer, "line two");

        let result = press(&mut composer, KeyCode::Enter, KeyModifiers::NONE);
        match result {
            InputResult::Submitted(request) => {
                assert_eq!(request.content.text(), "line one\nline two");
            }
            InputResult::None => panic!("expected submission"),
        }
    }

    #[test]
    fn stale_image_results_are_ignored() {
        let (mut composer, mut rx) = default_composer();
        composer.request_image_attach(PathBuf::from("/tmp/first.png"));
        composer.request_image_attach(PathBuf::from("/tmp/second.png"));

        let mut generations = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::StartImageResize { generation, .. } = event {
                generations.push(generation);
            }
        }
        assert_eq!(generations, vec![1, 2]);

        composer.on_image_attached(1, sample_image("first"));
        assert_eq!(composer.attached_image(), None);
        composer.on_image_attached(2, sample_image("second"));
        assert_eq!(
            composer.attached_image().map(|image| image.data_url.as_str()),
            Some("second")
        );
    }

    #[test]
    fn ctrl_f_prompt_attaches_file_and_starts_upload() {
        let (mut composer, mut rx) = default_composer();
        press(&mut composer, KeyCode::Char('f'), KeyModifiers::CONTROL);
        composer.handle_paste("/tmp/report.pdf".to_string());
        press(&mut composer, KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(composer.attached_file_name(), Some("report.pdf"));
        match rx.try_recv() {
            Ok(AppEvent::StartUpload(path)) => assert_eq!(path, PathBuf::from("/tmp/report.pdf")),
            other => panic!("expected StartUpload, got {other:?}"),
        }
        assert_eq!(composer.current_text(), "");
    }

    #[test]
    fn file_name_survives_send() {
        let (mut composer, _rx) = composer_with(ComposerParams {
            clear_on_send: true,
            ..ComposerParams::default()
        });
        composer.attach_file(PathBuf::from("/tmp/notes.txt"));
        type_chars(&mut composer, "see attached");

        let request = composer.submit().expect("should send");
        assert_eq!(request.content, MessageContent::Text("see attached".to_string()));
        assert_eq!(composer.attached_file_name(), Some("notes.txt"));
    }

    #[test]
    fn ctrl_o_prompt_requests_image_resize() {
        let (mut composer, mut rx) = default_composer();
        press(&mut composer, KeyCode::Char('o'), KeyModifiers::CONTROL);
        type_chars(&mut composer, "/tmp/cat.png");
        assert_eq!(composer.current_text(), "", "typing goes to the prompt");
        press(&mut composer, KeyCode::Enter, KeyModifiers::NONE);

        match rx.try_recv() {
            Ok(AppEvent::StartImageResize {
                generation,
                path,
                bounds,
            }) => {
                assert_eq!(generation, 1);
                assert_eq!(path, PathBuf::from("/tmp/cat.png"));
                assert_eq!(bounds, ImageBounds::default());
            }
            other => panic!("expected StartImageResize, got {other:?}"),
        }
    }

    #[test]
    fn esc_closes_prompt_without_side_effects() {
        let (mut composer, mut rx) = default_composer();
        press(&mut composer, KeyCode::Char('f'), KeyModifiers::CONTROL);
        type_chars(&mut composer, "/tmp/x");
        press(&mut composer, KeyCode::Esc, KeyModifiers::NONE);

        assert!(rx.try_recv().is_err());
        assert_eq!(composer.attached_file_name(), None);
        type_chars(&mut composer, "back");
        assert_eq!(composer.current_text(), "back");
    }

    #[test]
    fn upload_failure_shows_blocking_alert() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "draft");
        composer.on_upload_failed(
            "a.txt",
            &UploadError::Io(std::io::Error::other("disk on fire")),
        );
        assert_eq!(composer.alert_message(), Some(UPLOAD_FAILED_MESSAGE));

        // Keys are swallowed until the alert is dismissed; the draft is untouched.
        type_chars(&mut composer, "zz");
        assert_eq!(
            press(&mut composer, KeyCode::Enter, KeyModifiers::NONE),
            InputResult::None
        );
        assert_eq!(composer.alert_message(), None);
        assert_eq!(composer.current_text(), "draft");
    }

    #[test]
    fn upload_failure_restores_interrupted_prompt() {
        let (mut composer, mut rx) = default_composer();
        press(&mut composer, KeyCode::Char('o'), KeyModifiers::CONTROL);
        composer.handle_paste("/tmp/half".to_string());

        composer.on_upload_failed(
            "a.txt",
            &UploadError::Io(std::io::Error::other("connection reset")),
        );
        assert_eq!(composer.alert_message(), Some(UPLOAD_FAILED_MESSAGE));

        press(&mut composer, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(composer.alert_message(), None);
        assert_eq!(composer.footer_mode(), FooterMode::PathPrompt);

        // The prompt kept its input; finishing it still requests the image.
        type_chars(&mut composer, "way.png");
        press(&mut composer, KeyCode::Enter, KeyModifiers::NONE);
        match rx.try_recv() {
            Ok(AppEvent::StartImageResize { path, .. }) => {
                assert_eq!(path, PathBuf::from("/tmp/halfway.png"));
            }
            other => panic!("expected StartImageResize, got {other:?}"),
        }
        assert_eq!(composer.current_text(), "");
    }

    #[test]
    fn pasting_plain_text_inserts_it() {
        let (mut composer, mut rx) = default_composer();
        composer.handle_paste("hello\r\nworld".to_string());
        assert_eq!(composer.current_text(), "hello\nworld");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn pasting_image_path_attaches_image() {
        use image::ImageBuffer;
        use image::Rgb;
        use tempfile::tempdir;

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("pasted.png");
        ImageBuffer::from_pixel(4, 4, Rgb([0u8, 0, 0]))
            .save(&path)
            .expect("write png");

        let (mut composer, mut rx) = default_composer();
        assert!(composer.handle_paste(path.display().to_string()));

        assert_eq!(composer.current_text(), "");
        match rx.try_recv() {
            Ok(AppEvent::StartImageResize { path: requested, .. }) => assert_eq!(requested, path),
            other => panic!("expected StartImageResize, got {other:?}"),
        }
    }

    #[test]
    fn dropping_composer_cancels_pending_work() {
        let (composer, _rx) = default_composer();
        let token = composer.cancellation_token();
        assert!(!token.is_cancelled());
        drop(composer);
        assert!(token.is_cancelled());
    }

    #[test]
    fn clear_for_ctrl_c_returns_draft() {
        let (mut composer, _rx) = default_composer();
        assert_eq!(composer.clear_for_ctrl_c(), None);
        composer.set_text_content("draft text".to_string());
        assert_eq!(composer.clear_for_ctrl_c(), Some("draft text".to_string()));
        assert!(composer.is_empty());
    }

    #[test]
    fn renders_placeholder_and_footer() {
        let (composer, _rx) = composer_with(ComposerParams {
            placeholder: Some("Ask anything".to_string()),
            ..ComposerParams::default()
        });
        let rows = render_rows(&composer, 40);

        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with('╭'), "{rows:?}");
        assert_eq!(rows[1], "│ › Ask anything                       │");
        assert!(rows[2].starts_with('╰'), "{rows:?}");
        assert!(rows[3].starts_with("  enter send"), "{rows:?}");
    }

    #[test]
    fn renders_attachment_row() {
        let (mut composer, _rx) = default_composer();
        attach_sample_image(&mut composer, "X");
        composer.attach_file(PathBuf::from("/tmp/notes.txt"));
        let rows = render_rows(&composer, 60);

        assert_eq!(rows[0], "    [image 640×480 attached]  Attached: notes.txt");
    }

    #[test]
    fn cursor_follows_typed_text() {
        let (mut composer, _rx) = default_composer();
        type_chars(&mut composer, "abc");
        let area = Rect::new(0, 0, 40, composer.desired_height(40));
        assert_eq!(composer.cursor_pos(area), Some((2 + LIVE_PREFIX_COLS + 3, 1)));
    }

    #[test]
    fn quit_hint_replaces_footer_until_next_key() {
        let (mut composer, _rx) = default_composer();
        composer.show_quit_shortcut_hint(key_hint::ctrl(KeyCode::Char('c')));
        assert_eq!(composer.footer_mode(), FooterMode::QuitShortcutReminder);

        type_chars(&mut composer, "a");
        assert_eq!(composer.footer_mode(), FooterMode::ShortcutSummary);
    }
}
