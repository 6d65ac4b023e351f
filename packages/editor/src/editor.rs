//! # Editor
//!
//! One editing session over a rich-text value. The editor shows one of two
//! surfaces:
//!
//! ```text
//!            toggle_mode (seed buffer)
//! Structured ─────────────────────────▶ RawHtml
//!     ▲                                    │
//!     └────────────────────────────────────┘
//!      toggle_mode (apply if edited) / apply_raw_html
//! ```
//!
//! Structured commands are only reachable through [`Editor::structured`],
//! which returns `None` in raw-HTML mode. [`Editor::execute`] is the
//! serializable entry point and ignores commands there.

use richdoc_compiler_html::{serialize_root_with, serialize_with, SerializeOptions};
use richdoc_model::{parse_html, Document, Root};
use tracing::{debug, info, warn};

use crate::mapping::{Bias, PositionMap};
use crate::upload::PendingUpload;
use crate::{
    Command, EditorConfig, EditorError, EditorEvent, ImageFile, Mode, Outcome, Position,
    Selection, Structured, StructuredState, UndoStack, UploadError, UploadTicket,
    VideoProviderRegistry,
};

/// Raw-HTML surface: the text being edited plus the structured state it
/// was opened from.
#[derive(Debug, Clone)]
pub struct RawHtmlState {
    pub(crate) buffer: String,

    /// Buffer content when the surface was opened or last reseeded
    pub(crate) seed: String,

    pub(crate) suspended: StructuredState,
}

impl RawHtmlState {
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_edited(&self) -> bool {
        self.buffer != self.seed
    }

    fn reseed(&mut self, html: &str) {
        self.seed = html.to_string();
        self.buffer = html.to_string();
    }
}

#[derive(Debug, Clone)]
pub enum Surface {
    Structured(StructuredState),
    RawHtml(RawHtmlState),
}

impl Default for Surface {
    fn default() -> Self {
        Surface::Structured(StructuredState::default())
    }
}

/// Everything but the surface: configuration, history, and output.
#[derive(Debug)]
pub struct EditorCore {
    pub(crate) config: EditorConfig,
    pub(crate) options: SerializeOptions,
    pub(crate) videos: VideoProviderRegistry,
    pub(crate) history: UndoStack,
    pub(crate) events: Vec<EditorEvent>,

    /// Last published serialization
    pub(crate) html: String,

    /// Bumped whenever pending uploads must no longer land
    pub(crate) generation: u64,

    pub(crate) uploads: Vec<PendingUpload>,
    pub(crate) next_upload: u64,

    pub(crate) torn_down: bool,
}

impl EditorCore {
    pub(crate) fn render(&self, root: &Root) -> String {
        serialize_root_with(root, &self.options)
    }

    pub(crate) fn publish(&mut self, root: &Root) {
        self.html = self.render(root);
        self.events.push(EditorEvent::Changed {
            html: self.html.clone(),
        });
    }

    pub(crate) fn report(&mut self, message: impl Into<String>) {
        self.events.push(EditorEvent::Error {
            message: message.into(),
        });
    }

    pub(crate) fn register_upload(&mut self, position: Position, alt: &str) -> u64 {
        let id = self.next_upload;
        self.next_upload += 1;
        self.uploads.push(PendingUpload {
            id,
            position,
            alt: alt.to_string(),
            src: None,
        });
        id
    }

    /// Move every pending upload position from `before` to `after`.
    pub(crate) fn remap_uploads(&mut self, before: &Root, after: &Root, bias: Bias) {
        if self.uploads.is_empty() {
            return;
        }
        let map = PositionMap::new(before, after);
        for upload in &mut self.uploads {
            upload.position = map.map(upload.position, bias);
        }
    }

    fn forget_uploads(&mut self) {
        if !self.uploads.is_empty() {
            debug!(count = self.uploads.len(), "Dropping pending uploads");
            self.uploads.clear();
        }
    }
}

#[derive(Debug)]
pub struct Editor {
    surface: Surface,
    core: EditorCore,
}

impl Editor {
    pub fn new(value: Option<&Document>) -> Self {
        Self::with_config(value, EditorConfig::default())
    }

    pub fn with_config(value: Option<&Document>, config: EditorConfig) -> Self {
        let state = StructuredState::new(root_from(value));
        let options = config.serialize_options();
        let html = serialize_root_with(&state.root, &options);

        Self {
            surface: Surface::Structured(state),
            core: EditorCore {
                history: UndoStack::with_max_levels(config.history_limit),
                config,
                options,
                videos: VideoProviderRegistry::default(),
                events: Vec::new(),
                html,
                generation: 0,
                uploads: Vec::new(),
                next_upload: 0,
                torn_down: false,
            },
        }
    }

    pub fn with_video_providers(mut self, videos: VideoProviderRegistry) -> Self {
        self.core.videos = videos;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.core.config
    }

    pub fn mode(&self) -> Mode {
        match self.surface {
            Surface::Structured(_) => Mode::Structured,
            Surface::RawHtml(_) => Mode::RawHtml,
        }
    }

    /// The current serialized document.
    pub fn html(&self) -> &str {
        &self.core.html
    }

    /// The current tree. In raw-HTML mode this is the suspended document,
    /// not the unapplied buffer.
    pub fn document(&self) -> &Root {
        match &self.surface {
            Surface::Structured(state) => &state.root,
            Surface::RawHtml(raw) => &raw.suspended.root,
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        match &self.surface {
            Surface::Structured(state) => Some(state.selection),
            Surface::RawHtml(_) => None,
        }
    }

    /// Structured commands, available only in structured mode on a live
    /// editor.
    pub fn structured(&mut self) -> Option<Structured<'_>> {
        if self.core.torn_down {
            return None;
        }
        match &mut self.surface {
            Surface::Structured(state) => Some(Structured {
                state,
                core: &mut self.core,
            }),
            Surface::RawHtml(_) => None,
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, EditorError> {
        match self.structured() {
            Some(mut structured) => structured.execute(command),
            None => {
                debug!(?command, mode = ?self.mode(), "Ignoring command");
                Ok(Outcome::Ignored)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.core.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.core.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.core.history.undo_description()
    }

    /// Switch surfaces. Leaving raw-HTML mode applies the buffer only when
    /// it was edited; otherwise the suspended document comes back as it was.
    pub fn toggle_mode(&mut self) -> Mode {
        if self.core.torn_down {
            return self.mode();
        }

        match std::mem::take(&mut self.surface) {
            Surface::Structured(state) => {
                let seed = self.core.render(&state.root);
                info!(html_len = seed.len(), "Switched to raw HTML");
                self.surface = Surface::RawHtml(RawHtmlState {
                    buffer: seed.clone(),
                    seed,
                    suspended: state,
                });
            }
            Surface::RawHtml(raw) => {
                info!(edited = raw.is_edited(), "Switched to structured editing");
                if raw.is_edited() {
                    self.adopt_buffer(raw);
                } else {
                    self.surface = Surface::Structured(raw.suspended);
                }
                self.land_ready_uploads();
            }
        }
        self.mode()
    }

    pub fn raw_html(&self) -> Option<&str> {
        match &self.surface {
            Surface::RawHtml(raw) => Some(&raw.buffer),
            Surface::Structured(_) => None,
        }
    }

    pub fn edit_raw_html(&mut self, text: impl Into<String>) -> Outcome {
        match &mut self.surface {
            Surface::RawHtml(raw) => {
                raw.buffer = text.into();
                Outcome::Applied
            }
            Surface::Structured(_) => Outcome::Ignored,
        }
    }

    /// Throw away buffer edits.
    pub fn reset_raw_html(&mut self) -> Outcome {
        match &mut self.surface {
            Surface::RawHtml(raw) => {
                raw.buffer = raw.seed.clone();
                Outcome::Applied
            }
            Surface::Structured(_) => Outcome::Ignored,
        }
    }

    /// Parse the buffer, replace the document with it and return to
    /// structured mode.
    pub fn apply_raw_html(&mut self) -> Outcome {
        if self.core.torn_down || self.mode() != Mode::RawHtml {
            return Outcome::Ignored;
        }
        if let Surface::RawHtml(raw) = std::mem::take(&mut self.surface) {
            self.adopt_buffer(raw);
            self.land_ready_uploads();
        }
        Outcome::Applied
    }

    /// Insert uploads that finished while the raw-HTML buffer had edits.
    fn land_ready_uploads(&mut self) {
        let Surface::Structured(state) = &mut self.surface else {
            return;
        };
        while let Some(index) = self.core.uploads.iter().position(|upload| upload.src.is_some()) {
            let upload = self.core.uploads.remove(index);
            let Some(src) = upload.src else {
                continue;
            };
            debug!(upload = upload.id, "Inserting queued image");
            Structured {
                state: &mut *state,
                core: &mut self.core,
            }
            .insert_uploaded_image(upload.position, &src, &upload.alt);
        }
    }

    fn adopt_buffer(&mut self, raw: RawHtmlState) {
        let before = raw.suspended.snapshot();
        let state = StructuredState::new(parse_html(&raw.buffer));
        self.core.remap_uploads(&before.root, &state.root, Bias::Before);
        self.core.history.record(before, "Edit HTML", false);
        self.core.publish(&state.root);
        info!(html_len = self.core.html.len(), "Applied raw HTML");
        self.surface = Surface::Structured(state);
    }

    /// Adopt a value pushed by the host. A value that serializes to what
    /// the editor already shows is ignored, so echoing our own output back
    /// is harmless. Adoption emits no event.
    pub fn sync_external(&mut self, value: Option<&Document>) -> Outcome {
        if self.core.torn_down {
            return Outcome::Ignored;
        }
        if serialize_with(value, &self.core.options) == self.core.html {
            return Outcome::Ignored;
        }

        let state = StructuredState::new(root_from(value));
        let html = self.core.render(&state.root);
        if html == self.core.html {
            return Outcome::Ignored;
        }

        self.core.history.clear();
        self.core.generation += 1;
        self.core.forget_uploads();
        info!(generation = self.core.generation, html_len = html.len(), "Adopted external document");

        match &mut self.surface {
            Surface::Structured(current) => *current = state,
            Surface::RawHtml(raw) => {
                raw.suspended = state;
                raw.reseed(&html);
            }
        }
        self.core.html = html;
        Outcome::Applied
    }

    /// Validate `file` and record where its image should go. Returns
    /// `None` in raw-HTML mode, where uploads are not started.
    pub fn begin_image_upload(
        &mut self,
        file: &ImageFile,
    ) -> Result<Option<UploadTicket>, EditorError> {
        if self.core.torn_down {
            return Err(EditorError::TornDown);
        }
        match self.structured() {
            Some(mut structured) => structured.begin_image_upload(file).map(Some),
            None => Ok(None),
        }
    }

    /// Where the image of a pending upload would land now.
    pub fn upload_position(&self, ticket: &UploadTicket) -> Option<Position> {
        if ticket.generation != self.core.generation {
            return None;
        }
        self.core
            .uploads
            .iter()
            .find(|upload| upload.id == ticket.id)
            .map(|upload| upload.position)
    }

    /// Finish an upload started with [`Editor::begin_image_upload`].
    ///
    /// A ticket from before the last adoption or teardown, or one already
    /// completed, is discarded. A failed upload emits one error event and
    /// leaves the document alone. While the raw-HTML buffer has edits the
    /// image is queued and lands when structured editing resumes.
    pub fn complete_image_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, UploadError>,
    ) -> Outcome {
        let pending = self
            .core
            .uploads
            .iter()
            .position(|upload| upload.id == ticket.id && upload.src.is_none());
        let index = match pending {
            Some(index) if !self.core.torn_down && ticket.generation == self.core.generation => index,
            _ => {
                warn!(
                    ticket_generation = ticket.generation,
                    generation = self.core.generation,
                    torn_down = self.core.torn_down,
                    "Discarding stale image upload"
                );
                return Outcome::Discarded;
            }
        };

        let src = match result {
            Ok(url) if !url.trim().is_empty() => url,
            Ok(_) => {
                warn!("Upload returned an empty URL");
                self.core.uploads.remove(index);
                self.core.report("Image upload failed: no URL returned");
                return Outcome::Failed;
            }
            Err(error) => {
                warn!(%error, "Image upload failed");
                self.core.uploads.remove(index);
                self.core.report(format!("Image upload failed: {}", error));
                return Outcome::Failed;
            }
        };

        match &mut self.surface {
            Surface::Structured(state) => {
                let upload = self.core.uploads.remove(index);
                Structured {
                    state,
                    core: &mut self.core,
                }
                .insert_uploaded_image(upload.position, &src, &upload.alt)
            }
            Surface::RawHtml(raw) if raw.is_edited() => {
                debug!(upload = ticket.id, "Queueing image until the buffer is applied");
                self.core.uploads[index].src = Some(src);
                Outcome::Queued
            }
            Surface::RawHtml(raw) => {
                let upload = self.core.uploads.remove(index);
                let outcome = Structured {
                    state: &mut raw.suspended,
                    core: &mut self.core,
                }
                .insert_uploaded_image(upload.position, &src, &upload.alt);
                raw.reseed(&self.core.html);
                outcome
            }
        }
    }

    /// Stop accepting work. Pending uploads are discarded when they finish.
    pub fn teardown(&mut self) {
        if !self.core.torn_down {
            self.core.torn_down = true;
            self.core.generation += 1;
            self.core.forget_uploads();
            info!("Editor torn down");
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.core.torn_down
    }

    pub fn generation(&self) -> u64 {
        self.core.generation
    }

    /// Queue a user-visible error.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.core.report(message);
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.core.events)
    }
}

fn root_from(value: Option<&Document>) -> Root {
    match value {
        Some(Document::Ast(root)) => root.clone(),
        Some(Document::Html(html)) if !html.trim().is_empty() => parse_html(html),
        _ => Root::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockType, Position};
    use richdoc_model::{HeadingLevel, Node};

    fn editor(html: &str) -> Editor {
        Editor::new(Some(&Document::from(html)))
    }

    #[test]
    fn test_new_editor_renders_initial_value() {
        let editor = editor("<p>Hello <strong>world</strong></p>");
        assert_eq!(editor.html(), "<p>Hello <strong>world</strong></p>");
        assert_eq!(editor.mode(), Mode::Structured);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_empty_value_is_single_paragraph() {
        let editor = Editor::new(None);
        assert_eq!(editor.html(), "<p></p>");
    }

    #[test]
    fn test_commands_ignored_in_raw_mode() {
        let mut editor = editor("<p>a</p>");
        editor.toggle_mode();
        assert!(editor.structured().is_none());
        let outcome = editor.execute(Command::InsertText { text: "x".into() });
        assert_eq!(outcome, Ok(Outcome::Ignored));
        assert!(editor.take_events().is_empty());
    }

    #[test]
    fn test_unedited_buffer_restores_suspended_state() {
        let mut editor = editor("<p>abc</p>");
        editor
            .execute(Command::SetSelection {
                selection: Selection::caret(Position::new(0, 2)),
            })
            .unwrap();
        editor.toggle_mode();
        assert_eq!(editor.raw_html(), Some("<p>abc</p>"));

        editor.toggle_mode();
        assert_eq!(editor.selection(), Some(Selection::caret(Position::new(0, 2))));
        assert!(!editor.can_undo());
        assert!(editor.take_events().is_empty());
    }

    #[test]
    fn test_edited_buffer_applies_on_toggle() {
        let mut editor = editor("<p>abc</p>");
        editor.toggle_mode();
        editor.edit_raw_html("<h1>Title</h1>");
        editor.toggle_mode();

        assert_eq!(editor.html(), "<h1>Title</h1>");
        assert_eq!(editor.undo_description(), Some("Edit HTML"));
        assert!(matches!(
            editor.document().children[0],
            Node::Heading {
                level: HeadingLevel::H1,
                ..
            }
        ));
    }

    #[test]
    fn test_reset_raw_html_restores_seed() {
        let mut editor = editor("<p>abc</p>");
        editor.toggle_mode();
        editor.edit_raw_html("junk");
        editor.reset_raw_html();
        assert_eq!(editor.raw_html(), Some("<p>abc</p>"));
    }

    #[test]
    fn test_sync_external_ignores_own_output() {
        let mut editor = editor("<p>a</p>");
        editor
            .execute(Command::SetBlockType {
                block: BlockType::Quote,
            })
            .unwrap();
        let html = editor.html().to_string();
        assert_eq!(editor.sync_external(Some(&Document::from(html))), Outcome::Ignored);
        assert!(editor.can_undo());
    }

    #[test]
    fn test_sync_external_adopts_and_resets_history() {
        let mut editor = editor("<p>a</p>");
        editor.execute(Command::InsertText { text: "b".into() }).unwrap();
        editor.take_events();

        let outcome = editor.sync_external(Some(&Document::from("<p>other</p>")));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(editor.html(), "<p>other</p>");
        assert!(!editor.can_undo());
        assert_eq!(editor.generation(), 1);
        assert!(editor.take_events().is_empty());
    }

    #[test]
    fn test_sync_external_reseeds_raw_buffer() {
        let mut editor = editor("<p>a</p>");
        editor.toggle_mode();
        editor.sync_external(Some(&Document::from("<p>b</p>")));
        assert_eq!(editor.raw_html(), Some("<p>b</p>"));
    }

    #[test]
    fn test_teardown_blocks_further_work() {
        let mut editor = editor("<p>a</p>");
        editor.teardown();
        assert!(editor.structured().is_none());
        assert_eq!(
            editor.begin_image_upload(&ImageFile::new("a.png", "image/png", vec![1])),
            Err(EditorError::TornDown)
        );
        assert_eq!(editor.sync_external(Some(&Document::from("<p>b</p>"))), Outcome::Ignored);
    }
}
