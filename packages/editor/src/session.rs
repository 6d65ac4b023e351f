//! # Editor handle
//!
//! Shared, single-threaded access to an [`Editor`] for hosts that wire it
//! to callbacks.
//!
//! Events are delivered to listeners only after the editor borrow is
//! released, so a listener may call straight back into the handle (the
//! usual case is a host echoing `Changed` into `sync_external`). Uploads
//! hold the editor weakly: an editor dropped mid-upload is never touched.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use richdoc_model::Document;
use tracing::debug;

use crate::{
    upload_with_policy, Command, Editor, EditorError, EditorEvent, ImageFile, ImageUploader, Mode,
    Outcome, TransferItem, UploadError, UploadPolicy, UploadTicket,
};

type Listener = Box<dyn FnMut(&EditorEvent, &EditorHandle)>;

struct Shared {
    editor: RefCell<Editor>,
    listeners: RefCell<Vec<Listener>>,
    uploader: RefCell<Option<Rc<dyn ImageUploader>>>,
    delivering: Cell<bool>,
}

/// Cloneable handle to one editor
#[derive(Clone)]
pub struct EditorHandle {
    shared: Rc<Shared>,
}

impl EditorHandle {
    pub fn new(editor: Editor) -> Self {
        Self {
            shared: Rc::new(Shared {
                editor: RefCell::new(editor),
                listeners: RefCell::new(Vec::new()),
                uploader: RefCell::new(None),
                delivering: Cell::new(false),
            }),
        }
    }

    pub fn set_uploader(&self, uploader: impl ImageUploader + 'static) {
        let uploader: Rc<dyn ImageUploader> = Rc::new(uploader);
        *self.shared.uploader.borrow_mut() = Some(uploader);
    }

    pub fn subscribe(&self, listener: impl FnMut(&EditorEvent, &EditorHandle) + 'static) {
        self.shared.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Run `f` against the editor, then deliver whatever events it queued.
    pub fn update<R>(&self, f: impl FnOnce(&mut Editor) -> R) -> R {
        let result = {
            let mut editor = self.shared.editor.borrow_mut();
            f(&mut editor)
        };
        self.flush();
        result
    }

    pub fn read<R>(&self, f: impl FnOnce(&Editor) -> R) -> R {
        f(&self.shared.editor.borrow())
    }

    pub fn html(&self) -> String {
        self.read(|editor| editor.html().to_string())
    }

    pub fn execute(&self, command: Command) -> Result<Outcome, EditorError> {
        self.update(|editor| editor.execute(command))
    }

    pub fn toggle_mode(&self) -> Mode {
        self.update(Editor::toggle_mode)
    }

    pub fn apply_raw_html(&self) -> Outcome {
        self.update(Editor::apply_raw_html)
    }

    pub fn sync_external(&self, value: Option<&Document>) -> Outcome {
        self.update(|editor| editor.sync_external(value))
    }

    pub fn teardown(&self) {
        self.update(Editor::teardown);
    }

    /// Upload a file picked by the user and insert it at the caret.
    ///
    /// Returns `Ignored` in raw-HTML mode. Validation errors are returned;
    /// upload failures, including having no uploader, become an error event
    /// and `Outcome::Failed`.
    pub async fn pick_image(&self, file: ImageFile) -> Result<Outcome, EditorError> {
        let Some(ticket) = self.update(|editor| editor.begin_image_upload(&file))? else {
            return Ok(Outcome::Ignored);
        };

        let batch = self.batch(vec![(ticket, file)]);
        Ok(batch.run().await.pop().unwrap_or(Outcome::Ignored))
    }

    /// Intercept pasted image data. `None` means nothing here is for us and
    /// the host should handle the paste itself. Images are intercepted even
    /// without an uploader; running the batch then reports the failure.
    pub fn on_paste(&self, items: Vec<TransferItem>) -> Option<UploadBatch> {
        self.intercept(items, "paste")
    }

    /// Intercept dropped image files, as [`EditorHandle::on_paste`].
    pub fn on_drop(&self, items: Vec<TransferItem>) -> Option<UploadBatch> {
        self.intercept(items, "drop")
    }

    fn intercept(&self, items: Vec<TransferItem>, source: &str) -> Option<UploadBatch> {
        let files: Vec<ImageFile> = items
            .into_iter()
            .filter_map(|item| match item {
                TransferItem::File(file) if file.is_image() => Some(file),
                _ => None,
            })
            .collect();
        if files.is_empty() {
            return None;
        }

        let jobs = self.update(|editor| {
            if editor.is_torn_down() || editor.mode() != Mode::Structured {
                return None;
            }
            let mut jobs = Vec::with_capacity(files.len());
            for file in files {
                match editor.begin_image_upload(&file) {
                    Ok(Some(ticket)) => jobs.push((ticket, file)),
                    Ok(None) => {}
                    Err(error) => editor.report_error(format!("Image upload failed: {}", error)),
                }
            }
            Some(jobs)
        })?;

        debug!(source, count = jobs.len(), "Intercepted image transfer");
        Some(self.batch(jobs))
    }

    fn batch(&self, jobs: Vec<(UploadTicket, ImageFile)>) -> UploadBatch {
        UploadBatch {
            shared: Rc::downgrade(&self.shared),
            uploader: self.shared.uploader.borrow().clone(),
            policy: self.read(|editor| editor.config().upload_policy()),
            jobs,
        }
    }

    fn flush(&self) {
        if self.shared.delivering.replace(true) {
            return;
        }

        loop {
            let events = self.shared.editor.borrow_mut().take_events();
            if events.is_empty() {
                break;
            }

            let mut listeners = std::mem::take(&mut *self.shared.listeners.borrow_mut());
            for event in &events {
                for listener in listeners.iter_mut() {
                    listener(event, self);
                }
            }

            // Keep listeners subscribed during delivery.
            let mut slot = self.shared.listeners.borrow_mut();
            listeners.append(&mut slot);
            *slot = listeners;
        }

        self.shared.delivering.set(false);
    }
}

/// Uploads intercepted from one paste or drop, not yet run
pub struct UploadBatch {
    shared: Weak<Shared>,
    uploader: Option<Rc<dyn ImageUploader>>,
    policy: UploadPolicy,
    jobs: Vec<(UploadTicket, ImageFile)>,
}

impl UploadBatch {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Upload each file in turn and insert the results in order.
    pub async fn run(self) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(self.jobs.len());

        for (ticket, file) in self.jobs {
            let result = match &self.uploader {
                Some(uploader) => upload_with_policy(uploader.as_ref(), file, self.policy).await,
                None => Err(UploadError::Failed("no image uploader configured".to_string())),
            };

            let Some(shared) = self.shared.upgrade() else {
                debug!("Editor dropped during upload");
                outcomes.push(Outcome::Discarded);
                continue;
            };
            let handle = EditorHandle { shared };
            let outcome = handle.update(|editor| editor.complete_image_upload(ticket, result));
            outcomes.push(outcome);
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn handle(html: &str) -> EditorHandle {
        EditorHandle::new(Editor::new(Some(&Document::from(html))))
    }

    #[test]
    fn test_listener_receives_changes() {
        let handle = handle("<p>a</p>");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        handle.subscribe(move |event, _| sink.borrow_mut().push(event.clone()));

        handle
            .execute(Command::InsertText { text: "b".into() })
            .unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![EditorEvent::Changed {
                html: "<p>ba</p>".into()
            }]
        );
    }

    #[test]
    fn test_listener_may_reenter_handle() {
        let handle = handle("<p>a</p>");
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let sink = outcomes.clone();
        handle.subscribe(move |event, handle| {
            if let EditorEvent::Changed { html } = event {
                let outcome = handle.sync_external(Some(&Document::from(html.as_str())));
                sink.borrow_mut().push(outcome);
            }
        });

        handle.execute(Command::SplitBlock).unwrap();
        assert_eq!(*outcomes.borrow(), vec![Outcome::Ignored]);
        assert!(handle.read(Editor::can_undo));
    }

    #[test]
    fn test_paste_without_images_falls_through() {
        let handle = handle("<p>a</p>");
        handle.set_uploader(|_file: ImageFile| async { Ok::<_, UploadError>("/x.png".to_string()) }.boxed());
        let items = vec![
            TransferItem::Text("plain".into()),
            TransferItem::Html("<b>x</b>".into()),
        ];
        assert!(handle.on_paste(items).is_none());
    }

    #[test]
    fn test_image_drop_without_uploader_is_intercepted() {
        let handle = handle("<p>a</p>");
        let items = vec![TransferItem::File(ImageFile::new("a.png", "image/png", vec![1]))];
        let batch = handle.on_drop(items).expect("images are intercepted");
        assert_eq!(batch.len(), 1);
        assert!(batch.uploader.is_none());
    }

    #[test]
    fn test_paste_in_raw_mode_falls_through() {
        let handle = handle("<p>a</p>");
        handle.set_uploader(|_file: ImageFile| async { Ok::<_, UploadError>("/x.png".to_string()) }.boxed());
        handle.toggle_mode();
        let items = vec![TransferItem::File(ImageFile::new("a.png", "image/png", vec![1]))];
        assert!(handle.on_drop(items).is_none());
    }
}
