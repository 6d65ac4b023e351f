//! # Structured surface
//!
//! Commands that edit the tree. A [`Structured`] borrow exists only while
//! the editor is in structured mode, so these methods cannot be reached
//! from raw-HTML mode.
//!
//! Every mutating command goes through `edit`: it snapshots
//! the state, runs the change, and if the tree actually changed records one
//! history entry, moves pending upload positions and publishes the new
//! HTML.

use richdoc_model::{Align, FormatFlags, Node, Root};
use tracing::debug;

use crate::editor::EditorCore;
use crate::inline::Atom;
use crate::mapping::Bias;
use crate::{
    BlockType, Command, EditorError, ImageFile, Outcome, Position, Selection, Side, Snapshot,
    StructuredState, UploadTicket,
};

pub struct Structured<'a> {
    pub(crate) state: &'a mut StructuredState,
    pub(crate) core: &'a mut EditorCore,
}

impl<'a> Structured<'a> {
    pub fn state(&self) -> &StructuredState {
        &*self.state
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, EditorError> {
        debug!(?command, "Executing command");
        let outcome = match command {
            Command::ToggleMark { mark } => self.toggle_format(mark.flag()),
            Command::SetBlockType { block } => self.set_block_type(block),
            Command::SetAlignment { align } => self.set_alignment(align),
            Command::SetLink { url } => self.set_link(url.as_deref()),
            Command::RemoveLink => self.remove_link(),
            Command::InsertText { text } => self.insert_text(&text),
            Command::InsertLineBreak => self.insert_line_break(),
            Command::SplitBlock => self.split_block(),
            Command::DeleteBackward => self.delete_backward(),
            Command::DeleteSelection => self.delete_selection(),
            Command::InsertImage { src, alt } => self.insert_image(&src, &alt),
            Command::InsertTable { rows, columns } => self.insert_table(rows, columns),
            Command::InsertRow { side } => self.insert_row(side),
            Command::InsertColumn { side } => self.insert_column(side),
            Command::DeleteRow => self.delete_row(),
            Command::DeleteColumn => self.delete_column(),
            Command::InsertVideo { url } => self.insert_video(&url)?,
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::ClearFormatting => self.clear_formatting(),
            Command::SetSelection { selection } => self.set_selection(selection),
            Command::SelectAll => self.select_all(),
        };
        Ok(outcome)
    }

    fn edit(
        &mut self,
        description: &str,
        coalesce: bool,
        change: impl FnOnce(&mut StructuredState),
    ) -> Outcome {
        self.edit_with_bias(description, coalesce, Bias::Before, change)
    }

    /// `bias` settles pending uploads sitting exactly where content was
    /// inserted.
    fn edit_with_bias(
        &mut self,
        description: &str,
        coalesce: bool,
        bias: Bias,
        change: impl FnOnce(&mut StructuredState),
    ) -> Outcome {
        let before = self.state.snapshot();
        change(&mut *self.state);
        if self.state.root == before.root {
            return Outcome::Ignored;
        }

        self.core.remap_uploads(&before.root, &self.state.root, bias);
        self.state.pending = None;
        self.core.history.record(before, description, coalesce);
        self.core.publish(&self.state.root);
        debug!(command = description, html_len = self.core.html.len(), "Applied command");
        Outcome::Applied
    }

    /// On a range, add `flag` unless every selected character already has
    /// it. On a caret, flip it in the format pending for the next text.
    pub fn toggle_format(&mut self, flag: FormatFlags) -> Outcome {
        if self.state.selection.is_collapsed() {
            let caret = self.state.clamp(self.state.selection.focus);
            let current = self
                .state
                .pending
                .unwrap_or_else(|| self.state.inline(caret.block).format_before(caret.offset));
            self.state.pending = Some(current ^ flag);
            return Outcome::Applied;
        }

        let ranges = self.state.selected_ranges();
        let coverage: Vec<bool> = ranges
            .iter()
            .filter_map(|(block, range)| self.state.inline(*block).has_flag(range.clone(), flag))
            .collect();
        if coverage.is_empty() {
            return Outcome::Ignored;
        }
        let enable = !coverage.iter().all(|covered| *covered);

        self.edit("Format", false, |state| {
            for (block, range) in ranges {
                let mut inline = state.inline(block);
                inline.set_flag(range, flag, enable);
                state.set_inline(block, &inline);
            }
        })
    }

    /// Switch every selected block to `target`. Asking for the list kind
    /// all selected blocks already have turns them back into paragraphs.
    pub fn set_block_type(&mut self, target: BlockType) -> Outcome {
        let blocks = self.state.selected_blocks();
        let target = match target.list_kind() {
            Some(kind)
                if blocks
                    .clone()
                    .all(|block| self.state.list_kind_of(block) == Some(kind)) =>
            {
                BlockType::Paragraph
            }
            _ => target,
        };

        self.edit("Block type", false, |state| {
            for block in blocks.rev() {
                state.set_text_block_type(block, target);
            }
            state.merge_adjacent_lists();
        })
    }

    pub fn set_alignment(&mut self, align: Align) -> Outcome {
        let blocks = self.state.selected_blocks();
        self.edit("Align", false, |state| {
            for block in blocks {
                state.set_block_align(block, Some(align));
            }
        })
    }

    /// `None` leaves the document alone; a blank URL removes the link.
    pub fn set_link(&mut self, url: Option<&str>) -> Outcome {
        let Some(url) = url else {
            return Outcome::Ignored;
        };
        let url = url.trim();
        if url.is_empty() {
            return self.remove_link();
        }

        if self.state.selection.is_collapsed() {
            let caret = self.state.clamp(self.state.selection.focus);
            return self.edit("Link", false, |state| {
                let mut inline = state.inline(caret.block);
                let touching = inline.links_touching(caret.offset..caret.offset);
                if touching.is_empty() {
                    let link = inline.new_link(url);
                    let format = inline.format_before(caret.offset);
                    let end = inline.insert_text(caret.offset, url, format, Some(link));
                    state.set_inline(caret.block, &inline);
                    state.set_caret(Position::new(caret.block, end));
                } else {
                    for id in touching {
                        inline.update_link(id, url);
                    }
                    state.set_inline(caret.block, &inline);
                }
            });
        }

        let ranges = self.state.selected_ranges();
        self.edit("Link", false, |state| {
            for (block, range) in ranges.into_iter().filter(|(_, range)| !range.is_empty()) {
                let mut inline = state.inline(block);
                let link = inline.new_link(url);
                inline.set_link(range, Some(link));
                state.set_inline(block, &inline);
            }
        })
    }

    /// Unlink every link the selection touches, over its whole extent.
    pub fn remove_link(&mut self) -> Outcome {
        let ranges = self.state.selected_ranges();
        self.edit("Remove link", false, |state| {
            for (block, range) in ranges {
                let mut inline = state.inline(block);
                let ids = inline.links_touching(range);
                inline.unlink(&ids);
                state.set_inline(block, &inline);
            }
        })
    }

    /// Replace the selection with `text`. Newlines become line breaks; the
    /// text takes the pending format, or that of the preceding character.
    pub fn insert_text(&mut self, text: &str) -> Outcome {
        if text.is_empty() {
            return Outcome::Ignored;
        }
        let text = text.replace("\r\n", "\n");
        let pending = self.state.pending;

        self.edit("Typing", true, |state| {
            let caret = state.delete_selection();
            let mut inline = state.inline(caret.block);
            let format = pending.unwrap_or_else(|| inline.format_before(caret.offset));
            let link = inline.link_inside(caret.offset);

            let mut offset = caret.offset;
            for (index, line) in text.split('\n').enumerate() {
                if index > 0 {
                    offset = inline.insert(offset, vec![Atom::line_break()]);
                }
                offset = inline.insert_text(offset, line, format, link.clone());
            }
            state.set_inline(caret.block, &inline);
            state.set_caret(Position::new(caret.block, offset));
        })
    }

    pub fn insert_line_break(&mut self) -> Outcome {
        self.edit("Line break", false, |state| {
            let caret = state.delete_selection();
            let mut inline = state.inline(caret.block);
            let offset = inline.insert(caret.offset, vec![Atom::line_break()]);
            state.set_inline(caret.block, &inline);
            state.set_caret(Position::new(caret.block, offset));
        })
    }

    /// Enter: replace the selection and split the block at the caret.
    pub fn split_block(&mut self) -> Outcome {
        self.edit("Split block", false, |state| {
            let caret = state.delete_selection();
            let next = state.split_block_at(caret);
            state.set_caret(next);
        })
    }

    /// Backspace: delete the selection, or the character before the caret.
    pub fn delete_backward(&mut self) -> Outcome {
        let collapsed = self.state.selection.is_collapsed();
        self.edit("Delete", collapsed, |state| {
            let caret = if collapsed {
                let caret = state.clamp(state.selection.focus);
                state.delete_backward_at(caret)
            } else {
                state.delete_selection()
            };
            state.set_caret(caret);
        })
    }

    pub fn delete_selection(&mut self) -> Outcome {
        self.edit("Delete selection", false, |state| {
            let caret = state.delete_selection();
            state.set_caret(caret);
        })
    }

    pub fn insert_image(&mut self, src: &str, alt: &str) -> Outcome {
        if src.trim().is_empty() {
            return Outcome::Ignored;
        }
        self.edit("Insert image", false, |state| {
            let caret = state.delete_selection();
            let next = state.insert_image_at(caret, src, alt);
            state.set_caret(next);
        })
    }

    /// Insert an uploaded image where its upload started. Selection
    /// endpoints and other pending uploads at or after that spot move past
    /// the image.
    pub(crate) fn insert_uploaded_image(&mut self, position: Position, src: &str, alt: &str) -> Outcome {
        self.edit_with_bias("Insert image", false, Bias::After, |state| {
            let position = state.clamp(position);
            state.insert_image_at(position, src, alt);

            let shift = |point: Position| {
                if point.block == position.block && point.offset >= position.offset {
                    Position::new(point.block, point.offset + 1)
                } else {
                    point
                }
            };
            let selection = state.selection;
            state.set_selection(Selection::range(shift(selection.anchor), shift(selection.focus)));
        })
    }

    /// Insert a table after the block holding the caret and move the caret
    /// into its first cell. Missing sizes come from the configuration.
    pub fn insert_table(&mut self, rows: Option<usize>, columns: Option<usize>) -> Outcome {
        let rows = rows.unwrap_or(self.core.config.default_table_rows);
        let columns = columns.unwrap_or(self.core.config.default_table_columns);
        if rows == 0 || columns == 0 {
            return Outcome::Ignored;
        }

        self.edit("Insert table", false, |state| {
            let top = state.insert_after_caret_block(Node::table(rows, columns));
            if let Some(block) = state.first_block_in(top) {
                state.set_caret(Position::new(block, 0));
            }
        })
    }

    pub fn insert_row(&mut self, side: Side) -> Outcome {
        self.edit("Insert row", false, |state| {
            state.insert_row(side);
        })
    }

    pub fn insert_column(&mut self, side: Side) -> Outcome {
        self.edit("Insert column", false, |state| {
            state.insert_column(side);
        })
    }

    pub fn delete_row(&mut self) -> Outcome {
        self.edit("Delete row", false, |state| {
            state.delete_row();
        })
    }

    pub fn delete_column(&mut self) -> Outcome {
        self.edit("Delete column", false, |state| {
            state.delete_column();
        })
    }

    /// Embed the video at `url` after the block holding the caret.
    pub fn insert_video(&mut self, url: &str) -> Result<Outcome, EditorError> {
        let embed = self.core.videos.resolve(url)?;
        debug!(provider = %embed.provider, video_id = %embed.video_id, "Resolved video");
        Ok(self.edit("Insert video", false, |state| {
            state.insert_after_caret_block(Node::Embed(embed));
        }))
    }

    pub fn undo(&mut self) -> Outcome {
        let previous = self.tracked_root();
        match self.core.history.undo(self.state.snapshot()) {
            Some(snapshot) => {
                self.restore(snapshot, previous);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    pub fn redo(&mut self) -> Outcome {
        let previous = self.tracked_root();
        match self.core.history.redo(self.state.snapshot()) {
            Some(snapshot) => {
                self.restore(snapshot, previous);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    /// The tree before a history jump, kept only while uploads are pending.
    fn tracked_root(&self) -> Option<Root> {
        (!self.core.uploads.is_empty()).then(|| self.state.root.clone())
    }

    fn restore(&mut self, snapshot: Snapshot, previous: Option<Root>) {
        self.state.restore(snapshot);
        if let Some(previous) = previous {
            self.core.remap_uploads(&previous, &self.state.root, Bias::Before);
        }
        self.core.publish(&self.state.root);
    }

    /// Strip inline flags from the selection (links stay) and turn every
    /// touched block into a plain, unaligned paragraph.
    pub fn clear_formatting(&mut self) -> Outcome {
        let collapsed = self.state.selection.is_collapsed();
        let ranges = self.state.selected_ranges();
        let blocks = self.state.selected_blocks();

        let outcome = self.edit("Clear formatting", false, |state| {
            for (block, range) in ranges {
                let mut inline = state.inline(block);
                inline.clear_format(range);
                state.set_inline(block, &inline);
            }
            for block in blocks.rev() {
                state.set_block_align(block, None);
                state.set_text_block_type(block, BlockType::Paragraph);
            }
            state.merge_adjacent_lists();
        });

        if collapsed {
            self.state.pending = Some(FormatFlags::empty());
            return Outcome::Applied;
        }
        outcome
    }

    pub fn set_selection(&mut self, selection: Selection) -> Outcome {
        self.state.set_selection(selection);
        self.state.pending = None;
        self.core.history.seal();
        Outcome::Applied
    }

    pub fn select_all(&mut self) -> Outcome {
        self.state.select_all();
        self.state.pending = None;
        self.core.history.seal();
        Outcome::Applied
    }

    /// Validate `file` and note where its image should land.
    pub fn begin_image_upload(&mut self, file: &ImageFile) -> Result<UploadTicket, EditorError> {
        file.validate()?;
        let position = self.state.clamp(self.state.selection.start());
        let alt = file.alt_text();
        let id = self.core.register_upload(position, &alt);
        debug!(file = %file.name, upload = id, block = position.block, offset = position.offset, "Starting image upload");
        Ok(UploadTicket {
            generation: self.core.generation,
            id,
            alt,
        })
    }
}
