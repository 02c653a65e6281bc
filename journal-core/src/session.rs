//! Page session: the state one open page carries between frames.
//!
//! The host owns a [`PageSession`] and drives it from its event loop. Every
//! mutating method reports whether a new frame is needed instead of flipping
//! a shared redraw flag.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentState, LayoutMode};
use crate::entity::{EntityId, FreeImagePlacement, StickerEntity, StickerId};
use crate::error::{JournalError, JournalResult};
use crate::event::{InputEvent, PointerPhase, TouchPhase};
use crate::frame::{compute_frame, FrameInputs, FramePlan, InteractionFlags, RenderQuality};
use crate::geometry::{Point, Size};
use crate::gesture::{GestureEngine, GestureState};
use crate::host::{Notice, PromptSuggester};
use crate::layout::{FitConfig, FreeflowWrapper, TextMeasure};
use crate::schedule::{FrameScheduler, Redraw, ScheduleOutcome};
use crate::store::TransformStore;
use crate::template::PageTemplate;

/// Offset between successive default photo placements.
const PLACEMENT_CASCADE: f32 = 48.0;

/// Persisted page: the document plus sticker and photo geometry.
///
/// Decoded images are not included; they are re-resolved from their
/// sources after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Document content.
    pub document: DocumentState,
    /// Stickers in insertion order.
    pub stickers: Vec<StickerEntity>,
    /// Freeflow photo placements.
    #[serde(default)]
    pub placements: Vec<FreeImagePlacement>,
}

impl PageSnapshot {
    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> JournalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> JournalResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One open page.
#[derive(Debug, Clone)]
pub struct PageSession {
    document: DocumentState,
    store: TransformStore,
    template: PageTemplate,
    fit: FitConfig,
    wrapper: FreeflowWrapper,
    gestures: GestureEngine,
    scheduler: FrameScheduler<InputEvent>,
    editable: bool,
    quality: RenderQuality,
    notice: Option<Notice>,
}

impl PageSession {
    /// Open a page for `document` on `template`.
    #[must_use]
    pub fn new(document: DocumentState, template: PageTemplate) -> Self {
        let mut store = TransformStore::new(template.size);
        store.set_photos_active(document.layout == LayoutMode::Freeflow);
        Self {
            document,
            store,
            template,
            fit: FitConfig::default(),
            wrapper: FreeflowWrapper::default(),
            gestures: GestureEngine::new(),
            scheduler: FrameScheduler::default(),
            editable: true,
            quality: RenderQuality::High,
            notice: None,
        }
    }

    /// Restore a page from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: PageSnapshot, template: PageTemplate) -> Self {
        let mut session = Self::new(snapshot.document, template);
        session.store =
            TransformStore::from_parts(session.template.size, snapshot.stickers, snapshot.placements);
        session
            .store
            .retain_images(session.document.images.len());
        session
            .store
            .set_photos_active(session.document.layout == LayoutMode::Freeflow);
        session
    }

    /// Capture the persistable state.
    #[must_use]
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            document: self.document.clone(),
            stickers: self.store.stickers().to_vec(),
            placements: self.store.placements().to_vec(),
        }
    }

    /// Use a different move-frame interval.
    #[must_use]
    pub fn with_frame_interval(mut self, interval_ms: u64) -> Self {
        self.scheduler = FrameScheduler::new(interval_ms);
        self
    }

    /// Use different font fitting bounds.
    #[must_use]
    pub fn with_fit_config(mut self, fit: FitConfig) -> Self {
        self.fit = fit;
        self
    }

    /// Document content.
    #[must_use]
    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    /// Sticker and photo geometry.
    #[must_use]
    pub fn store(&self) -> &TransformStore {
        &self.store
    }

    /// Page template.
    #[must_use]
    pub fn template(&self) -> &PageTemplate {
        &self.template
    }

    /// Gesture state.
    #[must_use]
    pub fn gesture_state(&self) -> &GestureState {
        self.gestures.state()
    }

    /// Selected entity.
    #[must_use]
    pub fn selected(&self) -> Option<EntityId> {
        self.gestures.selected()
    }

    /// Replace the selection. Unknown entities clear it.
    pub fn select(&mut self, id: Option<EntityId>) -> Redraw {
        let id = id.filter(|id| self.store.contains(*id));
        let changed = id != self.selected() || self.gestures.state().is_active();
        self.gestures.select(id);
        Redraw::from(changed)
    }

    /// Whether the page accepts edits.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Enable or disable editing. Disabling ends any gesture.
    pub fn set_editable(&mut self, editable: bool) -> Redraw {
        if self.editable == editable {
            return Redraw::Skip;
        }
        self.editable = editable;
        if !editable {
            self.scheduler.cancel();
            self.gestures.reset();
        }
        Redraw::Needed
    }

    /// Image resampling quality.
    #[must_use]
    pub fn quality(&self) -> RenderQuality {
        self.quality
    }

    /// Set image resampling quality.
    pub fn set_quality(&mut self, quality: RenderQuality) -> Redraw {
        let changed = self.quality != quality;
        self.quality = quality;
        Redraw::from(changed)
    }

    /// Current notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Show a notice.
    pub fn set_notice(&mut self, notice: Notice) -> Redraw {
        self.notice = Some(notice);
        Redraw::Needed
    }

    /// Hide the notice.
    pub fn dismiss_notice(&mut self) -> Redraw {
        Redraw::from(self.notice.take().is_some())
    }

    /// Replace the document, dropping placements of removed photos.
    ///
    /// Leaving the freeflow layout hides placements from picking and drops a
    /// photo selection; the placements themselves are kept.
    pub fn set_document(&mut self, document: DocumentState) -> Redraw {
        if document == self.document {
            return Redraw::Skip;
        }
        self.store.retain_images(document.images.len());
        self.store
            .set_photos_active(document.layout == LayoutMode::Freeflow);
        self.document = document;
        self.drop_stale_selection();
        Redraw::Needed
    }

    /// Remove a photo from the document and its placement, shifting later
    /// photos down by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn remove_image_placement(&mut self, index: usize) -> JournalResult<Redraw> {
        if index >= self.document.images.len() {
            return Err(JournalError::PlacementNotFound(index));
        }
        if let Some(EntityId::Image(selected)) = self.selected() {
            if selected >= index {
                self.gestures.reset();
            }
        }
        self.document.images.remove(index);
        if let Err(err) = self.store.remove_placement(index) {
            tracing::debug!(%err, "photo had no placement");
            // still shift the others down
            for later in (index + 1)..=self.document.images.len() {
                if let Some(p) = self.store.placement_mut(later) {
                    p.image_index -= 1;
                }
            }
        }
        Ok(Redraw::Needed)
    }

    /// Photo indices that need a freeflow placement.
    #[must_use]
    pub fn missing_placements(&self) -> Vec<usize> {
        if self.document.layout != LayoutMode::Freeflow {
            return Vec::new();
        }
        (0..self.document.images.len())
            .filter(|i| self.store.placement(*i).is_none())
            .collect()
    }

    /// Place a photo on the freeflow page at its default position.
    pub fn place_image(&mut self, index: usize, natural_size: Size) -> Redraw {
        if index >= self.document.images.len() || self.store.placement(index).is_some() {
            return Redraw::Skip;
        }
        #[allow(clippy::cast_precision_loss)]
        let step = PLACEMENT_CASCADE * (index % 6) as f32;
        let origin = Point::new(
            self.template.column.left + step,
            self.template.line_slots.y_at(0) + step,
        );
        let placement = FreeImagePlacement::new(index, natural_size, origin, self.template.size);
        tracing::debug!(index, ?placement.size, "photo placed");
        self.store.set_placement(placement);
        Redraw::Needed
    }

    /// Add a sticker on top and select it.
    pub fn add_sticker(&mut self, sticker: StickerEntity) -> StickerId {
        let id = self.store.add_sticker(sticker);
        if self.editable {
            self.gestures.select(Some(EntityId::Sticker(id)));
        }
        id
    }

    /// Remove every sticker, returning how many were removed.
    pub fn clear_stickers(&mut self) -> usize {
        let removed = self.store.clear_stickers();
        self.drop_stale_selection();
        removed
    }

    /// Feed an input event.
    ///
    /// Moves are queued for the next [`flush_frame`](Self::flush_frame);
    /// everything else applies immediately and drops any queued move.
    pub fn handle_input(&mut self, event: &InputEvent) -> Redraw {
        if !self.editable {
            return Redraw::Skip;
        }

        if is_move(event) {
            if !self.gestures.state().is_active() {
                return Redraw::Skip;
            }
            return match self.scheduler.schedule(event.clone(), event.timestamp_ms()) {
                ScheduleOutcome::Throttled => Redraw::Skip,
                ScheduleOutcome::Scheduled | ScheduleOutcome::Replaced => Redraw::Needed,
            };
        }

        if self.scheduler.cancel() {
            tracing::trace!("pending move dropped");
        }
        if is_down(event) {
            self.scheduler.reset();
        }
        self.gestures.handle(&mut self.store, event)
    }

    /// Apply the queued move, if any.
    pub fn flush_frame(&mut self, now_ms: u64) -> Redraw {
        match self.scheduler.take_pending(now_ms) {
            Some(event) => self.gestures.handle(&mut self.store, &event),
            None => Redraw::Skip,
        }
    }

    /// Whether a queued move is waiting for [`flush_frame`](Self::flush_frame).
    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Cancel queued work before the surface goes away.
    pub fn teardown(&mut self) {
        if self.scheduler.cancel() {
            tracing::debug!("pending frame cancelled on teardown");
        }
        let _ = self.gestures.end(&self.store);
    }

    /// Interaction flags for an on-screen frame.
    #[must_use]
    pub fn interaction_flags(&self) -> InteractionFlags {
        InteractionFlags {
            editable: self.editable,
            export_mode: false,
            quality: self.quality,
            selected: self.selected(),
        }
    }

    /// Compute the on-screen frame.
    #[must_use]
    pub fn plan(&self, measure: &dyn TextMeasure) -> FramePlan {
        self.plan_with(self.interaction_flags(), measure)
    }

    /// Compute the frame for export: high quality, no affordances.
    #[must_use]
    pub fn export_plan(&self, measure: &dyn TextMeasure) -> FramePlan {
        let flags = InteractionFlags {
            export_mode: true,
            ..self.interaction_flags()
        };
        self.plan_with(flags, measure)
    }

    fn plan_with(&self, flags: InteractionFlags, measure: &dyn TextMeasure) -> FramePlan {
        let inputs = FrameInputs {
            document: &self.document,
            store: &self.store,
            template: &self.template,
            flags,
            fit: &self.fit,
            wrapper: &self.wrapper,
        };
        compute_frame(&inputs, measure)
    }

    /// Ask the host's suggestion service for writing prompts.
    ///
    /// Failures degrade to no suggestions.
    pub fn suggest_prompts(&self, suggester: &dyn PromptSuggester) -> Vec<String> {
        match suggester.suggest(&self.document.combined_text()) {
            Ok(prompts) => prompts
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            Err(err) => {
                tracing::warn!(%err, "prompt suggestions unavailable");
                Vec::new()
            }
        }
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.selected() {
            if !self.store.contains(id) {
                self.gestures.reset();
            }
        }
    }
}

fn is_move(event: &InputEvent) -> bool {
    match event {
        InputEvent::Pointer(p) => p.phase == PointerPhase::Move,
        InputEvent::Touch(t) => t.phase == TouchPhase::Move,
    }
}

fn is_down(event: &InputEvent) -> bool {
    match event {
        InputEvent::Pointer(p) => p.phase == PointerPhase::Down,
        InputEvent::Touch(t) => t.phase == TouchPhase::Start,
    }
}
