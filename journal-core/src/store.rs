//! Geometric state of every sticker and freeflow photo on the page.
//!
//! Only the gesture engine and explicit host commands mutate the store;
//! rendering reads it.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, FreeImagePlacement, SizeLimits, StickerEntity, StickerId};
use crate::error::{JournalError, JournalResult};
use crate::geometry::{rotate_point, Point, Rect, Size};

/// Bounds and rotation of an entity, as needed for hit testing and handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityFrame {
    /// Unrotated bounds.
    pub rect: Rect,
    /// Rotation in degrees.
    pub rotation: f32,
}

impl EntityFrame {
    /// Whether `point` lies inside the rotated box, with half-extents scaled
    /// by `forgiveness`.
    #[must_use]
    pub fn contains(&self, point: Point, forgiveness: f32) -> bool {
        let center = self.rect.center();
        let local = rotate_point(point, center, -self.rotation) - center;
        local.x.abs() <= self.rect.width / 2.0 * forgiveness
            && local.y.abs() <= self.rect.height / 2.0 * forgiveness
    }
}

/// All movable objects on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStore {
    /// Stickers in insertion order (the z-order tie-break).
    stickers: Vec<StickerEntity>,
    /// Freeflow photo placements.
    placements: Vec<FreeImagePlacement>,
    /// Page size used for limits.
    page: Size,
    /// Whether placements take part in hit testing (freeflow layout only).
    #[serde(default = "photos_active_default")]
    photos_active: bool,
}

fn photos_active_default() -> bool {
    true
}

impl TransformStore {
    /// Create an empty store for a page of the given size.
    #[must_use]
    pub fn new(page: Size) -> Self {
        Self {
            stickers: Vec::new(),
            placements: Vec::new(),
            page,
            photos_active: true,
        }
    }

    /// Rebuild a store from persisted entities.
    ///
    /// Stacking keys are kept as saved; sizes are clamped to the page limits.
    /// Photo placements are checked with [`FreeImagePlacement::validated`].
    #[must_use]
    pub fn from_parts(
        page: Size,
        stickers: Vec<StickerEntity>,
        placements: Vec<FreeImagePlacement>,
    ) -> Self {
        let limits = SizeLimits::for_page(page);
        let stickers = stickers
            .into_iter()
            .map(|mut s| {
                let clamped = limits.clamp_size(s.size);
                if clamped != s.size {
                    tracing::debug!(id = %s.id, "restored sticker size clamped");
                    s.set_size_centered(clamped);
                }
                s
            })
            .collect();
        let mut placements: Vec<FreeImagePlacement> = placements
            .into_iter()
            .filter_map(|p| {
                let index = p.image_index;
                let checked = p.validated();
                if checked.is_none() {
                    tracing::warn!(index, "restored photo placement has unusable geometry; dropped");
                }
                checked
            })
            .collect();
        placements.sort_by_key(|p| p.image_index);
        placements.dedup_by_key(|p| p.image_index);
        Self {
            stickers,
            placements,
            page,
            photos_active: true,
        }
    }

    /// Page size.
    #[must_use]
    pub fn page(&self) -> Size {
        self.page
    }

    /// Whether photo placements are on screen and can be picked.
    #[must_use]
    pub fn photos_active(&self) -> bool {
        self.photos_active
    }

    /// Show or hide photo placements from hit testing. Hidden placements are
    /// kept so they come back when the page returns to freeflow.
    pub fn set_photos_active(&mut self, active: bool) {
        self.photos_active = active;
    }

    /// Size limits for this page.
    #[must_use]
    pub fn limits(&self) -> SizeLimits {
        SizeLimits::for_page(self.page)
    }

    /// Add a sticker on top of everything else.
    pub fn add_sticker(&mut self, mut sticker: StickerEntity) -> StickerId {
        sticker.z = self.max_z() + 1;
        sticker.size = self.limits().clamp_size(sticker.size);
        let id = sticker.id;
        tracing::debug!(%id, z = sticker.z, "sticker added");
        self.stickers.push(sticker);
        id
    }

    /// Remove a sticker.
    ///
    /// # Errors
    ///
    /// Returns an error if the sticker is not found.
    pub fn remove_sticker(&mut self, id: StickerId) -> JournalResult<StickerEntity> {
        let index = self
            .stickers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| JournalError::StickerNotFound(id.to_string()))?;
        Ok(self.stickers.remove(index))
    }

    /// Remove every sticker, returning how many were removed.
    pub fn clear_stickers(&mut self) -> usize {
        let count = self.stickers.len();
        self.stickers.clear();
        count
    }

    /// Get a sticker by ID.
    #[must_use]
    pub fn sticker(&self, id: StickerId) -> Option<&StickerEntity> {
        self.stickers.iter().find(|s| s.id == id)
    }

    /// Get a mutable reference to a sticker by ID.
    pub fn sticker_mut(&mut self, id: StickerId) -> Option<&mut StickerEntity> {
        self.stickers.iter_mut().find(|s| s.id == id)
    }

    /// Stickers in insertion order.
    #[must_use]
    pub fn stickers(&self) -> &[StickerEntity] {
        &self.stickers
    }

    /// Stickers in draw order: ascending z, ties by insertion order.
    #[must_use]
    pub fn stickers_by_z(&self) -> Vec<&StickerEntity> {
        let mut ordered: Vec<_> = self.stickers.iter().collect();
        // stable sort keeps insertion order for equal z
        ordered.sort_by_key(|s| s.z);
        ordered
    }

    /// Highest z in use, or 0 when empty.
    #[must_use]
    pub fn max_z(&self) -> i64 {
        self.stickers.iter().map(|s| s.z).max().unwrap_or(0)
    }

    /// Raise a sticker above all others. Photos have no z and are ignored.
    pub fn bring_to_front(&mut self, id: EntityId) {
        let EntityId::Sticker(sticker_id) = id else {
            return;
        };
        let top = self.max_z();
        let unique_top = self.stickers.iter().filter(|s| s.z == top).count() == 1;
        if let Some(sticker) = self.sticker_mut(sticker_id) {
            if sticker.z != top || !unique_top {
                sticker.z = top + 1;
            }
        }
    }

    /// Placement for an image, if one exists.
    #[must_use]
    pub fn placement(&self, image_index: usize) -> Option<&FreeImagePlacement> {
        self.placements.iter().find(|p| p.image_index == image_index)
    }

    /// Mutable placement for an image.
    pub fn placement_mut(&mut self, image_index: usize) -> Option<&mut FreeImagePlacement> {
        self.placements
            .iter_mut()
            .find(|p| p.image_index == image_index)
    }

    /// All placements, ordered by image index.
    #[must_use]
    pub fn placements(&self) -> &[FreeImagePlacement] {
        &self.placements
    }

    /// Insert or replace the placement for its image.
    pub fn set_placement(&mut self, placement: FreeImagePlacement) {
        match self.placement_mut(placement.image_index) {
            Some(existing) => *existing = placement,
            None => {
                self.placements.push(placement);
                self.placements.sort_by_key(|p| p.image_index);
            }
        }
    }

    /// Remove the placement for an image and shift later indices down, as
    /// the host does when it removes the image from the document.
    ///
    /// # Errors
    ///
    /// Returns an error if no placement exists for the index.
    pub fn remove_placement(&mut self, image_index: usize) -> JournalResult<FreeImagePlacement> {
        let pos = self
            .placements
            .iter()
            .position(|p| p.image_index == image_index)
            .ok_or(JournalError::PlacementNotFound(image_index))?;
        let removed = self.placements.remove(pos);
        for p in &mut self.placements {
            if p.image_index > image_index {
                p.image_index -= 1;
            }
        }
        Ok(removed)
    }

    /// Drop placements whose image no longer exists.
    pub fn retain_images(&mut self, image_count: usize) {
        self.placements.retain(|p| p.image_index < image_count);
    }

    /// Whether the entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.frame(id).is_some()
    }

    /// Bounds and rotation of an entity.
    #[must_use]
    pub fn frame(&self, id: EntityId) -> Option<EntityFrame> {
        match id {
            EntityId::Sticker(sid) => self.sticker(sid).map(|s| EntityFrame {
                rect: s.rect(),
                rotation: s.rotation,
            }),
            EntityId::Image(_) if !self.photos_active => None,
            EntityId::Image(index) => self.placement(index).map(|p| EntityFrame {
                rect: p.rect(),
                rotation: 0.0,
            }),
        }
    }

    /// Topmost entity under `point`: stickers by descending z, then photos.
    #[must_use]
    pub fn hit_test(&self, point: Point, forgiveness: f32) -> Option<EntityId> {
        let stickers = self.stickers_by_z();
        let sticker_hit = stickers
            .iter()
            .rev()
            .find(|s| {
                EntityFrame {
                    rect: s.rect(),
                    rotation: s.rotation,
                }
                .contains(point, forgiveness)
            })
            .map(|s| EntityId::Sticker(s.id));

        if !self.photos_active {
            return sticker_hit;
        }
        sticker_hit.or_else(|| {
            self.placements
                .iter()
                .rev()
                .find(|p| {
                    EntityFrame {
                        rect: p.rect(),
                        rotation: 0.0,
                    }
                    .contains(point, forgiveness)
                })
                .map(|p| EntityId::Image(p.image_index))
        })
    }

    /// Remove an entity. Photos are removed without re-indexing.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn remove(&mut self, id: EntityId) -> JournalResult<()> {
        match id {
            EntityId::Sticker(sid) => self.remove_sticker(sid).map(|_| ()),
            EntityId::Image(index) => {
                let before = self.placements.len();
                self.placements.retain(|p| p.image_index != index);
                if self.placements.len() == before {
                    Err(JournalError::PlacementNotFound(index))
                } else {
                    Ok(())
                }
            }
        }
    }
}
