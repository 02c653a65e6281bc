//! # Journal Core
//!
//! Page logic for Journal Studio: everything between the document a user
//! typed and the pixels the renderer draws.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                journal-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Layout          │  Interaction             │
//! │  - Font fitting  │  - Pointer/touch events  │
//! │  - Snake wrap    │  - Gesture engine        │
//! │  - Freeflow wrap │  - Frame scheduling      │
//! ├─────────────────────────────────────────────┤
//! │  Model           │  Frame                   │
//! │  - Document      │  - compute_frame         │
//! │  - Template      │  - Draw ops              │
//! │  - Transforms    │  - Click areas           │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod entity;
pub mod error;
pub mod event;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod host;
pub mod layout;
pub mod schedule;
pub mod session;
pub mod store;
pub mod template;

pub use document::{DocumentState, ImageKey, ImageSource, LayoutMode, TextColors};
pub use entity::{
    EntityId, FreeImagePlacement, SizeLimits, StickerEntity, StickerId, MAX_RELATIVE_SIZE,
    MIN_ENTITY_SIZE,
};
pub use error::{JournalError, JournalResult};
pub use event::{
    InputEvent, PageViewport, PointerEvent, PointerKind, PointerPhase, TouchEvent, TouchPhase,
    TouchPoint,
};
pub use frame::{
    compute_frame, ClickArea, ClickTarget, DrawOp, FrameInputs, FramePlan, ImageFit,
    InteractionFlags, RenderQuality, TextShadow,
};
pub use geometry::{normalize_degrees, rotate_point, Point, Rect, Size};
pub use gesture::{
    affordance_handles, Affordance, AffordanceHandle, GestureEngine, GestureState,
};
pub use host::{
    ExportReceipt, ExportSink, Notice, NoticeLevel, PageCommands, PromptSuggester, StickerUpload,
    SuggestError,
};
pub use layout::{AdvanceMeasure, FitConfig, FreeflowWrapper, TextLayout, TextLine, TextMeasure};
pub use schedule::{FrameScheduler, Redraw, ScheduleOutcome};
pub use session::{PageSession, PageSnapshot};
pub use store::{EntityFrame, TransformStore};
pub use template::{LineSlots, PageTemplate, TextColumn, TextRegion};

/// Journal core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
