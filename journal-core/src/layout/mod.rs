//! Body text layout: font fitting, snake wrap and freeflow wrap.

pub mod fit;
pub mod freeflow;
pub mod measure;

pub use fit::{
    count_lines, fill_line, fit_font_size, layout_freeflow, layout_regions, reference_text,
    select_font_size, FitConfig, TextLayout, TextLine,
};
pub use freeflow::{FreeflowWrapper, LineSpan};
pub use measure::{AdvanceMeasure, TextMeasure};
