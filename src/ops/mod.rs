pub mod adjustments;
pub mod background;
pub mod effects;
pub mod filters;
pub mod pipeline;
pub mod segmentation;
pub mod text;

pub use background::Background;
pub use pipeline::{EffectPipeline, ImageEffect};
pub use segmentation::{BorderKeySegmenter, SegmentationError, SegmentationSettings, SubjectSegmenter};
