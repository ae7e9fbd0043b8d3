//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF, Idx3d};

pub use crate::{CompactMask, HistoSlide, MrVolume, VolumeMask, VolumeMeta};

pub use crate::consts::{
    CLOSING_SIZE, DEFAULT_KERNEL_SIZE, DEFAULT_LANDMARKS, DEFAULT_REF_MODALITY,
};

pub use crate::dataset::{home_images_dir_with, slice_loader, BrainSlice};

pub use crate::mask::{MaskError, MaskExtractor, MaskPair, MaskResult};

pub use crate::polygon::polygon_mask_indices;

pub use crate::registration::{
    register_histo, register_histo_default, warp, LandmarkPicker,
    RegisterError, ScriptedPicker, SimilarityTransform,
};

pub use crate::scoring::{
    adjusted_mutual_info, compute_ami, score_alignment, sum_modalities,
};

#[cfg(feature = "serde")]
pub use crate::persist::{load_object, save_object, save_object_chunked};
