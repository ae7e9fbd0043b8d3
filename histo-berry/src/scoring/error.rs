use crate::{Idx2d, Idx3d};

/// 配准打分过程可能出现的错误.
#[derive(Debug)]
pub enum ScoreError {
    /// nifti 体数据读取失败.
    Nifti(nifti::NiftiError),
    /// 组织学照片读取失败.
    Image(image::ImageError),
    /// 各模态体数据形状不一致.
    ModalityShapeMismatch {
        /// 首个模态确定的形状.
        expected: Idx3d,
        /// 后续模态的实际形状.
        found: Idx3d,
    },
    /// 重采样图像与体数据切片形状不匹配 (体数据不是单切片).
    ShapeMismatch {
        /// 重采样图像的形状 `(h, w)`.
        warped: Idx2d,
        /// 体数据的形状 `(z, h, w)`.
        volume: Idx3d,
    },
}

impl From<nifti::NiftiError> for ScoreError {
    #[inline]
    fn from(e: nifti::NiftiError) -> Self {
        Self::Nifti(e)
    }
}

impl From<image::ImageError> for ScoreError {
    #[inline]
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

/// 本模块专用 `Result` 类型.
pub type ScoreResult<T> = Result<T, ScoreError>;
