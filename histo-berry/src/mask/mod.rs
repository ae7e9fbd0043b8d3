//! 组织区域掩膜提取.
//!
//! 流水线: 局部标准差滤波 (镜像边界) -> Otsu 全局阈值 ->
//! 六连通域标记取最大 -> 立方结构元闭运算. 低纹理区域
//! (局部标准差小于阈值) 视为组织前景, 背景噪声纹理更强.

mod error;
mod filter;
mod label;
mod morph;
mod otsu;

pub use error::{MaskError, MaskResult};
pub use filter::local_std;
pub use label::{label_components, LabeledVolume};
pub use morph::{binary_close, binary_dilate, binary_erode};
pub use otsu::otsu_threshold;

use crate::consts::{CLOSING_SIZE, DEFAULT_KERNEL_SIZE};
use crate::{consts, MrVolume, VolumeMask};
use ndarray::ArrayView3;
use std::path::Path;

/// 掩膜提取结果. 同时保留闭运算的两个阶段:
/// `dilated` 覆盖范围更大, 适合做保守的感兴趣区域;
/// `closed` 是完整闭运算 (膨胀后腐蚀) 的输出, 边界更贴合组织.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPair {
    dilated: VolumeMask,
    closed: VolumeMask,
}

impl MaskPair {
    /// 获取感兴趣区域掩膜 (膨胀阶段的输出).
    #[inline]
    pub fn roi(&self) -> &VolumeMask {
        &self.dilated
    }

    /// 获取闭运算掩膜.
    #[inline]
    pub fn closed(&self) -> &VolumeMask {
        &self.closed
    }

    /// 拆出 `(膨胀掩膜, 闭运算掩膜)`.
    #[inline]
    pub fn into_parts(self) -> (VolumeMask, VolumeMask) {
        (self.dilated, self.closed)
    }
}

/// 掩膜提取器. 唯一参数是局部标准差滤波的核边长 (必须为正奇数).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskExtractor {
    kernel_size: usize,
}

impl Default for MaskExtractor {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_KERNEL_SIZE)
    }
}

impl MaskExtractor {
    /// 创建提取器.
    ///
    /// # 注意
    ///
    /// `kernel_size` 必须为正奇数, 否则在 [`Self::extract`] 时报错.
    #[inline]
    pub fn new(kernel_size: usize) -> Self {
        Self { kernel_size }
    }

    /// 获取核边长.
    #[inline]
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// 对整个体数据提取组织掩膜.
    pub fn extract(&self, volume: &MrVolume) -> MaskResult<MaskPair> {
        self.extract_array(volume.data().view())
    }

    /// 从 nii 文件加载体数据并提取组织掩膜.
    ///
    /// # 返回值
    ///
    /// 文件无法作为体数据读取时返回 [`MaskError::Nifti`].
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> MaskResult<MaskPair> {
        let volume = MrVolume::open(path)?;
        self.extract(&volume)
    }

    /// 对任意 `[z, h, w]` 浮点场提取组织掩膜.
    ///
    /// # 返回值
    ///
    /// 体数据恒定 (无法求阈值) 时返回 [`MaskError::ConstantMeasure`];
    /// 阈值以下无体素时返回 [`MaskError::NoForeground`].
    pub fn extract_array(&self, data: ArrayView3<f32>) -> MaskResult<MaskPair> {
        if !consts::is_valid_kernel(self.kernel_size) {
            return Err(MaskError::BadKernelSize(self.kernel_size));
        }
        let measure = local_std(data, self.kernel_size);
        let threshold =
            otsu_threshold(measure.view()).ok_or(MaskError::ConstantMeasure)?;
        log::debug!("局部标准差阈值: {threshold}");

        let candidates = measure.mapv(|v| v < threshold);
        let labeled = label_components(candidates.view());
        log::debug!("候选连通域数量: {}", labeled.num_components());

        let largest = labeled.largest().ok_or(MaskError::NoForeground)?;
        let roi = labeled.mask_of(largest);

        let dilated = binary_dilate(&roi, CLOSING_SIZE);
        let closed = binary_erode(&dilated, CLOSING_SIZE);
        Ok(MaskPair { dilated, closed })
    }
}
