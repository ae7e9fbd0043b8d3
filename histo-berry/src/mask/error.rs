//! 运行时错误.

/// 掩膜提取的运行时错误.
#[derive(Debug)]
pub enum MaskError {
    /// 核边长非法 (必须为正奇数). 参数为给定的非法值.
    BadKernelSize(usize),

    /// 局部标准差度量为常数 (或不含任何有限值), Otsu 阈值无定义.
    ConstantMeasure,

    /// 阈值化后不存在任何前景连通域.
    NoForeground,

    /// 读取 nii 体数据文件错误.
    Nifti(nifti::NiftiError),
}

impl From<nifti::NiftiError> for MaskError {
    #[inline]
    fn from(e: nifti::NiftiError) -> Self {
        Self::Nifti(e)
    }
}

/// 掩膜提取结果.
pub type MaskResult<T> = Result<T, MaskError>;
