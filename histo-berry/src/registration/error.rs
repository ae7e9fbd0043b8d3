/// 标记点配准过程可能出现的错误.
#[derive(Debug)]
pub enum RegisterError {
    /// 对应点对不足. 相似变换至少需要 2 对标记点.
    TooFewPoints(usize),
    /// 两组标记点数量不一致.
    PointCountMismatch {
        /// 源图像 (MRI 参考帧) 的标记点数.
        src: usize,
        /// 目标图像 (组织学切片) 的标记点数.
        dst: usize,
    },
    /// 源标记点退化 (完全重合), 相似变换欠定.
    DegeneratePoints,
    /// 点选择器给出的标记点个数与要求不符.
    WrongPointCount {
        /// 要求的个数.
        want: usize,
        /// 实际给出的个数.
        got: usize,
    },
    /// 点选择器无法给出足够的标记点序列.
    PickerExhausted,
}

/// 本模块专用 `Result` 类型.
pub type RegisterResult<T> = Result<T, RegisterError>;
