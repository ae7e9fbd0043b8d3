//! 通用常量.

/// 局部标准差滤波的默认核边长 (体素). 必须为正奇数.
pub const DEFAULT_KERNEL_SIZE: usize = 15;

/// 掩膜闭运算 (膨胀 + 腐蚀) 结构元的边长 (体素).
pub const CLOSING_SIZE: usize = 10;

/// 配准时默认采集的对应点对个数.
pub const DEFAULT_LANDMARKS: usize = 7;

/// 配准时默认使用的 MRI 参考模态名.
pub const DEFAULT_REF_MODALITY: &str = "t1";

/// 持久化时单次写入的字节数上限 (2^31 - 1). 某些平台的单次
/// `write` 无法超过该值, 超大对象须按该上限分块落盘.
pub const MAX_WRITE_BYTES: usize = (1 << 31) - 1;

/// 核边长是否是合法的滤波窗口边长 (正奇数)?
#[inline]
pub const fn is_valid_kernel(kernel_size: usize) -> bool {
    kernel_size % 2 == 1
}
