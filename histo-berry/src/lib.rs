#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供脑组织学切片 (histology) 与多模态 MRI 数据的结构化信息和基础配准算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 所有数据结构均为值语义, 计算完成后不可变;
//! 除按需从磁盘加载的文件外, 各操作之间不共享任何可变状态.
//!
//! # 注意
//!
//! 1. 该 crate 按照本实验室组织学/MRI 数据的目录组织方式工作
//!   (每个脑切片一个目录, 内含若干模态 nii 文件和一张组织学照片).
//! 2. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 功能总览
//!
//! ### 组织 ROI 掩膜提取 ✅
//!
//! 对 MRI 体数据做局部标准差滤波 (镜像边界), Otsu 阈值化,
//! 连通域标记并保留最大低方差区域, 最后做固定结构元的膨胀/闭运算.
//!
//! 实现位于 `histo-berry/src/mask`.
//!
//! ### 人工标记点相似变换配准 ✅
//!
//! 对 (组织学照片, MRI 参考切片) 图像对, 通过可插拔的标记点选取接口获得
//! 对应点对, 以最小二乘闭式解估计二维相似变换 (旋转 + 等比缩放 + 平移),
//! 并将组织学灰度图重采样到参考坐标系.
//!
//! 实现位于 `histo-berry/src/registration`.
//!
//! ### 配准质量评分 ✅
//!
//! 将所有模态体数据逐体素求和 (NaN 记 0), 用给定变换回卷组织学灰度图,
//! 对两组整数化标签序列计算经机会校正的互信息 (AMI).
//!
//! 实现位于 `histo-berry/src/scoring`.
//!
//! ### 多边形掩膜栅格化 ✅
//!
//! 任意闭合多边形 (索引约定, 允许小数顶点) 的扫描线填充,
//! 返回包围盒偏移校正后的前景像素索引.
//!
//! 实现位于 `histo-berry/src/polygon.rs`.
//!
//! ### 通用对象持久化 ✅
//!
//! 基于 bincode 的对象序列化与分块写入 (单次写入不超过 2^31 - 1 字节).
//!
//! 实现位于 `histo-berry/src/persist.rs`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 高精度通用索引 / 向量.
pub type Idx2dF = (f64, f64);

/// 脑切片 MRI / 组织学基础数据结构.
mod data;

pub use data::{CompactMask, HistoSlide, MrVolume, VolumeMask, VolumeMeta};

pub mod consts;

pub mod dataset;
pub mod mask;
pub mod polygon;
pub mod registration;
pub mod scoring;

#[cfg(feature = "serde")]
pub mod persist;

pub mod prelude;
