//! 组织学切片与 MRI 参考切片的二维相似变换配准.
//!
//! 标记点来自可插拔的 [`LandmarkPicker`] (交互式选点或脚本化坐标),
//! 变换由对应点对的最小二乘闭式解拟合, 随后将组织学灰度图
//! 双线性重采样到参考帧 (越界填零).

mod error;

pub use error::{RegisterError, RegisterResult};

use crate::{HistoSlide, Idx2d, Idx2dF};
use ndarray::{Array2, ArrayView2};
use std::collections::VecDeque;

/// 二维相似变换: `dst = s * R(theta) * src + t`.
///
/// 点坐标约定为 `(x, y)`, 即 `(列, 行)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimilarityTransform {
    /// 旋转角 (弧度).
    pub rotation: f64,
    /// 统一缩放系数.
    pub scale: f64,
    /// 平移量 `(tx, ty)`.
    pub translation: Idx2dF,
}

impl Default for SimilarityTransform {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl SimilarityTransform {
    /// 恒等变换.
    #[inline]
    pub fn identity() -> Self {
        Self {
            rotation: 0.0,
            scale: 1.0,
            translation: (0.0, 0.0),
        }
    }

    /// 由对应点对拟合相似变换 (最小二乘闭式解).
    ///
    /// `src` 与 `dst` 按下标配对, 变换将 `src` 帧映射到 `dst` 帧.
    ///
    /// # 返回值
    ///
    /// 少于 2 对时返回 [`RegisterError::TooFewPoints`];
    /// 两组长度不同返回 [`RegisterError::PointCountMismatch`];
    /// 源点全部重合返回 [`RegisterError::DegeneratePoints`].
    pub fn estimate(src: &[Idx2dF], dst: &[Idx2dF]) -> RegisterResult<Self> {
        if src.len() != dst.len() {
            return Err(RegisterError::PointCountMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        if src.len() < 2 {
            return Err(RegisterError::TooFewPoints(src.len()));
        }
        let n = src.len() as f64;
        let mean = |pts: &[Idx2dF]| {
            let (sx, sy) = pts
                .iter()
                .fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
            (sx / n, sy / n)
        };
        let (sx, sy) = mean(src);
        let (dx, dy) = mean(dst);

        // 去中心后的互相关量. a, b 给出旋转与缩放, d 归一化源点散布.
        let (mut a, mut b, mut d) = (0.0_f64, 0.0_f64, 0.0_f64);
        for (&(xs, ys), &(xd, yd)) in src.iter().zip(dst) {
            let (xs, ys) = (xs - sx, ys - sy);
            let (xd, yd) = (xd - dx, yd - dy);
            a += xs * xd + ys * yd;
            b += xs * yd - ys * xd;
            d += xs * xs + ys * ys;
        }
        if d < 1e-12 {
            return Err(RegisterError::DegeneratePoints);
        }
        let rotation = b.atan2(a);
        let scale = a.hypot(b) / d;
        let (cos, sin) = (rotation.cos(), rotation.sin());
        let translation = (
            dx - scale * (cos * sx - sin * sy),
            dy - scale * (sin * sx + cos * sy),
        );
        Ok(Self {
            rotation,
            scale,
            translation,
        })
    }

    /// 对单个点应用变换.
    #[inline]
    pub fn apply(&self, (x, y): Idx2dF) -> Idx2dF {
        let (cos, sin) = (self.rotation.cos(), self.rotation.sin());
        let (tx, ty) = self.translation;
        (
            self.scale * (cos * x - sin * y) + tx,
            self.scale * (sin * x + cos * y) + ty,
        )
    }

    /// 获取齐次矩阵形式 (行主序).
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        let (cos, sin) = (self.rotation.cos(), self.rotation.sin());
        let (tx, ty) = self.translation;
        let s = self.scale;
        [
            [s * cos, -s * sin, tx],
            [s * sin, s * cos, ty],
            [0.0, 0.0, 1.0],
        ]
    }

    /// 获取逆变换.
    ///
    /// # 注意
    ///
    /// 缩放系数为 0 时无逆, 此时程序 panic.
    pub fn inverse(&self) -> Self {
        assert_ne!(self.scale, 0.0, "缩放系数为 0 的变换不可逆");
        let rotation = -self.rotation;
        let scale = 1.0 / self.scale;
        let (cos, sin) = (rotation.cos(), rotation.sin());
        let (tx, ty) = self.translation;
        Self {
            rotation,
            scale,
            translation: (
                -scale * (cos * tx - sin * ty),
                -scale * (sin * tx + cos * ty),
            ),
        }
    }
}

/// 标记点选择能力. 实现方对给定图像返回 `n_points` 个 `(x, y)` 坐标.
///
/// 交互式实现会在此阻塞等待人工点选; 无头环境用 [`ScriptedPicker`]
/// 注入预先准备好的坐标.
pub trait LandmarkPicker {
    /// 在 `image` 上选取 `n_points` 个标记点.
    fn select_points(
        &mut self,
        image: ArrayView2<f64>,
        n_points: usize,
    ) -> RegisterResult<Vec<Idx2dF>>;
}

/// 脚本化选点器: 每次调用按序弹出一组预置坐标.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPicker {
    queued: VecDeque<Vec<Idx2dF>>,
}

impl ScriptedPicker {
    /// 按调用顺序预置若干组标记点.
    pub fn new<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = Vec<Idx2dF>>,
    {
        Self {
            queued: groups.into_iter().collect(),
        }
    }
}

impl LandmarkPicker for ScriptedPicker {
    fn select_points(
        &mut self,
        _image: ArrayView2<f64>,
        n_points: usize,
    ) -> RegisterResult<Vec<Idx2dF>> {
        let group = self
            .queued
            .pop_front()
            .ok_or(RegisterError::PickerExhausted)?;
        if group.len() != n_points {
            return Err(RegisterError::WrongPointCount {
                want: n_points,
                got: group.len(),
            });
        }
        Ok(group)
    }
}

/// 双线性采样. 任一相邻像素越界时按 0 参与插值.
fn sample_bilinear(image: ArrayView2<f64>, (x, y): Idx2dF) -> f64 {
    let (rows, cols) = image.dim();
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let at = |r: f64, c: f64| {
        if r < 0.0 || c < 0.0 {
            return 0.0;
        }
        let (r, c) = (r as usize, c as usize);
        if r < rows && c < cols {
            image[(r, c)]
        } else {
            0.0
        }
    };
    let top = at(y0, x0) * (1.0 - fx) + at(y0, x0 + 1.0) * fx;
    let bottom = at(y0 + 1.0, x0) * (1.0 - fx) + at(y0 + 1.0, x0 + 1.0) * fx;
    top * (1.0 - fy) + bottom * fy
}

/// 将图像重采样到 `shape` 指定的输出帧.
///
/// `transform` 把输出帧坐标映射为输入帧坐标 (逆向映射),
/// 每个输出像素在输入图像上双线性采样, 越界填零.
pub fn warp(
    image: ArrayView2<f64>,
    transform: &SimilarityTransform,
    shape: Idx2d,
) -> Array2<f64> {
    Array2::from_shape_fn(shape, |(r, c)| {
        sample_bilinear(image, transform.apply((c as f64, r as f64)))
    })
}

/// 标记点配准主入口.
///
/// 流程: 组织学切片转灰度 (通道均值), 由 `picker` 先后在参考切片与
/// 组织学灰度图上各选 `n_points` 个标记点, 拟合相似变换
/// (参考帧 -> 组织学帧), 最后把组织学灰度图重采样到参考帧.
///
/// # 返回值
///
/// `(变换, 与参考切片同形状的重采样图像)`.
pub fn register_histo(
    histo: &HistoSlide,
    reference: ArrayView2<f32>,
    picker: &mut dyn LandmarkPicker,
    n_points: usize,
) -> RegisterResult<(SimilarityTransform, Array2<f64>)> {
    let grayscale = histo.grayscale();
    let reference_f64 = reference.mapv(f64::from);

    let mr_points = picker.select_points(reference_f64.view(), n_points)?;
    let histo_points = picker.select_points(grayscale.view(), n_points)?;
    let transform = SimilarityTransform::estimate(&mr_points, &histo_points)?;
    log::info!(
        "相似变换拟合完成: rotation = {:.6}, scale = {:.6}, translation = {:?}",
        transform.rotation,
        transform.scale,
        transform.translation
    );

    let warped = warp(grayscale.view(), &transform, reference.dim());
    Ok((transform, warped))
}

/// 同 [`register_histo`], 标记点数取默认值
/// [`DEFAULT_LANDMARKS`](crate::consts::DEFAULT_LANDMARKS).
#[inline]
pub fn register_histo_default(
    histo: &HistoSlide,
    reference: ArrayView2<f32>,
    picker: &mut dyn LandmarkPicker,
) -> RegisterResult<(SimilarityTransform, Array2<f64>)> {
    register_histo(histo, reference, picker, crate::consts::DEFAULT_LANDMARKS)
}
