//! 局部标准差滤波.

use crate::consts::is_valid_kernel;
use crate::Idx3d;
use ndarray::{Array3, ArrayView3, Zip};

/// 镜像边界索引: 越界采样关于边缘像素中心反射回图像内部, 不重复边缘
/// 像素本身 (`d c b | a b c d | c b a`).
#[inline]
pub(crate) fn mirror(idx: isize, len: usize) -> usize {
    debug_assert!(len >= 1);
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = idx.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// 计算以 `(z, h, w)` 为中心、半径为 `radius` 的立方邻域内的总体标准差.
fn window_std(data: ArrayView3<f32>, (z, h, w): Idx3d, radius: isize) -> f32 {
    let (nz, nh, nw) = data.dim();
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;

    for dz in -radius..=radius {
        let zz = mirror(z as isize + dz, nz);
        for dh in -radius..=radius {
            let hh = mirror(h as isize + dh, nh);
            for dw in -radius..=radius {
                let ww = mirror(w as isize + dw, nw);
                let v = data[(zz, hh, ww)] as f64;
                sum += v;
                sum_sq += v * v;
            }
        }
    }

    let edge = (2 * radius + 1) as f64;
    let count = edge * edge * edge;
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0).sqrt() as f32
}

/// 对体数据做边长为 `kernel_size` 的立方窗口局部标准差滤波, 镜像边界.
///
/// 低值对应 "更均匀 / 组织内部", 高值多见于边界、噪声与背景.
/// 如果 `kernel_size` 不是正奇数, 则程序 panic.
pub fn local_std(data: ArrayView3<f32>, kernel_size: usize) -> Array3<f32> {
    assert!(is_valid_kernel(kernel_size), "核边长必须为正奇数");
    let radius = (kernel_size / 2) as isize;

    let mut out = Array3::<f32>::zeros(data.dim());
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            Zip::indexed(&mut out).par_for_each(|idx, o| *o = window_std(data, idx, radius));
        } else {
            Zip::indexed(&mut out).for_each(|idx, o| *o = window_std(data, idx, radius));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{local_std, mirror};
    use ndarray::Array3;

    #[test]
    fn test_mirror_reflects_without_edge_repeat() {
        // a b c d -> 序列向左: c b / 向右: c b a
        assert_eq!(mirror(-1, 4), 1);
        assert_eq!(mirror(-2, 4), 2);
        assert_eq!(mirror(0, 4), 0);
        assert_eq!(mirror(3, 4), 3);
        assert_eq!(mirror(4, 4), 2);
        assert_eq!(mirror(5, 4), 1);
        assert_eq!(mirror(6, 4), 0);

        // 单像素轴只能反射回自己.
        assert_eq!(mirror(-3, 1), 0);
        assert_eq!(mirror(7, 1), 0);
    }

    #[test]
    fn test_local_std_constant_is_zero() {
        let data = Array3::from_elem((3, 5, 5), 42.0f32);
        let measure = local_std(data.view(), 3);
        assert_eq!(measure.dim(), (3, 5, 5));
        assert!(measure.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_local_std_hand_computed() {
        // 单层 1x1x2 体数据, 核 3: 每个窗口含 27 个镜像采样.
        // (0,0,1) 的窗口含 18 个 0.0 和 9 个 3.0 (w 方向镜像),
        // 均值 1.0, 方差 = (18*1 + 9*4)/27 = 2.0; (0,0,0) 对称同理.
        let mut data = Array3::<f32>::zeros((1, 1, 2));
        data[(0, 0, 1)] = 3.0;

        let measure = local_std(data.view(), 3);
        assert!((measure[(0, 0, 0)] - 2.0f32.sqrt()).abs() < 1e-6);
        assert!((measure[(0, 0, 1)] - 2.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "核边长必须为正奇数")]
    fn test_even_kernel_rejected() {
        let data = Array3::<f32>::zeros((1, 2, 2));
        let _ = local_std(data.view(), 4);
    }
}
