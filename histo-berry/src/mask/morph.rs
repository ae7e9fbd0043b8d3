//! 三维二值形态学操作.
//!
//! 结构元为边长 `size` 的立方体, 但长度为 1 的轴不参与
//! (单切片体数据上退化为平面结构元, 否则腐蚀会吞掉整层).
//! 偶数边长时原点取 `size / 2` (与常见图像库的约定一致),
//! 即偏移范围为 `-(size / 2) ..= size - 1 - size / 2`.

use crate::{Idx3d, VolumeMask};
use ndarray::Array3;
use std::ops::RangeInclusive;

/// 结构元在单个轴上的偏移范围 (闭区间). 长度为 1 的轴只保留零偏移.
#[inline]
fn axis_offsets(size: usize, len: usize) -> RangeInclusive<isize> {
    if len == 1 {
        return 0..=0;
    }
    let lo = -((size / 2) as isize);
    let hi = (size - 1 - size / 2) as isize;
    lo..=hi
}

/// 带符号偏移后的索引. 越界返回 `None`.
#[inline]
fn shifted(
    (z, h, w): Idx3d,
    (dz, dh, dw): (isize, isize, isize),
    (nz, nh, nw): Idx3d,
) -> Option<Idx3d> {
    let z = z.checked_add_signed(dz)?;
    let h = h.checked_add_signed(dh)?;
    let w = w.checked_add_signed(dw)?;
    (z < nz && h < nh && w < nw).then_some((z, h, w))
}

/// 以边长为 `size` 的立方结构元膨胀掩膜.
///
/// 如果 `size` 为 0, 则程序 panic.
pub fn binary_dilate(mask: &VolumeMask, size: usize) -> VolumeMask {
    assert_ne!(size, 0, "结构元边长不能为 0");
    let shape = mask.shape();
    let (zr, hr, wr) = (
        axis_offsets(size, shape.0),
        axis_offsets(size, shape.1),
        axis_offsets(size, shape.2),
    );
    let mut out = Array3::from_elem(shape, false);

    for (pos, &fg) in mask.data().indexed_iter() {
        if !fg {
            continue;
        }
        for dz in zr.clone() {
            for dh in hr.clone() {
                for dw in wr.clone() {
                    if let Some(p) = shifted(pos, (dz, dh, dw), shape) {
                        out[p] = true;
                    }
                }
            }
        }
    }
    VolumeMask::new(out)
}

/// 以边长为 `size` 的立方结构元腐蚀掩膜. 越界采样视作背景,
/// 因此贴近边界的前景会被腐蚀掉.
///
/// 如果 `size` 为 0, 则程序 panic.
pub fn binary_erode(mask: &VolumeMask, size: usize) -> VolumeMask {
    assert_ne!(size, 0, "结构元边长不能为 0");
    let shape = mask.shape();
    let (zr, hr, wr) = (
        axis_offsets(size, shape.0),
        axis_offsets(size, shape.1),
        axis_offsets(size, shape.2),
    );
    let data = mask.data();
    let mut out = Array3::from_elem(shape, false);

    'voxel: for (pos, o) in out.indexed_iter_mut() {
        if !data[pos] {
            continue;
        }
        for dz in zr.clone() {
            for dh in hr.clone() {
                for dw in wr.clone() {
                    match shifted(pos, (dz, dh, dw), shape) {
                        Some(p) if data[p] => {}
                        _ => continue 'voxel,
                    }
                }
            }
        }
        *o = true;
    }
    VolumeMask::new(out)
}

/// 闭运算: 先膨胀, 再以同一结构元腐蚀. 用于填补小孔洞与裂缝.
#[inline]
pub fn binary_close(mask: &VolumeMask, size: usize) -> VolumeMask {
    binary_erode(&binary_dilate(mask, size), size)
}

#[cfg(test)]
mod tests {
    use super::{binary_close, binary_dilate, binary_erode};
    use crate::VolumeMask;
    use ndarray::Array3;

    fn single_voxel() -> VolumeMask {
        let mut raw = Array3::from_elem((1, 7, 7), false);
        raw[(0, 3, 3)] = true;
        VolumeMask::new(raw)
    }

    #[test]
    fn test_dilate_odd_element() {
        // 单切片: z 轴退化, 平面上得到 3x3.
        let dilated = binary_dilate(&single_voxel(), 3);
        assert_eq!(dilated.count(), 9);
        assert_eq!(dilated.bounding_box(), Some(((0, 2, 2), (0, 4, 4))));
    }

    #[test]
    fn test_dilate_even_element_origin() {
        // 偶数结构元原点偏置: 偏移范围 -1..=0.
        let dilated = binary_dilate(&single_voxel(), 2);
        assert_eq!(dilated.count(), 4);
        assert_eq!(dilated.bounding_box(), Some(((0, 2, 2), (0, 3, 3))));
    }

    #[test]
    fn test_erode_strips_boundary_layers() {
        let mut raw = Array3::from_elem((3, 9, 9), false);
        for z in 0..3 {
            for h in 3..=5 {
                for w in 3..=5 {
                    raw[(z, h, w)] = true;
                }
            }
        }
        let mask = VolumeMask::new(raw);

        // z 方向贴边, 腐蚀后边界层消失 (越界视作背景), 只剩正中体素.
        let eroded = binary_erode(&mask, 3);
        assert_eq!(eroded.count(), 1);
        assert!(eroded[(1, 4, 4)]);
    }

    #[test]
    fn test_closing_fills_gap_and_is_idempotent() {
        // 两个相距 1 的前景段, 闭运算应将缝隙填平.
        let mut raw = Array3::from_elem((1, 1, 9), false);
        for w in [1, 2, 3, 5, 6, 7] {
            raw[(0, 0, w)] = true;
        }
        let mask = VolumeMask::new(raw);

        let closed = binary_close(&mask, 3);
        assert!(closed[(0, 0, 4)], "缝隙应被闭运算填平");

        // closing(closing(M)) == closing(M).
        let twice = binary_close(&closed, 3);
        assert_eq!(twice, closed);
    }
}
