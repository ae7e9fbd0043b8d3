//! 三维连通域标记.

use crate::{Idx3d, VolumeMask};
use ndarray::{Array3, ArrayView, ArrayView3, Ix3};
use std::collections::VecDeque;

/// 带标号的连通域体数据. 0 为背景, 正整数为互不相同的连通域标号.
///
/// 标号从 1 开始按发现顺序 (行优先扫描序) 分配, 因此对相同输入
/// 多次运行的结果一致 (稳定性).
#[derive(Debug, Clone)]
pub struct LabeledVolume {
    data: Array3<u32>,
    counts: Vec<usize>,
}

impl LabeledVolume {
    /// 连通域个数 (不含背景).
    #[inline]
    pub fn num_components(&self) -> usize {
        self.counts.len()
    }

    /// 标号为 `label` 的连通域体素个数.
    ///
    /// 如果 `label` 为 0 或越界, 则程序 panic.
    #[inline]
    pub fn count_of(&self, label: u32) -> usize {
        assert_ne!(label, 0, "背景不是连通域");
        self.counts[label as usize - 1]
    }

    /// 体素最多的连通域标号. 若有并列则取最小标号; 若不存在任何
    /// 连通域则返回 `None`.
    pub fn largest(&self) -> Option<u32> {
        let mut ans = None;
        let mut max_cnt = 0usize;
        for (idx, &cnt) in self.counts.iter().enumerate() {
            if cnt > max_cnt {
                max_cnt = cnt;
                ans = Some(idx as u32 + 1);
            }
        }
        ans
    }

    /// 提取标号为 `label` 的连通域掩膜.
    pub fn mask_of(&self, label: u32) -> VolumeMask {
        VolumeMask::new(self.data.mapv(|l| l == label))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u32, Ix3> {
        self.data.view()
    }
}

/// 对布尔场做 6-连通 (钻石型) 连通域标记. 背景保持标号 0.
pub fn label_components(field: ArrayView3<bool>) -> LabeledVolume {
    let shape = field.dim();
    let mut labels = Array3::<u32>::zeros(shape);
    let mut counts = Vec::with_capacity(4);
    let mut bfs_q = VecDeque::with_capacity(64);

    for (pos, &fg) in field.indexed_iter() {
        if !fg || labels[pos] != 0 {
            continue;
        }
        let label = counts.len() as u32 + 1;
        let mut cnt = 0usize;
        labels[pos] = label;
        bfs_q.push_back(pos);

        while let Some(cur) = bfs_q.pop_front() {
            cnt += 1;
            for neigh in diamond_neighbours(cur, shape) {
                if field[neigh] && labels[neigh] == 0 {
                    labels[neigh] = label;
                    bfs_q.push_back(neigh);
                }
            }
        }
        counts.push(cnt);
    }

    LabeledVolume {
        data: labels,
        counts,
    }
}

/// 获取 `pos` 前后上下左右六个点的坐标.
///
/// 在数据范围外的坐标会被过滤掉, 不会包含在返回值中.
fn diamond_neighbours((z, h, w): Idx3d, (nz, nh, nw): Idx3d) -> impl Iterator<Item = Idx3d> {
    [
        (z.wrapping_sub(1), h, w),
        (z.saturating_add(1), h, w),
        (z, h.wrapping_sub(1), w),
        (z, h.saturating_add(1), w),
        (z, h, w.wrapping_sub(1)),
        (z, h, w.saturating_add(1)),
    ]
    .into_iter()
    .filter(move |&(z0, h0, w0)| z0 < nz && h0 < nh && w0 < nw)
}

#[cfg(test)]
mod tests {
    use super::label_components;
    use ndarray::Array3;

    #[test]
    fn test_two_components() {
        let mut field = Array3::from_elem((1, 4, 4), false);
        // 3 体素的 L 形区域.
        field[(0, 0, 0)] = true;
        field[(0, 0, 1)] = true;
        field[(0, 1, 0)] = true;
        // 孤立单体素 (对角不连通).
        field[(0, 3, 3)] = true;

        let labeled = label_components(field.view());
        assert_eq!(labeled.num_components(), 2);
        assert_eq!(labeled.count_of(1), 3);
        assert_eq!(labeled.count_of(2), 1);
        assert_eq!(labeled.largest(), Some(1));

        let mask = labeled.mask_of(1);
        assert_eq!(mask.count(), 3);
        assert!(mask[(0, 0, 0)] && mask[(0, 0, 1)] && mask[(0, 1, 0)]);
        assert!(!mask[(0, 3, 3)]);
    }

    #[test]
    fn test_diagonal_not_connected() {
        let mut field = Array3::from_elem((1, 2, 2), false);
        field[(0, 0, 0)] = true;
        field[(0, 1, 1)] = true;

        let labeled = label_components(field.view());
        assert_eq!(labeled.num_components(), 2);
    }

    #[test]
    fn test_connected_across_z() {
        let mut field = Array3::from_elem((2, 2, 2), false);
        field[(0, 0, 0)] = true;
        field[(1, 0, 0)] = true;

        let labeled = label_components(field.view());
        assert_eq!(labeled.num_components(), 1);
        assert_eq!(labeled.count_of(1), 2);
    }

    #[test]
    fn test_empty_field() {
        let field = Array3::from_elem((2, 2, 2), false);
        let labeled = label_components(field.view());
        assert_eq!(labeled.num_components(), 0);
        assert_eq!(labeled.largest(), None);
    }
}
