//! 闭合多边形的扫描线栅格化.
//!
//! 坐标采用索引约定 `(i, j)` 即 `(行, 列)`, 顶点允许非整数.
//! 先把顶点平移到包围盒原点, 在截断为整数的包围盒内做奇偶规则
//! 扫描填充 (边界像素计入前景), 最后把索引平移回原坐标系并
//! 补偿包围盒取整产生的亚像素偏差.

use crate::Idx2dF;
use itertools::Itertools;

/// 扫描线 `i = row` 与各边的交点列 (奇偶规则, 边在 i 方向半开).
fn scanline_hits(vertices: &[Idx2dF], row: f64) -> Vec<f64> {
    let mut hits = Vec::new();
    for k in 0..vertices.len() {
        let (i1, j1) = vertices[k];
        let (i2, j2) = vertices[(k + 1) % vertices.len()];
        if i1 == i2 {
            continue;
        }
        let (lo, hi) = if i1 < i2 { (i1, i2) } else { (i2, i1) };
        if lo <= row && row < hi {
            hits.push(j1 + (row - i1) * (j2 - j1) / (i2 - i1));
        }
    }
    hits.sort_by(|a, b| a.partial_cmp(b).expect("交点坐标必须可比较"));
    hits
}

/// 栅格化填充多边形, 返回前景像素的 `(行索引, 列索引)` 两个平行序列.
///
/// 输出按行主序排列, 索引已还原到输入坐标系 (撤销包围盒偏移并
/// 修正其取整误差). 包围盒某一轴长度截断后为 0 时返回空序列.
pub fn polygon_mask_indices(vertices: &[Idx2dF]) -> (Vec<i64>, Vec<i64>) {
    assert!(vertices.len() >= 3, "多边形至少需要 3 个顶点");

    let fold = |init: Idx2dF, pick: fn(f64, f64) -> f64| {
        vertices
            .iter()
            .fold(init, |(i, j), &(vi, vj)| (pick(i, vi), pick(j, vj)))
    };
    let (min_i, min_j) = fold((f64::INFINITY, f64::INFINITY), f64::min);
    let (max_i, max_j) = fold((f64::NEG_INFINITY, f64::NEG_INFINITY), f64::max);

    // 包围盒尺寸截断为整数, 记录截断损失的小数部分.
    let rows = (max_i - min_i) as i64;
    let cols = (max_j - min_j) as i64;
    let eps_i = rows as f64 - (max_i - min_i);
    let eps_j = cols as f64 - (max_j - min_j);
    if rows <= 0 || cols <= 0 {
        return (Vec::new(), Vec::new());
    }

    let shifted: Vec<Idx2dF> = vertices
        .iter()
        .map(|&(i, j)| (i - min_i, j - min_j))
        .collect();

    let (mut out_i, mut out_j) = (Vec::new(), Vec::new());
    for r in 0..rows {
        let hits = scanline_hits(&shifted, r as f64);
        for (xa, xb) in hits.into_iter().tuples() {
            let from = xa.ceil().max(0.0) as i64;
            let to = (xb.floor() as i64).min(cols - 1);
            for c in from..=to {
                out_i.push((r as f64 + min_i - eps_i) as i64);
                out_j.push((c as f64 + min_j - eps_j) as i64);
            }
        }
    }
    (out_i, out_j)
}

#[cfg(test)]
mod tests {
    use super::polygon_mask_indices;

    #[test]
    fn test_unit_square() {
        let square = [(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)];
        let (rows, cols) = polygon_mask_indices(&square);
        assert_eq!(rows, vec![0, 0, 1, 1]);
        assert_eq!(cols, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_fractional_vertices() {
        // 顶点落在半像素处: 包围盒尺寸仍为 2x2, 索引截断回原坐标系.
        let square = [(0.5, 0.5), (0.5, 2.5), (2.5, 2.5), (2.5, 0.5)];
        let (rows, cols) = polygon_mask_indices(&square);
        assert_eq!(rows, vec![0, 0, 1, 1]);
        assert_eq!(cols, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_right_triangle() {
        let triangle = [(0.0, 0.0), (0.0, 4.0), (4.0, 0.0)];
        let (rows, cols) = polygon_mask_indices(&triangle);
        assert_eq!(rows.len(), cols.len());

        let has = |r: i64, c: i64| {
            rows.iter().zip(&cols).any(|(&i, &j)| i == r && j == c)
        };
        // 斜边下方为前景, 上方为背景.
        assert!(has(1, 1));
        assert!(has(0, 0));
        assert!(!has(3, 3));
        // 全部索引落在包围盒内.
        assert!(rows.iter().all(|&i| (0..4).contains(&i)));
        assert!(cols.iter().all(|&j| (0..4).contains(&j)));
    }

    #[test]
    fn test_row_major_order() {
        let square = [(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0)];
        let (rows, _) = polygon_mask_indices(&square);
        assert!(rows.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_degenerate_box_is_empty() {
        let sliver = [(0.0, 0.0), (0.0, 5.0), (0.9, 5.0), (0.9, 0.0)];
        let (rows, cols) = polygon_mask_indices(&sliver);
        assert!(rows.is_empty() && cols.is_empty());
    }
}
