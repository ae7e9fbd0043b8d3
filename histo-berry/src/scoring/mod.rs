//! 配准质量打分.
//!
//! 将全部模态体数据逐体素求和 (NaN 记 0), 把组织学灰度图按给定
//! 相似变换重采样到体数据帧, 再对两侧取整后的强度序列计算
//! 调整互信息 (adjusted mutual information, 对偶然一致性做了修正).

mod error;

pub use error::{ScoreError, ScoreResult};

use crate::dataset::BrainSlice;
use crate::registration::{warp, SimilarityTransform};
use crate::{HistoSlide, MrVolume, VolumeMeta};
use std::collections::HashMap;

/// 逐体素累加一组体数据, 非有限值按 0 处理.
fn sum_volumes<I>(volumes: I) -> ScoreResult<MrVolume>
where
    I: IntoIterator<Item = MrVolume>,
{
    let mut iter = volumes.into_iter();
    let mut acc = iter
        .next()
        .expect("至少需要一个模态");
    acc.zero_non_finite();
    for v in iter {
        if v.shape() != acc.shape() {
            return Err(ScoreError::ModalityShapeMismatch {
                expected: acc.shape(),
                found: v.shape(),
            });
        }
        acc.add_assign_finite(&v);
    }
    Ok(acc)
}

/// 获取切片全部模态的逐体素和.
///
/// 每个模态现场从磁盘加载, 首个模态决定形状与头信息.
pub fn sum_modalities(slice: &BrainSlice) -> ScoreResult<MrVolume> {
    let mut loaded = Vec::with_capacity(slice.modality_len());
    for (modality, path) in slice.modalities() {
        log::debug!("加载模态 {modality}: {}", path.display());
        loaded.push(MrVolume::open(path)?);
    }
    sum_volumes(loaded)
}

/// 列联表: 行对应 `u` 的标签, 列对应 `v` 的标签.
struct Contingency {
    cells: HashMap<(usize, usize), usize>,
    row_sums: Vec<usize>,
    col_sums: Vec<usize>,
    total: usize,
}

impl Contingency {
    fn build(u: &[i64], v: &[i64]) -> Self {
        let mut row_index = HashMap::new();
        let mut col_index = HashMap::new();
        let mut cells: HashMap<(usize, usize), usize> = HashMap::new();
        let mut row_sums = Vec::new();
        let mut col_sums = Vec::new();
        for (&a, &b) in u.iter().zip(v) {
            let next = row_index.len();
            let i = *row_index.entry(a).or_insert(next);
            if i == row_sums.len() {
                row_sums.push(0);
            }
            let next = col_index.len();
            let j = *col_index.entry(b).or_insert(next);
            if j == col_sums.len() {
                col_sums.push(0);
            }
            row_sums[i] += 1;
            col_sums[j] += 1;
            *cells.entry((i, j)).or_insert(0) += 1;
        }
        Self {
            cells,
            row_sums,
            col_sums,
            total: u.len(),
        }
    }

    /// 互信息 (自然对数).
    fn mutual_info(&self) -> f64 {
        let n = self.total as f64;
        self.cells
            .iter()
            .map(|(&(i, j), &nij)| {
                let nij = nij as f64;
                let (a, b) = (self.row_sums[i] as f64, self.col_sums[j] as f64);
                nij / n * (n * nij / (a * b)).ln()
            })
            .sum()
    }

    fn entropy(sums: &[usize], total: usize) -> f64 {
        let n = total as f64;
        sums.iter()
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.ln()
            })
            .sum()
    }

    /// 随机划分下互信息的期望值 (超几何模型).
    fn expected_mutual_info(&self) -> f64 {
        let n = self.total;
        // ln(k!) 前缀表, ln_fact[k] = ln(k!).
        let mut ln_fact = vec![0.0_f64; n + 1];
        for k in 1..=n {
            ln_fact[k] = ln_fact[k - 1] + (k as f64).ln();
        }
        let nf = n as f64;

        let mut emi = 0.0;
        for &a in &self.row_sums {
            for &b in &self.col_sums {
                let lo = 1.max((a + b).saturating_sub(n));
                let hi = a.min(b);
                for nij in lo..=hi {
                    let nij_f = nij as f64;
                    let info =
                        nij_f / nf * (nf * nij_f / (a as f64 * b as f64)).ln();
                    // nij 在给定行列和下的超几何概率.
                    let ln_p = ln_fact[a] + ln_fact[b] + ln_fact[n - a]
                        + ln_fact[n - b]
                        - ln_fact[n]
                        - ln_fact[nij]
                        - ln_fact[a - nij]
                        - ln_fact[b - nij]
                        - ln_fact[n - a - b + nij];
                    emi += info * ln_p.exp();
                }
            }
        }
        emi
    }
}

/// 计算两个标签序列的调整互信息.
///
/// 结果约在 `[0, 1]` 内: 完全一致 (允许标签重命名) 为 1,
/// 相互独立的划分期望为 0, 差于偶然时可为负.
///
/// # 注意
///
/// 两序列必须非空且等长, 否则程序 panic.
pub fn adjusted_mutual_info(u: &[i64], v: &[i64]) -> f64 {
    assert_eq!(u.len(), v.len(), "标签序列长度不一致");
    assert!(!u.is_empty(), "标签序列不能为空");

    let table = Contingency::build(u, v);
    // 双方都只有一个簇时视为完全一致.
    if table.row_sums.len() == 1 && table.col_sums.len() == 1 {
        return 1.0;
    }

    let mi = table.mutual_info();
    let emi = table.expected_mutual_info();
    let h_mean =
        (Contingency::entropy(&table.row_sums, table.total)
            + Contingency::entropy(&table.col_sums, table.total))
            / 2.0;

    let denominator = h_mean - emi;
    // 避免除零, 同时保留符号.
    let denominator = if denominator < 0.0 {
        denominator.min(-f64::EPSILON)
    } else {
        denominator.max(f64::EPSILON)
    };
    (mi - emi) / denominator
}

/// 对已在内存中的 (求和体数据, 组织学照片, 变换) 三元组打分.
///
/// 组织学灰度图按 `transform` 重采样到体数据切片帧, 两侧整数截断后
/// 计算调整互信息.
///
/// # 返回值
///
/// 体数据不是单切片时返回 [`ScoreError::ShapeMismatch`].
pub fn score_alignment(
    summed: &MrVolume,
    histo: &HistoSlide,
    transform: &SimilarityTransform,
) -> ScoreResult<f64> {
    let (z, h, w) = summed.shape();
    let grayscale = histo.grayscale();
    let warped = warp(grayscale.view(), transform, (h, w));
    if z != 1 {
        return Err(ScoreError::ShapeMismatch {
            warped: (h, w),
            volume: summed.shape(),
        });
    }

    let u: Vec<i64> = warped.iter().map(|&v| v as i64).collect();
    let v: Vec<i64> = summed.data().iter().map(|&x| x as i64).collect();
    Ok(adjusted_mutual_info(&u, &v))
}

/// 配准打分主入口.
///
/// 流程: 求和全部模态 -> 加载组织学照片 -> [`score_alignment`].
pub fn compute_ami(
    slice: &BrainSlice,
    transform: &SimilarityTransform,
) -> ScoreResult<f64> {
    let summed = sum_modalities(slice)?;
    let histo = HistoSlide::open(slice.histo_path())?;
    let score = score_alignment(&summed, &histo, transform)?;
    log::info!("切片 {} 的调整互信息: {score:.6}", slice.name());
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::{adjusted_mutual_info, score_alignment, sum_volumes, ScoreError};
    use crate::registration::SimilarityTransform;
    use crate::{HistoSlide, MrVolume};
    use ndarray::Array3;

    #[test]
    fn test_ami_identical_labels() {
        let u = [0, 0, 1, 1, 2, 2, 3, 3];
        let score = adjusted_mutual_info(&u, &u);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ami_relabeling_is_perfect() {
        // 标签重命名不影响划分.
        let u = [0, 0, 1, 1, 2, 2];
        let v = [7, 7, 3, 3, -5, -5];
        let score = adjusted_mutual_info(&u, &v);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ami_independent_partitions() {
        // 周期 2 与周期 4 的标签在 n = 40 上完全独立, 互信息为 0,
        // 调整后得分接近 0 (可略为负).
        let u: Vec<i64> = (0..40).map(|i| i % 2).collect();
        let v: Vec<i64> = (0..40).map(|i| (i / 2) % 2).collect();
        let score = adjusted_mutual_info(&u, &v);
        assert!(score.abs() < 0.05, "独立划分的得分应接近 0: {score}");
    }

    #[test]
    fn test_ami_single_cluster_both_sides() {
        assert_eq!(adjusted_mutual_info(&[1, 1, 1], &[9, 9, 9]), 1.0);
    }

    #[test]
    #[should_panic]
    fn test_ami_length_mismatch() {
        adjusted_mutual_info(&[0, 1], &[0]);
    }

    #[test]
    fn test_sum_volumes_zeroes_nan() {
        let mut a = Array3::from_elem((1, 2, 2), 1.0_f32);
        a[(0, 0, 0)] = f32::NAN;
        let mut b = Array3::from_elem((1, 2, 2), 2.0_f32);
        b[(0, 1, 1)] = f32::INFINITY;

        let sum = sum_volumes([
            MrVolume::fake(a, [1.0; 3]),
            MrVolume::fake(b, [1.0; 3]),
        ])
        .unwrap();
        assert_eq!(sum[(0, 0, 0)], 2.0);
        assert_eq!(sum[(0, 0, 1)], 3.0);
        assert_eq!(sum[(0, 1, 1)], 1.0);
    }

    #[test]
    fn test_score_alignment_rejects_multi_slice() {
        let summed = MrVolume::fake(Array3::zeros((2, 8, 8)), [1.0; 3]);
        let histo = HistoSlide::fake(Array3::zeros((8, 8, 3)));

        let err = score_alignment(&summed, &histo, &SimilarityTransform::identity())
            .unwrap_err();
        assert!(matches!(
            err,
            ScoreError::ShapeMismatch {
                warped: (8, 8),
                volume: (2, 8, 8),
            }
        ));
    }

    #[test]
    fn test_score_alignment_identity_pair() {
        // 组织学灰度与体数据强度逐像素相同, 恒等变换下 AMI 为 1.
        let histo = HistoSlide::fake(Array3::from_shape_fn(
            (8, 8, 3),
            |(r, c, _)| ((r + c) % 3 * 10) as u8,
        ));
        let summed = MrVolume::fake(
            Array3::from_shape_fn((1, 8, 8), |(_, r, c)| ((r + c) % 3 * 10) as f32),
            [1.0; 3],
        );

        let score =
            score_alignment(&summed, &histo, &SimilarityTransform::identity())
                .unwrap();
        assert!((score - 1.0).abs() < 1e-9, "完全一致的标签应得满分: {score}");
    }

    #[test]
    fn test_sum_volumes_shape_mismatch() {
        let a = MrVolume::fake(Array3::zeros((1, 2, 2)), [1.0; 3]);
        let b = MrVolume::fake(Array3::zeros((1, 3, 3)), [1.0; 3]);
        assert!(sum_volumes([a, b]).is_err());
    }
}
