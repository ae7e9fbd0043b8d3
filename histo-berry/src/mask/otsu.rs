//! Otsu 自动阈值.

use ndarray::ArrayView3;
use ordered_float::NotNan;

/// 直方图 bin 个数.
const BINS: usize = 256;

/// 对标量场计算 Otsu 阈值 (最大化类间方差, 假设直方图呈双峰).
///
/// 非有限值 (NaN, inf) 不参与统计. 如果有限值不存在或全部相等
/// (阈值无定义), 则返回 `None`. 返回值为最优切分 bin 的中心值.
pub fn otsu_threshold(values: ArrayView3<f32>) -> Option<f32> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        let v = v as f64;
        min = min.min(v);
        max = max.max(v);
    }
    if !(min < max) {
        return None;
    }

    let width = (max - min) / BINS as f64;
    let mut hist = [0usize; BINS];
    for &v in values.iter().filter(|v| v.is_finite()) {
        let bin = (((v as f64 - min) / width) as usize).min(BINS - 1);
        hist[bin] += 1;
    }

    let total: usize = hist.iter().sum();
    let center = |bin: usize| min + (bin as f64 + 0.5) * width;
    let weighted: f64 = hist
        .iter()
        .enumerate()
        .map(|(bin, &cnt)| cnt as f64 * center(bin))
        .sum();

    // 在 bin t 与 t + 1 之间切分时的类间方差.
    let mut below_cnt = 0usize;
    let mut below_sum = 0.0f64;
    let mut best = (NotNan::new(0.0).unwrap(), 0usize);
    for t in 0..BINS - 1 {
        below_cnt += hist[t];
        below_sum += hist[t] as f64 * center(t);

        let w0 = below_cnt as f64;
        let w1 = (total - below_cnt) as f64;
        if w0 == 0.0 || w1 == 0.0 {
            continue;
        }
        let mu0 = below_sum / w0;
        let mu1 = (weighted - below_sum) / w1;
        let score = w0 * w1 * (mu0 - mu1) * (mu0 - mu1);

        let score = NotNan::new(score).unwrap();
        if score > best.0 {
            best = (score, t);
        }
    }

    Some(center(best.1) as f32)
}
