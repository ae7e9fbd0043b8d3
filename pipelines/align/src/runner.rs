//! 程序运行函数.

use crate::loader;
use histo_berry::prelude::*;
use std::io;
use std::path::Path;

/// 每个切片目录下的预置标记点文件: `(MRI 标记点, 组织学标记点)`.
const LANDMARK_FILE: &str = "landmarks.bin";
/// 拟合出的相似变换的落盘文件名.
const TRANSFORM_FILE: &str = "transform.bin";

/// 实际运行. 逐切片提取组织掩膜; 目录下有预置标记点时继续做
/// 配准与打分.
pub fn run() -> io::Result<()> {
    assert!(
        loader::images_dir_from_env_or_home().is_dir(),
        "图像根目录不存在"
    );

    let slices = loader::slice_loader_from_env_or_home()?;
    log::info!("共发现 {} 个切片目录", slices.len());

    for (dir, slice) in slices {
        match slice {
            Ok(s) => process(&dir, &s),
            Err(e) => log::warn!("跳过 {}: {e}", dir.display()),
        }
    }
    Ok(())
}

fn process(dir: &Path, slice: &BrainSlice) {
    log::info!("处理切片 {}", slice.name());

    let summed = match sum_modalities(slice) {
        Ok(v) => v,
        Err(e) => {
            log::error!("{}: 模态求和失败: {e:?}", slice.name());
            return;
        }
    };
    let pair = match MaskExtractor::default().extract(&summed) {
        Ok(p) => p,
        Err(e) => {
            log::error!("{}: 掩膜提取失败: {e:?}", slice.name());
            return;
        }
    };
    if let Err(e) = pair.roi().save_npy(dir.join("roi_mask.npy")) {
        log::error!("{}: 掩膜写出失败: {e:?}", slice.name());
    }
    if let Err(e) = pair.roi().save_slice_png(dir.join("roi_mask.png"), 0) {
        log::error!("{}: 掩膜预览写出失败: {e:?}", slice.name());
    }

    let landmarks = dir.join(LANDMARK_FILE);
    if !landmarks.is_file() {
        log::info!("{}: 无预置标记点, 跳过配准", slice.name());
        return;
    }
    register_and_score(dir, slice, &summed, &landmarks);
}

fn register_and_score(
    dir: &Path,
    slice: &BrainSlice,
    summed: &MrVolume,
    landmarks: &Path,
) {
    let (mr_points, histo_points): (Vec<Idx2dF>, Vec<Idx2dF>) =
        match load_object(landmarks) {
            Ok(p) => p,
            Err(e) => {
                log::error!("{}: 标记点读取失败: {e:?}", slice.name());
                return;
            }
        };
    let histo = match HistoSlide::open(slice.histo_path()) {
        Ok(h) => h,
        Err(e) => {
            log::error!("{}: 组织学照片读取失败: {e:?}", slice.name());
            return;
        }
    };

    // 参考帧优先取默认参考模态, 没有该模态时退回模态和.
    let reference = slice
        .modality_path(DEFAULT_REF_MODALITY)
        .and_then(|p| MrVolume::open(p).ok());
    let reference = reference.as_ref().unwrap_or(summed);

    let n_points = mr_points.len();
    let mut picker = ScriptedPicker::new([mr_points, histo_points]);
    let transform = match register_histo(
        &histo,
        reference.slice_at(0),
        &mut picker,
        n_points,
    ) {
        Ok((t, _warped)) => t,
        Err(e) => {
            log::error!("{}: 配准失败: {e:?}", slice.name());
            return;
        }
    };
    if let Err(e) = save_object(&transform, dir.join(TRANSFORM_FILE)) {
        log::error!("{}: 变换写出失败: {e:?}", slice.name());
    }

    match compute_ami(slice, &transform) {
        Ok(score) => log::info!("{}: AMI = {score:.6}", slice.name()),
        Err(e) => log::error!("{}: 打分失败: {e:?}", slice.name()),
    }
}
