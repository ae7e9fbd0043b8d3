use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array2, Array3, ArrayView, ArrayView2, ArrayViewMut, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Idx2d, Idx3d};

mod compact;
mod save;

pub use compact::CompactMask;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组. 二维文件的 z 记为 1.
    let [_, w, h, z, ..] = h.dim;
    (z.max(1) as usize, h as usize, w as usize)
}

/// nii 格式 3D 体数据文件 header 的共用属性和部分通用操作.
pub trait VolumeMeta {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素分辨率, 以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }
}

/// nii 格式 MRI 体数据, 包括 header 和标量强度场. 强度值以 `f32` 保存.
///
/// 本实验的组织学配对 MRI 多为单切片 (z = 1) 文件,
/// 但该结构同样可以容纳常规多切片体数据.
#[derive(Debug, Clone)]
pub struct MrVolume {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl VolumeMeta for MrVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for MrVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for MrVolume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl MrVolume {
    /// 打开 nii 文件格式的 MRI 体数据. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        let mut data = obj.into_volume().into_ndarray::<f32>()?;
        // 二维文件补一个平凡的 z 轴.
        if data.ndim() == 2 {
            data = data.insert_axis(Axis(2));
        }

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = data.permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<f32>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 根据裸数据和体素分辨率直接创建 `MrVolume` 实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照 \[z, height, width\] 格式存储.
    /// 2. `pix_dim` 按照 \[z, height, width\] 格式存储, 单位为毫米.
    ///
    /// # 注意
    ///
    /// 该方法可能会创建不一致的实体, 因此你应仅将其用于实验目的.
    pub fn fake(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        let (z, h, w) = data.dim();

        let mut header = Box::<NiftiHeader>::default();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
        let [pz, ph, pw] = pix_dim;
        header.pixdim = [1.0, pw, ph, pz, 1.0, 1.0, 1.0, 1.0];
        header.intent_name[..4].copy_from_slice(b"fake");

        Self { header, data }
    }

    /// 判断该结构是否是由 `fake` 方法手动拼接的.
    pub fn is_faked(&self) -> bool {
        self.header.intent_name.starts_with(b"fake")
    }

    /// 获取体数据 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }

    /// 将另一体数据逐体素累加到 `self`. 非有限值 (NaN, inf) 记 0.
    ///
    /// 如果两者形状不一致, 则程序 panic.
    pub fn add_assign_finite(&mut self, rhs: &MrVolume) {
        assert_eq!(self.data.dim(), rhs.data.dim(), "体数据形状不一致");
        for (acc, &v) in self.data.iter_mut().zip(rhs.data.iter()) {
            if v.is_finite() {
                *acc += v;
            }
        }
    }

    /// 将 `self` 中所有非有限值 (NaN, inf) 置 0.
    pub fn zero_non_finite(&mut self) {
        self.data
            .iter_mut()
            .filter(|v| !v.is_finite())
            .for_each(|v| *v = 0.0);
    }
}

/// 脑切片组织学照片. 像素以 RGB 三通道 `u8` 保存, 形状为 \[height, width, 3\].
#[derive(Debug, Clone)]
pub struct HistoSlide {
    data: Array3<u8>,
}

impl HistoSlide {
    /// 打开常规光栅格式 (png, tiff 等) 的组织学照片.
    pub fn open<P: AsRef<Path>>(path: P) -> image::ImageResult<Self> {
        let img = image::open(path.as_ref())?.to_rgb8();
        let (width, height) = img.dimensions();
        let data = Array3::from_shape_fn((height as usize, width as usize, 3), |(h, w, c)| {
            img.get_pixel(w as u32, h as u32).0[c]
        });
        Ok(Self { data })
    }

    /// 由 \[height, width, 3\] 格式的裸数据直接创建实体. 仅用于实验目的.
    ///
    /// 如果最后一维不是 3, 则程序 panic.
    pub fn fake(data: Array3<u8>) -> Self {
        assert_eq!(data.dim().2, 3, "组织学照片必须是 RGB 三通道");
        Self { data }
    }

    /// 图像形状 (height, width).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let (h, w, _) = self.data.dim();
        (h, w)
    }

    /// 按三通道均值转换为灰度图.
    pub fn grayscale(&self) -> Array2<f64> {
        let (h, w) = self.shape();
        Array2::from_shape_fn((h, w), |(i, j)| {
            (0..3).map(|c| self.data[(i, j, c)] as f64).sum::<f64>() / 3.0
        })
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }
}

/// 体数据上的布尔掩膜. `true` 为前景 (组织), `false` 为背景.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMask {
    data: Array3<bool>,
}

impl Index<Idx3d> for VolumeMask {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl VolumeMask {
    /// 由裸布尔数据 (\[z, height, width\]) 创建掩膜.
    #[inline]
    pub fn new(data: Array3<bool>) -> Self {
        Self { data }
    }

    /// 创建给定形状的全背景掩膜.
    #[inline]
    pub fn zeros(shape: Idx3d) -> Self {
        Self {
            data: Array3::from_elem(shape, false),
        }
    }

    /// 掩膜形状 (z, height, width).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 前景体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 前景包围盒, 闭区间 \[(z0, h0, w0), (z1, h1, w1)\].
    /// 如果掩膜为全背景, 则返回 `None`.
    pub fn bounding_box(&self) -> Option<(Idx3d, Idx3d)> {
        let mut lo = (usize::MAX, usize::MAX, usize::MAX);
        let mut hi = (0usize, 0usize, 0usize);
        let mut any = false;
        for ((z, h, w), &p) in self.data.indexed_iter() {
            if p {
                any = true;
                lo = (lo.0.min(z), lo.1.min(h), lo.2.min(w));
                hi = (hi.0.max(z), hi.1.max(h), hi.2.max(w));
            }
        }
        any.then_some((lo, hi))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, bool, Ix3> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<bool> {
        self.data
    }
}
