//! 数据集目录约定.
//!
//! 批处理程序按受试者组织输入:
//!
//! ```text
//! {根目录}/
//!     sub-01/
//!         anat.nii.gz         三维结构像
//!         motion.par          6 列运动参数 (可选)
//!         segmentation.nii.gz 分割结果 (可选)
//!         background.json     背景噪声拟合结果 (可选)
//!     sub-02/
//!     ...
//! ```

use std::path::{Path, PathBuf};

/// 结构像文件名 (不含扩展名).
pub const ANAT_STEM: &str = "anat";

/// 分割文件名 (不含扩展名).
pub const SEGMENTATION_STEM: &str = "segmentation";

/// 运动参数文件名.
pub const MOTION_FILE: &str = "motion.par";

/// 背景噪声拟合结果文件名.
pub const BACKGROUND_FILE: &str = "background.json";

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    home_dataset_dir_with::<&str, _>([])
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 单个受试者目录中的文件.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectFiles {
    /// 受试者标识, 即目录名.
    pub id: String,

    /// 结构像.
    pub anat: PathBuf,

    /// 运动参数.
    pub motion: Option<PathBuf>,

    /// 分割结果.
    pub segmentation: Option<PathBuf>,

    /// 背景噪声拟合结果.
    pub background: Option<PathBuf>,
}

/// 按 `.nii.gz`, `.nii` 的顺序查找 `dir/{stem}.*`.
fn find_nifti(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["nii.gz", "nii"]
        .into_iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}

#[inline]
fn existing(p: PathBuf) -> Option<PathBuf> {
    p.is_file().then_some(p)
}

impl SubjectFiles {
    /// 扫描一个受试者目录. 缺少结构像时返回 `None`.
    pub fn scan<P: AsRef<Path>>(dir: P) -> Option<Self> {
        let dir = dir.as_ref();
        let id = dir.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            id,
            anat: find_nifti(dir, ANAT_STEM)?,
            motion: existing(dir.join(MOTION_FILE)),
            segmentation: find_nifti(dir, SEGMENTATION_STEM),
            background: existing(dir.join(BACKGROUND_FILE)),
        })
    }
}

/// 列出 `root` 下所有包含结构像的受试者目录, 按目录名排序.
pub fn subjects<P: AsRef<Path>>(root: P) -> std::io::Result<Vec<SubjectFiles>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root.as_ref())?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs.into_iter().filter_map(SubjectFiles::scan).collect())
}
