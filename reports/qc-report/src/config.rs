//! 从环境变量读取的运行配置.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use qc_berry::consts::{DEFAULT_FD_RADIUS, DEFAULT_MOSAIC_COLUMNS};
use qc_berry::dataset;

/// 批处理配置.
#[derive(Clone, Debug)]
pub struct Config {
    /// 数据集根目录.
    pub dataset_dir: PathBuf,

    /// 输出目录. 每个受试者一个子目录.
    pub output_dir: PathBuf,

    /// FD 计算使用的头部半径 (毫米).
    pub fd_radius: f64,

    /// 拼图列数.
    pub columns: usize,

    /// 日志级别.
    pub log_level: LevelFilter,
}

/// 读取 `key`. 未设置时返回 `default`, 无法解析时返回错误说明.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| format!("cannot parse ${key}=`{v}`")),
        Err(_) => Ok(default),
    }
}

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$QC_DATASET_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/qc`.
pub fn dataset_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("QC_DATASET_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(["qc"]),
    }
}

impl Config {
    /// 读取 `$QC_DATASET_DIR`, `$QC_OUTPUT_DIR`, `$QC_FD_RADIUS`, `$QC_COLUMNS` 和 `$QC_LOG`.
    pub fn from_env() -> Result<Self, String> {
        let dataset_dir = dataset_dir_from_env_or_home()
            .ok_or_else(|| "cannot locate home directory; set $QC_DATASET_DIR".to_string())?;
        let output_dir = env_or("QC_OUTPUT_DIR", PathBuf::from("qc-report"))?;
        let fd_radius: f64 = env_or("QC_FD_RADIUS", DEFAULT_FD_RADIUS)?;
        if !(fd_radius.is_finite() && fd_radius > 0.0) {
            return Err(format!("$QC_FD_RADIUS must be positive, got {fd_radius}"));
        }
        let columns: usize = env_or("QC_COLUMNS", DEFAULT_MOSAIC_COLUMNS)?;
        if columns == 0 {
            return Err("$QC_COLUMNS must be positive".to_string());
        }
        let log_level = env_or("QC_LOG", LevelFilter::Info)?;

        Ok(Self {
            dataset_dir,
            output_dir,
            fd_radius,
            columns,
            log_level,
        })
    }
}
