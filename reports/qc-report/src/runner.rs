//! 程序运行函数.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use qc_berry::figures::{plot_bg_dist, plot_fd, plot_segmentation, SegmentationOptions};
use qc_berry::motion::par_mean_fd_distribution;
use qc_berry::prelude::*;

use crate::config::Config;
use crate::result::{ReportResult, SubjectOutcome};

/// 获得可并行核心数.
fn cpus() -> usize {
    thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 处理单个受试者, 返回写出的文件.
fn process_subject(
    renderer: &mut SvgRenderer,
    subject: &dataset::SubjectFiles,
    group_fd: Option<&[f64]>,
    config: &Config,
) -> VizResult<Vec<PathBuf>> {
    let out_dir = config.output_dir.join(&subject.id);
    fs::create_dir_all(&out_dir)?;
    let mut written = Vec::with_capacity(5);
    let mut save = |doc: Document, name: &str| -> VizResult<()> {
        let p = out_dir.join(name);
        doc.save(&p)?;
        written.push(p);
        Ok(())
    };

    let anat = Volume::open(&subject.anat)?;

    let doc = render_mosaic(
        renderer,
        anat.clone(),
        MosaicOptions {
            columns: config.columns,
            title: Some(subject.id.clone()),
            ..Default::default()
        },
    )?;
    save(doc, "anat_mosaic.svg")?;

    let doc = render_mosaic(
        renderer,
        anat.clone(),
        MosaicOptions {
            columns: config.columns,
            mode: WindowMode::Noise,
            colormap: Colormap::Parula,
            title: Some(format!("{} (noise)", subject.id)),
            ..Default::default()
        },
    )?;
    save(doc, "anat_noise.svg")?;

    if let Some(motion) = &subject.motion {
        save(plot_fd(motion, config.fd_radius, group_fd)?, "fd.svg")?;
    }

    if let Some(seg) = &subject.segmentation {
        let options = SegmentationOptions {
            title: Some(format!("{} segmentation", subject.id)),
            ..Default::default()
        };
        let doc = plot_segmentation(renderer, anat, seg.as_path(), &options)?;
        save(doc, "segmentation.svg")?;
    }

    if let Some(bg) = &subject.background {
        save(plot_bg_dist(bg)?, "background_fit.svg")?;
    }

    Ok(written)
}

/// 组内平均 FD 分布. 出错时只记录警告.
fn group_fd_distribution(subjects: &[dataset::SubjectFiles], radius: f64) -> Option<Vec<f64>> {
    let paths: Vec<&Path> = subjects.iter().filter_map(|s| s.motion.as_deref()).collect();
    if paths.is_empty() {
        return None;
    }
    match par_mean_fd_distribution(&paths, radius) {
        Ok((means, _)) => Some(means),
        Err(e) => {
            log::warn!("group FD distribution unavailable: {e}");
            None
        }
    }
}

/// 实际运行.
pub fn run(config: &Config) -> Result<ReportResult, String> {
    let subjects = dataset::subjects(&config.dataset_dir)
        .map_err(|e| format!("{}: {e}", config.dataset_dir.display()))?;
    log::info!(
        "{} subject(s) found under {}",
        subjects.len(),
        config.dataset_dir.display()
    );

    let group_fd = group_fd_distribution(&subjects, config.fd_radius);
    let group_fd = group_fd.as_deref();
    let workers = cpus().min(subjects.len()).max(1);

    let outcomes = thread::scope(|s| {
        let subjects = &subjects;
        let handles: Vec<_> = (0..workers)
            .map(|w| {
                s.spawn(move || {
                    // 每个工作线程持有独立的后端.
                    let mut renderer = SvgRenderer::new(RendererConfig::default());
                    subjects
                        .iter()
                        .skip(w)
                        .step_by(workers)
                        .map(|subject| {
                            log::info!("[worker {w}] processing {}", subject.id);
                            let files = process_subject(&mut renderer, subject, group_fd, config)
                                .map_err(|e| {
                                    log::error!("{}: {e}", subject.id);
                                    e.to_string()
                                });
                            SubjectOutcome {
                                id: subject.id.clone(),
                                files,
                            }
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().expect("Thread joining error"))
            .collect::<ReportResult>()
    });

    Ok(outcomes)
}
