//! 批处理结果.

use std::io::{self, Write};
use std::path::PathBuf;

const SEP: &str = "--------------------------------------------------------";

/// 单个受试者的处理结果.
#[derive(Debug)]
pub struct SubjectOutcome {
    /// 受试者标识.
    pub id: String,

    /// 成功时为写出的文件, 失败时为错误说明.
    pub files: Result<Vec<PathBuf>, String>,
}

/// 将 `outcome` 写进 `w` 中.
fn describe_into<W: Write>(outcome: &SubjectOutcome, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    match &outcome.files {
        Ok(files) => {
            writeln!(w, "Subject `{}`: ok, {} figure(s)", outcome.id, files.len())?;
            for f in files {
                writeln!(w, "{S4}{}", f.display())?;
            }
        }
        Err(e) => writeln!(w, "Subject `{}`: FAILED\n{S4}{e}", outcome.id)?,
    }
    Ok(())
}

/// 整个批次的结果.
pub struct ReportResult {
    data: Vec<SubjectOutcome>,
}

impl FromIterator<SubjectOutcome> for ReportResult {
    fn from_iter<I: IntoIterator<Item = SubjectOutcome>>(it: I) -> Self {
        let mut data: Vec<_> = it.into_iter().collect();
        data.sort_by(|a, b| a.id.cmp(&b.id));
        Self { data }
    }
}

impl ReportResult {
    /// 失败的受试者个数.
    pub fn failures(&self) -> usize {
        self.data.iter().filter(|o| o.files.is_err()).count()
    }

    /// 打印运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut w = stdout.lock();

        writeln!(w, "{SEP}")?;
        for outcome in self.data.iter() {
            describe_into(outcome, &mut w)?;
            writeln!(w, "{SEP}")?;
        }
        writeln!(
            w,
            "{} subject(s), {} failed",
            self.data.len(),
            self.failures()
        )?;
        Ok(())
    }
}
