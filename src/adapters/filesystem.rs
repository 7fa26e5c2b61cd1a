use crate::domain::model::{ProjectDocumentIndex, ResolvedDocument};
use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

pub const DEFAULT_BUCKET_SIZE: i64 = 500;
pub const DEFAULT_SUBFOLDER: &str = "A. Contractual items";

static DMP_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+-[A-Za-z]+_v\d+\.\d+-data-management-plan\.docx$")
        .expect("DMP filename pattern is valid")
});

/// 專案編號對應到共用資料夾中的 DMP 文件
#[derive(Debug, Clone)]
pub struct ProjectDirectoryResolver {
    root: PathBuf,
    bucket_size: i64,
    subfolder: String,
}

impl ProjectDirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bucket_size: DEFAULT_BUCKET_SIZE,
            subfolder: DEFAULT_SUBFOLDER.to_string(),
        }
    }

    pub fn with_layout(mut self, bucket_size: i64, subfolder: impl Into<String>) -> Self {
        self.bucket_size = bucket_size.max(1);
        self.subfolder = subfolder.into();
        self
    }

    /// 專案編號向下取到 bucket 的倍數
    pub fn bucket(&self, project_number: i64) -> i64 {
        project_number - project_number.rem_euclid(self.bucket_size)
    }

    /// `<root>/<bucket>/<id>/<subfolder>`
    pub fn project_dir(&self, project_number: i64) -> PathBuf {
        self.root
            .join(self.bucket(project_number).to_string())
            .join(project_number.to_string())
            .join(&self.subfolder)
    }

    /// 找不到文件不是錯誤，回傳 `None`
    pub fn resolve(&self, project_number: i64) -> Option<ResolvedDocument> {
        let dir = self.project_dir(project_number);
        let path = find_matching_docx(&dir)?;
        tracing::debug!("Project {}: found {}", project_number, path.display());
        Some(describe(path))
    }

    pub fn resolve_all(&self, project_numbers: impl IntoIterator<Item = i64>) -> ProjectDocumentIndex {
        let mut index = ProjectDocumentIndex::new();
        for project_number in project_numbers {
            if index.contains_key(&project_number) {
                continue;
            }
            match self.resolve(project_number) {
                Some(document) => {
                    index.insert(project_number, document);
                }
                None => tracing::debug!("Project {}: no DMP found", project_number),
            }
        }
        index
    }
}

pub fn is_dmp_filename(name: &str) -> bool {
    DMP_FILENAME.is_match(name)
}

/// 先看目前資料夾的檔案，再依名稱順序進入子資料夾；第一個符合的檔案勝出。
/// 指向檔案的連結視為檔案，指向資料夾的連結不進入
pub fn find_matching_docx(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_symlink() && path.is_dir() {
            // 不跟隨指向資料夾的連結，避免循環
            tracing::debug!("Skipping symlinked directory {}", path.display());
        } else {
            files.push(path);
        }
    }
    files.sort();
    subdirs.sort();

    files
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(is_dmp_filename)
        })
        .or_else(|| subdirs.iter().find_map(|sub| find_matching_docx(sub)))
}

fn local_time(time: std::io::Result<SystemTime>) -> Option<NaiveDateTime> {
    time.ok()
        .map(|t| DateTime::<Local>::from(t).naive_local())
}

fn describe(path: PathBuf) -> ResolvedDocument {
    let (date_created, date_modified) = match std::fs::metadata(&path) {
        Ok(meta) => (local_time(meta.created()), local_time(meta.modified())),
        Err(e) => {
            tracing::warn!("Could not read timestamps of {}: {}", path.display(), e);
            (None, None)
        }
    };
    ResolvedDocument {
        path,
        date_created,
        date_modified,
    }
}
