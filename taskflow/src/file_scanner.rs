use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 入力パスの走査
pub struct FileScanner;

impl FileScanner {
    /// ディレクトリ配下の全ファイルをパス順に返す
    pub fn scan_directory(directory: &Path) -> io::Result<Vec<PathBuf>> {
        let mut file_paths = Vec::new();

        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = entry?;

            if entry.file_type().is_file() {
                file_paths.push(entry.into_path());
            }
        }

        Ok(file_paths)
    }

    /// 標準入力を表すパスか
    pub fn is_stdin(path: &Path) -> bool {
        path.as_os_str() == "-"
    }
}
