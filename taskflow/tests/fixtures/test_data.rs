// テストデータ生成

use std::fs;
use std::path::{Path, PathBuf};

/// `count` 個のテキストファイルを作成する。i番目のファイルは i+1 語・1行
pub fn write_word_files(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("words_{i:02}.txt"));
            fs::write(&path, "lorem ".repeat(i + 1).trim_end().to_string() + "\n").unwrap();
            path
        })
        .collect()
}

/// ネストしたディレクトリ構造を作成する
pub fn setup_nested_tree(base_dir: &Path) {
    let subdir1 = base_dir.join("subdir1");
    let subdir2 = base_dir.join("subdir2").join("deeper");
    fs::create_dir_all(&subdir1).unwrap();
    fs::create_dir_all(&subdir2).unwrap();

    fs::write(base_dir.join("top.txt"), "one two three\n").unwrap();
    fs::write(subdir1.join("a.txt"), "alpha\nbeta\n").unwrap();
    fs::write(subdir2.join("b.txt"), "こんにちは 世界\n").unwrap();
}
