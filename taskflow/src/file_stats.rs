// FileStats - 行・単語・バイト・文字数の集計
// wcサブコマンドの各タスクが1ファイル分を計算する

use std::fmt::Write as _;
use std::io::{self, BufRead, BufReader, Read};
use std::ops::AddAssign;
use std::path::Path;

/// 1ファイル（または合計）の統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    pub lines: usize,
    pub words: usize,
    pub bytes: usize,
    pub chars: usize,
}

impl FileStats {
    /// 改行を含めて1行ずつ読み、統計を計算する
    ///
    /// 末尾の改行なしの行も1行として数える。
    /// 文字数はUnicodeスカラー値の数で、不正なUTF-8は置換文字として数える。
    pub fn from_reader<R: Read>(reader: R) -> io::Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut stats = Self::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }

            let text = String::from_utf8_lossy(&line);
            stats.lines += 1;
            stats.words += text.split_whitespace().count();
            stats.chars += text.chars().count();
            stats.bytes += read;
        }

        Ok(stats)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        // スライスからの読み込みは失敗しない
        Self::from_reader(bytes).unwrap_or_default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// 選択された項目を `%3d` 幅で並べ、ラベルを付ける（`-` と空文字は付けない）
    pub fn format(&self, options: &CountOptions, label: &str) -> String {
        let options = options.effective();
        let mut output = String::new();
        let columns = [
            (options.lines, self.lines),
            (options.words, self.words),
            (options.bytes, self.bytes),
            (options.chars, self.chars),
        ];
        for (_, count) in columns.iter().filter(|(enabled, _)| *enabled) {
            if !output.is_empty() {
                output.push(' ');
            }
            let _ = write!(output, "{count:3}");
        }
        if label != "-" && !label.is_empty() {
            output.push(' ');
            output.push_str(label);
        }
        output
    }
}

impl AddAssign for FileStats {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.words += other.words;
        self.bytes += other.bytes;
        self.chars += other.chars;
    }
}

/// 表示する項目
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountOptions {
    pub lines: bool,
    pub words: bool,
    pub bytes: bool,
    pub chars: bool,
}

impl CountOptions {
    /// 何も指定されていなければ 行・単語・バイト（wc互換）
    pub fn effective(&self) -> Self {
        if self.lines || self.words || self.bytes || self.chars {
            *self
        } else {
            Self {
                lines: true,
                words: true,
                bytes: true,
                chars: false,
            }
        }
    }
}
