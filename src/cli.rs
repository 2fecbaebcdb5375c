use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "label-forms")]
#[command(about = "レーベル管理フォームの検証・描画・請求書抽出ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// コスト金額（税抜・税率・税額・税込）の整合性を検証
    ValidateCost {
        /// 税抜金額
        #[arg(long, allow_hyphen_values = true)]
        net: String,

        /// 税率（小数、例: 0.21）
        #[arg(long, allow_hyphen_values = true)]
        rate: String,

        /// 税額
        #[arg(long, allow_hyphen_values = true)]
        vat: String,

        /// 税込金額
        #[arg(long, allow_hyphen_values = true)]
        gross: String,
    },

    /// 長さの変換（秒 → M:SS、M:SS → 秒）
    Duration {
        /// 秒数 または M:SS
        #[arg(required = true)]
        value: String,
    },

    /// 明細・トラック行のHTMLを描画
    RenderRow {
        /// 行の種類
        #[arg(short, long, default_value = "sale")]
        kind: RowKindArg,

        /// カタログJSON（artists / releases / formats）
        #[arg(short, long)]
        catalog: PathBuf,

        /// 既存行のJSON配列（編集フォームの初期値）
        #[arg(short, long)]
        existing: Option<PathBuf>,

        /// 末尾に追加する空行の数
        #[arg(long, default_value = "0")]
        add: usize,

        /// 出力HTMLファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 請求書から金額等を抽出してフォーム値を表示
    Extract {
        /// PDF / PNG / JPEG
        #[arg(required = true)]
        file: PathBuf,

        /// バックオフィスのURL（設定を上書き）
        #[arg(long)]
        base_url: Option<String>,
    },

    /// 設定管理
    Config {
        /// バックオフィスのURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// CSRFトークンを設定
        #[arg(long)]
        set_csrf_token: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RowKindArg {
    Track,
    Sale,
    Return,
}
