use crate::error::{LabelFormsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CSRFトークンの環境変数（設定ファイルより優先）
pub const CSRF_TOKEN_ENV: &str = "LABEL_FORMS_CSRF_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// バックオフィスのURL（抽出エンドポイントの基準）
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub timeout_seconds: u64,
    /// 税率selectの選択肢（小数2桁）
    pub vat_rate_options: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            csrf_token: None,
            timeout_seconds: 60,
            vat_rate_options: ["0.00", "0.09", "0.21"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LabelFormsError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("label-forms").join("config.json"))
    }

    pub fn get_csrf_token(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(token) = std::env::var(CSRF_TOKEN_ENV) {
            if !token.is_empty() {
                return Ok(token);
            }
        }

        self.csrf_token.clone().ok_or(LabelFormsError::MissingCsrfToken)
    }

    /// 抽出エンドポイントの絶対URL
    pub fn extraction_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            label_forms_common::autofill::EXTRACTION_API_URL
        )
    }
}
