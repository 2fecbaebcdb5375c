//! カタログ入力の型定義
//!
//! サーバー描画ページから注入される参照データ:
//! - Artist: `{id, artistName}`
//! - Release: `{id, name}`
//! - formats: 許可されたフォーマットの列挙
//!
//! IDは数値でも文字列でも受け付け、正規の文字列表現に揃える。

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

/// 参照ID（正規化済み文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RefId(String);

impl RefId {
    /// 前後の空白を落として正規化する
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RefId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for RefId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<u64> for RefId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for RefId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(RefId(n.to_string())),
            Raw::Text(s) => Ok(RefId::new(s)),
        }
    }
}

/// アーティスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: RefId,
    #[serde(alias = "displayName")]
    pub artist_name: String,
}

/// リリース
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: RefId,
    pub name: String,
}

/// フォーム初期化時に注入される参照カタログ
///
/// 行ごとにコピーしないよう `Arc` で共有する。
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub artists: Arc<[Artist]>,
    pub releases: Arc<[Release]>,
    pub formats: Arc<[String]>,
}

/// JSON入力用
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CatalogInput {
    artists: Vec<Artist>,
    releases: Vec<Release>,
    formats: Vec<String>,
}

impl Catalog {
    pub fn new(artists: Vec<Artist>, releases: Vec<Release>, formats: Vec<String>) -> Self {
        Self {
            artists: artists.into(),
            releases: releases.into(),
            formats: formats.into(),
        }
    }

    /// `{"artists": [...], "releases": [...], "formats": [...]}` から読み込み
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let input: CatalogInput = serde_json::from_str(json)?;
        Ok(Self::new(input.artists, input.releases, input.formats))
    }

    pub fn artist(&self, id: &RefId) -> Option<&Artist> {
        find_artist(&self.artists, id)
    }
}

/// IDでアーティストを検索
pub fn find_artist<'a>(artists: &'a [Artist], id: &RefId) -> Option<&'a Artist> {
    artists.iter().find(|a| &a.id == id)
}
