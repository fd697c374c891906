use indexmap::IndexSet;
use num::Num;
use serde::{ser::SerializeStruct, Deserialize, Serialize};

use crate::vectorizer::{analyzer::Analyzer, tfidf::{DefaultTFIDFEngine, TFIDFEngine}, TFIDFVectorizer};

/// TFIDFVectorizerのデシリアライズ用のデータ構造
/// エンジンの型情報を含まないため、そのままデシリアライズ可能です。
/// `into_tf_idf_vectorizer`メソッドで検証してから`TFIDFVectorizer`に変換します。
#[derive(Debug, Clone, Deserialize)]
pub struct TFIDFData {
    /// 列順の語彙
    pub vocabulary: Vec<String>,
    /// 列ごとのIDF
    pub idf: Vec<f64>,
    pub analyzer: Analyzer,
    pub doc_num: u64,
}

impl TFIDFData {
    /// `TFIDFData`から`TFIDFVectorizer`に変換します。
    /// 語彙とIDFの長さが合わない、または語彙に重複がある場合はエラー文字列を返します。
    pub fn into_tf_idf_vectorizer<N, E>(self) -> Result<TFIDFVectorizer<N, E>, String>
    where
        N: Num + Copy + Send + Sync,
        E: TFIDFEngine<N> + Send + Sync,
    {
        if self.vocabulary.len() != self.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                self.vocabulary.len(),
                self.idf.len()
            ));
        }
        let expected = self.vocabulary.len();
        let vocabulary: IndexSet<String> = self.vocabulary.into_iter().collect();
        if vocabulary.len() != expected {
            return Err("vocabulary contains duplicate terms".to_string());
        }
        Ok(TFIDFVectorizer::from_parts(vocabulary, self.idf, self.analyzer, self.doc_num))
    }
}

impl<N, E> Serialize for TFIDFVectorizer<N, E>
where
    N: Num + Copy + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    /// TFIDFVectorizerをシリアライズします
    /// 型マーカーは除外され、`TFIDFData`と同じ形になります。
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TFIDFVectorizer", 4)?;
        let vocabulary: Vec<&str> = self.vocabulary.iter().map(|s| s.as_str()).collect();
        state.serialize_field("vocabulary", &vocabulary)?;
        state.serialize_field("idf", &self.idf)?;
        state.serialize_field("analyzer", &self.analyzer)?;
        state.serialize_field("doc_num", &self.doc_num)?;
        state.end()
    }
}
