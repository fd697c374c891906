use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

///  TokenFrequency 構造体
/// 1文書内のtokenの出現回数を管理します
/// TF は生のカウントをそのまま使います
///
/// # Examples
/// ```
/// use paper_explorer::TokenFrequency;
/// let mut token_freq = TokenFrequency::new();
/// token_freq.add_token("neural");
/// token_freq.add_token("network");
/// token_freq.add_token("neural");
///
/// assert_eq!(token_freq.token_count("neural"), 2);
/// assert_eq!(token_freq.token_count("graph"), 0);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TokenFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    token_count: IndexMap<String, u32>,
}

/// Tokenの追加の実装
impl TokenFrequency {
    /// 新しいTokenFrequencyを作成するメソッド
    pub fn new() -> Self {
        TokenFrequency {
            token_count: IndexMap::new(),
        }
    }

    /// tokenを追加する
    ///
    /// # Arguments
    /// * `token` - 追加するトークン
    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        match self.token_count.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.token_count.insert(token.to_string(), 1);
            }
        }
        self
    }

    /// 複数のtokenを追加する
    ///
    /// # Arguments
    /// * `tokens` - 追加するトークンのスライス
    #[inline]
    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where T: AsRef<str>
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }
}

/// TokenFrequencyの情報を取得するための実装
impl TokenFrequency {
    /// あるtokenの出現回数を取得します
    ///
    /// # Returns
    /// * `u32` - トークンの出現回数、無ければ0
    #[inline]
    pub fn token_count(&self, token: &str) -> u32 {
        self.token_count.get(token).copied().unwrap_or(0)
    }

    /// tokenが1つも無いか
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.token_count.is_empty()
    }

    /// (token, count) を初出順で返します
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.token_count.iter().map(|(token, &count)| (token.as_str(), count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_tokens() {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&["graph", "neural network", "graph"]);
        assert_eq!(freq.token_count("graph"), 2);
        assert_eq!(freq.token_count("missing"), 0);
        assert!(!freq.is_empty());
    }

    #[test]
    fn iter_keeps_first_seen_order() {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&["b", "a", "b", "c"]);
        let pairs: Vec<(&str, u32)> = freq.iter().collect();
        // 初出順: b, a, c
        assert_eq!(pairs, vec![("b", 2), ("a", 1), ("c", 1)]);
        assert!(TokenFrequency::new().is_empty());
    }
}
