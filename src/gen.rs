//! 候选域名生成
//!
//! 把字典词插入到目标域名已有的标签之间，永远不会插在
//! 最右侧两个标签（主域名和顶级域名）之前。

use itertools::Itertools;
use std::iter;
use std::sync::Arc;

use crate::model::Candidate;

/// 标签数不足三个时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// 不生成任何候选
    #[default]
    Skip,
    /// 生成一个 `word.domain` 形式的候选
    Prepend,
}

/// 默认的回退策略
pub const DEFAULT_FALLBACK_POLICY: FallbackPolicy = FallbackPolicy::Skip;

/// 可以插入字典词的最少标签数
pub const MIN_LABELS: usize = 3;

/// 按 `.` 切分域名，丢弃空标签
pub fn split_labels(domain: &str) -> Vec<&str> {
    domain.split('.').filter(|label| !label.is_empty()).collect()
}

/// 为一个 (域名, 字典词) 组合生成候选域名
pub fn generate_subdomains(domain: &str, word: &str, policy: FallbackPolicy) -> Vec<Candidate> {
    let labels = split_labels(domain);
    let domain: Arc<str> = Arc::from(domain);
    let word: Arc<str> = Arc::from(word);
    generate_from_labels(&domain, &labels, &word, policy)
}

fn generate_from_labels(
    domain: &Arc<str>,
    labels: &[&str],
    word: &Arc<str>,
    policy: FallbackPolicy,
) -> Vec<Candidate> {
    if word.is_empty() || labels.is_empty() {
        return Vec::new();
    }

    let n = labels.len();
    if n < MIN_LABELS {
        return match policy {
            FallbackPolicy::Skip => Vec::new(),
            FallbackPolicy::Prepend => vec![Candidate {
                host: iter::once(&**word).chain(labels.iter().copied()).join("."),
                domain: Arc::clone(domain),
                word: Arc::clone(word),
                position: 0,
            }],
        };
    }

    (0..n - 2)
        .map(|i| Candidate {
            host: labels[..i]
                .iter()
                .copied()
                .chain(iter::once(&**word))
                .chain(labels[i..].iter().copied())
                .join("."),
            domain: Arc::clone(domain),
            word: Arc::clone(word),
            position: i,
        })
        .collect()
}

/// 用完整字典展开所有域名
///
/// 顺序为 域名 → 字典词 → 插入位置，对同样的输入结果完全相同。
pub fn generate_all(domains: &[String], words: &[String], policy: FallbackPolicy) -> Vec<Candidate> {
    let words: Vec<Arc<str>> = words.iter().map(|w| Arc::from(w.as_str())).collect();
    let mut candidates = Vec::with_capacity(candidate_count(domains, words.len(), policy));

    for domain in domains {
        let labels = split_labels(domain);
        let domain: Arc<str> = Arc::from(domain.as_str());
        for word in &words {
            candidates.extend(generate_from_labels(&domain, &labels, word, policy));
        }
    }

    candidates
}

/// 每个字典词为该域名贡献的候选数量
pub fn candidates_per_word(domain: &str, policy: FallbackPolicy) -> usize {
    let n = split_labels(domain).len();
    match (n, policy) {
        (0, _) => 0,
        (n, _) if n >= MIN_LABELS => n - 2,
        (_, FallbackPolicy::Skip) => 0,
        (_, FallbackPolicy::Prepend) => 1,
    }
}

/// 预估候选总数（假设字典中没有空词）
pub fn candidate_count(domains: &[String], word_count: usize, policy: FallbackPolicy) -> usize {
    domains
        .iter()
        .map(|d| candidates_per_word(d, policy) * word_count)
        .sum()
}
