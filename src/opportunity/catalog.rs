use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DiscoveryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCatalogEntry {
    pub name: String,
    pub category: String,
    #[serde(alias = "expected_price")]
    pub expected_price: f64,
    #[serde(alias = "china_price")]
    pub china_price: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, alias = "target_customer")]
    pub target_customer: String,
}

impl ProductCatalogEntry {
    pub fn margin(&self) -> f64 {
        self.expected_price - self.china_price
    }

    pub fn margin_rate(&self) -> f64 {
        if self.expected_price <= 0.0 {
            return 0.0;
        }
        self.margin() / self.expected_price
    }

    fn matches_text(&self, lowercase_text: &str) -> bool {
        self.keywords.iter().any(|keyword| {
            let keyword = keyword.trim().to_lowercase();
            !keyword.is_empty() && lowercase_text.contains(&keyword)
        })
    }

    fn matches_problems(&self, problems: &[String]) -> bool {
        self.keywords.iter().any(|keyword| {
            let keyword = keyword.trim().to_lowercase();
            !keyword.is_empty()
                && problems.iter().any(|problem| {
                    let problem = problem.to_lowercase();
                    !problem.is_empty() && (keyword.contains(&problem) || problem.contains(&keyword))
                })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Keyword,
    Problem,
    Fallback,
}

impl MatchSource {
    pub fn label(self) -> &'static str {
        match self {
            MatchSource::Keyword => "keyword",
            MatchSource::Problem => "problem",
            MatchSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogMatch<'a> {
    pub source: MatchSource,
    pub entries: Vec<&'a ProductCatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCatalog {
    entries: Vec<ProductCatalogEntry>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::new(builtin_entries())
    }
}

impl ProductCatalog {
    pub fn new(entries: Vec<ProductCatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, DiscoveryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DiscoveryError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, DiscoveryError> {
        let entries: Vec<ProductCatalogEntry> = serde_json::from_str(contents)?;
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[ProductCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keyword hits against the cluster text win; then overlap with detected
    /// problem keywords; then a slice of the catalog picked by cluster
    /// position, so a non-empty catalog always yields candidates.
    pub fn match_cluster(
        &self,
        cluster_text: &str,
        problems: &[String],
        cluster_position: usize,
        fallback_slice: usize,
        limit: usize,
    ) -> CatalogMatch<'_> {
        let limit = limit.max(1);
        let lowercase = cluster_text.to_lowercase();

        let by_keyword: Vec<&ProductCatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.matches_text(&lowercase))
            .take(limit)
            .collect();
        if !by_keyword.is_empty() {
            return CatalogMatch {
                source: MatchSource::Keyword,
                entries: by_keyword,
            };
        }

        let by_problem: Vec<&ProductCatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.matches_problems(problems))
            .take(limit)
            .collect();
        if !by_problem.is_empty() {
            return CatalogMatch {
                source: MatchSource::Problem,
                entries: by_problem,
            };
        }

        CatalogMatch {
            source: MatchSource::Fallback,
            entries: self.fallback_slice(cluster_position, fallback_slice.min(limit)),
        }
    }

    fn fallback_slice(&self, cluster_position: usize, slice: usize) -> Vec<&ProductCatalogEntry> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let slice = slice.max(1).min(self.entries.len());
        let start = (cluster_position * slice) % self.entries.len();
        (0..slice)
            .map(|offset| &self.entries[(start + offset) % self.entries.len()])
            .collect()
    }
}

fn builtin_entries() -> Vec<ProductCatalogEntry> {
    vec![
        entry(
            "목 어깨 마사지기",
            "health",
            39_000.0,
            12_000.0,
            &["목", "어깨", "뻐근", "결림", "마사지", "통증"],
            "장시간 앉아서 일하는 직장인",
        ),
        entry(
            "무선 미니 가습기",
            "home",
            29_000.0,
            7_000.0,
            &["건조", "가습", "피부", "겨울"],
            "건조한 사무실에서 일하는 20-30대",
        ),
        entry(
            "휴대용 손선풍기",
            "home",
            19_000.0,
            4_500.0,
            &["더워", "더위", "여름", "땀"],
            "출퇴근길 대중교통 이용자",
        ),
        entry(
            "소형 제습기",
            "home",
            159_000.0,
            55_000.0,
            &["습해", "습기", "곰팡이", "장마"],
            "반지하와 원룸 거주 1인 가구",
        ),
        entry(
            "인체공학 손목 받침대",
            "office",
            25_000.0,
            6_000.0,
            &["손목", "키보드", "마우스", "타이핑"],
            "개발자와 디자이너",
        ),
        entry(
            "수면 안대 귀마개 세트",
            "health",
            15_000.0,
            3_000.0,
            &["불면", "잠이 안", "수면", "시끄러"],
            "소음에 민감한 수험생과 교대 근무자",
        ),
        entry(
            "실리콘 수납 정리함",
            "living",
            22_000.0,
            5_000.0,
            &["정리", "수납", "지저분", "좁아"],
            "좁은 원룸에 사는 자취생",
        ),
        entry(
            "두피 마사지 샴푸 브러시",
            "beauty",
            12_000.0,
            2_000.0,
            &["탈모", "두피", "각질", "가려"],
            "두피 고민이 있는 20-40대",
        ),
        entry(
            "접이식 노트북 거치대",
            "office",
            35_000.0,
            9_000.0,
            &["노트북", "거북목", "자세", "거치대"],
            "재택 근무자와 대학생",
        ),
        entry(
            "스마트폰 무선 충전 거치대",
            "mobile",
            32_000.0,
            8_000.0,
            &["충전", "아이폰", "갤럭시", "배터리"],
            "차량과 책상에서 폰을 자주 쓰는 사용자",
        ),
        entry(
            "침구 진드기 청소기",
            "home",
            89_000.0,
            28_000.0,
            &["먼지", "진드기", "알레르기", "청소"],
            "비염이 있는 가족",
        ),
    ]
}

fn entry(
    name: &str,
    category: &str,
    expected_price: f64,
    china_price: f64,
    keywords: &[&str],
    target_customer: &str,
) -> ProductCatalogEntry {
    ProductCatalogEntry {
        name: name.to_string(),
        category: category.to_string(),
        expected_price,
        china_price,
        keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        target_customer: target_customer.to_string(),
    }
}
