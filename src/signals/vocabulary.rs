use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DiscoveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Mobile,
    Beauty,
    Fashion,
    Electronics,
    Lifestyle,
    General,
}

impl ProductCategory {
    pub fn label(self) -> &'static str {
        match self {
            ProductCategory::Mobile => "mobile",
            ProductCategory::Beauty => "beauty",
            ProductCategory::Fashion => "fashion",
            ProductCategory::Electronics => "electronics",
            ProductCategory::Lifestyle => "lifestyle",
            ProductCategory::General => "general",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandGroup {
    pub category: ProductCategory,
    pub names: Vec<String>,
}

/// Keyword tables behind the lexical detectors. The built-in tables target
/// Korean social posts; a TOML file can replace any subset of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub problem_keywords: Vec<String>,
    pub causal_connectors: Vec<String>,
    pub question_markers: Vec<String>,
    pub crying_emoticons: Vec<String>,
    pub help_phrases: Vec<String>,
    pub product_keywords: Vec<String>,
    pub brands: Vec<BrandGroup>,
    pub generic_products: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            problem_keywords: words(&[
                // body
                "아파", "아프", "통증", "뻐근", "결림", "목이", "허리", "어깨", "두통", "피곤",
                "지쳐", "저려", "붓기", "불면", "잠이 안", "눈이 침침", "손목",
                // skin and hair
                "건조", "가려", "여드름", "트러블", "각질", "탈모", "피부가 뒤집",
                // surroundings
                "더워", "추워", "습해", "답답", "냄새", "곰팡이", "먼지", "시끄러", "좁아",
                "지저분", "정리가 안", "벌레",
                // wants and frustration
                "불편", "귀찮", "힘들", "스트레스", "짜증", "고민", "걱정", "필요해", "필요한",
                "갖고 싶", "있었으면", "없나요", "찾고 있", "원해", "했으면",
            ]),
            causal_connectors: words(&["때문에", "해서", "라서", "니까", "탓에"]),
            question_markers: words(&["?", "어떻게", "뭐가", "없을까", "있을까", "할까요"]),
            crying_emoticons: words(&["ㅠ", "ㅜ", "😭", "😢"]),
            help_phrases: words(&["추천", "도와", "알려주", "방법", "해결"]),
            product_keywords: words(&[
                "샀어", "샀다", "구매", "구입", "주문", "득템", "추천템", "인생템", "꿀템", "만족",
                "강추", "후기", "리뷰", "언박싱", "써봤", "사용해", "가성비", "재구매", "직구",
                "할인", "세일", "쇼핑",
            ]),
            brands: vec![
                BrandGroup {
                    category: ProductCategory::Mobile,
                    names: words(&[
                        "아이폰", "갤럭시", "에어팟", "버즈", "아이패드", "애플워치", "갤럭시워치",
                        "iphone", "galaxy", "airpods",
                    ]),
                },
                BrandGroup {
                    category: ProductCategory::Beauty,
                    names: words(&[
                        "설화수", "이니스프리", "라네즈", "에스티로더", "샤넬", "디올", "클리오",
                        "롬앤", "닥터자르트", "에뛰드",
                    ]),
                },
                BrandGroup {
                    category: ProductCategory::Fashion,
                    names: words(&[
                        "나이키", "아디다스", "뉴발란스", "유니클로", "무신사", "구찌", "루이비통",
                        "컨버스", "nike", "adidas",
                    ]),
                },
                BrandGroup {
                    category: ProductCategory::Electronics,
                    names: words(&[
                        "맥북", "lg그램", "다이슨", "삼성", "소니", "닌텐도", "플스", "갤럭시북",
                        "dyson", "macbook",
                    ]),
                },
                BrandGroup {
                    category: ProductCategory::Lifestyle,
                    names: words(&["스타벅스", "이케아", "무인양품", "다이소", "올리브영", "코스트코"]),
                },
            ],
            generic_products: words(&[
                "가습기", "제습기", "공기청정기", "선풍기", "서큘레이터", "마사지기", "안마기",
                "전기장판", "텀블러", "베개", "매트리스", "의자", "책상", "거치대", "충전기",
                "보조배터리", "이어폰", "헤드폰", "키보드", "마우스", "모니터", "청소기",
                "에어프라이어", "블렌더", "폼롤러", "마스크팩", "선크림", "수분크림", "립밤",
            ]),
        }
    }
}

impl Vocabulary {
    pub fn load(path: &Path) -> Result<Self, DiscoveryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DiscoveryError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, DiscoveryError> {
        let vocabulary: Vocabulary = toml::from_str(contents)?;
        Ok(vocabulary)
    }

    /// Lower-cases every entry and drops blanks so matching can run against
    /// lower-cased text.
    pub fn normalized(mut self) -> Self {
        normalize_list(&mut self.problem_keywords);
        normalize_list(&mut self.causal_connectors);
        normalize_list(&mut self.question_markers);
        normalize_list(&mut self.crying_emoticons);
        normalize_list(&mut self.help_phrases);
        normalize_list(&mut self.product_keywords);
        normalize_list(&mut self.generic_products);
        for group in &mut self.brands {
            normalize_list(&mut group.names);
        }
        self
    }
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn normalize_list(values: &mut Vec<String>) {
    for value in values.iter_mut() {
        *value = value.trim().to_lowercase();
    }
    values.retain(|value| !value.is_empty());
}
