use chrono::{DateTime, TimeZone, Utc};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashSet;

use opportunity_scout::clustering::Cluster;
use opportunity_scout::config::DiscoveryConfig;
use opportunity_scout::opportunity::{
    DiscoveryPipeline, MatchSource, OpportunityEvaluator, ProductCatalog, ProductCatalogEntry,
};
use opportunity_scout::signals::Vocabulary;
use opportunity_scout::sources::{load_records, parse_timestamp, RawTimestamp};
use opportunity_scout::vector::RawEmbedding;
use opportunity_scout::{ContentItem, Engagement, Platform};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn post(id: &str, text: &str, embedding: Option<RawEmbedding>, likes: u64) -> ContentItem {
    let mut item = ContentItem::new(id, Platform::Instagram, text);
    item.embedding = embedding;
    item.engagement = Engagement {
        likes,
        ..Engagement::default()
    };
    item
}

fn catalog_entry(name: &str, keywords: &[&str]) -> ProductCatalogEntry {
    ProductCatalogEntry {
        name: name.to_string(),
        category: "test".to_string(),
        expected_price: 10_000.0,
        china_price: 2_500.0,
        keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        target_customer: "anyone".to_string(),
    }
}

fn scenario_items() -> Vec<ContentItem> {
    let east = || Some(RawEmbedding::Values(vec![1.0, 0.0]));
    let north = || Some(RawEmbedding::from("[0,1]"));
    vec![
        post("a1", "목이 너무 아파요 ㅠㅠ", east(), 120),
        post("a2", "어깨 결림 때문에 힘들어요", east(), 80),
        post("a3", "하루종일 목 통증", east(), 100),
        post("b1", "아이폰 샀어요 만족", north(), 300),
        post("b2", "아이폰 충전 거치대 구매 후기", north(), 250),
        post("b3", "갤럭시 득템", north(), 200),
        post("c1", "임베딩 없는 글", None, 10),
        post("c2", "깨진 임베딩", Some(RawEmbedding::from("not a vector")), 10),
        post("c3", "빈 임베딩", Some(RawEmbedding::Values(Vec::new())), 10),
        post("c4", "객체 임베딩", Some(RawEmbedding::Other(serde_json::json!({"v": 1}))), 10),
    ]
}

fn seeded_pipeline(seed: u64) -> DiscoveryPipeline {
    let mut config = DiscoveryConfig::default();
    config.clustering.k = 2;
    config.clustering.seed = Some(seed);
    DiscoveryPipeline::with_defaults(&config)
}

#[test]
fn end_to_end_partitions_orthogonal_groups() {
    let items = scenario_items();
    let pipeline = seeded_pipeline(7);
    let report = pipeline.run(&items, now());

    assert_eq!(report.items_total, 10);
    assert_eq!(report.items_clustered, 6);
    assert_eq!(report.items_skipped, 4);
    assert_eq!(report.clusters, 2);
    assert!(!report.opportunities.is_empty());

    let east: HashSet<usize> = [0, 1, 2].into_iter().collect();
    let north: HashSet<usize> = [3, 4, 5].into_iter().collect();
    let mut groups_seen = HashSet::new();
    for opportunity in &report.opportunities {
        let members: HashSet<usize> = opportunity
            .stats
            .related_content
            .iter()
            .map(|content| content.index)
            .collect();
        assert!(members == east || members == north);
        groups_seen.insert(opportunity.cluster_id);
    }
    assert_eq!(groups_seen.len(), 2);
}

#[test]
fn opportunities_are_ranked_by_viability() {
    let report = seeded_pipeline(3).run(&scenario_items(), now());

    for (index, opportunity) in report.opportunities.iter().enumerate() {
        assert_eq!(opportunity.rank, index + 1);
        assert!((opportunity.margin - opportunity.product.margin()).abs() < 1e-9);
        assert!(opportunity.margin_rate > 0.0 && opportunity.margin_rate < 1.0);
    }
    for pair in report.opportunities.windows(2) {
        assert!(pair[0].stats.viability_score >= pair[1].stats.viability_score);
    }
}

#[test]
fn same_seed_reproduces_the_report() {
    let items = scenario_items();
    let first = seeded_pipeline(11).run(&items, now());
    let second = seeded_pipeline(11).run(&items, now());

    assert_eq!(first, second);
}

#[test]
fn mismatched_dimensions_are_skipped() {
    let items = vec![
        post("a", "첫 글", Some(RawEmbedding::Values(vec![1.0, 0.0])), 1),
        post("b", "둘째 글", Some(RawEmbedding::Values(vec![0.0, 1.0, 0.0])), 1),
        post("c", "셋째 글", Some(RawEmbedding::Values(vec![0.5, 0.5])), 1),
    ];
    let pipeline = seeded_pipeline(1);
    let mut rng = StdRng::seed_from_u64(1);
    let report = pipeline.run_with_rng(&items, 1, &mut rng, now());

    assert_eq!(report.items_clustered, 2);
    assert_eq!(report.items_skipped, 1);
    assert_eq!(report.clusters, 1);
}

#[test]
fn no_embeddings_means_no_opportunities() {
    let items = vec![post("a", "목이 아파요", None, 5)];
    let report = seeded_pipeline(1).run(&items, now());

    assert_eq!(report.clusters, 0);
    assert!(report.opportunities.is_empty());
}

#[test]
fn evaluator_aggregates_member_signals() {
    let items = vec![
        post("a", "아이폰 샀어요 ㅠㅠ 목이 아파요", None, 1_500),
        post("b", "아이폰 케이스랑 가습기", None, 900),
        post("c", "그냥 일상", None, 600),
    ];
    let cluster = Cluster {
        id: 4,
        centroid: vec![1.0],
        members: vec![0, 1, 2],
    };
    let stats = OpportunityEvaluator::default().evaluate(&cluster, &items, now());

    assert_eq!(stats.cluster_id, 4);
    assert_eq!(stats.size, 3);
    assert!((stats.avg_engagement - 1_000.0).abs() < 1e-9);
    assert_eq!(stats.total_mentions, 3);
    assert_eq!(stats.top_products[0].product, "아이폰");
    assert_eq!(stats.top_products[0].count, 2);
    assert!(stats.problems.iter().any(|problem| problem == "아파"));
    assert!(stats.related_content[0].has_actual_products);
    assert!(!stats.related_content[2].has_actual_products);
    // 50 + problem 20 + product 15 + actual product 25, clamped
    assert!((stats.viability_score - 100.0).abs() < 1e-9);
}

#[test]
fn evaluator_handles_empty_and_out_of_range_members() {
    let items = vec![post("a", "hello", None, 10)];
    let cluster = Cluster {
        id: 0,
        centroid: Vec::new(),
        members: vec![5, 9],
    };
    let stats = OpportunityEvaluator::default().evaluate(&cluster, &items, now());

    assert_eq!(stats.size, 0);
    assert_eq!(stats.avg_engagement, 0.0);
    assert_eq!(stats.trend_score, 0.0);
    assert!(stats.sample_text.is_empty());
    assert!((stats.viability_score - 50.0).abs() < 1e-9);
}

#[test]
fn problem_and_product_signals_raise_viability() {
    let quiet = vec![
        post("a", "오늘 날씨 맑음", None, 0),
        post("b", "산책 다녀옴", None, 0),
    ];
    let loud = vec![
        post("a", "목이 너무 아파요", None, 0),
        post("b", "아이폰 샀어요", None, 0),
    ];
    let cluster = Cluster {
        id: 0,
        centroid: vec![1.0],
        members: vec![0, 1],
    };
    let evaluator = OpportunityEvaluator::default();

    let before = evaluator.evaluate(&cluster, &quiet, now()).viability_score;
    let after = evaluator.evaluate(&cluster, &loud, now()).viability_score;
    assert!(after > before);
}

#[test]
fn sample_text_is_truncated_by_characters() {
    let long = "가".repeat(500);
    let items = vec![post("a", &long, None, 0)];
    let cluster = Cluster {
        id: 0,
        centroid: vec![1.0],
        members: vec![0],
    };
    let stats = OpportunityEvaluator::default().evaluate(&cluster, &items, now());

    assert_eq!(stats.sample_text.chars().count(), 200);
}

#[test]
fn catalog_prefers_keyword_matches() {
    let catalog = ProductCatalog::new(vec![
        catalog_entry("fan", &["더워"]),
        catalog_entry("massager", &["목"]),
        catalog_entry("pillow", &["베개"]),
    ]);
    let matched = catalog.match_cluster("목이 아프고 너무 더워요", &[], 0, 2, 3);

    assert_eq!(matched.source, MatchSource::Keyword);
    let names: Vec<&str> = matched.entries.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["fan", "massager"]);
}

#[test]
fn catalog_falls_back_to_problem_overlap() {
    let catalog = ProductCatalog::new(vec![
        catalog_entry("fan", &["여름"]),
        catalog_entry("massager", &["뻐근함"]),
    ]);
    let matched = catalog.match_cluster("어깨가 뻐근해요", &["뻐근".to_string()], 0, 2, 3);

    assert_eq!(matched.source, MatchSource::Problem);
    assert_eq!(matched.entries.len(), 1);
    assert_eq!(matched.entries[0].name, "massager");
}

#[test]
fn catalog_falls_back_to_positional_slice() {
    let catalog = ProductCatalog::new(
        ["p0", "p1", "p2", "p3", "p4"]
            .iter()
            .map(|name| catalog_entry(name, &["never-matches"]))
            .collect(),
    );
    let names = |position: usize| -> Vec<String> {
        catalog
            .match_cluster("unrelated text", &[], position, 2, 3)
            .entries
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    };

    assert_eq!(
        catalog.match_cluster("unrelated text", &[], 0, 2, 3).source,
        MatchSource::Fallback
    );
    assert_eq!(names(0), vec!["p0", "p1"]);
    assert_eq!(names(1), vec!["p2", "p3"]);
    assert_eq!(names(2), vec!["p4", "p0"]);
    assert_eq!(names(0), names(0));
}

#[test]
fn empty_catalog_yields_no_candidates() {
    let catalog = ProductCatalog::new(Vec::new());
    let matched = catalog.match_cluster("목이 아파요", &["아파".to_string()], 0, 2, 3);

    assert_eq!(matched.source, MatchSource::Fallback);
    assert!(matched.entries.is_empty());
}

#[test]
fn pipeline_uses_fallback_when_catalog_has_no_keyword_hits() {
    let catalog = ProductCatalog::new(vec![
        catalog_entry("only", &["never-matches"]),
    ]);
    let mut config = DiscoveryConfig::default();
    config.clustering.seed = Some(2);
    let pipeline = DiscoveryPipeline::new(&config, Vocabulary::default(), catalog);
    let items = vec![post("a", "그냥 글", Some(RawEmbedding::Values(vec![1.0, 2.0])), 1)];
    let report = pipeline.run(&items, now());

    assert_eq!(report.opportunities.len(), 1);
    assert_eq!(report.opportunities[0].match_source, MatchSource::Fallback);
    assert_eq!(report.opportunities[0].product.name, "only");
}

#[test]
fn catalog_entries_read_camel_and_snake_case() {
    let catalog = ProductCatalog::from_json(
        r#"[
            {"name": "a", "category": "home", "expectedPrice": 100, "chinaPrice": 40, "keywords": ["x"], "targetCustomer": "t"},
            {"name": "b", "category": "home", "expected_price": 0, "china_price": 0}
        ]"#,
    )
    .unwrap();

    assert_eq!(catalog.len(), 2);
    let first = &catalog.entries()[0];
    assert!((first.margin() - 60.0).abs() < 1e-9);
    assert!((first.margin_rate() - 0.6).abs() < 1e-9);
    assert_eq!(catalog.entries()[1].margin_rate(), 0.0);
    assert!(catalog.entries()[1].keywords.is_empty());
}

#[test]
fn source_records_normalize_per_platform() {
    let items = load_records(
        r##"[
            {"platform": "instagram", "id": "ig1", "caption": "목이 아파요 #건강", "likes_count": 10, "comments_count": 2,
             "timestamp": "2024-05-30T12:00:00Z", "embedding": "[1,0]"},
            {"platform": "tiktok", "desc": "선풍기 추천", "digg_count": 40, "comment_count": 5, "share_count": 3,
             "play_count": 900, "create_time": 1717200000, "hashtags": ["여름"]},
            {"platform": "product_hunt", "id": "ph1", "name": "Desk Fan", "tagline": "Quiet", "votes_count": 70,
             "topics": ["home"], "created_at": "2024-05-01"},
            {"platform": "huggingface", "modelId": "org/model", "pipeline_tag": "text-classification",
             "downloads": 1000, "likes": 8, "tags": ["ko"], "lastModified": "yesterday"}
        ]"##,
    )
    .unwrap();

    assert_eq!(items.len(), 4);

    assert_eq!(items[0].platform, Platform::Instagram);
    assert_eq!(items[0].id, "ig1");
    assert_eq!(items[0].vector(), vec![1.0, 0.0]);
    assert!((items[0].engagement.total() - 12.0).abs() < 1e-9);
    assert_eq!(items[0].hashtag_count(), 1);
    assert!(items[0].posted_at.is_some());

    assert_eq!(items[1].platform, Platform::TikTok);
    assert!(items[1].id.starts_with("tiktok_"));
    assert_eq!(items[1].text, "선풍기 추천");
    assert_eq!(items[1].engagement.views, 900);
    assert_eq!(items[1].posted_at, Utc.timestamp_opt(1_717_200_000, 0).single());

    assert_eq!(items[2].platform, Platform::ProductHunt);
    assert_eq!(items[2].text, "Desk Fan Quiet");
    assert_eq!(items[2].engagement.likes, 70);
    assert!(items[2].posted_at.is_some());

    assert_eq!(items[3].platform, Platform::HuggingFace);
    assert_eq!(items[3].id, "org/model");
    assert_eq!(items[3].text, "org/model text-classification");
    assert!(items[3].posted_at.is_none());
    assert!(items[3].vector().is_empty());
}

#[test]
fn derived_ids_are_stable() {
    let payload = r#"[{"platform": "tiktok", "description": "같은 글"}]"#;
    let first = load_records(payload).unwrap();
    let second = load_records(payload).unwrap();

    assert_eq!(first[0].id, second[0].id);
}

#[test]
fn timestamps_parse_leniently() {
    assert!(parse_timestamp("2024-05-30T12:00:00+09:00").is_some());
    assert!(parse_timestamp("2024-05-30 12:00:00").is_some());
    assert!(parse_timestamp("1717200000").is_some());
    assert!(parse_timestamp("").is_none());
    assert!(parse_timestamp("not a date").is_none());
}

#[test]
fn millisecond_epochs_are_not_read_as_seconds() {
    let expected = Utc.timestamp_opt(1_700_000_000, 0).single();

    assert_eq!(parse_timestamp("1700000000000"), expected);
    assert_eq!(parse_timestamp("1700000000"), expected);
    assert_eq!(RawTimestamp::Seconds(1_700_000_000_000).parse(), expected);
    assert_eq!(RawTimestamp::Seconds(1_700_000_000).parse(), expected);
    assert_eq!(
        RawTimestamp::Fractional(1_700_000_000.5).parse(),
        Utc.timestamp_millis_opt(1_700_000_000_500).single()
    );
    assert!(RawTimestamp::Other(serde_json::json!({"at": 1})).parse().is_none());
}

#[test]
fn one_odd_record_does_not_sink_the_batch() {
    let items = load_records(
        r#"[
            {"platform": "instagram", "id": "nulls", "caption": "목이 아파요", "likes_count": null,
             "comments_count": "7", "video_view_count": 12.9, "engagement": null},
            {"platform": "tiktok", "id": "float-time", "description": "선풍기", "digg_count": 5,
             "create_time": 1700000000.5},
            {"platform": "tiktok", "id": "odd-time", "description": "가습기", "create_time": {"seconds": 1}},
            {"platform": "myspace", "id": "unknown"},
            {"platform": "product_hunt", "id": "bad-shape", "name": ["not", "a", "string"]},
            {"platform": "huggingface", "id": "fine", "downloads": 3}
        ]"#,
    )
    .unwrap();

    let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["nulls", "float-time", "odd-time", "fine"]);

    assert_eq!(items[0].engagement.likes, 0);
    assert_eq!(items[0].engagement.comments, 7);
    assert_eq!(items[0].engagement.views, 12);
    assert!(items[0].engagement.score.is_none());

    assert_eq!(
        items[1].posted_at,
        Utc.timestamp_millis_opt(1_700_000_000_500).single()
    );
    assert!(items[2].posted_at.is_none());

    let report = seeded_pipeline(1).run(&items, now());
    assert_eq!(report.items_total, 4);
}

#[test]
fn non_array_payload_is_an_error() {
    assert!(load_records(r#"{"platform": "instagram"}"#).is_err());
    assert!(load_records("not json").is_err());
}

#[test]
fn platform_tags_parse_case_insensitively() {
    assert_eq!(Platform::parse("TikTok"), Platform::TikTok);
    assert_eq!(Platform::parse("product_hunt"), Platform::ProductHunt);
    assert_eq!(Platform::parse("HF"), Platform::HuggingFace);
    assert_eq!(Platform::parse("Threads"), Platform::Other("threads".to_string()));
}

#[test]
fn config_defaults_fill_missing_sections() {
    let config = DiscoveryConfig::from_toml(
        r#"
[clustering]
k = 3
seed = 99

[viability]
problem_bonus = 30.0
"#,
    )
    .unwrap();

    assert_eq!(config.clustering.k, 3);
    assert_eq!(config.clustering.seed, Some(99));
    assert_eq!(config.clustering.max_iterations, 100);
    assert!((config.viability.problem_bonus - 30.0).abs() < 1e-9);
    assert!((config.viability.product_bonus - 15.0).abs() < 1e-9);
    assert!((config.trend.hashtag_cap - 20.0).abs() < 1e-9);
    assert_eq!(config.catalog.fallback_slice, 2);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn config_round_trips_through_disk() {
    let path = std::env::temp_dir()
        .join(format!("opportunity-scout-{}", std::process::id()))
        .join("discovery.toml");
    let mut config = DiscoveryConfig::default();
    config.clustering.k = 7;
    config.catalog.max_products_per_cluster = 1;
    config.write(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let loaded = DiscoveryConfig::from_toml(&contents).unwrap();
    assert_eq!(loaded.clustering.k, 7);
    assert_eq!(loaded.catalog.max_products_per_cluster, 1);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
