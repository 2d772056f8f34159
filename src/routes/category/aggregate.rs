use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 商品列表固定每页30条
pub const PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
    Discount,
}

impl Sort {
    pub fn as_str(self) -> &'static str {
        match self {
            Sort::Asc => "asc",
            Sort::Desc => "desc",
            Sort::Discount => "discount",
        }
    }
}

/// 分类商品与价格历史join后的扁平行，一行对应一条价格记录
#[derive(Debug, Clone, FromRow)]
pub struct PriceRow {
    pub name: String,
    pub slug: String,
    pub image: String,
    pub country: String,
    pub trademark: String,
    pub weight: f64,
    pub unit: String,
    pub store: String,
    pub city: String,
    pub price: f64,
    pub discount: bool,
    pub discount_price: f64,
    pub discount_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEntry {
    pub store: String,
    pub city: String,
    pub price: f64,
    pub discount: bool,
    pub discount_price: f64,
    pub discount_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 同名同规格（名称+净含量+单位）的商品归并为一个条目，带各店的当前价
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub name: String,
    pub slug: String,
    pub image: String,
    pub country: String,
    pub trademark: String,
    pub weight: f64,
    pub unit: String,
    pub prices: Vec<PriceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub results: Vec<ProductVariant>,
    /// 匹配总数，无匹配时整个字段省略，调用方需按0处理
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

impl ProductPage {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            count: None,
        }
    }
}

fn entry_of(row: &PriceRow) -> PriceEntry {
    PriceEntry {
        store: row.store.clone(),
        city: row.city.clone(),
        price: row.price,
        discount: row.discount,
        discount_price: row.discount_price,
        discount_end: row.discount_end,
        created_at: row.created_at,
    }
}

fn min_price(variant: &ProductVariant) -> f64 {
    variant
        .prices
        .iter()
        .map(|p| p.price)
        .fold(f64::INFINITY, f64::min)
}

fn max_price(variant: &ProductVariant) -> f64 {
    variant
        .prices
        .iter()
        .map(|p| p.price)
        .fold(f64::NEG_INFINITY, f64::max)
}

fn max_discount_price(variant: &ProductVariant) -> f64 {
    variant
        .prices
        .iter()
        .map(|p| p.discount_price)
        .fold(f64::NEG_INFINITY, f64::max)
}

fn sort_variants(variants: &mut [ProductVariant], sort: Sort) {
    // sort_by是稳定排序，键相同的条目保持归并时的先后顺序
    match sort {
        Sort::Asc => variants.sort_by(|a, b| min_price(a).total_cmp(&min_price(b))),
        Sort::Desc => variants.sort_by(|a, b| max_price(b).total_cmp(&max_price(a))),
        Sort::Discount => {
            variants.sort_by(|a, b| max_discount_price(b).total_cmp(&max_discount_price(a)))
        }
    }
}

/// 分类商品聚合：过滤 → 按时间倒序 → 每个(名称,店,城市,净含量,单位)取最新一条
/// → 按(名称,净含量,单位)归并 → 排序 → 分页
pub fn aggregate(
    rows: Vec<PriceRow>,
    store: Option<&str>,
    city: Option<&str>,
    sort: Sort,
    page: u32,
) -> ProductPage {
    let mut rows: Vec<PriceRow> = rows
        .into_iter()
        .filter(|r| store.is_none_or(|s| r.store == s))
        .filter(|r| city.is_none_or(|c| r.city == c))
        .collect();

    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    // created_at倒序后每个键保留第一条，即该店该城市的当前价
    let mut seen = HashSet::new();
    let mut latest = Vec::with_capacity(rows.len());
    for row in rows {
        let key = (
            row.name.clone(),
            row.store.clone(),
            row.city.clone(),
            row.weight.to_bits(),
            row.unit.clone(),
        );
        if seen.insert(key) {
            latest.push(row);
        }
    }

    // 归并为variant，代表字段取首次出现的那一行
    let mut index: HashMap<(String, u64, String), usize> = HashMap::new();
    let mut variants: Vec<ProductVariant> = Vec::new();
    for row in latest {
        let key = (row.name.clone(), row.weight.to_bits(), row.unit.clone());
        match index.get(&key) {
            Some(&i) => variants[i].prices.push(entry_of(&row)),
            None => {
                index.insert(key, variants.len());
                variants.push(ProductVariant {
                    prices: vec![entry_of(&row)],
                    name: row.name,
                    slug: row.slug,
                    image: row.image,
                    country: row.country,
                    trademark: row.trademark,
                    weight: row.weight,
                    unit: row.unit,
                });
            }
        }
    }

    sort_variants(&mut variants, sort);

    let count = variants.len();
    let skip = PAGE_SIZE * (page.max(1) as usize - 1);
    let results: Vec<ProductVariant> = variants.into_iter().skip(skip).take(PAGE_SIZE).collect();

    ProductPage {
        results,
        count: if count == 0 { None } else { Some(count as i64) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        name: &str,
        store: &str,
        city: &str,
        weight: f64,
        unit: &str,
        price: f64,
        discount_price: f64,
        created_offset_secs: i64,
    ) -> PriceRow {
        PriceRow {
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            image: format!("{}.jpg", name),
            country: "UZ".to_string(),
            trademark: "Brand".to_string(),
            weight,
            unit: unit.to_string(),
            store: store.to_string(),
            city: city.to_string(),
            price,
            discount: discount_price > 0.0,
            discount_price,
            discount_end: None,
            created_at: DateTime::from_timestamp(1_700_000_000 + created_offset_secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_latest_price_per_store_city_wins() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 100.0, 0.0, 0),
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 120.0, 0.0, 3600),
        ];

        let page = aggregate(rows, None, None, Sort::Asc, 1);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].prices.len(), 1);
        assert_eq!(page.results[0].prices[0].price, 120.0);
        assert_eq!(page.count, Some(1));
    }

    #[test]
    fn test_store_filter_keeps_only_matching_store() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 100.0, 0.0, 0),
            row("Milk", "StoreB", "Tashkent", 1.0, "l", 90.0, 0.0, 0),
            row("Bread", "StoreB", "Tashkent", 0.5, "kg", 30.0, 0.0, 0),
        ];

        let page = aggregate(rows, Some("StoreA"), None, Sort::Asc, 1);
        assert_eq!(page.results.len(), 1);
        assert!(
            page.results
                .iter()
                .all(|v| v.prices.iter().all(|p| p.store == "StoreA"))
        );
    }

    #[test]
    fn test_city_filter_keeps_only_matching_city() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 100.0, 0.0, 0),
            row("Milk", "StoreA", "Samarkand", 1.0, "l", 95.0, 0.0, 0),
        ];

        let page = aggregate(rows, None, Some("Samarkand"), Sort::Asc, 1);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].prices[0].city, "Samarkand");
    }

    #[test]
    fn test_variant_groups_prices_across_stores() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 100.0, 0.0, 0),
            row("Milk", "StoreB", "Tashkent", 1.0, "l", 95.0, 0.0, 10),
            row("Milk", "StoreA", "Tashkent", 0.5, "l", 60.0, 0.0, 0),
        ];

        let page = aggregate(rows, None, None, Sort::Asc, 1);
        // 不同净含量是不同variant
        assert_eq!(page.results.len(), 2);
        let full = page
            .results
            .iter()
            .find(|v| v.weight == 1.0)
            .expect("1l variant");
        assert_eq!(full.prices.len(), 2);
    }

    #[test]
    fn test_sort_asc_by_cheapest_entry() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 10.0, 0.0, 0),
            row("Milk", "StoreB", "Tashkent", 1.0, "l", 5.0, 0.0, 0),
            row("Bread", "StoreA", "Tashkent", 1.0, "kg", 7.0, 0.0, 0),
            row("Bread", "StoreB", "Tashkent", 1.0, "kg", 8.0, 0.0, 0),
        ];

        let page = aggregate(rows, None, None, Sort::Asc, 1);
        // Milk最低5 < Bread最低7
        assert_eq!(page.results[0].name, "Milk");
        assert_eq!(page.results[1].name, "Bread");
    }

    #[test]
    fn test_sort_desc_by_most_expensive_entry() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 10.0, 0.0, 0),
            row("Milk", "StoreB", "Tashkent", 1.0, "l", 5.0, 0.0, 0),
            row("Bread", "StoreA", "Tashkent", 1.0, "kg", 12.0, 0.0, 0),
        ];

        let page = aggregate(rows, None, None, Sort::Desc, 1);
        // Bread最高12 > Milk最高10
        assert_eq!(page.results[0].name, "Bread");
        assert_eq!(page.results[1].name, "Milk");
    }

    #[test]
    fn test_sort_discount_by_descending_discount_price() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 100.0, 80.0, 0),
            row("Bread", "StoreA", "Tashkent", 1.0, "kg", 30.0, 0.0, 0),
            row("Butter", "StoreA", "Tashkent", 0.2, "kg", 200.0, 150.0, 0),
        ];

        let page = aggregate(rows, None, None, Sort::Discount, 1);
        assert_eq!(page.results[0].name, "Butter");
        assert_eq!(page.results[1].name, "Milk");
        assert_eq!(page.results[2].name, "Bread");
    }

    #[test]
    fn test_equal_sort_key_keeps_grouping_order() {
        let rows = vec![
            row("Milk", "StoreA", "Tashkent", 1.0, "l", 10.0, 0.0, 0),
            row("Bread", "StoreA", "Tashkent", 1.0, "kg", 10.0, 0.0, 3600),
        ];

        let page = aggregate(rows, None, None, Sort::Asc, 1);
        // 价格相同保持归并顺序：Bread的记录更新，归并时排在前面
        assert_eq!(page.results[0].name, "Bread");
        assert_eq!(page.results[1].name, "Milk");
    }

    #[test]
    fn test_page_two_of_35_returns_tail_and_full_count() {
        let rows: Vec<PriceRow> = (0..35)
            .map(|i| {
                row(
                    &format!("Product{:02}", i),
                    "StoreA",
                    "Tashkent",
                    1.0,
                    "kg",
                    i as f64,
                    0.0,
                    0,
                )
            })
            .collect();

        let page = aggregate(rows, None, None, Sort::Asc, 2);
        assert_eq!(page.results.len(), 5);
        assert_eq!(page.count, Some(35));
        // 升序第二页是第31~35便宜的
        assert_eq!(page.results[0].name, "Product30");
        assert_eq!(page.results[4].name, "Product34");
    }

    #[test]
    fn test_page_beyond_last_is_empty_but_counted() {
        let rows = vec![row("Milk", "StoreA", "Tashkent", 1.0, "l", 10.0, 0.0, 0)];

        let page = aggregate(rows, None, None, Sort::Asc, 5);
        assert!(page.results.is_empty());
        assert_eq!(page.count, Some(1));
    }

    #[test]
    fn test_no_matches_has_absent_count() {
        let page = aggregate(Vec::new(), None, None, Sort::Asc, 1);
        assert!(page.results.is_empty());
        assert_eq!(page.count, None);

        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("count").is_none());
    }

    #[test]
    fn test_page_below_one_clamped_to_first() {
        let rows = vec![row("Milk", "StoreA", "Tashkent", 1.0, "l", 10.0, 0.0, 0)];

        let page = aggregate(rows, None, None, Sort::Asc, 0);
        assert_eq!(page.results.len(), 1);
    }
}
