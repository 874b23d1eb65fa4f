//! Frequency-based menu recommendation
//!
//! Pure, read-only, and deterministic for a fixed data snapshot: a menu
//! item scores +3 when the student has ordered from its category before
//! and +2 when the student has ordered from its vendor before. Candidates
//! are loaded in a stable order and ranked with a stable sort, so tie
//! order is reproducible across calls.

use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::Category;
use crate::models::menu::MenuItemWithCategory;

/// Upper bound on the returned ranking
pub const MAX_RECOMMENDATIONS: usize = 10;

const CATEGORY_SCORE: i32 = 3;
const VENDOR_SCORE: i32 = 2;

/// What a student has ordered before: category and vendor frequencies
#[derive(Debug, Default)]
pub struct OrderHistory {
    /// Incremented once per past order line in the category
    pub category_counts: HashMap<String, u32>,
    /// Incremented once per past order at the vendor
    pub vendor_counts: HashMap<Uuid, u32>,
}

/// Recommendation engine reading the order ledger and the catalog
#[derive(Clone)]
pub struct RecommendationEngine {
    pool: PgPool,
}

impl RecommendationEngine {
    /// Create a new recommendation engine
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rank the available catalog for a student
    pub async fn recommend(&self, student_id: Uuid) -> ApiResult<Vec<MenuItemWithCategory>> {
        let history = self.load_history(student_id).await?;
        let candidates = self.load_candidates().await?;

        Ok(rank_menus(&history, candidates))
    }

    /// Build the student's category and vendor frequency tallies
    async fn load_history(&self, student_id: Uuid) -> ApiResult<OrderHistory> {
        let mut history = OrderHistory::default();

        let order_rows = sqlx::query(
            r#"
            SELECT vendor_id
            FROM orders
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        for row in &order_rows {
            let vendor_id: Uuid = row.get("vendor_id");
            *history.vendor_counts.entry(vendor_id).or_insert(0) += 1;
        }

        let line_rows = sqlx::query(
            r#"
            SELECT c.name AS category_name
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN menu_items mi ON mi.id = oi.menu_item_id
            JOIN categories c ON c.id = mi.category_id
            WHERE o.student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        for row in &line_rows {
            let category_name: String = row.get("category_name");
            *history.category_counts.entry(category_name).or_insert(0) += 1;
        }

        Ok(history)
    }

    /// Load every available menu item with its category, in a stable order
    async fn load_candidates(&self) -> ApiResult<Vec<MenuItemWithCategory>> {
        let rows = sqlx::query(
            r#"
            SELECT mi.id, mi.vendor_id, mi.category_id, mi.name, mi.description, mi.price,
                   mi.image_url, mi.available, mi.created_at, mi.updated_at,
                   c.name AS category_name
            FROM menu_items mi
            JOIN categories c ON c.id = mi.category_id
            WHERE mi.available = TRUE
            ORDER BY mi.created_at ASC, mi.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let item = crate::repositories::catalog::menu_item_from_row(row);
                let category = Category {
                    id: item.category_id,
                    name: row.get("category_name"),
                };
                MenuItemWithCategory { item, category }
            })
            .collect())
    }
}

/// Score the candidates against the history and return the top ranking
///
/// The sort is stable: candidates with equal scores keep their input
/// order, so the ranking is deterministic for a fixed snapshot.
pub fn rank_menus(
    history: &OrderHistory,
    candidates: Vec<MenuItemWithCategory>,
) -> Vec<MenuItemWithCategory> {
    let mut scored: Vec<(i32, MenuItemWithCategory)> = candidates
        .into_iter()
        .map(|menu| (score_menu(history, &menu), menu))
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(_, menu)| menu)
        .collect()
}

fn score_menu(history: &OrderHistory, menu: &MenuItemWithCategory) -> i32 {
    let mut score = 0;

    if history.category_counts.contains_key(&menu.category.name) {
        score += CATEGORY_SCORE;
    }
    if history.vendor_counts.contains_key(&menu.item.vendor_id) {
        score += VENDOR_SCORE;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::menu::MenuItem;
    use chrono::Utc;

    fn candidate(name: &str, vendor_id: Uuid, category: &str) -> MenuItemWithCategory {
        let now = Utc::now();
        MenuItemWithCategory {
            item: MenuItem {
                id: Uuid::new_v4(),
                vendor_id,
                category_id: Uuid::new_v4(),
                name: name.to_string(),
                description: None,
                price: 1000,
                image_url: None,
                available: true,
                created_at: now,
                updated_at: now,
            },
            category: Category {
                id: Uuid::new_v4(),
                name: category.to_string(),
            },
        }
    }

    fn history(categories: &[&str], vendors: &[Uuid]) -> OrderHistory {
        let mut history = OrderHistory::default();
        for name in categories {
            *history.category_counts.entry(name.to_string()).or_insert(0) += 1;
        }
        for vendor in vendors {
            *history.vendor_counts.entry(*vendor).or_insert(0) += 1;
        }
        history
    }

    #[test]
    fn test_category_beats_vendor_beats_unrelated() {
        let v1 = Uuid::new_v4();
        let v2 = Uuid::new_v4();
        let v3 = Uuid::new_v4();
        let unrelated = Uuid::new_v4();

        // Past orders: Rice from v1, Drinks from v2
        let history = history(&["Rice", "Drinks"], &[v1, v2]);

        let candidates = vec![
            candidate("Egusi with pounded yam", v1, "Swallow"),
            candidate("Indomie special", unrelated, "noodles"),
            candidate("Fried rice", v3, "Rice"),
        ];

        let ranked = rank_menus(&history, candidates);

        let names: Vec<&str> = ranked.iter().map(|m| m.item.name.as_str()).collect();
        // Rice category (3) > known vendor (2) > unrelated (0)
        assert_eq!(
            names,
            vec!["Fried rice", "Egusi with pounded yam", "Indomie special"]
        );
    }

    #[test]
    fn test_category_and_vendor_scores_accumulate() {
        let v1 = Uuid::new_v4();
        let history = history(&["Rice"], &[v1]);

        let both = candidate("Jollof", v1, "Rice");
        let category_only = candidate("Coconut rice", Uuid::new_v4(), "Rice");

        let ranked = rank_menus(&history, vec![category_only, both]);

        // 5 points beats 3, overriding input order
        assert_eq!(ranked[0].item.name, "Jollof");
        assert_eq!(ranked[1].item.name, "Coconut rice");
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let history = OrderHistory::default();
        let candidates: Vec<_> = (0..5)
            .map(|i| candidate(&format!("menu-{}", i), Uuid::new_v4(), "Drinks"))
            .collect();

        let ranked = rank_menus(&history, candidates);

        let names: Vec<&str> = ranked.iter().map(|m| m.item.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["menu-0", "menu-1", "menu-2", "menu-3", "menu-4"]
        );
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let v1 = Uuid::new_v4();
        let history = history(&["Swallow"], &[v1]);

        let candidates: Vec<_> = (0..8)
            .map(|i| {
                candidate(
                    &format!("menu-{}", i),
                    if i % 2 == 0 { v1 } else { Uuid::new_v4() },
                    if i % 3 == 0 { "Swallow" } else { "Meshai" },
                )
            })
            .collect();

        let first = rank_menus(&history, candidates.clone());
        let second = rank_menus(&history, candidates);

        let first_ids: Vec<Uuid> = first.iter().map(|m| m.item.id).collect();
        let second_ids: Vec<Uuid> = second.iter().map(|m| m.item.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_ranking_is_truncated_to_ten() {
        let history = OrderHistory::default();
        let candidates: Vec<_> = (0..15)
            .map(|i| candidate(&format!("menu-{}", i), Uuid::new_v4(), "Rice"))
            .collect();

        let ranked = rank_menus(&history, candidates);
        assert_eq!(ranked.len(), MAX_RECOMMENDATIONS);
        // The first ten candidates survive, in order
        assert_eq!(ranked[0].item.name, "menu-0");
        assert_eq!(ranked[9].item.name, "menu-9");
    }
}
