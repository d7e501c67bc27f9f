use sqlx::{Pool, Postgres};

use crate::{
    constants::SHOPPING_LIST_HEADER,
    error::Result,
    schema::{ShoppingListItem, Uuid},
};

/// Sums ingredient amounts over every recipe in the user's cart, one row per
/// `(name, unit)`, ordered by name then unit.
pub async fn build_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>> {
    let items: Vec<ShoppingListItem> = sqlx::query_as(
        "
        SELECT i.name AS name, SUM(ri.amount) AS total_amount, i.measurement_unit AS measurement_unit
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    log::trace!("> Shopping list for {user_id}: {} items", items.len());
    Ok(items)
}

pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(SHOPPING_LIST_HEADER.to_owned());
    lines.extend(items.iter().map(|item| {
        format!(
            "{} - {} {}.",
            item.name, item.total_amount, item.measurement_unit
        )
    }));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, total_amount: i64, unit: &str) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_owned(),
            total_amount,
            measurement_unit: unit.to_owned(),
        }
    }

    #[test]
    fn empty_cart_renders_header_only() {
        assert_eq!(render_shopping_list(&[]), "Shopping list:");
    }

    #[test]
    fn one_line_per_item_in_order() {
        let report = render_shopping_list(&[item("eggs", 3, "pcs"), item("flour", 500, "g")]);

        assert_eq!(report, "Shopping list:\neggs - 3 pcs.\nflour - 500 g.");
    }
}
