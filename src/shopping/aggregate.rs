//! Consolidates recipe ingredients across planned meals into one list.
//!
//! Ingredients are bucketed by `(lower-cased name, unit)`. Units are compared
//! verbatim, so `g` and `kg` stay in separate buckets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plans::repo_types::MealPlanEntry;
use crate::recipes::repo_types::RecipeIngredient;

pub const UNKNOWN_RECIPE: &str = "Unknown Recipe";

/// One line of the derived shopping list. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub recipes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    name: String,
    unit: String,
}

impl BucketKey {
    fn of(ingredient: &RecipeIngredient) -> Self {
        Self {
            name: ingredient.ingredient_name.to_lowercase(),
            unit: ingredient.unit.clone(),
        }
    }
}

pub fn aggregate(
    entries: &[MealPlanEntry],
    ingredients_by_recipe: &HashMap<Uuid, Vec<RecipeIngredient>>,
) -> Vec<GeneratedIngredient> {
    let mut buckets: HashMap<BucketKey, GeneratedIngredient> = HashMap::new();

    for entry in entries {
        let Some(recipe_id) = entry.recipe_id else {
            continue;
        };
        let Some(ingredients) = ingredients_by_recipe.get(&recipe_id) else {
            continue;
        };
        let title = entry.recipe_title.as_deref().unwrap_or(UNKNOWN_RECIPE);
        let servings = f64::from(entry.effective_servings());

        for ingredient in ingredients {
            let bucket = buckets
                .entry(BucketKey::of(ingredient))
                .or_insert_with(|| GeneratedIngredient {
                    name: ingredient.ingredient_name.clone(),
                    quantity: 0.0,
                    unit: ingredient.unit.clone(),
                    recipes: Vec::new(),
                });

            bucket.quantity += ingredient.quantity * servings;
            if !bucket.recipes.iter().any(|r| r == title) {
                bucket.recipes.push(title.to_string());
            }
        }
    }

    let mut out: Vec<GeneratedIngredient> = buckets.into_values().collect();
    out.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.unit.cmp(&b.unit))
    });
    out
}

/// Distinct recipe ids referenced by `entries`, in first-seen order.
pub fn referenced_recipes(entries: &[MealPlanEntry]) -> Vec<Uuid> {
    let mut seen = Vec::new();
    for id in entries.iter().filter_map(|e| e.recipe_id) {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::repo_types::MealType;
    use time::macros::date;
    use time::Date;

    fn ingredient(recipe_id: Uuid, name: &str, quantity: f64, unit: &str) -> RecipeIngredient {
        RecipeIngredient {
            id: Uuid::new_v4(),
            recipe_id,
            ingredient_name: name.into(),
            quantity,
            unit: unit.into(),
            category_id: None,
            category_name: None,
        }
    }

    fn entry(day: Date, meal_type: MealType, recipe: Option<(Uuid, &str)>, servings: i32) -> MealPlanEntry {
        MealPlanEntry {
            id: Uuid::new_v4(),
            meal_plan_id: Uuid::nil(),
            meal_date: day,
            meal_type,
            recipe_id: recipe.map(|(id, _)| id),
            recipe_title: recipe.map(|(_, t)| t.to_string()),
            servings,
        }
    }

    fn find<'a>(out: &'a [GeneratedIngredient], name: &str, unit: &str) -> &'a GeneratedIngredient {
        out.iter()
            .find(|g| g.name.eq_ignore_ascii_case(name) && g.unit == unit)
            .expect("bucket present")
    }

    #[test]
    fn same_recipe_on_two_days_sums_quantity_but_attributes_once() {
        let soup = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(soup, vec![ingredient(soup, "Carrot", 1.0, "pcs")]);
        let entries = vec![
            entry(date!(2024 - 06 - 03), MealType::Dinner, Some((soup, "Soup")), 2),
            entry(date!(2024 - 06 - 05), MealType::Lunch, Some((soup, "Soup")), 1),
        ];

        let out = aggregate(&entries, &by_recipe);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Carrot");
        assert_eq!(out[0].unit, "pcs");
        assert_eq!(out[0].quantity, 3.0);
        assert_eq!(out[0].recipes, vec!["Soup".to_string()]);
    }

    #[test]
    fn names_differing_in_case_share_a_bucket() {
        let stew = Uuid::new_v4();
        let broth = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(stew, vec![ingredient(stew, "salt", 5.0, "g")]);
        by_recipe.insert(broth, vec![ingredient(broth, "Salt", 2.0, "g")]);
        let entries = vec![
            entry(date!(2024 - 06 - 03), MealType::Dinner, Some((stew, "Stew")), 1),
            entry(date!(2024 - 06 - 04), MealType::Dinner, Some((broth, "Broth")), 1),
        ];

        let out = aggregate(&entries, &by_recipe);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].quantity, 7.0);
        assert_eq!(out[0].name, "salt");
        assert_eq!(out[0].recipes, vec!["Stew".to_string(), "Broth".to_string()]);
    }

    #[test]
    fn different_units_stay_separate() {
        let bread = Uuid::new_v4();
        let cake = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(bread, vec![ingredient(bread, "Flour", 200.0, "g")]);
        by_recipe.insert(cake, vec![ingredient(cake, "Flour", 1.0, "kg")]);
        let entries = vec![
            entry(date!(2024 - 06 - 03), MealType::Breakfast, Some((bread, "Bread")), 1),
            entry(date!(2024 - 06 - 04), MealType::Snack, Some((cake, "Cake")), 1),
        ];

        let out = aggregate(&entries, &by_recipe);
        assert_eq!(out.len(), 2);
        assert_eq!(find(&out, "flour", "g").quantity, 200.0);
        assert_eq!(find(&out, "flour", "kg").quantity, 1.0);
    }

    #[test]
    fn unit_with_pipe_does_not_collide_with_name() {
        let r = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(
            r,
            vec![
                ingredient(r, "a|b", 1.0, "c"),
                ingredient(r, "a", 1.0, "b|c"),
            ],
        );
        let entries = vec![entry(date!(2024 - 06 - 03), MealType::Lunch, Some((r, "Odd")), 1)];

        assert_eq!(aggregate(&entries, &by_recipe).len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate(&[], &HashMap::new()).is_empty());
    }

    #[test]
    fn entries_without_recipe_are_skipped() {
        let entries = vec![entry(date!(2024 - 06 - 03), MealType::Lunch, None, 3)];
        assert!(aggregate(&entries, &HashMap::new()).is_empty());
    }

    #[test]
    fn invalid_servings_scale_as_one() {
        let r = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(r, vec![ingredient(r, "Egg", 2.0, "pcs")]);
        let entries = vec![entry(date!(2024 - 06 - 03), MealType::Breakfast, Some((r, "Omelette")), 0)];

        assert_eq!(aggregate(&entries, &by_recipe)[0].quantity, 2.0);
    }

    #[test]
    fn zero_and_negative_quantities_propagate() {
        let r = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(
            r,
            vec![
                ingredient(r, "Water", 0.0, "ml"),
                ingredient(r, "Sugar", -1.0, "g"),
            ],
        );
        let entries = vec![entry(date!(2024 - 06 - 03), MealType::Snack, Some((r, "Odd")), 2)];

        let out = aggregate(&entries, &by_recipe);
        assert_eq!(out.len(), 2);
        assert_eq!(find(&out, "water", "ml").quantity, 0.0);
        assert_eq!(find(&out, "sugar", "g").quantity, -2.0);
    }

    #[test]
    fn missing_title_is_attributed_to_unknown_recipe() {
        let r = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(r, vec![ingredient(r, "Rice", 1.0, "cup")]);
        let mut e = entry(date!(2024 - 06 - 03), MealType::Dinner, Some((r, "x")), 1);
        e.recipe_title = None;

        assert_eq!(aggregate(&[e], &by_recipe)[0].recipes, vec![UNKNOWN_RECIPE.to_string()]);
    }

    #[test]
    fn output_is_sorted_by_name() {
        let r = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(
            r,
            vec![
                ingredient(r, "onion", 1.0, "pcs"),
                ingredient(r, "Butter", 10.0, "g"),
                ingredient(r, "apple", 2.0, "pcs"),
            ],
        );
        let entries = vec![entry(date!(2024 - 06 - 03), MealType::Dinner, Some((r, "Mix")), 1)];

        let names: Vec<_> = aggregate(&entries, &by_recipe)
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["apple", "Butter", "onion"]);
    }

    #[test]
    fn shuffled_entries_give_same_quantities() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut by_recipe = HashMap::new();
        by_recipe.insert(
            a,
            vec![ingredient(a, "Tomato", 2.0, "pcs"), ingredient(a, "Oil", 15.0, "ml")],
        );
        by_recipe.insert(
            b,
            vec![ingredient(b, "tomato", 1.5, "pcs"), ingredient(b, "Basil", 3.0, "leaf")],
        );
        let entries = vec![
            entry(date!(2024 - 06 - 03), MealType::Lunch, Some((a, "Salad")), 2),
            entry(date!(2024 - 06 - 04), MealType::Dinner, Some((b, "Pasta")), 3),
            entry(date!(2024 - 06 - 05), MealType::Lunch, Some((a, "Salad")), 1),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();

        let forward = aggregate(&entries, &by_recipe);
        let backward = aggregate(&reversed, &by_recipe);
        assert_eq!(forward.len(), backward.len());
        for g in &forward {
            let other = find(&backward, &g.name, &g.unit);
            assert_eq!(g.quantity, other.quantity);
        }
        assert_eq!(find(&forward, "tomato", "pcs").quantity, 2.0 * 2.0 + 2.0 * 1.0 + 1.5 * 3.0);
    }

    #[test]
    fn referenced_recipes_are_distinct_and_ordered() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let entries = vec![
            entry(date!(2024 - 06 - 03), MealType::Lunch, Some((a, "A")), 1),
            entry(date!(2024 - 06 - 03), MealType::Dinner, None, 1),
            entry(date!(2024 - 06 - 04), MealType::Lunch, Some((b, "B")), 1),
            entry(date!(2024 - 06 - 05), MealType::Lunch, Some((a, "A")), 1),
        ];
        assert_eq!(referenced_recipes(&entries), vec![a, b]);
    }
}
