use base64ct::{Base64, Encoding};
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{RecipeDetails, RecipeInput, RecipeQuery, RecipeScope};
use super::repo;
use super::repo_types::{Category, Recipe, RecipeStep};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_UNIT: &str = "pcs";

const DEFAULT_INGREDIENTS: &[&str] = &[
    "Tomato", "Onion", "Garlic", "Bell Pepper", "Carrot", "Broccoli", "Spinach", "Mushroom",
    "Chicken Breast", "Ground Beef", "Salmon", "Shrimp", "Tofu",
    "Pasta", "Rice", "Flour", "Bread", "Potato",
    "Olive Oil", "Butter", "Milk", "Cream", "Cheese", "Egg",
    "Salt", "Black Pepper", "Sugar", "Honey", "Lemon",
];

// category family keyword -> ingredient keywords
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("vegetable", &["tomato", "onion", "carrot", "broccoli", "spinach", "pepper"]),
    ("meat", &["chicken", "beef", "pork", "lamb"]),
    ("dairy", &["milk", "cheese", "butter", "cream", "yogurt"]),
    ("grain", &["rice", "pasta", "bread", "flour"]),
    ("spice", &["salt", "pepper", "cumin", "paprika", "oregano", "basil"]),
];

/// Normalized browse filter. Sliders at their maximum mean "no limit".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub mine: bool,
    pub title_pattern: Option<String>,
    pub max_calories: Option<i32>,
    pub max_prep_time: Option<i32>,
    pub servings: Option<i32>,
}

impl From<&RecipeQuery> for RecipeFilter {
    fn from(q: &RecipeQuery) -> Self {
        Self {
            mine: q.scope == RecipeScope::Mine,
            title_pattern: q.search.as_deref().and_then(title_pattern),
            max_calories: q.max_calories.filter(|v| *v < 1000),
            max_prep_time: q.max_prep_time.filter(|v| *v < 120),
            servings: q.servings.filter(|v| *v > 0),
        }
    }
}

/// `ILIKE` pattern matching `search` anywhere in the title, wildcards escaped.
pub fn title_pattern(search: &str) -> Option<String> {
    let search = search.trim();
    if search.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(search.len() + 2);
    out.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    Some(out)
}

pub fn validate_input(input: &mut RecipeInput) -> Result<(), String> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err("Please enter a recipe title".into());
    }
    if input.prep_time < 0 || input.cook_time < 0 || input.calories_per_serving < 0 {
        return Err("Times and calories must not be negative".into());
    }
    if input.servings < 1 {
        input.servings = 1;
    }
    if let Some(url) = input.image_url.as_deref() {
        if url.is_empty() {
            input.image_url = None;
        } else {
            validate_image(url)?;
        }
    }
    Ok(())
}

/// Accepts an inline `data:image/<type>;base64,<payload>` URL of at most 5 MiB.
pub fn validate_image(data_url: &str) -> Result<(), String> {
    let rest = data_url
        .strip_prefix("data:image/")
        .ok_or("Please select an image file")?;
    let (_, payload) = rest
        .split_once(";base64,")
        .ok_or("Please select an image file")?;
    if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 2 {
        return Err("Image must be smaller than 5MB".into());
    }
    let bytes = Base64::decode_vec(payload).map_err(|_| "Failed to read image file".to_string())?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err("Image must be smaller than 5MB".into());
    }
    Ok(())
}

/// Picks the ingredient category whose family matches a keyword in the name.
pub fn detect_category(name: &str, categories: &[Category]) -> Option<Uuid> {
    let name = name.to_lowercase();
    categories
        .iter()
        .find(|cat| {
            let cat_name = cat.name.to_lowercase();
            CATEGORY_KEYWORDS.iter().any(|(family, words)| {
                cat_name.contains(family) && words.iter().any(|w| name.contains(w))
            })
        })
        .map(|cat| cat.id)
}

/// Built-in suggestions merged with names already in use, sorted and distinct.
pub fn merge_suggestions(known: Vec<String>) -> Vec<String> {
    let mut all: Vec<String> = DEFAULT_INGREDIENTS
        .iter()
        .map(|s| s.to_string())
        .chain(known.into_iter().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect();
    all.sort_by_key(|s| s.to_lowercase());
    all.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    all
}

pub fn copy_title(title: &str) -> String {
    format!("{} (Copy)", title)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIngredient {
    pub ingredient_name: String,
    pub quantity: f64,
    pub unit: String,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStep {
    pub step_number: i32,
    pub instruction: String,
}

/// Everything inserted when a recipe is copied into someone's collection.
#[derive(Debug, Clone)]
pub struct RecipeCopy {
    pub input: RecipeInput,
    pub ingredients: Vec<NewIngredient>,
    pub steps: Vec<NewStep>,
    pub tags: Vec<String>,
}

/// A private `"<title> (Copy)"` with the source's ingredients, steps and tags.
pub fn copy_of(source: &RecipeDetails) -> RecipeCopy {
    let r = &source.recipe;
    RecipeCopy {
        input: RecipeInput {
            title: copy_title(&r.title),
            description: r.description.clone(),
            image_url: r.image_url.clone(),
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            servings: r.servings,
            calories_per_serving: r.calories_per_serving,
            category_id: r.category_id,
            is_public: false,
        },
        ingredients: source
            .ingredients
            .iter()
            .map(|i| NewIngredient {
                ingredient_name: i.ingredient_name.clone(),
                quantity: i.quantity,
                unit: i.unit.clone(),
                category_id: i.category_id,
            })
            .collect(),
        steps: source
            .steps
            .iter()
            .map(|s| NewStep {
                step_number: s.step_number,
                instruction: s.instruction.clone(),
            })
            .collect(),
        tags: source.tags.iter().map(|t| t.tag_name.clone()).collect(),
    }
}

/// New steps go after the existing ones: number = count + 1.
pub fn next_step_number(existing: &[RecipeStep]) -> i32 {
    existing.len() as i32 + 1
}

/// Recipes the caller may modify. Anything else reads as missing.
pub fn require_owned(recipe: Option<Recipe>, user_id: Uuid) -> Option<Recipe> {
    recipe.filter(|r| r.is_owned_by(user_id))
}

/// Recipes the caller may read or copy: public ones and their own.
pub fn require_visible(details: Option<RecipeDetails>, user_id: Uuid) -> Option<RecipeDetails> {
    details.filter(|d| d.recipe.is_visible_to(user_id))
}

pub async fn load_details(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Option<RecipeDetails>> {
    let Some(recipe) = repo::get(db, recipe_id).await? else {
        return Ok(None);
    };
    let ingredients = repo::ingredients(db, recipe_id).await?;
    let steps = repo::steps(db, recipe_id).await?;
    let tags = repo::tags(db, recipe_id).await?;
    Ok(Some(RecipeDetails {
        recipe,
        ingredients,
        steps,
        tags,
    }))
}
