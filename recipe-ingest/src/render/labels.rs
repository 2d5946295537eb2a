//! Display labels for cuisine tags, meal types and nutrients

/// Notion select option names are limited to 100 characters
pub const MAX_OPTION_CHARS: usize = 100;

const CUISINE_LABELS: &[(&str, &str)] = &[
    ("Mexican", "🇲🇽 Mexican"),
    ("Italian", "🇮🇹 Italian"),
    ("American", "🇺🇸 American"),
    ("Japanese", "🇯🇵 Japanese"),
    ("Chinese", "🇨🇳 Chinese"),
    ("Indian", "🇮🇳 Indian"),
    ("Thai", "🇹🇭 Thai"),
    ("Vietnamese", "🇻🇳 Vietnamese"),
    ("French", "🇫🇷 French"),
    ("Spanish", "🇪🇸 Spanish"),
    ("Greek", "🇬🇷 Greek"),
    ("Korean", "🇰🇷 Korean"),
    ("Mediterranean", "🌊 Mediterranean"),
    ("Middle Eastern", "🕌 Middle Eastern"),
    ("Caribbean", "🌴 Caribbean"),
    ("Texmex", "🌮 Tex-Mex"),
    ("Tex-Mex", "🌮 Tex-Mex"),
    ("Bbq", "🍖 BBQ"),
    ("Barbecue", "🍖 BBQ"),
    ("Asian", "🥢 Asian"),
    ("European", "🇪🇺 European"),
    ("African", "🌍 African"),
    ("Brazilian", "🇧🇷 Brazilian"),
    ("Hawaiian", "🌺 Hawaiian"),
    ("Southern", "🍗 Southern"),
    ("Cajun", "🦐 Cajun"),
    ("Creole", "🦐 Creole"),
    ("Soul Food", "🍗 Soul Food"),
    ("Vegetarian", "🥬 Vegetarian"),
    ("Vegan", "🌱 Vegan"),
    ("Fusion", "🔄 Fusion"),
];

const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("Main", "🍽️ Dinner"),
    ("Main Dish", "🍽️ Dinner"),
    ("Main Course", "🍽️ Dinner"),
    ("Dinner", "🍽️ Dinner"),
    ("Lunch", "🥪 Lunch"),
    ("Breakfast", "🍳 Breakfast"),
    ("Brunch", "🥞 Brunch"),
    ("Side", "🥗 Side Dish"),
    ("Side Dish", "🥗 Side Dish"),
    ("Sides", "🥗 Side Dish"),
    ("Starter", "🥄 Appetizer"),
    ("Starters", "🥄 Appetizer"),
    ("Appetizer", "🥄 Appetizer"),
    ("Hors D'Oeuvre", "🥄 Appetizer"),
    ("Dessert", "🍰 Dessert"),
    ("Desserts", "🍰 Dessert"),
    ("Snack", "🍿 Snack"),
    ("Snacks", "🍿 Snack"),
    ("Drink", "🥤 Drink"),
    ("Drinks", "🥤 Drink"),
    ("Beverage", "🥤 Drink"),
    ("Beverages", "🥤 Drink"),
    ("Cocktail", "🍸 Cocktail"),
    ("Cocktails", "🍸 Cocktail"),
    ("Soup", "🥣 Soup"),
    ("Soups", "🥣 Soup"),
    ("Salad", "🥬 Salad"),
    ("Salads", "🥬 Salad"),
    ("Bread", "🍞 Bread"),
    ("Breads", "🍞 Bread"),
    ("Pasta", "🍝 Pasta"),
    ("Noodles", "🍜 Noodles"),
    ("Rice", "🍚 Rice"),
    ("Sauce", "🥫 Sauce"),
    ("Sauces", "🥫 Sauce"),
    ("Dip", "🫕 Dip"),
    ("Dips", "🫕 Dip"),
    ("Marinade", "🧂 Marinade"),
    ("Marinades", "🧂 Marinade"),
    ("Grill", "🔥 Grill"),
    ("Grilling", "🔥 Grill"),
    ("Baking", "🥖 Baking"),
    ("Seafood", "🦐 Seafood"),
    ("Fish", "🐟 Fish"),
    ("Meat", "🥩 Meat"),
    ("Chicken", "🍗 Chicken"),
    ("Beef", "🥩 Beef"),
    ("Pork", "🥓 Pork"),
    ("Lamb", "🐑 Lamb"),
];

/// Nutrient keys (schema.org names without `Content`) in display order
pub const NUTRITION_LABELS: &[(&str, &str)] = &[
    ("calories", "Calories"),
    ("carbohydrate", "Carbs"),
    ("protein", "Protein"),
    ("fat", "Fat"),
    ("unsaturatedFat", "Unsat Fat"),
    ("saturatedFat", "Sat Fat"),
    ("fiber", "Fiber"),
    ("sugar", "Sugar"),
    ("sodium", "Sodium"),
    ("cholesterol", "Cholesterol"),
    ("servingSize", "Serving Size"),
];

/// Capitalise the first letter of every alphabetic run, lowercase the rest
///
/// "tex-mex" → "Tex-Mex", "hors d'oeuvre" → "Hors D'Oeuvre".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Tag label for one cuisine, emoji-prefixed when known
pub fn cuisine_label(raw: &str) -> String {
    let formatted = title_case(raw.trim());
    lookup(CUISINE_LABELS, &formatted)
        .map(str::to_string)
        .unwrap_or(formatted)
}

/// Select label for the first listed category, capped at 100 characters
pub fn category_label(raw: &str) -> Option<String> {
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    let formatted = title_case(first);
    let label = lookup(CATEGORY_LABELS, &formatted)
        .map(str::to_string)
        .unwrap_or(formatted);
    Some(truncate_option(&label))
}

fn truncate_option(label: &str) -> String {
    if label.chars().count() <= MAX_OPTION_CHARS {
        return label.to_string();
    }
    let head: String = label.chars().take(MAX_OPTION_CHARS - 3).collect();
    format!("{}...", head)
}
