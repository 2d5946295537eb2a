//! Recipe page fixtures

/// Full schema.org Recipe in JSON-LD, wrapped in a `@graph`
pub const FULL_RECIPE: &str = r#"<!DOCTYPE html>
<html><head>
<title>Chicken Tikka Masala | Example Eats</title>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@graph": [
    {"@type": "WebSite", "name": "Example Eats"},
    {
      "@type": "Recipe",
      "name": "Chicken Tikka Masala",
      "image": ["/img/tikka-1200.jpg"],
      "recipeYield": "4",
      "prepTime": "PT20M",
      "totalTime": "PT1H10M",
      "recipeCuisine": "indian",
      "recipeCategory": ["main course", "dinner"],
      "recipeIngredient": [
        "500 g chicken thighs",
        "1 cup yogurt",
        "2 tbsp garam masala",
        "400 g crushed tomatoes",
        "1/2 cup cream"
      ],
      "recipeInstructions": [
        {"@type": "HowToSection", "name": "Marinate", "itemListElement": [
          {"@type": "HowToStep", "text": "Mix yogurt and spices, coat the chicken."}
        ]},
        {"@type": "HowToSection", "name": "Cook", "itemListElement": [
          {"@type": "HowToStep", "text": "Grill the chicken until charred."},
          {"@type": "HowToStep", "text": "Simmer in tomato sauce, finish with cream."}
        ]}
      ],
      "nutrition": {
        "@type": "NutritionInformation",
        "calories": "520 kcal",
        "proteinContent": "38 g",
        "fatContent": "28 g"
      }
    }
  ]
}
</script>
</head><body><h1>Chicken Tikka Masala</h1></body></html>"#;

/// Only title, ingredients and instructions in JSON-LD
pub const REQUIRED_ONLY: &str = r#"<html><head>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Recipe",
  "name": "Guacamole",
  "recipeIngredient": ["3 avocados", "1 lime", "1/2 tsp salt"],
  "recipeInstructions": "Halve the avocados.\nMash with lime and salt."
}
</script></head><body></body></html>"#;

/// Blog post without structured data
pub const BLOG_POST: &str = r#"<html><head>
<title>Pancakes | Grandma's Kitchen</title>
<meta property="og:image" content="https://grandmas-kitchen.example/p.jpg">
</head><body>
<h1>Fluffy Pancakes</h1>
<p>Prep Time: 10 mins &middot; Total Time: 1 hr 5 mins &middot; Serves 4</p>
<h2>Ingredients</h2>
<ul><li>2 cups flour</li><li>2 eggs</li><li>1 1/2 cups milk</li></ul>
<h2>Directions</h2>
<div><ol><li>Whisk everything.</li><li>Fry on a hot griddle.</li></ol></div>
</body></html>"#;

/// Nothing resembling a recipe
pub const NOT_A_RECIPE: &str = r#"<html><head></head>
<body><p>We are a small team.</p></body></html>"#;
