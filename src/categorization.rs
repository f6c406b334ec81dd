use serde::{Deserialize, Serialize};
use std::fmt;

use crate::matching::contains_phrase;

/// Grocery aisle used to group shopping lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Produce,
    Dairy,
    Meat,
    Seafood,
    Bakery,
    Pantry,
    Spices,
    Frozen,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::Dairy => "Dairy",
            Category::Meat => "Meat",
            Category::Seafood => "Seafood",
            Category::Bakery => "Bakery",
            Category::Pantry => "Pantry",
            Category::Spices => "Spices",
            Category::Frozen => "Frozen",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order; earlier tables win ("frozen peas" is Frozen, "chopped tomatoes" is Pantry).
const KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Frozen, &["frozen", "ice cream"]),
    (
        Category::Spices,
        &[
            "salt", "black pepper", "white pepper", "peppercorn", "cayenne", "cumin", "paprika",
            "turmeric", "cinnamon", "oregano", "chilli flakes", "chili powder", "curry powder",
            "nutmeg", "dried", "spice", "bay leaf", "bay leaves", "coriander seed",
        ],
    ),
    (
        Category::Pantry,
        &[
            "peanut butter", "flour", "sugar", "rice", "pasta", "spaghetti", "noodle", "oats",
            "lentil", "chickpea", "bean", "stock", "broth", "oil", "vinegar", "honey", "syrup",
            "canned", "tinned", "chopped tomatoes", "passata", "tomato puree", "soy sauce", "cereal", "quinoa",
            "couscous", "baking", "yeast", "cocoa", "chocolate", "nut", "almond", "walnut", "cashew",
            "hazelnut", "pecan", "raisin",
        ],
    ),
    (
        Category::Seafood,
        &["salmon", "tuna", "cod", "prawn", "shrimp", "fish", "haddock", "mussel", "crab", "mackerel"],
    ),
    (
        Category::Meat,
        &["chicken", "beef", "pork", "lamb", "bacon", "sausage", "mince", "turkey", "ham", "steak", "chorizo"],
    ),
    (
        Category::Produce,
        &[
            "tomato", "onion", "garlic", "lettuce", "carrot", "celery", "pepper", "cucumber",
            "courgette", "zucchini", "broccoli", "cauliflower", "spinach", "kale", "cabbage",
            "potato", "mushroom", "peas", "sweetcorn", "avocado", "aubergine", "eggplant", "squash",
            "ginger", "coriander", "cilantro", "parsley", "basil", "mint", "thyme", "rosemary",
            "apple", "banana", "orange", "lemon", "lime", "berry", "strawberry", "blueberry",
            "raspberry", "grape", "mango",
            "pear", "leek", "herb",
        ],
    ),
    (
        Category::Dairy,
        &["milk", "cheese", "cheddar", "butter", "yogurt", "yoghurt", "cream", "egg", "mozzarella", "parmesan", "feta", "margarine"],
    ),
    (
        Category::Bakery,
        &["bread", "bagel", "tortilla", "wrap", "pitta", "pita", "bun", "roll", "croissant", "naan"],
    ),
];

/// Categorizes an ingredient by whole-word keyword matches on its name.
pub fn categorize(ingredient_name: &str) -> Category {
    KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| contains_phrase(ingredient_name, keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}
